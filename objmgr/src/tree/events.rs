// This file is part of objmgr, a library to mirror the object trees exported by D-Bus services.
//
// Copyright 2025 objmgr developers
//
// SPDX-License-Identifier: GPL-3.0-only
//
// objmgr is free software: you can redistribute it and/or modify it under the terms of the GNU General Public License version 3, as published by the Free Software Foundation.
//
// objmgr is distributed in the hope that it will be useful, but WITHOUT ANY WARRANTY; without even the implied warranties of MERCHANTABILITY, SATISFACTORY QUALITY, or FITNESS FOR A PARTICULAR PURPOSE.  See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with this program.  If not, see http://www.gnu.org/licenses/.

//! Typed change notifications of an [`ObjectTree`](crate::tree::ObjectTree).

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

/// A change to the mirrored tree. `P` is the proxy type of the bus connection.
#[derive(Debug, Clone, PartialEq)]
pub enum TreeEvent<P> {
    /// First interface of a new object is ready. Always followed by the matching
    /// [`TreeEvent::InterfaceAdded`].
    ObjectAdded { object_path: String },
    /// Last interface of an object went away. Always preceded by the matching
    /// [`TreeEvent::InterfaceRemoved`].
    ObjectRemoved { object_path: String },
    InterfaceAdded {
        object_path: String,
        interface_name: String,
        proxy: P,
    },
    InterfaceRemoved {
        object_path: String,
        interface_name: String,
        proxy: P,
    },
}

impl<P> TreeEvent<P> {
    pub fn object_path(&self) -> &str {
        match self {
            TreeEvent::ObjectAdded { object_path }
            | TreeEvent::ObjectRemoved { object_path }
            | TreeEvent::InterfaceAdded { object_path, .. }
            | TreeEvent::InterfaceRemoved { object_path, .. } => object_path,
        }
    }
}

impl<P> fmt::Display for TreeEvent<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TreeEvent::ObjectAdded { object_path } => write!(f, "object-added {object_path}"),
            TreeEvent::ObjectRemoved { object_path } => write!(f, "object-removed {object_path}"),
            TreeEvent::InterfaceAdded {
                object_path,
                interface_name,
                ..
            } => write!(f, "interface-added {object_path} {interface_name}"),
            TreeEvent::InterfaceRemoved {
                object_path,
                interface_name,
                ..
            } => write!(f, "interface-removed {object_path} {interface_name}"),
        }
    }
}

/// Identifies a handler registered with [`EventEmitter::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

type Handler<P> = Arc<dyn Fn(&TreeEvent<P>) + Send + Sync>;

/// Synchronous observer list. Handlers run on the task that made the change, in registration
/// order, after the tree state has been updated and unlocked.
pub struct EventEmitter<P> {
    next_id: AtomicU64,
    handlers: Mutex<Vec<(HandlerId, Handler<P>)>>,
}

impl<P> EventEmitter<P> {
    pub fn new() -> Self {
        EventEmitter {
            next_id: AtomicU64::new(1),
            handlers: Mutex::new(Vec::new()),
        }
    }

    pub fn connect<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&TreeEvent<P>) + Send + Sync + 'static,
    {
        let id = HandlerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.lock().push((id, Arc::new(handler)));
        id
    }

    /// Returns `false` if `id` was not connected.
    pub fn disconnect(&self, id: HandlerId) -> bool {
        let mut handlers = self.lock();
        let before = handlers.len();
        handlers.retain(|(handler_id, _)| *handler_id != id);
        handlers.len() != before
    }

    pub fn emit(&self, event: &TreeEvent<P>) {
        // Handlers may connect or disconnect from within a callback.
        let handlers: Vec<Handler<P>> = self.lock().iter().map(|(_, h)| h.clone()).collect();
        for handler in handlers {
            handler(event);
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<(HandlerId, Handler<P>)>> {
        self.handlers.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl<P> Default for EventEmitter<P> {
    fn default() -> Self {
        Self::new()
    }
}
