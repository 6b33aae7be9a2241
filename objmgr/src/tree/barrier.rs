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

//! One-shot completion gate over a set of concurrently resolving operations.
//!
//! Every operation that must finish before the tree counts as loaded calls [`LoadBarrier::hold`]
//! when it starts and [`LoadBarrier::release`] when it ends, whatever its outcome. The release
//! that brings the count to zero for the first time reports [`Release::FirstDrain`]; later drains
//! report [`Release::Drained`] so that callers can track idle periods without firing their
//! completion twice.

use std::sync::Mutex;

/// Outcome of a [`LoadBarrier::release`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Release {
    /// Other operations are still pending, or the counter was already at zero.
    Pending,
    /// The counter reached zero for the first time.
    FirstDrain,
    /// The counter reached zero again after an earlier drain.
    Drained,
}

#[derive(Debug)]
struct BarrierState {
    pending: usize,
    fired: bool,
}

#[derive(Debug)]
pub struct LoadBarrier {
    state: Mutex<BarrierState>,
}

impl LoadBarrier {
    /// Create a barrier with `initial` operations already pending.
    pub fn new(initial: usize) -> Self {
        LoadBarrier {
            state: Mutex::new(BarrierState {
                pending: initial,
                fired: false,
            }),
        }
    }

    pub fn hold(&self) {
        let mut state = self.lock();
        state.pending += 1;
    }

    /// Mark one pending operation as finished. Releasing an idle barrier does nothing.
    pub fn release(&self) -> Release {
        let mut state = self.lock();
        if state.pending == 0 {
            return Release::Pending;
        }
        state.pending -= 1;
        if state.pending > 0 {
            return Release::Pending;
        }
        if state.fired {
            Release::Drained
        } else {
            state.fired = true;
            Release::FirstDrain
        }
    }

    pub fn pending(&self) -> usize {
        self.lock().pending
    }

    /// Whether the counter has ever reached zero.
    pub fn has_fired(&self) -> bool {
        self.lock().fired
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, BarrierState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}
