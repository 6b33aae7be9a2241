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

//! objmgr - local mirror of the object trees D-Bus services export.
//!
//! Services such as BlueZ, UDisks, NetworkManager or the input-device service of a compositor
//! publish their objects through the standard `org.freedesktop.DBus.ObjectManager` interface.
//! This crate follows such a service and keeps a proxy for every interface it cares about, so
//! that consumers (a settings panel, an on-screen display, a command-line tool) can query the
//! current objects and react to them coming and going.
//!
//! # Modules
//!
//! - [`tree`] - [`ObjectTree`], the mirror itself, with its load barrier and change events
//! - [`comm::dbus`] - the bus abstraction the tree runs on, and its `zbus` implementation
//! - [`descriptor`] - [`InterfaceDescriptor`], the interfaces a tree is willing to track
//! - [`config`] - names of the standard object manager interface and its members
//! - [`error`] - [`ObjmgrError`]
//!
//! # Logging
//!
//! The crate logs through the `log` facade. Manager and enumeration failures are reported at
//! `error`, failed interface proxies at `warn`, the service joining or leaving the bus at `info`
//! and per-interface bookkeeping at `debug` and `trace`.

pub mod comm;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod tree;

pub use comm::dbus::zbus_connection::ZbusConnection;
pub use descriptor::InterfaceDescriptor;
pub use error::ObjmgrError;
pub use tree::events::TreeEvent;
pub use tree::{LoadPhase, ObjectTree};
