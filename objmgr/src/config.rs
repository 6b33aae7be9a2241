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

/// The standard interface through which a service exports its object tree. See
/// [https://dbus.freedesktop.org/doc/dbus-specification.html#standard-interfaces-objectmanager](https://dbus.freedesktop.org/doc/dbus-specification.html#standard-interfaces-objectmanager)
pub static OBJECT_MANAGER_INTERFACE: &str = "org.freedesktop.DBus.ObjectManager";

/// Method returning every object below the manager, as `a{oa{sa{sv}}}`.
pub static GET_MANAGED_OBJECTS: &str = "GetManagedObjects";

/// Signal carrying `(o, a{sa{sv}})` when an object gains interfaces.
pub static INTERFACES_ADDED: &str = "InterfacesAdded";

/// Signal carrying `(o, as)` when an object loses interfaces.
pub static INTERFACES_REMOVED: &str = "InterfacesRemoved";
