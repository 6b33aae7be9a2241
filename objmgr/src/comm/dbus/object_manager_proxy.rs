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

use crate::comm::dbus::ManagedObjects;
use std::collections::HashMap;
use zbus::names::InterfaceName;
use zbus::zvariant::{ObjectPath, Value};
use zbus::{Result, proxy};

/// `org.freedesktop.DBus.ObjectManager`. Service and path are set per tree through the builder.
#[proxy(interface = "org.freedesktop.DBus.ObjectManager", gen_blocking = false)]
pub trait ObjectManager {
    async fn get_managed_objects(&self) -> Result<ManagedObjects>;

    #[zbus(signal)]
    fn interfaces_added(
        &self,
        object_path: ObjectPath<'_>,
        interfaces_and_properties: HashMap<InterfaceName<'_>, HashMap<&str, Value<'_>>>,
    ) -> Result<()>;

    #[zbus(signal)]
    fn interfaces_removed(
        &self,
        object_path: ObjectPath<'_>,
        interfaces: Vec<InterfaceName<'_>>,
    ) -> Result<()>;
}
