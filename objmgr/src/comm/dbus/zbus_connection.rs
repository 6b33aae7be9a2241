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

//! [`BusConnection`] on top of a `zbus` [`Connection`].
//!
//! # Examples
//!
//! ```rust,no_run
//! # use objmgr::comm::dbus::zbus_connection::ZbusConnection;
//! # use objmgr::tree::ObjectTree;
//! # async fn example() -> Result<(), objmgr::error::ObjmgrError> {
//! let connection = ZbusConnection::session().await?;
//! let tree = ObjectTree::builder(connection)
//!     .name("org.gnome.Mutter.InputDevices")
//!     .object_path("/org/gnome/Mutter/InputDevices")
//!     .build()?;
//! tree.loaded().await;
//! # Ok(())
//! # }
//! ```

use crate::comm::dbus::object_manager_proxy::ObjectManagerProxy;
use crate::comm::dbus::{
    BusConnection, InterfaceMap, InterfacesAdded, InterfacesRemoved, ManagedObjects, ManagerProxy,
};
use crate::config;
use crate::descriptor::InterfaceDescriptor;
use crate::error::ObjmgrError;
use futures_util::stream::{BoxStream, StreamExt};
use log::{trace, warn};
use std::collections::HashMap;
use zbus::names::{BusName, InterfaceName, OwnedInterfaceName};
use zbus::proxy::CacheProperties;
use zbus::zvariant::{OwnedObjectPath, Value};
use zbus::{Connection, Proxy, fdo};

#[derive(Debug, Clone)]
pub struct ZbusConnection {
    connection: Connection,
}

impl ZbusConnection {
    pub fn new(connection: Connection) -> Self {
        ZbusConnection { connection }
    }

    /// Connect to the session bus.
    pub async fn session() -> Result<Self, ObjmgrError> {
        Ok(Self::new(Connection::session().await?))
    }

    /// Connect to the system bus.
    pub async fn system() -> Result<Self, ObjmgrError> {
        Ok(Self::new(Connection::system().await?))
    }

    pub fn inner(&self) -> &Connection {
        &self.connection
    }
}

/// Object manager of one service, plus the bus daemon proxy used to track its owner.
pub struct ZbusManager {
    proxy: ObjectManagerProxy<'static>,
    dbus: fdo::DBusProxy<'static>,
    service: String,
}

fn bus_name(service: &str) -> Result<BusName<'_>, ObjmgrError> {
    BusName::try_from(service)
        .map_err(|e| ObjmgrError::Argument(format!("{service:?} is not a valid bus name: {e}")))
}

/// Convert the borrowed interface map of a signal body to owned keys and values. Properties
/// that cannot be owned (file descriptors that fail to duplicate) are dropped.
fn to_interface_map(interfaces: &HashMap<InterfaceName<'_>, HashMap<&str, Value<'_>>>) -> InterfaceMap {
    interfaces
        .iter()
        .map(|(name, properties)| {
            let properties = properties
                .iter()
                .filter_map(|(key, value)| match value.try_to_owned() {
                    Ok(value) => Some((key.to_string(), value)),
                    Err(e) => {
                        warn!("dropping property {key} of {name}: {e}");
                        None
                    }
                })
                .collect();
            (OwnedInterfaceName::from(name.clone()), properties)
        })
        .collect()
}

impl BusConnection for ZbusConnection {
    type Proxy = Proxy<'static>;
    type Manager = ZbusManager;

    async fn new_manager_proxy(
        &self,
        service: &str,
        manager_path: &str,
    ) -> Result<ZbusManager, ObjmgrError> {
        trace!(
            "creating {} proxy for {service} at {manager_path}",
            config::OBJECT_MANAGER_INTERFACE
        );
        bus_name(service)?;
        let proxy = ObjectManagerProxy::builder(&self.connection)
            .destination(service.to_string())?
            .path(manager_path.to_string())?
            .cache_properties(CacheProperties::No)
            .build()
            .await?;
        let dbus = fdo::DBusProxy::new(&self.connection).await?;
        Ok(ZbusManager {
            proxy,
            dbus,
            service: service.to_string(),
        })
    }

    async fn new_interface_proxy(
        &self,
        service: &str,
        object_path: &str,
        descriptor: &InterfaceDescriptor,
    ) -> Result<Proxy<'static>, ObjmgrError> {
        trace!(
            "creating {} proxy for {service} at {object_path}",
            descriptor.name()
        );
        let proxy = Proxy::new(
            &self.connection,
            service.to_string(),
            object_path.to_string(),
            descriptor.name().to_string(),
        )
        .await?;
        Ok(proxy)
    }
}

impl ManagerProxy for ZbusManager {
    async fn get_managed_objects(&self) -> Result<ManagedObjects, ObjmgrError> {
        Ok(self.proxy.get_managed_objects().await?)
    }

    async fn receive_interfaces_added(
        &self,
    ) -> Result<BoxStream<'static, InterfacesAdded>, ObjmgrError> {
        let stream = self.proxy.receive_interfaces_added().await?;
        Ok(stream
            .filter_map(|signal| async move {
                match signal.args() {
                    Ok(args) => Some(InterfacesAdded {
                        object_path: OwnedObjectPath::from(args.object_path().clone()),
                        interfaces: to_interface_map(args.interfaces_and_properties()),
                    }),
                    Err(e) => {
                        warn!("dropping malformed {} signal: {e}", config::INTERFACES_ADDED);
                        None
                    }
                }
            })
            .boxed())
    }

    async fn receive_interfaces_removed(
        &self,
    ) -> Result<BoxStream<'static, InterfacesRemoved>, ObjmgrError> {
        let stream = self.proxy.receive_interfaces_removed().await?;
        Ok(stream
            .filter_map(|signal| async move {
                match signal.args() {
                    Ok(args) => Some(InterfacesRemoved {
                        object_path: OwnedObjectPath::from(args.object_path().clone()),
                        interfaces: args
                            .interfaces()
                            .iter()
                            .map(|name| OwnedInterfaceName::from(name.clone()))
                            .collect(),
                    }),
                    Err(e) => {
                        warn!(
                            "dropping malformed {} signal: {e}",
                            config::INTERFACES_REMOVED
                        );
                        None
                    }
                }
            })
            .boxed())
    }

    async fn has_owner(&self) -> Result<bool, ObjmgrError> {
        let name = bus_name(&self.service)?;
        Ok(self.dbus.name_has_owner(name).await?)
    }

    async fn receive_owner_changed(&self) -> Result<BoxStream<'static, bool>, ObjmgrError> {
        let stream = self.proxy.inner().receive_owner_changed().await?;
        Ok(stream.map(|owner| owner.is_some()).boxed())
    }
}
