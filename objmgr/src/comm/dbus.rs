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

//! Bus abstraction consumed by [`ObjectTree`](crate::tree::ObjectTree).
//!
//! The tree never talks to `zbus` directly. Everything it needs from the bus is expressed by
//! two traits:
//! - [`BusConnection`] - creates and initializes proxies for a service
//! - [`ManagerProxy`] - the `org.freedesktop.DBus.ObjectManager` side of a service: enumeration,
//!   the `InterfacesAdded`/`InterfacesRemoved` signals and the presence of the service on the bus
//!
//! [`zbus_connection::ZbusConnection`] is the implementation used against a real bus. Tests drive
//! the tree with an in-memory implementation instead.

pub mod object_manager_proxy;
pub mod zbus_connection;

use crate::descriptor::InterfaceDescriptor;
use crate::error::ObjmgrError;
use futures_util::stream::BoxStream;
use std::collections::HashMap;
use std::future::Future;
use zbus::names::OwnedInterfaceName;
use zbus::zvariant::{OwnedObjectPath, OwnedValue};

/// Properties of one interface, keyed by property name.
pub type PropertyBag = HashMap<String, OwnedValue>;

/// Interfaces of one object, keyed by interface name.
pub type InterfaceMap = HashMap<OwnedInterfaceName, PropertyBag>;

/// The reply of `GetManagedObjects`: `a{oa{sa{sv}}}`.
pub type ManagedObjects = HashMap<OwnedObjectPath, InterfaceMap>;

/// Arguments of an `InterfacesAdded` signal.
#[derive(Debug)]
pub struct InterfacesAdded {
    pub object_path: OwnedObjectPath,
    pub interfaces: InterfaceMap,
}

/// Arguments of an `InterfacesRemoved` signal.
#[derive(Debug, Clone)]
pub struct InterfacesRemoved {
    pub object_path: OwnedObjectPath,
    pub interfaces: Vec<OwnedInterfaceName>,
}

/// A connection able to create proxies on a remote service.
///
/// Both constructors return fully initialized proxies: a returned `Ok` means the proxy is ready
/// for use, and an `Err` is treated by the tree as an initialization failure. Implementations
/// must not ask the bus to auto-start the service.
pub trait BusConnection: Send + Sync + 'static {
    /// Handle to one interface of one remote object.
    type Proxy: Clone + Send + Sync + 'static;
    /// Handle to the object manager of a service.
    type Manager: ManagerProxy;

    /// Create and initialize the object manager proxy at `manager_path` on `service`.
    fn new_manager_proxy(
        &self,
        service: &str,
        manager_path: &str,
    ) -> impl Future<Output = Result<Self::Manager, ObjmgrError>> + Send;

    /// Create and initialize a proxy for `descriptor` on the object at `object_path`.
    fn new_interface_proxy(
        &self,
        service: &str,
        object_path: &str,
        descriptor: &InterfaceDescriptor,
    ) -> impl Future<Output = Result<Self::Proxy, ObjmgrError>> + Send;
}

/// The object manager of one service.
pub trait ManagerProxy: Send + Sync + 'static {
    /// Call `GetManagedObjects`.
    fn get_managed_objects(
        &self,
    ) -> impl Future<Output = Result<ManagedObjects, ObjmgrError>> + Send;

    /// Subscribe to `InterfacesAdded`.
    fn receive_interfaces_added(
        &self,
    ) -> impl Future<Output = Result<BoxStream<'static, InterfacesAdded>, ObjmgrError>> + Send;

    /// Subscribe to `InterfacesRemoved`.
    fn receive_interfaces_removed(
        &self,
    ) -> impl Future<Output = Result<BoxStream<'static, InterfacesRemoved>, ObjmgrError>> + Send;

    /// Whether the service currently has an owner on the bus.
    fn has_owner(&self) -> impl Future<Output = Result<bool, ObjmgrError>> + Send;

    /// Subscribe to presence changes of the service. Each item is `true` when the service
    /// appeared and `false` when it vanished.
    fn receive_owner_changed(
        &self,
    ) -> impl Future<Output = Result<BoxStream<'static, bool>, ObjmgrError>> + Send;
}
