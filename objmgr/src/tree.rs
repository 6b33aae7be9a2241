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

//! Local mirror of a remote object tree.
//!
//! An [`ObjectTree`] follows the `org.freedesktop.DBus.ObjectManager` of one service and keeps a
//! proxy for every (object path, interface) pair whose interface has a registered
//! [`InterfaceDescriptor`]. The mirror is populated in the background:
//!
//! 1. The object manager proxy is initialized and its `InterfacesAdded`/`InterfacesRemoved`
//!    signals are subscribed to.
//! 2. If the service is on the bus, `GetManagedObjects` is called and a proxy is initialized for
//!    every known interface it reports. Initializations run concurrently.
//! 3. Once every initialization started in step 2 has succeeded or failed, the tree is loaded:
//!    the `on_loaded` callback runs and [`ObjectTree::loaded`] resolves. This happens exactly
//!    once per tree, including when the manager is unreachable or the service is absent.
//!
//! After that the tree keeps following the service: signals add and remove interfaces, and the
//! whole mirror is torn down when the service leaves the bus and rebuilt when it comes back.
//! Every change is reported as a [`TreeEvent`].
//!
//! Failures never surface as errors once the tree is built. They are logged, and the affected
//! interface is simply absent from the mirror.
//!
//! # Examples
//!
//! ```rust,no_run
//! # use objmgr::comm::dbus::zbus_connection::ZbusConnection;
//! # use objmgr::descriptor::InterfaceDescriptor;
//! # use objmgr::tree::ObjectTree;
//! # async fn example() -> Result<(), objmgr::error::ObjmgrError> {
//! let tree = ObjectTree::builder(ZbusConnection::system().await?)
//!     .name("org.bluez")
//!     .object_path("/")
//!     .known_interface(InterfaceDescriptor::new("org.bluez.Adapter1")?)
//!     .on_loaded(|| println!("adapters fetched"))
//!     .build()?;
//! tree.connect(|event| println!("{event}"));
//! tree.loaded().await;
//! for adapter in tree.get_proxies_for_interface("org.bluez.Adapter1") {
//!     println!("{}", adapter.path());
//! }
//! # Ok(())
//! # }
//! ```

pub mod barrier;
pub mod events;

use crate::comm::dbus::{
    BusConnection, InterfacesAdded, InterfacesRemoved, ManagerProxy, PropertyBag,
};
use crate::config;
use crate::descriptor::InterfaceDescriptor;
use crate::error::ObjmgrError;
use barrier::{LoadBarrier, Release};
use events::{EventEmitter, HandlerId, TreeEvent};
use futures_util::stream::{BoxStream, StreamExt};
use log::{debug, error, info, trace, warn};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::runtime::Handle;
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;
use zbus::names::BusName;
use zbus::zvariant::ObjectPath;

/// Callback run once when the initial population of the tree is over.
pub type OnLoaded = Box<dyn FnOnce() + Send>;

type OnDone = Box<dyn FnOnce() + Send>;

/// Where a tree is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadPhase {
    Uninitialized,
    /// The object manager proxy is being initialized.
    AwaitingManagerProxy,
    /// The object manager proxy could not be initialized. The tree stays empty.
    ManagerUnavailable,
    /// The service has no owner on the bus.
    ServiceAbsent,
    /// Managed objects are being fetched and their proxies initialized.
    Enumerating,
    /// Nothing is pending. The tree follows live signals from here on.
    Ready,
}

struct TreeState<P> {
    /// object path -> interface name -> proxy
    objects: BTreeMap<String, BTreeMap<String, P>>,
    /// interface name -> (object path, proxy), in registration order
    interfaces: HashMap<String, Vec<(String, P)>>,
    /// ticket -> (object path, interface name) of every initialization still allowed to register
    pending: HashMap<u64, (String, String)>,
    next_ticket: u64,
}

impl<P> TreeState<P> {
    fn begin_init(&mut self, object_path: &str, interface_name: &str) -> u64 {
        self.next_ticket += 1;
        self.pending.insert(
            self.next_ticket,
            (object_path.to_string(), interface_name.to_string()),
        );
        self.next_ticket
    }

    /// Invalidate pending initializations of `interface_name` on `object_path`.
    fn abandon_init(&mut self, object_path: &str, interface_name: &str) {
        self.pending.retain(|_, (path, name)| {
            path.as_str() != object_path || name.as_str() != interface_name
        });
    }
}

struct Inner<C: BusConnection> {
    connection: C,
    service_name: String,
    manager_path: String,
    cancellable: CancellationToken,
    interface_infos: HashMap<String, InterfaceDescriptor>,
    state: Mutex<TreeState<C::Proxy>>,
    /// Held across a mutation and the emission of its events.
    changes: Mutex<()>,
    barrier: LoadBarrier,
    on_loaded: Mutex<Option<OnLoaded>>,
    emitter: EventEmitter<C::Proxy>,
    phase: watch::Sender<LoadPhase>,
    loaded: watch::Sender<bool>,
    runtime: Handle,
}

/// Handle to a mirrored object tree. Cheap to clone; clones share the same mirror.
///
/// Background listeners hold their own handle, so dropping every `ObjectTree` does not stop
/// them. Call [`ObjectTree::cancel`] (or cancel the token given to the builder) to shut the tree
/// down.
pub struct ObjectTree<C: BusConnection> {
    inner: Arc<Inner<C>>,
}

impl<C: BusConnection> Clone for ObjectTree<C> {
    fn clone(&self) -> Self {
        ObjectTree {
            inner: self.inner.clone(),
        }
    }
}

impl<C: BusConnection> fmt::Debug for ObjectTree<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectTree")
            .field("service_name", &self.inner.service_name)
            .field("manager_path", &self.inner.manager_path)
            .field("phase", &*self.inner.phase.borrow())
            .finish_non_exhaustive()
    }
}

/// Options of an [`ObjectTree`]. Obtained from [`ObjectTree::builder`].
pub struct ObjectTreeBuilder<C: BusConnection> {
    connection: C,
    name: Option<String>,
    object_path: Option<String>,
    known_interfaces: Vec<InterfaceDescriptor>,
    cancellable: Option<CancellationToken>,
    on_loaded: Option<OnLoaded>,
}

impl<C: BusConnection> ObjectTreeBuilder<C> {
    /// Bus name of the service exporting the tree.
    pub fn name(mut self, name: &str) -> Self {
        self.name = Some(name.to_string());
        self
    }

    /// Path at which the service exports `org.freedesktop.DBus.ObjectManager`.
    pub fn object_path(mut self, object_path: &str) -> Self {
        self.object_path = Some(object_path.to_string());
        self
    }

    pub fn known_interface(mut self, descriptor: InterfaceDescriptor) -> Self {
        self.known_interfaces.push(descriptor);
        self
    }

    pub fn known_interfaces<I>(mut self, descriptors: I) -> Self
    where
        I: IntoIterator<Item = InterfaceDescriptor>,
    {
        self.known_interfaces.extend(descriptors);
        self
    }

    /// Token threaded through every initialization the tree starts. A fresh one is used if none
    /// is given.
    pub fn cancellable(mut self, token: CancellationToken) -> Self {
        self.cancellable = Some(token);
        self
    }

    pub fn on_loaded<F>(mut self, on_loaded: F) -> Self
    where
        F: FnOnce() + Send + 'static,
    {
        self.on_loaded = Some(Box::new(on_loaded));
        self
    }

    /// Validate the options and start loading the tree in the background.
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Returns: `Result<ObjectTree<C>, ObjmgrError>`
    /// * `Ok(ObjectTree<C>)` - The tree, initializing its object manager proxy
    /// * `Err(ObjmgrError::Argument)` - Missing or malformed service name or object path
    /// * `Err(ObjmgrError::Internal)` - No tokio runtime is running
    pub fn build(self) -> Result<ObjectTree<C>, ObjmgrError> {
        let service_name = self.name.ok_or(ObjmgrError::Argument(
            "A service name is required to follow an object manager.".to_string(),
        ))?;
        BusName::try_from(service_name.as_str()).map_err(|e| {
            ObjmgrError::Argument(format!("{service_name:?} is not a valid bus name: {e}"))
        })?;
        let manager_path = self.object_path.ok_or(ObjmgrError::Argument(
            "An object path is required to follow an object manager.".to_string(),
        ))?;
        ObjectPath::try_from(manager_path.as_str()).map_err(|e| {
            ObjmgrError::Argument(format!("{manager_path:?} is not a valid object path: {e}"))
        })?;
        let runtime = Handle::try_current().map_err(|e| {
            ObjmgrError::Internal(format!("An object tree needs a tokio runtime: {e}"))
        })?;

        let interface_infos = self
            .known_interfaces
            .into_iter()
            .map(|descriptor| (descriptor.name().to_string(), descriptor))
            .collect();

        let inner = Arc::new(Inner {
            connection: self.connection,
            service_name,
            manager_path,
            cancellable: self.cancellable.unwrap_or_default(),
            interface_infos,
            state: Mutex::new(TreeState {
                objects: BTreeMap::new(),
                interfaces: HashMap::new(),
                pending: HashMap::new(),
                next_ticket: 0,
            }),
            changes: Mutex::new(()),
            // The manager proxy itself is the first pending operation.
            barrier: LoadBarrier::new(1),
            on_loaded: Mutex::new(self.on_loaded),
            emitter: EventEmitter::new(),
            phase: watch::channel(LoadPhase::Uninitialized).0,
            loaded: watch::channel(false).0,
            runtime,
        });
        inner.runtime.spawn(inner.clone().init_manager());
        Ok(ObjectTree { inner })
    }
}

impl<C: BusConnection> ObjectTree<C> {
    pub fn builder(connection: C) -> ObjectTreeBuilder<C> {
        ObjectTreeBuilder {
            connection,
            name: None,
            object_path: None,
            known_interfaces: Vec::new(),
            cancellable: None,
            on_loaded: None,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.inner.service_name
    }

    pub fn manager_path(&self) -> &str {
        &self.inner.manager_path
    }

    /// Proxy for `interface_name` on the object at `object_path`, if it is tracked.
    pub fn get_proxy(&self, object_path: &str, interface_name: &str) -> Option<C::Proxy> {
        self.inner
            .lock_state()
            .objects
            .get(object_path)
            .and_then(|object| object.get(interface_name))
            .cloned()
    }

    /// Every tracked proxy for `interface_name`, in the order they became ready.
    pub fn get_proxies_for_interface(&self, interface_name: &str) -> Vec<C::Proxy> {
        self.inner
            .lock_state()
            .interfaces
            .get(interface_name)
            .map(|proxies| proxies.iter().map(|(_, proxy)| proxy.clone()).collect())
            .unwrap_or_default()
    }

    /// Every tracked proxy of every object.
    pub fn get_all_proxies(&self) -> Vec<C::Proxy> {
        self.inner
            .lock_state()
            .objects
            .values()
            .flat_map(|object| object.values().cloned())
            .collect()
    }

    /// Paths of the tracked objects, sorted.
    pub fn object_paths(&self) -> Vec<String> {
        self.inner.lock_state().objects.keys().cloned().collect()
    }

    /// Tracked interfaces of the object at `object_path`, sorted. Empty for unknown objects.
    pub fn interfaces_of(&self, object_path: &str) -> Vec<String> {
        self.inner
            .lock_state()
            .objects
            .get(object_path)
            .map(|object| object.keys().cloned().collect())
            .unwrap_or_default()
    }

    pub fn phase(&self) -> LoadPhase {
        *self.inner.phase.borrow()
    }

    pub fn is_loaded(&self) -> bool {
        *self.inner.loaded.borrow()
    }

    /// Wait until the initial population is over. Returns immediately if it already is.
    pub async fn loaded(&self) {
        let mut loaded = self.inner.loaded.subscribe();
        // The sender lives in `inner`, which `self` keeps alive.
        let _ = loaded.wait_for(|loaded| *loaded).await;
    }

    /// Register `handler` for every future [`TreeEvent`].
    ///
    /// Handlers run while the tree holds its change lock: they may query the tree, connect and
    /// disconnect, but must not wait for a later change of the same tree.
    pub fn connect<F>(&self, handler: F) -> HandlerId
    where
        F: Fn(&TreeEvent<C::Proxy>) + Send + Sync + 'static,
    {
        self.inner.emitter.connect(handler)
    }

    pub fn disconnect(&self, id: HandlerId) -> bool {
        self.inner.emitter.disconnect(id)
    }

    /// Receive every future [`TreeEvent`] on a channel. The subscription ends when the receiver
    /// is dropped and the next event is emitted.
    pub fn subscribe(&self) -> mpsc::UnboundedReceiver<TreeEvent<C::Proxy>> {
        let (tx, rx) = mpsc::unbounded_channel();
        let tree = Arc::downgrade(&self.inner);
        let id = Arc::new(Mutex::new(None::<HandlerId>));
        let handler_id = id.clone();
        let registered = self.inner.emitter.connect(move |event| {
            if tx.send(event.clone()).is_err() {
                let stale = handler_id.lock().unwrap_or_else(|e| e.into_inner()).take();
                if let (Some(inner), Some(stale)) = (tree.upgrade(), stale) {
                    inner.emitter.disconnect(stale);
                }
            }
        });
        *id.lock().unwrap_or_else(|e| e.into_inner()) = Some(registered);
        rx
    }

    /// Cancel every pending initialization and stop following the service.
    pub fn cancel(&self) {
        self.inner.cancellable.cancel();
    }

    pub fn cancellation_token(&self) -> &CancellationToken {
        &self.inner.cancellable
    }
}

impl<C: BusConnection> Inner<C> {
    fn lock_state(&self) -> MutexGuard<'_, TreeState<C::Proxy>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_changes(&self) -> MutexGuard<'_, ()> {
        self.changes.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Run `operation` unless the tree is cancelled first.
    async fn unless_cancelled<T>(
        &self,
        operation: impl Future<Output = Result<T, ObjmgrError>>,
    ) -> Result<T, ObjmgrError> {
        tokio::select! {
            biased;
            _ = self.cancellable.cancelled() => Err(ObjmgrError::Cancelled),
            result = operation => result,
        }
    }

    async fn init_manager(self: Arc<Self>) {
        self.phase.send_replace(LoadPhase::AwaitingManagerProxy);
        let manager = self
            .unless_cancelled(
                self.connection
                    .new_manager_proxy(&self.service_name, &self.manager_path),
            )
            .await;
        match manager {
            Ok(manager) => self.on_manager_proxy_loaded(Arc::new(manager)).await,
            Err(e) => self.manager_unavailable(e),
        }
    }

    fn manager_unavailable(&self, e: ObjmgrError) {
        error!(
            "could not initialize {} for {} at {}: {e}",
            config::OBJECT_MANAGER_INTERFACE,
            self.service_name,
            self.manager_path
        );
        self.phase.send_replace(LoadPhase::ManagerUnavailable);
        self.complete_load_step();
    }

    async fn on_manager_proxy_loaded(self: Arc<Self>, manager: Arc<C::Manager>) {
        let subscriptions = self
            .unless_cancelled(async {
                let added = manager.receive_interfaces_added().await?;
                let removed = manager.receive_interfaces_removed().await?;
                Ok::<_, ObjmgrError>((added, removed))
            })
            .await;
        let (added, removed) = match subscriptions {
            Ok(streams) => streams,
            Err(e) => return self.manager_unavailable(e),
        };
        self.runtime.spawn(self.clone().watch_interfaces_added(added));
        self.runtime.spawn(self.clone().watch_interfaces_removed(removed));

        if self.interface_infos.is_empty() {
            debug!(
                "no known interfaces for {}, nothing to fetch",
                self.service_name
            );
            self.complete_load_step();
            return;
        }

        let presence = self
            .unless_cancelled(async {
                // Subscribe before asking, so an appearance in between is not lost.
                let changes = manager.receive_owner_changed().await?;
                let present = manager.has_owner().await?;
                Ok::<_, ObjmgrError>((changes, present))
            })
            .await;
        let (changes, present) = match presence {
            Ok(presence) => presence,
            Err(e) => return self.manager_unavailable(e),
        };
        self.runtime.spawn(self.clone().watch_owner(manager.clone(), changes));

        if present {
            self.on_name_appeared(&manager).await;
        } else {
            info!("{} is not on the bus", self.service_name);
            self.phase.send_replace(LoadPhase::ServiceAbsent);
        }
        self.complete_load_step();
    }

    async fn watch_interfaces_added(
        self: Arc<Self>,
        mut signals: BoxStream<'static, InterfacesAdded>,
    ) {
        loop {
            let signal = tokio::select! {
                biased;
                _ = self.cancellable.cancelled() => break,
                signal = signals.next() => signal,
            };
            let Some(signal) = signal else {
                debug!("{} stream of {} ended", config::INTERFACES_ADDED, self.service_name);
                break;
            };
            for (interface_name, properties) in &signal.interfaces {
                self.clone().add_interface(
                    signal.object_path.as_str(),
                    interface_name.as_str(),
                    properties,
                    None,
                );
            }
        }
    }

    async fn watch_interfaces_removed(
        self: Arc<Self>,
        mut signals: BoxStream<'static, InterfacesRemoved>,
    ) {
        loop {
            let signal = tokio::select! {
                biased;
                _ = self.cancellable.cancelled() => break,
                signal = signals.next() => signal,
            };
            let Some(signal) = signal else {
                debug!("{} stream of {} ended", config::INTERFACES_REMOVED, self.service_name);
                break;
            };
            for interface_name in &signal.interfaces {
                self.remove_interface(signal.object_path.as_str(), interface_name.as_str());
            }
        }
    }

    async fn watch_owner(
        self: Arc<Self>,
        manager: Arc<C::Manager>,
        mut changes: BoxStream<'static, bool>,
    ) {
        loop {
            let present = tokio::select! {
                biased;
                _ = self.cancellable.cancelled() => break,
                present = changes.next() => present,
            };
            match present {
                Some(true) => {
                    self.barrier.hold();
                    self.on_name_appeared(&manager).await;
                    self.complete_load_step();
                }
                Some(false) => self.on_name_vanished(),
                None => break,
            }
        }
    }

    /// Fetch the managed objects and start a proxy for each known interface. Every proxy holds
    /// the load barrier until its initialization finishes. The caller holds the barrier for the
    /// enumeration itself and releases it afterwards.
    async fn on_name_appeared(self: &Arc<Self>, manager: &C::Manager) {
        info!(
            "{} is on the bus, fetching objects under {}",
            self.service_name, self.manager_path
        );
        self.phase.send_replace(LoadPhase::Enumerating);
        let objects = match self.unless_cancelled(manager.get_managed_objects()).await {
            Ok(objects) => objects,
            Err(e) => {
                error!(
                    "{} failed for service {} path {}: {e}",
                    config::GET_MANAGED_OBJECTS,
                    self.service_name,
                    self.manager_path
                );
                return;
            }
        };
        if objects.is_empty() {
            debug!("{} manages no objects", self.service_name);
        }
        for (object_path, interfaces) in &objects {
            for (interface_name, properties) in interfaces {
                self.barrier.hold();
                let inner = self.clone();
                self.clone().add_interface(
                    object_path.as_str(),
                    interface_name.as_str(),
                    properties,
                    Some(Box::new(move || inner.complete_load_step())),
                );
            }
        }
    }

    fn on_name_vanished(&self) {
        info!("{} left the bus, dropping its objects", self.service_name);
        self.phase.send_replace(LoadPhase::ServiceAbsent);
        let _changes = self.lock_changes();
        let tracked: Vec<(String, String)> = {
            let mut state = self.lock_state();
            state.pending.clear();
            state
                .objects
                .iter()
                .flat_map(|(object_path, object)| {
                    object
                        .keys()
                        .map(move |interface_name| (object_path.clone(), interface_name.clone()))
                })
                .collect()
        };
        for (object_path, interface_name) in tracked {
            self.drop_interface(&object_path, &interface_name);
        }
    }

    /// Initialize a proxy for `interface_name` on `object_path` in the background and register
    /// it once ready, unless the pair was removed in the meantime. `on_done` runs on every
    /// outcome.
    fn add_interface(
        self: Arc<Self>,
        object_path: &str,
        interface_name: &str,
        properties: &PropertyBag,
        on_done: Option<OnDone>,
    ) {
        let Some(descriptor) = self.interface_infos.get(interface_name).cloned() else {
            trace!("ignoring {interface_name} on {object_path}: not a known interface");
            if let Some(on_done) = on_done {
                on_done();
            }
            return;
        };
        let missing = descriptor.missing_properties(properties.keys().map(String::as_str));
        if !missing.is_empty() {
            warn!(
                "{object_path} exports {interface_name} without properties {}",
                missing.join(", ")
            );
        }
        let ticket = self.lock_state().begin_init(object_path, interface_name);
        let object_path = object_path.to_string();
        let runtime = self.runtime.clone();
        runtime.spawn(async move {
            let proxy = self
                .unless_cancelled(self.connection.new_interface_proxy(
                    &self.service_name,
                    &object_path,
                    &descriptor,
                ))
                .await;
            match proxy {
                Ok(proxy) => self.register_proxy(&object_path, descriptor.name(), ticket, proxy),
                Err(e) => {
                    self.lock_state().pending.remove(&ticket);
                    warn!(
                        "could not initialize proxy for interface {} on {object_path}: {e}",
                        descriptor.name()
                    );
                }
            }
            if let Some(on_done) = on_done {
                on_done();
            }
        });
    }

    fn register_proxy(
        &self,
        object_path: &str,
        interface_name: &str,
        ticket: u64,
        proxy: C::Proxy,
    ) {
        let _changes = self.lock_changes();
        let mut events = Vec::with_capacity(2);
        {
            let mut state = self.lock_state();
            if state.pending.remove(&ticket).is_none() {
                debug!("{interface_name} on {object_path} went away while initializing");
                return;
            }
            let TreeState {
                objects,
                interfaces,
                ..
            } = &mut *state;
            let is_new_object = !objects.contains_key(object_path);
            let object = objects.entry(object_path.to_string()).or_default();
            if object.contains_key(interface_name) {
                debug!("{interface_name} on {object_path} is already tracked");
                return;
            }
            object.insert(interface_name.to_string(), proxy.clone());
            interfaces
                .entry(interface_name.to_string())
                .or_default()
                .push((object_path.to_string(), proxy.clone()));

            if is_new_object {
                events.push(TreeEvent::ObjectAdded {
                    object_path: object_path.to_string(),
                });
            }
            events.push(TreeEvent::InterfaceAdded {
                object_path: object_path.to_string(),
                interface_name: interface_name.to_string(),
                proxy,
            });
        }
        trace!("tracking {interface_name} on {object_path}");
        for event in &events {
            self.emitter.emit(event);
        }
    }

    fn remove_interface(&self, object_path: &str, interface_name: &str) {
        let _changes = self.lock_changes();
        self.lock_state().abandon_init(object_path, interface_name);
        self.drop_interface(object_path, interface_name);
    }

    /// Forget the proxy of `interface_name` on `object_path` and emit the matching events. The
    /// caller holds the change lock.
    fn drop_interface(&self, object_path: &str, interface_name: &str) {
        let mut events = Vec::with_capacity(2);
        {
            let mut state = self.lock_state();
            let TreeState {
                objects,
                interfaces,
                ..
            } = &mut *state;
            let Some(object) = objects.get_mut(object_path) else {
                return;
            };
            let Some(proxy) = object.remove(interface_name) else {
                return;
            };
            if let Some(proxies) = interfaces.get_mut(interface_name) {
                proxies.retain(|(path, _)| path.as_str() != object_path);
                if proxies.is_empty() {
                    interfaces.remove(interface_name);
                }
            }
            events.push(TreeEvent::InterfaceRemoved {
                object_path: object_path.to_string(),
                interface_name: interface_name.to_string(),
                proxy,
            });
            if object.is_empty() {
                objects.remove(object_path);
                events.push(TreeEvent::ObjectRemoved {
                    object_path: object_path.to_string(),
                });
            }
        }
        trace!("dropped {interface_name} on {object_path}");
        for event in &events {
            self.emitter.emit(event);
        }
    }

    fn complete_load_step(&self) {
        match self.barrier.release() {
            Release::Pending => {}
            Release::Drained => self.settle_phase(),
            Release::FirstDrain => {
                self.settle_phase();
                self.loaded.send_replace(true);
                info!(
                    "object tree of {} at {} loaded",
                    self.service_name, self.manager_path
                );
                let on_loaded = self
                    .on_loaded
                    .lock()
                    .unwrap_or_else(|e| e.into_inner())
                    .take();
                if let Some(on_loaded) = on_loaded {
                    on_loaded();
                }
            }
        }
    }

    fn settle_phase(&self) {
        self.phase.send_if_modified(|phase| {
            if matches!(
                *phase,
                LoadPhase::AwaitingManagerProxy | LoadPhase::Enumerating
            ) {
                *phase = LoadPhase::Ready;
                true
            } else {
                false
            }
        });
    }
}
