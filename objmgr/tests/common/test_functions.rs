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

use crate::common::fake_bus::{FakeBus, FakeProxy};
use objmgr::descriptor::InterfaceDescriptor;
use objmgr::tree::ObjectTree;
use objmgr::tree::events::TreeEvent;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::UnboundedReceiver;

pub static SERVICE: &str = "org.example.Service";
pub static MANAGER_PATH: &str = "/org/example";
pub static IFACE_A: &str = "org.example.A";
pub static IFACE_B: &str = "org.example.B";
pub static IFACE_UNKNOWN: &str = "org.example.Unknown";

const EVENT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub fn descriptors(names: &[&str]) -> Vec<InterfaceDescriptor> {
    names
        .iter()
        .map(|name| InterfaceDescriptor::new(name).expect("invalid interface name in test"))
        .collect()
}

/// A tree following `bus` for the `known` interfaces, with a counter of ready callbacks.
pub fn build_tree(bus: &FakeBus, known: &[&str]) -> (ObjectTree<FakeBus>, Arc<AtomicUsize>) {
    init_logging();
    let ready_count = Arc::new(AtomicUsize::new(0));
    let counter = ready_count.clone();
    let tree = ObjectTree::builder(bus.clone())
        .name(SERVICE)
        .object_path(MANAGER_PATH)
        .known_interfaces(descriptors(known))
        .on_loaded(move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .build()
        .expect("failed to build tree");
    (tree, ready_count)
}

pub async fn loaded(tree: &ObjectTree<FakeBus>) {
    tokio::time::timeout(EVENT_TIMEOUT, tree.loaded())
        .await
        .expect("tree did not finish loading");
}

pub async fn next_event(events: &mut UnboundedReceiver<TreeEvent<FakeProxy>>) -> TreeEvent<FakeProxy> {
    tokio::time::timeout(EVENT_TIMEOUT, events.recv())
        .await
        .expect("timed out waiting for a tree event")
        .expect("event channel closed")
}

/// Collect `count` events, rendered with their `Display` form.
pub async fn next_events(
    events: &mut UnboundedReceiver<TreeEvent<FakeProxy>>,
    count: usize,
) -> Vec<String> {
    let mut rendered = Vec::with_capacity(count);
    for _ in 0..count {
        rendered.push(next_event(events).await.to_string());
    }
    rendered
}

/// Let spawned tasks run until nothing is left to do.
pub async fn settle() {
    for _ in 0..32 {
        tokio::task::yield_now().await;
    }
}

/// `get_proxies_for_interface` agrees with `get_proxy` over every tracked object.
pub fn index_matches_objects(tree: &ObjectTree<FakeBus>, interface_name: &str) -> bool {
    let mut from_objects: Vec<FakeProxy> = tree
        .object_paths()
        .iter()
        .filter_map(|object_path| tree.get_proxy(object_path, interface_name))
        .collect();
    let mut from_index = tree.get_proxies_for_interface(interface_name);
    from_objects.sort_by(|a, b| a.object_path.cmp(&b.object_path));
    from_index.sort_by(|a, b| a.object_path.cmp(&b.object_path));
    from_objects == from_index
}

/// Apply `events` to an empty mirror. Fails on the first event that contradicts the state built
/// so far, e.g. an interface announced for an object that was never added.
pub fn replay(
    events: &[TreeEvent<FakeProxy>],
) -> Result<BTreeMap<String, BTreeSet<String>>, String> {
    let mut objects: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for event in events {
        let consistent = match event {
            TreeEvent::ObjectAdded { object_path } => objects
                .insert(object_path.clone(), BTreeSet::new())
                .is_none(),
            TreeEvent::InterfaceAdded {
                object_path,
                interface_name,
                ..
            } => objects
                .get_mut(object_path)
                .is_some_and(|interfaces| interfaces.insert(interface_name.clone())),
            TreeEvent::InterfaceRemoved {
                object_path,
                interface_name,
                ..
            } => objects
                .get_mut(object_path)
                .is_some_and(|interfaces| interfaces.remove(interface_name)),
            TreeEvent::ObjectRemoved { object_path } => objects
                .remove(object_path)
                .is_some_and(|interfaces| interfaces.is_empty()),
        };
        if !consistent {
            return Err(format!("{event} does not follow from the events before it"));
        }
    }
    Ok(objects)
}

/// Current content of `tree` in the shape returned by [`replay`].
pub fn snapshot(tree: &ObjectTree<FakeBus>) -> BTreeMap<String, BTreeSet<String>> {
    tree.object_paths()
        .into_iter()
        .map(|object_path| {
            let interfaces = tree.interfaces_of(&object_path).into_iter().collect();
            (object_path, interfaces)
        })
        .collect()
}

/// Wait until `count` proxy initializations were attempted, then give them time to land.
pub async fn wait_for_attempts(bus: &FakeBus, count: u64) {
    tokio::time::timeout(EVENT_TIMEOUT, async {
        while bus.proxy_attempts() < count {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("proxy initializations did not start");
    tokio::time::sleep(Duration::from_millis(100)).await;
}
