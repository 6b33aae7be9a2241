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

use crate::common::fake_bus::FakeBus;
use crate::common::test_functions::{
    IFACE_A, IFACE_B, IFACE_UNKNOWN, build_tree, index_matches_objects, loaded, next_event,
    next_events, settle,
};
use googletest::prelude::*;
use objmgr::tree::LoadPhase;
use rstest::*;
use std::sync::atomic::Ordering;

#[gtest]
#[tokio::test]
async fn one_object_two_interfaces() {
    let bus = FakeBus::new().with_object("/o/1", &[IFACE_A, IFACE_B]);
    let (tree, ready_count) = build_tree(&bus, &[IFACE_A, IFACE_B]);
    let mut events = tree.subscribe();

    // The object is announced before any of its interfaces, which resolve in any order.
    let first = next_event(&mut events).await.to_string();
    let mut interfaces = next_events(&mut events, 2).await;
    interfaces.sort();
    loaded(&tree).await;
    settle().await;

    expect_that!(first, eq("object-added /o/1"));
    expect_true!(
        interfaces
            == [
                "interface-added /o/1 org.example.A",
                "interface-added /o/1 org.example.B"
            ]
    );
    expect_that!(ready_count.load(Ordering::SeqCst), eq(1));
    expect_that!(tree.phase(), eq(LoadPhase::Ready));
    expect_true!(tree.object_paths() == ["/o/1"]);
    expect_true!(tree.interfaces_of("/o/1") == [IFACE_A, IFACE_B]);
    expect_that!(tree.get_all_proxies().len(), eq(2));
    expect_true!(events.try_recv().is_err());
}

#[gtest]
#[tokio::test]
async fn unknown_interfaces_are_skipped() {
    let bus = FakeBus::new()
        .with_object("/o/1", &[IFACE_A, IFACE_UNKNOWN])
        .with_object("/o/2", &[IFACE_UNKNOWN]);
    let (tree, ready_count) = build_tree(&bus, &[IFACE_A]);
    loaded(&tree).await;
    settle().await;

    expect_that!(ready_count.load(Ordering::SeqCst), eq(1));
    expect_true!(tree.object_paths() == ["/o/1"]);
    expect_true!(tree.interfaces_of("/o/1") == [IFACE_A]);
    expect_true!(tree.interfaces_of("/o/2").is_empty());
    expect_that!(tree.get_proxy("/o/1", IFACE_UNKNOWN), none());
    expect_that!(bus.proxy_attempts(), eq(1));
}

#[gtest]
#[tokio::test]
async fn failed_proxy_does_not_abort_the_others() {
    let bus = FakeBus::new()
        .with_object("/o/1", &[IFACE_A, IFACE_B])
        .with_object("/o/2", &[IFACE_B])
        .with_failing_interface(IFACE_B);
    let (tree, ready_count) = build_tree(&bus, &[IFACE_A, IFACE_B]);
    loaded(&tree).await;
    settle().await;

    expect_that!(ready_count.load(Ordering::SeqCst), eq(1));
    expect_true!(tree.object_paths() == ["/o/1"]);
    expect_that!(tree.get_proxy("/o/1", IFACE_B), none());
    expect_true!(tree.get_proxies_for_interface(IFACE_B).is_empty());
    expect_that!(bus.proxy_attempts(), eq(3));
}

#[gtest]
#[tokio::test]
async fn proxies_are_indexed_by_interface() {
    let bus = FakeBus::new()
        .with_object("/o/1", &[IFACE_A, IFACE_B])
        .with_object("/o/2", &[IFACE_A])
        .with_object("/o/3", &[IFACE_B]);
    let (tree, _) = build_tree(&bus, &[IFACE_A, IFACE_B]);
    loaded(&tree).await;
    settle().await;

    let mut paths: Vec<String> = tree
        .get_proxies_for_interface(IFACE_A)
        .into_iter()
        .map(|proxy| proxy.object_path)
        .collect();
    paths.sort();
    expect_true!(paths == ["/o/1", "/o/2"]);
    expect_true!(index_matches_objects(&tree, IFACE_A));
    expect_true!(index_matches_objects(&tree, IFACE_B));
    expect_true!(tree.get_proxies_for_interface(IFACE_UNKNOWN).is_empty());
    expect_that!(tree.get_all_proxies().len(), eq(4));
}

#[derive(Debug, Clone, Copy)]
enum Setup {
    AllGood,
    NoObjects,
    NoKnownInterfaces,
    ServiceAbsent,
    ManagerFails,
    EnumerationFails,
    EveryProxyFails,
}

fn fake_bus(setup: Setup) -> FakeBus {
    let bus = FakeBus::new();
    if matches!(setup, Setup::NoObjects) {
        return bus;
    }
    let bus = bus.with_object("/o/1", &[IFACE_A, IFACE_B]).with_object("/o/2", &[IFACE_A]);
    match setup {
        Setup::ServiceAbsent => bus.without_owner(),
        Setup::ManagerFails => bus.with_failing_manager(),
        Setup::EnumerationFails => bus.with_failing_enumeration(),
        Setup::EveryProxyFails => bus
            .with_failing_interface(IFACE_A)
            .with_failing_interface(IFACE_B),
        _ => bus,
    }
}

/// The ready callback fires exactly once whatever happens during the initial population.
#[gtest]
#[tokio::test]
#[rstest]
#[case::all_good(Setup::AllGood, true, LoadPhase::Ready, 2)]
#[case::no_objects(Setup::NoObjects, true, LoadPhase::Ready, 0)]
#[case::no_known_interfaces(Setup::NoKnownInterfaces, false, LoadPhase::Ready, 0)]
#[case::service_absent(Setup::ServiceAbsent, true, LoadPhase::ServiceAbsent, 0)]
#[case::manager_fails(Setup::ManagerFails, true, LoadPhase::ManagerUnavailable, 0)]
#[case::enumeration_fails(Setup::EnumerationFails, true, LoadPhase::Ready, 0)]
#[case::every_proxy_fails(Setup::EveryProxyFails, true, LoadPhase::Ready, 0)]
async fn ready_fires_once(
    #[case] setup: Setup,
    #[case] with_descriptors: bool,
    #[case] exp_phase: LoadPhase,
    #[case] exp_objects: usize,
) {
    let bus = fake_bus(setup);
    let known: &[&str] = if with_descriptors {
        &[IFACE_A, IFACE_B]
    } else {
        &[]
    };
    let (tree, ready_count) = build_tree(&bus, known);
    loaded(&tree).await;
    settle().await;

    expect_true!(tree.is_loaded());
    expect_that!(ready_count.load(Ordering::SeqCst), eq(1));
    expect_that!(tree.phase(), eq(exp_phase));
    expect_that!(tree.object_paths().len(), eq(exp_objects));
}
