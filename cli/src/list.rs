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


use log::warn;
use objmgr::comm::dbus::BusConnection;
use objmgr::{LoadPhase, ObjectTree, ObjmgrError};

/// Renders objects and their interfaces as an indented list.
fn format_objects(objects: &[(String, Vec<String>)]) -> String {
    let mut message = String::new();
    for (object_path, interfaces) in objects {
        message.push_str(object_path);
        message.push('\n');
        for interface in interfaces {
            message.push_str(&format!("    {interface}\n"));
        }
    }
    message
}

/// Waits for `tree` to load and lists its objects, or only `object` if given.
///
/// # Returns: `Result<String, ObjmgrError>`
/// * `Ok(String)` - One line per object path followed by its indented interfaces
/// * `Err(ObjmgrError::NotFound)` - `object` is not tracked
pub async fn list_message<C: BusConnection>(
    tree: &ObjectTree<C>,
    object: Option<&str>,
) -> Result<String, ObjmgrError> {
    tree.loaded().await;
    match tree.phase() {
        LoadPhase::ManagerUnavailable => warn!(
            "could not reach the object manager of {} at {}",
            tree.service_name(),
            tree.manager_path()
        ),
        LoadPhase::ServiceAbsent => warn!("{} is not on the bus", tree.service_name()),
        _ => {}
    }
    let paths = match object {
        Some(object_path) => vec![object_path.to_string()],
        None => tree.object_paths(),
    };
    let mut objects = Vec::with_capacity(paths.len());
    for object_path in paths {
        let interfaces = tree.interfaces_of(&object_path);
        if interfaces.is_empty() {
            return Err(ObjmgrError::NotFound(format!(
                "{object_path} has no tracked interface on {}",
                tree.service_name()
            )));
        }
        objects.push((object_path, interfaces));
    }
    Ok(format_objects(&objects))
}
