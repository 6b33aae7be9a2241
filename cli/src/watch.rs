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


use log::info;
use objmgr::comm::dbus::BusConnection;
use objmgr::{ObjectTree, ObjmgrError};

/// Prints every event of `tree` until Ctrl-C, then cancels the tree.
pub async fn watch<C: BusConnection>(tree: &ObjectTree<C>) -> Result<(), ObjmgrError> {
    let mut events = tree.subscribe();
    let loaded = tree.loaded();
    tokio::pin!(loaded);
    let mut is_loaded = false;
    loop {
        tokio::select! {
            _ = &mut loaded, if !is_loaded => {
                is_loaded = true;
                info!("{} loaded, phase {:?}", tree.service_name(), tree.phase());
            }
            event = events.recv() => match event {
                Some(event) => println!("{event}"),
                None => break,
            },
            interrupted = tokio::signal::ctrl_c() => {
                interrupted.map_err(|e| {
                    ObjmgrError::Internal(format!("Failed to listen for Ctrl-C: {e}"))
                })?;
                break;
            }
        }
    }
    tree.cancel();
    Ok(())
}
