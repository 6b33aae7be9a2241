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

#[derive(Debug, thiserror::Error)]
pub enum ObjmgrError {
    #[error("ObjmgrError::Argument: {0}")]
    Argument(String),
    #[error("ObjmgrError::Bus: A D-Bus transport error occurred: {0}")]
    Bus(#[from] zbus::Error),
    #[error("ObjmgrError::Fdo: The remote service replied with an error: {0}")]
    Fdo(#[from] zbus::fdo::Error),
    #[error("ObjmgrError::Cancelled: The operation was cancelled")]
    Cancelled,
    #[error("ObjmgrError::NotFound: {0}")]
    NotFound(String),
    #[error("ObjmgrError::Internal: An Internal error occurred: {0}")]
    Internal(String),
}
