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

//! Interface descriptors.
//!
//! An [`InterfaceDescriptor`] names a D-Bus interface that an
//! [`ObjectTree`](crate::tree::ObjectTree) is willing to create proxies for, together with the
//! properties the caller expects it to carry. Objects exporting interfaces with no registered
//! descriptor are ignored by the tree. An object exporting a known interface without one of the
//! expected properties is still tracked, and the gap is logged.
//!
//! # Examples
//!
//! ```rust
//! use objmgr::descriptor::InterfaceDescriptor;
//!
//! let pad = InterfaceDescriptor::new("org.gnome.Mutter.InputDevice.Pad")?
//!     .with_property("Name")
//!     .with_property("NumButtons");
//! assert_eq!(pad.name(), "org.gnome.Mutter.InputDevice.Pad");
//! assert_eq!(pad.missing_properties(["Name"]), ["NumButtons"]);
//! # Ok::<(), objmgr::error::ObjmgrError>(())
//! ```

use crate::error::ObjmgrError;
use std::collections::HashSet;
use zbus::names::InterfaceName;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InterfaceDescriptor {
    name: String,
    properties: Vec<String>,
}

impl InterfaceDescriptor {
    /// Create a descriptor for the interface called `name`.
    ///
    /// # Arguments
    ///
    /// * `name` - A well-formed D-Bus interface name, e.g. `org.example.Device`
    ///
    /// # Returns: `Result<InterfaceDescriptor, ObjmgrError>`
    /// * `Ok(InterfaceDescriptor)` - Descriptor expecting no properties
    /// * `Err(ObjmgrError::Argument)` - `name` is not a valid interface name
    pub fn new(name: &str) -> Result<Self, ObjmgrError> {
        InterfaceName::try_from(name).map_err(|e| {
            ObjmgrError::Argument(format!("{name:?} is not a valid interface name: {e}"))
        })?;
        Ok(InterfaceDescriptor {
            name: name.to_string(),
            properties: Vec::new(),
        })
    }

    pub fn with_property(mut self, property: &str) -> Self {
        self.properties.push(property.to_string());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn properties(&self) -> &[String] {
        &self.properties
    }

    /// Expected properties absent from `exported`, in declaration order.
    pub fn missing_properties<'a, I>(&self, exported: I) -> Vec<&str>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let exported: HashSet<&str> = exported.into_iter().collect();
        self.properties
            .iter()
            .map(String::as_str)
            .filter(|property| !exported.contains(property))
            .collect()
    }
}
