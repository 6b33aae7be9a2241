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


//! `objmgr_cli` - print the object tree a D-Bus service exports through
//! `org.freedesktop.DBus.ObjectManager`, once or as it changes.
//!
//! ```text
//! objmgr_cli --system --interface org.bluez.Adapter1 list org.bluez /
//! objmgr_cli --interface org.gnome.Mutter.InputDevice.Pad watch org.gnome.Mutter.InputDevices /org/gnome/Mutter/InputDevices
//! ```

mod list;
mod watch;

use clap::{Parser, Subcommand, arg, command};
use log::{debug, warn};
use objmgr::{InterfaceDescriptor, ObjectTree, ObjmgrError, ZbusConnection};
use std::error::Error;

#[derive(Parser, Debug)]
#[command(name = "objmgr_cli")]
#[command(bin_name = "objmgr_cli")]
struct Cli {
    #[arg(long, conflicts_with = "session", help = "Connect to the system bus")]
    system: bool,
    #[arg(long, help = "Connect to the session bus (default)")]
    session: bool,
    #[arg(
        long = "interface",
        value_name = "NAME",
        help = r#"Interface to track on the remote objects. Repeat the option to track
several interfaces. Objects exporting none of them are not shown.
        "#
    )]
    interfaces: Vec<String>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Print the tracked objects once the tree is loaded
    List {
        /// Bus name of the service, e.g. org.bluez
        service: String,
        /// Path the service exports its object manager at
        path: String,
        #[arg(long, value_name = "OBJECT_PATH", help = "Only print this object")]
        object: Option<String>,
    },
    /// Print tree events until interrupted
    Watch {
        /// Bus name of the service, e.g. org.bluez
        service: String,
        /// Path the service exports its object manager at
        path: String,
    },
}

async fn open_tree(
    system: bool,
    interfaces: &[String],
    service: &str,
    path: &str,
) -> Result<ObjectTree<ZbusConnection>, ObjmgrError> {
    let connection = if system {
        ZbusConnection::system().await?
    } else {
        ZbusConnection::session().await?
    };
    if interfaces.is_empty() {
        warn!("no --interface given, no object will be tracked");
    }
    let descriptors = interfaces
        .iter()
        .map(|name| InterfaceDescriptor::new(name))
        .collect::<Result<Vec<_>, _>>()?;
    ObjectTree::builder(connection)
        .name(service)
        .object_path(path)
        .known_interfaces(descriptors)
        .build()
}

// The tree only starts loading once `main` awaits, after `watch` has subscribed.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = Cli::parse();
    debug!("parsed cli command with {cli:?}");
    let system = cli.system && !cli.session;
    match cli.command {
        Commands::List {
            service,
            path,
            object,
        } => {
            let tree = open_tree(system, &cli.interfaces, &service, &path).await?;
            let message = list::list_message(&tree, object.as_deref()).await?;
            print!("{message}");
        }
        Commands::Watch { service, path } => {
            let tree = open_tree(system, &cli.interfaces, &service, &path).await?;
            watch::watch(&tree).await?;
        }
    }
    Ok(())
}
