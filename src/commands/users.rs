// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{output_flags, required};
use crate::entities::users;
use crate::utils::{maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let user = users::create_user(conn, required(sub, "name")?)?;
            if sub.get_flag("default") {
                users::set_default_user(conn, &user.name)?;
            }
            println!("Added user '{}' (id {})", user.name, user.id);
        }
        Some(("list", sub)) => {
            let (json, jsonl) = output_flags(sub);
            let list = users::list_users(conn)?;
            if !maybe_print_json(json, jsonl, &list)? {
                let current = users::default_user(conn)?;
                let rows = list
                    .into_iter()
                    .map(|u| {
                        let marker = if current.as_deref() == Some(u.name.as_str()) {
                            "*"
                        } else {
                            ""
                        };
                        vec![u.id.to_string(), u.name, marker.to_string(), u.created_at.to_string()]
                    })
                    .collect();
                println!("{}", pretty_table(&["ID", "Name", "Default", "Created"], rows));
            }
        }
        Some(("use", sub)) => {
            let name = required(sub, "name")?;
            users::set_default_user(conn, name)?;
            println!("Now acting as '{}'", name.trim());
        }
        _ => {}
    }
    Ok(())
}
