// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{arg, output_flags, required};
use crate::entities::categories;
use crate::models::{CategoryPatch, UserId};
use crate::utils::{id_for_category, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, owner: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let category = categories::create_category(
                conn,
                owner,
                required(sub, "name")?,
                arg(sub, "color"),
            )?;
            println!("Added category '{}' ({})", category.name, category.color);
        }
        Some(("list", sub)) => {
            let (json, jsonl) = output_flags(sub);
            let list = categories::list_categories(conn, owner)?;
            if !maybe_print_json(json, jsonl, &list)? {
                let rows = list
                    .into_iter()
                    .map(|c| vec![c.id.to_string(), c.name, c.color])
                    .collect();
                println!("{}", pretty_table(&["ID", "Name", "Color"], rows));
            }
        }
        Some(("edit", sub)) => {
            let id = id_for_category(conn, owner, required(sub, "name")?)?;
            let patch = CategoryPatch {
                name: arg(sub, "rename").map(str::to_string),
                color: arg(sub, "color").map(str::to_string),
            };
            let category = categories::update_category(conn, owner, id, &patch)?;
            println!("Updated category '{}' ({})", category.name, category.color);
        }
        Some(("rm", sub)) => {
            let name = required(sub, "name")?;
            let id = id_for_category(conn, owner, name)?;
            categories::delete_category(conn, owner, id)?;
            println!("Removed category '{}'", name.trim());
        }
        _ => {}
    }
    Ok(())
}
