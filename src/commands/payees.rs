// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{arg, clearable, or_dash, output_flags, required};
use crate::entities::payees;
use crate::models::{NewPayee, PayeePatch, UserId};
use crate::utils::{id_for_payee, maybe_print_json, pretty_table};

pub fn handle(conn: &Connection, owner: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let new = NewPayee {
                name: required(sub, "name")?.to_string(),
                email: arg(sub, "email").map(str::to_string),
                phone: arg(sub, "phone").map(str::to_string),
                address: arg(sub, "address").map(str::to_string),
            };
            let payee = payees::create_payee(conn, owner, &new)?;
            println!("Added payee '{}'", payee.name);
        }
        Some(("list", sub)) => {
            let (json, jsonl) = output_flags(sub);
            let list = payees::list_payees(conn, owner)?;
            if !maybe_print_json(json, jsonl, &list)? {
                let rows = list
                    .iter()
                    .map(|p| {
                        vec![
                            p.id.to_string(),
                            p.name.clone(),
                            or_dash(p.email.as_deref()),
                            or_dash(p.phone.as_deref()),
                            or_dash(p.address.as_deref()),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Email", "Phone", "Address"], rows)
                );
            }
        }
        Some(("edit", sub)) => {
            let id = id_for_payee(conn, owner, required(sub, "name")?)?;
            let patch = PayeePatch {
                name: arg(sub, "rename").map(str::to_string),
                email: clearable(sub, "email"),
                phone: clearable(sub, "phone"),
                address: clearable(sub, "address"),
            };
            let payee = payees::update_payee(conn, owner, id, &patch)?;
            println!("Updated payee '{}'", payee.name);
        }
        Some(("rm", sub)) => {
            let name = required(sub, "name")?;
            let id = id_for_payee(conn, owner, name)?;
            payees::delete_payee(conn, owner, id)?;
            println!("Removed payee '{}'", name.trim());
        }
        _ => {}
    }
    Ok(())
}
