// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::collections::HashMap;

use anyhow::Result;
use rusqlite::Connection;

use super::{arg, or_dash, output_flags, parse_id, required};
use crate::entities::accounts;
use crate::ledger;
use crate::models::{AccountId, NewTransfer, TransferLink, UserId};
use crate::utils::{
    id_for_account, maybe_print_json, parse_date, parse_decimal, pretty_table,
};

pub fn handle(conn: &mut Connection, owner: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let from = required(sub, "from")?;
            let to = required(sub, "to")?;
            let mut new = NewTransfer::new(
                id_for_account(conn, owner, from)?,
                id_for_account(conn, owner, to)?,
                parse_decimal(required(sub, "amount")?)?,
                parse_date(required(sub, "date")?)?,
            );
            new.description = arg(sub, "description").map(str::to_string);
            new.notes = arg(sub, "notes").map(str::to_string);

            let transfer = ledger::create_transfer(conn, owner, &new)?;
            println!(
                "Transferred {} from '{}' to '{}' (transactions {} and {})",
                transfer.link.amount,
                from.trim(),
                to.trim(),
                transfer.outgoing.id,
                transfer.incoming.id
            );
        }
        Some(("list", sub)) => {
            let (json, jsonl) = output_flags(sub);
            let links = ledger::list_links(conn, owner)?;
            if !maybe_print_json(json, jsonl, &links)? {
                let names = account_names(conn, owner)?;
                let rows = links.iter().map(|l| link_row(l, &names)).collect();
                println!("{}", pretty_table(LINK_HEADERS, rows));
            }
        }
        Some(("show", sub)) => {
            let (json, jsonl) = output_flags(sub);
            let id = parse_id(required(sub, "id")?)?;
            let transfer = ledger::get_transfer(conn, owner, id)?;
            if !maybe_print_json(json, jsonl, &transfer)? {
                let names = account_names(conn, owner)?;
                println!(
                    "{}",
                    pretty_table(LINK_HEADERS, vec![link_row(&transfer.link, &names)])
                );
            }
        }
        Some(("rm", sub)) => {
            let id = parse_id(required(sub, "id")?)?;
            ledger::delete_transfer(conn, owner, id)?;
            println!("Removed transfer containing transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

const LINK_HEADERS: &[&str] = &["ID", "Date", "From", "To", "Amount", "Description", "Transactions"];

fn account_names(conn: &Connection, owner: UserId) -> Result<HashMap<AccountId, String>> {
    Ok(accounts::list_accounts(conn, owner)?
        .into_iter()
        .map(|a| (a.id, a.name))
        .collect())
}

fn link_row(l: &TransferLink, names: &HashMap<AccountId, String>) -> Vec<String> {
    let name = |id: AccountId| names.get(&id).cloned().unwrap_or_else(|| id.to_string());
    vec![
        l.id.to_string(),
        l.date.to_string(),
        name(l.from_account_id),
        name(l.to_account_id),
        l.amount.to_string(),
        or_dash(l.description.as_deref()),
        format!("{} -> {}", l.from_transaction_id, l.to_transaction_id),
    ]
}
