// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use rusqlite::Connection;

use super::{arg, clearable, or_dash, output_flags, parse_id, required};
use crate::ledger;
use crate::models::{
    Direction, NewTransaction, TransactionDetails, TransactionFilter, TransactionKind,
    TransactionPatch, TransferSide, UserId,
};
use crate::utils::{
    fmt_money, id_for_account, id_for_category, id_for_payee, maybe_print_json, parse_date,
    parse_decimal, pretty_table,
};

pub fn handle(conn: &mut Connection, owner: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, owner, sub)?,
        Some(("list", sub)) => list(conn, owner, sub)?,
        Some(("show", sub)) => {
            let (json, jsonl) = output_flags(sub);
            let id = parse_id(required(sub, "id")?)?;
            let details = ledger::get_transaction_details(conn, owner, id)?;
            if !maybe_print_json(json, jsonl, &details)? {
                println!("{}", pretty_table(HEADERS, vec![details_row(&details)]));
            }
        }
        Some(("edit", sub)) => edit(conn, owner, sub)?,
        Some(("rm", sub)) => {
            let id = parse_id(required(sub, "id")?)?;
            ledger::delete_transaction(conn, owner, id)?;
            println!("Removed transaction {}", id);
        }
        _ => {}
    }
    Ok(())
}

const HEADERS: &[&str] = &[
    "ID", "Date", "Account", "Amount", "Type", "Category", "Payee", "Description", "Transfer",
];

fn add(conn: &mut Connection, owner: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let account_name = required(sub, "account")?;
    let account_id = id_for_account(conn, owner, account_name)?;
    let amount = parse_decimal(required(sub, "amount")?)?;
    let direction = required(sub, "direction")?.parse::<Direction>()?;
    let date = parse_date(required(sub, "date")?)?;

    let lookup: &Connection = conn;
    let mut new = NewTransaction::new(account_id, amount, direction, date);
    new.category_id = arg(sub, "category")
        .map(|c| id_for_category(lookup, owner, c))
        .transpose()?;
    new.payee_id = arg(sub, "payee")
        .map(|p| id_for_payee(lookup, owner, p))
        .transpose()?;
    new.description = arg(sub, "description").map(str::to_string);
    new.notes = arg(sub, "notes").map(str::to_string);

    let created = ledger::create_transaction(conn, owner, &new)?;
    println!(
        "Recorded {} {} on {} (acct: {}, id {})",
        created.kind,
        created.amount,
        created.date,
        account_name.trim(),
        created.id
    );
    Ok(())
}

fn edit(conn: &mut Connection, owner: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let id = parse_id(required(sub, "id")?)?;
    let lookup: &Connection = conn;
    let patch = TransactionPatch {
        account_id: arg(sub, "account")
            .map(|a| id_for_account(lookup, owner, a))
            .transpose()?,
        category_id: clearable(sub, "category")
            .map(|c| c.map(|c| id_for_category(lookup, owner, &c)).transpose())
            .transpose()?,
        payee_id: clearable(sub, "payee")
            .map(|p| p.map(|p| id_for_payee(lookup, owner, &p)).transpose())
            .transpose()?,
        amount: arg(sub, "amount").map(parse_decimal).transpose()?,
        direction: arg(sub, "direction").map(str::parse::<Direction>).transpose()?,
        description: clearable(sub, "description"),
        notes: clearable(sub, "notes"),
        date: arg(sub, "date").map(parse_date).transpose()?,
    };
    ledger::get_transaction(conn, owner, id)?;
    if patch.is_empty() && ledger::find_link(conn, owner, id)?.is_none() {
        println!("Nothing to change for transaction {}", id);
        return Ok(());
    }
    let updated = ledger::update_transaction(conn, owner, id, &patch)?;
    println!(
        "Updated transaction {} ({} {})",
        updated.id, updated.kind, updated.amount
    );
    Ok(())
}

fn list(conn: &Connection, owner: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let (json, jsonl) = output_flags(sub);
    let mut filter = TransactionFilter {
        account_id: arg(sub, "account")
            .map(|a| id_for_account(conn, owner, a))
            .transpose()?,
        category_id: arg(sub, "category")
            .map(|c| id_for_category(conn, owner, c))
            .transpose()?,
        payee_id: arg(sub, "payee")
            .map(|p| id_for_payee(conn, owner, p))
            .transpose()?,
        kind: arg(sub, "type").map(str::parse::<TransactionKind>).transpose()?,
        from: arg(sub, "from").map(parse_date).transpose()?,
        to: arg(sub, "to").map(parse_date).transpose()?,
        ..Default::default()
    };
    if let Some(page) = arg(sub, "page") {
        filter.page = page
            .trim()
            .parse()
            .with_context(|| format!("Invalid page '{}'", page))?;
    }
    if let Some(limit) = arg(sub, "limit") {
        filter.limit = limit
            .trim()
            .parse()
            .with_context(|| format!("Invalid limit '{}'", limit))?;
    }

    let page = ledger::list_transactions(conn, owner, &filter)?;
    if jsonl {
        maybe_print_json(false, true, &page.items)?;
    } else if !maybe_print_json(json, false, &page)? {
        let rows = page.items.iter().map(details_row).collect();
        println!("{}", pretty_table(HEADERS, rows));
        println!(
            "Page {} of {} ({} transactions)",
            page.page,
            page.pages.max(1),
            page.total
        );
    }
    Ok(())
}

fn details_row(d: &TransactionDetails) -> Vec<String> {
    let t = &d.transaction;
    let transfer = match (d.transfer_side, d.counterpart_account_name.as_deref()) {
        (Some(TransferSide::Outgoing), Some(to)) => format!("to {}", to),
        (Some(TransferSide::Incoming), Some(from)) => format!("from {}", from),
        (Some(_), None) => "yes".to_string(),
        (None, _) => String::new(),
    };
    vec![
        t.id.to_string(),
        t.date.to_string(),
        d.account_name.clone(),
        fmt_money(&t.amount, &d.currency),
        t.kind.to_string(),
        or_dash(d.category_name.as_deref()),
        or_dash(d.payee_name.as_deref()),
        or_dash(t.description.as_deref()),
        transfer,
    ]
}
