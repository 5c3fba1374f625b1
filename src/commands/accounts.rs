// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use rusqlite::Connection;

use super::{arg, clearable, output_flags, required};
use crate::entities::accounts;
use crate::models::{Account, AccountPatch, AccountStatus, AccountType, NewAccount, UserId};
use crate::utils::{
    fmt_money, id_for_account, maybe_print_json, parse_date, parse_day_of_month, parse_decimal,
    pretty_table,
};

pub fn handle(conn: &mut Connection, owner: UserId, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, owner, sub)?,
        Some(("list", sub)) => {
            let (json, jsonl) = output_flags(sub);
            let list = accounts::list_accounts(conn, owner)?;
            if !maybe_print_json(json, jsonl, &list)? {
                let rows = list.iter().map(account_row).collect();
                println!(
                    "{}",
                    pretty_table(&["ID", "Name", "Type", "Balance", "Status", "Opened"], rows)
                );
            }
        }
        Some(("show", sub)) => {
            let (json, jsonl) = output_flags(sub);
            let id = id_for_account(conn, owner, required(sub, "name")?)?;
            let account = accounts::get_account(conn, owner, id)?;
            if !maybe_print_json(json, jsonl, &account)? {
                print_account(&account);
            }
        }
        Some(("edit", sub)) => edit(conn, owner, sub)?,
        Some(("rm", sub)) => {
            let name = required(sub, "name")?;
            let id = id_for_account(conn, owner, name)?;
            accounts::delete_account(conn, owner, id)?;
            println!("Removed account '{}'", name.trim());
        }
        _ => {}
    }
    Ok(())
}

fn add(conn: &Connection, owner: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let r#type = required(sub, "type")?.parse::<AccountType>()?;
    let mut new = NewAccount::new(required(sub, "name")?, r#type);
    if let Some(balance) = arg(sub, "balance") {
        new.balance = parse_decimal(balance)?;
    }
    new.credit_limit = arg(sub, "credit-limit").map(parse_decimal).transpose()?;
    new.bill_generation_date = arg(sub, "bill-day")
        .map(|d| parse_day_of_month("bill_generation_date", d))
        .transpose()?;
    new.payment_due_date = arg(sub, "due-day")
        .map(|d| parse_day_of_month("payment_due_date", d))
        .transpose()?;
    if let Some(status) = arg(sub, "status") {
        new.status = status.parse::<AccountStatus>()?;
    }
    new.opening_date = arg(sub, "opened").map(parse_date).transpose()?;
    new.currency = arg(sub, "currency").map(str::to_string);

    let account = accounts::create_account(conn, owner, &new)?;
    println!(
        "Added account '{}' ({}, {})",
        account.name,
        account.r#type,
        fmt_money(&account.balance, &account.currency)
    );
    Ok(())
}

fn edit(conn: &mut Connection, owner: UserId, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_for_account(conn, owner, required(sub, "name")?)?;
    let patch = AccountPatch {
        name: arg(sub, "rename").map(str::to_string),
        r#type: arg(sub, "type").map(str::parse::<AccountType>).transpose()?,
        balance: arg(sub, "balance").map(parse_decimal).transpose()?,
        credit_limit: clearable(sub, "credit-limit")
            .map(|v| v.as_deref().map(parse_decimal).transpose())
            .transpose()?,
        bill_generation_date: clearable(sub, "bill-day")
            .map(|v| {
                v.as_deref()
                    .map(|d| parse_day_of_month("bill_generation_date", d))
                    .transpose()
            })
            .transpose()?,
        payment_due_date: clearable(sub, "due-day")
            .map(|v| {
                v.as_deref()
                    .map(|d| parse_day_of_month("payment_due_date", d))
                    .transpose()
            })
            .transpose()?,
        status: arg(sub, "status").map(str::parse::<AccountStatus>).transpose()?,
        opening_date: arg(sub, "opened").map(parse_date).transpose()?,
        currency: arg(sub, "currency").map(str::to_string),
    };
    let account = accounts::update_account(conn, owner, id, &patch)?;
    println!(
        "Updated account '{}' ({})",
        account.name,
        fmt_money(&account.balance, &account.currency)
    );
    Ok(())
}

fn account_row(a: &Account) -> Vec<String> {
    vec![
        a.id.to_string(),
        a.name.clone(),
        a.r#type.to_string(),
        fmt_money(&a.balance, &a.currency),
        a.status.to_string(),
        a.opening_date.to_string(),
    ]
}

fn print_account(a: &Account) {
    let day = |d: Option<u8>| d.map(|d| d.to_string()).unwrap_or_else(|| "-".to_string());
    let rows = vec![
        vec!["Name".to_string(), a.name.clone()],
        vec!["Type".to_string(), a.r#type.to_string()],
        vec!["Balance".to_string(), fmt_money(&a.balance, &a.currency)],
        vec![
            "Opening balance".to_string(),
            fmt_money(&a.opening_balance, &a.currency),
        ],
        vec![
            "Credit limit".to_string(),
            a.credit_limit
                .map(|l| fmt_money(&l, &a.currency))
                .unwrap_or_else(|| "-".to_string()),
        ],
        vec!["Bill day".to_string(), day(a.bill_generation_date)],
        vec!["Due day".to_string(), day(a.payment_due_date)],
        vec!["Status".to_string(), a.status.to_string()],
        vec!["Opened".to_string(), a.opening_date.to_string()],
    ];
    println!("{}", pretty_table(&["Field", "Value"], rows));
}
