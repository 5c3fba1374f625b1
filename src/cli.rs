// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use clap::{Arg, ArgAction, Command, crate_version};

use crate::config::{DB_ENV, USER_ENV};

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

/// A decimal option that may be given a negative value.
fn money(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).allow_negative_numbers(true)
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Print JSON"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("Print one JSON object per line"),
    )
}

fn user_cmd() -> Command {
    Command::new("user")
        .about("Manage users")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Create a user")
                .arg(req("name", "User name"))
                .arg(
                    Arg::new("default")
                        .long("default")
                        .action(ArgAction::SetTrue)
                        .help("Act as this user when --user is not given"),
                ),
        )
        .subcommand(json_flags(Command::new("list").about("List users")))
        .subcommand(
            Command::new("use")
                .about("Set the default user")
                .arg(req("name", "User name")),
        )
}

fn account_cmd() -> Command {
    Command::new("account")
        .about("Manage accounts")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Open an account")
                .arg(req("name", "Account name"))
                .arg(req(
                    "type",
                    "checking, savings, credit, cash or investment",
                ))
                .arg(money("balance", "Opening balance (default 0)"))
                .arg(opt("credit-limit", "Credit limit"))
                .arg(opt("bill-day", "Day of month the bill is generated (1-31)"))
                .arg(opt("due-day", "Day of month payment is due (1-31)"))
                .arg(opt("status", "active, inactive or closed"))
                .arg(opt("opened", "Opening date YYYY-MM-DD (default today)"))
                .arg(opt("currency", "Currency code (default from settings)")),
        )
        .subcommand(json_flags(Command::new("list").about("List accounts")))
        .subcommand(json_flags(
            Command::new("show")
                .about("Show one account")
                .arg(req("name", "Account name")),
        ))
        .subcommand(
            Command::new("edit")
                .about("Edit an account; pass an empty value to clear optional fields")
                .arg(req("name", "Account name"))
                .arg(opt("rename", "New name"))
                .arg(opt("type", "New type"))
                .arg(money("balance", "Set the balance directly"))
                .arg(opt("credit-limit", "Credit limit"))
                .arg(opt("bill-day", "Bill generation day"))
                .arg(opt("due-day", "Payment due day"))
                .arg(opt("status", "active, inactive or closed"))
                .arg(opt("opened", "Opening date YYYY-MM-DD"))
                .arg(opt("currency", "Currency code")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an account without transactions")
                .arg(req("name", "Account name")),
        )
}

fn category_cmd() -> Command {
    Command::new("category")
        .about("Manage categories")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Create a category")
                .arg(req("name", "Category name"))
                .arg(opt("color", "Colour as #RRGGBB")),
        )
        .subcommand(json_flags(Command::new("list").about("List categories")))
        .subcommand(
            Command::new("edit")
                .about("Edit a category")
                .arg(req("name", "Category name"))
                .arg(opt("rename", "New name"))
                .arg(opt("color", "Colour as #RRGGBB")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an unused category")
                .arg(req("name", "Category name")),
        )
}

fn payee_cmd() -> Command {
    Command::new("payee")
        .about("Manage payees")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Create a payee")
                .arg(req("name", "Payee name"))
                .arg(opt("email", "Email address"))
                .arg(opt("phone", "Phone number"))
                .arg(opt("address", "Postal address")),
        )
        .subcommand(json_flags(Command::new("list").about("List payees")))
        .subcommand(
            Command::new("edit")
                .about("Edit a payee; pass an empty value to clear a contact field")
                .arg(req("name", "Payee name"))
                .arg(opt("rename", "New name"))
                .arg(opt("email", "Email address"))
                .arg(opt("phone", "Phone number"))
                .arg(opt("address", "Postal address")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete an unused payee")
                .arg(req("name", "Payee name")),
        )
}

fn tx_cmd() -> Command {
    Command::new("tx")
        .about("Record and edit transactions")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Record a deposit or withdrawal")
                .arg(req("account", "Account name"))
                .arg(money("amount", "Amount; the sign is taken from --direction").required(true))
                .arg(req("direction", "deposit or withdrawal"))
                .arg(req("date", "Date YYYY-MM-DD"))
                .arg(opt("category", "Category name"))
                .arg(opt("payee", "Payee name"))
                .arg(opt("description", "Description"))
                .arg(opt("notes", "Notes")),
        )
        .subcommand(json_flags(
            Command::new("list")
                .about("List transactions, newest first")
                .arg(opt("account", "Only this account"))
                .arg(opt("category", "Only this category"))
                .arg(opt("payee", "Only this payee"))
                .arg(opt("type", "income or expense"))
                .arg(opt("from", "Earliest date YYYY-MM-DD"))
                .arg(opt("to", "Latest date YYYY-MM-DD"))
                .arg(opt("page", "Page number (default 1)"))
                .arg(opt("limit", "Rows per page (default 50)")),
        ))
        .subcommand(json_flags(
            Command::new("show")
                .about("Show one transaction")
                .arg(req("id", "Transaction id")),
        ))
        .subcommand(
            Command::new("edit")
                .about("Edit a transaction; pass an empty value to clear optional fields")
                .arg(req("id", "Transaction id"))
                .arg(opt("account", "Move to this account"))
                .arg(money("amount", "New amount"))
                .arg(opt("direction", "deposit or withdrawal"))
                .arg(opt("date", "Date YYYY-MM-DD"))
                .arg(opt("category", "Category name"))
                .arg(opt("payee", "Payee name"))
                .arg(opt("description", "Description"))
                .arg(opt("notes", "Notes")),
        )
        .subcommand(
            Command::new("rm")
                .about("Delete a transaction (both sides for a transfer)")
                .arg(req("id", "Transaction id")),
        )
}

fn transfer_cmd() -> Command {
    Command::new("transfer")
        .about("Move money between accounts")
        .subcommand_required(true)
        .subcommand(
            Command::new("add")
                .about("Create a transfer")
                .arg(req("from", "Source account name"))
                .arg(req("to", "Destination account name"))
                .arg(money("amount", "Positive amount").required(true))
                .arg(req("date", "Date YYYY-MM-DD"))
                .arg(opt("description", "Description"))
                .arg(opt("notes", "Notes")),
        )
        .subcommand(json_flags(Command::new("list").about("List transfers")))
        .subcommand(json_flags(
            Command::new("show")
                .about("Show the transfer a transaction belongs to")
                .arg(req("id", "Either transaction id")),
        ))
        .subcommand(
            Command::new("rm")
                .about("Delete a transfer given either transaction id")
                .arg(req("id", "Either transaction id")),
        )
}

pub fn build_cli() -> Command {
    Command::new("tallybook")
        .version(crate_version!())
        .about("Personal finance ledger: accounts, transactions and transfers")
        .arg(
            Arg::new("db")
                .long("db")
                .global(true)
                .env(DB_ENV)
                .help("Path of the SQLite database"),
        )
        .arg(
            Arg::new("user")
                .long("user")
                .short('u')
                .global(true)
                .env(USER_ENV)
                .help("Act as this user"),
        )
        .arg(
            Arg::new("verbose")
                .long("verbose")
                .short('v')
                .global(true)
                .action(ArgAction::Count)
                .help("Log more (-v info, -vv debug)"),
        )
        .subcommand(
            Command::new("init")
                .about("Create the database")
                .arg(opt("currency", "Default currency for new accounts")),
        )
        .subcommand(user_cmd())
        .subcommand(account_cmd())
        .subcommand(category_cmd())
        .subcommand(payee_cmd())
        .subcommand(tx_cmd())
        .subcommand(transfer_cmd())
        .subcommand(json_flags(
            Command::new("doctor").about("Check balances against transaction history"),
        ))
}

#[cfg(test)]
mod tests {
    use super::build_cli;

    #[test]
    fn cli_is_well_formed() {
        build_cli().debug_assert();
    }
}
