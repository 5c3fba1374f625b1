// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybook::commands::{self, accounts, categories, doctor, payees, transactions, transfers};
use tallybook::entities::{self, users};
use tallybook::models::{TransactionFilter, UserId};
use tallybook::{cli, db, ledger, utils};

fn setup() -> (Connection, UserId) {
    let conn = db::open_in_memory().unwrap();
    let owner = users::create_user(&conn, "alice").unwrap().id;
    (conn, owner)
}

fn matches(args: &[&str]) -> clap::ArgMatches {
    let mut argv = vec!["tallybook"];
    argv.extend_from_slice(args);
    cli::build_cli().get_matches_from(argv)
}

fn run(conn: &mut Connection, owner: UserId, args: &[&str]) -> anyhow::Result<()> {
    let m = matches(args);
    let (name, sub) = m.subcommand().unwrap();
    match name {
        "account" => accounts::handle(conn, owner, sub),
        "category" => categories::handle(conn, owner, sub),
        "payee" => payees::handle(conn, owner, sub),
        "tx" => transactions::handle(conn, owner, sub),
        "transfer" => transfers::handle(conn, owner, sub),
        "doctor" => doctor::handle(conn, owner, sub),
        other => panic!("unexpected command {}", other),
    }
}

fn balance_of(conn: &Connection, owner: UserId, name: &str) -> Decimal {
    let id = utils::id_for_account(conn, owner, name).unwrap();
    entities::accounts::get_account(conn, owner, id).unwrap().balance
}

#[test]
fn account_add_and_edit_through_cli() {
    let (mut conn, owner) = setup();

    run(
        &mut conn,
        owner,
        &[
            "account", "add", "--name", "Card", "--type", "credit", "--balance", "-120.50",
            "--credit-limit", "2000", "--due-day", "25", "--currency", "eur",
        ],
    )
    .unwrap();
    let id = utils::id_for_account(&conn, owner, "Card").unwrap();
    let card = entities::accounts::get_account(&conn, owner, id).unwrap();
    assert_eq!(card.balance, Decimal::new(-12050, 2));
    assert_eq!(card.currency, "EUR");
    assert_eq!(card.payment_due_date, Some(25));

    run(
        &mut conn,
        owner,
        &["account", "edit", "--name", "Card", "--rename", "Visa", "--credit-limit", ""],
    )
    .unwrap();
    let visa = entities::accounts::get_account(&conn, owner, id).unwrap();
    assert_eq!(visa.name, "Visa");
    assert_eq!(visa.credit_limit, None);
}

#[test]
fn bad_day_of_month_is_rejected() {
    let (mut conn, owner) = setup();

    let err = run(
        &mut conn,
        owner,
        &["account", "add", "--name", "Card", "--type", "credit", "--bill-day", "32"],
    )
    .unwrap_err();

    assert!(err.to_string().contains("between 1 and 31"));
    assert!(entities::accounts::list_accounts(&conn, owner).unwrap().is_empty());
}

#[test]
fn tx_add_edit_and_rm_keep_balance_in_step() {
    let (mut conn, owner) = setup();
    run(
        &mut conn,
        owner,
        &["account", "add", "--name", "Everyday", "--type", "checking", "--balance", "100"],
    )
    .unwrap();
    run(&mut conn, owner, &["category", "add", "--name", "Food"]).unwrap();
    run(&mut conn, owner, &["payee", "add", "--name", "Bakery"]).unwrap();

    run(
        &mut conn,
        owner,
        &[
            "tx", "add", "--account", "Everyday", "--amount", "12.5", "--direction", "withdrawal",
            "--date", "2025-05-02", "--category", "Food", "--payee", "Bakery",
        ],
    )
    .unwrap();
    assert_eq!(balance_of(&conn, owner, "Everyday"), Decimal::new(875, 1));

    let page = ledger::list_transactions(&conn, owner, &TransactionFilter::default()).unwrap();
    let id = page.items[0].transaction.id.to_string();
    assert_eq!(page.items[0].category_name.as_deref(), Some("Food"));
    assert_eq!(page.items[0].payee_name.as_deref(), Some("Bakery"));

    run(
        &mut conn,
        owner,
        &["tx", "edit", "--id", &format!(" {} ", id), "--amount", "20", "--category", ""],
    )
    .unwrap();
    assert_eq!(balance_of(&conn, owner, "Everyday"), Decimal::new(80, 0));
    let details = ledger::get_transaction_details(&conn, owner, id.parse().unwrap()).unwrap();
    assert_eq!(details.category_name, None);

    run(&mut conn, owner, &["tx", "list", "--json", "--account", "Everyday"]).unwrap();
    run(&mut conn, owner, &["tx", "rm", "--id", &id]).unwrap();
    assert_eq!(balance_of(&conn, owner, "Everyday"), Decimal::new(100, 0));
}

#[test]
fn transfer_commands_round_trip() {
    let (mut conn, owner) = setup();
    run(
        &mut conn,
        owner,
        &["account", "add", "--name", "A", "--type", "checking", "--balance", "1000"],
    )
    .unwrap();
    run(
        &mut conn,
        owner,
        &["account", "add", "--name", "B", "--type", "savings", "--balance", "500"],
    )
    .unwrap();

    run(
        &mut conn,
        owner,
        &["transfer", "add", "--from", "A", "--to", "B", "--amount", "200", "--date", "2025-05-03"],
    )
    .unwrap();
    assert_eq!(balance_of(&conn, owner, "A"), Decimal::new(800, 0));
    assert_eq!(balance_of(&conn, owner, "B"), Decimal::new(700, 0));

    let link = ledger::list_links(&conn, owner).unwrap().remove(0);
    let incoming = link.to_transaction_id.to_string();
    run(&mut conn, owner, &["transfer", "show", "--id", &incoming]).unwrap();

    let err = run(&mut conn, owner, &["tx", "edit", "--id", &incoming, "--amount", "5"]).unwrap_err();
    assert!(err.to_string().contains("cannot be edited"));

    run(&mut conn, owner, &["transfer", "rm", "--id", &incoming]).unwrap();
    assert_eq!(balance_of(&conn, owner, "A"), Decimal::new(1000, 0));
    assert_eq!(balance_of(&conn, owner, "B"), Decimal::new(500, 0));
    assert!(ledger::list_links(&conn, owner).unwrap().is_empty());
}

#[test]
fn bare_edit_of_transfer_side_is_refused() {
    let (mut conn, owner) = setup();
    for (name, balance) in [("A", "1000"), ("B", "500")] {
        run(
            &mut conn,
            owner,
            &["account", "add", "--name", name, "--type", "checking", "--balance", balance],
        )
        .unwrap();
    }
    run(
        &mut conn,
        owner,
        &["transfer", "add", "--from", "A", "--to", "B", "--amount", "50", "--date", "2025-05-03"],
    )
    .unwrap();
    let link = ledger::list_links(&conn, owner).unwrap().remove(0);

    for id in [link.from_transaction_id, link.to_transaction_id] {
        let err = run(&mut conn, owner, &["tx", "edit", "--id", &id.to_string()]).unwrap_err();
        assert!(err.to_string().contains("cannot be edited"), "{}", err);
    }

    let missing = run(&mut conn, owner, &["tx", "edit", "--id", "999"]).unwrap_err();
    assert!(missing.to_string().contains("not found"), "{}", missing);
}

#[test]
fn doctor_reports_drift() {
    let (mut conn, owner) = setup();
    run(
        &mut conn,
        owner,
        &["account", "add", "--name", "Cash", "--type", "cash", "--balance", "40"],
    )
    .unwrap();
    assert!(doctor::find_issues(&conn, owner).unwrap().is_empty());

    conn.execute("UPDATE accounts SET balance='41'", []).unwrap();

    let issues = doctor::find_issues(&conn, owner).unwrap();
    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].issue, "balance_drift");
    run(&mut conn, owner, &["doctor", "--json"]).unwrap();
}

#[test]
fn owner_resolution_prefers_flag_then_default() {
    let (conn, owner) = setup();
    let bob = users::create_user(&conn, "bob").unwrap().id;

    assert!(commands::resolve_owner(&conn, None).is_err());
    assert_eq!(commands::resolve_owner(&conn, Some("bob")).unwrap(), bob);

    users::set_default_user(&conn, "alice").unwrap();
    assert_eq!(commands::resolve_owner(&conn, None).unwrap(), owner);
    assert!(commands::resolve_owner(&conn, Some("nobody")).is_err());
}

#[test]
fn user_commands_set_default() {
    let conn = db::open_in_memory().unwrap();
    let m = matches(&["user", "add", "--name", "carol", "--default"]);
    let (_, sub) = m.subcommand().unwrap();

    commands::users::handle(&conn, sub).unwrap();

    assert_eq!(users::default_user(&conn).unwrap().as_deref(), Some("carol"));
}

#[test]
fn file_backed_database_persists_between_opens() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("ledger.sqlite");
    {
        let mut conn = db::open_or_init(&path).unwrap();
        let owner = users::create_user(&conn, "alice").unwrap().id;
        run(
            &mut conn,
            owner,
            &["account", "add", "--name", "Everyday", "--type", "checking", "--balance", "5"],
        )
        .unwrap();
    }

    let conn = db::open_or_init(&path).unwrap();
    let owner = utils::id_for_user(&conn, "alice").unwrap();
    assert_eq!(balance_of(&conn, owner, "Everyday"), Decimal::new(5, 0));
}
