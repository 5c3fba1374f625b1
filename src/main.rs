// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Result, bail};

use tallybook::config::Config;
use tallybook::{cli, commands, db, logging, utils};

fn main() -> Result<()> {
    let matches = cli::build_cli().get_matches();
    let config = Config::from_matches(&matches)?;
    logging::init(&config.log_filter);

    let mut conn = db::open_or_init(&config.db_path)?;

    match matches.subcommand() {
        Some(("init", sub)) => {
            if let Some(ccy) = sub.get_one::<String>("currency") {
                utils::set_default_currency(&conn, ccy)?;
            }
            println!(
                "Database initialized at {} (default currency {})",
                config.db_path.display(),
                utils::get_default_currency(&conn)?
            );
        }
        Some(("user", sub)) => commands::users::handle(&conn, sub)?,
        Some((name, sub)) => {
            let owner = commands::resolve_owner(&conn, config.user.as_deref())?;
            tracing::debug!(owner, "running '{}'", name);
            match name {
                "account" => commands::accounts::handle(&mut conn, owner, sub)?,
                "category" => commands::categories::handle(&conn, owner, sub)?,
                "payee" => commands::payees::handle(&conn, owner, sub)?,
                "tx" => commands::transactions::handle(&mut conn, owner, sub)?,
                "transfer" => commands::transfers::handle(&mut conn, owner, sub)?,
                "doctor" => commands::doctor::handle(&conn, owner, sub)?,
                other => bail!("unknown command '{}'", other),
            }
        }
        None => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
