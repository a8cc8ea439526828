// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::reports;
use crate::error::LedgerError;
use crate::models::BudgetStatus;
use crate::utils::{
    json_flags, maybe_print_json, parse_date, parse_decimal, pretty_table, user_arg, DateRange,
};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => set(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("status", sub)) => status(conn, sub)?,
        _ => {}
    }
    Ok(())
}

/// Upsert the user's monthly budget.
pub fn set_budget(conn: &Connection, user_id: &str, amount: Decimal) -> Result<i64> {
    if amount < Decimal::ZERO {
        return Err(LedgerError::NegativeBudget(amount.to_string()).into());
    }
    conn.execute(
        "INSERT INTO budgets(user_id, monthly_budget) VALUES (?1, ?2)
         ON CONFLICT(user_id) DO UPDATE SET monthly_budget=excluded.monthly_budget,
                                            updated_at=datetime('now')",
        params![user_id, amount.to_string()],
    )?;
    let id: i64 = conn.query_row(
        "SELECT id FROM budgets WHERE user_id=?1",
        params![user_id],
        |r| r.get(0),
    )?;
    tracing::info!(user = user_id, amount = %amount, "monthly budget set");
    Ok(id)
}

/// Monthly budget, or zero when the user never set one.
pub fn get_budget(conn: &Connection, user_id: &str) -> Result<Decimal> {
    let v: Option<String> = conn
        .query_row(
            "SELECT monthly_budget FROM budgets WHERE user_id=?1",
            params![user_id],
            |r| r.get(0),
        )
        .optional()?;
    match v {
        Some(s) => s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid budget '{}' for {}", s, user_id)),
        None => Ok(Decimal::ZERO),
    }
}

pub fn has_budget(conn: &Connection, user_id: &str) -> Result<bool> {
    Ok(get_budget(conn, user_id)? > Decimal::ZERO)
}

/// Spending from the first of `today`'s month through `today`.
pub fn budget_status(conn: &Connection, user_id: &str, today: NaiveDate) -> Result<BudgetStatus> {
    let monthly_budget = get_budget(conn, user_id)?;
    let spent = reports::summary(conn, user_id, &DateRange::month_to_date(today))?.total_expense;
    let remaining = monthly_budget - spent;
    let percentage = if monthly_budget > Decimal::ZERO {
        (spent / monthly_budget * Decimal::ONE_HUNDRED).round_dp(1)
    } else {
        Decimal::ZERO
    };
    Ok(BudgetStatus {
        monthly_budget,
        spent,
        remaining,
        percentage,
        is_over_budget: remaining < Decimal::ZERO,
    })
}

fn set(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let amount = parse_decimal(sub.get_one::<String>("amount").context("--amount is required")?)?;
    set_budget(conn, &user, amount)?;
    println!("Monthly budget for {} = {}", user, amount);
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let budget = get_budget(conn, &user)?;
    let v = serde_json::json!({ "monthly_budget": budget });
    if !maybe_print_json(json_flag, jsonl_flag, &v)? {
        println!("{}", pretty_table(&["Monthly budget"], vec![vec![format!("{:.2}", budget)]]));
    }
    Ok(())
}

fn status(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let today = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    let s = budget_status(conn, &user, today)?;
    if !maybe_print_json(json_flag, jsonl_flag, &s)? {
        println!(
            "{}",
            pretty_table(
                &["Budget", "Spent", "Remaining", "Used %", "Over"],
                vec![vec![
                    format!("{:.2}", s.monthly_budget),
                    format!("{:.2}", s.spent),
                    format!("{:.2}", s.remaining),
                    format!("{:.1}", s.percentage),
                    if s.is_over_budget { "yes".into() } else { "no".into() },
                ]],
            )
        );
    }
    Ok(())
}
