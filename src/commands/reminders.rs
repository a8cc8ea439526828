// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Fixed-expense reminders: bills the user wants to be reminded of each month.
//! Unlike recurring transactions they never write to the ledger.

use crate::commands::recurring::check_day;
use crate::error::LedgerError;
use crate::models::Reminder;
use crate::utils::{json_flags, maybe_print_json, parse_positive_amount, pretty_table, user_arg};
use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

const COLUMNS: &str = "id, user_id, name, amount, day_of_month, is_active";

#[derive(Debug, Clone, Default)]
pub struct ReminderUpdate {
    pub name: Option<String>,
    pub amount: Option<Decimal>,
    pub day_of_month: Option<u32>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize)]
pub struct ReminderList {
    pub items: Vec<Reminder>,
    pub total: Decimal,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn create(
    conn: &Connection,
    user_id: &str,
    name: &str,
    amount: Decimal,
    day_of_month: u32,
) -> Result<i64> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::EmptyField("Reminder name").into());
    }
    if amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(amount.to_string()).into());
    }
    check_day(day_of_month)?;
    conn.execute(
        "INSERT INTO expense_reminders(user_id, name, amount, day_of_month) VALUES (?1, ?2, ?3, ?4)",
        params![user_id, name, amount.to_string(), day_of_month],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, user = user_id, name, day_of_month, "reminder created");
    Ok(id)
}

/// Active reminders ordered by day of month, with their monthly total.
pub fn list_active(conn: &Connection, user_id: &str) -> Result<ReminderList> {
    let sql = format!(
        "SELECT {COLUMNS} FROM expense_reminders WHERE user_id=?1 AND is_active=1
         ORDER BY day_of_month, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![user_id])?;
    let mut items = Vec::new();
    while let Some(r) = rows.next()? {
        items.push(from_row(r)?);
    }
    let total = items.iter().map(|r| r.amount).sum();
    Ok(ReminderList { items, total })
}

pub fn get(conn: &Connection, user_id: &str, id: i64) -> Result<Reminder> {
    let sql = format!("SELECT {COLUMNS} FROM expense_reminders WHERE id=?1 AND user_id=?2");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id, user_id])?;
    let found = match rows.next()? {
        Some(r) => Some(from_row(r)?),
        None => None,
    };
    found.ok_or_else(|| LedgerError::NotFound { what: "Reminder", id }.into())
}

pub fn update(conn: &Connection, user_id: &str, id: i64, upd: &ReminderUpdate) -> Result<()> {
    get(conn, user_id, id)?;

    let mut sets: Vec<&str> = Vec::new();
    let mut args: Vec<String> = Vec::new();
    if let Some(n) = upd.name.as_deref().map(str::trim) {
        if n.is_empty() {
            return Err(LedgerError::EmptyField("Reminder name").into());
        }
        sets.push("name=?");
        args.push(n.to_string());
    }
    if let Some(a) = upd.amount {
        if a <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(a.to_string()).into());
        }
        sets.push("amount=?");
        args.push(a.to_string());
    }
    if let Some(day) = upd.day_of_month {
        sets.push("day_of_month=?");
        args.push(check_day(day)?.to_string());
    }
    if let Some(active) = upd.is_active {
        sets.push("is_active=?");
        args.push(if active { "1" } else { "0" }.to_string());
    }
    if sets.is_empty() {
        return Ok(());
    }
    args.push(id.to_string());
    args.push(user_id.to_string());
    let sql = format!(
        "UPDATE expense_reminders SET {} WHERE id=? AND user_id=?",
        sets.join(", ")
    );
    conn.execute(&sql, rusqlite::params_from_iter(args.iter()))?;
    Ok(())
}

pub fn delete(conn: &Connection, user_id: &str, id: i64) -> Result<()> {
    let n = conn.execute(
        "DELETE FROM expense_reminders WHERE id=?1 AND user_id=?2",
        params![id, user_id],
    )?;
    if n == 0 {
        return Err(LedgerError::NotFound { what: "Reminder", id }.into());
    }
    tracing::info!(id, user = user_id, "reminder deleted");
    Ok(())
}

fn from_row(r: &rusqlite::Row<'_>) -> Result<Reminder> {
    let id: i64 = r.get(0)?;
    let amount_s: String = r.get(3)?;
    let active: i64 = r.get(5)?;
    Ok(Reminder {
        id,
        user_id: r.get(1)?,
        name: r.get(2)?,
        amount: amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in reminder {}", amount_s, id))?,
        day_of_month: r.get(4)?,
        is_active: active != 0,
    })
}

fn table_row(r: &Reminder) -> Vec<String> {
    vec![
        r.id.to_string(),
        r.day_of_month.to_string(),
        r.name.clone(),
        r.amount.to_string(),
        if r.is_active { "yes".into() } else { "no".into() },
    ]
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let name = sub.get_one::<String>("name").context("--name is required")?;
    let amount =
        parse_positive_amount(sub.get_one::<String>("amount").context("--amount is required")?)?;
    let day = *sub.get_one::<u32>("day").context("--day is required")?;
    let id = create(conn, &user, name, amount, day)?;
    println!("Added reminder #{}: {} {} on day {}", id, name.trim(), amount, day);
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let data = list_active(conn, &user)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data.items.iter().map(table_row).collect();
        println!(
            "{}",
            pretty_table(&["ID", "Day", "Name", "Amount", "Active"], rows)
        );
        println!("monthly total: {}", data.total);
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let id = *sub.get_one::<i64>("id").context("--id is required")?;
    let r = get(conn, &user, id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &r)? {
        println!(
            "{}",
            pretty_table(&["ID", "Day", "Name", "Amount", "Active"], vec![table_row(&r)])
        );
    }
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let id = *sub.get_one::<i64>("id").context("--id is required")?;
    let upd = ReminderUpdate {
        name: sub.get_one::<String>("name").cloned(),
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_positive_amount(s))
            .transpose()?,
        day_of_month: sub.get_one::<u32>("day").copied(),
        is_active: sub.get_one::<bool>("active").copied(),
    };
    update(conn, &user, id, &upd)?;
    println!("Updated reminder #{}", id);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let id = *sub.get_one::<i64>("id").context("--id is required")?;
    delete(conn, &user, id)?;
    println!("Removed reminder #{}", id);
    Ok(())
}
