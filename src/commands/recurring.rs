// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::Config;
use crate::error::LedgerError;
use crate::models::{Kind, Recurring};
use crate::utils::{
    fmt_timestamp, json_flags, maybe_print_json, parse_date, parse_kind, parse_positive_amount,
    pretty_table, user_arg,
};
use anyhow::{Context, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveTime};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

const COLUMNS: &str =
    "id, user_id, type, amount, category, description, day_of_month, is_active, last_executed";

pub const DESCRIPTION_PREFIX: &str = "[固定]";

#[derive(Debug, Clone)]
pub struct NewRecurring<'a> {
    pub user_id: &'a str,
    pub kind: Kind,
    pub amount: Decimal,
    pub category: &'a str,
    pub description: Option<&'a str>,
    pub day_of_month: u32,
}

#[derive(Debug, Clone, Default)]
pub struct RecurringUpdate {
    pub kind: Option<Kind>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub day_of_month: Option<u32>,
    pub is_active: Option<bool>,
}

pub fn handle(conn: &mut Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("execute", sub)) => run(conn, cfg, sub)?,
        _ => {}
    }
    Ok(())
}

pub(crate) fn check_day(day: u32) -> Result<u32> {
    if !(1..=28).contains(&day) {
        return Err(LedgerError::InvalidDayOfMonth(day).into());
    }
    Ok(day)
}

pub fn insert(conn: &Connection, r: &NewRecurring<'_>) -> Result<i64> {
    if r.amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(r.amount.to_string()).into());
    }
    check_day(r.day_of_month)?;
    conn.execute(
        "INSERT INTO recurring_transactions(user_id, type, amount, category, description, day_of_month)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            r.user_id,
            r.kind.as_str(),
            r.amount.to_string(),
            r.category,
            r.description,
            r.day_of_month
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_for_user(conn: &Connection, user_id: &str) -> Result<Vec<Recurring>> {
    let sql = format!(
        "SELECT {COLUMNS} FROM recurring_transactions WHERE user_id=?1 ORDER BY day_of_month, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![user_id])?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(from_row(r)?);
    }
    Ok(data)
}

pub fn get(conn: &Connection, user_id: &str, id: i64) -> Result<Recurring> {
    let sql = format!("SELECT {COLUMNS} FROM recurring_transactions WHERE id=?1 AND user_id=?2");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id, user_id])?;
    let found = match rows.next()? {
        Some(r) => Some(from_row(r)?),
        None => None,
    };
    found.ok_or_else(|| {
        LedgerError::NotFound {
            what: "Recurring transaction",
            id,
        }
        .into()
    })
}

pub fn update(conn: &Connection, user_id: &str, id: i64, upd: &RecurringUpdate) -> Result<()> {
    get(conn, user_id, id)?;

    let mut sets: Vec<&str> = Vec::new();
    let mut args: Vec<String> = Vec::new();
    if let Some(k) = upd.kind {
        sets.push("type=?");
        args.push(k.as_str().to_string());
    }
    if let Some(a) = upd.amount {
        if a <= Decimal::ZERO {
            return Err(LedgerError::NonPositiveAmount(a.to_string()).into());
        }
        sets.push("amount=?");
        args.push(a.to_string());
    }
    if let Some(c) = &upd.category {
        sets.push("category=?");
        args.push(c.clone());
    }
    if let Some(d) = &upd.description {
        sets.push("description=?");
        args.push(d.clone());
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
        "UPDATE recurring_transactions SET {} WHERE id=? AND user_id=?",
        sets.join(", ")
    );
    conn.execute(&sql, rusqlite::params_from_iter(args.iter()))?;
    Ok(())
}

pub fn delete(conn: &Connection, user_id: &str, id: i64) -> Result<()> {
    let n = conn.execute(
        "DELETE FROM recurring_transactions WHERE id=?1 AND user_id=?2",
        params![id, user_id],
    )?;
    if n == 0 {
        return Err(LedgerError::NotFound {
            what: "Recurring transaction",
            id,
        }
        .into());
    }
    Ok(())
}

/// Record every active entry due on `today` that has not run yet today.
/// Returns the number of transactions written.
pub fn execute_due(conn: &mut Connection, today: NaiveDate) -> Result<usize> {
    let today_s = today.to_string();
    let stamp = fmt_timestamp(today.and_time(NaiveTime::MIN));
    let tx = conn.transaction()?;
    let due: Vec<Recurring> = {
        let sql = format!(
            "SELECT {COLUMNS} FROM recurring_transactions
             WHERE is_active=1 AND day_of_month=?1
               AND (last_executed IS NULL OR last_executed < ?2)
             ORDER BY id"
        );
        let mut stmt = tx.prepare(&sql)?;
        let mut rows = stmt.query(params![today.day(), today_s])?;
        let mut data = Vec::new();
        while let Some(r) = rows.next()? {
            data.push(from_row(r)?);
        }
        data
    };

    for r in &due {
        let label = r
            .description
            .as_deref()
            .filter(|d| !d.is_empty())
            .unwrap_or(&r.category);
        tx.execute(
            "INSERT INTO transactions(user_id, type, amount, category, description, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                r.user_id,
                r.kind.as_str(),
                r.amount.to_string(),
                r.category,
                format!("{} {}", DESCRIPTION_PREFIX, label),
                stamp
            ],
        )?;
        tx.execute(
            "UPDATE recurring_transactions SET last_executed=?1 WHERE id=?2",
            params![today_s, r.id],
        )?;
        tracing::debug!(id = r.id, user = %r.user_id, "recurring transaction executed");
    }
    tx.commit()?;
    tracing::info!(date = %today, count = due.len(), "recurring run finished");
    Ok(due.len())
}

fn from_row(r: &rusqlite::Row<'_>) -> Result<Recurring> {
    let id: i64 = r.get(0)?;
    let kind_s: String = r.get(2)?;
    let amount_s: String = r.get(3)?;
    let active: i64 = r.get(7)?;
    Ok(Recurring {
        id,
        user_id: r.get(1)?,
        kind: parse_kind(&kind_s)?,
        amount: amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in recurring {}", amount_s, id))?,
        category: r.get(4)?,
        description: r.get(5)?,
        day_of_month: r.get(6)?,
        is_active: active != 0,
        last_executed: r.get(8)?,
    })
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let kind = parse_kind(sub.get_one::<String>("type").context("--type is required")?)?;
    let amount =
        parse_positive_amount(sub.get_one::<String>("amount").context("--amount is required")?)?;
    let category = sub
        .get_one::<String>("category")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .context("--category is required")?;
    let day_of_month = sub.get_one::<u32>("day").copied().unwrap_or(1);
    let id = insert(
        conn,
        &NewRecurring {
            user_id: &user,
            kind,
            amount,
            category,
            description: sub.get_one::<String>("description").map(|s| s.as_str()),
            day_of_month,
        },
    )?;
    println!(
        "Added recurring #{}: {} {} ({}) on day {}",
        id, kind, amount, category, day_of_month
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let data = list_for_user(conn, &user)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data.iter().map(table_row).collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Day", "Type", "Category", "Amount", "Description", "Active", "Last run"],
                rows
            )
        );
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
            pretty_table(
                &["ID", "Day", "Type", "Category", "Amount", "Description", "Active", "Last run"],
                vec![table_row(&r)]
            )
        );
    }
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let id = *sub.get_one::<i64>("id").context("--id is required")?;
    let upd = RecurringUpdate {
        kind: sub
            .get_one::<String>("type")
            .map(|s| parse_kind(s))
            .transpose()?,
        amount: sub
            .get_one::<String>("amount")
            .map(|s| parse_positive_amount(s))
            .transpose()?,
        category: sub
            .get_one::<String>("category")
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()),
        description: sub.get_one::<String>("description").cloned(),
        day_of_month: sub.get_one::<u32>("day").copied(),
        is_active: sub.get_one::<bool>("active").copied(),
    };
    update(conn, &user, id, &upd)?;
    println!("Updated recurring #{}", id);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let id = *sub.get_one::<i64>("id").context("--id is required")?;
    delete(conn, &user, id)?;
    println!("Removed recurring #{}", id);
    Ok(())
}

fn run(conn: &mut Connection, cfg: &Config, sub: &clap::ArgMatches) -> Result<()> {
    if let Some(expected) = cfg.cron_secret.as_deref() {
        let given = sub.get_one::<String>("secret").map(|s| s.trim());
        if given != Some(expected) {
            tracing::warn!("recurring execute rejected: bad secret");
            return Err(LedgerError::BadSecret.into());
        }
    }
    let today = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?,
        None => Local::now().date_naive(),
    };
    let n = execute_due(conn, today)?;
    println!("Executed {} recurring transaction(s) for {}", n, today);
    Ok(())
}

fn table_row(r: &Recurring) -> Vec<String> {
    vec![
        r.id.to_string(),
        r.day_of_month.to_string(),
        r.kind.label().to_string(),
        r.category.clone(),
        r.amount.to_string(),
        r.description.clone().unwrap_or_default(),
        if r.is_active { "yes".into() } else { "no".into() },
        r.last_executed.clone().unwrap_or_default(),
    ]
}
