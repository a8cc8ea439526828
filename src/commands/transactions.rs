// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::models::{Kind, Transaction};
use crate::utils::{
    fmt_timestamp, json_flags, maybe_print_json, parse_date, parse_kind, parse_positive_amount,
    pretty_table, user_arg, DateRange,
};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;
use serde::Serialize;

const COLUMNS: &str = "id, user_id, type, amount, category, description, created_at";

#[derive(Debug, Clone)]
pub struct NewTransaction<'a> {
    pub user_id: &'a str,
    pub kind: Kind,
    pub amount: Decimal,
    pub category: &'a str,
    pub description: Option<&'a str>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Default)]
pub struct Filter {
    pub kind: Option<Kind>,
    pub category: Option<String>,
    pub range: DateRange,
}

#[derive(Debug, Clone, Default)]
pub struct Update {
    pub kind: Option<Kind>,
    pub amount: Option<Decimal>,
    pub category: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: i64,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("categories", sub)) => list_categories(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn insert(conn: &Connection, tx: &NewTransaction<'_>) -> Result<i64> {
    if tx.amount <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(tx.amount.to_string()).into());
    }
    conn.execute(
        "INSERT INTO transactions(user_id, type, amount, category, description, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            tx.user_id,
            tx.kind.as_str(),
            tx.amount.to_string(),
            tx.category,
            tx.description,
            fmt_timestamp(tx.created_at)
        ],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, user = tx.user_id, kind = %tx.kind, amount = %tx.amount, category = tx.category, "transaction recorded");
    Ok(id)
}

pub fn get(conn: &Connection, user_id: &str, id: i64) -> Result<Transaction> {
    let sql = format!("SELECT {COLUMNS} FROM transactions WHERE id=?1 AND user_id=?2");
    let mut stmt = conn.prepare(&sql)?;
    let mut rows = stmt.query(params![id, user_id])?;
    let found = match rows.next()? {
        Some(r) => Some(from_row(r)?),
        None => None,
    };
    found.ok_or_else(|| {
        LedgerError::NotFound {
            what: "Transaction",
            id,
        }
        .into()
    })
}

/// Every matching transaction, newest first.
pub fn fetch(conn: &Connection, user_id: &str, filter: &Filter) -> Result<Vec<Transaction>> {
    let (where_sql, args) = where_clause(user_id, filter);
    let sql = format!(
        "SELECT {COLUMNS} FROM transactions WHERE {where_sql} ORDER BY created_at DESC, id DESC"
    );
    collect(conn, &sql, &args)
}

pub fn list_page(
    conn: &Connection,
    user_id: &str,
    filter: &Filter,
    page: u32,
    per_page: u32,
) -> Result<Page<Transaction>> {
    let page = page.max(1);
    let per_page = per_page.max(1);
    let (where_sql, args) = where_clause(user_id, filter);

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM transactions WHERE {where_sql}"),
        rusqlite::params_from_iter(args.iter()),
        |r| r.get(0),
    )?;

    let offset = u64::from(page - 1) * u64::from(per_page);
    let sql = format!(
        "SELECT {COLUMNS} FROM transactions WHERE {where_sql}
         ORDER BY created_at DESC, id DESC LIMIT {per_page} OFFSET {offset}"
    );
    let items = collect(conn, &sql, &args)?;
    let per = i64::from(per_page);
    Ok(Page {
        items,
        total,
        page,
        per_page,
        total_pages: (total + per - 1) / per,
    })
}

/// Apply the fields present in `upd`; absent fields are left untouched.
pub fn update(conn: &Connection, user_id: &str, id: i64, upd: &Update) -> Result<()> {
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
    if sets.is_empty() {
        return Ok(());
    }
    args.push(id.to_string());
    args.push(user_id.to_string());
    let sql = format!(
        "UPDATE transactions SET {} WHERE id=? AND user_id=?",
        sets.join(", ")
    );
    conn.execute(&sql, rusqlite::params_from_iter(args.iter()))?;
    tracing::info!(id, user = user_id, "transaction updated");
    Ok(())
}

pub fn delete(conn: &Connection, user_id: &str, id: i64) -> Result<()> {
    let n = conn.execute(
        "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
        params![id, user_id],
    )?;
    if n == 0 {
        return Err(LedgerError::NotFound {
            what: "Transaction",
            id,
        }
        .into());
    }
    tracing::info!(id, user = user_id, "transaction deleted");
    Ok(())
}

/// Categories the user has recorded at least once.
pub fn categories(conn: &Connection, user_id: &str) -> Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT category FROM transactions WHERE user_id=?1 ORDER BY category",
    )?;
    let rows = stmt.query_map(params![user_id], |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(row?);
    }
    Ok(out)
}

pub fn filter_from_matches(sub: &clap::ArgMatches) -> Result<Filter> {
    let kind = sub
        .try_get_one::<String>("type")
        .ok()
        .flatten()
        .map(|s| parse_kind(s))
        .transpose()?;
    let category = sub
        .try_get_one::<String>("category")
        .ok()
        .flatten()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty());
    Ok(Filter {
        kind,
        category,
        range: DateRange::from_matches(sub)?,
    })
}

fn where_clause(user_id: &str, filter: &Filter) -> (String, Vec<String>) {
    let mut sql = String::from("user_id=?");
    let mut args = vec![user_id.to_string()];
    if let Some(k) = filter.kind {
        sql.push_str(" AND type=?");
        args.push(k.as_str().to_string());
    }
    if let Some(c) = &filter.category {
        sql.push_str(" AND category=?");
        args.push(c.clone());
    }
    filter.range.push_sql(&mut sql, &mut args);
    (sql, args)
}

fn collect(conn: &Connection, sql: &str, args: &[String]) -> Result<Vec<Transaction>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(rusqlite::params_from_iter(args.iter()))?;
    let mut data = Vec::new();
    while let Some(r) = rows.next()? {
        data.push(from_row(r)?);
    }
    Ok(data)
}

fn from_row(r: &rusqlite::Row<'_>) -> Result<Transaction> {
    let id: i64 = r.get(0)?;
    let kind_s: String = r.get(2)?;
    let amount_s: String = r.get(3)?;
    Ok(Transaction {
        id,
        user_id: r.get(1)?,
        kind: parse_kind(&kind_s)?,
        amount: amount_s
            .parse::<Decimal>()
            .with_context(|| format!("Invalid amount '{}' in transaction {}", amount_s, id))?,
        category: r.get(4)?,
        description: r.get(5)?,
        created_at: r.get(6)?,
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
    let description = sub.get_one::<String>("description").map(|s| s.as_str());
    let now = Local::now().naive_local();
    let created_at = match sub.get_one::<String>("date") {
        Some(d) => parse_date(d)?.and_time(now.time()),
        None => now,
    };

    let id = insert(
        conn,
        &NewTransaction {
            user_id: &user,
            kind,
            amount,
            category,
            description,
            created_at,
        },
    )?;
    println!(
        "Recorded {} {} ({}) for {} as #{}",
        kind, amount, category, user, id
    );
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let filter = filter_from_matches(sub)?;
    let page = sub.get_one::<u32>("page").copied().unwrap_or(1);
    let per_page = sub.get_one::<u32>("per_page").copied().unwrap_or(20);
    let data = list_page(conn, &user, &filter, page, per_page)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows: Vec<Vec<String>> = data.items.iter().map(table_row).collect();
        println!(
            "{}",
            pretty_table(
                &["ID", "Time", "Type", "Category", "Amount", "Description"],
                rows
            )
        );
        println!(
            "page {}/{} ({} total)",
            data.page, data.total_pages, data.total
        );
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let id = *sub.get_one::<i64>("id").context("--id is required")?;
    let tx = get(conn, &user, id)?;
    if !maybe_print_json(json_flag, jsonl_flag, &tx)? {
        println!(
            "{}",
            pretty_table(
                &["ID", "Time", "Type", "Category", "Amount", "Description"],
                vec![table_row(&tx)]
            )
        );
    }
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let id = *sub.get_one::<i64>("id").context("--id is required")?;
    let upd = Update {
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
    };
    update(conn, &user, id, &upd)?;
    println!("Updated transaction #{}", id);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let id = *sub.get_one::<i64>("id").context("--id is required")?;
    delete(conn, &user, id)?;
    println!("Removed transaction #{}", id);
    Ok(())
}

fn list_categories(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let cats = categories(conn, &user)?;
    if !maybe_print_json(json_flag, jsonl_flag, &cats)? {
        let rows = cats.into_iter().map(|c| vec![c]).collect();
        println!("{}", pretty_table(&["Category"], rows));
    }
    Ok(())
}

fn table_row(t: &Transaction) -> Vec<String> {
    vec![
        t.id.to_string(),
        t.created_at.clone(),
        t.kind.label().to_string(),
        t.category.clone(),
        t.amount.to_string(),
        t.description.clone().unwrap_or_default(),
    ]
}
