// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::{self, Filter};
use crate::models::{Kind, Summary};
use crate::utils::{
    json_flags, maybe_print_json, parse_kind, pretty_table, user_arg, DateRange, TIMESTAMP_FMT,
};
use anyhow::{Context, Result};
use chrono::NaiveDateTime;
use rusqlite::Connection;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GroupBy {
    #[default]
    Day,
    Week,
    Month,
}

impl GroupBy {
    /// Unknown values fall back to daily buckets.
    pub fn parse_lossy(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => GroupBy::Week,
            "month" => GroupBy::Month,
            _ => GroupBy::Day,
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            GroupBy::Day => "%Y-%m-%d",
            GroupBy::Week => "%Y-%W",
            GroupBy::Month => "%Y-%m",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStat {
    pub category: String,
    pub kind: Kind,
    pub total: Decimal,
    pub count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateStat {
    pub period: String,
    pub income: Decimal,
    pub expense: Decimal,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => print_summary(conn, sub)?,
        Some(("by-category", sub)) => print_by_category(conn, sub)?,
        Some(("by-date", sub)) => print_by_date(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn summary(conn: &Connection, user_id: &str, range: &DateRange) -> Result<Summary> {
    let filter = Filter {
        range: *range,
        ..Filter::default()
    };
    let mut income = Decimal::ZERO;
    let mut expense = Decimal::ZERO;
    let mut count = 0i64;
    for t in transactions::fetch(conn, user_id, &filter)? {
        match t.kind {
            Kind::Income => income += t.amount,
            Kind::Expense => expense += t.amount,
        }
        count += 1;
    }
    Ok(Summary {
        total_income: income,
        total_expense: expense,
        balance: income - expense,
        transaction_count: count,
    })
}

/// Totals per (category, kind), largest first.
pub fn by_category(
    conn: &Connection,
    user_id: &str,
    kind: Option<Kind>,
    range: &DateRange,
) -> Result<Vec<CategoryStat>> {
    let filter = Filter {
        kind,
        range: *range,
        ..Filter::default()
    };
    let mut agg: HashMap<(String, Kind), (Decimal, i64)> = HashMap::new();
    for t in transactions::fetch(conn, user_id, &filter)? {
        let e = agg.entry((t.category, t.kind)).or_insert((Decimal::ZERO, 0));
        e.0 += t.amount;
        e.1 += 1;
    }
    let mut items: Vec<CategoryStat> = agg
        .into_iter()
        .map(|((category, kind), (total, count))| CategoryStat {
            category,
            kind,
            total,
            count,
        })
        .collect();
    items.sort_by(|a, b| {
        b.total
            .cmp(&a.total)
            .then_with(|| a.category.cmp(&b.category))
            .then_with(|| a.kind.as_str().cmp(b.kind.as_str()))
    });
    Ok(items)
}

/// Income and expense per period, oldest first.
pub fn by_date(
    conn: &Connection,
    user_id: &str,
    range: &DateRange,
    group_by: GroupBy,
) -> Result<Vec<DateStat>> {
    let filter = Filter {
        range: *range,
        ..Filter::default()
    };
    let mut map: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for t in transactions::fetch(conn, user_id, &filter)? {
        let ts = NaiveDateTime::parse_from_str(&t.created_at, TIMESTAMP_FMT)
            .with_context(|| format!("Invalid timestamp '{}' on #{}", t.created_at, t.id))?;
        let entry = map
            .entry(ts.format(group_by.pattern()).to_string())
            .or_insert((Decimal::ZERO, Decimal::ZERO));
        match t.kind {
            Kind::Income => entry.0 += t.amount,
            Kind::Expense => entry.1 += t.amount,
        }
    }
    Ok(map
        .into_iter()
        .map(|(period, (income, expense))| DateStat {
            period,
            income,
            expense,
        })
        .collect())
}

fn print_summary(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let range = DateRange::from_matches(sub)?;
    let s = summary(conn, &user, &range)?;
    if !maybe_print_json(json_flag, jsonl_flag, &s)? {
        println!(
            "{}",
            pretty_table(
                &["Income", "Expense", "Balance", "Count"],
                vec![vec![
                    format!("{:.2}", s.total_income),
                    format!("{:.2}", s.total_expense),
                    format!("{:.2}", s.balance),
                    s.transaction_count.to_string(),
                ]],
            )
        );
    }
    Ok(())
}

fn print_by_category(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let kind = sub
        .get_one::<String>("type")
        .map(|s| parse_kind(s))
        .transpose()?;
    let range = DateRange::from_matches(sub)?;
    let data = by_category(conn, &user, kind, &range)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|c| {
                vec![
                    c.category.clone(),
                    c.kind.label().to_string(),
                    format!("{:.2}", c.total),
                    c.count.to_string(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Category", "Type", "Total", "Count"], rows)
        );
    }
    Ok(())
}

fn print_by_date(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let range = DateRange::from_matches(sub)?;
    let group_by = sub
        .get_one::<String>("group_by")
        .map(|s| GroupBy::parse_lossy(s))
        .unwrap_or_default();
    let data = by_date(conn, &user, &range, group_by)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|d| {
                vec![
                    d.period.clone(),
                    format!("{:.2}", d.income),
                    format!("{:.2}", d.expense),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Period", "Income", "Expense"], rows));
    }
    Ok(())
}
