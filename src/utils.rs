// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use crate::models::Kind;
use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, NaiveDateTime};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;

const UA: &str = concat!("tallybot/", env!("CARGO_PKG_VERSION"));

pub const TIMESTAMP_FMT: &str = "%Y-%m-%d %H:%M:%S";

pub fn http_client() -> Result<reqwest::blocking::Client> {
    let c = reqwest::blocking::Client::builder()
        .timeout(std::time::Duration::from_secs(15))
        .user_agent(UA)
        .build()?;
    Ok(c)
}

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .with_context(|| format!("Invalid date '{}', expected YYYY-MM-DD", s))
}

pub fn parse_decimal(s: &str) -> Result<Decimal> {
    s.trim()
        .parse::<Decimal>()
        .with_context(|| format!("Invalid decimal '{}'", s))
}

/// Amounts recorded in the ledger are always strictly positive; the kind
/// carries the direction.
pub fn parse_positive_amount(s: &str) -> Result<Decimal> {
    let d = parse_decimal(s)?;
    if d <= Decimal::ZERO {
        return Err(LedgerError::NonPositiveAmount(d.to_string()).into());
    }
    Ok(d)
}

pub fn parse_kind(s: &str) -> Result<Kind> {
    Ok(s.parse::<Kind>()?)
}

/// Optional `--from`/`--to` pair; both ends inclusive.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Result<Self> {
        if let (Some(f), Some(t)) = (from, to) {
            if f > t {
                return Err(LedgerError::InvalidDateRange {
                    from: f.to_string(),
                    to: t.to_string(),
                }
                .into());
            }
        }
        Ok(Self { from, to })
    }

    pub fn day(d: NaiveDate) -> Self {
        Self {
            from: Some(d),
            to: Some(d),
        }
    }

    /// First of the month up to and including `d`.
    pub fn month_to_date(d: NaiveDate) -> Self {
        Self {
            from: d.with_day(1),
            to: Some(d),
        }
    }

    pub fn from_matches(sub: &clap::ArgMatches) -> Result<Self> {
        let from = sub
            .get_one::<String>("from")
            .map(|s| parse_date(s))
            .transpose()?;
        let to = sub
            .get_one::<String>("to")
            .map(|s| parse_date(s))
            .transpose()?;
        Self::new(from, to)
    }

    /// Append `date(created_at)` bounds to a WHERE clause.
    pub fn push_sql(&self, sql: &mut String, params: &mut Vec<String>) {
        self.push_sql_on("date(created_at)", sql, params);
    }

    /// Same as `push_sql` for an arbitrary `YYYY-MM-DD` valued expression.
    pub fn push_sql_on(&self, column: &str, sql: &mut String, params: &mut Vec<String>) {
        if let Some(f) = self.from {
            sql.push_str(&format!(" AND {column} >= ?"));
            params.push(f.to_string());
        }
        if let Some(t) = self.to {
            sql.push_str(&format!(" AND {column} <= ?"));
            params.push(t.to_string());
        }
    }
}

pub fn fmt_timestamp(ts: NaiveDateTime) -> String {
    ts.format(TIMESTAMP_FMT).to_string()
}

/// `$1,234` style, rounded to whole units.
pub fn fmt_money(d: &Decimal) -> String {
    let rounded = d.round_dp(0);
    let digits = rounded.abs().trunc().to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if rounded.is_sign_negative() && !rounded.is_zero() {
        format!("$-{}", grouped)
    } else {
        format!("${}", grouped)
    }
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}

pub fn user_arg(sub: &clap::ArgMatches) -> Result<String> {
    let user = sub
        .get_one::<String>("user")
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .context("--user is required")?;
    Ok(user.to_string())
}

pub fn json_flags(sub: &clap::ArgMatches) -> (bool, bool) {
    let json = sub.try_get_one::<bool>("json").ok().flatten().copied().unwrap_or(false);
    let jsonl = sub.try_get_one::<bool>("jsonl").ok().flatten().copied().unwrap_or(false);
    (json, jsonl)
}
