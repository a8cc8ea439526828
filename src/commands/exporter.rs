// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::commands::transactions::{self, Filter};
use crate::error::LedgerError;
use crate::models::{Kind, Transaction};
use crate::utils::{user_arg, DateRange};
use anyhow::{Context, Result};
use rusqlite::Connection;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format as XlsxFormat, FormatAlign, FormatBorder, Workbook};
use serde_json::json;
use std::path::Path;

pub const CSV_HEADER: [&str; 5] = ["日期", "類型", "分類", "金額", "描述"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Csv,
    Json,
    Xlsx,
}

impl Format {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "csv" => Ok(Format::Csv),
            "json" => Ok(Format::Json),
            "xlsx" | "excel" => Ok(Format::Xlsx),
            other => Err(LedgerError::UnknownFormat(other.to_string()).into()),
        }
    }
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(conn, sub),
        _ => Ok(()),
    }
}

fn export_transactions(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = Format::parse(sub.get_one::<String>("format").context("--format is required")?)?;
    let out = sub.get_one::<String>("out").context("--out is required")?.trim();
    let user = user_arg(sub)?;
    let range = DateRange::from_matches(sub)?;
    let n = write_export(conn, &user, &range, fmt, Path::new(out))?;
    println!("Exported {} transactions to {}", n, out);
    Ok(())
}

/// Write the user's transactions (newest first) to `out`. Returns the row count.
pub fn write_export(
    conn: &Connection,
    user_id: &str,
    range: &DateRange,
    fmt: Format,
    out: &Path,
) -> Result<usize> {
    let filter = Filter {
        range: *range,
        ..Filter::default()
    };
    let rows = transactions::fetch(conn, user_id, &filter)?;
    match fmt {
        Format::Csv => write_csv(&rows, out)?,
        Format::Xlsx => write_xlsx(&rows, out)?,
        Format::Json => {
            let items: Vec<_> = rows.iter().map(json_row).collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Write {}", out.display()))?;
        }
    }
    tracing::info!(user = user_id, count = rows.len(), path = %out.display(), "export written");
    Ok(rows.len())
}

fn write_csv(rows: &[Transaction], out: &Path) -> Result<()> {
    let mut wtr =
        csv::Writer::from_path(out).with_context(|| format!("Create {}", out.display()))?;
    wtr.write_record(CSV_HEADER)?;
    for t in rows {
        wtr.write_record([
            t.created_at.as_str(),
            t.kind.label(),
            t.category.as_str(),
            t.amount.to_string().as_str(),
            t.description.as_deref().unwrap_or(""),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

const SHEET_NAME: &str = "記帳明細";
const COLUMN_WIDTHS: [f64; 5] = [20.0, 10.0, 15.0, 12.0, 30.0];

fn write_xlsx(rows: &[Transaction], out: &Path) -> Result<()> {
    let header = XlsxFormat::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(0x4A90D9))
        .set_align(FormatAlign::Center)
        .set_align(FormatAlign::VerticalCenter)
        .set_border(FormatBorder::Thin);
    let row_format = |kind: Kind| {
        let fill = match kind {
            Kind::Income => 0xE8F5E9,
            Kind::Expense => 0xFFEBEE,
        };
        XlsxFormat::new()
            .set_background_color(Color::RGB(fill))
            .set_border(FormatBorder::Thin)
    };

    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name(SHEET_NAME)?;
    for (col, (title, width)) in CSV_HEADER.iter().zip(COLUMN_WIDTHS).enumerate() {
        let col = col as u16;
        sheet.write_string_with_format(0, col, *title, &header)?;
        sheet.set_column_width(col, width)?;
    }
    for (i, t) in rows.iter().enumerate() {
        let row = i as u32 + 1;
        let fmt = row_format(t.kind);
        let amount = t
            .amount
            .to_f64()
            .with_context(|| format!("Amount {} of #{} does not fit a cell", t.amount, t.id))?;
        sheet.write_string_with_format(row, 0, &t.created_at, &fmt)?;
        sheet.write_string_with_format(row, 1, t.kind.label(), &fmt)?;
        sheet.write_string_with_format(row, 2, &t.category, &fmt)?;
        sheet.write_number_with_format(row, 3, amount, &fmt.clone().set_align(FormatAlign::Right))?;
        sheet.write_string_with_format(row, 4, t.description.as_deref().unwrap_or(""), &fmt)?;
    }
    workbook
        .save(out)
        .with_context(|| format!("Write {}", out.display()))?;
    Ok(())
}

fn json_row(t: &Transaction) -> serde_json::Value {
    json!({
        "id": t.id,
        "created_at": t.created_at,
        "type": t.kind.as_str(),
        "category": t.category,
        "amount": t.amount.to_string(),
        "description": t.description,
    })
}
