// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Daily habit check-ins with streaks and monthly completion rates.

use crate::error::LedgerError;
use crate::models::{Habit, HabitStats, HabitStatus};
use crate::utils::{json_flags, maybe_print_json, parse_date, pretty_table, user_arg, DateRange};
use anyhow::{Context, Result};
use chrono::{Datelike, Local, Months, NaiveDate};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;

pub const DEFAULT_EMOJI: &str = "✓";

const COLUMNS: &str = "id, user_id, name, emoji, created_at";

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(conn, sub)?,
        Some(("list", sub)) => list(conn, sub)?,
        Some(("show", sub)) => show(conn, sub)?,
        Some(("edit", sub)) => edit(conn, sub)?,
        Some(("rm", sub)) => rm(conn, sub)?,
        Some(("checkin", sub)) => checkin(conn, sub)?,
        Some(("uncheck", sub)) => uncheck(conn, sub)?,
        Some(("checkins", sub)) => list_check_ins(conn, sub)?,
        Some(("stats", sub)) => print_stats(conn, sub)?,
        _ => {}
    }
    Ok(())
}

pub fn create(conn: &Connection, user_id: &str, name: &str, emoji: Option<&str>) -> Result<i64> {
    let name = non_empty_name(name)?;
    ensure_unique(conn, user_id, name, None)?;
    let emoji = emoji
        .map(str::trim)
        .filter(|e| !e.is_empty())
        .unwrap_or(DEFAULT_EMOJI);
    conn.execute(
        "INSERT INTO habits(user_id, name, emoji) VALUES (?1, ?2, ?3)",
        params![user_id, name, emoji],
    )?;
    let id = conn.last_insert_rowid();
    tracing::info!(id, user = user_id, name, "habit created");
    Ok(id)
}

pub fn get(conn: &Connection, user_id: &str, id: i64) -> Result<Habit> {
    let found = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM habits WHERE id=?1 AND user_id=?2"),
            params![id, user_id],
            from_row,
        )
        .optional()?;
    found.ok_or_else(|| LedgerError::NotFound { what: "Habit", id }.into())
}

/// Every habit of the user with its check-in state on `today`.
pub fn list_with_status(conn: &Connection, user_id: &str, today: NaiveDate) -> Result<Vec<HabitStatus>> {
    let mut stmt = conn.prepare(
        "SELECT h.id, h.user_id, h.name, h.emoji, h.created_at,
                EXISTS(SELECT 1 FROM habit_checkins c
                       WHERE c.habit_id=h.id AND c.user_id=h.user_id AND c.check_date=?2)
         FROM habits h WHERE h.user_id=?1 ORDER BY h.created_at, h.id",
    )?;
    let rows = stmt.query_map(params![user_id, today.to_string()], |r| {
        Ok((from_row(r)?, r.get::<_, bool>(5)?))
    })?;
    let mut out = Vec::new();
    for row in rows {
        let (habit, checked) = row?;
        let streak = streak(conn, user_id, habit.id, today)?;
        out.push(HabitStatus {
            habit,
            checked,
            streak,
        });
    }
    Ok(out)
}

pub fn update(
    conn: &Connection,
    user_id: &str,
    id: i64,
    name: Option<&str>,
    emoji: Option<&str>,
) -> Result<()> {
    get(conn, user_id, id)?;
    let mut sets: Vec<&str> = Vec::new();
    let mut args: Vec<String> = Vec::new();
    if let Some(n) = name {
        let n = non_empty_name(n)?;
        ensure_unique(conn, user_id, n, Some(id))?;
        sets.push("name=?");
        args.push(n.to_string());
    }
    if let Some(e) = emoji.map(str::trim).filter(|e| !e.is_empty()) {
        sets.push("emoji=?");
        args.push(e.to_string());
    }
    if sets.is_empty() {
        return Ok(());
    }
    args.push(id.to_string());
    args.push(user_id.to_string());
    let sql = format!("UPDATE habits SET {} WHERE id=? AND user_id=?", sets.join(", "));
    conn.execute(&sql, rusqlite::params_from_iter(args.iter()))?;
    Ok(())
}

/// Remove the habit together with its check-ins.
pub fn delete(conn: &Connection, user_id: &str, id: i64) -> Result<()> {
    get(conn, user_id, id)?;
    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "DELETE FROM habit_checkins WHERE habit_id=?1 AND user_id=?2",
        params![id, user_id],
    )?;
    tx.execute(
        "DELETE FROM habits WHERE id=?1 AND user_id=?2",
        params![id, user_id],
    )?;
    tx.commit()?;
    tracing::info!(id, user = user_id, "habit deleted");
    Ok(())
}

/// Returns `false` when the habit was already checked on `date`.
pub fn check_in(conn: &Connection, user_id: &str, id: i64, date: NaiveDate) -> Result<bool> {
    get(conn, user_id, id)?;
    let n = conn.execute(
        "INSERT OR IGNORE INTO habit_checkins(user_id, habit_id, check_date) VALUES (?1, ?2, ?3)",
        params![user_id, id, date.to_string()],
    )?;
    tracing::debug!(id, user = user_id, %date, fresh = n > 0, "habit check-in");
    Ok(n > 0)
}

pub fn cancel_check_in(conn: &Connection, user_id: &str, id: i64, date: NaiveDate) -> Result<()> {
    let n = conn.execute(
        "DELETE FROM habit_checkins WHERE user_id=?1 AND habit_id=?2 AND check_date=?3",
        params![user_id, id, date.to_string()],
    )?;
    if n == 0 {
        return Err(LedgerError::CheckInNotFound {
            id,
            date: date.to_string(),
        }
        .into());
    }
    Ok(())
}

/// Check-in dates inside `range`, newest first.
pub fn check_ins(conn: &Connection, user_id: &str, id: i64, range: &DateRange) -> Result<Vec<NaiveDate>> {
    get(conn, user_id, id)?;
    let mut sql = String::from("SELECT check_date FROM habit_checkins WHERE user_id=? AND habit_id=?");
    let mut args = vec![user_id.to_string(), id.to_string()];
    range.push_sql_on("check_date", &mut sql, &mut args);
    sql.push_str(" ORDER BY check_date DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(rusqlite::params_from_iter(args.iter()), |r| r.get::<_, String>(0))?;
    let mut out = Vec::new();
    for row in rows {
        out.push(parse_date(&row?)?);
    }
    Ok(out)
}

/// Consecutive checked days ending today, or ending yesterday while today
/// is still open.
pub fn streak(conn: &Connection, user_id: &str, id: i64, today: NaiveDate) -> Result<u32> {
    let dates = check_ins(conn, user_id, id, &DateRange::new(None, Some(today))?)?;
    let Some(&latest) = dates.first() else {
        return Ok(0);
    };
    if latest != today && Some(latest) != today.pred_opt() {
        return Ok(0);
    }
    let mut expected = latest;
    let mut n = 0;
    for d in dates {
        if d != expected {
            break;
        }
        n += 1;
        match expected.pred_opt() {
            Some(prev) => expected = prev,
            None => break,
        }
    }
    Ok(n)
}

/// Completion for one calendar month. For the current month only the days
/// up to `today` count as passed.
pub fn stats(
    conn: &Connection,
    user_id: &str,
    id: i64,
    year: i32,
    month: u32,
    today: NaiveDate,
) -> Result<HabitStats> {
    let bad_month = || LedgerError::InvalidMonth { year, month };
    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(bad_month)?;
    let last = first
        .checked_add_months(Months::new(1))
        .and_then(|d| d.pred_opt())
        .ok_or_else(bad_month)?;
    let days_in_month = last.day();
    let checked_days = check_ins(conn, user_id, id, &DateRange::new(Some(first), Some(last))?)?.len() as u32;
    let days_passed = if today.year() == year && today.month() == month {
        today.day()
    } else {
        days_in_month
    };
    let completion_rate = if days_passed > 0 {
        (Decimal::from(checked_days) / Decimal::from(days_passed) * Decimal::ONE_HUNDRED).round_dp(1)
    } else {
        Decimal::ZERO
    };
    Ok(HabitStats {
        year,
        month,
        checked_days,
        days_in_month,
        days_passed,
        completion_rate,
        streak: streak(conn, user_id, id, today)?,
    })
}

fn non_empty_name(name: &str) -> Result<&str> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LedgerError::EmptyField("Habit name").into());
    }
    Ok(name)
}

fn ensure_unique(conn: &Connection, user_id: &str, name: &str, except: Option<i64>) -> Result<()> {
    let clash: Option<i64> = conn
        .query_row(
            "SELECT id FROM habits WHERE user_id=?1 AND name=?2 AND id<>?3",
            params![user_id, name, except.unwrap_or(-1)],
            |r| r.get(0),
        )
        .optional()?;
    if clash.is_some() {
        return Err(LedgerError::DuplicateHabit(name.to_string()).into());
    }
    Ok(())
}

fn from_row(r: &rusqlite::Row<'_>) -> rusqlite::Result<Habit> {
    Ok(Habit {
        id: r.get(0)?,
        user_id: r.get(1)?,
        name: r.get(2)?,
        emoji: r.get(3)?,
        created_at: r.get(4)?,
    })
}

fn date_or_today(sub: &clap::ArgMatches) -> Result<NaiveDate> {
    match sub.get_one::<String>("date") {
        Some(d) => parse_date(d),
        None => Ok(Local::now().date_naive()),
    }
}

fn id_arg(sub: &clap::ArgMatches) -> Result<i64> {
    Ok(*sub.get_one::<i64>("id").context("--id is required")?)
}

fn add(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let name = sub.get_one::<String>("name").context("--name is required")?;
    let emoji = sub.get_one::<String>("emoji").map(|s| s.as_str());
    let id = create(conn, &user, name, emoji)?;
    println!("Added habit #{}: {}", id, name.trim());
    Ok(())
}

fn list(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let today = date_or_today(sub)?;
    let data = list_with_status(conn, &user, today)?;
    if !maybe_print_json(json_flag, jsonl_flag, &data)? {
        let rows = data
            .iter()
            .map(|h| {
                vec![
                    h.habit.id.to_string(),
                    format!("{} {}", h.habit.emoji, h.habit.name),
                    if h.checked { "yes".into() } else { "no".into() },
                    h.streak.to_string(),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["ID", "Habit", "Checked", "Streak"], rows));
    }
    Ok(())
}

fn show(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let id = id_arg(sub)?;
    let habit = get(conn, &user, id)?;
    let streak = streak(conn, &user, id, Local::now().date_naive())?;
    let v = serde_json::json!({ "habit": habit, "streak": streak });
    if !maybe_print_json(json_flag, jsonl_flag, &v)? {
        println!(
            "{}",
            pretty_table(
                &["ID", "Habit", "Created", "Streak"],
                vec![vec![
                    habit.id.to_string(),
                    format!("{} {}", habit.emoji, habit.name),
                    habit.created_at.clone(),
                    streak.to_string(),
                ]],
            )
        );
    }
    Ok(())
}

fn edit(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let id = id_arg(sub)?;
    update(
        conn,
        &user,
        id,
        sub.get_one::<String>("name").map(|s| s.as_str()),
        sub.get_one::<String>("emoji").map(|s| s.as_str()),
    )?;
    println!("Updated habit #{}", id);
    Ok(())
}

fn rm(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let id = id_arg(sub)?;
    delete(conn, &user, id)?;
    println!("Removed habit #{}", id);
    Ok(())
}

fn checkin(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let id = id_arg(sub)?;
    let date = date_or_today(sub)?;
    if check_in(conn, &user, id, date)? {
        let streak = streak(conn, &user, id, Local::now().date_naive())?;
        println!("Checked in habit #{} for {} (streak {})", id, date, streak);
    } else {
        println!("Habit #{} was already checked in for {}", id, date);
    }
    Ok(())
}

fn uncheck(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(sub)?;
    let id = id_arg(sub)?;
    let date = date_or_today(sub)?;
    cancel_check_in(conn, &user, id, date)?;
    println!("Cancelled check-in of habit #{} for {}", id, date);
    Ok(())
}

fn list_check_ins(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let id = id_arg(sub)?;
    let range = DateRange::from_matches(sub)?;
    let dates: Vec<String> = check_ins(conn, &user, id, &range)?
        .iter()
        .map(|d| d.to_string())
        .collect();
    if !maybe_print_json(json_flag, jsonl_flag, &dates)? {
        let rows = dates.into_iter().map(|d| vec![d]).collect();
        println!("{}", pretty_table(&["Date"], rows));
    }
    Ok(())
}

fn print_stats(conn: &Connection, sub: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(sub);
    let user = user_arg(sub)?;
    let id = id_arg(sub)?;
    let today = Local::now().date_naive();
    let year = sub.get_one::<i32>("year").copied().unwrap_or(today.year());
    let month = sub.get_one::<u32>("month").copied().unwrap_or(today.month());
    let s = stats(conn, &user, id, year, month, today)?;
    if !maybe_print_json(json_flag, jsonl_flag, &s)? {
        println!(
            "{}",
            pretty_table(
                &["Month", "Checked", "Days passed", "Rate %", "Streak"],
                vec![vec![
                    format!("{}-{:02}", s.year, s.month),
                    s.checked_days.to_string(),
                    format!("{}/{}", s.days_passed, s.days_in_month),
                    format!("{:.1}", s.completion_rate),
                    s.streak.to_string(),
                ]],
            )
        );
    }
    Ok(())
}
