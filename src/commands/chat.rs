// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Chat front end: keyword commands, otherwise bookkeeping statements.

use crate::commands::{budgets, energy, reports, transactions};
use crate::config::Config;
use crate::line::LineClient;
use crate::models::Summary;
use crate::parser;
use crate::utils::{fmt_money, json_flags, maybe_print_json, user_arg, DateRange};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDateTime};
use rusqlite::Connection;
use serde::Serialize;

pub const QUICK_REPLIES: [&str; 3] = ["今日收支", "能量幣", "使用說明"];

const RULE: &str = "━━━━━━━━━━━━━━";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Source {
    Text,
    /// Speech-to-text transcript. Keyword commands are not recognised.
    Voice,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Reply {
    pub text: String,
    /// Id of the transaction written for this message, if any.
    pub recorded: Option<i64>,
}

impl Reply {
    fn text(text: String) -> Self {
        Self {
            text,
            recorded: None,
        }
    }
}

pub fn handle(conn: &Connection, cfg: &Config, m: &clap::ArgMatches) -> Result<()> {
    let user = user_arg(m)?;
    let text = m.get_one::<String>("text").context("--text is required")?;
    let source = if m.get_flag("voice") {
        Source::Voice
    } else {
        Source::Text
    };
    let reply = handle_message(conn, cfg, &user, text, source, Local::now().naive_local())?;

    if let Some(token) = m.get_one::<String>("reply_token") {
        match cfg.line_access_token.as_deref() {
            Some(access) => LineClient::new(access)?.reply(token, &reply, &cfg.dashboard_url)?,
            None => tracing::warn!("reply token given but LINE_CHANNEL_ACCESS_TOKEN is not set"),
        }
    }
    if !maybe_print_json(m.get_flag("json"), false, &reply)? {
        println!("{}", reply.text);
    }
    Ok(())
}

/// Show how a statement would be recorded without storing it.
pub fn preview(m: &clap::ArgMatches) -> Result<()> {
    let text = m.get_one::<String>("text").context("text is required")?;
    let (as_json, as_jsonl) = json_flags(m);
    match parser::parse(text.trim()) {
        Some(p) => {
            if !maybe_print_json(as_json, as_jsonl, &p)? {
                println!(
                    "{} {} {} ({})",
                    p.kind.label(),
                    p.category,
                    fmt_money(&p.amount),
                    p.description
                );
            }
        }
        None => println!("No amount found"),
    }
    Ok(())
}

/// Answer one incoming message for `user_id`. Statements that parse are
/// stored with `now` as their timestamp.
pub fn handle_message(
    conn: &Connection,
    cfg: &Config,
    user_id: &str,
    text: &str,
    source: Source,
    now: NaiveDateTime,
) -> Result<Reply> {
    let text = text.trim();
    tracing::debug!(user = user_id, ?source, text, "incoming message");

    if source == Source::Text {
        match text {
            "使用說明" => return Ok(Reply::text(usage(cfg))),
            "今日收支" => {
                let s = reports::summary(conn, user_id, &DateRange::day(now.date()))?;
                return Ok(Reply::text(summary_text("今日收支報告", &s, cfg)));
            }
            "本月收支" => {
                let today = now.date();
                let s = reports::summary(conn, user_id, &DateRange::month_to_date(today))?;
                let mut out = summary_text("本月收支報告", &s, cfg);
                if budgets::has_budget(conn, user_id)? {
                    let b = budgets::budget_status(conn, user_id, today)?;
                    out.push_str(&format!(
                        "\n\n🎯 預算：{}（已用 {}%，剩餘 {}）",
                        fmt_money(&b.monthly_budget),
                        b.percentage,
                        fmt_money(&b.remaining)
                    ));
                    if b.is_over_budget {
                        out.push_str("\n⚠️ 本月已超出預算");
                    }
                }
                return Ok(Reply::text(out));
            }
            "能量幣" => {
                let coins = energy::for_user(conn, user_id, &DateRange::default())?;
                return Ok(Reply::text(energy_text(&coins, cfg)));
            }
            _ => {}
        }
    }

    let Some(parsed) = parser::parse(text) else {
        tracing::info!(user = user_id, ?source, "message not understood");
        let out = match source {
            Source::Text => fallback_help(),
            Source::Voice => format!(
                "抱歉，無法解析記帳內容。\n\n語音辨識結果：{}\n\n請嘗試說清楚金額，例如「午餐 150」",
                text
            ),
        };
        return Ok(Reply::text(out));
    };

    let id = transactions::insert(
        conn,
        &transactions::NewTransaction {
            user_id,
            kind: parsed.kind,
            amount: parsed.amount,
            category: &parsed.category,
            description: Some(&parsed.description),
            created_at: now,
        },
    )?;
    Ok(Reply {
        text: format!(
            "✅ 記帳成功！\n\n類型：{}\n分類：{}\n金額：{}\n描述：{}",
            parsed.kind.label(),
            parsed.category,
            fmt_money(&parsed.amount),
            parsed.description
        ),
        recorded: Some(id),
    })
}

fn usage(cfg: &Config) -> String {
    format!(
        "📝 語音記帳使用說明\n{RULE}\n【記帳方式】\n• 語音：直接說「午餐 150」\n• 文字：輸入「午餐 150」\n• 收入：輸入「收入 薪水 50000」\n\n【查看記錄】\n• 輸入「今日收支」或「本月收支」\n• 網頁版：\n{}",
        cfg.dashboard_url
    )
}

fn fallback_help() -> String {
    format!(
        "📝 記帳小幫手\n{RULE}\n請輸入記帳內容，例如：\n• 午餐 150\n• 交通費 50\n• 收入 薪水 50000\n\n或使用語音輸入更方便！"
    )
}

fn summary_text(title: &str, s: &Summary, cfg: &Config) -> String {
    format!(
        "📊 {title}\n{RULE}\n💰 收入：{}\n💸 支出：{}\n{RULE}\n📈 結餘：{}\n📝 筆數：{} 筆\n\n🌐 查看更多：\n{}",
        fmt_money(&s.total_income),
        fmt_money(&s.total_expense),
        fmt_money(&s.balance),
        s.transaction_count,
        cfg.dashboard_url
    )
}

fn energy_text(c: &energy::EnergyCoins, cfg: &Config) -> String {
    format!(
        "✨ 能量幣報告\n{RULE}\n🥇 金幣：{} 枚\n   └ 還債累計 {}\n🥈 銀幣：{} 枚\n   └ 捐款累計 {}\n🥉 銅幣：{} 枚\n   └ 打工累計 {}\n{RULE}\n🏆 總能量幣：{} 枚\n\n🌐 查看詳情：\n{}",
        c.gold.coins,
        fmt_money(&c.gold.amount),
        c.silver.coins,
        fmt_money(&c.silver.amount),
        c.copper.coins,
        fmt_money(&c.copper.amount),
        c.total_coins,
        cfg.dashboard_url
    )
}
