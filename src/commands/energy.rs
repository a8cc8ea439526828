// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Energy coins reward paying down debt (gold), donating (silver) and side
//! jobs (copper). Every 100 units in a tier earns one coin.

use crate::commands::transactions::{self, Filter};
use crate::error::LedgerError;
use crate::models::{Kind, Transaction};
use crate::utils::{json_flags, maybe_print_json, pretty_table, user_arg, DateRange};
use anyhow::Result;
use rusqlite::Connection;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::Serialize;

pub const GOLD_KEYWORDS: &[&str] = &[
    "還債", "還貸", "還款", "還錢", "償還", "貸款", "債務", "借款", "還清",
];
pub const SILVER_KEYWORDS: &[&str] = &["捐款", "捐贈", "慈善", "公益", "愛心", "捐助", "樂捐"];
pub const COPPER_KEYWORDS: &[&str] = &[
    "打工", "兼職", "時薪", "工讀", "臨時工", "零工", "外快", "副業",
];

const UNITS_PER_COIN: Decimal = Decimal::ONE_HUNDRED;

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Tier {
    pub coins: u64,
    pub amount: Decimal,
    pub transactions: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EnergyCoins {
    pub gold: Tier,
    pub silver: Tier,
    pub copper: Tier,
    pub total_coins: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CoinType {
    Gold,
    Silver,
    Copper,
}

impl CoinType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CoinType::Gold => "gold",
            CoinType::Silver => "silver",
            CoinType::Copper => "copper",
        }
    }

    /// `all` selects every tier and maps to `None`.
    pub fn parse_filter(s: &str) -> Result<Option<Self>> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(None),
            "gold" => Ok(Some(CoinType::Gold)),
            "silver" => Ok(Some(CoinType::Silver)),
            "copper" => Ok(Some(CoinType::Copper)),
            other => Err(LedgerError::UnknownCoinType(other.to_string()).into()),
        }
    }
}

/// A transaction that earned coins.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CoinEntry {
    #[serde(flatten)]
    pub transaction: Transaction,
    pub coin: CoinType,
    pub coins: u64,
}

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => print_summary(conn, sub)?,
        Some(("history", sub)) => print_history(conn, sub)?,
        _ => {}
    }
    Ok(())
}

fn print_summary(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(m);
    let user = user_arg(m)?;
    let range = DateRange::from_matches(m)?;
    let coins = for_user(conn, &user, &range)?;
    if !maybe_print_json(json_flag, jsonl_flag, &coins)? {
        let row = |name: &str, t: &Tier| {
            vec![
                name.to_string(),
                t.coins.to_string(),
                format!("{:.2}", t.amount),
                t.transactions.to_string(),
            ]
        };
        println!(
            "{}",
            pretty_table(
                &["Tier", "Coins", "Amount", "Transactions"],
                vec![
                    row("gold", &coins.gold),
                    row("silver", &coins.silver),
                    row("copper", &coins.copper),
                ],
            )
        );
        println!("total coins: {}", coins.total_coins);
    }
    Ok(())
}

fn print_history(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let (json_flag, jsonl_flag) = json_flags(m);
    let user = user_arg(m)?;
    let filter = CoinType::parse_filter(m.get_one::<String>("type").map_or("all", |s| s.as_str()))?;
    let limit = m.get_one::<usize>("limit").copied().unwrap_or(20);
    let entries = history(conn, &user, filter, limit)?;
    if !maybe_print_json(json_flag, jsonl_flag, &entries)? {
        let rows = entries
            .iter()
            .map(|e| {
                vec![
                    e.transaction.created_at.clone(),
                    e.coin.as_str().to_string(),
                    e.coins.to_string(),
                    e.transaction.category.clone(),
                    format!("{:.2}", e.transaction.amount),
                    e.transaction.description.clone().unwrap_or_default(),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Time", "Tier", "Coins", "Category", "Amount", "Description"], rows)
        );
    }
    Ok(())
}

pub fn for_user(conn: &Connection, user_id: &str, range: &DateRange) -> Result<EnergyCoins> {
    let filter = Filter {
        range: *range,
        ..Filter::default()
    };
    Ok(calculate(&transactions::fetch(conn, user_id, &filter)?))
}

/// Newest coin-earning transactions, at most `limit` of them. Each entry is
/// credited to a single tier, checked in gold, silver, copper order.
pub fn history(
    conn: &Connection,
    user_id: &str,
    only: Option<CoinType>,
    limit: usize,
) -> Result<Vec<CoinEntry>> {
    let mut out = Vec::new();
    if limit == 0 {
        return Ok(out);
    }
    for t in transactions::fetch(conn, user_id, &Filter::default())? {
        let tier = tiers_of(&t)
            .into_iter()
            .find(|c| only.is_none_or(|o| o == *c));
        let Some(coin) = tier else { continue };
        let coins = coins_for(t.amount);
        if coins == 0 {
            continue;
        }
        out.push(CoinEntry {
            transaction: t,
            coin,
            coins,
        });
        if out.len() >= limit {
            break;
        }
    }
    Ok(out)
}

/// A transaction can land in both gold and silver; copper is income only.
pub fn calculate(txs: &[Transaction]) -> EnergyCoins {
    let mut out = EnergyCoins::default();
    for t in txs {
        for coin in tiers_of(t) {
            let tier = match coin {
                CoinType::Gold => &mut out.gold,
                CoinType::Silver => &mut out.silver,
                CoinType::Copper => &mut out.copper,
            };
            add(tier, t.amount);
        }
    }
    for tier in [&mut out.gold, &mut out.silver, &mut out.copper] {
        tier.coins = coins_for(tier.amount);
    }
    out.total_coins = out.gold.coins + out.silver.coins + out.copper.coins;
    out
}

/// Tiers whose keywords appear in the category or description, in
/// gold, silver, copper order.
fn tiers_of(t: &Transaction) -> Vec<CoinType> {
    let combined = format!(
        "{} {}",
        t.category.to_lowercase(),
        t.description.as_deref().unwrap_or("").to_lowercase()
    );
    let hit = |keywords: &[&str]| keywords.iter().any(|k| combined.contains(*k));
    let mut out = Vec::new();
    match t.kind {
        Kind::Expense => {
            if hit(GOLD_KEYWORDS) {
                out.push(CoinType::Gold);
            }
            if hit(SILVER_KEYWORDS) {
                out.push(CoinType::Silver);
            }
        }
        Kind::Income => {
            if hit(COPPER_KEYWORDS) {
                out.push(CoinType::Copper);
            }
        }
    }
    out
}

fn coins_for(amount: Decimal) -> u64 {
    (amount / UNITS_PER_COIN).floor().to_u64().unwrap_or(0)
}

fn add(tier: &mut Tier, amount: Decimal) {
    tier.amount += amount;
    tier.transactions += 1;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tx(kind: Kind, amount: i64, category: &str, description: &str) -> Transaction {
        Transaction {
            id: 0,
            user_id: "u".into(),
            kind,
            amount: Decimal::from(amount),
            category: category.into(),
            description: Some(description.into()),
            created_at: "2025-03-01 12:00:00".into(),
        }
    }

    #[test]
    fn coins_floor_per_hundred() {
        let coins = calculate(&[
            tx(Kind::Expense, 250, "其他", "還債250"),
            tx(Kind::Expense, 99, "其他", "樂捐 99"),
            tx(Kind::Income, 1200, "其他", "打工 1200"),
        ]);
        assert_eq!(coins.gold.coins, 2);
        assert_eq!(coins.silver.coins, 0);
        assert_eq!(coins.silver.amount, Decimal::from(99));
        assert_eq!(coins.copper.coins, 12);
        assert_eq!(coins.total_coins, 14);
    }

    #[test]
    fn kind_gates_tiers() {
        // income with a debt keyword and expense with a side-job keyword earn nothing
        let coins = calculate(&[
            tx(Kind::Income, 500, "其他", "借款 500"),
            tx(Kind::Expense, 500, "其他", "打工 交通 500"),
        ]);
        assert_eq!(coins, EnergyCoins::default());
    }

    #[test]
    fn expense_can_count_twice() {
        let coins = calculate(&[tx(Kind::Expense, 300, "其他", "還款 + 公益 300")]);
        assert_eq!(coins.gold.coins, 3);
        assert_eq!(coins.silver.coins, 3);
        assert_eq!(coins.total_coins, 6);
    }
}
