// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybot::commands::energy::{self, CoinType};
use tallybot::commands::transactions::{self, NewTransaction};
use tallybot::error::LedgerError;
use tallybot::models::Kind;
use tallybot::utils::DateRange;
use tallybot::{cli, db};

fn record(conn: &Connection, kind: Kind, amount: i64, description: &str, date: &str) {
    transactions::insert(
        conn,
        &NewTransaction {
            user_id: "U1",
            kind,
            amount: Decimal::from(amount),
            category: "其他",
            description: Some(description),
            created_at: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(10, 0, 0)
                .unwrap(),
        },
    )
    .unwrap();
}

fn seeded() -> Connection {
    let conn = db::open_in_memory().unwrap();
    record(&conn, Kind::Expense, 1000, "還款 信用卡", "2025-06-01");
    record(&conn, Kind::Expense, 300, "公益捐款", "2025-06-02");
    record(&conn, Kind::Income, 850, "打工", "2025-06-03");
    record(&conn, Kind::Expense, 80, "樂捐", "2025-06-04");
    record(&conn, Kind::Expense, 500, "還債 也算 捐款", "2025-06-05");
    record(&conn, Kind::Expense, 120, "午餐", "2025-06-06");
    conn
}

#[test]
fn history_is_newest_first_and_skips_zero_coin_entries() {
    let conn = seeded();
    let all = energy::history(&conn, "U1", None, 20).unwrap();
    let got: Vec<(&str, CoinType, u64)> = all
        .iter()
        .map(|e| (e.transaction.created_at.as_str(), e.coin, e.coins))
        .collect();
    assert_eq!(
        got,
        [
            ("2025-06-05 10:00:00", CoinType::Gold, 5),
            ("2025-06-03 10:00:00", CoinType::Copper, 8),
            ("2025-06-02 10:00:00", CoinType::Silver, 3),
            ("2025-06-01 10:00:00", CoinType::Gold, 10),
        ]
    );
}

#[test]
fn history_filters_by_coin_type() {
    let conn = seeded();
    let silver = energy::history(&conn, "U1", Some(CoinType::Silver), 20).unwrap();
    // the debt-and-donation entry counts as silver once gold is filtered out
    let dates: Vec<&str> = silver.iter().map(|e| e.transaction.created_at.as_str()).collect();
    assert_eq!(dates, ["2025-06-05 10:00:00", "2025-06-02 10:00:00"]);
    assert!(silver.iter().all(|e| e.coin == CoinType::Silver));

    let copper = energy::history(&conn, "U1", Some(CoinType::Copper), 20).unwrap();
    assert_eq!(copper.len(), 1);
    assert_eq!(copper[0].coins, 8);
}

#[test]
fn history_honours_limit() {
    let conn = seeded();
    let two = energy::history(&conn, "U1", None, 2).unwrap();
    assert_eq!(two.len(), 2);
    assert_eq!(two[1].coin, CoinType::Copper);
    assert!(energy::history(&conn, "U1", None, 0).unwrap().is_empty());
    assert!(energy::history(&conn, "U2", None, 20).unwrap().is_empty());
}

#[test]
fn summary_still_counts_both_tiers() {
    let conn = seeded();
    let coins = energy::for_user(&conn, "U1", &DateRange::default()).unwrap();
    assert_eq!(coins.gold.amount, Decimal::from(1500));
    assert_eq!(coins.silver.amount, Decimal::from(880));
    assert_eq!(coins.silver.coins, 8);
    assert_eq!(coins.total_coins, 15 + 8 + 8);
}

#[test]
fn coin_type_filter_parsing() {
    assert_eq!(CoinType::parse_filter("all").unwrap(), None);
    assert_eq!(CoinType::parse_filter(" Gold ").unwrap(), Some(CoinType::Gold));
    let err = CoinType::parse_filter("platinum").unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::UnknownCoinType("platinum".into()))
    );
}

#[test]
fn history_and_summary_via_cli() {
    let conn = seeded();
    let run = |args: &[&str]| {
        let m = cli::build_cli().get_matches_from(args);
        let (_, sub) = m.subcommand().unwrap();
        energy::handle(&conn, sub)
    };
    run(&["tallybot", "energy", "history", "--user", "U1", "--type", "gold", "--limit", "1", "--json"])
        .unwrap();
    run(&["tallybot", "energy", "summary", "--user", "U1", "--from", "2025-06-02"]).unwrap();
    let err = run(&["tallybot", "energy", "history", "--user", "U1", "--type", "tin"]).unwrap_err();
    assert!(err.to_string().contains("Unknown coin type 'tin'"));
}
