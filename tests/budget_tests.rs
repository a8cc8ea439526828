// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rusqlite::Connection;
use rust_decimal::Decimal;
use tallybot::commands::budgets;
use tallybot::commands::transactions::{self, NewTransaction};
use tallybot::db;
use tallybot::models::Kind;

fn spend(conn: &Connection, kind: Kind, amount: i64, date: &str) {
    transactions::insert(
        conn,
        &NewTransaction {
            user_id: "U1",
            kind,
            amount: Decimal::from(amount),
            category: "餐飲",
            description: None,
            created_at: NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .unwrap()
                .and_hms_opt(12, 0, 0)
                .unwrap(),
        },
    )
    .unwrap();
}

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn status_counts_month_to_date_expenses_only() {
    let conn = db::open_in_memory().unwrap();
    budgets::set_budget(&conn, "U1", Decimal::from(3000)).unwrap();
    spend(&conn, Kind::Expense, 999, "2025-05-31");
    spend(&conn, Kind::Expense, 500, "2025-06-02");
    spend(&conn, Kind::Expense, 500, "2025-06-10");
    spend(&conn, Kind::Income, 8000, "2025-06-05");
    spend(&conn, Kind::Expense, 700, "2025-06-20");

    let s = budgets::budget_status(&conn, "U1", day("2025-06-15")).unwrap();
    assert_eq!(s.monthly_budget, Decimal::from(3000));
    assert_eq!(s.spent, Decimal::from(1000));
    assert_eq!(s.remaining, Decimal::from(2000));
    assert_eq!(s.percentage, Decimal::new(333, 1));
    assert!(!s.is_over_budget);
}

#[test]
fn over_budget_goes_negative() {
    let conn = db::open_in_memory().unwrap();
    budgets::set_budget(&conn, "U1", Decimal::from(100)).unwrap();
    spend(&conn, Kind::Expense, 150, "2025-06-01");
    let s = budgets::budget_status(&conn, "U1", day("2025-06-01")).unwrap();
    assert_eq!(s.remaining, Decimal::from(-50));
    assert_eq!(s.percentage, Decimal::from(150));
    assert!(s.is_over_budget);
}

#[test]
fn unset_budget_reports_zero_percent() {
    let conn = db::open_in_memory().unwrap();
    spend(&conn, Kind::Expense, 150, "2025-06-01");
    assert!(!budgets::has_budget(&conn, "U1").unwrap());
    let s = budgets::budget_status(&conn, "U1", day("2025-06-03")).unwrap();
    assert_eq!(s.monthly_budget, Decimal::ZERO);
    assert_eq!(s.percentage, Decimal::ZERO);
    assert!(s.is_over_budget);
}

#[test]
fn set_budget_upserts_per_user() {
    let conn = db::open_in_memory().unwrap();
    let first = budgets::set_budget(&conn, "U1", Decimal::from(1000)).unwrap();
    let second = budgets::set_budget(&conn, "U1", Decimal::from(2500)).unwrap();
    assert_eq!(first, second);
    assert_eq!(budgets::get_budget(&conn, "U1").unwrap(), Decimal::from(2500));
    assert_eq!(budgets::get_budget(&conn, "U2").unwrap(), Decimal::ZERO);
    assert!(budgets::set_budget(&conn, "U1", Decimal::from(-1)).is_err());
}
