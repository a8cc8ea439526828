// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use tallybot::commands::habits;
use tallybot::error::LedgerError;
use tallybot::utils::DateRange;
use tallybot::{cli, db};

fn day(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

#[test]
fn create_trims_and_rejects_duplicates() {
    let conn = db::open_in_memory().unwrap();
    let id = habits::create(&conn, "U1", "  喝水 ", None).unwrap();
    let h = habits::get(&conn, "U1", id).unwrap();
    assert_eq!(h.name, "喝水");
    assert_eq!(h.emoji, habits::DEFAULT_EMOJI);

    let err = habits::create(&conn, "U1", "喝水", Some("💧")).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::DuplicateHabit("喝水".into()))
    );
    let err = habits::create(&conn, "U1", "   ", None).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::EmptyField("Habit name"))
    );

    // names are unique per user only
    habits::create(&conn, "U2", "喝水", Some("💧")).unwrap();
}

#[test]
fn rename_checks_other_habits_only() {
    let conn = db::open_in_memory().unwrap();
    let run = habits::create(&conn, "U1", "跑步", None).unwrap();
    habits::create(&conn, "U1", "閱讀", None).unwrap();

    habits::update(&conn, "U1", run, Some("跑步"), Some("🏃")).unwrap();
    assert_eq!(habits::get(&conn, "U1", run).unwrap().emoji, "🏃");

    let err = habits::update(&conn, "U1", run, Some("閱讀"), None).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::DuplicateHabit(_))
    ));
    assert_eq!(habits::get(&conn, "U1", run).unwrap().name, "跑步");
}

#[test]
fn check_in_is_idempotent_and_can_be_cancelled() {
    let conn = db::open_in_memory().unwrap();
    let id = habits::create(&conn, "U1", "早睡", None).unwrap();

    assert!(habits::check_in(&conn, "U1", id, day("2025-03-01")).unwrap());
    assert!(!habits::check_in(&conn, "U1", id, day("2025-03-01")).unwrap());
    let all = habits::check_ins(&conn, "U1", id, &DateRange::default()).unwrap();
    assert_eq!(all, vec![day("2025-03-01")]);

    habits::cancel_check_in(&conn, "U1", id, day("2025-03-01")).unwrap();
    let err = habits::cancel_check_in(&conn, "U1", id, day("2025-03-01")).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::CheckInNotFound {
            id,
            date: "2025-03-01".into()
        })
    );
}

#[test]
fn other_users_cannot_touch_a_habit() {
    let conn = db::open_in_memory().unwrap();
    let id = habits::create(&conn, "U1", "冥想", None).unwrap();
    let err = habits::check_in(&conn, "U2", id, day("2025-03-01")).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::NotFound { what: "Habit", id })
    );
    assert!(habits::delete(&conn, "U2", id).is_err());
    assert!(habits::list_with_status(&conn, "U2", day("2025-03-01"))
        .unwrap()
        .is_empty());
}

#[test]
fn check_ins_filter_by_range_newest_first() {
    let conn = db::open_in_memory().unwrap();
    let id = habits::create(&conn, "U1", "喝水", None).unwrap();
    for d in ["2025-02-28", "2025-03-01", "2025-03-03", "2025-03-10"] {
        habits::check_in(&conn, "U1", id, day(d)).unwrap();
    }
    let range = DateRange::new(Some(day("2025-03-01")), Some(day("2025-03-03"))).unwrap();
    let got = habits::check_ins(&conn, "U1", id, &range).unwrap();
    assert_eq!(got, vec![day("2025-03-03"), day("2025-03-01")]);
}

#[test]
fn streak_counts_back_from_today_or_yesterday() {
    let conn = db::open_in_memory().unwrap();
    let id = habits::create(&conn, "U1", "跑步", None).unwrap();
    for d in ["2025-02-27", "2025-03-01", "2025-03-02", "2025-03-03"] {
        habits::check_in(&conn, "U1", id, day(d)).unwrap();
    }
    assert_eq!(habits::streak(&conn, "U1", id, day("2025-03-03")).unwrap(), 3);
    // today not checked yet
    assert_eq!(habits::streak(&conn, "U1", id, day("2025-03-04")).unwrap(), 3);
    assert_eq!(habits::streak(&conn, "U1", id, day("2025-03-05")).unwrap(), 0);
    // later check-ins are ignored when looking at an earlier day
    assert_eq!(habits::streak(&conn, "U1", id, day("2025-02-27")).unwrap(), 1);
}

#[test]
fn list_shows_today_state_and_streak() {
    let conn = db::open_in_memory().unwrap();
    let water = habits::create(&conn, "U1", "喝水", Some("💧")).unwrap();
    let read = habits::create(&conn, "U1", "閱讀", None).unwrap();
    habits::check_in(&conn, "U1", water, day("2025-03-01")).unwrap();
    habits::check_in(&conn, "U1", water, day("2025-03-02")).unwrap();
    habits::check_in(&conn, "U1", read, day("2025-03-01")).unwrap();

    let list = habits::list_with_status(&conn, "U1", day("2025-03-02")).unwrap();
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].habit.id, water);
    assert!(list[0].checked);
    assert_eq!(list[0].streak, 2);
    assert!(!list[1].checked);
    assert_eq!(list[1].streak, 1);

    let v = serde_json::to_value(&list[0]).unwrap();
    assert_eq!(v["name"], "喝水");
    assert_eq!(v["checked"], true);
}

#[test]
fn stats_for_current_and_past_month() {
    let conn = db::open_in_memory().unwrap();
    let id = habits::create(&conn, "U1", "早睡", None).unwrap();
    for d in ["2025-02-27", "2025-03-01", "2025-03-02", "2025-03-03"] {
        habits::check_in(&conn, "U1", id, day(d)).unwrap();
    }

    let march = habits::stats(&conn, "U1", id, 2025, 3, day("2025-03-10")).unwrap();
    assert_eq!(march.checked_days, 3);
    assert_eq!(march.days_in_month, 31);
    assert_eq!(march.days_passed, 10);
    assert_eq!(march.completion_rate, Decimal::new(300, 1));
    assert_eq!(march.streak, 0);

    let feb = habits::stats(&conn, "U1", id, 2025, 2, day("2025-03-10")).unwrap();
    assert_eq!(feb.checked_days, 1);
    assert_eq!(feb.days_in_month, 28);
    assert_eq!(feb.days_passed, 28);
    assert_eq!(feb.completion_rate, Decimal::new(36, 1));

    let err = habits::stats(&conn, "U1", id, 2025, 13, day("2025-03-10")).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::InvalidMonth {
            year: 2025,
            month: 13
        })
    );
}

#[test]
fn delete_removes_check_ins() {
    let conn = db::open_in_memory().unwrap();
    let id = habits::create(&conn, "U1", "喝水", None).unwrap();
    habits::check_in(&conn, "U1", id, day("2025-03-01")).unwrap();
    habits::delete(&conn, "U1", id).unwrap();

    let left: i64 = conn
        .query_row("SELECT COUNT(*) FROM habit_checkins", [], |r| r.get(0))
        .unwrap();
    assert_eq!(left, 0);
    assert!(habits::get(&conn, "U1", id).is_err());
}

#[test]
fn check_in_via_cli() {
    let conn = db::open_in_memory().unwrap();
    let run = |args: &[&str]| {
        let m = cli::build_cli().get_matches_from(args);
        let (_, sub) = m.subcommand().unwrap();
        habits::handle(&conn, sub)
    };
    run(&["tallybot", "habit", "add", "--user", "U1", "--name", "伸展", "--emoji", "🧘"]).unwrap();
    let id = habits::list_with_status(&conn, "U1", day("2025-03-01")).unwrap()[0]
        .habit
        .id
        .to_string();

    run(&["tallybot", "habit", "checkin", "--user", "U1", "--id", id.as_str(), "--date", "2025-03-01"])
        .unwrap();
    run(&["tallybot", "habit", "checkin", "--user", "U1", "--id", id.as_str(), "--date", "2025-03-02"])
        .unwrap();
    run(&["tallybot", "habit", "uncheck", "--user", "U1", "--id", id.as_str(), "--date", "2025-03-01"])
        .unwrap();
    run(&["tallybot", "habit", "stats", "--user", "U1", "--id", id.as_str(), "--year", "2025", "--month", "3", "--json"])
        .unwrap();

    let id: i64 = id.parse().unwrap();
    let dates = habits::check_ins(&conn, "U1", id, &DateRange::default()).unwrap();
    assert_eq!(dates, vec![day("2025-03-02")]);
}
