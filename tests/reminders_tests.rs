// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use rust_decimal::Decimal;
use tallybot::commands::reminders::{self, ReminderUpdate};
use tallybot::error::LedgerError;
use tallybot::{cli, db};

#[test]
fn create_validates_input() {
    let conn = db::open_in_memory().unwrap();
    for day in [0, 29] {
        let err = reminders::create(&conn, "U1", "房租", Decimal::from(12000), day).unwrap_err();
        assert_eq!(
            err.downcast_ref::<LedgerError>(),
            Some(&LedgerError::InvalidDayOfMonth(day))
        );
    }
    let err = reminders::create(&conn, "U1", "房租", Decimal::ZERO, 5).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::NonPositiveAmount(_))
    ));
    let err = reminders::create(&conn, "U1", " ", Decimal::from(100), 5).unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::EmptyField("Reminder name"))
    );
    assert!(reminders::list_active(&conn, "U1").unwrap().items.is_empty());
}

#[test]
fn list_orders_by_day_and_sums_active_only() {
    let conn = db::open_in_memory().unwrap();
    let phone = reminders::create(&conn, "U1", "電話費", Decimal::new(59900, 2), 20).unwrap();
    reminders::create(&conn, "U1", "房租", Decimal::from(12000), 5).unwrap();
    let gym = reminders::create(&conn, "U1", "健身房", Decimal::from(1500), 1).unwrap();
    reminders::create(&conn, "U2", "房租", Decimal::from(9000), 5).unwrap();

    reminders::update(
        &conn,
        "U1",
        gym,
        &ReminderUpdate {
            is_active: Some(false),
            ..ReminderUpdate::default()
        },
    )
    .unwrap();

    let list = reminders::list_active(&conn, "U1").unwrap();
    let names: Vec<&str> = list.items.iter().map(|r| r.name.as_str()).collect();
    assert_eq!(names, ["房租", "電話費"]);
    assert_eq!(list.total, Decimal::new(1259900, 2));
    assert_eq!(list.items[1].id, phone);

    // paused reminders stay reachable by id
    let paused = reminders::get(&conn, "U1", gym).unwrap();
    assert!(!paused.is_active);
}

#[test]
fn update_changes_fields_and_validates() {
    let conn = db::open_in_memory().unwrap();
    let id = reminders::create(&conn, "U1", "保險", Decimal::from(3000), 15).unwrap();
    reminders::update(
        &conn,
        "U1",
        id,
        &ReminderUpdate {
            name: Some("車險".into()),
            amount: Some(Decimal::from(3200)),
            day_of_month: Some(10),
            is_active: None,
        },
    )
    .unwrap();
    let r = reminders::get(&conn, "U1", id).unwrap();
    assert_eq!(r.name, "車險");
    assert_eq!(r.amount, Decimal::from(3200));
    assert_eq!(r.day_of_month, 10);
    assert!(r.is_active);

    let err = reminders::update(
        &conn,
        "U1",
        id,
        &ReminderUpdate {
            day_of_month: Some(31),
            ..ReminderUpdate::default()
        },
    )
    .unwrap_err();
    assert_eq!(
        err.downcast_ref::<LedgerError>(),
        Some(&LedgerError::InvalidDayOfMonth(31))
    );
    assert_eq!(reminders::get(&conn, "U1", id).unwrap().day_of_month, 10);
}

#[test]
fn reminders_are_scoped_to_their_user() {
    let conn = db::open_in_memory().unwrap();
    let id = reminders::create(&conn, "U1", "房租", Decimal::from(12000), 5).unwrap();
    let not_found = Some(LedgerError::NotFound {
        what: "Reminder",
        id,
    });

    let err = reminders::get(&conn, "U2", id).unwrap_err();
    assert_eq!(err.downcast_ref::<LedgerError>(), not_found.as_ref());
    let err = reminders::update(&conn, "U2", id, &ReminderUpdate::default()).unwrap_err();
    assert_eq!(err.downcast_ref::<LedgerError>(), not_found.as_ref());
    let err = reminders::delete(&conn, "U2", id).unwrap_err();
    assert_eq!(err.downcast_ref::<LedgerError>(), not_found.as_ref());

    reminders::delete(&conn, "U1", id).unwrap();
    assert!(reminders::get(&conn, "U1", id).is_err());
}

#[test]
fn add_and_pause_via_cli() {
    let conn = db::open_in_memory().unwrap();
    let run = |args: &[&str]| {
        let m = cli::build_cli().get_matches_from(args);
        let (_, sub) = m.subcommand().unwrap();
        reminders::handle(&conn, sub)
    };
    run(&[
        "tallybot", "reminder", "add", "--user", "U1", "--name", "房租", "--amount", "12000",
        "--day", "5",
    ])
    .unwrap();
    let id = reminders::list_active(&conn, "U1").unwrap().items[0].id.to_string();
    run(&[
        "tallybot", "reminder", "edit", "--user", "U1", "--id", id.as_str(), "--active", "false",
    ])
    .unwrap();
    assert!(reminders::list_active(&conn, "U1").unwrap().items.is_empty());

    let err = run(&[
        "tallybot", "reminder", "add", "--user", "U1", "--name", "水費", "--amount", "0",
        "--day", "5",
    ])
    .unwrap_err();
    assert!(err.to_string().contains("greater than 0"));
}
