// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Validation errors raised by the ledger commands.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("Invalid transaction type '{0}', expected income or expense")]
    InvalidKind(String),

    #[error("Amount must be greater than 0, got {0}")]
    NonPositiveAmount(String),

    #[error("Budget cannot be negative, got {0}")]
    NegativeBudget(String),

    #[error("Day of month must be between 1 and 28, got {0}")]
    InvalidDayOfMonth(u32),

    #[error("Invalid date range: {from} is after {to}")]
    InvalidDateRange { from: String, to: String },

    #[error("{what} {id} not found")]
    NotFound { what: &'static str, id: i64 },

    #[error("Unknown format '{0}' (use csv|json|xlsx)")]
    UnknownFormat(String),

    #[error("Unknown coin type '{0}' (use all|gold|silver|copper)")]
    UnknownCoinType(String),

    #[error("Cron secret does not match")]
    BadSecret,

    #[error("Habit '{0}' already exists")]
    DuplicateHabit(String),

    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    #[error("No check-in for habit {id} on {date}")]
    CheckInNotFound { id: i64, date: String },

    #[error("Invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
}
