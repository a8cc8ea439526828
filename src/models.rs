// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Whether a transaction increases or decreases the user's balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Income,
    Expense,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Income => "income",
            Kind::Expense => "expense",
        }
    }

    /// Label used in chat replies and exports.
    pub fn label(&self) -> &'static str {
        match self {
            Kind::Income => "收入",
            Kind::Expense => "支出",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "income" => Ok(Kind::Income),
            "expense" => Ok(Kind::Expense),
            _ => Err(LedgerError::InvalidKind(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub kind: Kind,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub created_at: String, // YYYY-MM-DD HH:MM:SS
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recurring {
    pub id: i64,
    pub user_id: String,
    pub kind: Kind,
    pub amount: Decimal,
    pub category: String,
    pub description: Option<String>,
    pub day_of_month: u32,
    pub is_active: bool,
    pub last_executed: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub transaction_count: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BudgetStatus {
    pub monthly_budget: Decimal,
    pub spent: Decimal,
    pub remaining: Decimal,
    pub percentage: Decimal,
    pub is_over_budget: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Habit {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub emoji: String,
    pub created_at: String,
}

/// A habit as shown in the daily list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitStatus {
    #[serde(flatten)]
    pub habit: Habit,
    pub checked: bool,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HabitStats {
    pub year: i32,
    pub month: u32,
    pub checked_days: u32,
    pub days_in_month: u32,
    pub days_passed: u32,
    pub completion_rate: Decimal,
    pub streak: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reminder {
    pub id: i64,
    pub user_id: String,
    pub name: String,
    pub amount: Decimal,
    pub day_of_month: u32,
    pub is_active: bool,
}
