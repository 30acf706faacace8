// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::errors::LedgerError;

/// Kind of a concrete or recurring transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TxKind {
    Income,
    Expense,
    Transfer,
}

impl TxKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TxKind::Income => "income",
            TxKind::Expense => "expense",
            TxKind::Transfer => "transfer",
        }
    }
}

impl FromStr for TxKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(TxKind::Income),
            "expense" => Ok(TxKind::Expense),
            "transfer" => Ok(TxKind::Transfer),
            other => Err(LedgerError::InvalidArgument(format!(
                "Unknown transaction kind '{}', expected income, expense or transfer",
                other
            ))),
        }
    }
}

impl fmt::Display for TxKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryKind {
    Income,
    Expense,
}

impl CategoryKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CategoryKind::Income => "income",
            CategoryKind::Expense => "expense",
        }
    }
}

impl FromStr for CategoryKind {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "income" => Ok(CategoryKind::Income),
            "expense" => Ok(CategoryKind::Expense),
            other => Err(LedgerError::InvalidArgument(format!(
                "Unknown category kind '{}', expected income or expense",
                other
            ))),
        }
    }
}

impl fmt::Display for CategoryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Recurrence cadence. Stored as text; [`Frequency::from_db`] maps
/// unrecognized stored values to `Monthly` so a rule with legacy frequency
/// text still advances by one calendar month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Biweekly,
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
}

impl Frequency {
    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Daily => "daily",
            Frequency::Weekly => "weekly",
            Frequency::Biweekly => "biweekly",
            Frequency::Monthly => "monthly",
            Frequency::Quarterly => "quarterly",
            Frequency::SemiAnnual => "semi_annual",
            Frequency::Annual => "annual",
        }
    }

    /// Lenient variant for values read back from storage.
    pub fn from_db(s: &str) -> Frequency {
        s.parse().unwrap_or(Frequency::Monthly)
    }
}

impl FromStr for Frequency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "daily" => Ok(Frequency::Daily),
            "weekly" => Ok(Frequency::Weekly),
            "biweekly" => Ok(Frequency::Biweekly),
            "monthly" => Ok(Frequency::Monthly),
            "quarterly" => Ok(Frequency::Quarterly),
            "semi_annual" => Ok(Frequency::SemiAnnual),
            "annual" => Ok(Frequency::Annual),
            other => Err(LedgerError::InvalidArgument(format!(
                "Unknown frequency '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for Frequency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction of an advance: money lent out or borrowed in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Given,
    Received,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Given => "given",
            Direction::Received => "received",
        }
    }
}

impl FromStr for Direction {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "given" => Ok(Direction::Given),
            "received" => Ok(Direction::Received),
            other => Err(LedgerError::InvalidArgument(format!(
                "Unknown direction '{}', expected given or received",
                other
            ))),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AdvanceStatus {
    Pending,
    Partial,
    Paid,
}

impl AdvanceStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdvanceStatus::Pending => "pending",
            AdvanceStatus::Partial => "partial",
            AdvanceStatus::Paid => "paid",
        }
    }

    /// Status is a pure function of the cumulative repayment.
    pub fn from_amounts(received: Decimal, total: Decimal) -> AdvanceStatus {
        if received <= Decimal::ZERO {
            AdvanceStatus::Pending
        } else if received >= total {
            AdvanceStatus::Paid
        } else {
            AdvanceStatus::Partial
        }
    }
}

impl FromStr for AdvanceStatus {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(AdvanceStatus::Pending),
            "partial" => Ok(AdvanceStatus::Partial),
            "paid" => Ok(AdvanceStatus::Paid),
            other => Err(LedgerError::InvalidArgument(format!(
                "Unknown advance status '{}', expected pending, partial or paid",
                other
            ))),
        }
    }
}

impl fmt::Display for AdvanceStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i64,
    pub owner_id: i64,
    pub name: String,
    pub r#type: String,
    pub balance: Decimal,
    pub opening_balance: Decimal,
    pub currency: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: i64,
    pub owner_id: i64,
    pub parent_id: Option<i64>,
    pub name: String,
    pub kind: CategoryKind,
    pub icon: Option<String>,
    pub color: Option<String>,
    pub is_default: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub account_id: i64,
    pub target_account_id: Option<i64>,
    pub category_id: Option<i64>,
    pub recurring_id: Option<i64>,
    pub kind: TxKind,
    pub amount: Decimal,
    pub description: String,
    pub date: NaiveDate,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecurringRule {
    pub id: i64,
    pub owner_id: i64,
    pub account_id: i64,
    pub category_id: Option<i64>,
    pub kind: TxKind,
    pub amount: Decimal,
    pub description: String,
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub occurrences_limit: Option<i64>,
    pub occurrences_count: i64,
    pub next_occurrence: NaiveDate,
    pub is_active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Budget {
    pub id: i64,
    pub owner_id: i64,
    pub category_id: i64,
    pub parent_id: Option<i64>,
    pub amount: Decimal,
    pub display_order: Option<i64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Advance {
    pub id: i64,
    pub owner_id: i64,
    pub account_id: i64,
    pub amount: Decimal,
    pub description: String,
    pub person: String,
    pub date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    pub direction: Direction,
    pub status: AdvanceStatus,
    pub amount_received: Decimal,
    pub transaction_id: Option<i64>,
}
