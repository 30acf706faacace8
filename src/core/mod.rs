// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! The engines behind the CLI: balance-preserving transaction writes,
//! recurrence materialization, budget roll-ups, and advance repayments.
//!
//! Everything here takes an explicit `owner_id`; rows belonging to other
//! owners are treated as absent.

pub mod advance;
pub mod budget;
pub mod catalog;
pub mod ledger;
pub mod schedule;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::errors::{LedgerError, Result};

/// Parse a decimal read back from a TEXT column.
pub(crate) fn stored_decimal(value: &str, column: &'static str) -> Result<Decimal> {
    value.parse::<Decimal>().map_err(|_| LedgerError::Corrupt {
        column,
        value: value.to_string(),
    })
}

/// Parse a `YYYY-MM-DD` date read back from a TEXT column.
pub(crate) fn stored_date(value: &str, column: &'static str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(value, "%Y-%m-%d").map_err(|_| LedgerError::Corrupt {
        column,
        value: value.to_string(),
    })
}
