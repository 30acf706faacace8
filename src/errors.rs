// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use thiserror::Error;

/// Errors produced by the core engines.
///
/// The CLI layer absorbs these into `anyhow` at the command boundary;
/// callers that need to distinguish cases (e.g. offering to provision a
/// missing bookkeeping category) can match on the variant.
#[derive(Debug, Error)]
pub enum LedgerError {
    /// A referenced row (account, category, budget, transaction, advance,
    /// recurring rule, owner) does not exist for the given owner.
    #[error("{0}")]
    NotFound(String),

    /// The request itself is malformed: bad enum value, missing transfer
    /// target, self-referential parent, overpayment, and so on.
    #[error("{0}")]
    InvalidArgument(String),

    /// The request is well-formed but collides with current state:
    /// duplicate root budget, advance already paid, exhausted rule edited.
    #[error("{0}")]
    Conflict(String),

    /// A bookkeeping category the advance flow depends on is absent.
    /// Surfaced separately so the caller can offer to provision it.
    #[error("bookkeeping category '{name}' ({kind}) is missing; run `advance init-categories`")]
    MissingCategory { name: &'static str, kind: &'static str },

    /// A stored value could not be interpreted (bad decimal or date text).
    #[error("invalid {column} value '{value}' in database")]
    Corrupt {
        column: &'static str,
        value: String,
    },

    #[error(transparent)]
    Storage(#[from] rusqlite::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;
