// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pocketledger::core::advance::{self, NewAdvance};
use pocketledger::core::ledger;
use pocketledger::errors::LedgerError;
use pocketledger::models::{AdvanceStatus, Direction};
use rusqlite::{params, Connection};
use rust_decimal::Decimal;

fn setup() -> (Connection, i64, i64) {
    let conn = Connection::open_in_memory().unwrap();
    pocketledger::db::init_schema(&conn).unwrap();
    conn.execute("INSERT INTO owners(name) VALUES('alice')", [])
        .unwrap();
    let owner_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO accounts(owner_id, name, type, balance, opening_balance, currency)
         VALUES (?1, 'Main', 'checking', '500', '500', 'USD')",
        params![owner_id],
    )
    .unwrap();
    let account_id = conn.last_insert_rowid();
    advance::ensure_advance_categories(&conn, owner_id).unwrap();
    (conn, owner_id, account_id)
}

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn dec(s: &str) -> Decimal {
    s.parse().unwrap()
}

fn new_advance(account_id: i64, amount: &str, direction: Direction) -> NewAdvance {
    NewAdvance {
        account_id,
        amount: dec(amount),
        description: String::new(),
        person: "Marie".into(),
        date: date("2024-06-01"),
        due_date: None,
        direction,
        skip_transaction: false,
    }
}

fn balance_of(conn: &Connection, owner_id: i64, account_id: i64) -> Decimal {
    ledger::load_account(conn, owner_id, account_id)
        .unwrap()
        .balance
}

#[test]
fn lending_money_books_an_expense() {
    let (mut conn, owner, acct) = setup();
    let adv =
        advance::create_advance(&mut conn, owner, &new_advance(acct, "100", Direction::Given))
            .unwrap();
    assert_eq!(adv.status, AdvanceStatus::Pending);
    assert!(adv.transaction_id.is_some());
    assert_eq!(balance_of(&conn, owner, acct), dec("400"));
}

#[test]
fn borrowing_money_books_an_income() {
    let (mut conn, owner, acct) = setup();
    let adv = advance::create_advance(
        &mut conn,
        owner,
        &new_advance(acct, "100", Direction::Received),
    )
    .unwrap();
    assert!(adv.transaction_id.is_some());
    assert_eq!(balance_of(&conn, owner, acct), dec("600"));
}

#[test]
fn skip_transaction_leaves_the_balance_alone() {
    let (mut conn, owner, acct) = setup();
    let mut new = new_advance(acct, "100", Direction::Given);
    new.skip_transaction = true;
    let adv = advance::create_advance(&mut conn, owner, &new).unwrap();
    assert!(adv.transaction_id.is_none());
    assert_eq!(balance_of(&conn, owner, acct), dec("500"));
}

#[test]
fn payments_drive_status_from_partial_to_paid() {
    let (mut conn, owner, acct) = setup();
    let adv =
        advance::create_advance(&mut conn, owner, &new_advance(acct, "100", Direction::Given))
            .unwrap();

    let (after_first, receipt) =
        advance::record_payment(&mut conn, owner, adv.id, dec("40"), false, date("2024-07-01"))
            .unwrap();
    assert_eq!(after_first.status, AdvanceStatus::Partial);
    assert_eq!(after_first.amount_received, dec("40"));
    assert_eq!(receipt.remaining, dec("60"));
    assert!(!receipt.is_fully_paid);

    let (after_second, receipt) =
        advance::record_payment(&mut conn, owner, adv.id, dec("60"), false, date("2024-08-01"))
            .unwrap();
    assert_eq!(after_second.status, AdvanceStatus::Paid);
    assert!(receipt.is_fully_paid);

    // Lent 100, repaid 40 + 60: back to the opening balance.
    assert_eq!(balance_of(&conn, owner, acct), dec("500"));

    // Paid is terminal.
    let err =
        advance::record_payment(&mut conn, owner, adv.id, dec("1"), false, date("2024-09-01"))
            .unwrap_err();
    assert!(matches!(err, LedgerError::Conflict(_)));
}

#[test]
fn overpayment_is_rejected_and_leaves_state_unchanged() {
    let (mut conn, owner, acct) = setup();
    let adv =
        advance::create_advance(&mut conn, owner, &new_advance(acct, "100", Direction::Given))
            .unwrap();

    let err =
        advance::record_payment(&mut conn, owner, adv.id, dec("150"), false, date("2024-07-01"))
            .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));

    let reloaded = advance::load_advance(&conn, owner, adv.id).unwrap();
    assert_eq!(reloaded.status, AdvanceStatus::Pending);
    assert_eq!(reloaded.amount_received, Decimal::ZERO);
    assert_eq!(balance_of(&conn, owner, acct), dec("400"));
    // No repayment transaction was written.
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM transactions WHERE kind='income'",
            [],
            |r| r.get(0),
        )
        .unwrap();
    assert_eq!(count, 0);
}

#[test]
fn non_positive_payments_are_rejected() {
    let (mut conn, owner, acct) = setup();
    let adv =
        advance::create_advance(&mut conn, owner, &new_advance(acct, "100", Direction::Given))
            .unwrap();
    let err =
        advance::record_payment(&mut conn, owner, adv.id, dec("0"), false, date("2024-07-01"))
            .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));
    let err =
        advance::record_payment(&mut conn, owner, adv.id, dec("-5"), false, date("2024-07-01"))
            .unwrap_err();
    assert!(matches!(err, LedgerError::InvalidArgument(_)));
}

#[test]
fn repaying_a_borrowing_books_an_expense() {
    let (mut conn, owner, acct) = setup();
    let adv = advance::create_advance(
        &mut conn,
        owner,
        &new_advance(acct, "100", Direction::Received),
    )
    .unwrap();
    assert_eq!(balance_of(&conn, owner, acct), dec("600"));

    advance::record_payment(&mut conn, owner, adv.id, dec("100"), false, date("2024-07-01"))
        .unwrap();
    assert_eq!(balance_of(&conn, owner, acct), dec("500"));
}

#[test]
fn missing_bookkeeping_category_is_surfaced_distinctly() {
    let conn = Connection::open_in_memory().unwrap();
    pocketledger::db::init_schema(&conn).unwrap();
    conn.execute("INSERT INTO owners(name) VALUES('bob')", [])
        .unwrap();
    let owner_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO accounts(owner_id, name, type, balance, opening_balance, currency)
         VALUES (?1, 'Main', 'checking', '0', '0', 'USD')",
        params![owner_id],
    )
    .unwrap();
    let account_id = conn.last_insert_rowid();

    let mut conn = conn;
    let err = advance::create_advance(
        &mut conn,
        owner_id,
        &new_advance(account_id, "100", Direction::Given),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        LedgerError::MissingCategory { name: "Advances", .. }
    ));
}

#[test]
fn summary_groups_open_advances_by_person() {
    let (mut conn, owner, acct) = setup();
    let mut a = new_advance(acct, "100", Direction::Given);
    a.person = "Marie".into();
    let first = advance::create_advance(&mut conn, owner, &a).unwrap();
    let mut b = new_advance(acct, "50", Direction::Given);
    b.person = "Paul".into();
    advance::create_advance(&mut conn, owner, &b).unwrap();

    advance::record_payment(&mut conn, owner, first.id, dec("25"), true, date("2024-07-01"))
        .unwrap();

    let (people, totals) = advance::summarize(&conn, owner, Some(Direction::Given)).unwrap();
    assert_eq!(people.len(), 2);
    // Marie still owes 75, Paul 50; largest outstanding first.
    assert_eq!(people[0].person, "Marie");
    assert_eq!(people[0].total_pending, dec("75"));
    assert_eq!(totals.total_advances, 2);
    assert_eq!(totals.count_partial, 1);
    assert_eq!(totals.total_pending, dec("125"));
}
