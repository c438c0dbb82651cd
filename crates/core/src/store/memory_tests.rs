use super::*;
use rust_decimal_macros::dec;

use crate::ledger::Split;

fn cad() -> Commodity {
    Commodity::currency("CAD")
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn book_with_accounts() -> (MemoryBook, AccountId, AccountId) {
    let mut book = MemoryBook::new(cad());
    let root = book.root_account();
    let fund = book
        .ensure_path(root, &["FAMILY", "INVEST", "OPEN", "MFC 856"], &cad())
        .unwrap();
    let hold = book.add_account(root, "HOLD", cad()).unwrap();
    (book, fund, hold)
}

fn post(book: &mut MemoryBook, on: NaiveDate, debit: AccountId, credit: AccountId, value: Decimal) {
    let mut tx = Transaction::draft(cad(), on, "test");
    tx.add_split(Split::currency_leg(debit, value));
    tx.add_split(Split::currency_leg(credit, -value));
    book.commit_transaction(tx).unwrap();
}

#[test]
fn test_new_book_has_root_and_currency() {
    let book = MemoryBook::new(cad());
    let root = book.account(book.root_account()).unwrap();
    assert_eq!(root.name, ROOT_ACCOUNT_NAME);
    assert!(root.is_root());
    assert_eq!(book.lookup_commodity("ISO4217", "CAD"), Some(cad()));
    assert!(book.lookup_commodity("ISO4217", "USD").is_none());
    book.validate().unwrap();
}

#[test]
fn test_duplicate_sibling_rejected() {
    let (mut book, _, _) = book_with_accounts();
    let root = book.root_account();
    let err = book.add_account(root, "HOLD", cad()).unwrap_err();
    assert!(matches!(err, StoreError::DuplicateAccount { .. }));
}

#[test]
fn test_lookup_child_is_exact() {
    let (book, _, hold) = book_with_accounts();
    let root = book.root_account();
    assert_eq!(book.lookup_child(root, "HOLD"), Some(hold));
    assert_eq!(book.lookup_child(root, "hold"), None);
    assert_eq!(book.lookup_child(root, "HOL"), None);
}

#[test]
fn test_descendants_depth_first_excluding_self() {
    let (book, fund, hold) = book_with_accounts();
    let root = book.root_account();
    let names: Vec<String> = book
        .descendants(root)
        .into_iter()
        .map(|id| book.account(id).unwrap().name.clone())
        .collect();
    assert_eq!(names, vec!["FAMILY", "INVEST", "OPEN", "MFC 856", "HOLD"]);
    assert!(book.descendants(fund).is_empty());
    assert!(book.descendants(hold).is_empty());
}

#[test]
fn test_balance_as_of_is_inclusive() {
    let (mut book, fund, hold) = book_with_accounts();
    post(&mut book, date(2021, 3, 31), fund, hold, dec!(100.00));
    post(&mut book, date(2021, 4, 1), fund, hold, dec!(50.00));

    assert_eq!(book.balance_as_of(fund, date(2021, 3, 30)).unwrap(), Decimal::ZERO);
    assert_eq!(book.balance_as_of(fund, date(2021, 3, 31)).unwrap(), dec!(100.00));
    assert_eq!(book.balance_as_of(fund, date(2021, 4, 1)).unwrap(), dec!(150.00));
    assert_eq!(book.balance_as_of(hold, date(2021, 4, 1)).unwrap(), dec!(-150.00));
}

#[test]
fn test_balance_of_missing_account() {
    let book = MemoryBook::new(cad());
    let err = book.balance_as_of(AccountId::new(), date(2021, 1, 1)).unwrap_err();
    assert!(matches!(err, StoreError::AccountMissing(_)));
}

#[test]
fn test_commit_rejects_unknown_account() {
    let (mut book, fund, _) = book_with_accounts();
    let mut tx = Transaction::draft(cad(), date(2021, 1, 1), "bad");
    tx.add_split(Split::currency_leg(fund, dec!(1)));
    tx.add_split(Split::currency_leg(AccountId::new(), dec!(-1)));
    assert!(matches!(
        book.commit_transaction(tx),
        Err(StoreError::AccountMissing(_))
    ));
    assert_eq!(book.transactions().count(), 0);
}

#[test]
fn test_splits_by_account() {
    let (mut book, fund, hold) = book_with_accounts();
    post(&mut book, date(2021, 1, 5), fund, hold, dec!(10.00));
    post(&mut book, date(2021, 2, 5), fund, hold, dec!(20.00));
    assert_eq!(book.splits(fund).len(), 2);
    assert_eq!(book.splits(hold).len(), 2);
    let tx_id = book.splits(fund)[0].transaction_id;
    assert!(book.transaction(tx_id).is_some());
}

#[test]
fn test_convert_direct_and_inverse() {
    let mut book = MemoryBook::new(cad());
    let fund = Commodity::fund("MFC 856");
    book.begin_price_edit();
    book.add_price(Price::nav(fund.clone(), cad(), date(2021, 3, 1), dec!(10.0000)))
        .unwrap();
    book.add_price(Price::nav(fund.clone(), cad(), date(2021, 3, 15), dec!(12.5000)))
        .unwrap();
    book.commit_price_edit().unwrap();

    // Latest price on or before the date wins.
    assert_eq!(
        book.convert(dec!(2), &fund, &cad(), date(2021, 3, 10)).unwrap(),
        dec!(20.00)
    );
    assert_eq!(
        book.convert(dec!(2), &fund, &cad(), date(2021, 3, 31)).unwrap(),
        dec!(25.00)
    );
    // Inverse direction divides and rounds to the fund's four places.
    assert_eq!(
        book.convert(dec!(100), &cad(), &fund, date(2021, 3, 31)).unwrap(),
        dec!(8.0000)
    );
    assert!(matches!(
        book.convert(dec!(2), &fund, &cad(), date(2021, 2, 1)),
        Err(StoreError::NoPrice { .. })
    ));
    assert_eq!(
        book.convert(dec!(7.77), &cad(), &cad(), date(2021, 2, 1)).unwrap(),
        dec!(7.77)
    );
}

#[test]
fn test_price_edit_replaces_same_key() {
    let mut book = MemoryBook::new(cad());
    let fund = Commodity::fund("TML 674");

    assert!(matches!(
        book.add_price(Price::nav(fund.clone(), cad(), date(2021, 1, 1), dec!(1))),
        Err(StoreError::NoPriceEdit)
    ));

    book.begin_price_edit();
    book.add_price(Price::nav(fund.clone(), cad(), date(2021, 1, 1), dec!(1)))
        .unwrap();
    assert!(book.prices().is_empty());
    assert_eq!(book.commit_price_edit().unwrap(), 1);

    book.begin_price_edit();
    book.add_price(Price::nav(fund.clone(), cad(), date(2021, 1, 1), dec!(2)))
        .unwrap();
    book.commit_price_edit().unwrap();
    assert_eq!(book.prices().len(), 1);
    assert_eq!(book.prices()[0].value, dec!(2));
}

#[test]
fn test_price_rollback_drops_pending() {
    let mut book = MemoryBook::new(cad());
    book.begin_price_edit();
    book.add_price(Price::nav(Commodity::fund("X"), cad(), date(2021, 1, 1), dec!(1)))
        .unwrap();
    assert_eq!(book.rollback_price_edit(), 1);
    assert!(matches!(book.commit_price_edit(), Err(StoreError::NoPriceEdit)));
    assert!(book.prices().is_empty());
}

#[test]
fn test_validate_detects_corruption() {
    let (book, fund, _) = book_with_accounts();

    let mut orphaned = book.clone();
    let root = orphaned.root;
    orphaned.accounts.get_mut(&root).unwrap().children.clear();
    assert!(matches!(orphaned.validate(), Err(StoreError::CorruptTree(_))));

    let mut cyclic = book.clone();
    let root = cyclic.root;
    cyclic.accounts.get_mut(&fund).unwrap().children.push(root);
    assert!(matches!(cyclic.validate(), Err(StoreError::CorruptTree(_))));

    let mut duplicate = book;
    let root = duplicate.root;
    let hold_twin = Account::new("HOLD", cad(), Some(root));
    let twin_id = hold_twin.id;
    duplicate.accounts.insert(twin_id, hold_twin);
    duplicate.accounts.get_mut(&root).unwrap().children.push(twin_id);
    assert!(matches!(duplicate.validate(), Err(StoreError::CorruptTree(_))));
}

#[test]
fn test_json_round_trip_keeps_tree() {
    let (mut book, fund, hold) = book_with_accounts();
    post(&mut book, date(2021, 1, 5), fund, hold, dec!(10.00));

    let json = serde_json::to_string(&book).unwrap();
    let loaded: MemoryBook = serde_json::from_str(&json).unwrap();
    loaded.validate().unwrap();
    assert_eq!(loaded.descendants(loaded.root_account()).len(), 5);
    assert_eq!(loaded.balance_as_of(fund, date(2021, 1, 5)).unwrap(), dec!(10.00));
}
