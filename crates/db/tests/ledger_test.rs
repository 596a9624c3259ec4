//! Integration tests for payments, expenses and the ledger linker.
//!
//! Every scenario runs against the in-memory entity store and checks account
//! balances and ledger transactions after each commit.

mod common;

use rust_decimal_macros::dec;
use serde_json::json;

use cemtrade_core::ledger::{EntryType, LedgerCategory, LedgerError, LinkRef};
use cemtrade_db::repositories::{ExpenseInput, FundTransferInput, LedgerEntryInput, PaymentInput};
use cemtrade_db::{Collection, RepositoryError};
use cemtrade_shared::types::{AccountId, ExpenseId, PaymentId};

use common::{Harness, day};

fn expense_input(amount: rust_decimal::Decimal, account_id: Option<AccountId>) -> ExpenseInput {
    ExpenseInput {
        vendor: "Shell".to_string(),
        item: "Fuel".to_string(),
        amount,
        date: day(10),
        account_id,
        note: None,
    }
}

// ========== Payments ==========

#[tokio::test]
async fn test_payment_create_then_delete_restores_balance() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(10000)).await;
    let ali = h.customer("Ali Traders", dec!(0)).await;

    let payment = h
        .repos
        .payments
        .record_payment(PaymentInput {
            customer_id: ali.id,
            amount: dec!(2500),
            date: day(5),
            account_id: Some(cash.id),
            note: None,
        })
        .await
        .unwrap();

    assert_eq!(h.balance(cash.id).await, dec!(12500));
    assert_eq!(payment.method.as_deref(), Some("Cash"));
    let linked = h
        .repos
        .ledger
        .find_linked(LinkRef::Payment(payment.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.entry_type, EntryType::Credit);
    assert_eq!(linked.category, LedgerCategory::SalesPayment);
    assert_eq!(linked.amount, dec!(2500));

    h.repos.payments.delete_payment(payment.id).await.unwrap();

    assert_eq!(h.balance(cash.id).await, dec!(10000));
    assert!(
        h.repos
            .ledger
            .find_linked(LinkRef::Payment(payment.id))
            .await
            .unwrap()
            .is_none()
    );
    assert_eq!(h.count(Collection::Payments).await, 0);
}

#[tokio::test]
async fn test_payment_edit_applies_net_delta() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(0)).await;
    let bank = h.account("Bank", dec!(0)).await;
    let ali = h.customer("Ali Traders", dec!(0)).await;
    let input = PaymentInput {
        customer_id: ali.id,
        amount: dec!(1000),
        date: day(5),
        account_id: Some(cash.id),
        note: None,
    };
    let payment = h.repos.payments.record_payment(input.clone()).await.unwrap();

    h.repos
        .payments
        .update_payment(
            payment.id,
            PaymentInput {
                amount: dec!(1200),
                ..input.clone()
            },
        )
        .await
        .unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(1200));

    let moved = h
        .repos
        .payments
        .update_payment(
            payment.id,
            PaymentInput {
                amount: dec!(900),
                account_id: Some(bank.id),
                ..input
            },
        )
        .await
        .unwrap();
    assert_eq!(moved.method.as_deref(), Some("Bank"));
    assert_eq!(h.balance(cash.id).await, dec!(0));
    assert_eq!(h.balance(bank.id).await, dec!(900));

    let linked = h
        .repos
        .ledger
        .find_linked(LinkRef::Payment(payment.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.account_id, bank.id);
    assert_eq!(linked.amount, dec!(900));
    assert_eq!(h.count(Collection::GlobalTransactions).await, 1);
}

#[tokio::test]
async fn test_payment_to_missing_account_is_stale_and_writes_nothing() {
    let h = Harness::new();
    let ali = h.customer("Ali Traders", dec!(0)).await;
    let ghost = AccountId::new();

    let err = h
        .repos
        .payments
        .record_payment(PaymentInput {
            customer_id: ali.id,
            amount: dec!(100),
            date: day(5),
            account_id: Some(ghost),
            note: None,
        })
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RepositoryError::StaleReference { collection: Collection::Accounts, id } if id == ghost.into_inner()
    ));
    assert_eq!(h.count(Collection::Payments).await, 0);
    assert_eq!(h.count(Collection::GlobalTransactions).await, 0);
}

#[tokio::test]
async fn test_non_positive_payment_is_rejected() {
    let h = Harness::new();
    let ali = h.customer("Ali Traders", dec!(0)).await;

    let err = h
        .repos
        .payments
        .record_payment(PaymentInput {
            customer_id: ali.id,
            amount: dec!(0),
            date: day(5),
            account_id: None,
            note: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, RepositoryError::Ledger(LedgerError::NonPositiveAmount(_))));
}

#[tokio::test]
async fn test_deleting_legacy_payment_without_linked_entry_is_tolerated() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(5000)).await;
    let id = PaymentId::new();
    h.store
        .create(
            Collection::Payments,
            json!({
                "id": id,
                "customer": "Ali Traders",
                "amount": "700",
                "date": "2023-12-01",
                "accountId": cash.id,
            }),
        )
        .await
        .unwrap();

    h.repos.payments.delete_payment(id).await.unwrap();

    assert_eq!(h.count(Collection::Payments).await, 0);
    assert_eq!(h.balance(cash.id).await, dec!(5000));
}

#[tokio::test]
async fn test_editing_legacy_payment_posts_a_fresh_linked_entry() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(5000)).await;
    let ali = h.customer("Ali Traders", dec!(0)).await;
    let id = PaymentId::new();
    h.store
        .create(
            Collection::Payments,
            json!({
                "id": id,
                "customer": "Ali Traders",
                "amount": "700",
                "date": "2023-12-01",
                "accountId": cash.id,
            }),
        )
        .await
        .unwrap();

    h.repos
        .payments
        .update_payment(
            id,
            PaymentInput {
                customer_id: ali.id,
                amount: dec!(1000),
                date: day(3),
                account_id: Some(cash.id),
                note: None,
            },
        )
        .await
        .unwrap();

    // Only the new amount posts; the legacy 700 never reached the ledger.
    assert_eq!(h.balance(cash.id).await, dec!(6000));
    let linked = h
        .repos
        .ledger
        .find_linked(LinkRef::Payment(id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.amount, dec!(1000));
    assert_eq!(linked.account_id, cash.id);
    assert!(!h.repos.accounts.check_drift(cash.id).await.unwrap().is_drifted());

    h.repos.payments.delete_payment(id).await.unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(5000));
    assert_eq!(h.count(Collection::GlobalTransactions).await, 0);
    assert!(!h.repos.accounts.check_drift(cash.id).await.unwrap().is_drifted());
}

#[tokio::test]
async fn test_editing_legacy_payment_to_another_account_leaves_the_old_one() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(5000)).await;
    let bank = h.account("Bank", dec!(2000)).await;
    let ali = h.customer("Ali Traders", dec!(0)).await;
    let id = PaymentId::new();
    h.store
        .create(
            Collection::Payments,
            json!({
                "id": id,
                "customerId": ali.id,
                "amount": "700",
                "date": "2023-12-01",
                "accountId": cash.id,
            }),
        )
        .await
        .unwrap();

    h.repos
        .payments
        .update_payment(
            id,
            PaymentInput {
                customer_id: ali.id,
                amount: dec!(700),
                date: day(3),
                account_id: Some(bank.id),
                note: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(h.balance(cash.id).await, dec!(5000));
    assert_eq!(h.balance(bank.id).await, dec!(2700));
    assert_eq!(h.count(Collection::GlobalTransactions).await, 1);
    for account in [cash.id, bank.id] {
        assert!(!h.repos.accounts.check_drift(account).await.unwrap().is_drifted());
    }
}

// ========== Expenses ==========

async fn legacy_expense(h: &Harness, account_id: AccountId, amount: &str) -> ExpenseId {
    let id = ExpenseId::new();
    h.store
        .create(
            Collection::Expenses,
            json!({
                "id": id,
                "vendor": "Shell",
                "item": "Fuel",
                "amount": amount,
                "date": "2023-11-20",
                "accountId": account_id,
            }),
        )
        .await
        .unwrap();
    id
}

#[tokio::test]
async fn test_editing_legacy_expense_posts_a_fresh_linked_entry() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(10000)).await;
    let id = legacy_expense(&h, cash.id, "500").await;

    h.repos
        .expenses
        .update_expense(id, expense_input(dec!(300), Some(cash.id)))
        .await
        .unwrap();

    assert_eq!(h.balance(cash.id).await, dec!(9700));
    let linked = h
        .repos
        .ledger
        .find_linked(LinkRef::Expense(id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.entry_type, EntryType::Debit);
    assert_eq!(linked.amount, dec!(300));
    assert!(!h.repos.accounts.check_drift(cash.id).await.unwrap().is_drifted());

    h.repos.expenses.delete_expense(id).await.unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(10000));
    assert!(!h.repos.accounts.check_drift(cash.id).await.unwrap().is_drifted());
}

#[tokio::test]
async fn test_clearing_account_on_legacy_expense_changes_no_balance() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(10000)).await;
    let id = legacy_expense(&h, cash.id, "500").await;

    h.repos
        .expenses
        .update_expense(id, expense_input(dec!(500), None))
        .await
        .unwrap();

    assert_eq!(h.balance(cash.id).await, dec!(10000));
    assert_eq!(h.count(Collection::GlobalTransactions).await, 0);
    assert!(!h.repos.accounts.check_drift(cash.id).await.unwrap().is_drifted());
}

#[tokio::test]
async fn test_expense_edit_same_account_yields_b_minus_a2() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(10000)).await;

    let expense = h
        .repos
        .expenses
        .record_expense(expense_input(dec!(500), Some(cash.id)))
        .await
        .unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(9500));

    h.repos
        .expenses
        .update_expense(expense.id, expense_input(dec!(300), Some(cash.id)))
        .await
        .unwrap();

    assert_eq!(h.balance(cash.id).await, dec!(9700));
    let linked = h
        .repos
        .ledger
        .find_linked(LinkRef::Expense(expense.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.amount, dec!(300));
    assert_eq!(linked.entry_type, EntryType::Debit);
    assert_eq!(linked.description, "Fuel - Shell");
}

#[tokio::test]
async fn test_expense_account_change_reverts_old_and_applies_new() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(10000)).await;
    let bank = h.account("Bank", dec!(10000)).await;

    let expense = h
        .repos
        .expenses
        .record_expense(expense_input(dec!(500), Some(cash.id)))
        .await
        .unwrap();
    h.repos
        .expenses
        .update_expense(expense.id, expense_input(dec!(450), Some(bank.id)))
        .await
        .unwrap();

    assert_eq!(h.balance(cash.id).await, dec!(10000));
    assert_eq!(h.balance(bank.id).await, dec!(9550));
    let linked = h
        .repos
        .ledger
        .find_linked(LinkRef::Expense(expense.id))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(linked.account_id, bank.id);
}

#[tokio::test]
async fn test_expense_account_added_and_cleared() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(1000)).await;

    let expense = h
        .repos
        .expenses
        .record_expense(expense_input(dec!(200), None))
        .await
        .unwrap();
    assert_eq!(h.count(Collection::GlobalTransactions).await, 0);

    h.repos
        .expenses
        .update_expense(expense.id, expense_input(dec!(200), Some(cash.id)))
        .await
        .unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(800));
    assert_eq!(h.count(Collection::GlobalTransactions).await, 1);

    h.repos
        .expenses
        .update_expense(expense.id, expense_input(dec!(200), None))
        .await
        .unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(1000));
    assert_eq!(h.count(Collection::GlobalTransactions).await, 0);
}

#[tokio::test]
async fn test_expense_delete_reverses_exactly_once() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(10000)).await;
    let expense = h
        .repos
        .expenses
        .record_expense(expense_input(dec!(750), Some(cash.id)))
        .await
        .unwrap();

    h.repos.expenses.delete_expense(expense.id).await.unwrap();

    assert_eq!(h.balance(cash.id).await, dec!(10000));
    assert_eq!(h.count(Collection::Expenses).await, 0);
    assert_eq!(h.count(Collection::GlobalTransactions).await, 0);
}

#[tokio::test]
async fn test_expense_on_missing_account_rolls_back() {
    let h = Harness::new();
    let err = h
        .repos
        .expenses
        .record_expense(expense_input(dec!(100), Some(AccountId::new())))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "STALE_REFERENCE");
    assert_eq!(h.count(Collection::Expenses).await, 0);
    assert_eq!(h.count(Collection::GlobalTransactions).await, 0);
}

// ========== Linker primitives ==========

#[tokio::test]
async fn test_update_linked_amount_leaves_balance_to_caller() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(1000)).await;
    let expense = h
        .repos
        .expenses
        .record_expense(expense_input(dec!(100), Some(cash.id)))
        .await
        .unwrap();

    let updated = h
        .repos
        .ledger
        .update_linked_transaction_amount(LinkRef::Expense(expense.id), dec!(150), None)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.amount, dec!(150));
    assert_eq!(updated.description, "Fuel - Shell");
    assert_eq!(h.balance(cash.id).await, dec!(900));

    // The ledger now says 1000 - 150; the stored balance is stale by 50.
    let drift = h.repos.accounts.check_drift(cash.id).await.unwrap();
    assert_eq!(drift.derived, dec!(850));
    assert_eq!(drift.correction(), dec!(-50));
}

#[tokio::test]
async fn test_missing_linked_entry_is_a_no_op() {
    let h = Harness::new();
    let link = LinkRef::Payment(PaymentId::new());

    assert!(h.repos.ledger.delete_linked_transaction(link).await.unwrap().is_none());
    assert!(
        h.repos
            .ledger
            .update_linked_transaction_amount(link, dec!(10), Some("x".to_string()))
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn test_record_linked_transaction_credits_account() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(0)).await;
    let link = LinkRef::Payment(PaymentId::new());

    h.repos
        .ledger
        .record_linked_transaction(
            link,
            cash.id,
            EntryType::Credit,
            dec!(640),
            cemtrade_db::repositories::LinkedEntryDetails {
                date: day(3),
                description: "Counter sale".to_string(),
                category: LedgerCategory::SalesPayment,
            },
        )
        .await
        .unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(640));

    h.repos.ledger.delete_linked_transaction(link).await.unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(0));
}

// ========== Manual entries ==========

#[tokio::test]
async fn test_manual_entry_lifecycle() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(1000)).await;
    let input = LedgerEntryInput {
        account_id: cash.id,
        entry_type: EntryType::Credit,
        amount: dec!(300),
        date: day(2),
        description: "Owner top-up".to_string(),
        category: LedgerCategory::Other("Capital".to_string()),
    };

    let entry = h.repos.ledger.create_entry(input.clone()).await.unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(1300));

    h.repos
        .ledger
        .update_entry(
            entry.id,
            LedgerEntryInput {
                entry_type: EntryType::Debit,
                amount: dec!(100),
                ..input
            },
        )
        .await
        .unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(900));

    h.repos.ledger.delete_entry(entry.id).await.unwrap();
    assert_eq!(h.balance(cash.id).await, dec!(1000));
}

#[tokio::test]
async fn test_linked_entry_cannot_be_edited_through_ledger() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(1000)).await;
    let expense = h
        .repos
        .expenses
        .record_expense(expense_input(dec!(100), Some(cash.id)))
        .await
        .unwrap();
    let linked = h
        .repos
        .ledger
        .find_linked(LinkRef::Expense(expense.id))
        .await
        .unwrap()
        .unwrap();

    let err = h.repos.ledger.delete_entry(linked.id).await.unwrap_err();
    assert!(matches!(
        err,
        RepositoryError::Ledger(LedgerError::LinkedEntryReadOnly(id)) if id == linked.id
    ));
    assert_eq!(h.balance(cash.id).await, dec!(900));
}

// ========== Fund transfers ==========

#[tokio::test]
async fn test_fund_transfer_and_delete() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(10000)).await;
    let bank = h.account("Bank", dec!(0)).await;

    let transfer = h
        .repos
        .ledger
        .transfer_funds(FundTransferInput {
            from: cash.id,
            to: bank.id,
            amount: dec!(2500),
            date: day(8),
            description: None,
        })
        .await
        .unwrap();

    assert_eq!(h.balance(cash.id).await, dec!(7500));
    assert_eq!(h.balance(bank.id).await, dec!(2500));
    assert_eq!(transfer.debit.transfer_id, Some(transfer.transfer_id));
    assert_eq!(transfer.credit.category, LedgerCategory::FundTransfer);

    let removed = h
        .repos
        .ledger
        .delete_fund_transfer(transfer.transfer_id)
        .await
        .unwrap();
    assert_eq!(removed, 2);
    assert_eq!(h.balance(cash.id).await, dec!(10000));
    assert_eq!(h.balance(bank.id).await, dec!(0));
}

#[tokio::test]
async fn test_fund_transfer_to_same_account_is_rejected() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(100)).await;
    let err = h
        .repos
        .ledger
        .transfer_funds(FundTransferInput {
            from: cash.id,
            to: cash.id,
            amount: dec!(50),
            date: day(8),
            description: None,
        })
        .await
        .unwrap_err();
    assert_eq!(err.error_code(), "SAME_ACCOUNT_TRANSFER");
}

// ========== Accounts ==========

#[tokio::test]
async fn test_reconcile_repairs_drift() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(1000)).await;
    h.repos
        .expenses
        .record_expense(expense_input(dec!(250), Some(cash.id)))
        .await
        .unwrap();

    h.store
        .update(Collection::Accounts, cash.id.into_inner(), json!({ "balance": "999" }))
        .await
        .unwrap();
    let drifted = h.repos.accounts.find_drifted().await.unwrap();
    assert_eq!(drifted.len(), 1);

    let drift = h.repos.accounts.reconcile(cash.id).await.unwrap();
    assert_eq!(drift.stored, dec!(999));
    assert_eq!(drift.derived, dec!(750));
    assert_eq!(h.balance(cash.id).await, dec!(750));
    assert!(h.repos.accounts.find_drifted().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_opening_balance_change_shifts_balance() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(1000)).await;
    h.repos.accounts.adjust_balance(cash.id, dec!(200)).await.unwrap();

    let updated = h
        .repos
        .accounts
        .update_account(
            cash.id,
            cemtrade_db::repositories::UpdateAccountInput {
                opening_balance: Some(dec!(1500)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.opening_balance, dec!(1500));
    assert_eq!(updated.balance, dec!(1700));
    assert_eq!(updated.name, "Cash");
}

#[tokio::test]
async fn test_account_with_entries_cannot_be_deleted() {
    let h = Harness::new();
    let cash = h.account("Cash", dec!(1000)).await;
    h.repos
        .expenses
        .record_expense(expense_input(dec!(10), Some(cash.id)))
        .await
        .unwrap();

    let err = h.repos.accounts.delete_account(cash.id).await.unwrap_err();
    assert!(matches!(err, RepositoryError::AccountInUse { entries: 1, .. }));

    let spare = h.account("Spare", dec!(0)).await;
    h.repos.accounts.delete_account(spare.id).await.unwrap();
    assert!(h.repos.accounts.get_account(spare.id).await.unwrap().is_none());
}
