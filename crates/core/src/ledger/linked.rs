//! Net-delta planning for edits of records that own a ledger transaction.
//!
//! Payments (Credit) and expenses (Debit) share one rule set. An edit is
//! reduced to the smallest list of account adjustments, never to a delete
//! followed by a re-create.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use cemtrade_shared::types::AccountId;

use super::balance::{BalanceAdjustment, BalanceService};
use super::entry::EntryType;

/// The account and amount a domain record posts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkedPosting {
    /// Account the money moves through.
    pub account_id: AccountId,
    /// Unsigned amount.
    pub amount: Decimal,
}

impl LinkedPosting {
    /// Creates a new posting.
    #[must_use]
    pub const fn new(account_id: AccountId, amount: Decimal) -> Self {
        Self { account_id, amount }
    }
}

/// What must happen to the linked ledger transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LinkAction {
    /// No account before or after; nothing is linked.
    None,
    /// An account was selected for the first time.
    Create,
    /// The linked entry follows the new amount/account.
    Update,
    /// The account was cleared; the linked entry goes away.
    Delete,
}

/// Result of planning an edit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedEditPlan {
    /// Balance adjustments to apply, at most one per account.
    pub adjustments: Vec<BalanceAdjustment>,
    /// Required change to the linked ledger transaction.
    pub action: LinkAction,
}

/// Stateless planner for linked-record edits.
pub struct LinkedEditService;

impl LinkedEditService {
    /// Plans the balance adjustments for editing a record that posts `entry_type`.
    ///
    /// - same account: one adjustment of `signed(new) - signed(old)`
    /// - different accounts: revert the old account, apply to the new one
    /// - account added or removed: apply or revert only
    #[must_use]
    pub fn plan(
        entry_type: EntryType,
        old: Option<LinkedPosting>,
        new: Option<LinkedPosting>,
    ) -> LinkedEditPlan {
        match (old, new) {
            (None, None) => LinkedEditPlan {
                adjustments: Vec::new(),
                action: LinkAction::None,
            },
            (None, Some(new)) => LinkedEditPlan {
                adjustments: BalanceService::coalesce([BalanceAdjustment::new(
                    new.account_id,
                    entry_type.signed(new.amount),
                )]),
                action: LinkAction::Create,
            },
            (Some(old), None) => LinkedEditPlan {
                adjustments: BalanceService::coalesce([BalanceAdjustment::new(
                    old.account_id,
                    -entry_type.signed(old.amount),
                )]),
                action: LinkAction::Delete,
            },
            (Some(old), Some(new)) if old.account_id == new.account_id => LinkedEditPlan {
                adjustments: BalanceService::coalesce([BalanceAdjustment::new(
                    new.account_id,
                    entry_type.signed(new.amount) - entry_type.signed(old.amount),
                )]),
                action: LinkAction::Update,
            },
            (Some(old), Some(new)) => LinkedEditPlan {
                adjustments: BalanceService::coalesce([
                    BalanceAdjustment::new(old.account_id, -entry_type.signed(old.amount)),
                    BalanceAdjustment::new(new.account_id, entry_type.signed(new.amount)),
                ]),
                action: LinkAction::Update,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn apply(balances: &mut HashMap<AccountId, Decimal>, plan: &LinkedEditPlan) {
        for adjustment in &plan.adjustments {
            *balances.entry(adjustment.account_id).or_default() += adjustment.delta;
        }
    }

    #[test]
    fn test_expense_same_account_uses_delta() {
        let cash = AccountId::new();
        let plan = LinkedEditService::plan(
            EntryType::Debit,
            Some(LinkedPosting::new(cash, dec!(500))),
            Some(LinkedPosting::new(cash, dec!(300))),
        );

        assert_eq!(plan.action, LinkAction::Update);
        assert_eq!(plan.adjustments, vec![BalanceAdjustment::new(cash, dec!(200))]);
    }

    #[test]
    fn test_expense_account_change_reverts_and_applies() {
        let cash = AccountId::new();
        let bank = AccountId::new();
        let plan = LinkedEditService::plan(
            EntryType::Debit,
            Some(LinkedPosting::new(cash, dec!(500))),
            Some(LinkedPosting::new(bank, dec!(450))),
        );

        assert_eq!(
            plan.adjustments,
            vec![
                BalanceAdjustment::new(cash, dec!(500)),
                BalanceAdjustment::new(bank, dec!(-450)),
            ]
        );
    }

    #[test]
    fn test_payment_same_account_uses_delta() {
        let cash = AccountId::new();
        let plan = LinkedEditService::plan(
            EntryType::Credit,
            Some(LinkedPosting::new(cash, dec!(1000))),
            Some(LinkedPosting::new(cash, dec!(1200))),
        );

        assert_eq!(plan.adjustments, vec![BalanceAdjustment::new(cash, dec!(200))]);
    }

    #[test]
    fn test_unchanged_amount_plans_no_adjustment() {
        let cash = AccountId::new();
        let plan = LinkedEditService::plan(
            EntryType::Credit,
            Some(LinkedPosting::new(cash, dec!(1000))),
            Some(LinkedPosting::new(cash, dec!(1000))),
        );

        assert!(plan.adjustments.is_empty());
        assert_eq!(plan.action, LinkAction::Update);
    }

    #[test]
    fn test_account_added_and_removed() {
        let cash = AccountId::new();
        let added = LinkedEditService::plan(
            EntryType::Credit,
            None,
            Some(LinkedPosting::new(cash, dec!(75))),
        );
        assert_eq!(added.action, LinkAction::Create);
        assert_eq!(added.adjustments, vec![BalanceAdjustment::new(cash, dec!(75))]);

        let removed = LinkedEditService::plan(
            EntryType::Debit,
            Some(LinkedPosting::new(cash, dec!(75))),
            None,
        );
        assert_eq!(removed.action, LinkAction::Delete);
        assert_eq!(removed.adjustments, vec![BalanceAdjustment::new(cash, dec!(75))]);

        let nothing = LinkedEditService::plan(EntryType::Debit, None, None);
        assert_eq!(nothing.action, LinkAction::None);
        assert!(nothing.adjustments.is_empty());
    }

    fn amount() -> impl Strategy<Value = Decimal> {
        (1i64..10_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(200))]

        /// Applying the original posting then the edit plan leaves every account
        /// exactly where applying only the edited posting would.
        #[test]
        fn prop_edit_equals_fresh_application(
            old_amount in amount(),
            new_amount in amount(),
            same_account in any::<bool>(),
            credit in any::<bool>(),
        ) {
            let entry_type = if credit { EntryType::Credit } else { EntryType::Debit };
            let first = AccountId::new();
            let second = if same_account { first } else { AccountId::new() };
            let old = LinkedPosting::new(first, old_amount);
            let new = LinkedPosting::new(second, new_amount);

            let mut edited = HashMap::new();
            apply(&mut edited, &LinkedEditService::plan(entry_type, None, Some(old)));
            apply(&mut edited, &LinkedEditService::plan(entry_type, Some(old), Some(new)));

            let mut fresh = HashMap::new();
            apply(&mut fresh, &LinkedEditService::plan(entry_type, None, Some(new)));

            for account in [first, second] {
                prop_assert_eq!(
                    edited.get(&account).copied().unwrap_or_default(),
                    fresh.get(&account).copied().unwrap_or_default()
                );
            }
        }
    }
}
