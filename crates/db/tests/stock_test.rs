//! Integration tests for shop quantities, stock movements and transfers.

mod common;

use rstest::rstest;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use cemtrade_core::ledger::LedgerError;
use cemtrade_core::stock::{StockStatus, StockTransactionType};
use cemtrade_db::repositories::{StockMovementInput, TransferInput, UpdateShopInput};
use cemtrade_db::{Collection, RepositoryError};
use cemtrade_shared::types::ShopId;

use common::{Harness, day};

fn movement(shop_id: ShopId, kind: StockTransactionType, quantity: Decimal) -> StockMovementInput {
    StockMovementInput {
        shop_id,
        kind,
        quantity,
        date: day(12),
        product: Some("OPC 50kg".to_string()),
        note: None,
    }
}

fn transfer(from: ShopId, to: ShopId, quantity: Decimal) -> TransferInput {
    TransferInput {
        from,
        to,
        quantity,
        date: day(14),
        product: Some("OPC 50kg".to_string()),
    }
}

// ========== Movements ==========

#[tokio::test]
async fn test_sale_edit_moves_quantity_by_net_delta() {
    let h = Harness::new();
    let shop = h.shop("Main Road", dec!(100), dec!(10)).await;

    let sale = h
        .repos
        .stock
        .record_movement(movement(shop.id, StockTransactionType::Sale, dec!(10)))
        .await
        .unwrap();
    assert_eq!(h.quantity(shop.id).await, dec!(90));
    assert_eq!(sale.unit, "bags");

    h.repos
        .stock
        .update_movement(sale.id, movement(shop.id, StockTransactionType::Sale, dec!(4)))
        .await
        .unwrap();
    assert_eq!(h.quantity(shop.id).await, dec!(96));
}

#[rstest]
#[case::sale_shrinks(StockTransactionType::Sale, dec!(10), StockTransactionType::Sale, dec!(4), dec!(96))]
#[case::sale_grows(StockTransactionType::Sale, dec!(10), StockTransactionType::Sale, dec!(15), dec!(85))]
#[case::add_shrinks(StockTransactionType::AddStock, dec!(50), StockTransactionType::AddStock, dec!(20), dec!(120))]
#[case::dump_to_sale(StockTransactionType::Dump, dec!(5), StockTransactionType::Sale, dec!(5), dec!(95))]
#[case::sale_to_dump(StockTransactionType::Sale, dec!(8), StockTransactionType::Dump, dec!(2), dec!(102))]
#[tokio::test]
async fn test_edit_matches_fresh_application(
    #[case] old_kind: StockTransactionType,
    #[case] old_quantity: Decimal,
    #[case] new_kind: StockTransactionType,
    #[case] new_quantity: Decimal,
    #[case] expected: Decimal,
) {
    let h = Harness::new();
    let shop = h.shop("Main Road", dec!(100), dec!(10)).await;
    let recorded = h
        .repos
        .stock
        .record_movement(movement(shop.id, old_kind, old_quantity))
        .await
        .unwrap();

    h.repos
        .stock
        .update_movement(recorded.id, movement(shop.id, new_kind, new_quantity))
        .await
        .unwrap();

    assert_eq!(h.quantity(shop.id).await, expected);
}

#[tokio::test]
async fn test_add_and_dump_increase_quantity() {
    let h = Harness::new();
    let shop = h.shop("Main Road", dec!(0), dec!(10)).await;

    h.repos
        .stock
        .record_movement(movement(shop.id, StockTransactionType::AddStock, dec!(40)))
        .await
        .unwrap();
    h.repos
        .stock
        .record_movement(movement(shop.id, StockTransactionType::Dump, dec!(5)))
        .await
        .unwrap();

    assert_eq!(h.quantity(shop.id).await, dec!(45));
}

#[tokio::test]
async fn test_type_change_across_sets_reverts_then_applies() {
    let h = Harness::new();
    let shop = h.shop("Main Road", dec!(100), dec!(10)).await;
    let sale = h
        .repos
        .stock
        .record_movement(movement(shop.id, StockTransactionType::Sale, dec!(10)))
        .await
        .unwrap();

    let updated = h
        .repos
        .stock
        .update_movement(sale.id, movement(shop.id, StockTransactionType::AddStock, dec!(25)))
        .await
        .unwrap();

    assert_eq!(updated.len(), 1);
    assert_eq!(updated[0].kind, StockTransactionType::AddStock);
    assert_eq!(h.quantity(shop.id).await, dec!(125));
}

#[tokio::test]
async fn test_shop_change_reverts_old_shop_and_applies_new() {
    let h = Harness::new();
    let main = h.shop("Main Road", dec!(100), dec!(10)).await;
    let depot = h.shop("Depot", dec!(50), dec!(10)).await;
    let sale = h
        .repos
        .stock
        .record_movement(movement(main.id, StockTransactionType::Sale, dec!(10)))
        .await
        .unwrap();

    h.repos
        .stock
        .update_movement(sale.id, movement(depot.id, StockTransactionType::Sale, dec!(10)))
        .await
        .unwrap();

    assert_eq!(h.quantity(main.id).await, dec!(100));
    assert_eq!(h.quantity(depot.id).await, dec!(40));
}

#[tokio::test]
async fn test_delete_movement_reverses_delta() {
    let h = Harness::new();
    let shop = h.shop("Main Road", dec!(100), dec!(10)).await;
    let sale = h
        .repos
        .stock
        .record_movement(movement(shop.id, StockTransactionType::Sale, dec!(30)))
        .await
        .unwrap();

    let removed = h.repos.stock.delete_movement(sale.id).await.unwrap();

    assert_eq!(removed, 1);
    assert_eq!(h.quantity(shop.id).await, dec!(100));
    assert_eq!(h.count(Collection::StockTransactions).await, 0);
}

#[tokio::test]
async fn test_movement_on_missing_shop_is_stale() {
    let h = Harness::new();
    let err = h
        .repos
        .stock
        .record_movement(movement(ShopId::new(), StockTransactionType::Sale, dec!(1)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RepositoryError::StaleReference { collection: Collection::Stocks, .. }
    ));
    assert_eq!(h.count(Collection::StockTransactions).await, 0);
}

#[tokio::test]
async fn test_zero_quantity_is_rejected() {
    let h = Harness::new();
    let shop = h.shop("Main Road", dec!(100), dec!(10)).await;
    let err = h
        .repos
        .stock
        .record_movement(movement(shop.id, StockTransactionType::Sale, dec!(0)))
        .await
        .unwrap_err();

    assert_eq!(err.error_code(), "NON_POSITIVE_QUANTITY");
    assert_eq!(h.quantity(shop.id).await, dec!(100));
}

// ========== Status ==========

#[tokio::test]
async fn test_status_follows_quantity_and_threshold() {
    let h = Harness::new();
    let shop = h.shop("Main Road", dec!(20), dec!(10)).await;
    assert_eq!(shop.status(), StockStatus::Normal);

    h.repos
        .stock
        .record_movement(movement(shop.id, StockTransactionType::Sale, dec!(10)))
        .await
        .unwrap();
    let shop = h.repos.stock.get_shop(shop.id).await.unwrap().unwrap();
    assert_eq!(shop.status(), StockStatus::LowStock);

    let shop = h
        .repos
        .stock
        .update_shop(
            shop.id,
            UpdateShopInput {
                threshold: Some(dec!(5)),
                ..UpdateShopInput::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(shop.quantity, dec!(10));
    assert_eq!(shop.status(), StockStatus::Normal);
}

// ========== Transfers ==========

#[tokio::test]
async fn test_transfer_moves_quantity_symmetrically() {
    let h = Harness::new();
    let main = h.shop("Main Road", dec!(100), dec!(10)).await;
    let depot = h.shop("Depot", dec!(20), dec!(10)).await;

    let legs = h
        .repos
        .stock
        .transfer_stock(transfer(main.id, depot.id, dec!(30)))
        .await
        .unwrap();

    assert_eq!(h.quantity(main.id).await, dec!(70));
    assert_eq!(h.quantity(depot.id).await, dec!(50));
    assert_eq!(legs.outbound.kind, StockTransactionType::TransferOut);
    assert_eq!(legs.inbound.kind, StockTransactionType::TransferIn);
    assert_eq!(legs.outbound.transfer_id, Some(legs.transfer_id));
    assert_eq!(legs.inbound.transfer_id, Some(legs.transfer_id));
    assert_eq!(legs.outbound.note.as_deref(), Some("Transfer to Depot"));
    assert_eq!(legs.inbound.note.as_deref(), Some("Transfer from Main Road"));
    assert_eq!(h.count(Collection::StockTransactions).await, 2);
}

#[tokio::test]
async fn test_transfer_to_same_shop_is_rejected() {
    let h = Harness::new();
    let main = h.shop("Main Road", dec!(100), dec!(10)).await;

    let err = h
        .repos
        .stock
        .transfer_stock(transfer(main.id, main.id, dec!(5)))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        RepositoryError::Ledger(LedgerError::SameShopTransfer(id)) if id == main.id
    ));
    assert_eq!(h.quantity(main.id).await, dec!(100));
    assert_eq!(h.count(Collection::StockTransactions).await, 0);
}

#[tokio::test]
async fn test_transfer_quantity_edit_updates_both_legs() {
    let h = Harness::new();
    let main = h.shop("Main Road", dec!(100), dec!(10)).await;
    let depot = h.shop("Depot", dec!(20), dec!(10)).await;
    let legs = h
        .repos
        .stock
        .transfer_stock(transfer(main.id, depot.id, dec!(30)))
        .await
        .unwrap();

    let updated = h
        .repos
        .stock
        .update_movement(
            legs.inbound.id,
            movement(depot.id, StockTransactionType::TransferIn, dec!(12)),
        )
        .await
        .unwrap();

    assert_eq!(updated.len(), 2);
    assert!(updated.iter().all(|leg| leg.quantity == dec!(12)));
    assert_eq!(h.quantity(main.id).await, dec!(88));
    assert_eq!(h.quantity(depot.id).await, dec!(32));
}

#[tokio::test]
async fn test_transfer_leg_kind_or_shop_cannot_change() {
    let h = Harness::new();
    let main = h.shop("Main Road", dec!(100), dec!(10)).await;
    let depot = h.shop("Depot", dec!(20), dec!(10)).await;
    let legs = h
        .repos
        .stock
        .transfer_stock(transfer(main.id, depot.id, dec!(30)))
        .await
        .unwrap();

    let kind_change = h
        .repos
        .stock
        .update_movement(
            legs.outbound.id,
            movement(main.id, StockTransactionType::Sale, dec!(30)),
        )
        .await
        .unwrap_err();
    assert_eq!(kind_change.error_code(), "TRANSFER_LEG_EDIT");

    let shop_change = h
        .repos
        .stock
        .update_movement(
            legs.outbound.id,
            movement(depot.id, StockTransactionType::TransferOut, dec!(30)),
        )
        .await
        .unwrap_err();
    assert_eq!(shop_change.error_code(), "TRANSFER_LEG_EDIT");

    assert_eq!(h.quantity(main.id).await, dec!(70));
    assert_eq!(h.quantity(depot.id).await, dec!(50));
}

#[tokio::test]
async fn test_deleting_one_leg_removes_the_transfer() {
    let h = Harness::new();
    let main = h.shop("Main Road", dec!(100), dec!(10)).await;
    let depot = h.shop("Depot", dec!(20), dec!(10)).await;
    let legs = h
        .repos
        .stock
        .transfer_stock(transfer(main.id, depot.id, dec!(30)))
        .await
        .unwrap();

    let removed = h.repos.stock.delete_movement(legs.outbound.id).await.unwrap();

    assert_eq!(removed, 2);
    assert_eq!(h.quantity(main.id).await, dec!(100));
    assert_eq!(h.quantity(depot.id).await, dec!(20));
    assert!(h.repos.stock.list_movements(None).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_list_movements_filters_by_shop() {
    let h = Harness::new();
    let main = h.shop("Main Road", dec!(100), dec!(10)).await;
    let depot = h.shop("Depot", dec!(20), dec!(10)).await;
    h.repos
        .stock
        .record_movement(movement(main.id, StockTransactionType::Sale, dec!(5)))
        .await
        .unwrap();
    h.repos
        .stock
        .transfer_stock(transfer(main.id, depot.id, dec!(10)))
        .await
        .unwrap();

    assert_eq!(h.repos.stock.list_movements(Some(main.id)).await.unwrap().len(), 2);
    assert_eq!(h.repos.stock.list_movements(Some(depot.id)).await.unwrap().len(), 1);
}
