//! Property-based tests for the stock ledger and purchase aggregate.
//!
//! Random operation sequences run against a fresh in-memory database; after
//! every step the running figure must equal the sum of the rows behind it.

mod common;

use coapp_api::{
    errors::ServiceError,
    services::{
        amounts,
        companies::NewCompany,
        materials::NewMaterial,
        purchase_aggregator::{NewPurchaseItem, PurchaseAggregator, PurchaseItemChanges},
        purchases::NewPurchase,
        stock_ledger::{apply_delta, StockAdjustment, StockLedger},
    },
};
use common::TestApp;
use proptest::prelude::*;
use rust_decimal::Decimal;

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .expect("tokio runtime")
}

fn cents() -> impl Strategy<Value = Decimal> {
    (1i64..10_000).prop_map(|c| Decimal::new(c, 2))
}

fn signed_delta() -> impl Strategy<Value = Decimal> {
    prop_oneof![(-5_000i64..-1), (1i64..5_000)].prop_map(|c| Decimal::new(c, 2))
}

#[derive(Debug, Clone)]
enum ItemOp {
    Add { quantity: Decimal, unit_price: Decimal },
    Update { index: usize, quantity: Decimal },
    Reprice { index: usize, unit_price: Decimal },
    Delete { index: usize },
}

fn item_op() -> impl Strategy<Value = ItemOp> {
    prop_oneof![
        3 => (cents(), cents()).prop_map(|(quantity, unit_price)| ItemOp::Add { quantity, unit_price }),
        2 => (any::<usize>(), cents()).prop_map(|(index, quantity)| ItemOp::Update { index, quantity }),
        1 => (any::<usize>(), cents()).prop_map(|(index, unit_price)| ItemOp::Reprice { index, unit_price }),
        1 => any::<usize>().prop_map(|index| ItemOp::Delete { index }),
    ]
}

proptest! {
    #[test]
    fn apply_delta_never_goes_negative(current in 0i64..1_000_000, delta in -1_000_000i64..1_000_000) {
        let current = Decimal::new(current, 2);
        let delta = Decimal::new(delta, 2);
        match apply_delta(current, delta) {
            Ok(next) => {
                prop_assert!(next >= Decimal::ZERO);
                prop_assert_eq!(next, current + delta);
            }
            Err(ServiceError::InsufficientStock { current: c, requested }) => {
                prop_assert!(current + delta < Decimal::ZERO);
                prop_assert_eq!(c, current);
                prop_assert_eq!(requested, delta.abs());
            }
            Err(other) => prop_assert!(false, "unexpected error {other}"),
        }
    }

    #[test]
    fn line_total_fits_the_column_scale(quantity in cents(), unit_price in cents()) {
        let total = amounts::line_total(quantity, unit_price).unwrap();
        prop_assert!(total.scale() <= amounts::SCALE);
        prop_assert!((total - quantity * unit_price).abs() <= Decimal::new(5, 3));
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn adjustments_keep_stock_equal_to_movements(
        opening in 0i64..10_000,
        deltas in prop::collection::vec(signed_delta(), 1..20),
    ) {
        runtime().block_on(async {
            let app = TestApp::new().await;
            let services = &app.state.services;
            let user_id = app.user("prop@example.com").await;
            let company = services
                .companies
                .create(NewCompany::named("Prop Co."), user_id)
                .await
                .unwrap();
            let mut input = NewMaterial::new(company.id, "Prop", "PROP-1");
            input.current_stock = Decimal::new(opening, 2);
            let material = services.materials.create(input, user_id).await.unwrap();

            let mut expected = material.current_stock;
            for delta in deltas {
                let outcome = services
                    .stock_ledger
                    .adjust_stock(material.id, user_id, StockAdjustment::new(delta, "prop"))
                    .await;
                match outcome {
                    Ok(updated) => {
                        expected += delta;
                        assert_eq!(updated.current_stock, expected);
                    }
                    Err(ServiceError::InsufficientStock { .. }) => {
                        assert!(expected + delta < Decimal::ZERO);
                    }
                    Err(other) => panic!("unexpected error {other}"),
                }

                let stock = services.materials.get(material.id, user_id).await.unwrap().current_stock;
                let ledger = StockLedger::movement_total(app.db().as_ref(), material.id).await.unwrap();
                assert!(stock >= Decimal::ZERO);
                assert_eq!(stock, expected);
                assert_eq!(stock, ledger);
            }
        });
    }

    #[test]
    fn item_operations_keep_total_equal_to_item_sum(
        ops in prop::collection::vec(item_op(), 1..16),
    ) {
        runtime().block_on(async {
            let app = TestApp::new().await;
            let services = &app.state.services;
            let user_id = app.user("prop@example.com").await;
            let company = services
                .companies
                .create(NewCompany::named("Prop Co."), user_id)
                .await
                .unwrap();
            let purchase = services
                .purchases
                .create(
                    NewPurchase {
                        company_id: company.id,
                        invoice_number: "INV-PROP".into(),
                        supplier_name: "Prop Supplier".into(),
                        supplier_contact: None,
                        purchase_date: chrono::Utc::now(),
                        status: Default::default(),
                        notes: None,
                    },
                    user_id,
                )
                .await
                .unwrap();

            let items = &services.purchase_items;
            let mut live: Vec<i32> = Vec::new();
            for op in ops {
                match op {
                    ItemOp::Add { quantity, unit_price } => {
                        let item = items
                            .add_item(
                                purchase.id,
                                user_id,
                                NewPurchaseItem {
                                    item_name: "Prop line".into(),
                                    quantity,
                                    unit_price,
                                    material_id: None,
                                },
                            )
                            .await
                            .unwrap();
                        live.push(item.id);
                    }
                    ItemOp::Update { index, quantity } if !live.is_empty() => {
                        let item_id = live[index % live.len()];
                        items
                            .update_item(
                                purchase.id,
                                item_id,
                                user_id,
                                PurchaseItemChanges {
                                    quantity: Some(quantity),
                                    ..Default::default()
                                },
                            )
                            .await
                            .unwrap();
                    }
                    ItemOp::Reprice { index, unit_price } if !live.is_empty() => {
                        let item_id = live[index % live.len()];
                        items
                            .update_item(
                                purchase.id,
                                item_id,
                                user_id,
                                PurchaseItemChanges {
                                    unit_price: Some(unit_price),
                                    ..Default::default()
                                },
                            )
                            .await
                            .unwrap();
                    }
                    ItemOp::Delete { index } if !live.is_empty() => {
                        let item_id = live.remove(index % live.len());
                        items.delete_item(purchase.id, item_id, user_id).await.unwrap();
                    }
                    _ => continue,
                }

                let total = services.purchases.get(purchase.id, user_id).await.unwrap().total_amount;
                let sum = PurchaseAggregator::item_total(app.db().as_ref(), purchase.id)
                    .await
                    .unwrap();
                assert_eq!(total, sum);
                assert!(total >= Decimal::ZERO);
            }
        });
    }
}
