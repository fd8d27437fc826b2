mod common;

use std::sync::Arc;

use coapp_api::{
    db::{self, DbConfig},
    errors::ServiceError,
    handlers::AppServices,
    services::{
        companies::NewCompany,
        materials::{NewMaterial, SKU_TAKEN},
        purchase_aggregator::{NewPurchaseItem, PurchaseAggregator, PurchaseItemChanges},
        purchases::NewPurchase,
        stock_ledger::{StockAdjustment, StockLedger},
        users::NewUser,
    },
};
use common::TestApp;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

async fn seeded_material(services: &AppServices, stock: Decimal) -> (i32, i32) {
    let user = services
        .users
        .register(NewUser {
            email: "race@example.com".into(),
            full_name: "Race".into(),
            password: common::TEST_PASSWORD.into(),
        })
        .await
        .expect("register");
    let company = services
        .companies
        .create(NewCompany::named("Race Co."), user.id)
        .await
        .expect("company");
    let mut input = NewMaterial::new(company.id, "Contended", "RACE-1");
    input.current_stock = stock;
    let material = services
        .materials
        .create(input, user.id)
        .await
        .expect("material");
    (user.id, material.id)
}

/// Fires `n` concurrent single-unit decrements and returns how many committed.
async fn drain(ledger: Arc<StockLedger>, material_id: i32, user_id: i32, n: usize) -> usize {
    let mut tasks = Vec::with_capacity(n);
    for _ in 0..n {
        let ledger = ledger.clone();
        tasks.push(tokio::spawn(async move {
            ledger
                .adjust_stock(material_id, user_id, StockAdjustment::new(dec!(-1), "sale"))
                .await
                .is_ok()
        }));
    }

    let mut success = 0;
    for task in tasks {
        if task.await.unwrap_or(false) {
            success += 1;
        }
    }
    success
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_decrements_stop_at_zero() {
    let app = TestApp::new().await;
    let services = &app.state.services;
    let (user_id, material_id) = seeded_material(services, dec!(10)).await;

    let success = drain(services.stock_ledger.clone(), material_id, user_id, 20).await;
    assert_eq!(
        success, 10,
        "exactly 10 decrements should succeed; got {}",
        success
    );

    let material = services.materials.get(material_id, user_id).await.unwrap();
    assert_eq!(material.current_stock, Decimal::ZERO);
    let total = StockLedger::movement_total(app.db().as_ref(), material_id)
        .await
        .unwrap();
    assert_eq!(total, Decimal::ZERO);
}

async fn file_pool(dir: &tempfile::TempDir) -> Arc<db::DbPool> {
    let path = dir.path().join("race.db");
    let pool = db::establish_connection_with_config(&DbConfig {
        url: format!("sqlite://{}?mode=rwc", path.display()),
        max_connections: 10,
        min_connections: 1,
        ..Default::default()
    })
    .await
    .expect("connect");
    db::run_migrations(&pool).await.expect("migrate");
    Arc::new(pool)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_database_commits_every_covered_decrement() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = file_pool(&dir).await;
    let services = AppServices::new(pool.clone());
    let (user_id, material_id) = seeded_material(&services, dec!(1000)).await;

    let success = drain(services.stock_ledger.clone(), material_id, user_id, 20).await;
    assert_eq!(success, 20, "every decrement is covered by stock");

    let material = services.materials.get(material_id, user_id).await.unwrap();
    assert_eq!(material.current_stock, dec!(980));
    let total = StockLedger::movement_total(pool.as_ref(), material_id)
        .await
        .unwrap();
    assert_eq!(total, material.current_stock);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn file_database_stops_decrements_at_zero() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = file_pool(&dir).await;
    let services = AppServices::new(pool.clone());
    let (user_id, material_id) = seeded_material(&services, dec!(10)).await;

    let success = drain(services.stock_ledger.clone(), material_id, user_id, 20).await;
    assert_eq!(success, 10);

    let material = services.materials.get(material_id, user_id).await.unwrap();
    assert_eq!(material.current_stock, Decimal::ZERO);
    let total = StockLedger::movement_total(pool.as_ref(), material_id)
        .await
        .unwrap();
    assert_eq!(total, Decimal::ZERO);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_item_changes_keep_the_purchase_total() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = file_pool(&dir).await;
    let services = AppServices::new(pool.clone());
    let (user_id, material_id) = seeded_material(&services, Decimal::ZERO).await;
    let company_id = services
        .materials
        .get(material_id, user_id)
        .await
        .unwrap()
        .company_id;
    let purchase = services
        .purchases
        .create(
            NewPurchase {
                company_id,
                invoice_number: "INV-RACE".into(),
                supplier_name: "Race Supplier".into(),
                supplier_contact: None,
                purchase_date: chrono::Utc::now(),
                status: Default::default(),
                notes: None,
            },
            user_id,
        )
        .await
        .expect("purchase");
    let purchase_id = purchase.id;

    let mut adds = Vec::new();
    for n in 1..=20i64 {
        let items = services.purchase_items.clone();
        adds.push(tokio::spawn(async move {
            items
                .add_item(
                    purchase_id,
                    user_id,
                    NewPurchaseItem {
                        item_name: format!("Line {n}"),
                        quantity: Decimal::from(n),
                        unit_price: dec!(1.25),
                        material_id: Some(material_id),
                    },
                )
                .await
        }));
    }
    let mut item_ids = Vec::new();
    for task in adds {
        item_ids.push(task.await.unwrap().expect("add_item").id);
    }
    assert_eq!(item_ids.len(), 20);

    let mut updates = Vec::new();
    for item_id in item_ids {
        let items = services.purchase_items.clone();
        updates.push(tokio::spawn(async move {
            items
                .update_item(
                    purchase_id,
                    item_id,
                    user_id,
                    PurchaseItemChanges {
                        unit_price: Some(dec!(2)),
                        ..Default::default()
                    },
                )
                .await
                .is_ok()
        }));
    }
    let mut updated = 0;
    for task in updates {
        if task.await.unwrap_or(false) {
            updated += 1;
        }
    }
    assert_eq!(updated, 20);

    // 2 * (1 + 2 + ... + 20)
    let total = services
        .purchases
        .get(purchase_id, user_id)
        .await
        .unwrap()
        .total_amount;
    assert_eq!(total, dec!(420));
    let sum = PurchaseAggregator::item_total(pool.as_ref(), purchase_id)
        .await
        .unwrap();
    assert_eq!(total, sum);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_duplicate_skus_report_a_conflict() {
    let dir = tempfile::tempdir().expect("tempdir");
    let pool = file_pool(&dir).await;
    let services = AppServices::new(pool.clone());
    let (user_id, material_id) = seeded_material(&services, Decimal::ZERO).await;
    let company_id = services
        .materials
        .get(material_id, user_id)
        .await
        .unwrap()
        .company_id;

    let mut tasks = Vec::new();
    for _ in 0..8 {
        let materials = services.materials.clone();
        tasks.push(tokio::spawn(async move {
            materials
                .create(NewMaterial::new(company_id, "Twin", "TWIN-1"), user_id)
                .await
        }));
    }

    let mut created = 0;
    for task in tasks {
        match task.await.unwrap() {
            Ok(_) => created += 1,
            Err(ServiceError::Conflict(msg)) => assert_eq!(msg, SKU_TAKEN),
            Err(other) => panic!("unexpected error {other}"),
        }
    }
    assert_eq!(created, 1);
}
