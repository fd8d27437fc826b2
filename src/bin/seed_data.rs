//! Seed data script - populates the database with demo data
//!
//! Run with: cargo run --bin seed-data
//!
//! This creates:
//! - the demo user `demo@coapp.local` / `demo123`
//! - two companies with materials (opening stock recorded as movements)
//! - two purchases whose totals are built up item by item

use anyhow::Context;
use chrono::{Duration, Utc};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::sync::Arc;
use tracing::info;

use coapp_api::{
    config, db,
    entities::{purchase::PurchaseStatus, user},
    errors::ServiceError,
    services::{
        companies::{CompanyService, NewCompany},
        materials::{MaterialService, NewMaterial},
        purchase_aggregator::{NewPurchaseItem, PurchaseAggregator},
        purchases::{NewPurchase, PurchaseService},
        users::{NewUser, UserService, EMAIL_TAKEN},
    },
};

const DEMO_EMAIL: &str = "demo@coapp.local";
const DEMO_PASSWORD: &str = "demo123";

struct MaterialSeed {
    name: &'static str,
    sku: &'static str,
    barcode: &'static str,
    description: &'static str,
    unit: &'static str,
    current_stock: Decimal,
    min_stock: Decimal,
    unit_price: Decimal,
}

fn acme_materials() -> Vec<MaterialSeed> {
    vec![
        MaterialSeed {
            name: "Arduino Uno R3",
            sku: "ARD-UNO-R3",
            barcode: "8058333490090",
            description: "Microcontroller board based on ATmega328P",
            unit: "pcs",
            current_stock: dec!(150),
            min_stock: dec!(50),
            unit_price: dec!(25.99),
        },
        MaterialSeed {
            name: "Raspberry Pi 4 Model B (4GB)",
            sku: "RPI4-4GB",
            barcode: "0765756931199",
            description: "Single-board computer with 4GB RAM",
            unit: "pcs",
            current_stock: dec!(75),
            min_stock: dec!(30),
            unit_price: dec!(55.00),
        },
        MaterialSeed {
            name: "Resistor Kit (1000pcs)",
            sku: "RES-KIT-1000",
            barcode: "4897098680063",
            description: "Assorted resistor values kit",
            unit: "kit",
            current_stock: dec!(25),
            min_stock: dec!(40),
            unit_price: dec!(12.50),
        },
        MaterialSeed {
            name: "USB-C Cable (1m)",
            sku: "CABLE-USBC-1M",
            barcode: "5060444580543",
            description: "USB Type-C charging cable, 1 meter",
            unit: "pcs",
            current_stock: dec!(200),
            min_stock: dec!(100),
            unit_price: dec!(8.99),
        },
        MaterialSeed {
            name: "LED Strip 5050 (5m)",
            sku: "LED-5050-5M",
            barcode: "6970622931294",
            description: "RGB LED strip, 5 meters, waterproof",
            unit: "roll",
            current_stock: dec!(45),
            min_stock: dec!(20),
            unit_price: dec!(18.75),
        },
    ]
}

fn global_materials() -> Vec<MaterialSeed> {
    vec![
        MaterialSeed {
            name: "Breadboard 830 points",
            sku: "BB-830",
            barcode: "4260407270111",
            description: "Solderless prototyping breadboard",
            unit: "pcs",
            current_stock: dec!(60),
            min_stock: dec!(25),
            unit_price: dec!(4.20),
        },
        MaterialSeed {
            name: "Electrolytic Capacitor Assortment",
            sku: "CAP-ASSORT-500",
            barcode: "4260407270128",
            description: "500 pieces, 24 values",
            unit: "kit",
            current_stock: dec!(8),
            min_stock: dec!(10),
            unit_price: dec!(14.90),
        },
    ]
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load_config().context("failed to load configuration")?;
    config::init_tracing(cfg.log_level(), cfg.log_json);

    info!("=== CoApp seed data ===");

    let pool = db::establish_connection_from_app_config(&cfg)
        .await
        .context("failed to connect to database")?;
    db::run_migrations(&pool).await?;
    let pool = Arc::new(pool);

    let users = UserService::new(pool.clone());
    let demo = match users
        .register(NewUser {
            email: DEMO_EMAIL.to_string(),
            full_name: "Demo User".to_string(),
            password: DEMO_PASSWORD.to_string(),
        })
        .await
    {
        Ok(user) => user,
        Err(ServiceError::Conflict(msg)) if msg == EMAIL_TAKEN => {
            info!(
                "Demo data already exists. Log in with {} / {}",
                DEMO_EMAIL, DEMO_PASSWORD
            );
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    info!(user_id = demo.id, "Created demo user {}", demo.email);

    seed_companies(pool, &demo).await?;

    info!(
        "Seeding completed. Log in with {} / {}",
        DEMO_EMAIL, DEMO_PASSWORD
    );
    Ok(())
}

async fn seed_companies(pool: Arc<db::DbPool>, demo: &user::Model) -> anyhow::Result<()> {
    let companies = CompanyService::new(pool.clone());
    let materials = MaterialService::new(pool.clone());
    let purchases = PurchaseService::new(pool.clone());
    let items = PurchaseAggregator::new(pool);

    let acme = companies
        .create(
            NewCompany {
                name: "Acme Electronics Ltd.".to_string(),
                address: Some("123 Tech Street, Silicon Valley, CA 94000".to_string()),
                phone: Some("+1-555-0100".to_string()),
                email: Some("info@acme-electronics.com".to_string()),
                tax_id: Some("EIN-12-3456789".to_string()),
            },
            demo.id,
        )
        .await?;
    let global = companies
        .create(
            NewCompany {
                name: "Global Components Inc.".to_string(),
                address: Some("456 Innovation Drive, Boston, MA 02101".to_string()),
                phone: Some("+1-555-0200".to_string()),
                email: Some("contact@globalcomponents.com".to_string()),
                tax_id: Some("EIN-98-7654321".to_string()),
            },
            demo.id,
        )
        .await?;
    info!("Created companies {} and {}", acme.name, global.name);

    let mut acme_ids = Vec::new();
    for (company_id, seeds) in [(acme.id, acme_materials()), (global.id, global_materials())] {
        for seed in seeds {
            let material = materials
                .create(
                    NewMaterial {
                        company_id,
                        name: seed.name.to_string(),
                        sku: seed.sku.to_string(),
                        barcode: Some(seed.barcode.to_string()),
                        description: Some(seed.description.to_string()),
                        unit: Some(seed.unit.to_string()),
                        current_stock: seed.current_stock,
                        min_stock: seed.min_stock,
                        unit_price: Some(seed.unit_price),
                    },
                    demo.id,
                )
                .await?;
            info!(
                "Created material {} (stock {})",
                material.name, material.current_stock
            );
            if company_id == acme.id {
                acme_ids.push(material.id);
            }
        }
    }

    let replenishment = purchases
        .create(
            NewPurchase {
                company_id: acme.id,
                invoice_number: "INV-2025-001".to_string(),
                supplier_name: "Tech Distributors LLC".to_string(),
                supplier_contact: Some("sales@techdist.com | +1-555-0300".to_string()),
                purchase_date: Utc::now() - Duration::days(7),
                status: PurchaseStatus::Completed,
                notes: Some("Regular monthly stock replenishment".to_string()),
            },
            demo.id,
        )
        .await?;
    let replenishment_items = [
        ("Arduino Uno R3", dec!(50), dec!(23.50), acme_ids.first().copied()),
        ("Raspberry Pi 4 Model B (4GB)", dec!(25), dec!(52.00), acme_ids.get(1).copied()),
    ];

    let urgent = purchases
        .create(
            NewPurchase {
                company_id: acme.id,
                invoice_number: "INV-2025-002".to_string(),
                supplier_name: "Component Wholesale Co.".to_string(),
                supplier_contact: Some("orders@compwholesale.com | +1-555-0400".to_string()),
                purchase_date: Utc::now() - Duration::days(2),
                status: PurchaseStatus::Pending,
                notes: Some("Urgent order for new project".to_string()),
            },
            demo.id,
        )
        .await?;
    let urgent_items = [
        ("USB-C Cable (1m)", dec!(100), dec!(7.99), acme_ids.get(3).copied()),
        ("LED Strip 5050 (5m)", dec!(30), dec!(17.50), acme_ids.get(4).copied()),
        ("Power Supply 12V 5A", dec!(20), dec!(15.00), None),
    ];

    for (purchase_id, lines) in [
        (replenishment.id, replenishment_items.to_vec()),
        (urgent.id, urgent_items.to_vec()),
    ] {
        for (name, quantity, unit_price, material_id) in lines {
            items
                .add_item(
                    purchase_id,
                    demo.id,
                    NewPurchaseItem {
                        item_name: name.to_string(),
                        quantity,
                        unit_price,
                        material_id,
                    },
                )
                .await?;
        }
        let total = purchases.get(purchase_id, demo.id).await?.total_amount;
        info!(purchase_id, total = %total, "Created purchase");
    }

    Ok(())
}
