pub mod auth;
pub mod common;
pub mod companies;
pub mod materials;
pub mod purchases;

pub use crate::AppState;

use crate::{
    db::DbPool,
    services::{
        companies::CompanyService, directory::DirectoryService, materials::MaterialService,
        purchase_aggregator::PurchaseAggregator, purchases::PurchaseService,
        stock_ledger::StockLedger, users::UserService,
    },
};
use std::sync::Arc;

/// Service container shared by all handlers.
#[derive(Clone)]
pub struct AppServices {
    pub users: Arc<UserService>,
    pub companies: Arc<CompanyService>,
    pub materials: Arc<MaterialService>,
    pub stock_ledger: Arc<StockLedger>,
    pub purchases: Arc<PurchaseService>,
    pub purchase_items: Arc<PurchaseAggregator>,
    pub directory: Arc<DirectoryService>,
}

impl AppServices {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self {
            users: Arc::new(UserService::new(db_pool.clone())),
            companies: Arc::new(CompanyService::new(db_pool.clone())),
            materials: Arc::new(MaterialService::new(db_pool.clone())),
            stock_ledger: Arc::new(StockLedger::new(db_pool.clone())),
            purchases: Arc::new(PurchaseService::new(db_pool.clone())),
            purchase_items: Arc::new(PurchaseAggregator::new(db_pool.clone())),
            directory: Arc::new(DirectoryService::new(db_pool)),
        }
    }
}
