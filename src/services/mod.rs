// Consistency core
pub mod amounts;
pub mod ownership;
pub mod purchase_aggregator;
pub mod stock_ledger;

// Resource services
pub mod companies;
pub mod directory;
pub mod materials;
pub mod purchases;
pub mod users;
