pub use sea_orm_migration::prelude::*;

mod m20250101_000001_create_users_table;
mod m20250101_000002_create_companies_table;
mod m20250101_000003_create_materials_tables;
mod m20250101_000004_create_purchases_tables;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250101_000001_create_users_table::Migration),
            Box::new(m20250101_000002_create_companies_table::Migration),
            Box::new(m20250101_000003_create_materials_tables::Migration),
            Box::new(m20250101_000004_create_purchases_tables::Migration),
        ]
    }
}
