//! Embedded schema migrations.

pub use migrations::Migrator;
pub use sea_orm_migration::MigratorTrait;
