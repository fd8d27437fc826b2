use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_users_table::Users;
use crate::m20250101_000002_create_companies_table::Companies;
use crate::m20250101_000003_create_materials_tables::Materials;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Purchases::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Purchases::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Purchases::CompanyId).integer().not_null())
                    .col(
                        ColumnDef::new(Purchases::InvoiceNumber)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Purchases::SupplierName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Purchases::SupplierContact)
                            .string_len(255)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Purchases::PurchaseDate)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Purchases::Status)
                            .string_len(50)
                            .not_null()
                            .default("pending"),
                    )
                    .col(
                        ColumnDef::new(Purchases::TotalAmount)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Purchases::Notes).text().null())
                    .col(ColumnDef::new(Purchases::UserId).integer().null())
                    .col(
                        ColumnDef::new(Purchases::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Purchases::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchases_company_id")
                            .from(Purchases::Table, Purchases::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchases_user_id")
                            .from(Purchases::Table, Purchases::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        for (name, column) in [
            ("idx_purchases_company_id", Purchases::CompanyId),
            ("idx_purchases_invoice_number", Purchases::InvoiceNumber),
            ("idx_purchases_supplier_name", Purchases::SupplierName),
            ("idx_purchases_purchase_date", Purchases::PurchaseDate),
        ] {
            manager
                .create_index(
                    Index::create()
                        .name(name)
                        .table(Purchases::Table)
                        .col(column)
                        .if_not_exists()
                        .to_owned(),
                )
                .await?;
        }

        manager
            .create_table(
                Table::create()
                    .table(PurchaseItems::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(PurchaseItems::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::PurchaseId)
                            .integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(PurchaseItems::MaterialId).integer().null())
                    .col(
                        ColumnDef::new(PurchaseItems::ItemName)
                            .string_len(255)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::Quantity)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::UnitPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::TotalPrice)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(PurchaseItems::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_items_purchase_id")
                            .from(PurchaseItems::Table, PurchaseItems::PurchaseId)
                            .to(Purchases::Table, Purchases::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_purchase_items_material_id")
                            .from(PurchaseItems::Table, PurchaseItems::MaterialId)
                            .to(Materials::Table, Materials::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_items_purchase_id")
                    .table(PurchaseItems::Table)
                    .col(PurchaseItems::PurchaseId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_purchase_items_material_id")
                    .table(PurchaseItems::Table)
                    .col(PurchaseItems::MaterialId)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(PurchaseItems::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Purchases::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden, Clone, Copy)]
enum Purchases {
    Table,
    Id,
    CompanyId,
    InvoiceNumber,
    SupplierName,
    SupplierContact,
    PurchaseDate,
    Status,
    TotalAmount,
    Notes,
    UserId,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum PurchaseItems {
    Table,
    Id,
    PurchaseId,
    MaterialId,
    ItemName,
    Quantity,
    UnitPrice,
    TotalPrice,
    CreatedAt,
}
