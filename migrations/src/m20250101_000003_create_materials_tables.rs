use sea_orm_migration::prelude::*;

use crate::m20250101_000001_create_users_table::Users;
use crate::m20250101_000002_create_companies_table::Companies;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Materials::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Materials::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Materials::CompanyId).integer().not_null())
                    .col(ColumnDef::new(Materials::Name).string_len(255).not_null())
                    .col(ColumnDef::new(Materials::Sku).string_len(100).not_null())
                    .col(ColumnDef::new(Materials::Barcode).string_len(100).null())
                    .col(ColumnDef::new(Materials::Description).text().null())
                    .col(
                        ColumnDef::new(Materials::Unit)
                            .string_len(50)
                            .not_null()
                            .default("pcs"),
                    )
                    .col(
                        ColumnDef::new(Materials::CurrentStock)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Materials::MinStock)
                            .decimal_len(12, 2)
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(Materials::UnitPrice).decimal_len(12, 2).null())
                    .col(
                        ColumnDef::new(Materials::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Materials::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_materials_company_id")
                            .from(Materials::Table, Materials::CompanyId)
                            .to(Companies::Table, Companies::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        // SKU is unique within a company, not globally
        manager
            .create_index(
                Index::create()
                    .name("idx_materials_company_sku")
                    .table(Materials::Table)
                    .col(Materials::CompanyId)
                    .col(Materials::Sku)
                    .unique()
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_materials_name")
                    .table(Materials::Table)
                    .col(Materials::Name)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_materials_barcode")
                    .table(Materials::Table)
                    .col(Materials::Barcode)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_table(
                Table::create()
                    .table(MaterialMovements::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MaterialMovements::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(MaterialMovements::MaterialId)
                            .integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaterialMovements::Quantity)
                            .decimal_len(12, 2)
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(MaterialMovements::Reason)
                            .string_len(100)
                            .not_null(),
                    )
                    .col(ColumnDef::new(MaterialMovements::Notes).text().null())
                    .col(ColumnDef::new(MaterialMovements::UserId).integer().null())
                    .col(
                        ColumnDef::new(MaterialMovements::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_material_movements_material_id")
                            .from(MaterialMovements::Table, MaterialMovements::MaterialId)
                            .to(Materials::Table, Materials::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_material_movements_user_id")
                            .from(MaterialMovements::Table, MaterialMovements::UserId)
                            .to(Users::Table, Users::Id)
                            .on_delete(ForeignKeyAction::SetNull),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_material_movements_material_id")
                    .table(MaterialMovements::Table)
                    .col(MaterialMovements::MaterialId)
                    .col(MaterialMovements::CreatedAt)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MaterialMovements::Table).to_owned())
            .await?;

        manager
            .drop_table(Table::drop().table(Materials::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub(crate) enum Materials {
    Table,
    Id,
    CompanyId,
    Name,
    Sku,
    Barcode,
    Description,
    Unit,
    CurrentStock,
    MinStock,
    UnitPrice,
    CreatedAt,
    UpdatedAt,
}

#[derive(DeriveIden)]
enum MaterialMovements {
    Table,
    Id,
    MaterialId,
    Quantity,
    Reason,
    Notes,
    UserId,
    CreatedAt,
}
