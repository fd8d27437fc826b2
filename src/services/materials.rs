use crate::{
    db::{with_transaction, DbPool},
    entities::{
        material::{self, Entity as Material},
        material_movement::{self, Entity as MaterialMovement},
        purchase_item::{self, Entity as PurchaseItem},
    },
    errors::ServiceError,
    services::{amounts, ownership, stock_ledger},
};
use rust_decimal::Decimal;
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel,
    PaginatorTrait, QueryFilter, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

pub const DEFAULT_UNIT: &str = "pcs";
pub const SKU_TAKEN: &str = "SKU already exists for this company";

#[derive(Debug, Clone)]
pub struct NewMaterial {
    pub company_id: i32,
    pub name: String,
    pub sku: String,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub current_stock: Decimal,
    pub min_stock: Decimal,
    pub unit_price: Option<Decimal>,
}

impl NewMaterial {
    pub fn new(company_id: i32, name: impl Into<String>, sku: impl Into<String>) -> Self {
        Self {
            company_id,
            name: name.into(),
            sku: sku.into(),
            barcode: None,
            description: None,
            unit: None,
            current_stock: Decimal::ZERO,
            min_stock: Decimal::ZERO,
            unit_price: None,
        }
    }
}

/// Descriptive fields only; stock is changed through the ledger.
#[derive(Debug, Clone, Default)]
pub struct MaterialChanges {
    pub name: Option<String>,
    pub sku: Option<String>,
    pub barcode: Option<String>,
    pub description: Option<String>,
    pub unit: Option<String>,
    pub min_stock: Option<Decimal>,
    pub unit_price: Option<Decimal>,
}

#[derive(Clone)]
pub struct MaterialService {
    db_pool: Arc<DbPool>,
}

impl MaterialService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, material_id: i32, user_id: i32) -> Result<material::Model, ServiceError> {
        ownership::material_for_user(self.db_pool.as_ref(), material_id, user_id).await
    }

    /// Inserts the material and, for a non-zero opening balance, its
    /// `initial_stock` movement in one transaction.
    #[instrument(skip(self, input), fields(company_id = input.company_id, sku = %input.sku))]
    pub async fn create(
        &self,
        input: NewMaterial,
        user_id: i32,
    ) -> Result<material::Model, ServiceError> {
        let current_stock = amounts::check_non_negative(input.current_stock, "current_stock")?;
        let min_stock = amounts::check_non_negative(input.min_stock, "min_stock")?;
        let unit_price = input
            .unit_price
            .map(|p| amounts::check_non_negative(p, "unit_price"))
            .transpose()?;

        let created = with_transaction(self.db_pool.as_ref(), "material.create", move |txn| {
            Box::pin(async move {
                ownership::require_company_access(txn, input.company_id, user_id).await?;
                ensure_sku_free(txn, input.company_id, &input.sku, None).await?;

                let model = material::ActiveModel {
                    company_id: Set(input.company_id),
                    name: Set(input.name),
                    sku: Set(input.sku),
                    barcode: Set(input.barcode),
                    description: Set(input.description),
                    unit: Set(input.unit.unwrap_or_else(|| DEFAULT_UNIT.to_string())),
                    current_stock: Set(current_stock),
                    min_stock: Set(min_stock),
                    unit_price: Set(unit_price),
                    ..Default::default()
                }
                .insert(txn)
                .await
                .map_err(|e| ServiceError::unique_violation(e, SKU_TAKEN))?;

                stock_ledger::record_initial_stock(txn, &model, user_id).await?;
                Ok(model)
            })
        })
        .await?;

        info!(
            material_id = created.id,
            company_id = created.company_id,
            initial_stock = %created.current_stock,
            "Material created"
        );
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        material_id: i32,
        user_id: i32,
        changes: MaterialChanges,
    ) -> Result<material::Model, ServiceError> {
        let min_stock = changes
            .min_stock
            .map(|v| amounts::check_non_negative(v, "min_stock"))
            .transpose()?;
        let unit_price = changes
            .unit_price
            .map(|v| amounts::check_non_negative(v, "unit_price"))
            .transpose()?;

        let updated = with_transaction(self.db_pool.as_ref(), "material.update", move |txn| {
            Box::pin(async move {
                let existing = ownership::material_for_user(txn, material_id, user_id).await?;

                if let Some(sku) = changes.sku.as_deref() {
                    if sku != existing.sku {
                        ensure_sku_free(txn, existing.company_id, sku, Some(existing.id)).await?;
                    }
                }

                let mut active = existing.into_active_model();
                if let Some(name) = changes.name {
                    active.name = Set(name);
                }
                if let Some(sku) = changes.sku {
                    active.sku = Set(sku);
                }
                if let Some(barcode) = changes.barcode {
                    active.barcode = Set(Some(barcode));
                }
                if let Some(description) = changes.description {
                    active.description = Set(Some(description));
                }
                if let Some(unit) = changes.unit {
                    active.unit = Set(unit);
                }
                if let Some(min_stock) = min_stock {
                    active.min_stock = Set(min_stock);
                }
                if let Some(unit_price) = unit_price {
                    active.unit_price = Set(Some(unit_price));
                }
                active
                    .update(txn)
                    .await
                    .map_err(|e| ServiceError::unique_violation(e, SKU_TAKEN))
            })
        })
        .await?;

        info!(material_id = updated.id, "Material updated");
        Ok(updated)
    }

    /// Deletes the material and its movements. Purchase items that referenced
    /// it keep their data and lose the link.
    #[instrument(skip(self))]
    pub async fn delete(&self, material_id: i32, user_id: i32) -> Result<(), ServiceError> {
        with_transaction(self.db_pool.as_ref(), "material.delete", move |txn| {
            Box::pin(async move {
                ownership::material_for_user(txn, material_id, user_id).await?;
                delete_materials(txn, vec![material_id]).await
            })
        })
        .await?;

        info!(material_id, "Material deleted");
        Ok(())
    }
}

async fn ensure_sku_free<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    sku: &str,
    exclude_id: Option<i32>,
) -> Result<(), ServiceError> {
    let mut query = Material::find()
        .filter(material::Column::CompanyId.eq(company_id))
        .filter(material::Column::Sku.eq(sku));
    if let Some(id) = exclude_id {
        query = query.filter(material::Column::Id.ne(id));
    }
    if query.count(db).await? > 0 {
        return Err(ServiceError::Conflict(SKU_TAKEN.to_string()));
    }
    Ok(())
}

/// Removes materials with their movements and clears item links to them.
/// Runs inside the caller's transaction.
pub(crate) async fn delete_materials<C: ConnectionTrait>(
    txn: &C,
    material_ids: Vec<i32>,
) -> Result<(), ServiceError> {
    if material_ids.is_empty() {
        return Ok(());
    }

    PurchaseItem::update_many()
        .col_expr(
            purchase_item::Column::MaterialId,
            Expr::value(Option::<i32>::None),
        )
        .filter(purchase_item::Column::MaterialId.is_in(material_ids.clone()))
        .exec(txn)
        .await?;

    MaterialMovement::delete_many()
        .filter(material_movement::Column::MaterialId.is_in(material_ids.clone()))
        .exec(txn)
        .await?;

    Material::delete_many()
        .filter(material::Column::Id.is_in(material_ids))
        .exec(txn)
        .await?;

    Ok(())
}
