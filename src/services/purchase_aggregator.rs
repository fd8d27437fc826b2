//! Purchase aggregator.
//!
//! Keeps `purchases.total_amount` equal to the sum of the purchase's item
//! `total_price` values. Every item mutation locks the purchase row, writes
//! the item and applies the difference to the total in one transaction.

use crate::{
    db::{for_update, with_transaction, DbPool},
    entities::{
        material::{self, Entity as Material},
        purchase::{self, Entity as Purchase},
        purchase_item::{self, Entity as PurchaseItem},
    },
    errors::ServiceError,
    services::{amounts, ownership},
};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseTransaction, EntityTrait,
    IntoActiveModel, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

pub const CROSS_COMPANY_MATERIAL: &str =
    "Material not found or does not belong to the same company";

/// `total_price` is `quantity * unit_price` rounded half away from zero to
/// two decimal places.
#[derive(Debug, Clone)]
pub struct NewPurchaseItem {
    pub item_name: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub material_id: Option<i32>,
}

/// Partial update; `None` leaves the field unchanged.
#[derive(Debug, Clone, Default)]
pub struct PurchaseItemChanges {
    pub item_name: Option<String>,
    pub quantity: Option<Decimal>,
    pub unit_price: Option<Decimal>,
    /// `Some(None)` clears the material link.
    pub material_id: Option<Option<i32>>,
}

#[derive(Clone)]
pub struct PurchaseAggregator {
    db_pool: Arc<DbPool>,
}

impl PurchaseAggregator {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Items of a purchase, oldest first.
    #[instrument(skip(self))]
    pub async fn list_items(
        &self,
        purchase_id: i32,
        user_id: i32,
    ) -> Result<Vec<purchase_item::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        ownership::purchase_for_user(db, purchase_id, user_id).await?;

        Ok(PurchaseItem::find()
            .filter(purchase_item::Column::PurchaseId.eq(purchase_id))
            .order_by_asc(purchase_item::Column::CreatedAt)
            .order_by_asc(purchase_item::Column::Id)
            .all(db)
            .await?)
    }

    #[instrument(skip(self, input), fields(quantity = %input.quantity, unit_price = %input.unit_price))]
    pub async fn add_item(
        &self,
        purchase_id: i32,
        user_id: i32,
        input: NewPurchaseItem,
    ) -> Result<purchase_item::Model, ServiceError> {
        let quantity = amounts::check_positive(input.quantity, "quantity")?;
        let unit_price = amounts::check_non_negative(input.unit_price, "unit_price")?;
        let total_price = amounts::line_total(quantity, unit_price)?;

        let (item, total_amount) =
            with_transaction(self.db_pool.as_ref(), "purchase.item.add", move |txn| {
                Box::pin(async move {
                    let purchase = lock_purchase(txn, purchase_id, user_id).await?;
                    if let Some(material_id) = input.material_id {
                        ensure_same_company(txn, material_id, purchase.company_id).await?;
                    }

                    let item = purchase_item::ActiveModel {
                        purchase_id: Set(purchase_id),
                        material_id: Set(input.material_id),
                        item_name: Set(input.item_name),
                        quantity: Set(quantity),
                        unit_price: Set(unit_price),
                        total_price: Set(total_price),
                        ..Default::default()
                    }
                    .insert(txn)
                    .await?;

                    let total = apply_to_total(txn, purchase, total_price).await?;
                    Ok((item, total))
                })
            })
            .await?;

        counter!("coapp.purchase.items", 1, "op" => "add");
        info!(
            purchase_id,
            item_id = item.id,
            total_price = %item.total_price,
            total_amount = %total_amount,
            "Purchase item added"
        );
        Ok(item)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_item(
        &self,
        purchase_id: i32,
        item_id: i32,
        user_id: i32,
        changes: PurchaseItemChanges,
    ) -> Result<purchase_item::Model, ServiceError> {
        let quantity = changes
            .quantity
            .map(|q| amounts::check_positive(q, "quantity"))
            .transpose()?;
        let unit_price = changes
            .unit_price
            .map(|p| amounts::check_non_negative(p, "unit_price"))
            .transpose()?;

        let (item, total_amount) =
            with_transaction(self.db_pool.as_ref(), "purchase.item.update", move |txn| {
                Box::pin(async move {
                    let purchase = lock_purchase(txn, purchase_id, user_id).await?;
                    let existing = item_of(txn, purchase_id, item_id).await?;

                    if let Some(Some(material_id)) = changes.material_id {
                        if existing.material_id != Some(material_id) {
                            ensure_same_company(txn, material_id, purchase.company_id).await?;
                        }
                    }

                    let old_total = existing.total_price;
                    let new_quantity = quantity.unwrap_or(existing.quantity);
                    let new_unit_price = unit_price.unwrap_or(existing.unit_price);
                    let new_total = amounts::line_total(new_quantity, new_unit_price)?;

                    let mut active = existing.into_active_model();
                    if let Some(name) = changes.item_name {
                        active.item_name = Set(name);
                    }
                    if let Some(material_id) = changes.material_id {
                        active.material_id = Set(material_id);
                    }
                    active.quantity = Set(new_quantity);
                    active.unit_price = Set(new_unit_price);
                    active.total_price = Set(new_total);
                    let item = active.update(txn).await?;

                    let total = apply_to_total(txn, purchase, new_total - old_total).await?;
                    Ok((item, total))
                })
            })
            .await?;

        counter!("coapp.purchase.items", 1, "op" => "update");
        info!(
            purchase_id,
            item_id,
            total_price = %item.total_price,
            total_amount = %total_amount,
            "Purchase item updated"
        );
        Ok(item)
    }

    #[instrument(skip(self))]
    pub async fn delete_item(
        &self,
        purchase_id: i32,
        item_id: i32,
        user_id: i32,
    ) -> Result<(), ServiceError> {
        let total_amount =
            with_transaction(self.db_pool.as_ref(), "purchase.item.delete", move |txn| {
                Box::pin(async move {
                    let purchase = lock_purchase(txn, purchase_id, user_id).await?;
                    let existing = item_of(txn, purchase_id, item_id).await?;
                    let removed = existing.total_price;

                    PurchaseItem::delete_by_id(existing.id).exec(txn).await?;
                    apply_to_total(txn, purchase, -removed).await
                })
            })
            .await?;

        counter!("coapp.purchase.items", 1, "op" => "delete");
        info!(purchase_id, item_id, total_amount = %total_amount, "Purchase item deleted");
        Ok(())
    }

    /// Sum of item totals as stored, for consistency checks.
    pub async fn item_total<C: ConnectionTrait>(
        db: &C,
        purchase_id: i32,
    ) -> Result<Decimal, ServiceError> {
        let items = PurchaseItem::find()
            .filter(purchase_item::Column::PurchaseId.eq(purchase_id))
            .all(db)
            .await?;
        Ok(items.iter().map(|i| i.total_price).sum())
    }
}

/// Ownership check, then the purchase row re-read under lock.
async fn lock_purchase(
    txn: &DatabaseTransaction,
    purchase_id: i32,
    user_id: i32,
) -> Result<purchase::Model, ServiceError> {
    ownership::purchase_for_user(txn, purchase_id, user_id).await?;
    for_update(Purchase::find_by_id(purchase_id), txn.get_database_backend())
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Purchase"))
}

async fn item_of(
    txn: &DatabaseTransaction,
    purchase_id: i32,
    item_id: i32,
) -> Result<purchase_item::Model, ServiceError> {
    PurchaseItem::find_by_id(item_id)
        .filter(purchase_item::Column::PurchaseId.eq(purchase_id))
        .one(txn)
        .await?
        .ok_or_else(|| ServiceError::not_found("Purchase item"))
}

async fn ensure_same_company(
    txn: &DatabaseTransaction,
    material_id: i32,
    company_id: i32,
) -> Result<(), ServiceError> {
    let found = Material::find_by_id(material_id)
        .filter(material::Column::CompanyId.eq(company_id))
        .one(txn)
        .await?;
    match found {
        Some(_) => Ok(()),
        None => Err(ServiceError::CrossCompanyReference(
            CROSS_COMPANY_MATERIAL.to_string(),
        )),
    }
}

async fn apply_to_total(
    txn: &DatabaseTransaction,
    purchase: purchase::Model,
    delta: Decimal,
) -> Result<Decimal, ServiceError> {
    let new_total = amounts::check_non_negative(purchase.total_amount + delta, "total_amount")?;
    let mut active = purchase.into_active_model();
    active.total_amount = Set(new_total);
    active.update(txn).await?;
    Ok(new_total)
}
