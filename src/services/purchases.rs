use crate::{
    db::{with_transaction, DbPool},
    entities::{
        purchase::{self, Entity as Purchase, PurchaseStatus},
        purchase_item::{self, Entity as PurchaseItem},
    },
    errors::ServiceError,
    services::ownership,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sea_orm::{ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter, Set};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct NewPurchase {
    pub company_id: i32,
    pub invoice_number: String,
    pub supplier_name: String,
    pub supplier_contact: Option<String>,
    pub purchase_date: DateTime<Utc>,
    pub status: PurchaseStatus,
    pub notes: Option<String>,
}

/// Header fields only. The total is owned by the aggregator.
#[derive(Debug, Clone, Default)]
pub struct PurchaseChanges {
    pub invoice_number: Option<String>,
    pub supplier_name: Option<String>,
    pub supplier_contact: Option<String>,
    pub purchase_date: Option<DateTime<Utc>>,
    pub status: Option<PurchaseStatus>,
    pub notes: Option<String>,
}

#[derive(Clone)]
pub struct PurchaseService {
    db_pool: Arc<DbPool>,
}

impl PurchaseService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, purchase_id: i32, user_id: i32) -> Result<purchase::Model, ServiceError> {
        ownership::purchase_for_user(self.db_pool.as_ref(), purchase_id, user_id).await
    }

    #[instrument(skip(self, input), fields(company_id = input.company_id, invoice = %input.invoice_number))]
    pub async fn create(
        &self,
        input: NewPurchase,
        user_id: i32,
    ) -> Result<purchase::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        ownership::require_company_access(db, input.company_id, user_id).await?;

        let created = purchase::ActiveModel {
            company_id: Set(input.company_id),
            invoice_number: Set(input.invoice_number),
            supplier_name: Set(input.supplier_name),
            supplier_contact: Set(input.supplier_contact),
            purchase_date: Set(input.purchase_date),
            status: Set(input.status.as_str().to_string()),
            total_amount: Set(Decimal::ZERO),
            notes: Set(input.notes),
            user_id: Set(Some(user_id)),
            ..Default::default()
        }
        .insert(db)
        .await?;

        info!(purchase_id = created.id, company_id = created.company_id, "Purchase created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        purchase_id: i32,
        user_id: i32,
        changes: PurchaseChanges,
    ) -> Result<purchase::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = ownership::purchase_for_user(db, purchase_id, user_id).await?;

        let mut active = existing.into_active_model();
        if let Some(invoice_number) = changes.invoice_number {
            active.invoice_number = Set(invoice_number);
        }
        if let Some(supplier_name) = changes.supplier_name {
            active.supplier_name = Set(supplier_name);
        }
        if let Some(contact) = changes.supplier_contact {
            active.supplier_contact = Set(Some(contact));
        }
        if let Some(date) = changes.purchase_date {
            active.purchase_date = Set(date);
        }
        if let Some(status) = changes.status {
            active.status = Set(status.as_str().to_string());
        }
        if let Some(notes) = changes.notes {
            active.notes = Set(Some(notes));
        }
        let updated = active.update(db).await?;

        info!(purchase_id, status = %updated.status, "Purchase updated");
        Ok(updated)
    }

    /// Deletes the purchase together with its items.
    #[instrument(skip(self))]
    pub async fn delete(&self, purchase_id: i32, user_id: i32) -> Result<(), ServiceError> {
        with_transaction(self.db_pool.as_ref(), "purchase.delete", move |txn| {
            Box::pin(async move {
                ownership::purchase_for_user(txn, purchase_id, user_id).await?;
                delete_purchases(txn, vec![purchase_id]).await
            })
        })
        .await?;

        info!(purchase_id, "Purchase deleted");
        Ok(())
    }
}

/// Runs inside the caller's transaction.
pub(crate) async fn delete_purchases<C: ConnectionTrait>(
    txn: &C,
    purchase_ids: Vec<i32>,
) -> Result<(), ServiceError> {
    if purchase_ids.is_empty() {
        return Ok(());
    }

    PurchaseItem::delete_many()
        .filter(purchase_item::Column::PurchaseId.is_in(purchase_ids.clone()))
        .exec(txn)
        .await?;

    Purchase::delete_many()
        .filter(purchase::Column::Id.is_in(purchase_ids))
        .exec(txn)
        .await?;

    Ok(())
}
