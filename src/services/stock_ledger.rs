//! Stock ledger.
//!
//! A material's `current_stock` is the sum of its movements. Every change to
//! it appends a movement in the same transaction that writes the new level,
//! and no change may take the level below zero.

use crate::{
    db::{for_update, with_transaction, DbPool},
    entities::{
        material::{self, Entity as Material},
        material_movement::{self, Entity as MaterialMovement, REASON_INITIAL_STOCK},
    },
    errors::ServiceError,
    services::{amounts, ownership},
};
use metrics::counter;
use rust_decimal::Decimal;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QueryOrder, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const INITIAL_STOCK_NOTE: &str = "Initial stock entry";

/// Signed change to a material's stock.
#[derive(Debug, Clone)]
pub struct StockAdjustment {
    pub quantity: Decimal,
    pub reason: String,
    pub notes: Option<String>,
}

impl StockAdjustment {
    pub fn new(quantity: Decimal, reason: impl Into<String>) -> Self {
        Self {
            quantity,
            reason: reason.into(),
            notes: None,
        }
    }

    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    fn validate(&self) -> Result<(), ServiceError> {
        let reason = self.reason.trim();
        if reason.is_empty() || reason.chars().count() > 100 {
            return Err(ServiceError::ValidationError(
                "reason must be between 1 and 100 characters".to_string(),
            ));
        }
        amounts::check_amount(self.quantity, "quantity")?;
        if self.quantity.is_zero() {
            return Err(ServiceError::ValidationError(
                "quantity must not be zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Result of applying a delta to a stock level.
pub fn apply_delta(current: Decimal, delta: Decimal) -> Result<Decimal, ServiceError> {
    let next = current + delta;
    if next < Decimal::ZERO {
        return Err(ServiceError::InsufficientStock {
            current,
            requested: delta.abs(),
        });
    }
    amounts::check_amount(next, "current_stock")
}

#[derive(Clone)]
pub struct StockLedger {
    db_pool: Arc<DbPool>,
}

impl StockLedger {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Applies a signed adjustment and appends the matching movement.
    #[instrument(skip(self, adjustment), fields(quantity = %adjustment.quantity, reason = %adjustment.reason))]
    pub async fn adjust_stock(
        &self,
        material_id: i32,
        user_id: i32,
        adjustment: StockAdjustment,
    ) -> Result<material::Model, ServiceError> {
        adjustment.validate()?;

        let result = with_transaction(self.db_pool.as_ref(), "stock.adjust", move |txn| {
            Box::pin(async move {
                ownership::material_for_user(txn, material_id, user_id).await?;

                // re-read under lock so concurrent adjustments serialize
                let locked = for_update(
                    Material::find_by_id(material_id),
                    txn.get_database_backend(),
                )
                .one(txn)
                .await?
                .ok_or_else(|| ServiceError::not_found("Material"))?;

                let new_stock = apply_delta(locked.current_stock, adjustment.quantity)?;

                let mut active = locked.into_active_model();
                active.current_stock = Set(new_stock);
                let updated = active.update(txn).await?;

                append_movement(
                    txn,
                    material_id,
                    adjustment.quantity,
                    adjustment.reason.trim(),
                    adjustment.notes,
                    Some(user_id),
                )
                .await?;

                Ok(updated)
            })
        })
        .await;

        match &result {
            Ok(material) => {
                counter!("coapp.stock.adjustments", 1, "outcome" => "applied");
                info!(
                    material_id,
                    new_stock = %material.current_stock,
                    "Stock adjusted"
                );
            }
            Err(ServiceError::InsufficientStock { current, requested }) => {
                counter!("coapp.stock.adjustments", 1, "outcome" => "rejected");
                warn!(
                    material_id,
                    current = %current,
                    requested = %requested,
                    "Stock adjustment rejected"
                );
            }
            Err(_) => {
                counter!("coapp.stock.adjustments", 1, "outcome" => "failed");
            }
        }

        result
    }

    /// Movements for a material, newest first.
    #[instrument(skip(self))]
    pub async fn list_movements(
        &self,
        material_id: i32,
        user_id: i32,
    ) -> Result<Vec<material_movement::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        ownership::material_for_user(db, material_id, user_id).await?;

        Ok(MaterialMovement::find()
            .filter(material_movement::Column::MaterialId.eq(material_id))
            .order_by_desc(material_movement::Column::CreatedAt)
            .order_by_desc(material_movement::Column::Id)
            .all(db)
            .await?)
    }

    /// Materials of a company at or below their minimum, lowest stock first.
    #[instrument(skip(self))]
    pub async fn list_low_stock(
        &self,
        company_id: i32,
        user_id: i32,
    ) -> Result<Vec<material::Model>, ServiceError> {
        let db = self.db_pool.as_ref();
        ownership::require_company_access(db, company_id, user_id).await?;

        Ok(Material::find()
            .filter(material::Column::CompanyId.eq(company_id))
            .filter(
                sea_orm::sea_query::Expr::col(material::Column::CurrentStock)
                    .lte(sea_orm::sea_query::Expr::col(material::Column::MinStock)),
            )
            .order_by_asc(material::Column::CurrentStock)
            .order_by_asc(material::Column::Id)
            .all(db)
            .await?)
    }

    /// Sum of all recorded movements for a material.
    pub async fn movement_total<C: ConnectionTrait>(
        db: &C,
        material_id: i32,
    ) -> Result<Decimal, ServiceError> {
        let movements = MaterialMovement::find()
            .filter(material_movement::Column::MaterialId.eq(material_id))
            .all(db)
            .await?;
        Ok(movements.iter().map(|m| m.quantity).sum())
    }
}

/// Writes the `initial_stock` movement for a freshly inserted material.
/// Must run in the transaction that inserted it.
pub(crate) async fn record_initial_stock<C: ConnectionTrait>(
    txn: &C,
    material: &material::Model,
    user_id: i32,
) -> Result<(), ServiceError> {
    if material.current_stock.is_zero() {
        return Ok(());
    }
    append_movement(
        txn,
        material.id,
        material.current_stock,
        REASON_INITIAL_STOCK,
        Some(INITIAL_STOCK_NOTE.to_string()),
        Some(user_id),
    )
    .await?;
    Ok(())
}

async fn append_movement<C: ConnectionTrait>(
    txn: &C,
    material_id: i32,
    quantity: Decimal,
    reason: &str,
    notes: Option<String>,
    user_id: Option<i32>,
) -> Result<material_movement::Model, ServiceError> {
    let movement = material_movement::ActiveModel {
        material_id: Set(material_id),
        quantity: Set(quantity),
        reason: Set(reason.to_string()),
        notes: Set(notes),
        user_id: Set(user_id),
        ..Default::default()
    };
    Ok(movement.insert(txn).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use rust_decimal_macros::dec;

    #[test]
    fn apply_delta_rejects_negative_result() {
        assert_eq!(apply_delta(dec!(150), dec!(-25)).unwrap(), dec!(125));
        assert_eq!(apply_delta(dec!(125), dec!(-125)).unwrap(), dec!(0));
        assert_matches!(
            apply_delta(dec!(125), dec!(-200)),
            Err(ServiceError::InsufficientStock { current, requested })
                if current == dec!(125) && requested == dec!(200)
        );
    }

    #[test]
    fn adjustment_validation() {
        assert!(StockAdjustment::new(dec!(1), "sale").validate().is_ok());
        assert!(StockAdjustment::new(dec!(0), "sale").validate().is_err());
        assert!(StockAdjustment::new(dec!(1), "   ").validate().is_err());
        assert!(StockAdjustment::new(dec!(1), "x".repeat(101)).validate().is_err());
        assert!(StockAdjustment::new(dec!(0.001), "sale").validate().is_err());
    }
}
