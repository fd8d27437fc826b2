//! Read-side listings scoped to the acting user.
//!
//! Each call is a direct read. Results are ordered with an id tie-break so
//! repeated calls over unchanged data return identical sequences.

use crate::{
    db::DbPool,
    entities::{
        company::{self, Entity as Company},
        material::{self, Entity as Material},
        purchase::{self, Entity as Purchase},
    },
    errors::ServiceError,
    services::ownership,
};
use sea_orm::{
    sea_query::{Condition, Expr, Func, SimpleExpr},
    ColumnTrait, EntityTrait, Iden, JoinType, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
};
use std::sync::Arc;
use tracing::instrument;

#[derive(Debug, Clone, Default)]
pub struct MaterialFilter {
    pub company_id: Option<i32>,
    pub search: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct PurchaseFilter {
    pub company_id: Option<i32>,
    pub search: Option<String>,
}

/// `lower(table.column) LIKE '%term%'`
fn contains_ci<E, C>(entity: E, column: C, term: &str) -> SimpleExpr
where
    E: Iden + 'static,
    C: Iden + 'static,
{
    Expr::expr(Func::lower(Expr::col((entity, column))))
        .like(format!("%{}%", term.to_lowercase()))
}

fn search_term(search: Option<&str>) -> Option<&str> {
    search.map(str::trim).filter(|s| !s.is_empty())
}

#[derive(Clone)]
pub struct DirectoryService {
    db_pool: Arc<DbPool>,
}

impl DirectoryService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    /// Companies owned by the user, newest first.
    #[instrument(skip(self))]
    pub async fn list_companies(
        &self,
        user_id: i32,
        search: Option<&str>,
    ) -> Result<Vec<company::Model>, ServiceError> {
        let mut query = Company::find().filter(company::Column::UserId.eq(user_id));
        if let Some(term) = search_term(search) {
            query = query.filter(contains_ci(company::Entity, company::Column::Name, term));
        }

        Ok(query
            .order_by_desc(company::Column::CreatedAt)
            .order_by_desc(company::Column::Id)
            .all(self.db_pool.as_ref())
            .await?)
    }

    /// Materials across the user's companies, newest first. Search matches
    /// name, SKU or barcode.
    #[instrument(skip(self))]
    pub async fn list_materials(
        &self,
        user_id: i32,
        filter: MaterialFilter,
    ) -> Result<Vec<material::Model>, ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = Material::find()
            .join(JoinType::InnerJoin, material::Relation::Company.def())
            .filter(company::Column::UserId.eq(user_id));

        if let Some(company_id) = filter.company_id {
            ownership::require_company_access(db, company_id, user_id).await?;
            query = query.filter(material::Column::CompanyId.eq(company_id));
        }

        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(material::Entity, material::Column::Name, term))
                    .add(contains_ci(material::Entity, material::Column::Sku, term))
                    .add(contains_ci(material::Entity, material::Column::Barcode, term)),
            );
        }

        Ok(query
            .order_by_desc(material::Column::CreatedAt)
            .order_by_desc(material::Column::Id)
            .all(db)
            .await?)
    }

    /// Purchases across the user's companies, latest purchase date first.
    /// Search matches invoice number or supplier name.
    #[instrument(skip(self))]
    pub async fn list_purchases(
        &self,
        user_id: i32,
        filter: PurchaseFilter,
    ) -> Result<Vec<purchase::Model>, ServiceError> {
        let db = self.db_pool.as_ref();

        let mut query = Purchase::find()
            .join(JoinType::InnerJoin, purchase::Relation::Company.def())
            .filter(company::Column::UserId.eq(user_id));

        if let Some(company_id) = filter.company_id {
            ownership::require_company_access(db, company_id, user_id).await?;
            query = query.filter(purchase::Column::CompanyId.eq(company_id));
        }

        if let Some(term) = search_term(filter.search.as_deref()) {
            query = query.filter(
                Condition::any()
                    .add(contains_ci(
                        purchase::Entity,
                        purchase::Column::InvoiceNumber,
                        term,
                    ))
                    .add(contains_ci(
                        purchase::Entity,
                        purchase::Column::SupplierName,
                        term,
                    )),
            );
        }

        Ok(query
            .order_by_desc(purchase::Column::PurchaseDate)
            .order_by_desc(purchase::Column::Id)
            .all(db)
            .await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_search_is_ignored() {
        assert_eq!(search_term(None), None);
        assert_eq!(search_term(Some("   ")), None);
        assert_eq!(search_term(Some(" ard ")), Some("ard"));
    }
}
