//! Ownership guard.
//!
//! Every read or write of a company, material or purchase goes through one of
//! these lookups. A resource that does not exist and a resource owned by a
//! different user produce the same `NotFound` error.

use crate::{
    entities::{
        company::{self, Entity as Company},
        material::{self, Entity as Material},
        purchase::{self, Entity as Purchase},
    },
    errors::ServiceError,
};
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, JoinType, QueryFilter, QuerySelect, RelationTrait};

pub const COMPANY_ACCESS_DENIED: &str = "Company not found or access denied";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResourceKind {
    Company,
    Material,
    Purchase,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OwnedResource {
    Company(company::Model),
    Material(material::Model),
    Purchase(purchase::Model),
}

/// Resolves `resource_id` of `kind` through the acting user's ownership chain.
pub async fn resolve<C: ConnectionTrait>(
    db: &C,
    kind: ResourceKind,
    resource_id: i32,
    user_id: i32,
) -> Result<OwnedResource, ServiceError> {
    Ok(match kind {
        ResourceKind::Company => {
            OwnedResource::Company(company_for_user(db, resource_id, user_id).await?)
        }
        ResourceKind::Material => {
            OwnedResource::Material(material_for_user(db, resource_id, user_id).await?)
        }
        ResourceKind::Purchase => {
            OwnedResource::Purchase(purchase_for_user(db, resource_id, user_id).await?)
        }
    })
}

pub async fn company_for_user<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    user_id: i32,
) -> Result<company::Model, ServiceError> {
    Company::find_by_id(company_id)
        .filter(company::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Company"))
}

/// Same lookup as `company_for_user`, used when the company is a filter or
/// the parent of a new resource rather than the addressed resource itself.
pub async fn require_company_access<C: ConnectionTrait>(
    db: &C,
    company_id: i32,
    user_id: i32,
) -> Result<company::Model, ServiceError> {
    company_for_user(db, company_id, user_id)
        .await
        .map_err(|err| match err {
            ServiceError::NotFound(_) => ServiceError::NotFound(COMPANY_ACCESS_DENIED.to_string()),
            other => other,
        })
}

pub async fn material_for_user<C: ConnectionTrait>(
    db: &C,
    material_id: i32,
    user_id: i32,
) -> Result<material::Model, ServiceError> {
    Material::find_by_id(material_id)
        .join(JoinType::InnerJoin, material::Relation::Company.def())
        .filter(company::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Material"))
}

pub async fn purchase_for_user<C: ConnectionTrait>(
    db: &C,
    purchase_id: i32,
    user_id: i32,
) -> Result<purchase::Model, ServiceError> {
    Purchase::find_by_id(purchase_id)
        .join(JoinType::InnerJoin, purchase::Relation::Company.def())
        .filter(company::Column::UserId.eq(user_id))
        .one(db)
        .await?
        .ok_or_else(|| ServiceError::not_found("Purchase"))
}

/// Ids of every company owned by `user_id`.
pub async fn owned_company_ids<C: ConnectionTrait>(
    db: &C,
    user_id: i32,
) -> Result<Vec<i32>, ServiceError> {
    Ok(Company::find()
        .select_only()
        .column(company::Column::Id)
        .filter(company::Column::UserId.eq(user_id))
        .into_tuple::<i32>()
        .all(db)
        .await?)
}
