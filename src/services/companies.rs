use crate::{
    db::{with_transaction, DbPool},
    entities::{
        company::{self, Entity as Company},
        material::{self, Entity as Material},
        purchase::{self, Entity as Purchase},
    },
    errors::ServiceError,
    services::{materials, ownership, purchases},
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument};

#[derive(Debug, Clone)]
pub struct NewCompany {
    pub name: String,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
}

impl NewCompany {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            address: None,
            phone: None,
            email: None,
            tax_id: None,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct CompanyChanges {
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub tax_id: Option<String>,
}

#[derive(Clone)]
pub struct CompanyService {
    db_pool: Arc<DbPool>,
}

impl CompanyService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self))]
    pub async fn get(&self, company_id: i32, user_id: i32) -> Result<company::Model, ServiceError> {
        ownership::company_for_user(self.db_pool.as_ref(), company_id, user_id).await
    }

    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create(
        &self,
        input: NewCompany,
        user_id: i32,
    ) -> Result<company::Model, ServiceError> {
        let created = company::ActiveModel {
            name: Set(input.name),
            address: Set(input.address),
            phone: Set(input.phone),
            email: Set(input.email),
            tax_id: Set(input.tax_id),
            user_id: Set(user_id),
            ..Default::default()
        }
        .insert(self.db_pool.as_ref())
        .await?;

        info!(company_id = created.id, user_id, "Company created");
        Ok(created)
    }

    #[instrument(skip(self, changes))]
    pub async fn update(
        &self,
        company_id: i32,
        user_id: i32,
        changes: CompanyChanges,
    ) -> Result<company::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let mut active = ownership::company_for_user(db, company_id, user_id)
            .await?
            .into_active_model();

        if let Some(name) = changes.name {
            active.name = Set(name);
        }
        if let Some(address) = changes.address {
            active.address = Set(Some(address));
        }
        if let Some(phone) = changes.phone {
            active.phone = Set(Some(phone));
        }
        if let Some(email) = changes.email {
            active.email = Set(Some(email));
        }
        if let Some(tax_id) = changes.tax_id {
            active.tax_id = Set(Some(tax_id));
        }

        let updated = active.update(db).await?;
        info!(company_id, "Company updated");
        Ok(updated)
    }

    /// Removes the company with its materials, movements, purchases and items.
    #[instrument(skip(self))]
    pub async fn delete(&self, company_id: i32, user_id: i32) -> Result<(), ServiceError> {
        with_transaction(self.db_pool.as_ref(), "company.delete", move |txn| {
            Box::pin(async move {
                ownership::company_for_user(txn, company_id, user_id).await?;
                delete_companies(txn, vec![company_id]).await
            })
        })
        .await?;

        info!(company_id, "Company deleted");
        Ok(())
    }
}

/// Runs inside the caller's transaction.
pub(crate) async fn delete_companies<C: ConnectionTrait>(
    txn: &C,
    company_ids: Vec<i32>,
) -> Result<(), ServiceError> {
    if company_ids.is_empty() {
        return Ok(());
    }

    let material_ids: Vec<i32> = Material::find()
        .select_only()
        .column(material::Column::Id)
        .filter(material::Column::CompanyId.is_in(company_ids.clone()))
        .into_tuple()
        .all(txn)
        .await?;
    materials::delete_materials(txn, material_ids).await?;

    let purchase_ids: Vec<i32> = Purchase::find()
        .select_only()
        .column(purchase::Column::Id)
        .filter(purchase::Column::CompanyId.is_in(company_ids.clone()))
        .into_tuple()
        .all(txn)
        .await?;
    purchases::delete_purchases(txn, purchase_ids).await?;

    Company::delete_many()
        .filter(company::Column::Id.is_in(company_ids))
        .exec(txn)
        .await?;

    Ok(())
}
