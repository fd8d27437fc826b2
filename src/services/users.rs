use crate::{
    auth::password::{hash_password, verify_password, MIN_PASSWORD_LENGTH},
    db::{with_transaction, DbPool},
    entities::{
        company::{self, Entity as Company},
        user::{self, Entity as User},
    },
    errors::ServiceError,
    services::companies,
};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, EntityTrait, IntoActiveModel, QueryFilter,
    QuerySelect, Set,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};

pub const EMAIL_TAKEN: &str = "Email already registered";
pub const BAD_CREDENTIALS: &str = "Incorrect email or password";
pub const INACTIVE_USER: &str = "User account is inactive";
pub const WRONG_CURRENT_PASSWORD: &str = "Current password is incorrect";

#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub full_name: String,
    pub password: String,
}

#[derive(Debug, Clone, Default)]
pub struct ProfileChanges {
    pub email: Option<String>,
    pub full_name: Option<String>,
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_password_length(password: &str, field: &str) -> Result<(), ServiceError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ServiceError::ValidationError(format!(
            "{} must be at least {} characters",
            field, MIN_PASSWORD_LENGTH
        )));
    }
    Ok(())
}

async fn email_in_use<C: ConnectionTrait>(
    db: &C,
    email: &str,
    exclude_id: Option<i32>,
) -> Result<bool, ServiceError> {
    let mut query = User::find().filter(user::Column::Email.eq(email));
    if let Some(id) = exclude_id {
        query = query.filter(user::Column::Id.ne(id));
    }
    Ok(query.one(db).await?.is_some())
}

#[derive(Clone)]
pub struct UserService {
    db_pool: Arc<DbPool>,
}

impl UserService {
    pub fn new(db_pool: Arc<DbPool>) -> Self {
        Self { db_pool }
    }

    #[instrument(skip(self, input), fields(email = %input.email))]
    pub async fn register(&self, input: NewUser) -> Result<user::Model, ServiceError> {
        check_password_length(&input.password, "password")?;
        let email = normalize_email(&input.email);
        let db = self.db_pool.as_ref();

        if email_in_use(db, &email, None).await? {
            return Err(ServiceError::Conflict(EMAIL_TAKEN.to_string()));
        }

        let password_hash = hash_password(&input.password)?;
        let created = user::ActiveModel {
            email: Set(email),
            full_name: Set(input.full_name),
            password_hash: Set(password_hash),
            is_active: Set(true),
            ..Default::default()
        }
        .insert(db)
        .await
        .map_err(|e| ServiceError::unique_violation(e, EMAIL_TAKEN))?;

        info!(user_id = created.id, "User registered");
        Ok(created)
    }

    /// Unknown email and wrong password are indistinguishable to the caller.
    #[instrument(skip(self, password))]
    pub async fn authenticate(
        &self,
        email: &str,
        password: &str,
    ) -> Result<user::Model, ServiceError> {
        let email = normalize_email(email);
        let found = User::find()
            .filter(user::Column::Email.eq(email.as_str()))
            .one(self.db_pool.as_ref())
            .await?;

        let verified = match found {
            Some(user) => verify_password(password, &user.password_hash)?.then_some(user),
            None => None,
        };
        let Some(user) = verified else {
            warn!("Failed login attempt");
            return Err(ServiceError::Unauthorized(BAD_CREDENTIALS.to_string()));
        };

        if !user.is_active {
            return Err(ServiceError::Forbidden(INACTIVE_USER.to_string()));
        }
        Ok(user)
    }

    /// Loads the user behind a token; missing is 401, inactive is 403.
    pub async fn find_active(&self, user_id: i32) -> Result<user::Model, ServiceError> {
        let user = User::find_by_id(user_id)
            .one(self.db_pool.as_ref())
            .await?
            .ok_or_else(|| {
                ServiceError::Unauthorized("Could not validate credentials".to_string())
            })?;
        if !user.is_active {
            return Err(ServiceError::Forbidden(INACTIVE_USER.to_string()));
        }
        Ok(user)
    }

    #[instrument(skip(self, changes))]
    pub async fn update_profile(
        &self,
        user_id: i32,
        changes: ProfileChanges,
    ) -> Result<user::Model, ServiceError> {
        let db = self.db_pool.as_ref();
        let existing = self.find_active(user_id).await?;

        let mut active = existing.into_active_model();
        if let Some(email) = changes.email {
            let email = normalize_email(&email);
            if email_in_use(db, &email, Some(user_id)).await? {
                return Err(ServiceError::Conflict(EMAIL_TAKEN.to_string()));
            }
            active.email = Set(email);
        }
        if let Some(full_name) = changes.full_name {
            active.full_name = Set(full_name);
        }

        let updated = active
            .update(db)
            .await
            .map_err(|e| ServiceError::unique_violation(e, EMAIL_TAKEN))?;
        info!(user_id, "Profile updated");
        Ok(updated)
    }

    #[instrument(skip(self, current_password, new_password))]
    pub async fn change_password(
        &self,
        user_id: i32,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), ServiceError> {
        check_password_length(new_password, "new_password")?;
        let existing = self.find_active(user_id).await?;

        if !verify_password(current_password, &existing.password_hash)? {
            return Err(ServiceError::BadRequest(WRONG_CURRENT_PASSWORD.to_string()));
        }

        let mut active = existing.into_active_model();
        active.password_hash = Set(hash_password(new_password)?);
        active.update(self.db_pool.as_ref()).await?;

        info!(user_id, "Password changed");
        Ok(())
    }

    /// Removes the user and everything owned through their companies.
    #[instrument(skip(self))]
    pub async fn delete(&self, user_id: i32) -> Result<(), ServiceError> {
        with_transaction(self.db_pool.as_ref(), "user.delete", move |txn| {
            Box::pin(async move {
                let company_ids: Vec<i32> = Company::find()
                    .select_only()
                    .column(company::Column::Id)
                    .filter(company::Column::UserId.eq(user_id))
                    .into_tuple()
                    .all(txn)
                    .await?;
                companies::delete_companies(txn, company_ids).await?;

                let result = User::delete_by_id(user_id).exec(txn).await?;
                if result.rows_affected == 0 {
                    return Err(ServiceError::not_found("User"));
                }
                Ok(())
            })
        })
        .await?;

        info!(user_id, "User deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emails_are_normalized() {
        assert_eq!(normalize_email("  Demo@CoApp.Local "), "demo@coapp.local");
    }

    #[test]
    fn short_passwords_are_rejected() {
        assert!(check_password_length("12345", "password").is_err());
        assert!(check_password_length("123456", "password").is_ok());
    }
}
