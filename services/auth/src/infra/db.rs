use anyhow::Context as _;
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ActiveValue::Set, ColumnTrait, DatabaseConnection, EntityTrait,
    QueryFilter, SqlErr,
};
use uuid::Uuid;

use scribe_auth_schema::users;
use scribe_domain::locale::Locale;
use scribe_domain::user::UserRole;

use crate::domain::repository::UserRepository;
use crate::domain::types::{AuthUser, NewUser};
use crate::error::AuthServiceError;

#[derive(Clone)]
pub struct DbUserRepository {
    pub db: DatabaseConnection,
}

impl UserRepository for DbUserRepository {
    async fn find_by_email(&self, email: &str) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find()
            .filter(users::Column::Email.eq(email))
            .one(&self.db)
            .await
            .context("find user by email")?;
        model.map(user_from_model).transpose()
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<AuthUser>, AuthServiceError> {
        let model = users::Entity::find_by_id(id)
            .one(&self.db)
            .await
            .context("find user by id")?;
        model.map(user_from_model).transpose()
    }

    async fn create(&self, user: &NewUser) -> Result<(), AuthServiceError> {
        let result = users::ActiveModel {
            id: Set(user.id),
            name: Set(user.name.clone()),
            email: Set(user.email.clone()),
            password_hash: Set(user.password_hash.clone()),
            role: Set(i16::from(user.role)),
            locale: Set(user.locale.as_str().to_owned()),
            tfa: Set(user.tfa),
            tfa_code: Set(None),
            tfa_code_created_at: Set(None),
            email_verified_at: Set(user.email_verified_at),
            created_at: Set(user.created_at),
        }
        .insert(&self.db)
        .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                Err(AuthServiceError::EmailTaken)
            }
            Err(e) => Err(AuthServiceError::Internal(
                anyhow::Error::new(e).context("create user"),
            )),
        }
    }

    async fn set_tfa_code(
        &self,
        user_id: Uuid,
        code: &str,
        created_at: DateTime<Utc>,
    ) -> Result<(), AuthServiceError> {
        users::ActiveModel {
            id: Set(user_id),
            tfa_code: Set(Some(code.to_owned())),
            tfa_code_created_at: Set(Some(created_at)),
            ..Default::default()
        }
        .update(&self.db)
        .await
        .context("store tfa code")?;
        Ok(())
    }

    async fn consume_tfa_code(
        &self,
        user_id: Uuid,
        used_code: &str,
        next_code: &str,
        created_at: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::TfaCode, Expr::value(next_code.to_owned()))
            .col_expr(users::Column::TfaCodeCreatedAt, Expr::value(created_at))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::TfaCode.eq(used_code))
            .exec(&self.db)
            .await
            .context("consume tfa code")?;
        Ok(result.rows_affected == 1)
    }

    async fn set_tfa(&self, user_id: Uuid, enabled: bool) -> Result<bool, AuthServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Tfa, Expr::value(enabled))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .context("set tfa flag")?;
        Ok(result.rows_affected > 0)
    }

    async fn set_locale(&self, user_id: Uuid, locale: Locale) -> Result<bool, AuthServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::Locale, Expr::value(locale.as_str()))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .context("set locale")?;
        Ok(result.rows_affected > 0)
    }

    async fn set_password(
        &self,
        user_id: Uuid,
        password_hash: &str,
    ) -> Result<bool, AuthServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::PasswordHash, Expr::value(password_hash))
            .filter(users::Column::Id.eq(user_id))
            .exec(&self.db)
            .await
            .context("set password")?;
        Ok(result.rows_affected > 0)
    }

    async fn mark_email_verified(
        &self,
        user_id: Uuid,
        at: DateTime<Utc>,
    ) -> Result<bool, AuthServiceError> {
        let result = users::Entity::update_many()
            .col_expr(users::Column::EmailVerifiedAt, Expr::value(at))
            .filter(users::Column::Id.eq(user_id))
            .filter(users::Column::EmailVerifiedAt.is_null())
            .exec(&self.db)
            .await
            .context("mark email verified")?;
        Ok(result.rows_affected == 1)
    }
}

fn user_from_model(model: users::Model) -> Result<AuthUser, AuthServiceError> {
    let role = u8::try_from(model.role)
        .ok()
        .and_then(UserRole::from_u8)
        .ok_or_else(|| anyhow::anyhow!("unknown user role: {}", model.role))?;
    Ok(AuthUser {
        id: model.id,
        name: model.name,
        email: model.email,
        password_hash: model.password_hash,
        role: role.as_u8(),
        locale: Locale::from_tag_or_default(&model.locale),
        tfa: model.tfa,
        tfa_code: model.tfa_code,
        tfa_code_created_at: model.tfa_code_created_at,
        email_verified_at: model.email_verified_at,
    })
}
