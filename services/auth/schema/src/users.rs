use sea_orm::entity::prelude::*;

/// Account record owned by the auth service.
///
/// `tfa_code` / `tfa_code_created_at` are written only by the two-factor login
/// gate: on every challenge and once more after a code is consumed.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub name: String,
    #[sea_orm(unique)]
    pub email: String,
    /// PHC-encoded Argon2id hash.
    pub password_hash: String,
    pub role: i16,
    pub locale: String,
    pub tfa: bool,
    /// Six ASCII digits; `None` until the first challenge.
    pub tfa_code: Option<String>,
    pub tfa_code_created_at: Option<chrono::DateTime<chrono::Utc>>,
    /// `None` while the address is unconfirmed.
    pub email_verified_at: Option<chrono::DateTime<chrono::Utc>>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
