use sea_orm_migration::prelude::*;

mod m20260301_000001_create_users;
mod m20260312_000002_add_tfa_to_users;
mod m20260402_000003_add_email_verified_at_to_users;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20260301_000001_create_users::Migration),
            Box::new(m20260312_000002_add_tfa_to_users::Migration),
            Box::new(m20260402_000003_add_email_verified_at_to_users::Migration),
        ]
    }
}
