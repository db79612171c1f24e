use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    #[sea_orm(unique)]
    pub username: String,

    #[sea_orm(unique)]
    pub email: String,

    /// Argon2id password hash
    pub password_hash: String,

    /// `unverified` or `verified`
    pub status: String,

    pub created_at: String,

    pub updated_at: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::user_authorities::Entity")]
    UserAuthorities,

    #[sea_orm(has_many = "super::email_verifiers::Entity")]
    EmailVerifiers,
}

impl Related<super::user_authorities::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserAuthorities.def()
    }
}

impl Related<super::email_verifiers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::EmailVerifiers.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
