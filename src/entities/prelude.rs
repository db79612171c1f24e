pub use super::email_verifiers::Entity as EmailVerifiers;
pub use super::items::Entity as Items;
pub use super::user_authorities::Entity as UserAuthorities;
pub use super::users::Entity as Users;
