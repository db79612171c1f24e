pub mod prelude;

pub mod email_verifiers;
pub mod items;
pub mod user_authorities;
pub mod users;
