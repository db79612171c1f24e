pub mod email_verifier;
pub mod item;
pub mod user;
