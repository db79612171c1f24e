pub mod credentials;
pub use credentials::CredentialValidator;

pub mod mailer;
pub use mailer::{LogMailer, VerificationEmail, VerificationMailer, WebhookMailer};

pub mod token;
pub use token::{Claims, TokenError, TokenPurpose, TokenService};

pub mod user_service;
pub mod user_service_impl;
pub use user_service::{LoginResult, PublicUser, UserError, UserService};
pub use user_service_impl::SeaOrmUserService;

pub mod item_service;
pub mod item_service_impl;
pub use item_service::{ItemDto, ItemError, ItemInput, ItemService};
pub use item_service_impl::SeaOrmItemService;
