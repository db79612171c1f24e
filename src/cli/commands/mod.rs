mod items;
mod users;

pub use items::cmd_items_list;
pub use users::{cmd_users_delete, cmd_users_list, cmd_users_show};
