pub mod create;
pub mod delete;
pub mod list;
pub mod update;

pub use create::create_post;
pub use delete::delete_by_id;
pub use list::list_get;
pub use update::update_put;
