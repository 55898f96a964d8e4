pub mod comment_repository;
pub mod database;
pub mod post_repository;
pub mod session_repository;

pub use comment_repository::*;
pub use database::Database;
pub use post_repository::*;
pub use session_repository::*;
