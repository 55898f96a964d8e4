pub mod avatar;
pub mod character_client;
pub mod clock;
pub mod comment_service;
pub mod http_client;
pub mod post_service;
pub mod reaper;
pub mod session_service;
#[cfg(test)]
pub(crate) mod testing;

pub use avatar::*;
pub use character_client::*;
pub use clock::*;
pub use comment_service::*;
pub use http_client::*;
pub use post_service::*;
pub use reaper::*;
pub use session_service::*;
