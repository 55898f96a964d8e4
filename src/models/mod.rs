pub mod character;
pub mod comment;
pub mod error;
pub mod post;
pub mod session;

pub use character::*;
pub use comment::*;
pub use error::*;
pub use post::*;
pub use session::*;
