pub mod object_store;
pub mod upload;

pub use object_store::*;
pub use upload::*;
