mod error;
pub mod stores;
mod tables;
mod utils;
pub mod vector_store;

pub use error::*;
pub use tables::*;
pub use utils::*;
