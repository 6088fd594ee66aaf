mod contest_store;
mod memory;
mod photo_store;

pub use contest_store::*;
pub use memory::*;
pub use photo_store::*;
