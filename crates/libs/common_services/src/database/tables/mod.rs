mod contest;
mod contest_entry;
mod photo;

pub use contest::*;
pub use contest_entry::*;
pub use photo::*;
