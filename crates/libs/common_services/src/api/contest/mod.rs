pub mod error;
pub mod interfaces;
pub mod ranking;
pub mod service;

pub use error::ContestError;
pub use interfaces::*;
pub use ranking::rank;
pub use service::ContestService;
