pub mod error;
pub mod interfaces;
pub mod service;

pub use error::CompareError;
pub use interfaces::*;
pub use service::SimilarityService;
