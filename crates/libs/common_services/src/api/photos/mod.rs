pub mod error;
pub mod service;

pub use error::PhotoError;
pub use service::PhotoService;
