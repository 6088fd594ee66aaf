#![deny(clippy::unwrap_used)]
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss
)]
mod collection;
mod contest_status;
pub mod embedding;
pub mod similarity;

pub use collection::*;
pub use contest_status::*;
pub use embedding::{EMBEDDING_DIM, Embedding, EmbeddingError};
pub use similarity::{Similarity, SimilarityError};
