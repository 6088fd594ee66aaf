//! Client for the external face-embedding service.
//!
//! The service takes an image as a multipart upload and answers with a
//! 512-dimensional face embedding plus optional face-detection metadata.
//! Transient failures are retried with exponential backoff; everything the
//! service sends back is validated before it reaches the vector store.

mod client;
mod error;
mod interfaces;
mod retry;

pub use client::*;
pub use error::*;
pub use interfaces::*;
pub use retry::*;
