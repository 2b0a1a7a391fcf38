pub mod client;
pub mod error;
pub mod extractor;
pub mod result;
pub mod vocabulary;

pub use client::SchemaClient;
pub use error::ScanError;
pub use result::{BlockFailure, Extraction, PropertyTable};
