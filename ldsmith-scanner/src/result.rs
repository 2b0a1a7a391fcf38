use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Property name -> human readable description, in the order the registry lists them.
pub type PropertyTable = IndexMap<String, String>;

/// A `<script type="application/ld+json">` block that could not be parsed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockFailure {
    /// Zero-based position of the block among the page's JSON-LD blocks
    pub index: usize,
    pub message: String,
}

/// Everything pulled out of one page.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Extraction {
    pub url: Option<String>,
    pub blocks_found: usize,
    pub documents: Vec<Value>,
    pub failures: Vec<BlockFailure>,
}

impl Extraction {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: String) -> Self {
        self.url = Some(url);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}
