use ldsmith_scanner::client::{
    DEFAULT_INDEX_TIMEOUT_SECS, DEFAULT_INDEX_URL, DEFAULT_PAGE_TIMEOUT_SECS,
    DEFAULT_REGISTRY_BASE,
};
use ldsmith_scanner::{ScanError, SchemaClient};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const MERGED_FILE_NAME: &str = "merged_json_ld.json";
pub const GENERATED_FILE_NAME: &str = "generated_json_ld.json";

/// How the vocabulary type is chosen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SelectionMode {
    /// Pick from the names listed in the registry index
    #[default]
    Index,
    /// Accept any non-empty type name
    FreeText,
}

impl SelectionMode {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "index" | "list" => Some(SelectionMode::Index),
            "free-text" | "freetext" | "text" => Some(SelectionMode::FreeText),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SelectionMode::Index => "index",
            SelectionMode::FreeText => "free-text",
        }
    }
}

/// Which side wins when a user value is named `@context` or `@type`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum KeyPrecedence {
    /// The fixed schema.org context and the selected type
    #[default]
    Reserved,
    /// Whatever the user entered
    User,
}

impl KeyPrecedence {
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "reserved" => Some(KeyPrecedence::Reserved),
            "user" => Some(KeyPrecedence::User),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            KeyPrecedence::Reserved => "reserved",
            KeyPrecedence::User => "user",
        }
    }
}

/// Where composed documents land on disk
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputConfig {
    pub dir: PathBuf,
    pub merged_file: String,
    pub generated_file: String,
}

impl OutputConfig {
    pub fn in_dir(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            ..Self::default()
        }
    }

    pub fn merged_path(&self) -> PathBuf {
        self.dir.join(&self.merged_file)
    }

    pub fn generated_path(&self) -> PathBuf {
        self.dir.join(&self.generated_file)
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Path::new(".").to_path_buf(),
            merged_file: MERGED_FILE_NAME.to_string(),
            generated_file: GENERATED_FILE_NAME.to_string(),
        }
    }
}

/// Runtime settings shared by the CLI and the REPL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub registry_base: String,
    pub index_url: String,
    pub page_timeout_secs: u64,
    pub index_timeout_secs: u64,
    pub selection: SelectionMode,
    pub precedence: KeyPrecedence,
    /// Append the generated document to the page's documents when there are any
    pub merge: bool,
    /// Write the composition to disk right after generating it
    pub auto_save: bool,
    pub output: OutputConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            registry_base: DEFAULT_REGISTRY_BASE.to_string(),
            index_url: DEFAULT_INDEX_URL.to_string(),
            page_timeout_secs: DEFAULT_PAGE_TIMEOUT_SECS,
            index_timeout_secs: DEFAULT_INDEX_TIMEOUT_SECS,
            selection: SelectionMode::default(),
            precedence: KeyPrecedence::default(),
            merge: true,
            auto_save: true,
            output: OutputConfig::default(),
        }
    }
}

impl Config {
    /// Build the HTTP client these settings describe
    pub fn client(&self) -> Result<SchemaClient, ScanError> {
        Ok(SchemaClient::new()?
            .with_registry_base(&self.registry_base)?
            .with_index_url(&self.index_url)?
            .with_page_timeout(Duration::from_secs(self.page_timeout_secs))
            .with_index_timeout(Duration::from_secs(self.index_timeout_secs)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_registry() {
        let config = Config::default();
        assert_eq!(config.registry_base, "https://schema.org/");
        assert_eq!(config.page_timeout_secs, 10);
        assert_eq!(config.index_timeout_secs, 20);
        assert_eq!(config.selection, SelectionMode::Index);
        assert!(config.merge);
        assert_eq!(config.output.merged_path(), Path::new("./merged_json_ld.json"));
    }

    #[test]
    fn test_selection_mode_parsing() {
        assert_eq!(SelectionMode::from_str("INDEX"), Some(SelectionMode::Index));
        assert_eq!(SelectionMode::from_str("free-text"), Some(SelectionMode::FreeText));
        assert_eq!(SelectionMode::from_str("dropdown"), None);
    }

    #[test]
    fn test_key_precedence_parsing() {
        assert_eq!(KeyPrecedence::default(), KeyPrecedence::Reserved);
        assert_eq!(KeyPrecedence::from_str("User"), Some(KeyPrecedence::User));
        assert_eq!(KeyPrecedence::from_str("both"), None);
    }

    #[test]
    fn test_client_from_config() {
        let config = Config {
            registry_base: "http://localhost:9999/types".to_string(),
            ..Config::default()
        };
        let client = config.client().unwrap();
        assert_eq!(client.registry_base().as_str(), "http://localhost:9999/types/");
    }
}
