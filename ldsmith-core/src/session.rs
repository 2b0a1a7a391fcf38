// Per-session state and the action handlers that move it forward

use crate::compose::{self, Composition, PopulatedProperties};
use crate::compose::{CONTEXT_KEY, TYPE_KEY};
use crate::config::{Config, KeyPrecedence, SelectionMode};
use crate::notice::Notice;
use crate::persist;
use crate::vocab::VocabularyName;
use indexmap::IndexMap;
use ldsmith_scanner::{PropertyTable, ScanError, SchemaClient};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// How far the user got in the current session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    #[default]
    Idle,
    UrlEntered,
    Extracted,
    VocabularySelected,
    PropertiesLoaded,
    ValuesEntered,
    Generated,
    Persisted,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Idle => "idle",
            Stage::UrlEntered => "url entered",
            Stage::Extracted => "extracted",
            Stage::VocabularySelected => "vocabulary selected",
            Stage::PropertiesLoaded => "properties loaded",
            Stage::ValuesEntered => "values entered",
            Stage::Generated => "generated",
            Stage::Persisted => "persisted",
        }
    }
}

/// Everything one user has done so far, threaded through every action.
///
/// Each action runs to completion before the next one starts. Failures never
/// abort the session: they are reported as [`Notice`]s and the affected
/// result is left empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Session {
    config: Config,
    stage: Stage,
    url: Option<String>,
    documents: Vec<Value>,
    vocabularies: Vec<String>,
    vocabulary: Option<VocabularyName>,
    property_cache: IndexMap<String, PropertyTable>,
    values: PopulatedProperties,
    composition: Option<Composition>,
    saved_to: Option<PathBuf>,
    #[serde(skip)]
    notices: Vec<Notice>,
}

impl Session {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            ..Self::default()
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn stage(&self) -> Stage {
        self.stage
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    pub fn documents(&self) -> &[Value] {
        &self.documents
    }

    pub fn vocabularies(&self) -> &[String] {
        &self.vocabularies
    }

    pub fn vocabulary(&self) -> Option<&VocabularyName> {
        self.vocabulary.as_ref()
    }

    /// Property table of the selected vocabulary, once fetched
    pub fn properties(&self) -> Option<&PropertyTable> {
        let vocabulary = self.vocabulary.as_ref()?;
        self.property_cache.get(vocabulary.as_str())
    }

    pub fn values(&self) -> &PopulatedProperties {
        &self.values
    }

    pub fn composition(&self) -> Option<&Composition> {
        self.composition.as_ref()
    }

    pub fn saved_to(&self) -> Option<&Path> {
        self.saved_to.as_deref()
    }

    /// Hand the pending notices to the front end
    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn notify(&mut self, notice: Notice) {
        debug!("{:?}: {}", notice.level, notice.message);
        self.notices.push(notice);
    }

    /// Fetch `url` and replace the documents on display with what it contains.
    ///
    /// Starts the session over: selection, values and any composition are
    /// dropped. The vocabulary index and fetched property tables are kept.
    pub async fn analyze(&mut self, client: &SchemaClient, url: &str) -> &[Value] {
        let url = url.trim();
        if url.is_empty() {
            self.notify(Notice::error("Please enter a URL to analyze."));
            return &self.documents;
        }

        self.documents.clear();
        self.vocabulary = None;
        self.values.clear();
        self.composition = None;
        self.saved_to = None;
        self.url = Some(url.to_string());
        self.stage = Stage::UrlEntered;

        match client.extract(url).await {
            Ok(extraction) => {
                for failure in &extraction.failures {
                    self.notify(Notice::error(format!(
                        "Error parsing JSON-LD block #{}: {}",
                        failure.index + 1,
                        failure.message
                    )));
                }
                self.documents = extraction.documents;
            }
            Err(e) => {
                self.notify(Notice::error(format!("Error fetching the page: {}", e)));
            }
        }
        self.stage = Stage::Extracted;

        if self.documents.is_empty() {
            self.notify(Notice::warning("No JSON-LD data found on the page."));
        } else {
            self.notify(Notice::success(format!(
                "Found {} JSON-LD document(s).",
                self.documents.len()
            )));
        }

        &self.documents
    }

    /// Type names from the registry index, fetched on first use.
    pub async fn load_vocabularies(&mut self, client: &SchemaClient) -> &[String] {
        if !self.vocabularies.is_empty() {
            return &self.vocabularies;
        }

        match client.fetch_vocabulary_index().await {
            Ok(names) => {
                if names.is_empty() {
                    self.notify(Notice::warning("The vocabulary index lists no types."));
                } else {
                    info!("Loaded {} vocabulary types", names.len());
                }
                self.vocabularies = names;
            }
            Err(e) => {
                self.notify(Notice::error(format!(
                    "Error retrieving the vocabulary index: {}",
                    e
                )));
            }
        }

        &self.vocabularies
    }

    /// Choose the vocabulary type the new document will describe.
    ///
    /// In [`SelectionMode::Index`] the name must appear in the registry index
    /// (matched case-insensitively, stored with the index's spelling).
    pub async fn select_vocabulary(&mut self, client: &SchemaClient, raw: &str) -> bool {
        let name = match VocabularyName::parse(raw) {
            Ok(name) => name,
            Err(e) => {
                self.notify(Notice::error(e.to_string()));
                return false;
            }
        };

        let name = match self.config.selection {
            SelectionMode::FreeText => name,
            SelectionMode::Index => {
                if self.load_vocabularies(client).await.is_empty() {
                    self.notify(Notice::error(
                        "No vocabulary index available to select from.",
                    ));
                    return false;
                }
                let found = self
                    .vocabularies
                    .iter()
                    .find(|known| known.eq_ignore_ascii_case(name.as_str()))
                    .cloned();
                match found.map(|known| VocabularyName::parse(&known)) {
                    Some(Ok(known)) => known,
                    _ => {
                        self.notify(Notice::error(format!(
                            "Unknown vocabulary type '{}'.",
                            name
                        )));
                        return false;
                    }
                }
            }
        };

        self.notify(Notice::info(format!("Selected vocabulary '{}'.", name)));
        self.vocabulary = Some(name);
        self.values.clear();
        self.composition = None;
        self.saved_to = None;
        self.stage = Stage::VocabularySelected;
        true
    }

    /// Property table for the selected vocabulary.
    ///
    /// Tables are fetched once per vocabulary and session. `None` means the
    /// fetch failed or the page had no properties table; an empty table means
    /// the type documents no properties.
    pub async fn fetch_properties(&mut self, client: &SchemaClient) -> Option<&PropertyTable> {
        let Some(vocabulary) = self.vocabulary.clone() else {
            self.notify(Notice::error("Select a vocabulary type first."));
            return None;
        };

        if self.property_cache.contains_key(vocabulary.as_str()) {
            debug!("Property table for {} served from session cache", vocabulary);
        } else {
            match client.fetch_properties(vocabulary.as_str()).await {
                Ok(table) => {
                    self.property_cache.insert(vocabulary.to_string(), table);
                }
                Err(e @ ScanError::NoPropertiesTable(_)) => {
                    self.notify(Notice::warning(format!("{}.", e)));
                    return None;
                }
                Err(e) => {
                    self.notify(Notice::error(format!(
                        "Error retrieving properties for {}: {}",
                        vocabulary, e
                    )));
                    return None;
                }
            }
        }

        let count = self.property_cache[vocabulary.as_str()].len();
        if count == 0 {
            self.notify(Notice::warning(format!(
                "Vocabulary '{}' documents no properties.",
                vocabulary
            )));
        } else {
            self.notify(Notice::success(format!(
                "Retrieved {} properties of vocabulary '{}'.",
                count, vocabulary
            )));
        }
        if self.stage < Stage::PropertiesLoaded || self.stage > Stage::ValuesEntered {
            self.stage = Stage::PropertiesLoaded;
        }

        self.properties()
    }

    /// Record the value typed into one property field. A blank value clears the field.
    ///
    /// Besides the table's properties, `@context` and `@type` are accepted;
    /// [`KeyPrecedence`] decides at generation time whether they are used.
    pub fn set_value(&mut self, name: &str, value: &str) -> bool {
        let Some(properties) = self.properties() else {
            self.notify(Notice::error("Fetch the properties before entering values."));
            return false;
        };
        if !properties.contains_key(name) && !is_reserved(name) {
            let vocabulary = self
                .vocabulary
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default();
            self.notify(Notice::error(format!(
                "'{}' is not a property of {}.",
                name, vocabulary
            )));
            return false;
        }

        compose::set_property(&mut self.values, name, value);
        self.composition = None;
        self.saved_to = None;
        self.stage = Stage::ValuesEntered;
        true
    }

    pub fn clear_values(&mut self) {
        self.values.clear();
        self.composition = None;
        self.saved_to = None;
        if self.stage > Stage::PropertiesLoaded {
            self.stage = Stage::PropertiesLoaded;
        }
    }

    /// Compose the new document from the entered values, merging it with the
    /// page's documents when merging is enabled and the page had any.
    pub fn generate(&mut self) -> Option<&Composition> {
        let Some(vocabulary) = self.vocabulary.clone() else {
            self.notify(Notice::error("Select a vocabulary type first."));
            return None;
        };
        let Some(properties) = self.properties() else {
            self.notify(Notice::error("Fetch the properties before generating."));
            return None;
        };

        // Reserved keys first, then the registry table's order, not the order of entry
        let ordered: PopulatedProperties = [CONTEXT_KEY, TYPE_KEY]
            .into_iter()
            .map(str::to_string)
            .chain(properties.keys().filter(|name| !is_reserved(name)).cloned())
            .filter_map(|name| {
                let value = self.values.get(&name)?.clone();
                Some((name, value))
            })
            .collect();

        let overridden: Vec<String> = ordered
            .keys()
            .filter(|name| is_reserved(name))
            .cloned()
            .collect();
        let precedence = self.config.precedence;
        for name in &overridden {
            match precedence {
                KeyPrecedence::Reserved => self.notify(Notice::warning(format!(
                    "Ignoring the value entered for '{}': the fixed value is kept.",
                    name
                ))),
                KeyPrecedence::User => self.notify(Notice::info(format!(
                    "Using the value entered for '{}'.",
                    name
                ))),
            }
        }

        let composition = compose::compose(
            &vocabulary,
            &ordered,
            &self.documents,
            self.config.merge,
            precedence,
        );

        self.notify(Notice::success(format!(
            "Generated JSON-LD for '{}' with {} propert{}.",
            vocabulary,
            ordered.len(),
            if ordered.len() == 1 { "y" } else { "ies" }
        )));
        if let Composition::Merged(docs) = &composition {
            self.notify(Notice::info(format!(
                "Merged with {} existing document(s).",
                docs.len() - 1
            )));
        }

        self.composition = Some(composition);
        self.saved_to = None;
        self.stage = Stage::Generated;
        self.composition.as_ref()
    }

    /// Write the last composition to its output file.
    pub fn persist(&mut self) -> Option<PathBuf> {
        let Some(composition) = self.composition.as_ref() else {
            self.notify(Notice::error("Nothing to save yet: generate a document first."));
            return None;
        };

        match persist::persist(composition, &self.config.output) {
            Ok(path) => {
                let label = if composition.is_merged() { "merged" } else { "generated" };
                self.notify(Notice::success(format!(
                    "The {} JSON-LD file was saved as '{}'.",
                    label,
                    path.display()
                )));
                self.saved_to = Some(path.clone());
                self.stage = Stage::Persisted;
                Some(path)
            }
            Err(e) => {
                self.notify(Notice::error(format!("Error saving the JSON-LD file: {}", e)));
                None
            }
        }
    }
}

fn is_reserved(name: &str) -> bool {
    name == CONTEXT_KEY || name == TYPE_KEY
}
