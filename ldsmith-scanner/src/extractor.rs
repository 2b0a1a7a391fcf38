use crate::error::{Result, ScanError};
use crate::result::{BlockFailure, Extraction};
use scraper::{Html, Selector};
use serde_json::Value;
use tracing::{debug, warn};

pub const LD_JSON_MIME: &str = "application/ld+json";

/// Pull every JSON-LD block out of an HTML document.
///
/// Array blocks are spliced into the output one level deep, anything else is
/// appended as-is. Blocks that fail to parse are recorded in
/// [`Extraction::failures`] and skipped.
pub fn extract_structured_data(html: &str) -> Result<Extraction> {
    let document = Html::parse_document(html);
    let script_selector =
        Selector::parse("script[type]").map_err(|e| ScanError::ParseError(e.to_string()))?;

    let mut extraction = Extraction::new();

    for script in document.select(&script_selector) {
        let Some(script_type) = script.value().attr("type") else {
            continue;
        };
        if !is_ld_json(script_type) {
            continue;
        }

        let index = extraction.blocks_found;
        extraction.blocks_found += 1;

        let text: String = script.text().collect();
        match serde_json::from_str::<Value>(&text) {
            Ok(Value::Array(items)) => {
                debug!("Block {} is an array of {} documents", index, items.len());
                extraction.documents.extend(items);
            }
            Ok(value) => {
                debug!("Block {} is a single document", index);
                extraction.documents.push(value);
            }
            Err(e) => {
                warn!("Skipping malformed JSON-LD block {}: {}", index, e);
                extraction.failures.push(BlockFailure {
                    index,
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(extraction)
}

fn is_ld_json(script_type: &str) -> bool {
    let mime = script_type.split(';').next().unwrap_or_default();
    mime.trim().eq_ignore_ascii_case(LD_JSON_MIME)
}
