// Text rendering of session data for the CLI and the REPL

use crate::compose::{Composition, PopulatedProperties};
use crate::session::Session;
use ldsmith_scanner::PropertyTable;
use serde_json::Value;

pub const VALIDATOR_URL: &str = "https://validator.schema.org/";

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Label shown next to a property's input field
pub fn field_label(name: &str, description: &str) -> String {
    format!("{} ({}):", name, description)
}

pub fn pretty(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

/// One pretty-printed JSON block per document found on the page
pub fn render_documents(documents: &[Value]) -> String {
    let mut report = String::new();
    if documents.is_empty() {
        report.push_str("No JSON-LD data found on the page.\n");
        return report;
    }

    report.push_str(&format!("# JSON-LD data found: {}\n", documents.len()));
    for (i, doc) in documents.iter().enumerate() {
        report.push_str(&format!("\n## Document {}", i + 1));
        if let Some(kind) = doc.get("@type").and_then(Value::as_str) {
            report.push_str(&format!(" ({})", kind));
        }
        report.push('\n');
        report.push_str(&pretty(doc));
        report.push('\n');
    }
    report
}

/// Property fields with the value entered so far, in table order
pub fn render_property_form(properties: &PropertyTable, values: &PopulatedProperties) -> String {
    let mut report = String::new();
    for (name, description) in properties {
        let label = field_label(name, description);
        match values.get(name) {
            Some(value) => report.push_str(&format!("  {} {}\n", label, value)),
            None => report.push_str(&format!("  {}\n", label)),
        }
    }
    report
}

pub fn render_composition(composition: &Composition) -> String {
    let mut report = String::new();
    if let Some(doc) = composition.generated() {
        report.push_str("# New JSON-LD generated:\n");
        report.push_str(&pretty(doc));
        report.push('\n');
    }
    if let Composition::Merged(docs) = composition {
        report.push_str("\n# Merged JSON-LD:\n");
        report.push_str(&pretty(&Value::Array(docs.clone())));
        report.push('\n');
    }
    report
}

/// Where the session stands
pub fn render_summary(session: &Session) -> String {
    let mut report = String::new();
    report.push_str(RULE);
    report.push_str("\n\n# Session:\n");
    report.push_str(&format!("  Stage: {}\n", session.stage().as_str()));
    report.push_str(&format!("  URL: {}\n", session.url().unwrap_or("-")));
    report.push_str(&format!("  Documents found: {}\n", session.documents().len()));
    report.push_str(&format!(
        "  Selection mode: {}\n",
        session.config().selection.as_str()
    ));
    report.push_str(&format!(
        "  Key precedence: {}\n",
        session.config().precedence.as_str()
    ));
    report.push_str(&format!(
        "  Vocabulary: {}\n",
        session
            .vocabulary()
            .map(ToString::to_string)
            .unwrap_or_else(|| "-".to_string())
    ));
    report.push_str(&format!(
        "  Properties: {}\n",
        session
            .properties()
            .map(|p| p.len().to_string())
            .unwrap_or_else(|| "-".to_string())
    ));
    report.push_str(&format!("  Values entered: {}\n", session.values().len()));
    if let Some(path) = session.saved_to() {
        report.push_str(&format!("  Saved to: {}\n", path.display()));
    }
    report.push('\n');
    report.push_str(RULE);
    report.push('\n');
    report
}
