// Tests for text rendering

use ldsmith_core::compose::{Composition, PopulatedProperties};
use ldsmith_core::config::Config;
use ldsmith_core::report::{
    field_label, render_composition, render_documents, render_property_form, render_summary,
};
use ldsmith_core::session::Session;
use ldsmith_scanner::PropertyTable;
use serde_json::json;

#[test]
fn test_field_label() {
    assert_eq!(
        field_label("name", "The name of the item."),
        "name (The name of the item.):"
    );
}

#[test]
fn test_render_documents() {
    let report = render_documents(&[
        json!({"@type": "Event", "name": "Talk"}),
        json!({"name": "untyped"}),
    ]);

    assert!(report.contains("JSON-LD data found: 2"));
    assert!(report.contains("## Document 1 (Event)"));
    assert!(report.contains("## Document 2\n"));
    assert!(report.contains("\"name\": \"Talk\""));
}

#[test]
fn test_render_no_documents() {
    assert!(render_documents(&[]).contains("No JSON-LD data found"));
}

#[test]
fn test_render_property_form_shows_entered_values() {
    let mut table = PropertyTable::new();
    table.insert("name".to_string(), "The name.".to_string());
    table.insert("sku".to_string(), "The SKU.".to_string());
    let mut values = PopulatedProperties::new();
    values.insert("sku".to_string(), "W-1".to_string());

    let form = render_property_form(&table, &values);

    assert_eq!(form, "  name (The name.):\n  sku (The SKU.): W-1\n");
}

#[test]
fn test_render_merged_composition() {
    let composition = Composition::Merged(vec![json!({"@type": "Organization"}), json!({"@type": "Product"})]);

    let report = render_composition(&composition);

    assert!(report.contains("# New JSON-LD generated:"));
    assert!(report.contains("# Merged JSON-LD:"));
}

#[test]
fn test_render_summary_of_fresh_session() {
    let session = Session::new(Config::default());

    let report = render_summary(&session);

    assert!(report.contains("Stage: idle"));
    assert!(report.contains("URL: -"));
    assert!(report.contains("Selection mode: index"));
}
