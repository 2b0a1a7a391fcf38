// Tests for document composition and merging

use ldsmith_core::compose::{
    Composition, PopulatedProperties, compose, compose_document, merge_documents,
};
use ldsmith_core::config::KeyPrecedence;
use ldsmith_core::vocab::VocabularyName;
use serde_json::{Value, json};

fn name(raw: &str) -> VocabularyName {
    VocabularyName::parse(raw).unwrap()
}

fn values(pairs: &[(&str, &str)]) -> PopulatedProperties {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

// ============================================================================
// Generated document
// ============================================================================

#[test]
fn test_compose_product_with_name() {
    let doc = compose_document(
        &name("Product"),
        &values(&[("name", "Widget")]),
        KeyPrecedence::Reserved,
    );

    assert_eq!(
        doc,
        json!({"@context": "https://schema.org", "@type": "Product", "name": "Widget"})
    );
}

#[test]
fn test_compose_empty_values_has_only_reserved_keys() {
    let doc = compose_document(
        &name("Event"),
        &PopulatedProperties::new(),
        KeyPrecedence::Reserved,
    );

    let object = doc.as_object().unwrap();
    assert_eq!(object.len(), 2);
    assert_eq!(object["@context"], "https://schema.org");
    assert_eq!(object["@type"], "Event");
}

#[test]
fn test_reserved_keys_always_win() {
    let doc = compose_document(
        &name("Product"),
        &values(&[
            ("@type", "Hijacked"),
            ("@context", "https://evil.example"),
            ("name", "Widget"),
        ]),
        KeyPrecedence::Reserved,
    );

    assert_eq!(doc["@context"], "https://schema.org");
    assert_eq!(doc["@type"], "Product");
    assert_eq!(doc["name"], "Widget");
    assert_eq!(doc.as_object().unwrap().len(), 3);
}

#[test]
fn test_user_precedence_overrides_reserved_keys_in_place() {
    let doc = compose_document(
        &name("Product"),
        &values(&[("name", "Widget"), ("@type", "IndividualProduct")]),
        KeyPrecedence::User,
    );

    assert_eq!(doc["@type"], "IndividualProduct");
    assert_eq!(doc["@context"], "https://schema.org");
    let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["@context", "@type", "name"]);
}

#[test]
fn test_reserved_keys_come_first_in_output() {
    let doc = compose_document(
        &name("Product"),
        &values(&[("brand", "Acme"), ("name", "Widget")]),
        KeyPrecedence::Reserved,
    );

    let keys: Vec<&String> = doc.as_object().unwrap().keys().collect();
    assert_eq!(keys, vec!["@context", "@type", "brand", "name"]);
}

#[test]
fn test_blank_values_are_not_emitted() {
    let doc = compose_document(
        &name("Product"),
        &values(&[("name", "Widget"), ("sku", "  ")]),
        KeyPrecedence::User,
    );

    assert!(doc.get("sku").is_none());
}

// ============================================================================
// Merging
// ============================================================================

#[test]
fn test_merge_into_empty_is_singleton() {
    let new_doc = json!({"@type": "Product"});
    let merged = merge_documents(&[], new_doc.clone());

    assert_eq!(merged, vec![new_doc]);
}

#[test]
fn test_merge_appends_last() {
    let existing = vec![json!({"@type": "Organization"}), json!({"@type": "WebSite"})];
    let new_doc = json!({"@type": "Product"});

    let merged = merge_documents(&existing, new_doc.clone());

    assert_eq!(merged.len(), existing.len() + 1);
    assert_eq!(merged[..2], existing[..]);
    assert_eq!(merged.last(), Some(&new_doc));
}

#[test]
fn test_compose_merges_when_page_had_documents() {
    let existing = vec![json!({"@type": "Organization", "name": "Acme"})];

    let composition = compose(
        &name("Product"),
        &values(&[("name", "Widget")]),
        &existing,
        true,
        KeyPrecedence::Reserved,
    );

    match composition {
        Composition::Merged(docs) => {
            assert_eq!(docs.len(), 2);
            assert_eq!(docs[0]["name"], "Acme");
            assert_eq!(docs[1]["@type"], "Product");
        }
        other => panic!("expected merged composition, got {:?}", other),
    }
}

#[test]
fn test_compose_without_page_documents_is_generated_only() {
    let composition = compose(
        &name("Product"),
        &PopulatedProperties::new(),
        &[],
        true,
        KeyPrecedence::Reserved,
    );

    assert!(matches!(composition, Composition::Generated(_)));
}

#[test]
fn test_compose_with_merge_disabled() {
    let existing = vec![json!({"@type": "Organization"})];

    let composition = compose(
        &name("Product"),
        &PopulatedProperties::new(),
        &existing,
        false,
        KeyPrecedence::Reserved,
    );

    assert!(matches!(composition, Composition::Generated(_)));
    assert_eq!(composition.to_value()["@type"], "Product");
}

#[test]
fn test_composition_to_value_shapes() {
    let generated = Composition::Generated(json!({"a": 1}));
    let merged = Composition::Merged(vec![json!({"a": 1}), json!({"b": 2})]);

    assert!(generated.to_value().is_object());
    assert!(matches!(merged.to_value(), Value::Array(ref items) if items.len() == 2));
}
