use crate::error::{Result, ScanError};
use crate::result::PropertyTable;
use scraper::{ElementRef, Html, Selector};
use serde_json::Value;
use tracing::debug;

/// Node kind marking a class definition in the registry graph
pub const CLASS_NODE_TYPE: &str = "rdfs:Class";

/// Read the class names out of the registry's JSON-LD index.
///
/// Keeps `@graph` nodes whose `@type` is (or contains) `rdfs:Class`, in
/// source order, with the namespace prefix stripped from their `@id`.
pub fn parse_vocabulary_index(index: &Value) -> Vec<String> {
    let Some(graph) = index.get("@graph").and_then(Value::as_array) else {
        debug!("Vocabulary index has no @graph array");
        return Vec::new();
    };

    graph
        .iter()
        .filter(|node| is_class_node(node))
        .filter_map(|node| node.get("@id").and_then(Value::as_str))
        .map(strip_namespace)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

fn is_class_node(node: &Value) -> bool {
    match node.get("@type") {
        Some(Value::String(kind)) => kind == CLASS_NODE_TYPE,
        Some(Value::Array(kinds)) => kinds
            .iter()
            .any(|kind| kind.as_str() == Some(CLASS_NODE_TYPE)),
        _ => false,
    }
}

/// `schema:Product` -> `Product`, `https://schema.org/Product` -> `Product`
pub fn strip_namespace(id: &str) -> &str {
    id.rsplit([':', '/', '#']).next().unwrap_or(id)
}

/// Read the `definition-table` of a registry type page into a [`PropertyTable`].
///
/// Returns [`ScanError::NoPropertiesTable`] when the page has no such table.
/// Rows with fewer than two `td` cells are skipped; a repeated property name
/// overwrites the earlier description.
pub fn parse_property_table(html: &str, vocabulary: &str) -> Result<PropertyTable> {
    let document = Html::parse_document(html);
    let table_selector = selector("table.definition-table")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| ScanError::NoPropertiesTable(vocabulary.to_string()))?;

    let mut properties = PropertyTable::new();
    for row in table.select(&row_selector) {
        let cells: Vec<ElementRef> = row.select(&cell_selector).collect();
        if cells.len() < 2 {
            continue;
        }

        let name = cell_text(&cells[0]);
        if name.is_empty() {
            continue;
        }
        let description = cell_text(&cells[1]);
        properties.insert(name, description);
    }

    debug!("Parsed {} properties for {}", properties.len(), vocabulary);
    Ok(properties)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| ScanError::ParseError(e.to_string()))
}

fn cell_text(cell: &ElementRef) -> String {
    let text: String = cell.text().collect();
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
