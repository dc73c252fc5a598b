use super::ast::Document;

/// Serialize a document to a pretty-printed JSON string.
pub fn to_pretty_json(doc: &Document) -> String {
    serde_json::to_string_pretty(doc).expect("Document serialization cannot fail")
}

/// Serialize a document to compact single-line JSON.
pub fn to_json(doc: &Document) -> String {
    serde_json::to_string(doc).expect("Document serialization cannot fail")
}
