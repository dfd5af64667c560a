//! Fragments shared by the modules' OpenAPI documents.

use serde_json::{json, Value};

pub fn error_response(description: &str) -> Value {
    json!({
        "description": description,
        "content": {
            "application/json": { "schema": { "$ref": "#/components/schemas/ErrorResponse" } }
        }
    })
}

pub fn page_parameters() -> Value {
    json!([
        { "name": "page", "in": "query", "required": false, "schema": { "type": "integer", "minimum": 0, "default": 0 } },
        { "name": "size", "in": "query", "required": false, "schema": { "type": "integer", "minimum": 1, "default": 10 } }
    ])
}

/// `{items, index, size, total}` over `#/components/schemas/{item}`.
pub fn page_schema(item: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "items": { "type": "array", "items": { "$ref": format!("#/components/schemas/{item}") } },
            "index": { "type": "integer", "minimum": 0 },
            "size": { "type": "integer", "minimum": 1 },
            "total": { "type": "integer", "minimum": 0 }
        },
        "required": ["items", "index", "size", "total"]
    })
}
