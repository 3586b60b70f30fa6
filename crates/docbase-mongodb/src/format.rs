//! Reading documents from JSON text and rendering them for the terminal

use bson::{Bson, Document as BsonDocument};
use docbase_common::{DocbaseError, Result};
use std::fmt;
use std::io::Write;
use std::str::FromStr;

/// How documents are written to stdout
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// Indented relaxed extended JSON
    #[default]
    Pretty,
    /// One compact relaxed extended JSON document per line
    Json,
    /// BSON's own `Display` form, e.g. `{ "username": "smith" }`
    Debug,
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputFormat::Pretty => write!(f, "pretty"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Debug => write!(f, "debug"),
        }
    }
}

impl FromStr for OutputFormat {
    type Err = DocbaseError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(OutputFormat::Pretty),
            "json" | "jsonl" => Ok(OutputFormat::Json),
            "debug" | "bson" => Ok(OutputFormat::Debug),
            _ => Err(DocbaseError::Validation(format!(
                "Unknown output format: {}. Use 'pretty', 'json' or 'debug'.",
                s
            ))),
        }
    }
}

/// Render one document in the given format, without a trailing newline
pub fn render_document(doc: &BsonDocument, format: OutputFormat) -> Result<String> {
    let rendered = match format {
        OutputFormat::Pretty => {
            let json = Bson::Document(doc.clone()).into_relaxed_extjson();
            serde_json::to_string_pretty(&json)?
        }
        OutputFormat::Json => {
            let json = Bson::Document(doc.clone()).into_relaxed_extjson();
            serde_json::to_string(&json)?
        }
        OutputFormat::Debug => doc.to_string(),
    };
    Ok(rendered)
}

/// Write each document on its own line(s)
pub fn write_documents<W: Write>(
    out: &mut W,
    docs: &[BsonDocument],
    format: OutputFormat,
) -> Result<()> {
    for doc in docs {
        let rendered = render_document(doc, format)?;
        writeln!(out, "{}", rendered)
            .map_err(|e| DocbaseError::Internal(format!("Failed to write output: {}", e)))?;
    }
    Ok(())
}

/// Parse a JSON object (extended JSON allowed, e.g. `{"$oid": "..."}`) into a document
///
/// # Errors
/// `Deserialization` for malformed JSON, `Validation` when the value is not an object
pub fn parse_document(text: &str) -> Result<BsonDocument> {
    let value: serde_json::Value = serde_json::from_str(text)
        .map_err(|e| DocbaseError::Deserialization(format!("Invalid JSON '{}': {}", text, e)))?;

    if !value.is_object() {
        return Err(DocbaseError::Validation(format!(
            "Expected a JSON object, got: {}",
            text
        )));
    }

    match Bson::try_from(value)? {
        Bson::Document(doc) => Ok(doc),
        other => Err(DocbaseError::Validation(format!(
            "Expected a document, got {:?}",
            other.element_type()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::{doc, oid::ObjectId};

    #[test]
    fn test_output_format_parse() {
        assert_eq!("pretty".parse::<OutputFormat>().unwrap(), OutputFormat::Pretty);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("bson".parse::<OutputFormat>().unwrap(), OutputFormat::Debug);
        assert!("yaml".parse::<OutputFormat>().is_err());
    }

    #[test]
    fn test_output_format_display_roundtrips_through_parse() {
        for format in [OutputFormat::Pretty, OutputFormat::Json, OutputFormat::Debug] {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_render_json_is_single_line() {
        let rendered = render_document(&doc! { "username": "smith" }, OutputFormat::Json).unwrap();
        assert_eq!(rendered, r#"{"username":"smith"}"#);
    }

    #[test]
    fn test_render_pretty_uses_extended_json_for_object_id() {
        let id = ObjectId::parse_str("507f1f77bcf86cd799439011").unwrap();
        let user = doc! { "_id": id, "username": "jones" };
        let rendered = render_document(&user, OutputFormat::Pretty).unwrap();
        assert!(rendered.contains("\"$oid\": \"507f1f77bcf86cd799439011\""));
        assert!(rendered.contains("\"username\": \"jones\""));
        assert!(rendered.contains('\n'));
    }

    #[test]
    fn test_render_debug() {
        let rendered = render_document(&doc! { "username": "smith" }, OutputFormat::Debug).unwrap();
        assert_eq!(rendered, r#"{ "username": "smith" }"#);
    }

    #[test]
    fn test_write_documents_one_per_line() {
        let docs = vec![doc! { "username": "smith" }, doc! { "username": "jones" }];
        let mut out = Vec::new();
        write_documents(&mut out, &docs, OutputFormat::Json).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text, "{\"username\":\"smith\"}\n{\"username\":\"jones\"}\n");
    }

    #[test]
    fn test_parse_document_plain() {
        let doc = parse_document(r#"{"username": "smith", "age": 42}"#).unwrap();
        assert_eq!(doc.get_str("username").unwrap(), "smith");
        assert_eq!(doc.get_i32("age").unwrap(), 42);
    }

    #[test]
    fn test_parse_document_extended_json() {
        let doc = parse_document(r#"{"_id": {"$oid": "507f1f77bcf86cd799439011"}}"#).unwrap();
        assert_eq!(
            doc.get_object_id("_id").unwrap().to_hex(),
            "507f1f77bcf86cd799439011"
        );
    }

    #[test]
    fn test_parse_document_empty_object() {
        assert!(parse_document("{}").unwrap().is_empty());
    }

    #[test]
    fn test_parse_document_rejects_non_object() {
        assert!(matches!(
            parse_document("[1, 2]"),
            Err(DocbaseError::Validation(_))
        ));
        assert!(matches!(
            parse_document("{username: smith}"),
            Err(DocbaseError::Deserialization(_))
        ));
    }
}
