use serde::{Deserialize, Serialize};

use fld_types::{validate_value, Field, FieldError};

use crate::error::{CodecError, CodecResult};

/// On-disk shape of one record. Key names follow the historical file format;
/// lowercase keys are accepted on read.
#[derive(Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct LineRecord {
    #[serde(alias = "name")]
    name: String,
    #[serde(alias = "value")]
    value: String,
    #[serde(default, alias = "comment")]
    comment: Option<String>,
}

/// Codec between [`Field`] and a single log line.
pub struct FieldCodec;

impl FieldCodec {
    /// Encode a field as one line, without a trailing line terminator.
    pub fn encode(field: &Field) -> CodecResult<String> {
        let record = LineRecord {
            name: field.name.clone(),
            value: field.value.clone(),
            comment: Some(field.comment_str().to_string()),
        };
        let line = serde_json::to_string(&record)
            .map_err(|e| CodecError::Serialization(e.to_string()))?;
        debug_assert!(!line.contains(['\n', '\r']));
        Ok(line)
    }

    /// Decode one line. Surrounding whitespace is ignored.
    ///
    /// Only blank names and values are rejected here; length limits belong to
    /// the store, so a file written under a looser limit still loads.
    pub fn decode(line: &str) -> CodecResult<Field> {
        let record: LineRecord = serde_json::from_str(line.trim())
            .map_err(|e| CodecError::Malformed(e.to_string()))?;

        if record.name.trim().is_empty() {
            return Err(FieldError::EmptyName.into());
        }
        validate_value(&record.name, &record.value)?;

        let comment = record.comment.filter(|c| !c.is_empty());
        Ok(Field {
            name: record.name,
            value: record.value,
            comment,
        })
    }
}
