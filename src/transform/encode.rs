//! JSON encoding

use crate::error::Result;
use crate::types::JsonObject;

/// Encode records as a JSON array indented by two spaces
///
/// Non-ASCII characters are written as UTF-8, not `\u` escapes.
pub fn encode_records(records: &[JsonObject]) -> Result<Vec<u8>> {
    Ok(serde_json::to_vec_pretty(records)?)
}
