use crate::error::{AnalyticsError, Result};
use crate::schema::AccountRecord;
use log::{debug, warn};
use serde_json::{Map, Value};

pub const DEFAULT_CARD_NAME: &str = "Unknown Card";
pub const DEFAULT_ISSUER: &str = "Unknown Issuer";
pub const DEFAULT_ACCOUNT_NUMBER: &str = "****";
pub const DEFAULT_OPEN_DATE: &str = "Unknown";
pub const DEFAULT_STATUS: &str = "Unknown";
pub const DEFAULT_ACCOUNT_TYPE: &str = "Credit Card";

/// Turns the extraction model's raw answer into account records.
///
/// The answer should be a JSON array of card objects, optionally wrapped in a
/// ```` ```json ```` fence. Anything that is not valid JSON or not an array yields an empty
/// list. Individual elements that fail [`parse_extracted_record`] are skipped.
pub fn parse_extraction_response(text: &str) -> Vec<AccountRecord> {
    let cleaned = strip_json_fence(text);

    let items = match serde_json::from_str::<Value>(&cleaned) {
        Ok(Value::Array(items)) => items,
        Ok(other) => {
            warn!(
                "Extraction response is a JSON {}, expected an array; no cards extracted",
                json_kind(&other)
            );
            return Vec::new();
        }
        Err(e) => {
            warn!("Extraction response is not valid JSON: {}", e);
            return Vec::new();
        }
    };

    let total = items.len();
    let records: Vec<AccountRecord> = items
        .iter()
        .enumerate()
        .filter_map(|(idx, item)| match parse_extracted_record(item) {
            Ok(record) => Some(record),
            Err(e) => {
                warn!("Skipping extracted card #{}: {}", idx, e);
                None
            }
        })
        .collect();

    debug!("Extracted {} of {} candidate cards", records.len(), total);
    records
}

/// Validates one extracted card object and fills in the ingestion defaults.
pub fn parse_extracted_record(item: &Value) -> Result<AccountRecord> {
    let obj = item.as_object().ok_or_else(|| {
        AnalyticsError::ExtractionFailed(format!("expected an object, got {}", json_kind(item)))
    })?;

    Ok(AccountRecord {
        card_name: Some(text_field(obj, "card_name", DEFAULT_CARD_NAME)?),
        issuer: Some(text_field(obj, "issuer", DEFAULT_ISSUER)?),
        account_number: Some(text_field(obj, "account_number", DEFAULT_ACCOUNT_NUMBER)?),
        open_date: Some(text_field(obj, "open_date", DEFAULT_OPEN_DATE)?),
        status: Some(text_field(obj, "status", DEFAULT_STATUS)?),
        credit_limit: amount_field(obj, "credit_limit", None)?,
        current_balance: amount_field(obj, "current_balance", None)?,
        annual_fee: amount_field(obj, "annual_fee", Some(0.0))?,
        account_type: Some(DEFAULT_ACCOUNT_TYPE.to_string()),
    })
}

fn strip_json_fence(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.starts_with("```json") {
        trimmed
            .replace("```json", "")
            .replace("```", "")
            .trim()
            .to_string()
    } else {
        trimmed.to_string()
    }
}

/// Absent keys take the default; `null` and non-scalar values are rejected.
fn text_field(obj: &Map<String, Value>, key: &str, default: &str) -> Result<String> {
    match obj.get(key) {
        None => Ok(default.to_string()),
        Some(Value::String(s)) => Ok(s.clone()),
        Some(Value::Number(n)) => Ok(n.to_string()),
        Some(other) => Err(AnalyticsError::ExtractionFailed(format!(
            "field '{}' must be text, got {}",
            key,
            json_kind(other)
        ))),
    }
}

/// Absent keys take the default, `null` means no amount, numeric strings are accepted.
fn amount_field(obj: &Map<String, Value>, key: &str, default: Option<f64>) -> Result<Option<f64>> {
    let value = match obj.get(key) {
        None => return Ok(default),
        Some(Value::Null) => return Ok(None),
        Some(Value::Number(n)) => n.as_f64(),
        Some(Value::String(s)) => s.trim().parse::<f64>().ok(),
        Some(_) => None,
    };

    match value {
        Some(v) if v.is_finite() => Ok(Some(v)),
        _ => Err(AnalyticsError::ExtractionFailed(format!(
            "field '{}' is not a valid amount: {}",
            key, obj[key]
        ))),
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
