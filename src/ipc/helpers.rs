use super::error::HandlerErr;
use crate::attendance;
use crate::reassign;
use serde_json::Value;

pub fn get_required_str(params: &Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .ok_or_else(|| HandlerErr::bad_params(format!("missing {}", key)))
}

pub fn get_optional_str(params: &Value, key: &str) -> Option<String> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Integer param within `min..=max`; numeric strings are accepted.
pub fn get_required_int_in(params: &Value, key: &str, min: i64, max: i64) -> Result<i64, HandlerErr> {
    let value = match params.get(key) {
        Some(Value::Number(n)) => n.as_i64(),
        Some(Value::String(s)) => s.trim().parse::<i64>().ok(),
        _ => return Err(HandlerErr::bad_params(format!("missing {}", key))),
    };
    value
        .filter(|v| (min..=max).contains(v))
        .ok_or_else(|| {
            HandlerErr::bad_params(format!("{} must be a number between {} and {}", key, min, max))
        })
}

pub fn get_required_grade(params: &Value, key: &str) -> Result<i64, HandlerErr> {
    get_required_int_in(params, key, reassign::MIN_GRADE, reassign::MAX_GRADE)
}

/// Validates a YYYY-MM-DD string and returns it normalized.
pub fn check_date(raw: &str) -> Result<String, HandlerErr> {
    attendance::parse_date(raw)
        .map(|d| d.format(attendance::DATE_FORMAT).to_string())
        .ok_or_else(|| HandlerErr::bad_params("date must be YYYY-MM-DD"))
}

/// `date` param as YYYY-MM-DD, defaulting to today.
pub fn get_date(params: &Value) -> Result<String, HandlerErr> {
    match get_optional_str(params, "date") {
        Some(raw) => check_date(&raw),
        None => Ok(attendance::today()),
    }
}

/// Reads CSV text either inline (`csvText`) or from a file (`inPath`, decoded lossily).
pub fn read_csv_input(params: &Value) -> Result<(String, Option<String>), HandlerErr> {
    if let Some(text) = params.get("csvText").and_then(|v| v.as_str()) {
        return Ok((text.to_string(), None));
    }
    let in_path = get_optional_str(params, "inPath")
        .ok_or_else(|| HandlerErr::bad_params("missing csvText or inPath"))?;
    let bytes = std::fs::read(&in_path).map_err(|e| {
        HandlerErr::new("io_failed", e.to_string()).with_details(serde_json::json!({ "path": in_path }))
    })?;
    // Invalid UTF-8 sequences become U+FFFD instead of failing the read.
    let text = String::from_utf8_lossy(&bytes).into_owned();
    Ok((text, Some(in_path)))
}
