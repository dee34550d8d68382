//! now() function - returns the current time

use crate::model::Value;
use chrono::Utc;

/// Current time as Unix epoch seconds; arguments are ignored
pub fn now(_args: &[Value]) -> anyhow::Result<Value> {
    Ok(Value::Integer(Utc::now().timestamp()))
}
