#![forbid(unsafe_code)]

//! Caller-supplied modal props.
//!
//! Props live in the store as an open-ended key/value map so the store stays
//! independent of each handle's prop type. Typed props are converted on the
//! way in with [`to_props`] and parsed back on the way out by the renderer.

use serde::Serialize;
use serde_json::{Map, Value};

/// Key used when a prop type serializes to something other than an object.
pub const SCALAR_PROPS_KEY: &str = "value";

/// Open-ended prop mapping stored with each modal instance.
pub type Props = Map<String, Value>;

/// Convert typed props into the store representation.
///
/// - objects become the prop map as-is;
/// - `null` (e.g. `()` or `None`) means no props;
/// - any other value is kept under [`SCALAR_PROPS_KEY`] with a warning;
/// - a serialization failure is logged and treated as no props.
pub fn to_props<P: Serialize + ?Sized>(props: &P) -> Option<Props> {
    match serde_json::to_value(props) {
        Ok(Value::Object(map)) => Some(map),
        Ok(Value::Null) => None,
        Ok(other) => {
            tracing::warn!(
                kind = value_kind(&other),
                key = SCALAR_PROPS_KEY,
                "modal props are not a key/value object; wrapping"
            );
            let mut map = Props::new();
            map.insert(SCALAR_PROPS_KEY.to_owned(), other);
            Some(map)
        }
        Err(err) => {
            tracing::warn!(error = %err, "failed to serialize modal props; opening without props");
            None
        }
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
