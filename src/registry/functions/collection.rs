//! len(x) function - returns the number of elements, characters or entries

use crate::model::{ObjectKind, Value};

/// Element count of a sequence or map, character count of a string, else 0
///
/// Called without arguments it also yields 0.
pub fn len(args: &[Value]) -> anyhow::Result<Value> {
    let count = match args.first() {
        Some(Value::String(s)) => s.chars().count(),
        Some(value @ Value::Object(_)) if value.object_kind() != Some(ObjectKind::Record) => {
            value.as_object().and_then(|object| object.len()).unwrap_or_default()
        }
        _ => 0,
    };
    Ok(Value::Integer(count as i64))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ToValue;
    use std::collections::HashMap;

    #[test]
    fn test_len_counts() {
        assert_eq!(len(&[]).unwrap(), Value::Integer(0));
        assert_eq!(len(&[Value::from("héllo")]).unwrap(), Value::Integer(5));
        assert_eq!(len(&[vec![1, 2, 3].to_value()]).unwrap(), Value::Integer(3));

        let map: HashMap<String, i64> = HashMap::from([("a".to_string(), 1)]);
        assert_eq!(len(&[map.to_value()]).unwrap(), Value::Integer(1));
    }

    #[test]
    fn test_len_of_scalars_is_zero() {
        assert_eq!(len(&[Value::Integer(12)]).unwrap(), Value::Integer(0));
        assert_eq!(len(&[Value::Nil]).unwrap(), Value::Integer(0));
    }
}
