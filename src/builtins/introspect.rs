//! `type` and `length`.

use crate::value::Value;

pub fn type_of(positional: &[Value]) -> Result<Value, String> {
    let value = positional.first().ok_or_else(|| "type() requires one argument".to_string())?;
    Ok(Value::String(value.type_name().to_string()))
}

pub fn length(positional: &[Value]) -> Result<Value, String> {
    let value = positional.first().ok_or_else(|| "length() requires one argument".to_string())?;
    value
        .length()
        .map(Value::integer)
        .ok_or_else(|| format!("object of type '{}' has no length", value.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn type_of_reports_the_runtime_type_name() {
        assert_eq!(type_of(&[Value::integer(1)]).unwrap(), Value::String("Integer".to_string()));
    }

    #[test]
    fn length_of_a_string_counts_characters() {
        assert_eq!(length(&[Value::String("hi".to_string())]).unwrap(), Value::integer(2));
    }

    #[test]
    fn length_of_a_non_sized_value_is_an_error() {
        assert!(length(&[Value::integer(1)]).is_err());
    }
}
