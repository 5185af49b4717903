//! `print`, `input`, `clear`, `exit`.

use crate::value::Value;
use num_traits::ToPrimitive;
use std::io::Write;

pub fn print(positional: Vec<Value>, named: Vec<(String, Value)>) -> Result<Value, String> {
    let value = super::arg(&positional, &named, 0, "value").unwrap_or_else(Value::null);
    let sep = super::arg(&positional, &named, 1, "sep");
    let end_char = super::arg(&positional, &named, 2, "end_char");

    let end = match &end_char {
        Some(v) if !matches!(v, Value::Null(_)) => v.to_string(),
        _ => "\n".to_string(),
    };

    let rendered = match (&value, &sep) {
        (Value::List(items), Some(sep)) if !matches!(sep, Value::Null(_)) => {
            let sep = sep.to_string();
            items.iter().map(Value::to_string).collect::<Vec<_>>().join(&sep)
        }
        _ => value.to_string(),
    };

    print!("{rendered}{end}");
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    Ok(Value::null())
}

pub fn input(positional: Vec<Value>, named: Vec<(String, Value)>) -> Result<Value, String> {
    if let Some(prompt) = super::arg(&positional, &named, 0, "prompt") {
        print!("{prompt}");
        std::io::stdout().flush().map_err(|e| e.to_string())?;
    }

    let mut line = String::new();
    std::io::stdin().read_line(&mut line).map_err(|e| e.to_string())?;
    if line.ends_with('\n') {
        line.pop();
        if line.ends_with('\r') {
            line.pop();
        }
    }
    Ok(Value::String(line))
}

pub fn clear() -> Result<Value, String> {
    print!("\x1B[2J\x1B[H");
    std::io::stdout().flush().map_err(|e| e.to_string())?;
    Ok(Value::null())
}

pub fn exit(positional: Vec<Value>) -> Result<Value, String> {
    let code = match positional.first() {
        None => 0,
        Some(Value::Integer(i)) => i.to_i32().unwrap_or(0),
        Some(Value::Boolean(b)) => i32::from(*b),
        Some(other) => return Err(format!("exit code must be an Integer, got {}", other.type_name())),
    };
    std::process::exit(code);
}
