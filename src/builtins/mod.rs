//! The nine global functions every program starts with. Each is a
//! `Value::BuiltIn(name)` resolved by name at call time, reading its
//! arguments positionally or by keyword from whatever the call bound —
//! there is no per-builtin function pointer the way plain arithmetic
//! helpers might be wired up, since several of these accept optional
//! keyword-only parameters (`print`'s `sep`/`end`, `input`'s `prompt`).

mod console;
mod introspect;
mod math;
mod script;

use crate::env::{Context, Environment};
use crate::value::Value;
use std::rc::Rc;

pub const NAMES: &[&str] = &["print", "input", "clear", "exit", "type", "sin", "cos", "exec", "length"];

pub fn register(env: &Rc<Environment>) {
    for name in NAMES {
        env.define((*name).to_string(), Value::BuiltIn((*name).to_string()));
    }
}

pub fn call(name: &str, positional: Vec<Value>, named: Vec<(String, Value)>, env: Rc<Environment>, context: &Rc<Context>) -> Result<Value, String> {
    match name {
        "print" => console::print(positional, named),
        "input" => console::input(positional, named),
        "clear" => console::clear(),
        "exit" => console::exit(positional),
        "type" => introspect::type_of(&positional),
        "length" => introspect::length(&positional),
        "sin" => math::sin(&positional, &named),
        "cos" => math::cos(&positional, &named),
        "exec" => script::exec(&positional, env, context),
        _ => Err(format!("'{name}' is not defined")),
    }
}

/// Reads argument `index`/`name` from whichever the call supplied, positional
/// taking precedence.
pub(crate) fn arg(positional: &[Value], named: &[(String, Value)], index: usize, name: &str) -> Option<Value> {
    positional.get(index).cloned().or_else(|| named.iter().find(|(n, _)| n == name).map(|(_, v)| v.clone()))
}
