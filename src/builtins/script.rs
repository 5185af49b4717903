//! `exec`, which loads and runs another source file (or, when the argument
//! isn't a file that exists, the argument itself as inline source) in the
//! caller's own environment so the definitions it makes are visible
//! afterwards.

use crate::env::{Context, Environment};
use crate::error::MathScriptError;
use crate::interpreter::{Flow, Interpreter};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::value::Value;
use std::rc::Rc;

/// The display name used when `exec`'s argument is run as inline source
/// rather than loaded from a file.
const INLINE_SOURCE_NAME: &str = "<code>";

pub fn exec(positional: &[Value], env: Rc<Environment>, context: &Rc<Context>) -> Result<Value, String> {
    let argument = match positional.first() {
        Some(Value::String(s)) => s.clone(),
        Some(other) => return Err(format!("exec() requires a String argument, got {}", other.type_name())),
        None => return Err("exec() requires one argument".to_string()),
    };

    let (filename, source) = if std::fs::metadata(&argument).is_ok() {
        let source = std::fs::read_to_string(&argument).map_err(|e| format!("Script \"{argument}\" could not be read: {e}"))?;
        (argument.clone(), source)
    } else {
        (INLINE_SOURCE_NAME.to_string(), argument)
    };

    let tokens = Lexer::new(&filename, &source).make_tokens().map_err(|e| MathScriptError::from(e).as_string())?;
    let ast = Parser::new(tokens).parse().map_err(|e| MathScriptError::from(e).as_string())?;

    let exec_context = Context::child(filename, context.clone(), None);
    let interpreter = Interpreter::new();
    let flow = interpreter.run(&ast, env, exec_context).map_err(|e| MathScriptError::from(e).as_string())?;

    Ok(match flow {
        Flow::Value(v) => v,
        _ => Value::null(),
    })
}
