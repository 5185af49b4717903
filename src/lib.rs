//! MathScript: lexer, parser, tree-walking interpreter, and the handful of
//! global builtins a program starts with.

pub mod ast;
pub mod builtins;
pub mod config;
pub mod env;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod numeric;
pub mod parser;
pub mod position;
pub mod token;
pub mod value;

use bigdecimal::BigDecimal;
use env::{Context, Environment};
use error::MathScriptError;
use interpreter::{Flow, Interpreter};
use lexer::Lexer;
use num_traits::FromPrimitive;
use parser::Parser;
use std::rc::Rc;
use value::Value;

/// Builds the global scope every run starts with: the nine builtins plus
/// the handful of well-known constants (`true`/`false`/`null`/`none`/
/// `undefined`/`version`/`pi`/`e`/`inf`/`nan`).
pub fn global_environment() -> Rc<Environment> {
    let env = Environment::new();
    builtins::register(&env);

    env.define("true".to_string(), Value::Boolean(true));
    env.define("false".to_string(), Value::Boolean(false));
    env.define("null".to_string(), Value::Null(value::NullKind::Null));
    env.define("none".to_string(), Value::Null(value::NullKind::None));
    env.define("undefined".to_string(), Value::Null(value::NullKind::Undefined));
    env.define("version".to_string(), Value::String(config::version_string()));

    let pi = numeric::decimal::round_to_precision(&BigDecimal::from_f64(std::f64::consts::PI).unwrap());
    let e = numeric::decimal::round_to_precision(&BigDecimal::from_f64(std::f64::consts::E).unwrap());
    env.define("pi".to_string(), Value::Decimal(numeric::decimal::Decimal::Finite(pi)));
    env.define("e".to_string(), Value::Decimal(numeric::decimal::Decimal::Finite(e)));
    env.define("inf".to_string(), Value::Decimal(numeric::decimal::Decimal::infinity()));
    env.define("nan".to_string(), Value::Decimal(numeric::decimal::Decimal::nan()));

    env
}

/// Lexes, parses and evaluates `source`. Returns the last statement's value
/// alongside any error; a program that errors partway through still reports
/// whatever value was produced by the statements that ran.
pub fn run(filename: &str, source: &str) -> (Option<Value>, Option<MathScriptError>) {
    run_in(filename, source, global_environment(), Context::root("<program>"))
}

/// Like [`run`], but evaluates in a caller-supplied environment and call
/// context — used by the REPL, which keeps one environment across lines.
pub fn run_in(filename: &str, source: &str, env: Rc<Environment>, context: Rc<Context>) -> (Option<Value>, Option<MathScriptError>) {
    let (statements, error) = run_in_statements(filename, source, env, context);
    (statements.map(|mut v| v.pop().unwrap_or_else(Value::null)), error)
}

/// Like [`run_in`], but keeps every top-level statement's value instead of
/// collapsing to the last one — the REPL echoes each non-null entry on its
/// own line.
pub fn run_in_statements(filename: &str, source: &str, env: Rc<Environment>, context: Rc<Context>) -> (Option<Vec<Value>>, Option<MathScriptError>) {
    let tokens = match Lexer::new(filename, source).make_tokens() {
        Ok(tokens) => tokens,
        Err(e) => return (None, Some(MathScriptError::from(e))),
    };

    let ast = match Parser::new(tokens).parse() {
        Ok(ast) => ast,
        Err(e) => return (None, Some(MathScriptError::from(e))),
    };

    let interpreter = Interpreter::new();
    match interpreter.run(&ast, env, context) {
        Ok(Flow::Value(Value::List(statements))) => (Some(statements), None),
        Ok(Flow::Value(v)) | Ok(Flow::Return(v)) => (Some(vec![v]), None),
        Ok(Flow::Continue) | Ok(Flow::Break) => (Some(vec![Value::null()]), None),
        Err(e) => (None, Some(MathScriptError::from(e))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn arithmetic_and_print_round_trip() {
        let (value, error) = run("<test>", "print(1 + 2 * 3)");
        assert!(error.is_none());
        assert!(value.is_some());
    }

    #[test]
    fn undefined_variable_is_a_runtime_error() {
        let (_, error) = run("<test>", "missing_name");
        assert!(error.is_some());
    }

    #[test]
    fn global_constants_are_present() {
        let env = global_environment();
        assert_eq!(env.get("true"), Some(Value::Boolean(true)));
        assert!(env.get("pi").is_some());
    }
}
