//! Lexical scoping: a symbol-table chain (`Environment`) plus a call-stack
//! chain (`Context`) used to build runtime-error tracebacks.

use crate::position::Position;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// A chain of symbol tables. `get`/`set` walk up through `parent`; `define`
/// always writes into the innermost table. Closures share the defining
/// scope's `Rc`, so later writes to an outer variable are visible to a
/// function that captured it before the write happened.
#[derive(Debug)]
pub struct Environment {
    bindings: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    pub fn new() -> Rc<Environment> {
        Rc::new(Environment { bindings: RefCell::new(HashMap::new()), parent: None })
    }

    pub fn with_parent(parent: Rc<Environment>) -> Rc<Environment> {
        Rc::new(Environment { bindings: RefCell::new(HashMap::new()), parent: Some(parent) })
    }

    pub fn define(&self, name: String, value: Value) {
        self.bindings.borrow_mut().insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.bindings.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|p| p.get(name))
    }

    /// Updates an existing binding in the nearest scope that defines it;
    /// returns `false` if `name` is undefined anywhere in the chain.
    pub fn set(&self, name: &str, value: Value) -> bool {
        if self.bindings.borrow().contains_key(name) {
            self.bindings.borrow_mut().insert(name.to_string(), value);
            return true;
        }
        match &self.parent {
            Some(p) => p.set(name, value),
            None => false,
        }
    }
}

/// A call-stack frame: a human-readable name, the position of the call
/// site, and the caller's context. Used only for traceback rendering; the
/// actual variable lookups go through `Environment`.
#[derive(Debug)]
pub struct Context {
    pub display_name: String,
    pub parent: Option<Rc<Context>>,
    pub parent_entry_pos: Option<Position>,
}

impl Context {
    pub fn root(display_name: impl Into<String>) -> Rc<Context> {
        Rc::new(Context { display_name: display_name.into(), parent: None, parent_entry_pos: None })
    }

    pub fn child(
        display_name: impl Into<String>,
        parent: Rc<Context>,
        parent_entry_pos: Option<Position>,
    ) -> Rc<Context> {
        Rc::new(Context { display_name: display_name.into(), parent: Some(parent), parent_entry_pos })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn define_and_get() {
        let env = Environment::new();
        env.define("x".to_string(), Value::boolean(true));
        assert!(env.get("x").is_some());
    }

    #[test]
    fn undefined_symbol_is_none() {
        let env = Environment::new();
        assert!(env.get("missing").is_none());
    }

    #[test]
    fn shadowing_does_not_affect_parent() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::boolean(true));
        let child = Environment::with_parent(parent.clone());
        child.define("x".to_string(), Value::boolean(false));
        assert_eq!(child.get("x"), Some(Value::boolean(false)));
        assert_eq!(parent.get("x"), Some(Value::boolean(true)));
    }

    #[test]
    fn parent_lookup_crosses_scopes() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::boolean(true));
        let child = Environment::with_parent(parent);
        assert!(child.get("x").is_some());
    }

    #[test]
    fn set_walks_up_to_the_defining_scope() {
        let parent = Environment::new();
        parent.define("x".to_string(), Value::boolean(true));
        let child = Environment::with_parent(parent.clone());
        assert!(child.set("x", Value::boolean(false)));
        assert_eq!(parent.get("x"), Some(Value::boolean(false)));
        assert!(!child.set("never_defined", Value::boolean(true)));
    }
}
