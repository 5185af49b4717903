//! The abstract syntax tree the parser builds and the interpreter walks.

use crate::numeric::complex::Complex;
use crate::position::Position;
use bigdecimal::BigDecimal;
use num_bigint::BigInt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOpKind {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Subscript,
    Eq,
    Ne,
    Lt,
    Gt,
    Lte,
    Gte,
    And,
    Or,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOpKind {
    Plus,
    Minus,
    Not,
}

/// A function parameter: either plain, or with a default expression
/// evaluated once, at definition time, in the defining scope.
#[derive(Debug, Clone)]
pub enum Param {
    Positional(String),
    Defaulted(String, Node),
}

impl Param {
    pub fn name(&self) -> &str {
        match self {
            Param::Positional(n) => n,
            Param::Defaulted(n, _) => n,
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Integer(BigInt),
    Decimal(BigDecimal),
    Complex(Complex),
    String(String),
    RawString(String),
    List(Vec<Node>),
    Pass,
    VarAccess(String),
    VarAssign(String, Box<Node>),
    BinOp(Box<Node>, BinOpKind, Box<Node>),
    UnaryOp(UnaryOpKind, Box<Node>),
    If {
        cases: Vec<(Node, Node, bool)>,
        else_case: Option<(Box<Node>, bool)>,
    },
    For {
        var_name: String,
        start: Box<Node>,
        end: Box<Node>,
        step: Option<Box<Node>>,
        body: Box<Node>,
        should_return_null: bool,
    },
    While {
        condition: Box<Node>,
        body: Box<Node>,
        should_return_null: bool,
    },
    FuncDef {
        name: Option<String>,
        params: Vec<Param>,
        body: Box<Node>,
        should_auto_return: bool,
    },
    /// Each argument is either a plain expression (positional) or a
    /// `VarAssign` node (`name = expr`, a named/optional parameter) —
    /// `expr`'s own identifier-lookahead already produces the latter, so no
    /// separate argument representation is needed here.
    Call {
        callee: Box<Node>,
        args: Vec<Node>,
    },
    Return(Option<Box<Node>>),
    Continue,
    Break,
}

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub pos_start: Position,
    pub pos_end: Position,
}

impl Node {
    pub fn new(kind: NodeKind, pos_start: Position, pos_end: Position) -> Self {
        Node { kind, pos_start, pos_end }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::rc::Rc;

    fn pos() -> Position {
        Position::start(Rc::from("<test>"), Rc::from(""))
    }

    #[test]
    fn param_name_works_for_both_variants() {
        let plain = Param::Positional("x".to_string());
        let defaulted = Param::Defaulted("y".to_string(), Node::new(NodeKind::Pass, pos(), pos()));
        assert_eq!(plain.name(), "x");
        assert_eq!(defaulted.name(), "y");
    }
}
