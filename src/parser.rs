//! Recursive-descent parser with precedence climbing, matching the grammar
//! tightest-to-loosest: atom, call, power, factor, term, arith, comp, expr.
//!
//! Backtracking (e.g. the identifier-lookahead in `expr`, or the optional
//! trailing statement in `statements`) is done by snapshotting and
//! restoring the token index directly, rather than counting advances the
//! way a rewindable monad would — the token stream is a plain `Vec`, so
//! random-access rewind is simpler than bookkeeping a counter.

use crate::ast::{BinOpKind, Node, NodeKind, Param, UnaryOpKind};
use crate::error::ParseError;
use crate::token::{Keyword, Token, TokenKind};

pub struct Parser {
    tokens: Vec<Token>,
    index: usize,
}

type NodeResult = Result<Node, ParseError>;

impl Parser {
    pub fn new(tokens: Vec<Token>) -> Self {
        Parser { tokens, index: 0 }
    }

    pub fn parse(&mut self) -> NodeResult {
        let result = self.statements()?;
        if !matches!(self.current().kind, TokenKind::Eof) {
            return Err(invalid_syntax(
                self.current(),
                "Expected '+', '-', '*', '/', '^', '==', '!=', '<', '>', '<=', '>=', 'and' or 'or'",
            ));
        }
        Ok(result)
    }

    fn current(&self) -> &Token {
        &self.tokens[self.index.min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) {
        if self.index < self.tokens.len() - 1 {
            self.index += 1;
        }
    }

    fn checkpoint(&self) -> usize {
        self.index
    }

    fn restore(&mut self, cp: usize) {
        self.index = cp;
    }

    fn expect_advance(&mut self, kind: &TokenKind, expected: &str) -> Result<(), ParseError> {
        if &self.current().kind == kind {
            self.advance();
            Ok(())
        } else {
            Err(invalid_syntax(self.current(), expected))
        }
    }

    fn expect_keyword(&mut self, kw: Keyword, expected: &str) -> Result<(), ParseError> {
        if self.current().matches_keyword(kw) {
            self.advance();
            Ok(())
        } else {
            Err(invalid_syntax(self.current(), expected))
        }
    }

    // ---- statements / statement ----

    fn statements(&mut self) -> NodeResult {
        let pos_start = self.current().pos_start.clone();
        let mut items = Vec::new();

        while matches!(self.current().kind, TokenKind::Newline) {
            self.advance();
        }

        items.push(self.statement()?);

        loop {
            let mut newline_count = 0;
            while matches!(self.current().kind, TokenKind::Newline) {
                self.advance();
                newline_count += 1;
            }
            if newline_count == 0 {
                break;
            }
            let cp = self.checkpoint();
            match self.statement() {
                Ok(node) => items.push(node),
                Err(_) => {
                    self.restore(cp);
                    break;
                }
            }
        }

        let pos_end = self.current().pos_end.clone();
        Ok(Node::new(NodeKind::List(items), pos_start, pos_end))
    }

    fn statement(&mut self) -> NodeResult {
        let pos_start = self.current().pos_start.clone();

        if self.current().matches_keyword(Keyword::Return) {
            self.advance();
            let cp = self.checkpoint();
            let expr = match self.expr() {
                Ok(n) => Some(Box::new(n)),
                Err(_) => {
                    self.restore(cp);
                    None
                }
            };
            let pos_end = self.current().pos_start.clone();
            return Ok(Node::new(NodeKind::Return(expr), pos_start, pos_end));
        }

        if self.current().matches_keyword(Keyword::Continue) {
            self.advance();
            let pos_end = self.current().pos_start.clone();
            return Ok(Node::new(NodeKind::Continue, pos_start, pos_end));
        }

        if self.current().matches_keyword(Keyword::Break) {
            self.advance();
            let pos_end = self.current().pos_start.clone();
            return Ok(Node::new(NodeKind::Break, pos_start, pos_end));
        }

        self.expr()
    }

    // ---- expr ----

    fn expr(&mut self) -> NodeResult {
        if let TokenKind::Identifier(name) = self.current().kind.clone() {
            let pos_start = self.current().pos_start.clone();
            self.advance();
            if matches!(self.current().kind, TokenKind::Eq) {
                self.advance();
                let value = self.expr()?;
                let pos_end = value.pos_end.clone();
                return Ok(Node::new(NodeKind::VarAssign(name, Box::new(value)), pos_start, pos_end));
            }
            self.index -= 1;
        } else if self.current().matches_keyword(Keyword::Pass) || (matches!(self.current().kind, TokenKind::Eof) && self.tokens.len() == 1) {
            let tok = self.current().clone();
            self.advance();
            return Ok(Node::new(NodeKind::Pass, tok.pos_start, tok.pos_end));
        }

        let ops = [
            (TokenKind::Keyword(Keyword::And), BinOpKind::And),
            (TokenKind::Keyword(Keyword::Or), BinOpKind::Or),
        ];
        self.bin_op(Self::comp_expr, &ops, Self::comp_expr).map_err(|_| {
            invalid_syntax(
                self.current(),
                "Expected 'if', 'for', 'while', 'func', integer, decimal, identifier, '+', '-', '(' or 'not'",
            )
        })
    }

    fn comp_expr(&mut self) -> NodeResult {
        if self.current().matches_keyword(Keyword::Not) {
            let pos_start = self.current().pos_start.clone();
            self.advance();
            let node = self.comp_expr()?;
            let pos_end = node.pos_end.clone();
            return Ok(Node::new(NodeKind::UnaryOp(UnaryOpKind::Not, Box::new(node)), pos_start, pos_end));
        }

        let ops = [
            (TokenKind::EqEq, BinOpKind::Eq),
            (TokenKind::Ne, BinOpKind::Ne),
            (TokenKind::Lt, BinOpKind::Lt),
            (TokenKind::Gt, BinOpKind::Gt),
            (TokenKind::Lte, BinOpKind::Lte),
            (TokenKind::Gte, BinOpKind::Gte),
        ];
        self.bin_op(Self::arith_expr, &ops, Self::arith_expr)
    }

    fn arith_expr(&mut self) -> NodeResult {
        let ops = [(TokenKind::Plus, BinOpKind::Add), (TokenKind::Minus, BinOpKind::Sub)];
        self.bin_op(Self::term, &ops, Self::term)
    }

    fn term(&mut self) -> NodeResult {
        let ops = [(TokenKind::Mul, BinOpKind::Mul), (TokenKind::Div, BinOpKind::Div)];
        self.bin_op(Self::factor, &ops, Self::factor)
    }

    fn factor(&mut self) -> NodeResult {
        let tok = self.current().clone();
        match tok.kind {
            TokenKind::Plus | TokenKind::Minus => {
                self.advance();
                let node = self.factor()?;
                let pos_end = node.pos_end.clone();
                let op = if matches!(tok.kind, TokenKind::Plus) { UnaryOpKind::Plus } else { UnaryOpKind::Minus };
                Ok(Node::new(NodeKind::UnaryOp(op, Box::new(node)), tok.pos_start, pos_end))
            }
            _ => self.power(),
        }
    }

    fn power(&mut self) -> NodeResult {
        let ops = [(TokenKind::Pow, BinOpKind::Pow)];
        self.bin_op(Self::call, &ops, Self::factor)
    }

    fn bin_op(&mut self, left_fn: fn(&mut Self) -> NodeResult, ops: &[(TokenKind, BinOpKind)], right_fn: fn(&mut Self) -> NodeResult) -> NodeResult {
        let mut left = left_fn(self)?;
        loop {
            let matched = ops.iter().find(|(k, _)| &self.current().kind == k).map(|(_, b)| *b);
            let Some(bin_kind) = matched else { break };
            let pos_start = left.pos_start.clone();
            self.advance();
            let right = right_fn(self)?;
            let pos_end = right.pos_end.clone();
            left = Node::new(NodeKind::BinOp(Box::new(left), bin_kind, Box::new(right)), pos_start, pos_end);
        }
        Ok(left)
    }

    // ---- call / atom ----

    fn call(&mut self) -> NodeResult {
        let atom = self.atom()?;

        if matches!(self.current().kind, TokenKind::LParen) {
            let pos_start = atom.pos_start.clone();
            self.advance();
            let mut args = Vec::new();

            if matches!(self.current().kind, TokenKind::RParen) {
                self.advance();
            } else {
                args.push(self.expr().map_err(|_| {
                    invalid_syntax(
                        self.current(),
                        "Expected ')', 'if', 'for', 'while', 'func', integer, decimal, identifier, '+', '-', '(' or 'not'",
                    )
                })?);

                while matches!(self.current().kind, TokenKind::Comma) {
                    self.advance();
                    args.push(self.expr()?);
                }

                self.expect_advance(&TokenKind::RParen, "Expected ',' or ')'")?;
            }

            let pos_end = self.current().pos_start.clone();
            return Ok(Node::new(NodeKind::Call { callee: Box::new(atom), args }, pos_start, pos_end));
        }

        Ok(atom)
    }

    fn atom(&mut self) -> NodeResult {
        let tok = self.current().clone();

        match tok.kind {
            TokenKind::Integer(ref v) => {
                self.advance();
                Ok(Node::new(NodeKind::Integer(v.clone()), tok.pos_start, tok.pos_end))
            }
            TokenKind::Decimal(ref v) => {
                self.advance();
                Ok(Node::new(NodeKind::Decimal(v.clone()), tok.pos_start, tok.pos_end))
            }
            TokenKind::Complex(ref v) => {
                self.advance();
                Ok(Node::new(NodeKind::Complex(v.clone()), tok.pos_start, tok.pos_end))
            }
            TokenKind::String(ref s) => {
                self.advance();
                let node = Node::new(NodeKind::String(s.clone()), tok.pos_start.clone(), tok.pos_end.clone());
                self.maybe_subscript(node, Self::atom)
            }
            TokenKind::RawString(ref s) => {
                self.advance();
                let node = Node::new(NodeKind::RawString(s.clone()), tok.pos_start.clone(), tok.pos_end.clone());
                self.maybe_subscript(node, Self::atom)
            }
            TokenKind::Identifier(ref name) => {
                self.advance();
                Ok(Node::new(NodeKind::VarAccess(name.clone()), tok.pos_start, tok.pos_end))
            }
            TokenKind::LParen => {
                let node = self.list_expr()?;
                self.maybe_subscript(node, Self::list_expr)
            }
            TokenKind::Keyword(Keyword::If) => self.if_expr(),
            TokenKind::Keyword(Keyword::For) => self.for_expr(),
            TokenKind::Keyword(Keyword::While) => self.while_expr(),
            TokenKind::Keyword(Keyword::Func) => self.func_def(),
            _ => Err(invalid_syntax(
                &tok,
                "Expected integer, decimal, identifier, '+', '-', '(', '()', 'if', 'for', 'while' or 'func'",
            )),
        }
    }

    fn maybe_subscript(&mut self, left: Node, right_fn: fn(&mut Self) -> NodeResult) -> NodeResult {
        if matches!(self.current().kind, TokenKind::Subscript) {
            let pos_start = left.pos_start.clone();
            self.advance();
            let right = self.expr()?;
            let pos_end = right.pos_end.clone();
            return Ok(Node::new(NodeKind::BinOp(Box::new(left), BinOpKind::Subscript, Box::new(right)), pos_start, pos_end));
        }
        let _ = right_fn;
        Ok(left)
    }

    fn list_expr(&mut self) -> NodeResult {
        let pos_start = self.current().pos_start.clone();
        self.expect_advance(&TokenKind::LParen, "Expected '('")?;

        if matches!(self.current().kind, TokenKind::RParen) {
            self.advance();
            let pos_end = self.current().pos_end.clone();
            return Ok(Node::new(NodeKind::List(Vec::new()), pos_start, pos_end));
        }

        let mut elements = vec![self.expr().map_err(|_| {
            invalid_syntax(
                self.current(),
                "Expected ')', 'if', 'for', 'while', 'func', integer, decimal, identifier, '+', '-', '(', or 'not'",
            )
        })?];

        if !matches!(self.current().kind, TokenKind::Comma) {
            if matches!(self.current().kind, TokenKind::RParen) {
                self.advance();
                return Ok(elements.pop().unwrap());
            }
            return Err(invalid_syntax(self.current(), "Expected ')' or ','"));
        }

        while matches!(self.current().kind, TokenKind::Comma) {
            self.advance();
            if matches!(self.current().kind, TokenKind::RParen) {
                break;
            }
            elements.push(self.expr()?);
        }

        self.expect_advance(&TokenKind::RParen, "Expected ',' or ')'")?;
        let pos_end = self.current().pos_end.clone();
        Ok(Node::new(NodeKind::List(elements), pos_start, pos_end))
    }

    // ---- if / for / while / func ----

    fn if_expr(&mut self) -> NodeResult {
        let (cases, else_case) = self.if_expr_cases(Keyword::If)?;
        let pos_start = cases[0].0.pos_start.clone();
        let pos_end = else_case
            .as_ref()
            .map(|(n, _): &(Box<Node>, bool)| n.pos_end.clone())
            .unwrap_or_else(|| cases.last().unwrap().1.pos_end.clone());
        Ok(Node::new(NodeKind::If { cases, else_case }, pos_start, pos_end))
    }

    fn if_expr_cases(&mut self, case_keyword: Keyword) -> Result<(Vec<(Node, Node, bool)>, Option<(Box<Node>, bool)>), ParseError> {
        let mut cases = Vec::new();
        self.expect_keyword(case_keyword, "Expected 'if'")?;

        let condition = self.expr()?;
        self.expect_keyword(Keyword::Then, "Expected 'then'")?;

        let else_case;
        if matches!(self.current().kind, TokenKind::Newline) {
            self.advance();
            let body = self.statements()?;
            cases.push((condition, body, true));

            if self.current().matches_keyword(Keyword::End) {
                self.advance();
                else_case = None;
            } else {
                let (more, else_branch) = self.elif_or_else()?;
                cases.extend(more);
                else_case = else_branch;
            }
        } else {
            let body = self.statement()?;
            cases.push((condition, body, false));
            let (more, else_branch) = self.elif_or_else()?;
            cases.extend(more);
            else_case = else_branch;
        }

        Ok((cases, else_case))
    }

    fn elif_or_else(&mut self) -> Result<(Vec<(Node, Node, bool)>, Option<(Box<Node>, bool)>), ParseError> {
        if self.current().matches_keyword(Keyword::Elif) {
            self.if_expr_cases(Keyword::Elif)
        } else {
            Ok((Vec::new(), self.else_expr()?))
        }
    }

    fn else_expr(&mut self) -> Result<Option<(Box<Node>, bool)>, ParseError> {
        if !self.current().matches_keyword(Keyword::Else) {
            return Ok(None);
        }
        self.advance();

        if matches!(self.current().kind, TokenKind::Newline) {
            self.advance();
            let body = self.statements()?;
            self.expect_keyword(Keyword::End, "Expected 'end'")?;
            Ok(Some((Box::new(body), true)))
        } else {
            let body = self.statement()?;
            Ok(Some((Box::new(body), false)))
        }
    }

    fn for_expr(&mut self) -> NodeResult {
        let pos_start = self.current().pos_start.clone();
        self.expect_keyword(Keyword::For, "Expected 'for'")?;

        let var_name = match self.current().kind.clone() {
            TokenKind::Identifier(name) => {
                self.advance();
                name
            }
            _ => return Err(invalid_syntax(self.current(), "Expected identifier")),
        };

        self.expect_advance(&TokenKind::Eq, "Expected '='")?;
        let start = self.expr()?;
        self.expect_keyword(Keyword::To, "Expected 'to'")?;
        let end = self.expr()?;

        let step = if self.current().matches_keyword(Keyword::Step) {
            self.advance();
            Some(Box::new(self.expr()?))
        } else {
            None
        };

        self.expect_keyword(Keyword::Then, "Expected 'then'")?;

        if matches!(self.current().kind, TokenKind::Newline) {
            self.advance();
            let body = self.statements()?;
            self.expect_keyword(Keyword::End, "Expected 'end'")?;
            let pos_end = self.current().pos_end.clone();
            return Ok(Node::new(
                NodeKind::For { var_name, start: Box::new(start), end: Box::new(end), step, body: Box::new(body), should_return_null: true },
                pos_start,
                pos_end,
            ));
        }

        let body = self.statement()?;
        let pos_end = body.pos_end.clone();
        Ok(Node::new(
            NodeKind::For { var_name, start: Box::new(start), end: Box::new(end), step, body: Box::new(body), should_return_null: false },
            pos_start,
            pos_end,
        ))
    }

    fn while_expr(&mut self) -> NodeResult {
        let pos_start = self.current().pos_start.clone();
        self.expect_keyword(Keyword::While, "Expected 'while'")?;
        let condition = self.expr()?;
        self.expect_keyword(Keyword::Then, "Expected 'then'")?;

        if matches!(self.current().kind, TokenKind::Newline) {
            self.advance();
            let body = self.statements()?;
            self.expect_keyword(Keyword::End, "Expected 'end'")?;
            let pos_end = self.current().pos_end.clone();
            return Ok(Node::new(NodeKind::While { condition: Box::new(condition), body: Box::new(body), should_return_null: true }, pos_start, pos_end));
        }

        let body = self.statement()?;
        let pos_end = body.pos_end.clone();
        Ok(Node::new(NodeKind::While { condition: Box::new(condition), body: Box::new(body), should_return_null: false }, pos_start, pos_end))
    }

    fn func_def(&mut self) -> NodeResult {
        let pos_start = self.current().pos_start.clone();
        self.expect_keyword(Keyword::Func, "Expected 'func'")?;

        let name = match self.current().kind.clone() {
            TokenKind::Identifier(n) => {
                self.advance();
                Some(n)
            }
            _ => None,
        };

        self.expect_advance(&TokenKind::LParen, if name.is_some() { "Expected '('" } else { "Expected identifier or '('" })?;

        let mut params = Vec::new();
        if let TokenKind::Identifier(_) = self.current().kind.clone() {
            params.push(self.param()?);
            while matches!(self.current().kind, TokenKind::Comma) {
                self.advance();
                params.push(self.param()?);
            }
        }

        self.expect_advance(&TokenKind::RParen, "Expected identifier or ')'")?;

        if matches!(self.current().kind, TokenKind::Arrow) {
            self.advance();
            let body = self.expr()?;
            let pos_end = body.pos_end.clone();
            return Ok(Node::new(NodeKind::FuncDef { name, params, body: Box::new(body), should_auto_return: true }, pos_start, pos_end));
        }

        self.expect_advance(&TokenKind::Newline, "Expected '=>', ';' or new line")?;
        let body = self.statements()?;
        self.expect_keyword(Keyword::End, "Expected 'end'")?;
        let pos_end = self.current().pos_end.clone();
        Ok(Node::new(NodeKind::FuncDef { name, params, body: Box::new(body), should_auto_return: false }, pos_start, pos_end))
    }

    fn param(&mut self) -> Result<Param, ParseError> {
        let name = match self.current().kind.clone() {
            TokenKind::Identifier(n) => {
                self.advance();
                n
            }
            _ => return Err(invalid_syntax(self.current(), "Expected identifier")),
        };

        if matches!(self.current().kind, TokenKind::Eq) {
            self.advance();
            let default = self.expr()?;
            Ok(Param::Defaulted(name, default))
        } else {
            Ok(Param::Positional(name))
        }
    }
}

fn invalid_syntax(tok: &Token, details: &str) -> ParseError {
    ParseError::InvalidSyntax { details: details.to_string(), pos_start: tok.pos_start.clone(), pos_end: tok.pos_end.clone() }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;

    fn parse(src: &str) -> NodeResult {
        let tokens = Lexer::new("<test>", src).make_tokens().unwrap();
        Parser::new(tokens).parse()
    }

    #[test]
    fn arithmetic_precedence() {
        let node = parse("1 + 2 * 3").unwrap();
        match node.kind {
            NodeKind::List(stmts) => assert_eq!(stmts.len(), 1),
            other => panic!("expected List, got {other:?}"),
        }
    }

    #[test]
    fn assignment_parses_as_var_assign() {
        let node = parse("x = 1").unwrap();
        if let NodeKind::List(stmts) = node.kind {
            assert!(matches!(stmts[0].kind, NodeKind::VarAssign(_, _)));
        } else {
            panic!("expected List");
        }
    }

    #[test]
    fn if_then_single_statement() {
        let node = parse("if 1 then 2 else 3").unwrap();
        if let NodeKind::List(stmts) = node.kind {
            assert!(matches!(stmts[0].kind, NodeKind::If { .. }));
        } else {
            panic!("expected List");
        }
    }

    #[test]
    fn for_loop_block_form() {
        let node = parse("for i = 0 to 3 then\nprint(i)\nend").unwrap();
        if let NodeKind::List(stmts) = node.kind {
            assert!(matches!(stmts[0].kind, NodeKind::For { .. }));
        } else {
            panic!("expected List");
        }
    }

    #[test]
    fn func_def_auto_return() {
        let node = parse("func f(n) => n").unwrap();
        if let NodeKind::List(stmts) = node.kind {
            match &stmts[0].kind {
                NodeKind::FuncDef { should_auto_return, .. } => assert!(should_auto_return),
                other => panic!("expected FuncDef, got {other:?}"),
            }
        } else {
            panic!("expected List");
        }
    }

    #[test]
    fn call_with_named_argument() {
        let node = parse("print(1, sep=\",\")").unwrap();
        if let NodeKind::List(stmts) = node.kind {
            match &stmts[0].kind {
                NodeKind::Call { args, .. } => {
                    assert_eq!(args.len(), 2);
                    assert!(matches!(args[1].kind, NodeKind::VarAssign(_, _)));
                }
                other => panic!("expected Call, got {other:?}"),
            }
        } else {
            panic!("expected List");
        }
    }

    #[test]
    fn empty_tuple_is_empty_list_node() {
        let node = parse("()").unwrap();
        if let NodeKind::List(stmts) = node.kind {
            assert!(matches!(stmts[0].kind, NodeKind::List(ref v) if v.is_empty()));
        } else {
            panic!("expected List");
        }
    }

    #[test]
    fn parenthesized_single_expr_is_grouping_not_list() {
        let node = parse("(1 + 2)").unwrap();
        if let NodeKind::List(stmts) = node.kind {
            assert!(matches!(stmts[0].kind, NodeKind::BinOp(_, BinOpKind::Add, _)));
        } else {
            panic!("expected List");
        }
    }
}
