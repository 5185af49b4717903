//! Tree-walking evaluator. Every node visit produces a `Flow`, which carries
//! either a plain value or one of the three control signals (`return`,
//! `continue`, `break`) up through the recursion without relying on panics
//! or native exceptions.

use crate::ast::{BinOpKind, Node, NodeKind, Param, UnaryOpKind};
use crate::env::{Context, Environment};
use crate::error::RuntimeError;
use crate::position::Position;
use crate::numeric::decimal::Decimal;
use crate::value::{FunctionData, Value};
use std::rc::Rc;

/// The result of visiting a node: either a value, or a control signal that
/// must propagate to the nearest construct able to consume it (a loop for
/// `Continue`/`Break`, a function call for `Return`).
#[derive(Debug, Clone)]
pub enum Flow {
    Value(Value),
    Return(Value),
    Continue,
    Break,
}

impl Flow {
    fn into_value(self) -> Value {
        match self {
            Flow::Value(v) | Flow::Return(v) => v,
            Flow::Continue | Flow::Break => Value::null(),
        }
    }
}

/// Unwraps a `Flow` into its `Value`, propagating any control signal out of
/// the enclosing function by returning early with `Ok(flow)`.
macro_rules! value_of {
    ($flow:expr) => {
        match $flow {
            Flow::Value(v) => v,
            other => return Ok(other),
        }
    };
}

pub struct Interpreter;

impl Interpreter {
    pub fn new() -> Self {
        Interpreter
    }

    pub fn run(&self, node: &Node, env: Rc<Environment>, context: Rc<Context>) -> Result<Flow, RuntimeError> {
        self.visit(node, env, context)
    }

    fn visit(&self, node: &Node, env: Rc<Environment>, context: Rc<Context>) -> Result<Flow, RuntimeError> {
        match &node.kind {
            NodeKind::Integer(v) => Ok(Flow::Value(Value::Integer(v.clone()))),
            NodeKind::Decimal(v) => Ok(Flow::Value(Value::Decimal(Decimal::Finite(v.clone())))),
            NodeKind::Complex(v) => Ok(Flow::Value(Value::Complex(v.clone()))),
            NodeKind::String(s) => Ok(Flow::Value(Value::String(s.clone()))),
            NodeKind::RawString(s) => Ok(Flow::Value(Value::String(s.clone()))),
            NodeKind::Pass => Ok(Flow::Value(Value::null())),
            NodeKind::List(items) => self.visit_list(items, env, context),
            NodeKind::VarAccess(name) => self.visit_var_access(name, &node.pos_start, &node.pos_end, env, context),
            NodeKind::VarAssign(name, value_node) => self.visit_var_assign(name, value_node, env, context),
            NodeKind::BinOp(left, op, right) => self.visit_bin_op(left, *op, right, &node.pos_start, &node.pos_end, env, context),
            NodeKind::UnaryOp(op, operand) => self.visit_unary_op(*op, operand, &node.pos_start, &node.pos_end, env, context),
            NodeKind::If { cases, else_case } => self.visit_if(cases, else_case, env, context),
            NodeKind::For { var_name, start, end, step, body, should_return_null } => {
                self.visit_for(var_name, start, end, step.as_deref(), body, *should_return_null, &node.pos_start, &node.pos_end, env, context)
            }
            NodeKind::While { condition, body, should_return_null } => {
                self.visit_while(condition, body, *should_return_null, env, context)
            }
            NodeKind::FuncDef { name, params, body, should_auto_return } => {
                self.visit_func_def(name, params, body, *should_auto_return, &node.pos_start, &node.pos_end, env, context)
            }
            NodeKind::Call { callee, args } => self.visit_call(callee, args, &node.pos_start, &node.pos_end, env, context),
            NodeKind::Return(value_node) => self.visit_return(value_node.as_deref(), env, context),
            NodeKind::Continue => Ok(Flow::Continue),
            NodeKind::Break => Ok(Flow::Break),
        }
    }

    fn visit_list(&self, items: &[Node], env: Rc<Environment>, context: Rc<Context>) -> Result<Flow, RuntimeError> {
        let mut values = Vec::with_capacity(items.len());
        for item in items {
            let flow = self.visit(item, env.clone(), context.clone())?;
            match flow {
                Flow::Value(v) => values.push(v),
                other => return Ok(other),
            }
        }
        Ok(Flow::Value(Value::List(values)))
    }

    fn visit_var_access(&self, name: &str, pos_start: &Position, pos_end: &Position, env: Rc<Environment>, context: Rc<Context>) -> Result<Flow, RuntimeError> {
        match env.get(name) {
            Some(v) => Ok(Flow::Value(v)),
            None => Err(RuntimeError::new(format!("'{name}' is not defined"), pos_start.clone(), pos_end.clone(), context)),
        }
    }

    fn visit_var_assign(&self, name: &str, value_node: &Node, env: Rc<Environment>, context: Rc<Context>) -> Result<Flow, RuntimeError> {
        let flow = self.visit(value_node, env.clone(), context)?;
        let value = value_of!(flow);
        env.define(name.to_string(), value.clone());
        Ok(Flow::Value(value))
    }

    fn visit_bin_op(
        &self,
        left: &Node,
        op: BinOpKind,
        right: &Node,
        pos_start: &Position,
        pos_end: &Position,
        env: Rc<Environment>,
        context: Rc<Context>,
    ) -> Result<Flow, RuntimeError> {
        let left_flow = self.visit(left, env.clone(), context.clone())?;
        let left_value = value_of!(left_flow);
        let right_flow = self.visit(right, env, context.clone())?;
        let right_value = value_of!(right_flow);

        let result = match op {
            BinOpKind::Add => left_value.add(&right_value),
            BinOpKind::Sub => left_value.sub(&right_value),
            BinOpKind::Mul => left_value.mul(&right_value),
            BinOpKind::Div => left_value.div(&right_value),
            BinOpKind::Pow => left_value.pow(&right_value),
            BinOpKind::Subscript => left_value.subscript(&right_value),
            BinOpKind::Eq => Ok(left_value.eq_value(&right_value)),
            BinOpKind::Ne => Ok(left_value.ne_value(&right_value)),
            BinOpKind::Lt => left_value.lt(&right_value),
            BinOpKind::Gt => left_value.gt(&right_value),
            BinOpKind::Lte => left_value.lte(&right_value),
            BinOpKind::Gte => left_value.gte(&right_value),
            BinOpKind::And => Ok(left_value.and(&right_value)),
            BinOpKind::Or => Ok(left_value.or(&right_value)),
        };

        result
            .map(Flow::Value)
            .map_err(|e| RuntimeError::new(e.message(), pos_start.clone(), pos_end.clone(), context))
    }

    fn visit_unary_op(
        &self,
        op: UnaryOpKind,
        operand: &Node,
        pos_start: &Position,
        pos_end: &Position,
        env: Rc<Environment>,
        context: Rc<Context>,
    ) -> Result<Flow, RuntimeError> {
        let flow = self.visit(operand, env, context.clone())?;
        let value = value_of!(flow);

        let result = match op {
            UnaryOpKind::Plus => Ok(value),
            UnaryOpKind::Minus => value.negate(),
            UnaryOpKind::Not => Ok(value.not()),
        };

        result
            .map(Flow::Value)
            .map_err(|e| RuntimeError::new(e.message(), pos_start.clone(), pos_end.clone(), context))
    }

    fn visit_if(&self, cases: &[(Node, Node, bool)], else_case: &Option<(Box<Node>, bool)>, env: Rc<Environment>, context: Rc<Context>) -> Result<Flow, RuntimeError> {
        for (condition, body, should_return_null) in cases {
            let cond_flow = self.visit(condition, env.clone(), context.clone())?;
            let condition_value = value_of!(cond_flow);
            if condition_value.is_true() {
                let body_flow = self.visit(body, env, context)?;
                return Ok(self.null_if(body_flow, *should_return_null));
            }
        }

        if let Some((body, should_return_null)) = else_case {
            let body_flow = self.visit(body, env, context)?;
            return Ok(self.null_if(body_flow, *should_return_null));
        }

        Ok(Flow::Value(Value::null()))
    }

    fn null_if(&self, flow: Flow, should_return_null: bool) -> Flow {
        match flow {
            Flow::Value(_) if should_return_null => Flow::Value(Value::null()),
            other => other,
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_for(
        &self,
        var_name: &str,
        start: &Node,
        end: &Node,
        step: Option<&Node>,
        body: &Node,
        should_return_null: bool,
        pos_start: &Position,
        pos_end: &Position,
        env: Rc<Environment>,
        context: Rc<Context>,
    ) -> Result<Flow, RuntimeError> {
        let start_flow = self.visit(start, env.clone(), context.clone())?;
        let start_value = value_of!(start_flow);
        let end_flow = self.visit(end, env.clone(), context.clone())?;
        let end_value = value_of!(end_flow);
        let step_value = match step {
            Some(step_node) => {
                let flow = self.visit(step_node, env.clone(), context.clone())?;
                value_of!(flow)
            }
            None => Value::integer(1),
        };

        if !step_value.is_true() {
            return Err(RuntimeError::new("Step value cannot be zero", pos_start.clone(), pos_end.clone(), context));
        }

        let mut current = start_value;
        let step_is_negative = !step_value.gte(&Value::integer(0)).map_err(|e| RuntimeError::new(e.message(), pos_start.clone(), pos_end.clone(), context.clone()))?.is_true();

        let mut elements = Vec::new();
        loop {
            let keep_going = if step_is_negative {
                current.gt(&end_value)
            } else {
                current.lt(&end_value)
            }
            .map_err(|e| RuntimeError::new(e.message(), pos_start.clone(), pos_end.clone(), context.clone()))?
            .is_true();

            if !keep_going {
                break;
            }

            env.define(var_name.to_string(), current.clone());
            let body_flow = self.visit(body, env.clone(), context.clone())?;

            match body_flow {
                Flow::Continue => {}
                Flow::Break => break,
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Value(v) => elements.push(v),
            }

            current = current.add(&step_value).map_err(|e| RuntimeError::new(e.message(), pos_start.clone(), pos_end.clone(), context.clone()))?;
        }

        if should_return_null {
            Ok(Flow::Value(Value::null()))
        } else {
            Ok(Flow::Value(Value::List(elements)))
        }
    }

    fn visit_while(&self, condition: &Node, body: &Node, should_return_null: bool, env: Rc<Environment>, context: Rc<Context>) -> Result<Flow, RuntimeError> {
        let mut elements = Vec::new();
        loop {
            let cond_flow = self.visit(condition, env.clone(), context.clone())?;
            let condition_value = value_of!(cond_flow);
            if !condition_value.is_true() {
                break;
            }

            let body_flow = self.visit(body, env.clone(), context.clone())?;
            match body_flow {
                Flow::Continue => {}
                Flow::Break => break,
                Flow::Return(v) => return Ok(Flow::Return(v)),
                Flow::Value(v) => elements.push(v),
            }
        }

        if should_return_null {
            Ok(Flow::Value(Value::null()))
        } else {
            Ok(Flow::Value(Value::List(elements)))
        }
    }

    #[allow(clippy::too_many_arguments)]
    fn visit_func_def(
        &self,
        name: &Option<String>,
        params: &[Param],
        body: &Node,
        should_auto_return: bool,
        pos_start: &Position,
        pos_end: &Position,
        env: Rc<Environment>,
        context: Rc<Context>,
    ) -> Result<Flow, RuntimeError> {
        let mut defaults = Vec::with_capacity(params.len());
        for param in params {
            match param {
                Param::Positional(_) => defaults.push(None),
                Param::Defaulted(_, default_node) => {
                    let flow = self.visit(default_node, env.clone(), context.clone())?;
                    let value = value_of!(flow);
                    defaults.push(Some(value));
                }
            }
        }

        let _ = (pos_start, pos_end);
        let data = FunctionData {
            name: name.clone(),
            params: params.to_vec(),
            defaults,
            body: body.clone(),
            should_auto_return,
            closure: env.clone(),
            context: context.clone(),
        };
        let value = Value::Function(Rc::new(data));

        if let Some(n) = name {
            env.define(n.clone(), value.clone());
        }

        Ok(Flow::Value(value))
    }

    fn visit_call(&self, callee: &Node, args: &[Node], pos_start: &Position, pos_end: &Position, env: Rc<Environment>, context: Rc<Context>) -> Result<Flow, RuntimeError> {
        let callee_flow = self.visit(callee, env.clone(), context.clone())?;
        let callee_value = value_of!(callee_flow);

        let mut positional = Vec::new();
        let mut named = Vec::new();
        for arg in args {
            match &arg.kind {
                NodeKind::VarAssign(arg_name, value_node) => {
                    let flow = self.visit(value_node, env.clone(), context.clone())?;
                    let value = value_of!(flow);
                    named.push((arg_name.clone(), value));
                }
                _ => {
                    let flow = self.visit(arg, env.clone(), context.clone())?;
                    let value = value_of!(flow);
                    positional.push(value);
                }
            }
        }

        match callee_value {
            Value::Function(data) => self.call_function(&data, positional, named, pos_start, pos_end, context),
            Value::BuiltIn(name) => crate::builtins::call(&name, positional, named, env, &context)
                .map(Flow::Value)
                .map_err(|e| RuntimeError::new(e, pos_start.clone(), pos_end.clone(), context)),
            other => Err(RuntimeError::new(format!("'{}' is not callable", other.type_name()), pos_start.clone(), pos_end.clone(), context)),
        }
    }

    fn call_function(
        &self,
        data: &Rc<FunctionData>,
        mut positional: Vec<Value>,
        named: Vec<(String, Value)>,
        pos_start: &Position,
        pos_end: &Position,
        caller_context: Rc<Context>,
    ) -> Result<Flow, RuntimeError> {
        if positional.len() > data.params.len() {
            let extra = positional.len() - data.params.len();
            let label = data.name.as_deref().unwrap_or("<anonymous>");
            return Err(RuntimeError::new(
                format!("{extra} too many args passed into '{label}'"),
                pos_start.clone(),
                pos_end.clone(),
                caller_context,
            ));
        }

        let call_env = Environment::with_parent(data.closure.clone());
        let display_name = data.name.clone().unwrap_or_else(|| "<anonymous>".to_string());
        let call_context = Context::child(display_name.clone(), caller_context.clone(), Some(pos_start.clone()));

        positional.reverse();
        let mut resolved: Vec<Option<Value>> = Vec::with_capacity(data.params.len());
        for (i, param) in data.params.iter().enumerate() {
            let value = if let Some(v) = positional.pop() {
                Some(v)
            } else if let Some((_, v)) = named.iter().find(|(n, _)| n == param.name()) {
                Some(v.clone())
            } else {
                data.defaults[i].clone()
            };
            resolved.push(value);
        }

        let missing = resolved.iter().filter(|v| v.is_none()).count();
        if missing > 0 {
            let label = data.name.as_deref().unwrap_or("<anonymous>");
            return Err(RuntimeError::new(
                format!("{missing} too few args passed into '{label}'"),
                pos_start.clone(),
                pos_end.clone(),
                caller_context,
            ));
        }

        for (param, value) in data.params.iter().zip(resolved) {
            call_env.define(param.name().to_string(), value.unwrap());
        }

        let body_flow = self.visit(&data.body, call_env, call_context)?;

        let return_value = if data.should_auto_return {
            body_flow.into_value()
        } else {
            match body_flow {
                Flow::Return(v) => v,
                Flow::Value(_) => Value::null(),
                Flow::Continue | Flow::Break => Value::null(),
            }
        };

        Ok(Flow::Value(return_value))
    }

    fn visit_return(&self, value_node: Option<&Node>, env: Rc<Environment>, context: Rc<Context>) -> Result<Flow, RuntimeError> {
        match value_node {
            Some(n) => {
                let flow = self.visit(n, env, context)?;
                let value = value_of!(flow);
                Ok(Flow::Return(value))
            }
            None => Ok(Flow::Return(Value::null())),
        }
    }
}

impl Default for Interpreter {
    fn default() -> Self {
        Interpreter::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    fn eval(src: &str) -> Value {
        let tokens = Lexer::new("<test>", src).make_tokens().unwrap();
        let ast = Parser::new(tokens).parse().unwrap();
        let env = Environment::new();
        crate::builtins::register(&env);
        let context = Context::root("<program>");
        let interpreter = Interpreter::new();
        match interpreter.run(&ast, env, context).unwrap() {
            Flow::Value(Value::List(mut items)) => items.pop().unwrap_or(Value::null()),
            Flow::Value(v) => v,
            _ => Value::null(),
        }
    }

    #[test]
    fn arithmetic_precedence_is_honored() {
        assert_eq!(eval("1 + 2 * 3"), Value::integer(7));
    }

    #[test]
    fn variable_assignment_and_access() {
        assert_eq!(eval("x = 5\nx"), Value::integer(5));
    }

    #[test]
    fn for_loop_accumulates_with_step() {
        let result = eval("total = 0\nfor i = 0 to 5 then total = total + i\ntotal");
        assert_eq!(result, Value::integer(10));
    }

    #[test]
    fn recursive_function_call() {
        let result = eval("func fact(n) => if n < 2 then 1 else n * fact(n - 1)\nfact(5)");
        assert_eq!(result, Value::integer(120));
    }

    #[test]
    fn closures_see_later_writes_to_captured_variables() {
        let result = eval("x = 1\nfunc f() => x\nx = 2\nf()");
        assert_eq!(result, Value::integer(2));
    }

    #[test]
    fn default_parameter_is_used_when_omitted() {
        let result = eval("func greet(name=\"world\") => name\ngreet()");
        assert_eq!(result, Value::String("world".to_string()));
    }

    #[test]
    fn break_stops_a_while_loop_early() {
        let result = eval("n = 0\nwhile true then\nn = n + 1\nif n == 3 then break\nend\nn");
        assert_eq!(result, Value::integer(3));
    }
}
