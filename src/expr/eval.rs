// src/expr/eval.rs

//! Tree-walking evaluator.

use super::ast::{Comprehension, ComprehensionKind, Expr, FStringPart, LogicalOp, Target};
use super::builtins::{CallArgs, call_builtin, call_method, is_builtin};
use super::error::{EvalError, EvalResult};
use super::format::{convert, format_value};
use super::limits::Limits;
use super::ops;
use super::parser::parse;
use super::value::{Value, dedup_values, dict_insert};

/// Everything an expression may observe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EvalContext {
    /// Value of the name `n`.
    pub n: usize,
    pub limits: Limits,
}

impl EvalContext {
    pub fn new(n: usize, limits: Limits) -> Self {
        Self { n, limits }
    }
}

impl Default for EvalContext {
    fn default() -> Self {
        Self::new(1, Limits::default())
    }
}

/// Parse and evaluate `source`.
pub fn evaluate(source: &str, ctx: &EvalContext) -> EvalResult<Value> {
    let expr = parse(source)?;
    Evaluator::new(ctx).eval(&expr)
}

struct Evaluator<'a> {
    ctx: &'a EvalContext,
    /// Comprehension variables, innermost last.
    locals: Vec<(String, Value)>,
    /// Loop iterations performed so far, bounded like materialized length.
    steps: u128,
}

impl<'a> Evaluator<'a> {
    fn new(ctx: &'a EvalContext) -> Self {
        Self {
            ctx,
            locals: Vec::new(),
            steps: 0,
        }
    }

    fn limits(&self) -> &Limits {
        &self.ctx.limits
    }

    fn lookup(&self, name: &str) -> EvalResult<Value> {
        if let Some((_, value)) = self.locals.iter().rev().find(|(k, _)| k == name) {
            return Ok(value.clone());
        }
        if name == "n" {
            return i64::try_from(self.ctx.n)
                .map(Value::Int)
                .map_err(|_| EvalError::Overflow);
        }
        Err(EvalError::Name(name.to_string()))
    }

    fn eval_all(&mut self, exprs: &[Expr]) -> EvalResult<Vec<Value>> {
        exprs.iter().map(|e| self.eval(e)).collect()
    }

    fn eval(&mut self, expr: &Expr) -> EvalResult<Value> {
        match expr {
            Expr::Constant(value) => Ok(value.clone()),
            Expr::Name(name) => self.lookup(name),
            Expr::FString(parts) => self.fstring(parts),
            Expr::List(items) => self.eval_all(items).map(Value::List),
            Expr::Tuple(items) => self.eval_all(items).map(Value::Tuple),
            Expr::Set(items) => {
                let items = self.eval_all(items)?;
                dedup_values(items).map(Value::Set)
            }
            Expr::Dict(entries) => {
                let mut pairs = Vec::with_capacity(entries.len());
                for (key, value) in entries {
                    let key = self.eval(key)?;
                    let value = self.eval(value)?;
                    dict_insert(&mut pairs, key, value)?;
                }
                Ok(Value::Dict(pairs))
            }
            Expr::Comprehension(comp) => self.comprehension(comp),
            Expr::Unary { op, operand } => {
                let value = self.eval(operand)?;
                ops::unary(*op, value)
            }
            Expr::Binary { op, left, right } => {
                let left = self.eval(left)?;
                let right = self.eval(right)?;
                ops::binary(*op, left, right, self.limits())
            }
            Expr::Logical { op, left, right } => {
                let left = self.eval(left)?;
                match (op, left.truthy()) {
                    (LogicalOp::And, false) | (LogicalOp::Or, true) => Ok(left),
                    _ => self.eval(right),
                }
            }
            Expr::Compare { first, rest } => {
                let mut left = self.eval(first)?;
                for (op, right) in rest {
                    let right = self.eval(right)?;
                    if !ops::compare(*op, &left, &right)? {
                        return Ok(Value::Bool(false));
                    }
                    left = right;
                }
                Ok(Value::Bool(true))
            }
            Expr::Conditional {
                condition,
                then,
                otherwise,
            } => {
                if self.eval(condition)?.truthy() {
                    self.eval(then)
                } else {
                    self.eval(otherwise)
                }
            }
            Expr::Call { func, args, kwargs } => self.call(func, args, kwargs),
            Expr::Attribute { value, name } => {
                let value = self.eval(value)?;
                Err(EvalError::type_error(format!(
                    "'{}.{name}' can only be called",
                    value.type_name()
                )))
            }
            Expr::Index { value, index } => {
                let value = self.eval(value)?;
                let index = self.eval(index)?;
                ops::index(&value, &index)
            }
            Expr::Slice {
                value,
                lower,
                upper,
                step,
            } => {
                let value = self.eval(value)?;
                let lower = self.slice_bound(lower.as_deref())?;
                let upper = self.slice_bound(upper.as_deref())?;
                let step = self.slice_bound(step.as_deref())?;
                ops::slice(&value, lower, upper, step)
            }
        }
    }

    fn slice_bound(&mut self, bound: Option<&Expr>) -> EvalResult<Option<i64>> {
        match bound {
            None => Ok(None),
            Some(expr) => match self.eval(expr)? {
                Value::None => Ok(None),
                other => other.as_int("slice indices").map(Some),
            },
        }
    }

    fn fstring(&mut self, parts: &[FStringPart]) -> EvalResult<Value> {
        let mut out = String::new();
        for part in parts {
            match part {
                FStringPart::Literal(text) => out.push_str(text),
                FStringPart::Field {
                    expr,
                    conversion,
                    spec,
                } => {
                    let value = self.eval(expr)?;
                    let conversion = conversion.map(String::from);
                    let converted = convert(&value, conversion.as_deref())?;
                    let rendered =
                        format_value(converted.as_ref().unwrap_or(&value), spec, self.limits())?;
                    out.push_str(&rendered);
                }
            }
            self.limits().check(out.len() as u128)?;
        }
        Ok(Value::Str(out))
    }

    fn call(&mut self, func: &Expr, args: &[Expr], kwargs: &[(String, Expr)]) -> EvalResult<Value> {
        // Resolve the callee before evaluating arguments, as Python does.
        let receiver = match func {
            Expr::Name(name) if self.locals.iter().any(|(k, _)| k == name) || name == "n" => {
                let value = self.lookup(name)?;
                return Err(not_callable(&value));
            }
            Expr::Name(name) if !is_builtin(name) => return Err(EvalError::Name(name.clone())),
            Expr::Name(_) => None,
            Expr::Attribute { value, .. } => Some(self.eval(value)?),
            other => {
                let value = self.eval(other)?;
                return Err(not_callable(&value));
            }
        };

        let positional = self.eval_all(args)?;
        let mut keywords = Vec::with_capacity(kwargs.len());
        for (key, expr) in kwargs {
            if keywords.iter().any(|(k, _): &(String, Value)| k == key) {
                return Err(EvalError::syntax(format!("keyword argument repeated: {key}")));
            }
            keywords.push((key.clone(), self.eval(expr)?));
        }
        let call = CallArgs::new(positional, keywords);

        match (func, receiver) {
            (Expr::Attribute { name, .. }, Some(receiver)) => {
                call_method(&receiver, name, call, self.limits())
            }
            (Expr::Name(name), _) => call_builtin(name, call, self.limits()),
            _ => Err(EvalError::type_error("object is not callable")),
        }
    }

    fn comprehension(&mut self, comp: &Comprehension) -> EvalResult<Value> {
        let mut items = Vec::new();
        let mut pairs = Vec::new();
        let mut cells = 0;
        let depth = self.locals.len();
        let result = self.run_clauses(comp, 0, &mut items, &mut pairs, &mut cells);
        self.locals.truncate(depth);
        result?;

        match comp.kind {
            ComprehensionKind::List | ComprehensionKind::Generator => Ok(Value::List(items)),
            ComprehensionKind::Set => dedup_values(items).map(Value::Set),
            ComprehensionKind::Dict => Ok(Value::Dict(pairs)),
        }
    }

    fn run_clauses(
        &mut self,
        comp: &Comprehension,
        level: usize,
        items: &mut Vec<Value>,
        pairs: &mut Vec<(Value, Value)>,
        cells: &mut u128,
    ) -> EvalResult<()> {
        let Some(clause) = comp.clauses.get(level) else {
            match (&comp.kind, &comp.value) {
                (ComprehensionKind::Dict, Some(value)) => {
                    let key = self.eval(&comp.element)?;
                    let value = self.eval(value)?;
                    *cells += key.weight() + value.weight();
                    dict_insert(pairs, key, value)?;
                }
                _ => {
                    let element = self.eval(&comp.element)?;
                    *cells += element.weight();
                    items.push(element);
                }
            }
            return self.limits().check(*cells);
        };

        let iterable = self.eval(&clause.iter)?;
        'elements: for element in ops::iterate(&iterable, self.limits())? {
            self.steps += 1;
            self.limits().check(self.steps)?;

            let mark = self.locals.len();
            self.bind(&clause.target, element)?;
            for condition in &clause.conditions {
                if !self.eval(condition)?.truthy() {
                    self.locals.truncate(mark);
                    continue 'elements;
                }
            }
            self.run_clauses(comp, level + 1, items, pairs, cells)?;
            self.locals.truncate(mark);
        }
        Ok(())
    }

    fn bind(&mut self, target: &Target, value: Value) -> EvalResult<()> {
        match target {
            Target::Name(name) => {
                self.locals.push((name.clone(), value));
                Ok(())
            }
            Target::Unpack(targets) => {
                let values = ops::iterate(&value, self.limits())?;
                if values.len() != targets.len() {
                    let problem = if values.len() < targets.len() {
                        "not enough"
                    } else {
                        "too many"
                    };
                    return Err(EvalError::value_error(format!(
                        "{problem} values to unpack (expected {})",
                        targets.len()
                    )));
                }
                for (target, value) in targets.iter().zip(values) {
                    self.bind(target, value)?;
                }
                Ok(())
            }
        }
    }
}

fn not_callable(value: &Value) -> EvalError {
    EvalError::type_error(format!("'{}' object is not callable", value.type_name()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eval(source: &str) -> EvalResult<Value> {
        evaluate(source, &EvalContext::default())
    }

    #[test]
    fn comprehension_variables_do_not_leak() {
        assert_eq!(
            eval("[x for x in range(2)] + [x for x in 'ab']").map(|v| v.to_string()),
            Ok("[0, 1, 'a', 'b']".to_string())
        );
        assert_eq!(eval("[x for x in range(2)] and x"), Err(EvalError::Name("x".into())));
    }

    #[test]
    fn nested_loops_are_bounded() {
        let ctx = EvalContext::new(1, Limits::new(100));
        let err = evaluate("[1 for a in range(50) for b in range(50) if False]", &ctx);
        assert!(matches!(err, Err(EvalError::Unbounded { .. })));
    }

    #[test]
    fn nested_comprehension_elements_count_toward_the_bound() {
        let ctx = EvalContext::new(1, Limits::new(100));
        let err = evaluate("[[0] * 20 for _ in range(20)]", &ctx);
        assert!(matches!(err, Err(EvalError::Unbounded { .. })));
        assert!(evaluate("[[0] * 2 for _ in range(20)]", &ctx).is_ok());
    }

    #[test]
    fn callee_must_be_builtin() {
        assert_eq!(eval("open('x')"), Err(EvalError::Name("open".into())));
        assert!(matches!(eval("n()"), Err(EvalError::Type(_))));
        assert!(matches!(eval("(1)(2)"), Err(EvalError::Type(_))));
    }
}
