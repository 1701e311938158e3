// src/expr/value.rs

//! Runtime values produced by the evaluator.

use std::cmp::Ordering;

use super::error::{EvalError, EvalResult};

/// An evaluated expression result.
///
/// Sets and dicts keep insertion order; equality between them ignores order.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    None,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    List(Vec<Value>),
    Tuple(Vec<Value>),
    Set(Vec<Value>),
    Dict(Vec<(Value, Value)>),
    Range(RangeValue),
}

/// Lazy `range(start, stop, step)`; only materialized on iteration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeValue {
    pub start: i64,
    pub stop: i64,
    pub step: i64,
}

impl RangeValue {
    pub fn new(start: i64, stop: i64, step: i64) -> EvalResult<Self> {
        if step == 0 {
            return Err(EvalError::value_error("range() arg 3 must not be zero"));
        }
        Ok(Self { start, stop, step })
    }

    pub fn len(&self) -> u128 {
        let (start, stop, step) = (self.start as i128, self.stop as i128, self.step as i128);
        let span = if step > 0 { stop - start } else { start - stop };
        if span <= 0 {
            return 0;
        }
        let step = step.unsigned_abs();
        ((span as u128) - 1) / step + 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Element at `index`, which the caller has bounds-checked.
    pub fn nth(&self, index: u128) -> i64 {
        (self.start as i128 + index as i128 * self.step as i128) as i64
    }

    pub fn contains(&self, value: i64) -> bool {
        let (v, start, step) = (value as i128, self.start as i128, self.step as i128);
        let in_bounds = if step > 0 {
            v >= start && v < self.stop as i128
        } else {
            v <= start && v > self.stop as i128
        };
        in_bounds && (v - start) % step == 0
    }
}

/// A numeric view of a value; booleans behave as integers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i64),
    Float(f64),
}

impl Number {
    pub fn as_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Float(f) => f,
        }
    }
}

impl Value {
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::None => "NoneType",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::Str(_) => "str",
            Value::Bytes(_) => "bytes",
            Value::List(_) => "list",
            Value::Tuple(_) => "tuple",
            Value::Set(_) => "set",
            Value::Dict(_) => "dict",
            Value::Range(_) => "range",
        }
    }

    pub fn as_number(&self) -> Option<Number> {
        match self {
            Value::Bool(b) => Some(Number::Int(i64::from(*b))),
            Value::Int(i) => Some(Number::Int(*i)),
            Value::Float(f) => Some(Number::Float(*f)),
            _ => None,
        }
    }

    /// Integer view for arguments that must be integral (indices, counts).
    pub fn as_int(&self, what: &str) -> EvalResult<i64> {
        match self {
            Value::Bool(b) => Ok(i64::from(*b)),
            Value::Int(i) => Ok(*i),
            other => Err(EvalError::type_error(format!(
                "{what} must be an integer, not '{}'",
                other.type_name()
            ))),
        }
    }

    pub fn truthy(&self) -> bool {
        match self {
            Value::None => false,
            Value::Bool(b) => *b,
            Value::Int(i) => *i != 0,
            Value::Float(f) => *f != 0.0,
            Value::Str(s) => !s.is_empty(),
            Value::Bytes(b) => !b.is_empty(),
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => !items.is_empty(),
            Value::Dict(pairs) => !pairs.is_empty(),
            Value::Range(r) => !r.is_empty(),
        }
    }

    /// Number of materialized cells this value holds, counting nested
    /// containers. Ranges are lazy and count as one.
    pub fn weight(&self) -> u128 {
        match self {
            Value::Str(s) => s.chars().count().max(1) as u128,
            Value::Bytes(b) => b.len().max(1) as u128,
            Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
                1 + items.iter().map(Value::weight).sum::<u128>()
            }
            Value::Dict(pairs) => {
                1 + pairs
                    .iter()
                    .map(|(k, v)| k.weight() + v.weight())
                    .sum::<u128>()
            }
            _ => 1,
        }
    }

    /// Whether this value is iterable but not text. Such values expand into
    /// one invocation per element.
    pub fn is_expandable(&self) -> bool {
        matches!(
            self,
            Value::List(_) | Value::Tuple(_) | Value::Set(_) | Value::Dict(_) | Value::Range(_)
        )
    }

    pub fn is_hashable(&self) -> bool {
        match self {
            Value::List(_) | Value::Set(_) | Value::Dict(_) => false,
            Value::Tuple(items) => items.iter().all(Value::is_hashable),
            _ => true,
        }
    }

    pub fn ensure_hashable(&self) -> EvalResult<()> {
        if self.is_hashable() {
            Ok(())
        } else {
            Err(EvalError::type_error(format!(
                "unhashable type: '{}'",
                self.type_name()
            )))
        }
    }

    /// Structural equality with numeric coercion (`1 == 1.0 == True`).
    pub fn py_eq(&self, other: &Value) -> bool {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return match (a, b) {
                (Number::Int(x), Number::Int(y)) => x == y,
                (x, y) => x.as_f64() == y.as_f64(),
            };
        }
        match (self, other) {
            (Value::None, Value::None) => true,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::Bytes(a), Value::Bytes(b)) => a == b,
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.py_eq(y))
            }
            (Value::Set(a), Value::Set(b)) => {
                a.len() == b.len() && a.iter().all(|x| b.iter().any(|y| x.py_eq(y)))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| {
                        b.iter().any(|(k2, v2)| k.py_eq(k2) && v.py_eq(v2))
                    })
            }
            (Value::Range(a), Value::Range(b)) => {
                let (la, lb) = (a.len(), b.len());
                la == lb
                    && (la == 0
                        || (a.start == b.start && (la == 1 || a.step == b.step)))
            }
            _ => false,
        }
    }

    /// Ordering for `<`, `sorted`, `min` and `max`.
    pub fn py_cmp(&self, other: &Value) -> EvalResult<Ordering> {
        if let (Some(a), Some(b)) = (self.as_number(), other.as_number()) {
            return Ok(match (a, b) {
                (Number::Int(x), Number::Int(y)) => x.cmp(&y),
                (x, y) => x
                    .as_f64()
                    .partial_cmp(&y.as_f64())
                    .unwrap_or(Ordering::Equal),
            });
        }
        match (self, other) {
            (Value::Str(a), Value::Str(b)) => Ok(a.cmp(b)),
            (Value::Bytes(a), Value::Bytes(b)) => Ok(a.cmp(b)),
            (Value::List(a), Value::List(b)) | (Value::Tuple(a), Value::Tuple(b)) => {
                for (x, y) in a.iter().zip(b) {
                    if !x.py_eq(y) {
                        return x.py_cmp(y);
                    }
                }
                Ok(a.len().cmp(&b.len()))
            }
            _ => Err(EvalError::type_error(format!(
                "'<' not supported between instances of '{}' and '{}'",
                self.type_name(),
                other.type_name()
            ))),
        }
    }
}

/// Deduplicate while keeping first-seen order, as set construction does.
pub fn dedup_values(items: Vec<Value>) -> EvalResult<Vec<Value>> {
    let mut out: Vec<Value> = Vec::with_capacity(items.len());
    for item in items {
        item.ensure_hashable()?;
        if !out.iter().any(|existing| existing.py_eq(&item)) {
            out.push(item);
        }
    }
    Ok(out)
}

/// Insert or overwrite a dict entry, keeping the original key position.
pub fn dict_insert(pairs: &mut Vec<(Value, Value)>, key: Value, value: Value) -> EvalResult<()> {
    key.ensure_hashable()?;
    match pairs.iter_mut().find(|(k, _)| k.py_eq(&key)) {
        Some(slot) => slot.1 = value,
        None => pairs.push((key, value)),
    }
    Ok(())
}
