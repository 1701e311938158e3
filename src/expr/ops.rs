// src/expr/ops.rs

//! Operator semantics: arithmetic, comparisons, membership, subscripts and
//! iteration.

use std::cmp::Ordering;
use std::iter::repeat_n;

use super::ast::{BinaryOp, CompareOp, UnaryOp};
use super::error::{EvalError, EvalResult};
use super::format::percent_format;
use super::limits::Limits;
use super::value::{Number, RangeValue, Value, dedup_values};

fn unsupported(op: &str, left: &Value, right: &Value) -> EvalError {
    EvalError::type_error(format!(
        "unsupported operand type(s) for {op}: '{}' and '{}'",
        left.type_name(),
        right.type_name()
    ))
}

fn op_symbol(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::FloorDiv => "//",
        BinaryOp::Mod => "%",
        BinaryOp::Pow => "**",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::LShift => "<<",
        BinaryOp::RShift => ">>",
    }
}

pub fn unary(op: UnaryOp, value: Value) -> EvalResult<Value> {
    let bad = |v: &Value, sym: &str| {
        EvalError::type_error(format!("bad operand type for unary {sym}: '{}'", v.type_name()))
    };
    match op {
        UnaryOp::Not => Ok(Value::Bool(!value.truthy())),
        UnaryOp::Pos => match value.as_number() {
            Some(Number::Int(i)) => Ok(Value::Int(i)),
            Some(Number::Float(f)) => Ok(Value::Float(f)),
            None => Err(bad(&value, "+")),
        },
        UnaryOp::Neg => match value.as_number() {
            Some(Number::Int(i)) => i.checked_neg().map(Value::Int).ok_or(EvalError::Overflow),
            Some(Number::Float(f)) => Ok(Value::Float(-f)),
            None => Err(bad(&value, "-")),
        },
        UnaryOp::Invert => match value {
            Value::Bool(b) => Ok(Value::Int(!i64::from(b))),
            Value::Int(i) => Ok(Value::Int(!i)),
            other => Err(bad(&other, "~")),
        },
    }
}

pub fn binary(op: BinaryOp, left: Value, right: Value, limits: &Limits) -> EvalResult<Value> {
    if let (Some(a), Some(b)) = (left.as_number(), right.as_number()) {
        return match (a, b) {
            (Number::Int(x), Number::Int(y)) => int_arith(op, x, y),
            _ => float_arith(op, a.as_f64(), b.as_f64())
                .map_err(|e| retag(e, op, &left, &right)),
        };
    }

    match (op, left, right) {
        (BinaryOp::Add, Value::Str(a), Value::Str(b)) => Ok(Value::Str(a + &b)),
        (BinaryOp::Add, Value::Bytes(mut a), Value::Bytes(b)) => {
            a.extend(b);
            Ok(Value::Bytes(a))
        }
        (BinaryOp::Add, Value::List(mut a), Value::List(b)) => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (BinaryOp::Add, Value::Tuple(mut a), Value::Tuple(b)) => {
            a.extend(b);
            Ok(Value::Tuple(a))
        }
        (BinaryOp::Mul, seq, count) if count.as_number().is_some() && is_sequence(&seq) => {
            repeat_sequence(seq, &count, limits)
        }
        (BinaryOp::Mul, count, seq) if count.as_number().is_some() && is_sequence(&seq) => {
            repeat_sequence(seq, &count, limits)
        }
        (BinaryOp::Mod, Value::Str(template), args) => percent_format(&template, &args, limits),
        (op @ (BinaryOp::BitOr | BinaryOp::BitAnd | BinaryOp::Sub | BinaryOp::BitXor),
         Value::Set(a), Value::Set(b)) => set_op(op, a, b),
        (op, left, right) => Err(unsupported(op_symbol(op), &left, &right)),
    }
}

/// Float arithmetic can reject bitwise operators; report them with the
/// original operand types.
fn retag(err: EvalError, op: BinaryOp, left: &Value, right: &Value) -> EvalError {
    match err {
        EvalError::Type(_) => unsupported(op_symbol(op), left, right),
        other => other,
    }
}

fn is_sequence(value: &Value) -> bool {
    matches!(
        value,
        Value::Str(_) | Value::Bytes(_) | Value::List(_) | Value::Tuple(_)
    )
}

fn repeat_sequence(seq: Value, count: &Value, limits: &Limits) -> EvalResult<Value> {
    let times = match count.as_number() {
        Some(Number::Int(n)) => n.max(0) as u128,
        _ => {
            return Err(EvalError::type_error(
                "can't multiply sequence by non-int of type 'float'",
            ));
        }
    };
    let unit = match &seq {
        Value::Str(s) => s.chars().count() as u128,
        Value::Bytes(b) => b.len() as u128,
        Value::List(items) | Value::Tuple(items) => items.iter().map(Value::weight).sum(),
        _ => 0,
    };
    limits.check(unit.saturating_mul(times))?;
    let times = times as usize;

    Ok(match seq {
        Value::Str(s) => Value::Str(s.repeat(times)),
        Value::Bytes(b) => Value::Bytes(b.repeat(times)),
        Value::List(items) => Value::List(repeat_n(items, times).flatten().collect()),
        Value::Tuple(items) => Value::Tuple(repeat_n(items, times).flatten().collect()),
        other => other,
    })
}

fn set_op(op: BinaryOp, a: Vec<Value>, b: Vec<Value>) -> EvalResult<Value> {
    let in_b = |x: &Value| b.iter().any(|y| x.py_eq(y));
    let in_a = |x: &Value| a.iter().any(|y| x.py_eq(y));
    let items = match op {
        BinaryOp::BitOr => {
            let mut all = a.clone();
            all.extend(b.iter().cloned());
            dedup_values(all)?
        }
        BinaryOp::BitAnd => a.iter().filter(|x| in_b(x)).cloned().collect(),
        BinaryOp::Sub => a.iter().filter(|x| !in_b(x)).cloned().collect(),
        _ => {
            let mut out: Vec<Value> = a.iter().filter(|x| !in_b(x)).cloned().collect();
            out.extend(b.iter().filter(|x| !in_a(x)).cloned());
            out
        }
    };
    Ok(Value::Set(items))
}

fn floor_div(x: i64, y: i64) -> EvalResult<i64> {
    let q = x.checked_div(y).ok_or(EvalError::Overflow)?;
    let r = x % y;
    Ok(if r != 0 && ((r < 0) != (y < 0)) { q - 1 } else { q })
}

fn int_arith(op: BinaryOp, x: i64, y: i64) -> EvalResult<Value> {
    let int = |v: Option<i64>| v.map(Value::Int).ok_or(EvalError::Overflow);
    match op {
        BinaryOp::Add => int(x.checked_add(y)),
        BinaryOp::Sub => int(x.checked_sub(y)),
        BinaryOp::Mul => int(x.checked_mul(y)),
        BinaryOp::Div => {
            if y == 0 {
                return Err(EvalError::ZeroDivision);
            }
            Ok(Value::Float(x as f64 / y as f64))
        }
        BinaryOp::FloorDiv => {
            if y == 0 {
                return Err(EvalError::ZeroDivision);
            }
            floor_div(x, y).map(Value::Int)
        }
        BinaryOp::Mod => {
            if y == 0 {
                return Err(EvalError::ZeroDivision);
            }
            if y == -1 {
                return Ok(Value::Int(0));
            }
            let r = x % y;
            Ok(Value::Int(if r != 0 && ((r < 0) != (y < 0)) { r + y } else { r }))
        }
        BinaryOp::Pow => {
            if y >= 0 {
                let exp = u32::try_from(y).map_err(|_| EvalError::Overflow)?;
                return int(x.checked_pow(exp));
            }
            if x == 0 {
                return Err(EvalError::ZeroDivision);
            }
            Ok(Value::Float((x as f64).powf(y as f64)))
        }
        BinaryOp::BitAnd => Ok(Value::Int(x & y)),
        BinaryOp::BitOr => Ok(Value::Int(x | y)),
        BinaryOp::BitXor => Ok(Value::Int(x ^ y)),
        BinaryOp::LShift => {
            if y < 0 {
                return Err(EvalError::value_error("negative shift count"));
            }
            if x == 0 {
                return Ok(Value::Int(0));
            }
            if y >= 64 {
                return Err(EvalError::Overflow);
            }
            let shifted = x << y;
            if shifted >> y != x {
                return Err(EvalError::Overflow);
            }
            Ok(Value::Int(shifted))
        }
        BinaryOp::RShift => {
            if y < 0 {
                return Err(EvalError::value_error("negative shift count"));
            }
            if y >= 64 {
                return Ok(Value::Int(if x < 0 { -1 } else { 0 }));
            }
            Ok(Value::Int(x >> y))
        }
    }
}

fn float_arith(op: BinaryOp, x: f64, y: f64) -> EvalResult<Value> {
    let value = match op {
        BinaryOp::Add => x + y,
        BinaryOp::Sub => x - y,
        BinaryOp::Mul => x * y,
        BinaryOp::Div => {
            if y == 0.0 {
                return Err(EvalError::ZeroDivision);
            }
            x / y
        }
        BinaryOp::FloorDiv => {
            if y == 0.0 {
                return Err(EvalError::ZeroDivision);
            }
            (x / y).floor()
        }
        BinaryOp::Mod => {
            if y == 0.0 {
                return Err(EvalError::ZeroDivision);
            }
            let r = x % y;
            if r != 0.0 && ((r < 0.0) != (y < 0.0)) { r + y } else { r }
        }
        BinaryOp::Pow => {
            if x == 0.0 && y < 0.0 {
                return Err(EvalError::ZeroDivision);
            }
            if x < 0.0 && y.fract() != 0.0 {
                return Err(EvalError::value_error(
                    "negative number cannot be raised to a fractional power",
                ));
            }
            x.powf(y)
        }
        _ => return Err(EvalError::type_error("bitwise operation on float")),
    };
    Ok(Value::Float(value))
}

pub fn compare(op: CompareOp, left: &Value, right: &Value) -> EvalResult<bool> {
    match op {
        CompareOp::Eq => Ok(left.py_eq(right)),
        CompareOp::NotEq => Ok(!left.py_eq(right)),
        CompareOp::In => contains(right, left),
        CompareOp::NotIn => contains(right, left).map(|found| !found),
        CompareOp::Is => Ok(identical(left, right)),
        CompareOp::IsNot => Ok(!identical(left, right)),
        CompareOp::Lt | CompareOp::Le | CompareOp::Gt | CompareOp::Ge => {
            if let (Some(Number::Float(_)), Some(_)) | (Some(_), Some(Number::Float(_))) =
                (left.as_number(), right.as_number())
            {
                let (x, y) = (
                    left.as_number().map_or(f64::NAN, Number::as_f64),
                    right.as_number().map_or(f64::NAN, Number::as_f64),
                );
                return Ok(match op {
                    CompareOp::Lt => x < y,
                    CompareOp::Le => x <= y,
                    CompareOp::Gt => x > y,
                    _ => x >= y,
                });
            }
            let ordering = left.py_cmp(right)?;
            Ok(match op {
                CompareOp::Lt => ordering == Ordering::Less,
                CompareOp::Le => ordering != Ordering::Greater,
                CompareOp::Gt => ordering == Ordering::Greater,
                _ => ordering != Ordering::Less,
            })
        }
    }
}

/// `is` only has a stable meaning for the singletons.
fn identical(left: &Value, right: &Value) -> bool {
    match (left, right) {
        (Value::None, Value::None) => true,
        (Value::Bool(a), Value::Bool(b)) => a == b,
        _ => false,
    }
}

pub fn contains(container: &Value, item: &Value) -> EvalResult<bool> {
    match container {
        Value::Str(haystack) => match item {
            Value::Str(needle) => Ok(haystack.contains(needle.as_str())),
            other => Err(EvalError::type_error(format!(
                "'in <string>' requires string as left operand, not {}",
                other.type_name()
            ))),
        },
        Value::Bytes(haystack) => match item {
            Value::Bytes(needle) => Ok(needle.is_empty()
                || haystack.windows(needle.len()).any(|w| w == needle.as_slice())),
            other => {
                let byte = other.as_int("a bytes-like object")?;
                Ok(haystack.iter().any(|b| i64::from(*b) == byte))
            }
        },
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => {
            Ok(items.iter().any(|x| x.py_eq(item)))
        }
        Value::Dict(pairs) => Ok(pairs.iter().any(|(k, _)| k.py_eq(item))),
        Value::Range(r) => Ok(match item.as_number() {
            Some(Number::Int(i)) => r.contains(i),
            Some(Number::Float(f)) if f.fract() == 0.0 && f.abs() < 9.2e18 => {
                r.contains(f as i64)
            }
            _ => false,
        }),
        other => Err(EvalError::type_error(format!(
            "argument of type '{}' is not iterable",
            other.type_name()
        ))),
    }
}

fn normalize_index(index: i64, len: usize) -> EvalResult<usize> {
    let len = len as i128;
    let mut i = index as i128;
    if i < 0 {
        i += len;
    }
    if i < 0 || i >= len {
        return Err(EvalError::Index);
    }
    Ok(i as usize)
}

pub fn index(value: &Value, index: &Value) -> EvalResult<Value> {
    match value {
        Value::Dict(pairs) => pairs
            .iter()
            .find(|(k, _)| k.py_eq(index))
            .map(|(_, v)| v.clone())
            .ok_or_else(|| EvalError::Key(index.repr())),
        Value::List(items) | Value::Tuple(items) => {
            let i = normalize_index(index.as_int("indices")?, items.len())?;
            Ok(items[i].clone())
        }
        Value::Str(s) => {
            let len = s.chars().count();
            let i = normalize_index(index.as_int("string indices")?, len)?;
            Ok(Value::Str(s.chars().nth(i).map(String::from).unwrap_or_default()))
        }
        Value::Bytes(b) => {
            let i = normalize_index(index.as_int("byte indices")?, b.len())?;
            Ok(Value::Int(i64::from(b[i])))
        }
        Value::Range(r) => {
            let len = r.len();
            let mut i = index.as_int("range indices")? as i128;
            if i < 0 {
                i += len as i128;
            }
            if i < 0 || i as u128 >= len {
                return Err(EvalError::Index);
            }
            Ok(Value::Int(r.nth(i as u128)))
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Clamp slice bounds the way sequence slicing does, returning the
/// effective `(start, stop)` for a sequence of `len` elements.
fn adjust_bounds(len: i128, lower: Option<i64>, upper: Option<i64>, step: i64) -> (i128, i128) {
    let clamp = |bound: i64| -> i128 {
        let mut v = bound as i128;
        if v < 0 {
            v += len;
            if v < 0 {
                v = if step < 0 { -1 } else { 0 };
            }
        } else if v >= len {
            v = if step < 0 { len - 1 } else { len };
        }
        v
    };
    if step > 0 {
        (lower.map_or(0, clamp), upper.map_or(len, clamp))
    } else {
        (lower.map_or(len - 1, clamp), upper.map_or(-1, clamp))
    }
}

fn slice_positions(len: usize, lower: Option<i64>, upper: Option<i64>, step: i64) -> Vec<usize> {
    let (start, stop) = adjust_bounds(len as i128, lower, upper, step);
    let mut out = Vec::new();
    let mut i = start;
    while (step > 0 && i < stop) || (step < 0 && i > stop) {
        out.push(i as usize);
        i += step as i128;
    }
    out
}

pub fn slice(
    value: &Value,
    lower: Option<i64>,
    upper: Option<i64>,
    step: Option<i64>,
) -> EvalResult<Value> {
    let step = step.unwrap_or(1);
    if step == 0 {
        return Err(EvalError::value_error("slice step cannot be zero"));
    }

    let pick = |items: &[Value]| -> Vec<Value> {
        slice_positions(items.len(), lower, upper, step)
            .into_iter()
            .map(|i| items[i].clone())
            .collect()
    };

    match value {
        Value::List(items) => Ok(Value::List(pick(items))),
        Value::Tuple(items) => Ok(Value::Tuple(pick(items))),
        Value::Str(s) => {
            let chars: Vec<char> = s.chars().collect();
            Ok(Value::Str(
                slice_positions(chars.len(), lower, upper, step)
                    .into_iter()
                    .map(|i| chars[i])
                    .collect(),
            ))
        }
        Value::Bytes(b) => Ok(Value::Bytes(
            slice_positions(b.len(), lower, upper, step)
                .into_iter()
                .map(|i| b[i])
                .collect(),
        )),
        Value::Range(r) => {
            let (start, stop) = adjust_bounds(r.len() as i128, lower, upper, step);
            let to_i64 = |v: i128| i64::try_from(v).map_err(|_| EvalError::Overflow);
            let base = r.start as i128;
            let new_step = r.step as i128 * step as i128;
            RangeValue::new(
                to_i64(base + start * r.step as i128)?,
                to_i64(base + stop * r.step as i128)?,
                to_i64(new_step)?,
            )
            .map(Value::Range)
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not subscriptable",
            other.type_name()
        ))),
    }
}

/// Materialize the elements of an iterable value.
pub fn iterate(value: &Value, limits: &Limits) -> EvalResult<Vec<Value>> {
    match value {
        Value::Str(s) => Ok(s.chars().map(|c| Value::Str(c.to_string())).collect()),
        Value::Bytes(b) => Ok(b.iter().map(|x| Value::Int(i64::from(*x))).collect()),
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => Ok(items.clone()),
        Value::Dict(pairs) => Ok(pairs.iter().map(|(k, _)| k.clone()).collect()),
        Value::Range(r) => {
            let len = r.len();
            limits.check(len)?;
            Ok((0..len).map(|i| Value::Int(r.nth(i))).collect())
        }
        other => Err(EvalError::type_error(format!(
            "'{}' object is not iterable",
            other.type_name()
        ))),
    }
}
