// src/expr/builtins.rs

//! Built-in functions and methods callable from expressions.

use std::cmp::Ordering;

use super::ast::BinaryOp;
use super::error::{EvalError, EvalResult};
use super::format::format_template;
use super::limits::Limits;
use super::ops::{self, iterate};
use super::value::{Number, RangeValue, Value, dedup_values};

/// Names resolvable as functions.
pub const BUILTINS: &[&str] = &[
    "abs", "bool", "chr", "enumerate", "float", "int", "len", "list", "max", "min", "ord",
    "range", "repeat", "reversed", "round", "set", "sorted", "str", "sum", "tuple", "zip",
];

pub fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

/// Evaluated arguments of a single call.
#[derive(Debug, Clone, Default)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keywords: Vec<(String, Value)>,
}

impl CallArgs {
    pub fn new(positional: Vec<Value>, keywords: Vec<(String, Value)>) -> Self {
        Self {
            positional,
            keywords,
        }
    }

    /// Remove and return keyword `name`.
    fn keyword(&mut self, name: &str) -> Option<Value> {
        let pos = self.keywords.iter().position(|(k, _)| k == name)?;
        Some(self.keywords.remove(pos).1)
    }

    /// Reject any keyword not consumed by [`CallArgs::keyword`].
    fn finish(&self, func: &str) -> EvalResult<()> {
        match self.keywords.first() {
            Some((key, _)) => Err(EvalError::type_error(format!(
                "'{key}' is an invalid keyword argument for {func}()"
            ))),
            None => Ok(()),
        }
    }
}

fn wrong_args(func: &str) -> EvalError {
    EvalError::type_error(format!("{func}() got an unexpected number of arguments"))
}

pub fn call_builtin(name: &str, mut call: CallArgs, limits: &Limits) -> EvalResult<Value> {
    match name {
        "sorted" => {
            let reverse = call.keyword("reverse").is_some_and(|v| v.truthy());
            call.finish(name)?;
            let [iterable] = call.positional.as_slice() else {
                return Err(wrong_args(name));
            };
            let mut items = iterate(iterable, limits)?;
            sort_values(&mut items)?;
            if reverse {
                items.reverse();
            }
            Ok(Value::List(items))
        }
        "enumerate" => {
            let start = call.keyword("start");
            call.finish(name)?;
            let (iterable, start) = match (call.positional.as_slice(), start.as_ref()) {
                ([it], None) => (it, 0),
                ([it], Some(s)) | ([it, s], None) => (it, s.as_int("enumerate() start")?),
                _ => return Err(wrong_args(name)),
            };
            iterate(iterable, limits)?
                .into_iter()
                .enumerate()
                .map(|(i, v)| {
                    let i = i64::try_from(i).map_err(|_| EvalError::Overflow)?;
                    let index = start.checked_add(i).ok_or(EvalError::Overflow)?;
                    Ok(Value::Tuple(vec![Value::Int(index), v]))
                })
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::List)
        }
        "min" | "max" => {
            let default = call.keyword("default");
            call.finish(name)?;
            extremum(name, call.positional, default, limits)
        }
        "sum" => {
            let start = call.keyword("start");
            call.finish(name)?;
            let (iterable, start) = match (call.positional.as_slice(), start) {
                ([it], None) => (it, Value::Int(0)),
                ([it], Some(s)) => (it, s),
                ([it, s], None) => (it, s.clone()),
                _ => return Err(wrong_args(name)),
            };
            if matches!(start, Value::Str(_) | Value::Bytes(_)) {
                return Err(EvalError::type_error(
                    "sum() can't sum strings [use ''.join(seq) instead]",
                ));
            }
            iterate(iterable, limits)?
                .into_iter()
                .try_fold(start, |acc, v| ops::binary(BinaryOp::Add, acc, v, limits))
        }
        "round" => {
            let ndigits = call.keyword("ndigits");
            call.finish(name)?;
            let (x, ndigits) = match (call.positional.as_slice(), ndigits) {
                ([x], nd) => (x, nd),
                ([x, nd], None) => (x, Some(nd.clone())),
                _ => return Err(wrong_args(name)),
            };
            let ndigits = match ndigits {
                None | Some(Value::None) => None,
                Some(nd) => Some(nd.as_int("round() ndigits")?),
            };
            round(x, ndigits)
        }
        "int" => {
            let base = call.keyword("base");
            call.finish(name)?;
            match (call.positional.as_slice(), base.as_ref()) {
                ([], None) => Ok(Value::Int(0)),
                ([x], None) => to_int(x),
                ([Value::Str(s)], Some(base)) | ([Value::Str(s), base], None) => {
                    parse_int(s, base.as_int("int() base")?).map(Value::Int)
                }
                ([_], Some(_)) | ([_, _], None) => Err(EvalError::type_error(
                    "int() can't convert non-string with explicit base",
                )),
                _ => Err(wrong_args(name)),
            }
        }
        _ => {
            call.finish(name)?;
            call_positional(name, &call.positional, limits)
        }
    }
}

/// Builtins that take no keyword arguments.
fn call_positional(name: &str, args: &[Value], limits: &Limits) -> EvalResult<Value> {
    match (name, args) {
        ("range", [stop]) => range(0, stop.as_int("range() argument")?, 1),
        ("range", [start, stop]) => range(
            start.as_int("range() argument")?,
            stop.as_int("range() argument")?,
            1,
        ),
        ("range", [start, stop, step]) => range(
            start.as_int("range() argument")?,
            stop.as_int("range() argument")?,
            step.as_int("range() argument")?,
        ),
        ("len", [x]) => len(x),
        ("str", []) => Ok(Value::Str(String::new())),
        ("str", [x]) => Ok(Value::Str(x.to_string())),
        ("float", []) => Ok(Value::Float(0.0)),
        ("float", [x]) => to_float(x),
        ("bool", []) => Ok(Value::Bool(false)),
        ("bool", [x]) => Ok(Value::Bool(x.truthy())),
        ("list", []) => Ok(Value::List(Vec::new())),
        ("list", [x]) => iterate(x, limits).map(Value::List),
        ("tuple", []) => Ok(Value::Tuple(Vec::new())),
        ("tuple", [x]) => iterate(x, limits).map(Value::Tuple),
        ("set", []) => Ok(Value::Set(Vec::new())),
        ("set", [x]) => dedup_values(iterate(x, limits)?).map(Value::Set),
        ("reversed", [x]) => {
            if matches!(x, Value::Set(_)) {
                return Err(EvalError::type_error("'set' object is not reversible"));
            }
            let mut items = iterate(x, limits)?;
            items.reverse();
            Ok(Value::List(items))
        }
        ("zip", iterables) => zip(iterables, limits),
        ("abs", [x]) => match x.as_number() {
            Some(Number::Int(i)) => i.checked_abs().map(Value::Int).ok_or(EvalError::Overflow),
            Some(Number::Float(f)) => Ok(Value::Float(f.abs())),
            None => Err(EvalError::type_error(format!(
                "bad operand type for abs(): '{}'",
                x.type_name()
            ))),
        },
        ("repeat", [a, repeats]) => repeat(a, repeats, limits),
        ("chr", [x]) => {
            let code = x.as_int("chr() argument")?;
            u32::try_from(code)
                .ok()
                .and_then(char::from_u32)
                .map(|c| Value::Str(c.to_string()))
                .ok_or_else(|| EvalError::value_error("chr() arg not in range(0x110000)"))
        }
        ("ord", [x]) => ord(x),
        _ => Err(wrong_args(name)),
    }
}

fn range(start: i64, stop: i64, step: i64) -> EvalResult<Value> {
    RangeValue::new(start, stop, step).map(Value::Range)
}

fn len(x: &Value) -> EvalResult<Value> {
    let len: u128 = match x {
        Value::Str(s) => s.chars().count() as u128,
        Value::Bytes(b) => b.len() as u128,
        Value::List(items) | Value::Tuple(items) | Value::Set(items) => items.len() as u128,
        Value::Dict(pairs) => pairs.len() as u128,
        Value::Range(r) => r.len(),
        other => {
            return Err(EvalError::type_error(format!(
                "object of type '{}' has no len()",
                other.type_name()
            )));
        }
    };
    i64::try_from(len).map(Value::Int).map_err(|_| EvalError::Overflow)
}

fn ord(x: &Value) -> EvalResult<Value> {
    match x {
        Value::Str(s) => {
            let mut chars = s.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) => Ok(Value::Int(i64::from(u32::from(c)))),
                _ => Err(EvalError::type_error(format!(
                    "ord() expected a character, but string of length {} found",
                    s.chars().count()
                ))),
            }
        }
        Value::Bytes(b) if b.len() == 1 => Ok(Value::Int(i64::from(b[0]))),
        other => Err(EvalError::type_error(format!(
            "ord() expected string of length 1, but {} found",
            other.type_name()
        ))),
    }
}

fn sort_values(items: &mut [Value]) -> EvalResult<()> {
    let mut error = None;
    items.sort_by(|a, b| {
        a.py_cmp(b).unwrap_or_else(|e| {
            error.get_or_insert(e);
            Ordering::Equal
        })
    });
    error.map_or(Ok(()), Err)
}

fn extremum(
    name: &str,
    args: Vec<Value>,
    default: Option<Value>,
    limits: &Limits,
) -> EvalResult<Value> {
    let candidates = match args.len() {
        0 => return Err(wrong_args(name)),
        1 => iterate(&args[0], limits)?,
        _ if default.is_some() => {
            return Err(EvalError::type_error(format!(
                "cannot specify a default for {name}() with multiple positional arguments"
            )));
        }
        _ => args,
    };
    let wanted = if name == "max" {
        Ordering::Greater
    } else {
        Ordering::Less
    };

    let mut iter = candidates.into_iter();
    let Some(mut best) = iter.next() else {
        return default.ok_or_else(|| {
            EvalError::value_error(format!("{name}() arg is an empty sequence"))
        });
    };
    for item in iter {
        if item.py_cmp(&best)? == wanted {
            best = item;
        }
    }
    Ok(best)
}

fn zip(iterables: &[Value], limits: &Limits) -> EvalResult<Value> {
    let columns = iterables
        .iter()
        .map(|it| iterate(it, limits))
        .collect::<EvalResult<Vec<_>>>()?;
    let rows = columns.iter().map(Vec::len).min().unwrap_or(0);
    Ok(Value::List(
        (0..rows)
            .map(|i| Value::Tuple(columns.iter().map(|col| col[i].clone()).collect()))
            .collect(),
    ))
}

/// Truncate a float towards zero, failing where the result has no `i64`.
fn float_to_int(f: f64) -> EvalResult<i64> {
    if f.is_nan() {
        return Err(EvalError::value_error("cannot convert float NaN to integer"));
    }
    if f.is_infinite() {
        return Err(EvalError::Overflow);
    }
    let t = f.trunc();
    if !(-9.223_372_036_854_775_808e18..9.223_372_036_854_775_808e18).contains(&t) {
        return Err(EvalError::Overflow);
    }
    Ok(t as i64)
}

fn to_int(x: &Value) -> EvalResult<Value> {
    match x {
        Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
        Value::Int(i) => Ok(Value::Int(*i)),
        Value::Float(f) => float_to_int(*f).map(Value::Int),
        Value::Str(s) => parse_int(s, 10).map(Value::Int),
        other => Err(EvalError::type_error(format!(
            "int() argument must be a string or a number, not '{}'",
            other.type_name()
        ))),
    }
}

/// `int(text, base)`; base 0 infers the base from the prefix.
fn parse_int(text: &str, base: i64) -> EvalResult<i64> {
    let invalid = || {
        EvalError::value_error(format!(
            "invalid literal for int() with base {base}: {}",
            super::render::str_repr(text)
        ))
    };
    if base != 0 && !(2..=36).contains(&base) {
        return Err(EvalError::value_error("int() base must be >= 2 and <= 36, or 0"));
    }

    let trimmed = text.trim();
    let (negative, unsigned) = match trimmed.as_bytes().first() {
        Some(b'-') => (true, &trimmed[1..]),
        Some(b'+') => (false, &trimmed[1..]),
        _ => (false, trimmed),
    };
    let lower = unsigned.to_ascii_lowercase();
    let prefixed = |p: &str| lower.starts_with(p);
    let (radix, digits) = match base {
        0 | 16 if prefixed("0x") => (16, &unsigned[2..]),
        0 | 8 if prefixed("0o") => (8, &unsigned[2..]),
        0 | 2 if prefixed("0b") => (2, &unsigned[2..]),
        0 => {
            if unsigned.starts_with('0') && !unsigned.trim_start_matches(['0', '_']).is_empty() {
                return Err(invalid());
            }
            (10, unsigned)
        }
        b => (b as u32, unsigned),
    };

    let digits = digits.strip_prefix('_').unwrap_or(digits);
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return Err(invalid());
    }
    let cleaned: String = digits.chars().filter(|&c| c != '_').collect();
    let magnitude = u64::from_str_radix(&cleaned, radix).map_err(|e| {
        use std::num::IntErrorKind;
        match e.kind() {
            IntErrorKind::PosOverflow => EvalError::Overflow,
            _ => invalid(),
        }
    })?;
    if negative {
        0i64.checked_sub_unsigned(magnitude).ok_or(EvalError::Overflow)
    } else {
        i64::try_from(magnitude).map_err(|_| EvalError::Overflow)
    }
}

fn to_float(x: &Value) -> EvalResult<Value> {
    match x {
        Value::Str(s) => {
            let cleaned: String = s.trim().chars().filter(|&c| c != '_').collect();
            cleaned
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|_| {
                    EvalError::value_error(format!(
                        "could not convert string to float: {}",
                        super::render::str_repr(s)
                    ))
                })
        }
        other => match other.as_number() {
            Some(n) => Ok(Value::Float(n.as_f64())),
            None => Err(EvalError::type_error(format!(
                "float() argument must be a string or a real number, not '{}'",
                other.type_name()
            ))),
        },
    }
}

fn round(x: &Value, ndigits: Option<i64>) -> EvalResult<Value> {
    match (x.as_number(), ndigits) {
        (Some(Number::Float(f)), None) => float_to_int(f.round_ties_even()).map(Value::Int),
        (Some(Number::Float(f)), Some(nd)) => {
            if !f.is_finite() {
                return Ok(Value::Float(f));
            }
            let nd = i32::try_from(nd.clamp(-400, 400)).unwrap_or(0);
            let rounded = match usize::try_from(nd) {
                // Exact decimal expansion, so 2.675 (stored below the tie) gives 2.67.
                Ok(digits) => format!("{f:.digits$}").parse::<f64>().unwrap_or(f),
                Err(_) => {
                    let scale = 10f64.powi(-nd);
                    (f / scale).round_ties_even() * scale
                }
            };
            Ok(Value::Float(if rounded.is_finite() { rounded } else { f }))
        }
        (Some(Number::Int(i)), None) => Ok(Value::Int(i)),
        (Some(Number::Int(i)), Some(nd)) if nd >= 0 => Ok(Value::Int(i)),
        (Some(Number::Int(i)), Some(nd)) => {
            let Some(unit) = u32::try_from(-nd).ok().and_then(|e| 10i64.checked_pow(e)) else {
                return Ok(Value::Int(0));
            };
            let rem = i.rem_euclid(unit);
            let base = i - rem;
            let round_up = rem * 2 > unit || (rem * 2 == unit && (base / unit) % 2 != 0);
            if round_up {
                base.checked_add(unit).map(Value::Int).ok_or(EvalError::Overflow)
            } else {
                Ok(Value::Int(base))
            }
        }
        (None, _) => Err(EvalError::type_error(format!(
            "type {} doesn't define __round__ method",
            x.type_name()
        ))),
    }
}

/// Element-wise repetition: `repeat([1, 2], 2)` is `[1, 1, 2, 2]`, a scalar
/// becomes `k` copies and `repeats` may give one count per element.
fn repeat(a: &Value, repeats: &Value, limits: &Limits) -> EvalResult<Value> {
    let items = match a {
        Value::List(_) | Value::Tuple(_) | Value::Range(_) => iterate(a, limits)?,
        scalar => vec![scalar.clone()],
    };
    let counts: Vec<i64> = match repeats {
        Value::List(_) | Value::Tuple(_) | Value::Range(_) => iterate(repeats, limits)?
            .iter()
            .map(|c| c.as_int("repeat() count"))
            .collect::<EvalResult<_>>()?,
        single => vec![single.as_int("repeat() count")?],
    };
    let counts = match counts.len() {
        1 => vec![counts[0]; items.len()],
        len if len == items.len() => counts,
        len => {
            return Err(EvalError::value_error(format!(
                "operands could not be broadcast together with shape ({},) ({len},)",
                items.len()
            )));
        }
    };
    if counts.iter().any(|&c| c < 0) {
        return Err(EvalError::value_error("negative dimensions are not allowed"));
    }
    limits.check(
        items
            .iter()
            .zip(&counts)
            .map(|(item, &c)| item.weight().saturating_mul(c as u128))
            .sum(),
    )?;

    Ok(Value::List(
        items
            .into_iter()
            .zip(counts)
            .flat_map(|(item, count)| std::iter::repeat_n(item, count as usize))
            .collect(),
    ))
}

/// `receiver.name(...)`.
pub fn call_method(
    receiver: &Value,
    name: &str,
    mut call: CallArgs,
    limits: &Limits,
) -> EvalResult<Value> {
    match receiver {
        Value::Str(s) if name == "format" => {
            format_template(s, &call.positional, &call.keywords, limits).map(Value::Str)
        }
        Value::Str(s) if name == "split" => {
            let sep = call.keyword("sep");
            let maxsplit = call.keyword("maxsplit");
            call.finish(name)?;
            let (sep, maxsplit) = match (call.positional.as_slice(), sep, maxsplit) {
                ([], sep, max) => (sep, max),
                ([s], None, max) => (Some(s.clone()), max),
                ([s, m], None, None) => (Some(s.clone()), Some(m.clone())),
                _ => return Err(wrong_args(name)),
            };
            let maxsplit = match maxsplit {
                Some(m) => m.as_int("maxsplit")?,
                None => -1,
            };
            let sep = match sep {
                None | Some(Value::None) => None,
                Some(Value::Str(sep)) => Some(sep),
                Some(other) => {
                    return Err(EvalError::type_error(format!(
                        "must be str or None, not {}",
                        other.type_name()
                    )));
                }
            };
            split(s, sep.as_deref(), maxsplit)
        }
        Value::Str(s) => {
            call.finish(name)?;
            str_method(s, name, &call.positional, limits)
        }
        Value::Dict(pairs) => {
            call.finish(name)?;
            match (name, call.positional.as_slice()) {
                ("keys", []) => Ok(Value::List(pairs.iter().map(|(k, _)| k.clone()).collect())),
                ("values", []) => Ok(Value::List(pairs.iter().map(|(_, v)| v.clone()).collect())),
                ("items", []) => Ok(Value::List(
                    pairs
                        .iter()
                        .map(|(k, v)| Value::Tuple(vec![k.clone(), v.clone()]))
                        .collect(),
                )),
                ("get", [key]) | ("get", [key, _]) => Ok(pairs
                    .iter()
                    .find(|(k, _)| k.py_eq(key))
                    .map(|(_, v)| v.clone())
                    .or_else(|| call.positional.get(1).cloned())
                    .unwrap_or(Value::None)),
                _ => Err(no_attribute(receiver, name)),
            }
        }
        other => Err(no_attribute(other, name)),
    }
}

fn no_attribute(value: &Value, name: &str) -> EvalError {
    EvalError::type_error(format!(
        "'{}' object has no attribute '{name}'",
        value.type_name()
    ))
}

fn str_arg<'a>(value: &'a Value, method: &str) -> EvalResult<&'a str> {
    match value {
        Value::Str(s) => Ok(s),
        other => Err(EvalError::type_error(format!(
            "{method}() argument must be str, not {}",
            other.type_name()
        ))),
    }
}

fn str_method(s: &str, name: &str, args: &[Value], limits: &Limits) -> EvalResult<Value> {
    let text = |t: String| -> EvalResult<Value> { Ok(Value::Str(t)) };
    match (name, args) {
        ("upper", []) => text(s.to_uppercase()),
        ("lower", []) => text(s.to_lowercase()),
        ("strip" | "lstrip" | "rstrip", []) | ("strip" | "lstrip" | "rstrip", [Value::None]) => {
            text(match name {
                "lstrip" => s.trim_start(),
                "rstrip" => s.trim_end(),
                _ => s.trim(),
            }
            .to_string())
        }
        ("strip" | "lstrip" | "rstrip", [chars]) => {
            let chars: Vec<char> = str_arg(chars, name)?.chars().collect();
            let strip = |c: char| chars.contains(&c);
            text(match name {
                "lstrip" => s.trim_start_matches(strip),
                "rstrip" => s.trim_end_matches(strip),
                _ => s.trim_matches(strip),
            }
            .to_string())
        }
        ("replace", [old, new]) | ("replace", [old, new, _]) => {
            let (old, new) = (str_arg(old, name)?, str_arg(new, name)?);
            let count = match args.get(2) {
                Some(c) => c.as_int("replace() count")?,
                None => -1,
            };
            let occurrences = if old.is_empty() {
                s.chars().count() as u128 + 1
            } else {
                s.matches(old).count() as u128
            };
            let occurrences = if count >= 0 {
                occurrences.min(count as u128)
            } else {
                occurrences
            };
            limits.check(s.len() as u128 + occurrences * new.len() as u128)?;
            text(if count >= 0 {
                s.replacen(old, new, count as usize)
            } else {
                s.replace(old, new)
            })
        }
        ("zfill", [width]) => {
            let width = width.as_int("zfill() width")?.max(0) as u128;
            limits.check(width)?;
            let len = s.chars().count();
            let pad = (width as usize).saturating_sub(len);
            let (sign, digits) = match s.chars().next() {
                Some(c @ ('+' | '-')) => (c.to_string(), &s[1..]),
                _ => (String::new(), s),
            };
            text(format!("{sign}{}{digits}", "0".repeat(pad)))
        }
        ("join", [iterable]) => {
            let parts = iterate(iterable, limits)?
                .iter()
                .map(|item| match item {
                    Value::Str(part) => Ok(part.clone()),
                    other => Err(EvalError::type_error(format!(
                        "sequence item: expected str instance, {} found",
                        other.type_name()
                    ))),
                })
                .collect::<EvalResult<Vec<_>>>()?;
            let total: usize = parts.iter().map(String::len).sum::<usize>()
                + s.len() * parts.len().saturating_sub(1);
            limits.check(total as u128)?;
            text(parts.join(s))
        }
        ("startswith" | "endswith", [affix]) => {
            let affixes: Vec<&str> = match affix {
                Value::Tuple(items) => items
                    .iter()
                    .map(|item| str_arg(item, name))
                    .collect::<EvalResult<_>>()?,
                single => vec![str_arg(single, name)?],
            };
            Ok(Value::Bool(affixes.iter().any(|a| {
                if name == "startswith" {
                    s.starts_with(a)
                } else {
                    s.ends_with(a)
                }
            })))
        }
        ("upper" | "lower" | "zfill" | "join" | "replace" | "startswith" | "endswith", _) => {
            Err(wrong_args(name))
        }
        _ => Err(no_attribute(&Value::Str(s.to_string()), name)),
    }
}

fn split(s: &str, sep: Option<&str>, maxsplit: i64) -> EvalResult<Value> {
    let limit = usize::try_from(maxsplit).ok();
    let parts: Vec<String> = match sep {
        Some("") => return Err(EvalError::value_error("empty separator")),
        Some(sep) => match limit {
            Some(max) => s.splitn(max + 1, sep).map(String::from).collect(),
            None => s.split(sep).map(String::from).collect(),
        },
        None => {
            let mut parts = Vec::new();
            let mut rest = s.trim_start();
            while !rest.is_empty() {
                if limit.is_some_and(|max| parts.len() >= max) {
                    parts.push(rest.to_string());
                    break;
                }
                match rest.find(char::is_whitespace) {
                    Some(end) => {
                        parts.push(rest[..end].to_string());
                        rest = rest[end..].trim_start();
                    }
                    None => {
                        parts.push(rest.to_string());
                        break;
                    }
                }
            }
            parts
        }
    };
    Ok(Value::List(parts.into_iter().map(Value::Str).collect()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_int_accepts_prefixes_and_separators() {
        assert_eq!(parse_int(" 42 ", 10), Ok(42));
        assert_eq!(parse_int("-1_000", 10), Ok(-1000));
        assert_eq!(parse_int("0x1F", 0), Ok(31));
        assert_eq!(parse_int("ff", 16), Ok(255));
        assert!(parse_int("08", 0).is_err());
        assert!(parse_int("1__0", 10).is_err());
        assert_eq!(parse_int("99999999999999999999", 10), Err(EvalError::Overflow));
        assert_eq!(parse_int("-9223372036854775808", 10), Ok(i64::MIN));
    }

    #[test]
    fn whitespace_split_honours_maxsplit() {
        let words = |v: Value| match v {
            Value::List(items) => items.iter().map(|i| i.to_string()).collect::<Vec<_>>(),
            other => panic!("unexpected {other:?}"),
        };
        assert_eq!(words(split("  a b  c ", None, -1).unwrap()), ["a", "b", "c"]);
        assert_eq!(words(split("a b  c ", None, 1).unwrap()), ["a", "b  c "]);
        assert_eq!(words(split("a,,b", Some(","), -1).unwrap()), ["a", "", "b"]);
    }

    #[test]
    fn rounding_is_half_even() {
        assert_eq!(round(&Value::Float(2.5), None), Ok(Value::Int(2)));
        assert_eq!(round(&Value::Float(3.5), None), Ok(Value::Int(4)));
        assert_eq!(round(&Value::Int(1250), Some(-2)), Ok(Value::Int(1200)));
        assert_eq!(round(&Value::Int(1350), Some(-2)), Ok(Value::Int(1400)));
        assert_eq!(round(&Value::Float(1.25), Some(1)), Ok(Value::Float(1.2)));
        assert_eq!(round(&Value::Float(2.675), Some(2)), Ok(Value::Float(2.67)));
        assert_eq!(round(&Value::Float(1250.0), Some(-2)), Ok(Value::Float(1200.0)));
    }
}
