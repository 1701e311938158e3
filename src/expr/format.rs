// src/expr/format.rs

//! String formatting: format specs (`{:>04}`), `str.format`, f-string fields
//! and `%`-interpolation all funnel into [`apply_spec`].

use super::error::{EvalError, EvalResult};
use super::limits::Limits;
use super::render::float_repr;
use super::value::Value;

/// Parsed `[[fill]align][sign][#][0][width][grouping][.precision][type]`.
#[derive(Debug, Clone, PartialEq)]
struct Spec {
    fill: char,
    align: Option<char>,
    sign: char,
    alternate: bool,
    zero: bool,
    width: usize,
    grouping: Option<char>,
    precision: Option<usize>,
    kind: Option<char>,
}

impl Default for Spec {
    fn default() -> Self {
        Self {
            fill: ' ',
            align: None,
            sign: '-',
            alternate: false,
            zero: false,
            width: 0,
            grouping: None,
            precision: None,
            kind: None,
        }
    }
}

fn invalid_spec(spec: &str) -> EvalError {
    EvalError::value_error(format!("invalid format specifier '{spec}'"))
}

fn read_number(chars: &[char], i: &mut usize) -> Option<usize> {
    let start = *i;
    while chars.get(*i).is_some_and(char::is_ascii_digit) {
        *i += 1;
    }
    if *i == start {
        return None;
    }
    chars[start..*i].iter().collect::<String>().parse().ok()
}

fn parse_spec(text: &str) -> EvalResult<Spec> {
    let chars: Vec<char> = text.chars().collect();
    let mut spec = Spec::default();
    let mut i = 0;
    let is_align = |c: Option<&char>| matches!(c, Some('<' | '>' | '=' | '^'));

    if chars.len() >= 2 && is_align(chars.get(1)) {
        spec.fill = chars[0];
        spec.align = Some(chars[1]);
        i = 2;
    } else if is_align(chars.first()) {
        spec.align = Some(chars[0]);
        i = 1;
    }
    if let Some(&c @ ('+' | '-' | ' ')) = chars.get(i) {
        spec.sign = c;
        i += 1;
    }
    if chars.get(i) == Some(&'#') {
        spec.alternate = true;
        i += 1;
    }
    if chars.get(i) == Some(&'0') {
        spec.zero = true;
        i += 1;
    }
    spec.width = read_number(&chars, &mut i).unwrap_or(0);
    if let Some(&c @ (',' | '_')) = chars.get(i) {
        spec.grouping = Some(c);
        i += 1;
    }
    if chars.get(i) == Some(&'.') {
        i += 1;
        spec.precision = Some(read_number(&chars, &mut i).ok_or_else(|| invalid_spec(text))?);
    }
    match &chars[i..] {
        [] => {}
        [kind] => spec.kind = Some(*kind),
        _ => return Err(invalid_spec(text)),
    }
    Ok(spec)
}

/// `format(value, spec)`.
pub fn format_value(value: &Value, spec: &str, limits: &Limits) -> EvalResult<String> {
    if spec.is_empty() {
        return Ok(value.to_string());
    }
    apply_spec(value, &parse_spec(spec)?, limits)
}

fn apply_spec(value: &Value, spec: &Spec, limits: &Limits) -> EvalResult<String> {
    limits.check(spec.width as u128)?;
    match (value, spec.kind) {
        (Value::Str(s), None | Some('s')) => format_text(s, spec),
        (Value::Bool(b), None) => format_text(if *b { "True" } else { "False" }, spec),
        (Value::Int(_) | Value::Bool(_), None | Some('d' | 'n' | 'x' | 'X' | 'o' | 'b' | 'c')) => {
            format_int(value.as_int("format argument")?, spec)
        }
        (
            Value::Int(_) | Value::Bool(_) | Value::Float(_),
            Some('f' | 'F' | 'e' | 'E' | 'g' | 'G' | '%'),
        )
        | (Value::Float(_), None) => {
            let x = value.as_number().map_or(0.0, |n| n.as_f64());
            format_float(x, spec)
        }
        (other, Some(kind)) => Err(EvalError::value_error(format!(
            "unknown format code '{kind}' for object of type '{}'",
            other.type_name()
        ))),
        (other, None) => Err(EvalError::type_error(format!(
            "unsupported format string passed to {}.__format__",
            other.type_name()
        ))),
    }
}

fn pad(prefix: &str, body: &str, spec: &Spec, default_align: char) -> EvalResult<String> {
    let (fill, align) = match spec.align {
        Some(align) => (spec.fill, align),
        None if spec.zero => ('0', if default_align == '<' { '<' } else { '=' }),
        None => (' ', default_align),
    };
    let len = prefix.chars().count() + body.chars().count();
    if spec.width <= len {
        return Ok(format!("{prefix}{body}"));
    }
    let padding = spec.width - len;
    let fill_n = |n: usize| std::iter::repeat_n(fill, n).collect::<String>();
    Ok(match align {
        '<' => format!("{prefix}{body}{}", fill_n(padding)),
        '^' => {
            let left = padding / 2;
            format!("{}{prefix}{body}{}", fill_n(left), fill_n(padding - left))
        }
        '=' => format!("{prefix}{}{body}", fill_n(padding)),
        _ => format!("{}{prefix}{body}", fill_n(padding)),
    })
}

fn format_text(text: &str, spec: &Spec) -> EvalResult<String> {
    if spec.sign != '-' {
        return Err(EvalError::value_error("sign not allowed in string format specifier"));
    }
    if spec.align == Some('=') {
        return Err(EvalError::value_error(
            "'=' alignment not allowed in string format specifier",
        ));
    }
    let body: String = match spec.precision {
        Some(p) => text.chars().take(p).collect(),
        None => text.to_string(),
    };
    pad("", &body, spec, '<')
}

fn sign_prefix(negative: bool, sign: char) -> &'static str {
    match (negative, sign) {
        (true, _) => "-",
        (false, '+') => "+",
        (false, ' ') => " ",
        _ => "",
    }
}

/// Insert `sep` every `every` digits in the leading digit run of `body`.
fn group_digits(body: &str, sep: char, every: usize) -> String {
    let digits_end = body
        .find(|c: char| !c.is_ascii_alphanumeric() || c == 'e' || c == 'E')
        .unwrap_or(body.len());
    let (digits, rest) = body.split_at(digits_end);
    let mut grouped = String::new();
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % every == 0 {
            grouped.push(sep);
        }
        grouped.push(c);
    }
    grouped.push_str(rest);
    grouped
}

fn format_int(i: i64, spec: &Spec) -> EvalResult<String> {
    if spec.precision.is_some() {
        return Err(EvalError::value_error(
            "precision not allowed in integer format specifier",
        ));
    }
    let kind = spec.kind.unwrap_or('d');
    if kind == 'c' {
        let c = u32::try_from(i)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| EvalError::value_error("%c arg not in range"))?;
        return pad("", &c.to_string(), spec, '>');
    }

    let abs = i.unsigned_abs();
    let mut digits = match kind {
        'x' => format!("{abs:x}"),
        'X' => format!("{abs:X}"),
        'o' => format!("{abs:o}"),
        'b' => format!("{abs:b}"),
        _ => abs.to_string(),
    };
    if let Some(sep) = spec.grouping {
        let every = if matches!(kind, 'd' | 'n') { 3 } else { 4 };
        digits = group_digits(&digits, sep, every);
    }
    let radix_prefix = match (spec.alternate, kind) {
        (true, 'x') => "0x",
        (true, 'X') => "0X",
        (true, 'o') => "0o",
        (true, 'b') => "0b",
        _ => "",
    };
    let prefix = format!("{}{radix_prefix}", sign_prefix(i < 0, spec.sign));
    pad(&prefix, &digits, spec, '>')
}

/// `d.ddde+XX` with `precision` fractional digits.
fn scientific(abs: f64, precision: usize, upper: bool) -> String {
    let text = format!("{abs:.precision$e}");
    let (mantissa, exp) = text.split_once('e').unwrap_or((text.as_str(), "0"));
    let exp: i32 = exp.parse().unwrap_or(0);
    let e = if upper { 'E' } else { 'e' };
    let sign = if exp < 0 { '-' } else { '+' };
    format!("{mantissa}{e}{sign}{:02}", exp.abs())
}

fn strip_fraction_zeros(text: &str) -> String {
    let (number, exp) = match text.find(['e', 'E']) {
        Some(pos) => text.split_at(pos),
        None => (text, ""),
    };
    let number = if number.contains('.') {
        number.trim_end_matches('0').trim_end_matches('.')
    } else {
        number
    };
    format!("{number}{exp}")
}

fn general(abs: f64, precision: usize, alternate: bool, upper: bool) -> String {
    let precision = precision.max(1);
    let exp = if abs == 0.0 {
        0
    } else {
        let text = format!("{abs:.prec$e}", prec = precision - 1);
        text.split_once('e')
            .and_then(|(_, e)| e.parse::<i32>().ok())
            .unwrap_or(0)
    };
    let text = if (-4..precision as i32).contains(&exp) {
        let frac = (precision as i32 - 1 - exp).max(0) as usize;
        format!("{abs:.frac$}")
    } else {
        scientific(abs, precision - 1, upper)
    };
    if alternate {
        text
    } else {
        strip_fraction_zeros(&text)
    }
}

fn format_float(x: f64, spec: &Spec) -> EvalResult<String> {
    let negative = x.is_sign_negative() && !x.is_nan();
    let abs = x.abs();
    let upper = matches!(spec.kind, Some('F' | 'E' | 'G'));

    let mut body = if !abs.is_finite() {
        let text = if abs.is_nan() { "nan" } else { "inf" };
        let text = if upper { text.to_uppercase() } else { text.to_string() };
        if spec.kind == Some('%') {
            format!("{text}%")
        } else {
            text
        }
    } else {
        match spec.kind {
            Some('f' | 'F') => format!("{abs:.p$}", p = spec.precision.unwrap_or(6)),
            Some('e' | 'E') => scientific(abs, spec.precision.unwrap_or(6), upper),
            Some('%') => format!("{:.p$}%", abs * 100.0, p = spec.precision.unwrap_or(6)),
            Some(_) => general(abs, spec.precision.unwrap_or(6), spec.alternate, upper),
            None => match spec.precision {
                Some(p) => {
                    let text = general(abs, p, spec.alternate, false);
                    if text.contains(['.', 'e']) {
                        text
                    } else {
                        format!("{text}.0")
                    }
                }
                None => float_repr(abs),
            },
        }
    };

    if let Some(sep) = spec.grouping {
        body = group_digits(&body, sep, 3);
    }
    pad(sign_prefix(negative, spec.sign), &body, spec, '>')
}

/// `template.format(*args, **kwargs)`.
pub fn format_template(
    template: &str,
    args: &[Value],
    kwargs: &[(String, Value)],
    limits: &Limits,
) -> EvalResult<String> {
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::new();
    let mut auto_index = 0usize;
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                out.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                out.push('}');
                i += 2;
            }
            '}' => return Err(EvalError::value_error("single '}' encountered in format string")),
            '{' => {
                let close = chars[i..]
                    .iter()
                    .position(|&c| c == '}')
                    .map(|offset| i + offset)
                    .ok_or_else(|| EvalError::value_error("single '{' encountered in format string"))?;
                let field: String = chars[i + 1..close].iter().collect();
                out.push_str(&render_field(&field, args, kwargs, &mut auto_index, limits)?);
                i = close + 1;
            }
            c => {
                out.push(c);
                i += 1;
            }
        }
        limits.check(out.len() as u128)?;
    }
    Ok(out)
}

fn render_field(
    field: &str,
    args: &[Value],
    kwargs: &[(String, Value)],
    auto_index: &mut usize,
    limits: &Limits,
) -> EvalResult<String> {
    let (head, spec) = field.split_once(':').unwrap_or((field, ""));
    let (name, conversion) = match head.split_once('!') {
        Some((name, conv)) => (name, Some(conv)),
        None => (head, None),
    };

    let value = if name.is_empty() {
        let value = args.get(*auto_index).ok_or(EvalError::Index)?;
        *auto_index += 1;
        value
    } else if let Ok(position) = name.parse::<usize>() {
        args.get(position).ok_or(EvalError::Index)?
    } else if name.contains(['.', '[']) {
        return Err(EvalError::value_error(
            "attribute and index lookups in format fields are not supported",
        ));
    } else {
        kwargs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .ok_or_else(|| EvalError::Key(name.to_string()))?
    };

    let converted = convert(value, conversion)?;
    format_value(converted.as_ref().unwrap_or(value), spec, limits)
}

/// Apply a `!s` / `!r` / `!a` conversion. `None` means "use the value as is".
pub fn convert(value: &Value, conversion: Option<&str>) -> EvalResult<Option<Value>> {
    match conversion {
        None => Ok(None),
        Some("s") => Ok(Some(Value::Str(value.to_string()))),
        Some("r") | Some("a") => Ok(Some(Value::Str(value.repr()))),
        Some(other) => Err(EvalError::value_error(format!(
            "unknown conversion specifier {other}"
        ))),
    }
}

/// `template % args` printf-style interpolation.
pub fn percent_format(template: &str, args: &Value, limits: &Limits) -> EvalResult<Value> {
    let args: Vec<Value> = match args {
        Value::Tuple(items) => items.clone(),
        other => vec![other.clone()],
    };
    let chars: Vec<char> = template.chars().collect();
    let mut out = String::new();
    let mut next_arg = args.iter();
    let mut i = 0;

    while i < chars.len() {
        if chars[i] != '%' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        i += 1;
        if chars.get(i) == Some(&'%') {
            out.push('%');
            i += 1;
            continue;
        }

        let mut spec = Spec::default();
        while let Some(&flag @ ('-' | '+' | ' ' | '0' | '#')) = chars.get(i) {
            match flag {
                '-' => spec.align = Some('<'),
                '+' | ' ' => spec.sign = if spec.sign == '+' { '+' } else { flag },
                '0' => spec.zero = true,
                _ => spec.alternate = true,
            }
            i += 1;
        }
        if spec.align.is_some() {
            spec.zero = false;
        } else {
            spec.align = None;
        }
        spec.width = read_number(&chars, &mut i).unwrap_or(0);
        if chars.get(i) == Some(&'.') {
            i += 1;
            spec.precision = Some(read_number(&chars, &mut i).unwrap_or(0));
        }
        let kind = *chars
            .get(i)
            .ok_or_else(|| EvalError::value_error("incomplete format"))?;
        i += 1;

        let arg = next_arg
            .next()
            .ok_or_else(|| EvalError::type_error("not enough arguments for format string"))?;
        let piece = match kind {
            's' | 'r' | 'a' => {
                let text = if kind == 's' { arg.to_string() } else { arg.repr() };
                spec.kind = Some('s');
                spec.sign = '-';
                apply_spec(&Value::Str(text), &spec, limits)?
            }
            'd' | 'i' | 'u' => {
                let int = match arg {
                    Value::Float(f) if f.is_finite() => Value::Int(f.trunc() as i64),
                    Value::Int(_) | Value::Bool(_) => arg.clone(),
                    other => {
                        return Err(EvalError::type_error(format!(
                            "%d format: a real number is required, not {}",
                            other.type_name()
                        )));
                    }
                };
                spec.precision = None;
                spec.kind = Some('d');
                apply_spec(&int, &spec, limits)?
            }
            'x' | 'X' | 'o' | 'c' => {
                spec.precision = None;
                spec.kind = Some(kind);
                apply_spec(arg, &spec, limits)?
            }
            'f' | 'F' | 'e' | 'E' | 'g' | 'G' => {
                spec.kind = Some(kind);
                apply_spec(arg, &spec, limits)?
            }
            other => {
                return Err(EvalError::value_error(format!(
                    "unsupported format character '{other}'"
                )));
            }
        };
        out.push_str(&piece);
    }

    if next_arg.next().is_some() {
        return Err(EvalError::type_error(
            "not all arguments converted during string formatting",
        ));
    }
    Ok(Value::Str(out))
}
