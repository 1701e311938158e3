// src/expr/lexer.rs

//! Tokenizer for the expression language.
//!
//! Produces a flat `Vec<Token>` terminated by [`Token::Eof`]. Literal values
//! (numbers, strings, bytes) are decoded here so the parser only deals with
//! structure.

use super::error::{EvalError, EvalResult};

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    Int(i64),
    Float(f64),
    Str(String),
    Bytes(Vec<u8>),
    FString(Vec<FStringPiece>),
    Name(String),
    Keyword(Keyword),
    Op(Op),
    Eof,
}

/// One piece of an f-string body.
#[derive(Debug, Clone, PartialEq)]
pub enum FStringPiece {
    Literal(String),
    Field {
        source: String,
        conversion: Option<char>,
        spec: String,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    And,
    Or,
    Not,
    In,
    Is,
    If,
    Else,
    For,
    True,
    False,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Op {
    LParen,
    RParen,
    LBracket,
    RBracket,
    LBrace,
    RBrace,
    Comma,
    Colon,
    Dot,
    Assign,
    Plus,
    Minus,
    Star,
    DoubleStar,
    Slash,
    DoubleSlash,
    Percent,
    Amp,
    Pipe,
    Caret,
    Tilde,
    LShift,
    RShift,
    Lt,
    Gt,
    Le,
    Ge,
    EqEq,
    NotEq,
}

/// Words that are reserved in the source language but unsupported here.
/// Seeing one is a syntax error rather than a name lookup.
const RESERVED: &[&str] = &[
    "lambda", "yield", "await", "async", "def", "class", "import", "from", "return", "del",
    "global", "nonlocal", "pass", "raise", "try", "except", "finally", "while", "with", "as",
    "assert", "break", "continue", "elif",
];

pub struct Lexer {
    chars: Vec<char>,
    pos: usize,
}

impl Lexer {
    pub fn new(source: &str) -> Self {
        Self {
            chars: source.chars().collect(),
            pos: 0,
        }
    }

    pub fn tokenize(mut self) -> EvalResult<Vec<Token>> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token()?;
            let done = token == Token::Eof;
            tokens.push(token);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn skip_trivia(&mut self) {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.pos += 1;
            } else if c == '#' {
                while let Some(c) = self.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.pos += 1;
                }
            } else {
                break;
            }
        }
    }

    fn next_token(&mut self) -> EvalResult<Token> {
        self.skip_trivia();
        let Some(c) = self.peek() else {
            return Ok(Token::Eof);
        };

        if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit()))
        {
            return self.lex_number();
        }
        if c == '\'' || c == '"' {
            return self.lex_string("");
        }
        if c.is_alphabetic() || c == '_' {
            return self.lex_word();
        }
        self.lex_operator(c)
    }

    fn lex_word(&mut self) -> EvalResult<Token> {
        let start = self.pos;
        while let Some(c) = self.peek() {
            if c.is_alphanumeric() || c == '_' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let word: String = self.chars[start..self.pos].iter().collect();

        if matches!(self.peek(), Some('\'') | Some('"')) && is_string_prefix(&word) {
            return self.lex_string(&word.to_ascii_lowercase());
        }

        let keyword = match word.as_str() {
            "and" => Keyword::And,
            "or" => Keyword::Or,
            "not" => Keyword::Not,
            "in" => Keyword::In,
            "is" => Keyword::Is,
            "if" => Keyword::If,
            "else" => Keyword::Else,
            "for" => Keyword::For,
            "True" => Keyword::True,
            "False" => Keyword::False,
            "None" => Keyword::None,
            other if RESERVED.contains(&other) => {
                return Err(EvalError::syntax(format!("unsupported keyword '{other}'")));
            }
            _ => return Ok(Token::Name(word)),
        };
        Ok(Token::Keyword(keyword))
    }

    fn lex_operator(&mut self, c: char) -> EvalResult<Token> {
        let next = self.peek_at(1);
        let (op, width) = match (c, next) {
            ('*', Some('*')) => (Op::DoubleStar, 2),
            ('/', Some('/')) => (Op::DoubleSlash, 2),
            ('<', Some('<')) => (Op::LShift, 2),
            ('>', Some('>')) => (Op::RShift, 2),
            ('<', Some('=')) => (Op::Le, 2),
            ('>', Some('=')) => (Op::Ge, 2),
            ('=', Some('=')) => (Op::EqEq, 2),
            ('!', Some('=')) => (Op::NotEq, 2),
            ('(', _) => (Op::LParen, 1),
            (')', _) => (Op::RParen, 1),
            ('[', _) => (Op::LBracket, 1),
            (']', _) => (Op::RBracket, 1),
            ('{', _) => (Op::LBrace, 1),
            ('}', _) => (Op::RBrace, 1),
            (',', _) => (Op::Comma, 1),
            (':', _) if next != Some('=') => (Op::Colon, 1),
            ('.', _) => (Op::Dot, 1),
            ('=', _) => (Op::Assign, 1),
            ('+', _) => (Op::Plus, 1),
            ('-', _) if next != Some('>') => (Op::Minus, 1),
            ('*', _) => (Op::Star, 1),
            ('/', _) => (Op::Slash, 1),
            ('%', _) => (Op::Percent, 1),
            ('&', _) => (Op::Amp, 1),
            ('|', _) => (Op::Pipe, 1),
            ('^', _) => (Op::Caret, 1),
            ('~', _) => (Op::Tilde, 1),
            ('<', _) => (Op::Lt, 1),
            ('>', _) => (Op::Gt, 1),
            _ => return Err(EvalError::syntax(format!("unexpected character '{c}'"))),
        };
        self.pos += width;
        Ok(Token::Op(op))
    }

    fn read_digits(&mut self, radix: u32) -> String {
        let mut out = String::new();
        while let Some(c) = self.peek() {
            if c.is_digit(radix) || c == '_' {
                out.push(c);
                self.pos += 1;
            } else {
                break;
            }
        }
        out
    }

    fn lex_number(&mut self) -> EvalResult<Token> {
        if self.peek() == Some('0') {
            let radix = match self.peek_at(1) {
                Some('x') | Some('X') => Some(16),
                Some('o') | Some('O') => Some(8),
                Some('b') | Some('B') => Some(2),
                _ => None,
            };
            if let Some(radix) = radix {
                self.pos += 2;
                let raw = self.read_digits(radix);
                let digits = strip_underscores(&raw, true)?;
                if digits.is_empty() {
                    return Err(EvalError::syntax("invalid integer literal"));
                }
                return i64::from_str_radix(&digits, radix)
                    .map(Token::Int)
                    .map_err(|_| EvalError::Overflow);
            }
        }

        let int_part = self.read_digits(10);
        let mut text = strip_underscores(&int_part, false)?;
        let mut is_float = false;

        if self.peek() == Some('.') {
            self.pos += 1;
            let frac = self.read_digits(10);
            text.push('.');
            text.push_str(&strip_underscores(&frac, false)?);
            is_float = true;
        }

        if matches!(self.peek(), Some('e') | Some('E')) {
            let sign = matches!(self.peek_at(1), Some('+') | Some('-'));
            let digit_at = if sign { 2 } else { 1 };
            if self.peek_at(digit_at).is_some_and(|d| d.is_ascii_digit()) {
                text.push('e');
                if sign {
                    text.extend(self.peek_at(1));
                }
                self.pos += digit_at;
                let exp = self.read_digits(10);
                text.push_str(&strip_underscores(&exp, false)?);
                is_float = true;
            }
        }

        if matches!(self.peek(), Some('j') | Some('J')) {
            return Err(EvalError::syntax("complex literals are not supported"));
        }

        if is_float {
            return text
                .parse::<f64>()
                .map(Token::Float)
                .map_err(|_| EvalError::syntax(format!("invalid float literal '{text}'")));
        }

        if text.len() > 1 && text.starts_with('0') && text.chars().any(|c| c != '0') {
            return Err(EvalError::syntax(
                "leading zeros in decimal integer literals are not permitted",
            ));
        }
        text.parse::<i64>()
            .map(Token::Int)
            .map_err(|_| EvalError::Overflow)
    }

    /// Lex a quoted literal. `prefix` is the lowercased string prefix
    /// (`r`, `b`, `f`, `rb`, ...), already consumed.
    fn lex_string(&mut self, prefix: &str) -> EvalResult<Token> {
        let raw = prefix.contains('r');
        let body = self.read_quoted_body()?;

        if prefix.contains('b') {
            if !body.is_ascii() {
                return Err(EvalError::syntax(
                    "bytes can only contain ASCII literal characters",
                ));
            }
            let bytes = if raw {
                body.into_bytes()
            } else {
                unescape_bytes(&body)?
            };
            return Ok(Token::Bytes(bytes));
        }

        if prefix.contains('f') {
            return split_fstring(&body, raw).map(Token::FString);
        }

        let text = if raw { body } else { unescape_str(&body)? };
        Ok(Token::Str(text))
    }

    /// Read everything between the opening and closing quotes, keeping
    /// escape sequences verbatim.
    fn read_quoted_body(&mut self) -> EvalResult<String> {
        let quote = self.peek().ok_or_else(|| EvalError::syntax("expected quote"))?;
        let triple = self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote);
        self.pos += if triple { 3 } else { 1 };

        let mut body = String::new();
        loop {
            let Some(c) = self.peek() else {
                return Err(EvalError::syntax("unterminated string literal"));
            };
            if c == '\\' {
                body.push(c);
                self.pos += 1;
                if let Some(escaped) = self.peek() {
                    body.push(escaped);
                    self.pos += 1;
                }
                continue;
            }
            if c == quote {
                if !triple {
                    self.pos += 1;
                    return Ok(body);
                }
                if self.peek_at(1) == Some(quote) && self.peek_at(2) == Some(quote) {
                    self.pos += 3;
                    return Ok(body);
                }
            }
            if c == '\n' && !triple {
                return Err(EvalError::syntax("unterminated string literal"));
            }
            body.push(c);
            self.pos += 1;
        }
    }
}

fn is_string_prefix(word: &str) -> bool {
    matches!(
        word.to_ascii_lowercase().as_str(),
        "r" | "u" | "b" | "f" | "rb" | "br" | "fr" | "rf"
    )
}

/// Remove digit separators, rejecting misplaced ones (`_1`, `1_`, `1__2`).
fn strip_underscores(raw: &str, after_prefix: bool) -> EvalResult<String> {
    let misplaced = raw.ends_with('_')
        || raw.contains("__")
        || (!after_prefix && raw.starts_with('_'));
    if misplaced {
        return Err(EvalError::syntax("invalid digit separator"));
    }
    Ok(raw.replace('_', ""))
}

/// Result of decoding the characters after a backslash.
enum Escape {
    /// A code point (or byte value) and how many characters it consumed.
    Code(u32, usize),
    /// Backslash-newline: dropped from the output.
    Continuation,
    /// Not an escape; the backslash is kept verbatim.
    Verbatim,
}

fn decode_escape(rest: &[char], bytes: bool) -> EvalResult<Escape> {
    let Some(&c) = rest.first() else {
        return Ok(Escape::Verbatim);
    };
    let simple = match c {
        '\\' => Some('\\'),
        '\'' => Some('\''),
        '"' => Some('"'),
        'n' => Some('\n'),
        't' => Some('\t'),
        'r' => Some('\r'),
        'a' => Some('\u{7}'),
        'b' => Some('\u{8}'),
        'f' => Some('\u{c}'),
        'v' => Some('\u{b}'),
        _ => None,
    };
    if let Some(ch) = simple {
        return Ok(Escape::Code(ch as u32, 1));
    }

    let hex = |len: usize| -> EvalResult<u32> {
        let digits: String = rest.iter().skip(1).take(len).collect();
        if digits.chars().count() != len || !digits.chars().all(|d| d.is_ascii_hexdigit()) {
            return Err(EvalError::syntax(format!("truncated \\{c} escape")));
        }
        u32::from_str_radix(&digits, 16).map_err(|_| EvalError::syntax("invalid escape"))
    };

    match c {
        'x' => Ok(Escape::Code(hex(2)?, 3)),
        'u' if !bytes => Ok(Escape::Code(hex(4)?, 5)),
        'U' if !bytes => Ok(Escape::Code(hex(8)?, 9)),
        'N' if !bytes => Err(EvalError::syntax("named unicode escapes are not supported")),
        '0'..='7' => {
            let digits: String = rest
                .iter()
                .take(3)
                .take_while(|d| ('0'..='7').contains(*d))
                .collect();
            let value = u32::from_str_radix(&digits, 8)
                .map_err(|_| EvalError::syntax("invalid octal escape"))?;
            Ok(Escape::Code(value, digits.len()))
        }
        '\n' => Ok(Escape::Continuation),
        _ => Ok(Escape::Verbatim),
    }
}

fn unescape_str(body: &str) -> EvalResult<String> {
    let chars: Vec<char> = body.chars().collect();
    let mut out = String::with_capacity(body.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i]);
            i += 1;
            continue;
        }
        match decode_escape(&chars[i + 1..], false)? {
            Escape::Code(code, used) => {
                let ch = char::from_u32(code)
                    .ok_or_else(|| EvalError::syntax("invalid unicode escape"))?;
                out.push(ch);
                i += 1 + used;
            }
            Escape::Continuation => i += 2,
            Escape::Verbatim => {
                out.push('\\');
                i += 1;
            }
        }
    }
    Ok(out)
}

fn unescape_bytes(body: &str) -> EvalResult<Vec<u8>> {
    let chars: Vec<char> = body.chars().collect();
    let mut out = Vec::with_capacity(body.len());
    let mut i = 0;
    while i < chars.len() {
        if chars[i] != '\\' {
            out.push(chars[i] as u8);
            i += 1;
            continue;
        }
        match decode_escape(&chars[i + 1..], true)? {
            Escape::Code(code, used) => {
                let byte =
                    u8::try_from(code).map_err(|_| EvalError::syntax("byte escape out of range"))?;
                out.push(byte);
                i += 1 + used;
            }
            Escape::Continuation => i += 2,
            Escape::Verbatim => {
                out.push(b'\\');
                i += 1;
            }
        }
    }
    Ok(out)
}

/// Split an f-string body into literal runs and replacement fields.
fn split_fstring(body: &str, raw: bool) -> EvalResult<Vec<FStringPiece>> {
    let chars: Vec<char> = body.chars().collect();
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut i = 0;

    while i < chars.len() {
        match chars[i] {
            '{' if chars.get(i + 1) == Some(&'{') => {
                literal.push('{');
                i += 2;
            }
            '}' if chars.get(i + 1) == Some(&'}') => {
                literal.push('}');
                i += 2;
            }
            '}' => return Err(EvalError::syntax("single '}' is not allowed in f-string")),
            '{' => {
                flush_literal(&mut literal, &mut pieces, raw)?;
                let (field, next) = read_fstring_field(&chars, i + 1)?;
                pieces.push(field);
                i = next;
            }
            c => {
                literal.push(c);
                i += 1;
            }
        }
    }
    flush_literal(&mut literal, &mut pieces, raw)?;
    Ok(pieces)
}

fn flush_literal(literal: &mut String, pieces: &mut Vec<FStringPiece>, raw: bool) -> EvalResult<()> {
    if literal.is_empty() {
        return Ok(());
    }
    let text = std::mem::take(literal);
    let text = if raw { text } else { unescape_str(&text)? };
    pieces.push(FStringPiece::Literal(text));
    Ok(())
}

/// Read one `{expr!conv:spec}` field starting just after the `{`. Returns the
/// field and the index just past the closing `}`.
fn read_fstring_field(chars: &[char], start: usize) -> EvalResult<(FStringPiece, usize)> {
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut i = start;

    let expr_end = loop {
        let Some(&c) = chars.get(i) else {
            return Err(EvalError::syntax("unterminated f-string field"));
        };
        if let Some(q) = quote {
            if c == q {
                quote = None;
            }
            i += 1;
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => depth += 1,
            ')' | ']' | '}' if depth > 0 => depth -= 1,
            '}' => break i,
            ':' if depth == 0 => break i,
            '!' if depth == 0 && chars.get(i + 1) != Some(&'=') => break i,
            _ => {}
        }
        i += 1;
    };

    let source: String = chars[start..expr_end].iter().collect();
    if source.trim().is_empty() {
        return Err(EvalError::syntax("empty expression in f-string"));
    }

    let mut i = expr_end;
    let mut conversion = None;
    if chars.get(i) == Some(&'!') {
        match chars.get(i + 1) {
            Some(&c @ ('s' | 'r' | 'a')) => conversion = Some(c),
            _ => return Err(EvalError::syntax("invalid f-string conversion")),
        }
        i += 2;
    }

    let mut spec = String::new();
    if chars.get(i) == Some(&':') {
        i += 1;
        while let Some(&c) = chars.get(i) {
            if c == '}' {
                break;
            }
            if c == '{' {
                return Err(EvalError::syntax("nested f-string format specs are not supported"));
            }
            spec.push(c);
            i += 1;
        }
    }

    if chars.get(i) != Some(&'}') {
        return Err(EvalError::syntax("expected '}' in f-string"));
    }

    Ok((
        FStringPiece::Field {
            source,
            conversion,
            spec,
        },
        i + 1,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lex(src: &str) -> Vec<Token> {
        Lexer::new(src).tokenize().unwrap()
    }

    #[test]
    fn numbers_in_every_base() {
        assert_eq!(
            lex("0x1f 0o17 0b101 1_000"),
            vec![
                Token::Int(31),
                Token::Int(15),
                Token::Int(5),
                Token::Int(1000),
                Token::Eof
            ]
        );
    }

    #[test]
    fn float_forms() {
        assert_eq!(
            lex("1.5 .5 1e3 2."),
            vec![
                Token::Float(1.5),
                Token::Float(0.5),
                Token::Float(1000.0),
                Token::Float(2.0),
                Token::Eof
            ]
        );
    }

    #[test]
    fn leading_zero_is_rejected() {
        assert!(Lexer::new("01").tokenize().is_err());
        assert_eq!(lex("00"), vec![Token::Int(0), Token::Eof]);
    }

    #[test]
    fn string_escapes_and_prefixes() {
        assert_eq!(
            lex(r#"'a\tb' r'a\tb' b'\x41'"#),
            vec![
                Token::Str("a\tb".to_string()),
                Token::Str("a\\tb".to_string()),
                Token::Bytes(vec![b'A']),
                Token::Eof
            ]
        );
    }

    #[test]
    fn unknown_escape_is_kept() {
        assert_eq!(lex(r"'\d'"), vec![Token::Str("\\d".to_string()), Token::Eof]);
    }

    #[test]
    fn fstring_fields() {
        let tokens = lex("f'x{i:03}y{{'");
        assert_eq!(
            tokens[0],
            Token::FString(vec![
                FStringPiece::Literal("x".to_string()),
                FStringPiece::Field {
                    source: "i".to_string(),
                    conversion: None,
                    spec: "03".to_string(),
                },
                FStringPiece::Literal("y{".to_string()),
            ])
        );
    }

    #[test]
    fn reserved_words_are_errors() {
        assert!(Lexer::new("lambda: 1").tokenize().is_err());
    }
}
