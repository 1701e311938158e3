// src/expr/parser.rs

//! Recursive-descent parser over the lexer's token stream.
//!
//! Precedence, loosest first: conditional, `or`, `and`, `not`, comparisons,
//! `|`, `^`, `&`, shifts, `+ -`, `* / // %`, unary `+ - ~`, `**`, then
//! calls / subscripts / attribute access.

use super::ast::{
    BinaryOp, CompareOp, Comprehension, ComprehensionKind, Expr, FStringPart, ForClause,
    LogicalOp, Target, UnaryOp,
};
use super::error::{EvalError, EvalResult};
use super::lexer::{FStringPiece, Keyword, Lexer, Op, Token};
use super::value::Value;

/// Parse a complete expression. Trailing input is a syntax error.
pub fn parse(source: &str) -> EvalResult<Expr> {
    let tokens = Lexer::new(source).tokenize()?;
    let mut parser = Parser { tokens, pos: 0 };
    let expr = parser.expression_list()?;
    if parser.peek() != &Token::Eof {
        return Err(EvalError::syntax(format!(
            "unexpected {} after expression",
            describe(parser.peek())
        )));
    }
    Ok(expr)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    // The lexer always terminates the stream with `Eof`, so clamping to the
    // last index keeps every lookahead in bounds.
    fn peek(&self) -> &Token {
        &self.tokens[self.pos.min(self.tokens.len() - 1)]
    }

    fn peek_next(&self) -> &Token {
        &self.tokens[(self.pos + 1).min(self.tokens.len() - 1)]
    }

    fn advance(&mut self) -> Token {
        let token = self.peek().clone();
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
        token
    }

    fn at_op(&self, op: Op) -> bool {
        self.peek() == &Token::Op(op)
    }

    fn at_keyword(&self, kw: Keyword) -> bool {
        self.peek() == &Token::Keyword(kw)
    }

    fn eat_op(&mut self, op: Op) -> bool {
        if self.at_op(op) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn eat_keyword(&mut self, kw: Keyword) -> bool {
        if self.at_keyword(kw) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    fn expect_op(&mut self, op: Op, what: &str) -> EvalResult<()> {
        if self.eat_op(op) {
            Ok(())
        } else {
            Err(EvalError::syntax(format!(
                "expected {what}, found {}",
                describe(self.peek())
            )))
        }
    }

    /// True when the next token cannot start an expression, so a trailing
    /// comma ends the list.
    fn at_list_end(&self) -> bool {
        matches!(
            self.peek(),
            Token::Eof
                | Token::Op(Op::RParen)
                | Token::Op(Op::RBracket)
                | Token::Op(Op::RBrace)
                | Token::Op(Op::Assign)
                | Token::Keyword(Keyword::In)
        )
    }

    /// `expr (',' expr)* [',']`, producing a tuple when a comma is present.
    fn expression_list(&mut self) -> EvalResult<Expr> {
        let first = self.expression()?;
        if !self.at_op(Op::Comma) {
            return Ok(first);
        }
        let mut items = vec![first];
        while self.eat_op(Op::Comma) {
            if self.at_list_end() {
                break;
            }
            items.push(self.expression()?);
        }
        Ok(Expr::Tuple(items))
    }

    fn expression(&mut self) -> EvalResult<Expr> {
        let value = self.or_test()?;
        if !self.eat_keyword(Keyword::If) {
            return Ok(value);
        }
        let condition = self.or_test()?;
        if !self.eat_keyword(Keyword::Else) {
            return Err(EvalError::syntax("expected 'else' in conditional expression"));
        }
        let otherwise = self.expression()?;
        Ok(Expr::Conditional {
            condition: Box::new(condition),
            then: Box::new(value),
            otherwise: Box::new(otherwise),
        })
    }

    fn or_test(&mut self) -> EvalResult<Expr> {
        let mut left = self.and_test()?;
        while self.eat_keyword(Keyword::Or) {
            let right = self.and_test()?;
            left = Expr::Logical {
                op: LogicalOp::Or,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn and_test(&mut self) -> EvalResult<Expr> {
        let mut left = self.not_test()?;
        while self.eat_keyword(Keyword::And) {
            let right = self.not_test()?;
            left = Expr::Logical {
                op: LogicalOp::And,
                left: Box::new(left),
                right: Box::new(right),
            };
        }
        Ok(left)
    }

    fn not_test(&mut self) -> EvalResult<Expr> {
        if self.eat_keyword(Keyword::Not) {
            let operand = self.not_test()?;
            return Ok(Expr::Unary {
                op: UnaryOp::Not,
                operand: Box::new(operand),
            });
        }
        self.comparison()
    }

    fn compare_op(&mut self) -> Option<CompareOp> {
        let op = match self.peek() {
            Token::Op(Op::EqEq) => CompareOp::Eq,
            Token::Op(Op::NotEq) => CompareOp::NotEq,
            Token::Op(Op::Lt) => CompareOp::Lt,
            Token::Op(Op::Le) => CompareOp::Le,
            Token::Op(Op::Gt) => CompareOp::Gt,
            Token::Op(Op::Ge) => CompareOp::Ge,
            Token::Keyword(Keyword::In) => CompareOp::In,
            Token::Keyword(Keyword::Not)
                if self.peek_next() == &Token::Keyword(Keyword::In) =>
            {
                self.pos += 2;
                return Some(CompareOp::NotIn);
            }
            Token::Keyword(Keyword::Is) => {
                self.pos += 1;
                return Some(if self.eat_keyword(Keyword::Not) {
                    CompareOp::IsNot
                } else {
                    CompareOp::Is
                });
            }
            _ => return None,
        };
        self.pos += 1;
        Some(op)
    }

    fn comparison(&mut self) -> EvalResult<Expr> {
        let first = self.bit_or()?;
        let mut rest = Vec::new();
        while let Some(op) = self.compare_op() {
            rest.push((op, self.bit_or()?));
        }
        if rest.is_empty() {
            Ok(first)
        } else {
            Ok(Expr::Compare {
                first: Box::new(first),
                rest,
            })
        }
    }

    fn binary_level(
        &mut self,
        ops: &[(Op, BinaryOp)],
        next: fn(&mut Self) -> EvalResult<Expr>,
    ) -> EvalResult<Expr> {
        let mut left = next(self)?;
        'outer: loop {
            for (token_op, op) in ops {
                if self.eat_op(*token_op) {
                    let right = next(self)?;
                    left = Expr::Binary {
                        op: *op,
                        left: Box::new(left),
                        right: Box::new(right),
                    };
                    continue 'outer;
                }
            }
            return Ok(left);
        }
    }

    fn bit_or(&mut self) -> EvalResult<Expr> {
        self.binary_level(&[(Op::Pipe, BinaryOp::BitOr)], Self::bit_xor)
    }

    fn bit_xor(&mut self) -> EvalResult<Expr> {
        self.binary_level(&[(Op::Caret, BinaryOp::BitXor)], Self::bit_and)
    }

    fn bit_and(&mut self) -> EvalResult<Expr> {
        self.binary_level(&[(Op::Amp, BinaryOp::BitAnd)], Self::shift)
    }

    fn shift(&mut self) -> EvalResult<Expr> {
        self.binary_level(
            &[(Op::LShift, BinaryOp::LShift), (Op::RShift, BinaryOp::RShift)],
            Self::arith,
        )
    }

    fn arith(&mut self) -> EvalResult<Expr> {
        self.binary_level(
            &[(Op::Plus, BinaryOp::Add), (Op::Minus, BinaryOp::Sub)],
            Self::term,
        )
    }

    fn term(&mut self) -> EvalResult<Expr> {
        self.binary_level(
            &[
                (Op::Star, BinaryOp::Mul),
                (Op::Slash, BinaryOp::Div),
                (Op::DoubleSlash, BinaryOp::FloorDiv),
                (Op::Percent, BinaryOp::Mod),
            ],
            Self::factor,
        )
    }

    fn factor(&mut self) -> EvalResult<Expr> {
        let op = match self.peek() {
            Token::Op(Op::Minus) => UnaryOp::Neg,
            Token::Op(Op::Plus) => UnaryOp::Pos,
            Token::Op(Op::Tilde) => UnaryOp::Invert,
            _ => return self.power(),
        };
        self.pos += 1;
        let operand = self.factor()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    /// `primary ['**' factor]`; right-associative and tighter than a unary
    /// operator on its left, so `-2 ** 2` is `-(2 ** 2)`.
    fn power(&mut self) -> EvalResult<Expr> {
        let base = self.primary()?;
        if self.eat_op(Op::DoubleStar) {
            let exponent = self.factor()?;
            return Ok(Expr::Binary {
                op: BinaryOp::Pow,
                left: Box::new(base),
                right: Box::new(exponent),
            });
        }
        Ok(base)
    }

    fn primary(&mut self) -> EvalResult<Expr> {
        let mut expr = self.atom()?;
        loop {
            if self.eat_op(Op::LParen) {
                expr = self.call(expr)?;
            } else if self.eat_op(Op::LBracket) {
                expr = self.subscript(expr)?;
            } else if self.eat_op(Op::Dot) {
                let Token::Name(name) = self.advance() else {
                    return Err(EvalError::syntax("expected attribute name after '.'"));
                };
                expr = Expr::Attribute {
                    value: Box::new(expr),
                    name,
                };
            } else {
                return Ok(expr);
            }
        }
    }

    fn call(&mut self, func: Expr) -> EvalResult<Expr> {
        let mut args = Vec::new();
        let mut kwargs = Vec::new();

        while !self.at_op(Op::RParen) {
            if let (Token::Name(name), Token::Op(Op::Assign)) = (self.peek(), self.peek_next()) {
                let name = name.clone();
                self.pos += 2;
                kwargs.push((name, self.expression()?));
            } else {
                if !kwargs.is_empty() {
                    return Err(EvalError::syntax(
                        "positional argument follows keyword argument",
                    ));
                }
                let arg = self.expression()?;
                if self.at_keyword(Keyword::For) {
                    // Bare generator argument: `sum(x for x in xs)`.
                    let clauses = self.for_clauses()?;
                    args.push(Expr::Comprehension(Box::new(Comprehension {
                        kind: ComprehensionKind::Generator,
                        element: arg,
                        value: None,
                        clauses,
                    })));
                } else {
                    args.push(arg);
                }
            }
            if !self.eat_op(Op::Comma) {
                break;
            }
        }
        self.expect_op(Op::RParen, "')' to close call")?;

        Ok(Expr::Call {
            func: Box::new(func),
            args,
            kwargs,
        })
    }

    fn subscript(&mut self, value: Expr) -> EvalResult<Expr> {
        let lower = if self.at_op(Op::Colon) {
            None
        } else {
            let index = self.expression()?;
            if self.eat_op(Op::RBracket) {
                return Ok(Expr::Index {
                    value: Box::new(value),
                    index: Box::new(index),
                });
            }
            Some(Box::new(index))
        };

        self.expect_op(Op::Colon, "':' or ']' in subscript")?;
        let upper = if self.at_op(Op::Colon) || self.at_op(Op::RBracket) {
            None
        } else {
            Some(Box::new(self.expression()?))
        };
        let step = if self.eat_op(Op::Colon) && !self.at_op(Op::RBracket) {
            Some(Box::new(self.expression()?))
        } else {
            None
        };
        self.expect_op(Op::RBracket, "']' to close subscript")?;

        Ok(Expr::Slice {
            value: Box::new(value),
            lower,
            upper,
            step,
        })
    }

    fn atom(&mut self) -> EvalResult<Expr> {
        match self.advance() {
            Token::Int(i) => Ok(Expr::Constant(Value::Int(i))),
            Token::Float(f) => Ok(Expr::Constant(Value::Float(f))),
            Token::Keyword(Keyword::True) => Ok(Expr::Constant(Value::Bool(true))),
            Token::Keyword(Keyword::False) => Ok(Expr::Constant(Value::Bool(false))),
            Token::Keyword(Keyword::None) => Ok(Expr::Constant(Value::None)),
            Token::Name(name) => Ok(Expr::Name(name)),
            token @ (Token::Str(_) | Token::Bytes(_) | Token::FString(_)) => {
                self.string_run(token)
            }
            Token::Op(Op::LParen) => self.paren(),
            Token::Op(Op::LBracket) => self.bracket(),
            Token::Op(Op::LBrace) => self.brace(),
            other => Err(EvalError::syntax(format!("unexpected {}", describe(&other)))),
        }
    }

    /// Adjacent string literals concatenate: `'a' 'b'` is `'ab'`.
    fn string_run(&mut self, first: Token) -> EvalResult<Expr> {
        let mut tokens = vec![first];
        while matches!(
            self.peek(),
            Token::Str(_) | Token::Bytes(_) | Token::FString(_)
        ) {
            tokens.push(self.advance());
        }

        let all_bytes = tokens.iter().all(|t| matches!(t, Token::Bytes(_)));
        let any_bytes = tokens.iter().any(|t| matches!(t, Token::Bytes(_)));
        if any_bytes && !all_bytes {
            return Err(EvalError::syntax("cannot mix bytes and nonbytes literals"));
        }
        if all_bytes {
            let mut bytes = Vec::new();
            for token in tokens {
                if let Token::Bytes(b) = token {
                    bytes.extend(b);
                }
            }
            return Ok(Expr::Constant(Value::Bytes(bytes)));
        }

        let mut parts = Vec::new();
        let mut is_fstring = false;
        for token in tokens {
            match token {
                Token::Str(s) => parts.push(FStringPart::Literal(s)),
                Token::FString(pieces) => {
                    is_fstring = true;
                    for piece in pieces {
                        parts.push(match piece {
                            FStringPiece::Literal(s) => FStringPart::Literal(s),
                            FStringPiece::Field {
                                source,
                                conversion,
                                spec,
                            } => FStringPart::Field {
                                expr: parse(&source)?,
                                conversion,
                                spec,
                            },
                        });
                    }
                }
                _ => {}
            }
        }

        if is_fstring {
            return Ok(Expr::FString(parts));
        }
        let text: String = parts
            .into_iter()
            .map(|part| match part {
                FStringPart::Literal(s) => s,
                FStringPart::Field { .. } => String::new(),
            })
            .collect();
        Ok(Expr::Constant(Value::Str(text)))
    }

    fn paren(&mut self) -> EvalResult<Expr> {
        if self.eat_op(Op::RParen) {
            return Ok(Expr::Tuple(Vec::new()));
        }
        let first = self.expression()?;
        if self.at_keyword(Keyword::For) {
            let comprehension = self.comprehension(ComprehensionKind::Generator, first, None)?;
            self.expect_op(Op::RParen, "')' to close generator expression")?;
            return Ok(comprehension);
        }
        if !self.at_op(Op::Comma) {
            self.expect_op(Op::RParen, "')'")?;
            return Ok(first);
        }
        let items = self.items_after(first, Op::RParen)?;
        Ok(Expr::Tuple(items))
    }

    fn bracket(&mut self) -> EvalResult<Expr> {
        if self.eat_op(Op::RBracket) {
            return Ok(Expr::List(Vec::new()));
        }
        let first = self.expression()?;
        if self.at_keyword(Keyword::For) {
            let comprehension = self.comprehension(ComprehensionKind::List, first, None)?;
            self.expect_op(Op::RBracket, "']' to close list comprehension")?;
            return Ok(comprehension);
        }
        let items = self.items_after(first, Op::RBracket)?;
        Ok(Expr::List(items))
    }

    fn brace(&mut self) -> EvalResult<Expr> {
        if self.eat_op(Op::RBrace) {
            return Ok(Expr::Dict(Vec::new()));
        }
        let first = self.expression()?;

        if self.eat_op(Op::Colon) {
            let value = self.expression()?;
            if self.at_keyword(Keyword::For) {
                let comprehension =
                    self.comprehension(ComprehensionKind::Dict, first, Some(value))?;
                self.expect_op(Op::RBrace, "'}' to close dict comprehension")?;
                return Ok(comprehension);
            }
            let mut pairs = vec![(first, value)];
            while self.eat_op(Op::Comma) {
                if self.at_op(Op::RBrace) {
                    break;
                }
                let key = self.expression()?;
                self.expect_op(Op::Colon, "':' in dict literal")?;
                let value = self.expression()?;
                pairs.push((key, value));
            }
            self.expect_op(Op::RBrace, "'}' to close dict literal")?;
            return Ok(Expr::Dict(pairs));
        }

        if self.at_keyword(Keyword::For) {
            let comprehension = self.comprehension(ComprehensionKind::Set, first, None)?;
            self.expect_op(Op::RBrace, "'}' to close set comprehension")?;
            return Ok(comprehension);
        }
        let items = self.items_after(first, Op::RBrace)?;
        Ok(Expr::Set(items))
    }

    /// Remaining comma-separated items of a display whose first item was
    /// already parsed, including the closing delimiter.
    fn items_after(&mut self, first: Expr, close: Op) -> EvalResult<Vec<Expr>> {
        let mut items = vec![first];
        while self.eat_op(Op::Comma) {
            if self.at_op(close) {
                break;
            }
            items.push(self.expression()?);
        }
        self.expect_op(close, "closing bracket")?;
        Ok(items)
    }

    fn comprehension(
        &mut self,
        kind: ComprehensionKind,
        element: Expr,
        value: Option<Expr>,
    ) -> EvalResult<Expr> {
        let clauses = self.for_clauses()?;
        Ok(Expr::Comprehension(Box::new(Comprehension {
            kind,
            element,
            value,
            clauses,
        })))
    }

    fn for_clauses(&mut self) -> EvalResult<Vec<ForClause>> {
        let mut clauses = Vec::new();
        while self.eat_keyword(Keyword::For) {
            let target = self.target_list()?;
            if !self.eat_keyword(Keyword::In) {
                return Err(EvalError::syntax("expected 'in' in comprehension"));
            }
            let iter = self.or_test()?;
            let mut conditions = Vec::new();
            while self.eat_keyword(Keyword::If) {
                conditions.push(self.or_test()?);
            }
            clauses.push(ForClause {
                target,
                iter,
                conditions,
            });
        }
        Ok(clauses)
    }

    fn target_list(&mut self) -> EvalResult<Target> {
        let first = self.target()?;
        if !self.at_op(Op::Comma) {
            return Ok(first);
        }
        let mut targets = vec![first];
        while self.eat_op(Op::Comma) {
            if self.at_list_end() {
                break;
            }
            targets.push(self.target()?);
        }
        Ok(Target::Unpack(targets))
    }

    fn target(&mut self) -> EvalResult<Target> {
        match self.advance() {
            Token::Name(name) => Ok(Target::Name(name)),
            Token::Op(open @ (Op::LParen | Op::LBracket)) => {
                let close = if open == Op::LParen {
                    Op::RParen
                } else {
                    Op::RBracket
                };
                let mut targets = Vec::new();
                while !self.at_op(close) {
                    targets.push(self.target()?);
                    if !self.eat_op(Op::Comma) {
                        break;
                    }
                }
                self.expect_op(close, "closing bracket in loop target")?;
                Ok(Target::Unpack(targets))
            }
            other => Err(EvalError::syntax(format!(
                "cannot assign to {}",
                describe(&other)
            ))),
        }
    }
}

fn describe(token: &Token) -> String {
    match token {
        Token::Int(i) => format!("number {i}"),
        Token::Float(f) => format!("number {f}"),
        Token::Str(_) | Token::FString(_) => "string literal".to_string(),
        Token::Bytes(_) => "bytes literal".to_string(),
        Token::Name(name) => format!("name '{name}'"),
        Token::Keyword(kw) => format!("keyword {kw:?}"),
        Token::Op(op) => format!("operator {op:?}"),
        Token::Eof => "end of input".to_string(),
    }
}
