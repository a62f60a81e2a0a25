//! User permittivity expressions in the wavelength `x` (nm).
//!
//! A program is a list of statements, one per line (or separated by `;`):
//! ```text
//! val a = 92842.09
//! fun f(q) = 5.1529 + a / (q * q - 86436)
//! return (f(x), 0.01)
//! ```
//! - `val name = expr` defines a value that later lines may use
//! - `fun name(p, ...) = expr` defines a function of its parameters, `x`,
//!   earlier values and earlier functions
//! - `return expr` or `return (re, im)` must be the single, last statement
//!
//! Arithmetic is real-valued with `+ - * / ^`, unary minus and the built-ins
//! `sqrt exp ln log sin cos tan asin acos atan abs pow`. `log` is the
//! decimal logarithm. `pi` and `e` are predefined. Every name is resolved
//! when the program is parsed, so evaluation itself cannot fail.

use std::fmt;

use num_complex::Complex64;

use crate::error::{Error, Result};


#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Ident(usize, usize),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    LParen,
    RParen,
    Comma,
    Assign,
}

fn invalid(line: usize, detail: impl fmt::Display) -> Error {
    Error::structural("Invalid expression", format!("line {}: {}", line, detail))
}

fn tokenize(text: &str, line: usize) -> Result<Vec<Token>> {
    let bytes = text.as_bytes();
    let mut tokens = Vec::new();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i] as char;
        match c {
            ' ' | '\t' | '\r' => i += 1,
            '+' => push(&mut tokens, &mut i, Token::Plus),
            '-' => push(&mut tokens, &mut i, Token::Minus),
            '*' => push(&mut tokens, &mut i, Token::Star),
            '/' => push(&mut tokens, &mut i, Token::Slash),
            '^' => push(&mut tokens, &mut i, Token::Caret),
            '(' => push(&mut tokens, &mut i, Token::LParen),
            ')' => push(&mut tokens, &mut i, Token::RParen),
            ',' => push(&mut tokens, &mut i, Token::Comma),
            '=' => push(&mut tokens, &mut i, Token::Assign),
            _ if c.is_ascii_digit() || c == '.' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_digit() || bytes[i] == b'.') {
                    i += 1;
                }
                // exponent part, e.g. 1.5e-3
                if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
                    let mut j = i + 1;
                    if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
                        j += 1;
                    }
                    if j < bytes.len() && bytes[j].is_ascii_digit() {
                        i = j;
                        while i < bytes.len() && bytes[i].is_ascii_digit() {
                            i += 1;
                        }
                    }
                }
                let literal = &text[start..i];
                let value = literal
                    .parse::<f64>()
                    .map_err(|_| invalid(line, format!("bad number \"{}\"", literal)))?;
                tokens.push(Token::Number(value));
            }
            _ if c.is_ascii_alphabetic() || c == '_' => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                tokens.push(Token::Ident(start, i));
            }
            other => return Err(invalid(line, format!("unexpected character '{}'", other))),
        }
    }
    Ok(tokens)
}

fn push(tokens: &mut Vec<Token>, i: &mut usize, token: Token) {
    tokens.push(token);
    *i += 1;
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Builtin {
    Sqrt,
    Exp,
    Ln,
    Log,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Abs,
    Pow,
}

impl Builtin {
    fn lookup(name: &str) -> Option<Self> {
        let builtin = match name {
            "sqrt" => Builtin::Sqrt,
            "exp" => Builtin::Exp,
            "ln" => Builtin::Ln,
            "log" => Builtin::Log,
            "sin" => Builtin::Sin,
            "cos" => Builtin::Cos,
            "tan" => Builtin::Tan,
            "asin" => Builtin::Asin,
            "acos" => Builtin::Acos,
            "atan" => Builtin::Atan,
            "abs" => Builtin::Abs,
            "pow" => Builtin::Pow,
            _ => return None,
        };
        Some(builtin)
    }

    fn arity(&self) -> usize {
        match self {
            Builtin::Pow => 2,
            _ => 1,
        }
    }

    fn apply(&self, args: &[f64]) -> f64 {
        let a = args[0];
        match self {
            Builtin::Sqrt => a.sqrt(),
            Builtin::Exp => a.exp(),
            Builtin::Ln => a.ln(),
            Builtin::Log => a.log10(),
            Builtin::Sin => a.sin(),
            Builtin::Cos => a.cos(),
            Builtin::Tan => a.tan(),
            Builtin::Asin => a.asin(),
            Builtin::Acos => a.acos(),
            Builtin::Atan => a.atan(),
            Builtin::Abs => a.abs(),
            Builtin::Pow => a.powf(args[1]),
        }
    }
}

/// Resolved name reference.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Name {
    X,
    /// Index into the program's values.
    Value(usize),
    /// Index into the enclosing function's parameters.
    Param(usize),
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Number(f64),
    Name(Name),
    Neg(Box<Node>),
    Binary(BinaryOp, Box<Node>, Box<Node>),
    Builtin(Builtin, Vec<Node>),
    /// Call of a user function by index.
    Call(usize, Vec<Node>),
}

#[derive(Debug, Clone, PartialEq)]
struct Function {
    name: String,
    params: Vec<String>,
    body: Node,
}

#[derive(Debug, Clone, PartialEq)]
enum Return {
    Real(Node),
    Complex(Node, Node),
}

/// Names visible while parsing one statement.
struct Scope<'a> {
    values: &'a [(String, Node)],
    functions: &'a [Function],
    params: &'a [String],
}

struct Parser<'a> {
    text: &'a str,
    tokens: Vec<Token>,
    pos: usize,
    line: usize,
    scope: Scope<'a>,
}

impl<'a> Parser<'a> {
    fn new(text: &'a str, line: usize, scope: Scope<'a>) -> Result<Self> {
        Ok(Self {
            text,
            tokens: tokenize(text, line)?,
            pos: 0,
            line,
            scope,
        })
    }

    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    fn expect(&mut self, token: Token, what: &str) -> Result<()> {
        match self.next() {
            Some(t) if t == token => Ok(()),
            _ => Err(invalid(self.line, format!("expected {}", what))),
        }
    }

    fn ident(&self, start: usize, end: usize) -> &'a str {
        &self.text[start..end]
    }

    fn expect_ident(&mut self) -> Result<String> {
        match self.next() {
            Some(Token::Ident(s, e)) => Ok(self.ident(s, e).to_string()),
            _ => Err(invalid(self.line, "expected a name")),
        }
    }

    fn finish(&self) -> Result<()> {
        if self.pos < self.tokens.len() {
            return Err(invalid(self.line, "unexpected trailing input"));
        }
        Ok(())
    }

    fn expression(&mut self) -> Result<Node> {
        let mut node = self.term()?;
        loop {
            let op = match self.peek() {
                Some(Token::Plus) => BinaryOp::Add,
                Some(Token::Minus) => BinaryOp::Sub,
                _ => return Ok(node),
            };
            self.pos += 1;
            node = Node::Binary(op, Box::new(node), Box::new(self.term()?));
        }
    }

    fn term(&mut self) -> Result<Node> {
        let mut node = self.unary()?;
        loop {
            let op = match self.peek() {
                Some(Token::Star) => BinaryOp::Mul,
                Some(Token::Slash) => BinaryOp::Div,
                _ => return Ok(node),
            };
            self.pos += 1;
            node = Node::Binary(op, Box::new(node), Box::new(self.unary()?));
        }
    }

    fn unary(&mut self) -> Result<Node> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                Ok(Node::Neg(Box::new(self.unary()?)))
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.unary()
            }
            _ => self.power(),
        }
    }

    /// Right-associative, binds tighter than unary minus on its left.
    fn power(&mut self) -> Result<Node> {
        let base = self.atom()?;
        if self.peek() == Some(Token::Caret) {
            self.pos += 1;
            let exponent = self.unary()?;
            return Ok(Node::Binary(BinaryOp::Pow, Box::new(base), Box::new(exponent)));
        }
        Ok(base)
    }

    fn atom(&mut self) -> Result<Node> {
        match self.next() {
            Some(Token::Number(v)) => Ok(Node::Number(v)),
            Some(Token::LParen) => {
                let node = self.expression()?;
                self.expect(Token::RParen, "')'")?;
                Ok(node)
            }
            Some(Token::Ident(s, e)) => {
                let name = self.ident(s, e);
                if self.peek() == Some(Token::LParen) {
                    self.pos += 1;
                    let args = self.arguments()?;
                    self.call(name, args)
                } else {
                    self.variable(name)
                }
            }
            _ => Err(invalid(self.line, "expected a number, a name or '('")),
        }
    }

    fn arguments(&mut self) -> Result<Vec<Node>> {
        let mut args = Vec::new();
        if self.peek() == Some(Token::RParen) {
            self.pos += 1;
            return Ok(args);
        }
        loop {
            args.push(self.expression()?);
            match self.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => return Ok(args),
                _ => return Err(invalid(self.line, "expected ',' or ')' in argument list")),
            }
        }
    }

    fn call(&self, name: &str, args: Vec<Node>) -> Result<Node> {
        let arity_error = |expected: usize| {
            invalid(
                self.line,
                format!("{}() takes {} argument(s), got {}", name, expected, args.len()),
            )
        };
        if let Some(index) = self.scope.functions.iter().rposition(|f| f.name == name) {
            let expected = self.scope.functions[index].params.len();
            if expected != args.len() {
                return Err(arity_error(expected));
            }
            return Ok(Node::Call(index, args));
        }
        if let Some(builtin) = Builtin::lookup(name) {
            if builtin.arity() != args.len() {
                return Err(arity_error(builtin.arity()));
            }
            return Ok(Node::Builtin(builtin, args));
        }
        Err(invalid(self.line, format!("unknown function \"{}\"", name)))
    }

    fn variable(&self, name: &str) -> Result<Node> {
        if let Some(index) = self.scope.params.iter().position(|p| p == name) {
            return Ok(Node::Name(Name::Param(index)));
        }
        if let Some(index) = self.scope.values.iter().rposition(|(n, _)| n == name) {
            return Ok(Node::Name(Name::Value(index)));
        }
        match name {
            "x" => Ok(Node::Name(Name::X)),
            "pi" => Ok(Node::Number(std::f64::consts::PI)),
            "e" => Ok(Node::Number(std::f64::consts::E)),
            _ => Err(invalid(self.line, format!("unknown name \"{}\"", name))),
        }
    }

    /// `(re, im)` when the whole statement is a parenthesized pair, otherwise
    /// a single real expression.
    fn return_value(&mut self) -> Result<Return> {
        let start = self.pos;
        if self.peek() == Some(Token::LParen) {
            self.pos += 1;
            let re = self.expression()?;
            if self.peek() == Some(Token::Comma) {
                self.pos += 1;
                let im = self.expression()?;
                self.expect(Token::RParen, "')' after the imaginary part")?;
                self.finish()?;
                return Ok(Return::Complex(re, im));
            }
            self.pos = start;
        }
        let node = self.expression()?;
        self.finish()?;
        Ok(Return::Real(node))
    }
}

/// Parsed permittivity expression.
#[derive(Debug, Clone)]
pub struct Expression {
    source: String,
    values: Vec<(String, Node)>,
    functions: Vec<Function>,
    result: Return,
}

impl PartialEq for Expression {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Expression {
    pub fn parse(text: &str) -> Result<Self> {
        let statements: Vec<(usize, &str)> = text
            .lines()
            .enumerate()
            .flat_map(|(n, line)| line.split(';').map(move |s| (n + 1, s.trim())))
            .filter(|(_, s)| !s.is_empty())
            .collect();

        if statements.is_empty() {
            return Err(Error::structural("Empty expression", "the expression has no statements"));
        }
        let returns: Vec<usize> = statements
            .iter()
            .enumerate()
            .filter(|(_, (_, s))| is_return(s))
            .map(|(i, _)| i)
            .collect();
        match returns.as_slice() {
            [] => {
                return Err(Error::structural(
                    "Return expression not found",
                    "the last statement must be \"return expr\" or \"return (re, im)\"",
                ))
            }
            [last] if *last == statements.len() - 1 => {}
            [_] => {
                return Err(Error::structural(
                    "Return expression must be the last statement",
                    "move the return statement to the end of the expression",
                ))
            }
            _ => {
                return Err(Error::structural(
                    "Only one return expression is allowed",
                    format!("found {} return statements", returns.len()),
                ))
            }
        }

        let mut values: Vec<(String, Node)> = Vec::new();
        let mut functions: Vec<Function> = Vec::new();
        let (last, body) = statements.split_last().ok_or_else(|| invalid(0, "no statements"))?;

        for &(line, statement) in body {
            if let Some(rest) = statement.strip_prefix("val ") {
                let scope = Scope {
                    values: &values,
                    functions: &functions,
                    params: &[],
                };
                let mut parser = Parser::new(rest, line, scope)?;
                let name = parser.expect_ident()?;
                parser.expect(Token::Assign, "'='")?;
                let node = parser.expression()?;
                parser.finish()?;
                values.push((name, node));
            } else if let Some(rest) = statement.strip_prefix("fun ") {
                let function = parse_function(rest, line, &values, &functions)?;
                functions.push(function);
            } else {
                return Err(invalid(
                    line,
                    format!("\"{}\" should start with 'val', 'fun' or 'return'", statement),
                ));
            }
        }

        let (line, statement) = *last;
        let scope = Scope {
            values: &values,
            functions: &functions,
            params: &[],
        };
        let mut parser = Parser::new(&statement["return".len()..], line, scope)?;
        let result = parser.return_value()?;

        Ok(Self {
            source: text.to_string(),
            values,
            functions,
            result,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Value at wavelength `x`; the imaginary part is 0 for a real return.
    pub fn evaluate(&self, x: f64) -> Complex64 {
        let mut env = Env {
            x,
            values: Vec::with_capacity(self.values.len()),
            functions: &self.functions,
        };
        for (_, node) in &self.values {
            let v = env.eval(node, &[]);
            env.values.push(v);
        }
        match &self.result {
            Return::Real(node) => Complex64::new(env.eval(node, &[]), 0.0),
            Return::Complex(re, im) => Complex64::new(env.eval(re, &[]), env.eval(im, &[])),
        }
    }
}

fn is_return(statement: &str) -> bool {
    statement
        .strip_prefix("return")
        .is_some_and(|rest| rest.is_empty() || rest.starts_with([' ', '(', '\t']))
}

fn parse_function(text: &str, line: usize, values: &[(String, Node)], functions: &[Function]) -> Result<Function> {
    // the header is parsed without parameters in scope
    let header_scope = Scope {
        values,
        functions,
        params: &[],
    };
    let mut header = Parser::new(text, line, header_scope)?;
    let name = header.expect_ident()?;
    header.expect(Token::LParen, "'(' after the function name")?;
    let mut params = Vec::new();
    if header.peek() == Some(Token::RParen) {
        header.pos += 1;
    } else {
        loop {
            params.push(header.expect_ident()?);
            match header.next() {
                Some(Token::Comma) => continue,
                Some(Token::RParen) => break,
                _ => return Err(invalid(line, "expected ',' or ')' in parameter list")),
            }
        }
    }
    header.expect(Token::Assign, "'='")?;
    let body_start = header.pos;
    let tokens = header.tokens;

    let scope = Scope {
        values,
        functions,
        params: &params,
    };
    let mut parser = Parser {
        text,
        tokens,
        pos: body_start,
        line,
        scope,
    };
    let body = parser.expression()?;
    parser.finish()?;

    Ok(Function { name, params, body })
}

struct Env<'a> {
    x: f64,
    values: Vec<f64>,
    functions: &'a [Function],
}

impl Env<'_> {
    fn eval(&self, node: &Node, params: &[f64]) -> f64 {
        match node {
            Node::Number(v) => *v,
            Node::Name(Name::X) => self.x,
            Node::Name(Name::Value(i)) => self.values[*i],
            Node::Name(Name::Param(i)) => params[*i],
            Node::Neg(inner) => -self.eval(inner, params),
            Node::Binary(op, lhs, rhs) => {
                let a = self.eval(lhs, params);
                let b = self.eval(rhs, params);
                match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Pow => a.powf(b),
                }
            }
            Node::Builtin(builtin, args) => {
                let args: Vec<f64> = args.iter().map(|a| self.eval(a, params)).collect();
                builtin.apply(&args)
            }
            Node::Call(index, args) => {
                let args: Vec<f64> = args.iter().map(|a| self.eval(a, params)).collect();
                self.eval(&self.functions[*index].body, &args)
            }
        }
    }
}
