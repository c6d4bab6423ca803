use std::fmt;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ParseError {
    #[error("Unexpected end of input")]
    UnexpectedEof,
    #[error("Unexpected token at position {0}: {1}")]
    UnexpectedToken(usize, String),
    #[error("Trailing data at position {0}")]
    TrailingData(usize),
}

/// A parsed S-expression node.
///
/// Quoted strings and bare symbols both become `Atom`; KiCad files do not
/// depend on the distinction once parsed.
#[derive(Debug, Clone, PartialEq)]
pub enum SExp {
    Atom(String),
    List(Vec<SExp>),
}

impl SExp {
    pub fn as_atom(&self) -> Option<&str> {
        match self {
            SExp::Atom(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[SExp]> {
        match self {
            SExp::List(items) => Some(items),
            _ => None,
        }
    }

    /// The leading atom of a list, e.g. `symbol` for `(symbol ...)`.
    pub fn tag(&self) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.first())
            .and_then(|first| first.as_atom())
    }

    /// The atom at `index` of a list, counting the tag as index 0.
    pub fn atom_at(&self, index: usize) -> Option<&str> {
        self.as_list()
            .and_then(|items| items.get(index))
            .and_then(|item| item.as_atom())
    }

    /// Child lists of this list (everything after the tag that is itself a list).
    pub fn children(&self) -> impl Iterator<Item = &SExp> {
        self.as_list()
            .unwrap_or(&[])
            .iter()
            .skip(1)
            .filter(|item| matches!(item, SExp::List(_)))
    }

    /// First child list whose tag is `key`.
    pub fn get(&self, key: &str) -> Option<&SExp> {
        self.children().find(|child| child.tag() == Some(key))
    }

    /// All child lists whose tag is `key`, in file order.
    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a SExp> + 'a {
        self.children().filter(move |child| child.tag() == Some(key))
    }

    /// Value of a `(key value)` pair.
    pub fn value_of(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(|pair| pair.atom_at(1))
    }

    /// Boolean `(key yes|no)` pair; a bare `(key)` reads as true.
    pub fn flag_of(&self, key: &str) -> Option<bool> {
        let pair = self.get(key)?;
        match pair.atom_at(1) {
            None => Some(true),
            Some(v) => Some(matches!(v, "yes" | "true")),
        }
    }

    /// Whether a bare atom such as `hide` or `fields_autoplaced` is present.
    pub fn has_atom(&self, atom: &str) -> bool {
        self.as_list()
            .unwrap_or(&[])
            .iter()
            .skip(1)
            .any(|item| item.as_atom() == Some(atom))
    }
}

impl fmt::Display for SExp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SExp::Atom(s) => {
                let needs_quotes = s.is_empty()
                    || s.chars()
                        .any(|c| c.is_whitespace() || c == '(' || c == ')' || c == '"');
                if needs_quotes {
                    write!(f, "\"{}\"", s.replace('\\', "\\\\").replace('"', "\\\""))
                } else {
                    write!(f, "{}", s)
                }
            }
            SExp::List(items) => {
                write!(f, "(")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, " ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, ")")
            }
        }
    }
}

pub struct SExpParser {
    input: Vec<char>,
    pos: usize,
}

impl SExpParser {
    pub fn new(input: &str) -> Self {
        Self {
            input: input.chars().collect(),
            pos: 0,
        }
    }

    /// Parse exactly one top-level expression.
    pub fn parse(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();
        if self.is_eof() {
            return Err(ParseError::UnexpectedEof);
        }
        let root = self.parse_sexp()?;
        self.skip_whitespace();
        if !self.is_eof() {
            return Err(ParseError::TrailingData(self.pos));
        }
        Ok(root)
    }

    fn parse_sexp(&mut self) -> Result<SExp, ParseError> {
        self.skip_whitespace();

        match self.peek() {
            None => Err(ParseError::UnexpectedEof),
            Some('(') => self.parse_list(),
            Some(')') => Err(ParseError::UnexpectedToken(self.pos, ")".to_string())),
            Some('"') => self.parse_string(),
            Some(_) => self.parse_symbol(),
        }
    }

    fn parse_list(&mut self) -> Result<SExp, ParseError> {
        self.advance(); // '('
        let mut items = Vec::new();

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(ParseError::UnexpectedEof),
                Some(')') => {
                    self.advance();
                    break;
                }
                Some(_) => items.push(self.parse_sexp()?),
            }
        }

        Ok(SExp::List(items))
    }

    fn parse_string(&mut self) -> Result<SExp, ParseError> {
        self.advance(); // opening quote
        let mut s = String::new();

        loop {
            let ch = self.peek().ok_or(ParseError::UnexpectedEof)?;
            self.advance();
            match ch {
                '"' => break,
                '\\' => {
                    let escaped = self.peek().ok_or(ParseError::UnexpectedEof)?;
                    self.advance();
                    match escaped {
                        'n' => s.push('\n'),
                        't' => s.push('\t'),
                        'r' => s.push('\r'),
                        other => s.push(other),
                    }
                }
                other => s.push(other),
            }
        }

        Ok(SExp::Atom(s))
    }

    fn parse_symbol(&mut self) -> Result<SExp, ParseError> {
        let start = self.pos;
        let mut s = String::new();

        while let Some(ch) = self.peek() {
            if ch.is_whitespace() || ch == '(' || ch == ')' || ch == '"' {
                break;
            }
            s.push(ch);
            self.advance();
        }

        if s.is_empty() {
            Err(ParseError::UnexpectedToken(start, "empty symbol".to_string()))
        } else {
            Ok(SExp::Atom(s))
        }
    }

    fn skip_whitespace(&mut self) {
        while self.peek().is_some_and(|c| c.is_whitespace()) {
            self.advance();
        }
    }

    fn peek(&self) -> Option<char> {
        self.input.get(self.pos).copied()
    }

    fn advance(&mut self) {
        if self.pos < self.input.len() {
            self.pos += 1;
        }
    }

    fn is_eof(&self) -> bool {
        self.pos >= self.input.len()
    }
}
