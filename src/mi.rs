//! GDB Machine Interface (MI) output parser.
//!
//! Operates line-at-a-time: the caller supplies one newline-stripped line at
//! a time and the parser is stateless between calls (GDB/MI has no
//! multi-line records). Grounded on the recursive-descent grammar in
//! `gdb-mi-parser.c` of the original implementation, including its
//! lookahead rule for distinguishing a list of bare values from a list of
//! `name=value` results.
//!
//! ```text
//! line           := [token] sigil class-body | stream-sigil c-string | prompt
//! token          := DIGIT+
//! sigil          := '^' | '*' | '+' | '='      (result / exec / status / notify)
//! stream-sigil   := '~' | '@' | '&'            (console / target / log)
//! class-body     := identifier ( ',' result )*
//! result         := identifier '=' value
//! value          := c-string | '{' [result (',' result)*] '}' | '[' (value|result) (',' (value|result))* ']'
//! c-string       := '"' ( char | '\\' escape )* '"'
//! identifier     := ALNUM | '_' | '-' (first char alpha)
//! prompt         := "(gdb)" optional trailing space
//! ```

use crate::error::GdbError;

/// One name=value pair; an MI record's top-level payload and a tuple's
/// contents are both ordered sequences of these.
pub type Fields = Vec<(String, Value)>;

/// A structured MI value: a quoted string, an ordered keyed map (tuple), or
/// an ordered sequence (list). Lists may mix bare values and single-entry
/// maps produced from `name=value` elements.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Tuple(Fields),
    List(Vec<Value>),
}

impl Value {
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }
}

/// The `class` of a `^`-prefixed result record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultClass {
    Done,
    Running,
    Connected,
    Error,
    Exit,
}

impl ResultClass {
    fn from_str(s: &str) -> Option<Self> {
        match s {
            "done" => Some(ResultClass::Done),
            "running" => Some(ResultClass::Running),
            "connected" => Some(ResultClass::Connected),
            "error" => Some(ResultClass::Error),
            "exit" => Some(ResultClass::Exit),
            _ => None,
        }
    }
}

/// The kind of a stream record (`~`/`@`/`&`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamKind {
    Console,
    Target,
    Log,
}

/// One parsed line of MI output.
#[derive(Debug, Clone, PartialEq)]
pub enum MiRecord {
    Result {
        token: Option<u64>,
        class: ResultClass,
        payload: Fields,
    },
    ExecAsync {
        token: Option<u64>,
        class: String,
        payload: Fields,
    },
    StatusAsync {
        token: Option<u64>,
        class: String,
        payload: Fields,
    },
    NotifyAsync {
        token: Option<u64>,
        class: String,
        payload: Fields,
    },
    Stream {
        kind: StreamKind,
        text: String,
    },
    Prompt,
}

impl MiRecord {
    /// Fetch the `msg` field of a `^error` record, if present.
    #[must_use]
    pub fn error_message(&self) -> Option<&str> {
        match self {
            MiRecord::Result {
                class: ResultClass::Error,
                payload,
                ..
            } => payload
                .iter()
                .find(|(k, _)| k == "msg")
                .and_then(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Fetch the `reason` field of an `ExecAsync` record (e.g. `*stopped`).
    #[must_use]
    pub fn reason(&self) -> Option<&str> {
        match self {
            MiRecord::ExecAsync { payload, .. } => payload
                .iter()
                .find(|(k, _)| k == "reason")
                .and_then(|(_, v)| v.as_str()),
            _ => None,
        }
    }
}

/// Parse a single, newline-stripped line of MI output.
pub fn parse_line(line: &str) -> Result<MiRecord, GdbError> {
    if is_prompt(line) {
        return Ok(MiRecord::Prompt);
    }

    let chars: Vec<char> = line.chars().collect();
    let mut p = Parser { chars, pos: 0 };

    let token = p.parse_token();

    match p.peek() {
        Some('^') => {
            p.advance();
            let (class_name, payload) = p.parse_class_body()?;
            let class = ResultClass::from_str(&class_name).ok_or_else(|| {
                GdbError::ParseError(format!("unknown result class '{class_name}'"))
            })?;
            Ok(MiRecord::Result {
                token,
                class,
                payload,
            })
        }
        Some('*') => {
            p.advance();
            let (class, payload) = p.parse_class_body()?;
            Ok(MiRecord::ExecAsync {
                token,
                class,
                payload,
            })
        }
        Some('+') => {
            p.advance();
            let (class, payload) = p.parse_class_body()?;
            Ok(MiRecord::StatusAsync {
                token,
                class,
                payload,
            })
        }
        Some('=') => {
            p.advance();
            let (class, payload) = p.parse_class_body()?;
            Ok(MiRecord::NotifyAsync {
                token,
                class,
                payload,
            })
        }
        Some('~') => {
            p.advance();
            Ok(MiRecord::Stream {
                kind: StreamKind::Console,
                text: p.parse_stream_remainder(),
            })
        }
        Some('@') => {
            p.advance();
            Ok(MiRecord::Stream {
                kind: StreamKind::Target,
                text: p.parse_stream_remainder(),
            })
        }
        Some('&') => {
            p.advance();
            Ok(MiRecord::Stream {
                kind: StreamKind::Log,
                text: p.parse_stream_remainder(),
            })
        }
        Some(other) => Err(GdbError::ParseError(format!(
            "unrecognised sigil '{other}' in line: {line}"
        ))),
        None => Err(GdbError::ParseError(format!("empty or truncated line: {line}"))),
    }
}

/// A sole `(gdb)` (optionally leading whitespace) is a prompt; a line
/// beginning with `(gdb) ` (space-separated trailer) is also a prompt.
fn is_prompt(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed == "(gdb)" || trimmed.starts_with("(gdb) ")
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.peek();
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn expect(&mut self, expected: char) -> Result<(), GdbError> {
        match self.advance() {
            Some(c) if c == expected => Ok(()),
            Some(c) => Err(GdbError::ParseError(format!(
                "expected '{expected}', found '{c}'"
            ))),
            None => Err(GdbError::ParseError(format!(
                "expected '{expected}', found end of input"
            ))),
        }
    }

    /// Consume a leading run of ASCII digits as a token, if present.
    fn parse_token(&mut self) -> Option<u64> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit()) {
            self.advance();
        }
        if self.pos == start {
            return None;
        }
        let digits: String = self.chars[start..self.pos].iter().collect();
        digits.parse::<u64>().ok()
    }

    /// `identifier := ALNUM | '_' | '-' (first char alpha)`
    fn parse_identifier(&mut self) -> Result<String, GdbError> {
        let start = self.pos;
        match self.peek() {
            Some(c) if c.is_ascii_alphabetic() => {
                self.advance();
            }
            _ => return Err(GdbError::ParseError("expected identifier".into())),
        }
        while matches!(self.peek(), Some(c) if c.is_ascii_alphanumeric() || c == '_' || c == '-') {
            self.advance();
        }
        Ok(self.chars[start..self.pos].iter().collect())
    }

    /// `class-body := identifier ( ',' result )*`
    fn parse_class_body(&mut self) -> Result<(String, Fields), GdbError> {
        let class = self.parse_identifier()?;
        let mut fields = Vec::new();
        while self.peek() == Some(',') {
            self.advance();
            fields.push(self.parse_result()?);
        }
        Ok((class, fields))
    }

    /// `result := identifier '=' value`
    fn parse_result(&mut self) -> Result<(String, Value), GdbError> {
        let name = self.parse_identifier()?;
        self.expect('=')?;
        let value = self.parse_value()?;
        Ok((name, value))
    }

    fn parse_value(&mut self) -> Result<Value, GdbError> {
        match self.peek() {
            Some('"') => Ok(Value::String(self.parse_c_string()?)),
            Some('{') => self.parse_tuple(),
            Some('[') => self.parse_list(),
            Some(c) => Err(GdbError::ParseError(format!(
                "unexpected character '{c}' starting a value"
            ))),
            None => Err(GdbError::ParseError("unexpected end of input in value".into())),
        }
    }

    /// Empty tuple `{}` produces an empty container, not null.
    fn parse_tuple(&mut self) -> Result<Value, GdbError> {
        self.expect('{')?;
        let mut fields = Vec::new();
        if self.peek() == Some('}') {
            self.advance();
            return Ok(Value::Tuple(fields));
        }
        fields.push(self.parse_result()?);
        while self.peek() == Some(',') {
            self.advance();
            fields.push(self.parse_result()?);
        }
        self.expect('}')?;
        Ok(Value::Tuple(fields))
    }

    /// A list may contain bare values or `name=value` results; results are
    /// looked ahead for (identifier immediately followed by `=`) and emitted
    /// as single-entry tuple elements.
    fn parse_list(&mut self) -> Result<Value, GdbError> {
        self.expect('[')?;
        let mut items = Vec::new();
        if self.peek() == Some(']') {
            self.advance();
            return Ok(Value::List(items));
        }
        items.push(self.parse_list_element()?);
        while self.peek() == Some(',') {
            self.advance();
            items.push(self.parse_list_element()?);
        }
        self.expect(']')?;
        Ok(Value::List(items))
    }

    fn parse_list_element(&mut self) -> Result<Value, GdbError> {
        if self.looks_like_result() {
            let (name, value) = self.parse_result()?;
            Ok(Value::Tuple(vec![(name, value)]))
        } else {
            self.parse_value()
        }
    }

    /// Lookahead: does the input at the current position match
    /// `identifier '='` without consuming it?
    fn looks_like_result(&self) -> bool {
        let save = self.pos;
        let mut probe = Parser {
            chars: self.chars.clone(),
            pos: save,
        };
        if probe.parse_identifier().is_err() {
            return false;
        }
        probe.peek() == Some('=')
    }

    /// `c-string := '"' ( char | '\\' escape )* '"'`, returning the
    /// unescaped content.
    fn parse_c_string(&mut self) -> Result<String, GdbError> {
        self.expect('"')?;
        let mut out = String::new();
        loop {
            match self.advance() {
                None => return Err(GdbError::ParseError("unterminated string".into())),
                Some('"') => break,
                Some('\\') => match self.advance() {
                    Some('n') => out.push('\n'),
                    Some('t') => out.push('\t'),
                    Some('r') => out.push('\r'),
                    Some('\\') => out.push('\\'),
                    Some('"') => out.push('"'),
                    Some('0') => out.push('\0'),
                    Some(other) => {
                        out.push('\\');
                        out.push(other);
                    }
                    None => return Err(GdbError::ParseError("unterminated escape".into())),
                },
                Some(c) => out.push(c),
            }
        }
        Ok(out)
    }

    /// Stream records either carry a quoted, escaped string, or (when no
    /// surrounding quotes are present) pass the raw remainder through.
    fn parse_stream_remainder(&mut self) -> String {
        if self.peek() == Some('"') {
            if let Ok(s) = self.parse_c_string() {
                return s;
            }
        }
        self.chars[self.pos..].iter().collect()
    }
}
