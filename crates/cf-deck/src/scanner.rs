//! Record scanner.
//!
//! Splits deck text into `&KEYWORD KEY = value ... /` records. Text outside
//! records and `!` comments are dropped. Inside a record, values are
//! separated by commas or whitespace, strings use `'` or `"` with the quote
//! doubled to escape it, and a bare `KEY =` pair starts the next field.
//! Scanning ends at the close of `&TAIL`.

use std::iter::Peekable;
use std::str::CharIndices;

use cf_core::{Number, Value};

use crate::{DeckError, DeckResult};

/// One record as written, before it is mapped onto an entity.
#[derive(Clone, Debug, PartialEq)]
pub struct RawRecord {
    /// Upper-cased, without the `&`.
    pub keyword: String,
    /// Line the record opens on, 1-based.
    pub line: usize,
    /// Upper-cased keys in source order. Several values form a list.
    pub fields: Vec<(String, Value)>,
    /// Source text from `&` through the closing `/`.
    pub text: String,
}

impl RawRecord {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Token {
    Word(String),
    Quoted(String),
    Equals,
    Comma,
}

struct Pending {
    keyword: String,
    line: usize,
    start: usize,
    tokens: Vec<(Token, usize)>,
}

enum ScanState {
    Scanning,
    InRecord(Pending),
}

type Chars<'a> = Peekable<CharIndices<'a>>;

fn is_delimiter(c: char) -> bool {
    c.is_whitespace() || matches!(c, '=' | ',' | '/' | '!' | '\'' | '"' | '&')
}

fn rest_of_word(chars: &mut Chars<'_>, word: &mut String) {
    while let Some(&(_, c)) = chars.peek() {
        if is_delimiter(c) {
            break;
        }
        word.push(c);
        chars.next();
    }
}

/// Leaves the newline for the caller so line counting stays in one place.
fn skip_comment(chars: &mut Chars<'_>) {
    while let Some(&(_, c)) = chars.peek() {
        if c == '\n' {
            break;
        }
        chars.next();
    }
}

/// `None` when the input ends inside the string.
fn quoted(chars: &mut Chars<'_>, quote: char, line: &mut usize) -> Option<String> {
    let mut out = String::new();
    while let Some((_, c)) = chars.next() {
        if c == quote {
            if chars.peek().is_some_and(|&(_, n)| n == quote) {
                chars.next();
                out.push(quote);
            } else {
                return Some(out);
            }
        } else {
            if c == '\n' {
                *line += 1;
            }
            out.push(c);
        }
    }
    None
}

fn value_of(token: Token, line: usize) -> DeckResult<Value> {
    match token {
        Token::Quoted(s) => Ok(Value::Str(s)),
        Token::Word(w) => {
            if let Ok(n) = w.parse::<Number>() {
                return Ok(Value::Num(n));
            }
            match w.to_ascii_uppercase().as_str() {
                ".TRUE." | ".T." | "T" | "TRUE" => Ok(Value::Bool(true)),
                ".FALSE." | ".F." | "F" | "FALSE" => Ok(Value::Bool(false)),
                _ => Err(DeckError::Syntax {
                    line,
                    message: format!("unquoted value '{w}'"),
                }),
            }
        }
        Token::Equals | Token::Comma => Err(DeckError::Syntax {
            line,
            message: "expected a value".to_string(),
        }),
    }
}

impl Pending {
    fn open(chars: &mut Chars<'_>, start: usize, line: usize) -> DeckResult<Self> {
        let mut keyword = String::new();
        rest_of_word(chars, &mut keyword);
        if keyword.is_empty() {
            return Err(DeckError::Syntax {
                line,
                message: "expected a record keyword after '&'".to_string(),
            });
        }
        Ok(Self {
            keyword: keyword.to_ascii_uppercase(),
            line,
            start,
            tokens: Vec::new(),
        })
    }

    fn syntax(&self, line: usize, message: impl Into<String>) -> DeckError {
        DeckError::Syntax {
            line,
            message: format!("&{}: {}", self.keyword, message.into()),
        }
    }

    /// Groups the token stream into `KEY = value[, value...]` fields.
    fn fields(&mut self) -> DeckResult<Vec<(String, Value)>> {
        let mut grouped: Vec<(String, Vec<Value>, usize)> = Vec::new();
        let mut tokens = std::mem::take(&mut self.tokens).into_iter().peekable();
        while let Some((token, line)) = tokens.next() {
            match token {
                Token::Word(w) if matches!(tokens.peek(), Some((Token::Equals, _))) => {
                    tokens.next();
                    let key = w.to_ascii_uppercase();
                    if grouped.iter().any(|(k, _, _)| *k == key) {
                        return Err(self.syntax(line, format!("{key} given twice")));
                    }
                    grouped.push((key, Vec::new(), line));
                }
                Token::Comma => {}
                Token::Equals => return Err(self.syntax(line, "unexpected '='")),
                other => match grouped.last_mut() {
                    Some((_, values, _)) => values.push(value_of(other, line)?),
                    None => return Err(self.syntax(line, "value before any field name")),
                },
            }
        }
        grouped
            .into_iter()
            .map(|(key, mut values, line)| match values.len() {
                0 => Err(self.syntax(line, format!("{key} has no value"))),
                1 => Ok((key, values.remove(0))),
                _ => Ok((key, Value::List(values))),
            })
            .collect()
    }

    fn close(mut self, text: &str, end: usize) -> DeckResult<RawRecord> {
        let fields = self.fields()?;
        Ok(RawRecord {
            text: text[self.start..=end].to_string(),
            keyword: self.keyword,
            line: self.line,
            fields,
        })
    }
}

/// Scans `text` into records in source order.
pub fn scan(text: &str) -> DeckResult<Vec<RawRecord>> {
    let mut records = Vec::new();
    let mut chars = text.char_indices().peekable();
    let mut state = ScanState::Scanning;
    let mut line = 1;

    while let Some((at, ch)) = chars.next() {
        if ch == '\n' {
            line += 1;
            continue;
        }
        state = match state {
            ScanState::Scanning => match ch {
                '&' => ScanState::InRecord(Pending::open(&mut chars, at, line)?),
                '!' => {
                    skip_comment(&mut chars);
                    ScanState::Scanning
                }
                _ => ScanState::Scanning,
            },
            ScanState::InRecord(mut p) => match ch {
                '/' => {
                    let record = p.close(text, at)?;
                    let done = record.keyword == "TAIL";
                    records.push(record);
                    if done {
                        return Ok(records);
                    }
                    ScanState::Scanning
                }
                '!' => {
                    skip_comment(&mut chars);
                    ScanState::InRecord(p)
                }
                '=' => {
                    p.tokens.push((Token::Equals, line));
                    ScanState::InRecord(p)
                }
                ',' => {
                    p.tokens.push((Token::Comma, line));
                    ScanState::InRecord(p)
                }
                '\'' | '"' => {
                    let opened = line;
                    let Some(s) = quoted(&mut chars, ch, &mut line) else {
                        return Err(DeckError::UnterminatedRecord {
                            line: p.line,
                            keyword: p.keyword,
                        });
                    };
                    p.tokens.push((Token::Quoted(s), opened));
                    ScanState::InRecord(p)
                }
                '&' => {
                    return Err(DeckError::UnterminatedRecord {
                        line: p.line,
                        keyword: p.keyword,
                    });
                }
                c if c.is_whitespace() => ScanState::InRecord(p),
                c => {
                    let mut word = c.to_string();
                    rest_of_word(&mut chars, &mut word);
                    p.tokens.push((Token::Word(word), line));
                    ScanState::InRecord(p)
                }
            },
        };
    }

    match state {
        ScanState::Scanning => Ok(records),
        ScanState::InRecord(p) => Err(DeckError::UnterminatedRecord {
            line: p.line,
            keyword: p.keyword,
        }),
    }
}
