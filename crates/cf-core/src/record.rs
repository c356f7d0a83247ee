//! Namelist record builder.
//!
//! A record renders as `&KEYWORD KEY = value KEY2 = value /`. Fields holding
//! [`Value::Unset`] are dropped when pushed, so an absent optional never
//! reaches the output.

use core::fmt;

use crate::Value;

/// Layout used when rendering a record.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecordStyle {
    /// One line per record.
    #[default]
    Compact,
    /// One field per line, values aligned, closing slash on its own line.
    Pretty,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    keyword: String,
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(keyword: impl Into<String>) -> Self {
        Self {
            keyword: keyword.into(),
            fields: Vec::new(),
        }
    }

    /// Builder form of [`Record::push`].
    pub fn field(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: &str, value: impl Into<Value>) {
        let value = value.into();
        if !value.is_unset() {
            self.fields.push((key.to_string(), value));
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    pub fn fields(&self) -> &[(String, Value)] {
        &self.fields
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Renders the record followed by a newline.
    pub fn render(&self, style: RecordStyle) -> String {
        match style {
            RecordStyle::Compact => format!("{self}\n"),
            RecordStyle::Pretty => {
                let width = self.fields.iter().map(|(k, _)| k.len()).max().unwrap_or(0);
                let indent = " ".repeat(self.keyword.len() + 2);
                let mut out = format!("&{}", self.keyword);
                for (i, (key, value)) in self.fields.iter().enumerate() {
                    if i == 0 {
                        out.push(' ');
                    } else {
                        out.push('\n');
                        out.push_str(&indent);
                    }
                    out.push_str(&format!("{key:<width$} = {value}"));
                }
                out.push_str("\n/\n");
                out
            }
        }
    }
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "&{}", self.keyword)?;
        for (key, value) in &self.fields {
            write!(f, " {key} = {value}")?;
        }
        f.write_str(" /")
    }
}
