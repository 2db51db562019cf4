//! Parameter naming and the ordered binding map

use crate::{Error, Result, Value};
use serde::Serialize;

/// The clause a parameter is allocated for. Every kind owns its own prefix
/// and counter, so names from different kinds can never collide.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    Predicate,
    Insert,
    Update,
    Upsert,
}

impl ParamKind {
    const COUNT: usize = 4;

    pub fn prefix(self) -> &'static str {
        match self {
            ParamKind::Predicate => ":w",
            ParamKind::Insert => ":i",
            ParamKind::Update => ":u",
            ParamKind::Upsert => ":up",
        }
    }

    fn slot(self) -> usize {
        match self {
            ParamKind::Predicate => 0,
            ParamKind::Insert => 1,
            ParamKind::Update => 2,
            ParamKind::Upsert => 3,
        }
    }
}

/// Ordered name → value map handed to the connection with a statement.
///
/// Names are either `:name` placeholders or, for positional bindings built
/// with [`Bindings::positional`], `?1`, `?2`, ... consumed in order by `?`
/// markers in the SQL.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Bindings {
    entries: Vec<(String, Value)>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Positional bindings for SQL written with `?` markers
    pub fn positional<I, V>(values: I) -> Self
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        let entries = values
            .into_iter()
            .enumerate()
            .map(|(i, v)| (format!("?{}", i + 1), v.into()))
            .collect();
        Self { entries }
    }

    /// Named bindings; a missing leading `:` is added
    pub fn named<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let mut bindings = Self::new();
        for (name, value) in pairs {
            let name = name.into();
            let name = if name.starts_with(':') {
                name
            } else {
                format!(":{}", name)
            };
            bindings.push(name, value);
        }
        bindings
    }

    /// Insert or overwrite a binding, keeping first-insertion order
    pub fn push(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.entries.push((name, value)),
        }
    }

    /// Append every entry of `other`
    pub fn extend(&mut self, other: Bindings) {
        for (name, value) in other.entries {
            self.push(name, value);
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    /// Rewrite named and `?` placeholders into the driver's positional
    /// form, returning the values in placeholder order. Text inside quotes,
    /// `--` and `/* */` comments is left alone, as are `::` casts.
    ///
    /// Quotes end at the next matching quote character. Doubled quotes
    /// work; MySQL-style backslash escapes (`'it\'s'`) are not recognized.
    pub fn to_positional(&self, sql: &str, style: PlaceholderStyle) -> Result<(String, Vec<Value>)> {
        let chars: Vec<char> = sql.chars().collect();
        let mut out = String::with_capacity(sql.len());
        let mut values = Vec::with_capacity(self.entries.len());
        let mut positional = self
            .entries
            .iter()
            .filter(|(n, _)| n.starts_with('?'))
            .map(|(_, v)| v);
        let mut quote: Option<char> = None;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];

            if let Some(q) = quote {
                out.push(c);
                if c == q {
                    quote = None;
                }
                i += 1;
                continue;
            }

            match c {
                '-' if chars.get(i + 1) == Some(&'-') => {
                    while i < chars.len() && chars[i] != '\n' {
                        out.push(chars[i]);
                        i += 1;
                    }
                }
                '/' if chars.get(i + 1) == Some(&'*') => {
                    let end = (i + 2..chars.len().saturating_sub(1))
                        .find(|&j| chars[j] == '*' && chars[j + 1] == '/')
                        .map_or(chars.len(), |j| j + 2);
                    out.extend(&chars[i..end]);
                    i = end;
                }
                '\'' | '"' | '`' => {
                    quote = Some(c);
                    out.push(c);
                    i += 1;
                }
                '?' => {
                    let value = positional.next().ok_or_else(|| {
                        Error::invalid_query("more `?` placeholders than positional bindings")
                    })?;
                    values.push(value.clone());
                    style.write(&mut out, values.len());
                    i += 1;
                }
                ':' if starts_name(&chars, i) => {
                    let start = i;
                    i += 1;
                    while i < chars.len() && (chars[i].is_ascii_alphanumeric() || chars[i] == '_') {
                        i += 1;
                    }
                    let name: String = chars[start..i].iter().collect();
                    let value = self.get(&name).ok_or_else(|| {
                        Error::invalid_query(format!("no value bound for parameter {}", name))
                    })?;
                    values.push(value.clone());
                    style.write(&mut out, values.len());
                }
                _ => {
                    out.push(c);
                    i += 1;
                }
            }
        }

        Ok((out, values))
    }
}

fn starts_name(chars: &[char], i: usize) -> bool {
    let next_ok = chars
        .get(i + 1)
        .is_some_and(|n| n.is_ascii_alphabetic() || *n == '_');
    let prev_ok = i == 0 || chars[i - 1] != ':';
    next_ok && prev_ok
}

/// Positional placeholder syntax of the target backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaceholderStyle {
    /// `?` (MySQL, SQLite)
    Question,
    /// `$1`, `$2`, ... (PostgreSQL)
    Dollar,
}

impl PlaceholderStyle {
    fn write(self, out: &mut String, index: usize) {
        match self {
            PlaceholderStyle::Question => out.push('?'),
            PlaceholderStyle::Dollar => {
                out.push('$');
                out.push_str(&index.to_string());
            }
        }
    }
}

/// Allocates unique parameter names for one query lifecycle and owns the
/// values bound to them.
#[derive(Debug, Clone, Default)]
pub struct Binder {
    bindings: Bindings,
    counters: [usize; ParamKind::COUNT],
}

impl Binder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value under the next name for `kind` and return that name
    pub fn bind(&mut self, kind: ParamKind, value: impl Into<Value>) -> String {
        let counter = &mut self.counters[kind.slot()];
        let name = format!("{}{}", kind.prefix(), counter);
        *counter += 1;
        self.bindings.push(name.clone(), value);
        name
    }

    /// Bind one bulk-insert cell; the row index keeps rows apart
    pub fn bind_cell(&mut self, row: usize, column: usize, value: impl Into<Value>) -> String {
        let name = format!(":b{}_{}", row, column);
        self.bindings.push(name.clone(), value);
        name
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn into_bindings(self) -> Bindings {
        self.bindings
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}
