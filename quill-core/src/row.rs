//! Result rows returned by a connection

use crate::{Result, Value};
use serde::de::DeserializeOwned;

/// One result row: column names with their values, in select order
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

/// All rows of one SELECT
pub type ResultSet = Vec<Row>;

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.columns.push((column.into(), value.into()));
    }

    /// Value of the first column with this name
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.columns
            .iter()
            .find(|(name, _)| name == column)
            .map(|(_, value)| value)
    }

    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.columns.iter().map(|(name, _)| name.as_str())
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Convert into a JSON object keyed by column name
    pub fn to_json(&self) -> serde_json::Value {
        let map = self
            .columns
            .iter()
            .map(|(name, value)| (name.clone(), value.to_json()))
            .collect();
        serde_json::Value::Object(map)
    }

    /// Deserialize the row into any serde type
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T> {
        Ok(serde_json::from_value(self.to_json())?)
    }
}

impl<K, V> FromIterator<(K, V)> for Row
where
    K: Into<String>,
    V: Into<Value>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            columns: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct User {
        id: i64,
        name: String,
        nickname: Option<String>,
    }

    #[test]
    fn test_row_lookup() {
        let row: Row = [("id", Value::Int(1)), ("name", Value::from("John"))]
            .into_iter()
            .collect();
        assert_eq!(row.get("name"), Some(&Value::from("John")));
        assert_eq!(row.get("missing"), None);
        assert_eq!(row.columns().collect::<Vec<_>>(), vec!["id", "name"]);
    }

    #[test]
    fn test_row_deserialize() {
        let row: Row = [
            ("id", Value::Int(1)),
            ("name", Value::from("John")),
            ("nickname", Value::Null),
        ]
        .into_iter()
        .collect();
        let user: User = row.deserialize().unwrap();
        assert_eq!(
            user,
            User {
                id: 1,
                name: "John".into(),
                nickname: None
            }
        );
    }

    #[test]
    fn test_row_deserialize_type_mismatch() {
        let row: Row = [("id", Value::from("one"))].into_iter().collect();
        assert!(row.deserialize::<User>().is_err());
    }
}
