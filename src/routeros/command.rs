use std::collections::HashMap;

use serde::Serialize;

/// A request sentence: a command path plus `=key=value` attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    path: String,
    attributes: Vec<(String, String)>,
}

impl Command {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            attributes: Vec::new(),
        }
    }

    pub fn attr(mut self, key: &str, value: impl Into<String>) -> Self {
        self.attributes.push((key.to_string(), value.into()));
        self
    }

    /// Restricts the reply to the given fields.
    pub fn proplist(self, fields: &[&str]) -> Self {
        self.attr(".proplist", fields.join(","))
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn to_words(&self) -> Vec<String> {
        let mut words = Vec::with_capacity(self.attributes.len() + 1);
        words.push(self.path.clone());
        words.extend(self.attributes.iter().map(|(k, v)| format!("={k}={v}")));
        words
    }
}

/// One reply record: the string-keyed fields of a `!re` (or `!done`) sentence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Record(HashMap<String, String>);

impl Record {
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: Into<String>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        Self(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    /// Parses the attribute words of a reply sentence. The key ends at the second `=`,
    /// so values may themselves contain `=`.
    pub fn from_attribute_words<'a>(words: impl IntoIterator<Item = &'a str>) -> Self {
        let mut fields = HashMap::new();
        for word in words {
            if let Some(rest) = word.strip_prefix('=') {
                match rest.split_once('=') {
                    Some((key, value)) => fields.insert(key.to_string(), value.to_string()),
                    None => fields.insert(rest.to_string(), String::new()),
                };
            }
        }
        Self(fields)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    /// Field value, or the empty string when absent.
    pub fn field(&self, key: &str) -> &str {
        self.get(key).unwrap_or_default()
    }
}
