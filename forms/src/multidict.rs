use serde::Serialize;

use crate::value::{UploadedFile, Value};

/// One submitted value: text or an uploaded file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum RawValue {
    Text(String),
    File(UploadedFile),
}

impl RawValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(text) => Some(text),
            Self::File(_) => None,
        }
    }

    pub fn to_value(&self) -> Value {
        match self {
            Self::Text(text) => Value::Str(text.clone()),
            Self::File(file) => Value::File(file.clone()),
        }
    }
}

impl From<&str> for RawValue {
    fn from(text: &str) -> Self {
        Self::Text(text.to_owned())
    }
}

impl From<String> for RawValue {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<UploadedFile> for RawValue {
    fn from(file: UploadedFile) -> Self {
        Self::File(file)
    }
}

/// Ordered multi-map of submitted form data keyed by input name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MultiDict {
    items: Vec<(String, RawValue)>,
}

impl MultiDict {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_urlencoded(query: &str) -> Self {
        url::form_urlencoded::parse(query.as_bytes())
            .map(|(key, value)| (key.into_owned(), value.into_owned()))
            .collect()
    }

    /// Last value submitted under `key`.
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.items
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, value)| value)
    }

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(RawValue::as_text)
    }

    pub fn get_all(&self, key: &str) -> Vec<&RawValue> {
        self.items
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, value)| value)
            .collect()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.iter().any(|(k, _)| k == key)
    }

    pub fn add(&mut self, key: &str, value: impl Into<RawValue>) {
        self.items.push((key.to_owned(), value.into()));
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(&mut self, key: &str, value: impl Into<RawValue>) {
        self.remove(key);
        self.add(key, value);
    }

    pub fn remove(&mut self, key: &str) -> bool {
        let len = self.items.len();
        self.items.retain(|(k, _)| k != key);
        len != self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &RawValue)> {
        self.items.iter().map(|(key, value)| (key.as_str(), value))
    }

    pub fn to_urlencoded(&self) -> String {
        let mut serializer = url::form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.iter() {
            if let RawValue::Text(text) = value {
                serializer.append_pair(key, text);
            }
        }
        serializer.finish()
    }
}

impl<K: Into<String>, V: Into<RawValue>> FromIterator<(K, V)> for MultiDict {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            items: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}
