use std::fmt;

use indexmap::IndexMap;
use serde::{Serialize, Serializer};

/// Typed value produced by converters and stored in a form's python data.
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(untagged)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Str(String),
    List(Vec<Value>),
    Map(IndexMap<String, Value>),
    File(UploadedFile),
}

impl Value {
    pub fn map() -> Self {
        Self::Map(IndexMap::new())
    }

    /// Null, empty strings and empty containers count as "no value".
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Str(value) => value.is_empty(),
            Self::List(values) => values.is_empty(),
            Self::Map(values) => values.is_empty(),
            Self::Bool(_) | Self::Int(_) | Self::File(_) => false,
        }
    }

    pub fn is_truthy(&self) -> bool {
        match self {
            Self::Bool(value) => *value,
            Self::Int(value) => *value != 0,
            _ => !self.is_empty(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_map(&self) -> Option<&IndexMap<String, Value>> {
        match self {
            Self::Map(values) => Some(values),
            _ => None,
        }
    }

    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            Self::File(file) => Some(file),
            _ => None,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.as_map().and_then(|values| values.get(key))
    }

    /// Text shown in an input for a scalar value.
    pub fn to_raw_string(&self) -> String {
        match self {
            Self::Null => String::new(),
            Self::Bool(true) => "true".to_owned(),
            Self::Bool(false) => String::new(),
            Self::Int(value) => value.to_string(),
            Self::Str(value) => value.clone(),
            Self::File(file) => file.filename.clone(),
            Self::List(_) | Self::Map(_) => self.to_string(),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Int(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
            Self::File(file) => write!(f, "{}", file.filename),
            Self::List(values) => {
                write!(f, "[")?;
                for (i, value) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{value}")?;
                }
                write!(f, "]")
            }
            Self::Map(values) => {
                write!(f, "{{")?;
                for (i, (key, value)) in values.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{key}: {value}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<UploadedFile> for Value {
    fn from(value: UploadedFile) -> Self {
        Self::File(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(values: Vec<T>) -> Self {
        Self::List(values.into_iter().map(Into::into).collect())
    }
}

impl From<IndexMap<String, Value>> for Value {
    fn from(values: IndexMap<String, Value>) -> Self {
        Self::Map(values)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Value {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::Map(
            iter.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        )
    }
}

/// A file posted through a multipart form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: Option<String>,
    pub data: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: &str, content_type: Option<&str>, data: Vec<u8>) -> Self {
        Self {
            filename: filename.to_owned(),
            content_type: content_type.map(str::to_owned),
            data,
        }
    }

    pub fn size(&self) -> usize {
        self.data.len()
    }
}

impl Serialize for UploadedFile {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        use serde::ser::SerializeStruct;

        let mut state = serializer.serialize_struct("UploadedFile", 3)?;
        state.serialize_field("filename", &self.filename)?;
        state.serialize_field("content_type", &self.content_type)?;
        state.serialize_field("size", &self.size())?;
        state.end()
    }
}
