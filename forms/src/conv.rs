use std::{fmt, sync::Arc};

use indexmap::IndexMap;
use regex::Regex;
use thiserror::Error;

use crate::value::Value;

pub const REQUIRED_MESSAGE: &str = "required field";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    message: String,
}

impl ValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn required() -> Self {
        Self::new(REQUIRED_MESSAGE)
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// `(value, label)` pair offered by choice converters.
pub type Choice = (String, String);

/// Two-way conversion between submitted raw values and typed values.
///
/// Raw values are `Value::Str` for single inputs, `Value::List` of strings
/// for multiple inputs and `Value::Map` for aggregate fields.
pub trait Converter: Send + Sync + fmt::Debug {
    fn to_python(&self, value: &Value) -> Result<Value, ValidationError>;

    fn from_python(&self, value: &Value) -> Value;

    fn required(&self) -> bool {
        false
    }

    fn multiple(&self) -> bool {
        false
    }

    fn choices(&self) -> Option<Vec<Choice>> {
        None
    }

    fn accept(&self, value: &Value) -> Result<Value, ValidationError> {
        let value = self.to_python(value)?;
        if self.required() && value.is_empty() {
            return Err(ValidationError::required());
        }
        Ok(value)
    }
}

pub type Conv = Arc<dyn Converter>;

/// Text converter, the default for atomic fields.
#[derive(Debug, Clone)]
pub struct Char {
    required: bool,
    strip: bool,
    min_length: Option<usize>,
    max_length: Option<usize>,
    regex: Option<(String, Regex)>,
}

impl Default for Char {
    fn default() -> Self {
        Self {
            required: false,
            strip: true,
            min_length: None,
            max_length: None,
            regex: None,
        }
    }
}

impl Char {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn no_strip(mut self) -> Self {
        self.strip = false;
        self
    }

    pub fn min_length(mut self, min_length: usize) -> Self {
        self.min_length = Some(min_length);
        self
    }

    pub fn max_length(mut self, max_length: usize) -> Self {
        self.max_length = Some(max_length);
        self
    }

    /// The pattern must match the whole value.
    pub fn regex(mut self, pattern: &str) -> Result<Self, regex::Error> {
        let regex = Regex::new(&format!("^(?:{pattern})$"))?;
        self.regex = Some((pattern.to_owned(), regex));
        Ok(self)
    }
}

impl Converter for Char {
    fn to_python(&self, value: &Value) -> Result<Value, ValidationError> {
        let value = value.to_raw_string();
        let value = if self.strip {
            value.trim().to_owned()
        } else {
            value
        };
        if value.is_empty() {
            return Ok(Value::Str(value));
        }

        let length = value.chars().count();
        if let Some(min_length) = self.min_length {
            if length < min_length {
                return Err(ValidationError::new(format!(
                    "should be longer than {min_length} symbols"
                )));
            }
        }
        if let Some(max_length) = self.max_length {
            if length > max_length {
                return Err(ValidationError::new(format!(
                    "should be shorter than {max_length} symbols"
                )));
            }
        }
        if let Some((pattern, regex)) = &self.regex {
            if !regex.is_match(&value) {
                return Err(ValidationError::new(format!(
                    "field should match {pattern}"
                )));
            }
        }
        Ok(Value::Str(value))
    }

    fn from_python(&self, value: &Value) -> Value {
        Value::Str(value.to_raw_string())
    }

    fn required(&self) -> bool {
        self.required
    }
}

#[derive(Debug, Clone, Default)]
pub struct Int {
    required: bool,
    min: Option<i64>,
    max: Option<i64>,
}

impl Int {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, min: i64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn max(mut self, max: i64) -> Self {
        self.max = Some(max);
        self
    }
}

impl Converter for Int {
    fn to_python(&self, value: &Value) -> Result<Value, ValidationError> {
        let number = match value {
            Value::Int(number) => *number,
            Value::Null => return Ok(Value::Null),
            _ => {
                let raw = value.to_raw_string();
                let raw = raw.trim();
                if raw.is_empty() {
                    return Ok(Value::Null);
                }
                raw.parse::<i64>()
                    .map_err(|_| ValidationError::new("it is not valid integer"))?
            }
        };

        if let Some(min) = self.min {
            if number < min {
                return Err(ValidationError::new(format!(
                    "should be greater than or equal to {min}"
                )));
            }
        }
        if let Some(max) = self.max {
            if number > max {
                return Err(ValidationError::new(format!(
                    "should be less than or equal to {max}"
                )));
            }
        }
        Ok(Value::Int(number))
    }

    fn from_python(&self, value: &Value) -> Value {
        Value::Str(value.to_raw_string())
    }

    fn required(&self) -> bool {
        self.required
    }
}

/// Checkbox converter: any non-empty submission means `true`.
#[derive(Debug, Clone, Default)]
pub struct Bool {
    required: bool,
}

impl Bool {
    pub fn new() -> Self {
        Self::default()
    }

    /// The box has to be checked.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl Converter for Bool {
    fn to_python(&self, value: &Value) -> Result<Value, ValidationError> {
        let checked = match value {
            Value::Bool(checked) => *checked,
            other => !other.is_empty(),
        };
        if self.required && !checked {
            return Err(ValidationError::required());
        }
        Ok(Value::Bool(checked))
    }

    fn from_python(&self, value: &Value) -> Value {
        match value.is_truthy() {
            true => Value::from("checked"),
            false => Value::from(""),
        }
    }

    fn required(&self) -> bool {
        self.required
    }
}

/// Restricts values to a fixed set of choices.
#[derive(Debug, Clone)]
pub struct EnumChoice {
    choices: Vec<Choice>,
    conv: Conv,
    required: bool,
}

impl EnumChoice {
    pub fn new<V: Into<String>, L: Into<String>>(choices: impl IntoIterator<Item = (V, L)>) -> Self {
        Self {
            choices: choices
                .into_iter()
                .map(|(value, label)| (value.into(), label.into()))
                .collect(),
            conv: Arc::new(Char::new()),
            required: false,
        }
    }

    /// Converter applied to the chosen value, `Char` by default.
    pub fn conv(mut self, conv: impl Converter + 'static) -> Self {
        self.conv = Arc::new(conv);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl Converter for EnumChoice {
    fn to_python(&self, value: &Value) -> Result<Value, ValidationError> {
        let raw = value.to_raw_string();
        let raw = raw.trim();
        if raw.is_empty() {
            return Ok(Value::Null);
        }
        if !self.choices.iter().any(|(choice, _)| choice == raw) {
            return Err(ValidationError::new(format!("no such value: {raw}")));
        }
        self.conv.to_python(&Value::from(raw))
    }

    fn from_python(&self, value: &Value) -> Value {
        self.conv.from_python(value)
    }

    fn required(&self) -> bool {
        self.required
    }

    fn choices(&self) -> Option<Vec<Choice>> {
        Some(self.choices.clone())
    }
}

/// Makes a multiple field out of a single-value converter.
#[derive(Debug, Clone)]
pub struct ListOf {
    conv: Conv,
    required: bool,
}

impl ListOf {
    pub fn new(conv: impl Converter + 'static) -> Self {
        Self {
            conv: Arc::new(conv),
            required: false,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl Converter for ListOf {
    fn to_python(&self, value: &Value) -> Result<Value, ValidationError> {
        let items: &[Value] = match value {
            Value::List(items) => items.as_slice(),
            Value::Null => &[],
            single => std::slice::from_ref(single),
        };

        let mut result = Vec::with_capacity(items.len());
        for item in items {
            let item = self.conv.to_python(item)?;
            if !item.is_empty() {
                result.push(item);
            }
        }
        Ok(Value::List(result))
    }

    fn from_python(&self, value: &Value) -> Value {
        match value {
            Value::List(items) => {
                Value::List(items.iter().map(|item| self.conv.from_python(item)).collect())
            }
            Value::Null => Value::List(Vec::new()),
            single => Value::List(vec![self.conv.from_python(single)]),
        }
    }

    fn required(&self) -> bool {
        self.required
    }

    fn multiple(&self) -> bool {
        true
    }

    fn choices(&self) -> Option<Vec<Choice>> {
        self.conv.choices()
    }
}

/// Passes uploaded files through. Files are never written back to raw data.
#[derive(Debug, Clone, Default)]
pub struct SimpleFile {
    required: bool,
}

impl SimpleFile {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl Converter for SimpleFile {
    fn to_python(&self, value: &Value) -> Result<Value, ValidationError> {
        match value {
            Value::File(file) => Ok(Value::File(file.clone())),
            other if other.is_empty() => Ok(Value::Null),
            _ => Err(ValidationError::new("Given value is not file")),
        }
    }

    fn from_python(&self, _value: &Value) -> Value {
        Value::Null
    }

    fn required(&self) -> bool {
        self.required
    }
}

/// Identity over maps, the converter of field sets.
#[derive(Debug, Clone, Default)]
pub struct MapConv {
    required: bool,
}

impl MapConv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl Converter for MapConv {
    fn to_python(&self, value: &Value) -> Result<Value, ValidationError> {
        match value {
            Value::Map(_) => Ok(value.clone()),
            Value::Null => Ok(Value::map()),
            _ => Err(ValidationError::new("Given value has incompatible type")),
        }
    }

    fn from_python(&self, value: &Value) -> Value {
        match value {
            Value::Map(_) => value.clone(),
            _ => Value::map(),
        }
    }

    fn required(&self) -> bool {
        self.required
    }
}

/// Converter of field lists: `{index: value}` in submission order to a list.
#[derive(Debug, Clone, Default)]
pub struct ListConv {
    required: bool,
}

impl ListConv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl Converter for ListConv {
    fn to_python(&self, value: &Value) -> Result<Value, ValidationError> {
        match value {
            Value::Map(items) => Ok(Value::List(items.values().cloned().collect())),
            Value::List(_) => Ok(value.clone()),
            Value::Null => Ok(Value::List(Vec::new())),
            _ => Err(ValidationError::new("Given value has incompatible type")),
        }
    }

    /// Items are keyed `"1"..="n"`.
    fn from_python(&self, value: &Value) -> Value {
        match value {
            Value::List(items) => Value::Map(
                items
                    .iter()
                    .enumerate()
                    .map(|(i, item)| ((i + 1).to_string(), item.clone()))
                    .collect::<IndexMap<_, _>>(),
            ),
            Value::Map(_) => value.clone(),
            _ => Value::map(),
        }
    }

    fn required(&self) -> bool {
        self.required
    }
}

type Check = dyn Fn(&Value) -> Result<(), ValidationError> + Send + Sync;

/// Runs an extra check on every non-empty converted value.
#[derive(Clone)]
pub struct Validated {
    conv: Conv,
    check: Arc<Check>,
}

impl Validated {
    pub fn new<F>(conv: impl Converter + 'static, check: F) -> Self
    where
        F: Fn(&Value) -> Result<(), ValidationError> + Send + Sync + 'static,
    {
        Self {
            conv: Arc::new(conv),
            check: Arc::new(check),
        }
    }
}

impl fmt::Debug for Validated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Validated").field("conv", &self.conv).finish()
    }
}

impl Converter for Validated {
    fn to_python(&self, value: &Value) -> Result<Value, ValidationError> {
        let value = self.conv.to_python(value)?;
        if !value.is_empty() {
            (self.check)(&value)?;
        }
        Ok(value)
    }

    fn from_python(&self, value: &Value) -> Value {
        self.conv.from_python(value)
    }

    fn required(&self) -> bool {
        self.conv.required()
    }

    fn multiple(&self) -> bool {
        self.conv.multiple()
    }

    fn choices(&self) -> Option<Vec<Choice>> {
        self.conv.choices()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::UploadedFile;

    #[test]
    fn char_strips_and_checks_length() {
        let conv = Char::new().min_length(2).max_length(4);
        assert_eq!(conv.accept(&Value::from("  abc ")), Ok(Value::from("abc")));
        assert_eq!(
            conv.accept(&Value::from("a")).unwrap_err().message(),
            "should be longer than 2 symbols"
        );
        assert_eq!(
            conv.accept(&Value::from("abcde")).unwrap_err().message(),
            "should be shorter than 4 symbols"
        );
        assert_eq!(conv.accept(&Value::from("")), Ok(Value::from("")));
    }

    #[test]
    fn char_counts_chars_not_bytes() {
        let conv = Char::new().max_length(3);
        assert!(conv.accept(&Value::from("äöü")).is_ok());
    }

    #[test]
    fn char_required() {
        let conv = Char::new().required();
        assert_eq!(
            conv.accept(&Value::from("   ")).unwrap_err(),
            ValidationError::required()
        );
        let conv = Char::new().required().no_strip();
        assert_eq!(conv.accept(&Value::from("  ")), Ok(Value::from("  ")));
    }

    #[test]
    fn char_regex_matches_whole_value() {
        let conv = Char::new().regex("[a-z]+").unwrap();
        assert!(conv.accept(&Value::from("abc")).is_ok());
        assert_eq!(
            conv.accept(&Value::from("abc1")).unwrap_err().message(),
            "field should match [a-z]+"
        );
    }

    #[test]
    fn int_conversion() {
        let conv = Int::new().min(1).max(10);
        assert_eq!(conv.accept(&Value::from(" 7 ")), Ok(Value::Int(7)));
        assert_eq!(conv.accept(&Value::from("")), Ok(Value::Null));
        assert_eq!(
            conv.accept(&Value::from("7a")).unwrap_err().message(),
            "it is not valid integer"
        );
        assert_eq!(
            conv.accept(&Value::from("0")).unwrap_err().message(),
            "should be greater than or equal to 1"
        );
        assert_eq!(
            conv.accept(&Value::from("11")).unwrap_err().message(),
            "should be less than or equal to 10"
        );
        assert_eq!(conv.from_python(&Value::Int(3)), Value::from("3"));
        assert_eq!(conv.from_python(&Value::Null), Value::from(""));
        assert!(Int::new().required().accept(&Value::from("")).is_err());
    }

    #[test]
    fn bool_conversion() {
        let conv = Bool::new();
        assert_eq!(conv.accept(&Value::from("on")), Ok(Value::Bool(true)));
        assert_eq!(conv.accept(&Value::from("")), Ok(Value::Bool(false)));
        assert_eq!(conv.from_python(&Value::Bool(true)), Value::from("checked"));
        assert_eq!(conv.from_python(&Value::Bool(false)), Value::from(""));
        assert!(Bool::new().required().accept(&Value::from("")).is_err());
    }

    #[test]
    fn enum_choice_conversion() {
        let conv = EnumChoice::new([("1", "One"), ("2", "Two")]).conv(Int::new());
        assert_eq!(conv.accept(&Value::from("2")), Ok(Value::Int(2)));
        assert_eq!(conv.accept(&Value::from("")), Ok(Value::Null));
        assert_eq!(
            conv.accept(&Value::from("3")).unwrap_err().message(),
            "no such value: 3"
        );
        assert_eq!(conv.choices().unwrap().len(), 2);
        assert!(EnumChoice::new([("a", "A")])
            .required()
            .accept(&Value::from(""))
            .is_err());
    }

    #[test]
    fn list_of_conversion() {
        let conv = ListOf::new(Int::new());
        assert!(conv.multiple());
        assert_eq!(
            conv.accept(&Value::from(vec!["1", "", "3"])),
            Ok(Value::from(vec![1i64, 3]))
        );
        assert!(conv.accept(&Value::from(vec!["x"])).is_err());
        assert_eq!(
            conv.from_python(&Value::from(vec![1i64, 2])),
            Value::from(vec!["1", "2"])
        );
        assert_eq!(conv.from_python(&Value::Null), Value::List(vec![]));
        assert!(ListOf::new(Int::new())
            .required()
            .accept(&Value::List(vec![]))
            .is_err());
    }

    #[test]
    fn simple_file_conversion() {
        let conv = SimpleFile::new();
        let file = UploadedFile::new("a.txt", None, b"x".to_vec());
        assert_eq!(
            conv.accept(&Value::File(file.clone())),
            Ok(Value::File(file))
        );
        assert_eq!(conv.accept(&Value::from("")), Ok(Value::Null));
        assert!(conv.accept(&Value::from("not a file")).is_err());
        assert!(SimpleFile::new().required().accept(&Value::Null).is_err());
    }

    #[test]
    fn list_conv_round_trips_ordering() {
        let conv = ListConv::new();
        let map: Value = [("3", "c"), ("1", "a")].into_iter().collect();
        assert_eq!(conv.accept(&map), Ok(Value::from(vec!["c", "a"])));
        let keyed = conv.from_python(&Value::from(vec!["x", "y"]));
        assert_eq!(keyed.get("1"), Some(&Value::from("x")));
        assert_eq!(keyed.get("2"), Some(&Value::from("y")));
    }

    #[test]
    fn validated_runs_check_on_values_only() {
        let conv = Validated::new(Char::new(), |value| match value.as_str() {
            Some(text) if text.contains('@') => Ok(()),
            _ => Err(ValidationError::new("not an email")),
        });
        assert!(conv.accept(&Value::from("a@b")).is_ok());
        assert_eq!(
            conv.accept(&Value::from("ab")).unwrap_err().message(),
            "not an email"
        );
        assert!(conv.accept(&Value::from("")).is_ok());
    }
}
