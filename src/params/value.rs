use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Number, Value};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

/// Parameter values keyed by parameter name.
pub type ParamMap = BTreeMap<String, ParamValue>;

/// Values treated as `true` when a boolean arrives as text (case-insensitive).
const TRUTHY: [&str; 5] = ["y", "yes", "true", "t", "1"];

/// Kind of a declared parameter.
///
/// The serialized names are the wire names clients see in component
/// documentation (`"string"`, `"number_list"`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParamType {
    /// Short text
    String,
    /// Secret text, never logged
    Password,
    Boolean,
    /// `YYYY-MM-DD`
    Date,
    /// `HH:MM:SS` (minutes and seconds optional)
    Time,
    /// Integer or floating point
    Number,
    Uri,
    StringList,
    NumberList,
}

impl ParamType {
    #[must_use]
    pub fn wire_name(self) -> &'static str {
        match self {
            ParamType::String => "string",
            ParamType::Password => "password",
            ParamType::Boolean => "boolean",
            ParamType::Date => "date",
            ParamType::Time => "time",
            ParamType::Number => "number",
            ParamType::Uri => "uri",
            ParamType::StringList => "string_list",
            ParamType::NumberList => "number_list",
        }
    }

    #[must_use]
    pub fn is_list(self) -> bool {
        matches!(self, ParamType::StringList | ParamType::NumberList)
    }

    /// Only text, number and their list forms may declare a choice set.
    #[must_use]
    pub fn supports_choices(self) -> bool {
        matches!(
            self,
            ParamType::String | ParamType::Number | ParamType::StringList | ParamType::NumberList
        )
    }

    /// True when `value` is already in this type's runtime representation.
    ///
    /// List types always go through conversion so that scalars get wrapped and
    /// every element is normalized.
    fn accepts_as_is(self, value: &ParamValue) -> bool {
        matches!(
            (self, value),
            (
                ParamType::String | ParamType::Password | ParamType::Uri,
                ParamValue::Text(_)
            ) | (ParamType::Boolean, ParamValue::Bool(_))
                | (ParamType::Date, ParamValue::Date(_))
                | (ParamType::Time, ParamValue::Time(_))
                | (ParamType::Number, ParamValue::Number(_))
        )
    }

    /// Convert `value` into this type's runtime representation.
    ///
    /// Returns a human readable reason on failure; callers attach the
    /// parameter name and section.
    pub fn coerce(self, value: &ParamValue) -> Result<ParamValue, String> {
        if self.accepts_as_is(value) {
            return Ok(value.clone());
        }
        match self {
            ParamType::String | ParamType::Password | ParamType::Uri => Err(format!(
                "Cannot convert provided parameter type ({}) to necessary type '{}'",
                value.kind(),
                self.wire_name()
            )),
            ParamType::Boolean => match value {
                ParamValue::Text(s) => Ok(ParamValue::Bool(is_truthy(s))),
                other => Err(format!(
                    "Cannot convert provided parameter type ({}) to necessary type 'boolean'",
                    other.kind()
                )),
            },
            ParamType::Number => to_number(value),
            ParamType::Date => match value {
                ParamValue::Text(s) => parse_date(s).map(ParamValue::Date),
                other => Err(format!("Cannot convert {} to a date", other.kind())),
            },
            ParamType::Time => match value {
                ParamValue::Text(s) => parse_time(s).map(ParamValue::Time),
                other => Err(format!("Cannot convert {} to a time", other.kind())),
            },
            ParamType::StringList => Ok(ParamValue::List(
                value
                    .elements()
                    .iter()
                    .map(|e| ParamValue::Text(e.to_string()))
                    .collect(),
            )),
            ParamType::NumberList => value
                .elements()
                .iter()
                .map(to_number)
                .collect::<Result<Vec<_>, _>>()
                .map(ParamValue::List),
        }
    }
}

impl Display for ParamType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// `{y, yes, true, t, 1}` in any case is true, everything else is false.
#[must_use]
pub fn is_truthy(text: &str) -> bool {
    let lowered = text.trim().to_ascii_lowercase();
    TRUTHY.contains(&lowered.as_str())
}

fn to_number(value: &ParamValue) -> Result<ParamValue, String> {
    match value {
        ParamValue::Number(n) => Ok(ParamValue::Number(n.clone())),
        ParamValue::Text(s) => parse_number(s).map(ParamValue::Number),
        other => Err(format!("Cannot convert {} to a number", other.kind())),
    }
}

/// Integer literals first, then floating point.
fn parse_number(text: &str) -> Result<Number, String> {
    let text = text.trim();
    if let Ok(i) = text.parse::<i64>() {
        return Ok(Number::from(i));
    }
    text.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .ok_or_else(|| format!("'{text}' is not a number"))
}

fn parse_date(text: &str) -> Result<NaiveDate, String> {
    let parts: Vec<&str> = text.trim().split('-').collect();
    let [y, m, d] = parts.as_slice() else {
        return Err(format!("'{text}' is not a date of the form YYYY-MM-DD"));
    };
    let (y, m, d) = (
        y.parse::<i32>().map_err(|e| e.to_string())?,
        m.parse::<u32>().map_err(|e| e.to_string())?,
        d.parse::<u32>().map_err(|e| e.to_string())?,
    );
    NaiveDate::from_ymd_opt(y, m, d).ok_or_else(|| format!("'{text}' is out of range for a date"))
}

fn parse_time(text: &str) -> Result<NaiveTime, String> {
    let parts = text
        .trim()
        .split(':')
        .map(|p| p.parse::<u32>().map_err(|e| e.to_string()))
        .collect::<Result<Vec<_>, _>>()?;
    let (h, m, s) = match parts.as_slice() {
        [h] => (*h, 0, 0),
        [h, m] => (*h, *m, 0),
        [h, m, s] => (*h, *m, *s),
        _ => return Err(format!("'{text}' is not a time of the form HH:MM:SS")),
    };
    NaiveTime::from_hms_opt(h, m, s).ok_or_else(|| format!("'{text}' is out of range for a time"))
}

/// A parameter value, either as received on the wire or after conversion.
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    Text(String),
    Bool(bool),
    Number(Number),
    Date(NaiveDate),
    Time(NaiveTime),
    List(Vec<ParamValue>),
    /// Objects and nulls that arrived in a JSON body
    Json(Value),
}

impl ParamValue {
    /// Short name of the representation, used in conversion errors.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            ParamValue::Text(_) => "text",
            ParamValue::Bool(_) => "boolean",
            ParamValue::Number(_) => "number",
            ParamValue::Date(_) => "date",
            ParamValue::Time(_) => "time",
            ParamValue::List(_) => "list",
            ParamValue::Json(Value::Null) => "null",
            ParamValue::Json(_) => "object",
        }
    }

    /// The elements of a list, or the value itself as a one-element slice.
    #[must_use]
    pub fn elements(&self) -> &[ParamValue] {
        match self {
            ParamValue::List(items) => items,
            other => std::slice::from_ref(other),
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Text(s) => Some(s),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ParamValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ParamValue::Number(n) => n.as_f64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ParamValue::Number(n) => n.as_i64(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            ParamValue::Date(d) => Some(*d),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_time(&self) -> Option<NaiveTime> {
        match self {
            ParamValue::Time(t) => Some(*t),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_list(&self) -> Option<&[ParamValue]> {
        match self {
            ParamValue::List(items) => Some(items),
            _ => None,
        }
    }

    /// JSON form used for persistence and rendering.
    #[must_use]
    pub fn to_json(&self) -> Value {
        match self {
            ParamValue::Text(s) => Value::String(s.clone()),
            ParamValue::Bool(b) => Value::Bool(*b),
            ParamValue::Number(n) => Value::Number(n.clone()),
            ParamValue::Date(d) => Value::String(d.format("%Y-%m-%d").to_string()),
            ParamValue::Time(t) => Value::String(t.format("%H:%M:%S").to_string()),
            ParamValue::List(items) => Value::Array(items.iter().map(ParamValue::to_json).collect()),
            ParamValue::Json(v) => v.clone(),
        }
    }
}

impl Display for ParamValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Text(s) => f.write_str(s),
            ParamValue::Bool(b) => write!(f, "{b}"),
            ParamValue::Number(n) => write!(f, "{n}"),
            ParamValue::Date(d) => write!(f, "{}", d.format("%Y-%m-%d")),
            ParamValue::Time(t) => write!(f, "{}", t.format("%H:%M:%S")),
            ParamValue::List(_) | ParamValue::Json(_) => write!(f, "{}", self.to_json()),
        }
    }
}

impl From<Value> for ParamValue {
    fn from(value: Value) -> Self {
        match value {
            Value::String(s) => ParamValue::Text(s),
            Value::Bool(b) => ParamValue::Bool(b),
            Value::Number(n) => ParamValue::Number(n),
            Value::Array(items) => ParamValue::List(items.into_iter().map(ParamValue::from).collect()),
            other => ParamValue::Json(other),
        }
    }
}

impl From<&str> for ParamValue {
    fn from(value: &str) -> Self {
        ParamValue::Text(value.to_string())
    }
}

impl From<String> for ParamValue {
    fn from(value: String) -> Self {
        ParamValue::Text(value)
    }
}

impl From<bool> for ParamValue {
    fn from(value: bool) -> Self {
        ParamValue::Bool(value)
    }
}

impl From<i64> for ParamValue {
    fn from(value: i64) -> Self {
        ParamValue::Number(Number::from(value))
    }
}

impl From<i32> for ParamValue {
    fn from(value: i32) -> Self {
        ParamValue::Number(Number::from(value))
    }
}

impl From<f64> for ParamValue {
    fn from(value: f64) -> Self {
        Number::from_f64(value)
            .map(ParamValue::Number)
            .unwrap_or(ParamValue::Json(Value::Null))
    }
}

impl From<NaiveDate> for ParamValue {
    fn from(value: NaiveDate) -> Self {
        ParamValue::Date(value)
    }
}

impl From<NaiveTime> for ParamValue {
    fn from(value: NaiveTime) -> Self {
        ParamValue::Time(value)
    }
}

impl From<Vec<ParamValue>> for ParamValue {
    fn from(value: Vec<ParamValue>) -> Self {
        ParamValue::List(value)
    }
}

impl Serialize for ParamValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_json().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ParamValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(ParamValue::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_boolean_text_conversion() {
        for t in ["y", "YES", "True", "t", "1"] {
            assert_eq!(ParamType::Boolean.coerce(&t.into()), Ok(ParamValue::Bool(true)));
        }
        for f in ["n", "no", "false", "0", "maybe", ""] {
            assert_eq!(ParamType::Boolean.coerce(&f.into()), Ok(ParamValue::Bool(false)));
        }
        assert!(ParamType::Boolean.coerce(&ParamValue::from(1)).is_err());
    }

    #[test]
    fn test_number_prefers_integer() {
        assert_eq!(ParamType::Number.coerce(&"42".into()).unwrap().as_i64(), Some(42));
        assert_eq!(ParamType::Number.coerce(&"4.5".into()).unwrap().as_f64(), Some(4.5));
        assert!(ParamType::Number.coerce(&"forty".into()).is_err());
        assert!(ParamType::Number.coerce(&"NaN".into()).is_err());
    }

    #[test]
    fn test_date_and_time_parsing() {
        let d = ParamType::Date.coerce(&"2010-3-7".into()).unwrap();
        assert_eq!(d.as_date(), NaiveDate::from_ymd_opt(2010, 3, 7));
        assert!(ParamType::Date.coerce(&"2010/03/07".into()).is_err());
        assert!(ParamType::Date.coerce(&"2010-02-30".into()).is_err());

        let t = ParamType::Time.coerce(&"13:05".into()).unwrap();
        assert_eq!(t.as_time(), NaiveTime::from_hms_opt(13, 5, 0));
        assert!(ParamType::Time.coerce(&"25:00:00".into()).is_err());
    }

    #[test]
    fn test_list_conversion_wraps_scalars() {
        let v = ParamType::NumberList.coerce(&"7".into()).unwrap();
        assert_eq!(v, ParamValue::List(vec![ParamValue::from(7)]));

        let v = ParamType::StringList
            .coerce(&ParamValue::from(json!(["a", 2, true])))
            .unwrap();
        assert_eq!(
            v,
            ParamValue::List(vec!["a".into(), "2".into(), "true".into()])
        );

        assert!(ParamType::NumberList
            .coerce(&ParamValue::from(json!(["1", "x"])))
            .is_err());
    }

    #[test]
    fn test_text_types_reject_non_text() {
        assert!(ParamType::String.coerce(&ParamValue::from(5)).is_err());
        assert!(ParamType::Uri.coerce(&"/resource/x".into()).is_ok());
    }

    #[test]
    fn test_json_round_trip_of_converted_values() {
        let date = ParamValue::Date(NaiveDate::from_ymd_opt(2024, 1, 31).unwrap());
        assert_eq!(date.to_json(), json!("2024-01-31"));
        let back: ParamValue = serde_json::from_value(json!({"k": 1})).unwrap();
        assert_eq!(back.kind(), "object");
    }
}
