//! Tri-state field used for values merged from API responses.
//!
//! The API omits fields, sends `null`, or sends a value, and the three mean
//! different things to the merge: an omitted field keeps what we already
//! know, `null` clears it, a value replaces it.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// A value that may be unknown, explicitly null, or present
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Field<T> {
    /// Not reported by the source
    Unknown,
    /// Explicitly reported as absent
    Null,
    /// Reported with a value
    Value(T),
}

impl<T> Default for Field<T> {
    fn default() -> Self {
        Field::Unknown
    }
}

impl<T> Field<T> {
    /// True when the field was not reported
    pub fn is_unknown(&self) -> bool {
        matches!(self, Field::Unknown)
    }

    /// Borrow the contained value, if any
    pub fn as_ref(&self) -> Field<&T> {
        match self {
            Field::Unknown => Field::Unknown,
            Field::Null => Field::Null,
            Field::Value(v) => Field::Value(v),
        }
    }

    /// The contained value, collapsing unknown and null
    pub fn value(self) -> Option<T> {
        match self {
            Field::Value(v) => Some(v),
            _ => None,
        }
    }

    /// Keep `self` unless `incoming` carries a value.
    pub fn or_keep(self, incoming: Field<T>) -> Field<T> {
        match incoming {
            Field::Value(v) => Field::Value(v),
            _ => self,
        }
    }

    /// Keep `self` only when `incoming` is unknown; `null` clears.
    pub fn resync(self, incoming: Field<T>) -> Field<T> {
        match incoming {
            Field::Unknown => self,
            other => other,
        }
    }
}

impl Field<String> {
    /// Treat an empty string as unknown.
    ///
    /// Some API responses carry `""` for fields they do not track; this is
    /// used only where the merge has to tell those apart from real values.
    pub fn non_empty(self) -> Field<String> {
        match self {
            Field::Value(v) if v.is_empty() => Field::Unknown,
            other => other,
        }
    }
}

impl<T> From<Option<T>> for Field<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Field::Value(v),
            None => Field::Null,
        }
    }
}

impl<T: Serialize> Serialize for Field<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Field::Value(v) => serializer.serialize_some(v),
            Field::Unknown | Field::Null => serializer.serialize_none(),
        }
    }
}

// Missing keys never reach this impl: `#[serde(default)]` on the containing
// struct turns them into `Unknown`.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Field<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Field::from)
    }
}
