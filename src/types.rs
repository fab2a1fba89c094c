/// Shared types used across the codebase

use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Catalog operations, used for logging and error context
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Create,
    Select,
    Update,
    Delete,
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Operation::Create => "create",
            Operation::Select => "select",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// A field in a partial update.
///
/// Distinguishes a key that was left out of the payload (`Absent`) from one
/// sent as `null` (`Null`) and one carrying a value. Pair with
/// `#[serde(default)]` so missing keys deserialize to `Absent`.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Patch<T> {
    #[default]
    Absent,
    Null,
    Value(T),
}

impl<T> Patch<T> {
    pub fn is_absent(&self) -> bool {
        matches!(self, Patch::Absent)
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> Patch<U> {
        match self {
            Patch::Absent => Patch::Absent,
            Patch::Null => Patch::Null,
            Patch::Value(v) => Patch::Value(f(v)),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Patch<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(|value| match value {
            Some(v) => Patch::Value(v),
            None => Patch::Null,
        })
    }
}

impl<T: Serialize> Serialize for Patch<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Patch::Value(v) => v.serialize(serializer),
            _ => serializer.serialize_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Body {
        #[serde(default)]
        title: Patch<String>,
        #[serde(default)]
        price: Patch<f64>,
    }

    #[test]
    fn distinguishes_absent_null_and_value() {
        let body: Body = serde_json::from_str(r#"{"title": null}"#).unwrap();
        assert_eq!(body.title, Patch::Null);
        assert_eq!(body.price, Patch::Absent);

        let body: Body = serde_json::from_str(r#"{"price": 375}"#).unwrap();
        assert!(body.title.is_absent());
        assert_eq!(body.price, Patch::Value(375.0));
    }

    #[test]
    fn map_keeps_state() {
        assert_eq!(Patch::Value(2).map(|v| v * 2), Patch::Value(4));
        assert_eq!(Patch::<i32>::Null.map(|v| v * 2), Patch::Null);
        assert_eq!(Patch::<i32>::Absent.map(|v| v * 2), Patch::Absent);
    }
}
