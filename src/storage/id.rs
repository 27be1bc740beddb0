// Record identifiers
// Ids are stored as JSON numbers but arrive from URL paths as text,
// so every Id carries a canonical key that both forms agree on

use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::hash::{Hash, Hasher};

/// The form an id had when it was read, kept so it can be written back unchanged
#[derive(Debug, Clone, PartialEq)]
enum Repr {
    Int(i64),
    UInt(u64),
    Float(f64),
    Text(String),
}

/// An identifier compared by value, not by type
///
/// `Id::from(7)` and `Id::from("7")` are equal. Text that parses as a number
/// canonicalizes like that number (`"07"`, `" 7 "` and `"7.0"` all match `7`);
/// any other text is compared as-is, so a malformed path id simply matches nothing.
#[derive(Debug, Clone)]
pub struct Id {
    repr: Repr,
    key: String,
}

impl Id {
    /// The canonical key used for every comparison
    pub fn key(&self) -> &str {
        &self.key
    }

    fn new(repr: Repr) -> Self {
        let key = match &repr {
            Repr::Int(i) => i.to_string(),
            Repr::UInt(u) => u.to_string(),
            Repr::Float(f) => canonical_float(*f),
            Repr::Text(s) => {
                let trimmed = s.trim();
                match trimmed.parse::<f64>() {
                    Ok(f) if f.is_finite() && !trimmed.is_empty() => canonical_float(f),
                    _ => s.clone(),
                }
            }
        };
        Self { repr, key }
    }
}

/// Integral floats render without a fractional part so `7.0` and `7` share a key
fn canonical_float(f: f64) -> String {
    if f.fract() == 0.0 && f.abs() < 1e15 {
        // -0.0 and 0.0 must agree
        format!("{}", f as i64)
    } else {
        f.to_string()
    }
}

impl PartialEq for Id {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key
    }
}

impl Eq for Id {}

impl Hash for Id {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.key.hash(state);
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.repr {
            Repr::Text(s) => f.write_str(s),
            _ => f.write_str(&self.key),
        }
    }
}

impl From<i64> for Id {
    fn from(value: i64) -> Self {
        Self::new(Repr::Int(value))
    }
}

impl From<u64> for Id {
    fn from(value: u64) -> Self {
        Self::new(Repr::UInt(value))
    }
}

impl From<i32> for Id {
    fn from(value: i32) -> Self {
        Self::new(Repr::Int(value.into()))
    }
}

impl From<f64> for Id {
    fn from(value: f64) -> Self {
        Self::new(Repr::Float(value))
    }
}

impl From<&str> for Id {
    fn from(value: &str) -> Self {
        Self::new(Repr::Text(value.to_string()))
    }
}

impl From<String> for Id {
    fn from(value: String) -> Self {
        Self::new(Repr::Text(value))
    }
}

impl Serialize for Id {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match &self.repr {
            Repr::Int(i) => serializer.serialize_i64(*i),
            Repr::UInt(u) => serializer.serialize_u64(*u),
            Repr::Float(f) => serializer.serialize_f64(*f),
            Repr::Text(s) => serializer.serialize_str(s),
        }
    }
}

struct IdVisitor;

impl<'de> Visitor<'de> for IdVisitor {
    type Value = Id;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a number or a string id")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Id, E> {
        Ok(Id::from(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Id, E> {
        Ok(Id::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Id, E> {
        Ok(Id::from(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Id, E> {
        Ok(Id::from(v))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Id, E> {
        Ok(Id::from(v))
    }
}

impl<'de> Deserialize<'de> for Id {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(IdVisitor)
    }
}
