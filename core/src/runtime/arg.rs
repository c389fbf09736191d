//! Runtime values.

use std::borrow::Cow;
use std::fmt;

use crate::custom_var::CustomVar;

/// A value produced by evaluation.
///
/// Strings borrow from the syntax tree when they come straight from a
/// literal and are owned once computed.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum Arg<'a> {
    /// No value. Operators that cannot combine their operands yield this.
    #[default]
    Empty,
    Bool(bool),
    Str(Cow<'a, str>),
    Uint(u64),
    Int(i64),
    FP(f64),
    Custom(CustomVar),
}

impl<'a> Arg<'a> {
    pub fn str(text: impl Into<Cow<'a, str>>) -> Self {
        Arg::Str(text.into())
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Arg::Empty)
    }

    pub fn is_number(&self) -> bool {
        matches!(self, Arg::Uint(_) | Arg::Int(_) | Arg::FP(_))
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Arg::Uint(_) | Arg::Int(_))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Arg::Empty => "empty",
            Arg::Bool(_) => "bool",
            Arg::Str(_) => "string",
            Arg::Uint(_) => "uint",
            Arg::Int(_) => "int",
            Arg::FP(_) => "fp",
            Arg::Custom(_) => "custom",
        }
    }

    /// Truthiness: numbers are true when non-zero, strings when non-empty.
    pub fn get_bool(&self) -> Option<bool> {
        match self {
            Arg::Bool(b) => Some(*b),
            Arg::Uint(v) => Some(*v != 0),
            Arg::Int(v) => Some(*v != 0),
            Arg::FP(v) => Some(*v != 0.0),
            Arg::Str(s) => Some(!s.is_empty()),
            Arg::Empty | Arg::Custom(_) => None,
        }
    }

    pub fn get_uint(&self) -> Option<u64> {
        match self {
            Arg::Bool(b) => Some(*b as u64),
            Arg::Uint(v) => Some(*v),
            Arg::Int(v) => Some(*v as u64),
            Arg::FP(v) => Some(*v as u64),
            _ => None,
        }
    }

    pub fn get_int(&self) -> Option<i64> {
        match self {
            Arg::Bool(b) => Some(*b as i64),
            Arg::Uint(v) => Some(*v as i64),
            Arg::Int(v) => Some(*v),
            Arg::FP(v) => Some(*v as i64),
            _ => None,
        }
    }

    pub fn get_fp(&self) -> Option<f64> {
        match self {
            Arg::Bool(b) => Some(if *b { 1.0 } else { 0.0 }),
            Arg::Uint(v) => Some(*v as f64),
            Arg::Int(v) => Some(*v as f64),
            Arg::FP(v) => Some(*v),
            _ => None,
        }
    }

    pub fn get_str(&self) -> Option<&str> {
        match self {
            Arg::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Detaches the value from the syntax tree it may borrow from.
    pub fn into_owned(self) -> Arg<'static> {
        match self {
            Arg::Empty => Arg::Empty,
            Arg::Bool(b) => Arg::Bool(b),
            Arg::Str(s) => Arg::Str(Cow::Owned(s.into_owned())),
            Arg::Uint(v) => Arg::Uint(v),
            Arg::Int(v) => Arg::Int(v),
            Arg::FP(v) => Arg::FP(v),
            Arg::Custom(var) => Arg::Custom(var),
        }
    }
}

impl From<bool> for Arg<'_> {
    fn from(value: bool) -> Self {
        Arg::Bool(value)
    }
}

impl From<u64> for Arg<'_> {
    fn from(value: u64) -> Self {
        Arg::Uint(value)
    }
}

impl From<i64> for Arg<'_> {
    fn from(value: i64) -> Self {
        Arg::Int(value)
    }
}

impl From<f64> for Arg<'_> {
    fn from(value: f64) -> Self {
        Arg::FP(value)
    }
}

impl<'a> From<&'a str> for Arg<'a> {
    fn from(value: &'a str) -> Self {
        Arg::Str(Cow::Borrowed(value))
    }
}

impl From<String> for Arg<'_> {
    fn from(value: String) -> Self {
        Arg::Str(Cow::Owned(value))
    }
}

impl From<CustomVar> for Arg<'_> {
    fn from(value: CustomVar) -> Self {
        Arg::Custom(value)
    }
}

impl fmt::Display for Arg<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Empty => Ok(()),
            Arg::Bool(b) => write!(f, "{b}"),
            Arg::Str(s) => f.write_str(s),
            Arg::Uint(v) => write!(f, "{v}"),
            Arg::Int(v) => write!(f, "{v}"),
            Arg::FP(v) => write!(f, "{v}"),
            Arg::Custom(var) => f.write_str(&var.to_display_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truthiness() {
        assert_eq!(Arg::Int(0).get_bool(), Some(false));
        assert_eq!(Arg::FP(-2.0).get_bool(), Some(true));
        assert_eq!(Arg::str("").get_bool(), Some(false));
        assert_eq!(Arg::str("hero").get_bool(), Some(true));
        assert_eq!(Arg::Empty.get_bool(), None);
    }

    #[test]
    fn numeric_views() {
        assert_eq!(Arg::Int(-1).get_uint(), Some(u64::MAX));
        assert_eq!(Arg::Bool(true).get_int(), Some(1));
        assert_eq!(Arg::Uint(3).get_fp(), Some(3.0));
        assert_eq!(Arg::str("3").get_int(), None);
    }

    #[test]
    fn display() {
        assert_eq!(Arg::FP(4.5).to_string(), "4.5");
        assert_eq!(Arg::Uint(7).to_string(), "7");
        assert_eq!(Arg::str("hi").to_string(), "hi");
        assert_eq!(Arg::Empty.to_string(), "");
    }

    #[test]
    fn into_owned_detaches() {
        let source = String::from("borrowed");
        let owned = Arg::from(source.as_str()).into_owned();
        drop(source);
        assert_eq!(owned, Arg::str("borrowed"));
    }
}
