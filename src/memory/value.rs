//! Concrete heap value
//!
//! The memory manager is generic over any [`Trace`] value. This module provides
//! the small value type used by the script driver, the inspector and the tests.
//!
//! # Value Types
//!
//! - [`Value::Null`]: Absence of a value
//! - [`Value::Int`]: 64-bit signed integer
//! - [`Value::Text`]: Owned string
//! - [`Value::Ref`]: Reference to another heap cell (an edge for counting and tracing)
//! - [`Value::List`]: Ordered sequence of values, possibly holding references

use super::{Reference, Trace};
use std::fmt;

/// Runtime values stored in heap cells and on the evaluation stack
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    Int(i64),
    Text(String),
    Ref(Reference),
    List(Vec<Value>),
}

impl Value {
    /// Get the integer value, returns None if not an Int
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(n) => Some(*n),
            _ => None,
        }
    }
}

impl Trace for Value {
    fn trace(&self, visit: &mut dyn FnMut(Reference)) {
        match self {
            Value::Ref(r) => visit(*r),
            Value::List(items) => {
                for item in items {
                    item.trace(visit);
                }
            }
            Value::Null | Value::Int(_) | Value::Text(_) => {}
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Int(n) => write!(f, "{}", n),
            Value::Text(s) => write!(f, "{:?}", s),
            Value::Ref(r) => write!(f, "{}", r),
            Value::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "]")
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_list_references() {
        let value = Value::List(vec![
            Value::Ref(Reference::new(1)),
            Value::Int(2),
            Value::List(vec![Value::Ref(Reference::new(4)), Value::Null]),
        ]);
        assert_eq!(
            value.references(),
            vec![Reference::new(1), Reference::new(4)]
        );
        assert_eq!(value.to_string(), "[#1, 2, [#4, null]]");
    }
}
