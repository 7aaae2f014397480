//! Path step type.

use std::fmt;

/// A single segment of a property path.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Step {
    /// An object key.
    Key(String),
    /// An array index. Also addresses the equivalent string key on objects.
    Index(usize),
    /// The `[]` placeholder, standing for every index of an array.
    Any,
}

impl Step {
    pub fn key(key: impl Into<String>) -> Self {
        Step::Key(key.into())
    }

    pub fn index(idx: usize) -> Self {
        Step::Index(idx)
    }

    pub fn is_any(&self) -> bool {
        matches!(self, Step::Any)
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Key(key) => f.write_str(key),
            Step::Index(idx) => write!(f, "[{}]", idx),
            Step::Any => f.write_str("[]"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(Step::key("name").to_string(), "name");
        assert_eq!(Step::index(3).to_string(), "[3]");
        assert_eq!(Step::Any.to_string(), "[]");
    }
}
