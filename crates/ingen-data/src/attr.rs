//! Resolved attribute lists.
//!
//! While parsing, attribute instances are raw: a name, an optional
//! argument list, possibly an alias to resolve later. The inspect
//! parser's resolution pass boils each list down to what evaluation
//! needs: the resolved attribute names (aliases replaced by their
//! target's name, which is what `has_attribute` matches) and the
//! `AttributeData` dictionary mapping each attribute name to a
//! dictionary of its argument text.

use crate::store::DictId;

/// An attribute list attached to a struct, field or type info item.
#[derive(Debug, Default)]
pub struct AttrList {
    /// Resolved attribute names carried by the item.
    pub names: Vec<String>,
    /// `AttributeData`: attribute name -> {parameter name -> argument
    /// text}. `None` until the resolution pass has run.
    pub data: Option<DictId>,
}

impl AttrList {
    /// True when the item carries `name`, after alias resolution.
    pub fn has(&self, name: &str) -> bool {
        self.names.iter().any(|n| n == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has() {
        let list = AttrList {
            names: vec!["Serialized".to_string(), "Pub".to_string()],
            data: None,
        };
        assert!(list.has("Pub"));
        assert!(list.has("Serialized"));
        assert!(!list.has("pub"));
    }
}
