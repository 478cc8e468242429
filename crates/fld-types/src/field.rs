use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FieldResult;
use crate::name::{names_match, validate_name, validate_value};

/// A named value with an optional comment.
///
/// Fields are immutable once stored: there is no update operation. To change
/// a field, remove it and add a new one under the same name.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Field {
    /// Natural key. Unique within a store, compared case-insensitively.
    pub name: String,
    /// Payload. May span several lines.
    pub value: String,
    /// Free-form note. An empty comment means "no comment".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

impl Field {
    /// Create a field without a comment.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            comment: None,
        }
    }

    /// Attach a comment. An empty string clears it.
    pub fn with_comment(mut self, comment: impl Into<String>) -> Self {
        let comment = comment.into();
        self.comment = if comment.is_empty() { None } else { Some(comment) };
        self
    }

    /// Same field with an empty comment folded into `None`.
    pub fn normalized(mut self) -> Self {
        self.comment = self.comment.filter(|c| !c.is_empty());
        self
    }

    /// The comment, or `""` when there is none.
    pub fn comment_str(&self) -> &str {
        self.comment.as_deref().unwrap_or("")
    }

    /// Check name and value against the store's rules.
    pub fn validate(&self, max_name_len: usize) -> FieldResult<()> {
        validate_name(&self.name, max_name_len)?;
        validate_value(&self.name, &self.value)
    }

    /// Returns `true` if `name` refers to this field, ignoring case.
    pub fn is_named(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.name, self.value)?;
        if let Some(comment) = &self.comment {
            write!(f, "  # {comment}")?;
        }
        Ok(())
    }
}
