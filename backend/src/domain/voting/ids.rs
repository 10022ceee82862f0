//! Identifier newtypes for voting codes, voters, candidates, and categories.
//!
//! Identifiers are opaque strings chosen by the admin tooling and the client.
//! They are only required to be non-empty and free of surrounding whitespace,
//! since document keys are built by plain concatenation.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Validation errors shared by the identifier newtypes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierValidationError {
    /// Identifier is empty once trimmed.
    #[error("{field} must not be empty")]
    Empty { field: &'static str },
    /// Identifier carries leading or trailing whitespace.
    #[error("{field} must not contain surrounding whitespace")]
    SurroundingWhitespace { field: &'static str },
}

impl IdentifierValidationError {
    /// Wire name of the offending field.
    pub fn field(&self) -> &'static str {
        match self {
            Self::Empty { field } | Self::SurroundingWhitespace { field } => field,
        }
    }
}

macro_rules! define_identifier {
    ($(#[$meta:meta])* $name:ident => $field:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Validate and wrap a raw identifier.
            pub fn new(value: impl Into<String>) -> Result<Self, IdentifierValidationError> {
                let raw = value.into();
                if raw.trim().is_empty() {
                    return Err(IdentifierValidationError::Empty { field: $field });
                }
                if raw.trim() != raw {
                    return Err(IdentifierValidationError::SurroundingWhitespace {
                        field: $field,
                    });
                }
                Ok(Self(raw))
            }

            /// Borrow the identifier as a string slice.
            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                self.as_str()
            }
        }

        impl TryFrom<String> for $name {
            type Error = IdentifierValidationError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                Self::new(value)
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.0
            }
        }
    };
}

define_identifier!(
    /// Identifier of a voting code, i.e. one voting event.
    CodeId => "codeId"
);
define_identifier!(
    /// Client-chosen identifier of a voter.
    VoterId => "voterId"
);
define_identifier!(
    /// Identifier of a candidate under a voting code.
    CandidateId => "candidateIds"
);
define_identifier!(
    /// Identifier of a voting category.
    CategoryId => "categoryId"
);
