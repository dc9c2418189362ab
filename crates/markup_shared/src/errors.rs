//! Error results that can be returned from the markup crates

use crate::location::{Location, TextRange};
use std::fmt::{Display, Formatter};

/// Parser error that defines an error (message) on the given source range. The parser never
/// aborts; these are collected from the error nodes of a finished tree.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseError {
    /// Parse error message
    pub message: String,
    /// Range of the source that the error covers. Zero-width for "expected" style errors.
    pub range: TextRange,
}

impl ParseError {
    #[must_use]
    pub fn new(message: &str, range: TextRange) -> Self {
        ParseError {
            message: message.to_string(),
            range,
        }
    }

    /// Returns the error with a resolved line/column location
    #[must_use]
    pub fn locate(&self, location: Location) -> LocatedError {
        LocatedError {
            message: self.message.clone(),
            location,
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {}", self.message, self.range)
    }
}

/// A parse error together with the line and column it starts on
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LocatedError {
    pub message: String,
    pub location: Location,
}

impl Display for LocatedError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} at {:?}", self.message, self.location)
    }
}
