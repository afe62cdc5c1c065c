//! Validation module
//!
//! Identifiers that end up in SQL text (tables, columns, aliases) are
//! validated here before the compiler quotes them. Values never pass through
//! this module; they are always bound.

use std::fmt;

/// Validation errors for database identifiers
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// Name contains invalid characters (only alphanumeric and underscore allowed)
    InvalidCharacters(String),
    /// Name is too long
    TooLong {
        name: String,
        length: usize,
        max_length: usize,
    },
    /// Name is empty
    Empty,
    /// Name starts with invalid character (must start with letter or underscore)
    InvalidStartCharacter(String),
    /// Wildcard used where a concrete name is required
    MisplacedWildcard(String),
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::InvalidCharacters(name) => {
                write!(f, "Invalid characters in name '{}': only alphanumeric characters and underscores are allowed", name)
            }
            ValidationError::TooLong {
                name,
                length,
                max_length,
            } => {
                write!(
                    f,
                    "Name '{}' is too long: {} characters (max {})",
                    name, length, max_length
                )
            }
            ValidationError::Empty => {
                write!(f, "Name cannot be empty")
            }
            ValidationError::InvalidStartCharacter(name) => {
                write!(f, "Name '{}' must start with a letter or underscore", name)
            }
            ValidationError::MisplacedWildcard(name) => {
                write!(f, "Name '{}' uses '*' where a column or table name is required", name)
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Identifier length limit shared by the supported databases
const MAX_LENGTH: usize = 63;

fn validate_segment(segment: &str, whole: &str) -> Result<(), ValidationError> {
    if segment.is_empty() {
        return Err(ValidationError::Empty);
    }

    if segment.len() > MAX_LENGTH {
        return Err(ValidationError::TooLong {
            name: segment.to_string(),
            length: segment.len(),
            max_length: MAX_LENGTH,
        });
    }

    let first_char = segment.chars().next().ok_or(ValidationError::Empty)?;
    if !first_char.is_ascii_alphabetic() && first_char != '_' {
        return Err(ValidationError::InvalidStartCharacter(whole.to_string()));
    }

    if !segment.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(ValidationError::InvalidCharacters(whole.to_string()));
    }

    Ok(())
}

/// A validated table name, optionally schema-qualified (`schema.table`)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedTableName(String);

impl ValidatedTableName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty);
        }
        for segment in name.split('.') {
            if segment == "*" {
                return Err(ValidationError::MisplacedWildcard(name.to_string()));
            }
            validate_segment(segment, name)?;
        }
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// A validated column reference: `column`, `table.column`, `*` or `table.*`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ValidatedFieldName(String);

impl ValidatedFieldName {
    pub fn new(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::Empty);
        }

        let segments: Vec<&str> = name.split('.').collect();
        if segments.len() > 3 {
            return Err(ValidationError::InvalidCharacters(name.to_string()));
        }
        let last = segments.len() - 1;
        for (i, segment) in segments.iter().enumerate() {
            if *segment == "*" {
                if i != last {
                    return Err(ValidationError::MisplacedWildcard(name.to_string()));
                }
                continue;
            }
            validate_segment(segment, name)?;
        }
        Ok(Self(name.to_string()))
    }

    /// A bare name without qualification or wildcard, used for aliases
    pub fn alias(name: &str) -> Result<Self, ValidationError> {
        let name = name.trim();
        if name.contains('.') || name.contains('*') {
            return Err(ValidationError::InvalidCharacters(name.to_string()));
        }
        validate_segment(name, name)?;
        Ok(Self(name.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.0.split('.')
    }

    pub fn is_wildcard(&self) -> bool {
        self.0 == "*" || self.0.ends_with(".*")
    }

    /// Last segment of the reference (`id` for `test.id`)
    pub fn column(&self) -> &str {
        self.0.rsplit('.').next().unwrap_or(&self.0)
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl AsRef<str> for ValidatedTableName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for ValidatedFieldName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ValidatedTableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for ValidatedFieldName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
