//! Validated primitives shared by the CarePoint crates.
//!
//! Free-text fields arriving from clients (symptom names, patient names, medication names) are
//! trimmed and checked once at the boundary, then carried as [`NonEmptyText`].

/// Errors that can occur when creating validated text types.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum TextError {
    /// The input text was empty or contained only whitespace
    #[error("{field} cannot be empty")]
    Empty { field: &'static str },
    /// The input text exceeded the permitted length
    #[error("{field} exceeds maximum length of {max} characters")]
    TooLong { field: &'static str, max: usize },
}

/// Upper bound applied to every free-text field.
pub const MAX_TEXT_LEN: usize = 500;

/// A string type that guarantees trimmed, non-empty content.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NonEmptyText(String);

impl NonEmptyText {
    /// Creates a new `NonEmptyText`, naming the field in any error.
    ///
    /// The input is trimmed of leading and trailing whitespace. Empty (after trimming) and
    /// over-long inputs are rejected.
    pub fn new(field: &'static str, input: impl AsRef<str>) -> Result<Self, TextError> {
        let trimmed = input.as_ref().trim();
        if trimmed.is_empty() {
            return Err(TextError::Empty { field });
        }
        if trimmed.chars().count() > MAX_TEXT_LEN {
            return Err(TextError::TooLong {
                field,
                max: MAX_TEXT_LEN,
            });
        }
        Ok(Self(trimmed.to_owned()))
    }

    /// Like [`NonEmptyText::new`] but maps a blank or missing value to `None`.
    pub fn optional<S: AsRef<str>>(
        field: &'static str,
        input: Option<S>,
    ) -> Result<Option<Self>, TextError> {
        match input {
            Some(value) if !value.as_ref().trim().is_empty() => Self::new(field, value).map(Some),
            _ => Ok(None),
        }
    }

    /// Returns the inner string as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl std::fmt::Display for NonEmptyText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for NonEmptyText {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl serde::Serialize for NonEmptyText {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> serde::Deserialize<'de> for NonEmptyText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        NonEmptyText::new("text", &s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_surrounding_whitespace() {
        let text = NonEmptyText::new("name", "  fever ").unwrap();
        assert_eq!(text.as_str(), "fever");
    }

    #[test]
    fn rejects_blank_input_naming_the_field() {
        let err = NonEmptyText::new("symptom", "   ").unwrap_err();
        assert_eq!(err, TextError::Empty { field: "symptom" });
        assert_eq!(err.to_string(), "symptom cannot be empty");
    }

    #[test]
    fn rejects_over_long_input() {
        let err = NonEmptyText::new("notes", "a".repeat(MAX_TEXT_LEN + 1)).unwrap_err();
        assert!(matches!(err, TextError::TooLong { field: "notes", .. }));
    }

    #[test]
    fn optional_maps_blank_to_none() {
        assert_eq!(NonEmptyText::optional("id", Some("  ")).unwrap(), None);
        assert_eq!(NonEmptyText::optional::<&str>("id", None).unwrap(), None);
        assert_eq!(
            NonEmptyText::optional("id", Some("AB12")).unwrap().unwrap().as_str(),
            "AB12"
        );
    }

    #[test]
    fn deserialize_rejects_empty_string() {
        let result: Result<NonEmptyText, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}
