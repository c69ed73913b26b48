//! URL slug type for products and categories.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Errors that can occur when building a [`Slug`].
#[derive(thiserror::Error, Debug, Clone)]
pub enum SlugError {
    /// The source string produced an empty slug.
    #[error("slug cannot be empty")]
    Empty,
}

/// A URL-safe slug derived from an entity name.
///
/// Slugs are unique per entity kind (enforced by the database) and are
/// derived from the display name: lowercased, with runs of whitespace
/// replaced by a single dash. Characters other than ASCII alphanumerics and
/// dashes are dropped.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Slug(String);

impl Slug {
    /// Build a slug from a display name.
    ///
    /// # Errors
    ///
    /// Returns [`SlugError::Empty`] if nothing slug-worthy remains after
    /// normalization (e.g. the name was all punctuation).
    pub fn from_name(name: &str) -> Result<Self, SlugError> {
        let mut out = String::with_capacity(name.len());
        let mut last_dash = true; // suppress leading dashes
        for c in name.trim().chars() {
            if c.is_ascii_alphanumeric() {
                out.push(c.to_ascii_lowercase());
                last_dash = false;
            } else if (c.is_whitespace() || c == '-' || c == '_') && !last_dash {
                out.push('-');
                last_dash = true;
            }
        }
        while out.ends_with('-') {
            out.pop();
        }

        if out.is_empty() {
            return Err(SlugError::Empty);
        }
        Ok(Self(out))
    }

    /// Get the slug as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Slug {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Slug {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_from_name_basic() {
        assert_eq!(Slug::from_name("Blue Widget").unwrap().as_str(), "blue-widget");
    }

    #[test]
    fn test_from_name_collapses_whitespace() {
        assert_eq!(
            Slug::from_name("  Big   Red  Chair ").unwrap().as_str(),
            "big-red-chair"
        );
    }

    #[test]
    fn test_from_name_drops_punctuation() {
        assert_eq!(
            Slug::from_name("Deluxe! Widget (v2)").unwrap().as_str(),
            "deluxe-widget-v2"
        );
    }

    #[test]
    fn test_from_name_preserves_digits() {
        assert_eq!(Slug::from_name("iPhone 15 Pro").unwrap().as_str(), "iphone-15-pro");
    }

    #[test]
    fn test_from_name_empty() {
        assert!(matches!(Slug::from_name("!!!"), Err(SlugError::Empty)));
        assert!(matches!(Slug::from_name(""), Err(SlugError::Empty)));
    }

    #[test]
    fn test_no_trailing_dash() {
        assert_eq!(Slug::from_name("widget ").unwrap().as_str(), "widget");
        assert_eq!(Slug::from_name("widget!").unwrap().as_str(), "widget");
    }
}
