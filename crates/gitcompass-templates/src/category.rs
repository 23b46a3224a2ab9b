//! Template categories.

use std::fmt;
use std::str::FromStr;

use crate::error::TemplateError;

/// Domain a template belongs to. Also the sub-directory name inside every
/// search location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum TemplateCategory {
    Issue,
    Project,
    Roadmap,
    /// Any other category directory, e.g. `milestone`
    Custom(String),
}

impl TemplateCategory {
    /// The built-in categories.
    pub const BUILTIN: [TemplateCategory; 3] = [Self::Issue, Self::Project, Self::Roadmap];

    /// Directory name for this category.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Issue => "issue",
            Self::Project => "project",
            Self::Roadmap => "roadmap",
            Self::Custom(name) => name,
        }
    }

    /// Check that the directory name is a single safe path component.
    ///
    /// `Custom` can be built directly, bypassing [`FromStr`].
    pub fn validate(&self) -> Result<(), TemplateError> {
        match self {
            Self::Custom(name) => validate_name(name),
            _ => Ok(()),
        }
    }
}

impl fmt::Display for TemplateCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TemplateCategory {
    type Err = TemplateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lowered = s.trim().to_lowercase();
        match lowered.as_str() {
            "issue" => Ok(Self::Issue),
            "project" => Ok(Self::Project),
            "roadmap" => Ok(Self::Roadmap),
            _ => {
                validate_name(&lowered)?;
                Ok(Self::Custom(lowered))
            }
        }
    }
}

/// Reject names that cannot be used as a single path component.
pub(crate) fn validate_name(name: &str) -> Result<(), TemplateError> {
    let reason = if name.is_empty() {
        Some("name is empty")
    } else if name == "." || name == ".." {
        Some("name refers to a directory")
    } else if name.contains(|c: char| c == '/' || c == '\\') {
        Some("name contains a path separator")
    } else if name.starts_with('.') {
        Some("name starts with '.'")
    } else {
        None
    };

    match reason {
        Some(reason) => Err(TemplateError::InvalidName {
            name: name.to_string(),
            reason: reason.to_string(),
        }),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("issue", TemplateCategory::Issue ; "issue")]
    #[test_case("Project", TemplateCategory::Project ; "mixed case")]
    #[test_case(" ROADMAP ", TemplateCategory::Roadmap ; "padded upper")]
    #[test_case("milestone", TemplateCategory::Custom("milestone".into()) ; "custom")]
    fn test_parse_category(input: &str, expected: TemplateCategory) {
        assert_eq!(input.parse::<TemplateCategory>().unwrap(), expected);
    }

    #[test_case("" ; "empty")]
    #[test_case("../etc" ; "traversal")]
    #[test_case("a/b" ; "separator")]
    #[test_case(".hidden" ; "hidden")]
    fn test_rejects_invalid_category(input: &str) {
        assert!(matches!(
            input.parse::<TemplateCategory>(),
            Err(TemplateError::InvalidName { .. })
        ));
    }

    #[test_case("../escaped" ; "traversal")]
    #[test_case("a/b" ; "separator")]
    #[test_case("" ; "empty")]
    fn test_validate_rejects_unsafe_custom(name: &str) {
        assert!(TemplateCategory::Custom(name.into()).validate().is_err());
    }

    #[test]
    fn test_validate_accepts_known_and_plain_custom() {
        for category in TemplateCategory::BUILTIN {
            assert!(category.validate().is_ok());
        }
        assert!(TemplateCategory::Custom("milestone".into()).validate().is_ok());
    }

    #[test]
    fn test_display_is_directory_name() {
        assert_eq!(TemplateCategory::Issue.to_string(), "issue");
        assert_eq!(TemplateCategory::Custom("milestone".into()).to_string(), "milestone");
    }
}
