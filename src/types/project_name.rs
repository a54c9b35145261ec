// ABOUTME: Project name validation for names passed to the deploy CLI.
// ABOUTME: Rejects names that could be read as flags or split by a shell.

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectNameError {
    #[error("project name cannot be empty")]
    Empty,

    #[error("project name exceeds maximum length of 128 characters")]
    TooLong,

    #[error("project name cannot start with a hyphen")]
    StartsWithHyphen,

    #[error("invalid character in project name: {0:?}")]
    InvalidChar(char),
}

/// Name of a project as known to the deploy CLI account.
///
/// Ordering is lexicographic, which is also the order the watcher visits
/// projects in.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct ProjectName(String);

impl ProjectName {
    pub fn new(value: &str) -> Result<Self, ProjectNameError> {
        if value.is_empty() {
            return Err(ProjectNameError::Empty);
        }

        if value.chars().count() > 128 {
            return Err(ProjectNameError::TooLong);
        }

        if value.starts_with('-') {
            return Err(ProjectNameError::StartsWithHyphen);
        }

        if let Some(c) = value
            .chars()
            .find(|c| c.is_whitespace() || c.is_control() || *c == '/' || *c == '\\')
        {
            return Err(ProjectNameError::InvalidChar(c));
        }

        Ok(Self(value.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl<'de> Deserialize<'de> for ProjectName {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        ProjectName::new(&raw).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_typical_names() {
        for name in ["app", "my-app", "api_v2", "Web.Frontend", "a"] {
            assert!(ProjectName::new(name).is_ok(), "{name} should be valid");
        }
    }

    #[test]
    fn rejects_empty() {
        assert_eq!(ProjectName::new(""), Err(ProjectNameError::Empty));
    }

    #[test]
    fn rejects_flag_like_names() {
        assert_eq!(
            ProjectName::new("--json"),
            Err(ProjectNameError::StartsWithHyphen)
        );
    }

    #[test]
    fn rejects_whitespace_and_separators() {
        assert_eq!(
            ProjectName::new("my app"),
            Err(ProjectNameError::InvalidChar(' '))
        );
        assert_eq!(
            ProjectName::new("../etc"),
            Err(ProjectNameError::InvalidChar('/'))
        );
    }

    #[test]
    fn rejects_overlong_names() {
        let long = "a".repeat(129);
        assert_eq!(ProjectName::new(&long), Err(ProjectNameError::TooLong));
    }

    #[test]
    fn orders_lexicographically() {
        let mut names = vec![
            ProjectName::new("web").unwrap(),
            ProjectName::new("api").unwrap(),
            ProjectName::new("worker").unwrap(),
        ];
        names.sort();
        let ordered: Vec<_> = names.iter().map(ProjectName::as_str).collect();
        assert_eq!(ordered, ["api", "web", "worker"]);
    }

    #[test]
    fn deserialize_validates() {
        let ok: ProjectName = serde_json::from_str("\"app\"").unwrap();
        assert_eq!(ok.as_str(), "app");
        assert!(serde_json::from_str::<ProjectName>("\"-x\"").is_err());
    }
}
