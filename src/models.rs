use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::errors::ReferenceError;

/// A GitHub-style `owner/name` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RepositoryReference {
    pub owner: String,
    pub name: String,
}

impl RepositoryReference {
    /// Parse an `owner/name` token. Exactly two halves are accepted, and
    /// each must be usable as a single path component.
    pub fn parse(token: &str) -> Result<Self, ReferenceError> {
        let trimmed = token.trim();
        let mut parts = trimmed.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(owner), Some(name), None) if is_path_segment(owner) && is_path_segment(name) => Ok(Self {
                owner: owner.to_string(),
                name: name.to_string(),
            }),
            _ => Err(ReferenceError {
                token: token.to_string(),
            }),
        }
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Directory name used for the local checkout.
    pub fn checkout_dir_name(&self) -> String {
        format!("{}__{}", self.owner, self.name)
    }
}

/// Non-empty, not `.` or `..`, and free of separators and whitespace.
fn is_path_segment(part: &str) -> bool {
    !part.is_empty()
        && part != "."
        && part != ".."
        && !part.chars().any(|c| c == '\\' || c.is_whitespace() || c.is_control())
}

impl fmt::Display for RepositoryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

/// Project category driving template selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Classification {
    Ml,
    Api,
    Cli,
    Frontend,
    Library,
    Infra,
    Monorepo,
    Generic,
}

impl Classification {
    pub const ALL: [Classification; 8] = [
        Self::Ml,
        Self::Api,
        Self::Cli,
        Self::Frontend,
        Self::Library,
        Self::Infra,
        Self::Monorepo,
        Self::Generic,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ml => "ml",
            Self::Api => "api",
            Self::Cli => "cli",
            Self::Frontend => "frontend",
            Self::Library => "library",
            Self::Infra => "infra",
            Self::Monorepo => "monorepo",
            Self::Generic => "generic",
        }
    }
}

impl fmt::Display for Classification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Classification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("Invalid classification: {}", s))
    }
}

/// Final HTML for one repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedDocument {
    pub html: String,
    pub bytes: usize,
}

impl GeneratedDocument {
    pub fn new(html: String) -> Self {
        let bytes = html.len();
        Self { html, bytes }
    }
}

/// One row of the generated-pages registry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManifestEntry {
    pub owner: String,
    pub repo: String,
    pub full_name: String,
    pub path: String,
    pub url: String,
    pub is_external: bool,
    #[serde(rename = "type")]
    pub kind: Classification,
    pub generated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_reference() {
        let r = RepositoryReference::parse("foo/bar").unwrap();
        assert_eq!(r.owner, "foo");
        assert_eq!(r.name, "bar");
        assert_eq!(r.full_name(), "foo/bar");
        assert_eq!(r.to_string(), "foo/bar");
    }

    #[test]
    fn test_parse_trims_whitespace() {
        let r = RepositoryReference::parse("  foo/bar \n").unwrap();
        assert_eq!(r.full_name(), "foo/bar");
    }

    #[test]
    fn test_parse_rejects_malformed_tokens() {
        for token in ["foo", "foo/", "/bar", "foo/bar/baz", "", "/", "foo bar/baz"] {
            let err = RepositoryReference::parse(token).unwrap_err();
            assert_eq!(err.token, token, "token {:?} should be rejected", token);
        }
    }

    #[test]
    fn test_parse_rejects_path_traversal() {
        for token in ["../x", "x/..", "./x", "x/.", "..\\evil/x", "x/a\\b"] {
            assert!(RepositoryReference::parse(token).is_err(), "token {:?} should be rejected", token);
        }
        // dots inside a name are fine
        let r = RepositoryReference::parse("acme/site.github.io").unwrap();
        assert_eq!(r.name, "site.github.io");
    }

    #[test]
    fn test_checkout_dir_name_is_flat() {
        let r = RepositoryReference::parse("rust-lang/cargo").unwrap();
        assert_eq!(r.checkout_dir_name(), "rust-lang__cargo");
    }

    #[test]
    fn test_classification_round_trips_through_str() {
        for c in Classification::ALL {
            assert_eq!(c.as_str().parse::<Classification>().unwrap(), c);
        }
        assert!("webapp".parse::<Classification>().is_err());
    }

    #[test]
    fn test_generated_document_counts_bytes() {
        let doc = GeneratedDocument::new("<p>é</p>".to_string());
        assert_eq!(doc.bytes, 9);
    }

    #[test]
    fn test_manifest_entry_uses_external_field_names() {
        let entry = ManifestEntry {
            owner: "foo".into(),
            repo: "bar".into(),
            full_name: "foo/bar".into(),
            path: "showcase/foo/bar/index.html".into(),
            url: "https://github.com/foo/bar".into(),
            is_external: true,
            kind: Classification::Cli,
            generated_at: Utc::now(),
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["fullName"], "foo/bar");
        assert_eq!(json["isExternal"], true);
        assert_eq!(json["type"], "cli");
        assert!(json.get("generatedAt").is_some());
    }
}
