//! Checksum utilities for generated-file staleness detection

use sha2::{Digest, Sha256};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Header line prefix carrying the schema checksum in generated files
pub const HEADER_PREFIX: &str = "schema-sha256:";

/// SHA256 checksum of schema source text
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Checksum(String);

impl Checksum {
    /// Compute checksum from schema text
    pub fn from_content(content: &str) -> Self {
        let hash = Sha256::digest(content.as_bytes());
        Self(format!("{:x}", hash))
    }

    /// Read the checksum recorded in a generated file's header
    pub fn from_generated_header(generated: &str) -> Option<Self> {
        generated
            .lines()
            .take_while(|line| line.starts_with("//!"))
            .find_map(|line| {
                let rest = line.trim_start_matches("//!").trim();
                rest.strip_prefix(HEADER_PREFIX)
                    .map(|hex| Self(hex.trim().to_string()))
            })
    }

    /// Get the hex string representation
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Verify that content matches this checksum
    pub fn verify(&self, content: &str) -> bool {
        let computed = Self::from_content(content);
        self.0 == computed.0
    }
}

impl fmt::Display for Checksum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_checksum_consistency() {
        let content = "class Server { host: string }";
        assert_eq!(Checksum::from_content(content), Checksum::from_content(content));
        assert_eq!(Checksum::from_content(content).as_str().len(), 64);
    }

    #[test]
    fn test_checksum_different_content() {
        assert_ne!(
            Checksum::from_content("class A { }"),
            Checksum::from_content("class B { }")
        );
    }

    #[test]
    fn test_checksum_verification() {
        let content = "class A { x: int }";
        let checksum = Checksum::from_content(content);
        assert!(checksum.verify(content));
        assert!(!checksum.verify("class A { x: uint }"));
    }

    #[test]
    fn test_from_generated_header() {
        let checksum = Checksum::from_content("class A { }");
        let generated = format!(
            "//! Generated by tagfile from `a.tagschema` - DO NOT EDIT\n//!\n//! {} {}\n\nuse x;\n",
            HEADER_PREFIX, checksum
        );
        assert_eq!(Checksum::from_generated_header(&generated), Some(checksum));
        assert_eq!(Checksum::from_generated_header("pub struct A;\n"), None);
    }
}
