//! Codegen Configuration
//!
//! The render profile controls how resolved classes become Rust source:
//! which crate the runtime types are imported from, extra derives, doc
//! comments, and naming conventions. Schema resolution is profile-free.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

// =============================================================================
// Naming
// =============================================================================

/// Naming configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConfig {
    /// Acronyms kept upper-case in type names (e.g., ID, URL, HTTP)
    pub acronyms: HashSet<String>,

    /// Whether all-caps words stay all-caps
    pub preserve_screaming_case: bool,
}

impl Default for NamingConfig {
    fn default() -> Self {
        Self {
            acronyms: ["ID", "URL", "UUID", "API", "HTTP", "JSON", "XML", "SQL", "URI", "UI", "IO"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            preserve_screaming_case: true,
        }
    }
}

// =============================================================================
// Render Profile
// =============================================================================

/// Rust rendering configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderProfile {
    /// Crate path the runtime types are imported from
    pub runtime_crate: String,

    /// Derives on every generated struct. `Default` is implemented by hand
    /// and is skipped here.
    pub derives: Vec<String>,

    /// Copy schema `///` docs onto structs and accessors
    pub emit_docs: bool,

    /// Prefix for field names that are Rust keywords
    pub keyword_escape: String,

    pub naming: NamingConfig,
}

impl Default for RenderProfile {
    fn default() -> Self {
        Self::rust()
    }
}

impl RenderProfile {
    /// Default profile, importing the runtime from the `tagfile` crate
    pub fn rust() -> Self {
        Self {
            runtime_crate: "tagfile".to_string(),
            derives: vec!["Debug".to_string(), "Clone".to_string(), "PartialEq".to_string()],
            emit_docs: true,
            keyword_escape: "r#".to_string(),
            naming: NamingConfig::default(),
        }
    }

    /// Profile for code compiled inside the runtime crate itself
    pub fn in_crate() -> Self {
        Self {
            runtime_crate: "crate".to_string(),
            ..Self::rust()
        }
    }
}

// =============================================================================
// Render Helpers
// =============================================================================

impl RenderProfile {
    /// Escape a keyword if needed. Keywords that cannot be raw identifiers
    /// get a trailing underscore instead.
    pub fn escape_keyword(&self, name: &str) -> String {
        if NON_RAW_KEYWORDS.contains(&name) {
            format!("{}_", name)
        } else if RUST_KEYWORDS.contains(&name) {
            format!("{}{}", self.keyword_escape, name)
        } else {
            name.to_string()
        }
    }

    /// `#[derive(...)]` line, or `None` when no derives are configured
    pub fn derive_attr(&self) -> Option<String> {
        let derives: Vec<&str> = self
            .derives
            .iter()
            .map(|d| d.trim())
            .filter(|d| !d.is_empty() && *d != "Default")
            .collect();
        if derives.is_empty() {
            None
        } else {
            Some(format!("#[derive({})]", derives.join(", ")))
        }
    }

    /// Wrap a type to make it optional (missing)
    pub fn wrap_optional(&self, type_str: &str) -> String {
        format!("Option<{}>", type_str)
    }

    /// Wrap a type in a container (repeated or vector)
    pub fn wrap_array(&self, type_str: &str) -> String {
        format!("Vec<{}>", type_str)
    }
}

// =============================================================================
// Keywords
// =============================================================================

pub(crate) const RUST_KEYWORDS: &[&str] = &[
    "as", "break", "const", "continue", "crate", "else", "enum", "extern",
    "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod",
    "move", "mut", "pub", "ref", "return", "self", "Self", "static", "struct",
    "super", "trait", "true", "type", "unsafe", "use", "where", "while",
    "async", "await", "dyn", "abstract", "become", "box", "do", "final",
    "macro", "override", "priv", "typeof", "unsized", "virtual", "yield", "try",
];

/// Keywords rejected as `r#` raw identifiers
const NON_RAW_KEYWORDS: &[&str] = &["self", "Self", "super", "crate"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rust_profile_defaults() {
        let profile = RenderProfile::rust();
        assert_eq!(profile.runtime_crate, "tagfile");
        assert_eq!(profile.keyword_escape, "r#");
        assert!(profile.emit_docs);
        assert_eq!(RenderProfile::in_crate().runtime_crate, "crate");
    }

    #[test]
    fn test_keyword_escape() {
        let rust = RenderProfile::rust();
        assert_eq!(rust.escape_keyword("type"), "r#type");
        assert_eq!(rust.escape_keyword("name"), "name");
        assert_eq!(rust.escape_keyword("self"), "self_");
        assert_eq!(rust.escape_keyword("crate"), "crate_");
    }

    #[test]
    fn test_derive_attr() {
        let mut profile = RenderProfile::rust();
        assert_eq!(profile.derive_attr().as_deref(), Some("#[derive(Debug, Clone, PartialEq)]"));

        profile.derives = vec!["Debug".to_string(), "Default".to_string()];
        assert_eq!(profile.derive_attr().as_deref(), Some("#[derive(Debug)]"));

        profile.derives.clear();
        assert_eq!(profile.derive_attr(), None);
    }

    #[test]
    fn test_wrap_containers() {
        let rust = RenderProfile::rust();
        assert_eq!(rust.wrap_optional("String"), "Option<String>");
        assert_eq!(rust.wrap_array("i64"), "Vec<i64>");
    }

    #[test]
    fn test_profile_from_toml_fills_defaults() {
        let profile: RenderProfile = toml::from_str("emit_docs = false\n").unwrap();
        assert!(!profile.emit_docs);
        assert_eq!(profile.runtime_crate, "tagfile");
        assert!(profile.naming.acronyms.contains("HTTP"));
    }
}
