//! Entry references: `module.path[:callable][ ARG]`
//!
//! An entry reference names code to invoke after install or in exec mode. The
//! module path and callable are dotted identifiers; at most one trailing
//! argument may follow, separated by whitespace.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::error::{Result, config};

const IDENT_PATH: &str = r"[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)*";

#[allow(clippy::expect_used)]
static ENTRY_GRAMMAR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"^(?P<module>{IDENT_PATH})(?::(?P<callable>{IDENT_PATH}))?(?:\s+(?P<arg>\S+))?$"
    ))
    .expect("entry grammar is a valid regex")
});

/// A parsed entry reference
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryReference {
    pub module: String,
    pub callable: Option<String>,
    pub argument: Option<String>,
}

impl EntryReference {
    /// Parse an entry reference, rejecting anything outside the grammar
    pub fn parse(text: &str) -> Result<Self> {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return Err(config::invalid_entrypoint(text, "entrypoint is empty"));
        }

        let Some(caps) = ENTRY_GRAMMAR.captures(trimmed) else {
            let reason = if trimmed.split_whitespace().count() > 2 {
                "only a single argument may follow the callable"
            } else {
                "does not match 'module.path[:callable] [ARG]'"
            };
            return Err(config::invalid_entrypoint(text, reason));
        };

        Ok(Self {
            module: caps["module"].to_string(),
            callable: caps.name("callable").map(|m| m.as_str().to_string()),
            argument: caps.name("arg").map(|m| m.as_str().to_string()),
        })
    }

    /// The `module[:callable]` part without the argument
    pub fn target(&self) -> String {
        match &self.callable {
            Some(callable) => format!("{}:{}", self.module, callable),
            None => self.module.clone(),
        }
    }
}

impl fmt::Display for EntryReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.target())?;
        if let Some(arg) = &self.argument {
            write!(f, " {arg}")?;
        }
        Ok(())
    }
}

impl std::str::FromStr for EntryReference {
    type Err = crate::error::ChubError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for EntryReference {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for EntryReference {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_module_and_callable() {
        let entry = EntryReference::parse("mypackage.cli:main").unwrap();
        assert_eq!(entry.module, "mypackage.cli");
        assert_eq!(entry.callable.as_deref(), Some("main"));
        assert_eq!(entry.argument, None);
    }

    #[test]
    fn test_parse_module_only() {
        let entry = EntryReference::parse("http.server").unwrap();
        assert_eq!(entry.module, "http.server");
        assert_eq!(entry.callable, None);
    }

    #[test]
    fn test_parse_with_single_argument() {
        let entry = EntryReference::parse("tool:run --check").unwrap();
        assert_eq!(entry.target(), "tool:run");
        assert_eq!(entry.argument.as_deref(), Some("--check"));
        assert_eq!(entry.to_string(), "tool:run --check");
    }

    #[test]
    fn test_rejects_two_arguments() {
        let err = EntryReference::parse("tool:run a b").unwrap_err();
        assert!(err.to_string().contains("single argument"));
    }

    #[test]
    fn test_rejects_bad_grammar() {
        for bad in ["", ":main", "pkg:", "pkg::main", "1pkg:main", "pkg-name:main"] {
            assert!(EntryReference::parse(bad).is_err(), "accepted {bad:?}");
        }
    }

    #[test]
    fn test_display_normalizes_whitespace() {
        let entry = EntryReference::parse("  pkg.mod:fn   arg ").unwrap();
        assert_eq!(entry.to_string(), "pkg.mod:fn arg");
    }
}
