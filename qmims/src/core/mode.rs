//! Generation mode, resolved once from the compound `mode[:value]` string.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How `generate` builds its prompt.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Mode {
    /// Let the worker analyze the project and write a README from scratch.
    #[default]
    Auto,
    /// Follow a named README template; `None` means the configured default.
    Template(Option<String>),
    /// Apply embedded instructions from a file; `None` means the target README.
    Instruct(Option<PathBuf>),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid mode `{0}` (expected auto, template[:NAME] or instruct[:FILE])")]
pub struct ParseModeError(String);

impl FromStr for Mode {
    type Err = ParseModeError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        let trimmed = raw.trim();
        let (keyword, value) = match trimmed.split_once(':') {
            Some((keyword, value)) => (keyword, Some(value.trim())),
            None => (trimmed, None),
        };
        let value = value.filter(|v| !v.is_empty());
        match (keyword.to_ascii_lowercase().as_str(), value) {
            ("auto", None) => Ok(Mode::Auto),
            ("template", name) => Ok(Mode::Template(name.map(str::to_string))),
            ("instruct", file) => Ok(Mode::Instruct(file.map(PathBuf::from))),
            _ => Err(ParseModeError(raw.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mode::Auto => f.write_str("auto"),
            Mode::Template(None) => f.write_str("template"),
            Mode::Template(Some(name)) => write!(f, "template:{name}"),
            Mode::Instruct(None) => f.write_str("instruct"),
            Mode::Instruct(Some(path)) => write!(f, "instruct:{}", path.display()),
        }
    }
}

impl TryFrom<String> for Mode {
    type Error = ParseModeError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Mode> for String {
    fn from(mode: Mode) -> Self {
        mode.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_compound_forms() {
        assert_eq!("auto".parse(), Ok(Mode::Auto));
        assert_eq!("Template".parse(), Ok(Mode::Template(None)));
        assert_eq!(
            "template:detailed".parse(),
            Ok(Mode::Template(Some("detailed".to_string())))
        );
        assert_eq!("instruct:".parse(), Ok(Mode::Instruct(None)));
        assert_eq!(
            "instruct:docs/notes.md".parse(),
            Ok(Mode::Instruct(Some(PathBuf::from("docs/notes.md"))))
        );
    }

    #[test]
    fn rejects_unknown_modes() {
        assert!("magic".parse::<Mode>().is_err());
        assert!("auto:basic".parse::<Mode>().is_err());
        let err = "".parse::<Mode>().unwrap_err();
        assert!(err.to_string().contains("expected auto"));
    }

    #[test]
    fn display_matches_parse_input() {
        for raw in ["auto", "template", "template:basic", "instruct", "instruct:a.md"] {
            let mode: Mode = raw.parse().expect("parse");
            assert_eq!(mode.to_string(), raw);
        }
    }
}
