//! Scope tokens.
//!
//! A scope names the universe a screen runs over:
//! - `all`: whole market
//! - an index short name (`hs300`, `zz500`, `zz1000`, `cyb`, `kcb`)
//! - `custom:600519,000858`: an explicit code list

use std::fmt;

/// Index short names and their numeric identifiers.
pub const INDEX_CODES: &[(&str, &str)] = &[
    ("hs300", "000300"),
    ("zz500", "000905"),
    ("zz1000", "000852"),
    ("cyb", "399006"),
    ("kcb", "000688"),
];

const CUSTOM_PREFIX: &str = "custom:";

/// Numeric identifier for an index short name.
pub fn index_code(name: &str) -> Option<&'static str> {
    INDEX_CODES
        .iter()
        .find(|(short, _)| short.eq_ignore_ascii_case(name))
        .map(|(_, code)| *code)
}

/// Parsed scope token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Scope {
    /// Whole market
    All,
    /// Constituents of a named index
    Index {
        name: String,
        code: &'static str,
    },
    /// Explicit code list
    Custom(Vec<String>),
    /// Unrecognized token; loads nothing
    Unknown(String),
}

impl Scope {
    /// Parse a scope token. Never fails; unrecognized input becomes
    /// [`Scope::Unknown`].
    pub fn parse(token: &str) -> Self {
        let token = token.trim();

        if token.eq_ignore_ascii_case("all") {
            return Self::All;
        }

        if let Some(list) = token.strip_prefix(CUSTOM_PREFIX) {
            let codes = list
                .split(',')
                .map(str::trim)
                .filter(|c| !c.is_empty())
                .map(str::to_string)
                .collect();
            return Self::Custom(codes);
        }

        match index_code(token) {
            Some(code) => Self::Index {
                name: token.to_lowercase(),
                code,
            },
            None => Self::Unknown(token.to_string()),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown(_))
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => write!(f, "all"),
            Self::Index { name, .. } => write!(f, "{}", name),
            Self::Custom(codes) => write!(f, "{}{}", CUSTOM_PREFIX, codes.join(",")),
            Self::Unknown(token) => write!(f, "{}", token),
        }
    }
}
