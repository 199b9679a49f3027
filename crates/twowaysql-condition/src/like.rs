//! Like-search options: wildcard placement and escaping.

use serde::{Deserialize, Serialize};

/// Where wildcards go around the search text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LikeSearchKind {
    /// `text%`
    Prefix,
    /// `%text%`
    Contain,
    /// `%text`
    Suffix,
    /// `text`, escaped but without wildcards.
    #[default]
    Exact,
}

/// How a like-search value is escaped and wrapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LikeSearchOption {
    /// Wildcard placement.
    pub kind: LikeSearchKind,
    /// Escape character declared in the `escape` clause.
    pub escape: char,
}

impl Default for LikeSearchOption {
    fn default() -> Self {
        Self {
            kind: LikeSearchKind::default(),
            escape: Self::DEFAULT_ESCAPE,
        }
    }
}

impl LikeSearchOption {
    /// Escape character used unless overridden.
    pub const DEFAULT_ESCAPE: char = '|';

    /// `like 'text%'`
    #[must_use]
    pub fn prefix() -> Self {
        Self {
            kind: LikeSearchKind::Prefix,
            ..Self::default()
        }
    }

    /// `like '%text%'`
    #[must_use]
    pub fn contain() -> Self {
        Self {
            kind: LikeSearchKind::Contain,
            ..Self::default()
        }
    }

    /// `like '%text'`
    #[must_use]
    pub fn suffix() -> Self {
        Self {
            kind: LikeSearchKind::Suffix,
            ..Self::default()
        }
    }

    /// Use another escape character.
    #[must_use]
    pub fn with_escape(mut self, escape: char) -> Self {
        self.escape = escape;
        self
    }

    /// Escape the escape character and both wildcards.
    #[must_use]
    pub fn escape_text(&self, text: &str) -> String {
        let mut out = String::with_capacity(text.len());
        for c in text.chars() {
            if c == self.escape || c == '%' || c == '_' {
                out.push(self.escape);
            }
            out.push(c);
        }
        out
    }

    /// The bind value for `text`: escaped, then wrapped with wildcards.
    #[must_use]
    pub fn apply(&self, text: &str) -> String {
        let escaped = self.escape_text(text);
        match self.kind {
            LikeSearchKind::Prefix => format!("{escaped}%"),
            LikeSearchKind::Contain => format!("%{escaped}%"),
            LikeSearchKind::Suffix => format!("%{escaped}"),
            LikeSearchKind::Exact => escaped,
        }
    }

    /// The clause text, with one placeholder.
    #[must_use]
    pub fn clause(&self, column: &str) -> String {
        let escape = if self.escape == '\'' {
            "''".to_owned()
        } else {
            self.escape.to_string()
        };
        format!("{column} like ? escape '{escape}'")
    }
}
