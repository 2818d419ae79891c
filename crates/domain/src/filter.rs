//! Rule filter: keyword or pattern predicates over an entry field

use regex::{Regex, RegexBuilder};

use crate::model::Entry;

const PATTERN_SIZE_LIMIT: usize = 1 << 20;

/// Field of an entry a rule is evaluated against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterField {
    Title,
    ArticleBody,
    Link,
    None,
}

impl FilterField {
    pub fn parse(value: &str) -> Result<Self, FilterConfigError> {
        match value.trim().to_ascii_lowercase().as_str() {
            "title" => Ok(FilterField::Title),
            "article" | "article-body" | "article_body" => Ok(FilterField::ArticleBody),
            "link" => Ok(FilterField::Link),
            "none" => Ok(FilterField::None),
            other => Err(FilterConfigError::UnknownField(other.to_string())),
        }
    }
}

/// How the pattern decides whether an entry passes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterMode {
    /// Pass when the pattern occurs anywhere in the field
    Include,
    /// Pass when the pattern occurs nowhere in the field
    Exclude,
    /// Pass when the pattern matches the whole field
    RegexMatch,
    /// Pass when the pattern does not match the whole field
    RegexNotMatch,
}

impl FilterMode {
    pub fn parse(value: &str) -> Result<Self, FilterConfigError> {
        let normalized = value
            .trim()
            .to_ascii_lowercase()
            .replace(['-', '_'], " ");
        match normalized.as_str() {
            "include" => Ok(FilterMode::Include),
            "exclude" => Ok(FilterMode::Exclude),
            "regex match" => Ok(FilterMode::RegexMatch),
            "regex not match" => Ok(FilterMode::RegexNotMatch),
            other => Err(FilterConfigError::UnknownMode(other.to_string())),
        }
    }

    fn passes_on_match(self) -> bool {
        matches!(self, FilterMode::Include | FilterMode::RegexMatch)
    }
}

/// Invalid filter configuration, reported before any fetch begins
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FilterConfigError {
    #[error("filter field, mode and pattern must be set together")]
    Partial,
    #[error("unsupported filter field '{0}' (expected title, article, link or none)")]
    UnknownField(String),
    #[error(
        "unsupported filter mode '{0}' (expected include, exclude, regex match or regex not match)"
    )]
    UnknownMode(String),
    #[error("invalid filter pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// A validated (field, mode, pattern) triple with its compiled matcher
#[derive(Debug, Clone)]
pub struct FilterRule {
    field: FilterField,
    mode: FilterMode,
    pattern: String,
    matcher: Regex,
}

impl FilterRule {
    pub fn new(
        field: FilterField,
        mode: FilterMode,
        pattern: &str,
    ) -> Result<Self, FilterConfigError> {
        let matcher = match mode {
            FilterMode::Include | FilterMode::Exclude => compile(pattern)
                .or_else(|_| compile(&regex::escape(pattern)))
                .map_err(|message| FilterConfigError::InvalidPattern {
                    pattern: pattern.to_string(),
                    message,
                })?,
            FilterMode::RegexMatch | FilterMode::RegexNotMatch => {
                compile(&format!("^(?:{pattern})$")).map_err(|message| {
                    FilterConfigError::InvalidPattern {
                        pattern: pattern.to_string(),
                        message,
                    }
                })?
            }
        };

        Ok(Self {
            field,
            mode,
            pattern: pattern.to_string(),
            matcher,
        })
    }

    /// Build an optional rule from the three optional configuration values
    ///
    /// All three absent yields `None`; a partial triple is an error.
    pub fn from_parts(
        field: Option<&str>,
        mode: Option<&str>,
        pattern: Option<&str>,
    ) -> Result<Option<Self>, FilterConfigError> {
        fn present(value: Option<&str>) -> Option<&str> {
            value.filter(|v| !v.trim().is_empty())
        }

        match (present(field), present(mode), present(pattern)) {
            (None, None, None) => Ok(None),
            (Some(field), Some(mode), Some(pattern)) => {
                let rule =
                    Self::new(FilterField::parse(field)?, FilterMode::parse(mode)?, pattern)?;
                Ok(Some(rule))
            }
            _ => Err(FilterConfigError::Partial),
        }
    }

    pub fn field(&self) -> FilterField {
        self.field
    }

    pub fn mode(&self) -> FilterMode {
        self.mode
    }

    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    /// Whether the entry is kept by this rule
    pub fn passes(&self, entry: &Entry) -> bool {
        let text = match self.field {
            FilterField::Title => entry.title.as_str(),
            FilterField::ArticleBody => entry.raw_body.as_str(),
            FilterField::Link => entry.link.as_str(),
            FilterField::None => return true,
        };

        self.matcher.is_match(text) == self.mode.passes_on_match()
    }
}

/// Evaluate an optional rule; an absent rule always passes
pub fn passes(rule: Option<&FilterRule>, entry: &Entry) -> bool {
    rule.is_none_or(|rule| rule.passes(entry))
}

fn compile(pattern: &str) -> Result<Regex, String> {
    RegexBuilder::new(pattern)
        .size_limit(PATTERN_SIZE_LIMIT)
        .build()
        .map_err(|e| e.to_string())
}
