#![deny(missing_docs)]

//! # Resource Kind Naming
//!
//! Case variants of a resource kind and the `{Kind}` template placeholders
//! used by layer conventions.

use crate::error::{AppError, AppResult};
use heck::{ToShoutySnakeCase, ToSnakeCase, ToUpperCamelCase};
use std::fmt::{self, Display};
use std::str::FromStr;

/// A validated resource kind such as `BlogPost`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceKind {
    pascal: String,
    snake: String,
}

impl ResourceKind {
    /// Validates `raw` and derives its case variants.
    ///
    /// Accepts any casing (`blog_post`, `blog-post`, `BlogPost`). A kind that
    /// is already UpperCamel keeps its exact spelling, so `HTTPRoute` stays
    /// `HTTPRoute` rather than becoming `HttpRoute`.
    pub fn parse(raw: &str) -> AppResult<Self> {
        let raw = raw.trim();
        let mut chars = raw.chars();
        let valid_start = chars.next().is_some_and(|c| c.is_ascii_alphabetic());
        let valid_rest = chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
        if !valid_start || !valid_rest {
            return Err(AppError::Config(format!(
                "Invalid resource kind '{}': expected an identifier such as 'BlogPost'",
                raw
            )));
        }

        let upper_camel =
            raw.starts_with(|c: char| c.is_ascii_uppercase()) && !raw.contains(['_', '-']);
        let pascal = if upper_camel {
            raw.to_string()
        } else {
            raw.to_upper_camel_case()
        };

        Ok(Self {
            pascal,
            snake: raw.to_snake_case(),
        })
    }

    /// `BlogPost`
    pub fn pascal(&self) -> &str {
        &self.pascal
    }

    /// `blog_post`
    pub fn snake(&self) -> &str {
        &self.snake
    }

    /// `BLOG_POST`
    pub fn shouty(&self) -> String {
        self.pascal.to_shouty_snake_case()
    }

    /// `blog_posts`
    pub fn plural_snake(&self) -> String {
        pluralize(&self.snake)
    }

    /// Expands `{Kind}`, `{kind}`, `{KIND}`, `{Kinds}` and `{kinds}` in `template`.
    ///
    /// # Examples
    /// ```
    /// use weld_core::naming::ResourceKind;
    ///
    /// let kind = ResourceKind::parse("blog_post").unwrap();
    /// assert_eq!(
    ///     kind.expand("crate::{kind}::{Kind}Repository"),
    ///     "crate::blog_post::BlogPostRepository"
    /// );
    /// ```
    pub fn expand(&self, template: &str) -> String {
        template
            .replace("{Kinds}", &pluralize(&self.pascal))
            .replace("{kinds}", &self.plural_snake())
            .replace("{KIND}", &self.shouty())
            .replace("{Kind}", &self.pascal)
            .replace("{kind}", &self.snake)
    }
}

fn pluralize(word: &str) -> String {
    let lower = word.to_ascii_lowercase();
    if ["s", "x", "z", "ch", "sh"].iter().any(|end| lower.ends_with(end)) {
        format!("{}es", word)
    } else if lower.ends_with('y')
        && !lower
            .chars()
            .rev()
            .nth(1)
            .is_some_and(|c| "aeiou".contains(c))
    {
        format!("{}ies", &word[..word.len() - 1])
    } else {
        format!("{}s", word)
    }
}

impl Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pascal)
    }
}

impl FromStr for ResourceKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
