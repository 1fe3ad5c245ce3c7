//! Locator composition
//!
//! A canonical locator is the provider's delivery URL of an untransformed
//! asset, e.g. `https://cdn.example/v1/upload/abc.jpg`. Composing splices one
//! directive token in as a new path segment right after the insertion marker:
//!
//! ```text
//! https://cdn.example/v1/upload/abc.jpg
//!                     + w_100,h_200,c_fill
//! https://cdn.example/v1/upload/w_100,h_200,c_fill/abc.jpg
//! ```
//!
//! Each composition starts from the canonical locator; tokens are never chained.

use std::fmt::{Display, Formatter, Result as FmtResult};

use serde::Serialize;

use crate::directive::{self, DirectiveToken};
use crate::error::AppError;
use crate::models::TransformOperation;

/// Path segment after which the provider reads directives
pub const INSERTION_MARKER: &str = "/upload/";

/// A delivery URL with exactly one directive spliced in.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct ComposedLocator(String);

impl ComposedLocator {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl Display for ComposedLocator {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ComposedLocator {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// Parts of a locator split at the insertion marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocatorParts<'a> {
    /// Everything before the marker
    pub prefix: &'a str,
    /// Directive segment, when the first segment after the marker is one
    pub directive: Option<&'a str>,
    /// Asset path after the marker (and after the directive, if any)
    pub asset: &'a str,
}

/// Splice `token` into `canonical_locator`.
///
/// # Errors
/// `MalformedLocator` when the marker is missing, appears more than once, or
/// has no asset path after it.
pub fn compose(
    canonical_locator: &str,
    token: &DirectiveToken,
) -> Result<ComposedLocator, AppError> {
    let (prefix, suffix) = split_at_marker(canonical_locator)?;
    Ok(ComposedLocator(format!(
        "{}{}{}/{}",
        prefix,
        INSERTION_MARKER,
        token.as_str(),
        suffix
    )))
}

/// Split a canonical or composed locator into its parts.
///
/// The first segment after the marker counts as a directive only if it parses
/// as one, so provider path segments like `v1712345` or `originals` stay part
/// of the asset path.
pub fn decompose(locator: &str) -> Result<LocatorParts<'_>, AppError> {
    let (prefix, suffix) = split_at_marker(locator)?;

    if let Some((first, rest)) = suffix.split_once('/') {
        if !rest.is_empty() && directive::parse(first).is_ok() {
            return Ok(LocatorParts {
                prefix,
                directive: Some(first),
                asset: rest,
            });
        }
    }

    Ok(LocatorParts {
        prefix,
        directive: None,
        asset: suffix,
    })
}

/// The operation encoded in a composed locator.
///
/// # Errors
/// - `MalformedLocator` if the locator cannot be split
/// - `InvalidParameter` if it carries no directive
pub fn parse_locator(locator: &str) -> Result<TransformOperation, AppError> {
    let parts = decompose(locator)?;
    match parts.directive {
        Some(token) => directive::parse(token),
        None => Err(AppError::InvalidParameter(format!(
            "Locator carries no transformation directive: {}",
            locator
        ))),
    }
}

fn split_at_marker(locator: &str) -> Result<(&str, &str), AppError> {
    let occurrences = locator.matches(INSERTION_MARKER).count();
    if occurrences != 1 {
        return Err(AppError::MalformedLocator(format!(
            "Expected exactly one '{}' in locator, found {}: {}",
            INSERTION_MARKER, occurrences, locator
        )));
    }

    let (prefix, suffix) = locator
        .split_once(INSERTION_MARKER)
        .ok_or_else(|| AppError::MalformedLocator(locator.to_string()))?;

    if suffix.is_empty() {
        return Err(AppError::MalformedLocator(format!(
            "Locator has no asset path after '{}': {}",
            INSERTION_MARKER, locator
        )));
    }

    Ok((prefix, suffix))
}
