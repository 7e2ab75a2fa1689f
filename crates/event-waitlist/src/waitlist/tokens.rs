//! Placeholder substitution for configuration values and owning-resource lookup.
//!
//! Both are collaborators of the evaluator: they are injected at construction and never looked
//! up from ambient state.

use std::collections::BTreeMap;

use super::domain::{ResourceId, SubmissionRequest};

/// Values a placeholder may draw from while a submission is being evaluated.
#[derive(Debug, Clone, Copy)]
pub struct TokenContext<'a> {
    pub resource: Option<&'a ResourceId>,
    pub values: &'a BTreeMap<String, String>,
}

impl<'a> TokenContext<'a> {
    pub fn new(resource: Option<&'a ResourceId>, values: &'a BTreeMap<String, String>) -> Self {
        Self { resource, values }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("unable to resolve token [{0}]")]
    Unresolved(String),
    #[error("unterminated token starting at byte {0}")]
    Malformed(usize),
}

/// Replaces placeholders in a raw configuration string.
pub trait TokenResolver: Send + Sync {
    fn replace(&self, raw: &str, context: &TokenContext<'_>) -> Result<String, TokenError>;
}

/// Resolver that returns configuration strings untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct LiteralTokens;

impl TokenResolver for LiteralTokens {
    fn replace(&self, raw: &str, _context: &TokenContext<'_>) -> Result<String, TokenError> {
        Ok(raw.to_string())
    }
}

/// Bracketed `[type:name]` placeholder substitution.
///
/// Recognised tokens are `[resource:id]`, `[submission:values:<key>]` and any constant
/// registered through [`SubmissionTokens::with_token`]. Bracketed text without a `type:`
/// prefix is left as written.
#[derive(Debug, Clone, Default)]
pub struct SubmissionTokens {
    constants: BTreeMap<String, String>,
}

impl SubmissionTokens {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.constants.insert(name.into(), value.into());
        self
    }

    fn lookup(&self, token: &str, context: &TokenContext<'_>) -> Result<String, TokenError> {
        if let Some(value) = self.constants.get(token) {
            return Ok(value.clone());
        }

        if token == "resource:id" {
            return context
                .resource
                .map(|resource| resource.0.clone())
                .ok_or_else(|| TokenError::Unresolved(token.to_string()));
        }

        if let Some(key) = token.strip_prefix("submission:values:") {
            return context
                .values
                .get(key)
                .cloned()
                .ok_or_else(|| TokenError::Unresolved(token.to_string()));
        }

        Err(TokenError::Unresolved(token.to_string()))
    }
}

fn looks_like_token(inner: &str) -> bool {
    match inner.split_once(':') {
        Some((kind, name)) => {
            !kind.is_empty()
                && !name.is_empty()
                && kind
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
                && !name.chars().any(|c| c.is_whitespace() || c == '[')
        }
        None => false,
    }
}

impl TokenResolver for SubmissionTokens {
    fn replace(&self, raw: &str, context: &TokenContext<'_>) -> Result<String, TokenError> {
        let mut output = String::with_capacity(raw.len());
        let mut rest = raw;
        let mut offset = 0;

        while let Some(open) = rest.find('[') {
            output.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let Some(close) = after.find(']') else {
                return Err(TokenError::Malformed(offset + open));
            };

            let inner = &after[..close];
            if looks_like_token(inner) {
                output.push_str(&self.lookup(inner, context)?);
            } else {
                output.push('[');
                output.push_str(inner);
                output.push(']');
            }

            let consumed = open + close + 2;
            offset += consumed;
            rest = &rest[consumed..];
        }

        output.push_str(rest);
        Ok(output)
    }
}

/// Determines which resource, if any, owns a submission.
pub trait ResourceResolver: Send + Sync {
    fn owning_resource(&self, request: &SubmissionRequest) -> Option<ResourceId>;
}

/// Prefers the route-scoped resource, falling back to the submission's own source.
#[derive(Debug, Clone, Copy, Default)]
pub struct RouteFirstResolver;

impl ResourceResolver for RouteFirstResolver {
    fn owning_resource(&self, request: &SubmissionRequest) -> Option<ResourceId> {
        request
            .route_override
            .clone()
            .or_else(|| request.source.clone())
    }
}
