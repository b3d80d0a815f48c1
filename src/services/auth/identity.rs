//! Tenant qualification for user identifiers.
//!
//! Both the token subject and the caller supplied user id go through `qualify`
//! before they are compared, so `alice` and `alice@t1` are the same user in tenant `t1`.

/// The tenant every identifier is scoped to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantContext {
    suffix: String,
}

impl TenantContext {
    pub fn new(domain: impl Into<String>) -> Self {
        Self {
            suffix: format!("@{}", domain.into()),
        }
    }

    /// Append `@<domain>` unless the identifier already carries it.
    ///
    /// An empty identifier stays empty so it can never match a qualified subject.
    pub fn qualify(&self, raw: &str) -> String {
        if raw.is_empty() || raw.ends_with(&self.suffix) {
            raw.to_string()
        } else {
            format!("{raw}{}", self.suffix)
        }
    }
}
