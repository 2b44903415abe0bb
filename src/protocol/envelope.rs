//! Ordered form bodies for getter/setter calls.
//!
//! The firmware parses the form body positionally: `token` must come first,
//! `fun` (when present) second, and the remaining fields in the order the
//! caller gave them. A request that breaks this order is silently dropped or
//! misread by the device, so the order is fixed here in one constructor.

use std::fmt;

use url::form_urlencoded;

use super::constants::{FUN_FIELD, TOKEN_FIELD};
use crate::error::{Error, Result};
use crate::logging::is_sensitive;

/// Caller-supplied fields of a getter/setter call, in send order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Params {
    fields: Vec<(String, String)>,
}

impl Params {
    /// Empty parameter list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a field.
    pub fn with(mut self, name: impl Into<String>, value: impl ToString) -> Self {
        self.push(name, value);
        self
    }

    /// Append a field in place.
    pub fn push(&mut self, name: impl Into<String>, value: impl ToString) {
        self.fields.push((name.into(), value.to_string()));
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.fields.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: ToString> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Params::new();
        for (k, v) in iter {
            params.push(k, v);
        }
        params
    }
}

/// A fully ordered request body: token, optional fun, caller fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvelope {
    fields: Vec<(String, String)>,
}

impl RequestEnvelope {
    /// Build the envelope.
    ///
    /// `token` is the value captured from the most recent response; an absent
    /// token is sent as an empty value so the field keeps its position.
    /// Caller params may not use the reserved `token`/`fun` names.
    pub fn new(token: Option<&str>, fun: Option<u32>, params: Params) -> Result<Self> {
        if let Some((name, _)) = params
            .fields
            .iter()
            .find(|(name, _)| name == TOKEN_FIELD || name == FUN_FIELD)
        {
            return Err(Error::InvalidParams(format!(
                "field '{name}' is reserved and set by the session"
            )));
        }

        let mut fields = Vec::with_capacity(params.len() + 2);
        fields.push((TOKEN_FIELD.to_string(), token.unwrap_or_default().to_string()));
        if let Some(fun) = fun {
            fields.push((FUN_FIELD.to_string(), fun.to_string()));
        }
        fields.extend(params.fields);

        Ok(Self { fields })
    }

    pub fn fields(&self) -> &[(String, String)] {
        &self.fields
    }

    /// Value of the `fun` field, if this is a function call.
    pub fn fun(&self) -> Option<&str> {
        self.fields
            .get(1)
            .filter(|(name, _)| name == FUN_FIELD)
            .map(|(_, v)| v.as_str())
    }

    /// `application/x-www-form-urlencoded` body, fields in envelope order.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (name, value) in &self.fields {
            serializer.append_pair(name, value);
        }
        serializer.finish()
    }

    /// Log-safe rendering with secrets masked.
    pub fn redacted(&self) -> Redacted<'_> {
        Redacted(self)
    }
}

/// Display adapter returned by [`RequestEnvelope::redacted`].
pub struct Redacted<'a>(&'a RequestEnvelope);

impl fmt::Display for Redacted<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (name, value)) in self.0.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            if is_sensitive(name) {
                write!(f, "{name}=<redacted>")?;
            } else {
                write!(f, "{name}={value}")?;
            }
        }
        Ok(())
    }
}
