//! Validated token claims and scope sets

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

/// Subject of the claim set returned when auth is disabled
pub const ANONYMOUS_SUBJECT: &str = "anonymous";

/// The scopes a token carries
///
/// Tokens encode scope as a space-delimited string (`scope`) or a JSON list
/// (`scp`); both normalize to the same set. [`ScopeSet::All`] exists only on
/// the anonymous claim set and is never produced by deserialization.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScopeSet {
    All,
    Granted(BTreeSet<String>),
}

impl Default for ScopeSet {
    fn default() -> Self {
        ScopeSet::Granted(BTreeSet::new())
    }
}

impl ScopeSet {
    /// Parse a space-delimited scope string
    pub fn parse(scope: &str) -> Self {
        ScopeSet::Granted(scope.split_whitespace().map(str::to_string).collect())
    }

    pub fn from_list<I, S>(scopes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        ScopeSet::Granted(
            scopes.into_iter().map(Into::into).filter(|s: &String| !s.trim().is_empty()).collect(),
        )
    }

    pub fn contains(&self, scope: &str) -> bool {
        match self {
            ScopeSet::All => true,
            ScopeSet::Granted(set) => set.contains(scope),
        }
    }

    /// Required scopes this set lacks, in required order
    pub fn missing(&self, required: &[String]) -> Vec<String> {
        required.iter().filter(|r| !self.contains(r)).cloned().collect()
    }

    /// True iff every required scope is present
    pub fn satisfies(&self, required: &[String]) -> bool {
        required.iter().all(|r| self.contains(r))
    }

    /// Sorted scope names; `["all"]` for [`ScopeSet::All`]
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            ScopeSet::All => vec!["all".to_string()],
            ScopeSet::Granted(set) => set.iter().cloned().collect(),
        }
    }
}

impl Serialize for ScopeSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_vec().join(" "))
    }
}

impl<'de> Deserialize<'de> for ScopeSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Wire {
            Delimited(String),
            List(Vec<String>),
        }

        Ok(match Wire::deserialize(deserializer)? {
            Wire::Delimited(s) => ScopeSet::parse(&s),
            Wire::List(list) => ScopeSet::from_list(list),
        })
    }
}

/// Accept `"aud"` as a single string or a list
pub(crate) fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Wire {
        One(String),
        Many(Vec<String>),
    }

    Ok(match Option::<Wire>::deserialize(deserializer)? {
        Some(Wire::One(s)) => vec![s],
        Some(Wire::Many(v)) => v,
        None => Vec::new(),
    })
}

/// The outcome of validating one token
///
/// Transient: built per request and never cached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TokenClaims {
    pub sub: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aud: Vec<String>,
    pub scope: ScopeSet,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
}

impl TokenClaims {
    /// The "anonymous, all scopes granted" claim set for disabled auth
    pub fn anonymous() -> Self {
        Self {
            sub: ANONYMOUS_SUBJECT.to_string(),
            exp: None,
            iss: None,
            aud: Vec::new(),
            scope: ScopeSet::All,
            username: None,
        }
    }

    pub fn is_anonymous(&self) -> bool {
        self.scope == ScopeSet::All && self.sub == ANONYMOUS_SUBJECT
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.exp.and_then(|exp| DateTime::from_timestamp(exp, 0))
    }

    /// Name for logs: username when present, else subject
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or(&self.sub)
    }
}

/// Access-token payload as Keycloak signs it
#[derive(Debug, Deserialize)]
pub(crate) struct JwtClaims {
    #[serde(default)]
    pub sub: Option<String>,
    pub exp: i64,
    #[serde(default)]
    pub iss: Option<String>,
    #[serde(default, deserialize_with = "one_or_many")]
    pub aud: Vec<String>,
    #[serde(default, alias = "scp")]
    pub scope: ScopeSet,
    #[serde(default)]
    pub preferred_username: Option<String>,
}

impl From<JwtClaims> for TokenClaims {
    fn from(claims: JwtClaims) -> Self {
        Self {
            sub: claims.sub.unwrap_or_default(),
            exp: Some(claims.exp),
            iss: claims.iss,
            aud: claims.aud,
            scope: claims.scope,
            username: claims.preferred_username,
        }
    }
}
