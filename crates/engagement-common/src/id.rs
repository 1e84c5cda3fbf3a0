use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// An opaque record identifier of the form `<kind>:<local>`, e.g.
/// `event:8f21` or `user:maya`. A single newtype rather than one per
/// record kind, since the `<kind>:<local>` split lets the record store
/// route a lookup to the right table without a separate type per table.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id(String);

impl Default for Id {
    fn default() -> Self {
        Self(String::new())
    }
}

impl Id {
    /// Builds an id from an explicit kind and local part, e.g.
    /// `Id::new("event", "8f21")` -> `event:8f21`.
    pub fn new(kind: &str, local: impl AsRef<str>) -> Self {
        Self(format!("{kind}:{}", local.as_ref()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The portion before the first `:`, e.g. `event` for `event:8f21`.
    pub fn kind(&self) -> &str {
        self.0.split_once(':').map(|(k, _)| k).unwrap_or(&self.0)
    }

    /// The portion after the first `:`, e.g. `8f21` for `event:8f21`.
    pub fn local(&self) -> &str {
        self.0.split_once(':').map(|(_, l)| l).unwrap_or("")
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Id {
    type Err = crate::EngagementError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.contains(':') {
            Ok(Self(s.to_string()))
        } else {
            Err(crate::EngagementError::Fatal(format!(
                "id `{s}` is missing a `<kind>:` prefix"
            )))
        }
    }
}

impl From<Id> for String {
    fn from(id: Id) -> Self {
        id.0
    }
}
