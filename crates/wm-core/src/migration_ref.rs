//! Global migration identity and its token encoding.

use crate::error::{CoreError, CoreResult};
use crate::location::Location;
use crate::migration_name::MigrationName;
use serde::{Deserialize, Serialize};
use std::fmt;

/// One migration, identified across all locations.
///
/// Two refs are equal only when both the name and the location match. The
/// derived ordering (name first, then location) is used for stable display;
/// apply order is decided by the [`crate::Locator`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MigrationRef {
    pub name: MigrationName,
    pub location: Location,
}

/// Wire shape of a token.
#[derive(Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
struct TokenRepr {
    migration: String,
    alias: String,
}

impl MigrationRef {
    pub fn new(name: MigrationName, location: Location) -> Self {
        Self { name, location }
    }

    /// Encode as a compact JSON token: `{"migration":"...","alias":"..."}`.
    pub fn to_token(&self) -> String {
        let repr = TokenRepr {
            migration: self.name.to_string(),
            alias: self.location.to_string(),
        };
        serde_json::to_string(&repr).expect("string fields always serialize")
    }

    /// Decode a token produced by [`to_token`](Self::to_token).
    pub fn from_token(token: &str) -> CoreResult<Self> {
        let invalid = |reason: String| CoreError::InvalidToken {
            token: token.to_string(),
            reason,
        };

        let repr: TokenRepr = serde_json::from_str(token).map_err(|e| invalid(e.to_string()))?;
        let name = MigrationName::parse(repr.migration).map_err(|e| invalid(e.to_string()))?;
        if name.is_base() {
            return Err(invalid("the base marker is not a migration".to_string()));
        }
        let location =
            Location::try_new(repr.alias).ok_or_else(|| invalid("empty alias".to_string()))?;
        Ok(Self { name, location })
    }
}

impl fmt::Display for MigrationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.location)
    }
}
