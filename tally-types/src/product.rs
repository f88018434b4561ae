//! Billing product categories.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TallyError;

/// One of the fixed billing categories a report can be requested for.
///
/// Each product has its own set of upstream feature identifiers and its own row
/// schema.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ProductType {
    /// Content delivery network usage.
    Cdn,
    /// Web application and API protection usage.
    Waap,
    /// Cloud infrastructure usage.
    Cloud,
}

impl ProductType {
    /// All products, in the order aggregated reports merge them.
    pub const ALL: [Self; 3] = [Self::Cdn, Self::Waap, Self::Cloud];

    /// Canonical upper-case label, also used as the provenance value.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cdn => "CDN",
            Self::Waap => "WAAP",
            Self::Cloud => "CLOUD",
        }
    }

    /// True if an upstream product name (e.g. `"Cloud"`) designates this product.
    #[must_use]
    pub fn matches_upstream_name(self, name: &str) -> bool {
        name.trim().eq_ignore_ascii_case(self.as_str())
    }
}

impl fmt::Display for ProductType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductType {
    type Err = TallyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|p| p.matches_upstream_name(s))
            .ok_or_else(|| TallyError::InvalidArg(format!("unknown product type '{s}'")))
    }
}
