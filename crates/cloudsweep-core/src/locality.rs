//! Localities and the locality enumerator
//!
//! Every resource lives in exactly one region, one zone, or globally. Before a
//! scan the enumerator decides which regions and zones to visit, from the
//! account's configured defaults and the provider's catalog.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::warn;

/// Where a resource lives. Fixed once discovered.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "code", rename_all = "snake_case")]
pub enum Locality {
    Region(String),
    Zone(String),
    Global,
}

impl Locality {
    pub fn region(code: impl Into<String>) -> Self {
        Locality::Region(code.into())
    }

    pub fn zone(code: impl Into<String>) -> Self {
        Locality::Zone(code.into())
    }

    pub fn is_region(&self) -> bool {
        matches!(self, Locality::Region(_))
    }

    pub fn is_zone(&self) -> bool {
        matches!(self, Locality::Zone(_))
    }

    /// Provider locality code, `None` for global resources.
    pub fn code(&self) -> Option<&str> {
        match self {
            Locality::Region(code) | Locality::Zone(code) => Some(code),
            Locality::Global => None,
        }
    }

    /// Name of the variant, used to enforce that the classification never changes.
    pub fn kind_str(&self) -> &'static str {
        match self {
            Locality::Region(_) => "region",
            Locality::Zone(_) => "zone",
            Locality::Global => "global",
        }
    }
}

impl fmt::Display for Locality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Locality::Region(code) | Locality::Zone(code) => f.write_str(code),
            Locality::Global => f.write_str("global"),
        }
    }
}

/// All regions and zones a provider knows about.
#[derive(Debug, Clone, Copy)]
pub struct LocalityCatalog {
    pub regions: &'static [&'static str],
    pub zones: &'static [&'static str],
}

/// Regions and zones a scan will visit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalityPlan {
    pub regions: Vec<String>,
    pub zones: Vec<String>,
}

impl LocalityPlan {
    /// Resolve what to scan.
    ///
    /// - no default configured: every known locality
    /// - default configured and known: every known locality anyway
    /// - default configured but unknown: only that locality, with a warning
    pub fn resolve(
        catalog: &LocalityCatalog,
        default_region: Option<&str>,
        default_zone: Option<&str>,
    ) -> Self {
        Self {
            regions: resolve_one("region", catalog.regions, default_region),
            zones: resolve_one("zone", catalog.zones, default_zone),
        }
    }

    pub fn len(&self) -> usize {
        self.regions.len() + self.zones.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn resolve_one(label: &str, known: &[&str], default: Option<&str>) -> Vec<String> {
    let all = || known.iter().map(|code| code.to_string()).collect();

    let Some(default) = default.filter(|d| !d.is_empty()) else {
        return all();
    };

    if known.contains(&default) {
        return all();
    }

    warn!(
        locality = %default,
        kind = label,
        "configured default {} is unknown, scanning it alone",
        label
    );
    vec![default.to_string()]
}
