//! Scaleway regions and zones

use crate::profile::Profile;
use cloudsweep_core::{LocalityCatalog, LocalityPlan};

pub const SCALEWAY: LocalityCatalog = LocalityCatalog {
    regions: &["fr-par", "nl-ams", "pl-waw"],
    zones: &[
        "fr-par-1", "fr-par-2", "fr-par-3", "nl-ams-1", "nl-ams-2", "nl-ams-3", "pl-waw-1",
        "pl-waw-2", "pl-waw-3",
    ],
};

/// Regions and zones to scan for `profile`.
pub fn plan_for(profile: &Profile) -> LocalityPlan {
    LocalityPlan::resolve(
        &SCALEWAY,
        profile.default_region.as_deref(),
        profile.default_zone.as_deref(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_for_profile() {
        let profile = Profile {
            default_region: Some("fr-par".into()),
            ..Default::default()
        };
        let plan = plan_for(&profile);
        assert_eq!(plan.regions.len(), 3);
        assert_eq!(plan.zones.len(), 9);

        let profile = Profile {
            default_zone: Some("it-mil-1".into()),
            ..Default::default()
        };
        assert_eq!(plan_for(&profile).zones, vec!["it-mil-1"]);
    }
}
