//! Subscription tiers gating what a user may invoke.
//!
//! Only the entry points consult this. [`crate::resolve`] never does.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::CoreError;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Tier {
    #[default]
    Free,
    Pro,
    Enterprise,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Feature {
    Diagnose,
    History,
    Assistant,
    Classify,
}

impl Feature {
    /// Lowest tier that unlocks this feature.
    pub fn minimum_tier(self) -> Tier {
        match self {
            Feature::Diagnose | Feature::History => Tier::Free,
            Feature::Assistant => Tier::Pro,
            Feature::Classify => Tier::Enterprise,
        }
    }
}

impl Tier {
    pub fn allows(self, feature: Feature) -> bool {
        self >= feature.minimum_tier()
    }

    pub fn require(self, feature: Feature) -> Result<(), CoreError> {
        if self.allows(feature) {
            Ok(())
        } else {
            tracing::debug!(tier = %self, feature = %feature, "feature locked");
            Err(CoreError::FeatureLocked {
                feature,
                tier: self,
            })
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Tier::Free => "free",
            Tier::Pro => "pro",
            Tier::Enterprise => "enterprise",
        })
    }
}

impl std::str::FromStr for Tier {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "free" => Ok(Tier::Free),
            "pro" => Ok(Tier::Pro),
            "enterprise" => Ok(Tier::Enterprise),
            other => Err(CoreError::UnrecognizedInput {
                field: "tier",
                value: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Feature::Diagnose => "diagnose",
            Feature::History => "history",
            Feature::Assistant => "assistant",
            Feature::Classify => "classify",
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn free_tier_can_diagnose_but_not_chat() {
        assert!(Tier::Free.allows(Feature::Diagnose));
        assert!(Tier::Free.allows(Feature::History));
        assert!(!Tier::Free.allows(Feature::Assistant));
        let err = Tier::Free.require(Feature::Assistant).unwrap_err();
        assert_eq!(err.to_string(), "assistant is not available on the free tier");
    }

    #[test]
    fn higher_tiers_include_lower_features() {
        assert!(Tier::Pro.allows(Feature::Assistant));
        assert!(!Tier::Pro.allows(Feature::Classify));
        for feature in [Feature::Diagnose, Feature::History, Feature::Assistant, Feature::Classify] {
            assert!(Tier::Enterprise.require(feature).is_ok());
        }
    }

    #[test]
    fn tier_parses_from_settings_token() {
        assert_eq!("pro".parse::<Tier>().unwrap(), Tier::Pro);
        assert!("platinum".parse::<Tier>().is_err());
    }
}
