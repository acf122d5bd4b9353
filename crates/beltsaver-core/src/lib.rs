pub mod error;
pub mod resolver;
pub mod rules;
pub mod store;
pub mod tier;

pub use error::{CoreError, StoreError};
pub use resolver::{resolve, resolve_traced, BenefitCandidate, BenefitSource, Resolution};
pub use store::{
    DiagnosisId, DiagnosisStore, FileDiagnosisStore, MemoryDiagnosisStore, OwnerId,
    StoredDiagnosis,
};
pub use tier::{Feature, Tier};

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::path::PathBuf;
use std::str::FromStr;

// --- Types (matching the wizard's answer tokens) ---

/// Where along the conveyor the belt is observed leaving center.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Location {
    Head,
    Tail,
    Midspan,
    Multiple,
}

/// Which way the belt runs off.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Left,
    Right,
    Alternating,
    /// Only drifts when carrying material.
    Loaded,
}

/// How bad the operator says it is.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum SeverityReport {
    Minor,
    Moderate,
    Severe,
    Critical,
}

/// Most visible secondary symptom.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum Symptom {
    EdgeWear,
    Spillage,
    Noise,
    None,
}

impl Location {
    pub const ALL: [Location; 4] = [Self::Head, Self::Tail, Self::Midspan, Self::Multiple];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Head => "head",
            Self::Tail => "tail",
            Self::Midspan => "midspan",
            Self::Multiple => "multiple",
        }
    }
}

impl Direction {
    pub const ALL: [Direction; 4] = [Self::Left, Self::Right, Self::Alternating, Self::Loaded];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
            Self::Alternating => "alternating",
            Self::Loaded => "loaded",
        }
    }

    /// Arrow shown next to the answer in the wizard. Carries no diagnostic weight.
    pub fn icon_hint(self) -> &'static str {
        match self {
            Self::Left => "←",
            Self::Right => "→",
            Self::Alternating => "↔",
            Self::Loaded => "⇣",
        }
    }
}

impl SeverityReport {
    pub const ALL: [SeverityReport; 4] = [Self::Minor, Self::Moderate, Self::Severe, Self::Critical];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Minor => "minor",
            Self::Moderate => "moderate",
            Self::Severe => "severe",
            Self::Critical => "critical",
        }
    }
}

impl Symptom {
    pub const ALL: [Symptom; 4] = [Self::EdgeWear, Self::Spillage, Self::Noise, Self::None];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::EdgeWear => "edge_wear",
            Self::Spillage => "spillage",
            Self::Noise => "noise",
            Self::None => "none",
        }
    }
}

fn parse_token<T: Copy>(
    field: &'static str,
    all: &[T],
    as_str: fn(T) -> &'static str,
    s: &str,
) -> Result<T, CoreError> {
    all.iter()
        .copied()
        .find(|v| as_str(*v) == s)
        .ok_or_else(|| CoreError::UnrecognizedInput {
            field,
            value: s.to_string(),
        })
}

impl FromStr for Location {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token("location", &Self::ALL, Self::as_str, s)
    }
}

impl FromStr for Direction {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token("direction", &Self::ALL, Self::as_str, s)
    }
}

impl FromStr for SeverityReport {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token("severityReport", &Self::ALL, Self::as_str, s)
    }
}

impl FromStr for Symptom {
    type Err = CoreError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        parse_token("symptom", &Self::ALL, Self::as_str, s)
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for SeverityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Display for Symptom {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A completed set of wizard answers.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, schemars::JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticInput {
    pub location: Location,
    pub direction: Direction,
    pub severity_report: SeverityReport,
    pub symptom: Symptom,
}

/// Answers collected so far by the stepper. Becomes a [`DiagnosticInput`]
/// only once every step is answered.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosticDraft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_report: Option<SeverityReport>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub symptom: Option<Symptom>,
}

impl DiagnosticDraft {
    /// Number of steps answered, 0..=4.
    pub fn answered(&self) -> usize {
        [
            self.location.is_some(),
            self.direction.is_some(),
            self.severity_report.is_some(),
            self.symptom.is_some(),
        ]
        .iter()
        .filter(|answered| **answered)
        .count()
    }

    /// Finish the draft. Fails naming the first unanswered step, in wizard order.
    pub fn complete(&self) -> Result<DiagnosticInput, CoreError> {
        Ok(DiagnosticInput {
            location: self.location.ok_or(CoreError::Incomplete { missing: "location" })?,
            direction: self.direction.ok_or(CoreError::Incomplete { missing: "direction" })?,
            severity_report: self
                .severity_report
                .ok_or(CoreError::Incomplete { missing: "severityReport" })?,
            symptom: self.symptom.ok_or(CoreError::Incomplete { missing: "symptom" })?,
        })
    }
}

impl From<DiagnosticInput> for DiagnosticDraft {
    fn from(input: DiagnosticInput) -> Self {
        Self {
            location: Some(input.location),
            direction: Some(input.direction),
            severity_report: Some(input.severity_report),
            symptom: Some(input.symptom),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum SeverityTier {
    Low,
    Medium,
    High,
    Critical,
}

impl SeverityTier {
    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// High and critical tiers carry an urgent repair at the top of the list.
    pub fn is_urgent(self) -> bool {
        matches!(self, Self::High | Self::Critical)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DiagnosisResult {
    pub issue_label: String,
    pub severity_tier: SeverityTier,
    pub causes: Vec<String>,
    pub repairs: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_benefit: Option<String>,
}

// --- Settings ---

/// Resolve the global data directory (~/.beltsaver/).
pub fn data_dir() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".beltsaver")
}

pub const DEFAULT_GATEWAY_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub gateway_url: String,
    pub api_key: String,
    pub model: String,
    pub tier: Tier,
    /// Opaque identifier of the signed-in user; scopes saved diagnoses.
    pub owner: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            gateway_url: DEFAULT_GATEWAY_URL.to_string(),
            api_key: String::new(),
            model: DEFAULT_MODEL.to_string(),
            tier: Tier::Free,
            owner: "local".to_string(),
        }
    }
}

impl Settings {
    pub fn gateway_configured(&self) -> bool {
        !self.gateway_url.is_empty() && !self.model.is_empty() && !self.api_key.is_empty()
    }
}

fn settings_path() -> PathBuf {
    data_dir().join("settings.json")
}

/// Read settings from disk. A missing file yields defaults; a corrupt one is an error.
pub fn read_settings() -> Result<Settings, CoreError> {
    read_settings_from(&settings_path())
}

pub fn read_settings_from(path: &std::path::Path) -> Result<Settings, CoreError> {
    if !path.exists() {
        tracing::debug!(path = %path.display(), "no settings file, using defaults");
        return Ok(Settings::default());
    }
    let raw = fs::read_to_string(path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn write_settings(settings: &Settings) -> Result<(), CoreError> {
    write_settings_to(&settings_path(), settings)
}

pub fn write_settings_to(path: &std::path::Path, settings: &Settings) -> Result<(), CoreError> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = serde_json::to_string_pretty(settings)?;
    fs::write(path, json)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_round_trip_through_from_str() {
        for v in Symptom::ALL {
            assert_eq!(v.as_str().parse::<Symptom>().unwrap(), v);
        }
        for v in Location::ALL {
            assert_eq!(v.to_string().parse::<Location>().unwrap(), v);
        }
    }

    #[test]
    fn unknown_token_is_rejected_not_defaulted() {
        let err = "conveyor".parse::<Location>().unwrap_err();
        assert!(matches!(
            err,
            CoreError::UnrecognizedInput { field: "location", ref value } if value == "conveyor"
        ));
        assert!("Edge_Wear".parse::<Symptom>().is_err());
    }

    #[test]
    fn input_uses_wizard_field_names() {
        let input: DiagnosticInput = serde_json::from_str(
            r#"{"location":"tail","direction":"loaded","severityReport":"critical","symptom":"edge_wear"}"#,
        )
        .unwrap();
        assert_eq!(input.location, Location::Tail);
        assert_eq!(input.symptom, Symptom::EdgeWear);

        let bad = serde_json::from_str::<DiagnosticInput>(
            r#"{"location":"nowhere","direction":"loaded","severityReport":"critical","symptom":"none"}"#,
        );
        assert!(bad.is_err());
    }

    #[test]
    fn draft_reports_first_missing_step() {
        let mut draft = DiagnosticDraft::default();
        assert_eq!(draft.answered(), 0);
        draft.location = Some(Location::Head);
        draft.severity_report = Some(SeverityReport::Minor);
        assert_eq!(draft.answered(), 2);
        assert!(matches!(
            draft.complete(),
            Err(CoreError::Incomplete { missing: "direction" })
        ));

        draft.direction = Some(Direction::Left);
        draft.symptom = Some(Symptom::None);
        assert_eq!(draft.complete().unwrap().location, Location::Head);
    }

    #[test]
    fn settings_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = read_settings_from(&dir.path().join("settings.json")).unwrap();
        assert_eq!(settings, Settings::default());
        assert!(!settings.gateway_configured());
    }

    #[test]
    fn settings_persist_and_fill_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");
        let settings = Settings {
            api_key: "sk-test".into(),
            tier: Tier::Pro,
            ..Settings::default()
        };
        write_settings_to(&path, &settings).unwrap();
        assert_eq!(read_settings_from(&path).unwrap(), settings);

        std::fs::write(&path, r#"{"apiKey":"k","tier":"enterprise"}"#).unwrap();
        let partial = read_settings_from(&path).unwrap();
        assert_eq!(partial.tier, Tier::Enterprise);
        assert_eq!(partial.model, DEFAULT_MODEL);
        assert!(partial.gateway_configured());
    }
}
