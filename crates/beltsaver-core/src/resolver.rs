//! Rule-based belt mistracking diagnosis.
//!
//! [`resolve`] runs four passes in a fixed order, each matching exactly one
//! answer against the tables in [`crate::rules`]:
//!
//! 1. location: issue label plus zone-specific causes and repairs
//! 2. direction: extra causes and repairs for loaded or alternating drift
//! 3. severity: severity tier, and for severe/critical an urgent repair that
//!    is placed ahead of every other repair
//! 4. symptom: at most one extra cause and repair
//!
//! Product benefits are proposed by passes as [`BenefitCandidate`]s and the
//! most specific one is selected after all passes have run.

use serde::{Deserialize, Serialize};

use crate::rules::{direction, location, severity, symptom};
use crate::{
    DiagnosisResult, DiagnosticInput, Direction, Location, SeverityReport, SeverityTier, Symptom,
};

/// Pass that proposed a benefit. Ordered from least to most specific.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum BenefitSource {
    Location,
    Symptom,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct BenefitCandidate {
    pub source: BenefitSource,
    pub text: String,
}

/// A diagnosis together with every benefit that was considered for it.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Resolution {
    pub result: DiagnosisResult,
    pub benefit_candidates: Vec<BenefitCandidate>,
}

#[derive(Default)]
struct Accumulator {
    causes: Vec<String>,
    repairs: Vec<String>,
    benefits: Vec<BenefitCandidate>,
}

impl Accumulator {
    fn add(&mut self, causes: &[&str], repairs: &[&str]) {
        self.causes.extend(causes.iter().map(|c| c.to_string()));
        self.repairs.extend(repairs.iter().map(|r| r.to_string()));
    }

    fn propose(&mut self, source: BenefitSource, text: &str) {
        self.benefits.push(BenefitCandidate {
            source,
            text: text.to_string(),
        });
    }
}

/// Produce the diagnosis for a completed set of answers.
pub fn resolve(input: &DiagnosticInput) -> DiagnosisResult {
    resolve_traced(input).result
}

/// Like [`resolve`], but also returns the benefit candidates the passes proposed.
pub fn resolve_traced(input: &DiagnosticInput) -> Resolution {
    let mut acc = Accumulator::default();

    let issue_label = location_pass(input.location, &mut acc);
    direction_pass(input.direction, &mut acc);
    let (severity_tier, urgent) = severity_pass(input.severity_report);
    symptom_pass(input.symptom, &mut acc);

    if let Some(urgent) = urgent {
        acc.repairs.insert(0, urgent.to_string());
    }

    let product_benefit = select_benefit(&acc.benefits).map(|c| c.text.clone());

    Resolution {
        result: DiagnosisResult {
            issue_label: issue_label.to_string(),
            severity_tier,
            causes: acc.causes,
            repairs: acc.repairs,
            product_benefit,
        },
        benefit_candidates: acc.benefits,
    }
}

fn location_pass(loc: Location, acc: &mut Accumulator) -> &'static str {
    match loc {
        Location::Head => {
            acc.add(location::HEAD_CAUSES, location::HEAD_REPAIRS);
            location::HEAD_LABEL
        }
        Location::Tail => {
            acc.add(location::TAIL_CAUSES, location::TAIL_REPAIRS);
            acc.propose(BenefitSource::Location, location::TAIL_BENEFIT);
            location::TAIL_LABEL
        }
        Location::Midspan => {
            acc.add(location::MIDSPAN_CAUSES, location::MIDSPAN_REPAIRS);
            location::MIDSPAN_LABEL
        }
        Location::Multiple => {
            acc.add(location::MULTIPLE_CAUSES, location::MULTIPLE_REPAIRS);
            acc.propose(BenefitSource::Location, location::MULTIPLE_BENEFIT);
            location::MULTIPLE_LABEL
        }
    }
}

fn direction_pass(dir: Direction, acc: &mut Accumulator) {
    match dir {
        Direction::Loaded => acc.add(direction::LOADED_CAUSES, direction::LOADED_REPAIRS),
        Direction::Alternating => {
            acc.add(direction::ALTERNATING_CAUSES, direction::ALTERNATING_REPAIRS)
        }
        Direction::Left | Direction::Right => {}
    }
}

fn severity_pass(report: SeverityReport) -> (SeverityTier, Option<&'static str>) {
    match report {
        SeverityReport::Critical => (SeverityTier::Critical, Some(severity::CRITICAL_REPAIR)),
        SeverityReport::Severe => (SeverityTier::High, Some(severity::SEVERE_REPAIR)),
        SeverityReport::Moderate => (SeverityTier::Medium, None),
        SeverityReport::Minor => (SeverityTier::Low, None),
    }
}

fn symptom_pass(sym: Symptom, acc: &mut Accumulator) {
    match sym {
        Symptom::EdgeWear => {
            acc.add(&[symptom::EDGE_WEAR_CAUSE], &[symptom::EDGE_WEAR_REPAIR]);
            acc.propose(BenefitSource::Symptom, symptom::EDGE_WEAR_BENEFIT);
        }
        Symptom::Spillage => acc.add(&[], &[symptom::SPILLAGE_REPAIR]),
        Symptom::Noise => acc.add(&[symptom::NOISE_CAUSE], &[symptom::NOISE_REPAIR]),
        Symptom::None => {}
    }
}

/// Most specific source wins; among equals, the later proposal wins.
fn select_benefit(candidates: &[BenefitCandidate]) -> Option<&BenefitCandidate> {
    candidates.iter().max_by_key(|c| c.source)
}
