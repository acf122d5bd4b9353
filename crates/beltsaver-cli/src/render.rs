use beltsaver_core::{DiagnosisResult, DiagnosticInput, Resolution, StoredDiagnosis};

pub fn diagnosis(input: &DiagnosticInput, result: &DiagnosisResult) -> String {
    let mut out = String::new();
    out.push_str(&format!(
        "{}  [{}]\n",
        result.issue_label,
        result.severity_tier.label()
    ));
    out.push_str(&format!(
        "  location={} direction={} {} severity={} symptom={}\n",
        input.location,
        input.direction,
        input.direction.icon_hint(),
        input.severity_report,
        input.symptom
    ));

    out.push_str("\nLikely causes:\n");
    for cause in &result.causes {
        out.push_str(&format!("  - {cause}\n"));
    }

    out.push_str("\nRecommended repairs:\n");
    for (i, repair) in result.repairs.iter().enumerate() {
        let marker = if i == 0 && result.severity_tier.is_urgent() { "!" } else { " " };
        out.push_str(&format!("{marker} {}. {repair}\n", i + 1));
    }

    if let Some(benefit) = &result.product_benefit {
        out.push_str(&format!("\nHow BeltSaver helps:\n  {benefit}\n"));
    }
    out
}

pub fn explanation(resolution: &Resolution) -> String {
    let mut out = String::from("\nBenefit candidates (most specific wins):\n");
    if resolution.benefit_candidates.is_empty() {
        out.push_str("  (none)\n");
    }
    for c in &resolution.benefit_candidates {
        let chosen = resolution.result.product_benefit.as_deref() == Some(c.text.as_str());
        out.push_str(&format!(
            "  {} {:?}: {}\n",
            if chosen { "*" } else { " " },
            c.source,
            c.text
        ));
    }
    out
}

pub fn history_line(rec: &StoredDiagnosis) -> String {
    format!(
        "{}  {}  {:<34} {:<8} {}/{}/{}/{}",
        rec.id.short(),
        rec.created_at.format("%Y-%m-%d %H:%M"),
        rec.result.issue_label,
        rec.result.severity_tier.label(),
        rec.input.location,
        rec.input.direction,
        rec.input.severity_report,
        rec.input.symptom
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use beltsaver_core::{resolve_traced, Direction, Location, SeverityReport, Symptom};

    fn sample() -> DiagnosticInput {
        DiagnosticInput {
            location: Location::Multiple,
            direction: Direction::Alternating,
            severity_report: SeverityReport::Severe,
            symptom: Symptom::EdgeWear,
        }
    }

    #[test]
    fn urgent_repair_is_flagged() {
        let input = sample();
        let r = resolve_traced(&input);
        let text = diagnosis(&input, &r.result);
        assert!(text.starts_with("System-Wide Tracking Instability  [High]"));
        assert!(text.contains("! 1. Schedule emergency maintenance"));
        assert!(text.contains("How BeltSaver helps:"));
    }

    #[test]
    fn explanation_marks_chosen_candidate() {
        let r = resolve_traced(&sample());
        let text = explanation(&r);
        assert!(text.contains("  Location:"));
        assert!(text.contains("* Symptom:"));
    }
}
