use beltsaver_core::{DiagnosisResult, DiagnosticInput, Direction, Location, SeverityReport, Symptom};

/// Render a diagnosis as a compact text block for LLM context.
pub fn describe_diagnosis(input: &DiagnosticInput, result: &DiagnosisResult) -> String {
    let mut out = String::with_capacity(1024);

    out.push_str("ANSWERS:\n");
    out.push_str("  location=");
    out.push_str(input.location.as_str());
    out.push_str(" direction=");
    out.push_str(input.direction.as_str());
    out.push_str(" severity=");
    out.push_str(input.severity_report.as_str());
    out.push_str(" symptom=");
    out.push_str(input.symptom.as_str());
    out.push('\n');

    out.push_str("DIAGNOSIS: \"");
    out.push_str(&result.issue_label);
    out.push_str("\" tier=");
    out.push_str(result.severity_tier.label());
    out.push('\n');

    out.push_str("CAUSES:\n");
    for cause in &result.causes {
        out.push_str("  - ");
        out.push_str(cause);
        out.push('\n');
    }

    out.push_str("REPAIRS:\n");
    for (i, repair) in result.repairs.iter().enumerate() {
        out.push_str(&format!("  {}. ", i + 1));
        out.push_str(repair);
        out.push('\n');
    }

    if let Some(benefit) = &result.product_benefit {
        out.push_str("PRODUCT: ");
        out.push_str(benefit);
        out.push('\n');
    }

    out
}

pub fn system_prompt() -> String {
    "You are AggregateOpps, a maintenance assistant for aggregate and mining plant equipment: \
conveyors, crushers, screens and feeders. Answer like an experienced plant maintenance lead.\n\n\
Focus on:\n\
- Concrete inspection steps the crew can do on site, in the order they should do them\n\
- Lock-out/tag-out before any hands-on work; say so whenever a step requires it\n\
- Measurements and tolerances when they matter (e.g. idler squareness, belt camber, \
take-up travel)\n\
- Telling apart root causes from symptoms: edge wear and spillage are usually consequences \
of mistracking, not causes\n\n\
Do NOT:\n\
- Recommend running a belt that is rubbing structure or has been flagged critical\n\
- Invent part numbers or vendor-specific specifications\n\
- Pad answers with generic safety boilerplate beyond what the task requires\n\n\
When a diagnosis block is provided, treat it as the starting point and build on it rather \
than repeating it."
        .to_string()
}

/// Message asking for a diagnosis discussion, with the diagnosis as context.
pub fn discuss_message(input: &DiagnosticInput, result: &DiagnosisResult, question: &str) -> String {
    format!(
        "{}\nQUESTION: {}",
        describe_diagnosis(input, result),
        question.trim()
    )
}

pub fn classify_system_prompt() -> String {
    format!(
        "You classify field observations of conveyor belt mistracking into four answers.\n\
- location: one of {}\n\
- direction: one of {}\n\
- severityReport: one of {}\n\
- symptom: one of {}\n\n\
Output ONLY a JSON object like \
{{\"location\":\"tail\",\"direction\":\"loaded\",\"severityReport\":\"moderate\",\"symptom\":\"none\"}}. \
Use null for any field the observation does not support.",
        tokens(&Location::ALL.map(Location::as_str)),
        tokens(&Direction::ALL.map(Direction::as_str)),
        tokens(&SeverityReport::ALL.map(SeverityReport::as_str)),
        tokens(&Symptom::ALL.map(Symptom::as_str)),
    )
}

fn tokens(values: &[&str]) -> String {
    values
        .iter()
        .map(|v| format!("\"{v}\""))
        .collect::<Vec<_>>()
        .join(", ")
}
