use crate::parser::{extract_risk_level, RiskLevel};
use crate::pipeline::{RunReport, StageKind};
use crate::provider::Message;
use chrono::Utc;
use serde::Serialize;

/// Read-only view of a finished run, as written to `<session>.json` and
/// printed by `run --json`.
#[derive(Debug, Serialize)]
pub struct RunSnapshot {
    pub session_id: String,
    pub generated_at: String,
    pub project_idea: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_feedback: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk_level: Option<RiskLevel>,
    pub stages: Vec<StageSummary>,
    pub duration_sec: f64,
    pub message_log: Vec<Message>,
}

#[derive(Debug, Serialize)]
pub struct StageSummary {
    pub id: String,
    pub duration_sec: f64,
}

pub fn build_snapshot(report: &RunReport) -> RunSnapshot {
    let state = &report.state;

    RunSnapshot {
        session_id: report.session_id.clone(),
        generated_at: Utc::now().to_rfc3339(),
        project_idea: state.project_idea.clone(),
        plan: state.plan.clone(),
        review_feedback: state.review_feedback.clone(),
        risk_score: state.risk_score.clone(),
        risk_level: state.risk_score.as_deref().and_then(extract_risk_level),
        stages: report
            .stages
            .iter()
            .map(|s| StageSummary {
                id: s.stage.id().to_string(),
                duration_sec: s.duration.as_secs_f64(),
            })
            .collect(),
        duration_sec: report.total_duration.as_secs_f64(),
        message_log: state.message_log.clone(),
    }
}

/// Plan, then risk, then the review feedback last.
pub fn render_terminal(report: &RunReport) -> String {
    let state = &report.state;
    let mut out = String::new();

    if let Some(ref plan) = state.plan {
        push_section(&mut out, StageKind::Planner.title(), plan);
    }

    if let Some(ref risk) = state.risk_score {
        let title = match extract_risk_level(risk) {
            Some(level) => format!("{} [{}]", StageKind::RiskAnalyst.title(), level),
            None => StageKind::RiskAnalyst.title().to_string(),
        };
        push_section(&mut out, &title, risk);
    }

    if let Some(ref review) = state.review_feedback {
        push_section(&mut out, StageKind::Reviewer.title(), review);
    }

    out.push_str(&format!(
        "Session {} ({} messages, {} carried over, {:.1}s)\n",
        report.session_id,
        state.message_log.len(),
        report.initial_log_len,
        report.total_duration.as_secs_f64()
    ));

    out
}

fn push_section(out: &mut String, title: &str, body: &str) {
    out.push_str(&format!("=== {} ===\n\n", title));
    out.push_str(body.trim_end());
    out.push_str("\n\n");
}
