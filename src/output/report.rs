use crate::error::OutputError;
use crate::parser::extract_risk_level;
use crate::pipeline::{RunReport, StageKind};
use std::fs;
use std::path::{Path, PathBuf};

use super::build_snapshot;

/// Write `<session>.md` and `<session>.json` into `report_dir`, returning
/// the markdown path.
pub fn write_run_report(report_dir: &Path, report: &RunReport) -> Result<PathBuf, OutputError> {
    fs::create_dir_all(report_dir).map_err(OutputError::CreateDir)?;

    let state = &report.state;
    let mut content = String::new();

    // Header
    content.push_str(&format!("# {}\n\n", state.project_idea));

    // Metadata table
    content.push_str("| Metric | Value |\n");
    content.push_str("|--------|-------|\n");
    content.push_str(&format!("| Session | `{}` |\n", report.session_id));
    content.push_str(&format!(
        "| Duration | {:.1}s |\n",
        report.total_duration.as_secs_f64()
    ));
    for stage in &report.stages {
        content.push_str(&format!(
            "| {} | {:.1}s |\n",
            stage.stage.id(),
            stage.duration.as_secs_f64()
        ));
    }
    content.push_str(&format!("| Messages | {} |\n", state.message_log.len()));
    content.push_str("\n---\n\n");

    if let Some(ref plan) = state.plan {
        content.push_str(&format!("## {}\n\n{}\n\n", StageKind::Planner.title(), plan.trim_end()));
    }

    if let Some(ref risk) = state.risk_score {
        content.push_str(&format!("## {}\n\n", StageKind::RiskAnalyst.title()));
        if let Some(level) = extract_risk_level(risk) {
            content.push_str(&format!("**Risk Level:** {}\n\n", level));
        }
        content.push_str(&format!("{}\n\n", risk.trim_end()));
    }

    if let Some(ref review) = state.review_feedback {
        content.push_str(&format!(
            "<details>\n<summary>{}</summary>\n\n{}\n\n</details>\n",
            StageKind::Reviewer.title(),
            review.trim_end()
        ));
    }

    let stem = file_stem(&report.session_id);
    let report_path = report_dir.join(format!("{}.md", stem));
    fs::write(&report_path, &content).map_err(OutputError::WriteReport)?;

    let json = serde_json::to_string_pretty(&build_snapshot(report))?;
    fs::write(report_dir.join(format!("{}.json", stem)), json).map_err(OutputError::WriteReport)?;

    Ok(report_path)
}

fn file_stem(session_id: &str) -> String {
    session_id
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::{PipelineState, StageResult, StateUpdate};
    use std::time::Duration;

    #[test]
    fn test_write_run_report() {
        let dir = tempfile::tempdir().unwrap();
        let mut state = PipelineState::new("Cargo delays", Vec::new());
        state.merge(StateUpdate::from_stage(StageKind::Planner, "Do the thing".into()));
        state.merge(StateUpdate::from_stage(StageKind::Reviewer, "Do it better".into()));
        state.merge(StateUpdate::from_stage(
            StageKind::RiskAnalyst,
            "Risk Score: Low".into(),
        ));

        let report = RunReport {
            session_id: "team/alpha".to_string(),
            initial_log_len: 0,
            state,
            stages: vec![StageResult {
                stage: StageKind::Planner,
                duration: Duration::from_secs(2),
            }],
            total_duration: Duration::from_secs(5),
        };

        let path = write_run_report(dir.path(), &report).unwrap();
        assert_eq!(path.file_name().unwrap().to_string_lossy(), "team_alpha.md");

        let md = fs::read_to_string(&path).unwrap();
        assert!(md.starts_with("# Cargo delays"));
        assert!(md.contains("## Technical Plan\n\nDo the thing"));
        assert!(md.contains("**Risk Level:** Low"));
        assert!(md.contains("<summary>Peer Review Feedback</summary>"));
        assert!(md.contains("| planner | 2.0s |"));

        let json: serde_json::Value =
            serde_json::from_str(&fs::read_to_string(dir.path().join("team_alpha.json")).unwrap())
                .unwrap();
        assert_eq!(json["session_id"], "team/alpha");
        assert_eq!(json["message_log"].as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_file_stem() {
        assert_eq!(file_stem("abc-123_x"), "abc-123_x");
        assert_eq!(file_stem("../etc"), "___etc");
    }
}
