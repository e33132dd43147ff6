use crate::provider::Message;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use super::StageKind;

/// Named fields of `PipelineState`, used for stage dependencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum StateField {
    ProjectIdea,
    Plan,
    ReviewFeedback,
    RiskScore,
}

impl StateField {
    /// Supplied by the caller rather than written by a stage
    pub fn is_input(&self) -> bool {
        matches!(self, StateField::ProjectIdea)
    }

    /// Placeholder substituted in task templates
    pub fn placeholder(&self) -> &'static str {
        match self {
            StateField::ProjectIdea => "{{PROJECT_IDEA}}",
            StateField::Plan => "{{PLAN}}",
            StateField::ReviewFeedback => "{{REVIEW_FEEDBACK}}",
            StateField::RiskScore => "{{RISK_SCORE}}",
        }
    }
}

impl std::fmt::Display for StateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StateField::ProjectIdea => write!(f, "project_idea"),
            StateField::Plan => write!(f, "plan"),
            StateField::ReviewFeedback => write!(f, "review_feedback"),
            StateField::RiskScore => write!(f, "risk_score"),
        }
    }
}

/// The record threaded through one execution.
///
/// `message_log` only ever grows; every other field is last-write-wins and
/// stays `None` until its stage has run.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct PipelineState {
    pub message_log: Vec<Message>,

    pub project_idea: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub review_feedback: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<String>,
}

impl PipelineState {
    pub fn new(project_idea: impl Into<String>, message_log: Vec<Message>) -> Self {
        Self {
            message_log,
            project_idea: project_idea.into(),
            plan: None,
            review_feedback: None,
            risk_score: None,
        }
    }

    pub fn get(&self, field: StateField) -> Option<&str> {
        match field {
            StateField::ProjectIdea => Some(self.project_idea.as_str()),
            StateField::Plan => self.plan.as_deref(),
            StateField::ReviewFeedback => self.review_feedback.as_deref(),
            StateField::RiskScore => self.risk_score.as_deref(),
        }
    }

    /// Apply a stage's patch: append messages, overwrite any set scalar.
    pub fn merge(&mut self, update: StateUpdate) {
        self.message_log.extend(update.messages);

        if let Some(plan) = update.plan {
            self.plan = Some(plan);
        }
        if let Some(review_feedback) = update.review_feedback {
            self.review_feedback = Some(review_feedback);
        }
        if let Some(risk_score) = update.risk_score {
            self.risk_score = Some(risk_score);
        }
    }

    /// Stage-owned fields populated so far
    pub fn populated(&self) -> Vec<StateField> {
        [
            StateField::Plan,
            StateField::ReviewFeedback,
            StateField::RiskScore,
        ]
        .into_iter()
        .filter(|f| self.get(*f).is_some())
        .collect()
    }
}

/// Partial update produced by one stage.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub messages: Vec<Message>,
    pub plan: Option<String>,
    pub review_feedback: Option<String>,
    pub risk_score: Option<String>,
}

impl StateUpdate {
    /// The update `stage` makes with a generated `content`: its own field
    /// plus the raw response appended to the log.
    pub fn from_stage(stage: StageKind, content: String) -> Self {
        let mut update = Self {
            messages: vec![Message::model(content.clone())],
            ..Self::default()
        };

        match stage {
            StageKind::Planner => update.plan = Some(content),
            StageKind::Reviewer => update.review_feedback = Some(content),
            StageKind::RiskAnalyst => update.risk_score = Some(content),
        }

        update
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::Role;

    #[test]
    fn test_merge_appends_log_and_sets_field() {
        let mut state = PipelineState::new("Cargo delays", vec![Message::model("earlier")]);

        state.merge(StateUpdate::from_stage(
            StageKind::Planner,
            "1. Gather data".to_string(),
        ));

        assert_eq!(state.message_log.len(), 2);
        assert_eq!(state.message_log[0].content, "earlier");
        assert_eq!(state.message_log[1].role, Role::Model);
        assert_eq!(state.plan.as_deref(), Some("1. Gather data"));
        assert!(state.review_feedback.is_none());
    }

    #[test]
    fn test_merge_overwrites_scalars() {
        let mut state = PipelineState::new("idea", Vec::new());
        state.merge(StateUpdate::from_stage(StageKind::Planner, "v1".into()));
        state.merge(StateUpdate::from_stage(StageKind::Planner, "v2".into()));

        assert_eq!(state.plan.as_deref(), Some("v2"));
        assert_eq!(state.message_log.len(), 2);
    }

    #[test]
    fn test_merge_leaves_unset_fields_alone() {
        let mut state = PipelineState::new("idea", Vec::new());
        state.merge(StateUpdate::from_stage(StageKind::Planner, "plan".into()));
        state.merge(StateUpdate::from_stage(StageKind::Reviewer, "review".into()));

        assert_eq!(state.plan.as_deref(), Some("plan"));
        assert_eq!(state.review_feedback.as_deref(), Some("review"));
        assert_eq!(
            state.populated(),
            vec![StateField::Plan, StateField::ReviewFeedback]
        );
    }

    #[test]
    fn test_get_project_idea_always_present() {
        let state = PipelineState::new("Fraud scoring", Vec::new());
        assert_eq!(state.get(StateField::ProjectIdea), Some("Fraud scoring"));
        assert_eq!(state.get(StateField::Plan), None);
    }

    #[test]
    fn test_serialized_state_omits_unset_fields() {
        let state = PipelineState::new("idea", Vec::new());
        let json = serde_json::to_value(&state).unwrap();
        assert!(json.get("plan").is_none());
        assert_eq!(json["project_idea"], "idea");
    }
}
