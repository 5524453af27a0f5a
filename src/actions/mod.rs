//! Action Recommender
//!
//! Maps one root cause to corrective actions from the static template table.
//! Selection keys on the cause family and the dominant (first) finding;
//! priority comes from the cause confidence. Same input, same plan.

pub mod templates;

pub use templates::{ActionTemplate, Trigger, TEMPLATES};

use chrono::Utc;
use tracing::debug;

use crate::types::{Action, ActionPlan, Priority, RootCause};

#[derive(Debug, Clone, Copy, Default)]
pub struct ActionRecommender;

impl ActionRecommender {
    /// Corrective actions for `cause`. An unmatched cause yields an empty list.
    pub fn recommend(&self, cause: &RootCause, issue_type: Option<&str>) -> ActionPlan {
        let priority = Priority::from_confidence(cause.confidence);
        let target = cause
            .dominant_finding()
            .and_then(|f| f.equipment.as_deref().or(f.operator.as_deref()));

        let actions: Vec<Action> = match cause.dominant_finding() {
            Some(finding) => TEMPLATES
                .iter()
                .filter(|t| t.family == cause.family && t.trigger.matches(finding))
                .map(|t| Action {
                    action: t.action.to_string(),
                    description: describe(t, target, issue_type),
                    priority,
                    steps: t.steps.iter().map(|s| (*s).to_string()).collect(),
                    estimated_impact: t.estimated_impact.to_string(),
                })
                .collect(),
            None => Vec::new(),
        };

        debug!(
            family = %cause.family,
            confidence = cause.confidence,
            actions = actions.len(),
            "Actions recommended"
        );

        ActionPlan {
            actions,
            root_cause: cause.clone(),
            issue_type: issue_type.map(str::to_string),
            generated_at: Utc::now(),
        }
    }
}

fn describe(template: &ActionTemplate, target: Option<&str>, issue_type: Option<&str>) -> String {
    let mut description = template.description.to_string();
    if let Some(target) = target {
        description.push_str(&format!(" (target: {target})"));
    }
    if let Some(issue_type) = issue_type {
        description.push_str(&format!(" for {issue_type} issues"));
    }
    description
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CauseFamily, ConfidenceBreakdown, Finding};

    fn cause(family: CauseFamily, confidence: f64, finding: Finding) -> RootCause {
        RootCause {
            family,
            description: family.description().to_string(),
            confidence,
            findings: vec![finding],
            sample_size: 50,
            breakdown: ConfidenceBreakdown {
                exceedance: 0.5,
                sample_adequacy: 1.0,
            },
        }
    }

    fn factor(name: &str) -> Finding {
        let mut f = Finding::new("Issues rise with factor", "r = 0.6");
        f.factor = Some(name.to_string());
        f
    }

    #[test]
    fn test_equipment_cause() {
        let mut finding = Finding::new("Issue concentration on equipment M3", "30 issues");
        finding.equipment = Some("M3".to_string());
        let plan = ActionRecommender.recommend(&cause(CauseFamily::Equipment, 0.82, finding), None);
        assert_eq!(plan.actions.len(), 1);
        let action = &plan.actions[0];
        assert_eq!(action.action, "Equipment Maintenance");
        assert_eq!(action.priority, Priority::High);
        assert_eq!(action.steps.len(), 4);
        assert!(action.description.contains("M3"));
    }

    #[test]
    fn test_environmental_keys_on_dominant_factor() {
        let mut c = cause(CauseFamily::Environmental, 0.5, factor("vibration"));
        c.findings.push(factor("temperature"));
        let plan = ActionRecommender.recommend(&c, Some("Surface"));
        assert_eq!(plan.actions.len(), 1);
        assert_eq!(plan.actions[0].action, "Vibration Control");
        assert_eq!(plan.actions[0].priority, Priority::Medium);
        assert!(plan.actions[0].description.ends_with("for Surface issues"));
        assert_eq!(plan.issue_type.as_deref(), Some("Surface"));
    }

    #[test]
    fn test_unmatched_factor_is_empty() {
        let plan = ActionRecommender.recommend(&cause(CauseFamily::Environmental, 0.9, factor("dust")), None);
        assert!(plan.actions.is_empty());
    }

    #[test]
    fn test_deterministic() {
        let c = cause(CauseFamily::Temporal, 0.2, Finding::new("Issues peak at 14:00", "e"));
        let a = ActionRecommender.recommend(&c, Some("Dimensional"));
        let b = ActionRecommender.recommend(&c, Some("Dimensional"));
        assert_eq!(a.actions, b.actions);
        assert_eq!(a.actions[0].priority, Priority::Low);
    }
}
