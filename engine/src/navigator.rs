//! Step sequences synthesized at runtime.
//!
//! Navigation is computed from the participant's prior answer every time it
//! is asked for. Nothing here holds mutable navigation state.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Selection meaning "no treatments"; it produces no follow-up questions.
pub const NO_TREATMENTS: &str = "noTreatments";

/// Task whose steps are appended to the symptom history.
pub const JOINT_COUNTING_TASK: &str = "JointCounting";

/// A presentable step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Step {
    pub identifier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl Step {
    pub fn new(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            title: None,
            text: None,
        }
    }

    /// Copy of this step under a new identifier.
    pub fn copy_with(&self, identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            ..self.clone()
        }
    }
}

/// Where going back from a step leads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepBack {
    pub step: Step,
    /// Every result except the treatment selection must be discarded
    pub keep_only_selection: bool,
}

/// Past treatments task: one block of questions per selected treatment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PastTreatmentsNavigator {
    #[serde(rename = "treatmentSelection")]
    pub selection_step: Step,
    #[serde(rename = "questionTemplateSteps")]
    pub question_templates: Vec<Step>,
    #[serde(rename = "completion")]
    pub completion_step: Step,
}

impl PastTreatmentsNavigator {
    /// The questions asked for `selected`, treatment by treatment.
    pub fn question_steps(&self, selected: &[String]) -> Vec<Step> {
        selected
            .iter()
            .filter(|treatment| treatment.as_str() != NO_TREATMENTS)
            .flat_map(|treatment| {
                self.question_templates.iter().map(move |template| {
                    let mut step = template.copy_with(format!("{}{}", template.identifier, treatment));
                    step.title = Some(treatment.clone());
                    step
                })
            })
            .collect()
    }

    pub fn step(&self, identifier: &str, selected: &[String]) -> Option<Step> {
        if self.selection_step.identifier == identifier {
            return Some(self.selection_step.clone());
        }
        if self.completion_step.identifier == identifier {
            return Some(self.completion_step.clone());
        }
        self.question_steps(selected)
            .into_iter()
            .find(|s| s.identifier == identifier)
    }

    pub fn has_step_after(&self, current: Option<&str>) -> bool {
        current != Some(self.completion_step.identifier.as_str())
    }

    pub fn has_step_before(&self, current: &str) -> bool {
        current != self.selection_step.identifier
    }

    /// The step following `current`; `None` starts the task.
    pub fn step_after(&self, current: Option<&str>, selected: &[String]) -> Option<Step> {
        let Some(current) = current else {
            return Some(self.selection_step.clone());
        };

        let questions = self.question_steps(selected);
        if current == self.selection_step.identifier {
            return Some(
                questions
                    .into_iter()
                    .next()
                    .unwrap_or_else(|| self.completion_step.clone()),
            );
        }

        let idx = questions.iter().position(|s| s.identifier == current)?;
        Some(
            questions
                .get(idx + 1)
                .cloned()
                .unwrap_or_else(|| self.completion_step.clone()),
        )
    }

    /// The step before `current`. Leaving the question block returns to the
    /// selection step and resets the answers given so far.
    pub fn step_before(&self, current: &str, selected: &[String]) -> Option<StepBack> {
        if current == self.selection_step.identifier {
            return None;
        }

        let questions = self.question_steps(selected);
        if let Some(idx) = questions.iter().position(|s| s.identifier == current) {
            if idx > 0 {
                return Some(StepBack {
                    step: questions[idx - 1].clone(),
                    keep_only_selection: false,
                });
            }
        }

        Some(StepBack {
            step: self.selection_step.clone(),
            keep_only_selection: true,
        })
    }
}

/// Configuration for splicing the symptom history task.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomHistoryConfig {
    /// `"<stepId>.title"` or `"<stepId>.text"` to replacement string
    #[serde(default)]
    pub replacements: BTreeMap<String, String>,
    #[serde(default)]
    pub ignore_steps: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_markers: Option<Vec<String>>,
}

/// The spliced symptom history task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SymptomHistory {
    pub steps: Vec<Step>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress_markers: Option<Vec<String>>,
}

/// Splice the psoriasis draw steps and the joint counting steps into one task.
pub fn splice_symptom_history(
    draw_steps: &[Step],
    joint_steps: &[Step],
    config: &SymptomHistoryConfig,
) -> SymptomHistory {
    let keep = |step: &Step| !config.ignore_steps.contains(&step.identifier);

    let mut steps: Vec<Step> = draw_steps.iter().filter(|s| keep(s)).cloned().collect();
    let draw_ids: Vec<String> = steps.iter().map(|s| s.identifier.clone()).collect();

    steps.extend(
        joint_steps
            .iter()
            .map(|step| {
                if draw_ids.contains(&step.identifier) {
                    step.copy_with(format!("{}{}", step.identifier, JOINT_COUNTING_TASK))
                } else {
                    step.clone()
                }
            })
            .filter(|s| keep(s)),
    );

    for (key, value) in &config.replacements {
        let mut parts = key.split('.');
        let step_id = parts.next().unwrap_or_default();
        let field = parts.last();
        let Some(step) = steps.iter_mut().find(|s| s.identifier == step_id) else {
            continue;
        };
        match field {
            Some("title") => step.title = Some(value.clone()),
            Some("text") => step.text = Some(value.clone()),
            _ => {}
        }
    }

    SymptomHistory {
        steps,
        progress_markers: config.progress_markers.clone(),
    }
}
