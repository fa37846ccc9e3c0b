//! Milestone task templates.
//!
//! Each milestone phase maps to one fixed template set of 3-4 tasks. Tasks
//! carry the phase tag, the owning goal and the milestone link.

use crate::config::PlannerConfig;
use crate::model::goal::Priority;
use crate::model::plan::Milestone;
use crate::model::task::Task;
use crate::planner::{DecompositionError, DecompositionResult};
use crate::rules::RuleSet;

/// Template family selected from a milestone's phase label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskPhase {
    Planning,
    Development,
    Completion,
    Generic,
}

impl TaskPhase {
    pub fn tag(self) -> &'static str {
        match self {
            Self::Planning => "planning",
            Self::Development => "development",
            Self::Completion => "completion",
            Self::Generic => "general",
        }
    }

    fn templates(self) -> &'static [TaskTemplate] {
        match self {
            Self::Planning => PLANNING_TEMPLATES,
            Self::Development => DEVELOPMENT_TEMPLATES,
            Self::Completion => COMPLETION_TEMPLATES,
            Self::Generic => GENERIC_TEMPLATES,
        }
    }
}

struct TaskTemplate {
    title: &'static str,
    minutes: u32,
    priority: Priority,
}

const fn template(title: &'static str, minutes: u32, priority: Priority) -> TaskTemplate {
    TaskTemplate {
        title,
        minutes,
        priority,
    }
}

const PLANNING_TEMPLATES: &[TaskTemplate] = &[
    template("Research what is needed for", 90, Priority::High),
    template("Define success criteria for", 45, Priority::High),
    template("Draft a step-by-step plan for", 60, Priority::Medium),
    template("Gather tools and resources for", 30, Priority::Low),
];

const DEVELOPMENT_TEMPLATES: &[TaskTemplate] = &[
    template("Focused work session on", 120, Priority::High),
    template("Review progress and adjust approach for", 45, Priority::Medium),
    template("Resolve open issues blocking", 90, Priority::Medium),
];

const COMPLETION_TEMPLATES: &[TaskTemplate] = &[
    template("Finish remaining work for", 120, Priority::High),
    template("Review results against criteria for", 60, Priority::Medium),
    template("Write down lessons learned from", 30, Priority::Low),
];

const GENERIC_TEMPLATES: &[TaskTemplate] = &[
    template("Break into concrete steps:", 45, Priority::Medium),
    template("Complete the main work for", 120, Priority::High),
    template("Quick progress check on", 20, Priority::Low),
];

/// Phase rules: planning, then completion, then development.
#[derive(Debug, Clone)]
pub struct TemplateSelector {
    rules: RuleSet<TaskPhase>,
    deep_work_min_minutes: u32,
}

impl TemplateSelector {
    pub fn from_config(config: &PlannerConfig) -> Self {
        Self {
            rules: RuleSet::new(TaskPhase::Generic)
                .with_rule(config.planning_phase_keywords.iter().cloned(), TaskPhase::Planning)
                .with_rule(
                    config.completion_phase_keywords.iter().cloned(),
                    TaskPhase::Completion,
                )
                .with_rule(
                    config.development_phase_keywords.iter().cloned(),
                    TaskPhase::Development,
                ),
            deep_work_min_minutes: config.deep_work_min_minutes,
        }
    }

    pub fn phase_for(&self, phase_label: &str) -> TaskPhase {
        self.rules.classify(phase_label)
    }

    /// Instantiates the template set for `milestone` and links the tasks back.
    pub fn generate(
        &self,
        milestone: &mut Milestone,
        phase_label: &str,
    ) -> DecompositionResult<Vec<Task>> {
        let phase = self.phase_for(phase_label);
        let title = milestone.title.trim();
        if title.is_empty() {
            return Err(DecompositionError::TaskGeneration(
                "milestone has no title".to_string(),
            ));
        }

        let tasks: Vec<Task> = phase
            .templates()
            .iter()
            .map(|template| {
                let mut task = Task::new(
                    format!("{} {title}", template.title),
                    template.minutes,
                    template.priority,
                );
                task.goal_ids = vec![milestone.goal_id];
                task.milestone_id = Some(milestone.id);
                task.due_date = Some(milestone.deadline);
                task.tags = vec![phase.tag().to_string(), "milestone".to_string()];
                if template.minutes >= self.deep_work_min_minutes && template.priority.is_urgent()
                {
                    task.tags.push("deep-work".to_string());
                }
                task
            })
            .collect();

        milestone.task_ids = tasks.iter().map(|task| task.id).collect();
        Ok(tasks)
    }
}
