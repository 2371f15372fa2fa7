//! Tools that mutate the shared learning state.

use std::sync::Arc;

use super::state::{Difficulty, LearningState, SettingsUpdate, Theme};
use super::to_json;
use crate::capability::{
    ArgumentShape, CapabilityHandler, CapabilityRecord, FieldSpec, HandlerOutput, HandlerResult,
    Registry, ValidatedArguments,
};
use crate::error::{HandlerError, RegistryError};

/// Upper bound for `time_spent` in a single report
const MAX_MINUTES_PER_DAY: f64 = 1440.0;

pub fn register(registry: &mut Registry, state: &Arc<LearningState>) -> Result<(), RegistryError> {
    registry.register(UpdateConfigTool::record(state.clone())?)?;
    registry.register(MarkDayCompleteTool::record(state.clone())?)?;
    Ok(())
}

/// Partial update of the user settings
pub struct UpdateConfigTool {
    state: Arc<LearningState>,
}

impl UpdateConfigTool {
    pub fn record(state: Arc<LearningState>) -> Result<CapabilityRecord, RegistryError> {
        let shape = ArgumentShape::from_fields(vec![
            FieldSpec::enumeration("theme", &["light", "dark"])
                .describe("Color theme")
                .optional(),
            FieldSpec::string("language")
                .describe("Interface language code")
                .optional(),
            FieldSpec::enumeration("difficulty", &["beginner", "intermediate", "advanced"])
                .describe("Exercise difficulty")
                .optional(),
            FieldSpec::boolean("show_hints").describe("Show hints").optional(),
            FieldSpec::boolean("enable_bonus_challenges")
                .describe("Offer bonus challenges")
                .optional(),
            FieldSpec::boolean("auto_save").describe("Save progress automatically").optional(),
        ])?;
        Ok(CapabilityRecord::tool(
            "update-config",
            "Update user configuration settings",
            shape,
            UpdateConfigTool { state },
        ))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for UpdateConfigTool {
    async fn handle(&self, args: ValidatedArguments) -> HandlerResult {
        let theme = match args.str("theme") {
            Some("dark") => Some(Theme::Dark),
            Some(_) => Some(Theme::Light),
            None => None,
        };
        let difficulty = match args.str("difficulty") {
            Some("advanced") => Some(Difficulty::Advanced),
            Some("intermediate") => Some(Difficulty::Intermediate),
            Some(_) => Some(Difficulty::Beginner),
            None => None,
        };

        let settings = self
            .state
            .update_settings(SettingsUpdate {
                theme,
                language: args.str("language").map(str::to_string),
                difficulty,
                show_hints: args.boolean("show_hints"),
                enable_bonus_challenges: args.boolean("enable_bonus_challenges"),
                auto_save: args.boolean("auto_save"),
            })
            .await;

        Ok(HandlerOutput::text(format!(
            "Configuration updated successfully! New settings:\n{}",
            to_json(&settings)?
        )))
    }
}

/// Record a finished course day
pub struct MarkDayCompleteTool {
    state: Arc<LearningState>,
}

impl MarkDayCompleteTool {
    pub fn record(state: Arc<LearningState>) -> Result<CapabilityRecord, RegistryError> {
        let shape = ArgumentShape::from_fields(vec![
            FieldSpec::number("day")
                .describe("Day number (1-7)")
                .range(Some(1.0), Some(7.0)),
            FieldSpec::string("skills_learned")
                .describe("Comma-separated list of skills learned")
                .optional(),
            FieldSpec::number("time_spent")
                .describe("Minutes spent (at most one day)")
                .range(Some(0.0), Some(MAX_MINUTES_PER_DAY))
                .with_default(0),
        ])?;
        Ok(CapabilityRecord::tool(
            "mark-day-complete",
            "Mark a learning day as complete",
            shape,
            MarkDayCompleteTool { state },
        ))
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for MarkDayCompleteTool {
    async fn handle(&self, args: ValidatedArguments) -> HandlerResult {
        let day = args.required_number("day")?;
        if day.fract() != 0.0 {
            return Err(HandlerError::failed(format!(
                "Day must be a whole number, got {}",
                day
            )));
        }
        let day = day as u32;

        let skills: Vec<String> = args
            .str("skills_learned")
            .map(|list| {
                list.split(',')
                    .map(str::trim)
                    .filter(|skill| !skill.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();
        let minutes = args.number("time_spent").unwrap_or(0.0).round() as u64;

        let progress = self.state.complete_day(day, skills, minutes).await;

        Ok(HandlerOutput::text(format!(
            "Day {} marked as complete!\n\n\
             Progress: {}% ({}/{} days)\n\
             Total skills learned: {}\n\
             Total time invested: {} minutes\n\n\
             Keep up the great work!",
            day,
            progress.percentage(),
            progress.completed_days.len(),
            progress.total_days,
            progress.skills_learned.len(),
            progress.time_spent
        )))
    }
}
