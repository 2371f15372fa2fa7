//! The capability catalogue served by the learning server.
//!
//! Feature modules only declare records; the registry, validation and
//! dispatch live in [`crate::capability`].

pub mod learning;
pub mod prompts;
pub mod resources;
pub mod state;
pub mod tools;

pub use prompts::PromptTemplates;
pub use state::LearningState;

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::capability::{CapabilityKind, Registry};
use crate::config::FeatureConfig;
use crate::error::{HandlerError, Result};

/// Register every enabled part of the catalogue. Prompt management tools
/// need both the tools and prompts features.
pub fn register_all(
    registry: &mut Registry,
    state: &Arc<LearningState>,
    features: &FeatureConfig,
) -> Result<()> {
    if features.tools {
        tools::register(registry)?;
        learning::register(registry, state)?;
    }

    if features.resources {
        resources::register(registry, state)?;
    }

    if features.prompts {
        let templates = Arc::new(PromptTemplates::new()?);
        prompts::register_prompts(registry, &templates)?;
        if features.tools {
            prompts::register_tools(registry, &templates)?;
        }
    }

    for kind in CapabilityKind::ALL {
        debug!("{} registered: {}", kind.plural(), registry.len(kind));
    }
    Ok(())
}

/// Pretty JSON for text content
pub(crate) fn to_json<T: Serialize + ?Sized>(value: &T) -> std::result::Result<String, HandlerError> {
    serde_json::to_string_pretty(value).map_err(|e| HandlerError::Unexpected(e.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalogue(features: &FeatureConfig) -> Registry {
        let mut registry = Registry::new();
        register_all(&mut registry, &Arc::new(LearningState::new()), features).unwrap();
        registry
    }

    #[test]
    fn test_full_catalogue() {
        let registry = catalogue(&FeatureConfig::default());

        assert_eq!(
            registry.identifiers(CapabilityKind::Tool),
            vec![
                "calculate",
                "text-utils",
                "greeting",
                "text_analyzer",
                "random_generator",
                "update-config",
                "mark-day-complete",
                "list-prompt-categories",
                "preview-prompt",
            ]
        );
        assert_eq!(registry.len(CapabilityKind::Resource), 7);
        assert_eq!(registry.len(CapabilityKind::Prompt), 5);
    }

    #[test]
    fn test_disabled_features_are_not_registered() {
        let features = FeatureConfig {
            tools: false,
            ..FeatureConfig::default()
        };
        let registry = catalogue(&features);

        assert_eq!(registry.len(CapabilityKind::Tool), 0);
        assert_eq!(registry.len(CapabilityKind::Prompt), 5);

        let features = FeatureConfig {
            prompts: false,
            resources: false,
            ..FeatureConfig::default()
        };
        let registry = catalogue(&features);
        assert_eq!(registry.len(CapabilityKind::Tool), 7);
        assert!(registry
            .lookup(CapabilityKind::Tool, "preview-prompt")
            .is_err());
    }
}
