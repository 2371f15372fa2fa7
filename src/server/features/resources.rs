//! Readable resources.
//!
//! Static documents are compiled in; the settings, progress and analytics
//! resources render the live [`LearningState`] on every read.

use serde_json::json;
use std::sync::Arc;

use super::state::{LearningState, ProgressReport};
use super::to_json;
use crate::capability::{
    CapabilityHandler, CapabilityRecord, HandlerOutput, HandlerResult, Registry,
    ValidatedArguments,
};
use crate::error::RegistryError;

const JSON: &str = "application/json";
const MARKDOWN: &str = "text/markdown";

const MCP_BASICS_GUIDE: &str = "# MCP Learning Guide - Basics

## What is MCP?
Model Context Protocol (MCP) is an open protocol that enables AI assistants to securely connect to external data sources and tools.

## Core Concepts

### 1. Tools
Tools are functions that can be executed by AI assistants with user approval. They enable:
- API calls to external services
- File operations
- Database queries
- Complex computations

### 2. Resources
Resources provide file-like data that can be read by clients:
- Documentation
- Configuration files
- Data sources
- API responses

### 3. Prompts
Prompts are pre-written templates that help users accomplish specific tasks:
- Code generation templates
- Analysis frameworks
- Structured responses

## Getting Started
1. Declare tools, resources and prompts with their argument shapes
2. Register them with the server at startup
3. Run the server over stdio
4. Connect a client and call `tools/list`

## Best Practices
- Declare every argument so it is validated before your handler runs
- Report domain failures as errors, never as odd results
- Provide clear descriptions
- Test thoroughly before deployment
";

const GETTING_STARTED_GUIDE: &str = "# MCP Getting Started Guide

## What is Model Context Protocol (MCP)?

MCP is a protocol that allows AI assistants to securely access external tools and data sources. Think of it as a bridge between AI and the tools you use every day.

## Key Concepts

### Tools
- Functions that AI can call (with your permission)
- Examples: calculators, text processors, API clients
- Tools perform actions and return results

### Resources
- File-like data that AI can read
- Examples: documentation, configuration files, data exports
- Resources provide information without executing code

### Prompts
- Pre-written templates for specific tasks
- Examples: code review templates, writing assistants
- Prompts help AI understand context and requirements

## Your Learning Journey

### Day 1: Basic Tools
Learn to create simple tools that perform single actions.

### Day 2: Advanced Tools
Build complex tools with validation and error handling.

### Day 3: Resources
Create resources that provide data and documentation.

### Day 4-7: Advanced Topics
Prompts, API integration, best practices, and deployment.

## Next Steps

1. Work through each day's exercises
2. Build and test each day's project
3. Experiment with the bonus challenges
4. Share your creations with the MCP community

Happy learning!";

pub fn register(registry: &mut Registry, state: &Arc<LearningState>) -> Result<(), RegistryError> {
    registry.register(CapabilityRecord::resource(
        "learning-guide://mcp-basics",
        "MCP Basics Guide",
        "Introduction to the core concepts of the Model Context Protocol",
        MARKDOWN,
        StaticDocument(MCP_BASICS_GUIDE),
    ))?;
    registry.register(CapabilityRecord::resource(
        "project://info",
        "Project Information",
        "General information about the MCP learning project",
        JSON,
        ProjectInfoResource {
            state: state.clone(),
        },
    ))?;
    registry.register(CapabilityRecord::resource(
        "config://user-settings",
        "User Configuration",
        "User preferences and settings for the learning environment",
        JSON,
        UserSettingsResource {
            state: state.clone(),
        },
    ))?;
    registry.register(CapabilityRecord::resource(
        "progress://learning-status",
        "Learning Progress",
        "Track your progress through the MCP learning journey",
        JSON,
        ProgressResource {
            state: state.clone(),
        },
    ))?;
    registry.register(CapabilityRecord::resource(
        "examples://code-library",
        "Code Examples",
        "Collection of MCP code examples and patterns",
        JSON,
        CodeLibraryResource,
    ))?;
    registry.register(CapabilityRecord::resource(
        "docs://getting-started",
        "Getting Started Guide",
        "Comprehensive guide to get started with MCP development",
        MARKDOWN,
        StaticDocument(GETTING_STARTED_GUIDE),
    ))?;
    registry.register(CapabilityRecord::resource(
        "analytics://resource-usage",
        "Resource Usage Analytics",
        "Analytics data for resource access patterns",
        JSON,
        UsageAnalyticsResource {
            state: state.clone(),
        },
    ))?;
    Ok(())
}

/// Fixed text compiled into the binary
pub struct StaticDocument(pub &'static str);

#[async_trait::async_trait]
impl CapabilityHandler for StaticDocument {
    async fn handle(&self, _args: ValidatedArguments) -> HandlerResult {
        Ok(HandlerOutput::text(self.0))
    }
}

pub struct ProjectInfoResource {
    state: Arc<LearningState>,
}

#[async_trait::async_trait]
impl CapabilityHandler for ProjectInfoResource {
    async fn handle(&self, _args: ValidatedArguments) -> HandlerResult {
        Ok(HandlerOutput::text(to_json(self.state.project())?))
    }
}

pub struct UserSettingsResource {
    state: Arc<LearningState>,
}

#[async_trait::async_trait]
impl CapabilityHandler for UserSettingsResource {
    async fn handle(&self, _args: ValidatedArguments) -> HandlerResult {
        let settings = self.state.settings().await;
        Ok(HandlerOutput::text(to_json(&settings)?))
    }
}

pub struct ProgressResource {
    state: Arc<LearningState>,
}

#[async_trait::async_trait]
impl CapabilityHandler for ProgressResource {
    async fn handle(&self, _args: ValidatedArguments) -> HandlerResult {
        let report = ProgressReport::from(self.state.progress().await);
        Ok(HandlerOutput::text(to_json(&report)?))
    }
}

/// Snippets showing how capabilities are declared in this crate
pub struct CodeLibraryResource;

#[async_trait::async_trait]
impl CapabilityHandler for CodeLibraryResource {
    async fn handle(&self, _args: ValidatedArguments) -> HandlerResult {
        let library = json!({
            "basic-tool": "registry.register(CapabilityRecord::tool(\n    \"echo\",\n    \"Echo the input text\",\n    ArgumentShape::from_fields(vec![FieldSpec::string(\"text\")])?,\n    |args: ValidatedArguments| -> HandlerResult {\n        Ok(HandlerOutput::text(args.required_str(\"text\")?))\n    },\n))?;",
            "basic-resource": "registry.register(CapabilityRecord::resource(\n    \"notes://today\",\n    \"Today's Notes\",\n    \"Notes for the current session\",\n    \"text/plain\",\n    StaticDocument(\"Remember to validate inputs\"),\n))?;",
            "basic-prompt": "registry.register(CapabilityRecord::prompt(\n    \"summarize\",\n    \"Summarize a document\",\n    ArgumentShape::from_fields(vec![FieldSpec::string(\"document\")])?,\n    |args: ValidatedArguments| -> HandlerResult {\n        let document = args.required_str(\"document\")?;\n        Ok(HandlerOutput::text(format!(\"Summarize:\\n{}\", document)))\n    },\n))?;",
            "error-handling": "if b == 0.0 {\n    return Err(HandlerError::failed(\"Division by zero is not allowed\"));\n}",
        });
        Ok(HandlerOutput::text(to_json(&library)?))
    }
}

pub struct UsageAnalyticsResource {
    state: Arc<LearningState>,
}

#[async_trait::async_trait]
impl CapabilityHandler for UsageAnalyticsResource {
    async fn handle(&self, _args: ValidatedArguments) -> HandlerResult {
        let report = self.state.usage_report().await;
        Ok(HandlerOutput::text(to_json(&report)?))
    }
}
