//! Prompt templates and the prompt management tools.
//!
//! Every prompt renders a single user message from a handlebars template.
//! The argument map (after defaults) is the template context, extended with
//! per-prompt guidance text looked up from enum arguments.

use handlebars::Handlebars;
use serde_json::{json, Map, Value};
use std::sync::Arc;

use super::to_json;
use crate::capability::{
    ArgumentShape, CapabilityHandler, CapabilityRecord, FieldSpec, HandlerOutput, HandlerResult,
    Registry, ValidatedArguments,
};
use crate::error::{HandlerError, RegistryError};

const CODE_REVIEW_TEMPLATE: &str = r#"# Code Review Assistant

**Language**: {{language}}
**Complexity**: {{complexity}}{{#if focus_areas}}
**Focus Areas**: {{focus_areas}}{{/if}}

## Analysis Framework

{{guidance}}

1. **Code Quality & Readability**
   - Variable and function naming
   - Code organization and structure
   - Comments and documentation
   - Consistency with conventions

2. **Functionality & Logic**
   - Correctness of implementation
   - Edge case handling
   - Error handling and validation
   - Algorithm efficiency

3. **Best Practices**
   - Language-specific idioms
   - Design patterns usage
   - Security considerations
   - Performance implications

4. **Maintainability**
   - Code reusability
   - Testing considerations
   - Future extensibility
   - Technical debt assessment

## Code to Review:
```{{language}}
{{code}}
```

Please provide a comprehensive review following this framework. Include specific suggestions for improvement and highlight both strengths and areas for enhancement."#;

const WRITING_HELPER_TEMPLATE: &str = r#"# Writing Enhancement Assistant

**Style**: {{style}}
**Audience**: {{audience}}
**Purpose**: {{purpose}}
**Target Length**: {{length}}

## Enhancement Framework

{{guidance}}

1. **Content & Structure**
   - Logical flow and organization
   - Key message clarity
   - Supporting evidence
   - Conclusion effectiveness

2. **Style & Tone**
   - Appropriate for {{audience}}
   - Consistent {{style}} voice
   - Engaging and purposeful language
   - Clarity and readability

3. **Technical Quality**
   - Grammar and syntax
   - Word choice and vocabulary
   - Sentence variety and flow
   - Paragraph structure

4. **Audience Alignment**
   - Meets {{audience}} expectations
   - Achieves {{purpose}} effectively
   - Appropriate complexity level
   - Call-to-action clarity

## Content to Enhance:
{{content}}

Please enhance this content focusing on the framework above while maintaining the intended {{style}} style for {{audience}}. Provide both the improved version and specific feedback on changes made."#;

const MEETING_SUMMARY_TEMPLATE: &str = r#"# Meeting Summary Assistant

**Meeting Type**: {{meeting_type}}
**Participants**: {{participants}}
**Duration**: {{duration}}{{#if key_topics}}
**Key Topics Discussed**: {{key_topics}}{{/if}}{{#if action_items}}
**Action Items**: {{action_items}}{{/if}}

## Summary Framework for {{meeting_type}}

Focus Areas: {{focus}}

1. **Meeting Overview**
   - Date, time, and duration
   - Attendees and roles
   - Main objectives

2. **Key Discussion Points**
   - Primary topics covered
   - Important decisions made
   - Outstanding questions

3. **Action Items & Next Steps**
   - Specific tasks assigned
   - Owners and deadlines
   - Follow-up meetings needed

4. **Summary & Outcomes**
   - Key achievements
   - Blockers identified
   - Success metrics

Please create a comprehensive meeting summary following this structure. Include all relevant details while keeping it concise and actionable for follow-up."#;

const LEARNING_TUTOR_TEMPLATE: &str = r#"# Learning Tutor Assistant

**Topic**: {{topic}}
**Level**: {{level}}
**Learning Style**: {{learning_style}}
**Goals**: {{goals}}{{#if time_available}}
**Time Available**: {{time_available}}{{/if}}

## Learning Framework

**Adaptation**: {{adaptation}}
**Approach**: {{approach}}

1. **Foundation Building**
   - Key concepts and terminology
   - Prerequisites review
   - Learning objectives clarification

2. **Core Content Delivery**
   - Main topic explanation
   - Examples and applications
   - Common misconceptions

3. **Practice & Application**
   - Hands-on exercises
   - Real-world scenarios
   - Problem-solving opportunities

4. **Assessment & Progress**
   - Knowledge check questions
   - Skill demonstration
   - Next learning steps

Please create a comprehensive learning experience for {{topic}} that:
- Matches the {{level}} level
- Adapts to {{learning_style}} learning style
- Achieves the specified goals: {{goals}}
- Provides engaging and effective instruction

Include specific activities, examples, and assessment methods."#;

const PROJECT_PLANNER_TEMPLATE: &str = r#"# Project Planning Assistant

**Context**: {{context}}
**Timeline**: {{timeline}}
**Team Size**: {{team_size}}
**Objectives**: {{objectives}}{{#if constraints}}
**Constraints**: {{constraints}}{{/if}}{{#if budget}}
**Budget**: {{budget}}{{/if}}

## Planning Framework for {{context}}

Key Phases: {{phases}}

1. **Project Definition**
   - Clear scope and deliverables
   - Success criteria and metrics
   - Stakeholder identification

2. **Resource Planning**
   - Team roles and responsibilities
   - Required skills and expertise
   - Tools and infrastructure needs

3. **Timeline & Milestones**
   - Phase breakdown and dependencies
   - Key milestone definitions
   - Risk assessment and mitigation

4. **Execution Strategy**
   - Communication plan
   - Progress tracking methods
   - Quality assurance approach

5. **Success Measurement**
   - KPIs and success metrics
   - Review and evaluation process
   - Lessons learned capture

Please create a comprehensive project plan that:
- Addresses the specific objectives: {{objectives}}
- Works within the timeline: {{timeline}}
- Utilizes the team effectively: {{team_size}}
- Considers all constraints and budget factors

Include specific tasks, timelines, and success criteria."#;

const PROGRAMMING_LANGUAGES: &[&str] = &[
    "typescript", "javascript", "python", "java", "csharp", "cpp", "rust", "go", "swift",
    "kotlin", "php", "ruby", "other",
];

const WRITING_STYLES: &[&str] = &[
    "professional", "casual", "academic", "creative", "technical", "persuasive", "friendly",
    "formal",
];

const MEETING_TYPES: &[&str] = &[
    "standup",
    "planning",
    "retrospective",
    "brainstorming",
    "decision-making",
    "status-update",
    "client-meeting",
    "all-hands",
];

const LEARNING_LEVELS: &[&str] = &["beginner", "intermediate", "advanced", "expert"];

const PROJECT_CONTEXTS: &[&str] = &[
    "software-development",
    "marketing-campaign",
    "research-project",
    "business-initiative",
    "creative-project",
    "team-building",
    "general",
];

/// One-line previews, keyed by prompt name
const PREVIEW_TEMPLATES: &[(&str, &str)] = &[
    (
        "code-review",
        "Code Review Assistant for {{language}} code focusing on \
         {{#if focus_areas}}{{focus_areas}}{{else}}general quality{{/if}}",
    ),
    (
        "writing-helper",
        "Writing enhancement in {{style}} style for {{audience}}",
    ),
    (
        "meeting-summary",
        "{{meeting_type}} meeting summary for {{duration}} with {{participants}}",
    ),
    (
        "learning-tutor",
        "{{level}} level tutoring for {{topic}} using \
         {{#if learning_style}}{{learning_style}}{{else}}reading{{/if}} approach",
    ),
    (
        "project-planner",
        "{{context}} project plan for {{timeline}} with team of {{team_size}}",
    ),
];

fn preview_template_name(prompt: &str) -> String {
    format!("preview/{}", prompt)
}

/// Compiled prompt templates, shared by all prompt handlers
pub struct PromptTemplates {
    registry: Handlebars<'static>,
}

impl PromptTemplates {
    pub fn new() -> anyhow::Result<Self> {
        let mut registry = Handlebars::new();
        // Output is plain text, not HTML
        registry.register_escape_fn(handlebars::no_escape);

        registry.register_template_string("code-review", CODE_REVIEW_TEMPLATE)?;
        registry.register_template_string("writing-helper", WRITING_HELPER_TEMPLATE)?;
        registry.register_template_string("meeting-summary", MEETING_SUMMARY_TEMPLATE)?;
        registry.register_template_string("learning-tutor", LEARNING_TUTOR_TEMPLATE)?;
        registry.register_template_string("project-planner", PROJECT_PLANNER_TEMPLATE)?;

        for (prompt, template) in PREVIEW_TEMPLATES {
            registry.register_template_string(&preview_template_name(prompt), *template)?;
        }

        Ok(Self { registry })
    }

    /// Preview line for `prompt`, or `None` when it has no preview template
    fn render_preview(&self, prompt: &str, sample: &Value) -> Result<Option<String>, HandlerError> {
        let name = preview_template_name(prompt);
        if !self.registry.has_template(&name) {
            return Ok(None);
        }
        self.render(&name, sample).map(Some)
    }

    fn render(&self, name: &str, context: &Value) -> Result<String, HandlerError> {
        self.registry
            .render(name, context)
            .map_err(|e| HandlerError::Unexpected(anyhow::anyhow!("template '{}': {}", name, e)))
    }
}

/// Extra template variables derived from the arguments
type ContextFn = fn(&ValidatedArguments) -> Vec<(&'static str, &'static str)>;

/// Description line for the rendered prompt
type SummaryFn = fn(&ValidatedArguments) -> String;

/// A prompt backed by one named template
pub struct TemplatePrompt {
    name: &'static str,
    templates: Arc<PromptTemplates>,
    extra_context: ContextFn,
    summary: SummaryFn,
}

#[async_trait::async_trait]
impl CapabilityHandler for TemplatePrompt {
    async fn handle(&self, args: ValidatedArguments) -> HandlerResult {
        let mut context: Map<String, Value> = args.as_map().clone();
        for (key, value) in (self.extra_context)(&args) {
            context.insert(key.to_string(), json!(value));
        }

        let text = self.templates.render(self.name, &Value::Object(context))?;
        Ok(HandlerOutput::text(text).with_description((self.summary)(&args)))
    }
}

fn arg<'a>(args: &'a ValidatedArguments, name: &str) -> &'a str {
    args.str(name).unwrap_or_default()
}

fn prompt_record(
    name: &'static str,
    description: &str,
    fields: Vec<FieldSpec>,
    templates: &Arc<PromptTemplates>,
    extra_context: ContextFn,
    summary: SummaryFn,
) -> Result<CapabilityRecord, RegistryError> {
    Ok(CapabilityRecord::prompt(
        name,
        description,
        ArgumentShape::from_fields(fields)?,
        TemplatePrompt {
            name,
            templates: templates.clone(),
            extra_context,
            summary,
        },
    ))
}

/// Register the five prompt templates
pub fn register_prompts(
    registry: &mut Registry,
    templates: &Arc<PromptTemplates>,
) -> Result<(), RegistryError> {
    registry.register(prompt_record(
        "code-review",
        "Generate comprehensive code review prompts with analysis framework",
        vec![
            FieldSpec::enumeration("language", PROGRAMMING_LANGUAGES)
                .describe("Programming language of the code"),
            FieldSpec::string("code").describe("Code content to review"),
            FieldSpec::string("focus_areas")
                .describe("Specific areas to focus on (e.g., \"performance, security\")")
                .optional(),
            FieldSpec::enumeration("complexity", &["simple", "moderate", "complex"])
                .describe("Code complexity level")
                .with_default("moderate"),
        ],
        templates,
        |args| {
            let guidance = match arg(args, "complexity") {
                "simple" => "Focus on basic code quality and readability.",
                "complex" => {
                    "Deep dive into architecture, performance optimization, and advanced patterns."
                }
                _ => "Provide balanced analysis of code quality, performance, and best practices.",
            };
            vec![("guidance", guidance)]
        },
        |args| format!("Code review prompt for {} code", arg(args, "language")),
    )?)?;

    registry.register(prompt_record(
        "writing-helper",
        "Create context-aware writing assistance prompts",
        vec![
            FieldSpec::enumeration("style", WRITING_STYLES).describe("Writing style"),
            FieldSpec::string("audience").describe("Target audience for the writing"),
            FieldSpec::string("purpose")
                .describe("Purpose of the writing (inform, persuade, entertain, etc.)"),
            FieldSpec::string("content").describe("Content to improve or enhance"),
            FieldSpec::enumeration("length", &["short", "medium", "long"])
                .describe("Desired content length")
                .with_default("medium"),
        ],
        templates,
        |args| {
            let guidance = match arg(args, "length") {
                "short" => "Keep responses concise and impactful.",
                "long" => "Include comprehensive analysis and detailed suggestions.",
                _ => "Provide balanced detail and clarity.",
            };
            vec![("guidance", guidance)]
        },
        |args| {
            format!(
                "Writing assistance for {} style targeting {}",
                arg(args, "style"),
                arg(args, "audience")
            )
        },
    )?)?;

    registry.register(prompt_record(
        "meeting-summary",
        "Generate structured meeting summary templates",
        vec![
            FieldSpec::enumeration("meeting_type", MEETING_TYPES).describe("Type of meeting"),
            FieldSpec::string("participants").describe("List of meeting participants"),
            FieldSpec::string("duration").describe("Meeting duration"),
            FieldSpec::string("key_topics")
                .describe("Key topics discussed")
                .optional(),
            FieldSpec::string("action_items")
                .describe("Action items from the meeting")
                .optional(),
        ],
        templates,
        |args| {
            let focus = match arg(args, "meeting_type") {
                "standup" => "Yesterday's Progress, Today's Plans, Blockers",
                "planning" => "Objectives, Tasks, Timeline, Resources",
                "retrospective" => "What Went Well, What Could Improve, Action Items",
                "brainstorming" => "Ideas Generated, Themes, Next Steps",
                "decision-making" => "Options Discussed, Decision Made, Rationale",
                "status-update" => "Progress, Challenges, Next Milestones",
                "client-meeting" => "Requirements, Feedback, Deliverables",
                _ => "Announcements, Updates, Q&A",
            };
            vec![("focus", focus)]
        },
        |args| {
            format!(
                "Meeting summary template for {} meeting",
                arg(args, "meeting_type")
            )
        },
    )?)?;

    registry.register(prompt_record(
        "learning-tutor",
        "Create adaptive learning assistance prompts",
        vec![
            FieldSpec::string("topic").describe("Subject or topic to learn"),
            FieldSpec::enumeration("level", LEARNING_LEVELS).describe("Learning level"),
            FieldSpec::enumeration(
                "learning_style",
                &["visual", "auditory", "kinesthetic", "reading"],
            )
            .describe("Preferred learning style")
            .with_default("reading"),
            FieldSpec::string("goals").describe("Specific learning goals"),
            FieldSpec::string("time_available")
                .describe("Available time for learning")
                .optional(),
        ],
        templates,
        |args| {
            let adaptation = match arg(args, "learning_style") {
                "visual" => "Include diagrams, charts, and visual representations",
                "auditory" => "Focus on verbal explanations and discussion points",
                "kinesthetic" => "Emphasize hands-on practice and interactive exercises",
                _ => "Provide detailed written explanations and resources",
            };
            let approach = match arg(args, "level") {
                "beginner" => "Start with fundamentals and build up gradually",
                "intermediate" => "Connect to existing knowledge and introduce complexity",
                "advanced" => "Focus on nuanced understanding and application",
                _ => "Explore edge cases and advanced theoretical concepts",
            };
            vec![("adaptation", adaptation), ("approach", approach)]
        },
        |args| {
            format!(
                "Learning assistance for {} at {} level",
                arg(args, "topic"),
                arg(args, "level")
            )
        },
    )?)?;

    registry.register(prompt_record(
        "project-planner",
        "Generate strategic project planning templates",
        vec![
            FieldSpec::enumeration("context", PROJECT_CONTEXTS).describe("Project context"),
            FieldSpec::string("timeline").describe("Project timeline or deadline"),
            FieldSpec::string("team_size").describe("Size and composition of the team"),
            FieldSpec::string("objectives").describe("Main project objectives"),
            FieldSpec::string("constraints")
                .describe("Project constraints or limitations")
                .optional(),
            FieldSpec::string("budget")
                .describe("Budget considerations")
                .optional(),
        ],
        templates,
        |args| {
            let phases = match arg(args, "context") {
                "software-development" => {
                    "Requirements, Architecture, Development, Testing, Deployment"
                }
                "marketing-campaign" => "Strategy, Creative, Channels, Launch, Measurement",
                "research-project" => {
                    "Literature Review, Methodology, Data Collection, Analysis, Reporting"
                }
                "business-initiative" => {
                    "Planning, Resource Allocation, Execution, Monitoring, Evaluation"
                }
                "creative-project" => "Concept, Design, Production, Review, Launch",
                "team-building" => "Assessment, Planning, Activities, Implementation, Follow-up",
                _ => "Planning, Execution, Monitoring, Evaluation, Closure",
            };
            vec![("phases", phases)]
        },
        |args| {
            format!(
                "Project planning template for {} project",
                arg(args, "context")
            )
        },
    )?)?;

    Ok(())
}

/// Register the tools that describe the prompt catalogue
pub fn register_tools(
    registry: &mut Registry,
    templates: &Arc<PromptTemplates>,
) -> Result<(), RegistryError> {
    registry.register(CapabilityRecord::tool(
        "list-prompt-categories",
        "List all available prompt categories and their purposes",
        ArgumentShape::empty(),
        ListPromptCategoriesTool,
    ))?;
    registry.register(CapabilityRecord::tool(
        "preview-prompt",
        "Preview a prompt template with sample arguments",
        ArgumentShape::from_fields(vec![
            FieldSpec::string("prompt_name").describe("Name of the prompt to preview"),
            FieldSpec::string("sample_args")
                .describe("JSON object of arguments to preview with (defaults to built-in samples)")
                .optional(),
        ])?,
        PreviewPromptTool {
            templates: templates.clone(),
        },
    ))?;
    Ok(())
}

const CATEGORY_OVERVIEW: &str = "# Prompt Categories

## Analysis & Review
- **code-review**: Comprehensive code analysis and improvement suggestions
- **meeting-summary**: Structured meeting documentation and action items

## Writing & Communication
- **writing-helper**: Context-aware writing enhancement and style improvement

## Learning & Development
- **learning-tutor**: Adaptive learning assistance and educational guidance

## Planning & Strategy
- **project-planner**: Strategic project planning and execution frameworks

## Usage Examples:
- Use code-review for pull request analysis
- Use writing-helper for emails, documents, presentations
- Use meeting-summary for consistent meeting documentation
- Use learning-tutor for skill development and training
- Use project-planner for initiative planning and management

Each prompt includes customizable arguments to tailor the output to your specific needs.";

pub struct ListPromptCategoriesTool;

#[async_trait::async_trait]
impl CapabilityHandler for ListPromptCategoriesTool {
    async fn handle(&self, _args: ValidatedArguments) -> HandlerResult {
        Ok(HandlerOutput::text(CATEGORY_OVERVIEW))
    }
}

pub struct PreviewPromptTool {
    templates: Arc<PromptTemplates>,
}

impl PreviewPromptTool {
    fn sample_arguments(prompt: &str) -> Value {
        match prompt {
            "code-review" => json!({
                "language": "rust",
                "code": "fn add(a: i32, b: i32) -> i32 { a + b }",
                "focus_areas": "performance, readability",
                "complexity": "simple"
            }),
            "writing-helper" => json!({
                "style": "professional",
                "audience": "technical team",
                "purpose": "inform about new process",
                "content": "We are implementing a new deployment process.",
                "length": "medium"
            }),
            "meeting-summary" => json!({
                "meeting_type": "planning",
                "participants": "Alice, Bob, Charlie",
                "duration": "1 hour",
                "key_topics": "Sprint planning, resource allocation",
                "action_items": "Update documentation, schedule follow-up"
            }),
            "learning-tutor" => json!({
                "topic": "Rust traits",
                "level": "intermediate",
                "learning_style": "reading",
                "goals": "Understand advanced trait patterns",
                "time_available": "2 hours"
            }),
            "project-planner" => json!({
                "context": "software-development",
                "timeline": "3 months",
                "team_size": "5 developers",
                "objectives": "Build new customer portal",
                "constraints": "Legacy system integration required",
                "budget": "$50,000"
            }),
            _ => json!({}),
        }
    }

    fn caller_arguments(raw: &str) -> Result<Value, HandlerError> {
        match serde_json::from_str::<Value>(raw) {
            Ok(value @ Value::Object(_)) => Ok(value),
            Ok(_) => Err(HandlerError::failed("sample_args must be a JSON object")),
            Err(e) => Err(HandlerError::failed(format!(
                "sample_args is not valid JSON: {}",
                e
            ))),
        }
    }
}

#[async_trait::async_trait]
impl CapabilityHandler for PreviewPromptTool {
    async fn handle(&self, args: ValidatedArguments) -> HandlerResult {
        let prompt = args.required_str("prompt_name")?;
        let sample = match args.str("sample_args") {
            Some(raw) => Self::caller_arguments(raw)?,
            None => Self::sample_arguments(prompt),
        };

        let preview = match self.templates.render_preview(prompt, &sample)? {
            Some(line) => line,
            None => format!("Preview for {} with provided arguments", prompt),
        };

        Ok(HandlerOutput::text(format!(
            "# Prompt Preview: {}\n\n## Sample Arguments:\n{}\n\n## Generated Prompt:\n{}\n\n---\n\
             *This is a preview using sample arguments. Use the actual prompt with your specific \
             parameters for real tasks.*",
            prompt,
            to_json(&sample)?,
            preview
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capability::CapabilityKind;

    fn catalogue() -> Registry {
        let templates = Arc::new(PromptTemplates::new().unwrap());
        let mut registry = Registry::new();
        register_prompts(&mut registry, &templates).unwrap();
        register_tools(&mut registry, &templates).unwrap();
        registry
    }

    async fn get(registry: &Registry, kind: CapabilityKind, name: &str, arguments: Value) -> HandlerOutput {
        let record = registry.lookup(kind, name).unwrap();
        let args = record.shape.validate(Some(&arguments)).unwrap();
        record.handler.handle(args).await.unwrap()
    }

    #[test]
    fn test_prompt_listing_order() {
        let registry = catalogue();
        assert_eq!(
            registry.identifiers(CapabilityKind::Prompt),
            vec![
                "code-review",
                "writing-helper",
                "meeting-summary",
                "learning-tutor",
                "project-planner"
            ]
        );
    }

    #[tokio::test]
    async fn test_code_review_prompt() {
        let registry = catalogue();
        let output = get(
            &registry,
            CapabilityKind::Prompt,
            "code-review",
            json!({"language": "rust", "code": "fn main() { println!(\"<hi>\"); }"}),
        )
        .await;

        assert_eq!(
            output.description.as_deref(),
            Some("Code review prompt for rust code")
        );
        let text = output.joined_text();
        assert!(text.contains("**Complexity**: moderate\n\n## Analysis Framework"));
        assert!(text.contains("Provide balanced analysis"));
        assert!(text.contains("```rust\nfn main() { println!(\"<hi>\"); }\n```"));
        assert!(!text.contains("Focus Areas"));
    }

    #[tokio::test]
    async fn test_optional_sections_render_when_present() {
        let registry = catalogue();
        let output = get(
            &registry,
            CapabilityKind::Prompt,
            "meeting-summary",
            json!({
                "meeting_type": "standup",
                "participants": "Ana, Ben",
                "duration": "15 minutes",
                "action_items": "Fix the build"
            }),
        )
        .await;

        let text = output.joined_text();
        assert!(text.contains("**Duration**: 15 minutes\n**Action Items**: Fix the build\n"));
        assert!(!text.contains("Key Topics"));
        assert!(text.contains("Focus Areas: Yesterday's Progress, Today's Plans, Blockers"));
    }

    #[tokio::test]
    async fn test_learning_tutor_defaults() {
        let registry = catalogue();
        let output = get(
            &registry,
            CapabilityKind::Prompt,
            "learning-tutor",
            json!({"topic": "Ownership", "level": "beginner", "goals": "Borrow safely"}),
        )
        .await;

        let text = output.joined_text();
        assert!(text.contains("**Learning Style**: reading"));
        assert!(text.contains("**Approach**: Start with fundamentals"));
    }

    #[tokio::test]
    async fn test_preview_prompt() {
        let registry = catalogue();
        let output = get(
            &registry,
            CapabilityKind::Tool,
            "preview-prompt",
            json!({"prompt_name": "project-planner"}),
        )
        .await;
        assert!(output
            .joined_text()
            .contains("software-development project plan for 3 months with team of 5 developers"));

        let output = get(
            &registry,
            CapabilityKind::Tool,
            "preview-prompt",
            json!({"prompt_name": "haiku"}),
        )
        .await;
        let text = output.joined_text();
        assert!(text.contains("## Sample Arguments:\n{}"));
        assert!(text.contains("Preview for haiku with provided arguments"));
    }

    #[tokio::test]
    async fn test_preview_prompt_with_caller_arguments() {
        let registry = catalogue();
        let output = get(
            &registry,
            CapabilityKind::Tool,
            "preview-prompt",
            json!({
                "prompt_name": "code-review",
                "sample_args": "{\"language\": \"go\", \"code\": \"package main\"}"
            }),
        )
        .await;
        let text = output.joined_text();
        assert!(text.contains("\"language\": \"go\""));
        assert!(text.contains("Code Review Assistant for go code focusing on general quality"));

        let output = get(
            &registry,
            CapabilityKind::Tool,
            "preview-prompt",
            json!({
                "prompt_name": "learning-tutor",
                "sample_args": "{\"level\": \"expert\", \"topic\": \"Pinning\"}"
            }),
        )
        .await;
        assert!(output
            .joined_text()
            .contains("expert level tutoring for Pinning using reading approach"));
    }

    #[tokio::test]
    async fn test_preview_prompt_rejects_non_object_arguments() {
        let registry = catalogue();
        let record = registry.lookup(CapabilityKind::Tool, "preview-prompt").unwrap();

        for raw in ["[1, 2]", "{not json"] {
            let args = record
                .shape
                .validate(Some(&json!({"prompt_name": "code-review", "sample_args": raw})))
                .unwrap();
            let err = record.handler.handle(args).await.unwrap_err();
            assert!(matches!(err, HandlerError::Failed(_)));
        }
    }

    #[tokio::test]
    async fn test_category_overview() {
        let registry = catalogue();
        let output = get(
            &registry,
            CapabilityKind::Tool,
            "list-prompt-categories",
            json!({}),
        )
        .await;
        assert!(output.joined_text().starts_with("# Prompt Categories"));
    }
}
