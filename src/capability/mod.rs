//! Capability registry core.
//!
//! Every tool, resource and prompt the server exposes is a
//! [`CapabilityRecord`]: an identifier, a description, a declared
//! [`ArgumentShape`] and a [`CapabilityHandler`]. Records are collected in a
//! [`Registry`] at startup and served by the [`Dispatcher`], which validates
//! arguments before any handler runs and folds every failure into a
//! [`DispatchError`](crate::error::DispatchError).

pub mod dispatcher;
pub mod registry;
pub mod schema;

pub use dispatcher::{Dispatcher, RequestObserver};
pub use registry::Registry;
pub use schema::{ArgumentShape, FieldKind, FieldSpec, ValidatedArguments};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

use crate::error::{DispatchError, HandlerError};
use crate::protocol::Content;

/// The three kinds of capability a client can address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityKind {
    Tool,
    Resource,
    Prompt,
}

impl CapabilityKind {
    /// All kinds, in banner order
    pub const ALL: [CapabilityKind; 3] = [
        CapabilityKind::Tool,
        CapabilityKind::Resource,
        CapabilityKind::Prompt,
    ];

    /// Plural label used in listings
    pub fn plural(&self) -> &'static str {
        match self {
            CapabilityKind::Tool => "Tools",
            CapabilityKind::Resource => "Resources",
            CapabilityKind::Prompt => "Prompts",
        }
    }
}

impl fmt::Display for CapabilityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CapabilityKind::Tool => "Tool",
            CapabilityKind::Resource => "Resource",
            CapabilityKind::Prompt => "Prompt",
        };
        f.write_str(label)
    }
}

/// Successful handler output
#[derive(Debug, Clone, PartialEq)]
pub struct HandlerOutput {
    /// Ordered content blocks
    pub content: Vec<Content>,

    /// Optional description (used by prompts)
    pub description: Option<String>,

    /// MIME type of the content (used by resources)
    pub mime_type: Option<String>,
}

impl HandlerOutput {
    /// Create output from content blocks
    pub fn new(content: Vec<Content>) -> Self {
        Self {
            content,
            description: None,
            mime_type: None,
        }
    }

    /// Create a single text block output
    pub fn text(text: impl Into<String>) -> Self {
        Self::new(vec![Content::text(text)])
    }

    /// Attach a description
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Concatenated text of all blocks
    pub fn joined_text(&self) -> String {
        self.content
            .iter()
            .map(Content::as_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Result returned by a handler invocation
pub type HandlerResult = std::result::Result<HandlerOutput, HandlerError>;

/// Outcome of a single dispatch
pub type Response = std::result::Result<HandlerOutput, DispatchError>;

/// Handler invoked with arguments that already passed validation
#[async_trait::async_trait]
pub trait CapabilityHandler: Send + Sync + 'static {
    async fn handle(&self, arguments: ValidatedArguments) -> HandlerResult;
}

#[async_trait::async_trait]
impl<F> CapabilityHandler for F
where
    F: Fn(ValidatedArguments) -> HandlerResult + Send + Sync + 'static,
{
    async fn handle(&self, arguments: ValidatedArguments) -> HandlerResult {
        (self)(arguments)
    }
}

/// Immutable binding of an identifier to its shape and handler
#[derive(Clone)]
pub struct CapabilityRecord {
    pub kind: CapabilityKind,
    pub identifier: String,
    pub description: String,
    /// Display name for listings; falls back to the identifier
    pub title: Option<String>,
    pub mime_type: Option<String>,
    pub shape: ArgumentShape,
    pub handler: Arc<dyn CapabilityHandler>,
}

impl CapabilityRecord {
    /// Create a record of any kind
    pub fn new(
        kind: CapabilityKind,
        identifier: impl Into<String>,
        description: impl Into<String>,
        shape: ArgumentShape,
        handler: impl CapabilityHandler,
    ) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            description: description.into(),
            title: None,
            mime_type: None,
            shape,
            handler: Arc::new(handler),
        }
    }

    /// Create a tool record
    pub fn tool(
        identifier: impl Into<String>,
        description: impl Into<String>,
        shape: ArgumentShape,
        handler: impl CapabilityHandler,
    ) -> Self {
        Self::new(CapabilityKind::Tool, identifier, description, shape, handler)
    }

    /// Create a resource record; resources take no arguments
    pub fn resource(
        uri: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        mime_type: impl Into<String>,
        handler: impl CapabilityHandler,
    ) -> Self {
        let mut record = Self::new(
            CapabilityKind::Resource,
            uri,
            description,
            ArgumentShape::empty(),
            handler,
        );
        record.title = Some(name.into());
        record.mime_type = Some(mime_type.into());
        record
    }

    /// Create a prompt record
    pub fn prompt(
        identifier: impl Into<String>,
        description: impl Into<String>,
        shape: ArgumentShape,
        handler: impl CapabilityHandler,
    ) -> Self {
        Self::new(CapabilityKind::Prompt, identifier, description, shape, handler)
    }

    /// Display name for listings
    pub fn display_name(&self) -> &str {
        self.title.as_deref().unwrap_or(&self.identifier)
    }
}

impl fmt::Debug for CapabilityRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CapabilityRecord")
            .field("kind", &self.kind)
            .field("identifier", &self.identifier)
            .field("description", &self.description)
            .field("title", &self.title)
            .field("mime_type", &self.mime_type)
            .field("shape", &self.shape)
            .finish_non_exhaustive()
    }
}

/// Inbound request addressed to one capability
#[derive(Debug, Clone, PartialEq)]
pub struct DispatchRequest {
    pub kind: CapabilityKind,
    pub identifier: String,
    pub arguments: Option<Value>,
}

impl DispatchRequest {
    /// Create a request
    pub fn new(kind: CapabilityKind, identifier: impl Into<String>, arguments: Option<Value>) -> Self {
        Self {
            kind,
            identifier: identifier.into(),
            arguments,
        }
    }

    /// Tool call request
    pub fn tool(identifier: impl Into<String>, arguments: Value) -> Self {
        Self::new(CapabilityKind::Tool, identifier, Some(arguments))
    }

    /// Resource read request
    pub fn resource(uri: impl Into<String>) -> Self {
        Self::new(CapabilityKind::Resource, uri, None)
    }

    /// Prompt get request
    pub fn prompt(identifier: impl Into<String>, arguments: Value) -> Self {
        Self::new(CapabilityKind::Prompt, identifier, Some(arguments))
    }
}
