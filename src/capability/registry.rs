//! Registry of capability records keyed by kind and identifier.

use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

use super::{CapabilityKind, CapabilityRecord};
use crate::error::RegistryError;

/// Append-only store of capability records.
///
/// Populated through `&mut self` during startup, then shared behind an `Arc`
/// and only read while serving.
#[derive(Debug, Default)]
pub struct Registry {
    records: Vec<Arc<CapabilityRecord>>,
    index: HashMap<CapabilityKind, HashMap<String, usize>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a record. Duplicates within a kind are rejected, and
    /// resource identifiers must parse as URIs.
    pub fn register(
        &mut self,
        record: CapabilityRecord,
    ) -> std::result::Result<Arc<CapabilityRecord>, RegistryError> {
        let kind = record.kind;
        if record.identifier.trim().is_empty() {
            return Err(RegistryError::InvalidIdentifier {
                kind,
                identifier: record.identifier,
                reason: "identifier is empty".to_string(),
            });
        }
        if kind == CapabilityKind::Resource {
            if let Err(e) = url::Url::parse(&record.identifier) {
                return Err(RegistryError::InvalidIdentifier {
                    kind,
                    identifier: record.identifier,
                    reason: e.to_string(),
                });
            }
        }

        let by_kind = self.index.entry(kind).or_default();
        if by_kind.contains_key(&record.identifier) {
            return Err(RegistryError::DuplicateCapability {
                kind,
                identifier: record.identifier,
            });
        }

        debug!("Registered {}: {}", kind, record.identifier);
        by_kind.insert(record.identifier.clone(), self.records.len());
        let record = Arc::new(record);
        self.records.push(Arc::clone(&record));
        Ok(record)
    }

    /// Find the record for an identifier
    pub fn lookup(
        &self,
        kind: CapabilityKind,
        identifier: &str,
    ) -> std::result::Result<&Arc<CapabilityRecord>, RegistryError> {
        self.index
            .get(&kind)
            .and_then(|by_kind| by_kind.get(identifier))
            .and_then(|&position| self.records.get(position))
            .ok_or_else(|| RegistryError::NotFound {
                kind,
                identifier: identifier.to_string(),
            })
    }

    /// Records of one kind in registration order
    pub fn list(&self, kind: CapabilityKind) -> impl Iterator<Item = &Arc<CapabilityRecord>> + '_ {
        self.records.iter().filter(move |record| record.kind == kind)
    }

    /// Number of records of one kind
    pub fn len(&self, kind: CapabilityKind) -> usize {
        self.index.get(&kind).map_or(0, HashMap::len)
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Identifiers of one kind in registration order
    pub fn identifiers(&self, kind: CapabilityKind) -> Vec<&str> {
        self.list(kind).map(|record| record.identifier.as_str()).collect()
    }
}
