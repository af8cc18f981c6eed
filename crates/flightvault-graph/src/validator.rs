//! Dependency Validator (§4.F): checks a proposed restore set for
//! outgoing references that would dangle, and reports the non-blocking
//! cascade impact of restoring on kinds that refer back to it.

use flightvault_core::errors::StoreError;
use flightvault_core::models::{CascadeImpact, FieldValue, ForeignKeyIssue, RestoreSet, ValidationResult};
use flightvault_core::registry::Registry;
use flightvault_core::traits::TemporalStore;
use tracing::{instrument, warn};

use crate::kind_graph::KindGraph;

pub struct DependencyValidator<'a> {
    store: &'a dyn TemporalStore,
    registry: &'a Registry,
    graph: KindGraph,
}

impl<'a> DependencyValidator<'a> {
    pub fn new(store: &'a dyn TemporalStore, registry: &'a Registry) -> Self {
        Self {
            store,
            registry,
            graph: KindGraph::from_registry(registry),
        }
    }

    /// Validate restoring `restore_set` on `kind`. Outgoing references are
    /// checked against `current(K')`, the store's live state, not the
    /// historical snapshot being restored from.
    #[instrument(skip(self, restore_set))]
    pub fn validate(&self, kind: &str, restore_set: &RestoreSet) -> Result<ValidationResult, StoreError> {
        let entity = self
            .registry
            .get(kind)
            .ok_or_else(|| StoreError::UnknownKind(kind.to_string()))?;

        if self.graph.has_cycle() {
            warn!("registry reference graph contains a cycle");
        }

        let mut foreign_key_issues = Vec::new();
        let mut warnings = Vec::new();
        let restored_keys: std::collections::BTreeSet<&FieldValue> =
            restore_set.iter().map(|(pk, _)| pk).collect();

        for (pk, record) in restore_set {
            for reference in &entity.references {
                let Some(value) = record.get(&reference.field_on_self) else {
                    continue;
                };
                if value.is_missing_or_empty() {
                    continue;
                }

                let target_current = self.store.current(&reference.target_kind, None)?;
                let target_entity = self.registry.get(&reference.target_kind);
                let resolves_in_current = target_entity
                    .map(|te| {
                        target_current
                            .iter()
                            .any(|r| r.get(&te.primary_key) == Some(value))
                    })
                    .unwrap_or(false);
                let resolves_in_restore_set = restored_keys.contains(value) && reference.target_kind == kind;

                if !resolves_in_current && !resolves_in_restore_set {
                    foreign_key_issues.push(ForeignKeyIssue {
                        kind: kind.to_string(),
                        key: pk.clone(),
                        field: reference.field_on_self.clone(),
                        missing_target_kind: reference.target_kind.clone(),
                        missing_target_key: value.clone(),
                    });
                }
            }
        }

        let mut cascade_impact = Vec::new();
        let mut affected_kinds = Vec::new();
        for referring_kind in self.graph.referrers_of(kind) {
            let Some(referring_entity) = self.registry.get(&referring_kind) else {
                continue;
            };
            let referring_current = self.store.current(&referring_kind, None)?;
            let affected = referring_current
                .iter()
                .filter(|record| {
                    referring_entity.references.iter().any(|reference| {
                        reference.target_kind == kind
                            && record
                                .get(&reference.field_on_self)
                                .map(|v| restored_keys.contains(v))
                                .unwrap_or(false)
                    })
                })
                .count();

            if affected > 0 {
                cascade_impact.push(CascadeImpact {
                    referring_kind: referring_kind.clone(),
                    affected_row_count: affected,
                });
                affected_kinds.push(referring_kind.clone());
                warnings.push(format!(
                    "{affected} row(s) in {referring_kind} reference keys being restored in {kind}"
                ));
            }
        }

        Ok(ValidationResult {
            safe_to_restore: foreign_key_issues.is_empty(),
            foreign_key_issues,
            cascade_impact,
            warnings,
            affected_kinds,
        })
    }
}
