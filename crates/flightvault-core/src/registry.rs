//! Entity-kind registry (§6). The source's per-entity special-casing
//! (primary keys, required fields, referential links, critical fields)
//! is modelled as a single table every component consults — new kinds
//! are additions to this table, not new types (§9 "Kind registry over
//! inheritance").

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A declared outgoing reference: `self.field_on_self -> target_kind.target_field`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Reference {
    pub field_on_self: String,
    pub target_kind: String,
    pub target_field: String,
}

/// Registry entry for one entity kind (§6).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityKind {
    pub name: String,
    pub primary_key: String,
    pub required_fields: Vec<String>,
    pub references: Vec<Reference>,
    pub critical_fields: Vec<String>,
    pub expected_count_bounds: Option<(usize, usize)>,
}

impl EntityKind {
    pub fn new(name: impl Into<String>, primary_key: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            primary_key: primary_key.into(),
            required_fields: Vec::new(),
            references: Vec::new(),
            critical_fields: Vec::new(),
            expected_count_bounds: None,
        }
    }

    pub fn with_required_fields(mut self, fields: &[&str]) -> Self {
        self.required_fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_critical_fields(mut self, fields: &[&str]) -> Self {
        self.critical_fields = fields.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_reference(
        mut self,
        field_on_self: impl Into<String>,
        target_kind: impl Into<String>,
        target_field: impl Into<String>,
    ) -> Self {
        self.references.push(Reference {
            field_on_self: field_on_self.into(),
            target_kind: target_kind.into(),
            target_field: target_field.into(),
        });
        self
    }
}

/// The set of entity kinds this deployment knows about.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    kinds: BTreeMap<String, EntityKind>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, kind: EntityKind) -> &mut Self {
        self.kinds.insert(kind.name.clone(), kind);
        self
    }

    pub fn get(&self, name: &str) -> Option<&EntityKind> {
        self.kinds.get(name)
    }

    pub fn kinds(&self) -> impl Iterator<Item = &EntityKind> {
        self.kinds.values()
    }

    /// Kinds that hold an outgoing reference to `target_kind` — the
    /// "incoming references" side of the Dependency Validator (§4.F).
    pub fn referring_to<'a>(&'a self, target_kind: &'a str) -> impl Iterator<Item = &'a EntityKind> {
        self.kinds
            .values()
            .filter(move |k| k.references.iter().any(|r| r.target_kind == target_kind))
    }
}

/// The reference registry used by the FlightVault prototype
/// (`original_source/core/temporal_engine.py`): three kinds, with
/// `routes` referencing `airports` twice.
pub fn default_registry() -> Registry {
    let mut registry = Registry::new();

    registry.register(
        EntityKind::new("airports", "airport_id")
            .with_required_fields(&["airport_id", "name"])
            .with_critical_fields(&["name", "iata_code"]),
    );

    registry.register(
        EntityKind::new("airlines", "airline_id")
            .with_required_fields(&["airline_id", "name"])
            .with_critical_fields(&["name", "iata_code"]),
    );

    registry.register(
        EntityKind::new("routes", "route_id")
            .with_critical_fields(&["source_airport_id", "destination_airport_id"])
            .with_reference("source_airport_id", "airports", "airport_id")
            .with_reference("destination_airport_id", "airports", "airport_id"),
    );

    registry
}
