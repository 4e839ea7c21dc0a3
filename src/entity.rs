use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use crate::client::Client;
use crate::error::{Error, Result};
use crate::pagination::Entities;

/// Upper bound on canonical hops followed by [`Entity::dereference`].
pub const MAX_CANONICAL_DEPTH: usize = 64;

/// Server-assigned entity id. The API has used both integers and strings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntityId {
    Int(i64),
    Str(String),
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EntityId::Int(id) => write!(f, "{}", id),
            EntityId::Str(id) => f.write_str(id),
        }
    }
}

impl From<i64> for EntityId {
    fn from(id: i64) -> Self {
        EntityId::Int(id)
    }
}

impl From<&str> for EntityId {
    fn from(id: &str) -> Self {
        EntityId::Str(id.to_string())
    }
}

impl From<String> for EntityId {
    fn from(id: String) -> Self {
        EntityId::Str(id)
    }
}

/// Entity payload as sent and received by the API. Fields this client does
/// not model (`dataset`, `created_at`, ...) are kept in `extra` and sent back
/// untouched by [`Entity::update`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityRecord {
    pub id: EntityId,
    pub name: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: Map<String, Value>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub reviewed: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub invalid: bool,
    #[serde(default)]
    pub canonical: Option<Box<EntityRecord>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone)]
pub struct Entity {
    client: Arc<Client>,
    record: EntityRecord,
}

impl Entity {
    pub fn from_record(client: Arc<Client>, record: EntityRecord) -> Self {
        Self { client, record }
    }

    pub(crate) fn from_value(client: Arc<Client>, value: Value) -> Result<Self> {
        let record = serde_json::from_value(value).map_err(|source| Error::Decode {
            what: "entity",
            source,
        })?;
        Ok(Self::from_record(client, record))
    }

    pub fn id(&self) -> &EntityId {
        &self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn attributes(&self) -> &Map<String, Value> {
        &self.record.attributes
    }

    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.record.attributes.get(key)
    }

    pub fn reviewed(&self) -> bool {
        self.record.reviewed
    }

    pub fn invalid(&self) -> bool {
        self.record.invalid
    }

    /// Looks up any payload field by name, modelled or not; `None` when
    /// the payload does not carry it.
    pub fn field(&self, key: &str) -> Option<Value> {
        if let Some(value) = self.record.extra.get(key) {
            return Some(value.clone());
        }
        match serde_json::to_value(&self.record) {
            Ok(Value::Object(mut fields)) => fields.remove(key),
            _ => None,
        }
    }

    /// Name of the owning dataset, whether the server embeds it as a plain
    /// name or as a dataset object.
    pub fn dataset_name(&self) -> Option<&str> {
        match self.record.extra.get("dataset")? {
            Value::String(name) => Some(name),
            Value::Object(obj) => obj.get("name").and_then(Value::as_str),
            _ => None,
        }
    }

    pub fn record(&self) -> &EntityRecord {
        &self.record
    }

    pub fn into_record(self) -> EntityRecord {
        self.record
    }

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    pub fn set_name(&mut self, name: impl Into<String>) {
        self.record.name = name.into();
    }

    pub fn set_reviewed(&mut self, reviewed: bool) {
        self.record.reviewed = reviewed;
    }

    pub fn set_invalid(&mut self, invalid: bool) {
        self.record.invalid = invalid;
    }

    /// Marks this entity as an alias of `canonical`, or clears the link.
    pub fn set_canonical(&mut self, canonical: Option<&Entity>) {
        self.record.canonical = canonical.map(|c| Box::new(c.record.clone()));
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.record.attributes.insert(key.into(), value.into());
    }

    pub fn attributes_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.record.attributes
    }

    /// Pushes the full local record to the server. Last write wins.
    pub fn update(&self) -> Result<()> {
        self.client
            .post(&format!("/entities/{}", self.record.id), &self.record)?;
        Ok(())
    }

    pub fn is_alias(&self) -> bool {
        self.record.canonical.is_some()
    }

    pub fn canonical(&self) -> Option<Entity> {
        self.record
            .canonical
            .as_deref()
            .map(|c| Entity::from_record(self.client.clone(), c.clone()))
    }

    /// Follows embedded canonical links to the root entity. A non-alias
    /// resolves to itself.
    pub fn dereference(&self) -> Result<Entity> {
        let mut seen = HashSet::new();
        seen.insert(&self.record.id);

        let mut current = &self.record;
        let mut depth = 0;
        while let Some(next) = current.canonical.as_deref() {
            depth += 1;
            if depth > MAX_CANONICAL_DEPTH {
                return Err(Error::CanonicalDepth {
                    limit: MAX_CANONICAL_DEPTH,
                });
            }
            if !seen.insert(&next.id) {
                tracing::warn!(id = %next.id, "canonical chain loops");
                return Err(Error::CanonicalCycle {
                    id: next.id.clone(),
                });
            }
            current = next;
        }

        Ok(Entity::from_record(self.client.clone(), current.clone()))
    }

    /// Lazily pages through the aliases of this entity.
    pub fn aliases(&self) -> Entities {
        Entities::new(
            self.client.clone(),
            format!("/entities/{}/aliases", self.record.id),
            Vec::new(),
        )
    }
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.record.name)
    }
}
