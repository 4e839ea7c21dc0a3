use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::sync::Arc;

use crate::client::Client;
use crate::config::load_config;
use crate::entity::{Entity, EntityId};
use crate::error::{Error, Result};
use crate::pagination::Entities;

/// Dataset metadata as returned by `GET /datasets/{name}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetRecord {
    #[serde(default)]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ignore_case: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_aliases: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub public_edit: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub normalize_text: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enable_invalid: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// A nomenklatura dataset: a named collection of entities.
///
/// Opening a dataset fetches its metadata once; the snapshot is not
/// refreshed afterwards.
#[derive(Debug, Clone)]
pub struct Dataset {
    name: String,
    client: Arc<Client>,
    record: DatasetRecord,
    translate_no_match: bool,
}

#[derive(Debug, Clone)]
pub struct DatasetBuilder {
    name: String,
    host: Option<String>,
    api_key: Option<String>,
    api_prefix: Option<String>,
    translate_no_match: bool,
    client: Option<Arc<Client>>,
}

impl DatasetBuilder {
    /// Overrides `NOMENKLATURA_HOST` and the config file.
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.host = Some(host.into());
        self
    }

    /// Overrides `NOMENKLATURA_APIKEY` and the config file.
    pub fn api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }

    pub fn api_prefix(mut self, api_prefix: impl Into<String>) -> Self {
        self.api_prefix = Some(api_prefix.into());
        self
    }

    /// Whether a 404 from [`Dataset::entity_by_name`] is reported as
    /// [`Error::NoMatch`] (the default) or left as a plain [`Error::Server`].
    pub fn translate_no_match(mut self, translate: bool) -> Self {
        self.translate_no_match = translate;
        self
    }

    /// Uses an existing client; host, key and prefix settings are ignored.
    pub fn client(mut self, client: Arc<Client>) -> Self {
        self.client = Some(client);
        self
    }

    /// Resolves configuration and fetches the dataset metadata.
    pub fn open(self) -> Result<Dataset> {
        let client = match self.client {
            Some(client) => client,
            None => {
                let mut config = load_config(self.host, self.api_key)?;
                if let Some(prefix) = self.api_prefix {
                    config = config.with_api_prefix(prefix);
                }
                Arc::new(Client::new(config))
            }
        };

        let (_, data) = client.get(&format!("/datasets/{}", self.name), &[])?;
        let record = serde_json::from_value(data).map_err(|source| Error::Decode {
            what: "dataset",
            source,
        })?;

        Ok(Dataset {
            name: self.name,
            client,
            record,
            translate_no_match: self.translate_no_match,
        })
    }
}

impl Dataset {
    pub fn builder(name: impl Into<String>) -> DatasetBuilder {
        DatasetBuilder {
            name: name.into(),
            host: None,
            api_key: None,
            api_prefix: None,
            translate_no_match: true,
            client: None,
        }
    }

    /// Opens a dataset using environment variables and/or `~/.nomenklatura.ini`.
    pub fn open(name: impl Into<String>) -> Result<Self> {
        Self::builder(name).open()
    }

    /// The name this dataset was opened with.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn label(&self) -> Option<&str> {
        self.record.label.as_deref()
    }

    pub fn record(&self) -> &DatasetRecord {
        &self.record
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

    pub fn client(&self) -> &Arc<Client> {
        &self.client
    }

    /// Lazily pages through the entities of this dataset, optionally
    /// restricted to names matching `filter_name`.
    pub fn entities(&self, filter_name: Option<&str>) -> Entities {
        let mut params = vec![("dataset".to_string(), self.name.clone())];
        if let Some(filter) = filter_name {
            params.push(("filter_name".to_string(), filter.to_string()));
        }
        Entities::new(self.client.clone(), "/entities".to_string(), params)
    }

    pub fn entity_by_name(&self, name: &str) -> Result<Entity> {
        let endpoint = format!("/datasets/{}/find", self.name);
        match self.client.get(&endpoint, &[("name", name)]) {
            Ok((_, data)) => Entity::from_value(self.client.clone(), data),
            Err(Error::Server(e)) if self.translate_no_match && e.status == 404 => {
                Err(Error::NoMatch(e))
            }
            Err(e) => Err(e),
        }
    }

    pub fn entity_by_id(&self, id: impl Into<EntityId>) -> Result<Entity> {
        let (_, data) = self.client.get(&format!("/entities/{}", id.into()), &[])?;
        Entity::from_value(self.client.clone(), data)
    }

    /// Creates an entity in this dataset. The server answering 400 is
    /// reported as [`Error::InvalidRequest`].
    pub fn create_entity(&self, entity: NewEntity) -> Result<Entity> {
        let payload = entity.into_payload(&self.name);
        match self.client.post("/entities", &payload) {
            Ok((_, data)) => Entity::from_value(self.client.clone(), data),
            Err(Error::Server(e)) if e.http_status == 400 => Err(Error::InvalidRequest(e)),
            Err(e) => Err(e),
        }
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

/// Payload for [`Dataset::create_entity`].
#[derive(Debug, Clone, PartialEq)]
pub struct NewEntity {
    name: String,
    attributes: Map<String, Value>,
    reviewed: bool,
    invalid: bool,
    canonical: Value,
    extra: Map<String, Value>,
}

impl NewEntity {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Map::new(),
            reviewed: false,
            invalid: false,
            canonical: Value::Null,
            extra: Map::new(),
        }
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn attributes(mut self, attributes: Map<String, Value>) -> Self {
        self.attributes = attributes;
        self
    }

    pub fn reviewed(mut self, reviewed: bool) -> Self {
        self.reviewed = reviewed;
        self
    }

    pub fn invalid(mut self, invalid: bool) -> Self {
        self.invalid = invalid;
        self
    }

    /// Creates the entity as an alias of `canonical`.
    pub fn canonical(mut self, canonical: &Entity) -> Self {
        self.canonical = serde_json::to_value(canonical.record()).unwrap_or(Value::Null);
        self
    }

    /// Raw `canonical` value, for servers expecting a bare id or reference.
    pub fn canonical_value(mut self, canonical: impl Into<Value>) -> Self {
        self.canonical = canonical.into();
        self
    }

    /// Additional top-level field. The named fields above take precedence.
    pub fn extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }

    fn into_payload(self, dataset: &str) -> Value {
        let mut payload = self.extra;
        payload.insert("name".to_string(), Value::String(self.name));
        payload.insert("attributes".to_string(), Value::Object(self.attributes));
        payload.insert("reviewed".to_string(), Value::Bool(self.reviewed));
        payload.insert("invalid".to_string(), Value::Bool(self.invalid));
        payload.insert("canonical".to_string(), self.canonical);
        payload.insert("dataset".to_string(), Value::String(dataset.to_string()));
        Value::Object(payload)
    }
}
