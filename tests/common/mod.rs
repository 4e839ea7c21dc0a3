#![allow(dead_code)]

use nomenklatura::{
    Client, ClientConfig, Dataset, HttpRequest, HttpResponse, Result, Transport,
};
use serde_json::{Value, json};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

pub const HOST: &str = "http://example.org";

/// Replays queued responses in order and records every request it sees.
#[derive(Default)]
pub struct ScriptedTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn push(&self, status: u16, body: Value) {
        self.push_raw(status, body.to_string());
    }

    pub fn push_raw(&self, status: u16, body: impl Into<String>) {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse::new(status, body));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request recorded")
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {}", request.url));
        Ok(response)
    }
}

pub fn client(transport: &Arc<ScriptedTransport>) -> Arc<Client> {
    Arc::new(Client::with_transport(
        ClientConfig::new(HOST),
        transport.clone(),
    ))
}

pub fn dataset_json(name: &str) -> Value {
    json!({"name": name, "label": "Foo", "ignore_case": false})
}

/// Opens `foo` against a fresh transport, consuming the metadata request.
pub fn open_dataset(translate_no_match: bool) -> (Arc<ScriptedTransport>, Dataset) {
    let transport = ScriptedTransport::new();
    transport.push(200, dataset_json("foo"));
    let dataset = Dataset::builder("foo")
        .client(client(&transport))
        .translate_no_match(translate_no_match)
        .open()
        .expect("dataset opens");
    (transport, dataset)
}

pub fn entity_json(id: i64, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "attributes": {},
        "reviewed": false,
        "invalid": false,
        "canonical": null,
        "dataset": "foo"
    })
}

pub fn query(request: &HttpRequest) -> Vec<(&str, &str)> {
    request
        .query
        .iter()
        .map(|(k, v)| (k.as_str(), v.as_str()))
        .collect()
}
