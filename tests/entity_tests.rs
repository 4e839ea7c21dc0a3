mod common;

use common::*;
use nomenklatura::{Entity, EntityId, EntityRecord, Error};
use reqwest::Method;
use serde_json::json;

#[test]
fn test_update_posts_full_record() {
    let (transport, dataset) = open_dataset(true);
    transport.push(200, entity_json(5, "Acme"));
    let mut entity = dataset.entity_by_id(5_i64).unwrap();

    entity.set_name("Acme Corp.");
    entity.set_reviewed(true);
    entity.set_attribute("country", "de");

    transport.push(200, json!({"status": "ok"}));
    entity.update().unwrap();

    let req = transport.last();
    assert_eq!(req.method, Method::POST);
    assert_eq!(req.url, "http://example.org/api/2/entities/5");
    assert_eq!(
        req.body,
        Some(json!({
            "id": 5,
            "name": "Acme Corp.",
            "attributes": {"country": "de"},
            "reviewed": true,
            "invalid": false,
            "canonical": null,
            "dataset": "foo"
        }))
    );
}

#[test]
fn test_update_surfaces_server_error() {
    let transport = ScriptedTransport::new();
    let record: EntityRecord = serde_json::from_value(entity_json(5, "Acme")).unwrap();
    let entity = Entity::from_record(client(&transport), record);

    transport.push(403, json!({"status": 403, "message": "no write access"}));
    let err = entity.update().unwrap_err();
    assert_eq!(err.status(), Some(403));
}

#[test]
fn test_alias_resolution() {
    let (transport, dataset) = open_dataset(true);
    let mut payload = entity_json(3, "ACME");
    payload["canonical"] = entity_json(1, "Acme Corp.");
    transport.push(200, payload);

    let alias = dataset.entity_by_id(3_i64).unwrap();
    assert!(alias.is_alias());
    assert_eq!(alias.canonical().unwrap().name(), "Acme Corp.");

    let root = alias.dereference().unwrap();
    assert_eq!(root.id(), &EntityId::Int(1));
    assert!(!root.is_alias());
    assert_eq!(transport.request_count(), 2);
}

#[test]
fn test_aliases_paginate() {
    let (transport, dataset) = open_dataset(true);
    transport.push(200, entity_json(1, "Acme Corp."));
    let entity = dataset.entity_by_id(1_i64).unwrap();

    let next = "http://example.org/api/2/entities/1/aliases?page=2";
    transport.push(200, json!({"results": [entity_json(2, "ACME")], "next": next}));
    transport.push(200, json!({"results": [entity_json(3, "Acme Inc")], "next": null}));

    let names: Vec<String> = entity
        .aliases()
        .map(|e| e.map(|e| e.name().to_string()))
        .collect::<Result<_, Error>>()
        .unwrap();
    assert_eq!(names, vec!["ACME", "Acme Inc"]);

    let requests = transport.requests();
    assert_eq!(requests[2].url, "http://example.org/api/2/entities/1/aliases");
    assert_eq!(requests[3].url, next);
    assert!(requests[3].query.is_empty());
}
