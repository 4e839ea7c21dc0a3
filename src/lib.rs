//! A small Rust client for the nomenklatura entity reconciliation API.
//!
//! nomenklatura keeps named datasets of entities (people, companies, ...)
//! and lets curators mark entities as aliases of a canonical one. This crate
//! wraps the JSON API: open a [`Dataset`], look entities up, page through
//! listings lazily, create entities and push edits back.
//!
//! ## Quick start
//! - Configure the server via arguments, environment variables
//!   (`NOMENKLATURA_HOST`, `NOMENKLATURA_APIKEY`) or a `[client]` section in
//!   `~/.nomenklatura.ini` (keys `host` and `api_key`).
//! - Open a [`Dataset`] and query it.
//!
//! ```no_run
//! use nomenklatura::{Dataset, Error, NewEntity};
//!
//! fn main() -> Result<(), Error> {
//!     let dataset = Dataset::open("companies")?;
//!
//!     for entity in dataset.entities(Some("acme")) {
//!         let entity = entity?;
//!         println!("{} -> {}", entity, entity.dereference()?);
//!     }
//!
//!     match dataset.entity_by_name("Acme Corp.") {
//!         Ok(entity) => println!("found {}", entity.id()),
//!         Err(Error::NoMatch(_)) => {
//!             dataset.create_entity(NewEntity::new("Acme Corp.").attribute("country", "de"))?;
//!         }
//!         Err(e) => return Err(e),
//!     }
//!     Ok(())
//! }
//! ```
//!
//! Every failed HTTP status surfaces as an [`Error`]; nothing is retried or
//! cached. Requests are logged at `debug` level through `tracing`.

#![forbid(unsafe_code)]

mod client;
mod config;
mod dataset;
mod entity;
mod error;
mod pagination;
mod transport;

pub use client::{Client, evaluate};
pub use config::{
    API_KEY_ENV, CONFIG_ENV, ClientConfig, DEFAULT_API_PREFIX, DEFAULT_HOST, HOST_ENV, load_config,
};
pub use dataset::{Dataset, DatasetBuilder, DatasetRecord, NewEntity};
pub use entity::{Entity, EntityId, EntityRecord, MAX_CANONICAL_DEPTH};
pub use error::{Error, Result, ServerError};
pub use pagination::{Entities, Page};
pub use transport::{HttpRequest, HttpResponse, HttpTransport, Transport};
