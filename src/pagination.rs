use serde::Deserialize;
use serde_json::Value;
use std::collections::HashSet;
use std::iter::FusedIterator;
use std::sync::Arc;

use crate::client::Client;
use crate::entity::{Entity, null_as_default};
use crate::error::{Error, Result};

/// One page of a listing: `{"results": [...], "next": "<url>" | null}`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Page {
    #[serde(default, deserialize_with = "null_as_default")]
    pub results: Vec<Value>,
    #[serde(default)]
    pub next: Option<String>,
}

/// Lazy iterator over a paginated entity listing.
///
/// Nothing is fetched on construction. The first page is requested by the
/// first call to `next`, and each later page only once the previous one is
/// used up. The iterator stops after the first error and cannot be rewound;
/// ask the dataset or entity for a new one instead. A cursor that was already
/// followed ends the traversal.
#[derive(Debug)]
pub struct Entities {
    client: Arc<Client>,
    pending: Option<PageRequest>,
    buffer: std::vec::IntoIter<Value>,
    visited: HashSet<String>,
    pages: usize,
}

#[derive(Debug)]
struct PageRequest {
    endpoint: String,
    params: Vec<(String, String)>,
}

impl Entities {
    pub(crate) fn new(client: Arc<Client>, endpoint: String, params: Vec<(String, String)>) -> Self {
        Self {
            client,
            pending: Some(PageRequest { endpoint, params }),
            buffer: Vec::new().into_iter(),
            visited: HashSet::new(),
            pages: 0,
        }
    }

    /// Number of pages requested so far.
    pub fn pages_fetched(&self) -> usize {
        self.pages
    }

    fn fetch(&mut self, request: PageRequest) -> Result<()> {
        let params: Vec<(&str, &str)> = request
            .params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();
        let (_, data) = self.client.get(&request.endpoint, &params)?;
        self.pages += 1;

        let page: Page = serde_json::from_value(data).map_err(|source| Error::Decode {
            what: "result page",
            source,
        })?;
        tracing::debug!(
            page = self.pages,
            results = page.results.len(),
            next = page.next.as_deref().unwrap_or(""),
            "fetched page"
        );

        self.pending = match page.next.filter(|n| !n.is_empty()) {
            Some(next) if !self.visited.insert(next.clone()) => {
                tracing::warn!(url = %next, "page cursor was already followed; stopping");
                None
            }
            Some(next) => Some(PageRequest {
                endpoint: next,
                params: Vec::new(),
            }),
            None => None,
        };
        self.buffer = page.results.into_iter();
        Ok(())
    }

    fn stop(&mut self) {
        self.pending = None;
        self.buffer = Vec::new().into_iter();
    }
}

impl Iterator for Entities {
    type Item = Result<Entity>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(value) = self.buffer.next() {
                let entity = Entity::from_value(self.client.clone(), value);
                if entity.is_err() {
                    self.stop();
                }
                return Some(entity);
            }

            let request = self.pending.take()?;
            if let Err(e) = self.fetch(request) {
                self.stop();
                return Some(Err(e));
            }
        }
    }
}

impl FusedIterator for Entities {}
