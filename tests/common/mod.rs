#![allow(dead_code)]

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::Notify;

use dex_catalog::api::{Fetch, ResourceKind, FULL_INDEX_LIMIT};
use dex_catalog::error::FetchError;
use dex_catalog::models::IndexEntry;

pub const BASE: &str = "https://pokeapi.test/api/v2";

pub fn url(kind: ResourceKind, id: u32) -> String {
    format!("{}/{}/{}/", BASE, kind.segment(), id)
}

pub fn entry(kind: ResourceKind, id: u32, name: &str) -> IndexEntry {
    IndexEntry::new(name, url(kind, id))
}

pub fn pokemon_body(id: u32, name: &str) -> Value {
    json!({
        "id": id,
        "name": name,
        "is_default": id < 10000,
        "sprites": { "front_default": null },
        "types": [{ "slot": 1, "type": { "name": "normal", "url": format!("{BASE}/type/1/") } }],
        "stats": [],
        "abilities": []
    })
}

pub fn move_body(id: u32, name: &str) -> Value {
    json!({ "id": id, "name": name, "pp": 10, "priority": 0 })
}

pub fn species_body(id: u32, name: &str, forms: &[(u32, &str)]) -> Value {
    let varieties: Vec<Value> = forms
        .iter()
        .enumerate()
        .map(|(i, (fid, fname))| {
            json!({
                "is_default": i == 0,
                "pokemon": { "name": fname, "url": url(ResourceKind::Pokemon, *fid) }
            })
        })
        .collect();
    json!({ "id": id, "name": name, "varieties": varieties, "flavor_text_entries": [] })
}

pub fn index_body(entries: &[IndexEntry]) -> Value {
    json!({ "count": entries.len(), "results": entries })
}

/// In-memory stand-in for the API: canned bodies, injected failures,
/// per-URL latency and gates that hold a request until released.
#[derive(Default)]
pub struct FakeFetch {
    bodies: HashMap<String, Value>,
    failing: HashSet<String>,
    delays: HashMap<String, Duration>,
    gates: HashMap<String, Arc<Notify>>,
    calls: Mutex<Vec<String>>,
}

impl FakeFetch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, url: impl Into<String>, body: Value) -> Self {
        self.bodies.insert(url.into(), body);
        self
    }

    pub fn with_index(self, kind: ResourceKind, entries: &[IndexEntry]) -> Self {
        let listing = kind.index_url(BASE, FULL_INDEX_LIMIT);
        self.with(listing, index_body(entries))
    }

    pub fn failing(mut self, url: impl Into<String>) -> Self {
        self.failing.insert(url.into());
        self
    }

    pub fn delayed(mut self, url: impl Into<String>, delay: Duration) -> Self {
        self.delays.insert(url.into(), delay);
        self
    }

    /// Hold requests for `url` until the returned `Notify` is signalled.
    pub fn gate(&mut self, url: impl Into<String>) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates.insert(url.into(), gate.clone());
        gate
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.as_str() == url).count()
    }

    pub async fn wait_for_call(&self, url: &str) {
        for _ in 0..1000 {
            if self.call_count(url) > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        panic!("no request for {url}");
    }
}

#[async_trait]
impl Fetch for FakeFetch {
    async fn get_json(&self, url: &str) -> Result<Value, FetchError> {
        self.calls.lock().unwrap().push(url.to_string());
        if let Some(gate) = self.gates.get(url) {
            gate.notified().await;
        }
        if let Some(delay) = self.delays.get(url) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.contains(url) {
            return Err(FetchError::HttpStatus(500));
        }
        self.bodies
            .get(url)
            .cloned()
            .ok_or(FetchError::HttpStatus(404))
    }

    async fn get_bytes(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
        Err(FetchError::HttpStatus(404))
    }
}

/// Fake serving `moves` as a move index plus one detail body each.
pub fn move_api(moves: &[(u32, &str)]) -> FakeFetch {
    let entries: Vec<IndexEntry> = moves
        .iter()
        .map(|(id, name)| entry(ResourceKind::Move, *id, name))
        .collect();
    moves
        .iter()
        .fold(FakeFetch::new().with_index(ResourceKind::Move, &entries), |f, (id, name)| {
            f.with(url(ResourceKind::Move, *id), move_body(*id, name))
        })
}

pub fn move_entries(moves: &[(u32, &str)]) -> Vec<IndexEntry> {
    moves
        .iter()
        .map(|(id, name)| entry(ResourceKind::Move, *id, name))
        .collect()
}
