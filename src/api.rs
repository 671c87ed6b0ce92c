//! HTTP access to the PokeAPI.
//!
//! [`Fetch`] is the only seam between the loaders and the network: the real
//! [`PokeApiClient`] wraps `reqwest`, tests substitute an in-memory fake.

use async_trait::async_trait;
use std::fmt;
use std::time::Duration;

use crate::error::FetchError;
use crate::models::{IndexEntry, IndexListing, Record};

pub const DEFAULT_BASE_URL: &str = "https://pokeapi.co/api/v2";

/// `limit` sent with every index request. The API caps nothing below this, so
/// one response holds the whole listing.
pub const FULL_INDEX_LIMIT: usize = 100_000;

/// Asset host used when a pokemon's `sprites.front_default` is null.
pub const SPRITE_FALLBACK_BASE: &str =
    "https://raw.githubusercontent.com/PokeAPI/sprites/master/sprites/pokemon";

/// Resource kinds consumed by the catalog. The segment name doubles as the
/// URL path component that precedes every numeric id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    Pokemon,
    PokemonSpecies,
    Location,
    Move,
    Generation,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 5] = [
        ResourceKind::Pokemon,
        ResourceKind::PokemonSpecies,
        ResourceKind::Location,
        ResourceKind::Move,
        ResourceKind::Generation,
    ];

    pub fn segment(self) -> &'static str {
        match self {
            ResourceKind::Pokemon => "pokemon",
            ResourceKind::PokemonSpecies => "pokemon-species",
            ResourceKind::Location => "location",
            ResourceKind::Move => "move",
            ResourceKind::Generation => "generation",
        }
    }

    pub fn from_segment(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.segment() == s)
    }

    /// `GET` URL for the full index listing of this kind.
    pub fn index_url(self, base_url: &str, limit: usize) -> String {
        format!("{}/{}?limit={}", base_url.trim_end_matches('/'), self.segment(), limit)
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.segment())
    }
}

/// One GET round-trip against the API.
#[async_trait]
pub trait Fetch: Send + Sync {
    /// GET `url` and parse the body as JSON.
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError>;

    /// GET `url` and return the raw body (sprite images).
    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Fetch the complete index listing of `kind` in a single request.
pub async fn fetch_index<F: Fetch + ?Sized>(
    fetch: &F,
    base_url: &str,
    kind: ResourceKind,
    limit: usize,
) -> Result<Vec<IndexEntry>, FetchError> {
    let url = kind.index_url(base_url, limit);
    let listing: IndexListing = serde_json::from_value(fetch.get_json(&url).await?)?;
    tracing::debug!(%kind, count = listing.count, received = listing.results.len(), "index fetched");
    Ok(listing.results)
}

/// Dereference an index entry's URL into its typed detail record.
pub async fn fetch_record<T: Record, F: Fetch + ?Sized>(fetch: &F, url: &str) -> Result<T, FetchError> {
    let value = fetch.get_json(url).await?;
    Ok(serde_json::from_value(value)?)
}

/// `reqwest`-backed [`Fetch`] implementation.
pub struct PokeApiClient {
    client: reqwest::Client,
    timeout: Duration,
}

impl PokeApiClient {
    pub fn new(timeout: Duration) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .connect_timeout(timeout)
            .timeout(timeout)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { client, timeout })
    }

    async fn get(&self, url: &str) -> Result<reqwest::Response, FetchError> {
        let resp = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout(url.to_string())
            } else {
                FetchError::Request(e)
            }
        })?;
        let status = resp.status();
        if !status.is_success() {
            return Err(FetchError::HttpStatus(status.as_u16()));
        }
        Ok(resp)
    }
}

impl fmt::Debug for PokeApiClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PokeApiClient")
            .field("timeout", &self.timeout)
            .finish()
    }
}

#[async_trait]
impl Fetch for PokeApiClient {
    async fn get_json(&self, url: &str) -> Result<serde_json::Value, FetchError> {
        let bytes = self.get(url).await?.bytes().await?;
        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn get_bytes(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let bytes = self.get(url).await?.bytes().await?;
        Ok(bytes.to_vec())
    }
}
