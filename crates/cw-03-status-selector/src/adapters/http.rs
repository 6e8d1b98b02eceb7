//! # HTTP Adapters
//!
//! Both clients are built once with their timeout baked in; a request that
//! exceeds it surfaces as [`SelectorError::Timeout`].

use crate::domain::SelectorError;
use crate::ports::{IndexerClient, StatsProbe};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::Value;
use std::net::Ipv4Addr;
use std::time::Duration;

fn build_client(timeout: Duration) -> Result<Client, SelectorError> {
    Client::builder()
        .timeout(timeout)
        .connect_timeout(timeout)
        .build()
        .map_err(map_reqwest)
}

fn map_reqwest(e: reqwest::Error) -> SelectorError {
    if e.is_timeout() {
        SelectorError::Timeout
    } else {
        SelectorError::Upstream(e.to_string())
    }
}

async fn get_json(client: &Client, url: &str) -> Result<Value, SelectorError> {
    let response = client
        .get(url)
        .header(reqwest::header::CACHE_CONTROL, "no-store")
        .send()
        .await
        .map_err(map_reqwest)?;

    if !response.status().is_success() {
        return Err(SelectorError::Upstream(format!(
            "{url} returned {}",
            response.status()
        )));
    }

    response
        .json::<Value>()
        .await
        .map_err(|e| SelectorError::InvalidPayload(e.to_string()))
}

/// Indexer stats over HTTP.
pub struct HttpIndexerClient {
    client: Client,
    url: String,
}

impl HttpIndexerClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self, SelectorError> {
        Ok(Self {
            client: build_client(timeout)?,
            url: url.into(),
        })
    }
}

#[async_trait]
impl IndexerClient for HttpIndexerClient {
    async fn fetch(&self) -> Result<Value, SelectorError> {
        get_json(&self.client, &self.url).await
    }
}

/// Probes `http://<ip>:<port>/stats`.
pub struct HttpStatsProbe {
    client: Client,
}

impl HttpStatsProbe {
    pub fn new(timeout: Duration) -> Result<Self, SelectorError> {
        Ok(Self {
            client: build_client(timeout)?,
        })
    }

    pub fn stats_url(ip: Ipv4Addr, port: u16) -> String {
        format!("http://{ip}:{port}/stats")
    }
}

#[async_trait]
impl StatsProbe for HttpStatsProbe {
    async fn probe(&self, ip: Ipv4Addr, port: u16) -> Result<Value, SelectorError> {
        get_json(&self.client, &Self::stats_url(ip, port)).await
    }
}
