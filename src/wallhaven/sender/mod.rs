use std::time::Duration;

use anyhow::{Context, Error};
use reqwest::blocking::{Client, RequestBuilder};

use crate::wallhaven::io::Config;
use crate::wallhaven::sender::entries::{CollectionsResponse, ImagesResponse};

pub(crate) mod entries;

/// Base URL for all wallhaven API endpoints.
const API_BASE: &str = "https://wallhaven.cc/api/v1";

/// The sender used for all API calls.
///
/// Cheap to clone; every clone shares the underlying connection pool.
#[derive(Clone)]
pub(crate) struct RequestSender {
    client: Client,
}

impl RequestSender {
    pub(crate) fn new() -> Self {
        let client = Client::builder()
            .user_agent(concat!(
                env!("CARGO_PKG_NAME"),
                "/",
                env!("CARGO_PKG_VERSION")
            ))
            .timeout(Duration::from_secs(30))
            .build()
            .unwrap_or_else(|_| Client::new());

        RequestSender { client }
    }

    /// Searches for images matching `query`, returning one page of results.
    pub(crate) fn search(&self, query: &str, page: u32) -> Result<ImagesResponse, Error> {
        let page_value = page.to_string();
        let request = self
            .client
            .get(format!("{API_BASE}/search"))
            .query(&[("q", query), ("page", page_value.as_str())]);

        self.send_json(request)
            .with_context(|| format!("search request for \"{query}\" (page {page}) failed"))
    }

    /// Lists every collection belonging to `username`.
    pub(crate) fn collections(&self, username: &str) -> Result<CollectionsResponse, Error> {
        let request = self.client.get(format!("{API_BASE}/collections/{username}"));

        self.send_json(request)
            .with_context(|| format!("collection listing for \"{username}\" failed"))
    }

    /// Returns one page of the images inside a user's collection.
    pub(crate) fn collection(
        &self,
        username: &str,
        id: u32,
        page: u32,
    ) -> Result<ImagesResponse, Error> {
        let request = self
            .client
            .get(format!("{API_BASE}/collections/{username}/{id}"))
            .query(&[("page", &page.to_string())]);

        self.send_json(request)
            .with_context(|| format!("collection {id} of \"{username}\" (page {page}) failed"))
    }

    /// Fetches the raw bytes behind an image URL.
    ///
    /// The transport error is preserved so callers can distinguish fetch
    /// failures from local I/O failures.
    pub(crate) fn get_bytes(&self, url: &str) -> Result<Vec<u8>, reqwest::Error> {
        let response = self.client.get(url).send()?.error_for_status()?;
        Ok(response.bytes()?.to_vec())
    }

    fn send_json<T: serde::de::DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, Error> {
        let request = match Config::get().api_key() {
            Some(key) => request.header("X-API-Key", key),
            None => request,
        };

        let response = request.send()?.error_for_status()?;
        Ok(response.json()?)
    }
}
