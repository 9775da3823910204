// SPDX-FileCopyrightText: The cratedigger authors
// SPDX-License-Identifier: MPL-2.0

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{CRATE_KIND_SMART, Crate, CrateDraft, CrateId, Criteria, Error, Result, TrackSummary};

const USER_AGENT: &str = concat!("cratedigger/", env!("CARGO_PKG_VERSION"));

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Backend operations consumed by the builder session and the crate store.
///
/// Implemented by [`LibraryClient`] against the REST surface of the
/// music-library server. Test code substitutes an in-memory fake.
#[expect(
    async_fn_in_trait,
    reason = "Hosts are single-threaded, futures need not be Send."
)]
pub trait Backend {
    /// Lists all crates with their backend-computed track counts.
    async fn list_crates(&self) -> Result<Vec<Crate>>;

    /// Lists the tracks currently matching a crate.
    async fn crate_tracks(&self, id: &CrateId) -> Result<Vec<TrackSummary>>;

    /// Counts the tracks matching `criteria` without materializing anything.
    async fn preview_count(&self, criteria: &Criteria) -> Result<u64>;

    /// Creates a new smart crate. The backend assigns the identifier.
    async fn create_crate(&self, draft: &CrateDraft) -> Result<Crate>;

    /// Overwrites the crate identified by `id`.
    async fn update_crate(&self, id: &CrateId, draft: &CrateDraft) -> Result<Crate>;

    /// Re-evaluates a smart crate's membership on the backend.
    async fn refresh_crate(&self, id: &CrateId) -> Result<()>;

    /// Deletes a crate from the backend's store.
    async fn delete_crate(&self, id: &CrateId) -> Result<()>;
}

/// REST client for the music-library server.
#[derive(Debug, Clone)]
pub struct LibraryClient {
    http: reqwest::Client,
    base_url: String,
}

impl LibraryClient {
    /// Creates a client for the server at `base_url`.
    ///
    /// Trailing slashes are trimmed so endpoint paths can be appended
    /// verbatim.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self { http, base_url })
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

/// Request body of `POST /crates` and `PUT /crates/{id}`.
#[derive(Debug, Serialize)]
struct CrateBody<'a> {
    name: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<&'a str>,
    #[serde(rename = "type")]
    kind: &'static str,
    is_smart: bool,
    color: &'a str,
    icon: &'a str,
    criteria: &'a Criteria,
}

impl<'a> From<&'a CrateDraft> for CrateBody<'a> {
    fn from(draft: &'a CrateDraft) -> Self {
        let CrateDraft {
            name,
            description,
            color,
            icon,
            criteria,
        } = draft;
        Self {
            name,
            description: description.as_deref(),
            kind: CRATE_KIND_SMART,
            is_smart: true,
            color,
            icon,
            criteria,
        }
    }
}

/// Request body of `POST /crates/preview`.
#[derive(Debug, Serialize)]
struct PreviewBody<'a> {
    criteria: &'a Criteria,
}

/// Response body of `POST /crates/preview`.
#[derive(Debug, Deserialize)]
struct PreviewResponse {
    count: u64,
}

/// Maps a non-success status to [`Error::Api`] with the response text as
/// the message.
async fn check(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    Err(Error::Api {
        status: status.as_u16(),
        message,
    })
}

impl Backend for LibraryClient {
    async fn list_crates(&self) -> Result<Vec<Crate>> {
        let url = format!("{base}/crates", base = self.base_url);
        log::debug!("Listing crates: GET {url}");
        let response = self.http.get(&url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn crate_tracks(&self, id: &CrateId) -> Result<Vec<TrackSummary>> {
        let url = format!("{base}/crates/{id}/tracks", base = self.base_url);
        log::debug!("Fetching crate tracks: GET {url}");
        let response = self.http.get(&url).send().await?;
        Ok(check(response).await?.json().await?)
    }

    async fn preview_count(&self, criteria: &Criteria) -> Result<u64> {
        let url = format!("{base}/crates/preview", base = self.base_url);
        log::debug!(
            "Previewing count of {rule_count} rule(s): POST {url}",
            rule_count = criteria.rules.len()
        );
        let response = self
            .http
            .post(&url)
            .json(&PreviewBody { criteria })
            .send()
            .await?;
        let PreviewResponse { count } = check(response).await?.json().await?;
        Ok(count)
    }

    async fn create_crate(&self, draft: &CrateDraft) -> Result<Crate> {
        let url = format!("{base}/crates", base = self.base_url);
        log::debug!("Creating crate \"{name}\": POST {url}", name = draft.name);
        let response = self
            .http
            .post(&url)
            .json(&CrateBody::from(draft))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn update_crate(&self, id: &CrateId, draft: &CrateDraft) -> Result<Crate> {
        let url = format!("{base}/crates/{id}", base = self.base_url);
        log::debug!("Updating crate {id}: PUT {url}");
        let response = self
            .http
            .put(&url)
            .json(&CrateBody::from(draft))
            .send()
            .await?;
        Ok(check(response).await?.json().await?)
    }

    async fn refresh_crate(&self, id: &CrateId) -> Result<()> {
        let url = format!("{base}/crates/{id}/refresh", base = self.base_url);
        log::debug!("Refreshing crate {id}: POST {url}");
        let response = self.http.post(&url).send().await?;
        check(response).await?;
        Ok(())
    }

    async fn delete_crate(&self, id: &CrateId) -> Result<()> {
        let url = format!("{base}/crates/{id}", base = self.base_url);
        log::debug!("Deleting crate {id}: DELETE {url}");
        let response = self.http.delete(&url).send().await?;
        check(response).await?;
        Ok(())
    }
}
