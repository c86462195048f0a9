use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{ReportError, Result};
use crate::models::{ApiErrorEnvelope, CrimeRecord, CrimesResponse, Member, MembersResponse};

pub const CRIME_PAGE_SIZE: usize = 100;

#[async_trait]
pub trait FactionApi: Send + Sync {
    async fn fetch_members(&self) -> Result<Vec<Member>>;

    async fn fetch_crimes_page(&self, offset: usize, limit: usize) -> Result<Vec<CrimeRecord>>;
}

/// Collects every completed crime, one page at a time.
///
/// A page shorter than [`CRIME_PAGE_SIZE`] ends the walk. Any failing page
/// discards what was gathered so far.
pub async fn fetch_all_crimes<A>(api: &A) -> Result<Vec<CrimeRecord>>
where
    A: FactionApi + ?Sized,
{
    let mut offset = 0usize;
    let mut all = Vec::new();

    loop {
        let page = api.fetch_crimes_page(offset, CRIME_PAGE_SIZE).await?;
        let received = page.len();
        let last = page.last();
        debug!(
            offset,
            received,
            last_id = last.map(|crime| crime.id),
            last_name = last.map(|crime| crime.name.as_str()),
            "fetched crime page"
        );
        all.extend(page);
        if received < CRIME_PAGE_SIZE {
            break;
        }
        offset += CRIME_PAGE_SIZE;
    }

    Ok(all)
}

#[derive(Debug, Clone)]
pub struct TornClient {
    http: Client,
    base_url: String,
    api_key: String,
}

impl TornClient {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    fn endpoint(&self, path: &str, query: &[(&str, String)]) -> Result<Url> {
        let mut url = Url::parse(&format!("{}/{}", self.base_url, path))
            .map_err(|err| ReportError::config(format!("invalid base URL {}: {err}", self.base_url)))?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("key", &self.api_key);
            for (name, value) in query {
                pairs.append_pair(name, value);
            }
        }
        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url, what: &'static str) -> Result<T> {
        let response = self.http.get(url).send().await?;
        let status = response.status();
        let body = response.text().await?;
        classify_response(status, body, what)
    }
}

/// Turns a status and body into either the decoded payload or an error. The
/// API reports some failures as a 2xx carrying an `error` object.
fn classify_response<T: DeserializeOwned>(
    status: StatusCode,
    body: String,
    what: &'static str,
) -> Result<T> {
    if !status.is_success() {
        return Err(ReportError::Remote {
            status: status.as_u16(),
            body,
        });
    }
    if let Ok(envelope) = serde_json::from_str::<ApiErrorEnvelope>(&body) {
        debug!(code = envelope.error.code, message = %envelope.error.error, "api reported an error");
        return Err(ReportError::Remote {
            status: status.as_u16(),
            body,
        });
    }

    serde_json::from_str(&body).map_err(|source| ReportError::Decode { what, source })
}

#[async_trait]
impl FactionApi for TornClient {
    async fn fetch_members(&self) -> Result<Vec<Member>> {
        let url = self.endpoint("faction/members", &[])?;
        let response: MembersResponse = self.get_json(url, "faction members").await?;
        Ok(response.members)
    }

    async fn fetch_crimes_page(&self, offset: usize, limit: usize) -> Result<Vec<CrimeRecord>> {
        let url = self.endpoint(
            "faction/crimes",
            &[
                ("cat", "completed".to_string()),
                ("offset", offset.to_string()),
                ("limit", limit.to_string()),
            ],
        )?;
        let response: CrimesResponse = self.get_json(url, "faction crimes").await?;
        Ok(response.crimes)
    }
}
