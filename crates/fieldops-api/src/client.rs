// Async HTTP client for the field-service REST backend.
//
// Every collection follows the same shape:
//   GET    /<collection>?page=&limit=&search=&<filter>=   → { data, pagination }
//   GET    /<collection>/:id                               → entity | { data }
//   POST   /<collection>                                   → entity
//   PATCH  /<collection>/:id  (or PUT)                     → entity
//   DELETE /<collection>/:id                               → empty | entity
// Non-2xx responses carry `{ message }`.

use reqwest::StatusCode;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::error::Error;
use crate::transport::TransportConfig;
use crate::types::{ErrorBody, ListParams, MaybeWrapped, Page};

/// HTTP verb used for updates. Most collections take `PATCH`; a few
/// legacy handlers only accept a full `PUT`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UpdateMethod {
    #[default]
    Patch,
    Put,
}

/// Async client for the REST backend.
#[derive(Debug, Clone)]
pub struct RestClient {
    http: reqwest::Client,
    base_url: Url,
}

impl RestClient {
    // ── Constructors ─────────────────────────────────────────────────

    /// Build from a base URL and transport config.
    pub fn new(base_url: &str, transport: &TransportConfig) -> Result<Self, Error> {
        let http = transport.build_client()?;
        Self::from_reqwest(base_url, http)
    }

    /// Wrap an existing `reqwest::Client` (caller manages default headers).
    pub fn from_reqwest(base_url: &str, http: reqwest::Client) -> Result<Self, Error> {
        let base_url = Self::normalize_base_url(base_url)?;
        Ok(Self { http, base_url })
    }

    /// The API root every collection path is joined onto.
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Ensure the base path ends with `/` so relative joins append instead
    /// of replacing the last segment.
    fn normalize_base_url(raw: &str) -> Result<Url, Error> {
        let mut url = Url::parse(raw)?;
        let path = url.path().trim_end_matches('/').to_owned();
        url.set_path(&format!("{path}/"));
        url.set_query(None);
        Ok(url)
    }

    // ── URL builder ──────────────────────────────────────────────────

    fn url(&self, path: &str) -> Result<Url, Error> {
        Ok(self.base_url.join(path.trim_start_matches('/'))?)
    }

    fn item_path(collection: &str, id: &str) -> String {
        format!("{}/{}", collection.trim_matches('/'), id)
    }

    fn request(&self, method: reqwest::Method, url: Url) -> reqwest::RequestBuilder {
        self.http
            .request(method, url)
            .header("X-Request-Id", uuid::Uuid::new_v4().to_string())
    }

    // ── Response handling ────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(resp: reqwest::Response) -> Result<T, Error> {
        let status = resp.status();
        if status.is_success() {
            let body = resp.text().await?;
            serde_json::from_str(&body).map_err(|e| {
                let preview: String = body.chars().take(200).collect();
                Error::Deserialization {
                    message: format!("{e} (body preview: {preview:?})"),
                    body,
                }
            })
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn handle_empty(resp: reqwest::Response) -> Result<(), Error> {
        let status = resp.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(Self::parse_error(status, resp).await)
        }
    }

    async fn parse_error(status: StatusCode, resp: reqwest::Response) -> Error {
        let raw = resp.text().await.unwrap_or_default();
        let body_message = serde_json::from_str::<ErrorBody>(&raw)
            .ok()
            .and_then(ErrorBody::into_message);

        if status == StatusCode::UNAUTHORIZED {
            return Error::Unauthorized {
                message: body_message.unwrap_or_else(|| status.to_string()),
            };
        }

        if status == StatusCode::NOT_FOUND {
            return Error::NotFound {
                from_body: body_message.is_some(),
                message: body_message.unwrap_or_else(|| status.to_string()),
            };
        }

        match body_message {
            Some(message) => Error::Api {
                status: status.as_u16(),
                message,
                from_body: true,
            },
            None => Error::Api {
                status: status.as_u16(),
                message: status.to_string(),
                from_body: false,
            },
        }
    }

    // ━━ Public API ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

    /// `GET /<collection>` with paging, search and filters.
    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        params: &ListParams,
    ) -> Result<Page<T>, Error> {
        let url = self.url(collection)?;
        let query = params.to_query();
        debug!("GET {url} params={query:?}");

        let resp = self
            .request(reqwest::Method::GET, url)
            .query(&query)
            .send()
            .await?;
        Self::handle_response(resp).await
    }

    /// `GET /<collection>/:id`.
    pub async fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T, Error> {
        let url = self.url(&Self::item_path(collection, id))?;
        debug!("GET {url}");

        let resp = self.request(reqwest::Method::GET, url).send().await?;
        Self::handle_response::<MaybeWrapped<T>>(resp)
            .await
            .map(MaybeWrapped::into_inner)
    }

    /// `POST /<collection>`.
    pub async fn create<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        collection: &str,
        body: &B,
    ) -> Result<T, Error> {
        let url = self.url(collection)?;
        debug!("POST {url}");

        let resp = self
            .request(reqwest::Method::POST, url)
            .json(body)
            .send()
            .await?;
        Self::handle_response::<MaybeWrapped<T>>(resp)
            .await
            .map(MaybeWrapped::into_inner)
    }

    /// `PATCH` or `PUT /<collection>/:id`.
    pub async fn update<T: DeserializeOwned, B: Serialize + Sync>(
        &self,
        collection: &str,
        id: &str,
        body: &B,
        method: UpdateMethod,
    ) -> Result<T, Error> {
        let url = self.url(&Self::item_path(collection, id))?;
        let verb = match method {
            UpdateMethod::Patch => reqwest::Method::PATCH,
            UpdateMethod::Put => reqwest::Method::PUT,
        };
        debug!("{verb} {url}");

        let resp = self.request(verb, url).json(body).send().await?;
        Self::handle_response::<MaybeWrapped<T>>(resp)
            .await
            .map(MaybeWrapped::into_inner)
    }

    /// `DELETE /<collection>/:id`. Any 2xx body is ignored.
    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), Error> {
        let url = self.url(&Self::item_path(collection, id))?;
        debug!("DELETE {url}");

        let resp = self.request(reqwest::Method::DELETE, url).send().await?;
        Self::handle_empty(resp).await
    }
}
