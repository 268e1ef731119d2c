//! REST table client.
//!
//! Uses `reqwest` 0.13 for HTTP. Catalog lists are cached using `moka`
//! (5-minute TTL).

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument};

use crate::config::BackendConfig;

use super::cache::{CacheKey, CacheValue};
use super::query::{Filter, FilterOp, Order, QueryParams};
use super::{ApiError, BackendError, Table};

const PREFER_REPRESENTATION: &str = "return=representation";
const PREFER_MERGE: &str = "resolution=merge-duplicates,return=representation";
const PREFER_MINIMAL: &str = "return=minimal";

// =============================================================================
// BackendClient
// =============================================================================

/// Client for the backend REST and auth interfaces.
///
/// Cheap to clone; all clones share one connection pool and one cache.
#[derive(Clone)]
pub struct BackendClient {
    inner: Arc<BackendClientInner>,
}

struct BackendClientInner {
    client: reqwest::Client,
    rest_url: String,
    auth_url: String,
    anon_key: String,
    service_key: Option<SecretString>,
    cache: Cache<CacheKey, CacheValue>,
}

/// Which key a request is authorized with.
#[derive(Clone, Default)]
pub enum Credential {
    /// Public anon key; row policies apply as an anonymous visitor.
    #[default]
    Anon,
    /// A signed-in user's access token; row policies apply as that user.
    User(String),
    /// Service-role key; bypasses row policies.
    Service,
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anon => f.write_str("Anon"),
            Self::User(_) => f.write_str("User([REDACTED])"),
            Self::Service => f.write_str("Service"),
        }
    }
}

impl BackendClient {
    /// Create a new backend client.
    #[must_use]
    pub fn new(config: &BackendConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(Duration::from_secs(300)) // 5 minutes
            .build();

        Self {
            inner: Arc::new(BackendClientInner {
                client: reqwest::Client::new(),
                rest_url: format!("{}/rest/v1", config.url),
                auth_url: format!("{}/auth/v1", config.url),
                anon_key: config.anon_key.clone(),
                service_key: config.service_key.clone(),
                cache,
            }),
        }
    }

    /// Start a query against `table`.
    pub const fn from(&self, table: Table) -> TableQuery<'_> {
        TableQuery {
            client: self,
            table,
            params: QueryParams {
                select: None,
                filters: Vec::new(),
                order: Vec::new(),
                limit: None,
                on_conflict: None,
            },
            credential: Credential::Anon,
        }
    }

    /// Whether a service-role key is configured.
    #[must_use]
    pub fn has_service_key(&self) -> bool {
        self.inner.service_key.is_some()
    }

    pub(super) fn http(&self) -> &reqwest::Client {
        &self.inner.client
    }

    pub(super) fn auth_url(&self) -> &str {
        &self.inner.auth_url
    }

    /// Attach the `apikey` and bearer headers for `credential`.
    pub(super) fn authorize(
        &self,
        request: RequestBuilder,
        credential: &Credential,
    ) -> Result<RequestBuilder, BackendError> {
        let anon = self.inner.anon_key.as_str();
        let (apikey, bearer) = match credential {
            Credential::Anon => (anon, anon),
            Credential::User(token) => (anon, token.as_str()),
            Credential::Service => {
                let key = self
                    .inner
                    .service_key
                    .as_ref()
                    .ok_or(BackendError::MissingServiceKey)?
                    .expose_secret();
                (key, key)
            }
        };
        Ok(request.header("apikey", apikey).bearer_auth(bearer))
    }

    /// Turn a response into its body text, mapping error statuses.
    pub(super) async fn read_response(
        context: &str,
        response: reqwest::Response,
    ) -> Result<String, BackendError> {
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(BackendError::RateLimited(retry_after));
        }

        let text = response.text().await?;

        if status.is_success() {
            return Ok(text);
        }

        let error = ApiError::from_body(&text);

        if status == StatusCode::NOT_FOUND {
            tracing::error!(context, error = %error.summary(), "Backend resource not found");
            return Err(BackendError::NotFound(context.to_string()));
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            tracing::warn!(status = %status, context, error = %error.summary(), "Backend rejected credentials");
            return Err(BackendError::Unauthorized(error.summary()));
        }

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                context,
                body = %text.chars().take(500).collect::<String>(),
                "Backend returned server error"
            );
        } else {
            tracing::warn!(status = %status, context, error = %error.summary(), "Backend rejected request");
        }

        Err(BackendError::Api {
            status: status.as_u16(),
            error,
        })
    }

    // =========================================================================
    // Cache
    // =========================================================================

    /// Look up a cached catalog list.
    pub async fn cached(&self, key: CacheKey) -> Option<CacheValue> {
        let value = self.inner.cache.get(&key).await;
        if value.is_some() {
            debug!(?key, "Cache hit");
        }
        value
    }

    /// Store a catalog list.
    pub async fn store(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// Drop a cached list after a write that changes it.
    pub async fn invalidate(&self, key: CacheKey) {
        self.inner.cache.invalidate(&key).await;
    }

    // =========================================================================
    // Health
    // =========================================================================

    /// Check that the backend answers.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend is unreachable or unhealthy.
    #[instrument(skip(self))]
    pub async fn health(&self) -> Result<(), BackendError> {
        let request = self
            .inner
            .client
            .get(format!("{}/health", self.inner.auth_url))
            .header("apikey", &self.inner.anon_key);
        let response = request.send().await?;
        Self::read_response("health", response).await.map(|_| ())
    }
}

// =============================================================================
// TableQuery
// =============================================================================

/// Builder for a single table request.
///
/// Filters, ordering and limits accumulate until a terminal operation
/// (`fetch`, `insert`, `upsert`, `update`, `delete`) sends the request.
#[must_use]
#[derive(Debug)]
pub struct TableQuery<'a> {
    client: &'a BackendClient,
    table: Table,
    params: QueryParams,
    credential: Credential,
}

impl std::fmt::Debug for BackendClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendClient")
            .field("rest_url", &self.inner.rest_url)
            .field("auth_url", &self.inner.auth_url)
            .finish_non_exhaustive()
    }
}

impl TableQuery<'_> {
    /// Columns to return, including embedded relations.
    pub fn select(mut self, columns: &str) -> Self {
        self.params.select = Some(columns.to_string());
        self
    }

    /// Add a row filter.
    pub fn filter(mut self, column: &str, op: FilterOp, value: impl ToString) -> Self {
        self.params.filters.push(Filter::new(column, op, value));
        self
    }

    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Eq, value)
    }

    pub fn neq(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Neq, value)
    }

    pub fn gt(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Gt, value)
    }

    pub fn gte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Gte, value)
    }

    pub fn lt(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Lt, value)
    }

    pub fn lte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, FilterOp::Lte, value)
    }

    /// Case-insensitive pattern match; `*` is the wildcard.
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, FilterOp::Ilike, pattern)
    }

    pub fn is_null(self, column: &str) -> Self {
        self.filter(column, FilterOp::Is, "null")
    }

    /// Add a sort key. Keys apply in the order they are added.
    pub fn order(mut self, column: &str, direction: Order) -> Self {
        self.params.order.push((column.to_string(), direction));
        self
    }

    pub const fn limit(mut self, limit: usize) -> Self {
        self.params.limit = Some(limit);
        self
    }

    /// Authorize as a signed-in user.
    pub fn as_user(mut self, access_token: &str) -> Self {
        self.credential = Credential::User(access_token.to_string());
        self
    }

    /// Authorize with the service-role key.
    pub fn as_service(mut self) -> Self {
        self.credential = Credential::Service;
        self
    }

    pub fn with_credential(mut self, credential: &Credential) -> Self {
        self.credential = credential.clone();
        self
    }

    /// Full request URL including the query string.
    #[must_use]
    pub fn url(&self) -> String {
        let query = self.params.render();
        if query.is_empty() {
            format!("{}/{}", self.client.inner.rest_url, self.table)
        } else {
            format!("{}/{}?{query}", self.client.inner.rest_url, self.table)
        }
    }

    fn request(&self, method: Method) -> Result<RequestBuilder, BackendError> {
        let request = self.client.http().request(method, self.url());
        self.client.authorize(request, &self.credential)
    }

    async fn execute(&self, request: RequestBuilder) -> Result<String, BackendError> {
        let response = request.send().await?;
        BackendClient::read_response(self.table.as_str(), response).await
    }

    fn parse_rows<T: DeserializeOwned>(&self, body: &str) -> Result<Vec<T>, BackendError> {
        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                table = %self.table,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse backend rows"
            );
            BackendError::Parse(e)
        })
    }

    fn first_row<T: DeserializeOwned>(&self, body: &str) -> Result<T, BackendError> {
        self.parse_rows(body)?
            .into_iter()
            .next()
            .ok_or_else(|| BackendError::EmptyResponse(self.table.to_string()))
    }

    fn require_filters(&self, operation: &'static str) -> Result<(), BackendError> {
        if self.params.filters.is_empty() {
            return Err(BackendError::UnfilteredMutation(operation, self.table));
        }
        Ok(())
    }

    // =========================================================================
    // Terminal operations
    // =========================================================================

    /// Read all matching rows.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the rows don't decode as `T`.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn fetch<T: DeserializeOwned>(self) -> Result<Vec<T>, BackendError> {
        let body = self.execute(self.request(Method::GET)?).await?;
        self.parse_rows(&body)
    }

    /// Read zero or one row.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the row doesn't decode as `T`.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn fetch_optional<T: DeserializeOwned>(mut self) -> Result<Option<T>, BackendError> {
        self.params.limit = Some(1);
        let body = self.execute(self.request(Method::GET)?).await?;
        Ok(self.parse_rows(&body)?.into_iter().next())
    }

    /// Insert one row and return it as stored.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the row (see
    /// [`BackendError::is_unique_violation`]) or returns no representation.
    #[instrument(skip(self, body), fields(table = %self.table))]
    pub async fn insert<B, T>(self, body: &B) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self
            .request(Method::POST)?
            .header("Prefer", PREFER_REPRESENTATION)
            .json(body);
        let body = self.execute(request).await?;
        self.first_row(&body)
    }

    /// Insert one row without reading it back, for tables the caller may
    /// write but not select (e.g. anonymous newsletter sign-ups).
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the row.
    #[instrument(skip(self, body), fields(table = %self.table))]
    pub async fn insert_minimal<B>(self, body: &B) -> Result<(), BackendError>
    where
        B: Serialize + ?Sized,
    {
        let request = self
            .request(Method::POST)?
            .header("Prefer", PREFER_MINIMAL)
            .json(body);
        self.execute(request).await.map(|_| ())
    }

    /// Insert one row, merging into the existing row on an `on_conflict` match.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend rejects the row or returns no
    /// representation.
    #[instrument(skip(self, body), fields(table = %self.table))]
    pub async fn upsert<B, T>(mut self, body: &B, on_conflict: &str) -> Result<T, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.params.on_conflict = Some(on_conflict.to_string());
        let request = self
            .request(Method::POST)?
            .header("Prefer", PREFER_MERGE)
            .json(body);
        let body = self.execute(request).await?;
        self.first_row(&body)
    }

    /// Update every matching row and return the updated rows.
    ///
    /// An empty result means no row matched the filters.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::UnfilteredMutation`] when no filter is set,
    /// otherwise any request error.
    #[instrument(skip(self, body), fields(table = %self.table))]
    pub async fn update<B, T>(self, body: &B) -> Result<Vec<T>, BackendError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.require_filters("update")?;
        let request = self
            .request(Method::PATCH)?
            .header("Prefer", PREFER_REPRESENTATION)
            .json(body);
        let body = self.execute(request).await?;
        self.parse_rows(&body)
    }

    /// Delete every matching row.
    ///
    /// # Errors
    ///
    /// Returns [`BackendError::UnfilteredMutation`] when no filter is set,
    /// otherwise any request error.
    #[instrument(skip(self), fields(table = %self.table))]
    pub async fn delete(self) -> Result<(), BackendError> {
        self.require_filters("delete")?;
        let request = self
            .request(Method::DELETE)?
            .header("Prefer", PREFER_MINIMAL);
        self.execute(request).await.map(|_| ())
    }
}
