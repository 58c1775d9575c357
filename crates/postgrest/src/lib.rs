//! PostgREST client for the salon data layer
//!
//! A small fluent query builder over the PostgREST HTTP API.
//!
//! # Features
//!
//! - Query API (`select` with embedded relations, `insert`)
//! - Filtering (`eq`, `gte`, `lte`, `ilike`, `in`, `or`, ...)
//! - Ordering and pagination (`order`, `limit`, `offset`, `range`)
//! - Exact row counts read from `Content-Range`

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::{Client, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use thiserror::Error;
use url::Url;

/// Error details returned by the PostgREST API
#[derive(Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PostgrestApiErrorDetails {
    pub code: Option<String>,
    pub message: Option<String>,
    pub details: Option<String>,
    pub hint: Option<String>,
}

impl fmt::Display for PostgrestApiErrorDetails {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(code) = &self.code {
            parts.push(format!("Code: {}", code));
        }
        if let Some(message) = &self.message {
            parts.push(format!("Message: {}", message));
        }
        if let Some(details) = &self.details {
            parts.push(format!("Details: {}", details));
        }
        if let Some(hint) = &self.hint {
            parts.push(format!("Hint: {}", hint));
        }
        write!(f, "{}", parts.join(", "))
    }
}

/// Error type
#[derive(Error, Debug)]
pub enum PostgrestError {
    #[error("API error: {details} (Status: {status})")]
    ApiError {
        details: PostgrestApiErrorDetails,
        status: StatusCode,
    },

    #[error("API error (unparsed): {message} (Status: {status})")]
    UnparsedApiError { message: String, status: StatusCode },

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("URL parse error: {0}")]
    UrlParseError(#[from] url::ParseError),

    #[error("JSON serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Deserialization error: {0}")]
    DeserializationError(String),
}

/// Sort direction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[serde(alias = "asc")]
    Ascending,
    #[serde(alias = "desc")]
    Descending,
}

impl SortOrder {
    fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Ascending => "asc",
            SortOrder::Descending => "desc",
        }
    }
}

/// Row counting strategy sent in the `Prefer` header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountMethod {
    Exact,
    Planned,
    Estimated,
}

impl CountMethod {
    fn as_str(&self) -> &'static str {
        match self {
            CountMethod::Exact => "exact",
            CountMethod::Planned => "planned",
            CountMethod::Estimated => "estimated",
        }
    }
}

/// Rows returned by a select together with the optional total count
#[derive(Debug, Clone, PartialEq)]
pub struct QueryResponse<T> {
    pub data: Vec<T>,
    pub count: Option<u64>,
}

/// PostgREST client bound to one table
#[derive(Debug, Clone)]
pub struct PostgrestClient {
    base_url: String,
    table: String,
    http_client: Client,
    headers: HeaderMap,
    query_params: Vec<(String, String)>,
    count: Option<CountMethod>,
}

impl PostgrestClient {
    /// Create a new PostgREST client for `table`
    pub fn new(base_url: &str, api_key: &str, table: &str, http_client: Client) -> Self {
        let mut headers = HeaderMap::new();
        if let Ok(value) = HeaderValue::from_str(api_key) {
            headers.insert("apikey", value);
        }
        if let Ok(value) = HeaderValue::from_str(&format!("Bearer {}", api_key)) {
            headers.insert(reqwest::header::AUTHORIZATION, value);
        }
        headers.insert("Content-Type", HeaderValue::from_static("application/json"));

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            table: table.to_string(),
            http_client,
            headers,
            query_params: Vec::new(),
            count: None,
        }
    }

    /// Add a header
    pub fn with_header(mut self, key: &str, value: &str) -> Result<Self, PostgrestError> {
        let header_value = HeaderValue::from_str(value).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header value: {}", value))
        })?;

        let header_name = HeaderName::from_bytes(key.as_bytes()).map_err(|_| {
            PostgrestError::InvalidParameters(format!("Invalid header name: {}", key))
        })?;

        self.headers.insert(header_name, header_value);
        Ok(self)
    }

    /// Set the user access token
    pub fn with_auth(self, token: &str) -> Result<Self, PostgrestError> {
        self.with_header("Authorization", &format!("Bearer {}", token))
    }

    /// Target a schema other than `public`
    pub fn schema(self, schema_name: &str) -> Result<Self, PostgrestError> {
        self.with_header("Accept-Profile", schema_name)?
            .with_header("Content-Profile", schema_name)
    }

    /// The table this client queries
    pub fn table(&self) -> &str {
        &self.table
    }

    /// Columns to select. Embedded relations use the `relation(columns)` form.
    ///
    /// Whitespace is stripped so multi-line select lists can be written inline.
    pub fn select(self, columns: &str) -> Self {
        let columns: String = columns.chars().filter(|c| !c.is_whitespace()).collect();
        self.set_param("select", &columns)
    }

    /// Equality filter
    pub fn eq(self, column: &str, value: &str) -> Self {
        self.filter(column, "eq", value)
    }

    /// Inequality filter
    pub fn neq(self, column: &str, value: &str) -> Self {
        self.filter(column, "neq", value)
    }

    /// Greater-than filter
    pub fn gt(self, column: &str, value: &str) -> Self {
        self.filter(column, "gt", value)
    }

    /// Greater-than-or-equal filter
    pub fn gte(self, column: &str, value: &str) -> Self {
        self.filter(column, "gte", value)
    }

    /// Less-than filter
    pub fn lt(self, column: &str, value: &str) -> Self {
        self.filter(column, "lt", value)
    }

    /// Less-than-or-equal filter
    pub fn lte(self, column: &str, value: &str) -> Self {
        self.filter(column, "lte", value)
    }

    /// LIKE filter
    pub fn like(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "like", pattern)
    }

    /// ILIKE filter (case-insensitive)
    pub fn ilike(self, column: &str, pattern: &str) -> Self {
        self.filter(column, "ilike", pattern)
    }

    /// IS filter (`null`, `true`, `false`)
    pub fn is(self, column: &str, value: &str) -> Self {
        self.filter(column, "is", value)
    }

    /// IN filter
    pub fn in_list<S: AsRef<str>>(self, column: &str, values: &[S]) -> Self {
        let value_list = values
            .iter()
            .map(|v| quote_value(v.as_ref()))
            .collect::<Vec<_>>()
            .join(",");
        self.filter(column, "in", &format!("({})", value_list))
    }

    /// Disjunction of raw PostgREST filters, e.g. `name.ilike.%a%,email.ilike.%a%`
    pub fn or(mut self, filters: &str) -> Self {
        self.query_params.push(("or".to_string(), format!("({})", filters)));
        self
    }

    /// NOT filter
    pub fn not(self, column: &str, operator_with_value: &str) -> Self {
        self.filter(column, "not", operator_with_value)
    }

    /// Sort order
    pub fn order(self, column: &str, order: SortOrder) -> Self {
        self.set_param("order", &format!("{}.{}", column, order.as_str()))
    }

    /// Row limit
    pub fn limit(self, count: u64) -> Self {
        self.set_param("limit", &count.to_string())
    }

    /// Row offset
    pub fn offset(self, count: u64) -> Self {
        self.set_param("offset", &count.to_string())
    }

    /// Inclusive row range `from..=to`
    pub fn range(self, from: u64, to: u64) -> Self {
        let limit = to.saturating_sub(from) + 1;
        self.offset(from).limit(limit)
    }

    /// Request a total row count alongside the data
    pub fn count(mut self, method: CountMethod) -> Self {
        self.count = Some(method);
        self
    }

    /// Current query parameters in insertion order
    pub fn query_params(&self) -> &[(String, String)] {
        &self.query_params
    }

    fn filter(mut self, column: &str, operator: &str, value: &str) -> Self {
        self.query_params
            .push((column.to_string(), format!("{}.{}", operator, value)));
        self
    }

    fn set_param(mut self, key: &str, value: &str) -> Self {
        self.query_params.retain(|(k, _)| k != key);
        self.query_params.push((key.to_string(), value.to_string()));
        self
    }

    /// Fetch rows
    pub async fn execute<T: for<'de> Deserialize<'de>>(&self) -> Result<Vec<T>, PostgrestError> {
        Ok(self.execute_with_count::<T>().await?.data)
    }

    /// Fetch at most one row
    pub async fn execute_one<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<Option<T>, PostgrestError> {
        let rows = self.clone().limit(1).execute::<T>().await?;
        Ok(rows.into_iter().next())
    }

    /// Fetch rows and the total count reported in `Content-Range`
    pub async fn execute_with_count<T: for<'de> Deserialize<'de>>(
        &self,
    ) -> Result<QueryResponse<T>, PostgrestError> {
        let url = self.build_url()?;
        log::debug!("GET {}", url);

        let mut headers = self.headers.clone();
        if let Some(method) = self.count {
            if let Ok(value) = HeaderValue::from_str(&format!("count={}", method.as_str())) {
                headers.insert(HeaderName::from_static("prefer"), value);
            }
        }

        let response = self
            .http_client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .map_err(PostgrestError::NetworkError)?;

        let response = check_status(response).await?;

        let count = response
            .headers()
            .get(reqwest::header::CONTENT_RANGE)
            .and_then(|value| value.to_str().ok())
            .and_then(parse_content_range_total);

        let data = response
            .json::<Vec<T>>()
            .await
            .map_err(|e| PostgrestError::DeserializationError(e.to_string()))?;

        Ok(QueryResponse { data, count })
    }

    /// Insert rows and return the inserted representation
    pub async fn insert<T: Serialize>(&self, values: T) -> Result<Value, PostgrestError> {
        let url = self.build_url()?;
        log::debug!("POST {}", url);

        let mut headers = self.headers.clone();
        headers.insert(
            HeaderName::from_static("prefer"),
            HeaderValue::from_static("return=representation"),
        );

        let response = self
            .http_client
            .post(&url)
            .headers(headers)
            .json(&values)
            .send()
            .await
            .map_err(PostgrestError::NetworkError)?;

        let response = check_status(response).await?;

        let body_text = response.text().await.map_err(|e| {
            PostgrestError::DeserializationError(format!("Failed to read response body: {}", e))
        })?;

        if body_text.trim().is_empty() {
            Ok(Value::Null)
        } else {
            serde_json::from_str::<Value>(&body_text)
                .map_err(|e| PostgrestError::DeserializationError(e.to_string()))
        }
    }

    fn build_url(&self) -> Result<String, PostgrestError> {
        let mut url = Url::parse(&format!("{}/rest/v1/{}", self.base_url, self.table))?;

        for (key, value) in &self.query_params {
            url.query_pairs_mut().append_pair(key, value);
        }

        Ok(url.to_string())
    }
}

async fn check_status(response: Response) -> Result<Response, PostgrestError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Failed to read error response".to_string());
    log::warn!("PostgREST request failed with {}: {}", status, error_text);

    match serde_json::from_str::<PostgrestApiErrorDetails>(&error_text) {
        Ok(details) => Err(PostgrestError::ApiError { details, status }),
        Err(_) => Err(PostgrestError::UnparsedApiError {
            message: error_text,
            status,
        }),
    }
}

/// Parse the total from a `Content-Range` header such as `0-24/312` or `*/0`
pub fn parse_content_range_total(value: &str) -> Option<u64> {
    let (_, total) = value.split_once('/')?;
    total.trim().parse().ok()
}

/// Characters that end or nest a value inside `in.(...)` and `or=(...)` lists
pub const RESERVED_CHARS: &[char] = &[',', '.', ':', '(', ')', '"', ' ', '\\'];

/// Double-quote a list value containing [`RESERVED_CHARS`], escaping `\` and `"`
pub fn quote_value(value: &str) -> String {
    if value.contains(RESERVED_CHARS) {
        format!(
            "\"{}\"",
            value.replace('\\', "\\\\").replace('"', "\\\"")
        )
    } else {
        value.to_string()
    }
}
