//! Fetch sources backed by the results server's JSON endpoints.

use reqwest::{Client, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    Error,
    config::ServiceConfig,
    details::{CategoryTotal, DetailsKey},
    fetch::{Fetch, FetchError},
    transactions::{TransactionRecord, TransactionsKey},
};

/// Fetches the breakdown of a period from `GET {base}/details`.
#[derive(Debug, Clone)]
pub struct HttpDetailsSource {
    client: Client,
    endpoint: Url,
}

impl HttpDetailsSource {
    /// # Errors
    /// Returns [Error::InvalidUrl] if the base URL and path do not form a
    /// valid URL and [Error::HttpClient] if the client cannot be built.
    pub fn new(config: &ServiceConfig) -> Result<Self, Error> {
        Ok(Self {
            client: build_client()?,
            endpoint: endpoint(&config.base_url, &config.details_path)?,
        })
    }
}

#[derive(Serialize)]
struct DetailsQuery<'a> {
    period: &'a str,
    breakdown_style: &'a str,
}

impl Fetch for HttpDetailsSource {
    type Key = DetailsKey;
    type Record = CategoryTotal;

    fn fetch(
        &self,
        key: DetailsKey,
    ) -> impl Future<Output = Result<Option<Vec<CategoryTotal>>, FetchError>> {
        let url = with_query(
            &self.endpoint,
            &DetailsQuery {
                period: key.period.as_str(),
                breakdown_style: key.style.as_str(),
            },
        );

        async move { get_json(&self.client, url?).await }
    }
}

/// Fetches the transactions behind a breakdown row from `GET {base}/transactions`.
#[derive(Debug, Clone)]
pub struct HttpTransactionsSource {
    client: Client,
    endpoint: Url,
}

impl HttpTransactionsSource {
    /// # Errors
    /// Returns [Error::InvalidUrl] if the base URL and path do not form a
    /// valid URL and [Error::HttpClient] if the client cannot be built.
    pub fn new(config: &ServiceConfig) -> Result<Self, Error> {
        Ok(Self {
            client: build_client()?,
            endpoint: endpoint(&config.base_url, &config.transactions_path)?,
        })
    }
}

#[derive(Serialize)]
struct TransactionsQuery<'a> {
    period: &'a str,
    label: &'a str,
    kind: &'a str,
}

impl Fetch for HttpTransactionsSource {
    type Key = TransactionsKey;
    type Record = TransactionRecord;

    fn fetch(
        &self,
        key: TransactionsKey,
    ) -> impl Future<Output = Result<Option<Vec<TransactionRecord>>, FetchError>> {
        let url = with_query(
            &self.endpoint,
            &TransactionsQuery {
                period: key.period.as_str(),
                label: &key.label,
                kind: &key.kind,
            },
        );

        async move { get_json(&self.client, url?).await }
    }
}

fn build_client() -> Result<Client, Error> {
    Client::builder()
        .build()
        .map_err(|error| Error::HttpClient(error.to_string()))
}

fn endpoint(base_url: &str, path: &str) -> Result<Url, Error> {
    let url = format!("{}{path}", base_url.trim_end_matches('/'));

    Url::parse(&url).map_err(|error| Error::InvalidUrl(url, error.to_string()))
}

fn with_query(endpoint: &Url, query: &impl Serialize) -> Result<Url, FetchError> {
    let query = serde_urlencoded::to_string(query)
        .map_err(|error| FetchError::Network(format!("could not encode the query: {error}")))?;

    let mut url = endpoint.clone();
    url.set_query(Some(&query));
    Ok(url)
}

/// Send a GET request to `url` and decode its JSON body, which may be `null`.
async fn get_json<T: DeserializeOwned>(
    client: &Client,
    url: Url,
) -> Result<Option<Vec<T>>, FetchError> {
    tracing::debug!("GET {url}");

    let response = client
        .get(url)
        .send()
        .await
        .map_err(|error| FetchError::Network(error.to_string()))?;

    let status = response.status();
    tracing::debug!("Response status: {status}");

    if !status.is_success() {
        return Err(FetchError::Status(status.as_u16()));
    }

    let body = response
        .text()
        .await
        .map_err(|error| FetchError::Network(format!("could not read the response body: {error}")))?;

    serde_json::from_str(&body).map_err(|error| {
        tracing::debug!("Could not decode response body {body:?}: {error}");
        FetchError::Decode(error.to_string())
    })
}
