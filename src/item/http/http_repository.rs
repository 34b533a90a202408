use std::{marker::PhantomData, time::Duration};

use log::debug;
use reqwest::{
    Url,
    blocking::{Client, RequestBuilder},
};
use serde::de::DeserializeOwned;
use tokio::runtime::{Handle, RuntimeFlavor};

use crate::{
    BatchError,
    item::repository::{ItemRepository, RepositoryItemReader},
};

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Reads every item served by a JSON array endpoint. The endpoint is fetched once.
pub type HttpJsonItemReader<T> = RepositoryItemReader<HttpJsonRepository<T>, T>;

/// Fetches a JSON array with a blocking `GET`.
///
/// Transport failures, non-success statuses and bodies that do not decode into `Vec<T>` are
/// all reported as [`BatchError::ItemReader`].
///
/// The repository can be used outside of any async runtime or from a multi-threaded Tokio
/// runtime, where the request runs under `block_in_place`. A current-thread runtime cannot
/// host a blocking client and is reported as an error.
#[derive(Debug)]
pub struct HttpJsonRepository<T> {
    timeout: Duration,
    url: Url,
    token: Option<String>,
    params: Vec<(String, String)>,
    _pd: PhantomData<T>,
}

impl<T> HttpJsonRepository<T> {
    pub fn url(&self) -> &Url {
        &self.url
    }

    fn request(&self, client: &Client) -> RequestBuilder {
        let mut request = client.get(self.url.clone());

        if !self.params.is_empty() {
            request = request.query(&self.params);
        }

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        request
    }
}

impl<T: DeserializeOwned> HttpJsonRepository<T> {
    fn fetch(&self) -> Result<Vec<T>, BatchError> {
        debug!("GET {}", self.url);

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(|error| BatchError::ItemReader(format!("HTTP client: {}", error)))?;

        let response = self
            .request(&client)
            .send()
            .map_err(|error| BatchError::ItemReader(format!("GET {}: {}", self.url, error)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BatchError::ItemReader(format!(
                "GET {} returned {}",
                self.url, status
            )));
        }

        response.json::<Vec<T>>().map_err(|error| {
            BatchError::ItemReader(format!("GET {}: undecodable body: {}", self.url, error))
        })
    }
}

impl<T: DeserializeOwned> ItemRepository<T> for HttpJsonRepository<T> {
    fn find_all(&self) -> Result<Vec<T>, BatchError> {
        // the blocking client must neither be created nor dropped on an async worker
        match Handle::try_current() {
            Err(_) => self.fetch(),
            Ok(handle) if handle.runtime_flavor() == RuntimeFlavor::MultiThread => {
                tokio::task::block_in_place(|| self.fetch())
            }
            Ok(_) => Err(BatchError::ItemReader(format!(
                "GET {}: a blocking HTTP request cannot run on a current-thread runtime",
                self.url
            ))),
        }
    }
}

pub struct HttpJsonRepositoryBuilder<T> {
    base_url: Option<String>,
    path: Option<String>,
    token: Option<String>,
    params: Vec<(String, String)>,
    timeout: Duration,
    _pd: PhantomData<T>,
}

impl<T> Default for HttpJsonRepositoryBuilder<T> {
    fn default() -> Self {
        Self {
            base_url: None,
            path: None,
            token: None,
            params: Vec::new(),
            timeout: DEFAULT_TIMEOUT,
            _pd: PhantomData,
        }
    }
}

impl<T: DeserializeOwned + Clone> HttpJsonRepositoryBuilder<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Scheme, host and optional prefix, e.g. `https://jsonplaceholder.typicode.com`.
    pub fn base_url<S: Into<String>>(mut self, base_url: S) -> Self {
        self.base_url = Some(base_url.into());
        self
    }

    /// Resource path appended to the base URL, e.g. `/users`.
    pub fn path<S: Into<String>>(mut self, path: S) -> Self {
        self.path = Some(path.into());
        self
    }

    /// Bearer token sent in the `Authorization` header. `None` sends no header.
    pub fn token<S: Into<String>>(mut self, token: Option<S>) -> Self {
        self.token = token.map(Into::into);
        self
    }

    /// Query parameter added to the request. Parameters are sent in the order they are added.
    pub fn param<K: Into<String>, V: Into<String>>(mut self, key: K, value: V) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Timeout of the whole request, 30 seconds by default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn build(self) -> Result<HttpJsonRepository<T>, BatchError> {
        let base_url = self
            .base_url
            .ok_or_else(|| BatchError::Configuration("a base URL is required".to_string()))?;

        let raw_url = match &self.path {
            Some(path) => format!(
                "{}/{}",
                base_url.trim_end_matches('/'),
                path.trim_start_matches('/')
            ),
            None => base_url,
        };

        let url = Url::parse(&raw_url).map_err(|error| {
            BatchError::Configuration(format!("invalid URL {}: {}", raw_url, error))
        })?;

        Ok(HttpJsonRepository {
            timeout: self.timeout,
            url,
            token: self.token,
            params: self.params,
            _pd: PhantomData,
        })
    }

    /// Builds the repository and wraps it in a reader.
    pub fn build_reader(self) -> Result<HttpJsonItemReader<T>, BatchError> {
        self.build().map(RepositoryItemReader::new)
    }
}
