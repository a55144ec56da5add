use crate::{
    config::{Config, Credentials},
    prelude::*,
    record::{Record, RecordId},
};
use reqwest::{
    blocking::Client,
    header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Url,
};
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, warn};

/// Response envelope shared by every SyncSketch listing endpoint.
#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct Listing {
    #[serde(default)]
    pub objects: Vec<Record>,
    #[serde(default)]
    pub meta: Option<ListingMeta>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
pub struct ListingMeta {
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub total_count: Option<u64>,
    pub next: Option<String>,
}

impl From<Vec<Record>> for Listing {
    fn from(objects: Vec<Record>) -> Self {
        Self {
            objects,
            meta: None,
        }
    }
}

#[derive(Error, Debug)]
pub enum RemoteServiceError {
    #[error("request to {url} failed: {source}")]
    Transport {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("could not decode the response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("could not build the request URL for {0:?}")]
    BadEndpoint(String),
    #[error("could not follow the next page link {0:?}")]
    BadNextLink(String),
}

/// The slice of the SyncSketch API the tree walk needs. Every listing
/// below accounts is filtered by its parent's id.
pub trait ReviewApi {
    fn is_connected(&self) -> Result<bool, RemoteServiceError>;
    fn accounts(&self) -> Result<Listing, RemoteServiceError>;
    fn projects(&self, account: &RecordId) -> Result<Listing, RemoteServiceError>;
    fn reviews(&self, project: &RecordId) -> Result<Listing, RemoteServiceError>;
    fn items(&self, review: &RecordId) -> Result<Listing, RemoteServiceError>;
    fn comments(&self, item: &RecordId) -> Result<Listing, RemoteServiceError>;
}

pub struct SyncSketchClient {
    http: Client,
    api_root: Url,
    max_pages: usize,
}

impl SyncSketchClient {
    pub fn new(cfg: &Config, creds: &Credentials) -> AnyhowResult<Self> {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&creds.authorization())?;
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .default_headers(headers)
            .timeout(cfg.timeout())
            .build()?;

        Ok(Self {
            http,
            api_root: cfg.api_root()?,
            max_pages: cfg.max_pages.max(1),
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url, RemoteServiceError> {
        self.api_root
            .join(path)
            .map_err(|_| RemoteServiceError::BadEndpoint(path.to_owned()))
    }

    fn get_json<T>(&self, url: Url) -> Result<T, RemoteServiceError>
    where
        T: serde::de::DeserializeOwned,
    {
        debug!("GET {}", url);
        let url_str = url.to_string();
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|source| RemoteServiceError::Transport {
                url: url_str.clone(),
                source,
            })?;

        let status = resp.status();
        if !status.is_success() {
            return Err(RemoteServiceError::Status {
                url: url_str,
                status: status.as_u16(),
            });
        }

        resp.json()
            .map_err(|source| RemoteServiceError::Decode { url: url_str, source })
    }

    /// Fetches a listing and keeps following `meta.next` until it runs out
    /// or `max_pages` requests have been made.
    fn get_listing(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Listing, RemoteServiceError> {
        let mut url = self.endpoint(path)?;
        url.query_pairs_mut().extend_pairs(query);

        let mut listing: Listing = self.get_json(url)?;
        let mut pages = 1;

        while let Some(next) = listing.meta.as_mut().and_then(|m| m.next.take()) {
            if pages >= self.max_pages {
                warn!(
                    "stopping after {} pages of {}, more results are available",
                    pages, path
                );
                break;
            }
            let next_url = self
                .api_root
                .join(&next)
                .map_err(|_| RemoteServiceError::BadNextLink(next.clone()))?;
            let page: Listing = self.get_json(next_url)?;
            listing.objects.extend(page.objects);
            listing.meta = page.meta;
            pages += 1;
        }

        Ok(listing)
    }
}

fn active() -> (&'static str, String) {
    ("active", "1".into())
}

impl ReviewApi for SyncSketchClient {
    fn is_connected(&self) -> Result<bool, RemoteServiceError> {
        match self.get_json::<serde_json::Value>(self.endpoint("v1/person/connected/")?) {
            Ok(_) => Ok(true),
            Err(RemoteServiceError::Status { status, .. }) => {
                if status >= 500 {
                    warn!("could not connect to SyncSketch due to a server error (HTTP {})", status);
                } else {
                    warn!(
                        "could not connect to SyncSketch due to a client error (HTTP {}), probably bad credentials",
                        status
                    );
                }
                Ok(false)
            }
            // connected/ may answer with an empty body
            Err(RemoteServiceError::Decode { .. }) => Ok(true),
            Err(err) => Err(err),
        }
    }

    fn accounts(&self) -> Result<Listing, RemoteServiceError> {
        self.get_listing("v2/account/", &[active()])
    }

    fn projects(&self, account: &RecordId) -> Result<Listing, RemoteServiceError> {
        self.get_listing(
            "v1/project/",
            &[("account__id", account.to_string()), active()],
        )
    }

    fn reviews(&self, project: &RecordId) -> Result<Listing, RemoteServiceError> {
        self.get_listing(
            "v1/review/",
            &[("project__id", project.to_string()), active()],
        )
    }

    fn items(&self, review: &RecordId) -> Result<Listing, RemoteServiceError> {
        self.get_listing(
            "v1/item/",
            &[("reviews__id", review.to_string()), active()],
        )
    }

    fn comments(&self, item: &RecordId) -> Result<Listing, RemoteServiceError> {
        self.get_listing("v1/frame/", &[("item__id", item.to_string())])
    }
}
