//! Cloud Storage JSON API client

use std::sync::Arc;

use async_trait::async_trait;
use deid_dispatch_api::{
    ApiError,
    ApiResult,
    BlobEntry,
    BlobStream,
    Bucket,
    StorageClient,
    TokenProvider,
};
use futures::stream::{
    self,
    StreamExt,
    TryStreamExt,
};
use reqwest::{
    Client,
    StatusCode,
};
use secrecy::ExposeSecret;
use tracing::debug;

use crate::http::{
    handle_response,
    network_error,
};
use crate::types::{
    BucketResource,
    ObjectList,
    ObjectResource,
};
use crate::GcpSettings;

const LIST_FIELDS: &str = "items/name,nextPageToken";

struct GcsInner {
    http: Client,
    endpoint: String,
    tokens: Arc<dyn TokenProvider>,
}

/// Cloud Storage client backed by the JSON API
pub struct GcsClient {
    inner: Arc<GcsInner>,
}

impl GcsClient {
    pub fn new(http: Client, settings: &GcpSettings, tokens: Arc<dyn TokenProvider>) -> Self {
        Self {
            inner: Arc::new(GcsInner {
                http,
                endpoint: settings.storage_endpoint.clone(),
                tokens,
            }),
        }
    }
}

#[async_trait]
impl StorageClient for GcsClient {
    async fn lookup_bucket(&self, name: &str) -> ApiResult<Option<Box<dyn Bucket>>> {
        let url = bucket_url(&self.inner.endpoint, name);
        let context = format!("Failed to look up bucket {name}");
        let token = self.inner.tokens.access_token().await?;

        let response = self
            .inner
            .http
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| network_error(&context, e))?;

        if is_missing_bucket(response.status()) {
            debug!(bucket = %name, status = %response.status(), "Bucket not accessible");
            return Ok(None);
        }

        let resource: BucketResource = handle_response(response, &context).await?;

        Ok(Some(Box::new(GcsBucket {
            inner: Arc::clone(&self.inner),
            name: resource.name,
        })))
    }
}

/// One `objects.list` page per call; `page_token` is `None` for the first page
#[async_trait]
pub(crate) trait ObjectPages: Send + Sync {
    async fn fetch_page(&self, prefix: &str, page_token: Option<&str>) -> ApiResult<ObjectList>;
}

enum PageCursor {
    First,
    Next(String),
    Done,
}

/// Lazily walks the pages of `pages`. A page is only requested once every item
/// of the previous one has been consumed.
pub(crate) fn paged_blobs<'a, P>(pages: &'a P, prefix: &str) -> BlobStream<'a>
where
    P: ObjectPages + ?Sized,
{
    let prefix = prefix.to_string();

    stream::try_unfold(PageCursor::First, move |cursor| {
        let prefix = prefix.clone();
        async move {
            let page_token = match cursor {
                PageCursor::First => None,
                PageCursor::Next(token) => Some(token),
                PageCursor::Done => return Ok::<_, ApiError>(None),
            };

            let page = pages.fetch_page(&prefix, page_token.as_deref()).await?;
            let next = match page.next_page_token {
                Some(token) if !token.is_empty() => PageCursor::Next(token),
                _ => PageCursor::Done,
            };
            Ok(Some((page.items, next)))
        }
    })
    .map_ok(|items: Vec<ObjectResource>| {
        stream::iter(
            items
                .into_iter()
                .map(|item| Ok::<_, ApiError>(BlobEntry::new(item.name))),
        )
    })
    .try_flatten()
    .boxed()
}

/// Lookup statuses that mean the bucket is missing or not visible to us
pub(crate) fn is_missing_bucket(status: StatusCode) -> bool {
    matches!(status, StatusCode::NOT_FOUND | StatusCode::FORBIDDEN)
}

/// A resolved bucket; listing pages through `objects.list`
pub struct GcsBucket {
    inner: Arc<GcsInner>,
    name: String,
}

#[async_trait]
impl ObjectPages for GcsBucket {
    async fn fetch_page(&self, prefix: &str, page_token: Option<&str>) -> ApiResult<ObjectList> {
        let url = objects_url(&self.inner.endpoint, &self.name, prefix, page_token);
        let context = format!("Failed to list objects in {}", self.name);
        let token = self.inner.tokens.access_token().await?;

        let response = self
            .inner
            .http
            .get(&url)
            .bearer_auth(token.expose_secret())
            .send()
            .await
            .map_err(|e| network_error(&context, e))?;

        let page: ObjectList = handle_response(response, &context).await?;
        debug!(
            bucket = %self.name,
            items = page.items.len(),
            more = page.next_page_token.is_some(),
            "Fetched object page"
        );

        Ok(page)
    }
}

impl Bucket for GcsBucket {
    fn name(&self) -> &str {
        &self.name
    }

    fn list_blobs(&self, prefix: &str) -> BlobStream<'_> {
        paged_blobs(self, prefix)
    }
}

pub(crate) fn bucket_url(endpoint: &str, bucket: &str) -> String {
    format!(
        "{endpoint}/storage/v1/b/{}",
        urlencoding::encode(bucket)
    )
}

pub(crate) fn objects_url(
    endpoint: &str, bucket: &str, prefix: &str, page_token: Option<&str>,
) -> String {
    let mut url = format!(
        "{endpoint}/storage/v1/b/{}/o?prefix={}&fields={}",
        urlencoding::encode(bucket),
        urlencoding::encode(prefix),
        urlencoding::encode(LIST_FIELDS),
    );
    if let Some(token) = page_token {
        url.push_str("&pageToken=");
        url.push_str(&urlencoding::encode(token));
    }
    url
}
