pub mod aws;

use async_trait::async_trait;
use futures::StreamExt;
use futures::stream::BoxStream;
use thiserror::Error;

use crate::instance::{Instance, InstanceMap};

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("unknown provider: {0}")]
    UnknownProvider(String),
    /// The instance does not exist on the live side
    #[error("instance not found: {instance_id}")]
    NotFound { instance_id: String },
    #[error("aws error: {0}")]
    Aws(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound { .. })
    }
}

/// One batch of live instances, numbered from 1.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LivePage {
    pub number: u32,
    pub instances: InstanceMap,
}

#[derive(Debug, Clone)]
pub struct FetchConfig {
    pub region: Option<String>,
    pub page_size: i32,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            region: None,
            page_size: aws::DEFAULT_PAGE_SIZE,
        }
    }
}

#[async_trait]
pub trait LiveFetcher: Send + Sync {
    fn name(&self) -> &str;

    /// Every live instance visible to the caller, one page at a time.
    /// Dropping the stream stops further requests.
    fn pages(&self) -> BoxStream<'_, Result<LivePage, ProviderError>>;

    /// Fails with [`ProviderError::NotFound`] when the ID is unknown.
    async fn get_instance(&self, instance_id: &str) -> Result<Instance, ProviderError>;

    async fn fetch_all(&self) -> Result<InstanceMap, ProviderError> {
        let mut all = InstanceMap::new();
        for_each_page(self, |_, instances| {
            all.extend(instances);
            true
        })
        .await?;
        Ok(all)
    }
}

/// Drives `fetcher` page by page until `on_page` returns `false`, the pages
/// run out, or a request fails. Returns the number of pages delivered.
pub async fn for_each_page<F, L>(fetcher: &L, mut on_page: F) -> Result<u32, ProviderError>
where
    L: LiveFetcher + ?Sized,
    F: FnMut(u32, InstanceMap) -> bool + Send,
{
    let mut pages = fetcher.pages();
    let mut delivered = 0;

    while let Some(page) = pages.next().await {
        let page = page?;
        delivered += 1;
        if !on_page(page.number, page.instances) {
            tracing::debug!(page = delivered, "page callback requested stop");
            break;
        }
    }

    Ok(delivered)
}

pub async fn get_fetcher(
    name: &str,
    config: &FetchConfig,
) -> Result<Box<dyn LiveFetcher>, ProviderError> {
    match name {
        "aws" => Ok(Box::new(aws::AwsFetcher::connect(config).await)),
        other => Err(ProviderError::UnknownProvider(other.to_string())),
    }
}
