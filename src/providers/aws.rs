mod client;
mod error;
mod types;

pub use client::{DescribeQuery, Ec2Api};
pub use error::AwsError;
pub use types::{DEFAULT_PAGE_SIZE, instance_from_sdk, instances_from_output};

use std::sync::Arc;

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use futures::StreamExt;
use futures::stream::{self, BoxStream};

use super::{FetchConfig, LiveFetcher, LivePage, ProviderError};
use crate::instance::Instance;

/// Position in a `DescribeInstances` scan.
#[derive(Debug, Clone)]
struct Cursor {
    number: u32,
    token: Option<String>,
    exhausted: bool,
}

pub struct AwsFetcher {
    api: Arc<dyn Ec2Api>,
    page_size: i32,
    region: String,
}

impl AwsFetcher {
    /// Loads credentials and region from the default AWS provider chain,
    /// with `config.region` taking precedence when set.
    pub async fn connect(config: &FetchConfig) -> Self {
        let sdk_config = match &config.region {
            Some(region) => {
                tracing::info!(region = %region, "using explicit AWS region");
                aws_config::defaults(BehaviorVersion::latest())
                    .region(aws_config::Region::new(region.clone()))
                    .load()
                    .await
            }
            None => {
                tracing::debug!("using default AWS region from environment");
                aws_config::load_defaults(BehaviorVersion::latest()).await
            }
        };

        let region = sdk_config
            .region()
            .map(|r| r.as_ref().to_string())
            .unwrap_or_else(|| "unknown".to_string());
        tracing::info!(region = %region, "AWS EC2 client initialized");

        Self {
            api: Arc::new(aws_sdk_ec2::Client::new(&sdk_config)),
            page_size: config.page_size,
            region,
        }
    }

    /// NOTE: Primarily used for testing with a mocked EC2 API.
    pub fn with_api(api: Arc<dyn Ec2Api>, page_size: i32) -> Self {
        Self {
            api,
            page_size,
            region: "unknown".to_string(),
        }
    }

    async fn next_page(&self, cursor: Cursor) -> Result<Option<(LivePage, Cursor)>, ProviderError> {
        if cursor.exhausted {
            return Ok(None);
        }

        tracing::info!(page = cursor.number, "fetching next batch of aws instances");
        let output = self
            .api
            .describe_instances(DescribeQuery::page(self.page_size, cursor.token))
            .await
            .map_err(|err| {
                tracing::warn!(page = cursor.number, error = %err, "failed to fetch page");
                err
            })?;

        let instances = instances_from_output(&output);
        let token = output
            .next_token()
            .filter(|token| !token.is_empty())
            .map(str::to_string);
        tracing::debug!(
            page = cursor.number,
            count = instances.len(),
            more = token.is_some(),
            "received aws instances"
        );

        let page = LivePage {
            number: cursor.number,
            instances,
        };
        let next = Cursor {
            number: cursor.number + 1,
            exhausted: token.is_none(),
            token,
        };
        Ok(Some((page, next)))
    }
}

impl std::fmt::Debug for AwsFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsFetcher")
            .field("region", &self.region)
            .field("page_size", &self.page_size)
            .finish()
    }
}

#[async_trait]
impl LiveFetcher for AwsFetcher {
    fn name(&self) -> &str {
        "aws"
    }

    fn pages(&self) -> BoxStream<'_, Result<LivePage, ProviderError>> {
        let start = Cursor {
            number: 1,
            token: None,
            exhausted: false,
        };
        stream::try_unfold(start, move |cursor| self.next_page(cursor)).boxed()
    }

    async fn get_instance(&self, instance_id: &str) -> Result<Instance, ProviderError> {
        let output = self
            .api
            .describe_instances(DescribeQuery::lookup(instance_id))
            .await?;

        output
            .reservations()
            .iter()
            .flat_map(|reservation| reservation.instances())
            .filter(|instance| instance.instance_id() == Some(instance_id))
            .find_map(instance_from_sdk)
            .ok_or_else(|| ProviderError::NotFound {
                instance_id: instance_id.to_string(),
            })
    }
}
