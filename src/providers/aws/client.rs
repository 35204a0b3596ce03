use async_trait::async_trait;
use aws_sdk_ec2::operation::describe_instances::DescribeInstancesOutput;

use super::AwsError;

/// Parameters for a single `DescribeInstances` call.
///
/// EC2 rejects `MaxResults` together with explicit instance IDs, so a query
/// is either a page of a scan or a lookup.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DescribeQuery {
    pub instance_ids: Vec<String>,
    pub next_token: Option<String>,
    pub max_results: Option<i32>,
}

impl DescribeQuery {
    pub fn page(max_results: i32, next_token: Option<String>) -> Self {
        Self {
            instance_ids: Vec::new(),
            next_token,
            max_results: Some(max_results),
        }
    }

    pub fn lookup(instance_id: &str) -> Self {
        Self {
            instance_ids: vec![instance_id.to_string()],
            ..Default::default()
        }
    }
}

/// The subset of the EC2 API the fetcher needs.
#[async_trait]
pub trait Ec2Api: Send + Sync {
    async fn describe_instances(
        &self,
        query: DescribeQuery,
    ) -> Result<DescribeInstancesOutput, AwsError>;
}

#[async_trait]
impl Ec2Api for aws_sdk_ec2::Client {
    async fn describe_instances(
        &self,
        query: DescribeQuery,
    ) -> Result<DescribeInstancesOutput, AwsError> {
        let instance_ids = query.instance_ids;

        aws_sdk_ec2::Client::describe_instances(self)
            .set_instance_ids((!instance_ids.is_empty()).then(|| instance_ids.clone()))
            .set_next_token(query.next_token)
            .set_max_results(query.max_results)
            .send()
            .await
            .map_err(|err| AwsError::from_sdk(err, &instance_ids))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_page_query() {
        let query = DescribeQuery::page(100, Some("token-2".to_string()));
        assert!(query.instance_ids.is_empty());
        assert_eq!(query.max_results, Some(100));
        assert_eq!(query.next_token.as_deref(), Some("token-2"));
    }

    #[test]
    fn test_lookup_query_has_no_page_size() {
        let query = DescribeQuery::lookup("i-123");
        assert_eq!(query.instance_ids, vec!["i-123".to_string()]);
        assert!(query.max_results.is_none());
        assert!(query.next_token.is_none());
    }
}
