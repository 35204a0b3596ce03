use aws_sdk_ec2::operation::describe_instances::DescribeInstancesOutput;
use aws_sdk_ec2::types::Instance as Ec2Instance;

use crate::instance::{Instance, InstanceMap, non_empty};

/// EC2 accepts 5..=1000 for `MaxResults`.
pub const DEFAULT_PAGE_SIZE: i32 = 100;

/// Maps an SDK instance to the local model. Instances without an ID are skipped.
///
/// Security groups are identified by name, falling back to the group ID.
pub fn instance_from_sdk(instance: &Ec2Instance) -> Option<Instance> {
    let id = non_empty(instance.instance_id())?;

    let tags = instance
        .tags()
        .iter()
        .filter_map(|tag| {
            let key = tag.key()?;
            Some((key.to_string(), tag.value().unwrap_or_default().to_string()))
        })
        .collect();

    let security_groups = instance
        .security_groups()
        .iter()
        .filter_map(|group| group.group_name().or(group.group_id()))
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect();

    Some(Instance {
        id,
        instance_type: non_empty(instance.instance_type().map(|t| t.as_str())),
        instance_state: non_empty(
            instance
                .state()
                .and_then(|state| state.name())
                .map(|name| name.as_str()),
        ),
        key_name: non_empty(instance.key_name()),
        tags,
        security_groups,
        public_ip: non_empty(instance.public_ip_address()),
    })
}

pub fn instances_from_output(output: &DescribeInstancesOutput) -> InstanceMap {
    output
        .reservations()
        .iter()
        .flat_map(|reservation| reservation.instances())
        .filter_map(instance_from_sdk)
        .map(|instance| (instance.id.clone(), instance))
        .collect()
}
