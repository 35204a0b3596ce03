//! Terraform state parser for drift detection.
//!
//! Accepts the raw state file (`resources[].instances[].attributes`) and the
//! `terraform show -json` document (`values.root_module`), extracting every
//! managed `aws_instance` keyed by its `id` attribute.

use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;

use super::{AWS_INSTANCE, ParseError, Parser, read_file};
use crate::instance::{Instance, InstanceMap, non_empty};

#[derive(Debug, Clone, Copy, Default)]
pub struct StateParser;

impl Parser for StateParser {
    fn name(&self) -> &str {
        "tfstate"
    }

    fn parse(&self, path: &Path, _instance_ids: &[String]) -> Result<InstanceMap, ParseError> {
        let content = read_file(path)?;
        let instances = parse_state(&content).map_err(|message| ParseError::Decode {
            path: path.to_path_buf(),
            message,
        })?;

        if instances.is_empty() {
            return Err(ParseError::NoResources {
                path: path.to_path_buf(),
            });
        }

        tracing::debug!(path = %path.display(), count = instances.len(), "parsed terraform state");
        Ok(instances)
    }

    fn extensions(&self) -> &[&str] {
        &["tfstate", "json"]
    }
}

#[derive(Debug, Deserialize)]
struct StateDocument {
    #[serde(default)]
    resources: Vec<StateResource>,
    #[serde(default)]
    values: Option<ShowValues>,
}

#[derive(Debug, Deserialize)]
struct StateResource {
    #[serde(rename = "type")]
    resource_type: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    instances: Vec<StateResourceInstance>,
}

#[derive(Debug, Deserialize)]
struct StateResourceInstance {
    #[serde(default)]
    attributes: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct ShowValues {
    #[serde(default)]
    root_module: Option<ShowModule>,
}

#[derive(Debug, Deserialize)]
struct ShowModule {
    #[serde(default)]
    resources: Vec<ShowResource>,
    #[serde(default)]
    child_modules: Vec<ShowModule>,
}

#[derive(Debug, Deserialize)]
struct ShowResource {
    #[serde(rename = "type")]
    resource_type: String,
    #[serde(default)]
    mode: Option<String>,
    #[serde(default)]
    values: serde_json::Value,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct InstanceAttributes {
    id: Option<String>,
    instance_type: Option<String>,
    instance_state: Option<String>,
    key_name: Option<String>,
    public_ip: Option<String>,
    tags: Option<BTreeMap<String, String>>,
    security_groups: Option<Vec<String>>,
}

impl InstanceAttributes {
    fn into_instance(self) -> Option<Instance> {
        let id = non_empty(self.id.as_deref())?;
        Some(Instance {
            id,
            instance_type: non_empty(self.instance_type.as_deref()),
            instance_state: non_empty(self.instance_state.as_deref()),
            key_name: non_empty(self.key_name.as_deref()),
            tags: self.tags.unwrap_or_default(),
            security_groups: self.security_groups.unwrap_or_default().into_iter().collect(),
            public_ip: non_empty(self.public_ip.as_deref()),
        })
    }
}

fn is_managed_instance(resource_type: &str, mode: Option<&str>) -> bool {
    resource_type == AWS_INSTANCE && mode != Some("data")
}

fn parse_state(content: &str) -> Result<InstanceMap, String> {
    let document: StateDocument = serde_json::from_str(content).map_err(|e| e.to_string())?;

    let mut raw = Vec::new();
    for resource in document.resources {
        if !is_managed_instance(&resource.resource_type, resource.mode.as_deref()) {
            continue;
        }
        raw.extend(resource.instances.into_iter().map(|i| i.attributes));
    }
    if let Some(root) = document.values.and_then(|v| v.root_module) {
        collect_module(root, &mut raw);
    }

    let mut instances = InstanceMap::new();
    for value in raw {
        let attributes: InstanceAttributes =
            serde_json::from_value(value).map_err(|e| format!("invalid aws_instance attributes: {e}"))?;
        let instance = attributes
            .into_instance()
            .ok_or_else(|| "aws_instance without an id attribute".to_string())?;
        instances.insert(instance.id.clone(), instance);
    }
    Ok(instances)
}

fn collect_module(module: ShowModule, out: &mut Vec<serde_json::Value>) {
    for resource in module.resources {
        if is_managed_instance(&resource.resource_type, resource.mode.as_deref()) {
            out.push(resource.values);
        }
    }
    for child in module.child_modules {
        collect_module(child, out);
    }
}
