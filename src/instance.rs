use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;

use serde::{Serialize, Serializer};
use thiserror::Error;

/// Display value used for an attribute that one side does not carry.
pub const MISSING_VALUE: &str = "-";

/// Instance ID to instance, for either the declared or the live side.
pub type InstanceMap = HashMap<String, Instance>;

/// The comparable facets of a compute instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    InstanceType,
    InstanceState,
    KeyName,
    Tags,
    SecurityGroups,
    PublicIp,
}

impl Attribute {
    pub const ALL: [Attribute; 6] = [
        Attribute::InstanceType,
        Attribute::InstanceState,
        Attribute::KeyName,
        Attribute::Tags,
        Attribute::SecurityGroups,
        Attribute::PublicIp,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Attribute::InstanceType => "instance_type",
            Attribute::InstanceState => "instance_state",
            Attribute::KeyName => "key_name",
            Attribute::Tags => "tags",
            Attribute::SecurityGroups => "security_groups",
            Attribute::PublicIp => "public_ip",
        }
    }

    pub fn supported_names() -> Vec<&'static str> {
        Self::ALL.iter().map(Attribute::as_str).collect()
    }
}

impl fmt::Display for Attribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("attribute '{name}' not supported. Supported attributes are [{}]", Attribute::supported_names().join(", "))]
pub struct UnsupportedAttribute {
    pub name: String,
}

impl FromStr for Attribute {
    type Err = UnsupportedAttribute;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Attribute::ALL
            .into_iter()
            .find(|attr| attr.as_str() == s)
            .ok_or_else(|| UnsupportedAttribute {
                name: s.to_string(),
            })
    }
}

/// Expands an empty filter to every supported attribute and drops duplicates,
/// keeping first-seen order.
pub fn resolve_attributes(requested: &[Attribute]) -> Vec<Attribute> {
    if requested.is_empty() {
        return Attribute::ALL.to_vec();
    }

    let mut resolved = Vec::with_capacity(requested.len());
    for attr in requested {
        if !resolved.contains(attr) {
            resolved.push(*attr);
        }
    }
    resolved
}

/// A single attribute value, compared structurally.
///
/// Sets and maps are ordered collections so equality ignores the order the
/// source produced them in. Empty strings and empty collections collapse to
/// `Absent` when read through [`Instance::value`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    Absent,
    Text(String),
    Set(BTreeSet<String>),
    Map(BTreeMap<String, String>),
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttributeValue::Absent => f.write_str(MISSING_VALUE),
            AttributeValue::Text(text) => f.write_str(text),
            AttributeValue::Set(_) | AttributeValue::Map(_) => {
                let json = serde_json::to_string(self).map_err(|_| fmt::Error)?;
                f.write_str(&json)
            }
        }
    }
}

impl Serialize for AttributeValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            AttributeValue::Absent => serializer.serialize_str(MISSING_VALUE),
            AttributeValue::Text(text) => serializer.serialize_str(text),
            AttributeValue::Set(items) => serializer.collect_seq(items),
            AttributeValue::Map(entries) => serializer.collect_map(entries),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Instance {
    pub id: String,
    pub instance_type: Option<String>,
    pub instance_state: Option<String>,
    pub key_name: Option<String>,
    pub tags: BTreeMap<String, String>,
    pub security_groups: BTreeSet<String>,
    pub public_ip: Option<String>,
}

impl Instance {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    /// Stand-in for an instance the live API no longer knows about.
    pub fn deleted(id: impl Into<String>) -> Self {
        Self::new(id)
    }

    pub fn value(&self, attribute: Attribute) -> AttributeValue {
        match attribute {
            Attribute::InstanceType => text_value(&self.instance_type),
            Attribute::InstanceState => text_value(&self.instance_state),
            Attribute::KeyName => text_value(&self.key_name),
            Attribute::PublicIp => text_value(&self.public_ip),
            Attribute::Tags if self.tags.is_empty() => AttributeValue::Absent,
            Attribute::Tags => AttributeValue::Map(self.tags.clone()),
            Attribute::SecurityGroups if self.security_groups.is_empty() => AttributeValue::Absent,
            Attribute::SecurityGroups => AttributeValue::Set(self.security_groups.clone()),
        }
    }
}

fn text_value(value: &Option<String>) -> AttributeValue {
    match value.as_deref() {
        None | Some("") => AttributeValue::Absent,
        Some(text) => AttributeValue::Text(text.to_string()),
    }
}

/// Drops empty strings so that "unset" has a single representation.
pub(crate) fn non_empty(value: Option<&str>) -> Option<String> {
    value.filter(|v| !v.is_empty()).map(str::to_string)
}
