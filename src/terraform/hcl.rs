//! `resource "aws_instance"` blocks from Terraform/HCL sources.
//!
//! Blocks carry no instance ID, so callers bind IDs either by position
//! (`i-1,i-2` binds the first two blocks in file order) or by label
//! (`web=i-1,db=i-2`). Positional binding silently follows block order.

use std::collections::{BTreeMap, HashSet};
use std::path::Path;

use hcl::{Block, Body, Expression, ObjectKey};

use super::{AWS_INSTANCE, ParseError, Parser, read_file};
use crate::instance::{Instance, InstanceMap, non_empty};

#[derive(Debug, Clone, Copy, Default)]
pub struct HclParser;

impl Parser for HclParser {
    fn name(&self) -> &str {
        "hcl"
    }

    fn parse(&self, path: &Path, instance_ids: &[String]) -> Result<InstanceMap, ParseError> {
        let bindings = Bindings::from_ids(instance_ids)?;

        let content = read_file(path)?;
        let body = hcl::parse(&content).map_err(|e| ParseError::Decode {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        let blocks = instance_blocks(&body)?;
        if blocks.is_empty() {
            return Err(ParseError::NoResources {
                path: path.to_path_buf(),
            });
        }

        let instances = bindings.bind(blocks)?;
        tracing::debug!(path = %path.display(), count = instances.len(), "parsed HCL resources");
        Ok(instances)
    }

    fn extensions(&self) -> &[&str] {
        &["tf", "hcl"]
    }
}

/// One `aws_instance` block, decoded but not yet bound to an ID.
#[derive(Debug, Clone, PartialEq)]
struct InstanceBlock {
    label: String,
    declared: Instance,
}

#[derive(Debug, Clone, PartialEq)]
enum Bindings {
    Positional(Vec<String>),
    /// `(label, id)` pairs
    Named(Vec<(String, String)>),
}

impl Bindings {
    fn from_ids(ids: &[String]) -> Result<Self, ParseError> {
        if ids.is_empty() {
            return Err(ParseError::NoInstanceIds);
        }

        let pairs: Vec<Option<(String, String)>> = ids
            .iter()
            .map(|entry| {
                entry
                    .split_once('=')
                    .map(|(label, id)| (label.trim().to_string(), id.trim().to_string()))
            })
            .collect();

        let named = pairs.iter().filter(|pair| pair.is_some()).count();
        let bindings = if named == 0 {
            Bindings::Positional(ids.to_vec())
        } else if named == ids.len() {
            Bindings::Named(pairs.into_iter().flatten().collect())
        } else {
            return Err(ParseError::MixedBindings);
        };

        let mut seen = HashSet::new();
        for id in bindings.ids() {
            if !seen.insert(id) {
                return Err(ParseError::DuplicateInstanceId { id: id.to_string() });
            }
        }
        Ok(bindings)
    }

    fn ids(&self) -> Vec<&str> {
        match self {
            Bindings::Positional(ids) => ids.iter().map(String::as_str).collect(),
            Bindings::Named(pairs) => pairs.iter().map(|(_, id)| id.as_str()).collect(),
        }
    }

    fn bind(self, blocks: Vec<InstanceBlock>) -> Result<InstanceMap, ParseError> {
        let mut instances = InstanceMap::new();
        match self {
            Bindings::Positional(ids) => {
                if ids.len() > blocks.len() {
                    return Err(ParseError::TooManyInstanceIds {
                        given: ids.len(),
                        found: blocks.len(),
                    });
                }
                if ids.len() < blocks.len() {
                    tracing::warn!(
                        ids = ids.len(),
                        resources = blocks.len(),
                        "fewer instance ids than aws_instance blocks, trailing blocks are ignored"
                    );
                }
                for (id, block) in ids.into_iter().zip(blocks) {
                    instances.insert(id.clone(), Instance { id, ..block.declared });
                }
            }
            Bindings::Named(pairs) => {
                for (label, id) in pairs {
                    let block = blocks
                        .iter()
                        .find(|block| block.label == label)
                        .ok_or_else(|| ParseError::UnknownBlockLabel { label: label.clone() })?;
                    instances.insert(
                        id.clone(),
                        Instance {
                            id,
                            ..block.declared.clone()
                        },
                    );
                }
            }
        }
        Ok(instances)
    }
}

fn instance_blocks(body: &Body) -> Result<Vec<InstanceBlock>, ParseError> {
    let mut blocks = Vec::new();
    for block in body.blocks() {
        if let Some(decoded) = decode_block(block)? {
            blocks.push(decoded);
        }
    }
    Ok(blocks)
}

fn decode_block(block: &Block) -> Result<Option<InstanceBlock>, ParseError> {
    if block.identifier() != "resource" {
        return Ok(None);
    }
    let (Some(kind), Some(label)) = (block.labels().first(), block.labels().get(1)) else {
        return Ok(None);
    };
    if kind.as_str() != AWS_INSTANCE {
        return Ok(None);
    }

    let label = label.as_str().to_string();
    let mut declared = Instance::default();

    for attribute in block.body().attributes() {
        let unsupported = || ParseError::UnsupportedExpression {
            resource: label.clone(),
            attribute: attribute.key().to_string(),
        };
        let expr = attribute.expr();

        match attribute.key() {
            "instance_type" => declared.instance_type = scalar(expr).ok_or_else(unsupported)?,
            "instance_state" => declared.instance_state = scalar(expr).ok_or_else(unsupported)?,
            "key_name" => declared.key_name = scalar(expr).ok_or_else(unsupported)?,
            "public_ip" => declared.public_ip = scalar(expr).ok_or_else(unsupported)?,
            "tags" => declared.tags = string_map(expr).ok_or_else(unsupported)?,
            "security_groups" => {
                declared.security_groups = string_list(expr)
                    .ok_or_else(unsupported)?
                    .into_iter()
                    .collect();
            }
            _ => {}
        }
    }

    Ok(Some(InstanceBlock { label, declared }))
}

fn text(expr: &Expression) -> Option<String> {
    match expr {
        Expression::String(s) => Some(s.clone()),
        Expression::Number(n) => Some(n.to_string()),
        Expression::Bool(b) => Some(b.to_string()),
        Expression::Null => Some(String::new()),
        _ => None,
    }
}

/// `Some(None)` for a literal that reads as unset (null or "").
fn scalar(expr: &Expression) -> Option<Option<String>> {
    text(expr).map(|value| non_empty(Some(value.as_str())))
}

fn string_list(expr: &Expression) -> Option<Vec<String>> {
    match expr {
        Expression::Array(items) => items
            .iter()
            .map(text)
            .filter(|item| item.as_deref() != Some(""))
            .collect(),
        Expression::Null => Some(Vec::new()),
        _ => None,
    }
}

fn string_map(expr: &Expression) -> Option<BTreeMap<String, String>> {
    match expr {
        Expression::Object(object) => object
            .iter()
            .map(|(key, value)| Some((object_key(key)?, text(value)?)))
            .collect(),
        Expression::Null => Some(BTreeMap::new()),
        _ => None,
    }
}

fn object_key(key: &ObjectKey) -> Option<String> {
    // NOTE: ObjectKey is #[non_exhaustive]; unknown key kinds are unsupported
    #[allow(unreachable_patterns)]
    match key {
        ObjectKey::Identifier(ident) => Some(ident.as_str().to_string()),
        ObjectKey::Expression(expr) => text(expr),
        _ => None,
    }
}
