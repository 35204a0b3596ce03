//! Declared-state parsers and the extension registry that selects them.

mod error;
mod hcl;
mod state;

pub use error::{ParseError, UnsupportedFormatError};
pub use hcl::HclParser;
pub use state::StateParser;

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use crate::instance::InstanceMap;

pub const AWS_INSTANCE: &str = "aws_instance";

pub trait Parser: Send + Sync {
    fn name(&self) -> &str;

    /// Reads `path` and returns the declared instances keyed by ID.
    ///
    /// `instance_ids` is only consulted by formats whose resources carry no
    /// ID of their own.
    fn parse(&self, path: &Path, instance_ids: &[String]) -> Result<InstanceMap, ParseError>;

    /// Extensions handled, without the leading dot.
    fn extensions(&self) -> &[&str];
}

/// Maps a file extension to the parser registered for it.
pub struct ParserRegistry {
    parsers: BTreeMap<String, Arc<dyn Parser>>,
}

impl ParserRegistry {
    pub fn new(parsers: Vec<Arc<dyn Parser>>) -> Self {
        let mut registry = BTreeMap::new();
        for parser in parsers {
            for ext in parser.extensions() {
                registry.insert(ext.to_ascii_lowercase(), Arc::clone(&parser));
            }
        }
        Self { parsers: registry }
    }

    pub fn get(&self, path: &Path) -> Result<&dyn Parser, UnsupportedFormatError> {
        path.extension()
            .and_then(|ext| ext.to_str())
            .and_then(|ext| self.parsers.get(&ext.to_ascii_lowercase()))
            .map(|parser| parser.as_ref())
            .ok_or_else(|| UnsupportedFormatError {
                path: path.to_path_buf(),
                supported: self.extensions(),
            })
    }

    pub fn extensions(&self) -> Vec<String> {
        self.parsers.keys().map(|ext| format!(".{ext}")).collect()
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new(vec![Arc::new(StateParser), Arc::new(HclParser)])
    }
}

fn read_file(path: &Path) -> Result<String, ParseError> {
    std::fs::read_to_string(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })
}
