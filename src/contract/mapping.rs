use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Declared input/output contract names for one workflow step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct NodeContracts {
    pub input: Option<String>,
    pub output: Option<String>,
}

/// The externally authored `mapping.yaml` document. A missing or malformed
/// file degrades to an empty table; the validator then skips every step.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MappingTable {
    pub version: Option<String>,
    pub nodes: HashMap<String, NodeContracts>,
}

impl MappingTable {
    pub fn load(path: &Path) -> Self {
        let Ok(text) = fs::read_to_string(path) else {
            return Self::default();
        };
        // serde_yaml accepts JSON documents too, so both on-disk formats
        // go through the same parse.
        serde_yaml::from_str(&text).unwrap_or_default()
    }

    pub fn node(&self, name: &str) -> Option<&NodeContracts> {
        self.nodes.get(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_document_degrades_to_empty_table() {
        let table: MappingTable = serde_yaml::from_str("nodes: [not, a, map]")
            .unwrap_or_default();
        assert!(table.nodes.is_empty());
    }
}
