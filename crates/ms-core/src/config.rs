//! Layered, hierarchical configuration.
//!
//! A `ConfigTree` holds nested keys whose leaves may be set at several
//! layers.  Reading a leaf returns the value from the highest layer that set
//! it, so model-specific overrides shadow component defaults without erasing
//! them:
//!
//! ```text
//! base < component_configs < model_override < override
//! ```
//!
//! Values are kept as `serde_yml::Value` and turned into typed structs on
//! read with [`ConfigTree::get_as`].

use std::collections::BTreeMap;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde_yml::{Mapping, Value};

use crate::{CoreError, CoreResult};

/// Layers used by [`ConfigTree::default`], lowest precedence first.
pub const DEFAULT_LAYERS: [&str; 4] = ["base", "component_configs", "model_override", "override"];

#[derive(Clone, Debug)]
struct LayerValue {
    layer:  usize,
    source: String,
    value:  Value,
}

#[derive(Clone, Debug)]
enum ConfigNode {
    Branch(BTreeMap<String, ConfigNode>),
    Leaf(Vec<LayerValue>),
}

/// One recorded assignment of a leaf, as reported by [`ConfigTree::source`].
#[derive(Clone, Debug, PartialEq)]
pub struct ValueSource {
    pub layer:  String,
    pub source: String,
    pub value:  Value,
}

/// Layered configuration tree.  See the module docs.
#[derive(Clone, Debug)]
pub struct ConfigTree {
    layers: Vec<String>,
    root:   BTreeMap<String, ConfigNode>,
    frozen: bool,
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::with_layers(&DEFAULT_LAYERS)
    }
}

impl ConfigTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// A tree with custom layer names, lowest precedence first.
    pub fn with_layers(layers: &[&str]) -> Self {
        Self {
            layers: layers.iter().map(|l| l.to_string()).collect(),
            root:   BTreeMap::new(),
            frozen: false,
        }
    }

    pub fn layers(&self) -> &[String] {
        &self.layers
    }

    /// Reject all further writes.  Called once setup is complete.
    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen
    }

    // ── Writes ────────────────────────────────────────────────────────────

    /// Merge a YAML mapping into the tree at `layer`.
    ///
    /// A later write to the same leaf at the same layer replaces the earlier
    /// one.  Writing a mapping where a leaf lives (or the reverse) is an
    /// error, as is any write to a frozen tree.
    pub fn update(&mut self, value: &Value, layer: &str, source: &str) -> CoreResult<()> {
        let layer_idx = self
            .layers
            .iter()
            .position(|l| l == layer)
            .ok_or_else(|| CoreError::UnknownLayer(layer.to_string()))?;

        let mapping = match value {
            Value::Mapping(m) => m,
            Value::Null => return Ok(()),
            other => {
                return Err(CoreError::Config(format!(
                    "configuration updates must be mappings, got {other:?} from {source}"
                )));
            }
        };
        if self.frozen {
            return Err(CoreError::Frozen(source.to_string()));
        }
        merge_mapping(&mut self.root, mapping, layer_idx, source, "")
    }

    /// Parse `yaml` and merge it at `layer`.
    pub fn update_yaml(&mut self, yaml: &str, layer: &str, source: &str) -> CoreResult<()> {
        let value: Value = serde_yml::from_str(yaml)?;
        self.update(&value, layer, source)
    }

    /// Read a YAML file and merge it at `layer`, using the path as the source.
    pub fn update_file(&mut self, path: &Path, layer: &str) -> CoreResult<()> {
        let text = std::fs::read_to_string(path)?;
        self.update_yaml(&text, layer, &path.display().to_string())
    }

    // ── Reads ─────────────────────────────────────────────────────────────

    fn node(&self, path: &[&str]) -> Option<&ConfigNode> {
        let (first, rest) = path.split_first()?;
        let mut node = self.root.get(*first)?;
        for key in rest {
            match node {
                ConfigNode::Branch(children) => node = children.get(*key)?,
                ConfigNode::Leaf(_) => return None,
            }
        }
        Some(node)
    }

    pub fn contains(&self, path: &[&str]) -> bool {
        self.node(path).is_some()
    }

    /// The effective value at `path`.  Branches are materialised as
    /// mappings of their effective leaves.
    pub fn get(&self, path: &[&str]) -> Option<Value> {
        if path.is_empty() {
            return Some(materialize(&self.root));
        }
        match self.node(path)? {
            ConfigNode::Leaf(values) => values.last().map(|v| v.value.clone()),
            ConfigNode::Branch(children) => Some(materialize(children)),
        }
    }

    /// Deserialize the effective value at `path` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, path: &[&str]) -> CoreResult<T> {
        let value = self
            .get(path)
            .ok_or_else(|| CoreError::MissingKey(path.join(".")))?;
        Ok(serde_yml::from_value(value)?)
    }

    /// Like [`get_as`](Self::get_as) but returns `default` when the key is
    /// absent.
    pub fn get_or<T: DeserializeOwned>(&self, path: &[&str], default: T) -> CoreResult<T> {
        match self.get(path) {
            Some(value) => Ok(serde_yml::from_value(value)?),
            None => Ok(default),
        }
    }

    /// Every layer that set the leaf at `path`, lowest precedence first.
    pub fn source(&self, path: &[&str]) -> CoreResult<Vec<ValueSource>> {
        match self.node(path) {
            Some(ConfigNode::Leaf(values)) => Ok(values
                .iter()
                .map(|v| ValueSource {
                    layer:  self.layers[v.layer].clone(),
                    source: v.source.clone(),
                    value:  v.value.clone(),
                })
                .collect()),
            Some(ConfigNode::Branch(_)) => Err(CoreError::Config(format!(
                "{} is a section, not a value",
                path.join(".")
            ))),
            None => Err(CoreError::MissingKey(path.join("."))),
        }
    }
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn key_to_string(key: &Value) -> CoreResult<String> {
    match key {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(CoreError::Config(format!("unsupported configuration key {other:?}"))),
    }
}

fn merge_mapping(
    children: &mut BTreeMap<String, ConfigNode>,
    mapping:  &Mapping,
    layer:    usize,
    source:   &str,
    prefix:   &str,
) -> CoreResult<()> {
    for (key, value) in mapping {
        let key = key_to_string(key)?;
        let full = if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };

        match value {
            Value::Mapping(inner) => {
                let node = children
                    .entry(key)
                    .or_insert_with(|| ConfigNode::Branch(BTreeMap::new()));
                match node {
                    ConfigNode::Branch(grandchildren) => {
                        merge_mapping(grandchildren, inner, layer, source, &full)?;
                    }
                    ConfigNode::Leaf(_) => {
                        return Err(CoreError::Config(format!(
                            "{full} is a value; {source} tried to set it to a section"
                        )));
                    }
                }
            }
            _ => {
                let node = children.entry(key).or_insert_with(|| ConfigNode::Leaf(Vec::new()));
                match node {
                    ConfigNode::Leaf(values) => {
                        values.retain(|v| v.layer != layer);
                        values.push(LayerValue {
                            layer,
                            source: source.to_string(),
                            value:  value.clone(),
                        });
                        values.sort_by_key(|v| v.layer);
                    }
                    ConfigNode::Branch(_) => {
                        return Err(CoreError::Config(format!(
                            "{full} is a section; {source} tried to set it to a value"
                        )));
                    }
                }
            }
        }
    }
    Ok(())
}

fn materialize(children: &BTreeMap<String, ConfigNode>) -> Value {
    let mut mapping = Mapping::new();
    for (key, node) in children {
        let value = match node {
            ConfigNode::Branch(grandchildren) => materialize(grandchildren),
            ConfigNode::Leaf(values) => values.last().map(|v| v.value.clone()).unwrap_or(Value::Null),
        };
        mapping.insert(Value::String(key.clone()), value);
    }
    Value::Mapping(mapping)
}
