//! Value types produced by the descriptor parser and consumed by the material
//! binding layer. Everything here is derived, read-only data: a descriptor is
//! re-parsed whenever a shader or variation changes, so none of these types
//! carry identity beyond their contents.
//!
//! Types:
//!
//! - `ParameterType` maps the descriptor's `float`..`float4` type names onto an
//!   arity used to size default values and editor fields.
//! - `ShaderParameterSpec` and `ShaderTextureSpec` describe one editable slot
//!   each, already normalised (defaults padded/truncated, file defaulted).
//! - `VariationSpec` names a variation and the groups it switches on.
//! - `GroupedSpecs` buckets specs by group while keeping declaration order
//!   inside every bucket.
//! - `ShaderDescriptor` bundles the grouped parameters, grouped textures, and
//!   the ordered variation list for one descriptor file.
use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Group used for entries without an explicit `group` attribute.
pub const MANDATORY_GROUP: &str = "mandatory";

/// Group activated alongside `mandatory` when no variation is selected.
pub const BASE_GROUP: &str = "base";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParameterType {
    Float,
    Float2,
    Float3,
    Float4,
}

impl ParameterType {
    pub fn from_attribute(raw: &str) -> Option<Self> {
        match raw.trim() {
            "float" => Some(Self::Float),
            "float2" => Some(Self::Float2),
            "float3" => Some(Self::Float3),
            "float4" => Some(Self::Float4),
            _ => None,
        }
    }

    pub fn arity(self) -> usize {
        match self {
            Self::Float => 1,
            Self::Float2 => 2,
            Self::Float3 => 3,
            Self::Float4 => 4,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Float => "float",
            Self::Float2 => "float2",
            Self::Float3 => "float3",
            Self::Float4 => "float4",
        }
    }
}

impl fmt::Display for ParameterType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShaderParameterSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    /// Always exactly `kind.arity()` components.
    pub default_value: Vec<f32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShaderTextureSpec {
    pub name: String,
    #[serde(default)]
    pub default_file: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationSpec {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<String>,
}

/// Specs bucketed by group name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupedSpecs<T> {
    groups: BTreeMap<String, Vec<T>>,
}

impl<T> Default for GroupedSpecs<T> {
    fn default() -> Self {
        Self {
            groups: BTreeMap::new(),
        }
    }
}

impl<T> GroupedSpecs<T> {
    pub fn push(&mut self, group: &str, spec: T) {
        self.groups.entry(group.to_string()).or_default().push(spec);
    }

    pub fn extend<I>(&mut self, group: &str, specs: I)
    where
        I: IntoIterator<Item = T>,
    {
        self.groups
            .entry(group.to_string())
            .or_default()
            .extend(specs);
    }

    pub fn group(&self, name: &str) -> &[T] {
        self.groups.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn group_names(&self) -> impl Iterator<Item = &str> {
        self.groups.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[T])> {
        self.groups
            .iter()
            .map(|(name, specs)| (name.as_str(), specs.as_slice()))
    }

    pub fn is_empty(&self) -> bool {
        self.groups.values().all(Vec::is_empty)
    }

    /// Total number of specs across all groups.
    pub fn len(&self) -> usize {
        self.groups.values().map(Vec::len).sum()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShaderDescriptor {
    pub parameters: GroupedSpecs<ShaderParameterSpec>,
    pub textures: GroupedSpecs<ShaderTextureSpec>,
    pub variations: Vec<VariationSpec>,
}

impl ShaderDescriptor {
    pub fn variation(&self, name: &str) -> Option<&VariationSpec> {
        self.variations.iter().find(|variation| variation.name == name)
    }

    pub fn variation_names(&self) -> impl Iterator<Item = &str> {
        self.variations.iter().map(|variation| variation.name.as_str())
    }

    pub fn parameter_groups(&self) -> impl Iterator<Item = &str> {
        self.parameters.group_names()
    }

    pub fn texture_groups(&self) -> impl Iterator<Item = &str> {
        self.textures.group_names()
    }

    pub fn is_empty(&self) -> bool {
        self.parameters.is_empty() && self.textures.is_empty() && self.variations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_types_map_to_arity() {
        assert_eq!(ParameterType::from_attribute("float"), Some(ParameterType::Float));
        assert_eq!(ParameterType::from_attribute("float4").map(ParameterType::arity), Some(4));
        assert_eq!(ParameterType::from_attribute("vec3"), None);
        assert_eq!(ParameterType::Float3.to_string(), "float3");
    }

    #[test]
    fn grouped_specs_preserve_insertion_order_per_group() {
        let mut grouped = GroupedSpecs::default();
        grouped.push("base", "b1");
        grouped.push(MANDATORY_GROUP, "m1");
        grouped.push("base", "b2");

        assert_eq!(grouped.group("base"), &["b1", "b2"]);
        assert_eq!(grouped.group(MANDATORY_GROUP), &["m1"]);
        assert!(grouped.group("missing").is_empty());
        assert_eq!(grouped.len(), 3);
    }
}
