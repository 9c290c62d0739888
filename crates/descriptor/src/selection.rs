//! Variation-driven group activation.
//!
//! A variation switches on a set of groups; the editable parameters and
//! textures for a material are the concatenation of those groups in activation
//! order.
use serde::Serialize;
use thiserror::Error;

use crate::model::{
    ShaderDescriptor, ShaderParameterSpec, ShaderTextureSpec, VariationSpec, BASE_GROUP,
    MANDATORY_GROUP,
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error("variation '{0}' is not declared by this shader")]
    UnknownVariation(String),
}

/// Ordered, duplicate-free list of active group names.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ActivationSet {
    groups: Vec<String>,
}

impl ActivationSet {
    /// Groups active when no variation is selected.
    pub fn without_variation() -> Self {
        Self::from_groups([MANDATORY_GROUP, BASE_GROUP])
    }

    pub fn for_variation(variation: &VariationSpec) -> Self {
        Self::from_groups(
            std::iter::once(MANDATORY_GROUP).chain(variation.groups.iter().map(String::as_str)),
        )
    }

    pub fn from_groups<'a, I>(groups: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut ordered: Vec<String> = Vec::new();
        for group in groups {
            if !ordered.iter().any(|existing| existing == group) {
                ordered.push(group.to_string());
            }
        }
        Self { groups: ordered }
    }

    pub fn groups(&self) -> &[String] {
        &self.groups
    }

    pub fn contains(&self, group: &str) -> bool {
        self.groups.iter().any(|candidate| candidate == group)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ActiveSpecs {
    pub parameters: Vec<ShaderParameterSpec>,
    pub textures: Vec<ShaderTextureSpec>,
}

impl ShaderDescriptor {
    pub fn activation(&self, variation: Option<&str>) -> Result<ActivationSet, SelectionError> {
        match variation {
            None => Ok(ActivationSet::without_variation()),
            Some(name) => self
                .variation(name)
                .map(ActivationSet::for_variation)
                .ok_or_else(|| SelectionError::UnknownVariation(name.to_string())),
        }
    }

    pub fn active_specs(&self, activation: &ActivationSet) -> ActiveSpecs {
        let mut active = ActiveSpecs::default();
        for group in activation.groups() {
            active
                .parameters
                .extend_from_slice(self.parameters.group(group));
            active.textures.extend_from_slice(self.textures.group(group));
        }
        active
    }

    pub fn select(&self, variation: Option<&str>) -> Result<ActiveSpecs, SelectionError> {
        let activation = self.activation(variation)?;
        Ok(self.active_specs(&activation))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse_descriptor;

    const DESCRIPTOR: &str = r#"<CustomShader>
        <Parameters>
            <Parameter name="m1" type="float" />
            <Parameter name="e1" type="float" group="extra" />
            <Parameter name="b1" type="float" group="base" />
            <Parameter name="m2" type="float2" />
            <Parameter name="e2" type="float" group="extra" />
            <Parameter name="x1" type="float" group="unused" />
        </Parameters>
        <Textures>
            <Texture name="tb" group="base" defaultColorProfile="sRGB" />
            <Texture name="tm" defaultColorProfile="sRGB" />
            <Texture name="te" group="extra" defaultColorProfile="sRGB" />
        </Textures>
        <Variations>
            <Variation name="withExtra" groups="extra" />
            <Variation name="doubled" groups="extra mandatory extra" />
            <Variation name="bare" />
        </Variations>
    </CustomShader>"#;

    fn parameter_names(active: &ActiveSpecs) -> Vec<&str> {
        active.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    fn texture_names(active: &ActiveSpecs) -> Vec<&str> {
        active.textures.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn no_variation_activates_mandatory_then_base() {
        let descriptor = parse_descriptor(DESCRIPTOR).unwrap();
        let active = descriptor.select(None).unwrap();
        assert_eq!(parameter_names(&active), ["m1", "m2", "b1"]);
        assert_eq!(texture_names(&active), ["tm", "tb"]);
    }

    #[test]
    fn variation_activates_mandatory_then_declared_groups() {
        let descriptor = parse_descriptor(DESCRIPTOR).unwrap();
        let active = descriptor.select(Some("withExtra")).unwrap();
        assert_eq!(
            parameter_names(&active),
            ["m1", "m2", "e1", "e2"]
        );
        assert_eq!(texture_names(&active), ["tm", "te"]);
    }

    #[test]
    fn repeated_groups_are_activated_once() {
        let descriptor = parse_descriptor(DESCRIPTOR).unwrap();
        let activation = descriptor.activation(Some("doubled")).unwrap();
        assert_eq!(activation.groups(), ["mandatory", "extra"]);
        let active = descriptor.active_specs(&activation);
        assert_eq!(active.parameters.len(), 4);
    }

    #[test]
    fn variation_without_groups_only_keeps_mandatory() {
        let descriptor = parse_descriptor(DESCRIPTOR).unwrap();
        let active = descriptor.select(Some("bare")).unwrap();
        assert_eq!(parameter_names(&active), ["m1", "m2"]);
        assert!(!descriptor
            .activation(Some("bare"))
            .unwrap()
            .contains(BASE_GROUP));
    }

    #[test]
    fn unknown_variation_is_reported() {
        let descriptor = parse_descriptor(DESCRIPTOR).unwrap();
        assert_eq!(
            descriptor.select(Some("ghost")).unwrap_err(),
            SelectionError::UnknownVariation("ghost".into())
        );
    }
}
