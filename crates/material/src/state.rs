//! Per-material shader state: which shader is picked, which variation is
//! active, and the edited parameter and texture values.
use std::fmt;

use descriptor::{ParameterType, ShaderParameterSpec, ShaderTextureSpec};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Variation label shown when no variation is active.
pub const NO_VARIATION: &str = "None";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValueError {
    #[error("parameter '{parameter}' expects {expected} components, got {found}")]
    ArityMismatch {
        parameter: String,
        expected: usize,
        found: usize,
    },
    #[error("material has no parameter named '{0}'")]
    UnknownParameter(String),
    #[error("material has no texture named '{0}'")]
    UnknownTexture(String),
}

/// The shader field of a material.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ShaderChoice {
    #[default]
    None,
    Custom,
    Named(String),
}

impl ShaderChoice {
    pub fn named(&self) -> Option<&str> {
        match self {
            Self::Named(name) => Some(name.as_str()),
            _ => None,
        }
    }
}

impl From<String> for ShaderChoice {
    fn from(value: String) -> Self {
        match value.as_str() {
            "" | catalog::UNSELECTED_ID => Self::None,
            catalog::CUSTOM_ID => Self::Custom,
            _ => Self::Named(value),
        }
    }
}

impl From<&str> for ShaderChoice {
    fn from(value: &str) -> Self {
        Self::from(value.to_string())
    }
}

impl From<ShaderChoice> for String {
    fn from(value: ShaderChoice) -> Self {
        value.to_string()
    }
}

impl fmt::Display for ShaderChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::None => f.write_str(catalog::UNSELECTED_ID),
            Self::Custom => f.write_str(catalog::CUSTOM_ID),
            Self::Named(name) => f.write_str(name),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterValue {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ParameterType,
    pub value: Vec<f32>,
}

impl ParameterValue {
    pub fn from_spec(spec: &ShaderParameterSpec) -> Self {
        Self {
            name: spec.name.clone(),
            kind: spec.kind,
            value: spec.default_value.clone(),
        }
    }

    pub fn set(&mut self, values: &[f32]) -> Result<(), ValueError> {
        if values.len() != self.kind.arity() {
            return Err(ValueError::ArityMismatch {
                parameter: self.name.clone(),
                expected: self.kind.arity(),
                found: values.len(),
            });
        }
        self.value = values.to_vec();
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextureSlot {
    pub name: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub default_source: String,
}

impl TextureSlot {
    pub fn from_spec(spec: &ShaderTextureSpec) -> Self {
        Self {
            name: spec.name.clone(),
            source: spec.default_file.clone(),
            default_source: spec.default_file.clone(),
        }
    }

    pub fn is_default(&self) -> bool {
        self.source == self.default_source
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MaterialShader {
    pub name: String,
    /// Shader path recorded by older releases, consumed by migration.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub legacy_source: Option<String>,
    pub shader: ShaderChoice,
    pub custom_shader: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variation: Option<String>,
    pub variations: Vec<String>,
    pub parameters: Vec<ParameterValue>,
    pub textures: Vec<TextureSlot>,
}

impl MaterialShader {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    /// Variation picker entries, the "no variation" entry first.
    pub fn variation_choices(&self) -> Vec<&str> {
        std::iter::once(NO_VARIATION)
            .chain(self.variations.iter().map(String::as_str))
            .collect()
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterValue> {
        self.parameters.iter().find(|parameter| parameter.name == name)
    }

    pub fn texture(&self, name: &str) -> Option<&TextureSlot> {
        self.textures.iter().find(|texture| texture.name == name)
    }

    pub fn set_parameter(&mut self, name: &str, values: &[f32]) -> Result<(), ValueError> {
        self.parameters
            .iter_mut()
            .find(|parameter| parameter.name == name)
            .ok_or_else(|| ValueError::UnknownParameter(name.to_string()))?
            .set(values)
    }

    pub fn set_texture_source(&mut self, name: &str, source: &str) -> Result<(), ValueError> {
        let texture = self
            .textures
            .iter_mut()
            .find(|texture| texture.name == name)
            .ok_or_else(|| ValueError::UnknownTexture(name.to_string()))?;
        texture.source = source.to_string();
        Ok(())
    }

    /// Revert to the "no shader" state. A `Custom` selection is kept so the
    /// user can enter another path; everything loaded from a descriptor goes.
    pub fn clear(&mut self) {
        if self.shader != ShaderChoice::Custom {
            self.shader = ShaderChoice::None;
        }
        self.custom_shader.clear();
        self.variation = None;
        self.variations.clear();
        self.parameters.clear();
        self.textures.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shader_choice_round_trips_through_strings() {
        assert_eq!(ShaderChoice::from("None"), ShaderChoice::None);
        assert_eq!(ShaderChoice::from(""), ShaderChoice::None);
        assert_eq!(ShaderChoice::from("Custom"), ShaderChoice::Custom);
        assert_eq!(
            ShaderChoice::from("vehicleShader"),
            ShaderChoice::Named("vehicleShader".into())
        );
        assert_eq!(String::from(ShaderChoice::Custom), "Custom");
    }

    #[test]
    fn parameter_set_enforces_arity() {
        let mut value = ParameterValue {
            name: "colorScale".into(),
            kind: ParameterType::Float3,
            value: vec![0.0; 3],
        };
        assert!(value.set(&[1.0, 2.0, 3.0]).is_ok());
        assert_eq!(value.value, vec![1.0, 2.0, 3.0]);
        assert_eq!(
            value.set(&[1.0]).unwrap_err(),
            ValueError::ArityMismatch {
                parameter: "colorScale".into(),
                expected: 3,
                found: 1
            }
        );
    }

    #[test]
    fn clear_keeps_custom_selection_only() {
        let mut material = MaterialShader::new("paint");
        material.shader = ShaderChoice::Custom;
        material.custom_shader = "/tmp/a.xml".into();
        material.variation = Some("extra".into());
        material.variations = vec!["extra".into()];
        material.clear();
        assert_eq!(material.shader, ShaderChoice::Custom);
        assert!(material.custom_shader.is_empty());
        assert!(material.variation.is_none());
        assert!(material.variations.is_empty());

        material.shader = ShaderChoice::Named("vehicleShader".into());
        material.clear();
        assert_eq!(material.shader, ShaderChoice::None);
    }

    #[test]
    fn unknown_slots_are_reported() {
        let mut material = MaterialShader::new("paint");
        assert_eq!(
            material.set_parameter("ghost", &[1.0]).unwrap_err(),
            ValueError::UnknownParameter("ghost".into())
        );
        assert_eq!(
            material.set_texture_source("ghost", "a.png").unwrap_err(),
            ValueError::UnknownTexture("ghost".into())
        );
        assert_eq!(material.variation_choices(), ["None"]);
    }

    #[test]
    fn material_state_survives_toml() {
        let mut material = MaterialShader::new("paint");
        material.shader = ShaderChoice::Named("vehicleShader".into());
        material.variations = vec!["extra".into()];
        material.variation = Some("extra".into());
        material.parameters.push(ParameterValue {
            name: "colorScale".into(),
            kind: ParameterType::Float3,
            value: vec![1.0, 0.5, 0.25],
        });
        material.textures.push(TextureSlot {
            name: "detail".into(),
            source: "a.png".into(),
            default_source: "b.png".into(),
        });

        let encoded = toml::to_string(&material).unwrap();
        assert!(encoded.contains("shader = \"vehicleShader\""));
        let decoded: MaterialShader = toml::from_str(&encoded).unwrap();
        assert_eq!(decoded, material);
    }
}
