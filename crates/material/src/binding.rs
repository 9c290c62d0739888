//! Drives a `MaterialShader` through shader and variation changes.
//!
//! Every operation re-reads the descriptor the material points at. A missing,
//! unreadable or malformed descriptor is never surfaced as an error: the
//! material is reverted to the "no shader" state and the reason is handed back
//! in [`LoadStatus::Cleared`] for the host to report.
use std::path::{Path, PathBuf};

use catalog::{CustomPathResolver, PathError, DESCRIPTOR_EXTENSION, SHADER_SUBDIR};
use descriptor::{load_descriptor, ActivationSet, DescriptorError, ShaderDescriptor};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::state::{MaterialShader, ParameterValue, ShaderChoice, TextureSlot};

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no game data path configured")]
    NoDataPath,

    #[error(transparent)]
    Path(#[from] PathError),

    #[error(transparent)]
    Descriptor(#[from] DescriptorError),
}

#[derive(Debug)]
pub enum LoadStatus {
    /// Descriptor read and material state rebuilt.
    Loaded,
    /// Nothing to load: no shader picked, or the request changed nothing.
    Idle,
    /// Descriptor unavailable; the material was cleared.
    Cleared(LoadError),
}

impl LoadStatus {
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Loaded)
    }
}

/// Where descriptors live for the current session.
#[derive(Debug, Clone, Default)]
pub struct ShaderEnvironment {
    data_path: Option<PathBuf>,
    resolver: CustomPathResolver,
}

impl ShaderEnvironment {
    pub fn new(data_path: Option<PathBuf>, resolver: CustomPathResolver) -> Self {
        Self {
            data_path: data_path.filter(|path| !path.as_os_str().is_empty()),
            resolver,
        }
    }

    pub fn data_path(&self) -> Option<&Path> {
        self.data_path.as_deref()
    }

    pub fn resolver(&self) -> &CustomPathResolver {
        &self.resolver
    }

    pub fn named_descriptor(&self, name: &str) -> Option<PathBuf> {
        self.data_path.as_ref().map(|data| {
            data.join(SHADER_SUBDIR)
                .join(format!("{name}.{DESCRIPTOR_EXTENSION}"))
        })
    }

    /// Descriptor file `material` currently points at, if any.
    pub fn descriptor_path(&self, material: &MaterialShader) -> Result<Option<PathBuf>, LoadError> {
        match &material.shader {
            ShaderChoice::None => Ok(None),
            ShaderChoice::Custom if material.custom_shader.trim().is_empty() => Ok(None),
            ShaderChoice::Custom => Ok(Some(self.resolver.resolve(&material.custom_shader)?)),
            ShaderChoice::Named(name) => self
                .named_descriptor(name)
                .map(Some)
                .ok_or(LoadError::NoDataPath),
        }
    }
}

impl MaterialShader {
    fn read_descriptor(
        &self,
        env: &ShaderEnvironment,
    ) -> Result<Option<ShaderDescriptor>, LoadError> {
        let Some(path) = env.descriptor_path(self)? else {
            return Ok(None);
        };
        debug!(material = %self.name, path = %path.display(), "loading shader descriptor");
        Ok(Some(load_descriptor(&path)?))
    }

    fn revert(&mut self, err: LoadError) -> LoadStatus {
        warn!(
            material = %self.name,
            shader = %self.shader,
            error = %err,
            "shader descriptor unavailable; clearing shader"
        );
        self.clear();
        LoadStatus::Cleared(err)
    }

    /// Re-read the variation list without touching anything else.
    pub(crate) fn refresh_variations(&mut self, env: &ShaderEnvironment) -> Result<(), LoadError> {
        let names = match self.read_descriptor(env)? {
            Some(descriptor) => descriptor.variation_names().map(str::to_string).collect(),
            None => Vec::new(),
        };
        self.variations = names;
        Ok(())
    }

    /// Reload the variation list and reset the active variation.
    pub fn load_shader(&mut self, env: &ShaderEnvironment) -> LoadStatus {
        match self.read_descriptor(env) {
            Ok(None) => LoadStatus::Idle,
            Ok(Some(descriptor)) => {
                self.variations = descriptor.variation_names().map(str::to_string).collect();
                self.variation = None;
                info!(
                    material = %self.name,
                    shader = %self.shader,
                    variations = self.variations.len(),
                    "loaded shader"
                );
                LoadStatus::Loaded
            }
            Err(err) => self.revert(err),
        }
    }

    /// Rebuild parameters and textures from the groups the active variation
    /// switches on, resetting every value to its descriptor default.
    pub fn load_variation(&mut self, env: &ShaderEnvironment) -> LoadStatus {
        let descriptor = match self.read_descriptor(env) {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => return LoadStatus::Idle,
            Err(err) => return self.revert(err),
        };

        let active = match descriptor.select(self.variation.as_deref()) {
            Ok(active) => active,
            Err(err) => {
                warn!(material = %self.name, error = %err, "falling back to no variation");
                self.variation = None;
                descriptor.active_specs(&ActivationSet::without_variation())
            }
        };

        self.parameters = active.parameters.iter().map(ParameterValue::from_spec).collect();
        self.textures = active.textures.iter().map(TextureSlot::from_spec).collect();
        debug!(
            material = %self.name,
            variation = self.variation.as_deref(),
            parameters = self.parameters.len(),
            textures = self.textures.len(),
            "applied shader variation"
        );
        LoadStatus::Loaded
    }

    fn load_shader_and_variation(&mut self, env: &ShaderEnvironment) -> LoadStatus {
        match self.load_shader(env) {
            LoadStatus::Loaded => self.load_variation(env),
            other => other,
        }
    }

    /// Change the shader field. Picking a catalog shader loads it; picking
    /// `None` or `Custom` clears the material.
    pub fn select_shader(&mut self, choice: ShaderChoice, env: &ShaderEnvironment) -> LoadStatus {
        if self.shader == choice {
            return LoadStatus::Idle;
        }
        self.shader = choice;

        if self.shader.named().is_some() {
            self.custom_shader.clear();
            self.load_shader_and_variation(env)
        } else {
            self.clear();
            LoadStatus::Idle
        }
    }

    /// Point the material at a custom descriptor file and load it.
    pub fn set_custom_shader(&mut self, path: &str, env: &ShaderEnvironment) -> LoadStatus {
        if self.custom_shader == path && self.shader == ShaderChoice::Custom {
            return LoadStatus::Idle;
        }
        // State loaded from the previous descriptor never outlives a path change.
        self.shader = ShaderChoice::Custom;
        self.clear();
        self.custom_shader = path.to_string();
        if path.trim().is_empty() {
            return LoadStatus::Idle;
        }
        self.load_shader_and_variation(env)
    }

    /// Change the active variation (`None` for no variation) and rebuild the
    /// parameter and texture lists.
    pub fn select_variation(
        &mut self,
        variation: Option<String>,
        env: &ShaderEnvironment,
    ) -> LoadStatus {
        if self.variation == variation {
            return LoadStatus::Idle;
        }
        self.variation = variation;
        self.load_variation(env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const PAINT: &str = r#"<CustomShader>
        <Parameters>
            <Parameter name="colorScale" type="float3" defaultValue="1 0.5 0.25 1" />
            <Parameter name="smoothness" type="float" group="base" defaultValue="0.4" />
            <Parameter name="dirt" type="float2" group="dirt" defaultValue="0.2 0.3" />
        </Parameters>
        <Textures>
            <Texture name="detail" defaultColorProfile="sRGB" defaultFilename="detail.png" />
            <Texture name="dirtMask" group="dirt" defaultColorProfile="linearRGB" />
        </Textures>
        <Variations>
            <Variation name="dirty" groups="dirt" />
        </Variations>
    </CustomShader>"#;

    fn environment(shaders: &[(&str, &str)]) -> (tempfile::TempDir, ShaderEnvironment) {
        let temp = tempfile::tempdir().unwrap();
        let shader_dir = temp.path().join(SHADER_SUBDIR);
        fs::create_dir_all(&shader_dir).unwrap();
        for (name, contents) in shaders {
            fs::write(shader_dir.join(format!("{name}.xml")), contents).unwrap();
        }
        let env = ShaderEnvironment::new(
            Some(temp.path().to_path_buf()),
            CustomPathResolver::with_project_dir(temp.path()),
        );
        (temp, env)
    }

    fn parameter_names(material: &MaterialShader) -> Vec<&str> {
        material.parameters.iter().map(|p| p.name.as_str()).collect()
    }

    #[test]
    fn selecting_a_shader_loads_base_parameters() {
        let (_temp, env) = environment(&[("paint", PAINT)]);
        let mut material = MaterialShader::new("body");

        let status = material.select_shader(ShaderChoice::from("paint"), &env);
        assert!(status.is_loaded());
        assert_eq!(material.variation_choices(), ["None", "dirty"]);
        assert!(material.variation.is_none());
        assert_eq!(parameter_names(&material), ["colorScale", "smoothness"]);
        assert_eq!(material.parameter("colorScale").unwrap().value, vec![1.0, 0.5, 0.25]);
        assert_eq!(material.textures.len(), 1);
        assert_eq!(material.texture("detail").unwrap().source, "detail.png");
    }

    #[test]
    fn selecting_a_variation_swaps_groups() {
        let (_temp, env) = environment(&[("paint", PAINT)]);
        let mut material = MaterialShader::new("body");
        material.select_shader(ShaderChoice::from("paint"), &env);

        let status = material.select_variation(Some("dirty".into()), &env);
        assert!(status.is_loaded());
        assert_eq!(parameter_names(&material), ["colorScale", "dirt"]);
        let textures: Vec<_> = material.textures.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(textures, ["detail", "dirtMask"]);

        assert!(matches!(
            material.select_variation(Some("dirty".into()), &env),
            LoadStatus::Idle
        ));
    }

    #[test]
    fn unknown_variation_falls_back_to_base() {
        let (_temp, env) = environment(&[("paint", PAINT)]);
        let mut material = MaterialShader::new("body");
        material.select_shader(ShaderChoice::from("paint"), &env);

        assert!(material
            .select_variation(Some("ghost".into()), &env)
            .is_loaded());
        assert!(material.variation.is_none());
        assert_eq!(parameter_names(&material), ["colorScale", "smoothness"]);
    }

    #[test]
    fn broken_descriptor_clears_material() {
        let (_temp, env) = environment(&[
            ("paint", PAINT),
            ("broken", "<CustomShader><Parameters></CustomShader>"),
            ("foreign", "<materialx/>"),
        ]);
        let mut material = MaterialShader::new("body");
        material.select_shader(ShaderChoice::from("paint"), &env);
        assert!(!material.parameters.is_empty());

        let status = material.select_shader(ShaderChoice::from("broken"), &env);
        assert!(matches!(
            status,
            LoadStatus::Cleared(LoadError::Descriptor(DescriptorError::Malformed(_)))
        ));
        assert_eq!(material.shader, ShaderChoice::None);
        assert!(material.parameters.is_empty());
        assert!(material.textures.is_empty());
        assert!(material.variations.is_empty());

        let status = material.select_shader(ShaderChoice::from("foreign"), &env);
        assert!(matches!(
            status,
            LoadStatus::Cleared(LoadError::Descriptor(DescriptorError::UnexpectedRoot(_)))
        ));

        let status = material.select_shader(ShaderChoice::from("absent"), &env);
        assert!(matches!(
            status,
            LoadStatus::Cleared(LoadError::Descriptor(DescriptorError::Missing(_)))
        ));
    }

    #[test]
    fn custom_shader_loads_from_project_relative_path() {
        let (temp, env) = environment(&[]);
        fs::create_dir_all(temp.path().join("custom")).unwrap();
        fs::write(temp.path().join("custom/mine.xml"), PAINT).unwrap();

        let mut material = MaterialShader::new("body");
        assert!(matches!(
            material.select_shader(ShaderChoice::Custom, &env),
            LoadStatus::Idle
        ));
        let status = material.set_custom_shader("//custom/mine.xml", &env);
        assert!(status.is_loaded());
        assert_eq!(material.shader, ShaderChoice::Custom);
        assert_eq!(parameter_names(&material), ["colorScale", "smoothness"]);

        let status = material.set_custom_shader("//custom/missing.xml", &env);
        assert!(matches!(status, LoadStatus::Cleared(_)));
        assert_eq!(material.shader, ShaderChoice::Custom);
        assert!(material.custom_shader.is_empty());
    }

    #[test]
    fn empty_custom_path_drops_previous_shader_state() {
        let (_temp, env) = environment(&[("paint", PAINT)]);
        let mut material = MaterialShader::new("body");
        material.select_shader(ShaderChoice::from("paint"), &env);
        material.select_variation(Some("dirty".into()), &env);
        assert!(!material.parameters.is_empty());

        let status = material.set_custom_shader("", &env);
        assert!(matches!(status, LoadStatus::Idle));
        assert_eq!(material.shader, ShaderChoice::Custom);
        assert!(material.custom_shader.is_empty());
        assert!(material.variation.is_none());
        assert!(material.variations.is_empty());
        assert!(material.parameters.is_empty());
        assert!(material.textures.is_empty());
    }

    #[test]
    fn unreadable_descriptor_clears_material() {
        let (temp, env) = environment(&[("paint", PAINT)]);
        fs::create_dir_all(temp.path().join("custom/folder.xml")).unwrap();
        let mut material = MaterialShader::new("body");
        material.select_shader(ShaderChoice::from("paint"), &env);
        assert!(!material.parameters.is_empty());

        let status = material.set_custom_shader("//custom/folder.xml", &env);
        assert!(matches!(
            status,
            LoadStatus::Cleared(LoadError::Descriptor(DescriptorError::Unreadable { .. }))
        ));
        assert_eq!(material.shader, ShaderChoice::Custom);
        assert!(material.custom_shader.is_empty());
        assert!(material.parameters.is_empty());
        assert!(material.variations.is_empty());
    }

    #[test]
    fn named_shader_requires_data_path() {
        let env = ShaderEnvironment::default();
        let mut material = MaterialShader::new("body");
        let status = material.select_shader(ShaderChoice::from("paint"), &env);
        assert!(matches!(status, LoadStatus::Cleared(LoadError::NoDataPath)));
        assert_eq!(material.shader, ShaderChoice::None);
    }

    #[test]
    fn deselecting_clears_loaded_state() {
        let (_temp, env) = environment(&[("paint", PAINT)]);
        let mut material = MaterialShader::new("body");
        material.select_shader(ShaderChoice::from("paint"), &env);
        material.select_shader(ShaderChoice::None, &env);
        assert!(material.parameters.is_empty());
        assert!(material.variations.is_empty());
    }

    #[test]
    fn edits_survive_until_variation_changes() {
        let (_temp, env) = environment(&[("paint", PAINT)]);
        let mut material = MaterialShader::new("body");
        material.select_shader(ShaderChoice::from("paint"), &env);
        material.set_parameter("smoothness", &[0.9]).unwrap();
        material.set_texture_source("detail", "mine.png").unwrap();
        assert!(!material.texture("detail").unwrap().is_default());

        material.select_variation(Some("dirty".into()), &env);
        material.select_variation(None, &env);
        assert_eq!(material.parameter("smoothness").unwrap().value, vec![0.4]);
        assert!(material.texture("detail").unwrap().is_default());
    }
}
