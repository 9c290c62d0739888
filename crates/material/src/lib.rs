mod binding;
mod migrate;
mod state;

pub use binding::{LoadError, LoadStatus, ShaderEnvironment};
pub use migrate::{
    migrate_materials, MigratedMaterial, MigrationError, MigrationReport, SkippedMaterial,
    LEGACY_SUPPORT_DIR,
};
pub use state::{
    MaterialShader, ParameterValue, ShaderChoice, TextureSlot, ValueError, NO_VARIATION,
};
