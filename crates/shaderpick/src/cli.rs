use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(
    name = "shaderpick",
    author,
    version,
    about = "Inspect custom shader descriptors and bind them to materials"
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Game data directory containing `shaders/` (overrides settings and `SHADERPICK_DATA_PATH`).
    #[arg(long, global = true, value_name = "DIR")]
    pub data_path: Option<PathBuf>,

    /// Directory that `//`-prefixed custom shader paths are relative to.
    #[arg(long, global = true, value_name = "DIR")]
    pub project_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the shaders available in the data directory.
    List,
    /// Show the variations, parameters and textures of a shader.
    Inspect(InspectArgs),
    /// Change the shader, variation or values of a material in a material file.
    Apply(ApplyArgs),
    /// Move materials that still carry a legacy shader path onto the shader picker.
    Migrate(MigrateArgs),
    /// Print the resolved configuration.
    Where,
}

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Catalog shader name, or a path to a descriptor file.
    #[arg(value_name = "SHADER|PATH")]
    pub shader: String,

    /// Variation to activate (defaults to none).
    #[arg(long, value_name = "NAME")]
    pub variation: Option<String>,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug)]
pub struct ApplyArgs {
    /// Material TOML file (created when missing).
    #[arg(value_name = "MATERIALS")]
    pub materials: PathBuf,

    /// Material to modify (created when missing).
    #[arg(value_name = "MATERIAL")]
    pub material: String,

    /// Catalog shader to select (`None` to deselect).
    #[arg(long, value_name = "NAME", conflicts_with = "custom")]
    pub shader: Option<String>,

    /// Custom descriptor path to load.
    #[arg(long, value_name = "PATH")]
    pub custom: Option<String>,

    /// Variation to select (`None` for no variation).
    #[arg(long, value_name = "NAME")]
    pub variation: Option<String>,

    /// Parameter override, e.g. `colorScale=1,0.5,0.25`. Repeatable.
    #[arg(long = "set", value_name = "NAME=VALUES", value_parser = parse_assignment)]
    pub set: Vec<(String, Vec<f32>)>,

    /// Texture override, e.g. `detailDiffuse=textures/detail.png`. Repeatable.
    #[arg(long = "texture", value_name = "NAME=FILE", value_parser = parse_texture)]
    pub textures: Vec<(String, String)>,
}

#[derive(Args, Debug)]
pub struct MigrateArgs {
    /// Material TOML file to migrate in place.
    #[arg(value_name = "MATERIALS")]
    pub materials: PathBuf,

    /// Report what would change without writing the file.
    #[arg(long)]
    pub dry_run: bool,
}

pub fn parse() -> Cli {
    Cli::parse()
}

pub fn parse_assignment(value: &str) -> Result<(String, Vec<f32>), String> {
    let (name, raw) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUES, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("parameter name must not be empty".into());
    }
    let values = raw
        .split([',', ' '])
        .filter(|token| !token.is_empty())
        .map(|token| {
            token
                .parse::<f32>()
                .map_err(|_| format!("invalid number '{token}' for parameter '{name}'"))
        })
        .collect::<Result<Vec<_>, _>>()?;
    if values.is_empty() {
        return Err(format!("parameter '{name}' needs at least one value"));
    }
    Ok((name.to_string(), values))
}

pub fn parse_texture(value: &str) -> Result<(String, String), String> {
    let (name, file) = value
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=FILE, got '{value}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err("texture name must not be empty".into());
    }
    Ok((name.to_string(), file.trim().to_string()))
}
