use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use catalog::{catalog_items, CatalogItemKind, CustomPathResolver, SessionCache};
use descriptor::{load_descriptor, ActiveSpecs, ShaderDescriptor};
use material::{
    migrate_materials, LoadStatus, MaterialShader, ShaderChoice, ShaderEnvironment, NO_VARIATION,
};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use crate::cli::{ApplyArgs, Command, GlobalArgs, InspectArgs, MigrateArgs};
use crate::paths::AppPaths;
use crate::settings::Settings;
use crate::store::MaterialStore;

pub fn initialise_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

pub struct Session {
    paths: AppPaths,
    settings: Settings,
    env: ShaderEnvironment,
}

impl Session {
    pub fn open(global: GlobalArgs) -> Result<Self> {
        let paths = AppPaths::discover()?;
        let settings = Settings::resolve(&paths, global.data_path, global.project_dir)?;
        let resolver = match &settings.project_dir {
            Some(dir) => CustomPathResolver::with_project_dir(dir),
            None => CustomPathResolver::new(),
        };
        let env = ShaderEnvironment::new(settings.data_path.clone(), resolver);
        tracing::debug!(
            config = %paths.config_dir().display(),
            data = ?settings.data_path,
            project = ?settings.project_dir,
            "resolved shaderpick settings"
        );
        Ok(Self {
            paths,
            settings,
            env,
        })
    }
}

pub fn run(command: Command, session: Session) -> Result<()> {
    match command {
        Command::List => run_list(&session),
        Command::Inspect(args) => run_inspect(&session, args),
        Command::Apply(args) => run_apply(&session, args),
        Command::Migrate(args) => run_migrate(&session, args),
        Command::Where => run_where(&session),
    }
}

fn run_list(session: &Session) -> Result<()> {
    let catalog = match SessionCache::global().get_or_scan(session.env.data_path()) {
        Ok(catalog) => Some(catalog),
        Err(err) => {
            tracing::warn!(error = %err, "shader catalog unavailable");
            None
        }
    };

    for item in catalog_items(catalog) {
        match item.kind {
            CatalogItemKind::Shader => println!("{}", item.id),
            CatalogItemKind::Unavailable => println!("{}", item.label),
            CatalogItemKind::Unselected | CatalogItemKind::Custom => {}
        }
    }
    Ok(())
}

#[derive(Debug, Serialize)]
struct InspectReport<'a> {
    shader: &'a str,
    path: PathBuf,
    variation: Option<&'a str>,
    variations: Vec<&'a str>,
    active_groups: &'a [String],
    #[serde(flatten)]
    active: ActiveSpecs,
}

fn run_inspect(session: &Session, args: InspectArgs) -> Result<()> {
    let path = locate_descriptor(&session.env, &args.shader)?;
    let descriptor: ShaderDescriptor = load_descriptor(&path)
        .with_context(|| format!("failed to load shader descriptor {}", path.display()))?;

    let variation = normalise_variation(args.variation);
    let activation = descriptor.activation(variation.as_deref())?;
    let active = descriptor.active_specs(&activation);

    let report = InspectReport {
        shader: &args.shader,
        path,
        variation: variation.as_deref(),
        variations: descriptor.variation_names().collect(),
        active_groups: activation.groups(),
        active,
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("Shader:     {} ({})", report.shader, report.path.display());
    println!(
        "Variation:  {}",
        report.variation.unwrap_or(NO_VARIATION)
    );
    println!("Variations: {}", report.variations.join(", "));
    println!("Groups:     {}", report.active_groups.join(", "));
    println!(
        "Declared:   {}",
        descriptor.parameter_groups().collect::<Vec<_>>().join(", ")
    );
    println!("Parameters:");
    for parameter in &report.active.parameters {
        let values: Vec<String> = parameter.default_value.iter().map(f32::to_string).collect();
        println!(
            "  {:<28} {:<7} {}",
            parameter.name,
            parameter.kind,
            values.join(" ")
        );
    }
    println!("Textures:");
    for texture in &report.active.textures {
        println!("  {:<28} {}", texture.name, texture.default_file);
    }
    Ok(())
}

/// A catalog name resolves inside the data directory; anything else is a path.
fn locate_descriptor(env: &ShaderEnvironment, shader: &str) -> Result<PathBuf> {
    if let Ok(catalog) = SessionCache::global().get_or_scan(env.data_path()) {
        if let Some(path) = catalog.descriptor_path(shader) {
            return Ok(path.to_path_buf());
        }
    }
    let path = env
        .resolver()
        .resolve(shader)
        .with_context(|| format!("failed to resolve shader path '{shader}'"))?;
    if !path.is_file() {
        bail!(
            "'{shader}' is neither a known shader nor an existing descriptor file"
        );
    }
    Ok(path)
}

fn normalise_variation(variation: Option<String>) -> Option<String> {
    variation.filter(|name| !name.is_empty() && name != NO_VARIATION)
}

fn run_apply(session: &Session, args: ApplyArgs) -> Result<()> {
    let mut store = MaterialStore::load_or_default(&args.materials)?;
    let material = store.get_or_insert(&args.material);

    if let Some(shader) = args.shader {
        let status = material.select_shader(ShaderChoice::from(shader), &session.env);
        report_status(material, &status);
    }
    if let Some(custom) = args.custom {
        let status = material.set_custom_shader(&custom, &session.env);
        report_status(material, &status);
    }
    if let Some(variation) = args.variation {
        let status = material.select_variation(normalise_variation(Some(variation)), &session.env);
        report_status(material, &status);
    }
    for (name, values) in &args.set {
        material.set_parameter(name, values)?;
    }
    for (name, file) in &args.textures {
        material.set_texture_source(name, file)?;
    }

    print_material(material);
    store.persist(&args.materials)?;
    Ok(())
}

fn report_status(material: &MaterialShader, status: &LoadStatus) {
    if let LoadStatus::Cleared(reason) = status {
        eprintln!(
            "warning: shader for material '{}' was cleared: {reason}",
            material.name
        );
    }
}

fn print_material(material: &MaterialShader) {
    println!("Material:   {}", material.name);
    println!("Shader:     {}", material.shader);
    if material.shader == ShaderChoice::Custom {
        println!("Custom:     {}", material.custom_shader);
    }
    println!(
        "Variation:  {} (choices: {})",
        material.variation.as_deref().unwrap_or(NO_VARIATION),
        material.variation_choices().join(", ")
    );
    for parameter in &material.parameters {
        let values: Vec<String> = parameter.value.iter().map(f32::to_string).collect();
        println!("  {:<28} {}", parameter.name, values.join(" "));
    }
    for texture in &material.textures {
        let marker = if texture.is_default() { " (default)" } else { "" };
        println!("  {:<28} {}{marker}", texture.name, texture.source);
    }
}

fn run_migrate(session: &Session, args: MigrateArgs) -> Result<()> {
    let mut store = MaterialStore::load_or_default(&args.materials)?;
    let catalog = SessionCache::global()
        .get_or_scan(session.env.data_path())
        .ok();
    let report = migrate_materials(&mut store.materials, &session.env, catalog)
        .context("shader migration failed")?;

    for migrated in &report.migrated {
        match &migrated.shader {
            ShaderChoice::Custom => println!(
                "  migrated {:<24} -> custom {}",
                migrated.material, migrated.custom_shader
            ),
            shader => println!("  migrated {:<24} -> {shader}", migrated.material),
        }
    }
    for skipped in &report.skipped {
        println!("  skipped  {:<24} {}", skipped.material, skipped.reason);
    }

    if args.dry_run {
        println!("Dry-run: {} not modified.", args.materials.display());
    } else if !report.migrated.is_empty() {
        store.persist(&args.materials)?;
    }
    Ok(())
}

fn run_where(session: &Session) -> Result<()> {
    println!("Configuration:");
    println!("  config:   {}", session.paths.config_dir().display());
    println!("  settings: {}", session.paths.settings_file().display());
    println!("  data:     {}", display_opt(session.settings.data_path.as_deref()));
    println!("  project:  {}", display_opt(session.settings.project_dir.as_deref()));
    if let Some(data) = session.env.data_path() {
        match SessionCache::global().get_or_scan(Some(data)) {
            Ok(catalog) => println!(
                "  shaders:  {} ({} descriptors)",
                catalog.shader_dir().display(),
                catalog.entries().len()
            ),
            Err(err) => println!("  shaders:  {err}"),
        }
        println!(
            "  legacy:   {}",
            data.join(material::LEGACY_SUPPORT_DIR).display()
        );
    }
    Ok(())
}

fn display_opt(path: Option<&Path>) -> String {
    path.map(|path| path.display().to_string())
        .unwrap_or_else(|| "(not set)".to_string())
}
