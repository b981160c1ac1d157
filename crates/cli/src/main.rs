//! Generate embedded menu code for a project.
//!
//! Examples:
//!   menu-codegen --project ./myMenu/myMenu.json
//!   menu-codegen --project ./myMenu/myMenu.json --plugins ./plugins --platform ARDUINO32
//!   menu-codegen --project ./myMenu/myMenu.json --save-to-src --recursive-naming
//!   menu-codegen --list-platforms
//!
//! Notes:
//! - The project directory is the directory holding the project file; its name
//!   is the project name used for the generated files.
//! - Options given on the command line are stored back into the project file.

use std::{
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use clap::Parser;

use menu_codegen_core::prelude::*;

const APP_ID: &str = "menu-codegen";

// ───────────────────────────── CLI Args ─────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "menu-codegen",
    version,
    about = "Generate embedded menu code from a menu project"
)]
struct Args {
    /// Project file (JSON) holding the menu items and generator options [REQUIRED]
    #[arg(short, long, required_unless_present = "list_platforms")]
    project: Option<PathBuf>,

    /// Directory holding plugin descriptors (<id>.json or <id>/plugin.json)
    #[arg(long, value_name = "DIR")]
    plugins: Option<PathBuf>,

    /// Target board id, e.g. ARDUINO, ARDUINO32, MBED_RTOS
    #[arg(long)]
    platform: Option<EmbeddedPlatform>,

    /// Prefix variable names with their parent sub menu names
    #[arg(long, conflicts_with = "no_recursive_naming")]
    recursive_naming: bool,

    /// Use plain item names (turns a saved --recursive-naming off)
    #[arg(long)]
    no_recursive_naming: bool,

    /// Write generated files into <project>/src
    #[arg(long, conflicts_with = "no_save_to_src")]
    save_to_src: bool,

    /// Write generated files next to the project file (turns a saved --save-to-src off)
    #[arg(long)]
    no_save_to_src: bool,

    /// Arduino libraries directory (defaults to <Documents>/Arduino/libraries)
    #[arg(long, value_name = "DIR")]
    library_dir: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Print all supported boards and exit
    #[arg(long)]
    list_platforms: bool,
}

// ───────────────────────────── Logger ─────────────────────────────

#[derive(Clone)]
struct StderrLogger {
    verbose: bool,
}

impl CoreLog for StderrLogger {
    fn info(&self, msg: &str) {
        println!("INFO:  {msg}");
    }
    fn warn(&self, msg: &str) {
        eprintln!("WARN:  {msg}");
    }
    fn error(&self, msg: &str) {
        eprintln!("ERROR: {msg}");
    }
    fn debug(&self, msg: &str) {
        if self.verbose {
            println!("DEBUG: {msg}");
        }
    }
}

// ───────────────────────────── main ─────────────────────────────

fn main() -> Result<(), String> {
    let args = Args::parse();

    // Quick info mode
    if args.list_platforms {
        print_platforms();
        return Ok(());
    }

    let core_log: Arc<dyn CoreLog> = Arc::new(StderrLogger {
        verbose: args.verbose,
    });
    let log_file = match init_file_log() {
        Ok(p) => Some(p),
        Err(e) => {
            core_log.warn(&format!("persistent log unavailable: {e}"));
            None
        }
    };

    let project_path = args
        .project
        .as_deref()
        .ok_or("--project is required")?;
    let project_path = fs::canonicalize(project_path)
        .map_err(|e| format!("--project not found: {}: {e}", project_path.display()))?;
    let directory = project_path
        .parent()
        .map(Path::to_path_buf)
        .ok_or_else(|| format!("project has no directory: {}", project_path.display()))?;
    core_log.info(&format!("Project: {}", project_path.display()));

    let mut project = ProjectFile::load(&project_path)?;
    apply_overrides(&args, &mut project.code_options);
    let (uuid, created) = project.code_options.ensure_uuid();
    if created {
        core_log.info(&format!("Assigned application UUID {uuid}"));
    }

    let tree = project.to_tree()?;
    core_log.debug(&format!("{} menu items loaded", tree.len()));

    let mut creators = load_creators(&project.code_options, args.plugins.as_deref(), &core_log)?;
    for c in creators.iter_mut() {
        apply_last_properties(&mut c.properties, &project.code_options.last_properties);
    }
    if let Err(errors) = validate_properties(creators.iter().flat_map(|c| c.properties.iter())) {
        for e in &errors {
            core_log.error(e);
        }
        return Err(format!("{} plugin properties are invalid", errors.len()));
    }
    for p in creators.iter().flat_map(|c| c.properties.iter()) {
        core_log.debug(&format!("{}/{} = {}", p.subsystem, p.name, p.latest_value()));
    }

    let installer = ArduinoLibraryInstaller::new(args.library_dir.clone());
    let mut generator = CodeGenerator::new(
        Box::new(ArduinoSketchAdjuster::new()),
        Box::new(installer),
        project.code_options.clone(),
        core_log.clone(),
    );
    if let Some(p) = log_file.as_ref() {
        generator = generator.with_log_location(p);
    }

    let outcome = generator.start_conversion(
        &directory,
        &creators,
        &tree,
        &project.code_options.last_plugin_files,
    );

    let result = match outcome {
        ConversionOutcome::Completed { plugin_files } => {
            project.code_options.last_plugin_files = plugin_files;
            project.code_options.last_properties = creators
                .iter()
                .flat_map(|c| c.properties.iter())
                .map(LastProperty::from)
                .collect();
            Ok(())
        }
        ConversionOutcome::Failed { at } => Err(format!("conversion failed during {at}")),
    };

    // Persist options (and a freshly assigned UUID) even when the run failed.
    project.save(&project_path)?;
    core_log.debug(&format!("Saved {}", project_path.display()));
    result
}

// ───────────────────────────── helpers ─────────────────────────────

fn print_platforms() {
    println!("Supported boards:");
    for p in EmbeddedPlatform::iter() {
        println!("  {:<16} {}", p.board_id(), p.friendly_name());
    }
}

/// `<data dir>/menu-codegen`, created when missing.
fn appdata_dir() -> Result<PathBuf, String> {
    let base = directories::BaseDirs::new().ok_or("Could not find user data directory")?;
    let dir = base.data_dir().join(APP_ID);
    fs::create_dir_all(&dir).map_err(|e| e.to_string())?;
    Ok(dir)
}

/// Route `tracing` output to the persistent log file. `RUST_LOG` overrides the
/// default `info` filter.
fn init_file_log() -> Result<PathBuf, String> {
    let path = appdata_dir()?.join(format!("{APP_ID}.log"));
    let file = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(|e| format!("open {}: {e}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_ansi(false)
        .with_writer(Mutex::new(file))
        .try_init()
        .map_err(|e| e.to_string())?;
    Ok(path)
}

fn apply_overrides(args: &Args, options: &mut GeneratorOptions) {
    if let Some(p) = args.platform {
        options.platform = p;
    }
    if let Some(on) = switch(args.recursive_naming, args.no_recursive_naming) {
        options.naming_recursive = on;
    }
    if let Some(on) = switch(args.save_to_src, args.no_save_to_src) {
        options.save_to_src = on;
    }
}

/// `--x` / `--no-x` pair; `None` keeps the saved value.
fn switch(on: bool, off: bool) -> Option<bool> {
    match (on, off) {
        (true, _) => Some(true),
        (_, true) => Some(false),
        _ => None,
    }
}

/// Selected display, input and remote plugins, in that order.
fn load_creators(
    options: &GeneratorOptions,
    plugins: Option<&Path>,
    logger: &Arc<dyn CoreLog>,
) -> Result<Vec<CodeCreator>, String> {
    let ids: Vec<&str> = options.selected_plugins().collect();
    if ids.is_empty() {
        logger.info("No plugins selected");
        return Ok(Vec::new());
    }
    let dir = plugins.ok_or("project selects plugins but --plugins was not given")?;
    ids.into_iter()
        .map(|id| {
            let creator = CodeCreator::load_by_id(dir, id)?;
            logger.info(&format!(
                "Plugin {} ({}) for {}",
                creator.name, creator.id, creator.subsystem
            ));
            Ok(creator)
        })
        .collect()
}
