// ZSleuth - main.rs
//
// Application entry point. Handles:
// 1. CLI argument parsing
// 2. Config loading, then logging initialisation
// 3. Running the selected pipeline
// 4. Optional export and the chart viewer launch

mod gui;

// Re-export modules from the library crate so that `gui.rs` can use
// `crate::app::...`, `crate::core::...` etc.
pub use zsleuth::app;
pub use zsleuth::core;
pub use zsleuth::platform;
pub use zsleuth::ui;
pub use zsleuth::util;

use crate::app::pipeline::{self, BySubfolderSettings, ByWellSettings};
use crate::app::state::ViewerState;
use crate::core::model::PipelineKind;
use crate::platform::config::AppConfig;
use crate::util::error::{ConfigError, ZSleuthError};
use clap::{Args, Parser, Subcommand};
use std::error::Error;
use std::path::{Path, PathBuf};

/// ZSleuth - Z-focus quality control for plate imaging runs.
///
/// Walks an imaging run directory, reads plate, well, and Z position from
/// each image file name, and charts the Z distribution.
#[derive(Parser, Debug)]
#[command(name = "zsleuth", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Config file (defaults to the platform config directory).
    #[arg(short = 'c', long = "config", global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging (equivalent to RUST_LOG=debug).
    #[arg(short = 'd', long = "debug", global = true)]
    debug: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Z by well and plate, split into rig 1 and rig 2.
    ByWell(ByWellArgs),
    /// Z distribution per top-level subfolder.
    BySubfolder(BySubfolderArgs),
}

/// Options shared by both pipelines.
#[derive(Args, Debug)]
struct RunArgs {
    /// Run directory to scan (opens a folder dialog if omitted).
    path: Option<PathBuf>,

    /// Grammar TOML replacing the built-in file name grammar.
    #[arg(short = 'g', long = "grammar")]
    grammar: Option<PathBuf>,

    /// Skip directories whose path contains this marker.
    #[arg(short = 'x', long = "exclude", conflicts_with = "no_exclude")]
    exclude: Option<String>,

    /// Descend into every directory.
    #[arg(long = "no-exclude")]
    no_exclude: bool,

    /// Write the extracted table to a .csv or .json file.
    #[arg(short = 'o', long = "export")]
    export: Option<PathBuf>,

    /// Do not open the chart viewer.
    #[arg(long = "no-gui")]
    no_gui: bool,
}

#[derive(Args, Debug)]
struct ByWellArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Dataset label shown in chart titles.
    #[arg(long = "dataset")]
    dataset: Option<String>,

    /// Reference Z line for rig 1 charts.
    #[arg(long = "rig1-ref")]
    rig1_reference: Option<f64>,

    /// Reference Z line for rig 2 charts.
    #[arg(long = "rig2-ref")]
    rig2_reference: Option<f64>,
}

#[derive(Args, Debug)]
struct BySubfolderArgs {
    #[command(flatten)]
    run: RunArgs,

    /// Imaging week label shown in the chart title.
    #[arg(long = "week")]
    week: Option<String>,
}

fn main() {
    let cli = Cli::parse();

    // Config is read first so its log level can seed the subscriber; its
    // warnings are replayed once logging is up.
    let config_path = cli
        .config
        .clone()
        .unwrap_or_else(|| crate::platform::config::PlatformPaths::resolve().config_file());
    let (config, config_warnings) = crate::platform::config::load_config(&config_path);

    crate::util::logging::init(cli.debug, config.log_level.as_deref());

    tracing::info!(
        version = crate::util::constants::APP_VERSION,
        debug = cli.debug,
        config = %config_path.display(),
        "ZSleuth starting"
    );
    for w in &config_warnings {
        tracing::warn!("{w}");
    }

    if let Err(e) = run(cli, config, &config_path) {
        tracing::error!(error = %e, "Run failed");
        eprintln!("Error: {e}");
        let mut source = e.source();
        while let Some(cause) = source {
            eprintln!("  caused by: {cause}");
            source = cause.source();
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, mut config: AppConfig, config_path: &Path) -> Result<(), ZSleuthError> {
    if cli.config.is_some() && !config_path.exists() {
        return Err(ConfigError::Io {
            path: config_path.to_path_buf(),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "config file not found"),
        }
        .into());
    }

    match cli.command {
        Command::ByWell(args) => {
            apply_run_args(&mut config, PipelineKind::ByWell, &args.run);
            if let Some(dataset) = args.dataset {
                config.dataset_label = dataset;
            }
            if let Some(v) = args.rig1_reference {
                config.rig1_reference = v;
            }
            if let Some(v) = args.rig2_reference {
                config.rig2_reference = v;
            }

            let root = resolve_root(args.run.path.as_deref(), &config, args.run.no_gui)?;
            let grammar = crate::app::grammar_mgr::load_grammar(
                PipelineKind::ByWell,
                config.by_well.grammar_file.as_deref(),
            )?;
            let settings = ByWellSettings::from_config(&config, grammar);
            let report = pipeline::run_by_well(&root, &settings)?;

            if let Some(ref dest) = args.run.export {
                crate::core::export::export_to_path(&report.table, dest)?;
            }
            if args.run.no_gui {
                return Ok(());
            }
            launch_gui(ViewerState::from_by_well(report))
        }
        Command::BySubfolder(args) => {
            apply_run_args(&mut config, PipelineKind::BySubfolder, &args.run);
            if let Some(week) = args.week {
                config.week_label = week;
            }

            let root = resolve_root(args.run.path.as_deref(), &config, args.run.no_gui)?;
            let grammar = crate::app::grammar_mgr::load_grammar(
                PipelineKind::BySubfolder,
                config.by_subfolder.grammar_file.as_deref(),
            )?;
            let settings = BySubfolderSettings::from_config(&config, grammar);
            let report = pipeline::run_by_subfolder(&root, &settings)?;

            println!("{}", pipeline::format_pair_listing(&report.table));

            if let Some(ref dest) = args.run.export {
                crate::core::export::export_to_path(&report.table, dest)?;
            }
            if args.run.no_gui {
                return Ok(());
            }
            launch_gui(ViewerState::from_by_subfolder(report))
        }
    }
}

/// Fold the shared CLI overrides into the config for `kind`.
fn apply_run_args(config: &mut AppConfig, kind: PipelineKind, args: &RunArgs) {
    let overrides = match kind {
        PipelineKind::ByWell => &mut config.by_well,
        PipelineKind::BySubfolder => &mut config.by_subfolder,
    };
    if let Some(ref grammar) = args.grammar {
        overrides.grammar_file = Some(grammar.clone());
    }
    if args.no_exclude {
        overrides.exclusion_marker = None;
    } else if let Some(ref marker) = args.exclude {
        overrides.exclusion_marker = Some(marker.clone()).filter(|m| !m.is_empty());
    }
}

/// Scan root: CLI path > config root > folder dialog (viewer runs only).
fn resolve_root(
    cli_path: Option<&Path>,
    config: &AppConfig,
    no_gui: bool,
) -> Result<PathBuf, ZSleuthError> {
    if let Some(path) = cli_path {
        return Ok(path.to_path_buf());
    }
    if let Some(ref path) = config.scan_root {
        tracing::info!(root = %path.display(), "Using scan root from config");
        return Ok(path.clone());
    }
    if !no_gui {
        if let Some(path) = crate::platform::fs::pick_scan_folder("Select imaging run directory") {
            return Ok(path);
        }
    }
    Err(ConfigError::NoScanRoot.into())
}

fn launch_gui(state: ViewerState) -> Result<(), ZSleuthError> {
    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_title(format!(
                "{} v{}",
                crate::util::constants::APP_NAME,
                crate::util::constants::APP_VERSION
            ))
            .with_inner_size([1200.0, 800.0])
            .with_min_inner_size([640.0, 400.0]),
        ..Default::default()
    };

    eframe::run_native(
        crate::util::constants::APP_NAME,
        native_options,
        Box::new(move |cc| {
            // Charts read best on a white background.
            cc.egui_ctx.set_visuals(egui::Visuals::light());
            Ok(Box::new(gui::ZSleuthApp::new(state)))
        }),
    )
    .map_err(|e| ZSleuthError::Gui {
        message: e.to_string(),
    })
}
