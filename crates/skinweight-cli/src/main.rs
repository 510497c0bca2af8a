//! Skin weight CLI - calculate, apply, and validate skin weights
//!
//! This binary drives the solver against JSON scene files.

use clap::{Parser, Subcommand};
use std::process::ExitCode;

use skinweight_cli::commands;
use skinweight_cli::commands::apply::ApplyOptions;
use skinweight_cli::commands::calculate::CalculateOptions;
use skinweight_cli::commands::settings::ConfigOverrides;

/// skinweight - Displacement-based skin weight inference
#[derive(Parser)]
#[command(name = "skinweight")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    /// Log progress (info level) to stderr; RUST_LOG overrides
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Calculate weights for a mesh by perturbing every bone under a root
    Calculate {
        /// Path to the scene file
        #[arg(short, long)]
        scene: String,

        /// Name of the skinned mesh
        #[arg(short, long)]
        mesh: String,

        /// Name of the root bone
        #[arg(short, long)]
        root: String,

        /// Write the weights to this file (default: print to stdout)
        #[arg(short, long)]
        output: Option<String>,

        /// Indent the weights file written with --output
        #[arg(long, requires = "output")]
        pretty: bool,

        /// Solver configuration file (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Discard contributions at or below this weight
        #[arg(long, allow_hyphen_values = true)]
        tolerance: Option<f64>,

        /// Perturbation magnitude
        #[arg(long)]
        bone_delta: Option<f64>,

        /// Perturbation axis
        #[arg(long, value_parser = ["x", "y", "z"])]
        axis: Option<String>,

        /// Keep raw weights instead of normalizing each vertex
        #[arg(long)]
        no_normalize: bool,

        /// Perturb and weight the root bone too
        #[arg(long)]
        include_root: bool,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Apply weights to a mesh's skin and write the updated scene
    Apply {
        /// Path to the scene file
        #[arg(short, long)]
        scene: String,

        /// Name of the skinned mesh
        #[arg(short, long)]
        mesh: String,

        /// Path to a weights file
        #[arg(short, long)]
        weights: Option<String>,

        /// Inline weight data as a JSON string
        #[arg(short, long)]
        data: Option<String>,

        /// Source used when both --weights and --data are valid
        #[arg(long, value_parser = ["file", "inline"])]
        prefer: Option<String>,

        /// Where to write the updated scene (default: overwrite --scene)
        #[arg(short, long)]
        output: Option<String>,

        /// Solver configuration file (JSON)
        #[arg(short, long)]
        config: Option<String>,

        /// Distinct failures allowed before warning
        #[arg(long)]
        failure_threshold: Option<usize>,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },

    /// Validate a weights file
    Validate {
        /// Path to the weights file
        #[arg(short, long)]
        weights: String,

        /// Output machine-readable JSON (no colored output)
        #[arg(long)]
        json: bool,
    },
}

fn init_logging(verbose: bool) {
    let default_filter = if verbose { "info" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Calculate {
            scene,
            mesh,
            root,
            output,
            pretty,
            config,
            tolerance,
            bone_delta,
            axis,
            no_normalize,
            include_root,
            json,
        } => commands::calculate::run(&CalculateOptions {
            scene,
            mesh,
            root,
            output,
            pretty,
            config,
            overrides: ConfigOverrides {
                tolerance,
                bone_delta,
                axis,
                no_normalize,
                include_root,
                ..Default::default()
            },
            json,
        }),
        Commands::Apply {
            scene,
            mesh,
            weights,
            data,
            prefer,
            output,
            config,
            failure_threshold,
            json,
        } => commands::apply::run(&ApplyOptions {
            scene,
            mesh,
            weights,
            data,
            output,
            config,
            overrides: ConfigOverrides {
                failure_threshold,
                prefer,
                ..Default::default()
            },
            json,
        }),
        Commands::Validate { weights, json } => commands::validate::run(&weights, json),
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            eprintln!("{}: {:#}", colored::Colorize::red("error"), e);
            ExitCode::from(1)
        }
    }
}
