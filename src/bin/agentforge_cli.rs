//! AgentForge CLI
//!
//! Compiles agent templates from src/agents/ to production-ready markdown
//! in dist/agents/. Returns non-zero when any template fails validation.

use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

use agentforge_core::console;
use agentforge_core::render::BuildContext;
use agentforge_core::{BuildConfig, BuildPipeline};

#[derive(Parser)]
#[command(name = "agentforge-cli")]
#[command(about = "AgentForge - Agent Production Compiler")]
struct Cli {
    /// Validate templates without writing output
    #[arg(long)]
    validate_only: bool,

    /// Show detailed output
    #[arg(long)]
    verbose: bool,

    /// Always surface validation warnings, overriding the config
    #[arg(long)]
    strict: bool,

    /// Project root directory
    #[arg(long, default_value = ".")]
    root_dir: PathBuf,

    /// Build configuration path, relative to the root
    #[arg(long, default_value = "config/build_config.yml")]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let config_path = cli.root_dir.join(&cli.config);
    let mut config = match BuildConfig::load(&config_path) {
        Ok(config) => {
            console::success(&format!(
                "[OK] Loaded configuration from {}",
                config_path.display()
            ));
            config
        }
        Err(err) => {
            eprintln!("[ERROR] {err}");
            return ExitCode::FAILURE;
        }
    };

    if cli.verbose {
        config.logging.verbose = true;
    }
    if cli.strict {
        config.logging.show_warnings = true;
        console::warning("\n[INFO] Strict mode enabled - warnings are always shown");
    }

    let mut pipeline = BuildPipeline::new(&cli.root_dir, config, BuildContext::new());
    let stats = pipeline.build_all(cli.validate_only);

    if stats.failed > 0 {
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
