use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::Parser;
use mica_core::{
    ArtifactStore, EnvironmentConfig, ModuleBuilder, MsvcLocator, Pipeline, PreprocessOptions,
    ProcessRunner, RESOLVE_STAGE, standard_modules,
};

/// Build driver for the Mica dialect.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Project directory containing the dialect sources
    #[arg(long, default_value = ".")]
    dir: PathBuf,

    /// Run the produced executable and forward its exit code
    #[arg(long)]
    run: bool,

    /// Rewrite "..." literals into the runtime's UTF-32 literal form
    #[arg(long)]
    rewrite_strings: bool,

    /// Build a single module stage instead of the full pipeline
    #[arg(long, value_name = "MODULE")]
    only: Option<String>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    execute(cli)
}

fn execute(cli: Cli) -> Result<()> {
    let runner = ProcessRunner;
    if let Some(module) = cli.only.as_deref() {
        return build_single(&cli, module, &runner);
    }

    let locator = MsvcLocator;
    let mut pipeline = Pipeline::new(&cli.dir, &locator, &runner).with_options(PreprocessOptions {
        rewrite_string_literals: cli.rewrite_strings,
    });
    let result = pipeline.run();
    let outcome =
        result.with_context(|| format!("build failed at stage '{}'", stage_of(&pipeline)))?;

    for module in &outcome.skipped {
        println!("{module} is up to date");
    }
    for module in &outcome.rebuilt {
        println!("{module} successfully compiled");
    }
    println!("built {}", outcome.executable.display());

    if cli.run {
        run_program(&outcome.executable)?;
    }
    Ok(())
}

fn stage_of(pipeline: &Pipeline) -> String {
    match pipeline.state() {
        mica_core::PipelineState::Failed { stage } => stage.clone(),
        other => format!("{other:?}"),
    }
}

/// Builds one module stage, the single-script workflow: the first
/// module in the chain may regenerate the environment, every later one
/// requires it to exist already.
fn build_single(cli: &Cli, module: &str, runner: &ProcessRunner) -> Result<()> {
    let units = standard_modules(&cli.dir);
    let index = units
        .iter()
        .position(|unit| unit.module.as_deref() == Some(module))
        .ok_or_else(|| anyhow::anyhow!("unknown module '{module}'"))?;

    let env = if index == 0 {
        EnvironmentConfig::resolve_or_load(&cli.dir, &MsvcLocator)?
    } else {
        EnvironmentConfig::load(&cli.dir, RESOLVE_STAGE)?
    };

    let store = ArtifactStore::new(&cli.dir);
    let builder = ModuleBuilder::new(&env, &store, runner, &cli.dir);
    println!("starts compiling {module}");
    builder
        .build(module, &units[index])
        .with_context(|| format!("failed to compile {module}"))?;
    println!("{module} successfully compiled");
    Ok(())
}

fn run_program(path: &Path) -> Result<()> {
    if !path.exists() {
        bail!("{} not found", path.display());
    }
    let status = Command::new(path)
        .status()
        .with_context(|| format!("failed to run {}", path.display()))?;
    std::process::exit(status.code().unwrap_or(1));
}
