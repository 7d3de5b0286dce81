mod cli;

use webpforge::{
    build_engine,
    config::{self, MetadataBackend},
    conversion::{self, BatchRunner, ConversionOutcome, RunSettings},
    metadata, schedule, watch,
};
use webpforge_db::SqliteMetadataStore;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Commands, MetadataCommands};
use std::path::Path;
use std::sync::Arc;

async fn start_daemon(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    tracing::info!("Starting webpforge daemon");
    tracing::info!(
        "Runs {:?} at {}",
        config.schedule.recurrence,
        config.schedule.time
    );

    let engine = Arc::new(build_engine(&config)?);
    let runner = Arc::new(BatchRunner::new(
        engine.clone(),
        RunSettings::from_config(&config),
    ));

    let mut watcher =
        watch::DeletionWatcher::new(config.source_roots(), config.source_extensions(), engine);
    if config.watch.enabled {
        watcher.start().await?;
    }

    let result = schedule::run_daemon(runner, &config.schedule).await;

    watcher.stop();
    result
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "webpforge=trace,webpforge_encode=trace,webpforge_db=debug,webpforge_common=debug"
                .to_string()
        } else {
            "webpforge=info,webpforge_encode=info,webpforge_db=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .init();

    match cli.command {
        Commands::Run => run_batch(cli.config.as_deref()),
        Commands::Convert { file } => convert_file(&file, cli.config.as_deref()),
        Commands::Delete { file } => delete_file(&file),
        Commands::Daemon => {
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(start_daemon(cli.config.as_deref()))
        }
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Validate {
            config: config_path,
        } => {
            let path = config_path.or(cli.config);
            validate_config(path.as_deref())
        }
        Commands::Metadata { command } => match command {
            MetadataCommands::Import { file } => import_metadata(&file, cli.config.as_deref()),
        },
        Commands::Version => {
            println!("webpforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_batch(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;
    let runner = webpforge::build_runner(&config)?;

    let summary = runner.run();

    println!("Converted: {}", summary.converted);
    println!("Up to date: {}", summary.fresh);
    println!("Without metadata: {}", summary.no_metadata);
    println!("Unsupported: {}", summary.unsupported);
    println!("Fell back: {}", summary.failed);
    println!("Errors: {}", summary.errored);

    Ok(())
}

fn convert_file(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if !file.is_file() {
        anyhow::bail!("Input file does not exist: {:?}", file);
    }

    let engine = build_engine(&config)?;
    let outcome = engine
        .convert(file)
        .with_context(|| format!("Failed to convert {:?}", file))?;

    match outcome {
        ConversionOutcome::Converted => println!("Converted {}", file.display()),
        ConversionOutcome::SkippedFresh => println!("Up to date: {}", file.display()),
        ConversionOutcome::SkippedNoMetadata => {
            println!("Converted {} (no attachment metadata)", file.display())
        }
        ConversionOutcome::SkippedUnsupportedFormat => {
            println!("WebP is not supported for {}", file.display())
        }
        ConversionOutcome::Failed(reason) => {
            println!("Fell back to the original for {}: {}", file.display(), reason)
        }
    }

    Ok(())
}

fn delete_file(file: &Path) -> Result<()> {
    if conversion::remove_derived(file) {
        println!("Removed artifact for {}", file.display());
    } else {
        println!("No artifact for {}", file.display());
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = webpforge_encode::check_tools(config.tools.cwebp_path.as_deref());
    let mut all_ok = true;

    for tool in &tools {
        let status = if tool.available {
            "✓"
        } else {
            all_ok = false;
            "✗"
        };

        print!("{} {}", status, tool.name);

        if let Some(ref version) = tool.version {
            print!(" ({})", version.lines().next().unwrap_or(""));
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All required tools are available!");
    } else {
        println!("Some tools are missing. Install them to enable all features.");
    }

    Ok(())
}

fn validate_config(path: Option<&Path>) -> Result<()> {
    let config = match path {
        Some(p) => {
            println!("Validating config: {:?}", p);
            let config = config::load_config(p)?;
            println!("✓ Configuration is valid");
            config
        }
        None => {
            println!("No config file specified, using defaults");
            config::Config::default()
        }
    };

    println!("  Base dir: {}", config.source.base_dir.display());
    println!("  Source paths: {}", config.source_roots().len());
    println!("  Extensions: {}", config.source_extensions().join(", "));
    println!(
        "  Quality: {}",
        conversion::QualityResolver::new(config.quality.clone()).artifact_quality()
    );
    println!("  Metadata backend: {:?}", config.metadata.backend);
    println!(
        "  Schedule: {} ({:?})",
        config.schedule.time, config.schedule.recurrence
    );
    println!("  Watch enabled: {}", config.watch.enabled);

    Ok(())
}

fn import_metadata(file: &Path, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    if config.metadata.backend != MetadataBackend::Sqlite {
        anyhow::bail!("metadata import requires metadata.backend = \"sqlite\"");
    }
    let db_path = config
        .metadata
        .path
        .as_deref()
        .context("metadata.path is not set")?;

    let records = metadata::load_json_map(file)?;
    let store = SqliteMetadataStore::open(db_path)
        .with_context(|| format!("Failed to open metadata database: {:?}", db_path))?;
    let count = store.import(records)?;

    println!("Imported {} records into {}", count, db_path.display());
    Ok(())
}
