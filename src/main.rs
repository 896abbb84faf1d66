mod cli;

use mediaforge::config;
use mf_av::{ImageOptions, ToolRegistry};
use mf_core::{classify, ClassificationMismatch, MediaKind, OutputFormat};
use mf_pipeline::{default_registry, BatchResult, Dispatcher, ProgressUpdate, Worklist};

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct ConvertArgs {
    format: OutputFormat,
    output: PathBuf,
    kind: Option<MediaKind>,
    jobs: Option<usize>,
    json: bool,
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Respect RUST_LOG env var if set, otherwise use defaults based on verbose flag
    let env_filter = std::env::var("RUST_LOG").unwrap_or_else(|_| {
        if cli.verbose {
            "mediaforge=debug,mf_pipeline=debug,mf_av=debug".to_string()
        } else {
            "mediaforge=info,mf_pipeline=info,mf_av=warn".to_string()
        }
    });

    tracing_subscriber::fmt()
        .with_env_filter(&env_filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Convert {
            format,
            output,
            kind,
            jobs,
            json,
            files,
        } => {
            let args = ConvertArgs {
                format,
                output,
                kind,
                jobs,
                json,
                files,
            };
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(convert(args, cli.config.as_deref()))
        }
        Commands::Classify { files } => classify_files(&files),
        Commands::Formats { kind } => list_formats(kind),
        Commands::CheckTools => check_tools(cli.config.as_deref()),
        Commands::Version => {
            println!("mediaforge {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

async fn convert(args: ConvertArgs, config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    let mut worklist = Worklist::new(args.kind.unwrap_or(args.format.kind()));
    let mut rejected: Vec<ClassificationMismatch> = Vec::new();

    let candidates: Vec<&PathBuf> = match args.kind {
        // An explicit kind behaves like a file picker filtered to that kind.
        Some(kind) => args
            .files
            .iter()
            .filter(|path| match classify(path) {
                Some(found) if found != kind => {
                    rejected.push(ClassificationMismatch::KindMismatch {
                        path: path.to_path_buf(),
                        expected: kind,
                        found,
                    });
                    false
                }
                _ => true,
            })
            .collect(),
        None => args.files.iter().collect(),
    };

    let report = worklist.add_all(candidates);
    rejected.extend(report.rejected);

    if let Some(kind) = report.switched_to {
        tracing::info!("Input kind set to {kind} by the first file");
    }
    if report.duplicates > 0 {
        tracing::debug!("Ignored {} duplicate file(s)", report.duplicates);
    }
    if !rejected.is_empty() {
        eprintln!(
            "Some files were discarded because they are not {} files:",
            worklist.active_kind()
        );
        for mismatch in &rejected {
            eprintln!("  {}", mismatch.path().display());
        }
    }

    if worklist.is_empty() {
        anyhow::bail!("No files to convert");
    }

    let tools =
        ToolRegistry::discover(&config.tools).with_timeout(config.conversion.tool_timeout());
    let image_options = ImageOptions {
        jpeg_quality: config.conversion.jpeg_quality.clamp(1, 100),
    };
    let registry = default_registry(Arc::new(tools), image_options);

    let token = CancellationToken::new();
    let ctrl_c = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupted; finishing running conversions");
            ctrl_c.cancel();
        }
    });

    let max_concurrency = args
        .jobs
        .unwrap_or_else(|| config.conversion.effective_concurrency());
    let dispatcher = Dispatcher::new(registry)
        .with_max_concurrency(max_concurrency)
        .with_cancellation(token);

    if !args.json {
        dispatcher.progress().subscribe(print_progress);
    }

    let result = dispatcher
        .run_batch(worklist.jobs(), args.format, &args.output)
        .await?;

    if args.json {
        print_json(&result)?;
    } else {
        eprintln!();
        print_summary(&result, args.format);
    }

    if !result.is_success() {
        anyhow::bail!("{} of {} files failed to convert", result.failed(), result.total);
    }

    Ok(())
}

fn print_progress(update: ProgressUpdate) {
    let mut stderr = std::io::stderr().lock();
    let _ = write!(
        stderr,
        "\r[{:>3.0}%] {}/{}",
        update.percent, update.completed, update.total
    );
    let _ = stderr.flush();
}

fn print_summary(result: &BatchResult, format: OutputFormat) {
    if result.is_success() {
        println!(
            "Converted {} file(s) to {}.",
            result.succeeded,
            format.extension()
        );
        return;
    }

    if result.succeeded == 0 {
        println!("Conversion failed for every file.");
    } else {
        println!(
            "Conversion completed with errors: {} of {} file(s) converted.",
            result.succeeded, result.total
        );
    }
    for failure in &result.failures {
        println!("  {}: {}", failure.job.source_path().display(), failure.error);
    }
}

/// Paths are written lossily: JSON strings must be UTF-8, file names need not be.
fn print_json(result: &BatchResult) -> Result<()> {
    let failures: Vec<_> = result
        .failures
        .iter()
        .map(|f| {
            serde_json::json!({
                "source": f.job.source_path().to_string_lossy(),
                "error": f.error.to_string(),
            })
        })
        .collect();
    let outputs: Vec<_> = result.outputs.iter().map(|p| p.to_string_lossy()).collect();

    let value = serde_json::json!({
        "total": result.total,
        "succeeded": result.succeeded,
        "outputs": outputs,
        "failures": failures,
    });
    println!("{}", serde_json::to_string_pretty(&value)?);
    Ok(())
}

fn classify_files(files: &[PathBuf]) -> Result<()> {
    for file in files {
        match classify(file) {
            Some(kind) => println!("{}: {kind}", file.display()),
            None => println!("{}: unsupported", file.display()),
        }
    }
    Ok(())
}

fn list_formats(kind: Option<MediaKind>) -> Result<()> {
    let kinds = match kind {
        Some(kind) => vec![kind],
        None => MediaKind::ALL.to_vec(),
    };

    for kind in kinds {
        let outputs: Vec<&str> = kind.formats().iter().map(|f| f.extension()).collect();
        println!("{kind}");
        println!("  input:  {}", kind.file_filter());
        println!("  output: {}", outputs.join(", "));
    }
    Ok(())
}

fn check_tools(config_path: Option<&Path>) -> Result<()> {
    let config = config::load_config_or_default(config_path)?;

    println!("Checking external tools...\n");

    let tools = ToolRegistry::discover(&config.tools).check_all();
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
            print!(" ({})", version);
        }

        if let Some(ref path) = tool.path {
            print!(" - {}", path.display());
        }

        println!();
    }

    println!();
    if all_ok {
        println!("All tools are available!");
    } else {
        println!("Some tools are missing. Image and WAV conversion still work without them.");
    }

    Ok(())
}
