use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use log::{debug, info};
use serde::Serialize;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use std::time::Instant;

use docsurface_core::{ResolutionError, manifest_path};
use docsurface_trace::TraceConfig;
use docsurface_workspace::{WorkspaceConfig, WorkspaceResolver};

#[derive(Parser)]
#[command(name = "docsurface")]
#[command(about = "Find the files that make up a TypeScript package's public API", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Trace one package from the exports of its package.json
    Trace(TraceConfig),
    /// Resolve every package in the repository
    Resolve(WorkspaceConfig),
    /// Group staged files by the policy config that applies to them
    Staged(StagedArgs),
}

#[derive(Debug, Args)]
struct StagedArgs {
    #[command(flatten)]
    workspace: WorkspaceConfig,

    /// Files to check, relative to the repository root or absolute
    files: Vec<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();

    // stdio is blocked by LineWriter, use a BufWriter to reduce syscalls.
    // See https://github.com/rust-lang/rust/issues/60673
    let mut stdout = BufWriter::new(std::io::stdout());

    let cli = Cli::parse();
    debug!("Parsed CLI arguments: {:?}", cli.command);

    let start = Instant::now();

    let (files, counts) = match cli.command {
        Commands::Trace(cfg) => {
            let manifest = manifest_path(&cfg.root);
            info!("Tracing {}", manifest.display());
            let traced = docsurface_trace::trace_from_package_exports(&manifest, &cfg);
            write_json(&mut stdout, &traced)?;
            (traced.result.files.len(), ErrorCounts::of(&traced.result.errors))
        }
        Commands::Resolve(cfg) => {
            info!("Resolving workspace (using {} threads)", rayon::current_num_threads());
            let mut resolver = WorkspaceResolver::new(cfg)?;
            let resolution = resolver.resolve()?;
            write_json(&mut stdout, resolution)?;
            let summary = resolution.summary();
            (summary.files, ErrorCounts { total: summary.errors, fatal: summary.fatal_errors })
        }
        Commands::Staged(args) => {
            let mut resolver = WorkspaceResolver::new(args.workspace)?;
            let groups = resolver.filter_staged_files(&args.files)?;
            write_json(&mut stdout, &groups)?;

            // The groups carry no errors; report the resolution's on stderr.
            let resolution = resolver.resolve()?;
            for error in resolution.all_errors() {
                eprintln!("{} {}", "error:".red(), error);
            }
            let summary = resolution.summary();
            (
                groups.iter().map(|g| g.files.len()).sum(),
                ErrorCounts { total: summary.errors, fatal: summary.fatal_errors },
            )
        }
    };
    stdout.flush()?;

    let elapsed_ms = start.elapsed().as_millis();
    let errors = counts.total;
    eprintln!(
        "{} Finished in {}ms: {} files, {} errors ({} fatal).",
        "●".bright_blue(),
        elapsed_ms.to_string().cyan(),
        files.to_string().cyan(),
        if errors == 0 { errors.to_string().cyan() } else { errors.to_string().red() },
        counts.fatal
    );

    if errors > 0 {
        // Non-zero exit to fail CI
        std::process::exit(1);
    }
    Ok(())
}

struct ErrorCounts {
    total: usize,
    fatal: usize,
}

impl ErrorCounts {
    fn of(errors: &[ResolutionError]) -> Self {
        Self { total: errors.len(), fatal: errors.iter().filter(|e| e.is_fatal()).count() }
    }
}

fn write_json<W: Write, T: Serialize + ?Sized>(out: &mut W, value: &T) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, value)?;
    writeln!(out)?;
    Ok(())
}
