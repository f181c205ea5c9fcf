//! Texcube CLI
//!
//! A command-line tool for compiling TeX documents in disposable workspaces.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use texcube::config::check_timeout;
use texcube::{
    CompilationOutcome, Config, ConfigError, DiagnosticReport, EXAMPLE_CONFIG, Engine,
    ErrorClass, Runner, resolve_program,
};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "texcube")]
#[command(about = "A tool for compiling TeX documents in disposable workspaces")]
#[command(version)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize a new configuration file
    Init {
        /// Output path (default: texcube.toml)
        #[arg(short, long, default_value = "texcube.toml")]
        output: PathBuf,

        /// Overwrite existing file
        #[arg(short, long)]
        force: bool,
    },

    /// Compile a document
    Compile {
        /// Source file to compile ("-" reads stdin)
        #[arg(value_name = "FILE")]
        source: PathBuf,

        /// Engine ID (e.g., pdflatex, xelatex)
        #[arg(short, long)]
        engine: Option<String>,

        /// Where to write the artifact (default: the engine's download name)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Per-pass time limit in seconds
        #[arg(short, long)]
        timeout: Option<f64>,

        /// Print failures as a JSON report
        #[arg(long)]
        json: bool,
    },

    /// List configured engines
    Engines,

    /// Check that the default engine can be started
    Check,

    /// Show effective configuration
    ShowConfig,
}

/// Exit status for each failure class
fn exit_code_for(class: ErrorClass) -> ExitCode {
    match class {
        ErrorClass::Compilation => ExitCode::from(1),
        ErrorClass::Caller => ExitCode::from(2),
        ErrorClass::Infrastructure => ExitCode::from(3),
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::from_default_env().add_directive(Level::DEBUG.into())
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    // Load configuration
    let config = if let Some(ref path) = cli.config {
        info!(?path, "loading configuration");
        Config::from_file(path).context("failed to load configuration")?
    } else {
        debug!("using default configuration");
        Config::default()
    };

    match cli.command {
        Commands::Init { output, force } => init_config(&output, force).await,
        Commands::Compile {
            source,
            engine,
            output,
            timeout,
            json,
        } => {
            run_compile(
                config,
                &source,
                engine.as_deref(),
                output.as_deref(),
                timeout,
                json,
            )
            .await
        }
        Commands::Engines => {
            list_engines(&config);
            Ok(ExitCode::SUCCESS)
        }
        Commands::Check => Ok(check_engine(&config)),
        Commands::ShowConfig => {
            show_config(&config);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn read_source(source: &Path) -> Result<Vec<u8>> {
    if source == Path::new("-") {
        let mut buf = Vec::new();
        std::io::stdin()
            .read_to_end(&mut buf)
            .context("failed to read source from stdin")?;
        Ok(buf)
    } else {
        tokio::fs::read(source)
            .await
            .context("failed to read source file")
    }
}

async fn run_compile(
    config: Config,
    source: &Path,
    engine_id: Option<&str>,
    output: Option<&Path>,
    timeout: Option<f64>,
    json: bool,
) -> Result<ExitCode> {
    let engine = match select_engine(&config, engine_id, timeout) {
        Ok(engine) => engine,
        Err(e) => return Ok(caller_error(&e.to_string(), json)),
    };

    let source_content = match read_source(source).await {
        Ok(content) => content,
        Err(e) => return Ok(caller_error(&format!("{e:#}"), json)),
    };

    info!(engine = %engine.name, "compiling document");

    let runner = Runner::new(config);
    let outcome = match runner.compile_source_with(&source_content, &engine).await {
        Ok(outcome) => outcome,
        Err(e) => {
            let report = e.report();
            if json {
                println!("{}", report.to_json());
            } else {
                eprintln!("error: {}", report.error);
            }
            return Ok(exit_code_for(report.class));
        }
    };

    match outcome {
        CompilationOutcome::Success { artifact } => {
            let path = output
                .map(Path::to_path_buf)
                .unwrap_or_else(|| PathBuf::from(&artifact.filename));
            tokio::fs::write(&path, &artifact.bytes)
                .await
                .with_context(|| format!("failed to write {}", path.display()))?;

            info!(
                path = %path.display(),
                bytes = artifact.bytes.len(),
                content_type = %artifact.content_type,
                "wrote artifact"
            );
            Ok(ExitCode::SUCCESS)
        }
        failure @ CompilationOutcome::Failure { .. } => {
            let Some(report) = failure.report() else {
                return Ok(ExitCode::FAILURE);
            };
            if json {
                println!("{}", report.to_json());
            } else {
                eprintln!("Compilation failed: {}", report.error);
                if let Some(stage) = report.stage {
                    eprintln!("Stage: {stage}");
                }
                if !report.log.is_empty() {
                    eprintln!("\nEngine output:\n{}", report.log);
                }
            }
            Ok(exit_code_for(report.class))
        }
    }
}

/// Pick the requested engine and apply a `--timeout` override
fn select_engine(
    config: &Config,
    engine_id: Option<&str>,
    timeout: Option<f64>,
) -> Result<Engine, ConfigError> {
    let mut engine = config.engine_or_default(engine_id)?.clone();
    if let Some(seconds) = timeout {
        check_timeout(seconds)?;
        engine = engine.with_timeout(seconds);
    }
    Ok(engine)
}

fn caller_error(message: &str, json: bool) -> ExitCode {
    let report = DiagnosticReport {
        error: message.to_string(),
        log: String::new(),
        stage: None,
        class: ErrorClass::Caller,
    };
    if json {
        println!("{}", report.to_json());
    } else {
        eprintln!("error: {message}");
    }
    exit_code_for(report.class)
}

fn list_engines(config: &Config) {
    println!("Available engines:\n");

    let mut engines: Vec<_> = config.engines.iter().collect();
    engines.sort_by_key(|(id, _)| *id);

    for (id, engine) in engines {
        let marker = if *id == config.default_engine {
            "*"
        } else {
            " "
        };
        let status = match resolve_program(&engine.program, &engine.path) {
            Ok(path) => path.display().to_string(),
            Err(_) => "not found".to_string(),
        };
        println!("{marker} {:<12} {} ({})", id, engine.name, status);
    }
}

fn check_engine(config: &Config) -> ExitCode {
    let engine = match config.engine_or_default(None) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("{e}");
            return exit_code_for(ErrorClass::Infrastructure);
        }
    };

    match resolve_program(&engine.program, &engine.path) {
        Ok(path) => {
            println!("{} available at {}", engine.name, path.display());
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("{} unavailable: {e}", engine.name);
            exit_code_for(ErrorClass::Infrastructure)
        }
    }
}

fn show_config(config: &Config) {
    println!("Scratch root: {}", config.scratch_dir().display());
    println!("Max concurrent compilations: {}", config.max_concurrent);
    println!("Passes per compilation: {}", texcube::PASS_COUNT);
    println!("Default engine: {}", config.default_engine);
    println!();

    let mut engines: Vec<_> = config.engines.iter().collect();
    engines.sort_by_key(|(id, _)| *id);

    for (id, engine) in engines {
        println!("[{id}] {}", engine.name);
        println!("  Program: {}", engine.program);
        println!("  Extra args: {:?}", engine.args);
        println!(
            "  Files: {} -> {} (log {})",
            engine.source_name, engine.artifact_name, engine.log_name
        );
        println!("  Timeout per pass: {}s", engine.timeout);
        println!("  PATH: {}", engine.path);
    }
}

async fn init_config(output: &Path, force: bool) -> Result<ExitCode> {
    if output.exists() && !force {
        anyhow::bail!(
            "Configuration file already exists at '{}'. Use --force to overwrite.",
            output.display()
        );
    }

    tokio::fs::write(output, EXAMPLE_CONFIG)
        .await
        .context("failed to write configuration file")?;

    println!("Created configuration file at '{}'", output.display());
    Ok(ExitCode::SUCCESS)
}
