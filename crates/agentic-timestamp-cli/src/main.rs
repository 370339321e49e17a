//! AgenticTimestamp CLI — entry point.

use std::path::PathBuf;

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

use agentic_timestamp_cli::commands::{self, resolve::ResolveArgs};
use agentic_timestamp_cli::load_config;
use agentic_timestamp_cli::output::{format_candidates, format_resolution, print_json};

#[derive(Parser)]
#[command(
    name = "agentic-timestamp",
    about = "AgenticTimestamp — resolve harvested page timestamps into one absolute instant",
    version
)]
struct Cli {
    /// Output results as JSON (machine-readable).
    #[arg(long, global = true)]
    json: bool,

    /// Path to a JSON resolver config.
    #[arg(long, global = true)]
    config: Option<String>,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long, global = true, default_value = "warn")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resolve one target through every tier.
    Resolve {
        /// Rendered HTML snapshot to harvest candidates from.
        #[arg(long)]
        html: Option<PathBuf>,

        /// JSON array of pre-harvested candidates.
        #[arg(long)]
        candidates: Option<PathBuf>,

        /// CSS selector limiting harvesting to one post.
        #[arg(long)]
        scope: Option<String>,

        /// Reference clock as RFC 3339 (default: now).
        #[arg(long)]
        now: Option<String>,

        /// Screenshot used by the OCR fallback tier.
        #[arg(long)]
        ocr_image: Option<PathBuf>,

        /// Region of the screenshot as x,y,w,h.
        #[arg(long)]
        ocr_region: Option<String>,

        /// Path to the tesseract binary.
        #[arg(long)]
        tesseract: Option<PathBuf>,

        /// Never run the OCR tier.
        #[arg(long)]
        no_ocr: bool,

        /// Maximum candidates considered (overrides config).
        #[arg(long)]
        cap: Option<usize>,
    },

    /// Parse a single timestamp phrase with the relative date parser.
    Parse {
        /// Text such as "Yesterday at 3:45 PM".
        text: String,

        /// Reference clock as RFC 3339 (default: now).
        #[arg(long)]
        now: Option<String>,
    },

    /// List the candidates harvested from an HTML snapshot.
    Harvest {
        /// Rendered HTML snapshot.
        #[arg(long)]
        html: PathBuf,

        /// CSS selector limiting harvesting to one post.
        #[arg(long)]
        scope: Option<String>,

        /// Maximum candidates collected (overrides config).
        #[arg(long)]
        cap: Option<usize>,
    },

    /// Print the effective resolver configuration.
    ShowConfig,

    /// Generate shell completion scripts.
    ///
    /// Examples:
    ///   agentic-timestamp completions bash > ~/.local/share/bash-completion/completions/agentic-timestamp
    ///   agentic-timestamp completions zsh > ~/.zfunc/_agentic-timestamp
    Completions {
        /// Shell type (bash, zsh, fish, powershell, elvish).
        shell: Shell,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cli.log_level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let json = cli.json;
    let result = run(cli).await;

    // Consistent exit codes: 0=success, 1=error
    if let Err(e) = &result {
        if json {
            print_json(&serde_json::json!({
                "error": true,
                "message": format!("{e:#}"),
            }))?;
        } else {
            eprintln!("  Error: {e:#}");
        }
        std::process::exit(1);
    }

    result
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let mut config = load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Resolve {
            html,
            candidates,
            scope,
            now,
            ocr_image,
            ocr_region,
            tesseract,
            no_ocr,
            cap,
        } => {
            if let Some(cap) = cap {
                config.harvest_cap = cap;
                config.validate()?;
            }
            let args = ResolveArgs {
                html,
                candidates,
                scope,
                now,
                ocr_image,
                ocr_region,
                tesseract,
                no_ocr,
            };
            let outcome = commands::resolve::run(&args, &config).await?;
            if cli.json {
                print_json(&outcome)?;
            } else {
                println!("{}", format_resolution(&outcome.resolution, &outcome.now));
            }
        }

        Commands::Parse { text, now } => {
            let outcome = commands::parse::run(&text, now.as_deref())?;
            if cli.json {
                print_json(&outcome)?;
            } else {
                match (outcome.instant, outcome.rule) {
                    (Some(instant), Some(rule)) => println!(
                        "{}  ({})",
                        instant.with_timezone(&outcome.now.offset()).to_rfc3339(),
                        rule.as_str()
                    ),
                    _ => println!("unresolved"),
                }
            }
        }

        Commands::Harvest { html, scope, cap } => {
            let cap = cap.unwrap_or(config.harvest_cap);
            let candidates = commands::harvest::run(&html, scope.as_deref(), cap)?;
            if cli.json {
                print_json(&candidates)?;
            } else {
                println!("{}", format_candidates(&candidates));
            }
        }

        Commands::ShowConfig => {
            print_json(&config)?;
        }

        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(
                shell,
                &mut cmd,
                "agentic-timestamp",
                &mut std::io::stdout(),
            );
        }
    }

    Ok(())
}
