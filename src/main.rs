use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;
use tracing_subscriber::EnvFilter;

use luma_share_lib::config::{self, AppConfig};
use luma_share_lib::models::{Format, Language};
use luma_share_lib::relay::HttpTransport;
use luma_share_lib::render::capability::BlurCapability;

/// luma-share - story and post images from a lu.ma event link
#[derive(Debug, Parser)]
#[command(name = "luma-share")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(long, short, env = "LUMA_SHARE_CONFIG")]
    config: Option<PathBuf>,

    /// Enable debug output
    #[arg(long, short = 'v')]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Fetch an event and render its images
    Render {
        /// Event link, e.g. lu.ma/abc123
        link: String,

        /// Which image(s) to produce
        #[arg(long, short, value_enum, default_value_t = FormatChoice::Both)]
        format: FormatChoice,

        /// Background template (image, gradient-sunset, gradient-ocean, ...)
        #[arg(long, short)]
        template: Option<String>,

        /// Date language: auto, es, en or pt
        #[arg(long)]
        lang: Option<Language>,

        /// Directory the PNG files are written to
        #[arg(long, short)]
        out: Option<PathBuf>,
    },
    /// Fetch an event and print the extracted record as JSON
    Inspect {
        link: String,

        /// Date language: auto, es, en or pt
        #[arg(long)]
        lang: Option<Language>,
    },
    /// Manage the configuration file
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Debug, Subcommand)]
enum ConfigAction {
    /// Print the configuration file path
    Path,
    /// Print the effective configuration
    Show,
    /// Write a configuration file with default values
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum FormatChoice {
    Story,
    Post,
    Both,
}

impl FormatChoice {
    fn formats(self) -> Vec<Format> {
        match self {
            FormatChoice::Story => vec![Format::Story],
            FormatChoice::Post => vec![Format::Post],
            FormatChoice::Both => Format::ALL.to_vec(),
        }
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = if cli.debug {
        EnvFilter::new(Level::DEBUG.to_string())
    } else {
        EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(Level::WARN.to_string()))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    let config_path = cli.config.clone().unwrap_or_else(luma_share_lib::config_path);
    let mut config = config::read_config(&config_path).map_err(|e| anyhow!(e))?;

    match cli.command {
        Command::Render {
            link,
            format,
            template,
            lang,
            out,
        } => {
            if let Some(out) = out {
                config.output_dir = Some(out);
            }
            let transport = HttpTransport::new(config.timeout(), &config.user_agent)?;
            let capability = BlurCapability::detect(config.blur);
            let mut session = luma_share_lib::session_from_config(&config);
            if let Some(lang) = lang {
                session.set_language(lang);
            }
            if let Some(template) = template {
                session.set_template(template);
            }

            let record =
                luma_share_lib::load_event(&transport, &config, &mut session, &link).await?;
            println!("{}", record.title);

            for format in format.formats() {
                let path =
                    luma_share_lib::download(&transport, &config, capability, &session, format)
                        .await?;
                println!("{}", path.display());
            }
            Ok(())
        }
        Command::Inspect { link, lang } => {
            let transport = HttpTransport::new(config.timeout(), &config.user_agent)?;
            let mut session = luma_share_lib::session_from_config(&config);
            if let Some(lang) = lang {
                session.set_language(lang);
            }
            let record =
                luma_share_lib::load_event(&transport, &config, &mut session, &link).await?;
            println!("{}", serde_json::to_string_pretty(&record)?);
            Ok(())
        }
        Command::Config { action } => run_config(action, &config_path, &config),
    }
}

fn run_config(action: ConfigAction, path: &Path, config: &AppConfig) -> Result<()> {
    match action {
        ConfigAction::Path => println!("{}", path.display()),
        ConfigAction::Show => println!("{}", serde_json::to_string_pretty(config)?),
        ConfigAction::Init { force } => {
            if path.exists() && !force {
                return Err(anyhow!(
                    "{} already exists (use --force to overwrite)",
                    path.display()
                ));
            }
            config::write_config(path, &AppConfig::default())
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("writing {}", path.display()))?;
            println!("{}", path.display());
        }
    }
    Ok(())
}
