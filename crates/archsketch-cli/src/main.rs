use std::path::PathBuf;

use archsketch_assist::build_provider;
use archsketch_core::{ai_configured, ProviderKind};
use clap::{Args, Parser, Subcommand};
use tracing_subscriber::{fmt, EnvFilter};

mod chat;
mod import;
mod output;
mod settings;

#[derive(Parser)]
#[command(name = "archsketch")]
#[command(about = "Sketch system architectures with an AI assistant", long_about = None)]
struct Cli {
    #[command(flatten)]
    provider: ProviderArgs,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct ProviderArgs {
    /// openai or gemini
    #[arg(long, global = true, env = "ARCHSKETCH_PROVIDER")]
    provider: Option<ProviderKind>,
    #[arg(long, global = true, env = "ARCHSKETCH_API_KEY", hide_env_values = true)]
    api_key: Option<String>,
    #[arg(long, global = true, env = "ARCHSKETCH_MODEL")]
    model: Option<String>,
    /// Base URL of the provider API
    #[arg(long, global = true)]
    endpoint: Option<String>,
    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,
}

impl ProviderArgs {
    fn overrides(&self) -> settings::Overrides {
        settings::Overrides {
            provider: self.provider,
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            endpoint: self.endpoint.clone(),
            timeout_secs: self.timeout,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Design a system by answering the assistant's questions
    Chat {
        /// Write the generated artifact here instead of stdout
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Turn a diagram image into Mermaid text and, once confirmed, a graph
    Import {
        image: PathBuf,
        /// Build the graph without asking
        #[arg(short, long)]
        yes: bool,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Build a graph from a Mermaid diagram file
    Materialize {
        file: PathBuf,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Print a graph or artifact JSON file as Mermaid
    Render { file: PathBuf },
    /// Show or update the saved provider settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    Show,
    /// Save --provider, --api-key, --model, --endpoint and --timeout
    Set,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let path = settings::settings_path();
    let stored = settings::read_settings(&path);
    let settings = cli.provider.overrides().apply(stored);

    match cli.command {
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                // Mask API key, only report whether it's set
                let shown = serde_json::json!({
                    "path": path.display().to_string(),
                    "provider": settings.provider,
                    "model": settings.model(),
                    "endpoint": settings.endpoint(),
                    "timeoutSecs": settings.timeout_secs,
                    "hasKey": !settings.api_key.is_empty(),
                    "configured": ai_configured(&settings),
                });
                println!("{}", serde_json::to_string_pretty(&shown)?);
            }
            ConfigAction::Set => {
                settings::write_settings(&path, &settings)?;
                tracing::info!(path = %path.display(), provider = %settings.provider, "settings saved");
                println!("Saved settings to {}", path.display());
            }
        },
        Commands::Render { file } => output::render_file(&file)?,
        Commands::Chat { out } => {
            let provider = build_provider(&settings)?;
            chat::run(provider, out.as_deref()).await?;
        }
        Commands::Import { image, yes, out } => {
            let provider = build_provider(&settings)?;
            import::run(provider, &image, yes, out.as_deref()).await?;
        }
        Commands::Materialize { file, out } => {
            let provider = build_provider(&settings)?;
            import::materialize(provider, &file, out.as_deref()).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_provider_flags_after_subcommand() {
        let cli = Cli::try_parse_from([
            "archsketch",
            "import",
            "diagram.png",
            "--provider",
            "gemini",
            "--yes",
        ])
        .unwrap();
        assert_eq!(cli.provider.provider, Some(ProviderKind::Gemini));
        assert!(matches!(cli.command, Commands::Import { yes: true, .. }));
    }
}
