//! `orchestrator` - run requests through the LLM orchestrator from the shell

use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use llm_orchestrator::utils::logging::init_logging;
use llm_orchestrator::{ChatMessage, CompletionOptions, Config, Orchestrator, StreamChunk};
use tracing::debug;

/// Route completions across LLM providers with fallback, caching and rate limits.
#[derive(Parser)]
#[command(name = "orchestrator", version, about, long_about = None)]
struct Cli {
    /// YAML configuration file. Without it, configuration comes from the environment.
    #[arg(short, long, env = "ORCHESTRATOR_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Send the request to this provider first
    #[arg(short, long, global = true)]
    provider: Option<String>,

    /// Bypass the response cache
    #[arg(long, global = true)]
    no_cache: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Complete a prompt, falling back across providers on failure
    Complete {
        prompt: String,
        /// Print chunks as they arrive
        #[arg(long)]
        stream: bool,
        #[arg(long)]
        max_tokens: Option<u32>,
    },
    /// Send a conversation; messages alternate user and assistant, starting with user
    Chat {
        #[arg(required = true)]
        messages: Vec<String>,
        #[arg(long)]
        system: Option<String>,
    },
    /// Check every provider and print orchestrator status as JSON
    Status,
    /// Load and validate the configuration, then exit
    CheckConfig,
}

#[tokio::main]
async fn main() -> ExitCode {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

async fn load_config(path: Option<&PathBuf>) -> anyhow::Result<Config> {
    let config = match path {
        Some(path) => Config::from_file(path)
            .await
            .with_context(|| format!("loading {}", path.display()))?,
        None => Config::from_env().context("loading configuration from environment")?,
    };
    Ok(config)
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref()).await?;
    init_logging(&config.logging)?;

    if let Commands::CheckConfig = cli.command {
        let orchestrator = config.orchestrator();
        println!(
            "configuration ok: {} provider(s), default {}, strategy {}",
            orchestrator.providers.len(),
            orchestrator.resolved_default_provider().unwrap_or_default(),
            orchestrator.fallback_strategy
        );
        return Ok(());
    }

    let orchestrator = Orchestrator::from_config(config.orchestrator())?;
    let mut options = CompletionOptions::new();
    if let Some(provider) = cli.provider {
        options = options.with_provider(provider);
    }
    if cli.no_cache {
        options = options.without_cache();
    }

    let result = dispatch(&orchestrator, cli.command, options).await;
    orchestrator.shutdown();
    result
}

async fn dispatch(
    orchestrator: &Orchestrator,
    command: Commands,
    mut options: CompletionOptions,
) -> anyhow::Result<()> {
    match command {
        Commands::Complete {
            prompt,
            stream,
            max_tokens,
        } => {
            if let Some(max_tokens) = max_tokens {
                options = options.with_max_tokens(max_tokens);
            }
            let response = if stream {
                let mut sink = |chunk: StreamChunk| {
                    print!("{}", chunk.content);
                    let _ = std::io::stdout().flush();
                };
                let response = orchestrator.stream(&prompt, &mut sink, &options).await?;
                println!();
                response
            } else {
                let response = orchestrator.complete(&prompt, &options).await?;
                println!("{}", response.content);
                response
            };
            debug!(
                provider = %response.provider,
                cached = response.cached,
                latency_ms = response.latency_ms,
                "request complete"
            );
        }
        Commands::Chat { messages, system } => {
            let conversation = build_conversation(system, messages);
            let response = orchestrator.chat(&conversation, &options).await?;
            println!("{}", response.content);
        }
        Commands::Status => {
            orchestrator.check_health().await;
            let status = orchestrator.get_status();
            println!("{}", serde_json::to_string_pretty(&status)?);
        }
        Commands::CheckConfig => {}
    }
    Ok(())
}

fn build_conversation(system: Option<String>, messages: Vec<String>) -> Vec<ChatMessage> {
    system
        .map(ChatMessage::system)
        .into_iter()
        .chain(messages.into_iter().enumerate().map(|(i, text)| {
            if i % 2 == 0 {
                ChatMessage::user(text)
            } else {
                ChatMessage::assistant(text)
            }
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use llm_orchestrator::MessageRole;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_complete() {
        let cli = Cli::try_parse_from([
            "orchestrator",
            "--config",
            "orchestrator.yaml",
            "complete",
            "hello",
            "--stream",
        ])
        .unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("orchestrator.yaml")));
        assert!(matches!(cli.command, Commands::Complete { stream: true, .. }));
    }

    #[test]
    fn test_conversation_alternates_roles() {
        let conversation = build_conversation(
            Some("be brief".to_string()),
            vec!["hi".to_string(), "hello".to_string(), "bye".to_string()],
        );
        let roles: Vec<MessageRole> = conversation.iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![
                MessageRole::System,
                MessageRole::User,
                MessageRole::Assistant,
                MessageRole::User
            ]
        );
    }
}
