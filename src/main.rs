mod agent;
mod cli;
mod config;
mod error;
mod error_ext;
mod repl;
mod session;
mod ui;

use agent::{AgentClient, FallbackAgent, HostedAgentClient};
use clap::Parser;
use cli::Cli;
use colored::Colorize;
use config::SapwiseConfig;
use error::{Result, SapwiseError};
use repl::Repl;
use ui::Ui;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .init();

    let cli = Cli::parse();
    let config = SapwiseConfig::load(&cli.config)?;

    let runtime = tokio::runtime::Runtime::new()
        .map_err(|e| SapwiseError::Config(format!("Failed to create async runtime: {}", e)))?;

    let agent = build_agent(&cli, &config, &runtime);
    Ui::print_welcome();

    let mut repl = Repl::new(agent, config, runtime);

    if let Some(question) = cli.question.clone() {
        repl.process_single_question(&question)?;
    } else {
        repl.run()?;
    }

    Ok(())
}

/// Resolve the hosted agent once at startup. Any failure downgrades the whole
/// run to canned answers instead of aborting: the views still work, every
/// question just gets the fallback text.
fn build_agent(cli: &Cli, config: &SapwiseConfig, runtime: &tokio::runtime::Runtime) -> AgentClient {
    let endpoint = cli.endpoint.clone().or_else(|| config.endpoint.clone());
    let agent_id = cli.agent_id.clone().or_else(|| config.agent_id.clone());

    let (Some(endpoint), Some(agent_id)) = (endpoint, agent_id) else {
        Ui::print_warning(
            "No agent endpoint/id configured (flags, env, or sapwise.toml). Answers will be canned.",
        );
        return AgentClient::Fallback(FallbackAgent::new());
    };

    let api_key = match cli.get_api_key() {
        Ok(key) => key,
        Err(e) => {
            Ui::print_warning(&format!("{} Answers will be canned.", e));
            return AgentClient::Fallback(FallbackAgent::new());
        }
    };

    let client = match HostedAgentClient::new(endpoint, agent_id, &api_key, config) {
        Ok(client) => client,
        Err(e) => {
            Ui::print_warning(&format!("{}. Answers will be canned.", e));
            return AgentClient::Fallback(FallbackAgent::new());
        }
    };

    match runtime.block_on(client.resolve_agent()) {
        Ok(info) => {
            println!(
                "{} {}",
                "Agent:".bright_green(),
                info.name.as_deref().unwrap_or(&info.id).dimmed()
            );
            AgentClient::Hosted(client)
        }
        Err(e) => {
            Ui::print_warning(&format!("{}. Answers will be canned.", e));
            AgentClient::Fallback(FallbackAgent::new())
        }
    }
}
