use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "sapwise",
    about = "An interactive chatbot for SAP error knowledge, backed by a hosted AI agent",
    long_about = "Sapwise answers questions about SAP error codes and related documentation by forwarding them to a remotely hosted AI agent. Conversations can be saved, reloaded and deleted for the duration of a run; the heavy lifting (retrieval, citations) happens on the agent side.",
    version
)]
pub struct Cli {
    /// Project endpoint of the hosted agent service
    #[arg(long, env = "SAPWISE_ENDPOINT")]
    pub endpoint: Option<String>,

    /// Identifier of the agent to ask
    #[arg(long, env = "SAPWISE_AGENT_ID")]
    pub agent_id: Option<String>,

    #[arg(long, env = "SAPWISE_API_KEY")]
    pub api_key: Option<String>,

    /// Ask a single question and exit (skips the interactive views)
    #[arg(short, long)]
    pub question: Option<String>,

    /// Path to the config file
    #[arg(long, default_value = "sapwise.toml")]
    pub config: PathBuf,
}

impl Cli {
    pub fn get_api_key(&self) -> Result<String, String> {
        self.api_key
            .clone()
            .ok_or_else(|| "SAPWISE_API_KEY not found. Please set it as an environment variable or use --api-key".to_string())
    }
}
