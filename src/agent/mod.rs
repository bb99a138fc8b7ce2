pub mod hosted;
pub mod types;

pub use hosted::HostedAgentClient;

use crate::error::Result;
use async_trait::async_trait;
use std::sync::atomic::{AtomicU64, Ordering};

/// Narrow contract over the remote agent runtime. The session manager only
/// ever needs to allocate a conversation context and ask questions on it.
#[async_trait]
pub trait AgentRuntime {
    /// Allocates a new remote conversation context.
    async fn create_thread(&self) -> Result<String>;

    /// Submits a question to an existing thread and returns the answer text,
    /// with citation markers already resolved into inline links.
    async fn ask(&self, thread_id: &str, question: &str) -> Result<String>;
}

/// Answer shown for every question when the agent could not be resolved
/// at startup.
pub const FALLBACK_ANSWER: &str =
    "Sorry, the knowledge agent is currently unavailable. Please try again later \
     or contact an administrator.";

/// Stand-in used when startup agent resolution fails: answers every question
/// with a fixed apology and never touches the network. Thread ids are local
/// so session bookkeeping keeps working.
#[derive(Default)]
pub struct FallbackAgent {
    next_thread: AtomicU64,
}

impl FallbackAgent {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AgentRuntime for FallbackAgent {
    async fn create_thread(&self) -> Result<String> {
        let n = self.next_thread.fetch_add(1, Ordering::Relaxed);
        Ok(format!("offline-{}", n + 1))
    }

    async fn ask(&self, _thread_id: &str, _question: &str) -> Result<String> {
        Ok(FALLBACK_ANSWER.to_string())
    }
}

pub enum AgentClient {
    Hosted(HostedAgentClient),
    Fallback(FallbackAgent),
}

#[async_trait]
impl AgentRuntime for AgentClient {
    async fn create_thread(&self) -> Result<String> {
        match self {
            AgentClient::Hosted(client) => client.create_thread().await,
            AgentClient::Fallback(agent) => agent.create_thread().await,
        }
    }

    async fn ask(&self, thread_id: &str, question: &str) -> Result<String> {
        match self {
            AgentClient::Hosted(client) => client.ask(thread_id, question).await,
            AgentClient::Fallback(agent) => agent.ask(thread_id, question).await,
        }
    }
}
