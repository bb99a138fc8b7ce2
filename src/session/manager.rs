use super::state::{AppState, Turn, View};
use crate::agent::AgentRuntime;
use crate::error::{Result, SapwiseError};

/// Drives the view/session state machine and routes questions to the remote
/// agent. One instance per run; every UI action maps to exactly one method.
pub struct SessionManager<A: AgentRuntime> {
    state: AppState,
    agent: A,
}

impl<A: AgentRuntime> SessionManager<A> {
    pub fn new(agent: A) -> Self {
        Self {
            state: AppState::new(),
            agent,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Upsert the active conversation into the store. Nothing to save when no
    /// turns exist yet or no remote thread has been bound; that is not an
    /// error, just an empty flush. Never touches the active conversation.
    pub fn save_current_session(&mut self) {
        if self.state.active_turns.is_empty() {
            return;
        }
        let Some(thread_id) = self.state.active_thread_id.clone() else {
            return;
        };
        self.state.store.upsert(&thread_id, &self.state.active_turns);
    }

    /// Flush the current conversation, then start over with an empty chat.
    pub fn start_new_session(&mut self) {
        self.save_current_session();
        self.state.active_turns.clear();
        self.state.active_thread_id = None;
        self.state.pending_question = None;
        self.state.view = View::Chat;
    }

    /// Flush the current conversation, then make a stored session active.
    /// Errors when the id is no longer in the store (the flush still happened).
    pub fn load_session(&mut self, thread_id: &str) -> Result<()> {
        self.save_current_session();

        let session = self.state.store.get(thread_id).ok_or_else(|| {
            SapwiseError::Config(format!("Session '{}' not found", thread_id))
        })?;

        self.state.active_turns = session.turns.clone();
        self.state.active_thread_id = Some(thread_id.to_string());
        self.state.pending_question = None;
        self.state.view = View::Chat;
        Ok(())
    }

    /// Remove a stored session. Deleting the active one also resets the
    /// conversation and returns to the home view; deleting any other session
    /// leaves the active conversation alone.
    pub fn delete_session(&mut self, thread_id: &str) {
        self.state.store.remove(thread_id);

        if self.state.active_thread_id.as_deref() == Some(thread_id) {
            self.state.active_turns.clear();
            self.state.active_thread_id = None;
            self.state.pending_question = None;
            self.state.view = View::Home;
        }
    }

    /// Route a question into the conversation. From the home view this only
    /// navigates: the question is parked until the chat view picks it up with
    /// [`process_pending`](Self::process_pending). From the chat view the
    /// question is dispatched immediately.
    pub async fn submit_question(&mut self, text: &str) {
        if text.trim().is_empty() {
            return;
        }

        match self.state.view {
            View::Home => {
                self.save_current_session();
                self.state.view = View::Chat;
                self.state.active_turns.clear();
                self.state.active_thread_id = None;
                self.state.pending_question = Some(text.to_string());
            }
            View::Chat => {
                self.state.active_turns.push(Turn::user(text));
                self.dispatch(text).await;
            }
        }
    }

    /// Dispatch a question parked by a home-view submission.
    pub async fn process_pending(&mut self) {
        if let Some(question) = self.state.pending_question.take() {
            self.state.active_turns.push(Turn::user(question.clone()));
            self.dispatch(&question).await;
        }
    }

    /// Flush and return to the home view. The active conversation stays bound,
    /// so picking it up again from the sidebar or continuing later both work.
    pub fn go_home(&mut self) {
        self.save_current_session();
        self.state.pending_question = None;
        self.state.view = View::Home;
    }

    /// Send one question to the agent. Binds a remote thread first if none is
    /// bound yet (at most once per conversation; a failed bind leaves the slot
    /// empty so the next question retries). Appends exactly one assistant
    /// turn, a diagnostic one when anything fails.
    async fn dispatch(&mut self, question: &str) {
        if self.state.active_thread_id.is_none() {
            match self.agent.create_thread().await {
                Ok(id) => self.state.active_thread_id = Some(id),
                Err(e) => {
                    self.state.active_turns.push(Turn::assistant(format!(
                        "Sorry, a conversation could not be started with the agent: {}",
                        e
                    )));
                    return;
                }
            }
        }

        let Some(thread_id) = self.state.active_thread_id.clone() else {
            return;
        };

        let answer = match self.agent.ask(&thread_id, question).await {
            Ok(answer) => answer,
            Err(e) => format!("Sorry, the agent could not answer this question: {}", e),
        };
        self.state.active_turns.push(Turn::assistant(answer));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::Role;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Scripted collaborator: deterministic thread ids, echo answers, and
    /// per-question failure injection.
    #[derive(Default)]
    struct MockAgent {
        threads_created: AtomicU32,
        fail_thread_creation: bool,
        fail_question: Option<String>,
        asked: Mutex<Vec<(String, String)>>,
    }

    impl MockAgent {
        fn failing_on(question: &str) -> Self {
            Self {
                fail_question: Some(question.to_string()),
                ..Self::default()
            }
        }
    }

    #[async_trait]
    impl AgentRuntime for MockAgent {
        async fn create_thread(&self) -> crate::error::Result<String> {
            if self.fail_thread_creation {
                return Err(SapwiseError::Api(
                    "request failed with status 503: service busy".to_string(),
                ));
            }
            let n = self.threads_created.fetch_add(1, Ordering::SeqCst);
            Ok(format!("thread_{}", n + 1))
        }

        async fn ask(&self, thread_id: &str, question: &str) -> crate::error::Result<String> {
            self.asked
                .lock()
                .unwrap()
                .push((thread_id.to_string(), question.to_string()));

            if self.fail_question.as_deref() == Some(question) {
                return Err(SapwiseError::RunFailure(
                    "rate_limit_exceeded: Too many requests".to_string(),
                ));
            }
            Ok(format!("Answer to: {}", question))
        }
    }

    fn manager() -> SessionManager<MockAgent> {
        SessionManager::new(MockAgent::default())
    }

    async fn ask_from_home(manager: &mut SessionManager<MockAgent>, question: &str) {
        manager.submit_question(question).await;
        manager.process_pending().await;
    }

    #[tokio::test]
    async fn test_home_submission_navigates_then_answers() {
        let mut manager = manager();
        assert_eq!(manager.state().view, View::Home);

        ask_from_home(&mut manager, "F5 101").await;

        let state = manager.state();
        assert_eq!(state.view, View::Chat);
        assert_eq!(state.active_thread_id.as_deref(), Some("thread_1"));
        assert_eq!(state.active_turns.len(), 2);
        assert_eq!(state.active_turns[0], Turn::user("F5 101"));
        assert_eq!(state.active_turns[1].role, Role::Assistant);
        assert_eq!(state.active_turns[1].content, "Answer to: F5 101");
        assert!(state.pending_question.is_none());
    }

    #[tokio::test]
    async fn test_new_chat_saves_previous_conversation() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;

        manager.start_new_session();

        let state = manager.state();
        assert_eq!(state.store.len(), 1);
        let saved = state.store.get("thread_1").unwrap();
        assert_eq!(saved.turns.len(), 2);
        assert!(state.active_turns.is_empty());
        assert!(state.active_thread_id.is_none());
        assert_eq!(state.view, View::Chat);
    }

    #[tokio::test]
    async fn test_thread_is_bound_once_per_conversation() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;
        manager.submit_question("And how do I fix it?").await;

        let state = manager.state();
        assert_eq!(state.active_thread_id.as_deref(), Some("thread_1"));
        assert_eq!(state.active_turns.len(), 4);

        let asked = manager.agent.asked.lock().unwrap();
        assert!(asked.iter().all(|(thread, _)| thread == "thread_1"));
    }

    #[tokio::test]
    async fn test_save_is_an_idempotent_upsert() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;

        manager.save_current_session();
        manager.save_current_session();
        manager.save_current_session();

        assert_eq!(manager.state().store.len(), 1);
        // The flush never disturbs the active conversation
        assert_eq!(manager.state().active_turns.len(), 2);
        assert_eq!(manager.state().active_thread_id.as_deref(), Some("thread_1"));
    }

    #[tokio::test]
    async fn test_save_without_thread_or_turns_is_noop() {
        let mut manager = manager();
        manager.save_current_session();
        assert!(manager.state().store.is_empty());

        // Parked question only, nothing dispatched yet: still nothing to save
        manager.submit_question("F5 101").await;
        manager.save_current_session();
        assert!(manager.state().store.is_empty());
    }

    #[tokio::test]
    async fn test_delete_old_session_after_starting_new_one() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;
        manager.start_new_session();

        // The saved entry survives until it is deleted explicitly, and the
        // unsaved new conversation is unaffected by the delete.
        assert!(manager.state().store.get("thread_1").is_some());
        manager.delete_session("thread_1");

        let state = manager.state();
        assert!(state.store.is_empty());
        assert!(state.active_turns.is_empty());
        assert_eq!(state.view, View::Chat);
    }

    #[tokio::test]
    async fn test_load_session_is_idempotent() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;
        manager.start_new_session();

        manager.load_session("thread_1").unwrap();
        let first = manager.state().active_turns.clone();

        manager.load_session("thread_1").unwrap();
        let second = manager.state().active_turns.clone();

        assert_eq!(first, second);
        assert_eq!(manager.state().active_thread_id.as_deref(), Some("thread_1"));
        assert_eq!(manager.state().view, View::Chat);
    }

    #[tokio::test]
    async fn test_load_flushes_current_conversation_first() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;
        manager.go_home();
        ask_from_home(&mut manager, "ME 027").await;

        manager.load_session("thread_1").unwrap();

        let state = manager.state();
        assert_eq!(state.store.len(), 2);
        assert!(state.store.get("thread_2").is_some());
        assert_eq!(state.active_thread_id.as_deref(), Some("thread_1"));
    }

    #[tokio::test]
    async fn test_load_unknown_session_fails() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;

        let err = manager.load_session("thread_9").unwrap_err();
        assert!(matches!(err, SapwiseError::Config(_)));
        // The flush before the lookup still took place
        assert_eq!(manager.state().store.len(), 1);
        assert_eq!(manager.state().active_thread_id.as_deref(), Some("thread_1"));
    }

    #[tokio::test]
    async fn test_delete_unknown_session_is_noop() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;
        manager.save_current_session();

        manager.delete_session("thread_9");

        let state = manager.state();
        assert_eq!(state.store.len(), 1);
        assert_eq!(state.active_turns.len(), 2);
        assert_eq!(state.active_thread_id.as_deref(), Some("thread_1"));
        assert_eq!(state.view, View::Chat);
    }

    #[tokio::test]
    async fn test_delete_active_session_resets_to_home() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;
        manager.save_current_session();

        manager.delete_session("thread_1");

        let state = manager.state();
        assert!(state.store.is_empty());
        assert!(state.active_turns.is_empty());
        assert!(state.active_thread_id.is_none());
        assert!(state.pending_question.is_none());
        assert_eq!(state.view, View::Home);
    }

    #[tokio::test]
    async fn test_delete_non_active_session_keeps_conversation() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;
        manager.go_home();
        ask_from_home(&mut manager, "ME 027").await;

        manager.delete_session("thread_1");

        let state = manager.state();
        assert_eq!(state.active_thread_id.as_deref(), Some("thread_2"));
        assert_eq!(state.active_turns.len(), 2);
        assert_eq!(state.view, View::Chat);
    }

    #[tokio::test]
    async fn test_run_failure_becomes_a_visible_turn() {
        let mut manager = SessionManager::new(MockAgent::failing_on("ME 027"));
        ask_from_home(&mut manager, "F5 101").await;
        let turns_before = manager.state().active_turns.len();

        manager.submit_question("ME 027").await;

        let state = manager.state();
        assert_eq!(state.active_turns.len(), turns_before + 2);
        let last = state.active_turns.last().unwrap();
        assert_eq!(last.role, Role::Assistant);
        assert!(last.content.contains("rate_limit_exceeded: Too many requests"));
    }

    #[tokio::test]
    async fn test_failed_thread_bind_is_reported_and_retried() {
        let mut manager = SessionManager::new(MockAgent {
            fail_thread_creation: true,
            ..MockAgent::default()
        });
        ask_from_home(&mut manager, "F5 101").await;

        let state = manager.state();
        assert_eq!(state.active_turns.len(), 2);
        assert!(state.active_turns[1]
            .content
            .contains("could not be started"));
        assert!(state.active_thread_id.is_none());

        // The agent never got the question
        assert!(manager.agent.asked.lock().unwrap().is_empty());

        // Once the service recovers, the next question binds a thread
        manager.agent.fail_thread_creation = false;
        manager.submit_question("F5 101 again").await;
        assert_eq!(manager.state().active_thread_id.as_deref(), Some("thread_1"));
    }

    #[tokio::test]
    async fn test_blank_question_is_ignored() {
        let mut manager = manager();
        manager.submit_question("   ").await;

        let state = manager.state();
        assert_eq!(state.view, View::Home);
        assert!(state.pending_question.is_none());
        assert!(state.active_turns.is_empty());
    }

    #[tokio::test]
    async fn test_go_home_flushes_and_keeps_conversation_bound() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;

        manager.go_home();

        let state = manager.state();
        assert_eq!(state.view, View::Home);
        assert_eq!(state.store.len(), 1);
        assert_eq!(state.active_thread_id.as_deref(), Some("thread_1"));
        assert_eq!(state.active_turns.len(), 2);
    }

    #[tokio::test]
    async fn test_home_submission_flushes_previous_conversation() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;
        manager.go_home();

        ask_from_home(&mut manager, "PG 002").await;

        // The old conversation was flushed; the new one is active and not
        // yet saved anywhere.
        let state = manager.state();
        assert_eq!(state.store.len(), 1);
        assert!(state.store.get("thread_1").is_some());
        assert_eq!(state.active_thread_id.as_deref(), Some("thread_2"));
        assert_eq!(state.active_turns[0], Turn::user("PG 002"));

        manager.go_home();
        assert_eq!(manager.state().store.len(), 2);
    }

    #[tokio::test]
    async fn test_updating_a_reloaded_session_rewrites_store_entry() {
        let mut manager = manager();
        ask_from_home(&mut manager, "F5 101").await;
        manager.start_new_session();
        manager.load_session("thread_1").unwrap();

        manager.submit_question("More detail please").await;
        manager.save_current_session();

        let state = manager.state();
        assert_eq!(state.store.len(), 1);
        assert_eq!(state.store.get("thread_1").unwrap().turns.len(), 4);
    }
}
