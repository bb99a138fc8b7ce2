use crate::agent::AgentClient;
use crate::config::SapwiseConfig;
use crate::error::Result;
use crate::session::{Role, SessionManager, View};
use crate::ui::Ui;
use colored::Colorize;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// What the user asked for on the home screen.
#[derive(Debug, Clone, PartialEq, Eq)]
enum HomeAction {
    Quit,
    Redraw,
    NewChat,
    OpenSession(usize),
    DeleteSession(usize),
    AskPreset(usize),
    AskText(String),
    Invalid(String),
}

/// What the user asked for on the chat screen.
#[derive(Debug, Clone, PartialEq, Eq)]
enum ChatAction {
    Quit,
    Redraw,
    Home,
    NewChat,
    Ask(String),
}

fn parse_home_input(input: &str, preset_count: usize) -> HomeAction {
    let input = input.trim();
    if input.is_empty() {
        return HomeAction::Redraw;
    }

    match input.to_lowercase().as_str() {
        "q" | "quit" | "exit" => return HomeAction::Quit,
        "n" | "new" => return HomeAction::NewChat,
        _ => {}
    }

    for (prefix, open) in [
        ("open ", true),
        ("o ", true),
        ("delete ", false),
        ("del ", false),
        ("d ", false),
    ] {
        if let Some(rest) = input.strip_prefix(prefix) {
            return match rest.trim().parse::<usize>() {
                Ok(n) if n > 0 => {
                    if open {
                        HomeAction::OpenSession(n - 1)
                    } else {
                        HomeAction::DeleteSession(n - 1)
                    }
                }
                _ => HomeAction::Invalid(format!("'{}' is not a chat number", rest.trim())),
            };
        }
    }

    if let Ok(n) = input.parse::<usize>() {
        return if n > 0 && n <= preset_count {
            HomeAction::AskPreset(n - 1)
        } else {
            HomeAction::Invalid(format!(
                "Preset numbers go from 1 to {}",
                preset_count
            ))
        };
    }

    HomeAction::AskText(input.to_string())
}

fn parse_chat_input(input: &str) -> ChatAction {
    let input = input.trim();
    if input.is_empty() {
        return ChatAction::Redraw;
    }

    match input.to_lowercase().as_str() {
        "/quit" | "/q" | "/exit" => ChatAction::Quit,
        "/home" | "/h" => ChatAction::Home,
        "/new" | "/n" => ChatAction::NewChat,
        _ => ChatAction::Ask(input.to_string()),
    }
}

/// Interactive loop over the home and chat screens. Each iteration renders
/// the active view, reads one action and hands it to the session manager.
pub struct Repl {
    manager: SessionManager<AgentClient>,
    config: SapwiseConfig,
    runtime: tokio::runtime::Runtime,
}

impl Repl {
    pub fn new(agent: AgentClient, config: SapwiseConfig, runtime: tokio::runtime::Runtime) -> Self {
        Self {
            manager: SessionManager::new(agent),
            config,
            runtime,
        }
    }

    pub fn run(&mut self) -> Result<()> {
        loop {
            let keep_going = match self.manager.state().view {
                View::Home => self.home_screen()?,
                View::Chat => self.chat_screen()?,
            };
            if !keep_going {
                break;
            }
        }

        self.manager.save_current_session();
        Ui::print_goodbye();
        Ok(())
    }

    /// Answer one question and exit, without entering the interactive views.
    pub fn process_single_question(&mut self, question: &str) -> Result<()> {
        println!("{} {}", "λ>".bright_green().bold(), question);

        self.with_spinner(|runtime, manager| {
            runtime.block_on(async {
                manager.submit_question(question).await;
                manager.process_pending().await;
            });
        });

        if let Some(turn) = self
            .manager
            .state()
            .active_turns
            .iter()
            .rev()
            .find(|t| t.role == Role::Assistant)
        {
            println!("{}", Ui::render_markdown(&turn.content));
        }

        Ok(())
    }

    fn home_screen(&mut self) -> Result<bool> {
        Ui::clear_screen()?;
        Ui::print_home(
            &self.config.preset_questions,
            &self.manager.state().store,
            self.config.max_preview_length,
        );

        let Some(line) = read_line("> ")? else {
            return Ok(false);
        };

        // The sidebar numbers saved chats newest-first; map back to thread ids
        // from the same ordering.
        let listed: Vec<String> = self
            .manager
            .state()
            .store
            .iter_recent()
            .map(|s| s.thread_id.clone())
            .collect();

        match parse_home_input(&line, self.config.preset_questions.len()) {
            HomeAction::Quit => Ok(false),
            HomeAction::Redraw => Ok(true),
            HomeAction::NewChat => {
                self.manager.start_new_session();
                Ok(true)
            }
            HomeAction::OpenSession(i) => {
                match listed.get(i) {
                    Some(thread_id) => {
                        if let Err(e) = self.manager.load_session(thread_id) {
                            Ui::print_error(&e.to_string());
                            pause()?;
                        }
                    }
                    None => {
                        Ui::print_error("No such saved chat");
                        pause()?;
                    }
                }
                Ok(true)
            }
            HomeAction::DeleteSession(i) => {
                match listed.get(i) {
                    Some(thread_id) => self.manager.delete_session(thread_id),
                    None => {
                        Ui::print_error("No such saved chat");
                        pause()?;
                    }
                }
                Ok(true)
            }
            HomeAction::AskPreset(i) => {
                let question = self.config.preset_questions[i].clone();
                self.park_question(&question);
                Ok(true)
            }
            HomeAction::AskText(text) => {
                self.park_question(&text);
                Ok(true)
            }
            HomeAction::Invalid(message) => {
                Ui::print_error(&message);
                pause()?;
                Ok(true)
            }
        }
    }

    fn chat_screen(&mut self) -> Result<bool> {
        Ui::clear_screen()?;
        Ui::print_chat(&self.manager.state().active_turns);

        // A question submitted from home is dispatched on arrival in this view.
        if let Some(question) = self.manager.state().pending_question.clone() {
            println!("{} {}", "λ>".bright_green().bold(), question);
            self.with_spinner(|runtime, manager| {
                runtime.block_on(manager.process_pending());
            });
            return Ok(true);
        }

        let Some(line) = read_line("λ>")? else {
            return Ok(false);
        };

        match parse_chat_input(&line) {
            ChatAction::Quit => Ok(false),
            ChatAction::Redraw => Ok(true),
            ChatAction::Home => {
                self.manager.go_home();
                Ok(true)
            }
            ChatAction::NewChat => {
                self.manager.start_new_session();
                Ok(true)
            }
            ChatAction::Ask(text) => {
                self.with_spinner(|runtime, manager| {
                    runtime.block_on(manager.submit_question(&text));
                });
                Ok(true)
            }
        }
    }

    /// Home-view submissions only navigate; dispatch happens when the chat
    /// screen picks the question up.
    fn park_question(&mut self, text: &str) {
        let Self {
            runtime, manager, ..
        } = self;
        runtime.block_on(manager.submit_question(text));
    }

    fn with_spinner<F>(&mut self, f: F)
    where
        F: FnOnce(&tokio::runtime::Runtime, &mut SessionManager<AgentClient>),
    {
        let running = Arc::new(AtomicBool::new(true));
        let spinner = thread::spawn({
            let running = Arc::clone(&running);
            move || Ui::run_spinner("The agent is preparing an answer...".to_string(), running)
        });

        let Self {
            runtime, manager, ..
        } = self;
        f(runtime, manager);

        running.store(false, Ordering::SeqCst);
        let _ = spinner.join();
    }
}

fn read_line(prompt: &str) -> Result<Option<String>> {
    print!("{} ", prompt.bright_green().bold());
    io::stdout().flush()?;

    let mut input = String::new();
    let read = io::stdin().read_line(&mut input)?;
    if read == 0 {
        // EOF
        return Ok(None);
    }
    Ok(Some(input.trim().to_string()))
}

fn pause() -> Result<()> {
    print!("{} ", "Press Enter to continue...".dimmed());
    io::stdout().flush()?;
    let mut buf = String::new();
    io::stdin().read_line(&mut buf)?;
    Ok(())
}
