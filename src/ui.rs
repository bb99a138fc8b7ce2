use crate::session::{Role, SessionStore, Turn};
use colored::Colorize;
use crossterm::cursor::MoveTo;
use crossterm::execute;
use crossterm::terminal::{Clear, ClearType};
use pulldown_cmark::{Event, Parser, Tag, TagEnd};
use std::io::{self, stdout, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Message severity levels for consistent UI feedback
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MessageSeverity {
    /// Recoverable issues, non-critical problems
    Warning,
    /// Actual failures (network, IO, parsing errors)
    Error,
    /// Informational messages
    #[allow(dead_code)]
    Info,
}

impl MessageSeverity {
    pub fn prefix(&self) -> colored::ColoredString {
        match self {
            Self::Warning => "Warning:".bright_yellow().bold(),
            Self::Error => "Error:".bright_red().bold(),
            Self::Info => "Info:".bright_cyan().bold(),
        }
    }
}

/// UI utilities for rendering the home and chat screens
pub struct Ui;

impl Ui {
    pub fn print_message(severity: MessageSeverity, message: &str) {
        eprintln!("{} {}", severity.prefix(), message);
    }

    pub fn print_warning(message: &str) {
        Self::print_message(MessageSeverity::Warning, message);
    }

    pub fn print_error(message: &str) {
        Self::print_message(MessageSeverity::Error, message);
    }

    pub fn print_welcome() {
        println!("{}", "Sapwise - SAP Error Knowledge Chat".bright_cyan().bold());
        println!(
            "{}",
            "Ask about SAP error codes and related documentation.".dimmed()
        );
        println!();
    }

    pub fn print_goodbye() {
        println!("{}", "Goodbye!".bright_cyan());
    }

    pub fn clear_screen() -> io::Result<()> {
        let mut out = stdout();
        execute!(out, Clear(ClearType::All), MoveTo(0, 0))?;
        out.flush()
    }

    pub fn print_home(presets: &[String], store: &SessionStore, max_preview: usize) {
        println!("{}", "Sapwise - SAP Error Knowledge Chat".bright_cyan().bold());
        println!(
            "{}",
            "Pick a preset question below, or type your own.".dimmed()
        );
        println!();

        println!("{}", "Preset questions:".bright_cyan().bold());
        for (i, question) in presets.iter().enumerate() {
            println!(
                "  {} {}",
                format!("[{}]", i + 1).bright_green().bold(),
                question
            );
        }
        println!();

        if store.is_empty() {
            println!("{}", "No saved chats yet.".dimmed());
        } else {
            println!("{}", "Saved chats:".bright_cyan().bold());
            for (i, session) in store.iter_recent().enumerate() {
                let age = Self::format_timestamp(session.updated_at);
                let msg_count = format!("{} messages", session.turns.len());

                println!(
                    "  {} {} {}",
                    format!("[{}]", i + 1).bright_green().bold(),
                    session.preview(max_preview).bright_white(),
                    format!("({} • {})", age, msg_count).dimmed()
                );
            }
        }
        println!();

        println!(
            "{}",
            "Enter a preset number or a question. 'open <n>' / 'del <n>' act on saved chats, 'new' starts a chat, 'quit' exits."
                .dimmed()
        );
    }

    pub fn print_chat(turns: &[Turn]) {
        println!("{}", "Sapwise - SAP Error Knowledge Chat".bright_cyan().bold());
        println!(
            "{}",
            "Type a question. '/home' returns to the start screen, '/new' begins a fresh chat, '/quit' exits."
                .dimmed()
        );
        println!();

        for turn in turns {
            Self::print_turn(turn);
        }
    }

    pub fn print_turn(turn: &Turn) {
        match turn.role {
            Role::User => {
                println!("{} {}", "λ>".bright_green().bold(), turn.content);
                println!();
            }
            Role::Assistant => {
                println!("{}", "Assistant:".bright_blue().bold());
                println!("{}", Self::render_markdown(&turn.content));
                println!();
            }
        }
    }

    /// Renders answer markdown for the terminal. Citation links come back from
    /// the agent as `[title](url)`; they are shown as an underlined title with
    /// the url in parentheses.
    pub fn render_markdown(text: &str) -> String {
        let mut out = String::new();
        let mut link: Option<(String, String)> = None;
        let mut emphasis: usize = 0;

        for event in Parser::new(text) {
            match event {
                Event::Start(Tag::Paragraph) => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                }
                Event::End(TagEnd::Paragraph) => out.push('\n'),
                Event::Start(Tag::Heading { .. }) => {
                    if !out.is_empty() {
                        out.push('\n');
                    }
                    emphasis += 1;
                }
                Event::End(TagEnd::Heading(_)) => {
                    emphasis = emphasis.saturating_sub(1);
                    out.push('\n');
                }
                Event::Start(Tag::Strong) | Event::Start(Tag::Emphasis) => emphasis += 1,
                Event::End(TagEnd::Strong) | Event::End(TagEnd::Emphasis) => {
                    emphasis = emphasis.saturating_sub(1);
                }
                Event::Start(Tag::Item) => out.push_str("  • "),
                Event::End(TagEnd::Item) => out.push('\n'),
                Event::Start(Tag::CodeBlock(_)) | Event::End(TagEnd::CodeBlock) => out.push('\n'),
                Event::Start(Tag::Link { dest_url, .. }) => {
                    link = Some((dest_url.to_string(), String::new()));
                }
                Event::End(TagEnd::Link) => {
                    if let Some((dest, label)) = link.take() {
                        if label == dest || label.is_empty() {
                            out.push_str(&dest.bright_cyan().underline().to_string());
                        } else {
                            out.push_str(&format!(
                                "{} {}",
                                label.bright_cyan().underline(),
                                format!("({})", dest).dimmed()
                            ));
                        }
                    }
                }
                Event::Text(t) => {
                    let text: &str = &t;
                    if let Some((_, label)) = link.as_mut() {
                        label.push_str(text);
                    } else if emphasis > 0 {
                        out.push_str(&text.bold().to_string());
                    } else {
                        out.push_str(text);
                    }
                }
                Event::Code(t) => {
                    let code: &str = &t;
                    out.push_str(&code.bright_yellow().to_string());
                }
                Event::SoftBreak | Event::HardBreak => out.push('\n'),
                Event::Rule => {
                    out.push_str(&"─".repeat(40));
                    out.push('\n');
                }
                _ => {}
            }
        }

        out.trim_end().to_string()
    }

    /// Spinner shown while a dispatch is in flight. There is no interrupt:
    /// a dispatch always runs to completion.
    pub fn run_spinner(message: String, running: Arc<AtomicBool>) {
        let frames = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
        let mut frame_idx = 0;

        print!("\n\x1B[?25l");
        let _ = io::stdout().flush();

        while running.load(Ordering::SeqCst) {
            print!(
                "\r{} {}",
                frames[frame_idx].truecolor(0xFF, 0x99, 0x33),
                message.truecolor(0xFF, 0x99, 0x33),
            );
            let _ = io::stdout().flush();
            frame_idx = (frame_idx + 1) % frames.len();
            thread::sleep(Duration::from_millis(80));
        }

        print!("\r{}\r", " ".repeat(70));
        print!("\x1B[?25h");
        println!();
        let _ = io::stdout().flush();
    }

    fn format_timestamp(timestamp: u64) -> String {
        use std::time::{Duration, SystemTime, UNIX_EPOCH};

        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("System time is before UNIX epoch")
            .as_secs();
        let diff = now.saturating_sub(timestamp);

        if diff < 60 {
            "just now".to_string()
        } else if diff < 3600 {
            let mins = diff / 60;
            format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
        } else if diff < 86400 {
            let hours = diff / 3600;
            format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
        } else {
            use chrono::{DateTime, Utc};
            let dt = DateTime::<Utc>::from(UNIX_EPOCH + Duration::from_secs(timestamp));
            dt.format("%Y-%m-%d").to_string()
        }
    }
}
