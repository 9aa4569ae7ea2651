//! REPL session management

use std::path::PathBuf;

use chrono::Local;
use colored::Colorize;
use eyre::Result;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::{debug, warn};

use crate::document::write_documents;
use crate::session::{ChatSession, TurnError, TurnOutcome};

/// Interactive REPL session
pub struct ReplSession {
    chat: ChatSession,
    conversations_dir: PathBuf,
    output_dir: PathBuf,
}

enum SlashResult {
    Continue,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SlashCommand {
    Help,
    Progress,
    Questions,
    Next,
    Export,
    Pdf,
    Reset,
    Quit,
}

/// Commands as listed by `/help`
const COMMANDS: [(&str, SlashCommand, &str); 8] = [
    ("/help", SlashCommand::Help, "Toon deze hulp"),
    ("/progress", SlashCommand::Progress, "Toon de voortgang"),
    ("/questions", SlashCommand::Questions, "Toon alle vragen met hun status"),
    ("/next", SlashCommand::Next, "Toon de volgende open vraag"),
    ("/export", SlashCommand::Export, "Sla het gesprek op als JSON"),
    ("/pdf", SlashCommand::Pdf, "Maak het formele plan en het gespreksdocument"),
    ("/reset", SlashCommand::Reset, "Begin opnieuw met een lege vragenlijst"),
    ("/quit", SlashCommand::Quit, "Afsluiten"),
];

fn parse_command(cmd: &str) -> Option<SlashCommand> {
    match cmd {
        "/h" => Some(SlashCommand::Help),
        "/p" => Some(SlashCommand::Progress),
        "/q" | "/exit" => Some(SlashCommand::Quit),
        _ => COMMANDS.iter().find(|(name, _, _)| *name == cmd).map(|(_, command, _)| *command),
    }
}

impl ReplSession {
    pub fn new(chat: ChatSession, conversations_dir: PathBuf, output_dir: PathBuf) -> Self {
        Self {
            chat,
            conversations_dir,
            output_dir,
        }
    }

    /// Run the REPL main loop
    pub async fn run(&mut self) -> Result<()> {
        self.print_welcome();

        if self.chat.is_initialized() {
            self.print_transcript();
        } else {
            self.start().await;
        }
        self.print_next();

        // Create readline editor for proper line editing
        let mut rl = DefaultEditor::new().map_err(|e| eyre::eyre!("Failed to initialize readline: {}", e))?;

        loop {
            let readline = rl.readline(&format!("{} ", ">".bright_green()));

            match readline {
                Ok(line) => {
                    let input = line.trim();
                    if input.is_empty() {
                        continue;
                    }

                    let _ = rl.add_history_entry(input);

                    if input.starts_with('/') {
                        match self.handle_slash_command(input).await {
                            SlashResult::Continue => continue,
                            SlashResult::Quit => break,
                        }
                    } else {
                        self.process_user_input(input).await;
                    }
                }
                Err(ReadlineError::Interrupted) => {
                    // Ctrl+C - just show new prompt
                    println!("^C");
                    continue;
                }
                Err(ReadlineError::Eof) => {
                    println!();
                    break;
                }
                Err(err) => {
                    return Err(eyre::eyre!("Readline error: {}", err));
                }
            }
        }

        println!("Tot ziens!");
        Ok(())
    }

    fn print_welcome(&self) {
        println!();
        println!("{}", "Ouderschapsplan Assistent".bright_cyan().bold());
        println!("Begrijpelijk overzicht van het gesprek, met voortgang per vraag.");
        println!("Typ {} voor hulp, {} om te stoppen", "/help".yellow(), "/quit".yellow());
        println!();
    }

    /// Greeting turn; a failure is shown and the parent can start typing anyway
    async fn start(&mut self) {
        println!("{}", "Assistent start op...".dimmed());
        match self.chat.start().await {
            Ok(Some(outcome)) => self.print_outcome(&outcome),
            Ok(None) => {}
            Err(e) => self.print_turn_error(&e),
        }
    }

    async fn handle_slash_command(&mut self, input: &str) -> SlashResult {
        let parts: Vec<&str> = input.split_whitespace().collect();
        let cmd = parts.first().copied().unwrap_or("");
        debug!(%cmd, "handle_slash_command: called");

        match parse_command(cmd) {
            Some(SlashCommand::Help) => self.print_help(),
            Some(SlashCommand::Quit) => return SlashResult::Quit,
            Some(SlashCommand::Progress) => self.print_progress(),
            Some(SlashCommand::Questions) => self.print_questions(),
            Some(SlashCommand::Next) => self.print_next(),
            Some(SlashCommand::Export) => self.export(),
            Some(SlashCommand::Pdf) => self.write_pdfs(),
            Some(SlashCommand::Reset) => {
                self.chat.reset();
                println!("{}", "Gesprek gewist.".dimmed());
                self.start().await;
                self.print_next();
            }
            None => {
                println!("{} Onbekend commando: {}", "?".yellow(), cmd);
                println!("Typ {} voor de beschikbare commando's", "/help".yellow());
            }
        }
        SlashResult::Continue
    }

    fn print_help(&self) {
        println!();
        println!("{}", "Beschikbare commando's:".bright_cyan());
        for (name, _, description) in COMMANDS {
            println!("  {:14} {}", name.yellow(), description);
        }
        println!();
        println!("Alle andere tekst gaat naar de assistent. Mislukt een beurt, stuur je bericht dan opnieuw.");
        println!();
    }

    async fn process_user_input(&mut self, input: &str) {
        println!("{}", "Denken...".dimmed());
        match self.chat.submit(input).await {
            Ok(outcome) => {
                self.print_outcome(&outcome);
                self.print_next();
            }
            Err(e) => self.print_turn_error(&e),
        }
    }

    fn print_outcome(&self, outcome: &TurnOutcome) {
        println!();
        println!("{}", outcome.answer);
        println!();
        if let Some(id) = &outcome.repaired {
            println!("{} {} gemarkeerd als beantwoord", "✓".green(), id.dimmed());
        }
        for id in &outcome.report.unknown_ids {
            println!("{} update voor onbekende vraag {} genegeerd", "!".yellow(), id);
        }
        println!("{}", format!("{}/{} voltooid", outcome.completed, outcome.total).dimmed());
    }

    fn print_turn_error(&self, err: &TurnError) {
        warn!(error = %err, "Turn failed");
        println!("{} Fout bij model: {}", "✗".red(), err);
        if let TurnError::Transport(e) = err {
            if let Some(wait) = e.retry_after() {
                println!("Probeer het over {} seconden opnieuw.", wait.as_secs());
            }
        }
    }

    fn print_transcript(&self) {
        for turn in self.chat.transcript().turns() {
            match turn.role {
                planstate::Role::User => println!("{} {}", ">".bright_green(), turn.content),
                planstate::Role::Assistant => println!("{}\n", turn.content),
            }
        }
    }

    fn print_progress(&self) {
        let progress = self.chat.questions().progress();
        let width = 30;
        let filled = (progress.ratio() * width as f64).round() as usize;
        println!(
            "[{}{}] {}/{} voltooid",
            "#".repeat(filled).green(),
            "-".repeat(width - filled),
            progress.completed,
            progress.total
        );
    }

    fn print_questions(&self) {
        println!();
        for q in self.chat.questions().iter() {
            let marker = if q.is_completed() { "✓".green() } else { "·".dimmed() };
            println!("  {} {:>3} {:28} {}", marker, q.position, q.id.dimmed(), q.question);
        }
        println!();
    }

    fn print_next(&self) {
        match self.chat.questions().progress().next_pending {
            Some(q) => println!("{} ({}): {}", "Volgende vraag".bright_cyan(), q.position, q.question),
            None => println!("{}", "Alle vragen zijn beantwoord.".bright_cyan()),
        }
    }

    fn export(&self) {
        let now = Local::now();
        match self.chat.export(now).save_to_dir(&self.conversations_dir, now) {
            Ok(path) => println!("{} Opgeslagen in {}", "✓".green(), path.display()),
            Err(e) => println!("{} {:#}", "✗".red(), e),
        }
    }

    fn write_pdfs(&self) {
        if self.chat.questions().completed().is_empty() {
            println!("Beantwoord eerst minimaal één vraag om een PDF te kunnen genereren.");
            return;
        }
        let now = Local::now();
        match write_documents(
            self.chat.questions().as_slice(),
            self.chat.parent_name(),
            &self.output_dir,
            now,
        ) {
            Ok(paths) => {
                println!("{} {}", "✓".green(), paths.formal.display());
                println!("{} {}", "✓".green(), paths.discussion.display());
            }
            Err(e) => println!("{} {:#}", "✗".red(), e),
        }
    }
}
