//! Command-line host: argument parsing, wiring, and the chat REPL.

use crate::agent::{CommandRouter, SystemActions};
use crate::backend;
use crate::companion::{Companion, TurnKind};
use crate::config::{Config, DEFAULT_CONFIG_FILE};
use crate::db::SqliteStore;
use crate::logging;
use crate::personality::{PersonalityProfile, Trait};
use crate::responder::ResponseGenerator;
use crate::store::{ConversationStore, Message, Sender};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

pub type CliResult<T> = Result<T, Box<dyn std::error::Error + Send + Sync>>;

#[derive(Parser, Debug)]
#[command(name = "companion")]
#[command(about = "Personality-driven chat companion with a desktop automation agent")]
pub struct Cli {
    /// Path to the JSON config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    /// Echo log lines to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive chat (default)
    Chat {
        /// Start with agent mode on
        #[arg(long)]
        agent: bool,
    },
    /// List past conversations, newest first
    Conversations,
    /// Print a conversation's messages (today's by default)
    History {
        #[arg(long)]
        id: Option<String>,
    },
    /// Message and conversation counts
    Stats,
    /// Show or edit the companion's personality
    #[command(subcommand)]
    Personality(PersonalityCommand),
    /// Write today's conversation to a text file
    Export { file: PathBuf },
}

#[derive(Subcommand, Debug)]
pub enum PersonalityCommand {
    Show,
    Set(PersonalityArgs),
    Reset,
}

/// Fields left out keep their current value.
#[derive(Args, Debug, Default)]
pub struct PersonalityArgs {
    #[arg(long)]
    pub name: Option<String>,
    #[arg(long)]
    pub age: Option<u32>,
    /// Comma-separated, e.g. "carinhosa,tímida"
    #[arg(long)]
    pub traits: Option<String>,
    #[arg(long)]
    pub hobbies: Option<String>,
    #[arg(long)]
    pub foods: Option<String>,
    #[arg(long)]
    pub fears: Option<String>,
    #[arg(long)]
    pub dreams: Option<String>,
}

fn parse_traits(raw: &str) -> Result<Vec<Trait>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::parse::<Trait>)
        .collect()
}

impl PersonalityArgs {
    /// Builds the full replacement profile from `current` plus the given fields.
    pub fn apply(self, current: &PersonalityProfile) -> Result<PersonalityProfile, String> {
        let mut profile = current.clone();
        if let Some(name) = self.name {
            profile.name = name;
        }
        if let Some(age) = self.age {
            profile.age = age;
        }
        if let Some(traits) = self.traits {
            profile.traits = parse_traits(&traits)?.into_iter().collect();
        }
        if let Some(v) = self.hobbies {
            profile.hobbies = v;
        }
        if let Some(v) = self.foods {
            profile.foods = v;
        }
        if let Some(v) = self.fears {
            profile.fears = v;
        }
        if let Some(v) = self.dreams {
            profile.dreams = v;
        }
        Ok(profile)
    }
}

fn print_profile(p: &PersonalityProfile) {
    println!("Nome: {}", p.name);
    println!("Idade: {}", p.age);
    println!("Traços: {}", p.traits_text());
    println!("Hobbies: {}", p.hobbies);
    println!("Comidas favoritas: {}", p.foods);
    println!("Medos: {}", p.fears);
    println!("Sonhos: {}", p.dreams);
}

fn print_messages(name: &str, messages: &[Message]) {
    for m in messages {
        let who = match m.sender {
            Sender::User => "Você",
            Sender::Ai => name,
            Sender::System => "Sistema",
        };
        println!("{}: {}", who, m.text);
    }
}

fn build_companion(config: &Config, store: Arc<dyn ConversationStore>) -> CliResult<Companion> {
    let backend = backend::from_config(config)?;
    if backend.is_none() {
        logging::log_chat(None, "No API key configured, using pattern responses");
    }
    let responder = ResponseGenerator::new(backend, config.seed);
    let os = Arc::new(SystemActions::new(config.screenshot_dir.clone()));
    let router = CommandRouter::new(os, config.seed);
    Ok(Companion::new(store, responder, router, config.agent_mode)?)
}

pub async fn run(cli: Cli) -> CliResult<()> {
    let config = Config::load(&cli.config)?;

    if let Err(e) = logging::init_logging(&config.log_dir, cli.verbose) {
        eprintln!("Logging disabled: {}", e);
    } else if let Ok(removed) = logging::cleanup_old_logs(&config.log_dir) {
        if removed > 0 {
            logging::log_conversation(None, &format!("Removed {} old log files", removed));
        }
    }

    let store: Arc<dyn ConversationStore> = Arc::new(SqliteStore::open(&config.database_path)?);

    match cli.command.unwrap_or(Command::Chat { agent: false }) {
        Command::Chat { agent } => {
            let mut companion = build_companion(&config, store)?;
            if agent && !companion.agent_mode() {
                println!("{}", companion.set_agent_mode(true));
            }
            chat_loop(&mut companion).await?;
        }
        Command::Conversations => {
            for c in store.list_conversations(Local::now().date_naive())? {
                println!("{}  {:<10}  {}", c.id, c.day_label, c.last_message);
            }
        }
        Command::History { id } => {
            let id = match id {
                Some(id) => id,
                None => store.get_or_create_conversation_for(Local::now().date_naive())?,
            };
            let personality = store.get_current_personality()?;
            print_messages(&personality.name, &store.full_history(&id)?);
        }
        Command::Stats => {
            let s = store.stats()?;
            println!("Conversas: {}", s.total_conversations);
            println!("Mensagens: {}", s.total_messages);
            println!("  suas: {}", s.user_messages);
            println!("  da companhia: {}", s.ai_messages);
        }
        Command::Personality(PersonalityCommand::Show) => {
            print_profile(&store.get_current_personality()?);
        }
        Command::Personality(PersonalityCommand::Set(args)) => {
            let current = store.get_current_personality()?;
            let profile = args.apply(&current)?;
            store.save_personality(&profile)?;
            print_profile(&profile);
        }
        Command::Personality(PersonalityCommand::Reset) => {
            print_profile(&store.reset_personality()?);
        }
        Command::Export { file } => {
            let companion = build_companion(&config, store)?;
            let count = companion.export_conversation(&file)?;
            println!("{} mensagens exportadas para {}", count, file.display());
        }
    }
    Ok(())
}

const HELP_TEXT: &str = "Comandos: /agente, /status, /dicas, /macro NOME, /exportar ARQUIVO, /sair";

enum LineAction {
    Print(String),
    Quit,
}

fn report_error(companion: &Companion, e: impl std::fmt::Display) -> LineAction {
    logging::log_error(Some(companion.conversation_id()), &e.to_string());
    LineAction::Print(format!("Erro: {}", e))
}

/// One REPL line. Failures are reported and the session goes on.
async fn handle_line(companion: &mut Companion, input: &str) -> LineAction {
    let name = companion.personality().name.clone();
    let (command, arg) = match input.split_once(' ') {
        Some((c, a)) => (c, a.trim()),
        None => (input, ""),
    };

    let text = match command {
        "/sair" => return LineAction::Quit,
        "/ajuda" => HELP_TEXT.to_string(),
        "/agente" => {
            let enabled = !companion.agent_mode();
            companion.set_agent_mode(enabled)
        }
        "/status" => format!("{}: {}", name, companion.status_report().text),
        "/dicas" => companion
            .tips()
            .iter()
            .map(|tip| format!("• {}", tip))
            .collect::<Vec<_>>()
            .join("\n"),
        "/macro" => match companion.run_macro(arg) {
            Ok(reply) => format!("{}: {}", name, reply.text),
            Err(e) => return report_error(companion, e),
        },
        "/exportar" if !arg.is_empty() => match companion.export_conversation(&PathBuf::from(arg)) {
            Ok(count) => format!("{} mensagens exportadas para {}", count, arg),
            Err(e) => return report_error(companion, e),
        },
        "/exportar" => "Uso: /exportar ARQUIVO".to_string(),
        _ => match companion.handle_turn(input).await {
            Ok(Some(reply)) => {
                let marker = match reply.kind {
                    TurnKind::Command { success: false } => " ⚠",
                    _ => "",
                };
                format!("{}{}: {}", name, marker, reply.text)
            }
            Ok(None) => String::new(),
            Err(e) => return report_error(companion, e),
        },
    };
    LineAction::Print(text)
}

async fn chat_loop(companion: &mut Companion) -> CliResult<()> {
    let name = companion.personality().name.clone();
    println!("{}", HELP_TEXT);
    println!("{}: {}", name, companion.greeting());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    loop {
        stdout.write_all(b"> ").await?;
        stdout.flush().await?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        match handle_line(companion, line.trim()).await {
            LineAction::Quit => break,
            LineAction::Print(text) => {
                if !text.is_empty() {
                    println!("{}", text);
                }
            }
        }
    }

    logging::log_conversation(Some(companion.conversation_id()), "Session ended");
    Ok(())
}
