//! The per-turn pipeline tying store, responder and command router together.

use crate::agent::{self, insights, CommandRouter};
use crate::error::StoreError;
use crate::logging;
use crate::personality::PersonalityProfile;
use crate::responder::ResponseGenerator;
use crate::store::{ConversationStore, Message, Sender};
use chrono::{DateTime, Local, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;

/// Messages of history handed to mood analysis and the prompt.
const CHAT_HISTORY_LIMIT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TurnKind {
    Command { success: bool },
    Chat,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnReply {
    pub text: String,
    pub kind: TurnKind,
}

pub struct Companion {
    store: Arc<dyn ConversationStore>,
    responder: ResponseGenerator,
    router: CommandRouter,
    personality: PersonalityProfile,
    day: NaiveDate,
    conversation_id: String,
    agent_mode: bool,
}

impl Companion {
    pub fn new(
        store: Arc<dyn ConversationStore>,
        responder: ResponseGenerator,
        router: CommandRouter,
        agent_mode: bool,
    ) -> Result<Self, StoreError> {
        let personality = store.get_current_personality()?;
        let day = Local::now().date_naive();
        let conversation_id = store.get_or_create_conversation_for(day)?;

        logging::log_conversation(
            Some(&conversation_id),
            &format!(
                "Session started with {} (backend: {}, agent mode: {})",
                personality.name,
                responder.uses_backend(),
                agent_mode
            ),
        );

        Ok(Self {
            store,
            responder,
            router,
            personality,
            day,
            conversation_id,
            agent_mode,
        })
    }

    pub fn personality(&self) -> &PersonalityProfile {
        &self.personality
    }

    pub fn conversation_id(&self) -> &str {
        &self.conversation_id
    }

    pub fn agent_mode(&self) -> bool {
        self.agent_mode
    }

    /// Moves to the new day's conversation after midnight.
    fn ensure_today(&mut self) -> Result<(), StoreError> {
        let today = Local::now().date_naive();
        if today != self.day {
            self.conversation_id = self.store.get_or_create_conversation_for(today)?;
            self.day = today;
            logging::log_conversation(Some(&self.conversation_id), "Switched to a new day");
        }
        Ok(())
    }

    /// Handles one user message. Returns `None` for blank input.
    pub async fn handle_turn(&mut self, text: &str) -> Result<Option<TurnReply>, StoreError> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(None);
        }
        self.ensure_today()?;

        self.store.append_message(&self.conversation_id, Sender::User, text)?;

        let reply = if self.agent_mode && agent::is_command(text) {
            logging::log_routing(Some(&self.conversation_id), "Message routed to command handler");
            let result = self.router.route(text, &self.personality);
            TurnReply {
                text: result.text,
                kind: TurnKind::Command {
                    success: result.success,
                },
            }
        } else {
            let history = self
                .store
                .recent_messages(&self.conversation_id, CHAT_HISTORY_LIMIT)?;
            let reply = self
                .responder
                .respond(&self.personality, &history, text, self.agent_mode)
                .await;
            logging::log_chat(
                Some(&self.conversation_id),
                &format!("Reply generated ({} chars)", reply.chars().count()),
            );
            TurnReply {
                text: reply,
                kind: TurnKind::Chat,
            }
        };

        self.store.append_message(&self.conversation_id, Sender::Ai, &reply.text)?;
        Ok(Some(reply))
    }

    /// Opening line for the session. Not persisted.
    pub fn greeting(&mut self) -> String {
        self.responder.greet(&self.personality)
    }

    /// Toggles OS command handling and returns a notice for the user.
    pub fn set_agent_mode(&mut self, enabled: bool) -> String {
        self.agent_mode = enabled;
        logging::log_conversation(
            Some(&self.conversation_id),
            &format!("Agent mode {}", if enabled { "enabled" } else { "disabled" }),
        );
        if enabled {
            "🤖 Modo Agente ativado! Agora posso abrir programas, tirar screenshots, controlar o volume e muito mais.".to_string()
        } else {
            "💬 Modo Agente desativado. Voltamos ao papo normal!".to_string()
        }
    }

    pub fn update_personality(&mut self, profile: PersonalityProfile) -> Result<String, StoreError> {
        self.store.save_personality(&profile)?;
        logging::log_conversation(
            Some(&self.conversation_id),
            &format!("Personality updated: {} ({})", profile.name, profile.traits_text()),
        );
        self.personality = profile;
        Ok(format!(
            "✨ Personalidade atualizada! Agora eu sou a {}.",
            self.personality.name
        ))
    }

    pub fn reset_personality(&mut self) -> Result<String, StoreError> {
        self.personality = self.store.reset_personality()?;
        logging::log_conversation(Some(&self.conversation_id), "Personality reset to defaults");
        Ok(format!(
            "✨ Personalidade restaurada! Voltei a ser a {}.",
            self.personality.name
        ))
    }

    pub fn history(&self) -> Result<Vec<Message>, StoreError> {
        self.store.full_history(&self.conversation_id)
    }

    /// Machine status report through the same path as a typed command.
    pub fn status_report(&mut self) -> TurnReply {
        let result = self.router.route("status do sistema", &self.personality);
        TurnReply {
            text: result.text,
            kind: TurnKind::Command {
                success: result.success,
            },
        }
    }

    /// Productivity tips from the current machine load and hour.
    pub fn tips(&self) -> Vec<String> {
        match self.router.os().system_status() {
            Ok(status) => insights::productivity_suggestions(&status, Local::now().hour()),
            Err(e) => {
                logging::log_error(Some(&self.conversation_id), &format!("tips probe failed: {}", e));
                vec!["Não consegui analisar o sistema agora.".to_string()]
            }
        }
    }

    /// Runs a named macro; the result is stored as a reply.
    pub fn run_macro(&mut self, name: &str) -> Result<TurnReply, StoreError> {
        let result = self.router.run_macro(name, &self.personality);
        self.store
            .append_message(&self.conversation_id, Sender::Ai, &result.text)?;
        Ok(TurnReply {
            text: result.text,
            kind: TurnKind::Command {
                success: result.success,
            },
        })
    }

    pub fn export_conversation(&self, path: &Path) -> Result<usize, StoreError> {
        let history = self.history()?;
        let text = render_transcript(&self.personality.name, &history);
        std::fs::write(path, text)?;
        logging::log_conversation(
            Some(&self.conversation_id),
            &format!("Exported {} messages to {}", history.len(), path.display()),
        );
        Ok(history.len())
    }
}

fn display_timestamp(raw: &str) -> String {
    DateTime::parse_from_rfc3339(raw)
        .map(|t| t.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string())
        .unwrap_or_else(|_| raw.to_string())
}

/// Plain-text transcript: header line, then one line per message.
pub fn render_transcript(name: &str, history: &[Message]) -> String {
    let mut out = format!("=== Conversa com {} ===\n\n", name);
    for m in history {
        let who = match m.sender {
            Sender::User => "Você",
            Sender::Ai => name,
            Sender::System => "Sistema",
        };
        let _ = writeln!(out, "[{}] {}: {}", display_timestamp(&m.timestamp), who, m.text);
    }
    out
}
