use crate::error::StoreError;
use crate::logging;
use crate::personality::{PersonalityProfile, Trait};
use crate::store::{day_label, ConversationInfo, ConversationStats, ConversationStore, Message, Sender};
use chrono::{NaiveDate, SecondsFormat, Utc};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// SQLite-backed store. One connection, serialized behind a mutex.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

// Fixed-width so lexical order matches chronological order.
fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn conversion_error(idx: usize, message: String) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, message.into())
}

fn message_from_row(row: &Row) -> rusqlite::Result<Message> {
    let sender: String = row.get(2)?;
    Ok(Message {
        id: row.get(0)?,
        conversation_id: row.get(1)?,
        sender: sender.parse::<Sender>().map_err(|e| conversion_error(2, e))?,
        text: row.get(3)?,
        timestamp: row.get(4)?,
    })
}

fn parse_traits(raw: Option<String>) -> Result<Vec<Trait>, StoreError> {
    let Some(raw) = raw else {
        return Ok(Vec::new());
    };
    let names: Vec<String> = serde_json::from_str(&raw)?;
    let mut traits = Vec::with_capacity(names.len());
    for name in names {
        match name.parse::<Trait>() {
            Ok(t) => traits.push(t),
            Err(_) => logging::log_error(None, &format!("Dropping unknown trait '{}' from stored profile", name)),
        }
    }
    Ok(traits)
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Self::init(Connection::open(path)?)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch(
            "
            PRAGMA foreign_keys = ON;

            -- Personality profiles (the latest-updated row is the current one)
            CREATE TABLE IF NOT EXISTS personalities (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                age INTEGER NOT NULL,
                traits TEXT,
                hobbies TEXT NOT NULL DEFAULT '',
                foods TEXT NOT NULL DEFAULT '',
                fears TEXT NOT NULL DEFAULT '',
                dreams TEXT NOT NULL DEFAULT '',
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            -- One conversation per calendar day
            CREATE TABLE IF NOT EXISTS conversations (
                id TEXT PRIMARY KEY,
                day TEXT NOT NULL UNIQUE,
                created_at TEXT NOT NULL
            );

            CREATE TABLE IF NOT EXISTS messages (
                id TEXT PRIMARY KEY,
                conversation_id TEXT NOT NULL,
                sender TEXT NOT NULL,
                text TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                FOREIGN KEY (conversation_id) REFERENCES conversations(id)
            );

            CREATE INDEX IF NOT EXISTS idx_messages_conversation
                ON messages(conversation_id, timestamp);
            ",
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn with_connection<F, T>(&self, f: F) -> Result<T, StoreError>
    where
        F: FnOnce(&Connection) -> Result<T, StoreError>,
    {
        let conn = self.lock();
        f(&conn)
    }

    fn insert_personality(conn: &Connection, profile: &PersonalityProfile) -> Result<(), StoreError> {
        let traits: Vec<&str> = profile.traits.iter().map(|t| t.as_str()).collect();
        let now = now_timestamp();
        conn.execute(
            "INSERT INTO personalities (name, age, traits, hobbies, foods, fears, dreams, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                profile.name,
                profile.age,
                serde_json::to_string(&traits)?,
                profile.hobbies,
                profile.foods,
                profile.fears,
                profile.dreams,
                now,
                now
            ],
        )?;
        Ok(())
    }
}

type PersonalityRow = (String, u32, Option<String>, String, String, String, String);

impl ConversationStore for SqliteStore {
    fn get_current_personality(&self) -> Result<PersonalityProfile, StoreError> {
        self.with_connection(|conn| {
            let row: Option<PersonalityRow> = conn
                .query_row(
                    "SELECT name, age, traits, hobbies, foods, fears, dreams
                     FROM personalities
                     ORDER BY updated_at DESC, id DESC LIMIT 1",
                    [],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                        ))
                    },
                )
                .optional()?;

            let Some((name, age, traits, hobbies, foods, fears, dreams)) = row else {
                let profile = PersonalityProfile::default();
                Self::insert_personality(conn, &profile)?;
                logging::log_conversation(None, &format!("Created default personality '{}'", profile.name));
                return Ok(profile);
            };

            let profile = PersonalityProfile {
                name,
                age,
                traits: parse_traits(traits)?.into_iter().collect(),
                hobbies,
                foods,
                fears,
                dreams,
            };
            profile.validate().map_err(StoreError::InvalidProfile)?;
            Ok(profile)
        })
    }

    fn save_personality(&self, profile: &PersonalityProfile) -> Result<(), StoreError> {
        profile.validate().map_err(StoreError::InvalidProfile)?;
        let traits: Vec<&str> = profile.traits.iter().map(|t| t.as_str()).collect();
        let traits_json = serde_json::to_string(&traits)?;

        self.with_connection(|conn| {
            let existing: Option<i64> = conn
                .query_row(
                    "SELECT id FROM personalities ORDER BY updated_at DESC, id DESC LIMIT 1",
                    [],
                    |row| row.get(0),
                )
                .optional()?;

            match existing {
                Some(id) => {
                    conn.execute(
                        "UPDATE personalities
                         SET name = ?1, age = ?2, traits = ?3, hobbies = ?4, foods = ?5, fears = ?6, dreams = ?7, updated_at = ?8
                         WHERE id = ?9",
                        params![
                            profile.name,
                            profile.age,
                            traits_json,
                            profile.hobbies,
                            profile.foods,
                            profile.fears,
                            profile.dreams,
                            now_timestamp(),
                            id
                        ],
                    )?;
                }
                None => Self::insert_personality(conn, profile)?,
            }
            Ok(())
        })
    }

    fn get_or_create_conversation_for(&self, day: NaiveDate) -> Result<String, StoreError> {
        let day_str = day.format(DAY_FORMAT).to_string();
        self.with_connection(|conn| {
            let existing: Option<String> = conn
                .query_row(
                    "SELECT id FROM conversations WHERE day = ?1",
                    params![day_str],
                    |row| row.get(0),
                )
                .optional()?;

            if let Some(id) = existing {
                return Ok(id);
            }

            let id = uuid::Uuid::new_v4().to_string();
            conn.execute(
                "INSERT INTO conversations (id, day, created_at) VALUES (?1, ?2, ?3)",
                params![id, day_str, now_timestamp()],
            )?;
            logging::log_conversation(Some(&id), &format!("Started conversation for {}", day_str));
            Ok(id)
        })
    }

    fn append_message(
        &self,
        conversation_id: &str,
        sender: Sender,
        text: &str,
    ) -> Result<Message, StoreError> {
        let message = Message {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: conversation_id.to_string(),
            sender,
            text: text.to_string(),
            timestamp: now_timestamp(),
        };

        self.with_connection(|conn| {
            conn.execute(
                "INSERT INTO messages (id, conversation_id, sender, text, timestamp)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    message.id,
                    message.conversation_id,
                    message.sender.as_str(),
                    message.text,
                    message.timestamp
                ],
            )?;
            Ok(())
        })?;

        Ok(message)
    }

    fn recent_messages(&self, conversation_id: &str, limit: usize) -> Result<Vec<Message>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, sender, text, timestamp
                 FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY timestamp DESC, rowid DESC
                 LIMIT ?2",
            )?;

            let messages = stmt.query_map(params![conversation_id, limit as i64], message_from_row)?;

            let mut result: Vec<Message> = messages.collect::<rusqlite::Result<Vec<_>>>()?;
            result.reverse();
            Ok(result)
        })
    }

    fn full_history(&self, conversation_id: &str) -> Result<Vec<Message>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, conversation_id, sender, text, timestamp
                 FROM messages
                 WHERE conversation_id = ?1
                 ORDER BY timestamp ASC, rowid ASC",
            )?;

            let messages = stmt.query_map([conversation_id], message_from_row)?;
            Ok(messages.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    fn list_conversations(&self, today: NaiveDate) -> Result<Vec<ConversationInfo>, StoreError> {
        self.with_connection(|conn| {
            let mut stmt = conn.prepare(
                "SELECT c.id, c.day, c.created_at,
                        (SELECT text FROM messages m
                         WHERE m.conversation_id = c.id
                         ORDER BY m.timestamp DESC, m.rowid DESC LIMIT 1)
                 FROM conversations c
                 ORDER BY c.day DESC",
            )?;

            let rows = stmt.query_map([], |row| {
                let day_str: String = row.get(1)?;
                let day = NaiveDate::parse_from_str(&day_str, DAY_FORMAT)
                    .map_err(|e| conversion_error(1, e.to_string()))?;
                let last: Option<String> = row.get(3)?;
                Ok(ConversationInfo {
                    id: row.get(0)?,
                    day,
                    day_label: day_label(day, today),
                    last_message: last.unwrap_or_else(|| "Conversa iniciada".to_string()),
                    created_at: row.get(2)?,
                })
            })?;

            Ok(rows.collect::<rusqlite::Result<Vec<_>>>()?)
        })
    }

    fn delete_conversation(&self, conversation_id: &str) -> Result<(), StoreError> {
        self.with_connection(|conn| {
            // Messages first (foreign key)
            conn.execute("DELETE FROM messages WHERE conversation_id = ?1", params![conversation_id])?;
            conn.execute("DELETE FROM conversations WHERE id = ?1", params![conversation_id])?;
            Ok(())
        })?;
        logging::log_conversation(Some(conversation_id), "Conversation deleted");
        Ok(())
    }

    fn stats(&self) -> Result<ConversationStats, StoreError> {
        self.with_connection(|conn| {
            let count = |sql: &str| -> rusqlite::Result<i64> { conn.query_row(sql, [], |row| row.get(0)) };
            Ok(ConversationStats {
                total_conversations: count("SELECT COUNT(*) FROM conversations")?,
                total_messages: count("SELECT COUNT(*) FROM messages")?,
                user_messages: count("SELECT COUNT(*) FROM messages WHERE sender = 'user'")?,
                ai_messages: count("SELECT COUNT(*) FROM messages WHERE sender = 'ai'")?,
            })
        })
    }
}
