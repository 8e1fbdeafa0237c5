use crate::store::Message;
use serde::{Deserialize, Serialize};

pub const DEFAULT_MOOD_WINDOW: usize = 5;

const POSITIVE_WORDS: &[&str] = &["bom", "legal", "ótimo", "feliz", "alegre", "amor", "gosto", "adorei", "incrível"];
const NEGATIVE_WORDS: &[&str] = &["ruim", "triste", "chato", "difícil", "problema", "cansado", "estresse"];
const INTIMATE_WORDS: &[&str] = &["saudade", "carinho", "amor", "beijo", "abraço", "coração"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MoodLabel {
    Intimate,
    Positive,
    Negative,
    Neutral,
}

impl MoodLabel {
    /// Tone phrase used in the prompt.
    pub fn describe(&self) -> &'static str {
        match self {
            MoodLabel::Intimate => "íntimo e carinhoso",
            MoodLabel::Positive => "positivo e animado",
            MoodLabel::Negative => "compreensivo e acolhedor",
            MoodLabel::Neutral => "equilibrado e natural",
        }
    }
}

fn hits(text: &str, words: &[&str]) -> usize {
    words.iter().filter(|w| text.contains(*w)).count()
}

/// Keyword-count mood of the last `window` messages.
///
/// Each list counts at most one hit per word per message (substring match),
/// so only the multiset of matches matters, not message order.
pub fn analyze(history: &[Message], window: usize) -> MoodLabel {
    let start = history.len().saturating_sub(window);

    let (mut positive, mut negative, mut intimate) = (0, 0, 0);
    for msg in &history[start..] {
        let text = msg.text.to_lowercase();
        positive += hits(&text, POSITIVE_WORDS);
        negative += hits(&text, NEGATIVE_WORDS);
        intimate += hits(&text, INTIMATE_WORDS);
    }

    if intimate > 0 {
        MoodLabel::Intimate
    } else if positive > negative {
        MoodLabel::Positive
    } else if negative > positive {
        MoodLabel::Negative
    } else {
        MoodLabel::Neutral
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::store::Sender;

    pub(crate) fn msg(sender: Sender, text: &str) -> Message {
        Message {
            id: uuid::Uuid::new_v4().to_string(),
            conversation_id: "c".to_string(),
            sender,
            text: text.to_string(),
            timestamp: String::new(),
        }
    }

    fn user(texts: &[&str]) -> Vec<Message> {
        texts.iter().map(|t| msg(Sender::User, t)).collect()
    }

    #[test]
    fn test_empty_history_is_neutral() {
        assert_eq!(analyze(&[], DEFAULT_MOOD_WINDOW), MoodLabel::Neutral);
    }

    #[test]
    fn test_intimate_wins_over_counts() {
        let history = user(&["dia ruim", "muito triste", "que saudade"]);
        assert_eq!(analyze(&history, DEFAULT_MOOD_WINDOW), MoodLabel::Intimate);
    }

    #[test]
    fn test_positive_vs_negative() {
        assert_eq!(analyze(&user(&["Que dia LEGAL, tô feliz"]), 5), MoodLabel::Positive);
        assert_eq!(analyze(&user(&["tô cansado", "dia difícil"]), 5), MoodLabel::Negative);
        assert_eq!(analyze(&user(&["legal", "chato"]), 5), MoodLabel::Neutral);
    }

    #[test]
    fn test_only_window_is_scanned() {
        let mut history = user(&["que saudade"]);
        history.extend(user(&["ok", "ok", "ok", "ok", "ok"]));
        assert_eq!(analyze(&history, 5), MoodLabel::Neutral);
        assert_eq!(analyze(&history, 6), MoodLabel::Intimate);
    }

    #[test]
    fn test_order_within_window_does_not_matter() {
        let a = user(&["bom", "ruim", "legal"]);
        let b = user(&["legal", "bom", "ruim"]);
        assert_eq!(analyze(&a, 5), analyze(&b, 5));
    }
}
