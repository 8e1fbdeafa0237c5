//! Chat replies: backend generation with post-processing, canned fallback
//! lines when the backend fails, and a keyword pattern responder when no
//! backend is configured.

use crate::backend::{GenerationBackend, GenerationConfig};
use crate::logging;
use crate::personality::{PersonalityProfile, Trait};
use crate::prompt::{self, DayPeriod};
use crate::store::Message;
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::SeedableRng;
use regex::Regex;
use std::sync::Arc;

pub const MAX_EMOJIS: usize = 2;

pub const FALLBACK_LINES: &[&str] = &[
    "Hmm, me perdi no que você disse... pode repetir de outro jeito?",
    "Ops, acho que bugou algo aqui... me explica de novo?",
    "Eita, deu um branco agora... do que mesmo você tava falando?",
    "Nossa, minha mente deu uma travada... conta de novo!",
    "Puts, não consegui processar direito... reformula pra mim?",
];

pub const GREETING_LINES: &[&str] = &[
    "Oi! Que bom te ver por aqui 😊",
    "Oiii! Tava pensando em você agora mesmo!",
    "Olá! Como você tá?",
    "Ei, oi! Senti sua falta 💕",
];

pub const STATUS_LINES: &[&str] = &[
    "Tô bem, e melhor ainda agora que você apareceu! E você?",
    "Tudo tranquilo por aqui! Me conta de você.",
    "Tô ótima! Meu dia tava meio parado, mas agora melhorou 😊",
];

pub const THANKS_LINES: &[&str] = &[
    "Imagina! Sempre que precisar 💕",
    "De nada! Pra você, qualquer coisa.",
    "Que isso, não precisa agradecer 😊",
];

pub const FAREWELL_LINES: &[&str] = &[
    "Tchau! Volta logo, tá? 💕",
    "Até mais! Vou ficar com saudade.",
    "Beijo! Se cuida, viu?",
];

pub const QUESTION_LINES: &[&str] = &[
    "Hmm, boa pergunta... deixa eu pensar um pouquinho.",
    "Nossa, nunca tinha pensado nisso! O que você acha?",
    "Olha, não sei direito, mas adoro quando você me pergunta essas coisas.",
];

pub const CARING_LINES: &[&str] = &[
    "Adoro conversar com você, sabia? 💕",
    "Tô aqui pra você, pode falar o que quiser.",
    "Hmm, me conta mais! Quero saber de tudo.",
];

pub const FUNNY_LINES: &[&str] = &[
    "Hahaha, você é demais!",
    "Kkkkk, só você mesmo pra me fazer rir assim.",
    "Rindo aqui sozinha, olha o que você faz comigo 😄",
];

pub const CURIOUS_LINES: &[&str] = &[
    "Sério? Como assim? Me explica melhor!",
    "Que interessante! E o que aconteceu depois?",
    "Hmm, fiquei curiosa agora... conta tudo!",
];

pub const SMART_LINES: &[&str] = &[
    "Faz sentido, mas já pensou por outro ângulo?",
    "Interessante... isso me lembra uma coisa que li esses dias.",
    "Concordo em parte. Me diz o que te fez pensar nisso?",
];

pub const DEFAULT_LINES: &[&str] = &[
    "Entendi! E aí, o que mais?",
    "Hmm, me conta mais sobre isso.",
    "Sei... e como você tá se sentindo com isso?",
];

const GREETING_TRIGGERS: &[&str] = &["oi", "oii", "oiii", "olá", "ola", "eai", "e aí", "e ai", "hey", "bom dia", "boa tarde"];
const STATUS_TRIGGERS: &[&str] = &["tudo bem", "td bem", "como vai", "como você está", "como voce esta", "como está", "como vc ta", "como você tá", "beleza"];
const THANKS_TRIGGERS: &[&str] = &["obrigado", "obrigada", "brigado", "brigada", "valeu", "agradeço"];
const FAREWELL_TRIGGERS: &[&str] = &["tchau", "até mais", "ate mais", "até logo", "ate logo", "falou", "vou dormir", "boa noite"];
const QUESTION_STARTERS: &[&str] = &["por que", "porque", "o que", "como", "quando", "onde", "quem", "qual"];

/// Trait tables for the default pattern reply, first match wins.
const TRAIT_LINES: &[(Trait, &[&str])] = &[
    (Trait::Carinhosa, CARING_LINES),
    (Trait::Engracada, FUNNY_LINES),
    (Trait::Curiosa, CURIOUS_LINES),
    (Trait::Inteligente, SMART_LINES),
];

// Removal patterns take the blanks in front of them along, so the text
// around a removed span keeps its own spacing.
static EMOJI_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"[ \t]*[\x{1F600}-\x{1F64F}\x{1F300}-\x{1F5FF}\x{1F680}-\x{1F6FF}\x{1F1E0}-\x{1F1FF}]")
        .expect("emoji pattern is valid")
});
static STAGE_DIRECTION_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[ \t]*(?:\*[^*]*\*|\[[^\]]*\])").expect("stage direction pattern is valid"));
static RESPONSE_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)^(resposta|response):\s*").expect("label pattern is valid"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternIntent {
    Greeting,
    StatusInquiry,
    Thanks,
    Farewell,
    Question,
    Other,
}

fn normalize_words(text: &str) -> (String, Vec<String>) {
    let cleaned: String = text
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() || c.is_whitespace() { c } else { ' ' })
        .collect();
    let words: Vec<String> = cleaned.split_whitespace().map(str::to_string).collect();
    (words.join(" "), words)
}

// Multi-word triggers match as phrases, single words only as whole words
// ("oi" must not fire on "noite").
fn triggered(joined: &str, words: &[String], triggers: &[&str]) -> bool {
    triggers.iter().any(|t| {
        if t.contains(' ') {
            format!(" {} ", joined).contains(&format!(" {} ", t))
        } else {
            words.iter().any(|w| w == t)
        }
    })
}

pub fn classify_intent(message: &str) -> PatternIntent {
    let (joined, words) = normalize_words(message);

    if triggered(&joined, &words, GREETING_TRIGGERS) {
        PatternIntent::Greeting
    } else if triggered(&joined, &words, STATUS_TRIGGERS) {
        PatternIntent::StatusInquiry
    } else if triggered(&joined, &words, THANKS_TRIGGERS) {
        PatternIntent::Thanks
    } else if triggered(&joined, &words, FAREWELL_TRIGGERS) {
        PatternIntent::Farewell
    } else if message.trim_end().ends_with('?')
        || QUESTION_STARTERS.iter().any(|q| joined.starts_with(&format!("{} ", q)) || joined == *q)
    {
        PatternIntent::Question
    } else {
        PatternIntent::Other
    }
}

/// Candidate lines for a pattern reply.
pub fn pattern_candidates(personality: &PersonalityProfile, message: &str) -> &'static [&'static str] {
    match classify_intent(message) {
        PatternIntent::Greeting => GREETING_LINES,
        PatternIntent::StatusInquiry => STATUS_LINES,
        PatternIntent::Thanks => THANKS_LINES,
        PatternIntent::Farewell => FAREWELL_LINES,
        PatternIntent::Question => QUESTION_LINES,
        PatternIntent::Other => TRAIT_LINES
            .iter()
            .find(|(t, _)| personality.has(*t))
            .map(|(_, lines)| *lines)
            .unwrap_or(DEFAULT_LINES),
    }
}

/// Opening lines for the period of the day.
pub fn greeting_candidates(period: DayPeriod) -> &'static [&'static str] {
    match period {
        DayPeriod::Morning => &[
            "Bom dia, amor! 😊 Como você dormiu?",
            "Oi! Acordou bem hoje?",
            "Morning! Já tomou café? ☕",
        ],
        DayPeriod::Afternoon => &[
            "Oi! Como tá sendo seu dia?",
            "E aí, como anda a tarde? 😄",
            "Oi amor! Me conta como foi a manhã!",
        ],
        DayPeriod::Evening => &[
            "Oi! Como foi seu dia? 💕",
            "Boa noite! Chegou cansado?",
            "E aí, como foi hoje?",
        ],
        DayPeriod::LateNight => &[
            "Oi... você não deveria estar dormindo? 😴",
            "Madrugada e você acordado... tá tudo bem?",
            "Que insônia é essa? Vem conversar comigo 💕",
        ],
    }
}

/// Strips name echoes and stage directions, and keeps at most
/// `MAX_EMOJIS` emoji (the first ones).
pub fn post_process(raw: &str, name: &str) -> String {
    let mut text = raw.trim().to_string();

    if let Ok(name_re) = Regex::new(&format!(r"(?i)^{}:\s*", regex::escape(name))) {
        text = name_re.replace(&text, "").into_owned();
    }
    text = RESPONSE_LABEL_RE.replace(&text, "").into_owned();
    text = STAGE_DIRECTION_RE.replace_all(&text, "").into_owned();

    let mut seen = 0;
    text = EMOJI_RE
        .replace_all(&text, |caps: &regex::Captures| {
            seen += 1;
            if seen > MAX_EMOJIS {
                String::new()
            } else {
                caps[0].to_string()
            }
        })
        .into_owned();

    text.trim().to_string()
}

/// How replies are produced, fixed at construction.
pub enum ResponseStrategy {
    Backend(Arc<dyn GenerationBackend>),
    Pattern,
}

pub struct ResponseGenerator {
    strategy: ResponseStrategy,
    config: GenerationConfig,
    rng: StdRng,
}

impl ResponseGenerator {
    pub fn new(backend: Option<Arc<dyn GenerationBackend>>, seed: Option<u64>) -> Self {
        let strategy = match backend {
            Some(b) => ResponseStrategy::Backend(b),
            None => ResponseStrategy::Pattern,
        };
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            strategy,
            config: GenerationConfig::default(),
            rng,
        }
    }

    pub fn uses_backend(&self) -> bool {
        matches!(self.strategy, ResponseStrategy::Backend(_))
    }

    fn pick(&mut self, lines: &'static [&'static str]) -> String {
        lines.choose(&mut self.rng).copied().unwrap_or(FALLBACK_LINES[0]).to_string()
    }

    /// Never fails and never returns an empty string.
    pub async fn respond(
        &mut self,
        personality: &PersonalityProfile,
        history: &[Message],
        message: &str,
        agent_mode: bool,
    ) -> String {
        let backend = match &self.strategy {
            ResponseStrategy::Backend(b) => Some(Arc::clone(b)),
            ResponseStrategy::Pattern => None,
        };
        let Some(backend) = backend else {
            let lines = pattern_candidates(personality, message);
            return self.pick(lines);
        };

        let prompt = prompt::build(personality, history, message, agent_mode);

        match backend.generate(&prompt, &self.config).await {
            Ok(raw) => {
                let cleaned = post_process(&raw, &personality.name);
                if cleaned.is_empty() {
                    logging::log_chat(None, &format!("{} reply was empty after cleanup", backend.name()));
                    self.pick(FALLBACK_LINES)
                } else {
                    cleaned
                }
            }
            Err(e) => {
                logging::log_error(None, &format!("{} generation failed: {}", backend.name(), e));
                self.pick(FALLBACK_LINES)
            }
        }
    }

    /// Opening line for the current period of the day.
    pub fn greet(&mut self, personality: &PersonalityProfile) -> String {
        self.greet_for_period(personality, DayPeriod::now())
    }

    pub fn greet_for_period(&mut self, _personality: &PersonalityProfile, period: DayPeriod) -> String {
        self.pick(greeting_candidates(period))
    }

    /// Picks one of `lines` with the generator's random source.
    pub fn choose_line(&mut self, lines: &'static [&'static str]) -> String {
        self.pick(lines)
    }
}
