use crate::personality::{PersonalityProfile, Trait};
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};

/// Emoji that already count as an affectionate touch.
pub const AFFECTION_MARKERS: &[&str] = &["💕", "😊", "✨", "🔊", "🔉", "🔇", "📸", "🎥", "🔍"];

const AFFECTION_SUFFIXES: &[&str] = &[" 💕", " 😊", " ✨"];
const PLAYFUL_SUFFIXES: &[&str] = &[
    " Fácil demais! 😎",
    " Tá aí, mágica! ✨",
    " Pronto, como você pediu! 😄",
    " Mission accomplished! 🎯",
];
const SHY_PREFIXES: &[&str] = &["Desculpa, ", "Ops, ", "Ah não, "];
const FUNNY_PREFIXES: &[&str] = &["Eita, deu ruim! ", "Opa, bugou aqui! ", "Xiii, não rolou! "];

const PLAYFUL_CHANCE: f64 = 0.3;

/// Adjusts command result text to the companion's personality.
pub struct Personalizer {
    rng: StdRng,
}

impl Personalizer {
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };
        Self { rng }
    }

    fn pick(&mut self, options: &'static [&'static str]) -> &'static str {
        options.choose(&mut self.rng).copied().unwrap_or("")
    }

    pub fn personalize(&mut self, raw: &str, personality: &PersonalityProfile, success: bool) -> String {
        if !success {
            if personality.has(Trait::Timida) {
                return format!("{}{}", self.pick(SHY_PREFIXES), raw.to_lowercase());
            }
            if personality.has(Trait::Engracada) {
                return format!("{}{}", self.pick(FUNNY_PREFIXES), raw);
            }
            return raw.to_string();
        }

        let mut text = raw.to_string();
        if personality.has(Trait::Carinhosa) && !AFFECTION_MARKERS.iter().any(|m| text.contains(m)) {
            text.push_str(self.pick(AFFECTION_SUFFIXES));
        }
        if personality.has(Trait::Brincalhona) && self.rng.random_bool(PLAYFUL_CHANCE) {
            text.push_str(self.pick(PLAYFUL_SUFFIXES));
        }
        text
    }
}
