use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::str::FromStr;

/// Fixed trait vocabulary offered by the profile editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trait {
    Carinhosa,
    Timida,
    Engracada,
    Inteligente,
    Curiosa,
    Brincalhona,
    Teimosa,
    Romantica,
}

impl Trait {
    pub const ALL: [Trait; 8] = [
        Trait::Carinhosa,
        Trait::Timida,
        Trait::Engracada,
        Trait::Inteligente,
        Trait::Curiosa,
        Trait::Brincalhona,
        Trait::Teimosa,
        Trait::Romantica,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Trait::Carinhosa => "carinhosa",
            Trait::Timida => "timida",
            Trait::Engracada => "engracada",
            Trait::Inteligente => "inteligente",
            Trait::Curiosa => "curiosa",
            Trait::Brincalhona => "brincalhona",
            Trait::Teimosa => "teimosa",
            Trait::Romantica => "romantica",
        }
    }
}

/// Accepts accented spellings too ("tímida", "engraçada", "romântica").
impl FromStr for Trait {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let folded: String = s
            .trim()
            .to_lowercase()
            .chars()
            .map(|c| match c {
                'á' | 'â' | 'ã' | 'à' => 'a',
                'é' | 'ê' => 'e',
                'í' => 'i',
                'ó' | 'ô' | 'õ' => 'o',
                'ú' => 'u',
                'ç' => 'c',
                other => other,
            })
            .collect();
        Trait::ALL
            .into_iter()
            .find(|t| t.as_str() == folded)
            .ok_or_else(|| format!("unknown trait: {}", s.trim()))
    }
}

/// The profile that drives tone for generated and templated replies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PersonalityProfile {
    pub name: String,
    pub age: u32,
    pub traits: BTreeSet<Trait>,
    pub hobbies: String,
    pub foods: String,
    pub fears: String,
    pub dreams: String,
}

impl Default for PersonalityProfile {
    fn default() -> Self {
        Self {
            name: "Caroline".to_string(),
            age: 20,
            traits: [Trait::Carinhosa, Trait::Engracada, Trait::Inteligente, Trait::Curiosa]
                .into_iter()
                .collect(),
            hobbies: "ler livros de romance, assistir séries, jogar Valorant, ouvir música indie"
                .to_string(),
            foods: "chocolate, pizza, sorvete de morango".to_string(),
            fears: "filmes de terror, aranhas".to_string(),
            dreams: "viajar pelo mundo, ter um café próprio, escrever um livro".to_string(),
        }
    }
}

impl PersonalityProfile {
    pub fn has(&self, t: Trait) -> bool {
        self.traits.contains(&t)
    }

    pub fn traits_text(&self) -> String {
        self.traits
            .iter()
            .map(|t| t.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Checked at the store boundary before a save.
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("name must not be blank".to_string());
        }
        if self.age == 0 {
            return Err("age must be positive".to_string());
        }
        Ok(())
    }
}
