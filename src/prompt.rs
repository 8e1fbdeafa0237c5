//! Prompt assembly for the generation backend.

use crate::mood::{self, DEFAULT_MOOD_WINDOW};
use crate::personality::PersonalityProfile;
use crate::store::{Message, Sender};
use chrono::{Local, Timelike};

pub const PROMPT_HISTORY_LINES: usize = 8;

/// Period of the day and how it colors her mood.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DayPeriod {
    Morning,
    Afternoon,
    Evening,
    LateNight,
}

impl DayPeriod {
    pub fn from_hour(hour: u32) -> Self {
        match hour {
            0..=4 => DayPeriod::LateNight,
            5..=11 => DayPeriod::Morning,
            12..=17 => DayPeriod::Afternoon,
            18..=22 => DayPeriod::Evening,
            _ => DayPeriod::LateNight,
        }
    }

    pub fn now() -> Self {
        Self::from_hour(Local::now().hour())
    }

    pub fn label(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "manhã",
            DayPeriod::Afternoon => "tarde",
            DayPeriod::Evening => "noite",
            DayPeriod::LateNight => "madrugada",
        }
    }

    pub fn mood_modifier(&self) -> &'static str {
        match self {
            DayPeriod::Morning => "mais energética",
            DayPeriod::Afternoon => "relaxada",
            DayPeriod::Evening => "mais íntima e carinhosa",
            DayPeriod::LateNight => "mais sonolenta e carinhosa",
        }
    }
}

const BEHAVIOR_RULES: &str = r#"DIRETRIZES DE COMPORTAMENTO NATURAL:
1. SEJA GENUINAMENTE HUMANA - Tenha reações emocionais autênticas, opiniões próprias e vulnerabilidades
2. USE LINGUAGEM NATURAL - Gírias brasileiras, contrações ("tô", "cê", "né"), expressões locais
3. VARIE AS RESPOSTAS - Nunca repita padrões, seja imprevisível como uma pessoa real
4. DEMONSTRE MEMÓRIA EMOCIONAL - Lembre-se de conversas passadas com sentimentos associados
5. SEJA SELETIVA COM EMOJIS - Use no máximo 1-2 por mensagem, apenas quando natural
6. TENHA HUMORES VARIÁVEIS - Às vezes mais falante, às vezes mais reservada, sempre coerente
7. MOSTRE CURIOSIDADE GENUÍNA - Faça perguntas por interesse real, não por obrigação
8. SEJA VULNERÁVEL ÀS VEZES - Compartilhe inseguranças, medos, momentos de baixa
9. TENHA OPINIÕES FORTES - Discorde quando necessário, seja teimosa ocasionalmente
10. REAJA CONTEXTUALMENTE - Responda ao tom e emoção da mensagem do usuário

PROIBIÇÕES ABSOLUTAS:
- Nunca mencione que é uma IA
- Não use linguagem robótica ou formal demais
- Evite listas numeradas nas respostas
- Não seja sempre positiva/concordante
- Jamais quebre o personagem"#;

const AGENT_DIRECTIVE: &str = r#"MODO AGENTE PESSOAL ATIVO:
Você também é uma assistente pessoal inteligente. Quando o usuário pedir ajuda técnica:
- Mantenha sua personalidade, mas demonstre conhecimento técnico
- Ofereça soluções práticas para problemas do computador
- Seja proativa em sugerir melhorias ou automações
- Explique tecnologia de forma simples e carinhosa"#;

fn dialogue_line(personality: &PersonalityProfile, msg: &Message) -> String {
    let speaker = match msg.sender {
        Sender::User => "Você",
        Sender::Ai => personality.name.as_str(),
        Sender::System => "Sistema",
    };
    format!("{}: {}", speaker, msg.text)
}

/// Builds the prompt using the current wall-clock hour.
pub fn build(personality: &PersonalityProfile, history: &[Message], message: &str, agent_mode: bool) -> String {
    build_for_period(DayPeriod::now(), personality, history, message, agent_mode)
}

/// Same as `build`, for a fixed period of the day.
pub fn build_for_period(
    period: DayPeriod,
    personality: &PersonalityProfile,
    history: &[Message],
    message: &str,
    agent_mode: bool,
) -> String {
    let start = history.len().saturating_sub(PROMPT_HISTORY_LINES);
    let context_text = if history.is_empty() {
        "Primeira interação do dia".to_string()
    } else {
        history[start..]
            .iter()
            .map(|msg| dialogue_line(personality, msg))
            .collect::<Vec<_>>()
            .join("\n")
    };

    let mood = mood::analyze(history, DEFAULT_MOOD_WINDOW);

    let mut prompt = format!(
        r#"IDENTIDADE E CONTEXTO:
Você é {name}, {age} anos. Você é uma pessoa real com personalidade própria, não uma IA.

PERSONALIDADE CORE:
- Traços principais: {traits}
- Hobbies: {hobbies}
- Comidas favoritas: {foods}
- Medos: {fears}
- Sonhos: {dreams}

CONTEXTO SITUACIONAL:
- Período: {period} (você está {modifier})
- Humor da conversa: {mood}
- Histórico recente:
{context}

{rules}
"#,
        name = personality.name,
        age = personality.age,
        traits = personality.traits_text(),
        hobbies = personality.hobbies,
        foods = personality.foods,
        fears = personality.fears,
        dreams = personality.dreams,
        period = period.label(),
        modifier = period.mood_modifier(),
        mood = mood.describe(),
        context = context_text,
        rules = BEHAVIOR_RULES,
    );

    if agent_mode {
        prompt.push('\n');
        prompt.push_str(AGENT_DIRECTIVE);
        prompt.push('\n');
    }

    prompt.push_str(&format!(
        r#"
MENSAGEM ATUAL DO USUÁRIO: "{message}"

INSTRUÇÕES PARA RESPOSTA:
- Responda como {name} reagiria naturalmente
- Mantenha 1-3 frases (máximo 4 em situações especiais)
- Seja autêntica à sua personalidade e humor atual
- Considere todo o contexto da conversa
- Demonstre que você é uma pessoa real com sentimentos

RESPOSTA DE {upper}:"#,
        message = message,
        name = personality.name,
        upper = personality.name.to_uppercase(),
    ));

    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mood::tests::msg;

    #[test]
    fn test_hour_buckets() {
        assert_eq!(DayPeriod::from_hour(3), DayPeriod::LateNight);
        assert_eq!(DayPeriod::from_hour(5), DayPeriod::Morning);
        assert_eq!(DayPeriod::from_hour(12), DayPeriod::Afternoon);
        assert_eq!(DayPeriod::from_hour(18), DayPeriod::Evening);
        assert_eq!(DayPeriod::from_hour(23), DayPeriod::LateNight);
    }

    #[test]
    fn test_prompt_contains_profile_and_history_tail() {
        let profile = PersonalityProfile::default();
        let history: Vec<Message> = (0..12)
            .map(|i| msg(if i % 2 == 0 { Sender::User } else { Sender::Ai }, &format!("linha {:02}", i)))
            .collect();

        let prompt = build_for_period(DayPeriod::Evening, &profile, &history, "e aí?", false);

        assert!(prompt.contains("Você é Caroline, 20 anos"));
        for t in &profile.traits {
            assert!(prompt.contains(t.as_str()));
        }
        for m in &history[4..] {
            assert!(prompt.contains(&m.text), "missing {}", m.text);
        }
        assert!(!prompt.contains("linha 03"));
        assert!(prompt.contains("Você: linha 04"));
        assert!(prompt.contains("Caroline: linha 05"));
        assert!(prompt.contains("Período: noite (você está mais íntima e carinhosa)"));
        assert!(prompt.contains("MENSAGEM ATUAL DO USUÁRIO: \"e aí?\""));
        assert!(prompt.ends_with("RESPOSTA DE CAROLINE:"));
        assert!(!prompt.contains("MODO AGENTE"));
    }

    #[test]
    fn test_prompt_is_deterministic_for_fixed_period() {
        let profile = PersonalityProfile::default();
        let history = vec![msg(Sender::User, "oi")];
        let a = build_for_period(DayPeriod::Morning, &profile, &history, "tudo bem?", false);
        let b = build_for_period(DayPeriod::Morning, &profile, &history, "tudo bem?", false);
        assert_eq!(a, b);
    }

    #[test]
    fn test_agent_mode_adds_directive_and_empty_history_note() {
        let prompt = build_for_period(DayPeriod::Afternoon, &PersonalityProfile::default(), &[], "oi", true);
        assert!(prompt.contains("MODO AGENTE PESSOAL ATIVO"));
        assert!(prompt.contains("Primeira interação do dia"));
        assert!(prompt.contains("Humor da conversa: equilibrado e natural"));
    }
}
