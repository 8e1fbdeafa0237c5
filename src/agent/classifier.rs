//! Keyword classification of user messages.
//!
//! Matching is plain substring search over the lower-cased text, so a
//! keyword also fires inside a longer word ("terminar" in "terminaram",
//! "ram" in "programas"). Those false positives are accepted as-is.

use serde::{Deserialize, Serialize};

/// Any of these marks a message as a command candidate.
pub const COMMAND_KEYWORDS: &[&str] = &[
    "abrir", "abra", "executar", "execute", "rodar", "iniciar",
    "fechar", "feche", "parar", "matar", "terminar",
    "mostrar", "listar", "ver", "verificar", "checar",
    "screenshot", "capturar", "foto da tela",
    "música", "tocar", "pausar", "parar música",
    "volume", "aumentar", "diminuir", "mutar",
    "sistema", "processador", "memória", "disco",
    "clima", "tempo", "previsão",
    "pesquisar", "buscar", "google", "youtube",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    OpenApp,
    SystemStatus,
    Screenshot,
    Volume,
    Search,
    Weather,
    ListProcesses,
    CloseApp,
}

impl CommandKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::OpenApp => "open_app",
            CommandKind::SystemStatus => "system_status",
            CommandKind::Screenshot => "screenshot",
            CommandKind::Volume => "volume",
            CommandKind::Search => "search",
            CommandKind::Weather => "weather",
            CommandKind::ListProcesses => "list_processes",
            CommandKind::CloseApp => "close_app",
        }
    }
}

/// Dispatch table in priority order. The first category with a matching
/// keyword wins, so a later category is shadowed whenever an earlier
/// category's keyword is also present.
pub const DISPATCH_ORDER: &[(CommandKind, &[&str])] = &[
    (CommandKind::OpenApp, &["abrir", "abra", "executar", "iniciar"]),
    (CommandKind::SystemStatus, &["sistema", "processador", "memória", "ram", "disco"]),
    (CommandKind::Screenshot, &["screenshot", "capturar", "foto da tela", "print"]),
    (CommandKind::Volume, &["volume", "som"]),
    (CommandKind::Search, &["pesquisar", "buscar", "google", "youtube"]),
    (CommandKind::Weather, &["clima", "tempo", "previsão"]),
    (CommandKind::ListProcesses, &["processos", "apps", "aplicativos", "programas"]),
    (CommandKind::CloseApp, &["fechar", "feche", "matar", "terminar"]),
];

pub fn contains_any(text: &str, keywords: &[&str]) -> bool {
    keywords.iter().any(|k| text.contains(k))
}

pub fn is_command(text: &str) -> bool {
    contains_any(&text.to_lowercase(), COMMAND_KEYWORDS)
}

/// Picks the handler category for a command message, or `None` when no
/// category keyword is present.
pub fn classify(text: &str) -> Option<CommandKind> {
    let lower = text.to_lowercase();
    DISPATCH_ORDER
        .iter()
        .find(|(_, keywords)| contains_any(&lower, keywords))
        .map(|(kind, _)| *kind)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_command_case_insensitive() {
        assert!(is_command("ABRIR o Chrome"));
        assert!(is_command("qual a previsão pra hoje"));
        assert!(!is_command("oi, tudo bem?"));
    }

    #[test]
    fn test_is_command_matches_inside_words() {
        // "ver" inside "verdade"
        assert!(is_command("é verdade"));
    }

    #[test]
    fn test_is_command_monotone() {
        for s in ["abrir notepad", "volume", "foto da tela agora", "me mostra o disco"] {
            assert!(is_command(s));
            assert!(is_command(&format!("{} extra text", s)));
        }
    }

    #[test]
    fn test_open_wins_over_system_status() {
        assert_eq!(classify("abrir o status do sistema"), Some(CommandKind::OpenApp));
    }

    #[test]
    fn test_categories() {
        assert_eq!(classify("como está a memória?"), Some(CommandKind::SystemStatus));
        assert_eq!(classify("tira um screenshot"), Some(CommandKind::Screenshot));
        assert_eq!(classify("aumentar volume"), Some(CommandKind::Volume));
        assert_eq!(classify("pesquisar receita de bolo"), Some(CommandKind::Search));
        assert_eq!(classify("como está o clima"), Some(CommandKind::Weather));
        assert_eq!(classify("listar processos"), Some(CommandKind::ListProcesses));
        assert_eq!(classify("fechar chrome"), Some(CommandKind::CloseApp));
        assert_eq!(classify("tocar música"), None);
    }

    #[test]
    fn test_shadowing_is_first_match() {
        // "programas" contains "ram", so system status shadows the process list.
        assert_eq!(classify("listar programas"), Some(CommandKind::SystemStatus));
        // "som" in a search phrase routes to volume before search.
        assert_eq!(classify("buscar som de chuva"), Some(CommandKind::Volume));
    }
}
