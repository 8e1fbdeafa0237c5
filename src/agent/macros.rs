//! Named multi-step routines triggered from the chat (`/macro NAME`).

use super::os::OsActions;
use super::router::CommandResult;
use crate::error::OsActionError;
use crate::logging::log_error;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;

pub const MACRO_NAMES: &[&str] = &["foco", "pausa", "limpeza", "backup"];

const DISTRACTIONS: &[(&str, &[&str])] = &[
    ("discord", &["Discord.exe", "Discord", "discord"]),
    ("spotify", &["Spotify.exe", "Spotify", "spotify"]),
    ("chrome", &["chrome.exe", "Google Chrome", "chrome"]),
];

const BREAK_SUGGESTIONS: &[&str] = &[
    "Hora da pausa! Que tal beber uma água e alongar um pouco? 💧",
    "Pausa merecida! Levanta, dá uma volta e descansa os olhos da tela. 👀",
    "Bora respirar fundo por 5 minutinhos? Você tá trabalhando demais! 🌿",
];

pub fn run(os: &dyn OsActions, name: &str, rng: &mut StdRng) -> CommandResult {
    match name.trim().to_lowercase().as_str() {
        "foco" => focus(os),
        "pausa" => CommandResult::ok(
            BREAK_SUGGESTIONS
                .choose(rng)
                .copied()
                .unwrap_or(BREAK_SUGGESTIONS[0]),
        ),
        "limpeza" => cleanup(os),
        "backup" => CommandResult::ok(
            "Lembrete de backup: copie seus arquivos importantes pra nuvem ou um HD externo! 💾",
        ),
        _ => CommandResult::fail(format!(
            "Macro não encontrado. Disponíveis: {}",
            MACRO_NAMES.join(", ")
        )),
    }
}

fn focus(os: &dyn OsActions) -> CommandResult {
    let mut closed = Vec::new();
    for (app, names) in DISTRACTIONS {
        match os.close(names) {
            Ok(true) => closed.push(*app),
            Ok(false) => {}
            Err(e) => {
                log_error(None, &format!("focus macro could not close {}: {}", app, e));
                return CommandResult::fail("Não consegui ativar o modo foco completamente.");
            }
        }
    }

    if closed.is_empty() {
        CommandResult::ok("Modo foco ativado! Nenhuma distração estava aberta. 🎯")
    } else {
        CommandResult::ok(format!("Modo foco ativado! Fechei: {} 🎯", closed.join(", ")))
    }
}

fn cleanup(os: &dyn OsActions) -> CommandResult {
    match os.disk_cleanup() {
        Ok(()) => CommandResult::ok("Iniciando limpeza do sistema... isso pode demorar alguns minutos! 🧹"),
        Err(OsActionError::Unsupported(_)) => {
            CommandResult::fail("Limpeza automática disponível apenas no Windows por enquanto.")
        }
        Err(e) => {
            log_error(None, &format!("disk cleanup failed: {}", e));
            CommandResult::fail("Não consegui iniciar a limpeza. Tenta pela Limpeza de Disco.")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::os::fake::FakeOs;
    use rand::SeedableRng;

    #[test]
    fn test_focus_reports_closed_apps() {
        let os = FakeOs {
            running: vec!["Spotify".to_string()],
            ..FakeOs::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        let result = run(&os, "foco", &mut rng);
        assert_eq!(result, CommandResult::ok("Modo foco ativado! Fechei: spotify 🎯"));
        assert_eq!(os.calls().len(), 3);
    }

    #[test]
    fn test_break_is_one_of_suggestions() {
        let os = FakeOs::default();
        let mut rng = StdRng::seed_from_u64(9);
        let result = run(&os, "Pausa", &mut rng);
        assert!(result.success);
        assert!(BREAK_SUGGESTIONS.contains(&result.text.as_str()));
        assert!(os.calls().is_empty());
    }

    #[test]
    fn test_cleanup_failure() {
        let os = FakeOs {
            fail: true,
            ..FakeOs::default()
        };
        let mut rng = StdRng::seed_from_u64(1);
        assert!(!run(&os, "limpeza", &mut rng).success);
    }

    #[test]
    fn test_unknown_macro_lists_names() {
        let os = FakeOs::default();
        let mut rng = StdRng::seed_from_u64(1);
        let result = run(&os, "dormir", &mut rng);
        assert!(!result.success);
        assert!(result.text.ends_with("foco, pausa, limpeza, backup"));
    }
}
