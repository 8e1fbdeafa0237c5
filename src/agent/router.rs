use super::classifier::{self, contains_any, CommandKind};
use super::macros;
use super::os::{OsActions, VolumeDirection, GIB};
use super::personalizer::Personalizer;
use crate::logging::{log_command, log_error, log_routing};
use crate::personality::PersonalityProfile;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Outcome of one command, before it becomes a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommandResult {
    pub text: String,
    pub success: bool,
}

impl CommandResult {
    pub fn ok(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: true,
        }
    }

    pub fn fail(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            success: false,
        }
    }
}

const PROCESS_THRESHOLD_PERCENT: f32 = 1.0;
const TOP_PROCESSES: usize = 10;

const OPEN_TRIGGERS: &[&str] = &["abrir", "abra", "executar", "iniciar"];
const SEARCH_TRIGGERS: &[&str] = &["pesquisar", "buscar", "google", "youtube"];

/// App name handed to the OS, and the phrases that refer to it.
const OPEN_ALIASES: &[(&str, &[&str])] = &[
    ("chrome", &["google chrome", "chrome"]),
    ("brave", &["brave", "navegador"]),
    ("firefox", &["firefox", "mozilla"]),
    ("notepad", &["bloco de notas", "notepad", "editor"]),
    ("calculator", &["calculadora", "calc"]),
    ("cmd", &["cmd", "prompt", "terminal"]),
    ("explorer", &["explorer", "explorador", "pasta", "arquivos"]),
    ("spotify", &["spotify", "música"]),
    ("discord", &["discord"]),
    ("steam", &["steam", "jogos"]),
    ("code", &["vscode", "vs code", "visual studio code", "code"]),
];

/// Process names per closable app, covering Windows, macOS and Linux naming.
const CLOSE_ALIASES: &[(&str, &[&str])] = &[
    ("chrome", &["chrome.exe", "Google Chrome", "chrome"]),
    ("firefox", &["firefox.exe", "Firefox", "firefox"]),
    ("notepad", &["notepad.exe", "Notepad", "gedit"]),
    ("calculator", &["calc.exe", "Calculator", "gnome-calculator"]),
    ("spotify", &["Spotify.exe", "Spotify", "spotify"]),
    ("discord", &["Discord.exe", "Discord", "discord"]),
    ("steam", &["Steam.exe", "Steam", "steam"]),
];

const WEATHER_TEXT: &str = "Ainda não consigo ver a previsão do tempo direto daqui, mas posso \
pesquisar pra você! Tenta \"pesquisar clima hoje\" 🌤️";

const UNRECOGNIZED_TEXT: &str = "Não consegui identificar o comando específico. Pode me explicar \
melhor o que você quer que eu faça?";

/// Dispatches command messages to OS actions and personalizes the outcome.
pub struct CommandRouter {
    os: Arc<dyn OsActions>,
    personalizer: Personalizer,
    rng: StdRng,
}

impl CommandRouter {
    pub fn new(os: Arc<dyn OsActions>, seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s.wrapping_add(1)),
            None => StdRng::from_os_rng(),
        };
        Self {
            os,
            personalizer: Personalizer::new(seed),
            rng,
        }
    }

    pub fn os(&self) -> &Arc<dyn OsActions> {
        &self.os
    }

    /// Runs the matching handler and returns its raw result. Never fails.
    pub fn dispatch(&self, text: &str) -> CommandResult {
        let lower = text.to_lowercase();
        let Some(kind) = classifier::classify(&lower) else {
            log_routing(None, &format!("No handler for command: {}", text));
            return CommandResult::fail(UNRECOGNIZED_TEXT);
        };
        log_routing(None, &format!("Command classified as {}", kind.as_str()));

        let os = self.os.as_ref();
        let result = match kind {
            CommandKind::OpenApp => open_app(os, &lower),
            CommandKind::SystemStatus => system_status(os),
            CommandKind::Screenshot => screenshot(os),
            CommandKind::Volume => volume(os, &lower),
            CommandKind::Search => search(os, &lower),
            CommandKind::Weather => CommandResult::ok(WEATHER_TEXT),
            CommandKind::ListProcesses => list_processes(os),
            CommandKind::CloseApp => close_app(os, &lower),
        };

        log_command(
            None,
            &format!("{} -> success={}", kind.as_str(), result.success),
        );
        result
    }

    /// `dispatch` followed by personality styling.
    pub fn route(&mut self, text: &str, personality: &PersonalityProfile) -> CommandResult {
        let raw = self.dispatch(text);
        let text = self.personalizer.personalize(&raw.text, personality, raw.success);
        CommandResult {
            text,
            success: raw.success,
        }
    }

    pub fn run_macro(&mut self, name: &str, personality: &PersonalityProfile) -> CommandResult {
        let raw = macros::run(self.os.as_ref(), name, &mut self.rng);
        log_command(None, &format!("macro {} -> success={}", name, raw.success));
        let text = self.personalizer.personalize(&raw.text, personality, raw.success);
        CommandResult {
            text,
            success: raw.success,
        }
    }
}

/// Word right after the first trigger, if any.
fn word_after(lower: &str, triggers: &[&str]) -> Option<String> {
    let words: Vec<&str> = lower.split_whitespace().collect();
    words
        .iter()
        .position(|w| triggers.contains(w))
        .and_then(|i| words.get(i + 1))
        .map(|w| w.trim_matches(|c: char| !c.is_alphanumeric()).to_string())
        .filter(|w| !w.is_empty())
}

fn open_app(os: &dyn OsActions, lower: &str) -> CommandResult {
    let app = OPEN_ALIASES
        .iter()
        .find(|(_, aliases)| contains_any(lower, aliases))
        .map(|(app, _)| app.to_string())
        .or_else(|| word_after(lower, OPEN_TRIGGERS));

    let Some(app) = app else {
        return CommandResult::fail("Qual aplicação você quer que eu abra?");
    };

    match os.open(&app) {
        Ok(()) => CommandResult::ok(format!("Abri o {} pra você! 😊", app)),
        Err(e) => {
            log_error(None, &format!("open {} failed: {}", app, e));
            CommandResult::fail(format!(
                "Não consegui abrir o {}. Tem certeza que ele tá instalado?",
                app
            ))
        }
    }
}

fn gib(bytes: u64) -> f64 {
    bytes as f64 / GIB as f64
}

fn system_status(os: &dyn OsActions) -> CommandResult {
    match os.system_status() {
        Ok(s) => CommandResult::ok(format!(
            "Aqui está o status do seu sistema:\n\n\
             🖥️ Processador: {:.1}% de uso\n\
             🧠 Memória RAM: {:.1}% usado ({:.1}GB de {:.1}GB)\n\
             💾 Disco: {:.1}% usado ({:.1}GB de {:.1}GB)\n\
             ⚡ Sistema: {}",
            s.cpu_percent,
            s.mem_percent(),
            gib(s.mem_used),
            gib(s.mem_total),
            s.disk_percent(),
            gib(s.disk_used),
            gib(s.disk_total),
            s.os_label,
        )),
        Err(e) => {
            log_error(None, &format!("system status failed: {}", e));
            CommandResult::fail("Não consegui ler o status do sistema agora.")
        }
    }
}

fn screenshot(os: &dyn OsActions) -> CommandResult {
    match os.screenshot() {
        Ok(filename) => CommandResult::ok(format!("Screenshot salva como {}! 📸", filename)),
        Err(e) => {
            log_error(None, &format!("screenshot failed: {}", e));
            CommandResult::fail("Não consegui capturar a tela. Verifique as permissões.")
        }
    }
}

fn volume(os: &dyn OsActions, lower: &str) -> CommandResult {
    let (direction, reply) = if contains_any(lower, &["aumentar", "subir"]) {
        (VolumeDirection::Up, "Volume aumentado! 🔊")
    } else if contains_any(lower, &["diminuir", "abaixar"]) {
        (VolumeDirection::Down, "Volume diminuído! 🔉")
    } else if contains_any(lower, &["mutar", "silenciar"]) {
        (VolumeDirection::Mute, "Som mutado! 🔇")
    } else {
        return CommandResult::fail(
            "Não entendi o comando de volume. Quer aumentar, diminuir ou mutar?",
        );
    };

    // Best effort: the confirmation goes out either way.
    if let Err(e) = os.set_volume(direction) {
        log_error(None, &format!("volume {:?} failed: {}", direction, e));
    }
    CommandResult::ok(reply)
}

/// Text following the first search trigger found in the message.
fn search_phrase(lower: &str) -> Option<String> {
    SEARCH_TRIGGERS.iter().find_map(|trigger| {
        lower.find(trigger).map(|idx| {
            lower[idx + trigger.len()..]
                .trim()
                .trim_start_matches(|c: char| c == ':' || c == ',')
                .trim()
                .to_string()
        })
    })
    .filter(|phrase| !phrase.is_empty())
}

fn search(os: &dyn OsActions, lower: &str) -> CommandResult {
    let Some(term) = search_phrase(lower) else {
        return CommandResult::fail("O que você quer pesquisar?");
    };

    let on_youtube = lower.contains("youtube");
    let url = if on_youtube {
        format!(
            "https://www.youtube.com/results?search_query={}",
            urlencoding::encode(&term)
        )
    } else {
        format!("https://www.google.com/search?q={}", urlencoding::encode(&term))
    };

    match os.open_url(&url) {
        Ok(()) if on_youtube => {
            CommandResult::ok(format!("Abri o YouTube pesquisando por '{}'! 🎥", term))
        }
        Ok(()) => CommandResult::ok(format!("Abri o Google pesquisando por '{}'! 🔍", term)),
        Err(e) => {
            log_error(None, &format!("open url failed: {}", e));
            CommandResult::fail("Não consegui fazer a pesquisa. Tenta abrir o navegador manualmente.")
        }
    }
}

fn list_processes(os: &dyn OsActions) -> CommandResult {
    let mut processes = match os.list_processes(PROCESS_THRESHOLD_PERCENT) {
        Ok(p) => p,
        Err(e) => {
            log_error(None, &format!("process listing failed: {}", e));
            return CommandResult::fail("Não consegui listar os processos agora.");
        }
    };

    if processes.is_empty() {
        return CommandResult::ok("Nenhuma aplicação está usando mais de 1% da RAM agora.");
    }

    processes.sort_by(|a, b| b.mem_percent.total_cmp(&a.mem_percent));
    let mut text = String::from("Principais aplicações rodando:\n\n");
    for p in processes.iter().take(TOP_PROCESSES) {
        text.push_str(&format!("• {}: {:.1}% RAM\n", p.name, p.mem_percent));
    }
    CommandResult::ok(text)
}

fn close_app(os: &dyn OsActions, lower: &str) -> CommandResult {
    let Some((app, names)) = CLOSE_ALIASES.iter().find(|(app, _)| lower.contains(*app)) else {
        return CommandResult::fail("Qual aplicação você quer fechar? Me diga o nome específico.");
    };

    match os.close(names) {
        Ok(true) => CommandResult::ok(format!("Fechei o {} pra você! ✅", app)),
        Ok(false) => CommandResult::ok(format!("O {} não estava rodando.", app)),
        Err(e) => {
            log_error(None, &format!("close {} failed: {}", app, e));
            CommandResult::fail(format!(
                "Não consegui fechar o {}. Tenta fechar manualmente.",
                app
            ))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::os::fake::FakeOs;
    use crate::agent::os::{ProcessUsage, SystemStatus};
    use crate::personality::Trait;

    fn router(os: FakeOs) -> (CommandRouter, Arc<FakeOs>) {
        let os = Arc::new(os);
        (CommandRouter::new(os.clone(), Some(42)), os)
    }

    #[test]
    fn test_open_alias() {
        let (r, os) = router(FakeOs::default());
        let result = r.dispatch("Abrir o bloco de notas");
        assert_eq!(result, CommandResult::ok("Abri o notepad pra você! 😊"));
        assert_eq!(os.calls(), vec!["open:notepad"]);
    }

    #[test]
    fn test_open_unknown_name_verbatim() {
        let (r, os) = router(FakeOs::default());
        assert!(r.dispatch("abrir gimp").success);
        assert_eq!(os.calls(), vec!["open:gimp"]);
    }

    #[test]
    fn test_open_folder_and_code_aliases() {
        let (r, os) = router(FakeOs::default());
        assert!(r.dispatch("abrir a pasta").success);
        assert!(r.dispatch("abrir o code").success);
        assert_eq!(os.calls(), vec!["open:explorer", "open:code"]);
    }

    #[test]
    fn test_open_failure_is_result() {
        let (r, _) = router(FakeOs {
            fail: true,
            ..FakeOs::default()
        });
        let result = r.dispatch("abrir spotify");
        assert!(!result.success);
        assert!(result.text.contains("spotify"));
    }

    #[test]
    fn test_open_priority_over_status() {
        let (r, os) = router(FakeOs::default());
        r.dispatch("abrir o status do sistema");
        assert!(os.calls()[0].starts_with("open:"));
    }

    #[test]
    fn test_system_status_report() {
        let (r, _) = router(FakeOs {
            status: Some(SystemStatus {
                cpu_percent: 23.5,
                mem_used: 8 * GIB,
                mem_total: 16 * GIB,
                disk_used: 100 * GIB,
                disk_total: 400 * GIB,
                os_label: "Linux 6.1".to_string(),
            }),
            ..FakeOs::default()
        });
        let result = r.dispatch("como está o sistema?");
        assert!(result.success);
        assert!(result.text.contains("Processador: 23.5% de uso"));
        assert!(result.text.contains("50.0% usado (8.0GB de 16.0GB)"));
        assert!(result.text.contains("25.0% usado (100.0GB de 400.0GB)"));
    }

    #[test]
    fn test_screenshot_filename() {
        let (r, _) = router(FakeOs::default());
        let result = r.dispatch("tira um screenshot");
        assert_eq!(result.text, "Screenshot salva como screenshot_20240501_101500.png! 📸");
    }

    #[test]
    fn test_volume_confirms_even_on_failure() {
        let (r, os) = router(FakeOs {
            fail: true,
            ..FakeOs::default()
        });
        let result = r.dispatch("diminuir o volume");
        assert_eq!(result, CommandResult::ok("Volume diminuído! 🔉"));
        assert_eq!(os.calls(), vec!["volume:Down"]);
    }

    #[test]
    fn test_volume_needs_direction() {
        let (r, os) = router(FakeOs::default());
        assert!(!r.dispatch("volume").success);
        assert!(os.calls().is_empty());
    }

    #[test]
    fn test_search_google_and_youtube() {
        let (r, os) = router(FakeOs::default());
        let result = r.dispatch("pesquisar receita de bolo");
        assert_eq!(result.text, "Abri o Google pesquisando por 'receita de bolo'! 🔍");

        let result = r.dispatch("youtube lofi hip hop");
        assert_eq!(result.text, "Abri o YouTube pesquisando por 'lofi hip hop'! 🎥");

        assert_eq!(
            os.calls(),
            vec![
                "url:https://www.google.com/search?q=receita%20de%20bolo",
                "url:https://www.youtube.com/results?search_query=lofi%20hip%20hop",
            ]
        );
    }

    #[test]
    fn test_search_without_phrase_asks() {
        let (r, os) = router(FakeOs::default());
        assert_eq!(r.dispatch("pesquisar"), CommandResult::fail("O que você quer pesquisar?"));
        assert!(os.calls().is_empty());
    }

    #[test]
    fn test_process_list_sorted_and_capped() {
        let processes = (0..15)
            .map(|i| ProcessUsage {
                name: format!("app{}", i),
                mem_percent: 1.5 + i as f32,
            })
            .chain(std::iter::once(ProcessUsage {
                name: "tiny".to_string(),
                mem_percent: 0.2,
            }))
            .collect();
        let (r, _) = router(FakeOs {
            processes,
            ..FakeOs::default()
        });

        let result = r.dispatch("listar processos");
        assert!(result.success);
        let lines: Vec<&str> = result.text.lines().filter(|l| l.starts_with('•')).collect();
        assert_eq!(lines.len(), 10);
        assert_eq!(lines[0], "• app14: 15.5% RAM");
        assert!(!result.text.contains("tiny"));
    }

    #[test]
    fn test_close_not_running_is_success() {
        let (r, _) = router(FakeOs::default());
        assert_eq!(
            r.dispatch("fechar chrome"),
            CommandResult::ok("O chrome não estava rodando.")
        );
    }

    #[test]
    fn test_close_running() {
        let (r, _) = router(FakeOs {
            running: vec!["Steam".to_string()],
            ..FakeOs::default()
        });
        assert_eq!(
            r.dispatch("feche o steam"),
            CommandResult::ok("Fechei o steam pra você! ✅")
        );
    }

    #[test]
    fn test_unrecognized_command() {
        let (r, _) = router(FakeOs::default());
        let result = r.dispatch("tocar música");
        assert!(!result.success);
        assert_eq!(result.text, UNRECOGNIZED_TEXT);
    }

    fn failing() -> FakeOs {
        FakeOs {
            fail: true,
            ..FakeOs::default()
        }
    }

    #[test]
    fn test_system_status_failure_is_result() {
        let (r, _) = router(failing());
        let result = r.dispatch("como está o sistema?");
        assert_eq!(result, CommandResult::fail("Não consegui ler o status do sistema agora."));
    }

    #[test]
    fn test_screenshot_failure_is_result() {
        let (r, _) = router(failing());
        let result = r.dispatch("tira um screenshot");
        assert_eq!(
            result,
            CommandResult::fail("Não consegui capturar a tela. Verifique as permissões.")
        );
    }

    #[test]
    fn test_search_failure_is_result() {
        let (r, os) = router(failing());
        let result = r.dispatch("pesquisar gatos");
        assert!(!result.success);
        assert_eq!(os.calls(), vec!["url:https://www.google.com/search?q=gatos"]);
    }

    #[test]
    fn test_process_list_failure_is_result() {
        let (r, _) = router(failing());
        let result = r.dispatch("listar processos");
        assert_eq!(result, CommandResult::fail("Não consegui listar os processos agora."));
    }

    #[test]
    fn test_close_failure_is_result() {
        let (r, _) = router(failing());
        let result = r.dispatch("fechar chrome");
        assert!(!result.success);
        assert!(result.text.contains("chrome"));
    }

    #[test]
    fn test_weather_is_fixed_reply() {
        let (r, os) = router(FakeOs::default());
        assert_eq!(r.dispatch("como está o clima"), CommandResult::ok(WEATHER_TEXT));
        assert!(os.calls().is_empty());
    }

    #[test]
    fn test_empty_process_list() {
        let (r, _) = router(FakeOs::default());
        assert_eq!(
            r.dispatch("listar processos"),
            CommandResult::ok("Nenhuma aplicação está usando mais de 1% da RAM agora.")
        );
    }

    #[test]
    fn test_route_personalizes() {
        let (mut r, _) = router(FakeOs::default());
        let shy = PersonalityProfile {
            traits: [Trait::Timida].into_iter().collect(),
            ..PersonalityProfile::default()
        };
        let result = r.route("pesquisar", &shy);
        assert!(!result.success);
        assert!(result.text.ends_with("o que você quer pesquisar?"));
    }
}
