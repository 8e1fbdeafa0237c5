use async_trait::async_trait;
use companion_lib::agent::os::{ProcessUsage, SystemStatus, VolumeDirection};
use companion_lib::agent::personalizer::AFFECTION_MARKERS;
use companion_lib::responder::{FALLBACK_LINES, GREETING_LINES};
use companion_lib::{
    BackendError, CommandRouter, Companion, ConversationStore, GenerationBackend, GenerationConfig,
    OsActionError, OsActions, PersonalityProfile, ResponseGenerator, Sender, SqliteStore, Trait,
    TurnKind,
};
use std::sync::{Arc, Mutex};

/// Records every OS call; nothing is ever running.
#[derive(Default)]
struct RecordingOs {
    calls: Mutex<Vec<String>>,
}

impl RecordingOs {
    fn push(&self, call: String) {
        self.calls.lock().unwrap().push(call);
    }
}

impl OsActions for RecordingOs {
    fn open(&self, app_name: &str) -> Result<(), OsActionError> {
        self.push(format!("open:{}", app_name));
        Ok(())
    }

    fn screenshot(&self) -> Result<String, OsActionError> {
        Err(OsActionError::Unsupported("test"))
    }

    fn system_status(&self) -> Result<SystemStatus, OsActionError> {
        Err(OsActionError::Unsupported("test"))
    }

    fn list_processes(&self, _threshold_percent: f32) -> Result<Vec<ProcessUsage>, OsActionError> {
        Ok(Vec::new())
    }

    fn close(&self, process_names: &[&str]) -> Result<bool, OsActionError> {
        self.push(format!("close:{}", process_names.join(",")));
        Ok(false)
    }

    fn set_volume(&self, _direction: VolumeDirection) -> Result<(), OsActionError> {
        Ok(())
    }

    fn open_url(&self, url: &str) -> Result<(), OsActionError> {
        self.push(format!("url:{}", url));
        Ok(())
    }

    fn disk_cleanup(&self) -> Result<(), OsActionError> {
        Err(OsActionError::Unsupported("test"))
    }
}

struct AlwaysFails;

#[async_trait]
impl GenerationBackend for AlwaysFails {
    fn name(&self) -> &'static str {
        "failing"
    }

    async fn generate(&self, _prompt: &str, _config: &GenerationConfig) -> Result<String, BackendError> {
        Err(BackendError::Api {
            backend: "failing",
            status: 429,
            body: "quota exceeded".to_string(),
        })
    }
}

fn setup(
    profile: Option<PersonalityProfile>,
    backend: Option<Arc<dyn GenerationBackend>>,
    agent_mode: bool,
) -> (Companion, Arc<SqliteStore>, Arc<RecordingOs>) {
    let store = Arc::new(SqliteStore::open_in_memory().unwrap());
    if let Some(profile) = profile {
        store.save_personality(&profile).unwrap();
    }
    let os = Arc::new(RecordingOs::default());
    let companion = Companion::new(
        store.clone(),
        ResponseGenerator::new(backend, Some(17)),
        CommandRouter::new(os.clone(), Some(17)),
        agent_mode,
    )
    .unwrap();
    (companion, store, os)
}

fn ana() -> PersonalityProfile {
    PersonalityProfile {
        name: "Ana".to_string(),
        traits: [Trait::Carinhosa].into_iter().collect(),
        ..PersonalityProfile::default()
    }
}

#[tokio::test]
async fn open_notepad_for_caring_profile() {
    let (mut companion, _, os) = setup(Some(ana()), None, true);

    let reply = companion.handle_turn("abrir notepad").await.unwrap().unwrap();

    assert_eq!(reply.kind, TurnKind::Command { success: true });
    assert!(reply.text.contains("notepad"));
    assert!(AFFECTION_MARKERS.iter().any(|m| reply.text.ends_with(m)));
    assert_eq!(*os.calls.lock().unwrap(), vec!["open:notepad".to_string()]);
}

#[tokio::test]
async fn greeting_without_backend_uses_patterns() {
    let (mut companion, _, _) = setup(None, None, false);

    let reply = companion.handle_turn("oi").await.unwrap().unwrap();

    assert_eq!(reply.kind, TurnKind::Chat);
    assert!(GREETING_LINES.contains(&reply.text.as_str()));
}

#[tokio::test]
async fn closing_app_that_is_not_running_succeeds() {
    let (mut companion, _, _) = setup(Some(ana()), None, true);

    let reply = companion.handle_turn("fechar chrome").await.unwrap().unwrap();

    assert_eq!(reply.kind, TurnKind::Command { success: true });
    assert!(reply.text.contains("não estava rodando"));
}

#[tokio::test]
async fn failing_backend_yields_fallback_line() {
    let (mut companion, store, _) = setup(None, Some(Arc::new(AlwaysFails)), false);

    for message in ["oi", "me conta uma história", "tudo bem?"] {
        let reply = companion.handle_turn(message).await.unwrap().unwrap();
        assert!(!reply.text.is_empty());
        assert!(FALLBACK_LINES.contains(&reply.text.as_str()));
    }

    let history = store.full_history(companion.conversation_id()).unwrap();
    assert_eq!(history.len(), 6);
    assert!(history
        .iter()
        .step_by(2)
        .all(|m| m.sender == Sender::User));
}

#[tokio::test]
async fn search_without_agent_mode_stays_chat() {
    let (mut companion, _, os) = setup(None, None, false);

    let reply = companion.handle_turn("pesquisar receitas").await.unwrap().unwrap();
    assert_eq!(reply.kind, TurnKind::Chat);
    assert!(os.calls.lock().unwrap().is_empty());

    companion.set_agent_mode(true);
    let reply = companion.handle_turn("pesquisar receitas").await.unwrap().unwrap();
    assert_eq!(reply.kind, TurnKind::Command { success: true });
    assert_eq!(
        *os.calls.lock().unwrap(),
        vec!["url:https://www.google.com/search?q=receitas".to_string()]
    );
}
