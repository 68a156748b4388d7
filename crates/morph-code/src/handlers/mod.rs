//! Transition handlers for the morph bot and the graph that wires them.
//!
//! Handlers are registered on a [`HandlerRegistry`] through
//! [`MorphHandlersExt`], and [`build_machine`] lays out the edges between
//! the main menu, the settings page and the two file workflows.
//!
//! | Handler | Id | Purpose |
//! |---------|----|---------|
//! | [`MainMenu`] | `main_menu` | Welcome text and menu |
//! | [`Help`] | `help` | Command list |
//! | [`ShowGraph`] | `graph` | Graphviz source of the dialogue graph |
//! | [`Settings`] | `settings` | Configured keys and setup guidance |
//! | [`AuthenticateClaude`] | `authenticate_claude` | Run the credential provider |
//! | [`Exit`] | `exit` | Stop the driver |
//! | [`GenerateEntry`] | `generate` | Ask for a target file name |
//! | [`GenerateFileName`] | `generate_file_name_input` | Remember the target file |
//! | [`GeneratePrompt`] | `generate_prompt_input` | Ask the model and write the file |
//! | [`PatchEntry`] | `patch` | Ask for an existing file name |
//! | [`PatchFileName`] | `patch_file_name_input` | Load and remember the file |
//! | [`PatchPrompt`] | `patch_prompt_input` | Ask the model and overwrite the file |

pub mod menu;
pub mod workflow;

use std::sync::{Arc, RwLock};

use morph_rs::context::ContextWindow;
use morph_rs::credentials::{Credential, CredentialProvider};
use morph_rs::error::GraphError;
use morph_rs::exchange::{LlmExchange, LlmGateway};
use morph_rs::fsm::{HandlerRegistry, StateMachine, Trigger};
use morph_rs::persist::FilePersister;

use crate::config::MorphConfig;

pub use menu::{AuthenticateClaude, Exit, Help, MainMenu, Settings, ShowGraph};
pub use workflow::{
    GenerateEntry, GenerateFileName, GeneratePrompt, PatchEntry, PatchFileName, PatchPrompt,
};

// ── State names ─────────────────────────────────────────────────────

pub const START: &str = "/start";
pub const SETTINGS: &str = "/settings";
pub const GENERATE_FILE_NAME_INPUT: &str = "/generate_file_name_input";
pub const GENERATE_PROMPT_INPUT: &str = "/generate_prompt_input";
pub const PATCH_FILE_NAME_INPUT: &str = "/patch_file_name_input";
pub const PATCH_PROMPT_INPUT: &str = "/patch_prompt_input";

// ── Handler ids ─────────────────────────────────────────────────────

pub const MAIN_MENU: &str = "main_menu";
pub const HELP: &str = "help";
pub const GRAPH: &str = "graph";
pub const SHOW_SETTINGS: &str = "settings";
pub const AUTHENTICATE_CLAUDE: &str = "authenticate_claude";
pub const EXIT: &str = "exit";
pub const GENERATE: &str = "generate";
pub const GENERATE_FILE_NAME: &str = "generate_file_name_input";
pub const GENERATE_PROMPT: &str = "generate_prompt_input";
pub const PATCH: &str = "patch";
pub const PATCH_FILE_NAME: &str = "patch_file_name_input";
pub const PATCH_PROMPT: &str = "patch_prompt_input";

// ── Context keys ────────────────────────────────────────────────────

pub const GENERATE_FILE_KEY: &str = "generate_file_name";
pub const PATCH_FILE_KEY: &str = "patch_file_name";

/// Shared dependencies of every handler.
#[derive(Clone)]
pub struct Services {
    pub config: Arc<MorphConfig>,
    pub exchange: LlmExchange,
    pub persister: FilePersister,
    pub credentials: Arc<dyn CredentialProvider>,
    claude_session: Arc<RwLock<Option<Credential>>>,
}

impl std::fmt::Debug for Services {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Services")
            .field("exchange", &self.exchange)
            .field("persister", &self.persister)
            .field("claude_authenticated", &self.claude_authenticated())
            .finish_non_exhaustive()
    }
}

impl Services {
    /// Wire the exchange window and persister root from `config`.
    pub fn new(
        config: MorphConfig,
        gateway: Arc<dyn LlmGateway>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> Self {
        let exchange =
            LlmExchange::new(gateway).with_window(ContextWindow::new(config.word_budget));
        let persister = FilePersister::new(config.workdir.clone());
        Self {
            config: Arc::new(config),
            exchange,
            persister,
            credentials,
            claude_session: Arc::new(RwLock::new(None)),
        }
    }

    /// Keep the credential from a successful `/authenticate_claude`.
    pub fn set_claude_session(&self, credential: Credential) {
        let mut slot = self
            .claude_session
            .write()
            .unwrap_or_else(|e| e.into_inner());
        *slot = Some(credential);
    }

    pub fn claude_authenticated(&self) -> bool {
        self.claude_session
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .is_some()
    }
}

// ── Extension trait ─────────────────────────────────────────────────

/// Registers every morph handler on a [`HandlerRegistry`].
pub trait MorphHandlersExt {
    fn with_morph_handlers(self, services: Arc<Services>) -> Self;
}

impl MorphHandlersExt for HandlerRegistry {
    fn with_morph_handlers(self, services: Arc<Services>) -> Self {
        self.with(MAIN_MENU, MainMenu)
            .with(HELP, Help)
            .with(GRAPH, ShowGraph)
            .with(SHOW_SETTINGS, Settings::new(services.clone()))
            .with(AUTHENTICATE_CLAUDE, AuthenticateClaude::new(services.clone()))
            .with(EXIT, Exit)
            .with(GENERATE, GenerateEntry::new(services.clone()))
            .with(GENERATE_FILE_NAME, GenerateFileName::new(services.clone()))
            .with(GENERATE_PROMPT, GeneratePrompt::new(services.clone()))
            .with(PATCH, PatchEntry::new(services.clone()))
            .with(PATCH_FILE_NAME, PatchFileName::new(services.clone()))
            .with(PATCH_PROMPT, PatchPrompt::new(services))
    }
}

/// The morph dialogue graph with all handlers registered.
pub fn build_machine(services: Arc<Services>) -> Result<StateMachine, GraphError> {
    fn lit(command: &str) -> Trigger {
        Trigger::literal(command)
    }
    let handlers = HandlerRegistry::new().with_morph_handlers(services);

    StateMachine::builder(START)
        // Main menu
        .edge_with(START, START, lit("/graph"), GRAPH)
        .edge_with(START, START, lit("/start"), MAIN_MENU)
        .edge_with(START, SETTINGS, lit("/settings"), SHOW_SETTINGS)
        .edge_with(START, START, lit("/help"), HELP)
        .edge_with(START, START, lit("/exit"), EXIT)
        // Settings
        .edge_with(SETTINGS, START, lit("/exit"), EXIT)
        .edge_with(SETTINGS, START, lit("/authenticate_claude"), AUTHENTICATE_CLAUDE)
        .edge_with(SETTINGS, START, lit("/start"), MAIN_MENU)
        // Generate
        .edge_with(START, GENERATE_FILE_NAME_INPUT, lit("/generate"), GENERATE)
        .edge(GENERATE_FILE_NAME_INPUT, START, lit("/start"))
        .edge_with(GENERATE_FILE_NAME_INPUT, START, lit("/exit"), EXIT)
        .edge_with(GENERATE_FILE_NAME_INPUT, SETTINGS, lit("/settings"), SHOW_SETTINGS)
        .edge_with(
            GENERATE_FILE_NAME_INPUT,
            GENERATE_PROMPT_INPUT,
            Trigger::any(),
            GENERATE_FILE_NAME,
        )
        .edge(GENERATE_PROMPT_INPUT, START, lit("/start"))
        .edge_with(GENERATE_PROMPT_INPUT, START, lit("/exit"), EXIT)
        .edge_with(GENERATE_PROMPT_INPUT, START, Trigger::any(), GENERATE_PROMPT)
        // Patch
        .edge_with(START, PATCH_FILE_NAME_INPUT, lit("/patch"), PATCH)
        .edge(PATCH_FILE_NAME_INPUT, START, lit("/start"))
        .edge_with(PATCH_FILE_NAME_INPUT, START, lit("/exit"), EXIT)
        .edge_with(PATCH_FILE_NAME_INPUT, SETTINGS, lit("/settings"), SHOW_SETTINGS)
        .edge_with(PATCH_FILE_NAME_INPUT, PATCH_PROMPT_INPUT, Trigger::any(), PATCH_FILE_NAME)
        .edge(PATCH_PROMPT_INPUT, START, lit("/start"))
        .edge_with(PATCH_PROMPT_INPUT, START, lit("/exit"), EXIT)
        .edge_with(PATCH_PROMPT_INPUT, START, Trigger::any(), PATCH_PROMPT)
        .build(handlers)
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_rs::Message;
    use morph_rs::credentials::UnavailableCredentials;
    use morph_rs::exchange::GatewayFuture;

    struct Silent;

    impl LlmGateway for Silent {
        fn complete(&self, _messages: Vec<Message>) -> GatewayFuture<'_> {
            Box::pin(async { Ok(Vec::new()) })
        }
    }

    fn services() -> Arc<Services> {
        Arc::new(Services::new(
            MorphConfig::default(),
            Arc::new(Silent),
            Arc::new(UnavailableCredentials),
        ))
    }

    #[test]
    fn graph_builds_with_all_handlers() {
        let machine = build_machine(services()).unwrap();
        assert_eq!(machine.handlers().len(), 12);
        let states: Vec<_> = machine
            .graph()
            .states()
            .iter()
            .map(|s| s.as_str().to_string())
            .collect();
        for state in [
            START,
            SETTINGS,
            GENERATE_FILE_NAME_INPUT,
            GENERATE_PROMPT_INPUT,
            PATCH_FILE_NAME_INPUT,
            PATCH_PROMPT_INPUT,
        ] {
            assert!(states.iter().any(|s| s == state), "missing {state}");
        }
    }

    #[test]
    fn every_input_state_can_abort_to_start() {
        let machine = build_machine(services()).unwrap();
        for state in [
            GENERATE_FILE_NAME_INPUT,
            GENERATE_PROMPT_INPUT,
            PATCH_FILE_NAME_INPUT,
            PATCH_PROMPT_INPUT,
        ] {
            let (_, edge) = machine.graph().select(&state.into(), "/start").unwrap();
            assert_eq!(edge.to.as_str(), START);
            assert!(edge.handler.is_none());
        }
    }

    #[test]
    fn services_take_budget_and_workdir_from_config() {
        let config = MorphConfig {
            word_budget: 12,
            workdir: "/tmp/morph".into(),
            ..Default::default()
        };
        let services = Services::new(config, Arc::new(Silent), Arc::new(UnavailableCredentials));
        assert_eq!(services.exchange.window().budget(), 12);
        assert_eq!(services.persister.workdir(), std::path::Path::new("/tmp/morph"));
    }
}
