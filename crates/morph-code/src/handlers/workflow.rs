//! The generate and patch workflows.
//!
//! Both run in three steps: an entry command that checks for an API key and
//! asks for a file name, a file-name step that remembers the name in the
//! session context, and a prompt step that asks the model and writes the
//! fenced code it answers with. Failures in the later steps are reported as
//! chat text and keep the session where it is so the user can try again.

use std::sync::Arc;

use morph_rs::Message;
use morph_rs::error::MorphError;
use morph_rs::extract::extract_code_blocks;
use morph_rs::fsm::{Effect, Handler, HandlerFuture};
use morph_rs::transport::Action;
use tracing::{debug, info, warn};

use super::menu::MainMenu;
use super::{GENERATE_FILE_KEY, PATCH_FILE_KEY, Services};
use crate::prompt;

// ── Helpers ─────────────────────────────────────────────────────────

/// Refuse to start a workflow without an API key.
async fn require_api_key(
    services: &Services,
    action: &Action,
    ask: &str,
) -> Result<Effect, MorphError> {
    if services.config.has_api_key() {
        action.reply(ask).await?;
        Ok(Effect::Proceed)
    } else {
        info!(session = %action.session_id(), "Workflow refused, no API key configured");
        action.reply(prompt::CONFIGURE_KEY).await?;
        Ok(Effect::Stay)
    }
}

/// Ask the model, then write the selected code block over `file_name`.
///
/// Returns a note for the user when the reply did not hold exactly one
/// block. With no blocks the file is not touched.
async fn ask_and_write(
    services: &Services,
    file_name: &str,
    messages: &[Message],
) -> Result<Option<String>, MorphError> {
    let reply = services.exchange.exchange(messages).await?;
    debug!("llm> {reply}");

    let blocks = extract_code_blocks(&reply);
    let policy = services.config.block_policy;
    let note = match blocks.len() {
        0 => {
            warn!(file = %file_name, "Reply held no code block, nothing written");
            Some(prompt::no_blocks(file_name))
        }
        1 => None,
        n => {
            warn!(
                file = %file_name,
                blocks = n,
                policy = %policy,
                "Reply held several code blocks"
            );
            Some(prompt::several_blocks(n, policy))
        }
    };

    if let Some(body) = policy.select(&blocks) {
        services.persister.write(file_name, &body).await?;
    }
    Ok(note)
}

fn with_note(text: String, note: Option<String>) -> String {
    match note {
        Some(note) => format!("{text}\n{note}"),
        None => text,
    }
}

/// Report a failed step. The session stays put.
async fn report_failure(action: &Action, error: &MorphError) -> Result<Effect, MorphError> {
    warn!(session = %action.session_id(), error = %error, "Workflow step failed");
    action.reply(&prompt::processing_error(error)).await?;
    Ok(Effect::Stay)
}

/// The file name remembered under `key`. Reports its absence to the user.
async fn stored_file_name(action: &Action, key: &str) -> Result<Option<String>, MorphError> {
    match action.context().get(key) {
        Some(name) => Ok(Some(name)),
        None => {
            warn!(session = %action.session_id(), key, "No file name in session context");
            action
                .reply(&prompt::processing_error(&"no file name was given"))
                .await?;
            Ok(None)
        }
    }
}

// ── Generate ────────────────────────────────────────────────────────

/// `/generate`: ask for the file to create.
#[derive(Debug, Clone)]
pub struct GenerateEntry {
    services: Arc<Services>,
}

impl GenerateEntry {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

impl Handler for GenerateEntry {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            require_api_key(&self.services, &action, prompt::ASK_GENERATE_FILE).await
        })
    }
}

/// Remembers the file to create and asks for its description.
///
/// An empty name or one naming an existing directory is refused before any
/// model call, and the session stays at this step.
#[derive(Debug, Clone)]
pub struct GenerateFileName {
    services: Arc<Services>,
}

impl GenerateFileName {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

impl Handler for GenerateFileName {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            let file_name = action.text().to_string();
            if file_name.is_empty() {
                debug!(session = %action.session_id(), "Empty file name refused");
                action.reply(prompt::EMPTY_FILE_NAME).await?;
                return Ok(Effect::Stay);
            }
            if self.services.persister.is_directory(&file_name).await {
                debug!(session = %action.session_id(), file = %file_name, "Directory refused");
                action
                    .reply(&prompt::directory_file_name(&file_name))
                    .await?;
                return Ok(Effect::Stay);
            }
            action.context().add(GENERATE_FILE_KEY, file_name.as_str());
            action.reply(&prompt::will_create(&file_name)).await?;
            Ok(Effect::Proceed)
        })
    }
}

/// Sends the description to the model and writes the answer.
#[derive(Debug, Clone)]
pub struct GeneratePrompt {
    services: Arc<Services>,
}

impl GeneratePrompt {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

impl Handler for GeneratePrompt {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            let Some(file_name) = stored_file_name(&action, GENERATE_FILE_KEY).await? else {
                return Ok(Effect::Proceed);
            };

            let messages = prompt::generate_messages(action.text());
            match ask_and_write(&self.services, &file_name, &messages).await {
                Ok(note) => {
                    info!(session = %action.session_id(), file = %file_name, "Generated file");
                    action
                        .reply(&with_note(prompt::saved(&file_name), note))
                        .await?;
                    MainMenu::show(&action).await?;
                    Ok(Effect::Proceed)
                }
                Err(e) => report_failure(&action, &e).await,
            }
        })
    }
}

// ── Patch ───────────────────────────────────────────────────────────

/// `/patch`: ask for the file to change.
#[derive(Debug, Clone)]
pub struct PatchEntry {
    services: Arc<Services>,
}

impl PatchEntry {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

impl Handler for PatchEntry {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            require_api_key(&self.services, &action, prompt::ASK_PATCH_FILE).await
        })
    }
}

/// Loads the file to change and asks how to change it.
#[derive(Debug, Clone)]
pub struct PatchFileName {
    services: Arc<Services>,
}

impl PatchFileName {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

impl Handler for PatchFileName {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            let file_name = action.text().to_string();
            match self.services.persister.read(&file_name).await {
                Ok(contents) => {
                    debug!(file = %file_name, bytes = contents.len(), "Loaded file to patch");
                    action.context().add(PATCH_FILE_KEY, file_name.as_str());
                    action.reply(&prompt::loaded(&file_name)).await?;
                    Ok(Effect::Proceed)
                }
                Err(e) => report_failure(&action, &e.into()).await,
            }
        })
    }
}

/// Sends the current file and the requested change to the model and
/// overwrites the file with the answer.
#[derive(Debug, Clone)]
pub struct PatchPrompt {
    services: Arc<Services>,
}

impl PatchPrompt {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }

    async fn patch(
        &self,
        file_name: &str,
        description: &str,
    ) -> Result<Option<String>, MorphError> {
        let contents = self.services.persister.read(file_name).await?;
        let messages = prompt::patch_messages(file_name, &contents, description);
        ask_and_write(&self.services, file_name, &messages).await
    }
}

impl Handler for PatchPrompt {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            let Some(file_name) = stored_file_name(&action, PATCH_FILE_KEY).await? else {
                return Ok(Effect::Proceed);
            };

            match self.patch(&file_name, action.text()).await {
                Ok(note) => {
                    info!(session = %action.session_id(), file = %file_name, "Patched file");
                    action
                        .reply(&with_note(prompt::augmented(&file_name), note))
                        .await?;
                    MainMenu::show(&action).await?;
                    Ok(Effect::Proceed)
                }
                Err(e) => report_failure(&action, &e).await,
            }
        })
    }
}
