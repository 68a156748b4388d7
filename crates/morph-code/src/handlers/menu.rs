//! Menu, help, settings and the other command handlers that do not touch
//! files.

use std::sync::Arc;

use morph_rs::fsm::{Effect, Handler, HandlerFuture};
use morph_rs::transport::Action;
use tracing::{info, warn};

use super::Services;
use crate::prompt;

/// Welcome text with the main menu buttons.
#[derive(Debug, Clone, Copy, Default)]
pub struct MainMenu;

impl MainMenu {
    pub(crate) async fn show(action: &Action) -> Result<(), morph_rs::error::TransportError> {
        action
            .reply_menu(prompt::MAIN_MENU_TEXT, &prompt::main_menu())
            .await
    }
}

impl Handler for MainMenu {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            Self::show(&action).await?;
            Ok(Effect::Proceed)
        })
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct Help;

impl Handler for Help {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            action.reply(prompt::HELP_TEXT).await?;
            Ok(Effect::Proceed)
        })
    }
}

/// Sends the Graphviz source of the graph the action was routed through.
#[derive(Debug, Clone, Copy, Default)]
pub struct ShowGraph;

impl Handler for ShowGraph {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            let dot = action.graph().to_dot();
            action.reply(&prompt::graph_text(&dot)).await?;
            Ok(Effect::Proceed)
        })
    }
}

/// Shows the configured keys and how to obtain the missing ones.
#[derive(Debug, Clone)]
pub struct Settings {
    services: Arc<Services>,
}

impl Settings {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

impl Handler for Settings {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            let text = prompt::settings_text(
                &self.services.config,
                self.services.claude_authenticated(),
            );
            action.reply_menu(&text, &prompt::settings_menu()).await?;
            Ok(Effect::Proceed)
        })
    }
}

/// Asks the credential provider for a Claude session.
#[derive(Debug, Clone)]
pub struct AuthenticateClaude {
    services: Arc<Services>,
}

impl AuthenticateClaude {
    pub fn new(services: Arc<Services>) -> Self {
        Self { services }
    }
}

impl Handler for AuthenticateClaude {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            match self.services.credentials.authenticate().await {
                Ok(credential) => {
                    info!(session = %action.session_id(), "Claude API authenticated");
                    self.services.set_claude_session(credential);
                    action.reply(&prompt::authenticated()).await?;
                }
                Err(e) => {
                    warn!(
                        session = %action.session_id(),
                        error = %e,
                        "Claude authentication failed"
                    );
                    action.reply(&prompt::authentication_failed(&e)).await?;
                }
            }
            Ok(Effect::Proceed)
        })
    }
}

/// Says goodbye and asks the driver to stop.
#[derive(Debug, Clone, Copy, Default)]
pub struct Exit;

impl Handler for Exit {
    fn handle(&self, action: Action) -> HandlerFuture<'_> {
        Box::pin(async move {
            action.reply(prompt::GOODBYE).await?;
            Ok(Effect::Exit)
        })
    }
}
