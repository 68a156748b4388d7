//! Minimal bot example: a two-state graph that turns one prompt into a file.
//!
//! `/ask` moves the session to a prompt state; the next line is sent to the
//! model and the last fenced code block of the answer is written to
//! `answer.txt` in the current directory.
//!
//! # Usage
//!
//! ```bash
//! OPENAI_API_KEY=sk-... cargo run --example echo_bot
//! ```

use std::sync::Arc;

use morph_rs::prelude::*;

#[tokio::main]
async fn main() -> Result<(), MorphError> {
    // 1. Create the gateway client and the exchange around it.
    let api_key = std::env::var("OPENAI_API_KEY").unwrap_or_default();
    let exchange = LlmExchange::new(Arc::new(OpenAiClient::new(api_key)?));
    let persister = FilePersister::default();

    // 2. Register the handler the prompt edge runs.
    let handlers = HandlerRegistry::new().with(
        "answer",
        FnHandler::new(move |action: Action| {
            let exchange = exchange.clone();
            let persister = persister.clone();
            async move {
                let reply = exchange.exchange(&[Message::user(action.text())]).await?;
                let blocks = extract_code_blocks(&reply);
                match BlockPolicy::Last.select(&blocks) {
                    Some(body) => {
                        let path = persister.write("answer.txt", &body).await?;
                        action.reply(&format!("wrote {}", path.display())).await?;
                    }
                    None => action.reply(&reply).await?,
                }
                Ok(Effect::Proceed)
            }
        }),
    );

    // 3. Lay out the graph.
    let machine = StateMachine::builder("/start")
        .edge("/start", "/prompt", Trigger::literal("/ask"))
        .edge_with("/prompt", "/start", Trigger::any(), "answer")
        .build(handlers)?;

    // 4. Drive one session and print what the bot said.
    let transport = Arc::new(BufferTransport::new());
    let sessions = SessionManager::new(machine, transport.clone());
    sessions.dispatch("demo", "/ask").await?;
    sessions
        .dispatch("demo", "Write a haiku about borrow checking in a ```text block.")
        .await?;

    for reply in transport.replies("demo") {
        println!("{reply}");
    }
    Ok(())
}
