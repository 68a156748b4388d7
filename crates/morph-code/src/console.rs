//! Terminal transport: every reply goes to one writer, stdout by default.

use morph_rs::error::TransportError;
use morph_rs::transport::{SendFuture, Transport};
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};
use tokio::sync::Mutex;

/// Writes replies, one block per reply followed by a blank line.
///
/// Menus use the default bracketed rendering of [`Transport::send_menu`].
#[derive(Debug)]
pub struct ConsoleTransport<W = Stdout> {
    out: Mutex<W>,
}

impl ConsoleTransport<Stdout> {
    pub fn stdout() -> Self {
        Self::new(tokio::io::stdout())
    }
}

impl<W> ConsoleTransport<W> {
    pub fn new(out: W) -> Self {
        Self {
            out: Mutex::new(out),
        }
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner()
    }
}

impl<W: AsyncWrite + Unpin + Send> Transport for ConsoleTransport<W> {
    fn send<'a>(&'a self, session_id: &'a str, text: &'a str) -> SendFuture<'a> {
        Box::pin(async move {
            let fail = |e: std::io::Error| TransportError {
                session_id: session_id.to_string(),
                message: e.to_string(),
            };
            let mut out = self.out.lock().await;
            out.write_all(text.trim_end().as_bytes()).await.map_err(fail)?;
            out.write_all(b"\n\n").await.map_err(fail)?;
            out.flush().await.map_err(fail)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use morph_rs::transport::Menu;

    #[tokio::test]
    async fn replies_are_separated_by_blank_lines() {
        let console = ConsoleTransport::new(Vec::new());
        console.send("console", "mrph> one\n").await.unwrap();
        console.send("console", "mrph> two").await.unwrap();
        let written = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(written, "mrph> one\n\nmrph> two\n\n");
    }

    #[tokio::test]
    async fn menus_are_rendered_after_text() {
        let console = ConsoleTransport::new(Vec::new());
        let menu = Menu::row(["Start", "Exit"]);
        console.send_menu("console", "mrph> pick\n", &menu).await.unwrap();
        let written = String::from_utf8(console.into_inner()).unwrap();
        assert_eq!(written, "mrph> pick\n[Start] [Exit]\n\n");
    }
}
