//! Chat transport: inbound events, reply formatting and the console link.
//!
//! The console transport reads one message per stdin line in the form
//! `<user>: <text>`; a leading `#` (`#alice: hi`) marks a message posted on
//! the public channel. Outgoing messages are printed as `[public] ...` or
//! `[@user] ...`.

use anyhow::Result;
use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::sync::mpsc;

pub use crate::game::OutgoingMessage;
use crate::logutil::escape_log;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Channel {
    Public,
    Direct,
}

/// One chat message received by the bot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatEvent {
    pub author_id: String,
    pub author_name: String,
    pub channel: Channel,
    pub content: String,
}

impl ChatEvent {
    pub fn direct(author: &str, content: &str) -> Self {
        Self {
            author_id: author.to_string(),
            author_name: author.to_string(),
            channel: Channel::Direct,
            content: content.to_string(),
        }
    }
}

/// Wrap `content` in a fenced code block when `code_blocks` is set.
pub fn format_reply(content: &str, code_blocks: bool) -> String {
    if code_blocks {
        format!("```\n{}\n```", content)
    } else {
        content.to_string()
    }
}

/// Parse a console line. Blank lines and lines without `user:` yield `None`.
pub fn parse_console_line(line: &str) -> Option<ChatEvent> {
    let line = line.trim();
    let (channel, line) = match line.strip_prefix('#') {
        Some(rest) => (Channel::Public, rest),
        None => (Channel::Direct, line),
    };
    let (author, content) = line.split_once(':')?;
    let author = author.trim();
    let content = content.trim();
    if author.is_empty() || content.is_empty() {
        return None;
    }
    Some(ChatEvent {
        author_id: author.to_string(),
        author_name: author.to_string(),
        channel,
        content: content.to_string(),
    })
}

/// Reads stdin and forwards parsed lines to the server.
pub struct ConsoleReader {
    tx: mpsc::UnboundedSender<ChatEvent>,
}

impl ConsoleReader {
    pub fn new(tx: mpsc::UnboundedSender<ChatEvent>) -> Self {
        Self { tx }
    }

    pub async fn run(self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        while let Some(line) = lines.next_line().await? {
            match parse_console_line(&line) {
                Some(event) => {
                    if self.tx.send(event).is_err() {
                        debug!("Server gone; console reader stopping");
                        break;
                    }
                }
                None if !line.trim().is_empty() => {
                    warn!("Ignoring console line '{}': expected 'user: message'", escape_log(&line));
                }
                None => {}
            }
        }
        info!("Console input closed");
        Ok(())
    }
}

/// Prints outgoing messages to stdout.
pub struct ConsoleWriter {
    rx: mpsc::UnboundedReceiver<OutgoingMessage>,
}

impl ConsoleWriter {
    pub fn new(rx: mpsc::UnboundedReceiver<OutgoingMessage>) -> Self {
        Self { rx }
    }

    pub async fn run(mut self) -> Result<()> {
        let mut stdout = tokio::io::stdout();
        while let Some(msg) = self.rx.recv().await {
            let target = match &msg.to {
                Some(user) => format!("@{}", user),
                None => "public".to_string(),
            };
            stdout
                .write_all(format!("[{}] {}\n", target, msg.content).as_bytes())
                .await?;
            stdout.flush().await?;
        }
        Ok(())
    }
}
