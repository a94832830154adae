//! Command sources for the interactive session mode.
//!
//! The session driver is decoupled from where commands come from: a human at
//! a prompt, a fixed script, or anything else implementing `CommandSource`.

use std::collections::VecDeque;
use std::io;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

/// Supplies the next outbound command, or `None` at end of input.
#[async_trait]
pub trait CommandSource: Send {
    async fn next_command(&mut self) -> io::Result<Option<String>>;
}

/// Interactive prompt over standard input.
pub struct StdinSource {
    lines: tokio::io::Lines<BufReader<tokio::io::Stdin>>,
    stdout: tokio::io::Stdout,
}

impl StdinSource {
    pub fn new() -> Self {
        Self {
            lines: BufReader::new(tokio::io::stdin()).lines(),
            stdout: tokio::io::stdout(),
        }
    }
}

impl Default for StdinSource {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl CommandSource for StdinSource {
    async fn next_command(&mut self) -> io::Result<Option<String>> {
        self.stdout.write_all(b"> ").await?;
        self.stdout.flush().await?;
        self.lines.next_line().await
    }
}

/// Fixed command list, yielded in order.
pub struct ScriptSource {
    commands: VecDeque<String>,
}

impl ScriptSource {
    pub fn new(commands: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            commands: commands.into_iter().map(Into::into).collect(),
        }
    }
}

#[async_trait]
impl CommandSource for ScriptSource {
    async fn next_command(&mut self) -> io::Result<Option<String>> {
        Ok(self.commands.pop_front())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn script_source_yields_in_order_then_ends() {
        let mut source = ScriptSource::new(["boardsize 9", "genmove b", "quit"]);
        assert_eq!(
            source.next_command().await.unwrap().as_deref(),
            Some("boardsize 9")
        );
        assert_eq!(
            source.next_command().await.unwrap().as_deref(),
            Some("genmove b")
        );
        assert_eq!(source.next_command().await.unwrap().as_deref(), Some("quit"));
        assert_eq!(source.next_command().await.unwrap(), None);
    }
}
