//! Line-oriented agent: one line of text in, one JSON reply line out, until input ends.
//!
//! Turns run strictly one at a time; the outbound synthesis call blocks the loop while in
//! flight. Synthesis failures are handled by the agent's [`FailurePolicy`]; anything that
//! escapes a turn is reported as a single error line and ends the loop.

use crate::config::FailurePolicy;
use crate::relay::{Relay, RelayError, Reply};
use crate::session::Conversation;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Lines};

/// How much of each outgoing line is echoed to the log.
const LOG_PREVIEW_CHARS: usize = 100;

pub struct Agent {
    relay: Relay,
    policy: FailurePolicy,
    history: Conversation,
}

impl Agent {
    pub fn new(relay: Relay, policy: FailurePolicy) -> Self {
        log::info!("agent initialized (on synthesis failure: {:?})", policy);
        Self {
            relay,
            policy,
            history: Conversation::new(),
        }
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    /// Run one turn: record the input, relay it, record the reply text.
    pub async fn process_input(&mut self, input: &str) -> Result<Reply, RelayError> {
        log::info!("processing input: {}", input);
        self.history.push_user(input);
        let reply = self.relay.respond(input, self.policy).await?;
        self.history.push_assistant(reply.text.clone());
        log::info!("response text length: {}", reply.text.len());
        if let Some(ref audio) = reply.audio {
            log::info!("audio response length: {}", audio.len());
        }
        Ok(reply)
    }

    /// Read lines from `reader` and write one JSON reply per line to `writer` until the
    /// reader is exhausted. On error, writes `{"text": "Error: ...", "audio": null}` and
    /// returns the error without reading further.
    pub async fn run<R, W>(&mut self, reader: R, writer: &mut W) -> Result<(), RelayError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        log::info!("starting agent loop");
        let mut lines = reader.lines();
        loop {
            match self.step(&mut lines, writer).await {
                Ok(true) => {}
                Ok(false) => {
                    log::info!("input closed, exiting");
                    return Ok(());
                }
                Err(e) => {
                    log::error!("agent loop error: {}", e);
                    write_error_line(writer, &e).await;
                    return Err(e);
                }
            }
        }
    }

    /// Agent loop over process stdin/stdout.
    pub async fn run_stdio(&mut self) -> Result<(), RelayError> {
        let stdin = BufReader::new(tokio::io::stdin());
        let mut stdout = tokio::io::stdout();
        self.run(stdin, &mut stdout).await
    }

    /// Returns false at end of input.
    async fn step<R, W>(&mut self, lines: &mut Lines<R>, writer: &mut W) -> Result<bool, RelayError>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        log::debug!("waiting for input");
        let Some(line) = lines.next_line().await? else {
            return Ok(false);
        };
        let reply = self.process_input(line.trim_end()).await?;
        let out = serde_json::to_string(&reply)?;
        log::info!("sending response: {}", preview(&out));
        writer.write_all(out.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
        Ok(true)
    }
}

fn preview(s: &str) -> String {
    match s.char_indices().nth(LOG_PREVIEW_CHARS) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_string(),
    }
}

/// Best effort: write failures here are only logged.
async fn write_error_line<W: AsyncWrite + Unpin>(writer: &mut W, err: &RelayError) {
    let line = serde_json::json!({
        "text": format!("Error: {}", err),
        "audio": null,
    })
    .to_string();
    let written = async {
        writer.write_all(line.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await
    };
    if let Err(e) = written.await {
        log::debug!("could not write error line: {}", e);
    }
}
