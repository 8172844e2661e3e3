// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Jesof

//! Low-level RouterOS API connection handling

mod auth;
mod parse;
mod protocol;

use std::collections::HashMap;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;

use crate::error::{AppError, Result};

pub(crate) use parse::{
    parse_dhcp_leases, parse_firewall_rules, parse_interface_stats, parse_interfaces,
    parse_log_entries, parse_qos_rules, parse_system_info, parse_system_resources,
    parse_traffic_flows, parse_vpn_tunnels,
};
pub use protocol::{encode_length, encode_sentence};
use protocol::read_sentence;

/// Attributes of one `!re` reply
pub(crate) type Sentence = HashMap<String, String>;

/// Connection timeout (5 seconds)
const CONNECTION_TIMEOUT: Duration = Duration::from_secs(5);

/// Read operation timeout (30 seconds)
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Low-level RouterOS API connection
pub(crate) struct RouterOsConnection {
    stream: TcpStream,
}

impl RouterOsConnection {
    pub(crate) async fn connect(addr: &str) -> Result<Self> {
        tracing::trace!("Attempting TCP connection to: {}", addr);
        let stream = timeout(CONNECTION_TIMEOUT, TcpStream::connect(addr))
            .await
            .map_err(|_| AppError::Timeout(format!("Connecting to {addr} took longer than 5s")))??;
        stream.set_nodelay(true)?;
        tracing::trace!("TCP connection established to: {}", addr);
        Ok(Self { stream })
    }

    /// Runs a command and collects its `!re` replies
    pub(crate) async fn command(&mut self, path: &str, args: &[String]) -> Result<Vec<Sentence>> {
        let mut words: Vec<String> = Vec::with_capacity(1 + args.len());
        words.push(path.to_string());
        words.extend(args.iter().cloned());
        self.raw_command(&words).await
    }

    async fn raw_command(&mut self, words: &[String]) -> Result<Vec<Sentence>> {
        if let Some(path) = words.first() {
            tracing::trace!("Sending command: {}", path);
        }
        self.stream.write_all(&encode_sentence(words)).await?;
        self.read_reply().await
    }

    /// Reads sentences until `!done`
    ///
    /// A `!trap` is reported only after `!done` has been consumed, leaving the
    /// stream aligned for the next command. Attributes on `!done` itself (the
    /// legacy login challenge) are returned as a final sentence.
    async fn read_reply(&mut self) -> Result<Vec<Sentence>> {
        let stream = &mut self.stream;
        timeout(READ_TIMEOUT, async move {
            let mut sentences: Vec<Sentence> = Vec::new();
            let mut trap: Option<String> = None;
            loop {
                let words = read_sentence(stream).await?;
                let (reply, attrs) = split_reply(&words);
                match reply {
                    "!re" => sentences.push(attrs),
                    "!done" => {
                        if !attrs.is_empty() {
                            sentences.push(attrs);
                        }
                        break;
                    }
                    "!trap" => {
                        let msg = attrs
                            .get("message")
                            .cloned()
                            .unwrap_or_else(|| "trap".to_string());
                        tracing::trace!("Trap received: {}", msg);
                        trap.get_or_insert(msg);
                    }
                    "!fatal" => {
                        let msg = words.get(1).cloned().unwrap_or_else(|| "fatal".to_string());
                        return Err(AppError::NotConnected(format!("RouterOS fatal: {msg}")));
                    }
                    other => {
                        tracing::trace!("Ignoring unexpected reply word: {}", other);
                    }
                }
            }
            tracing::trace!("Command complete, {} sentences received", sentences.len());
            match trap {
                Some(msg) => Err(AppError::RouterOs(msg)),
                None => Ok(sentences),
            }
        })
        .await
        .map_err(|_| AppError::Timeout("RouterOS did not respond within 30 seconds".to_string()))?
    }

    /// Closes the session politely; errors are irrelevant at this point
    pub(crate) async fn close(mut self) {
        let _ = self.stream.write_all(&encode_sentence(&["/quit"])).await;
        let _ = self.stream.shutdown().await;
    }
}

/// Splits a sentence into its reply word and `=key=value` attributes
fn split_reply(words: &[String]) -> (&str, Sentence) {
    let reply = words.first().map_or("", String::as_str);
    let mut attrs = HashMap::new();
    for word in words.iter().skip(1) {
        if let Some(stripped) = word.strip_prefix('=') {
            if let Some((k, v)) = stripped.split_once('=') {
                attrs.insert(k.to_string(), v.to_string());
            }
        }
        // .tag and API attributes are ignored
    }
    (reply, attrs)
}
