//! Control port client for the anonymizing proxy
//!
//! Speaks the line-oriented control protocol used by Tor-style proxies:
//! authenticate, ask for a new circuit with `SIGNAL NEWNYM`, then quit.
//! Only the reply status codes are interpreted; the proxy does not report
//! which path it switched to.

use crate::config::AnonymizerConfig;
use crate::{Result, VeilError};
use async_trait::async_trait;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

/// Status code for a successful control command
const STATUS_OK: u16 = 250;

/// Status code returned when authentication fails
const STATUS_AUTH_REJECTED: u16 = 515;

/// Anything that can move subsequent traffic onto a new network path
#[async_trait]
pub trait IdentityRenewer: Send + Sync {
    /// Requests a new identity from the anonymizing service
    async fn renew_identity(&self) -> Result<()>;
}

/// A parsed control port reply
#[derive(Debug, Clone, PartialEq, Eq)]
struct ControlReply {
    /// Three digit status code of the final line
    code: u16,

    /// Text of every reply line, without status codes
    lines: Vec<String>,
}

impl ControlReply {
    fn is_ok(&self) -> bool {
        self.code == STATUS_OK
    }

    /// The reply text joined into one message
    fn message(&self) -> String {
        self.lines.join("; ")
    }
}

/// Client for the proxy's control service
#[derive(Debug, Clone)]
pub struct ControlPort {
    host: String,
    port: u16,
    credential: Option<String>,
    timeout: Duration,
}

impl ControlPort {
    pub fn new(
        host: impl Into<String>,
        port: u16,
        credential: Option<String>,
        timeout: Duration,
    ) -> Self {
        Self {
            host: host.into(),
            port,
            credential,
            timeout,
        }
    }

    /// Creates a control port client from the `[anonymizer]` section
    pub fn from_config(config: &AnonymizerConfig) -> Self {
        Self::new(
            config.control_host.clone(),
            config.control_port,
            config.credential.clone(),
            Duration::from_secs(config.control_timeout),
        )
    }

    /// `host:port` of the control service
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Runs the whole authenticate / signal / quit exchange
    async fn request_new_identity(&self) -> Result<()> {
        let stream = TcpStream::connect((self.host.as_str(), self.port))
            .await
            .map_err(|e| {
                VeilError::ControlChannel(format!(
                    "cannot reach control port {}: {}",
                    self.address(),
                    e
                ))
            })?;

        let (reader, mut writer) = stream.into_split();
        let mut reader = BufReader::new(reader);

        let auth = authenticate_command(self.credential.as_deref());
        let reply = send_command(&mut reader, &mut writer, &auth).await?;
        match reply.code {
            STATUS_OK => {}
            STATUS_AUTH_REJECTED => return Err(VeilError::Authentication(reply.message())),
            code => {
                return Err(VeilError::ControlChannel(format!(
                    "unexpected reply to AUTHENTICATE: {} {}",
                    code,
                    reply.message()
                )))
            }
        }

        let reply = send_command(&mut reader, &mut writer, "SIGNAL NEWNYM").await?;
        if !reply.is_ok() {
            return Err(VeilError::ControlChannel(format!(
                "unexpected reply to SIGNAL NEWNYM: {} {}",
                reply.code,
                reply.message()
            )));
        }

        if let Err(e) = send_command(&mut reader, &mut writer, "QUIT").await {
            tracing::debug!("Control port QUIT failed: {}", e);
        }

        Ok(())
    }
}

#[async_trait]
impl IdentityRenewer for ControlPort {
    async fn renew_identity(&self) -> Result<()> {
        tracing::debug!("Requesting new identity via {}", self.address());

        tokio::time::timeout(self.timeout, self.request_new_identity())
            .await
            .map_err(|_| {
                VeilError::ControlChannel(format!(
                    "control port {} timed out after {:?}",
                    self.address(),
                    self.timeout
                ))
            })??;

        tracing::info!("New identity acknowledged by {}", self.address());
        Ok(())
    }
}

/// Builds the AUTHENTICATE command, quoting the credential if present.
/// Line breaks are escaped so the credential always stays on one line.
fn authenticate_command(credential: Option<&str>) -> String {
    match credential {
        Some(secret) => format!("AUTHENTICATE \"{}\"", quote_credential(secret)),
        None => "AUTHENTICATE".to_string(),
    }
}

fn quote_credential(secret: &str) -> String {
    let mut quoted = String::with_capacity(secret.len());
    for c in secret.chars() {
        match c {
            '\\' => quoted.push_str("\\\\"),
            '"' => quoted.push_str("\\\""),
            '\r' => quoted.push_str("\\r"),
            '\n' => quoted.push_str("\\n"),
            c => quoted.push(c),
        }
    }
    quoted
}

/// Writes one command line and reads its reply
async fn send_command<R, W>(
    reader: &mut R,
    writer: &mut W,
    command: &str,
) -> Result<ControlReply>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    writer
        .write_all(format!("{}\r\n", command).as_bytes())
        .await
        .map_err(|e| VeilError::ControlChannel(format!("write failed: {}", e)))?;
    writer
        .flush()
        .await
        .map_err(|e| VeilError::ControlChannel(format!("write failed: {}", e)))?;

    read_reply(reader).await
}

/// Reads a complete reply: continuation lines (`250-`), data blocks (`250+`
/// terminated by a lone `.`), and the final line (`250 `)
async fn read_reply<R>(reader: &mut R) -> Result<ControlReply>
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = Vec::new();

    loop {
        let line = read_line(reader).await?;

        let code: u16 = line
            .get(..3)
            .and_then(|status| status.parse().ok())
            .ok_or_else(|| {
                VeilError::ControlChannel(format!("malformed reply line: {:?}", line))
            })?;
        let separator = line.as_bytes().get(3).copied().unwrap_or(b' ');
        let text = line.get(4..).unwrap_or("").to_string();

        match separator {
            b' ' => {
                lines.push(text);
                return Ok(ControlReply { code, lines });
            }
            b'-' => lines.push(text),
            b'+' => {
                lines.push(text);
                // Data block runs until a line holding a single dot
                loop {
                    let data = read_line(reader).await?;
                    if data == "." {
                        break;
                    }
                    lines.push(data);
                }
            }
            other => {
                return Err(VeilError::ControlChannel(format!(
                    "unexpected reply separator {:?} in {:?}",
                    other as char, line
                )))
            }
        }
    }
}

/// Reads one CRLF-terminated line; EOF is an error
async fn read_line<R>(reader: &mut R) -> Result<String>
where
    R: AsyncBufRead + Unpin,
{
    let mut line = String::new();
    let read = reader
        .read_line(&mut line)
        .await
        .map_err(|e| VeilError::ControlChannel(format!("read failed: {}", e)))?;

    if read == 0 {
        return Err(VeilError::ControlChannel(
            "control port closed the connection".to_string(),
        ));
    }

    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}
