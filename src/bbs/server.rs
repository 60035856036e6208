//! TCP front end: accept loop and the per-connection task.
//!
//! Each accepted connection gets its own tokio task running
//! [`handle_connection`]. Commands on one connection are handled strictly in
//! order: a line is read, processed and its reply written before the next line
//! is read. All tasks share one [`BoardRegistry`] through the
//! [`CommandProcessor`].
use anyhow::{anyhow, Result};
use futures_util::StreamExt;
use log::{debug, info, warn};
use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio_util::codec::{FramedRead, LinesCodec, LinesCodecError};

use super::commands::CommandProcessor;
use super::session::Session;
use crate::board::BoardRegistry;
use crate::config::Config;
use crate::logutil::escape_log;
use crate::metrics;

/// Line terminator for every reply.
pub const CRLF: &str = "\r\n";
pub const LINE_TOO_LONG: &str = "Error: Line too long.";
pub const SESSION_TIMED_OUT: &str = "Session timed out.";

/// Per-connection behavior derived from [`Config`].
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub welcome_message: String,
    pub idle_timeout: Option<Duration>,
    pub max_line_length: usize,
    pub release_on_disconnect: bool,
}

impl From<&Config> for ConnectionSettings {
    fn from(config: &Config) -> Self {
        let idle_timeout = match config.bbs.session_timeout {
            0 => None,
            m => Some(Duration::from_secs(u64::from(m) * 60)),
        };
        ConnectionSettings {
            welcome_message: config.bbs.welcome_message.clone(),
            idle_timeout,
            max_line_length: config.network.max_line_length,
            release_on_disconnect: config.bbs.release_on_disconnect,
        }
    }
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        ConnectionSettings::from(&Config::default())
    }
}

/// Owns a session for the life of its connection and releases it on drop,
/// whichever way the connection ends (including unwinding).
struct SessionScope {
    processor: CommandProcessor,
    session: Session,
    release: bool,
}

impl SessionScope {
    fn open(processor: CommandProcessor, session: Session, release: bool) -> Self {
        let active = metrics::record_connection_opened();
        info!(
            "Session {} opened for {} ({} active)",
            session.id,
            escape_log(&session.peer),
            active
        );
        SessionScope {
            processor,
            session,
            release,
        }
    }
}

impl Drop for SessionScope {
    fn drop(&mut self) {
        if self.release {
            self.processor.release_session(&self.session);
        }
        let active = metrics::record_connection_closed();
        info!(
            "Session {} closed for {} after {}s ({} active)",
            self.session.id,
            escape_log(&self.session.peer),
            self.session.session_duration().num_seconds(),
            active
        );
    }
}

async fn write_line<W>(writer: &mut W, text: &str) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(text.as_bytes()).await?;
    writer.write_all(CRLF.as_bytes()).await?;
    writer.flush().await
}

/// Serve one connection until `%exit`, EOF, idle timeout or a transport error.
///
/// The session is released exactly once when this future completes or is dropped.
pub async fn handle_connection<S>(
    stream: S,
    session: Session,
    processor: CommandProcessor,
    settings: ConnectionSettings,
) -> Result<()>
where
    S: AsyncRead + AsyncWrite,
{
    let mut scope = SessionScope::open(processor, session, settings.release_on_disconnect);
    let (reader, mut writer) = tokio::io::split(stream);
    let mut lines = FramedRead::new(reader, LinesCodec::new_with_max_length(settings.max_line_length));

    if !settings.welcome_message.is_empty() {
        write_line(&mut writer, &settings.welcome_message).await?;
    }

    loop {
        let next = match settings.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, lines.next()).await {
                Ok(next) => next,
                Err(_) => {
                    info!("Session {}: idle timeout", scope.session.id);
                    let _ = write_line(&mut writer, SESSION_TIMED_OUT).await;
                    break;
                }
            },
            None => lines.next().await,
        };

        let line = match next {
            Some(Ok(line)) => line,
            None => {
                debug!("Session {}: peer closed the connection", scope.session.id);
                break;
            }
            Some(Err(LinesCodecError::MaxLineLengthExceeded)) => {
                // The framed reader ends after any decode error
                warn!(
                    "Session {}: line exceeded {} bytes",
                    scope.session.id, settings.max_line_length
                );
                let _ = write_line(&mut writer, LINE_TOO_LONG).await;
                break;
            }
            Some(Err(LinesCodecError::Io(e))) => {
                warn!("Session {}: read error: {}", scope.session.id, e);
                return Err(e.into());
            }
        };

        let Some(reply) = scope.processor.process_line(&mut scope.session, &line) else {
            continue;
        };
        if let Err(e) = write_line(&mut writer, &reply.text).await {
            warn!("Session {}: write error: {}", scope.session.id, e);
            return Err(e.into());
        }
        if reply.close {
            break;
        }
    }

    let _ = writer.shutdown().await;
    Ok(())
}

/// One line per board with its joined-user and post counts.
fn board_summary(registry: &BoardRegistry) -> Vec<String> {
    let public = registry.public();
    let mut lines = vec![format!(
        "Public: {} user(s), {} post(s)",
        public.user_count(),
        public.post_count()
    )];
    lines.extend(registry.groups().iter().map(|g| {
        format!(
            "ID: {}, Name: {}: {} user(s), {} post(s)",
            g.id,
            g.name,
            g.board.user_count(),
            g.board.post_count()
        )
    }));
    lines
}

/// # Board Server
///
/// Owns the listener and the shared [`BoardRegistry`] and spawns one task per
/// accepted connection.
///
/// ```rust,no_run
/// use boardd::bbs::BbsServer;
/// use boardd::config::Config;
///
/// #[tokio::main]
/// async fn main() -> anyhow::Result<()> {
///     let mut server = BbsServer::new(Config::default()).await?;
///     server.run().await
/// }
/// ```
pub struct BbsServer {
    config: Config,
    processor: CommandProcessor,
    settings: ConnectionSettings,
    listener: Option<TcpListener>,
    next_session_id: u64,
}

impl BbsServer {
    /// Validate `config` and build the boards it describes.
    pub async fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let registry = Arc::new(BoardRegistry::new(config.group_pairs()));
        info!(
            "Board '{}' configured with {} group(s)",
            config.bbs.name,
            registry.groups().len()
        );
        let settings = ConnectionSettings::from(&config);
        Ok(BbsServer {
            config,
            processor: CommandProcessor::new(registry),
            settings,
            listener: None,
            next_session_id: 0,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn processor(&self) -> &CommandProcessor {
        &self.processor
    }

    /// Bind the configured address and return the actual local address.
    pub async fn bind(&mut self) -> Result<SocketAddr> {
        let addr = self.config.listen_addr();
        let listener = TcpListener::bind(&addr)
            .await
            .map_err(|e| anyhow!("Failed to bind {}: {}", addr, e))?;
        let local = listener.local_addr()?;
        info!("Listening on {}", local);
        self.listener = Some(listener);
        Ok(local)
    }

    /// Run until Ctrl-C.
    pub async fn run(&mut self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Unable to listen for shutdown signal: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await
    }

    /// Accept connections until `shutdown` resolves. Binds first if needed.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        if self.listener.is_none() {
            self.bind().await?;
        }
        let listener = self
            .listener
            .take()
            .ok_or_else(|| anyhow!("listener not bound"))?;
        info!("BBS '{}' accepting connections", self.config.bbs.name);

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                accepted = listener.accept() => match accepted {
                    Ok((stream, peer)) => self.spawn_connection(stream, peer),
                    Err(e) => {
                        warn!("Accept error: {}", e);
                        tokio::time::sleep(Duration::from_millis(100)).await;
                    }
                },
                _ = &mut shutdown => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        self.shutdown();
        Ok(())
    }

    fn spawn_connection(&mut self, stream: TcpStream, peer: SocketAddr) {
        self.next_session_id += 1;
        let session = Session::new(self.next_session_id.to_string(), peer.to_string());
        let processor = self.processor.clone();
        let settings = self.settings.clone();
        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, session, processor, settings).await {
                warn!("Connection {} ended with error: {}", peer, e);
            }
        });
    }

    fn shutdown(&mut self) {
        let c = metrics::snapshot();
        info!(
            "BBS shutdown: accepted={} active={} peak={} commands={} unknown={} posts={} errors={}",
            c.connections_accepted,
            c.connections_active,
            c.connections_peak,
            c.commands_processed,
            c.unknown_commands,
            c.posts_created,
            c.error_replies
        );
        for line in board_summary(self.processor.registry()) {
            info!("{}", line);
        }
    }

    pub async fn show_status(&self) -> Result<()> {
        println!("=== {} Status ===", self.config.bbs.name);
        println!("Listen Address: {}", self.config.listen_addr());
        println!(
            "Idle Timeout: {}",
            match self.config.bbs.session_timeout {
                0 => "disabled".to_string(),
                m => format!("{} min", m),
            }
        );
        println!("Boards:");
        for line in board_summary(self.processor.registry()) {
            println!("  {}", line);
        }
        println!("Counters: {}", serde_json::to_string(&metrics::snapshot())?);
        Ok(())
    }
}
