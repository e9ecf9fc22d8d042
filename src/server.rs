use std::{
    fs, io,
    os::unix::fs::FileTypeExt,
    path::{Path, PathBuf},
    sync::Arc,
    time::Duration,
};

use anyhow::{Context, Result, bail};
use tokio::{
    io::{AsyncBufReadExt, AsyncWriteExt, BufReader},
    net::{UnixListener, UnixStream},
    signal::unix::{SignalKind, signal},
    sync::mpsc,
};
use tokio_util::sync::CancellationToken;

use crate::{
    config::ServerConfig,
    protocol::{ClientMessage, ServerMessage, encode_server_message, parse_client_message},
    selection::{DefaultActionSelector, RequestContext},
};

#[derive(Debug, Clone, Copy)]
enum StopCause {
    ExitRequested,
    Signal(&'static str),
}

/// Serves NDJSON selection requests on a Unix socket until SIGINT, SIGTERM
/// or an `exit` message arrives. In-flight selections are cancelled on stop.
pub async fn run(config: &ServerConfig, selector: Arc<DefaultActionSelector>) -> Result<()> {
    let socket = SocketFile::claim(&config.socket_path)?;
    let listener = UnixListener::bind(socket.path())
        .with_context(|| format!("unable to listen on {}", socket.path().display()))?;

    let mut interrupt = signal(SignalKind::interrupt()).context("SIGINT handler")?;
    let mut terminate = signal(SignalKind::terminate()).context("SIGTERM handler")?;
    let (exit_tx, mut exit_rx) = mpsc::unbounded_channel::<()>();
    let shutdown = CancellationToken::new();
    let selection_timeout = Duration::from_millis(config.selection_timeout_ms.max(1));

    tracing::info!(
        target: "server",
        socket_path = %socket.path().display(),
        selection_timeout_ms = config.selection_timeout_ms,
        "server_listening"
    );

    let cause = loop {
        tokio::select! {
            _ = interrupt.recv() => break StopCause::Signal("SIGINT"),
            _ = terminate.recv() => break StopCause::Signal("SIGTERM"),
            Some(()) = exit_rx.recv() => break StopCause::ExitRequested,
            accepted = listener.accept() => match accepted {
                Ok((stream, _)) => {
                    let session = ClientSession {
                        selector: Arc::clone(&selector),
                        selection_timeout,
                        shutdown: shutdown.child_token(),
                        exit_tx: exit_tx.clone(),
                    };
                    tokio::spawn(async move {
                        if let Err(err) = session.serve(stream).await {
                            tracing::warn!(target: "server", error = %format!("{err:#}"), "client_session_failed");
                        }
                    });
                }
                Err(err) => tracing::warn!(target: "server", error = %err, "accept_failed"),
            },
        }
    };

    shutdown.cancel();
    drop(listener);
    socket.release()?;
    match cause {
        StopCause::ExitRequested => {
            tracing::info!(target: "server", cause = "exit_message", "server_stopped")
        }
        StopCause::Signal(signal_name) => {
            tracing::info!(target: "server", cause = "signal", signal = signal_name, "server_stopped")
        }
    }
    Ok(())
}

struct ClientSession {
    selector: Arc<DefaultActionSelector>,
    selection_timeout: Duration,
    shutdown: CancellationToken,
    exit_tx: mpsc::UnboundedSender<()>,
}

impl ClientSession {
    async fn serve(&self, stream: UnixStream) -> Result<()> {
        let (reader, mut writer) = stream.into_split();
        let mut lines = BufReader::new(reader).lines();

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let response = match parse_client_message(line) {
                Ok(ClientMessage::Exit) => {
                    let _ = self.exit_tx.send(());
                    break;
                }
                Ok(ClientMessage::Select(context)) => self.select(context).await,
                Err(err) => ServerMessage::invalid_message(err.to_string()),
            };

            let encoded = encode_server_message(&response)?;
            writer
                .write_all(encoded.as_bytes())
                .await
                .context("failed to write response")?;
        }

        Ok(())
    }

    /// Runs one selection; past the deadline the selection is cancelled and
    /// reports `cancelled` instead of a partial result.
    async fn select(&self, context: RequestContext) -> ServerMessage {
        let cancellation = self.shutdown.child_token();
        let selection = self
            .selector
            .select_with_cancellation(&context, &cancellation);
        tokio::pin!(selection);

        let outcome = tokio::select! {
            outcome = &mut selection => outcome,
            _ = tokio::time::sleep(self.selection_timeout) => {
                cancellation.cancel();
                selection.await
            }
        };

        ServerMessage::from_outcome(context.request_id.clone(), outcome)
    }
}

/// Socket path owned by this process: stale files are removed on claim and
/// the path is unlinked again on release.
struct SocketFile {
    path: PathBuf,
}

impl SocketFile {
    fn claim(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .with_context(|| format!("unable to create {}", parent.display()))?;
        }

        match fs::symlink_metadata(path) {
            Ok(metadata) if metadata.file_type().is_socket() || metadata.is_file() => {
                fs::remove_file(path)
                    .with_context(|| format!("unable to remove stale {}", path.display()))?;
            }
            Ok(_) => bail!("{} exists and is not a socket or file", path.display()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("unable to stat {}", path.display()));
            }
        }

        Ok(Self {
            path: path.to_path_buf(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }

    fn release(self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Err(err) if err.kind() != io::ErrorKind::NotFound => {
                Err(err).with_context(|| format!("unable to remove {}", self.path.display()))
            }
            _ => Ok(()),
        }
    }
}
