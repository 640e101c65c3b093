use crate::{constants::*, handlers::messages::Message, state::center::MonitorId};
use anyhow::{Context, Result, anyhow, bail};
use cadenza_notifications_util::ActionId;
use std::{
    path::{Path, PathBuf},
    str::FromStr,
};
use tokio::{
    io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader},
    net::{UnixListener, UnixStream},
    sync::{mpsc::UnboundedSender, oneshot},
};
use tracing::{error, info};

/// `$XDG_RUNTIME_DIR/cadenza-shell.sock`, or the temp dir when unset.
pub fn socket_path() -> PathBuf {
    dirs::runtime_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join(CONTROL_SOCKET_NAME)
}

/// Listening end of the control channel. The socket file is removed on drop.
#[derive(Debug)]
pub struct ControlServer {
    listener: UnixListener,
    path: PathBuf,
}

impl ControlServer {
    /// Bind at `path`, replacing a stale socket left by a previous run.
    pub fn bind(path: PathBuf) -> Result<Self> {
        if path.exists() {
            if std::os::unix::net::UnixStream::connect(&path).is_ok() {
                bail!("another instance is listening on {}", path.display());
            }
            std::fs::remove_file(&path)
                .with_context(|| format!("failed to remove stale socket {}", path.display()))?;
        }

        let listener = UnixListener::bind(&path)
            .with_context(|| format!("failed to bind control socket {}", path.display()))?;
        info!("control socket at {}", path.display());
        Ok(Self { listener, path })
    }

    /// Accept connections until the listener fails, forwarding each request
    /// to the main loop.
    pub async fn run(&self, output: UnboundedSender<Message>) -> Result<()> {
        loop {
            let (stream, _) = self.listener.accept().await?;
            let output = output.clone();
            tokio::spawn(async move {
                if let Err(err) = handle(stream, output).await {
                    error!("control request failed: {err:#}");
                }
            });
        }
    }
}

impl Drop for ControlServer {
    fn drop(&mut self) {
        _ = std::fs::remove_file(&self.path);
    }
}

async fn handle(stream: UnixStream, output: UnboundedSender<Message>) -> Result<()> {
    let (read, mut write) = stream.into_split();
    let mut line = String::new();
    BufReader::new(read)
        .take(CONTROL_MAX_REQUEST_LEN as u64)
        .read_line(&mut line)
        .await?;

    let request = line.trim().to_string();
    tracing::trace!("control request {request:?}");

    let (reply, answer) = oneshot::channel();
    output
        .send(Message::Control { request, reply })
        .map_err(|_| anyhow!("main loop is gone"))?;
    let answer = answer.await.context("main loop dropped the request")?;

    write.write_all(answer.as_bytes()).await?;
    write.write_all(b"\n").await?;
    Ok(())
}

/// A request understood by the primary instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Request {
    /// Invoke the default action of the newest active notification.
    NotiAct,
    ToggleCenter(MonitorId),
    DismissAll,
    ClearHistory,
    Invoke { id: u32, action: ActionId },
    Status,
}

impl FromStr for Request {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let unknown = || format!("unknown request: {}", line.trim());
        let words: Vec<&str> = line.split_whitespace().collect();

        let request = match words.as_slice() {
            [REQUEST_NOTI_ACT] => Request::NotiAct,
            [REQUEST_TOGGLE_CENTER, monitor] => Request::ToggleCenter((*monitor).into()),
            [REQUEST_DISMISS_ALL] => Request::DismissAll,
            [REQUEST_CLEAR_HISTORY] => Request::ClearHistory,
            [REQUEST_INVOKE, id, action] => {
                let id = id.parse().map_err(|_| unknown())?;
                let Ok(action) = action.parse::<ActionId>();
                Request::Invoke { id, action }
            }
            [REQUEST_STATUS] => Request::Status,
            _ => return Err(unknown()),
        };
        Ok(request)
    }
}

/// Send one request to the running instance and return its reply.
pub async fn request(path: &Path, request: &str) -> Result<String> {
    let mut stream = UnixStream::connect(path)
        .await
        .with_context(|| format!("no running instance at {}", path.display()))?;

    stream.write_all(request.as_bytes()).await?;
    stream.write_all(b"\n").await?;
    stream.shutdown().await?;

    let mut reply = String::new();
    stream.read_to_string(&mut reply).await?;
    Ok(reply.trim_end().to_string())
}
