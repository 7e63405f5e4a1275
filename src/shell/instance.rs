use std::fs::{File, OpenOptions};
use std::io;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use fs2::FileExt;
use tokio::fs;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::types::ShellError;

const FOCUS_REQUEST: &str = "focus";

/// Outcome of trying to become the running instance.
pub enum InstanceRole {
    Primary(InstanceGuard),
    /// Another instance holds the lock. `notified` reports whether it was
    /// asked to come to the front.
    Secondary { notified: bool },
}

/// Held by the primary instance for its whole lifetime.
///
/// Owns an exclusive lock on the lock file and a loopback listener whose
/// port is published next to it for later launches.
pub struct InstanceGuard {
    lock: File,
    port_path: PathBuf,
    listener: JoinHandle<()>,
    focus: Mutex<Option<mpsc::Receiver<()>>>,
}

impl InstanceGuard {
    pub async fn acquire(lock_path: &Path) -> Result<InstanceRole, ShellError> {
        if let Some(parent) = lock_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        let lock = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(lock_path)
            .map_err(|err| lock_error(lock_path, err))?;
        let port_path = port_path(lock_path);

        if let Err(err) = lock.try_lock_exclusive() {
            if !is_contended(&err) {
                return Err(lock_error(lock_path, err));
            }
            info!(path = %lock_path.display(), "Another instance is running");
            let notified = request_focus(&port_path).await;
            return Ok(InstanceRole::Secondary { notified });
        }

        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await?;
        let port = listener.local_addr()?.port();
        fs::write(&port_path, port.to_string()).await?;
        info!(path = %lock_path.display(), port, "Acquired single-instance lock");

        let (tx, rx) = mpsc::channel(8);
        let listener = tokio::spawn(accept_focus_requests(listener, tx));

        Ok(InstanceRole::Primary(InstanceGuard {
            lock,
            port_path,
            listener,
            focus: Mutex::new(Some(rx)),
        }))
    }

    /// Focus requests from later launches. Only the first caller gets the receiver.
    pub fn focus_requests(&self) -> Option<mpsc::Receiver<()>> {
        match self.focus.lock() {
            Ok(mut slot) => slot.take(),
            Err(poisoned) => poisoned.into_inner().take(),
        }
    }
}

impl Drop for InstanceGuard {
    fn drop(&mut self) {
        self.listener.abort();
        if let Err(err) = std::fs::remove_file(&self.port_path) {
            debug!(path = %self.port_path.display(), error = %err, "Port file already gone");
        }
        if let Err(err) = FileExt::unlock(&self.lock) {
            warn!(error = %err, "Failed to release single-instance lock");
        }
    }
}

async fn accept_focus_requests(listener: TcpListener, focus: mpsc::Sender<()>) {
    loop {
        let (stream, peer) = match listener.accept().await {
            Ok(accepted) => accepted,
            Err(err) => {
                warn!(error = %err, "Single-instance listener failed");
                continue;
            }
        };

        let mut lines = BufReader::new(stream).lines();
        match lines.next_line().await {
            Ok(Some(line)) if line.trim() == FOCUS_REQUEST => {
                debug!(%peer, "Focus request from second instance");
                let _ = focus.try_send(());
            }
            Ok(other) => debug!(%peer, line = ?other, "Ignoring unknown instance request"),
            Err(err) => debug!(%peer, error = %err, "Failed to read instance request"),
        }
    }
}

async fn request_focus(port_path: &Path) -> bool {
    let port = match fs::read_to_string(port_path).await {
        Ok(contents) => match contents.trim().parse::<u16>() {
            Ok(port) => port,
            Err(err) => {
                warn!(error = %err, "Invalid port in instance file");
                return false;
            }
        },
        Err(err) => {
            warn!(path = %port_path.display(), error = %err, "Running instance has not published its port");
            return false;
        }
    };

    let sent = async {
        let mut stream = TcpStream::connect(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await?;
        stream.write_all(format!("{FOCUS_REQUEST}\n").as_bytes()).await?;
        stream.shutdown().await
    };
    match sent.await {
        Ok(()) => true,
        Err(err) => {
            warn!(port, error = %err, "Failed to reach running instance");
            false
        }
    }
}

fn port_path(lock_path: &Path) -> PathBuf {
    let mut name = lock_path.as_os_str().to_owned();
    name.push(".port");
    PathBuf::from(name)
}

fn is_contended(err: &io::Error) -> bool {
    err.kind() == io::ErrorKind::WouldBlock
        || err.raw_os_error() == fs2::lock_contended_error().raw_os_error()
}

fn lock_error(path: &Path, err: io::Error) -> ShellError {
    ShellError::InstanceLock(format!("{}: {err}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn second_acquire_signals_the_primary() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.lock");

        let InstanceRole::Primary(guard) = InstanceGuard::acquire(&path).await.unwrap() else {
            panic!("first acquire should be primary");
        };
        let mut focus = guard.focus_requests().unwrap();
        assert!(guard.focus_requests().is_none());

        match InstanceGuard::acquire(&path).await.unwrap() {
            InstanceRole::Secondary { notified } => assert!(notified),
            InstanceRole::Primary(_) => panic!("second acquire should be secondary"),
        }

        tokio::time::timeout(Duration::from_secs(5), focus.recv())
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn lock_is_released_on_drop() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shell.lock");

        let first = InstanceGuard::acquire(&path).await.unwrap();
        assert!(matches!(first, InstanceRole::Primary(_)));
        drop(first);
        assert!(!port_path(&path).exists());

        let again = InstanceGuard::acquire(&path).await.unwrap();
        assert!(matches!(again, InstanceRole::Primary(_)));
    }
}
