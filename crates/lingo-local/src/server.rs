//! Process manager for the local llama-server instance.

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::Duration;

use serde::Deserialize;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use crate::error::LocalError;
use crate::http::CompletionClient;
use crate::DEFAULT_PORT;

/// How many parallel request slots the server is started with.
const PARALLEL_SLOTS: u32 = 4;

/// Interval between readiness probes.
const READY_POLL_INTERVAL: Duration = Duration::from_millis(500);

fn default_port() -> u16 {
    DEFAULT_PORT
}

/// Launch configuration for the local server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Path to the llama-server executable.
    pub executable: PathBuf,
    /// Path to the GGUF model file.
    pub model: PathBuf,
    /// Context window in tokens. Must be positive.
    pub context_length: u32,
    /// Port to bind on the loopback address.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Extra arguments appended verbatim to the command line.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

/// Owner of the llama-server child process.
///
/// The child is released on every exit path: [`LlamaServer::stop`] reaps it
/// explicitly, and `Drop` runs the same shutdown if the owner is dropped
/// while the process is still held.
pub struct LlamaServer {
    config: ServerConfig,
    process: Option<Child>,
}

impl LlamaServer {
    /// Create a server manager. Does not spawn anything yet.
    pub fn new(config: ServerConfig) -> Self {
        Self {
            config,
            process: None,
        }
    }

    /// The port the server is configured to bind.
    pub fn port(&self) -> u16 {
        self.config.port
    }

    /// Spawn the server process.
    ///
    /// Performs an immediate non-blocking liveness probe and fails with
    /// [`LocalError::ServerStartFailed`] if the child has already exited.
    /// The probe is necessarily racy: a crash just after the check is not
    /// caught here. Callers wanting a stronger guarantee should follow up
    /// with [`LlamaServer::wait_ready`].
    pub fn start(&mut self) -> Result<(), LocalError> {
        if self.process.is_some() {
            debug!("server already started, ignoring start request");
            return Ok(());
        }

        info!(
            executable = %self.config.executable.display(),
            model = %self.config.model.display(),
            port = self.config.port,
            "starting local server"
        );

        let mut child = Command::new(&self.config.executable)
            .arg("-m")
            .arg(&self.config.model)
            .arg("-c")
            .arg(self.config.context_length.to_string())
            .arg("--port")
            .arg(self.config.port.to_string())
            .arg("--host")
            .arg("127.0.0.1")
            .arg("-np")
            .arg(PARALLEL_SLOTS.to_string())
            .args(&self.config.extra_args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| LocalError::ServerStartFailed(e.to_string()))?;

        if let Some(status) = child.try_wait()? {
            return Err(LocalError::ServerStartFailed(format!(
                "server exited immediately with {status}"
            )));
        }

        debug!(pid = child.id(), "local server process started");
        self.process = Some(child);
        Ok(())
    }

    /// Poll the server's HTTP port until it reports healthy or the deadline
    /// passes.
    ///
    /// Model load time is unbounded in general, so the timeout is the
    /// caller's choice. Early child death is reported as
    /// [`LocalError::ServerStartFailed`] rather than a timeout.
    pub async fn wait_ready(&mut self, deadline: Duration) -> Result<(), LocalError> {
        let probe_timeout = Duration::from_secs(2);
        let client = CompletionClient::new(self.config.port)
            .with_timeouts(probe_timeout, probe_timeout);
        let start = std::time::Instant::now();

        info!("waiting for local server to become ready");
        while start.elapsed() < deadline {
            if let Some(child) = self.process.as_mut() {
                if let Some(status) = child.try_wait()? {
                    self.process = None;
                    return Err(LocalError::ServerStartFailed(format!(
                        "server exited during startup with {status}"
                    )));
                }
            }

            if let Ok(true) = client.check_health().await {
                info!("local server is ready");
                return Ok(());
            }
            sleep(READY_POLL_INTERVAL).await;
        }

        Err(LocalError::StartTimeout)
    }

    /// Check whether the child process is still alive.
    pub fn is_running(&mut self) -> bool {
        match self.process.as_mut() {
            Some(child) => match child.try_wait() {
                Ok(None) => true,
                Ok(Some(_)) => {
                    // Exited and reaped; drop the stale handle.
                    self.process = None;
                    false
                }
                // State unobservable: keep the handle so stop() can still
                // reap the child later.
                Err(_) => true,
            },
            None => false,
        }
    }

    /// Stop the server and reap the child.
    ///
    /// Sends SIGTERM and then blocks until the exit status is collected so
    /// no zombie is left behind. Idempotent: calling this with no running
    /// child is a no-op.
    pub fn stop(&mut self) {
        let Some(mut child) = self.process.take() else {
            return;
        };

        info!(pid = child.id(), "stopping local server");

        #[cfg(unix)]
        unsafe {
            libc::kill(child.id() as i32, libc::SIGTERM);
        }
        #[cfg(not(unix))]
        {
            let _ = child.kill();
        }

        match child.wait() {
            Ok(status) => debug!(?status, "local server exited"),
            Err(e) => warn!("failed to collect local server exit status: {e}"),
        }
    }

    /// A completion client pointed at this server.
    pub fn client(&self) -> CompletionClient {
        CompletionClient::new(self.config.port)
    }
}

impl Drop for LlamaServer {
    fn drop(&mut self) {
        if self.process.is_some() {
            self.stop();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bogus_config() -> ServerConfig {
        ServerConfig {
            executable: PathBuf::from("/nonexistent/llama-server"),
            model: PathBuf::from("/nonexistent/model.gguf"),
            context_length: 4096,
            port: 9099,
            extra_args: vec![],
        }
    }

    #[test]
    fn test_start_nonexistent_executable() {
        let mut server = LlamaServer::new(bogus_config());
        let err = server.start().unwrap_err();
        assert!(matches!(err, LocalError::ServerStartFailed(_)));
        assert!(!server.is_running());
    }

    #[test]
    fn test_stop_is_idempotent() {
        let mut server = LlamaServer::new(bogus_config());
        // Never started: both calls are no-ops and must not block or panic.
        server.stop();
        server.stop();
        assert!(!server.is_running());
    }

    #[test]
    fn test_stop_after_failed_start() {
        let mut server = LlamaServer::new(bogus_config());
        let _ = server.start();
        server.stop();
        assert!(!server.is_running());
    }

    #[cfg(unix)]
    #[test]
    fn test_stop_reaps_live_child() {
        use std::io::Write;

        // A real long-lived child through the same spawn path: /bin/sh
        // takes the model path as its script operand and ignores the
        // remaining server flags as positional parameters.
        let mut script = tempfile::NamedTempFile::new().unwrap();
        // exec keeps a single process to signal and reap.
        writeln!(script, "exec sleep 30").unwrap();

        let config = ServerConfig {
            executable: PathBuf::from("/bin/sh"),
            model: script.path().to_path_buf(),
            context_length: 1,
            port: 9099,
            extra_args: vec![],
        };
        let mut server = LlamaServer::new(config);
        server.start().unwrap();
        assert!(server.is_running());

        server.stop();
        assert!(!server.is_running());
        // Second stop after a real shutdown: still a no-op.
        server.stop();
    }

    #[test]
    fn test_config_defaults() {
        let config: ServerConfig = serde_json::from_str(
            r#"{"executable": "/opt/llama-server", "model": "/opt/model.gguf", "context_length": 2048}"#,
        )
        .unwrap();
        assert_eq!(config.port, DEFAULT_PORT);
        assert!(config.extra_args.is_empty());
    }
}
