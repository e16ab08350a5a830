//! Python runtime manager for the analyzer collaborators.
//!
//! fairlearn, shap, pip and keras all live on the Python side. Each call runs
//! one short script in a subprocess: the request goes in as JSON on stdin,
//! the result comes back as JSON on stdout.

use crate::config::PythonConfig;
use crate::error::CardError;
use serde_json::Value;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

/// Managed Python subprocess runner.
#[derive(Debug, Clone)]
pub struct PythonRuntime {
    python_path: PathBuf,
    venv_path: Option<PathBuf>,
    workspace: PathBuf,
    timeout: Duration,
}

impl PythonRuntime {
    /// `python3` on `PATH`, five minute timeout.
    pub fn new(workspace: PathBuf) -> Self {
        Self {
            python_path: PathBuf::from("python3"),
            venv_path: None,
            workspace,
            timeout: Duration::from_secs(300),
        }
    }

    pub fn from_config(config: &PythonConfig, workspace: PathBuf) -> Self {
        Self {
            python_path: config
                .python_path
                .clone()
                .unwrap_or_else(|| PathBuf::from("python3")),
            venv_path: config.venv_path.clone(),
            workspace,
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    /// The effective interpreter, accounting for a configured venv.
    pub fn python_cmd(&self) -> PathBuf {
        if let Some(venv) = &self.venv_path {
            let bin_dir = if cfg!(windows) { "Scripts" } else { "bin" };
            venv.join(bin_dir).join("python")
        } else {
            self.python_path.clone()
        }
    }

    /// Run `script` with `input` on stdin and parse its stdout as JSON.
    ///
    /// Empty stdout yields `Value::Null`.
    pub async fn run_script(&self, script: &str, input: &Value) -> Result<Value, CardError> {
        let payload = serde_json::to_vec(input)?;
        debug!(
            script_len = script.len(),
            input_len = payload.len(),
            "Running Python script"
        );
        let stdout = self.run(&["-c", script], Some(payload)).await?;
        let trimmed = stdout.trim();
        if trimmed.is_empty() {
            Ok(Value::Null)
        } else {
            serde_json::from_str(trimmed)
                .map_err(|e| CardError::python(format!("Invalid JSON output: {e}")))
        }
    }

    /// Run the interpreter with `args` and return its stdout.
    pub async fn run_args(&self, args: &[&str]) -> Result<String, CardError> {
        debug!(?args, "Running Python");
        self.run(args, None).await
    }

    async fn run(&self, args: &[&str], stdin: Option<Vec<u8>>) -> Result<String, CardError> {
        let result = tokio::time::timeout(self.timeout, async move {
            let mut child = Command::new(self.python_cmd())
                .args(args)
                .current_dir(&self.workspace)
                .stdin(if stdin.is_some() {
                    Stdio::piped()
                } else {
                    Stdio::null()
                })
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .spawn()
                .map_err(|e| CardError::python(format!("Failed to spawn Python: {e}")))?;

            if let (Some(bytes), Some(mut pipe)) = (stdin, child.stdin.take()) {
                pipe.write_all(&bytes).await?;
                // closing stdin lets json.load(sys.stdin) return
                drop(pipe);
            }

            let output = child.wait_with_output().await?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(CardError::python(format!(
                    "Python exited with {}: {}",
                    output.status,
                    stderr.trim()
                )));
            }
            Ok(String::from_utf8_lossy(&output.stdout).into_owned())
        })
        .await;

        match result {
            Ok(inner) => inner,
            Err(_) => Err(CardError::Timeout(format!(
                "Python timed out after {}s",
                self.timeout.as_secs()
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_python_cmd_prefers_venv() {
        let config = PythonConfig {
            python_path: Some(PathBuf::from("/usr/bin/python3.12")),
            venv_path: Some(PathBuf::from("/opt/venv")),
            timeout_secs: 10,
        };
        let rt = PythonRuntime::from_config(&config, PathBuf::from("."));
        let expected = if cfg!(windows) {
            PathBuf::from("/opt/venv/Scripts/python")
        } else {
            PathBuf::from("/opt/venv/bin/python")
        };
        assert_eq!(rt.python_cmd(), expected);
    }

    #[test]
    fn test_python_cmd_defaults_to_python3() {
        let rt = PythonRuntime::new(PathBuf::from("."));
        assert_eq!(rt.python_cmd(), PathBuf::from("python3"));
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_python_error() {
        let config = PythonConfig {
            python_path: Some(PathBuf::from("/nonexistent/bin/python-does-not-exist")),
            venv_path: None,
            timeout_secs: 5,
        };
        let rt = PythonRuntime::from_config(&config, std::env::temp_dir());
        let err = rt.run_args(&["--version"]).await.unwrap_err();
        assert!(matches!(err, CardError::Python(_)));
    }
}
