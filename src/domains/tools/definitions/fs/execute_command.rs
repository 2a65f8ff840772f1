//! Execute command tool definition.
//!
//! Runs a command line through the platform shell with a timeout. The child
//! is killed if the timeout elapses or the call is abandoned.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Instant;

use serde_json::{Map, Value, json};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tracing::{info, instrument, warn};

use super::FilesystemTools;
use crate::core::security::validate_path;
use crate::domains::tools::{
    ErrorCode, ParameterSchema, ParameterSpec, ToolDescriptor, ToolError, ToolOutput,
    ValidatedArgs,
};

/// Command tool - runs a shell command and captures its output.
pub struct ExecuteCommandTool;

impl ExecuteCommandTool {
    pub const NAME: &'static str = "execute_command";

    pub const DESCRIPTION: &'static str = "Run a shell command and return its output";

    pub fn descriptor() -> ToolDescriptor {
        ToolDescriptor::new(
            Self::NAME,
            Self::DESCRIPTION,
            ParameterSchema::new()
                .param("command", ParameterSpec::string("Command line to run").required())
                .param("cwd", ParameterSpec::string("Working directory")),
        )
    }

    #[instrument(skip_all, fields(command = args.str("command").unwrap_or_default()))]
    pub async fn execute(args: &ValidatedArgs, fs: &FilesystemTools) -> Result<ToolOutput, ToolError> {
        let command = args.require_str("command")?;
        let cwd = match args.str("cwd") {
            Some(dir) => validate_path(dir, fs.security())?,
            None => working_directory(fs)?,
        };
        let timeout = fs.limits().command_timeout();
        let max_output = fs.limits().max_output_bytes;

        let started = Instant::now();
        let mut child = shell(command)
            .current_dir(&cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let stdout_pipe = child.stdout.take();
        let stderr_pipe = child.stderr.take();
        let run = async {
            let (out, err) = tokio::try_join!(
                read_capped(stdout_pipe, max_output),
                read_capped(stderr_pipe, max_output)
            )?;
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, out, err))
        };

        let (status, (out, out_truncated), (err, err_truncated)) =
            match tokio::time::timeout(timeout, run).await {
                Ok(result) => result?,
                Err(_) => {
                    warn!("Command timed out after {:?}", timeout);
                    return Err(ToolError::Timeout(timeout));
                }
            };
        let elapsed_ms = started.elapsed().as_millis() as u64;

        let stdout = capture(&out);
        let stderr = capture(&err);
        let truncated = out_truncated || err_truncated;
        if truncated {
            warn!("Command output exceeded {} bytes and was truncated", max_output);
        }

        if status.success() {
            info!("Command finished in {}ms", elapsed_ms);
            return Ok(ToolOutput::from_json(json!({
                "command": command,
                "cwd": cwd.display().to_string(),
                "stdout": stdout,
                "stderr": stderr,
                "executionTime": elapsed_ms,
                "truncated": truncated,
            })));
        }

        let exit_code = status.code();
        warn!("Command failed with exit code {:?}", exit_code);
        let mut data = Map::new();
        data.insert("command".into(), Value::from(command));
        data.insert("stdout".into(), Value::from(stdout));
        data.insert("stderr".into(), Value::from(stderr));
        data.insert("code".into(), json!(exit_code));
        data.insert("truncated".into(), Value::from(truncated));

        let message = match exit_code {
            Some(code) => format!("Command failed with exit code {}", code),
            None => "Command terminated by signal".to_string(),
        };
        Ok(ToolOutput::failure(message)
            .with_code(ErrorCode::HandlerFault)
            .with_data(data))
    }
}

/// The sandbox root when one is configured, otherwise the process cwd.
fn working_directory(fs: &FilesystemTools) -> Result<PathBuf, ToolError> {
    match &fs.security().root_path {
        Some(root) => Ok(root.clone()),
        None => Ok(std::env::current_dir()?),
    }
}

#[cfg(windows)]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("cmd");
    cmd.arg("/C").arg(command);
    cmd
}

#[cfg(not(windows))]
fn shell(command: &str) -> Command {
    let mut cmd = Command::new("sh");
    cmd.arg("-c").arg(command);
    cmd
}

/// Read a pipe to EOF, keeping at most `limit` bytes.
///
/// Anything past the limit is drained and discarded so the child never
/// blocks on a full pipe.
async fn read_capped<R>(pipe: Option<R>, limit: usize) -> std::io::Result<(Vec<u8>, bool)>
where
    R: AsyncRead + Unpin,
{
    let Some(mut pipe) = pipe else {
        return Ok((Vec::new(), false));
    };

    let mut kept = Vec::new();
    (&mut pipe).take(limit as u64 + 1).read_to_end(&mut kept).await?;

    let truncated = kept.len() > limit;
    if truncated {
        kept.truncate(limit);
        tokio::io::copy(&mut pipe, &mut tokio::io::sink()).await?;
    }
    Ok((kept, truncated))
}

fn capture(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim().to_string()
}
