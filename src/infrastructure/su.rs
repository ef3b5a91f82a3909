//! Persistent `su` shell session.
//!
//! One long-lived child process with piped stdio. Each command is followed by
//! an `echo` of a per-command end marker and the command's exit status, so the
//! reader knows where the output stops without closing the pipe.
//!
//! ```text
//! → cmd locale get-app-locales org.example.notes
//! → echo "__APPLANG_END_7__ $?"
//! ← Locales for org.example.notes for user 0 are [fr]
//! ← __APPLANG_END_7__ 0
//! ```

use crate::domain::{ApplangError, Result};
use crate::privilege::{ShellOutput, ShellSession};
use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

const END_MARKER: &str = "__APPLANG_END_";

struct Process {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
}

/// [`ShellSession`] backed by a superuser shell binary.
pub struct SuShell {
    binary: String,
    process: Option<Process>,
    sequence: u64,
}

impl SuShell {
    /// Creates a session that will spawn `binary` (normally `su`) on open.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            process: None,
            sequence: 0,
        }
    }

    fn lost(context: &str, error: impl std::fmt::Display) -> ApplangError {
        ApplangError::PrivilegeLost(format!("{context}: {error}"))
    }
}

impl ShellSession for SuShell {
    fn is_alive(&mut self) -> bool {
        self.process
            .as_mut()
            .is_some_and(|p| matches!(p.child.try_wait(), Ok(None)))
    }

    fn close(&mut self) {
        let Some(mut process) = self.process.take() else {
            return;
        };
        let _ = process.stdin.write_all(b"exit\n");
        drop(process.stdin);
        if matches!(process.child.try_wait(), Ok(None)) {
            let _ = process.child.kill();
        }
        match process.child.wait() {
            Ok(status) => tracing::debug!(status = %status, "shell session closed"),
            Err(e) => tracing::debug!(error = %e, "shell session wait failed"),
        }
    }

    fn open(&mut self) -> Result<()> {
        self.close();
        let _span = tracing::debug_span!("su_open", binary = %self.binary).entered();

        let mut child = Command::new(&self.binary)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| ApplangError::ChannelUnavailable(format!("spawn {}: {e}", self.binary)))?;

        let (Some(stdin), Some(stdout)) = (child.stdin.take(), child.stdout.take()) else {
            let _ = child.kill();
            return Err(ApplangError::ChannelUnavailable(
                "shell stdio was not piped".to_string(),
            ));
        };

        self.process = Some(Process {
            child,
            stdin,
            stdout: BufReader::new(stdout),
        });
        tracing::debug!("shell session opened");
        Ok(())
    }

    fn is_root_granted(&mut self) -> bool {
        match self.exec("id -u") {
            Ok(output) => {
                output.is_success() && output.stdout.first().is_some_and(|uid| uid.trim() == "0")
            }
            Err(e) => {
                tracing::debug!(error = %e, "root check failed");
                false
            }
        }
    }

    fn exec(&mut self, command: &str) -> Result<ShellOutput> {
        let Some(process) = self.process.as_mut() else {
            return Err(ApplangError::PrivilegeLost("no shell session".to_string()));
        };

        self.sequence += 1;
        let marker = format!("{END_MARKER}{}__", self.sequence);
        let script = format!("{command}\necho \"{marker} $?\"\n");
        process
            .stdin
            .write_all(script.as_bytes())
            .and_then(|()| process.stdin.flush())
            .map_err(|e| Self::lost("write to shell", e))?;

        let mut stdout = Vec::new();
        loop {
            let mut line = String::new();
            let read = process
                .stdout
                .read_line(&mut line)
                .map_err(|e| Self::lost("read from shell", e))?;
            if read == 0 {
                return Err(ApplangError::PrivilegeLost(
                    "shell closed its output".to_string(),
                ));
            }

            let line = line.trim_end_matches(['\r', '\n']);
            if let Some(position) = line.find(&marker) {
                if position > 0 {
                    stdout.push(line[..position].to_string());
                }
                let status = line[position + marker.len()..].trim();
                let exit_code = status.parse().map_err(|_| {
                    ApplangError::PrivilegeLost(format!("bad exit status from shell: {status:?}"))
                })?;
                return Ok(ShellOutput { exit_code, stdout });
            }
            stdout.push(line.to_string());
        }
    }
}

impl Drop for SuShell {
    fn drop(&mut self) {
        self.close();
    }
}
