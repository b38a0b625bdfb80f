//! Running external commands.
//!
//! Every build phase shells out (`tar`, `patch`, compilers, `ndk-build`,
//! `pip`). [`ProcessRunner`] is the seam between the engine and the host:
//! [`SystemRunner`] runs real processes, streaming their output to the log
//! at debug level and capturing it for diagnostics. A non-zero exit becomes
//! [`Error::ProcessFailed`] carrying the full command line and both captured
//! streams.

use std::collections::BTreeMap;
use std::fmt;
use std::io::{BufRead, BufReader, Read};
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::thread;

use log::{debug, info, warn};

use crate::error::{Error, Result};

/// A fully described command invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Invocation {
    pub program: String,
    pub args: Vec<String>,
    /// Variables set on top of the inherited environment.
    pub env: BTreeMap<String, String>,
    pub cwd: Option<PathBuf>,
}

impl Invocation {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            env: BTreeMap::new(),
            cwd: None,
        }
    }

    /// `sh -c <line>`, for recipe command lines.
    pub fn shell(line: &str) -> Self {
        Self::new("sh").arg("-c").arg(line)
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn envs(mut self, env: &BTreeMap<String, String>) -> Self {
        self.env
            .extend(env.iter().map(|(k, v)| (k.clone(), v.clone())));
        self
    }

    pub fn cwd(mut self, dir: &Path) -> Self {
        self.cwd = Some(dir.to_path_buf());
        self
    }
}

impl fmt::Display for Invocation {
    /// Renders the invocation the way it could be pasted into a shell.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(cwd) = &self.cwd {
            write!(f, "cd {} && ", cwd.display())?;
        }
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            if arg.is_empty() || arg.contains(char::is_whitespace) {
                write!(f, " '{}'", arg.replace('\'', r"'\''"))?;
            } else {
                write!(f, " {}", arg)?;
            }
        }
        Ok(())
    }
}

/// Captured output of a successful command.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    pub stdout: String,
    pub stderr: String,
}

/// Executes external commands.
pub trait ProcessRunner {
    /// Run to completion. Fails with [`Error::ProcessFailed`] on non-zero
    /// exit or when the program cannot be started.
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput>;
}

/// Runs commands on the host.
#[derive(Debug, Clone)]
pub struct SystemRunner {
    /// How many trailing lines of each stream to log when a command fails.
    pub tail_lines: usize,
}

impl SystemRunner {
    pub fn new(tail_lines: usize) -> Self {
        Self { tail_lines }
    }
}

impl Default for SystemRunner {
    fn default() -> Self {
        Self::new(20)
    }
}

impl ProcessRunner for SystemRunner {
    fn run(&self, invocation: &Invocation) -> Result<ProcessOutput> {
        info!("running {}", invocation);
        if !invocation.env.is_empty() {
            debug!("  with env {:?}", invocation.env);
        }

        let mut command = Command::new(&invocation.program);
        command
            .args(&invocation.args)
            .envs(&invocation.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped());
        if let Some(cwd) = &invocation.cwd {
            command.current_dir(cwd);
        }

        let mut child = command.spawn().map_err(|e| Error::ProcessFailed {
            command: invocation.to_string(),
            exit_code: None,
            stdout: String::new(),
            stderr: e.to_string(),
        })?;

        let stdout = child.stdout.take().map(|s| stream_lines(s, "out"));
        let stderr = child.stderr.take().map(|s| stream_lines(s, "err"));
        let status = child.wait()?;
        let stdout = join_stream(stdout);
        let stderr = join_stream(stderr);

        if status.success() {
            return Ok(ProcessOutput { stdout, stderr });
        }

        log_tail("STDOUT", &stdout, self.tail_lines);
        log_tail("STDERR", &stderr, self.tail_lines);
        if !invocation.env.is_empty() {
            let env: Vec<String> = invocation
                .env
                .iter()
                .map(|(k, v)| format!("set {}={}", k, v))
                .collect();
            warn!("ENV:\n{}", env.join("\n"));
        }
        warn!("COMMAND:\n{}", invocation);

        Err(Error::ProcessFailed {
            command: invocation.to_string(),
            exit_code: status.code(),
            stdout,
            stderr,
        })
    }
}

/// Read a child stream line by line on its own thread, logging each line.
fn stream_lines<R: Read + Send + 'static>(
    stream: R,
    label: &'static str,
) -> thread::JoinHandle<String> {
    thread::spawn(move || {
        let mut captured = String::new();
        for line in BufReader::new(stream).lines().map_while(|l| l.ok()) {
            debug!("\t[{}] {}", label, line);
            captured.push_str(&line);
            captured.push('\n');
        }
        captured
    })
}

fn join_stream(handle: Option<thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

/// The last `n` lines of `text` (all of them when `n` is 0).
pub fn tail(text: &str, n: usize) -> Vec<&str> {
    let lines: Vec<&str> = text.lines().collect();
    if n == 0 || lines.len() <= n {
        lines
    } else {
        lines[lines.len() - n..].to_vec()
    }
}

fn log_tail(name: &str, text: &str, n: usize) {
    let total = text.lines().count();
    if total == 0 {
        return;
    }
    let lines = tail(text, n);
    if lines.len() < total {
        warn!(
            "{} (last {} lines of {}):\n\t{}",
            name,
            lines.len(),
            total,
            lines.join("\n\t")
        );
    } else {
        warn!("{}:\n\t{}", name, lines.join("\n\t"));
    }
}
