//! Timeout-bounded collaborator invocation.
//!
//! Every external command the installer runs goes through `run`, which
//! enforces a deadline and captures bounded output. A timed-out command is
//! indistinguishable from a failed one at the call site.
use anyhow::{anyhow, Context, Result};
use std::io::Read;
use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

const POLL_INTERVAL: Duration = Duration::from_millis(50);
const SNIPPET_MAX_LINES: usize = 20;
const SNIPPET_MAX_BYTES: usize = 2048;

#[derive(Debug, Clone)]
pub struct RunSpec {
    program: String,
    args: Vec<String>,
    cwd: Option<PathBuf>,
    timeout: Duration,
}

impl RunSpec {
    pub fn new(program: impl Into<String>) -> Self {
        RunSpec {
            program: program.into(),
            args: Vec::new(),
            cwd: None,
            timeout: Duration::from_secs(60),
        }
    }

    /// Prefix the command with a privilege escalation command line. An empty
    /// prefix (already root) leaves the command untouched.
    pub fn wrapped(prefix: &[String], program: &str) -> Self {
        match prefix.split_first() {
            Some((head, rest)) => {
                let mut spec = RunSpec::new(head.clone());
                spec.args.extend(rest.iter().cloned());
                spec.args.push(program.to_string());
                spec
            }
            None => RunSpec::new(program),
        }
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

    pub fn cwd(mut self, dir: impl Into<PathBuf>) -> Self {
        self.cwd = Some(dir.into());
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn render(&self) -> String {
        let mut parts = vec![self.program.clone()];
        parts.extend(self.args.iter().cloned());
        parts.join(" ")
    }
}

#[derive(Debug)]
pub struct RunOutput {
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    pub timed_out: bool,
}

impl RunOutput {
    pub fn success(&self) -> bool {
        !self.timed_out && self.exit_code == Some(0)
    }
}

/// Run a command to completion or to its deadline. `Err` means the command
/// could not be spawned at all; a timeout or nonzero exit is reported in the
/// returned `RunOutput`.
pub fn run(spec: &RunSpec) -> Result<RunOutput> {
    let mut command = Command::new(&spec.program);
    command
        .args(&spec.args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    if let Some(cwd) = &spec.cwd {
        command.current_dir(cwd);
    }
    let mut child = command
        .spawn()
        .with_context(|| format!("spawn {}", spec.program))?;

    let stdout = drain(child.stdout.take());
    let stderr = drain(child.stderr.take());
    let deadline = Instant::now() + spec.timeout;

    let (exit_code, timed_out) = loop {
        match child.try_wait().context("wait for child")? {
            Some(status) => break (status.code(), false),
            None if Instant::now() >= deadline => {
                kill_and_reap(&mut child);
                break (None, true);
            }
            None => std::thread::sleep(POLL_INTERVAL),
        }
    };

    Ok(RunOutput {
        exit_code,
        stdout: join_drained(stdout),
        stderr: join_drained(stderr),
        timed_out,
    })
}

/// Run a command and convert timeout/failure into an error with a bounded
/// stderr snippet.
pub fn run_checked(spec: &RunSpec) -> Result<RunOutput> {
    let output = run(spec)?;
    if output.timed_out {
        return Err(anyhow!(
            "`{}` timed out after {}s",
            spec.render(),
            spec.timeout.as_secs()
        ));
    }
    if !output.success() {
        let detail = bounded_snippet(&output.stderr);
        return Err(anyhow!(
            "`{}` failed (exit {:?}){}",
            spec.render(),
            output.exit_code,
            if detail.is_empty() {
                String::new()
            } else {
                format!(": {detail}")
            }
        ));
    }
    Ok(output)
}

fn drain(pipe: Option<impl Read + Send + 'static>) -> Option<std::thread::JoinHandle<String>> {
    pipe.map(|mut reader| {
        std::thread::spawn(move || {
            let mut buf = String::new();
            let _ = reader.read_to_string(&mut buf);
            buf
        })
    })
}

fn join_drained(handle: Option<std::thread::JoinHandle<String>>) -> String {
    handle
        .and_then(|h| h.join().ok())
        .unwrap_or_default()
}

fn kill_and_reap(child: &mut Child) {
    let _ = child.kill();
    let _ = child.wait();
}

fn bounded_snippet(text: &str) -> String {
    let mut out = String::new();
    for (idx, line) in text.lines().enumerate() {
        if idx >= SNIPPET_MAX_LINES || out.len() + line.len() > SNIPPET_MAX_BYTES {
            out.push_str(" [...]");
            break;
        }
        if idx > 0 {
            out.push_str(" | ");
        }
        out.push_str(line.trim_end());
    }
    out.trim().to_string()
}
