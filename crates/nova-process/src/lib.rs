//! Bounded execution of external tools.
//!
//! The minimizer shells out to a Java compiler once per output file. A
//! compiler run can hang or print megabytes of diagnostics, so every call
//! here captures at most `max_bytes` per stream and can be bounded by a
//! wall-clock timeout. On timeout the whole process group is killed, which
//! also takes down wrapper scripts and the JVMs they spawn.

use std::{
    fmt,
    io::{self, Read},
    path::{Path, PathBuf},
    process::{Child, Command, ExitStatus, Stdio},
    thread,
    time::{Duration, Instant},
};

/// Captured stdout/stderr, each truncated to the configured limit.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BoundedOutput {
    pub stdout: String,
    pub stderr: String,
    /// Set when stdout produced more bytes than were kept.
    pub stdout_truncated: bool,
    pub stderr_truncated: bool,
}

impl BoundedOutput {
    /// Stdout followed by stderr, as if stderr had been redirected into
    /// stdout.
    pub fn combined(&self) -> String {
        let mut s = String::with_capacity(self.stdout.len() + self.stderr.len() + 1);
        s.push_str(&self.stdout);
        if !self.stderr.is_empty() {
            if !s.is_empty() && !s.ends_with('\n') {
                s.push('\n');
            }
            s.push_str(&self.stderr);
        }
        s
    }

    /// Lines of [`BoundedOutput::combined`].
    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.stdout.lines().chain(self.stderr.lines())
    }

    pub fn truncated(&self) -> bool {
        self.stdout_truncated || self.stderr_truncated
    }

    /// Like [`BoundedOutput::lines`], without the last line of a truncated
    /// stream, which may have been cut mid-way.
    pub fn complete_lines(&self) -> impl Iterator<Item = &str> {
        complete_prefix(&self.stdout, self.stdout_truncated)
            .lines()
            .chain(complete_prefix(&self.stderr, self.stderr_truncated).lines())
    }
}

fn complete_prefix(stream: &str, truncated: bool) -> &str {
    if !truncated {
        return stream;
    }
    match stream.rfind('\n') {
        Some(end) => &stream[..end],
        None => "",
    }
}

#[derive(Debug, Clone)]
pub struct RunOptions {
    /// Kill the process group if the command has not exited by then.
    pub timeout: Option<Duration>,
    /// Maximum bytes to capture per stream.
    pub max_bytes: usize,
    /// Time between SIGTERM and SIGKILL when a timeout fires.
    pub kill_grace: Duration,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            timeout: None,
            max_bytes: 4 * 1024 * 1024,
            kill_grace: Duration::from_millis(250),
        }
    }
}

impl RunOptions {
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

/// A command line plus the directory it runs in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub cwd: PathBuf,
    pub program: PathBuf,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new(cwd: &Path, program: &Path, args: &[String]) -> Self {
        Self {
            cwd: cwd.to_path_buf(),
            program: program.to_path_buf(),
            args: args.to_vec(),
        }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Readable, not shell-exact.
        write!(f, "{}", self.program.display())?;
        for arg in &self.args {
            if arg.contains(' ') || arg.contains('\t') {
                write!(f, " \"{}\"", arg.replace('"', "\\\""))?;
            } else {
                write!(f, " {arg}")?;
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct CommandResult {
    pub status: ExitStatus,
    pub output: BoundedOutput,
    pub timed_out: bool,
    pub elapsed: Duration,
}

/// Runs `program args...` in `cwd` with stdin closed.
///
/// Returns `Err` only when the process could not be spawned or waited on. A
/// timeout is reported through [`CommandResult::timed_out`]; the status is
/// then the signal status of the killed process.
pub fn run_command(
    cwd: &Path,
    program: &Path,
    args: &[String],
    opts: &RunOptions,
) -> io::Result<CommandResult> {
    run_command_spec(&CommandSpec::new(cwd, program, args), opts)
}

pub fn run_command_spec(command: &CommandSpec, opts: &RunOptions) -> io::Result<CommandResult> {
    tracing::debug!(target: "nova.process", command = %command, "spawning");

    let mut cmd = Command::new(&command.program);
    cmd.args(&command.args)
        .current_dir(&command.cwd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    // Own process group, so a timeout can signal the whole tree.
    #[cfg(unix)]
    unsafe {
        use std::os::unix::process::CommandExt;

        cmd.pre_exec(|| {
            // SAFETY: `setpgid` is async-signal-safe and does not allocate;
            // this runs in the child between `fork` and `exec`.
            if libc::setpgid(0, 0) != 0 {
                return Err(io::Error::last_os_error());
            }
            Ok(())
        });
    }

    let start = Instant::now();
    let mut child = cmd.spawn()?;

    let Some(stdout) = child.stdout.take() else {
        return Err(io::Error::other("child stdout was not captured"));
    };
    let Some(stderr) = child.stderr.take() else {
        return Err(io::Error::other("child stderr was not captured"));
    };

    let max_bytes = opts.max_bytes;
    let stdout_reader = thread::spawn(move || read_bounded(stdout, max_bytes));
    let stderr_reader = thread::spawn(move || read_bounded(stderr, max_bytes));

    let (status, timed_out) = match opts.timeout {
        Some(timeout) => wait_with_timeout(&mut child, timeout, opts.kill_grace)?,
        None => (child.wait()?, false),
    };

    let (stdout_bytes, stdout_truncated) = join_reader(stdout_reader, "stdout")??;
    let (stderr_bytes, stderr_truncated) = join_reader(stderr_reader, "stderr")??;
    let elapsed = start.elapsed();

    if timed_out {
        tracing::warn!(
            target: "nova.process",
            command = %command,
            elapsed_ms = elapsed.as_millis() as u64,
            "command timed out; process group killed"
        );
    } else {
        tracing::debug!(
            target: "nova.process",
            command = %command,
            status = %status,
            elapsed_ms = elapsed.as_millis() as u64,
            "command finished"
        );
    }

    Ok(CommandResult {
        status,
        output: BoundedOutput {
            stdout: String::from_utf8_lossy(&stdout_bytes).into_owned(),
            stderr: String::from_utf8_lossy(&stderr_bytes).into_owned(),
            stdout_truncated,
            stderr_truncated,
        },
        timed_out,
        elapsed,
    })
}

fn wait_with_timeout(
    child: &mut Child,
    timeout: Duration,
    grace: Duration,
) -> io::Result<(ExitStatus, bool)> {
    let start = Instant::now();
    let poll = Duration::from_millis(25);
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok((status, false));
        }
        let elapsed = start.elapsed();
        if elapsed >= timeout {
            return Ok((terminate_process_tree(child, grace)?, true));
        }
        thread::sleep(poll.min(timeout - elapsed));
    }
}

fn terminate_process_tree(child: &mut Child, grace: Duration) -> io::Result<ExitStatus> {
    #[cfg(unix)]
    {
        // The child leads its own group (`setpgid(0, 0)` above).
        let pgid = -(child.id() as i32);
        unsafe {
            let _ = libc::kill(pgid, libc::SIGTERM);
        }

        let start = Instant::now();
        while start.elapsed() < grace {
            if let Some(status) = child.try_wait()? {
                // The leader is gone; make sure stragglers holding the pipes
                // go too.
                unsafe {
                    let _ = libc::kill(pgid, libc::SIGKILL);
                }
                return Ok(status);
            }
            thread::sleep(Duration::from_millis(10));
        }

        unsafe {
            let _ = libc::kill(pgid, libc::SIGKILL);
        }
        child.wait()
    }

    #[cfg(not(unix))]
    {
        let _ = grace;
        let _ = child.kill();
        child.wait()
    }
}

fn join_reader(
    handle: thread::JoinHandle<io::Result<(Vec<u8>, bool)>>,
    stream: &'static str,
) -> io::Result<io::Result<(Vec<u8>, bool)>> {
    handle
        .join()
        .map_err(|_| io::Error::other(format!("{stream} reader thread panicked")))
}

/// Drains `reader` to EOF, keeping the first `max_bytes` bytes.
fn read_bounded(mut reader: impl Read, max_bytes: usize) -> io::Result<(Vec<u8>, bool)> {
    let mut out = Vec::new();
    let mut truncated = false;
    let mut buf = [0u8; 8 * 1024];

    loop {
        let n = match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => n,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => return Err(err),
        };

        let keep = max_bytes.saturating_sub(out.len()).min(n);
        out.extend_from_slice(&buf[..keep]);
        truncated |= keep < n;
    }

    Ok((out, truncated))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_bounded_truncates_and_flags() {
        let input = vec![b'x'; 20_000];
        let (kept, truncated) = read_bounded(&input[..], 100).unwrap();
        assert_eq!(kept.len(), 100);
        assert!(truncated);

        let (kept, truncated) = read_bounded(&b"short"[..], 100).unwrap();
        assert_eq!(kept, b"short");
        assert!(!truncated);
    }

    #[test]
    fn combined_separates_streams_with_a_newline() {
        let output = BoundedOutput {
            stdout: "out".into(),
            stderr: "err\n".into(),
            ..BoundedOutput::default()
        };
        assert_eq!(output.combined(), "out\nerr\n");
        assert_eq!(output.lines().collect::<Vec<_>>(), vec!["out", "err"]);
    }

    #[test]
    fn complete_lines_drop_the_cut_off_tail() {
        let output = BoundedOutput {
            stdout: "first\nsecond\nthi".into(),
            stderr: "whole\nlast".into(),
            stdout_truncated: true,
            stderr_truncated: false,
        };
        assert!(output.truncated());
        assert_eq!(
            output.complete_lines().collect::<Vec<_>>(),
            vec!["first", "second", "whole", "last"]
        );

        let cut_at_newline = BoundedOutput {
            stdout: "first\n".into(),
            stdout_truncated: true,
            ..BoundedOutput::default()
        };
        assert_eq!(cut_at_newline.complete_lines().collect::<Vec<_>>(), vec!["first"]);

        let single_partial = BoundedOutput {
            stderr: "no newline".into(),
            stderr_truncated: true,
            ..BoundedOutput::default()
        };
        assert_eq!(single_partial.complete_lines().count(), 0);
    }

    #[test]
    fn display_quotes_arguments_with_spaces() {
        let spec = CommandSpec::new(
            Path::new("."),
            Path::new("javac"),
            &["-sourcepath".into(), "/tmp/my root".into()],
        );
        assert_eq!(spec.to_string(), "javac -sourcepath \"/tmp/my root\"");
    }
}
