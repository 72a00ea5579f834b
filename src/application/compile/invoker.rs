use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
    process::Stdio,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use tokio::{fs, io::AsyncReadExt, process::Command};
use tracing::{info, warn};

use super::types::{InvokeError, PageCompiler};

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_PAGE_PATTERN: &str = "page{p}.svg";

/// Runs the `typst` command-line compiler as a supervised subprocess.
#[derive(Debug, Clone)]
pub struct TypstCli {
    program: PathBuf,
    timeout: Duration,
    page_pattern: String,
}

impl TypstCli {
    pub fn new(program: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            program: program.into(),
            timeout,
            page_pattern: DEFAULT_PAGE_PATTERN.to_string(),
        }
    }

    pub fn with_page_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.page_pattern = pattern.into();
        self
    }

    fn command(&self, input: &Path, output_dir: &Path) -> Command {
        let mut command = Command::new(&self.program);
        command
            .arg("compile")
            .arg("--format")
            .arg("svg")
            .arg(input)
            .arg(output_dir.join(&self.page_pattern))
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        #[cfg(unix)]
        command.process_group(0);
        command
    }
}

#[async_trait]
impl PageCompiler for TypstCli {
    async fn compile_pages(
        &self,
        input: &Path,
        output_dir: &Path,
    ) -> Result<Vec<String>, InvokeError> {
        let started_at = Instant::now();
        let mut child = self.command(input, output_dir).spawn().map_err(|err| {
            warn!(
                target = "application::compile::cli",
                op = "typst_cli::compile_pages",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error_code = "spawn_cli",
                program = %self.program.display(),
                error = %err,
                "Failed to spawn Typst CLI"
            );
            if err.kind() == ErrorKind::NotFound {
                InvokeError::NotFound
            } else {
                InvokeError::Io(err)
            }
        })?;

        let mut stderr_pipe = child.stderr.take();
        let supervised = tokio::time::timeout(self.timeout, async {
            let mut stderr = Vec::new();
            if let Some(pipe) = stderr_pipe.as_mut() {
                pipe.read_to_end(&mut stderr).await?;
            }
            let status = child.wait().await?;
            Ok::<_, std::io::Error>((status, stderr))
        })
        .await;

        let (status, stderr) = match supervised {
            Ok(result) => result?,
            Err(_) => {
                #[cfg(unix)]
                if let Some(pid) = child.id() {
                    kill_process_group(pid);
                }
                if let Err(err) = child.kill().await {
                    warn!(
                        target = "application::compile::cli",
                        op = "typst_cli::compile_pages",
                        error = %err,
                        "Failed to kill timed out Typst CLI"
                    );
                }
                warn!(
                    target = "application::compile::cli",
                    op = "typst_cli::compile_pages",
                    result = "error",
                    elapsed_ms = started_at.elapsed().as_millis() as u64,
                    error_code = "timeout",
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Typst CLI timed out"
                );
                return Err(InvokeError::Timeout(self.timeout));
            }
        };

        if !status.success() {
            let exit_code = status.code();
            let stderr = String::from_utf8_lossy(&stderr).into_owned();
            info!(
                target = "application::compile::cli",
                op = "typst_cli::compile_pages",
                result = "rejected",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                exit_code = exit_code.map(i64::from).unwrap_or(-1),
                stderr_bytes = stderr.len(),
                "Typst CLI reported a compile failure"
            );
            return Err(InvokeError::ProcessFailed { exit_code, stderr });
        }

        let pages = read_pages(output_dir, &self.page_pattern).await?;
        if pages.is_empty() {
            warn!(
                target = "application::compile::cli",
                op = "typst_cli::compile_pages",
                result = "error",
                elapsed_ms = started_at.elapsed().as_millis() as u64,
                error_code = "no_output",
                output_dir = %output_dir.display(),
                "Typst CLI succeeded without writing pages"
            );
            return Err(InvokeError::NoOutput);
        }

        info!(
            target = "application::compile::cli",
            op = "typst_cli::compile_pages",
            result = "success",
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            pages = pages.len(),
            "Typst document compiled via CLI"
        );
        Ok(pages)
    }
}

/// The compiler runs as the leader of its own process group; anything it
/// spawned is killed with it.
#[cfg(unix)]
fn kill_process_group(pid: u32) {
    use nix::{
        sys::signal::{Signal, killpg},
        unistd::Pid,
    };

    let Ok(raw) = i32::try_from(pid) else {
        return;
    };
    if let Err(errno) = killpg(Pid::from_raw(raw), Signal::SIGKILL) {
        warn!(
            target = "application::compile::cli",
            op = "typst_cli::compile_pages",
            pid = pid,
            error = %errno,
            "Failed to kill Typst CLI process group"
        );
    }
}

/// Reads every `.svg` file in `dir`, ordered by the page number embedded in
/// the file name. Lexical order would put `page10` before `page2`.
async fn read_pages(dir: &Path, pattern: &str) -> Result<Vec<String>, InvokeError> {
    let mut entries = fs::read_dir(dir).await?;
    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some("svg") {
            continue;
        }
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .unwrap_or_default()
            .to_string();
        files.push((page_index(&stem, pattern).unwrap_or(u32::MAX), stem, path));
    }
    files.sort();

    let mut pages = Vec::with_capacity(files.len());
    for (_, _, path) in files {
        pages.push(fs::read_to_string(&path).await?);
    }
    Ok(pages)
}

/// Page number of a file stem written for `pattern`. The digits right after
/// the literal text preceding `{p}`/`{0p}` win, so `page3-of-{t}` sorts by 3
/// rather than by the page total.
fn page_index(stem: &str, pattern: &str) -> Option<u32> {
    let pattern_stem = pattern.strip_suffix(".svg").unwrap_or(pattern);
    let placeholder_at = ["{p}", "{0p}"]
        .iter()
        .filter_map(|placeholder| pattern_stem.find(placeholder))
        .min();
    match placeholder_at {
        Some(at) if !pattern_stem[..at].contains('{') => {
            let rest = stem.strip_prefix(&pattern_stem[..at])?;
            let digits = rest.len() - rest.trim_start_matches(|c: char| c.is_ascii_digit()).len();
            rest[..digits].parse().ok()
        }
        _ => trailing_index(stem),
    }
}

/// Trailing page number of a file stem: `page12` → 12, `page-03` → 3.
fn trailing_index(stem: &str) -> Option<u32> {
    let trimmed = stem.trim_end_matches(|c: char| !c.is_ascii_digit());
    let digits_start = trimmed.trim_end_matches(|c: char| c.is_ascii_digit()).len();
    trimmed[digits_start..].parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn page_index_reads_trailing_digits() {
        assert_eq!(page_index("page1", DEFAULT_PAGE_PATTERN), Some(1));
        assert_eq!(page_index("page12", DEFAULT_PAGE_PATTERN), Some(12));
        assert_eq!(page_index("doc-007", "doc-{0p}.svg"), Some(7));
        assert_eq!(page_index("page", DEFAULT_PAGE_PATTERN), None);
    }

    #[test]
    fn page_index_ignores_page_total() {
        assert_eq!(page_index("page3-of-12", "page{p}-of-{t}.svg"), Some(3));
        assert_eq!(page_index("12-page03", "{t}-page{0p}.svg"), Some(3));
        assert_eq!(page_index("sheet1", "page{p}.svg"), None);
    }

    #[tokio::test]
    async fn missing_binary_maps_to_not_found() {
        let dir = tempfile::TempDir::new().expect("temp dir");
        let input = dir.path().join("in.typ");
        std::fs::write(&input, "= Hi").expect("write input");

        let cli = TypstCli::new(dir.path().join("no-such-typst"), DEFAULT_TIMEOUT);
        let err = cli
            .compile_pages(&input, dir.path())
            .await
            .expect_err("missing binary");
        assert!(matches!(err, InvokeError::NotFound), "got {err:?}");
    }
}

#[cfg(all(test, unix))]
mod unix_tests {
    use super::*;
    use std::{fs, os::unix::fs::PermissionsExt};
    use tempfile::TempDir;

    fn write_script(dir: &Path, body: &str) -> PathBuf {
        let path = dir.join("fake-typst");
        fs::write(&path, format!("#!/bin/sh\nset -eu\n{body}")).expect("write script");
        let mut perms = fs::metadata(&path).expect("metadata").permissions();
        perms.set_mode(0o755);
        fs::set_permissions(&path, perms).expect("set perms");
        path
    }

    fn job_dirs(dir: &Path) -> (PathBuf, PathBuf) {
        let input = dir.join("job.typ");
        fs::write(&input, "= Hello").expect("write input");
        let output = dir.join("pages");
        fs::create_dir(&output).expect("pages dir");
        (input, output)
    }

    #[tokio::test]
    async fn returns_pages_in_numeric_order() {
        let dir = TempDir::new().expect("temp dir");
        let script = write_script(
            dir.path(),
            r#"args_ok="$1 $2 $3"
[ "$args_ok" = "compile --format svg" ] || { echo "bad args: $*" >&2; exit 2; }
out_dir=$(dirname "$5")
for n in 2 10 1; do
  printf '<svg>page %s</svg>' "$n" > "$out_dir/page$n.svg"
done
"#,
        );
        let (input, output) = job_dirs(dir.path());

        let pages = TypstCli::new(script, DEFAULT_TIMEOUT)
            .compile_pages(&input, &output)
            .await
            .expect("pages");

        assert_eq!(
            pages,
            vec![
                "<svg>page 1</svg>".to_string(),
                "<svg>page 2</svg>".to_string(),
                "<svg>page 10</svg>".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn passes_page_pattern_to_cli() {
        let dir = TempDir::new().expect("temp dir");
        let script = write_script(
            dir.path(),
            r#"case "$5" in
  */sheet-{p}.svg) ;;
  *) echo "unexpected pattern $5" >&2; exit 3 ;;
esac
out_dir=$(dirname "$5")
printf '<svg/>' > "$out_dir/sheet-1.svg"
"#,
        );
        let (input, output) = job_dirs(dir.path());

        let pages = TypstCli::new(script, DEFAULT_TIMEOUT)
            .with_page_pattern("sheet-{p}.svg")
            .compile_pages(&input, &output)
            .await
            .expect("pages");
        assert_eq!(pages.len(), 1);
    }

    #[tokio::test]
    async fn nonzero_exit_surfaces_stderr() {
        let dir = TempDir::new().expect("temp dir");
        let script = write_script(
            dir.path(),
            "echo 'error: unknown variable: foo' >&2\nexit 42\n",
        );
        let (input, output) = job_dirs(dir.path());

        let err = TypstCli::new(script, DEFAULT_TIMEOUT)
            .compile_pages(&input, &output)
            .await
            .expect_err("failure");
        match err {
            InvokeError::ProcessFailed { exit_code, stderr } => {
                assert_eq!(exit_code, Some(42));
                assert!(stderr.contains("unknown variable: foo"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn success_without_pages_is_no_output() {
        let dir = TempDir::new().expect("temp dir");
        let script = write_script(dir.path(), "exit 0\n");
        let (input, output) = job_dirs(dir.path());

        let err = TypstCli::new(script, DEFAULT_TIMEOUT)
            .compile_pages(&input, &output)
            .await
            .expect_err("no output");
        assert!(matches!(err, InvokeError::NoOutput), "got {err:?}");
    }

    #[tokio::test]
    async fn slow_compiler_is_killed_at_timeout() {
        let dir = TempDir::new().expect("temp dir");
        let pid_file = dir.path().join("pid");
        let script = write_script(
            dir.path(),
            &format!("echo $$ > '{}'\nexec sleep 30\n", pid_file.display()),
        );
        let (input, output) = job_dirs(dir.path());

        let started_at = Instant::now();
        let err = TypstCli::new(script, Duration::from_millis(500))
            .compile_pages(&input, &output)
            .await
            .expect_err("timeout");
        assert!(matches!(err, InvokeError::Timeout(_)), "got {err:?}");
        assert!(started_at.elapsed() < Duration::from_secs(10));

        let pid = fs::read_to_string(&pid_file).expect("pid file");
        let alive = std::process::Command::new("kill")
            .arg("-0")
            .arg(pid.trim())
            .stderr(Stdio::null())
            .status()
            .expect("run kill");
        assert!(!alive.success(), "timed out compiler still running");
    }
}
