//! Media ingest port, the one pipeline step owned by an external process
//!
//! The production implementation shells out to the configured script; tests
//! swap in an in-memory stub so pipeline behavior is deterministic without a
//! real script. The contract is exit code plus stderr only.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// How much of stderr is carried into the error detail.
const STDERR_TAIL_BYTES: usize = 2048;

#[derive(Debug, Error)]
pub enum MediaIngestError {
    #[error("ingest script exited with status {code}: {stderr_tail}")]
    ScriptFailed { code: i32, stderr_tail: String },

    #[error("ingest script was terminated by a signal")]
    Killed,

    #[error("ingest script timed out after {0:?}")]
    TimedOut(Duration),

    #[error("failed to spawn ingest script: {0}")]
    Spawn(#[from] std::io::Error),
}

/// Port for republishing moved images into the serving/caching layer.
#[async_trait]
pub trait MediaIngest: Send + Sync {
    /// One synchronous, blocking invocation per publish run. The SPU list is
    /// the full *requested* set, not just the successfully moved folders.
    async fn ingest(
        &self,
        spus: &[String],
        source: &Path,
        dest: &Path,
    ) -> Result<(), MediaIngestError>;
}

/// Production implementation: spawns the configured script with
/// `--source`, `--dest` and a comma-separated `--spu` list.
pub struct ScriptMediaIngest {
    script: PathBuf,
    timeout: Duration,
}

impl ScriptMediaIngest {
    pub fn new(script: PathBuf, timeout: Duration) -> Self {
        Self { script, timeout }
    }
}

fn tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let trimmed = text.trim();
    if trimmed.len() <= STDERR_TAIL_BYTES {
        return trimmed.to_string();
    }
    let start = trimmed.len() - STDERR_TAIL_BYTES;
    // Keep to a char boundary.
    let start = (start..trimmed.len())
        .find(|i| trimmed.is_char_boundary(*i))
        .unwrap_or(start);
    trimmed[start..].to_string()
}

#[async_trait]
impl MediaIngest for ScriptMediaIngest {
    async fn ingest(
        &self,
        spus: &[String],
        source: &Path,
        dest: &Path,
    ) -> Result<(), MediaIngestError> {
        let mut command = Command::new(&self.script);
        command
            .arg("--source")
            .arg(source)
            .arg("--dest")
            .arg(dest)
            .arg("--spu")
            .arg(spus.join(","))
            .kill_on_drop(true);

        tracing::info!(
            script = %self.script.display(),
            spus = spus.len(),
            "Invoking media ingest script"
        );

        let output = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| MediaIngestError::TimedOut(self.timeout))??;

        if output.status.success() {
            return Ok(());
        }
        match output.status.code() {
            Some(code) => Err(MediaIngestError::ScriptFailed {
                code,
                stderr_tail: tail(&output.stderr),
            }),
            None => Err(MediaIngestError::Killed),
        }
    }
}

#[cfg(test)]
pub(crate) mod stub {
    use super::*;
    use std::sync::Mutex;

    /// Records invocations and returns a pre-configured result.
    pub struct StubMediaIngest {
        pub result: Option<MediaIngestError>,
        pub calls: Mutex<Vec<Vec<String>>>,
    }

    impl StubMediaIngest {
        pub fn succeeding() -> Self {
            Self {
                result: None,
                calls: Mutex::new(Vec::new()),
            }
        }

        pub fn failing(code: i32, stderr_tail: &str) -> Self {
            Self {
                result: Some(MediaIngestError::ScriptFailed {
                    code,
                    stderr_tail: stderr_tail.to_string(),
                }),
                calls: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl MediaIngest for StubMediaIngest {
        async fn ingest(
            &self,
            spus: &[String],
            _source: &Path,
            _dest: &Path,
        ) -> Result<(), MediaIngestError> {
            self.calls.lock().unwrap().push(spus.to_vec());
            match &self.result {
                None => Ok(()),
                Some(MediaIngestError::ScriptFailed { code, stderr_tail }) => {
                    Err(MediaIngestError::ScriptFailed {
                        code: *code,
                        stderr_tail: stderr_tail.clone(),
                    })
                }
                Some(MediaIngestError::Killed) => Err(MediaIngestError::Killed),
                Some(MediaIngestError::TimedOut(d)) => Err(MediaIngestError::TimedOut(*d)),
                Some(MediaIngestError::Spawn(_)) => {
                    Err(MediaIngestError::Spawn(std::io::Error::other("stub")))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn stub_records_calls_through_the_trait_object() {
        use std::sync::Arc;

        let stub = Arc::new(stub::StubMediaIngest::succeeding());
        let ingest: Arc<dyn MediaIngest> = stub.clone();
        ingest
            .ingest(&["AB100".into()], Path::new("/src"), Path::new("/dst"))
            .await
            .unwrap();
        assert_eq!(*stub.calls.lock().unwrap(), vec![vec!["AB100".to_string()]]);

        let failing: Arc<dyn MediaIngest> = Arc::new(stub::StubMediaIngest::failing(2, "boom"));
        let err = failing
            .ingest(&["AB100".into()], Path::new("/src"), Path::new("/dst"))
            .await
            .unwrap_err();
        assert!(matches!(err, MediaIngestError::ScriptFailed { code: 2, .. }));
    }

    #[test]
    fn tail_keeps_short_stderr_intact() {
        assert_eq!(tail(b"disk full\n"), "disk full");
    }

    #[test]
    fn tail_truncates_long_stderr_from_the_front() {
        let long = "x".repeat(STDERR_TAIL_BYTES * 2);
        let tailed = tail(long.as_bytes());
        assert_eq!(tailed.len(), STDERR_TAIL_BYTES);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_script_surfaces_code_and_stderr() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let script = tmp.path().join("ingest.sh");
        std::fs::write(&script, "#!/bin/sh\necho 'disk full' >&2\nexit 1\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ingest = ScriptMediaIngest::new(script, Duration::from_secs(10));
        let err = ingest
            .ingest(&["AB100".into()], tmp.path(), tmp.path())
            .await
            .unwrap_err();

        match err {
            MediaIngestError::ScriptFailed { code, stderr_tail } => {
                assert_eq!(code, 1);
                assert!(stderr_tail.contains("disk full"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn succeeding_script_passes_the_spu_list() {
        use std::os::unix::fs::PermissionsExt;

        let tmp = tempfile::TempDir::new().unwrap();
        let script = tmp.path().join("ingest.sh");
        let marker = tmp.path().join("args.txt");
        std::fs::write(
            &script,
            format!("#!/bin/sh\necho \"$@\" > {}\nexit 0\n", marker.display()),
        )
        .unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let ingest = ScriptMediaIngest::new(script, Duration::from_secs(10));
        ingest
            .ingest(
                &["AB100".into(), "CD200".into()],
                Path::new("/src"),
                Path::new("/dst"),
            )
            .await
            .unwrap();

        let args = std::fs::read_to_string(&marker).unwrap();
        assert!(args.contains("--spu AB100,CD200"));
        assert!(args.contains("--source /src"));
        assert!(args.contains("--dest /dst"));
    }
}
