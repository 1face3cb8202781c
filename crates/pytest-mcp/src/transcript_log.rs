use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;

/// Append-only diagnostic log of every inbound request line.
///
/// Writes are best effort: a log failure must never take down the serve
/// loop, so errors are demoted to tracing output.
pub(crate) struct TranscriptLog {
    path: PathBuf,
}

impl TranscriptLog {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn append(&self, line: &str) {
        let outcome = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| writeln!(file, "{line}"));
        if let Err(error) = outcome {
            tracing::debug!(path = %self.path.display(), %error, "transcript append failed");
        }
    }
}
