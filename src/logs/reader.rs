use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};

use tracing::debug;

use crate::error::FeedError;

/// Reads engine log files addressed relative to a runtime root.
#[derive(Clone, Debug)]
pub struct LogReader {
    root: PathBuf,
}

impl LogReader {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn resolve(&self, relative: &Path) -> Result<PathBuf, FeedError> {
        let escapes = relative.components().any(|component| {
            matches!(
                component,
                Component::ParentDir | Component::RootDir | Component::Prefix(_)
            )
        });
        if escapes || relative.as_os_str().is_empty() {
            return Err(FeedError::OutsideRoot {
                path: relative.to_path_buf(),
            });
        }
        Ok(self.root.join(relative))
    }

    /// Last `max_lines` lines of the file. A missing file reads as empty.
    pub fn read_tail(&self, relative: &Path, max_lines: usize) -> Result<Vec<String>, FeedError> {
        let path = self.resolve(relative)?;
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(error) if error.kind() == ErrorKind::NotFound => {
                debug!(path = %path.display(), "log file not present yet");
                return Ok(Vec::new());
            }
            Err(source) => return Err(FeedError::Read { path, source }),
        };

        let text = String::from_utf8_lossy(&bytes);
        let lines = text.lines().collect::<Vec<_>>();
        let start = lines.len().saturating_sub(max_lines);
        Ok(lines[start..].iter().map(|line| (*line).to_owned()).collect())
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn reads_tail_of_file() {
        let dir = tempfile::tempdir().expect("temp dir");
        let mut file = fs::File::create(dir.path().join("reflection.log")).expect("create log");
        for index in 0..10 {
            writeln!(file, "line {index}").expect("write line");
        }

        let reader = LogReader::new(dir.path());
        let tail = reader
            .read_tail(Path::new("reflection.log"), 3)
            .expect("readable log");
        assert_eq!(tail, vec!["line 7", "line 8", "line 9"]);
    }

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().expect("temp dir");
        let reader = LogReader::new(dir.path());
        let tail = reader
            .read_tail(Path::new("runtime/logs/none.log"), 10)
            .expect("missing log reads as empty");
        assert!(tail.is_empty());
    }

    #[test]
    fn rejects_paths_outside_root() {
        let reader = LogReader::new("/tmp/engine");
        assert!(matches!(
            reader.resolve(Path::new("../secrets")),
            Err(FeedError::OutsideRoot { .. })
        ));
        assert!(matches!(
            reader.resolve(Path::new("/etc/passwd")),
            Err(FeedError::OutsideRoot { .. })
        ));
        assert_eq!(
            reader.resolve(Path::new("runtime/logs/a.log")).expect("inside root"),
            PathBuf::from("/tmp/engine/runtime/logs/a.log")
        );
    }
}
