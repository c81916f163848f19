use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::error::{AppError, Result};
use crate::remote::ContentSource;

/// Write-once local mirror of remote file contents.
///
/// A file that already exists on disk is returned as-is and never
/// re-fetched. Concurrent requests for the same path are not deduplicated;
/// the shell runs one command at a time.
pub struct ContentCache<S> {
    source: S,
}

impl<S: ContentSource> ContentCache<S> {
    pub fn new(source: S) -> Self {
        Self { source }
    }

    /// Content of `local_path`, downloading it from `locator` on a miss.
    pub async fn get(&self, local_path: &Path, locator: &str) -> Result<Vec<u8>> {
        if local_path.is_file() {
            log::debug!("cache hit {}", local_path.display());
            return fs::read(local_path).map_err(|e| AppError::cache_io(local_path, e));
        }

        log::debug!("cache miss {}", local_path.display());
        let content = self.source.fetch_content(locator).await?;
        if let Some(parent) = local_path.parent() {
            fs::create_dir_all(parent).map_err(|e| AppError::cache_io(parent, e))?;
        }
        write_whole(local_path, &content)?;
        Ok(content)
    }

    #[cfg(test)]
    pub fn source(&self) -> &S {
        &self.source
    }
}

/// Write `content` next to `path` and move it into place, so a failed write
/// never leaves a partial file that later reads would take as a hit.
fn write_whole(path: &Path, content: &[u8]) -> Result<()> {
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(|e| AppError::cache_io(dir, e))?;
    if let Err(e) = tmp.write_all(content).and_then(|_| tmp.flush()) {
        return Err(AppError::cache_io(path, e));
    }
    tmp.persist(path)
        .map_err(|e| AppError::cache_io(path, e.error))?;
    Ok(())
}

#[cfg(test)]
pub(crate) mod testing {
    use std::cell::RefCell;
    use std::collections::HashMap;

    use super::*;

    /// In-memory content source that records every fetch.
    #[derive(Default)]
    pub struct MemorySource {
        pub files: HashMap<String, Vec<u8>>,
        pub calls: RefCell<Vec<String>>,
    }

    impl MemorySource {
        pub fn with(files: &[(&str, &str)]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), v.as_bytes().to_vec()))
                    .collect(),
                calls: RefCell::new(Vec::new()),
            }
        }

        pub fn call_count(&self) -> usize {
            self.calls.borrow().len()
        }
    }

    impl ContentSource for MemorySource {
        async fn fetch_content(&self, locator: &str) -> Result<Vec<u8>> {
            self.calls.borrow_mut().push(locator.to_string());
            self.files
                .get(locator)
                .cloned()
                .ok_or_else(|| AppError::Fetch(format!("{} returned 404 Not Found", locator)))
        }
    }
}
