use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context as AnyhowContext;
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::diagnostics::Warning;
use crate::error::{CmacsError, Result};
use crate::options::OutputPaths;

/// The header/implementation pair produced from one document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifacts {
  pub header: String,
  pub implementation: String,
  /// Non-fatal findings raised while producing the pair
  pub warnings: Vec<Warning>,
}

impl Artifacts {
  /// Write both files, or neither.
  ///
  /// Each file is staged next to its destination. The implementation is
  /// moved into place first; if the header then fails, the previous
  /// implementation (or its absence) is restored.
  pub fn write(&self, paths: &OutputPaths) -> Result<()> {
    let header = stage(&paths.header, &self.header)?;
    let implementation = stage(&paths.implementation, &self.implementation)?;

    let previous = fs::read_to_string(&paths.implementation).ok();

    implementation
      .persist(&paths.implementation)
      .with_context(|| format!("Failed to write to file: {}", paths.implementation.display()))
      .map_err(|e| write_failed(&paths.implementation, e))?;

    if let Err(e) = header.persist(&paths.header) {
      restore(&paths.implementation, previous.as_deref());
      return Err(write_failed(
        &paths.header,
        anyhow::Error::new(e)
          .context(format!("Failed to write to file: {}", paths.header.display())),
      ));
    }

    info!(
      header = %paths.header.display(),
      implementation = %paths.implementation.display(),
      "wrote artifacts"
    );
    Ok(())
  }
}

fn write_failed(path: &Path, source: anyhow::Error) -> CmacsError {
  CmacsError::WriteFailed {
    path: PathBuf::from(path),
    source,
  }
}

/// Put back what was at `path` before this run
fn restore(path: &Path, previous: Option<&str>) {
  let result = match previous {
    Some(content) => fs::write(path, content),
    None => fs::remove_file(path),
  };
  if let Err(e) = result {
    warn!(path = %path.display(), error = %e, "could not restore previous file");
  }
}

fn stage(path: &Path, content: &str) -> Result<NamedTempFile> {
  let dir = match path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };
  let staged = (|| -> anyhow::Result<NamedTempFile> {
    let mut file = NamedTempFile::new_in(dir)
      .with_context(|| format!("Failed to create a temporary file in {}", dir.display()))?;
    file.write_all(content.as_bytes())?;
    file.flush()?;
    Ok(file)
  })();

  let file = staged
    .with_context(|| format!("Failed to stage {}", path.display()))
    .map_err(|e| write_failed(path, e))?;
  debug!(path = %path.display(), bytes = content.len(), "staged artifact");
  Ok(file)
}
