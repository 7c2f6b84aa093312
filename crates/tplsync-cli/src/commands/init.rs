//! Init command implementation

use std::path::Path;

use colored::Colorize;

use tplsync_fs::{NormalizedPath, io};

use crate::error::{CliError, Result};

const STARTER_CONFIG: &str = r#"version: "1"
sources: {}
files: []
repositories:
  - _comment: example repository
    url: https://example.com/
    files:
      - file_name: path/to/file
        out_dir: .
        rename: file
"#;

/// Run the init command
///
/// Refuses to overwrite an existing file.
pub fn run_init(config_path: &Path) -> Result<()> {
    let path = NormalizedPath::new(config_path);
    if path.exists() {
        return Err(CliError::config(format!(
            "{} already exists",
            config_path.display()
        )));
    }

    io::write_file(&path, STARTER_CONFIG.as_bytes(), 0o644)?;
    println!("{} initialized: {}", "OK".green().bold(), config_path.display());
    Ok(())
}
