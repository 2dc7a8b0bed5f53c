pub mod inspect;
pub mod new;
pub mod normalize;
pub mod schema;

pub use inspect::{inspect, InspectArgs};
pub use new::{new, NewArgs};
pub use normalize::{normalize, NormalizeArgs};
pub use schema::{schema, SchemaArgs};

use anyhow::{Context, Result};
use clause_editor::TemplatePayload;
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Read a stored template payload (current or legacy field names)
pub(crate) fn read_payload(path: &Path) -> Result<TemplatePayload> {
    let content = fs::read_to_string(path).with_context(|| format!("Cannot read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("{} is not a template file", path.display()))
}

/// The file itself, or every `.json` file below a directory
pub(crate) fn find_template_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        return Err(anyhow::anyhow!("Input path does not exist: {}", input.display()));
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input)
        .follow_links(true)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|e| e.ok())
    {
        let path = entry.path();
        if path.is_file() && path.extension().map(|e| e == "json").unwrap_or(false) {
            files.push(path.to_path_buf());
        }
    }

    Ok(files)
}
