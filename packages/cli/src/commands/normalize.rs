use super::read_payload;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use clause_editor::{EditorConfig, PersistenceError, TemplateController, TemplatePayload};
use clause_markup::split_pages;
use colored::Colorize;
use std::fs;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct NormalizeArgs {
    /// Template file
    pub file: PathBuf,

    /// Output file (defaults to rewriting the input)
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn normalize(args: NormalizeArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let payload = read_payload(&args.file)?;
    let output = args.output.unwrap_or_else(|| args.file.clone());

    let normalized = normalize_payload(payload, config.editor, |payload| {
        let json = serde_json::to_string_pretty(payload).map_err(|err| PersistenceError::Backend(err.to_string()))?;
        fs::write(&output, json).map_err(|err| PersistenceError::Backend(err.to_string()))
    })?;

    println!(
        "{} {} ({} page(s), {} field(s))",
        "✓".green(),
        output.display(),
        split_pages(&normalized.document).len(),
        normalized.field_schema.len()
    );
    Ok(())
}

/// Reload `payload` through the editor and hand the re-saved form to `write`
pub fn normalize_payload<F>(payload: TemplatePayload, config: EditorConfig, write: F) -> Result<TemplatePayload>
where
    F: FnOnce(&TemplatePayload) -> Result<(), PersistenceError>,
{
    let mut controller = TemplateController::from_payload(payload, config);
    let request = controller.begin_save()?;
    let written = write(&request.payload);
    controller.complete_save(written.map(|_| None))?;
    Ok(request.payload)
}
