use super::read_payload;
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use clause_editor::TemplateController;
use std::path::PathBuf;

#[derive(Args, Debug)]
pub struct SchemaArgs {
    /// Template file
    pub file: PathBuf,
}

pub fn schema(args: SchemaArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let payload = read_payload(&args.file)?;
    let controller = TemplateController::from_payload(payload, config.editor);
    println!("{}", serde_json::to_string_pretty(&controller.field_schema())?);
    Ok(())
}
