use crate::config::Config;
use crate::store::FileAdapter;
use anyhow::Result;
use clap::Args;
use clause_editor::TemplateController;
use colored::Colorize;

#[derive(Args, Debug)]
pub struct NewArgs {
    /// Template name
    pub name: String,

    /// Category (defaults to the configured default category)
    #[arg(short, long)]
    pub category: Option<String>,
}

pub async fn new(args: NewArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let adapter = FileAdapter::new(config.get_storage_dir(cwd));

    let mut controller = TemplateController::new(config.editor);
    controller.set_name(args.name);
    if let Some(category) = args.category {
        controller.set_category(category);
    }
    let id = controller.save(&adapter).await?;

    println!("{} Created template {}", "✓".green(), id.bright_white());
    println!("   {}", adapter.path_for(&id).display());
    Ok(())
}
