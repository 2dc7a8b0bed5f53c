use super::{find_template_files, read_payload};
use crate::config::Config;
use anyhow::Result;
use clap::Args;
use clause_editor::{duplicate_keys, TemplateController, TemplatePayload};
use colored::Colorize;
use std::path::{Path, PathBuf};

#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Template file or directory of template files
    pub input: PathBuf,
}

/// What loading a stored template produced
#[derive(Debug)]
pub struct TemplateReport {
    pub name: String,
    pub category: String,
    pub pages: usize,
    pub stored_fields: usize,
    pub fields: Vec<(String, String, String)>,
    pub collisions: Vec<String>,
}

pub fn inspect(args: InspectArgs, cwd: &str) -> Result<()> {
    let config = Config::load(cwd)?;
    let files = find_template_files(&args.input)?;
    println!("🔍 {} {} template file(s)", "Inspecting".green().bold(), files.len());
    println!();

    let mut collisions = 0;
    for file in &files {
        match read_payload(file) {
            Ok(payload) => {
                let report = build_report(payload, &config);
                collisions += report.collisions.len();
                print_report(file, &report);
            }
            Err(err) => println!("{} {}: {:#}", "✗".red(), file.display(), err),
        }
    }

    if collisions > 0 {
        println!("   {} {} colliding key(s)", "Warnings:".yellow(), collisions);
    }
    Ok(())
}

pub fn build_report(payload: TemplatePayload, config: &Config) -> TemplateReport {
    let stored_fields = payload.field_schema.len();
    let controller = TemplateController::from_payload(payload, config.editor.clone());
    let schema = controller.field_schema();

    TemplateReport {
        name: controller.name().to_string(),
        category: controller.category().to_string(),
        pages: controller.page_count(),
        stored_fields,
        collisions: duplicate_keys(&schema).into_iter().map(str::to_string).collect(),
        fields: schema
            .into_iter()
            .map(|f| (f.key, f.label, f.field_type.to_string()))
            .collect(),
    }
}

fn print_report(file: &Path, report: &TemplateReport) {
    println!("{}", file.display());
    println!("  {} {}", "name:".dimmed(), report.name.bright_white());
    println!("  {} {}", "category:".dimmed(), report.category);
    println!("  {} {}", "pages:".dimmed(), report.pages);
    println!(
        "  {} {} (stored schema: {})",
        "fields:".dimmed(),
        report.fields.len(),
        report.stored_fields
    );
    for (key, label, field_type) in &report.fields {
        println!("    {} {} [{}]", key.cyan(), label, field_type);
    }
    for key in &report.collisions {
        println!("  {} key {} is shared by several fields", "warning".yellow().bold(), key);
    }
    println!();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_report_counts_collisions() {
        let payload: TemplatePayload = serde_json::from_str(
            r#"{
                "name": "매매",
                "fieldSchema": [{"key": "성명", "label": "성명", "type": "text"}],
                "document": "<p>{{성명}}</p><!-- GENUINE_PAGE_BREAK --><p>{{성명}}</p>"
            }"#,
        )
        .unwrap();

        let report = build_report(payload, &Config::default());
        assert_eq!(report.pages, 2);
        assert_eq!(report.stored_fields, 1);
        assert_eq!(report.fields.len(), 2);
        assert_eq!(report.collisions, vec!["성명".to_string()]);
    }
}
