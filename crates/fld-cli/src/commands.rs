use std::sync::Arc;

use anyhow::Context;
use colored::Colorize;

use fld_store::{FieldStore, FileLog, StoreError, TracingLogger};
use fld_types::Field;

use crate::cli::*;
use crate::settings::Settings;

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let settings = Settings::load(cli.config.as_deref())?;
    let path = settings.log_path(cli.file);
    let log = FileLog::new(&path, settings.store.log_config());
    let store = FieldStore::with_log(Arc::new(log), settings.store, Arc::new(TracingLogger));
    store
        .await_ready()
        .await
        .with_context(|| format!("opening field store at {}", path.display()))?;

    match cli.command {
        Command::List(_) => cmd_list(&store, cli.format).await,
        Command::Get(args) => cmd_get(&store, args, cli.format).await,
        Command::Add(args) => cmd_add(&store, args).await,
        Command::Remove(args) => cmd_remove(&store, args).await,
        Command::Check(_) => cmd_check(&store, cli.format).await,
    }
}

async fn cmd_list(store: &FieldStore, format: OutputFormat) -> anyhow::Result<()> {
    let fields = store.list().await?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&fields)?),
        OutputFormat::Text if fields.is_empty() => println!("No fields."),
        OutputFormat::Text => {
            for field in &fields {
                print_field(field);
            }
        }
    }
    Ok(())
}

async fn cmd_get(store: &FieldStore, args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let field = store
        .get(&args.name)
        .await?
        .ok_or(StoreError::NotFound { name: args.name })?;
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&field)?),
        OutputFormat::Text => print_field(&field),
    }
    Ok(())
}

async fn cmd_add(store: &FieldStore, args: AddArgs) -> anyhow::Result<()> {
    let mut field = Field::new(args.name, args.value);
    if let Some(comment) = args.comment {
        field = field.with_comment(comment);
    }
    let name = field.name.clone();
    store.add(field).await?;
    println!("{} Added {}", "✓".green().bold(), name.yellow());
    Ok(())
}

async fn cmd_remove(store: &FieldStore, args: RemoveArgs) -> anyhow::Result<()> {
    let removed = store.remove(&args.name).await?;
    println!("{} Removed {}", "✓".green().bold(), removed.name.yellow());
    Ok(())
}

async fn cmd_check(store: &FieldStore, format: OutputFormat) -> anyhow::Result<()> {
    let report = store.load_report().await.unwrap_or_default();
    if format == OutputFormat::Json {
        let summary = serde_json::json!({
            "location": store.location(),
            "created": report.created,
            "lines": report.total_lines,
            "loaded": report.loaded,
            "failed": report.failed,
            "duplicates": report.duplicates,
        });
        println!("{}", serde_json::to_string_pretty(&summary)?);
        return Ok(());
    }

    println!("Log: {}", store.location().bold());
    if report.created {
        println!("  {}", "created (was missing)".cyan());
    }
    println!("  Fields: {}", report.loaded.to_string().bold());
    println!("  Lines:  {}", report.total_lines);
    if report.failed == 0 && report.duplicates == 0 {
        println!("{} No issues.", "✓".green().bold());
    } else {
        println!(
            "{} {} unreadable, {} duplicate (ignored)",
            "!".red().bold(),
            report.failed,
            report.duplicates
        );
    }
    Ok(())
}

fn print_field(field: &Field) {
    let mut lines = field.value.lines();
    let first = lines.next().unwrap_or("");
    print!("{} = {}", field.name.yellow().bold(), first);
    if let Some(comment) = &field.comment {
        print!("  {}", format!("# {comment}").dimmed());
    }
    println!();
    for line in lines {
        println!("    {line}");
    }
}
