use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use colored::Colorize;
use prodflow_client::{ApiClient, LogView};

use crate::cli::{LogDownloadArgs, LogShowArgs, OutputFormat};
use crate::output::{print_structured, print_success};

pub async fn list(client: &ApiClient, format: OutputFormat) -> Result<()> {
    let files = client.list_logs().await?;
    match format {
        OutputFormat::Table if files.is_empty() => println!("No log files found."),
        OutputFormat::Table => {
            for f in &files {
                println!("{f}");
            }
        }
        _ => print_structured(&files, format)?,
    }
    Ok(())
}

pub async fn show(client: &ApiClient, args: &LogShowArgs) -> Result<()> {
    let bytes = client.log_file(&args.file).await?;
    let view = if args.last { LogView::Last } else { LogView::Full };
    tracing::debug!(file = %args.file, size = bytes.len(), ?view, "rendering log");
    println!("{}", view.render(&bytes));
    Ok(())
}

pub async fn download(client: &ApiClient, args: &LogDownloadArgs) -> Result<()> {
    let target = destination(&args.file, args.output.as_deref())?;
    let bytes = client.log_file(&args.file).await?;
    fs::write(&target, &bytes)
        .with_context(|| format!("Failed to write {}", target.display()))?;
    print_success(&format!(
        "Saved {} ({} bytes) to {}",
        args.file.cyan(),
        bytes.len(),
        target.display()
    ));
    Ok(())
}

/// `--output` when given, otherwise the file's base name in the current directory.
fn destination(file: &str, output: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = output {
        return Ok(path.to_path_buf());
    }
    let name = Path::new(file)
        .file_name()
        .with_context(|| format!("Cannot derive a local file name from \"{file}\"; use --output"))?;
    Ok(PathBuf::from(name))
}
