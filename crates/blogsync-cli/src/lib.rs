use anyhow::{bail, Context};
use blogsync_core::{ContentEntry, Credentials, DownloadedFile, EntryKind};
use serde::Serialize;
use std::path::{Path, PathBuf};

/// Initialize tracing for the CLI. Logs go to stderr so command output on
/// stdout stays machine-readable.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
}

pub fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

/// Write token from `--token`, falling back to BLOGSYNC_TOKEN.
pub fn resolve_token(flag: Option<String>) -> anyhow::Result<Credentials> {
    let token = flag
        .or_else(|| std::env::var("BLOGSYNC_TOKEN").ok())
        .filter(|t| !t.trim().is_empty())
        .context("A write token is required: pass --token or set BLOGSYNC_TOKEN")?;
    Ok(Credentials::new(token))
}

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// One line of `list` output: kind, size, name.
pub fn format_entry(entry: &ContentEntry) -> String {
    let kind = match entry.kind {
        EntryKind::Dir => "dir",
        EntryKind::File => "file",
        EntryKind::Symlink => "link",
        EntryKind::Submodule => "sub",
    };
    format!("{:<4} {:>10}  {}", kind, entry.size, truncate_string(&entry.name, 60))
}

/// Save a downloaded file under `dir` using its remote name.
pub fn save_download(dir: &Path, file: &DownloadedFile) -> anyhow::Result<PathBuf> {
    let name = file.name.trim();
    if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
        bail!("Refusing to save download under unsafe name {:?}", file.name);
    }

    std::fs::create_dir_all(dir)
        .with_context(|| format!("Create output directory {}", dir.display()))?;
    let target = dir.join(name);
    std::fs::write(&target, &file.bytes)
        .with_context(|| format!("Write {}", target.display()))?;
    Ok(target)
}
