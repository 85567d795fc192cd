//! blogsync: command-line client for a blog kept in a GitHub repository.
//!
//! Set BLOGSYNC_OWNER and BLOGSYNC_REPO (plus optional BLOGSYNC_* settings).
//! Commands that write need a token from --token or BLOGSYNC_TOKEN.

use anyhow::Context;
use blogsync_cli::{format_entry, init_tracing, print_json, resolve_token, save_download};
use blogsync_client::BlogClient;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "blogsync", about = "Read and publish blog posts stored in a GitHub repository")]
struct Cli {
    /// Write token (defaults to BLOGSYNC_TOKEN)
    #[arg(long, global = true)]
    token: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List a directory (the repository root when omitted)
    List {
        #[arg(default_value = "")]
        path: String,
    },
    /// List the posts directory
    Posts,
    /// List every path on the branch
    Tree,
    /// Print the latest text of a post
    Read { path: String },
    /// Create or update a post from a local file
    Write {
        /// Remote path, e.g. posts/hello.md
        path: String,
        /// Local file with the new text
        file: PathBuf,
    },
    /// Publish a local file as a new post under the next free name
    New { file: PathBuf },
    /// Print the next free post name for today
    NextName,
    /// Upload an image or other binary asset
    Upload {
        file: PathBuf,
        /// Folder under the images directory
        #[arg(long, default_value = "uploads")]
        folder: String,
    },
    /// Download a file into a local directory
    Download {
        path: String,
        #[arg(long, default_value = ".")]
        out: PathBuf,
    },
}

fn read_text(file: &PathBuf) -> anyhow::Result<String> {
    std::fs::read_to_string(file).with_context(|| format!("Read {}", file.display()))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let client = BlogClient::from_env()
        .context("Failed to create blog client. Set BLOGSYNC_OWNER and BLOGSYNC_REPO")?;

    match cli.command {
        Commands::List { path } => {
            let entries = client.list(&path).await?;
            if cli.json {
                print_json(&entries)?;
            } else {
                for entry in &entries {
                    println!("{}", format_entry(entry));
                }
            }
        }
        Commands::Posts => {
            let entries = client.list_posts().await?;
            if cli.json {
                print_json(&entries)?;
            } else {
                for entry in &entries {
                    println!("{}", format_entry(entry));
                }
            }
        }
        Commands::Tree => {
            let tree = client.list_tree().await?;
            if cli.json {
                print_json(&tree)?;
            } else {
                for entry in &tree {
                    println!("{}", entry.path);
                }
            }
        }
        Commands::Read { path } => {
            let text = client.read_post(&path).await?;
            print!("{}", text);
        }
        Commands::Write { path, file } => {
            let credentials = resolve_token(cli.token)?;
            let text = read_text(&file)?;
            let commit = client.write_post(&path, &text, &credentials).await?;
            print_json(&commit)?;
        }
        Commands::New { file } => {
            let credentials = resolve_token(cli.token)?;
            let text = read_text(&file)?;
            let commit = client.create_post(&text, &credentials).await?;
            print_json(&commit)?;
        }
        Commands::NextName => {
            let name = client.next_filename().await?;
            if cli.json {
                print_json(&name)?;
            } else {
                println!("{}", name);
            }
        }
        Commands::Upload { file, folder } => {
            let credentials = resolve_token(cli.token)?;
            let bytes =
                std::fs::read(&file).with_context(|| format!("Read {}", file.display()))?;
            let file_name = file
                .file_name()
                .and_then(|n| n.to_str())
                .context("Upload path has no usable file name")?;
            let reference = client
                .upload_asset(&bytes, file_name, &folder, &credentials)
                .await?;
            print_json(&reference)?;
        }
        Commands::Download { path, out } => {
            let file = client.download_file(&path).await?;
            let saved = save_download(&out, &file)?;
            tracing::info!(path = %path, saved = %saved.display(), "Download saved");
            println!("{}", saved.display());
        }
    }

    Ok(())
}
