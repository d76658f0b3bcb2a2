// Copyright (c) 2025 TexasFortress.AI
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

//! Command line front end for the folder panel.
//!
//! Usage:
//!   mailpanel tree --account <id> [--expand-all]
//!   mailpanel toggle --account <id> --path <folder>
//!   mailpanel mark-read|empty|delete --account <id> --path <folder>
//!   mailpanel watch --account <id> [--seconds <n>]
//!
//! Accounts live in a data directory (`--data-dir` or `MAILPANEL_DATA_DIR`),
//! one sub-directory per account holding `folders.json` and `counts.json`.
//! `watch` also reads live count changes from stdin, one JSON object per line
//! (`{"path": "INBOX", "unseen_count": 3}`).

use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use clap::{Parser, Subcommand};
use log::{debug, error, info, warn};
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use mailpanel::config::Settings;
use mailpanel::error::PanelError;
use mailpanel::folders::ExpansionStore;
use mailpanel::gateway::{ChangeFeed, JsonFileGateway, Topic};
use mailpanel::panel::{FolderPanel, PanelView};

#[derive(Parser)]
#[command(name = "mailpanel", about = "Folder hierarchy and unread counts for mail accounts")]
struct Cli {
    /// Directory holding one sub-directory per account
    #[arg(long, env = "MAILPANEL_DATA_DIR", default_value = "data/accounts")]
    data_dir: PathBuf,

    /// Optional TOML configuration file
    #[arg(long, env = "MAILPANEL_CONFIG")]
    config: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the visible folder tree
    Tree {
        #[arg(long)]
        account: String,
        /// Expand every folder with children before printing
        #[arg(long)]
        expand_all: bool,
    },
    /// Expand or collapse a folder
    Toggle {
        #[arg(long)]
        account: String,
        #[arg(long)]
        path: String,
    },
    /// Mark every message in a folder as read
    MarkRead {
        #[arg(long)]
        account: String,
        #[arg(long)]
        path: String,
    },
    /// Remove every message from a folder
    Empty {
        #[arg(long)]
        account: String,
        #[arg(long)]
        path: String,
    },
    /// Delete a folder and its subfolders
    Delete {
        #[arg(long)]
        account: String,
        #[arg(long)]
        path: String,
    },
    /// Keep the tree live: poll counts and apply changes read from stdin
    Watch {
        #[arg(long)]
        account: String,
        /// Stop after this many seconds (runs until stdin closes otherwise)
        #[arg(long)]
        seconds: Option<u64>,
    },
}

impl Command {
    fn account(&self) -> &str {
        match self {
            Command::Tree { account, .. }
            | Command::Toggle { account, .. }
            | Command::MarkRead { account, .. }
            | Command::Empty { account, .. }
            | Command::Delete { account, .. }
            | Command::Watch { account, .. } => account,
        }
    }
}

fn print_view(view: &PanelView) {
    println!("{} (inbox: {} unread)", view.account_id, view.inbox_unread);
    if let Some(err) = &view.listing_error {
        println!("  folder listing failed: {}", err);
        if view.retryable {
            println!("  run the command again to retry");
        }
        return;
    }
    for row in &view.rows {
        let marker = match (row.has_children, row.expanded) {
            (false, _) => ' ',
            (true, true) => '-',
            (true, false) => '+',
        };
        let name = row.folder.display_name.as_str();
        if row.unread > 0 {
            println!("{}{} {} ({})", "  ".repeat(row.level + 1), marker, name, row.unread);
        } else {
            println!("{}{} {}", "  ".repeat(row.level + 1), marker, name);
        }
    }
}

/// Reads lines on a detached OS thread. A blocked read never holds up
/// runtime shutdown; the thread ends with the process.
fn spawn_line_reader<R>(reader: R) -> mpsc::UnboundedReceiver<String>
where
    R: BufRead + Send + 'static,
{
    let (tx, rx) = mpsc::unbounded_channel();
    let spawned = thread::Builder::new()
        .name("stdin-reader".to_string())
        .spawn(move || {
            for line in reader.lines() {
                match line {
                    Ok(line) => {
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Err(e) => {
                        error!("Failed to read stdin: {}", e);
                        break;
                    }
                }
            }
        });
    if let Err(e) = spawned {
        error!("Failed to start stdin reader: {}", e);
    }
    rx
}

fn publish_line(feed: &ChangeFeed, account_id: &str, line: &str) -> usize {
    if line.trim().is_empty() {
        return 0;
    }
    match serde_json::from_str::<Value>(line) {
        Ok(payload) => feed.publish(account_id, Topic::UnseenCounts, payload),
        Err(e) => {
            warn!("Ignoring non-JSON input line: {}", e);
            0
        }
    }
}

async fn watch(
    panel: Arc<FolderPanel>,
    feed: ChangeFeed,
    account_id: &str,
    seconds: Option<u64>,
) -> Result<(), PanelError> {
    let account = panel.account(account_id)?;
    let mut changes = account.subscribe_changes();
    panel.activate(account_id)?;

    let shutdown = CancellationToken::new();
    let poll = panel.clone().start_background_poll(shutdown.clone());

    let mut input = spawn_line_reader(std::io::BufReader::new(std::io::stdin()));

    if let Some(secs) = seconds {
        let timer_shutdown = shutdown.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            timer_shutdown.cancel();
        });
    }

    print_view(&panel.render(account_id).await?);
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                shutdown.cancel();
                break;
            }
            line = input.recv() => match line {
                Some(line) => {
                    publish_line(&feed, account_id, &line);
                }
                None => {
                    debug!("stdin closed");
                    shutdown.cancel();
                    break;
                }
            },
            changed = changes.changed() => {
                if changed.is_err() {
                    break;
                }
                print_view(&panel.render(account_id).await?);
            }
        }
    }

    if let Err(e) = poll.await {
        debug!("Poll task ended: {}", e);
    }
    panel.deactivate(account_id);
    Ok(())
}

async fn run(cli: Cli, settings: Settings) -> Result<(), PanelError> {
    let gateway = Arc::new(JsonFileGateway::new(&cli.data_dir));
    let feed = ChangeFeed::new();
    let store = Arc::new(ExpansionStore::new(settings.expansion_state_path()));
    store.initialize().await?;

    let panel = Arc::new(FolderPanel::new(
        &settings,
        gateway.clone(),
        Arc::new(feed.clone()),
        store,
    ));

    let account_id = cli.command.account().to_string();
    let known = gateway.account_ids().await?;
    if !known.contains(&account_id) {
        return Err(PanelError::UnknownAccount(account_id));
    }
    let inbox_path = settings.inbox_path_for(&account_id);
    panel.add_account(&account_id, Some(&inbox_path)).await?;

    match cli.command {
        Command::Tree { account, expand_all } => {
            if expand_all {
                panel.expand_all(&account).await?;
            }
            print_view(&panel.render(&account).await?);
        }
        Command::Toggle { account, path } => {
            let expanded = panel.toggle_expanded(&account, &path).await?;
            info!("{} is now {}", path, if expanded { "expanded" } else { "collapsed" });
            print_view(&panel.render(&account).await?);
        }
        Command::MarkRead { account, path } => {
            panel.mark_all_read(&account, &path).await?;
            print_view(&panel.render(&account).await?);
        }
        Command::Empty { account, path } => {
            panel.empty(&account, &path).await?;
            print_view(&panel.render(&account).await?);
        }
        Command::Delete { account, path } => {
            panel.delete(&account, &path).await?;
            print_view(&panel.render(&account).await?);
        }
        Command::Watch { account, seconds } => {
            watch(panel.clone(), feed, &account, seconds).await?;
        }
    }

    panel.shutdown();
    Ok(())
}

#[tokio::main]
async fn main() {
    // Load .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let settings = match Settings::new(cli.config.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Failed to load configuration: {}", e);
            std::process::exit(1);
        }
    };

    env_logger::init_from_env(env_logger::Env::new().default_filter_or(settings.log.level.as_str()));
    debug!("Loaded settings: {:?}", settings);

    if let Err(e) = run(cli, settings).await {
        error!("{}", e);
        std::process::exit(1);
    }
}
