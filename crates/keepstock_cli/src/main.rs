//! `keepstock` command line front end.
//!
//! Every command opens the configured store, runs one use-case and prints
//! the result as text or, with `--json`, as JSON.

mod output;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use keepstock_core::presenter::container_screens::load_container_detail;
use keepstock_core::presenter::item_screens::{
    load_item_browser, load_item_detail, ItemBrowserFilter,
};
use keepstock_core::presenter::qr_scan::scan_container;
use keepstock_core::presenter::search_screen::load_item_search;
use keepstock_core::{
    container_qr_payload, init_logging, open_db, ContainerChanges, ContainerId,
    ContainerScope, ContainerService, ItemChanges, ItemId, ItemListQuery, ItemSearchQuery,
    ItemService, ItemStatus, LogLevel, NewContainer, NewItem, SqliteContainerRepository,
    SqliteItemRepository, SqliteTagRepository, StoreConfig, TagService, UiState,
};
use log::info;
use output::Printer;
use rusqlite::Connection;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "keepstock", version)]
#[command(about = "Track items stored in nested containers")]
struct Cli {
    /// Database file (overrides KEEPSTOCK_DB_PATH)
    #[arg(long, global = true)]
    db: Option<PathBuf>,

    /// Log directory (overrides KEEPSTOCK_LOG_DIR)
    #[arg(long, global = true)]
    log_dir: Option<PathBuf>,

    /// Log level (overrides KEEPSTOCK_LOG_LEVEL)
    #[arg(long, global = true)]
    log_level: Option<String>,

    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Manage containers
    #[command(subcommand)]
    Container(ContainerCommand),
    /// Manage items
    #[command(subcommand)]
    Item(ItemCommand),
    /// Maintain tags
    #[command(subcommand)]
    Tag(TagCommand),
    /// Full-text search over item names, descriptions and tags
    Search {
        /// Words to match; each one matches as a prefix
        text: Vec<String>,
        /// Require a tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long, default_value_t = 20)]
        limit: u32,
    },
    /// Resolve scanned label text to a container
    Scan { payload: String },
}

#[derive(Subcommand)]
enum ContainerCommand {
    /// Create a container
    Add {
        name: String,
        /// Parent container id; omit for a root container
        #[arg(long)]
        parent: Option<ContainerId>,
        #[command(flatten)]
        details: DetailArgs,
    },
    /// List root containers, or the children of `--parent`
    List {
        #[arg(long)]
        parent: Option<ContainerId>,
        /// Only containers whose name contains this text
        #[arg(long)]
        name: Option<String>,
    },
    /// Show one container with counts and its label payload
    Show { id: ContainerId },
    /// Edit name, description or image
    Edit {
        id: ContainerId,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        details: EditDetailArgs,
    },
    /// Move a container under `--parent`, or to the top level
    Move {
        id: ContainerId,
        #[arg(long)]
        parent: Option<ContainerId>,
    },
    /// Delete an empty container
    Delete { id: ContainerId },
    /// Print the QR label payload
    Qr { id: ContainerId },
}

#[derive(Subcommand)]
enum ItemCommand {
    /// Create an item
    Add {
        name: String,
        #[arg(long)]
        container: Option<ContainerId>,
        /// Tag to attach (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,
        #[command(flatten)]
        details: DetailArgs,
    },
    /// Show one item with its container path
    Show { id: ItemId },
    /// List items
    List {
        #[arg(long, conflicts_with = "unsorted")]
        container: Option<ContainerId>,
        /// Only items with no container
        #[arg(long)]
        unsorted: bool,
        #[arg(long, value_enum)]
        status: Option<StatusArg>,
        #[arg(long)]
        tag: Option<String>,
        /// Only items whose name or a tag contains this text
        #[arg(long)]
        text: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
        #[arg(long, default_value_t = 0)]
        offset: u32,
    },
    /// Edit name, description or image
    Edit {
        id: ItemId,
        #[arg(long)]
        name: Option<String>,
        #[command(flatten)]
        details: EditDetailArgs,
    },
    /// Move an item into `--container`, or to unsorted
    Move {
        id: ItemId,
        #[arg(long)]
        container: Option<ContainerId>,
    },
    /// Mark an item as taken out
    Checkout { id: ItemId },
    /// Put a taken-out item back, optionally into another container
    Return {
        id: ItemId,
        #[arg(long)]
        container: Option<ContainerId>,
    },
    /// Replace the item's tags; no tags clears them
    Tag { id: ItemId, tags: Vec<String> },
    /// Delete an item
    Delete { id: ItemId },
}

#[derive(Subcommand)]
enum TagCommand {
    /// List tags with item counts
    List {
        /// Only tags whose name contains this text
        #[arg(long = "match")]
        pattern: Option<String>,
    },
    /// Show one tag and the items carrying it
    Show { name: String },
    /// Rename a tag on every item
    Rename { from: String, to: String },
    /// Delete a tag from every item
    Delete { name: String },
    /// Delete tags no item uses
    Prune,
}

#[derive(Args)]
struct DetailArgs {
    #[arg(long)]
    description: Option<String>,
    /// Local image reference
    #[arg(long)]
    image: Option<String>,
}

#[derive(Args)]
struct EditDetailArgs {
    #[arg(long, conflicts_with = "clear_description")]
    description: Option<String>,
    #[arg(long)]
    clear_description: bool,
    #[arg(long, conflicts_with = "clear_image")]
    image: Option<String>,
    #[arg(long)]
    clear_image: bool,
}

impl EditDetailArgs {
    fn description_change(&self) -> Option<Option<String>> {
        field_change(&self.description, self.clear_description)
    }

    fn image_change(&self) -> Option<Option<String>> {
        field_change(&self.image, self.clear_image)
    }
}

fn field_change(value: &Option<String>, clear: bool) -> Option<Option<String>> {
    if clear {
        Some(None)
    } else {
        value.clone().map(Some)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum StatusArg {
    Stored,
    TakenOut,
}

impl From<StatusArg> for ItemStatus {
    fn from(value: StatusArg) -> Self {
        match value {
            StatusArg::Stored => ItemStatus::Stored,
            StatusArg::TakenOut => ItemStatus::TakenOut,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;
    init_logging(&config, true).context("failed to start logging")?;
    info!("event=cli_start module=cli status=ok");

    let conn = open_db(&config.db_path)
        .with_context(|| format!("failed to open {}", config.db_path.display()))?;
    let printer = Printer::new(cli.json);

    match cli.command {
        Commands::Container(command) => run_container(&conn, &printer, command),
        Commands::Item(command) => run_item(&conn, &printer, command),
        Commands::Tag(command) => run_tag(&conn, &printer, command),
        Commands::Search {
            text,
            tags,
            status,
            limit,
        } => {
            let query = ItemSearchQuery {
                limit,
                ..ItemSearchQuery::new(text.join(" "))
                    .with_tags(tags)
                    .with_status(status.map(Into::into))
            };
            let view = into_result(load_item_search(&conn, &query))?;
            printer.search(&view)
        }
        Commands::Scan { payload } => {
            let result = into_result(scan_container(&conn, &payload))?;
            printer.scan(&result)
        }
    }
}

fn resolve_config(cli: &Cli) -> Result<StoreConfig> {
    let mut config = StoreConfig::from_env()?;
    if let Some(db) = &cli.db {
        config = config.with_db_path(&absolutize(db)?, "--db")?;
    }
    if let Some(log_dir) = &cli.log_dir {
        config = config.with_log_dir(&absolutize(log_dir)?, "--log-dir")?;
    }
    if let Some(level) = &cli.log_level {
        config = config.with_log_level(LogLevel::parse(level)?);
    }
    Ok(config)
}

// Flags are resolved against the working directory; env overrides must be absolute.
fn absolutize(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        return Ok(path.to_path_buf());
    }
    let cwd = std::env::current_dir().context("failed to read working directory")?;
    Ok(cwd.join(path))
}

fn run_container(conn: &Connection, printer: &Printer, command: ContainerCommand) -> Result<()> {
    let service = ContainerService::new(SqliteContainerRepository::try_new(conn)?);
    match command {
        ContainerCommand::Add {
            name,
            parent,
            details,
        } => {
            let created = service.create_container(NewContainer {
                name,
                description: details.description,
                image_path: details.image,
                parent_id: parent,
            })?;
            printer.container(&created)
        }
        ContainerCommand::List { parent, name } => {
            let containers = match name {
                Some(name) => service.search_children(parent, &name)?,
                None => service.list_children(parent)?,
            };
            printer.containers(&containers)
        }
        ContainerCommand::Show { id } => {
            let view = into_result(load_container_detail(conn, id))?;
            printer.container_detail(&view)
        }
        ContainerCommand::Edit { id, name, details } => {
            let updated = service.update_container(
                id,
                ContainerChanges {
                    name,
                    description: details.description_change(),
                    image_path: details.image_change(),
                },
            )?;
            printer.container(&updated)
        }
        ContainerCommand::Move { id, parent } => {
            let moved = service.move_container(id, parent)?;
            printer.container(&moved)
        }
        ContainerCommand::Delete { id } => {
            service.delete_container(id)?;
            printer.done(&format!("deleted container {id}"))
        }
        ContainerCommand::Qr { id } => {
            if service.get_container(id)?.is_none() {
                bail!("container not found: {id}");
            }
            printer.qr_payload(id, &container_qr_payload(id))
        }
    }
}

fn run_item(conn: &Connection, printer: &Printer, command: ItemCommand) -> Result<()> {
    let service = ItemService::new(SqliteItemRepository::try_new(conn)?);
    match command {
        ItemCommand::Add {
            name,
            container,
            tags,
            details,
        } => {
            let created = service.create_item(NewItem {
                name,
                description: details.description,
                image_path: details.image,
                container_id: container,
                tags,
            })?;
            printer.item(&created)
        }
        ItemCommand::Show { id } => {
            let view = into_result(load_item_detail(conn, id))?;
            printer.item_detail(&view)
        }
        ItemCommand::List {
            container,
            unsorted,
            status,
            tag,
            text,
            limit,
            offset,
        } => {
            let scope = match (container, unsorted) {
                (Some(id), _) => ContainerScope::In(id),
                (None, true) => ContainerScope::Unsorted,
                (None, false) => ContainerScope::Any,
            };
            let result = service.list_items(ItemListQuery {
                scope,
                status: status.map(Into::into),
                tag,
                text,
                limit,
                offset,
            })?;
            printer.items(&result.items)
        }
        ItemCommand::Edit { id, name, details } => {
            let updated = service.update_item(
                id,
                ItemChanges {
                    name,
                    description: details.description_change(),
                    image_path: details.image_change(),
                },
            )?;
            printer.item(&updated)
        }
        ItemCommand::Move { id, container } => {
            let moved = service.move_item(id, container)?;
            printer.item(&moved)
        }
        ItemCommand::Checkout { id } => {
            let item = service.check_out(id)?;
            printer.item(&item)
        }
        ItemCommand::Return { id, container } => {
            let item = service.return_item(id, container)?;
            printer.item(&item)
        }
        ItemCommand::Tag { id, tags } => {
            let item = service.set_item_tags(id, tags)?;
            printer.item(&item)
        }
        ItemCommand::Delete { id } => {
            service.delete_item(id)?;
            printer.done(&format!("deleted item {id}"))
        }
    }
}

fn run_tag(conn: &Connection, printer: &Printer, command: TagCommand) -> Result<()> {
    let service = TagService::new(SqliteTagRepository::try_new(conn)?);
    match command {
        TagCommand::List { pattern } => {
            let tags = match pattern {
                Some(pattern) => service.search_tags(&pattern)?,
                None => service.list_tags()?,
            };
            printer.tags(&tags)
        }
        TagCommand::Show { name } => {
            let Some(tag) = service.get_tag(&name)? else {
                bail!("tag not found: `{name}`");
            };
            let view = into_result(load_item_browser(
                conn,
                &ItemBrowserFilter::tag(tag.name.clone()),
            ))?;
            printer.tag(&tag, &view.items)
        }
        TagCommand::Rename { from, to } => {
            let tag = service.rename_tag(&from, &to)?;
            printer.done(&format!("renamed tag to `{}`", tag.name))
        }
        TagCommand::Delete { name } => {
            service.delete_tag(&name)?;
            printer.done(&format!("deleted tag `{name}`"))
        }
        TagCommand::Prune => {
            let removed = service.prune_unused_tags()?;
            printer.done(&format!("removed {removed} unused tag(s)"))
        }
    }
}

fn into_result<T>(state: UiState<T>) -> Result<T> {
    match state {
        UiState::Success(value) => Ok(value),
        UiState::Error { message } => bail!(message),
        UiState::Loading => bail!("screen did not finish loading"),
    }
}
