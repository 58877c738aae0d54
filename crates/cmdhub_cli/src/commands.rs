//! Subcommand execution.

use crate::config::Config;
use crate::seed;
use crate::session;
use crate::{Command, DbAction, ItemsAction, TabsAction};
use anyhow::{bail, Context, Result};
use cmdhub_core::{
    database_export_file_name, logging_status, EntryPatch, EntryView, FileSnapshotStore,
    GroupKind, GroupSelection, Hub, HubError, NewEntry, Snapshot, SortMode, ViewContext,
};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

type CliHub = Hub<FileSnapshotStore>;

pub fn run(command: Command, config: &Config) -> Result<()> {
    if let Command::Db {
        action: DbAction::PromoteSeed { dir },
    } = &command
    {
        return promote_seed(dir);
    }

    let mut hub = Hub::open(FileSnapshotStore::new(&config.data_dir))
        .with_context(|| format!("Failed to open data in {}", config.data_dir.display()))?;

    match command {
        Command::Tabs { action } => run_tabs(&mut hub, action),
        Command::Items { action } => run_items(&mut hub, action, config),
        Command::Export { tab, out } => export_tab(&hub, tab, out.as_deref()),
        Command::Import { tab, file, mode } => {
            let text = fs::read_to_string(&file)
                .with_context(|| format!("Failed to read {}", file.display()))?;
            let count = hub.import_group(tab, &text, mode)?;
            println!("imported {count} item(s) into tab {tab}");
            Ok(())
        }
        Command::Db { action } => run_db(&mut hub, action, config),
        Command::View {
            tab,
            sort,
            default_sort,
        } => {
            let mut context = session::load(&config.data_dir);
            if let Some(tab) = tab {
                context.selection = tab;
            }
            if sort.is_some() || default_sort {
                context.sort = sort;
            }
            show_view(&hub, context, config)
        }
        Command::Info => show_info(&hub, config),
    }
}

fn run_tabs(hub: &mut CliHub, action: TabsAction) -> Result<()> {
    match action {
        TabsAction::List => {
            for group in hub.list_groups()? {
                println!(
                    "{:>4}  {:>3}  {:<7}  {}",
                    group.id, group.order, group.kind, group.name
                );
            }
        }
        TabsAction::Add { name, kind } => {
            let group = hub.create_group(&name, kind)?;
            println!("created tab {} ({})", group.id, group.kind);
        }
        TabsAction::Edit { id, name, kind } => {
            let current = hub.get_group(id)?;
            let name = name.unwrap_or(current.name);
            let kind = kind.unwrap_or(current.kind);
            hub.update_group(id, &name, kind)?;
            println!("updated tab {id}");
        }
        TabsAction::Rm { id } => {
            let removed = hub.delete_group(id)?;
            println!("deleted tab {id} and {removed} item(s)");
        }
        TabsAction::Move { id, direction } => report_move(hub.move_group(id, direction.into())?),
    }
    Ok(())
}

fn run_items(hub: &mut CliHub, action: ItemsAction, config: &Config) -> Result<()> {
    match action {
        ItemsAction::List { tab, sort } => {
            let mut context = session::load(&config.data_dir);
            if let Some(tab) = tab {
                context.selection = tab;
            }
            if sort.is_some() {
                context.sort = sort;
            }
            print_view(&hub.view(&context)?);
        }
        ItemsAction::Add {
            tab,
            title,
            content,
            note,
        } => {
            let mut entry = NewEntry::new(tab, title, content);
            if let Some(note) = note {
                entry = entry.with_note(note);
            }
            let entry = hub.create_entry(entry)?;
            println!("created item {} in tab {}", entry.id, entry.group_id);
        }
        ItemsAction::Edit {
            id,
            title,
            content,
            note,
            order,
            count,
        } => {
            let patch = EntryPatch {
                title,
                body: content,
                note,
                order,
                use_count: count,
            };
            hub.update_entry(id, patch)?;
            println!("updated item {id}");
        }
        ItemsAction::Rm { id } => {
            hub.delete_entry(id)?;
            println!("deleted item {id}");
        }
        ItemsAction::Move { id, direction } => report_move(hub.move_entry(id, direction.into())?),
        ItemsAction::Activate { id, line } => {
            let activation = hub.activate(id, line)?;
            // Bare line on stdout so it can be piped to a clipboard or opener.
            println!("{}", activation.line);
        }
    }
    Ok(())
}

fn run_db(hub: &mut CliHub, action: DbAction, config: &Config) -> Result<()> {
    match action {
        DbAction::Export { out } => {
            let path = export_target(&out);
            let snapshot = hub.export_database()?;
            fs::write(&path, snapshot.as_bytes())
                .with_context(|| format!("Failed to write {}", path.display()))?;
            info!(
                "event=db_export module=cli status=ok bytes={}",
                snapshot.len()
            );
            println!("{}", path.display());
        }
        DbAction::Import { file } => {
            hub.import_database(&read_snapshot(&file)?)?;
            println!("database imported from {}", file.display());
        }
        DbAction::Reset { seed, yes } => {
            if !yes {
                bail!("Reset replaces every tab and item; re-run with --yes to confirm");
            }
            let seed = seed.unwrap_or_else(|| seed::seed_path(&config.data_dir));
            hub.reset_from_seed(&read_snapshot(&seed)?)?;
            println!("database reset from {}", seed.display());
        }
        DbAction::PromoteSeed { dir } => promote_seed(&dir)?,
    }
    Ok(())
}

fn promote_seed(dir: &Path) -> Result<()> {
    let promotion = seed::promote_newest_export(dir)?;
    if promotion.candidates > 1 {
        println!(
            "found {} exports, using the newest",
            promotion.candidates
        );
    }
    if promotion.replaced {
        println!("removed previous {}", seed::SEED_FILE_NAME);
    }
    println!(
        "{} -> {}",
        promotion.source.display(),
        promotion.target.display()
    );
    Ok(())
}

fn export_tab(hub: &CliHub, tab: GroupSelection, out: Option<&Path>) -> Result<()> {
    let json = hub.export_group_json(tab)?;
    match out {
        Some(path) => fs::write(path, json)
            .with_context(|| format!("Failed to write {}", path.display()))?,
        None => println!("{json}"),
    }
    Ok(())
}

fn show_view(hub: &CliHub, context: ViewContext, config: &Config) -> Result<()> {
    let (context, view) = match hub.view(&context) {
        Ok(view) => (context, view),
        // The saved tab was deleted since the session was written.
        Err(HubError::GroupNotFound(_)) => {
            let fallback = ViewContext {
                selection: GroupSelection::All,
                sort: None,
            };
            (fallback, hub.view(&fallback)?)
        }
        Err(err) => return Err(err.into()),
    };
    session::save(&config.data_dir, &context)?;

    println!(
        "view={} sort={}",
        context.selection,
        context.effective_sort()
    );
    print_view(&view);
    Ok(())
}

fn show_info(hub: &CliHub, config: &Config) -> Result<()> {
    println!("version        {}", cmdhub_core::core_version());
    println!("data dir       {}", config.data_dir.display());
    println!("snapshot       {}", hub.store().slot_path().display());
    println!("schema version {}", hub.schema_version()?);
    println!("tabs           {}", hub.list_groups()?.len());
    println!("items          {}", hub.list_all_entries(Some(SortMode::OrderAsc))?.len());
    if let Some((level, dir)) = logging_status() {
        println!("logging        {level} -> {}", dir.display());
    }
    let session = session::load(&config.data_dir);
    println!("session        view={} sort={}", session.selection, session.effective_sort());
    Ok(())
}

fn print_view(view: &EntryView) {
    match view {
        EntryView::Group { group, entries } => {
            println!("[{}] {} ({})", group.id, group.name, group.kind);
            for entry in entries {
                print_entry_row(entry.id, entry.order, entry.use_count, &entry.title, None);
            }
        }
        EntryView::All { entries } => {
            for (entry, group) in entries {
                print_entry_row(
                    entry.id,
                    entry.order,
                    entry.use_count,
                    &entry.title,
                    Some((group.name.as_str(), group.kind)),
                );
            }
        }
    }
}

fn print_entry_row(id: i64, order: i64, uses: i64, title: &str, owner: Option<(&str, GroupKind)>) {
    match owner {
        Some((name, kind)) => println!("{id:>5}  {order:>3}  {uses:>4}  {title}  [{name}/{kind}]"),
        None => println!("{id:>5}  {order:>3}  {uses:>4}  {title}"),
    }
}

fn move_outcome(moved: bool) -> &'static str {
    if moved {
        "moved"
    } else {
        "already at the edge"
    }
}

fn report_move(moved: bool) {
    println!("{}", move_outcome(moved));
}

fn export_target(out: &Path) -> PathBuf {
    if out.is_dir() {
        out.join(database_export_file_name(chrono::Local::now().date_naive()))
    } else {
        out.to_path_buf()
    }
}

fn read_snapshot(path: &Path) -> Result<Snapshot> {
    let bytes = fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(Snapshot::from_bytes(bytes))
}

#[cfg(test)]
mod tests {
    use super::{export_target, move_outcome};

    #[test]
    fn move_outcome_names_edge_no_ops() {
        assert_eq!(move_outcome(true), "moved");
        assert_eq!(move_outcome(false), "already at the edge");
    }

    #[test]
    fn export_into_directory_uses_dated_name() {
        let dir = tempfile::tempdir().unwrap();
        let target = export_target(dir.path());
        let name = target.file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with("command-hub-"));
        assert!(name.ends_with(".db"));

        let explicit = dir.path().join("backup.db");
        assert_eq!(export_target(&explicit), explicit);
    }
}
