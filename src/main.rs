use std::collections::BTreeSet;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use uuid::Uuid;

use sharekit::config::Config;
use sharekit::features::confirmation::ConfirmationIntent;
use sharekit::features::introduce::{introduce_store, IntroduceIntent};
use sharekit::features::Dependencies;
use sharekit::keys::{
    AppStorageKey, FileStorageKey, LockItemKey, NumberFactKey, ReaderKey, ReaderValue, Storable,
};
use sharekit::logging::init_tracing;
use sharekit::models::{newest_first, ApplicationToken, LockItem, Note};
use sharekit::sharing::{Shared, SharedKey, SharedReader, SharedReaderKey};

#[derive(Parser, Debug)]
#[command(name = "sharekit", version, about = "Inspect and edit shared application state")]
struct Cli {
    /// Config file (default: ~/.config/sharekit/config.toml).
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Override the data directory.
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    /// Override the numbers endpoint base URL.
    #[arg(long, global = true)]
    numbers_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch the trivia fact for a number.
    Fact { number: i64 },
    /// Manage locked applications.
    #[command(subcommand)]
    Locks(LocksCommand),
    /// Manage notes.
    #[command(subcommand)]
    Notes(NotesCommand),
    /// Show or change preferences.
    #[command(subcommand)]
    Prefs(PrefsCommand),
    /// Drive the main screen through one full pass.
    Walkthrough {
        #[arg(long, default_value_t = 42)]
        count: i64,
        #[arg(long, default_value = "remember the milk")]
        note: String,
    },
}

#[derive(Subcommand, Debug)]
enum LocksCommand {
    List,
    Add { tokens: Vec<String> },
    Remove { id: Uuid },
    Clear,
    /// Print the collection on every change until interrupted.
    Watch,
}

#[derive(Subcommand, Debug)]
enum NotesCommand {
    List,
    Add { text: String },
}

#[derive(Subcommand, Debug)]
enum PrefsCommand {
    Show,
    Count { value: i64 },
    Introduced { value: bool },
}

const LOAD_TIMEOUT: Duration = Duration::from_secs(30);

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let dependencies = Dependencies::live(&config).context("failed to build dependencies")?;
    tracing::debug!(data_dir = %config.storage.data_dir().display(), "starting");

    match cli.command {
        Command::Fact { number } => fact(&dependencies, number).await,
        Command::Locks(command) => locks(&dependencies, command).await,
        Command::Notes(command) => notes(&dependencies, command).await,
        Command::Prefs(command) => prefs(&dependencies, command).await,
        Command::Walkthrough { count, note } => walkthrough(&dependencies, count, note).await,
    }
}

fn load_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    if let Some(dir) = &cli.data_dir {
        config.storage.data_dir = Some(dir.clone());
    }
    if let Some(url) = &cli.numbers_url {
        config.numbers.base_url = url.clone();
    }
    config.validate()?;
    Ok(config)
}

/// Wait for the reader's current load, failing on a load error.
async fn settled<K: SharedReaderKey>(reader: &SharedReader<K>) -> Result<K::Value> {
    tokio::time::timeout(LOAD_TIMEOUT, reader.wait_until(|r| !r.is_loading()))
        .await
        .context("timed out waiting for load")?;
    if let Some(err) = reader.load_error() {
        return Err(err).context(format!("failed to load {}", reader.key_id()));
    }
    Ok(reader.wrapped())
}

async fn settled_shared<K: SharedKey>(shared: &Shared<K>) -> Result<K::Value> {
    settled(shared.reader()).await
}

async fn fact(dependencies: &Dependencies, number: i64) -> Result<()> {
    let reader = SharedReader::new(
        NumberFactKey::api(Some(number), dependencies.numbers.clone()),
        None,
    );
    match settled(&reader).await? {
        Some(text) => println!("{}", text),
        None => println!("(no fact)"),
    }
    Ok(())
}

async fn locks(dependencies: &Dependencies, command: LocksCommand) -> Result<()> {
    let client = &dependencies.lock_items;
    match command {
        LocksCommand::List => print_items(&client.items().await?),
        LocksCommand::Add { tokens } => {
            if tokens.is_empty() {
                bail!("no tokens given");
            }
            let items: Vec<LockItem> = tokens
                .into_iter()
                .map(|token| LockItem::new(ApplicationToken::new(token)))
                .collect();
            print_items(&items);
            client.add_all(items).await?;
        }
        LocksCommand::Remove { id } => {
            let items = client.items().await?;
            let Some(item) = items.iter().find(|item| item.id == id) else {
                bail!("no lock item with id {}", id);
            };
            client.delete(item).await?;
        }
        LocksCommand::Clear => client.clear().await?,
        LocksCommand::Watch => {
            let key = ReaderKey::from(LockItemKey::new(client.clone()));
            let empty = key.empty_value();
            let reader = SharedReader::new(key, empty);
            let mut changes = reader.watch();
            loop {
                if !reader.is_loading() {
                    match reader.wrapped() {
                        ReaderValue::LockItems(items) => print_items(&items),
                        ReaderValue::Text(_) => {}
                    }
                }
                tokio::select! {
                    changed = changes.changed() => {
                        if changed.is_err() {
                            break;
                        }
                    }
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
        }
    }
    Ok(())
}

fn print_items(items: &[LockItem]) {
    if items.is_empty() {
        println!("(no lock items)");
    }
    for item in items {
        println!("{}  {}", item.id, item.token);
    }
}

async fn notes(dependencies: &Dependencies, command: NotesCommand) -> Result<()> {
    let notes = Shared::new(
        FileStorageKey::<Vec<Note>>::new(
            dependencies.notes_path.clone(),
            dependencies.file_storage.clone(),
        ),
        Vec::new(),
    );
    let current = settled_shared(&notes).await?;
    match command {
        NotesCommand::List => {
            for note in newest_first(&current) {
                println!("{:?}  {}", note.date, note.value);
            }
        }
        NotesCommand::Add { text } => {
            notes.with_lock(|notes| notes.push(Note::new(text)));
            if let Some(err) = notes.load_error() {
                return Err(err).context("failed to save note");
            }
            dependencies
                .file_storage
                .flush()
                .await
                .context("failed to write notes")?;
        }
    }
    Ok(())
}

async fn prefs(dependencies: &Dependencies, command: PrefsCommand) -> Result<()> {
    let storage = &dependencies.app_storage;
    match command {
        PrefsCommand::Show => {
            let entries = storage.entries()?;
            if entries.is_empty() {
                println!("(no preferences in {})", storage.path().display());
            }
            for (name, value) in entries {
                println!("{} = {}", name, value);
            }
        }
        PrefsCommand::Count { value } => {
            set_pref(AppStorageKey::new("count", storage.clone()), value).await?
        }
        PrefsCommand::Introduced { value } => {
            set_pref(AppStorageKey::new("isIntroduced", storage.clone()), value).await?
        }
    }
    storage.flush().await.context("failed to write preferences")?;
    Ok(())
}

async fn set_pref<V: Storable>(key: AppStorageKey<V>, value: V) -> Result<()> {
    let shared = Shared::new(key, V::default());
    settled_shared(&shared).await?;
    shared.set(value);
    if let Some(err) = shared.load_error() {
        return Err(err).context("failed to save preference");
    }
    Ok(())
}

async fn walkthrough(dependencies: &Dependencies, count: i64, note: String) -> Result<()> {
    let store = introduce_store(dependencies);
    let state = store.state();
    tokio::time::timeout(LOAD_TIMEOUT, async {
        state.is_introduced.wait_until(|r| !r.is_loading()).await;
        state.count.wait_until(|r| !r.is_loading()).await;
        state.notes.wait_until(|r| !r.is_loading()).await;
        state.lock_items.wait_until(|r| !r.is_loading()).await;
    })
    .await
    .context("timed out loading initial state")?;

    store.send(IntroduceIntent::SetIsIntroduced(true));
    store.send(IntroduceIntent::SetCount(count));
    store.send(IntroduceIntent::ConfirmButtonTapped);
    store.send(IntroduceIntent::Confirmation(ConfirmationIntent::SetNoteValue(note.clone())));
    store.send(IntroduceIntent::Confirmation(ConfirmationIntent::SaveNote(note)));

    let selection: BTreeSet<ApplicationToken> = ["com.example.mail", "com.example.chat"]
        .into_iter()
        .map(ApplicationToken::new)
        .collect();
    if let Some(task) = store.send(IntroduceIntent::SetSelection(selection)) {
        task.await.context("lock item task failed")?;
    }

    let state = store.state();
    let fact = settled(&state.number_description).await;
    state.lock_items.wait_until(|r| r.wrapped().len() >= 2).await;

    println!("introduced: {}", state.is_introduced.wrapped());
    println!("count:      {}", state.count.wrapped());
    match fact {
        Ok(Some(text)) => println!("fact:       {}", text),
        Ok(None) => println!("fact:       (none)"),
        Err(err) => println!("fact:       failed ({:#})", err),
    }
    println!("draft:      {:?}", state.note_value.wrapped());
    println!("notes:      {}", state.notes.wrapped().len());
    println!("sheet open: {}", state.confirmation.is_some());
    print_items(&state.lock_items.wrapped());

    dependencies
        .app_storage
        .flush()
        .await
        .context("failed to write preferences")?;
    dependencies
        .file_storage
        .flush()
        .await
        .context("failed to write notes")?;
    Ok(())
}
