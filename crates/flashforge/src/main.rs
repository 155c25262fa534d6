//! `flashforge` - CLI for the flashforge card deck
//!
//! This binary adds, lists and deletes cards, runs study mode and talks to the
//! optional suggestion service.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::io::{self, BufRead, Write};

use anyhow::Context;
use clap::Parser;

use flashforge::cli::{
    AddCommand, Cli, Command, ConfigCommand, DeleteCommand, ListCommand, OutputFormat,
    StatusCommand, SuggestCommand,
};
use flashforge::suggest::{apply_suggestion, assist, HttpSuggestionClient, SuggestionRequest, SuggestionService};
use flashforge::{
    init_logging, CardSide, CardStore, Config, Error, Flashcard, NewCard, SqliteSlot,
    StudyAction, StudySession,
};

type Store = CardStore<SqliteSlot>;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Execute the command; only deck commands open the store
    match cli.command {
        Command::Add(cmd) => handle_add(&config, &mut open_store(&config)?, cmd),
        Command::List(cmd) => handle_list(&open_store(&config)?, &cmd),
        Command::Delete(cmd) => handle_delete(&mut open_store(&config)?, &cmd),
        Command::Study => handle_study(&open_store(&config)?),
        Command::Suggest(cmd) => handle_suggest(&config, &cmd),
        Command::Status(cmd) => handle_status(&config, &open_store(&config)?, &cmd),
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
    }
}

fn open_store(config: &Config) -> anyhow::Result<Store> {
    let path = config.database_path();
    let slot = SqliteSlot::open(&path)
        .with_context(|| format!("failed to open deck at {}", path.display()))?
        .with_quota(config.slot_quota());
    Ok(CardStore::open(slot, config.storage.slot_key.clone()))
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")
}

fn handle_add(config: &Config, store: &mut Store, cmd: AddCommand) -> anyhow::Result<()> {
    let mut front = cmd.front;
    let mut back = cmd.back;

    if let Some(side) = cmd.assist {
        let side = CardSide::from(side);
        let current = match side {
            CardSide::Front => &front,
            CardSide::Back => &back,
        };
        match request_assist(config, side, current) {
            Ok(suggestion) => {
                let merged = apply_suggestion(current, &suggestion, cmd.mode.into());
                match side {
                    CardSide::Front => front = merged,
                    CardSide::Back => back = merged,
                }
            }
            Err(e) => eprintln!("Suggestion unavailable: {e}. Saving the card as typed."),
        }
    }

    let draft = NewCard::new(front, back)?;
    let card = store.add(draft).clone();

    println!("Added card {}", card.short_id());
    print_card(&card);
    warn_if_unsaved(store);
    Ok(())
}

fn request_assist(config: &Config, side: CardSide, text: &str) -> flashforge::Result<String> {
    let client = HttpSuggestionClient::from_config(config)?;
    let rt = runtime().map_err(|e| Error::internal(e.to_string()))?;
    rt.block_on(assist(&client, side, text))
}

fn handle_list(store: &Store, cmd: &ListCommand) -> anyhow::Result<()> {
    if cmd.format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(store.cards())?);
        return Ok(());
    }

    if store.is_empty() {
        println!("Your deck is empty.");
        return Ok(());
    }

    match cmd.format {
        OutputFormat::Table => {
            println!("{:<8}  {:<32}  {:<32}", "ID", "FRONT", "BACK");
            println!("{:-<8}  {:-<32}  {:-<32}", "", "", "");
            for card in store.cards() {
                println!(
                    "{:<8}  {:<32}  {:<32}",
                    card.short_id(),
                    truncate(&card.front_text, 32),
                    truncate(&card.back_text, 32)
                );
            }
        }
        OutputFormat::Plain | OutputFormat::Json => {
            for card in store.cards() {
                println!("[{}]", card.short_id());
                print_card(card);
                println!();
            }
        }
    }
    println!("{} card(s)", store.len());
    Ok(())
}

fn handle_delete(store: &mut Store, cmd: &DeleteCommand) -> anyhow::Result<()> {
    let id = store.resolve(&cmd.id)?;
    let Some(card) = store.get(id).cloned() else {
        println!("No card with id {}", cmd.id);
        return Ok(());
    };

    if !cmd.yes {
        println!("Delete this card? This cannot be undone.");
        print_card(&card);
        if !confirm("Delete? [y/N] ")? {
            println!("Kept card {}", card.short_id());
            return Ok(());
        }
    }

    let short_id = card.short_id();
    if store.delete(id) {
        println!("Deleted card {short_id}");
    } else {
        println!("No card with id {}", cmd.id);
    }
    warn_if_unsaved(store);
    Ok(())
}

/// Ask a yes/no question on stdin. Anything but `y`/`yes` (or end of input) is no.
fn confirm(prompt: &str) -> anyhow::Result<bool> {
    print!("{prompt}");
    io::stdout().flush()?;

    let mut answer = String::new();
    io::stdin().lock().read_line(&mut answer)?;
    Ok(matches!(
        answer.trim().to_ascii_lowercase().as_str(),
        "y" | "yes"
    ))
}

fn handle_study(store: &Store) -> anyhow::Result<()> {
    let Some(mut session) = StudySession::new(store.cards()) else {
        println!("{}", Error::EmptyDeck);
        return Ok(());
    };

    println!("Study mode: Enter flips, n/p move, q leaves.");
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    loop {
        let (position, total) = session.position();
        println!();
        println!(
            "Card {position} of {total} ({:.0}%)  [{}]",
            session.progress_percent(),
            session.side()
        );
        println!("  {}", session.visible_text());
        print!("> ");
        io::stdout().flush()?;

        let Some(line) = lines.next() else {
            break;
        };
        let line = line?;

        let Some(action) = StudyAction::parse(&line) else {
            println!("Unknown key {:?}. Use Enter, n, p or q.", line.trim());
            continue;
        };
        if !session.apply(action) {
            break;
        }
    }
    Ok(())
}

fn handle_suggest(config: &Config, cmd: &SuggestCommand) -> anyhow::Result<()> {
    let client = HttpSuggestionClient::from_config(config)?;
    let request = SuggestionRequest::new(cmd.query.clone());
    let response = runtime()?.block_on(client.suggest(&request))?;
    println!("{}", response.suggestions);
    Ok(())
}

fn handle_status(config: &Config, store: &Store, cmd: &StatusCommand) -> anyhow::Result<()> {
    let stats = store.slot().stats()?;
    let last_write = stats.last_write.map(|t| t.to_rfc3339());
    let deck_saved = store.slot().updated_at(store.key())?.map(|t| t.to_rfc3339());

    if cmd.json {
        let status = serde_json::json!({
            "cards": store.len(),
            "database_path": store.slot().path(),
            "slot_key": store.key(),
            "slots": stats.slots,
            "value_bytes": stats.value_bytes,
            "db_size_bytes": stats.db_size_bytes,
            "deck_saved_at": deck_saved,
            "last_write": last_write,
            "suggestions_enabled": config.suggest.enabled,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("flashforge status");
        println!("-----------------");
        println!("Cards:         {}", store.len());
        println!("Database:      {}", store.slot().path().display());
        println!("Slot key:      {}", store.key());
        println!("Deck size:     {} bytes", stats.value_bytes);
        println!("Database size: {} bytes", stats.db_size_bytes);
        println!(
            "Deck saved:    {}",
            deck_saved.as_deref().unwrap_or("never")
        );
        println!(
            "Last write:    {}",
            last_write.as_deref().unwrap_or("never")
        );
        println!(
            "Suggestions:   {}",
            if config.suggest.enabled { "enabled" } else { "disabled" }
        );
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:      {}", config.database_path().display());
                println!("  Slot key:           {}", config.storage.slot_key);
                println!("  Max slot bytes:     {}", config.storage.max_slot_bytes);
                println!();
                println!("[Suggest]");
                println!("  Enabled:            {}", config.suggest.enabled);
                println!("  Endpoint:           {}", config.suggest.endpoint);
                println!("  Model:              {}", config.suggest.model);
                println!("  API key variable:   {}", config.suggest.api_key_env);
                println!("  Max tokens:         {}", config.suggest.max_tokens);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn print_card(card: &Flashcard) {
    println!("  {:<6} {}", format!("{}:", CardSide::Front), card.front_text);
    println!("  {:<6} {}", format!("{}:", CardSide::Back), card.back_text);
}

fn warn_if_unsaved(store: &Store) {
    if !store.is_persisted() {
        eprintln!("Warning: the deck could not be saved; this change will be lost on exit.");
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let kept: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}
