use std::error::Error;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::json;
use slovi_rs::{
    BackendConfig, DetailPresenter, HttpBackend, MemoryBackend, SearchCoordinator, SearchOptions,
    SearchResult, SearchService, SearchState, WordDetails, WordStore,
};
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Parser, Debug)]
#[command(name = "slovi", about = "Czech-English dictionary lookup", version)]
pub struct Cli {
    /// Emit JSON instead of human-readable tables.
    #[arg(long, global = true)]
    json: bool,

    /// Use the built-in demo dataset instead of the hosted backend.
    #[arg(long, global = true)]
    demo: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Search the dictionary once and print the ranked matches.
    Search {
        /// Czech or English text to look for.
        query: String,
        /// Maximum number of matches to return.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Read queries from stdin, debounced like the interactive search box.
    ///
    /// An empty line clears the current search; `:q` exits.
    Watch {
        /// Maximum number of matches per query.
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show the grouped grammar tables for a root word.
    Word {
        /// Root word id, as printed by `search`.
        id: i64,
        /// Expand every section instead of the three-form preview.
        #[arg(long)]
        full: bool,
    },
    /// Run the HTTP server.
    #[cfg(feature = "web")]
    Serve {
        /// Address to bind.
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: std::net::SocketAddr,
    },
}

pub fn run() -> Result<(), Box<dyn Error>> {
    slovi_rs::telemetry::init_tracing();
    let cli = Cli::parse();
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli))
}

async fn dispatch(cli: Cli) -> Result<(), Box<dyn Error>> {
    if cli.demo {
        route(cli, Arc::new(MemoryBackend::with_fixtures())).await
    } else {
        let backend = HttpBackend::new(BackendConfig::from_env()?)?;
        route(cli, Arc::new(backend)).await
    }
}

async fn route<B>(cli: Cli, backend: Arc<B>) -> Result<(), Box<dyn Error>>
where
    B: SearchService + WordStore + 'static,
{
    match cli.command {
        Command::Search { query, limit } => handle_search(backend, query, limit, cli.json).await,
        Command::Watch { limit } => handle_watch(backend, limit, cli.json).await,
        Command::Word { id, full } => handle_word(backend, id, full, cli.json).await,
        #[cfg(feature = "web")]
        Command::Serve { addr } => handle_serve(backend, addr).await,
    }
}

async fn handle_search<B>(
    backend: Arc<B>,
    query: String,
    limit: usize,
    as_json: bool,
) -> Result<(), Box<dyn Error>>
where
    B: SearchService + WordStore + 'static,
{
    let options = SearchOptions {
        limit: limit.max(1),
        ..SearchOptions::default()
    };
    let min_query_len = options.min_query_len;
    let mut coordinator = SearchCoordinator::with_options(backend, options);
    coordinator.set_input(query.as_str());
    coordinator.settle().await;

    match coordinator.state() {
        SearchState::Ready(_) => {
            if as_json {
                let payload = json!({ "query": query, "results": coordinator.results() });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                print_results(coordinator.results());
            }
            Ok(())
        }
        SearchState::Failed(message) => Err(message.clone().into()),
        _ => Err(format!("query must be at least {min_query_len} characters").into()),
    }
}

async fn handle_watch<B>(backend: Arc<B>, limit: usize, as_json: bool) -> Result<(), Box<dyn Error>>
where
    B: SearchService + WordStore + 'static,
{
    let options = SearchOptions {
        limit: limit.max(1),
        ..SearchOptions::default()
    };
    let mut coordinator = SearchCoordinator::with_options(backend, options);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    if !as_json {
        println!("Type to search; empty line clears, :q exits.");
    }
    while let Some(line) = lines.next_line().await? {
        let line = line.trim();
        if line == ":q" {
            break;
        }
        if line.is_empty() {
            coordinator.reset();
            if !as_json {
                println!("(cleared)");
            }
            continue;
        }
        coordinator.set_input(line);
        coordinator.settle().await;
        match coordinator.state() {
            SearchState::Ready(_) if as_json => {
                let payload = json!({ "query": line, "results": coordinator.results() });
                println!("{}", serde_json::to_string(&payload)?);
            }
            SearchState::Ready(_) => print_results(coordinator.results()),
            SearchState::Failed(message) => eprintln!("error: {message}"),
            _ => {
                if !as_json {
                    println!("(type at least 2 characters)");
                }
            }
        }
    }
    Ok(())
}

async fn handle_word<B>(
    backend: Arc<B>,
    id: i64,
    full: bool,
    as_json: bool,
) -> Result<(), Box<dyn Error>>
where
    B: WordStore + 'static,
{
    let presenter = DetailPresenter::new(backend);
    let mut details = presenter.load(id).await?;
    if full {
        details.expand_all();
    }

    if as_json {
        println!("{}", serde_json::to_string_pretty(&detail_payload(&details))?);
    } else {
        print_details(&details);
    }
    Ok(())
}

#[cfg(feature = "web")]
async fn handle_serve<B>(backend: Arc<B>, addr: std::net::SocketAddr) -> Result<(), Box<dyn Error>>
where
    B: SearchService + WordStore + 'static,
{
    use slovi_rs::web::{AppState, WebConfig, serve};
    use slovi_rs::{StaticSession, VocabularyStub};

    let config = WebConfig {
        addr,
        base_url: format!("http://{addr}"),
        ..WebConfig::default()
    };
    let state = Arc::new(AppState::new(
        backend,
        Arc::new(VocabularyStub),
        Arc::new(StaticSession::anonymous()),
        &config,
    ));
    serve(config, state).await?;
    Ok(())
}

fn print_results(rows: &[SearchResult]) {
    if rows.is_empty() {
        println!("No matches.");
        return;
    }
    println!(
        "{:<6} {:<16} {:<16} {:<6} {}",
        "id", "match", "word", "type", "english"
    );
    for row in rows {
        let mut type_label = row.word_type.short_label().to_string();
        if let Some(aspect) = row.word_aspect {
            type_label = format!("{type_label} {}", aspect.short_label());
        }
        println!(
            "{:<6} {:<16} {:<16} {:<6} {}",
            row.root_word_id, row.matched_form, row.root_word_czech, type_label, row.root_word_english
        );
    }
}

fn print_details(details: &WordDetails) {
    let root = &details.root;
    print!("{} \u{2014} {}", root.in_czech, root.in_english);
    match root.word_aspect {
        Some(aspect) => println!("  ({}, {aspect})", root.word_type),
        None => println!("  ({})", root.word_type),
    }
    if let Some(note) = &root.note {
        println!("{note}");
    }

    for section in details.sections() {
        println!();
        println!("{}", section.meta().label);
        for entry in section.visible() {
            let mut line = format!("  {:<14} {}", entry.form.form_in_czech, entry.description);
            if let Some(example) = &entry.example {
                line.push_str(&format!(
                    "\n{:16}{} \u{2014} {}",
                    "", example.czech_sentence, example.english_sentence
                ));
            }
            println!("{}", line.trim_end());
        }
        if section.has_remainder() && !section.is_expanded() {
            println!(
                "  \u{2026} and {} more (--full to expand)",
                section.remainder().len()
            );
        }
    }
}

fn detail_payload(details: &WordDetails) -> serde_json::Value {
    let sections: Vec<serde_json::Value> = details
        .sections()
        .iter()
        .map(|section| {
            json!({
                "category": section.category(),
                "label": section.meta().label,
                "forms": section.forms(),
            })
        })
        .collect();
    json!({ "root": details.root, "sections": sections })
}
