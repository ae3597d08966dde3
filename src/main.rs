use anyhow::Result;
use clap::Parser;
use projektor::config::load_config;
use projektor::executor;
use projektor::sources::history::{self, FileHistory, HistoryStore, MemoryHistory};
use projektor::{Dispatcher, EntryList, Session};
use std::io::{self, BufRead, Write};
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Query to resolve; without it every stdin line is treated as a query
    query: Option<String>,

    /// Maximum number of entries to print
    #[arg(short, long, default_value_t = 10)]
    limit: usize,

    /// Print entries as JSON
    #[arg(long)]
    json: bool,

    /// Run the first entry of the final result list
    #[arg(short, long)]
    run: bool,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    let config = load_config()?;
    let history_path = history::get_history_path();
    let history: Arc<dyn HistoryStore> = match &history_path {
        Some(path) => Arc::new(FileHistory::load(path)),
        None => Arc::new(MemoryHistory::default()),
    };

    let dispatcher = Arc::new(Dispatcher::from_config(&config, history)?);
    let mut session = Session::new(dispatcher);

    let stdout = io::stdout();
    let mut out = stdout.lock();

    match &args.query {
        Some(query) => {
            session.update_query(query);
            print_results(&mut out, &session.results, &args)?;
        }
        None => {
            for line in io::stdin().lock().lines() {
                session.update_query(&line?);
                print_results(&mut out, &session.results, &args)?;
            }
        }
    }

    if args.run {
        if let Some(entry) = session.get_selected() {
            executor::execute(entry, &config, history_path.as_deref())?;
        }
    }

    Ok(())
}

fn print_results(out: &mut impl Write, results: &EntryList, args: &Args) -> Result<()> {
    let mut shown = results.clone();
    shown.truncate(args.limit);
    if args.json {
        writeln!(out, "{}", serde_json::to_string(&shown)?)?;
        return Ok(());
    }
    for entry in &shown {
        writeln!(out, "{}\t{}\t{}", entry.markup(), entry.icon(), entry.command())?;
    }
    writeln!(out)?;
    Ok(())
}
