//! animag CLI
//!
//! Searches one site, prints the results as a numbered table and lets the
//! user pick one to show its magnet link.

use std::env;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use animag::{
    error::{AppError, Result},
    models::{Config, ProxyMap, Record, SearchQuery},
    session::{Session, SessionOptions},
    sources,
};
use clap::Parser;
use log::LevelFilter;
use unicode_segmentation::UnicodeSegmentation;

/// animag - anime magnet search
#[derive(Parser, Debug)]
#[command(
    name = "animag",
    version,
    about = "Search anime torrent sites for magnet links"
)]
struct Cli {
    /// Source site (see --list-plugins); defaults to the configured plugin
    #[arg(short, long)]
    plugin: Option<String>,

    /// Search keyword
    #[arg(short, long, required_unless_present = "list_plugins")]
    search: Option<String>,

    /// Only search complete collections
    #[arg(short, long)]
    collected: bool,

    /// Use proxies from http_proxy/https_proxy
    #[arg(long)]
    system_proxy: bool,

    /// Explicit proxy, e.g. `https=http://127.0.0.1:7890` (repeatable)
    #[arg(long, value_name = "SCHEME=URL", value_parser = parse_key_value)]
    proxy: Vec<(String, String)>,

    /// Extra query parameter passed to the site (repeatable)
    #[arg(short, long, value_name = "KEY=VALUE", value_parser = parse_key_value)]
    extra: Vec<(String, String)>,

    /// Convert every size to this unit (B, KB, MB, GB, TB, KiB, ...)
    #[arg(short, long)]
    unit: Option<String>,

    /// Save the results to a CSV file
    #[arg(long, value_name = "PATH")]
    csv: Option<PathBuf>,

    /// Print the results as JSON instead of prompting
    #[arg(long)]
    json: bool,

    /// List available plugins and exit
    #[arg(long)]
    list_plugins: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Path to the configuration file
    #[arg(long, default_value = "animag.toml")]
    config: PathBuf,
}

/// User-facing messages of the interactive front end.
struct Messages {
    empty: &'static str,
    prompt: &'static str,
    out_of_range: &'static str,
    invalid_number: &'static str,
    selected: &'static str,
    magnet: &'static str,
    exited: &'static str,
    header: [&'static str; 3],
}

const MESSAGES: Messages = Messages {
    empty: "搜索结果为空",
    prompt: "选择一个并输入其序号 (输入 0 退出): ",
    out_of_range: "请输入 0 到 {} 之间的数字",
    invalid_number: "请输入有效的数字",
    selected: "已选择 {}",
    magnet: "其磁链为: {}",
    exited: "已退出选择",
    header: ["序号", "标题", "大小"],
};

/// Longest title shown in the table, in graphemes.
const TITLE_WIDTH: usize = 72;

fn parse_key_value(s: &str) -> std::result::Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.trim().to_string()))
        }
        _ => Err(format!("expected KEY=VALUE, got '{s}'")),
    }
}

/// Initialize logging. Without `RUST_LOG` the logger passes everything down
/// to debug and [`apply_log_level`] sets the ceiling.
fn init_logging(verbose: bool) {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("debug"))
        .format_timestamp_secs()
        .init();
    apply_log_level(verbose, "info");
}

/// Lower the global ceiling to the configured level unless `RUST_LOG` is set.
fn apply_log_level(verbose: bool, configured: &str) {
    if env::var_os("RUST_LOG").is_some() {
        return;
    }
    log::set_max_level(log_level(verbose, configured));
}

fn log_level(verbose: bool, configured: &str) -> LevelFilter {
    if verbose {
        return LevelFilter::Debug;
    }
    configured.parse().unwrap_or_else(|_| {
        eprintln!("Unknown log level '{configured}', using info");
        LevelFilter::Info
    })
}

fn truncate(title: &str) -> String {
    let graphemes: Vec<&str> = title.graphemes(true).collect();
    if graphemes.len() <= TITLE_WIDTH {
        return title.to_string();
    }
    format!("{}…", graphemes[..TITLE_WIDTH - 1].concat())
}

fn print_table(records: &[Record]) {
    let [index, title, size] = MESSAGES.header;
    println!("{index:>4}  {size:>10}  {title}");
    for (i, record) in records.iter().enumerate() {
        println!("{:>4}  {:>10}  {}", i + 1, record.size, truncate(&record.title));
    }
}

/// Prompt until the user picks a record or exits. Returns the 1-based choice.
fn prompt_selection(count: usize) -> Result<Option<usize>> {
    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("{}", MESSAGES.prompt);
        io::stdout().flush()?;

        let Some(line) = lines.next().transpose()? else {
            return Ok(None);
        };
        match line.trim().parse::<usize>() {
            Ok(0) => return Ok(None),
            Ok(n) if n <= count => return Ok(Some(n)),
            Ok(_) => println!("{}", MESSAGES.out_of_range.replace("{}", &count.to_string())),
            Err(_) => println!("{}", MESSAGES.invalid_number),
        }
    }
}

fn run(cli: Cli, config: Config) -> Result<()> {
    if cli.list_plugins {
        for name in sources::names() {
            println!("{name}");
        }
        return Ok(());
    }

    let keyword = cli
        .search
        .ok_or_else(|| AppError::config("a search keyword is required"))?;

    let mut options = SessionOptions::from(&config);
    if let Some(plugin) = cli.plugin {
        options.plugin = plugin;
    }
    let mut session = Session::new(options)?;

    let mut query = SearchQuery::new(keyword)
        .system_proxy(cli.system_proxy)
        .proxies(cli.proxy.into_iter().collect::<ProxyMap>());
    if cli.collected {
        query = query.collected(true);
    }
    for (key, value) in cli.extra {
        query = query.extra(key, value);
    }

    if session.search(&query)?.is_empty() {
        println!("{}", MESSAGES.empty);
        return Ok(());
    }

    if let Some(unit) = &cli.unit {
        session.size_format_all(unit)?;
    }
    if let Some(path) = &cli.csv {
        session.save_csv(path)?;
    }

    let results = session.results().unwrap_or_default();
    if cli.json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    print_table(results);
    let count = results.len();
    match prompt_selection(count)? {
        Some(choice) => {
            let record = session.select(choice as isize - 1)?;
            println!("{}", MESSAGES.selected.replace("{}", &record.title));
            println!("{}", MESSAGES.magnet.replace("{}", &record.link));
        }
        None => println!("{}", MESSAGES.exited),
    }

    Ok(())
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let config = Config::load_or_default(&cli.config);
    apply_log_level(cli.verbose, &config.logging.level);

    let result = config.validate().and_then(|()| run(cli, config));
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("\x1b[31merror:\x1b[0m {e}");
            ExitCode::FAILURE
        }
    }
}
