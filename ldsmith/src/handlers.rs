use clap::ArgMatches;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use ldsmith_core::config::{Config, KeyPrecedence, OutputConfig, SelectionMode};
use ldsmith_core::report::{
    VALIDATOR_URL, field_label, render_composition, render_documents, render_property_form,
};
use ldsmith_core::session::Session;
use ldsmith_core::vocab::filter_vocabularies;
use ldsmith_scanner::SchemaClient;
use std::fs::OpenOptions;
use std::future::Future;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Duration;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use url::Url;

pub const TUI_LOG_FILE: &str = "ldsmith.log";

/// Build the runtime configuration from the global flags
pub fn config_from_args(args: &ArgMatches) -> Result<Config, String> {
    let defaults = Config::default();

    let selection = match args.get_one::<String>("selection") {
        Some(raw) => SelectionMode::from_str(raw)
            .ok_or_else(|| format!("Unknown selection mode '{}'", raw))?,
        None => defaults.selection,
    };

    let precedence = match args.get_one::<String>("precedence") {
        Some(raw) => KeyPrecedence::from_str(raw)
            .ok_or_else(|| format!("Unknown key precedence '{}'", raw))?,
        None => defaults.precedence,
    };

    let output_dir = args
        .get_one::<String>("output-dir")
        .map(|dir| PathBuf::from(shellexpand::tilde(dir).as_ref()))
        .unwrap_or_else(|| defaults.output.dir.clone());

    Ok(Config {
        registry_base: args
            .get_one::<String>("registry-base")
            .cloned()
            .unwrap_or(defaults.registry_base),
        index_url: args
            .get_one::<String>("index-url")
            .cloned()
            .unwrap_or(defaults.index_url),
        page_timeout_secs: args
            .get_one::<u64>("timeout")
            .copied()
            .unwrap_or(defaults.page_timeout_secs),
        index_timeout_secs: args
            .get_one::<u64>("index-timeout")
            .copied()
            .unwrap_or(defaults.index_timeout_secs),
        selection,
        precedence,
        merge: !args.get_flag("no-merge"),
        auto_save: !args.get_flag("no-save"),
        output: OutputConfig::in_dir(output_dir),
    })
}

/// Parse a `name=value` property assignment. The value may be empty or contain `=`.
pub fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("Expected name=value, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("Missing property name in '{}'", raw));
    }
    Ok((name.to_string(), value.to_string()))
}

/// Install the fmt subscriber. `RUST_LOG` picks the filter, `warn` otherwise.
pub fn init_tracing(log_file: Option<&Path>) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match log_file {
        Some(path) => match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => {
                let _ = tracing_subscriber::fmt()
                    .with_env_filter(filter)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .try_init();
            }
            Err(e) => eprintln!("✗ Cannot open log file {}: {}", path.display(), e),
        },
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(io::stderr)
                .try_init();
        }
    }
}

fn print_divider() {
    println!("{}", "═".repeat(60).bright_blue().bold());
}

fn prompt_line(msg: &str) -> io::Result<String> {
    print!("{} ", msg.bright_cyan().bold());
    io::stdout().flush()?;
    let mut response = String::new();
    io::stdin().read_line(&mut response)?;
    Ok(response.trim_end_matches(['\r', '\n']).to_string())
}

fn print_notices(session: &mut Session) {
    for notice in session.take_notices() {
        println!("{}", notice.colored());
    }
}

/// Await `fut` behind a spinner
async fn with_spinner<F: Future>(message: String, fut: F) -> F::Output {
    let spinner = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
        spinner.set_style(style);
    }
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner.set_message(message);

    let output = fut.await;
    spinner.finish_and_clear();
    output
}

fn client_or_exit(config: &Config) -> SchemaClient {
    debug!(
        "Registry {} (index {}), selection {}, merge {}, output {}",
        config.registry_base,
        config.index_url,
        config.selection.as_str(),
        config.merge,
        config.output.dir.display()
    );
    match config.client() {
        Ok(client) => client,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    }
}

pub fn handle_ui(config: Config) {
    if std::env::var_os("RUST_LOG").is_some() {
        init_tracing(Some(Path::new(TUI_LOG_FILE)));
    }

    let client = client_or_exit(&config);
    let runtime = tokio::runtime::Handle::current();
    let result = tokio::task::block_in_place(|| ldsmith_tui::run(config, client, runtime));

    if let Err(e) = result {
        eprintln!("Error running TUI: {}", e);
        std::process::exit(1);
    }
}

pub async fn handle_analyze(sub_matches: &ArgMatches, config: Config) {
    init_tracing(None);

    let Some(url) = sub_matches.get_one::<Url>("url") else {
        eprintln!("{} --url is required", "✗".red().bold());
        std::process::exit(1);
    };

    let client = client_or_exit(&config);
    let mut session = Session::new(config);

    let documents = with_spinner(
        format!("Analyzing {}", url),
        session.analyze(&client, url.as_str()),
    )
    .await
    .to_vec();

    print_notices(&mut session);
    if !documents.is_empty() {
        println!();
        print!("{}", render_documents(&documents));
    }
}

pub async fn handle_vocab(sub_matches: &ArgMatches, config: Config) {
    init_tracing(None);

    let client = client_or_exit(&config);
    let mut session = Session::new(config);

    let names = with_spinner(
        "Fetching vocabulary index...".to_string(),
        session.load_vocabularies(&client),
    )
    .await
    .to_vec();
    print_notices(&mut session);

    if names.is_empty() {
        std::process::exit(1);
    }

    let filter = sub_matches
        .get_one::<String>("filter")
        .map(String::as_str)
        .unwrap_or_default();
    let shown = filter_vocabularies(&names, filter);
    for name in &shown {
        println!("{}", name);
    }
    println!(
        "\n{} {} of {} types",
        "ℹ".blue().bold(),
        shown.len().to_string().cyan(),
        names.len().to_string().cyan()
    );
}

pub async fn handle_props(sub_matches: &ArgMatches, mut config: Config) {
    init_tracing(None);

    let Some(vocabulary) = sub_matches.get_one::<String>("TYPE") else {
        eprintln!("{} a vocabulary type is required", "✗".red().bold());
        std::process::exit(1);
    };

    // Listing properties never needs the index
    config.selection = SelectionMode::FreeText;
    let client = client_or_exit(&config);
    let mut session = Session::new(config);

    if !session.select_vocabulary(&client, vocabulary).await {
        print_notices(&mut session);
        std::process::exit(1);
    }

    let properties = with_spinner(
        format!("Fetching properties of {}...", vocabulary),
        session.fetch_properties(&client),
    )
    .await
    .cloned();
    print_notices(&mut session);

    match properties {
        Some(properties) => {
            println!();
            print!("{}", render_property_form(&properties, session.values()));
        }
        None => std::process::exit(1),
    }
}

pub async fn handle_generate(sub_matches: &ArgMatches, config: Config) {
    init_tracing(None);

    let Some(vocabulary) = sub_matches.get_one::<String>("type") else {
        eprintln!("{} --type is required", "✗".red().bold());
        std::process::exit(1);
    };
    let url = sub_matches.get_one::<Url>("url");
    let interactive = sub_matches.get_flag("interactive");
    let assignments: Vec<(String, String)> = match sub_matches
        .get_many::<String>("set")
        .into_iter()
        .flatten()
        .map(|raw| parse_assignment(raw))
        .collect()
    {
        Ok(assignments) => assignments,
        Err(e) => {
            eprintln!("{} {}", "✗".red().bold(), e);
            std::process::exit(1);
        }
    };

    let auto_save = config.auto_save;
    let client = client_or_exit(&config);
    let mut session = Session::new(config);

    print_divider();
    println!("{}", "  JSON-LD GENERATOR".bright_white().bold());
    print_divider();
    println!();

    if let Some(url) = url {
        with_spinner(format!("Analyzing {}", url), session.analyze(&client, url.as_str())).await;
        print_notices(&mut session);
        if !session.documents().is_empty() {
            print!("{}", render_documents(session.documents()));
        }
        println!();
    }

    let selected = with_spinner(
        format!("Selecting {}...", vocabulary),
        session.select_vocabulary(&client, vocabulary),
    )
    .await;
    print_notices(&mut session);
    if !selected {
        std::process::exit(1);
    }

    let properties = with_spinner(
        format!("Fetching properties of {}...", vocabulary),
        session.fetch_properties(&client),
    )
    .await
    .cloned();
    print_notices(&mut session);
    let Some(properties) = properties else {
        std::process::exit(1);
    };

    for (name, value) in &assignments {
        session.set_value(name, value);
    }
    print_notices(&mut session);

    if interactive {
        println!();
        println!(
            "{} Enter a value for each property, or leave it blank to skip.",
            "→".blue()
        );
        for (name, description) in &properties {
            let label = match session.values().get(name) {
                Some(current) => format!("{} [{}]", field_label(name, description), current),
                None => field_label(name, description),
            };
            match prompt_line(&label) {
                Ok(value) if !value.trim().is_empty() => {
                    session.set_value(name, &value);
                }
                Ok(_) => {}
                Err(e) => {
                    eprintln!("{} {}", "✗".red().bold(), e);
                    break;
                }
            }
        }
        println!();
    }

    let Some(composition) = session.generate().cloned() else {
        print_notices(&mut session);
        std::process::exit(1);
    };
    print_notices(&mut session);
    println!();
    print!("{}", render_composition(&composition));
    println!();

    if auto_save {
        session.persist();
        print_notices(&mut session);
    }

    println!(
        "{} Check the result with the schema validator: {}",
        "ℹ".blue().bold(),
        VALIDATOR_URL.bright_white()
    );
}
