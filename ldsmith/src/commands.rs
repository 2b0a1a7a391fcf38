use clap::{arg, command};
use ldsmith_core::input::parse_url_line;
use url::Url;

pub const CLAP_STYLING: clap::builder::styling::Styles = clap::builder::styling::Styles::styled()
    .header(clap_cargo::style::HEADER)
    .usage(clap_cargo::style::USAGE)
    .literal(clap_cargo::style::LITERAL)
    .placeholder(clap_cargo::style::PLACEHOLDER)
    .error(clap_cargo::style::ERROR)
    .valid(clap_cargo::style::VALID)
    .invalid(clap_cargo::style::INVALID);

/// `--url` values: http(s) URLs, with `https://` assumed when the scheme is missing
fn page_url(raw: &str) -> Result<Url, String> {
    parse_url_line(raw)
        .and_then(|line| Url::parse(&line).ok())
        .ok_or_else(|| format!("'{}' is not an http(s) URL", raw))
}

pub fn command_argument_builder() -> clap::Command {
    clap::Command::new("ldsmith")
        .version(env!("CARGO_PKG_VERSION"))
        .bin_name("ldsmith")
        .about("Inspect a page's JSON-LD, build a new schema.org document and merge the two")
        .styles(CLAP_STYLING)
        .arg(arg!(-q --"quiet" "Suppress banner and non-essential output").required(false))
        .arg(
            arg!(--"registry-base" <URL>)
                .required(false)
                .global(true)
                .help("Base address of the per-type documentation pages")
                .default_value("https://schema.org/"),
        )
        .arg(
            arg!(--"index-url" <URL>)
                .required(false)
                .global(true)
                .help("Location of the registry's JSON-LD index")
                .default_value("https://schema.org/version/latest/schema.jsonld"),
        )
        .arg(
            arg!(--"timeout" <SECONDS>)
                .required(false)
                .global(true)
                .help("Timeout for page and type documentation requests")
                .value_parser(clap::value_parser!(u64))
                .default_value("10"),
        )
        .arg(
            arg!(--"index-timeout" <SECONDS>)
                .required(false)
                .global(true)
                .help("Timeout for the vocabulary index request")
                .value_parser(clap::value_parser!(u64))
                .default_value("20"),
        )
        .arg(
            arg!(--"selection" <MODE>)
                .required(false)
                .global(true)
                .help("How the vocabulary type is chosen: pick from the index, or any free-text name")
                .value_parser(["index", "free-text"])
                .default_value("index"),
        )
        .arg(
            arg!(--"precedence" <SIDE>)
                .required(false)
                .global(true)
                .help("Who wins when a property is named @context or @type: the fixed values or the user")
                .value_parser(["reserved", "user"])
                .default_value("reserved"),
        )
        .arg(
            arg!(--"no-merge")
                .required(false)
                .global(true)
                .help("Never merge the generated document with the page's JSON-LD")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(--"no-save")
                .required(false)
                .global(true)
                .help("Do not write the generated JSON-LD to disk")
                .action(clap::ArgAction::SetTrue),
        )
        .arg(
            arg!(-o --"output-dir" <PATH>)
                .required(false)
                .global(true)
                .help("Directory the JSON-LD files are written to")
                .default_value("."),
        )
        .subcommand_required(false)
        .subcommand(command!("ui").about("Launch the interactive REPL"))
        .subcommand(
            command!("analyze")
                .about("Fetch a page and show the JSON-LD blocks embedded in it")
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(true)
                        .help("The page to analyze")
                        .value_parser(page_url),
                ),
        )
        .subcommand(
            command!("vocab")
                .about("List the vocabulary types known to the registry")
                .arg(
                    arg!(-f --"filter" <TEXT>)
                        .required(false)
                        .help("Only show types containing this text (case-insensitive)"),
                ),
        )
        .subcommand(
            command!("props")
                .about("Show the properties documented for a vocabulary type")
                .arg(arg!(<TYPE>).required(true).help("Vocabulary type, e.g. Product")),
        )
        .subcommand(
            command!("generate")
                .about(
                    "Build a new JSON-LD document for a vocabulary type, optionally merged with \
                a page's existing JSON-LD, and save it.",
                )
                .arg(
                    arg!(-t --"type" <TYPE>)
                        .required(true)
                        .help("Vocabulary type, e.g. Product"),
                )
                .arg(
                    arg!(-u --"url" <URL>)
                        .required(false)
                        .help("Page whose JSON-LD the new document is merged with")
                        .value_parser(page_url),
                )
                .arg(
                    arg!(-s --"set" <ASSIGNMENT>)
                        .required(false)
                        .help("Property value as name=value (repeatable)")
                        .action(clap::ArgAction::Append),
                )
                .arg(
                    arg!(-i --"interactive")
                        .required(false)
                        .help("Prompt for every property of the type")
                        .action(clap::ArgAction::SetTrue),
                ),
        )
}
