pub mod compose;
pub mod config;
pub mod error;
pub mod input;
pub mod notice;
pub mod persist;
pub mod report;
pub mod session;
pub mod vocab;

use colored::Colorize;

pub use compose::{Composition, PopulatedProperties};
pub use config::{Config, KeyPrecedence, OutputConfig, SelectionMode};
pub use error::CoreError;
pub use notice::{Notice, NoticeLevel};
pub use session::{Session, Stage};
pub use vocab::VocabularyName;

pub fn print_banner() {
    let banner = r#"
    ╔══════════════════════════════════════════════╗
    ║   _     _               _ _   _              ║
    ║  | | __| |___ _ __ ___ (_) |_| |__           ║
    ║  | |/ _` / __| '_ ` _ \| | __| '_ \          ║
    ║  | | (_| \__ \ | | | | | | |_| | | |         ║
    ║  |_|\__,_|___/_| |_| |_|_|\__|_| |_|         ║
    ║                                              ║
    ║     schema.org JSON-LD inspector & forge     ║
    ╚══════════════════════════════════════════════╝
"#;
    println!("{}", banner.bright_cyan());
    println!("  v{}\n", env!("CARGO_PKG_VERSION").dimmed());
}
