use ldsmith::commands::command_argument_builder;
use ldsmith::handlers::{
    config_from_args, handle_analyze, handle_generate, handle_props, handle_ui, handle_vocab,
};
use ldsmith_core::print_banner;

#[tokio::main]
async fn main() {
    let cmd = command_argument_builder();
    let chosen_command = cmd.get_matches();
    let quiet = chosen_command.get_flag("quiet");

    // Show banner unless --quiet flag is set
    if !quiet {
        print_banner();
    }

    if chosen_command.subcommand().is_none() {
        // No subcommand provided, just show the banner
        return;
    }

    let config = match config_from_args(&chosen_command) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("✗ {}", e);
            std::process::exit(1);
        }
    };

    match chosen_command.subcommand() {
        Some(("ui", _)) => handle_ui(config),
        Some(("analyze", primary_command)) => handle_analyze(primary_command, config).await,
        Some(("vocab", primary_command)) => handle_vocab(primary_command, config).await,
        Some(("props", primary_command)) => handle_props(primary_command, config).await,
        Some(("generate", primary_command)) => handle_generate(primary_command, config).await,
        _ => unreachable!("clap should ensure we don't get here"),
    }
}
