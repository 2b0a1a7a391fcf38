use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEventKind},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ldsmith_core::config::Config;
use ldsmith_core::input::parse_url_line;
use ldsmith_core::report::{
    VALIDATOR_URL, field_label, render_composition, render_documents, render_property_form,
    render_summary,
};
use ldsmith_core::session::Session;
use ldsmith_core::vocab::filter_vocabularies;
use ldsmith_scanner::SchemaClient;
use ratatui::{
    Frame, Terminal,
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};
use std::fs;
use std::io;
use std::path::PathBuf;
use tokio::runtime::Handle;
use tracing::{debug, info};

const PROMPT: &str = "lds> ";
const FORM_PROMPT: &str = "form> ";
const HISTORY_FILE: &str = ".ldsmith_history";
const HISTORY_LIMIT: usize = 100;
const OUTPUT_LIMIT: usize = 1000;

#[derive(Debug, Clone, Copy, PartialEq)]
enum ExitMode {
    Normal,    // exit, quit - ask about saving
    ForceQuit, // :q! - don't save, don't ask
    WriteQuit, // :wq!, ZZ - save and quit, don't ask
}

/// Field-by-field entry started by `form`
#[derive(Debug, Clone, PartialEq)]
struct FormState {
    fields: Vec<(String, String)>,
    position: usize,
}

impl FormState {
    fn current(&self) -> Option<&(String, String)> {
        self.fields.get(self.position)
    }
}

pub struct App {
    session: Session,
    client: SchemaClient,
    runtime: Handle,
    input: String,
    history: Vec<String>,
    history_path: Option<PathBuf>,
    output: Vec<String>,
    cursor_position: usize,
    should_quit: bool,
    scroll_offset: usize,
    history_index: Option<usize>,
    temp_input: String,
    awaiting_save_confirmation: bool,
    form: Option<FormState>,
}

impl App {
    pub fn new(config: Config, client: SchemaClient, runtime: Handle) -> Self {
        let banner = r#"
    ╔══════════════════════════════════════════════╗
    ║   _     _               _ _   _              ║
    ║  | | __| |___ _ __ ___ (_) |_| |__           ║
    ║  | |/ _` / __| '_ ` _ \| | __| '_ \          ║
    ║  | | (_| \__ \ | | | | | | |_| | | |         ║
    ║  |_|\__,_|___/_| |_| |_|_|\__|_| |_|         ║
    ║                                              ║
    ║         JSON-LD interactive workbench        ║
    ╚══════════════════════════════════════════════╝
        "#;

        let mut output: Vec<String> = banner.lines().map(str::to_string).collect();
        output.push(String::new());
        output.push("  Type 'help' for available commands, 'exit' or 'quit' to exit.".to_string());
        output.push(String::new());

        Self {
            session: Session::new(config),
            client,
            runtime,
            input: String::new(),
            history: Vec::new(),
            history_path: None,
            output,
            cursor_position: 0,
            should_quit: false,
            scroll_offset: 0,
            history_index: None,
            temp_input: String::new(),
            awaiting_save_confirmation: false,
            form: None,
        }
    }

    /// Where command history is loaded from and saved to. `None` disables persistence.
    pub fn with_history_path(mut self, path: Option<PathBuf>) -> Self {
        self.history_path = path;
        self
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn output(&self) -> &[String] {
        &self.output
    }

    pub fn add_output(&mut self, message: impl Into<String>) {
        self.output.push(message.into());
        if self.output.len() > OUTPUT_LIMIT {
            self.output.drain(0..self.output.len() - OUTPUT_LIMIT);
        }
        // Back to the bottom on new output
        self.scroll_offset = 0;
    }

    fn add_block(&mut self, text: &str) {
        for line in text.lines() {
            self.add_output(line.to_string());
        }
    }

    fn show_notices(&mut self) {
        for notice in self.session.take_notices() {
            self.add_output(format!("  {}", notice));
        }
    }

    fn prompt(&self) -> &'static str {
        if self.form.is_some() { FORM_PROMPT } else { PROMPT }
    }

    /// Byte offset of the cursor, which counts characters
    fn cursor_byte_index(&self) -> usize {
        self.input
            .char_indices()
            .nth(self.cursor_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input.len())
    }

    fn insert_char(&mut self, c: char) {
        let index = self.cursor_byte_index();
        self.input.insert(index, c);
        self.cursor_position += 1;
        self.history_index = None;
        self.temp_input.clear();
    }

    fn delete_char_before_cursor(&mut self) {
        if self.cursor_position == 0 {
            return;
        }
        self.cursor_position -= 1;
        let index = self.cursor_byte_index();
        self.input.remove(index);
        self.history_index = None;
        self.temp_input.clear();
    }

    pub fn navigate_history_backward(&mut self) {
        if self.history.is_empty() {
            return;
        }

        if self.history_index.is_none() {
            self.temp_input = self.input.clone();
        }

        let idx = match self.history_index {
            None => self.history.len() - 1,
            Some(idx) => idx.saturating_sub(1),
        };

        self.history_index = Some(idx);
        self.input = self.history[idx].clone();
        self.cursor_position = self.input.chars().count();
    }

    pub fn navigate_history_forward(&mut self) {
        let Some(idx) = self.history_index else {
            return;
        };

        if idx + 1 >= self.history.len() {
            self.input = std::mem::take(&mut self.temp_input);
            self.history_index = None;
        } else {
            self.history_index = Some(idx + 1);
            self.input = self.history[idx + 1].clone();
        }
        self.cursor_position = self.input.chars().count();
    }

    pub fn default_history_path() -> Option<PathBuf> {
        std::env::var_os("HOME").map(|home| PathBuf::from(home).join(HISTORY_FILE))
    }

    pub fn load_history(&mut self) {
        let Some(path) = &self.history_path else {
            return;
        };
        if let Ok(content) = fs::read_to_string(path) {
            let mut lines: Vec<String> = content.lines().map(str::to_string).collect();
            if lines.len() > HISTORY_LIMIT {
                lines.drain(0..lines.len() - HISTORY_LIMIT);
            }
            debug!("Loaded {} history entries from {}", lines.len(), path.display());
            self.history = lines;
        }
    }

    pub fn save_history(&self) -> Result<Option<PathBuf>> {
        let Some(path) = &self.history_path else {
            return Ok(None);
        };
        fs::write(path, self.history.join("\n"))?;
        Ok(Some(path.clone()))
    }

    fn report_history_save(&mut self) {
        match self.save_history() {
            Ok(Some(path)) => self.add_output(format!("History saved to {}", path.display())),
            Ok(None) => {}
            Err(e) => self.add_output(format!("Error saving history: {}", e)),
        }
    }

    fn request_exit(&mut self, mode: ExitMode) {
        match mode {
            ExitMode::Normal => {
                if !self.history.is_empty() && self.history_path.is_some() {
                    self.awaiting_save_confirmation = true;
                    self.add_output("");
                    self.add_output(format!("Save command history to ~/{}? [y/N]:", HISTORY_FILE));
                } else {
                    self.should_quit = true;
                }
            }
            ExitMode::ForceQuit => {
                self.should_quit = true;
            }
            ExitMode::WriteQuit => {
                if !self.history.is_empty() {
                    self.report_history_save();
                }
                self.should_quit = true;
            }
        }
    }

    fn handle_save_confirmation(&mut self, response: &str) {
        self.awaiting_save_confirmation = false;

        let response = response.trim().to_lowercase();
        if response == "y" || response == "yes" {
            self.report_history_save();
        } else {
            self.add_output("History not saved.");
        }
        self.should_quit = true;
    }

    pub fn handle_input(&mut self, input: String) {
        if self.awaiting_save_confirmation {
            self.handle_save_confirmation(&input);
            return;
        }

        // Blank lines are meaningful inside a form: they skip the field
        if self.form.is_some() {
            self.handle_form_input(&input);
            return;
        }

        let line = input.trim();
        if line.is_empty() {
            return;
        }

        self.history.push(line.to_string());
        if self.history.len() > HISTORY_LIMIT {
            self.history.remove(0);
        }
        self.history_index = None;
        self.temp_input.clear();

        self.add_output(format!("> {}", line));

        let (command, args) = match line.split_once(char::is_whitespace) {
            Some((command, args)) => (command, args.trim()),
            None => (line, ""),
        };
        debug!("REPL command '{}' args '{}'", command, args);

        match command {
            "exit" | "quit" => self.request_exit(ExitMode::Normal),
            ":q!" => self.request_exit(ExitMode::ForceQuit),
            ":wq!" | "ZZ" => self.request_exit(ExitMode::WriteQuit),
            "help" => self.show_help(),
            "clear" => self.output.clear(),
            "analyze" => self.analyze(args),
            "docs" => self.show_documents(),
            "vocab" => self.list_vocabularies(args),
            "select" => self.select(args),
            "fetch" => self.fetch(),
            "props" => self.show_properties(),
            "form" => self.start_form(),
            "set" => self.set(args),
            "unset" => self.unset(args),
            "values" => self.show_values(),
            "generate" => self.generate(),
            "save" => {
                self.session.persist();
                self.show_notices();
            }
            "state" => {
                let summary = render_summary(&self.session);
                self.add_block(&summary);
            }
            "validator" => {
                self.add_output(format!("Schema validator: {}", VALIDATOR_URL));
            }
            _ => {
                self.add_output(format!("Unknown command: {}", command));
                self.add_output("Type 'help' for available commands");
            }
        }
    }

    fn show_help(&mut self) {
        self.add_output("Available commands:");
        self.add_output("  analyze <url>       - Fetch a page and extract its JSON-LD");
        self.add_output("  docs                - Show the JSON-LD found on the page");
        self.add_output("  vocab [filter]      - List the registry's vocabulary types");
        self.add_output("  select <Type>       - Choose the type of the new document");
        self.add_output("  fetch               - Retrieve the properties of the selected type");
        self.add_output("  props               - List the properties with their descriptions");
        self.add_output("  form                - Fill in the properties one by one (:done to stop)");
        self.add_output("  set <name> <value>  - Set one property value");
        self.add_output("  unset <name>        - Clear one property value");
        self.add_output("  values              - Show the values entered so far");
        self.add_output("  generate            - Compose the JSON-LD document and save it");
        self.add_output("  save                - Save the last generated document again");
        self.add_output("  state               - Show where the session stands");
        self.add_output("  validator           - Show the schema validator link");
        self.add_output("  clear               - Clear the output");
        self.add_output("  help                - Show this help message");
        self.add_output("  exit, quit          - Exit the REPL (:q! without saving history, :wq! or ZZ saving it)");
    }

    fn analyze(&mut self, raw: &str) {
        if raw.is_empty() {
            self.add_output("Error: analyze requires a URL");
            return;
        }
        let Some(url) = parse_url_line(raw) else {
            self.add_output(format!("Error: '{}' is not an http(s) URL", raw));
            return;
        };

        self.add_output(format!("Analyzing {} ...", url));
        let found = self
            .runtime
            .block_on(self.session.analyze(&self.client, &url))
            .len();
        self.show_notices();

        if found > 0 {
            let report = render_documents(self.session.documents());
            self.add_block(&report);
        }
    }

    fn show_documents(&mut self) {
        if self.session.url().is_none() {
            self.add_output("No page analyzed yet. Try: analyze <url>");
            return;
        }
        let report = render_documents(self.session.documents());
        self.add_block(&report);
    }

    fn list_vocabularies(&mut self, filter: &str) {
        if self.session.vocabularies().is_empty() {
            self.add_output("Fetching vocabulary index...");
        }
        let names = self
            .runtime
            .block_on(self.session.load_vocabularies(&self.client))
            .to_vec();
        self.show_notices();
        if names.is_empty() {
            return;
        }

        let shown = filter_vocabularies(&names, filter);
        for row in shown.chunks(4) {
            let line: String = row.iter().map(|name| format!("{:<30}", name)).collect();
            self.add_output(format!("  {}", line.trim_end()));
        }
        let total = format!("{} of {} types", shown.len(), names.len());
        self.add_output(total);
    }

    fn select(&mut self, name: &str) {
        if name.is_empty() {
            self.add_output("Error: select requires a vocabulary type, e.g. select Product");
            return;
        }
        let selected = self
            .runtime
            .block_on(self.session.select_vocabulary(&self.client, name));
        self.show_notices();
        if selected {
            self.add_output("Type 'fetch' to retrieve its properties.");
        }
    }

    fn fetch(&mut self) {
        let count = self
            .runtime
            .block_on(self.session.fetch_properties(&self.client))
            .map(|properties| properties.len());
        self.show_notices();
        if count.is_some_and(|count| count > 0) {
            self.add_output("Type 'props' to list them or 'form' to fill them in.");
        }
    }

    fn show_properties(&mut self) {
        let Some(properties) = self.session.properties() else {
            self.add_output("No properties loaded. Try: select <Type>, then fetch");
            return;
        };
        let report = render_property_form(properties, self.session.values());
        self.add_block(&report);
    }

    fn start_form(&mut self) {
        let Some(properties) = self.session.properties() else {
            self.add_output("No properties loaded. Try: select <Type>, then fetch");
            return;
        };
        let fields: Vec<(String, String)> = properties
            .iter()
            .map(|(name, description)| (name.clone(), description.clone()))
            .collect();
        if fields.is_empty() {
            self.add_output("Nothing to fill in: the type documents no properties.");
            return;
        }

        self.add_output(format!(
            "Filling in {} properties. Leave a field blank to skip it, :done to stop.",
            fields.len()
        ));
        self.form = Some(FormState {
            fields,
            position: 0,
        });
        self.prompt_field();
    }

    fn prompt_field(&mut self) {
        let Some((name, description)) = self.form.as_ref().and_then(FormState::current) else {
            return;
        };
        let label = field_label(name, description);
        let label = match self.session.values().get(name) {
            Some(current) => format!("{} [{}]", label, current),
            None => label,
        };
        self.add_output(label);
    }

    fn handle_form_input(&mut self, input: &str) {
        let value = input.trim();
        if value == ":done" {
            self.finish_form();
            return;
        }

        let Some((name, _)) = self.form.as_ref().and_then(FormState::current).cloned() else {
            self.finish_form();
            return;
        };
        if !value.is_empty() {
            self.add_output(format!("  {}", value));
            self.session.set_value(&name, value);
            self.show_notices();
        }

        if let Some(form) = self.form.as_mut() {
            form.position += 1;
        }
        if self.form.as_ref().and_then(FormState::current).is_some() {
            self.prompt_field();
        } else {
            self.finish_form();
        }
    }

    fn finish_form(&mut self) {
        self.form = None;
        let entered = self.session.values().len();
        self.add_output(format!(
            "Form closed with {} value(s) entered. Type 'generate' to build the document.",
            entered
        ));
    }

    fn set(&mut self, args: &str) {
        let Some((name, value)) = args.split_once(char::is_whitespace) else {
            self.add_output("Error: set requires a property name and a value");
            return;
        };
        let value = value.trim();
        if self.session.set_value(name, value) {
            self.add_output(format!("  {} = {}", name, value));
        }
        self.show_notices();
    }

    fn unset(&mut self, name: &str) {
        if name.is_empty() {
            self.add_output("Error: unset requires a property name");
            return;
        }
        if self.session.set_value(name, "") {
            self.add_output(format!("  {} cleared", name));
        }
        self.show_notices();
    }

    fn show_values(&mut self) {
        if self.session.values().is_empty() {
            self.add_output("No values entered yet.");
            return;
        }
        let lines: Vec<String> = self
            .session
            .values()
            .iter()
            .map(|(name, value)| format!("  {} = {}", name, value))
            .collect();
        for line in lines {
            self.add_output(line);
        }
    }

    fn generate(&mut self) {
        let report = self.session.generate().map(render_composition);
        self.show_notices();
        let Some(report) = report else {
            return;
        };
        self.add_block(&report);

        if self.session.config().auto_save {
            if let Some(path) = self.session.persist() {
                info!("Wrote {}", path.display());
            }
            self.show_notices();
        }
        self.add_output(format!(
            "Check the result with the schema validator: {}",
            VALIDATOR_URL
        ));
    }
}

/// Run the REPL until the user exits. Network actions are driven on `runtime`,
/// so this must not be called from inside an async task without `block_in_place`.
pub fn run(config: Config, client: SchemaClient, runtime: Handle) -> Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config, client, runtime).with_history_path(App::default_history_path());
    app.load_history();

    let result = run_app(&mut terminal, &mut app);

    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    result
}

fn run_app<B: ratatui::backend::Backend>(terminal: &mut Terminal<B>, app: &mut App) -> Result<()> {
    loop {
        terminal.draw(|f| ui(f, app))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }

            match key.code {
                KeyCode::Char(c) => app.insert_char(c),
                KeyCode::Backspace => app.delete_char_before_cursor(),
                KeyCode::Enter => {
                    let input = std::mem::take(&mut app.input);
                    app.cursor_position = 0;
                    app.handle_input(input);
                }
                KeyCode::Up => app.navigate_history_backward(),
                KeyCode::Down => app.navigate_history_forward(),
                KeyCode::Left => {
                    app.cursor_position = app.cursor_position.saturating_sub(1);
                }
                KeyCode::Right => {
                    if app.cursor_position < app.input.chars().count() {
                        app.cursor_position += 1;
                    }
                }
                KeyCode::Home => app.cursor_position = 0,
                KeyCode::End => app.cursor_position = app.input.chars().count(),
                KeyCode::Esc => {
                    if app.form.is_some() {
                        app.finish_form();
                    } else {
                        app.should_quit = true;
                    }
                }
                KeyCode::PageUp => {
                    app.scroll_offset = app.scroll_offset.saturating_sub(10);
                }
                KeyCode::PageDown => {
                    app.scroll_offset =
                        (app.scroll_offset + 10).min(app.output.len().saturating_sub(1));
                }
                _ => {}
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

fn line_style(line: &str) -> Style {
    match line.trim_start().chars().next() {
        Some('✓') => Style::default().fg(Color::Green),
        Some('✗') => Style::default().fg(Color::Red),
        Some('⚠') => Style::default().fg(Color::Yellow),
        Some('ℹ') => Style::default().fg(Color::Cyan),
        Some('#') => Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
        _ => Style::default().fg(Color::White),
    }
}

fn ui(f: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(3),    // Output area
            Constraint::Length(1), // Horizontal rule
            Constraint::Length(1), // Input area
            Constraint::Length(1), // Horizontal rule
            Constraint::Length(1), // Status bar
        ])
        .split(f.area());

    let output_height = chunks[0].height as usize;
    let total_lines = app.output.len();

    let scroll_offset = if app.scroll_offset == 0 && total_lines > output_height {
        total_lines.saturating_sub(output_height)
    } else {
        app.scroll_offset
            .min(total_lines.saturating_sub(output_height))
    };

    let visible_output: Vec<Line> = app
        .output
        .iter()
        .skip(scroll_offset)
        .take(output_height)
        .map(|line| Line::styled(line.clone(), line_style(line)))
        .collect();

    f.render_widget(Paragraph::new(visible_output), chunks[0]);

    let rule1 = Paragraph::new("─".repeat(chunks[1].width as usize))
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(rule1, chunks[1]);

    let prompt = app.prompt();
    let input = Paragraph::new(format!("{}{}", prompt, app.input))
        .style(Style::default().fg(Color::Yellow));
    f.render_widget(input, chunks[2]);

    f.set_cursor_position((
        chunks[2].x + (prompt.chars().count() + app.cursor_position) as u16,
        chunks[2].y,
    ));

    let rule2 = Paragraph::new("─".repeat(chunks[3].width as usize))
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(rule2, chunks[3]);

    let bold = Style::default().add_modifier(Modifier::BOLD);
    let status = if app.form.is_some() {
        Line::from(vec![
            Span::raw("Enter a value, or leave it "),
            Span::styled("blank", bold),
            Span::raw(" to skip | "),
            Span::styled(":done", bold),
            Span::raw(" or "),
            Span::styled("ESC", bold),
            Span::raw(" to stop"),
        ])
    } else {
        Line::from(vec![
            Span::raw("Press "),
            Span::styled("ESC", bold),
            Span::raw(" or type "),
            Span::styled("exit", bold),
            Span::raw(" to quit | "),
            Span::styled("help", bold),
            Span::raw(" for commands | "),
            Span::styled("↑↓", bold),
            Span::raw(" history | "),
            Span::styled("PgUp/PgDn", bold),
            Span::raw(" scroll"),
        ])
    };
    let status = Paragraph::new(status).style(Style::default().fg(Color::DarkGray));
    f.render_widget(status, chunks[4]);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ldsmith_core::config::{OutputConfig, SelectionMode};
    use ldsmith_core::session::Stage;
    use serde_json::{Value, json};
    use tempfile::TempDir;
    use tokio::runtime::Runtime;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{method, path},
    };

    const PRODUCT_PAGE: &str = r#"<html><body>
        <table class="definition-table">
            <tr><th>Property</th><th>Description</th></tr>
            <tr><td>name</td><td>The name of the item.</td></tr>
            <tr><td>sku</td><td>The Stock Keeping Unit.</td></tr>
        </table>
    </body></html>"#;

    const SHOP_PAGE: &str = r#"<html><head>
        <script type="application/ld+json">{"@context":"https://schema.org","@type":"Organization","name":"Acme"}</script>
    </head></html>"#;

    fn offline_app(runtime: &Runtime) -> App {
        App::new(
            Config::default(),
            SchemaClient::new().unwrap(),
            runtime.handle().clone(),
        )
    }

    fn registry(runtime: &Runtime) -> MockServer {
        runtime.block_on(async {
            let server = MockServer::start().await;
            Mock::given(method("GET"))
                .and(path("/Product"))
                .respond_with(ResponseTemplate::new(200).set_body_string(PRODUCT_PAGE))
                .mount(&server)
                .await;
            Mock::given(method("GET"))
                .and(path("/shop"))
                .respond_with(ResponseTemplate::new(200).set_body_string(SHOP_PAGE))
                .mount(&server)
                .await;
            server
        })
    }

    fn online_app(runtime: &Runtime, server: &MockServer, out: &TempDir) -> App {
        let config = Config {
            registry_base: server.uri(),
            selection: SelectionMode::FreeText,
            output: OutputConfig::in_dir(out.path()),
            ..Config::default()
        };
        let client = config.client().unwrap();
        App::new(config, client, runtime.handle().clone())
    }

    fn run_lines(app: &mut App, lines: &[&str]) {
        for line in lines {
            app.handle_input(line.to_string());
        }
    }

    fn output_contains(app: &App, needle: &str) -> bool {
        app.output().iter().any(|line| line.contains(needle))
    }

    #[test]
    fn test_unknown_command() {
        let runtime = Runtime::new().unwrap();
        let mut app = offline_app(&runtime);

        app.handle_input("frobnicate now".to_string());

        assert!(output_contains(&app, "Unknown command: frobnicate"));
        assert_eq!(app.history, vec!["frobnicate now"]);
    }

    #[test]
    fn test_help_lists_every_command() {
        let runtime = Runtime::new().unwrap();
        let mut app = offline_app(&runtime);

        app.handle_input("help".to_string());

        for command in [
            "analyze", "docs", "vocab", "select", "fetch", "props", "form", "set", "unset",
            "values", "generate", "save", "state", "validator", "clear",
        ] {
            assert!(output_contains(&app, &format!("  {} ", command)), "{}", command);
        }
    }

    #[test]
    fn test_actions_out_of_order_report_errors() {
        let runtime = Runtime::new().unwrap();
        let mut app = offline_app(&runtime);

        run_lines(&mut app, &["set name Widget", "generate", "save", "form"]);

        assert!(output_contains(&app, "Fetch the properties before entering values."));
        assert!(output_contains(&app, "Select a vocabulary type first."));
        assert!(output_contains(&app, "Nothing to save yet"));
        assert!(app.form.is_none());
        assert_eq!(app.session().stage(), Stage::Idle);
    }

    #[test]
    fn test_missing_arguments() {
        let runtime = Runtime::new().unwrap();
        let mut app = offline_app(&runtime);

        run_lines(&mut app, &["analyze", "select", "set name", "unset"]);

        assert!(output_contains(&app, "analyze requires a URL"));
        assert!(output_contains(&app, "select requires a vocabulary type"));
        assert!(output_contains(&app, "set requires a property name and a value"));
        assert!(output_contains(&app, "unset requires a property name"));
    }

    #[test]
    fn test_analyze_assumes_https() {
        let runtime = Runtime::new().unwrap();
        let mut app = offline_app(&runtime);

        app.handle_input("analyze localhost:1/shop".to_string());

        assert_eq!(app.session().url(), Some("https://localhost:1/shop"));
        assert!(output_contains(&app, "Analyzing https://localhost:1/shop"));
        assert!(output_contains(&app, "Error fetching the page"));
    }

    #[test]
    fn test_analyze_rejects_invalid_urls() {
        let runtime = Runtime::new().unwrap();
        let mut app = offline_app(&runtime);

        run_lines(&mut app, &["analyze not a url", "analyze ftp://example.com/file"]);

        assert!(output_contains(&app, "'not a url' is not an http(s) URL"));
        assert!(output_contains(&app, "'ftp://example.com/file' is not an http(s) URL"));
        assert_eq!(app.session().url(), None);
        assert_eq!(app.session().stage(), Stage::Idle);
    }

    #[test]
    fn test_history_navigation() {
        let runtime = Runtime::new().unwrap();
        let mut app = offline_app(&runtime);
        run_lines(&mut app, &["state", "validator"]);

        app.input = "do".to_string();
        app.navigate_history_backward();
        assert_eq!(app.input, "validator");
        app.navigate_history_backward();
        assert_eq!(app.input, "state");
        app.navigate_history_backward();
        assert_eq!(app.input, "state");

        app.navigate_history_forward();
        assert_eq!(app.input, "validator");
        app.navigate_history_forward();
        assert_eq!(app.input, "do");
        assert_eq!(app.cursor_position, 2);
    }

    #[test]
    fn test_multibyte_editing() {
        let runtime = Runtime::new().unwrap();
        let mut app = offline_app(&runtime);

        for c in "café".chars() {
            app.insert_char(c);
        }
        app.delete_char_before_cursor();
        app.insert_char('é');
        app.cursor_position = 0;
        app.insert_char('>');

        assert_eq!(app.input, ">café");
    }

    #[test]
    fn test_write_quit_saves_history() {
        let runtime = Runtime::new().unwrap();
        let dir = TempDir::new().unwrap();
        let history = dir.path().join("history");
        let mut app = offline_app(&runtime).with_history_path(Some(history.clone()));

        run_lines(&mut app, &["state", "ZZ"]);

        assert!(app.should_quit);
        assert_eq!(fs::read_to_string(&history).unwrap(), "state\nZZ");
    }

    #[test]
    fn test_force_quit_skips_history() {
        let runtime = Runtime::new().unwrap();
        let dir = TempDir::new().unwrap();
        let history = dir.path().join("history");
        let mut app = offline_app(&runtime).with_history_path(Some(history.clone()));

        run_lines(&mut app, &["state", ":q!"]);

        assert!(app.should_quit);
        assert!(!history.exists());
    }

    #[test]
    fn test_exit_asks_before_saving_history() {
        let runtime = Runtime::new().unwrap();
        let dir = TempDir::new().unwrap();
        let history = dir.path().join("history");
        let mut app = offline_app(&runtime).with_history_path(Some(history.clone()));

        app.handle_input("exit".to_string());
        assert!(app.awaiting_save_confirmation);
        assert!(!app.should_quit);

        app.handle_input("n".to_string());
        assert!(app.should_quit);
        assert!(!history.exists());
        assert!(output_contains(&app, "History not saved."));
    }

    #[test]
    fn test_load_history_keeps_latest_entries() {
        let runtime = Runtime::new().unwrap();
        let dir = TempDir::new().unwrap();
        let history = dir.path().join("history");
        let entries: Vec<String> = (0..150).map(|i| format!("cmd {}", i)).collect();
        fs::write(&history, entries.join("\n")).unwrap();

        let mut app = offline_app(&runtime).with_history_path(Some(history));
        app.load_history();

        assert_eq!(app.history.len(), HISTORY_LIMIT);
        assert_eq!(app.history[0], "cmd 50");
    }

    #[test]
    fn test_form_walks_every_property() {
        let runtime = Runtime::new().unwrap();
        let server = registry(&runtime);
        let out = TempDir::new().unwrap();
        let mut app = online_app(&runtime, &server, &out);

        run_lines(&mut app, &["select Product", "fetch", "form"]);
        assert_eq!(app.prompt(), FORM_PROMPT);
        assert!(output_contains(&app, "name (The name of the item.):"));

        app.handle_input("Widget".to_string());
        assert!(output_contains(&app, "sku (The Stock Keeping Unit.):"));

        // Blank skips the field and the last field closes the form
        app.handle_input(String::new());
        assert!(app.form.is_none());
        assert_eq!(app.prompt(), PROMPT);

        assert_eq!(app.session().values().len(), 1);
        assert_eq!(app.session().values()["name"], "Widget");
        assert!(!app.history.iter().any(|line| line == "Widget"));
    }

    #[test]
    fn test_form_done_ends_early() {
        let runtime = Runtime::new().unwrap();
        let server = registry(&runtime);
        let out = TempDir::new().unwrap();
        let mut app = online_app(&runtime, &server, &out);

        run_lines(&mut app, &["select Product", "fetch", "form", ":done"]);

        assert!(app.form.is_none());
        assert!(app.session().values().is_empty());
        assert!(output_contains(&app, "Form closed with 0 value(s) entered."));
    }

    #[test]
    fn test_generate_saves_new_document() {
        let runtime = Runtime::new().unwrap();
        let server = registry(&runtime);
        let out = TempDir::new().unwrap();
        let mut app = online_app(&runtime, &server, &out);

        run_lines(
            &mut app,
            &[
                "select Product",
                "fetch",
                "set sku W 42",
                "set name Widget",
                "set color red",
                "generate",
            ],
        );

        assert!(output_contains(&app, "'color' is not a property of Product."));
        assert!(output_contains(&app, VALIDATOR_URL));
        assert_eq!(app.session().stage(), Stage::Persisted);

        let saved = fs::read_to_string(out.path().join("generated_json_ld.json")).unwrap();
        let saved: Value = serde_json::from_str(&saved).unwrap();
        assert_eq!(
            saved,
            json!({
                "@context": "https://schema.org",
                "@type": "Product",
                "name": "Widget",
                "sku": "W 42"
            })
        );
    }

    #[test]
    fn test_generate_merges_with_analyzed_page() {
        let runtime = Runtime::new().unwrap();
        let server = registry(&runtime);
        let out = TempDir::new().unwrap();
        let mut app = online_app(&runtime, &server, &out);

        let analyze = format!("analyze {}/shop", server.uri());
        run_lines(
            &mut app,
            &[&analyze, "select Product", "fetch", "set name Widget", "generate"],
        );

        assert!(output_contains(&app, "Found 1 JSON-LD document(s)."));
        assert!(output_contains(&app, "# Merged JSON-LD:"));

        let saved = fs::read_to_string(out.path().join("merged_json_ld.json")).unwrap();
        let saved: Value = serde_json::from_str(&saved).unwrap();
        let docs = saved.as_array().unwrap();
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["@type"], "Organization");
        assert_eq!(docs[1]["name"], "Widget");
    }

    #[test]
    fn test_unset_clears_value() {
        let runtime = Runtime::new().unwrap();
        let server = registry(&runtime);
        let out = TempDir::new().unwrap();
        let mut app = online_app(&runtime, &server, &out);

        run_lines(&mut app, &["select Product", "fetch", "set name Widget", "unset name", "values"]);

        assert!(app.session().values().is_empty());
        assert!(output_contains(&app, "No values entered yet."));
    }
}
