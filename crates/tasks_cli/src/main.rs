use clap::{CommandFactory, Parser};
use std::io::{self, BufRead};
use tasks_cli::cli::{Cli, Command, collect_config_overrides};
use tasks_cli::render;
use tasks_core::config::{self, Config};
use tasks_core::error::AppError;
use tasks_core::model::{TaskState, Todo, TodoId};
use tasks_core::reducer::{TaskAction, TaskEnvironment};
use tasks_core::session::TaskSession;
use tasks_core::storage::{FileStore, KeyValueStore, STATE_KEY, store_path};
use tasks_core::validate_state;
use tracing_subscriber::EnvFilter;

type Session = TaskSession<FileStore>;

fn print_state_json(state: &TaskState) -> Result<(), AppError> {
    println!("{}", serde_json::to_string(state)?);
    Ok(())
}

fn print_todo_json(todo: &Todo) -> Result<(), AppError> {
    println!("{}", serde_json::to_string(todo)?);
    Ok(())
}

/// First line of a clap error, without its `error: ` prefix.
fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let line = rendered.lines().next().unwrap_or("invalid command").trim();
    AppError::invalid_input(line.trim_start_matches("error: "))
}

/// Splits an interactive line into arguments.
///
/// Single quotes are literal. Double quotes accept `\"` and `\\` escapes so
/// raw JSON can be typed either way.
fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&ch) = chars.peek() {
        if ch.is_whitespace() {
            chars.next();
            continue;
        }

        let mut arg = String::new();
        while let Some(&ch) = chars.peek() {
            if ch.is_whitespace() {
                break;
            }
            chars.next();
            match ch {
                '\'' | '"' => read_quoted(&mut chars, ch, &mut arg)?,
                _ => arg.push(ch),
            }
        }
        args.push(arg);
    }

    Ok(args)
}

fn read_quoted(
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    quote: char,
    arg: &mut String,
) -> Result<(), AppError> {
    while let Some(ch) = chars.next() {
        match ch {
            _ if ch == quote => return Ok(()),
            '\\' if quote == '"' => match chars.next_if(|next| matches!(*next, '"' | '\\')) {
                Some(escaped) => arg.push(escaped),
                None => arg.push(ch),
            },
            _ => arg.push(ch),
        }
    }
    Err(AppError::invalid_input("unterminated quote in command"))
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn init_logging(config: &Config) {
    let filter = config::log_filter(config);
    let filter = EnvFilter::try_new(&filter)
        .unwrap_or_else(|_| EnvFilter::new(config::DEFAULT_LOG_FILTER));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn open_session(config: &Config) -> Result<Session, AppError> {
    let path = store_path(config.store_path.as_deref())?;
    tracing::debug!(path = %path.display(), "opening task storage");
    Ok(TaskSession::open(
        FileStore::new(path),
        TaskEnvironment::default(),
    ))
}

fn parse_id(raw: &str) -> Result<TodoId, AppError> {
    raw.parse()
}

fn run_command(cli: Cli, session: &mut Session) -> Result<(), AppError> {
    match cli.command {
        Command::Add { text } => {
            let text = match text {
                Some(value) if !value.trim().is_empty() => value.trim().to_string(),
                _ => return Err(AppError::invalid_input("text is required")),
            };

            let state = session.dispatch(&TaskAction::AddTodo(text))?;
            let todo = state
                .todos()
                .last()
                .ok_or_else(|| AppError::invalid_data("added task is missing"))?;
            if cli.json {
                print_todo_json(todo)?;
            } else {
                println!("Added task: {} ({})", todo.text, todo.id);
            }
        }
        Command::Toggle { id } => {
            let id = parse_id(&id)?;
            let state = session.dispatch(&TaskAction::ToggleTodo(id))?;
            match state.get(id) {
                Some(todo) if cli.json => print_todo_json(todo)?,
                Some(todo) if todo.completed => {
                    println!("Completed task: {} ({})", todo.text, todo.id);
                }
                Some(todo) => println!("Reopened task: {} ({})", todo.text, todo.id),
                None if cli.json => print_state_json(state)?,
                None => println!("No task with id {id}"),
            }
        }
        Command::Delete { id } => {
            let id = parse_id(&id)?;
            let removed = session.state().get(id).cloned();
            let state = session.dispatch(&TaskAction::DeleteTodo(id))?;
            if cli.json {
                print_state_json(state)?;
            } else {
                match removed {
                    Some(todo) => println!("Deleted task: {} ({})", todo.text, todo.id),
                    None => println!("No task with id {id}"),
                }
            }
        }
        Command::List => {
            if cli.json {
                print_state_json(session.state())?;
            } else {
                println!("{}", render::state_plain(session.state()));
            }
        }
        Command::Apply { action } => {
            let action = TaskAction::from_json(&action)?;
            if let TaskAction::Unknown(kind) = &action {
                tracing::warn!(kind = %kind, "unknown action kind, state unchanged");
            }
            let state = session.dispatch(&action)?;
            if cli.json {
                print_state_json(state)?;
            } else {
                println!("Applied {}: {}", action.kind(), render::summary_line(state));
            }
        }
        Command::Check => match session.storage().get(STATE_KEY)? {
            None => println!("No stored task state"),
            Some(raw) => {
                let state = validate_state(&raw)?;
                if state.counters_consistent() {
                    println!("Stored task state is valid: {}", render::summary_line(&state));
                } else {
                    println!(
                        "Stored task state is valid but its counters are stale: {}",
                        render::summary_line(&state)
                    );
                }
            }
        },
    }

    Ok(())
}

fn run_interactive(session: &mut Session) -> Result<(), AppError> {
    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock.read_line(&mut input)?;

        if bytes == 0 {
            break;
        }

        let line = input.trim();
        if line.is_empty() {
            continue;
        }

        if line.eq_ignore_ascii_case("exit") || line.eq_ignore_ascii_case("quit") {
            break;
        }

        if line == "help" || line == "?" {
            print_help();
            continue;
        }

        let args = match split_command_line(line) {
            Ok(args) => args,
            Err(err) => {
                eprintln!("ERROR: {}", err);
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("tasks".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if !cli.config_override.is_empty() {
            eprintln!(
                "ERROR: {}",
                AppError::invalid_input("config overrides are only accepted on the command line")
            );
            continue;
        }

        if let Err(err) = run_command(cli, session) {
            eprintln!("ERROR: {}", err);
        }
    }

    Ok(())
}

fn startup(overrides: &[String]) -> Result<Session, AppError> {
    let loaded = config::load_config_with_fallback();
    let overrides = collect_config_overrides(overrides).map_err(AppError::invalid_input)?;
    let config = config::merge_overrides(&loaded.config, &overrides);

    init_logging(&config);
    if let Some(err) = loaded.error {
        tracing::warn!(error = %err, "config ignored, using defaults");
    }

    open_session(&config)
}

fn exit_with(err: AppError) -> ! {
    eprintln!("ERROR: {}", err);
    std::process::exit(1);
}

fn main() {
    let mut args = std::env::args_os();
    args.next();
    if args.next().is_none() {
        let mut session = startup(&[]).unwrap_or_else(|err| exit_with(err));
        if let Err(err) = run_interactive(&mut session) {
            exit_with(err);
        }
        return;
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if !err.use_stderr() => {
            // --help and --version
            let _ = err.print();
            return;
        }
        Err(err) => exit_with(normalize_parse_error(err)),
    };

    let mut session = startup(&cli.config_override).unwrap_or_else(|err| exit_with(err));
    if let Err(err) = run_command(cli, &mut session) {
        exit_with(err);
    }
}
