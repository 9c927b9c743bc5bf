use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use herd_cli::cli::{CattleCommand, Cli, Command, EventCommand, collect_config_overrides};
use herd_cli::render;
use herd_core::config::{Config, load_config_with_fallback, merge_overrides, palette_for_theme};
use herd_core::error::AppError;
use herd_core::herd_api::{self, EventEdit, HerdCache, RepeatChange};
use herd_core::model::{
    Cattle, CattlePatch, Event, EventKind, NewCattle, NewEvent, format_date, parse_date,
};
use herd_core::notify::notifier_from_env;
use herd_core::schedule::OccurrenceKey;
use herd_core::storage::{CattleStore, EventStore, JsonStore};
use std::io::{self, BufRead};
use time::Date;
use tracing::debug;
use tracing_subscriber::EnvFilter;

const LOG_ENV_VAR: &str = "HERD_LOG";

struct Session {
    store: JsonStore,
    config: Config,
}

fn init_tracing(config: &Config) {
    let directive = std::env::var(LOG_ENV_VAR)
        .ok()
        .filter(|value| !value.trim().is_empty())
        .or_else(|| config.log.clone())
        .unwrap_or_else(|| "warn".to_string());
    let filter = EnvFilter::try_new(&directive).unwrap_or_else(|_| EnvFilter::new("warn"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init();
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid command").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn split_command_line(line: &str) -> Result<Vec<String>, AppError> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut escape = false;

    for ch in line.chars() {
        if escape {
            if ch != '"' && ch != '\\' {
                current.push('\\');
            }
            current.push(ch);
            escape = false;
            continue;
        }

        if in_quotes && ch == '\\' {
            escape = true;
            continue;
        }

        if ch == '"' {
            in_quotes = !in_quotes;
            continue;
        }

        if ch.is_whitespace() && !in_quotes {
            if !current.is_empty() {
                args.push(std::mem::take(&mut current));
            }
            continue;
        }

        current.push(ch);
    }

    if in_quotes {
        return Err(AppError::invalid_input("unterminated quote in command"));
    }

    if !current.is_empty() {
        args.push(current);
    }

    Ok(args)
}

fn print_help() {
    let mut cmd = Cli::command();
    let help = cmd.render_help();
    println!("{help}");
}

fn print_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<(), AppError> {
    println!("{}", render::json(value)?);
    Ok(())
}

fn print_cattle(cattle: &Cattle, json: bool, verb: &str) -> Result<(), AppError> {
    if json {
        print_json(cattle)
    } else {
        println!("{verb} cattle: {} ({})", cattle.name, cattle.id);
        Ok(())
    }
}

fn print_event(event: &Event, json: bool, verb: &str) -> Result<(), AppError> {
    if json {
        print_json(event)
    } else {
        println!(
            "{verb} {}: {} ({}) on {}, {}, {}",
            event.kind.label().to_lowercase(),
            event.note,
            event.id,
            format_date(event.date),
            render::repeat_label(event),
            render::status_label(event)
        );
        Ok(())
    }
}

fn parse_optional_date(raw: Option<&str>) -> Result<Option<Date>, AppError> {
    raw.map(parse_date).transpose()
}

fn run_cattle(
    command: CattleCommand,
    store: &JsonStore,
    json: bool,
    cache: Option<&HerdCache>,
) -> Result<(), AppError> {
    match command {
        CattleCommand::Add { name, breed, image } => {
            let cattle = herd_api::register_cattle(store, NewCattle { name, breed, image })?;
            print_cattle(&cattle, json, "Registered")
        }
        CattleCommand::List => {
            let cattle = match cache {
                Some(cache) => cache.snapshot(),
                None => store.list_cattle()?,
            };
            if json {
                print_json(&cattle)
            } else if cattle.is_empty() {
                println!("No cattle registered");
                Ok(())
            } else {
                println!("{}", render::cattle_table(&cattle));
                Ok(())
            }
        }
        CattleCommand::Show { id } => {
            let cattle = store.get_cattle(&id)?;
            if json {
                print_json(&cattle)
            } else {
                println!("{}", render::cattle_details(&cattle));
                Ok(())
            }
        }
        CattleCommand::Edit {
            id,
            name,
            breed,
            image,
        } => {
            let patch = CattlePatch {
                name,
                breed,
                image: image.map(Some),
            };
            let cattle = herd_api::edit_cattle(store, &id, &patch)?;
            print_cattle(&cattle, json, "Updated")
        }
        CattleCommand::Delete { id } => {
            let cattle = store.delete_cattle(&id)?;
            print_cattle(&cattle, json, "Deleted")
        }
    }
}

fn run_event(command: EventCommand, store: &JsonStore, json: bool) -> Result<(), AppError> {
    match command {
        EventCommand::Schedule {
            cattle,
            date,
            note,
            note_only,
            every,
        } => {
            let date = parse_date(&date)?;
            let kind = if note_only {
                EventKind::Note
            } else {
                EventKind::Injection
            };
            let draft = match every {
                Some(days) => NewEvent::every(date, kind, note, days),
                None => NewEvent::once(date, kind, note),
            };
            let event = herd_api::schedule_event(store, &cattle, draft)?;
            print_event(&event, json, "Scheduled")
        }
        EventCommand::Edit {
            cattle,
            event,
            date,
            note,
            injection,
            note_only,
            every,
            once,
        } => {
            let kind = if injection {
                Some(EventKind::Injection)
            } else if note_only {
                Some(EventKind::Note)
            } else {
                None
            };
            let repeat = match (every, once) {
                (Some(days), _) => Some(RepeatChange::Every(days)),
                (None, true) => Some(RepeatChange::Once),
                (None, false) => None,
            };
            let edit = EventEdit {
                date: parse_optional_date(date.as_deref())?,
                kind,
                note,
                repeat,
            };
            let updated = herd_api::edit_event(store, &cattle, &event, edit, herd_api::now())?;
            print_event(&updated, json, "Updated")
        }
        EventCommand::Move {
            cattle,
            event,
            date,
        } => {
            let key = OccurrenceKey {
                event_id: event,
                index: 0,
            };
            let moved = herd_api::move_occurrence(
                store,
                &cattle,
                &key,
                parse_date(&date)?,
                herd_api::now(),
                herd_api::today(),
            )?;
            print_event(&moved, json, "Moved")
        }
        EventCommand::Delete { cattle, event } => {
            let removed = herd_api::delete_event(store, &cattle, &event)?;
            print_event(&removed, json, "Deleted")
        }
        EventCommand::List { cattle } => {
            let events = store.list_events(&cattle)?;
            if json {
                print_json(&events)
            } else if events.is_empty() {
                println!("No events scheduled");
                Ok(())
            } else {
                println!("{}", render::events_table(&events));
                Ok(())
            }
        }
    }
}

fn run_command(cli: Cli, session: &Session, cache: Option<&HerdCache>) -> Result<(), AppError> {
    let overrides =
        collect_config_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    let config = merge_overrides(&session.config, &overrides);
    let store = &session.store;
    let json = cli.json;
    debug!(command = ?cli.command, horizon = config.horizon, "running command");

    match cli.command {
        Command::Cattle { command } => run_cattle(command, store, json, cache),
        Command::Event { command } => run_event(command, store, json),
        Command::Done {
            cattle,
            event,
            occurrence,
        } => {
            let updated = herd_api::complete_occurrence(
                store,
                &cattle,
                &event,
                parse_optional_date(occurrence.as_deref())?,
                herd_api::now(),
                herd_api::today(),
            )?;
            print_event(&updated, json, "Completed")
        }
        Command::Undo {
            cattle,
            event,
            occurrence,
        } => {
            let updated = herd_api::reopen_occurrence(
                store,
                &cattle,
                &event,
                parse_optional_date(occurrence.as_deref())?,
                herd_api::now(),
                herd_api::today(),
            )?;
            print_event(&updated, json, "Reopened")
        }
        Command::Calendar { cattle, from, to } => {
            let from = parse_optional_date(from.as_deref())?;
            let to = parse_optional_date(to.as_deref())?;
            let range = match (from, to) {
                (None, None) => None,
                (from, to) => {
                    let from = from.unwrap_or(Date::MIN);
                    let to = to.unwrap_or(Date::MAX);
                    if from > to {
                        return Err(AppError::invalid_input("--from must not be after --to"));
                    }
                    Some((from, to))
                }
            };

            let items =
                herd_api::calendar(store, &cattle, herd_api::today(), config.horizon, range)?;
            if json {
                return print_json(&items);
            }

            let name = match cache.and_then(|cache| cache.name_of(&cattle)) {
                Some(name) => name,
                None => store.get_cattle(&cattle)?.name,
            };
            println!("Calendar for {name} ({cattle})");
            if items.is_empty() {
                println!("No events in range");
            }
            let palette = palette_for_theme(config.theme.as_deref());
            for line in render::calendar_lines(&items, &palette) {
                println!("{line}");
            }
            Ok(())
        }
        Command::Due => {
            let summary = herd_api::next_injections(store, herd_api::today())?;
            if json {
                println!("{}", render::due_json(&summary));
            } else if summary.is_empty() {
                println!("No cattle registered");
            } else {
                println!("{}", render::due_table(&summary));
            }
            Ok(())
        }
        Command::Notify => {
            let notifier = notifier_from_env()?;
            let outcome = herd_api::notify_due(store, notifier.as_ref(), herd_api::today())?;
            for failure in &outcome.failures {
                eprintln!("WARNING: {}: {}", failure.cattle_id, failure.error);
            }

            if json {
                let payload: Vec<_> = outcome
                    .reminders
                    .iter()
                    .map(|reminder| {
                        serde_json::json!({
                            "cattle_id": reminder.cattle_id,
                            "cattle_name": reminder.cattle_name,
                            "event_id": reminder.event_id,
                            "note": reminder.note,
                            "due": format_date(reminder.due),
                            "overdue": reminder.overdue,
                        })
                    })
                    .collect();
                println!("{}", serde_json::Value::Array(payload));
            } else if outcome.reminders.is_empty() {
                println!("No injections due");
            } else {
                for reminder in &outcome.reminders {
                    println!("{}: {}", reminder.summary(), reminder.body());
                }
            }
            Ok(())
        }
    }
}

fn run_interactive(session: &Session) -> Result<(), AppError> {
    let cache = match HerdCache::attach(&session.store) {
        Ok(cache) => Some(cache),
        Err(err) => {
            eprintln!("WARNING: {err}");
            None
        }
    };

    let mut input = String::new();
    let stdin = io::stdin();
    let mut stdin_lock = stdin.lock();

    loop {
        input.clear();
        let bytes = stdin_lock
            .read_line(&mut input)
            .map_err(|err| AppError::invalid_input(err.to_string()))?;

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
                eprintln!("ERROR: {err}");
                continue;
            }
        };

        if args.is_empty() {
            continue;
        }

        let mut argv = Vec::with_capacity(args.len() + 1);
        argv.push("herd".to_string());
        argv.extend(args);

        let cli = match Cli::try_parse_from(argv) {
            Ok(cli) => cli,
            Err(err) => {
                eprintln!("ERROR: {}", normalize_parse_error(err));
                continue;
            }
        };

        if let Err(err) = run_command(cli, session, cache.as_ref()) {
            eprintln!("ERROR: {err}");
        }
    }

    Ok(())
}

fn fail(err: AppError) -> ! {
    eprintln!("ERROR: {err}");
    std::process::exit(1);
}

fn main() {
    let loaded = load_config_with_fallback();

    let mut args = std::env::args_os();
    args.next();
    let cli = if args.next().is_none() {
        None
    } else {
        match Cli::try_parse() {
            Ok(cli) => Some(cli),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
                ) =>
            {
                err.exit()
            }
            Err(err) => fail(normalize_parse_error(err)),
        }
    };

    let log_config = match cli
        .as_ref()
        .and_then(|cli| collect_config_overrides(&cli.config_override).ok())
    {
        Some(overrides) => merge_overrides(&loaded.config, &overrides),
        None => loaded.config.clone(),
    };
    init_tracing(&log_config);

    if let Some(err) = loaded.error {
        eprintln!("WARNING: config ignored: {err}");
    }

    let store = JsonStore::open_default().unwrap_or_else(|err| fail(err));
    let session = Session {
        store,
        config: loaded.config,
    };

    let result = match cli {
        Some(cli) => run_command(cli, &session, None),
        None => run_interactive(&session),
    };
    if let Err(err) = result {
        fail(err);
    }
}
