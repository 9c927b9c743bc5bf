use clap::{Parser, Subcommand};
use herd_core::config::ConfigOverrides;

#[derive(Parser, Debug)]
#[command(author, version, about = "Injection and note scheduling for a herd", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Output JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Override configuration values (format KEY=VALUE)
    #[arg(long = "config-override", value_name = "KEY=VALUE", global = true)]
    pub config_override: Vec<String>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Register, inspect and remove animals
    Cattle {
        #[command(subcommand)]
        command: CattleCommand,
    },
    /// Schedule and maintain events of one animal
    Event {
        #[command(subcommand)]
        command: EventCommand,
    },
    /// Mark an occurrence as done
    ///
    /// Example: herd done cow-1 evt-1 2024-01-15
    /// Example: herd done cow-1 evt-1 (first open occurrence)
    Done {
        cattle: String,
        event: String,
        occurrence: Option<String>,
    },
    /// Reopen a completed occurrence
    ///
    /// Example: herd undo cow-1 evt-1 2024-01-15
    /// Example: herd undo cow-1 evt-1 (latest completed occurrence)
    Undo {
        cattle: String,
        event: String,
        occurrence: Option<String>,
    },
    /// Show the calendar of one animal
    ///
    /// Example: herd calendar cow-1 --from 2024-01-01 --to 2024-03-31
    Calendar {
        cattle: String,
        #[arg(long, value_name = "DATE")]
        from: Option<String>,
        #[arg(long, value_name = "DATE")]
        to: Option<String>,
    },
    /// Next injection due for every animal
    ///
    /// Example: herd due
    Due,
    /// Send notifications for injections due today or overdue
    ///
    /// Example: herd notify
    Notify,
}

#[derive(Subcommand, Debug)]
pub enum CattleCommand {
    /// Register an animal
    ///
    /// Example: herd cattle add Lakshmi --breed Gir
    Add {
        name: String,
        #[arg(long)]
        breed: String,
        #[arg(long, value_name = "REF")]
        image: Option<String>,
    },
    /// List every animal
    List,
    /// Show one animal
    Show { id: String },
    /// Change name, breed or image (an empty image clears it)
    ///
    /// Example: herd cattle edit cow-1 --breed Sahiwal
    Edit {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        breed: Option<String>,
        #[arg(long, value_name = "REF")]
        image: Option<String>,
    },
    /// Remove an animal and all of its events
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Schedule an injection (default) or a note
    ///
    /// Example: herd event schedule cow-1 2024-01-01 "deworming" --every 7
    /// Example: herd event schedule cow-1 2024-02-01 "check weight" --note-only
    Schedule {
        cattle: String,
        date: String,
        note: String,
        #[arg(long)]
        note_only: bool,
        #[arg(long, value_name = "DAYS")]
        every: Option<u32>,
    },
    /// Edit an event
    ///
    /// Example: herd event edit cow-1 evt-1 --every 14
    /// Example: herd event edit cow-1 evt-1 --once --note "booster"
    Edit {
        cattle: String,
        event: String,
        #[arg(long, value_name = "DATE")]
        date: Option<String>,
        #[arg(long)]
        note: Option<String>,
        #[arg(long, conflicts_with = "note_only")]
        injection: bool,
        #[arg(long)]
        note_only: bool,
        #[arg(long, value_name = "DAYS", conflicts_with = "once")]
        every: Option<u32>,
        #[arg(long)]
        once: bool,
    },
    /// Move an event to another date (not into the past)
    ///
    /// Example: herd event move cow-1 evt-1 2024-02-10
    Move {
        cattle: String,
        event: String,
        date: String,
    },
    /// Delete an event
    Delete { cattle: String, event: String },
    /// List the events of one animal
    List { cattle: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigOverrideTarget {
    Theme,
    Horizon,
    Log,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedConfigOverride {
    pub target: ConfigOverrideTarget,
    pub value: String,
}

/// Parse a raw `KEY=VALUE` override string into a structured target.
pub fn parse_config_override(raw: &str) -> Result<ParsedConfigOverride, String> {
    let trimmed = raw.trim();
    let (key_raw, value_raw) = trimmed
        .split_once('=')
        .ok_or_else(|| "override must be in KEY=VALUE format".to_string())?;

    let value = value_raw.trim().to_string();
    let field =
        canonicalize_flag_name(key_raw).ok_or_else(|| "override key cannot be empty".to_string())?;

    let target = match field.as_str() {
        "theme" => ConfigOverrideTarget::Theme,
        "horizon" => ConfigOverrideTarget::Horizon,
        "log" => ConfigOverrideTarget::Log,
        other => return Err(format!("unknown config field '{other}'")),
    };

    Ok(ParsedConfigOverride { target, value })
}

/// Fold every `--config-override` argument into one set of overrides.
pub fn collect_config_overrides(raw: &[String]) -> Result<ConfigOverrides, String> {
    let mut overrides = ConfigOverrides::default();

    for entry in raw {
        let parsed = parse_config_override(entry)?;
        match parsed.target {
            ConfigOverrideTarget::Theme => overrides.theme = Some(parsed.value),
            ConfigOverrideTarget::Horizon => {
                let horizon = parsed
                    .value
                    .parse::<u32>()
                    .ok()
                    .filter(|horizon| *horizon > 0)
                    .ok_or_else(|| "horizon must be a positive number".to_string())?;
                overrides.horizon = Some(horizon);
            }
            ConfigOverrideTarget::Log => overrides.log = Some(parsed.value),
        }
    }

    Ok(overrides)
}

fn canonicalize_flag_name(name: &str) -> Option<String> {
    let mut cleaned = String::new();
    let mut previous_underscore = false;

    for ch in name.chars() {
        if ch.is_ascii_alphanumeric() {
            cleaned.push(ch.to_ascii_lowercase());
            previous_underscore = false;
        } else if !previous_underscore && !cleaned.is_empty() {
            cleaned.push('_');
            previous_underscore = true;
        }
    }

    let trimmed = cleaned.trim_matches('_');
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Cli, Command, ConfigOverrideTarget, EventCommand, collect_config_overrides,
        parse_config_override,
    };
    use clap::Parser;

    #[test]
    fn parse_config_override_canonicalizes_field_names() {
        let parsed = parse_config_override(" THEME = Noir ").unwrap();

        assert_eq!(parsed.target, ConfigOverrideTarget::Theme);
        assert_eq!(parsed.value, "Noir");
    }

    #[test]
    fn parse_config_override_rejects_unknown_fields() {
        let err = parse_config_override("aliases.ls=value").unwrap_err();
        assert!(err.contains("unknown config field"));
    }

    #[test]
    fn parse_config_override_rejects_missing_equals() {
        let err = parse_config_override("horizon").unwrap_err();
        assert!(err.contains("KEY=VALUE"));
    }

    #[test]
    fn collect_overrides_parses_horizon_and_log() {
        let overrides = collect_config_overrides(&[
            "horizon=12".to_string(),
            "log = herd_core=debug".to_string(),
        ])
        .unwrap();

        assert_eq!(overrides.horizon, Some(12));
        assert_eq!(overrides.log.as_deref(), Some("herd_core=debug"));
        assert_eq!(overrides.theme, None);
    }

    #[test]
    fn collect_overrides_rejects_zero_horizon() {
        let err = collect_config_overrides(&["horizon=0".to_string()]).unwrap_err();
        assert!(err.contains("positive"));
    }

    #[test]
    fn edit_rejects_conflicting_repeat_flags() {
        let result = Cli::try_parse_from([
            "herd", "event", "edit", "cow-1", "evt-1", "--every", "7", "--once",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn schedule_parses_recurring_injection() {
        let cli = Cli::try_parse_from([
            "herd",
            "event",
            "schedule",
            "cow-1",
            "2024-01-01",
            "deworming",
            "--every",
            "7",
        ])
        .unwrap();

        match cli.command {
            Command::Event {
                command:
                    EventCommand::Schedule {
                        every, note_only, ..
                    },
            } => {
                assert_eq!(every, Some(7));
                assert!(!note_only);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}
