mod api;
mod auth;
mod cache;
mod config;
mod error;
mod format;
mod model;
mod output;
mod schedule;
mod units;
mod validate;

use clap::{Args, Parser, Subcommand, ValueEnum};
use tracing::debug;

use crate::api::ApiClient;
use crate::auth::{AuthClient, SessionStore};
use crate::cache::HabitCache;
use crate::config::{resolve_api_base_url, resolve_session_path};
use crate::error::AppError;
use crate::model::{Habit, HabitUnit, HabitUpdate};
use crate::output::{habit_row, render_habit_card, render_simple_table, Styler};
use crate::schedule::{parse_days_pattern, HabitSchedule, IntervalType};
use crate::units::DEFAULT_UNITS;
use crate::validate::{build_habit_create, validate_schedule, HabitDraft};

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum Format {
    Table,
    Json,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
enum IntervalArg {
    Day,
    Week,
    Month,
}

impl IntervalArg {
    fn to_interval_type(self) -> IntervalType {
        match self {
            IntervalArg::Day => IntervalType::Day,
            IntervalArg::Week => IntervalType::Week,
            IntervalArg::Month => IntervalType::Month,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "habitdash", version, about = "Terminal dashboard for a remote habit-tracking service")]
struct Cli {
    /// Base URL of the habit service (or HABITDASH_API_URL).
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Overrides the session file path for this invocation.
    #[arg(long, global = true)]
    session: Option<String>,

    /// Output format.
    #[arg(long, global = true, value_enum, default_value = "table")]
    format: Format,

    /// Disables ANSI color output.
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Sign in and store the session locally.
    Login(LoginArgs),
    /// Clear the local session and revoke it server-side.
    Logout,
    /// Show the signed-in user.
    Whoami,
    List(ListArgs),
    Add(AddArgs),
    Show(SelectorArgs),
    Edit(EditArgs),
    Archive(SelectorArgs),
    Unarchive(SelectorArgs),
    Delete(SelectorArgs),
    /// List the measurement unit catalog.
    Units,
}

#[derive(Args, Debug)]
struct LoginArgs {
    email: String,

    /// Password (or HABITDASH_PASSWORD).
    #[arg(long)]
    password: Option<String>,
}

#[derive(Args, Debug)]
struct ListArgs {
    /// Include archived habits
    #[arg(long)]
    all: bool,
}

#[derive(Args, Debug)]
struct SelectorArgs {
    /// Habit selector: exact id or unique name prefix (case-insensitive)
    habit: String,
}

#[derive(Args, Debug)]
struct ScheduleArgs {
    /// Specific-days schedule: everyday, weekdays, weekends, or sun,mon,...
    #[arg(long)]
    days: Option<String>,

    /// Rolling schedule: due every N intervals since the last completion.
    #[arg(long)]
    every: Option<u32>,

    /// Flexible-window schedule: complete once within every N intervals.
    #[arg(long)]
    within: Option<u32>,

    /// Interval unit for --every / --within.
    #[arg(long, value_enum, default_value = "day")]
    interval: IntervalArg,

    /// A missed occurrence restarts the cadence from the next completion.
    #[arg(long)]
    reset_on_miss: bool,
}

impl ScheduleArgs {
    fn is_empty(&self) -> bool {
        self.days.is_none() && self.every.is_none() && self.within.is_none()
    }

    /// Exactly one of --days / --every / --within picks the variant.
    fn to_schedule(&self) -> Result<HabitSchedule, AppError> {
        let picked =
            [self.days.is_some(), self.every.is_some(), self.within.is_some()]
                .iter()
                .filter(|p| **p)
                .count();
        if picked != 1 {
            return Err(AppError::usage(
                "Pick exactly one of --days, --every, --within",
            ));
        }

        if let Some(pattern) = self.days.as_deref() {
            return Ok(HabitSchedule::SpecificDays {
                days_of_week: parse_days_pattern(pattern)?,
            });
        }
        if let Some(quantity) = self.every {
            return Ok(HabitSchedule::Rolling {
                interval_type: self.interval.to_interval_type(),
                interval_quantity: quantity,
                reset_on_miss: self.reset_on_miss,
            });
        }
        Ok(HabitSchedule::FlexibleWindow {
            window_length: self.within.unwrap_or(1),
            interval_type: self.interval.to_interval_type(),
            reset_on_miss: self.reset_on_miss,
        })
    }
}

#[derive(Args, Debug)]
struct UnitArgs {
    /// Catalog unit key (see `habitdash units`).
    #[arg(long)]
    unit: Option<String>,

    /// User-defined unit label, e.g. "pushups".
    #[arg(long)]
    custom_unit: Option<String>,
}

impl UnitArgs {
    fn to_unit(&self) -> Result<Option<HabitUnit>, AppError> {
        match (self.unit.as_deref(), self.custom_unit.as_deref()) {
            (Some(_), Some(_)) => Err(AppError::usage(
                "--unit and --custom-unit are mutually exclusive",
            )),
            (Some(key), None) => Ok(Some(HabitUnit::from_catalog_key(key))),
            (None, Some(label)) => Ok(Some(HabitUnit::custom(label))),
            (None, None) => Ok(None),
        }
    }
}

#[derive(Args, Debug)]
struct AddArgs {
    name: String,

    #[command(flatten)]
    unit: UnitArgs,

    /// Quantity to reach per due period, in the chosen unit.
    #[arg(long, default_value = "1")]
    target: String,

    #[command(flatten)]
    schedule: ScheduleArgs,

    #[arg(long)]
    notes: Option<String>,

    /// Display color as a hex string; defaults to the first palette entry.
    #[arg(long)]
    color: Option<String>,

    /// Planned end date (YYYY-MM-DD); none means no planned end.
    #[arg(long)]
    end_date: Option<String>,

    /// May be given multiple times.
    #[arg(long = "tag")]
    tags: Vec<String>,
}

#[derive(Args, Debug)]
struct EditArgs {
    /// Habit selector: exact id or unique name prefix (case-insensitive)
    habit: String,

    #[arg(long)]
    name: Option<String>,

    #[command(flatten)]
    unit: UnitArgs,

    #[arg(long)]
    target: Option<String>,

    #[command(flatten)]
    schedule: ScheduleArgs,

    #[arg(long)]
    notes: Option<String>,

    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    end_date: Option<String>,

    /// Removes the planned end date.
    #[arg(long)]
    clear_end_date: bool,

    /// Accepts an explicit boolean value (`--active true|false`).
    #[arg(long, action = clap::ArgAction::Set)]
    active: Option<bool>,

    /// Replaces the tag list; may be given multiple times.
    #[arg(long = "tag")]
    tags: Vec<String>,
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = match Cli::try_parse() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("{}", e);
            std::process::exit(2);
        }
    };

    let exit = match run(cli) {
        Ok(()) => 0,
        Err(e) => {
            eprintln!("{}", e);
            e.exit_code()
        }
    };

    std::process::exit(exit);
}

fn print_line(s: &str) {
    println!("{}", s);
}

fn print_json<T: serde::Serialize>(obj: &T) -> Result<(), AppError> {
    let s = serde_json::to_string_pretty(obj).map_err(|_| AppError::io("Cannot encode output"))?;
    println!("{}", s);
    Ok(())
}

fn resolve_color_enabled(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    true
}

fn parse_end_date(raw: &str) -> Result<chrono::NaiveDate, AppError> {
    chrono::NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::usage(format!("Invalid date (expected YYYY-MM-DD): {}", raw)))
}

/// Opens the session store and wires the cache-invalidation subscription
/// required on session change.
fn open_session_store(cli_session: Option<&str>) -> Result<SessionStore, AppError> {
    let path = resolve_session_path(cli_session)?;
    let mut store = SessionStore::open(&path)?;
    store.subscribe(|session| match session {
        Some(s) => debug!(user = %s.user.email, "session changed; caches for other users are stale"),
        None => debug!("session ended"),
    });
    Ok(store)
}

struct Dashboard {
    api: ApiClient,
    cache: HabitCache,
}

/// Everything past login works through a per-invocation dashboard: the
/// session's user, an API client, and that user's fetched habit list.
fn open_dashboard(store: &SessionStore, base_url: &str) -> Result<Dashboard, AppError> {
    let session = store.require()?;
    let api = ApiClient::new(base_url, &session.access_token)?;
    let mut cache = HabitCache::for_user(&session.user.id);
    cache.refresh(&api)?;
    Ok(Dashboard { api, cache })
}

fn print_habit(habit: &Habit, format: Format, styler: &Styler) -> Result<(), AppError> {
    if format == Format::Json {
        #[derive(serde::Serialize)]
        struct Out<'a> {
            habit: &'a Habit,
        }
        print_json(&Out { habit })
    } else {
        print_line(&render_habit_card(habit, styler));
        Ok(())
    }
}

/// Per-invocation context shared by every command arm.
struct Ctx {
    api_url: Option<String>,
    session: Option<String>,
    format: Format,
    styler: Styler,
}

fn run(cli: Cli) -> Result<(), AppError> {
    let ctx = Ctx {
        api_url: cli.api_url,
        session: cli.session,
        format: cli.format,
        styler: Styler::new(resolve_color_enabled(cli.no_color)),
    };

    match cli.command {
        Command::Login(args) => {
            let base_url = resolve_api_base_url(ctx.api_url.as_deref())?;
            let mut store = open_session_store(ctx.session.as_deref())?;

            let password = match args.password {
                Some(p) => p,
                None => std::env::var("HABITDASH_PASSWORD").map_err(|_| {
                    AppError::usage("Password is required (--password or HABITDASH_PASSWORD)")
                })?,
            };

            let auth = AuthClient::new(&base_url)?;
            let session = auth.sign_in_with_password(&args.email, &password)?;
            let user = session.user.clone();
            store.save(session)?;

            if ctx.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    user: crate::auth::User,
                }
                print_json(&Out { user })?;
            } else {
                print_line(&format!("Signed in as {}", user.email));
            }
            Ok(())
        }

        Command::Logout => {
            let mut store = open_session_store(ctx.session.as_deref())?;
            if let Some(session) = store.current().cloned() {
                // Revoke remotely when we can reach the collaborator.
                if let Ok(base_url) = resolve_api_base_url(ctx.api_url.as_deref()) {
                    let auth = AuthClient::new(&base_url)?;
                    if let Err(e) = auth.sign_out(&session) {
                        debug!(error = %e, "server-side sign-out skipped");
                    }
                }
            }
            store.clear()?;
            print_line("Signed out");
            Ok(())
        }

        Command::Whoami => {
            let store = open_session_store(ctx.session.as_deref())?;
            let user = store
                .current_user()
                .ok_or_else(|| AppError::auth("Not signed in. Run `habitdash login` first."))?;

            if ctx.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out<'a> {
                    user: &'a crate::auth::User,
                }
                print_json(&Out { user })?;
            } else {
                print_line(&format!("{} ({})", user.email, user.id));
            }
            Ok(())
        }

        Command::List(args) => {
            let base_url = resolve_api_base_url(ctx.api_url.as_deref())?;
            let store = open_session_store(ctx.session.as_deref())?;
            let dash = open_dashboard(&store, &base_url)?;

            let habits = dash.cache.list(args.all);
            if ctx.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out<'a> {
                    habits: Vec<&'a Habit>,
                }
                print_json(&Out { habits })?;
            } else {
                let rows: Vec<Vec<String>> = habits.iter().map(|h| habit_row(h)).collect();
                print_line(&render_simple_table(
                    &["id", "name", "schedule", "target", "archived"],
                    &rows,
                ));
            }
            Ok(())
        }

        Command::Add(args) => {
            let base_url = resolve_api_base_url(ctx.api_url.as_deref())?;
            let store = open_session_store(ctx.session.as_deref())?;
            let mut dash = open_dashboard(&store, &base_url)?;

            let unit = args
                .unit
                .to_unit()?
                .ok_or_else(|| AppError::usage("A unit is required (--unit or --custom-unit)"))?;
            let end_date = args.end_date.as_deref().map(parse_end_date).transpose()?;

            let draft = HabitDraft {
                name: args.name,
                unit,
                target_value: args.target,
                schedule: args.schedule.to_schedule()?,
                notes: args.notes,
                color: args.color,
                end_date,
                tags: if args.tags.is_empty() { None } else { Some(args.tags) },
            };

            let create = build_habit_create(dash.cache.user_id(), &draft)?;
            let habit = dash.api.create_habit(&create)?;
            dash.cache.apply_saved(habit.clone());
            print_habit(&habit, ctx.format, &ctx.styler)
        }

        Command::Show(args) => {
            let base_url = resolve_api_base_url(ctx.api_url.as_deref())?;
            let store = open_session_store(ctx.session.as_deref())?;
            let dash = open_dashboard(&store, &base_url)?;

            let habit = dash.cache.select(&args.habit, true)?;
            print_habit(habit, ctx.format, &ctx.styler)
        }

        Command::Edit(args) => {
            let base_url = resolve_api_base_url(ctx.api_url.as_deref())?;
            let store = open_session_store(ctx.session.as_deref())?;
            let mut dash = open_dashboard(&store, &base_url)?;

            let target = dash.cache.select(&args.habit, true)?.clone();
            let update = build_habit_update(&args, &target)?;
            if update.is_empty() {
                return Err(AppError::usage("Nothing to change"));
            }

            let habit = dash.api.update_habit(&target.id, &update)?;
            dash.cache.apply_saved(habit.clone());
            print_habit(&habit, ctx.format, &ctx.styler)
        }

        Command::Archive(args) => set_archived(&ctx, &args.habit, true),
        Command::Unarchive(args) => set_archived(&ctx, &args.habit, false),

        Command::Delete(args) => {
            let base_url = resolve_api_base_url(ctx.api_url.as_deref())?;
            let store = open_session_store(ctx.session.as_deref())?;
            let mut dash = open_dashboard(&store, &base_url)?;

            let habit = dash.cache.select(&args.habit, true)?;
            let id = habit.id.clone();
            let name = habit.name.clone();
            dash.api.delete_habit(&id)?;
            dash.cache.apply_deleted(&id);

            if ctx.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    deleted: String,
                }
                print_json(&Out { deleted: id })?;
            } else {
                print_line(&format!("Deleted {}", name));
            }
            Ok(())
        }

        Command::Units => {
            if ctx.format == Format::Json {
                #[derive(serde::Serialize)]
                struct Out {
                    units: &'static [crate::units::UnitDefinition],
                }
                print_json(&Out { units: DEFAULT_UNITS })?;
            } else {
                let rows: Vec<Vec<String>> = DEFAULT_UNITS
                    .iter()
                    .map(|u| {
                        vec![
                            u.key.to_string(),
                            u.label.to_string(),
                            u.category.as_str().to_string(),
                            u.abbreviation.unwrap_or("").to_string(),
                            if u.allows_decimal { "yes" } else { "no" }.to_string(),
                        ]
                    })
                    .collect();
                print_line(&render_simple_table(
                    &["key", "label", "category", "abbrev", "decimal"],
                    &rows,
                ));
            }
            Ok(())
        }
    }
}

/// Builds the sparse update from the flags that were actually given. The
/// validator runs on the fields being changed; untouched fields are never
/// serialized, so the collaborator leaves them alone.
fn build_habit_update(args: &EditArgs, current: &Habit) -> Result<HabitUpdate, AppError> {
    let mut errors = crate::error::ValidationError::new();
    let mut update = HabitUpdate::default();

    if let Some(name) = args.name.as_deref() {
        let name = name.trim();
        if name.is_empty() {
            errors.push("name", "Name is required");
        } else {
            update.name = Some(name.to_string());
        }
    }

    let new_unit = args.unit.to_unit()?;
    let effective_unit = new_unit.as_ref().unwrap_or(&current.unit);

    if let Some(raw) = args.target.as_deref() {
        match raw.trim().parse::<f64>() {
            Ok(v) if v.is_finite() && v >= 1.0 => {
                if v.fract() != 0.0 && !crate::units::unit_allows_decimal(effective_unit) {
                    errors.push("targetValue", "This unit takes whole numbers");
                } else {
                    update.target_value = Some(v);
                }
            }
            Ok(_) => errors.push("targetValue", "Target value must be at least 1"),
            Err(_) => errors.push("targetValue", "Enter a number"),
        }
    }

    if let Some(unit) = new_unit {
        if unit.unit_key.trim().is_empty() {
            errors.push("unit.unitKey", "Please select a unit of measure");
        } else if !unit.is_custom && crate::units::find_unit(&unit.unit_key).is_none() {
            errors.push("unit.unitKey", format!("Unknown unit: {}", unit.unit_key));
        } else {
            update.unit = Some(unit);
        }
    }

    if !args.schedule.is_empty() {
        let schedule = args.schedule.to_schedule()?;
        validate_schedule(&schedule, &mut errors);
        if errors.is_empty() {
            update.schedule = Some(schedule);
        }
    }

    if let Some(notes) = args.notes.clone() {
        update.notes = Some(notes);
    }
    if let Some(color) = args.color.clone() {
        update.color = Some(color);
    }

    if args.clear_end_date && args.end_date.is_some() {
        return Err(AppError::usage(
            "--end-date and --clear-end-date are mutually exclusive",
        ));
    }
    if args.clear_end_date {
        update.end_date = Some(None);
    } else if let Some(raw) = args.end_date.as_deref() {
        update.end_date = Some(Some(parse_end_date(raw)?));
    }

    if let Some(active) = args.active {
        update.is_active = Some(active);
    }
    if !args.tags.is_empty() {
        update.tags = Some(args.tags.clone());
    }

    errors.into_result()?;
    Ok(update)
}

fn set_archived(ctx: &Ctx, selector: &str, archived: bool) -> Result<(), AppError> {
    let base_url = resolve_api_base_url(ctx.api_url.as_deref())?;
    let store = open_session_store(ctx.session.as_deref())?;
    let mut dash = open_dashboard(&store, &base_url)?;

    let target = dash.cache.select(selector, true)?.clone();
    let update = HabitUpdate {
        is_archived: Some(archived),
        ..Default::default()
    };
    let habit = dash.api.update_habit(&target.id, &update)?;
    dash.cache.apply_saved(habit.clone());
    print_habit(&habit, ctx.format, &ctx.styler)
}
