//! Poketeam - browse the Kanto dex and build a team of six.
//!
//! Logs go to a file so they never collide with the terminal UI.

use std::cell::RefCell;
use std::io;
use std::path::PathBuf;
use std::rc::Rc;
use std::sync::OnceLock;
use std::time::Duration;

use clap::Parser;
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};
use tui_dispatch::{
    EffectContext, EffectStoreLike, EffectStoreWithMiddleware, EventBus, Keybindings, TaskKey,
};
use tui_dispatch_debug::debug::DebugLayer;
use tui_dispatch_debug::{
    DebugCliArgs, DebugRunOutput, DebugSession, DebugSessionError, ReplayItem,
};

use poketeam::action::Action;
use poketeam::api::PokeApi;
use poketeam::config::{Settings, CATALOG_LIMIT, DEFAULT_API_BASE};
use poketeam::effect::Effect;
use poketeam::persist::{Session, SessionStore};
use poketeam::reducer::reducer;
use poketeam::state::AppState;
use poketeam::ui::{self, PokeComponentId, PokeContext, PokeUi};

#[derive(Parser, Debug)]
#[command(name = "poketeam")]
#[command(about = "Kanto dex browser with a six-slot team")]
struct Args {
    /// PokeAPI base URL
    #[arg(long, default_value = DEFAULT_API_BASE)]
    api_base: String,

    /// Number of dex entries to fetch
    #[arg(long, default_value_t = CATALOG_LIMIT)]
    limit: usize,

    /// Directory for the saved session, HTTP cache and log
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Log file path (defaults to poketeam.log in the data dir)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Always fetch the dex listing from the network
    #[arg(long)]
    no_http_cache: bool,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    #[command(flatten)]
    debug: DebugCliArgs,
}

impl Args {
    fn settings(&self) -> Settings {
        let defaults = Settings::default();
        Settings {
            api_base: self.api_base.clone(),
            catalog_limit: self.limit,
            data_dir: self.data_dir.clone().unwrap_or(defaults.data_dir),
            log_file: self.log_file.clone(),
            http_cache: !self.no_http_cache,
        }
    }
}

/// What effect tasks need outside the store.
struct Runtime {
    api: PokeApi,
    sessions: SessionStore,
    catalog_limit: usize,
}

impl Runtime {
    fn from_settings(settings: &Settings) -> Self {
        Self {
            api: PokeApi::from_settings(settings),
            sessions: SessionStore::new(settings.session_path()),
            catalog_limit: settings.catalog_limit,
        }
    }
}

static RUNTIME: OnceLock<Runtime> = OnceLock::new();

fn runtime() -> &'static Runtime {
    RUNTIME.get_or_init(|| Runtime::from_settings(&Settings::default()))
}

/// File-only tracing. Hold the guard until exit so buffered lines flush.
fn setup_tracing(settings: &Settings, verbose: u8) -> io::Result<WorkerGuard> {
    let log_level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("poketeam={log_level}")));

    let log_path = settings.log_path();
    let log_dir = log_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| settings.data_dir.clone());
    std::fs::create_dir_all(&log_dir)?;
    let log_filename = log_path
        .file_name()
        .unwrap_or(std::ffi::OsStr::new("poketeam.log"));

    let file_appender = tracing_appender::rolling::never(&log_dir, log_filename);
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false)
                .with_target(true),
        )
        .init();

    Ok(guard)
}

async fn load_initial_state() -> io::Result<AppState> {
    let sessions = &runtime().sessions;
    match sessions.load().await {
        Ok(Some(session)) => {
            tracing::info!(path = %sessions.path().display(), "restored session");
            Ok(session.into_state())
        }
        Ok(None) => Ok(AppState::default()),
        Err(error) => {
            tracing::warn!(%error, "ignoring unreadable session");
            Ok(AppState::default())
        }
    }
}

#[tokio::main]
async fn main() -> io::Result<()> {
    let args = Args::parse();
    let settings = args.settings();
    let _guard = setup_tracing(&settings, args.verbose)?;
    tracing::info!(api = %settings.api_base, data_dir = %settings.data_dir.display(), "starting");

    RUNTIME.get_or_init(|| Runtime::from_settings(&settings));

    let debug = DebugSession::new(args.debug);
    let state = debug
        .load_state_or_else_async(load_initial_state)
        .await
        .map_err(debug_error)?;
    let replay_actions = debug.load_replay_items().map_err(debug_error)?;
    let (middleware, recorder) = debug.middleware_with_recorder();
    let store = EffectStoreWithMiddleware::new(state, reducer, middleware);

    let use_alt_screen = debug.use_alt_screen();
    let mut stdout = io::stdout();
    if use_alt_screen {
        enable_raw_mode()?;
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    }
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &debug, store, replay_actions).await;

    if use_alt_screen {
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;
    }

    let run_output = result?;
    run_output.write_render_output()?;
    debug.save_actions(recorder.as_ref()).map_err(debug_error)?;
    tracing::info!("exiting");
    Ok(())
}

fn debug_error(error: DebugSessionError) -> io::Error {
    io::Error::other(format!("debug session error: {error}"))
}

async fn run_app<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    debug: &DebugSession,
    store: impl EffectStoreLike<AppState, Action, Effect>,
    replay_actions: Vec<ReplayItem<Action>>,
) -> io::Result<DebugRunOutput<AppState>> {
    let ui = Rc::new(RefCell::new(PokeUi::new()));
    let mut bus: EventBus<AppState, Action, PokeComponentId, PokeContext> = EventBus::new();
    let keybindings: Keybindings<PokeContext> = Keybindings::new();

    let ui_header = Rc::clone(&ui);
    bus.register(PokeComponentId::Header, move |event, state| {
        ui_header
            .borrow_mut()
            .handle_header_event(&event.kind, state)
    });

    let ui_list = Rc::clone(&ui);
    bus.register(PokeComponentId::DexList, move |event, state| {
        ui_list
            .borrow_mut()
            .handle_list_event(&event.kind, state)
    });

    let ui_team = Rc::clone(&ui);
    bus.register(PokeComponentId::Team, move |event, state| {
        ui_team
            .borrow_mut()
            .handle_team_event(&event.kind, state)
    });

    let ui_search = Rc::clone(&ui);
    bus.register(PokeComponentId::Search, move |event, state| {
        ui_search
            .borrow_mut()
            .handle_search_event(&event.kind, state)
    });

    bus.register_global(|event, state| ui::handle_global_event(&event.kind, state));

    debug
        .run_effect_app_with_bus(
            terminal,
            store,
            DebugLayer::simple(),
            replay_actions,
            Some(Action::Init),
            Some(Action::Quit),
            |_runtime| {},
            &mut bus,
            &keybindings,
            |frame, area, state, render_ctx, event_ctx| {
                ui.borrow_mut()
                    .render(frame, area, state, render_ctx, event_ctx);
            },
            |action| matches!(action, Action::Quit),
            handle_effect,
        )
        .await
}

fn handle_effect(effect: Effect, ctx: &mut EffectContext<Action>) {
    match effect {
        Effect::LoadCatalog => {
            let runtime = runtime();
            ctx.tasks().spawn(TaskKey::new("catalog"), async move {
                match runtime.api.fetch_catalog(runtime.catalog_limit).await {
                    Ok(entries) => Action::CatalogDidLoad(entries),
                    Err(error) => Action::CatalogDidError(error),
                }
            });
        }
        Effect::LoadStats { id } => {
            let key = format!("stats_{id}");
            ctx.tasks().spawn(TaskKey::new(key), async move {
                match runtime().api.fetch_stats(id).await {
                    Ok(stats) => Action::StatsDidLoad { id, stats },
                    Err(error) => Action::StatsDidError {
                        id,
                        error: error.to_string(),
                    },
                }
            });
        }
        Effect::RevealToast { generation } => {
            // A new message restarts the countdown from the next tick.
            ctx.tasks().cancel(&TaskKey::new("toast_dismiss"));
            ctx.tasks().spawn(TaskKey::new("toast_reveal"), async move {
                tokio::task::yield_now().await;
                Action::ToastDidReveal { generation }
            });
        }
        Effect::DismissToastAfter {
            generation,
            after_ms,
        } => {
            ctx.tasks().debounce(
                "toast_dismiss",
                Duration::from_millis(after_ms),
                async move { Action::ToastDidExpire { generation } },
            );
        }
        Effect::SaveSession(session) => {
            // One task per save; the store drops superseded tickets.
            let ticket = runtime().sessions.next_ticket();
            ctx.tasks()
                .spawn(TaskKey::new(format!("session_save_{ticket}")), async move {
                    save(ticket, session).await
                });
        }
    }
}

async fn save(ticket: u64, session: Session) -> Action {
    match runtime().sessions.save(ticket, &session).await {
        Ok(_) => Action::SessionDidSave,
        Err(error) => Action::SessionDidError(error.to_string()),
    }
}
