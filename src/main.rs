use crossterm::{
    event::{Event, EventStream, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures::StreamExt;
use log::{debug, error, info, warn, LevelFilter};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout, Write};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::time::MissedTickBehavior;
use vocab_drill::config::{AppConfig, ServiceBackend};
use vocab_drill::models::ServiceResponse;
use vocab_drill::{
    draw_exercise, draw_menu, handle_exercise_input, handle_menu_input, logger,
    spawn_service_worker, AppState, ExerciseAction, ExerciseSession, ExerciseView,
    HttpWordService, LocalWordService, MenuAction, MenuState, Speaker, WordService,
};

/// Rings the terminal bell in place of speech output.
#[derive(Debug)]
struct TerminalBell;

impl Speaker for TerminalBell {
    fn speak(&self, word: &str) {
        debug!("speak {:?}", word);
        let mut out = io::stdout();
        let _ = out.write_all(b"\x07");
        let _ = out.flush();
    }
}

/// Leaves raw mode and the alternate screen when dropped, so every exit path
/// hands the terminal back intact.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        let guard = TerminalGuard;
        execute!(io::stdout(), EnterAlternateScreen)?;
        Ok(guard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen, crossterm::cursor::Show);
    }
}

fn build_service(config: &AppConfig) -> Result<(Arc<dyn WordService>, String), Box<dyn std::error::Error>> {
    match &config.backend {
        ServiceBackend::Http { base_url } => {
            let service = HttpWordService::new(base_url.clone(), config.request_timeout)?;
            info!("using word service at {}", base_url);
            Ok((Arc::new(service), format!("service: {}", base_url)))
        }
        ServiceBackend::Local { words_file } => {
            let service = LocalWordService::from_csv(words_file).map_err(|e| {
                format!("could not read word list {}: {}", words_file.display(), e)
            })?;
            info!(
                "using offline word list {} ({} words)",
                words_file.display(),
                service.word_count()
            );
            let label = format!(
                "offline: {} ({} words)",
                words_file.display(),
                service.word_count()
            );
            Ok((Arc::new(service), label))
        }
    }
}

/// The open exercise screen with its own request worker. Dropping it closes
/// the request channel, which stops the worker, and any late completion is
/// discarded with the response receiver.
struct ActiveExercise {
    view: ExerciseView,
    responses: UnboundedReceiver<ServiceResponse>,
}

impl ActiveExercise {
    fn open(
        mode: vocab_drill::Mode,
        level: Option<&str>,
        config: &AppConfig,
        service: &Arc<dyn WordService>,
        speaker: &Arc<dyn Speaker>,
    ) -> Self {
        let (request_tx, request_rx) = mpsc::unbounded_channel();
        let (response_tx, responses) = mpsc::unbounded_channel();
        spawn_service_worker(Arc::clone(service), request_rx, response_tx);

        // Only recognition draws words by level.
        let level = level.filter(|_| mode == vocab_drill::Mode::Recognition);
        let session = ExerciseSession::new(mode, &config.session, request_tx)
            .with_level(level.map(str::to_string))
            .with_speaker(Arc::clone(speaker));
        let mut view = ExerciseView::new(session);
        view.start();
        info!("opened {:?} exercise (level {:?})", mode, level);
        Self { view, responses }
    }
}

async fn next_response(active: &mut Option<ActiveExercise>) -> Option<ServiceResponse> {
    match active {
        Some(active) => active.responses.recv().await,
        None => std::future::pending().await,
    }
}

async fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    config: &AppConfig,
    service: Arc<dyn WordService>,
    source_label: &str,
) -> io::Result<()> {
    let speaker: Arc<dyn Speaker> = Arc::new(TerminalBell);
    let mut app_state = AppState::Menu;
    let levels = service.levels().await.unwrap_or_else(|e| {
        warn!("could not load word levels: {}", e);
        Vec::new()
    });
    let mut menu = MenuState::with_levels(levels);
    let mut active: Option<ActiveExercise> = None;

    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(Duration::from_secs(1));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately.
    ticker.tick().await;

    loop {
        terminal.draw(|f| match (app_state, active.as_ref()) {
            (AppState::Exercise, Some(active)) => draw_exercise(f, &active.view),
            _ => draw_menu(f, &menu, source_label),
        })?;

        tokio::select! {
            event = events.next() => {
                let Some(event) = event else { break };
                let Event::Key(key) = event? else { continue };
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                match app_state {
                    AppState::Menu => match handle_menu_input(&mut menu, key) {
                        MenuAction::Start(mode) => {
                            active = Some(ActiveExercise::open(
                                mode,
                                menu.selected_level(),
                                config,
                                &service,
                                &speaker,
                            ));
                            app_state = AppState::Exercise;
                        }
                        MenuAction::ResetRecent => {
                            menu.notice = Some(match service.reset_recent_words().await {
                                Ok(()) => "Recent words cleared".to_string(),
                                Err(e) => {
                                    warn!("resetting recent words failed: {}", e);
                                    format!("Reset failed: {}", e)
                                }
                            });
                        }
                        MenuAction::Quit => break,
                        MenuAction::Continue => {}
                    },
                    AppState::Exercise => {
                        let action = match active.as_mut() {
                            Some(active) => handle_exercise_input(&mut active.view, key),
                            None => ExerciseAction::BackToMenu,
                        };
                        match action {
                            ExerciseAction::BackToMenu => {
                                active = None;
                                app_state = AppState::Menu;
                            }
                            ExerciseAction::Quit => break,
                            ExerciseAction::Continue => {}
                        }
                    }
                }
            }
            Some(response) = next_response(&mut active) => {
                if let Some(active) = active.as_mut()
                    && active.view.apply_response(response)
                {
                    // A fresh prompt gets whole seconds on its countdown.
                    ticker.reset();
                }
            }
            _ = ticker.tick() => {
                if let Some(active) = active.as_mut() {
                    active.view.tick();
                }
            }
        }
    }

    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let config = AppConfig::from_env()?;
    logger::init(&config.log_file, LevelFilter::Debug)?;
    info!("vocab-drill {} starting", env!("CARGO_PKG_VERSION"));

    let (service, source_label) = build_service(&config)?;

    let guard = TerminalGuard::enter()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    let result = run(&mut terminal, &config, service, &source_label).await;
    drop(terminal);
    drop(guard);

    if let Err(ref e) = result {
        error!("terminal loop failed: {}", e);
    }
    info!("vocab-drill exiting");
    result.map_err(Into::into)
}
