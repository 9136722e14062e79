#![forbid(unsafe_code)]

//! Terminal host: two regions, two animators, one driver.

use std::fs::File;
use std::path::Path;
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use diagonal_core::{Corpus, DocumentSource, Frame};
use diagonal_render::{
    CharBudget, CodeLayout, ProseLayout, Reconciler, Region, TerminalSink, TerminalSurface,
    VisibleSet, paint_static,
};
use diagonal_runtime::{AnimatorOptions, DiagonalConfig, Driver, StopHandle, animator};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::embedded;
use crate::error::{DemoError, Result};

const INPUT_POLL: Duration = Duration::from_millis(100);

type Sink = TerminalSink<std::io::Stdout>;

/// Per-panel pieces resolved at startup.
struct Panel {
    name: &'static str,
    sink: Sink,
    corpus: Corpus,
    options: AnimatorOptions,
}

pub fn run(cli: Cli) -> Result<()> {
    let config = cli.config()?;
    init_logging(cli.log_file.as_deref(), &cli.log_level)?;

    let (cols, rows) = crossterm::terminal::size()?;
    let (code_region, writing_region) = Region::new(0, 0, cols, rows).split_columns();
    tracing::info!(cols, rows, static_mode = cli.static_mode, "starting");

    let surface = TerminalSurface::enter([("code", code_region), ("writing", writing_region)])?;
    let code = Panel {
        name: "code",
        sink: surface.container("code")?,
        corpus: embedded::code_corpus(config.seed),
        options: fit(config.code.animator_options(), code_region),
    };
    let writing = Panel {
        name: "writing",
        sink: surface.container("writing")?,
        corpus: embedded::writing_corpus(config.seed),
        options: fit(config.writing.animator_options(), writing_region),
    };
    let code_layout = config.code.code_layout();
    let prose_layout = config
        .writing
        .prose_layout(f32::from(writing_region.height.saturating_sub(1)));

    let stop = StopHandle::new();
    let keys = spawn_key_listener(stop.clone());
    let timer = cli
        .duration_secs
        .map(|secs| spawn_timer(stop.clone(), Duration::from_secs(secs)));

    let result = if cli.static_mode {
        paint(&config, code, writing, code_layout, prose_layout, &stop)
    } else {
        animate(code, writing, code_layout, prose_layout, &stop)
    };

    stop.stop();
    for handle in std::iter::once(keys).chain(timer) {
        if handle.join().is_err() {
            tracing::warn!("helper thread panicked");
        }
    }
    drop(surface);
    tracing::info!(ok = result.is_ok(), "finished");
    result
}

/// Never ask for more rows than the region shows.
fn fit(options: AnimatorOptions, region: Region) -> AnimatorOptions {
    AnimatorOptions {
        rows: options.rows.min(usize::from(region.height)).max(1),
        ..options
    }
}

fn animate(
    code: Panel,
    writing: Panel,
    code_layout: CodeLayout,
    prose_layout: ProseLayout,
    stop: &StopHandle,
) -> Result<()> {
    let code = animator(
        code.name,
        code.corpus,
        code.sink,
        Reconciler::new(code_layout),
        code.options,
    )?;
    let writing = animator(
        writing.name,
        writing.corpus,
        writing.sink,
        Reconciler::new(prose_layout),
        writing.options,
    )?;

    let mut driver = Driver::new().with_schedule(code).with_schedule(writing);
    driver.run(&stop.token())?;
    Ok(())
}

/// One truncated frame per panel, held until a stop.
fn paint(
    config: &DiagonalConfig,
    mut code: Panel,
    mut writing: Panel,
    code_layout: CodeLayout,
    prose_layout: ProseLayout,
    stop: &StopHandle,
) -> Result<()> {
    let document = code.corpus.pick_document()?;
    tracing::debug!(document = document.name(), "painting code panel");
    paint_static(
        &mut code.sink,
        code_layout,
        CharBudget::from(config.budget),
        document.lines(),
        code.options.rows,
    )?;

    let document = writing.corpus.pick_document()?;
    tracing::debug!(document = document.name(), "painting writing panel");
    let frame: Frame = document
        .lines()
        .iter()
        .take(writing.options.rows)
        .cloned()
        .collect();
    Reconciler::new(prose_layout).reconcile(&mut writing.sink, &mut VisibleSet::new(), &frame)?;

    let token = stop.token();
    while !token.wait_timeout(INPUT_POLL) {}
    token.acknowledge();
    Ok(())
}

fn init_logging(path: Option<&Path>, level: &str) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };
    let file = File::create(path)?;
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .map_err(|err| DemoError::Logging(err.to_string()))?;
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|err| DemoError::Logging(err.to_string()))
}

fn is_quit(key: &KeyEvent) -> bool {
    if key.kind != KeyEventKind::Press {
        return false;
    }
    match key.code {
        KeyCode::Char('q') | KeyCode::Esc => true,
        KeyCode::Char('c') => key.modifiers.contains(KeyModifiers::CONTROL),
        _ => false,
    }
}

fn spawn_key_listener(stop: StopHandle) -> JoinHandle<()> {
    thread::spawn(move || {
        while !stop.is_stopped() {
            match event::poll(INPUT_POLL) {
                Ok(false) => {}
                Ok(true) => match event::read() {
                    Ok(Event::Key(key)) if is_quit(&key) => {
                        tracing::info!(code = ?key.code, "quit requested");
                        stop.stop();
                    }
                    Ok(_) => {}
                    Err(err) => {
                        tracing::warn!(%err, "input read failed");
                        stop.stop();
                    }
                },
                Err(err) => {
                    tracing::warn!(%err, "input poll failed");
                    stop.stop();
                }
            }
        }
    })
}

fn spawn_timer(stop: StopHandle, after: Duration) -> JoinHandle<()> {
    thread::spawn(move || {
        if !stop.token().wait_timeout(after) {
            tracing::info!(secs = after.as_secs(), "duration elapsed");
            stop.stop();
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn quit_keys() {
        assert!(is_quit(&key(KeyCode::Char('q'), KeyModifiers::NONE)));
        assert!(is_quit(&key(KeyCode::Esc, KeyModifiers::NONE)));
        assert!(is_quit(&key(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!is_quit(&key(KeyCode::Char('c'), KeyModifiers::NONE)));
        assert!(!is_quit(&key(KeyCode::Char('x'), KeyModifiers::NONE)));
    }

    #[test]
    fn key_releases_are_ignored() {
        let mut release = key(KeyCode::Char('q'), KeyModifiers::NONE);
        release.kind = KeyEventKind::Release;
        assert!(!is_quit(&release));
    }

    #[test]
    fn rows_are_clamped_to_the_region() {
        let options = AnimatorOptions::new(30, Duration::from_millis(350));
        assert_eq!(fit(options, Region::new(0, 0, 40, 24)).rows, 24);
        assert_eq!(fit(options, Region::new(0, 0, 40, 0)).rows, 1);
        assert_eq!(fit(options, Region::new(0, 0, 40, 80)).rows, 30);
    }

    #[test]
    fn timer_stops_after_the_duration() {
        let stop = StopHandle::new();
        spawn_timer(stop.clone(), Duration::from_millis(5)).join().unwrap();
        assert!(stop.is_stopped());
    }

    #[test]
    fn timer_exits_early_when_stopped() {
        let stop = StopHandle::new();
        let timer = spawn_timer(stop.clone(), Duration::from_secs(30));
        stop.stop();
        timer.join().unwrap();
    }
}
