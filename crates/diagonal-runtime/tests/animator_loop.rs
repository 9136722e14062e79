//! End-to-end tests: corpus, window, reconciler, and driver against the
//! headless sink.

use std::time::Duration;

use diagonal_core::{Corpus, Document, DocumentSource, Line, Selection};
use diagonal_render::{CodeLayout, HeadlessSurface, ProseLayout, Reconciler, SinkOp};
use diagonal_runtime::{
    AnimatorOptions, Cadence, Driver, ManualClock, ScheduleError, StopHandle, animator,
};

fn lines(prefix: &str, n: usize) -> Document {
    Document::new(prefix, (0..n).map(|i| Line::new(format!("{prefix}{i}"), 0)))
}

fn sequential(docs: impl IntoIterator<Item = Document>) -> Corpus {
    Corpus::with_seed(3)
        .selection(Selection::Sequential)
        .with_source("docs", docs)
}

fn texts(surface: &HeadlessSurface, name: &str) -> Vec<String> {
    surface.live(name).into_iter().map(|g| g.text).collect()
}

/// Source that always hands out the same document.
struct Repeat(Document);

impl DocumentSource for Repeat {
    fn pick_document(&mut self) -> Result<Document, diagonal_core::CorpusError> {
        Ok(self.0.clone())
    }
}

// ── 1. Emit before advance ─────────────────────────────────────────────────

#[test]
fn first_advance_shows_the_document_head() {
    let surface = HeadlessSurface::new(["code"]);
    let mut schedule = animator(
        "code",
        sequential([lines("L", 5)]),
        surface.container("code").unwrap(),
        Reconciler::new(CodeLayout::default()),
        AnimatorOptions::new(3, Duration::from_millis(10)).with_cadence(Cadence::Combined),
    )
    .unwrap();

    schedule.tick().unwrap();
    assert_eq!(texts(&surface, "code"), vec!["L0", "L1", "L2"]);

    let window = &schedule.payload().unwrap().window;
    assert_eq!(window.cursor(), 4);
    assert_eq!(window.top(), 1);
}

// ── 2. Reload with a shorter document ──────────────────────────────────────

#[test]
fn short_reload_pads_and_shrinks_the_frame() {
    let surface = HeadlessSurface::new(["code"]);
    let mut schedule = animator(
        "code",
        sequential([lines("L", 5), lines("M", 2)]),
        surface.container("code").unwrap(),
        Reconciler::new(CodeLayout::default()),
        AnimatorOptions::new(3, Duration::from_millis(10)).with_cadence(Cadence::Combined),
    )
    .unwrap();

    // Cursor 3 -> 4 -> 5; the second tick's check reloads "M".
    schedule.tick().unwrap();
    schedule.tick().unwrap();
    assert_eq!(texts(&surface, "code"), vec!["L1", "L2", "L3"]);

    let window = &schedule.payload().unwrap().window;
    assert_eq!(window.document().name(), "M");
    assert_eq!(window.cursor(), 2);
    assert_eq!(window.len(), 3);
    assert_eq!(window.occupied(), 2);

    schedule.tick().unwrap();
    assert_eq!(texts(&surface, "code"), vec!["M0", "M1"]);
    assert_eq!(surface.collisions("code"), 0);
}

// ── 3. Identical rows are recreated ────────────────────────────────────────

#[test]
fn identical_frames_get_fresh_glyphs_every_tick() {
    let same = Document::new("same", (0..6).map(|_| Line::new("loop {}", 1)));
    let surface = HeadlessSurface::new(["code"]);
    let mut schedule = animator(
        "code",
        Repeat(same),
        surface.container("code").unwrap(),
        Reconciler::new(CodeLayout::default()),
        AnimatorOptions::new(2, Duration::from_millis(10)).with_cadence(Cadence::Combined),
    )
    .unwrap();

    schedule.tick().unwrap();
    surface.take_ops("code");
    schedule.tick().unwrap();

    let ops = surface.take_ops("code");
    let creates = ops.iter().filter(|op| matches!(op, SinkOp::Create(_))).count();
    let destroys = ops.iter().filter(|op| matches!(op, SinkOp::Destroy(_))).count();
    assert_eq!((creates, destroys), (2, 2));
    assert_eq!(texts(&surface, "code"), vec!["loop {}", "loop {}"]);
}

// ── 4. Reload cycle ────────────────────────────────────────────────────────

#[test]
fn documents_cycle_forever() {
    let surface = HeadlessSurface::new(["code"]);
    let mut schedule = animator(
        "code",
        sequential([lines("a", 4), lines("b", 4)]),
        surface.container("code").unwrap(),
        Reconciler::new(CodeLayout::default()),
        AnimatorOptions::new(2, Duration::from_millis(10)),
    )
    .unwrap();

    let mut seen = Vec::new();
    for _ in 0..40 {
        schedule.tick().unwrap();
        let name = schedule.payload().unwrap().window.document().name().to_string();
        if seen.last() != Some(&name) {
            seen.push(name);
        }
        assert!(surface.live("code").len() <= 2);
    }
    assert!(seen.len() >= 4);
    assert_eq!(&seen[..4], ["a", "b", "a", "b"]);
}

// ── 5. Driver with both viewports ──────────────────────────────────────────

#[test]
fn driver_runs_both_viewports_independently() {
    let surface = HeadlessSurface::new(["code", "writing"]);
    let clock = ManualClock::new();

    let code = animator(
        "code",
        sequential([lines("c", 50)]),
        surface.container("code").unwrap(),
        Reconciler::new(CodeLayout::default()),
        AnimatorOptions::new(4, Duration::from_millis(100)).with_cadence(Cadence::Combined),
    )
    .unwrap();
    let writing = animator(
        "writing",
        sequential([lines("w", 50)]),
        surface.container("writing").unwrap(),
        Reconciler::new(ProseLayout::anchored(10.0)),
        AnimatorOptions::new(3, Duration::from_millis(300)).with_cadence(Cadence::Combined),
    )
    .unwrap();

    let mut driver = Driver::with_clock(clock.clone())
        .with_schedule(code)
        .with_schedule(writing);

    for _ in 0..6 {
        clock.advance(Duration::from_millis(100));
        driver.poll().unwrap();
    }

    assert_eq!(driver.ticks("code"), Some(6));
    assert_eq!(driver.ticks("writing"), Some(2));
    assert_eq!(texts(&surface, "code"), vec!["c5", "c6", "c7", "c8"]);
    // Prose grows upward, so the newest line sits on top.
    assert_eq!(texts(&surface, "writing"), vec!["w3", "w2", "w1"]);
}

#[test]
fn stopped_driver_leaves_the_screen_untouched() {
    let surface = HeadlessSurface::new(["code"]);
    let code = animator(
        "code",
        sequential([lines("c", 5)]),
        surface.container("code").unwrap(),
        Reconciler::new(CodeLayout::default()),
        AnimatorOptions::new(3, Duration::from_millis(5)),
    )
    .unwrap();
    let mut driver = Driver::new().with_schedule(code);

    let handle = StopHandle::new();
    handle.stop();
    driver.run(&handle.token()).unwrap();

    assert!(handle.is_acknowledged());
    assert!(surface.ops("code").is_empty());
}

#[test]
fn stopping_from_another_thread_halts_rendering() {
    let surface = HeadlessSurface::new(["code"]);
    let code = animator(
        "code",
        sequential([lines("c", 8)]),
        surface.container("code").unwrap(),
        Reconciler::new(CodeLayout::default()),
        AnimatorOptions::new(3, Duration::from_millis(2)),
    )
    .unwrap();
    let mut driver = Driver::new().with_schedule(code);

    let handle = StopHandle::new();
    let stopper = {
        let handle = handle.clone();
        std::thread::spawn(move || {
            std::thread::sleep(Duration::from_millis(40));
            handle.stop();
        })
    };
    driver.run(&handle.token()).unwrap();
    stopper.join().unwrap();

    assert!(handle.is_acknowledged());
    surface.take_ops("code");
    std::thread::sleep(Duration::from_millis(20));
    assert!(surface.take_ops("code").is_empty());
}

#[test]
fn render_failure_stops_the_driver() {
    let surface = HeadlessSurface::new(["code"]);
    let code = animator(
        "code",
        sequential([lines("c", 8)]),
        surface.container("code").unwrap(),
        Reconciler::new(CodeLayout::default()),
        AnimatorOptions::new(3, Duration::from_millis(1)),
    )
    .unwrap();
    surface.close("code");
    let mut driver = Driver::new().with_schedule(code);

    let handle = StopHandle::new();
    let err = driver.run(&handle.token()).unwrap_err();
    assert!(matches!(err, ScheduleError::Operation { index: 0, .. }));
    assert_eq!(err.schedule(), "code");
    assert!(handle.is_acknowledged());
}
