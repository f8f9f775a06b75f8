mod display;

use std::collections::HashMap;
use std::fs::File;
use std::io::{stdout, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::{mpsc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use crossterm::{
    cursor,
    event::{
        self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers, KeyboardEnhancementFlags,
        PopKeyboardEnhancementFlags, PushKeyboardEnhancementFlags,
    },
    terminal, ExecutableCommand,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

use invaders::compute::{clamp_dt, init_state, restart, tick, toggle_pause, Direction, Input};
use invaders::config::GameConfig;
use invaders::entities::GameState;
use invaders::highscore::HighScoreStore;

#[derive(Parser)]
#[command(name = "invaders")]
#[command(about = "Space Invaders in the terminal")]
struct Args {
    /// TOML file overriding gameplay parameters
    #[arg(long, default_value = "invaders.toml")]
    config: PathBuf,

    /// Seed for a reproducible game; random when omitted
    #[arg(long)]
    seed: Option<u64>,

    /// Where the high score is kept (default: ~/.invaders_score.json)
    #[arg(long)]
    score_file: Option<PathBuf>,

    /// Log output; the terminal itself is the game screen
    #[arg(long, default_value = "invaders.log")]
    log_file: PathBuf,
}

// ── Held-key input model ──────────────────────────────────────────────────────

/// Frames a key counts as down after its last press or repeat. Terminals
/// without release events only send auto-repeats, which arrive well inside
/// this window.
const HOLD_WINDOW: u64 = 8;

fn is_held(key_frame: &HashMap<KeyCode, u64>, key: &KeyCode, frame: u64) -> bool {
    key_frame
        .get(key)
        .map(|&last| frame.saturating_sub(last) <= HOLD_WINDOW)
        .unwrap_or(false)
}

fn any_held(key_frame: &HashMap<KeyCode, u64>, keys: &[KeyCode], frame: u64) -> bool {
    keys.iter().any(|k| is_held(key_frame, k, frame))
}

fn poll_input(key_frame: &HashMap<KeyCode, u64>, frame: u64) -> Input {
    let left = any_held(
        key_frame,
        &[KeyCode::Left, KeyCode::Char('a'), KeyCode::Char('A')],
        frame,
    );
    let right = any_held(
        key_frame,
        &[KeyCode::Right, KeyCode::Char('d'), KeyCode::Char('D')],
        frame,
    );
    let direction = match (left, right) {
        (true, false) => Direction::Left,
        (false, true) => Direction::Right,
        _ => Direction::Idle,
    };
    let fire = any_held(
        key_frame,
        &[KeyCode::Char(' '), KeyCode::Up, KeyCode::Char('w')],
        frame,
    );
    Input { direction, fire }
}

// ── Start screen ──────────────────────────────────────────────────────────────

/// Block until Enter (start) or Q/Esc (quit). Returns `true` to start.
fn start_screen<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    high_score: u32,
) -> std::io::Result<bool> {
    display::render_start_screen(out, high_score)?;
    loop {
        match rx.recv() {
            Ok(Event::Key(KeyEvent {
                code,
                kind: KeyEventKind::Press,
                ..
            })) => match code {
                KeyCode::Enter => return Ok(true),
                KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(false),
                _ => {}
            },
            Ok(Event::Resize(..)) => display::render_start_screen(out, high_score)?,
            Ok(_) => {}
            Err(_) => return Ok(false),
        }
    }
}

// ── Game loop ─────────────────────────────────────────────────────────────────

/// Runs until the player quits. `key_frame` remembers when each key was last
/// seen so movement and fire can be held together.
fn game_loop<W: Write>(
    out: &mut W,
    state: &mut GameState,
    rx: &mpsc::Receiver<Event>,
    rng: &mut StdRng,
    store: &HighScoreStore,
    saved_high_score: &mut u32,
) -> anyhow::Result<()> {
    let frame_period = Duration::from_secs_f64(1.0 / f64::from(state.config.timing.fps));
    let mut key_frame: HashMap<KeyCode, u64> = HashMap::new();
    let mut frame: u64 = 0;
    let mut last_tick = Instant::now();

    loop {
        let frame_start = Instant::now();
        frame += 1;

        // One-shot keys act immediately; held keys feed `poll_input`
        while let Ok(ev) = rx.try_recv() {
            let Event::Key(KeyEvent {
                code,
                kind,
                modifiers,
                ..
            }) = ev
            else {
                continue;
            };
            match kind {
                KeyEventKind::Press => {
                    key_frame.insert(code, frame);
                    match code {
                        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => return Ok(()),
                        KeyCode::Char('c') if modifiers.contains(KeyModifiers::CONTROL) => {
                            return Ok(());
                        }
                        KeyCode::Char('p') | KeyCode::Char('P') => {
                            *state = toggle_pause(state);
                        }
                        KeyCode::Char('r') | KeyCode::Char('R') if state.status.is_over() => {
                            *state = restart(state, rng);
                        }
                        _ => {}
                    }
                }
                KeyEventKind::Repeat => {
                    key_frame.insert(code, frame);
                }
                KeyEventKind::Release => {
                    key_frame.remove(&code);
                }
            }
        }

        let input = poll_input(&key_frame, frame);
        let dt = clamp_dt(
            last_tick.elapsed().as_secs_f32(),
            state.config.timing.max_dt,
        );
        last_tick = Instant::now();

        let was_over = state.status.is_over();
        *state = tick(state, &input, dt, rng);

        if !was_over && state.status.is_over() && state.high_score > *saved_high_score {
            match store.save(state.high_score) {
                Ok(()) => *saved_high_score = state.high_score,
                Err(e) => tracing::warn!(error = %e, "could not save high score"),
            }
        }

        display::render(out, &state.snapshot())?;

        let elapsed = frame_start.elapsed();
        if elapsed < frame_period {
            thread::sleep(frame_period - elapsed);
        }
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn init_logging(path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)
        .with_context(|| format!("cannot open log file {}", path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::filter::EnvFilter::from_default_env())
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_file)?;

    let config = GameConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let store = HighScoreStore::new(
        args.score_file
            .clone()
            .unwrap_or_else(HighScoreStore::default_path),
    );
    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    tracing::info!(seed = ?args.seed, score_file = %store.path().display(), "starting");

    let raw_out = stdout();
    let mut out = BufWriter::new(raw_out);

    terminal::enable_raw_mode()?;
    out.execute(terminal::EnterAlternateScreen)?;
    out.execute(cursor::Hide)?;

    // Release events where the terminal supports them, held-window otherwise
    let keyboard_enhanced = out
        .execute(PushKeyboardEnhancementFlags(
            KeyboardEnhancementFlags::REPORT_EVENT_TYPES,
        ))
        .is_ok();

    // Blocking reads live on their own thread
    let (tx, rx) = mpsc::channel::<Event>();
    thread::spawn(move || {
        while let Ok(ev) = event::read() {
            if tx.send(ev).is_err() {
                break;
            }
        }
    });

    let result = run(&mut out, &rx, config, &store, &mut rng);

    // Restore the terminal even when the game failed
    if keyboard_enhanced {
        let _ = out.execute(PopKeyboardEnhancementFlags);
    }
    let _ = out.execute(cursor::Show);
    let _ = out.execute(terminal::LeaveAlternateScreen);
    let _ = terminal::disable_raw_mode();

    if let Err(e) = &result {
        tracing::error!(error = %e, "exiting with error");
    }
    result
}

fn run<W: Write>(
    out: &mut W,
    rx: &mpsc::Receiver<Event>,
    config: GameConfig,
    store: &HighScoreStore,
    rng: &mut StdRng,
) -> anyhow::Result<()> {
    let mut high_score = store.load();

    if !start_screen(out, rx, high_score)? {
        return Ok(());
    }

    let mut state = init_state(config, high_score, rng);
    game_loop(out, &mut state, rx, rng, store, &mut high_score)?;

    tracing::info!(
        score = state.player.score,
        level = state.level(),
        high_score,
        "quit"
    );
    Ok(())
}
