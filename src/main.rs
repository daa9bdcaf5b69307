use std::env;
use std::fs;
use std::io;
use std::io::Write;
use std::thread;
use std::time;

use anyhow::Context;
use anyhow::bail;
use crossterm::cursor;
use crossterm::event;
use crossterm::event::Event;
use crossterm::event::KeyCode;
use crossterm::event::KeyEvent;
use crossterm::event::KeyModifiers;
use crossterm::execute;
use crossterm::style;
use crossterm::terminal;
use quadlife::BoardOffset;
use quadlife::GameBoard;
use quadlife::coords;
use quadlife::coords::BoardCoordinate;
use tracing::info;
use tracing_subscriber::EnvFilter;

const FRAMERATE: u32 = 10;
const FRAMETIME: time::Duration =
    time::Duration::from_millis(((1f64 / FRAMERATE as f64) * 1_000f64) as u64);

const DEFAULT_GENERATIONS: u64 = 32;
const DEFAULT_DIMENSION: BoardOffset = 32;

// See: https://conwaylife.com/wiki/Rulestring
const LIFE_RULES: &str = "b3s23";

/// Largest square drawn to the terminal. Bigger boards only show their northwest corner.
const VIEW_DIMENSION: BoardOffset = 64;

const USAGE: &str = "usage: quadlife <cells file> [generations] [dimension] [rule]";

struct Args {
    path: String,
    generations: u64,
    dimension: BoardOffset,
    rule: String,
}

fn parse_args() -> anyhow::Result<Args> {
    let mut args = env::args().skip(1);

    let Some(path) = args.next() else {
        bail!(USAGE);
    };

    let generations = match args.next() {
        Some(n) => n.parse().with_context(|| format!("Bad generation count {n:?}"))?,
        None => DEFAULT_GENERATIONS,
    };

    let dimension = match args.next() {
        Some(n) => n.parse().with_context(|| format!("Bad board dimension {n:?}"))?,
        None => DEFAULT_DIMENSION,
    };

    let rule = args.next().unwrap_or_else(|| LIFE_RULES.to_string());

    Ok(Args {
        path,
        generations,
        dimension,
        rule,
    })
}

/// Returns true if the user asked to quit
fn should_exit(event: Event) -> bool {
    matches!(
        event,
        Event::Key(
            KeyEvent {
                code: KeyCode::Char('q') | KeyCode::Esc,
                ..
            } | KeyEvent {
                code: KeyCode::Char('c'),
                modifiers: KeyModifiers::CONTROL,
                ..
            }
        )
    )
}

/// The northwest corner of the board, at most [`VIEW_DIMENSION`] cells on a side.
fn viewport(board: &GameBoard) -> anyhow::Result<String> {
    let view = board.dimension().min(VIEW_DIMENSION);
    let s = board.block_string(view, BoardCoordinate::new(0, 0))?;

    Ok(s)
}

fn draw(stdout: &mut io::Stdout, board: &GameBoard) -> anyhow::Result<()> {
    execute!(
        stdout,
        terminal::Clear(terminal::ClearType::All),
        cursor::MoveTo(0, 0),
        style::Print(format!(
            "generation {} ({})",
            board.generation(),
            board.rule()
        )),
        cursor::MoveToNextLine(1),
    )?;

    for line in viewport(board)?.lines() {
        execute!(stdout, style::Print(line), cursor::MoveToNextLine(1))?;
    }

    stdout.flush()?;

    Ok(())
}

fn run(board: &mut GameBoard, generations: u64) -> anyhow::Result<()> {
    let mut stdout = io::stdout();

    loop {
        let t = time::Instant::now();

        draw(&mut stdout, board)?;

        if board.generation() >= generations {
            break;
        }

        if event::poll(FRAMETIME)? && should_exit(event::read()?) {
            break;
        }

        board.simulate_next_generation();

        thread::sleep(FRAMETIME.saturating_sub(t.elapsed()));
    }

    Ok(())
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let args = parse_args()?;

    let source = fs::read_to_string(&args.path)
        .with_context(|| format!("Failed to read {}", args.path))?;
    let cells = coords::parse_coordinates(&source);

    let mut board = GameBoard::with_rule(args.dimension, &args.rule)?;
    board
        .set_cells(cells.iter().copied())
        .with_context(|| format!("Pattern in {} does not fit the board", args.path))?;

    info!(cells = cells.len(), path = %args.path, "Loaded pattern");

    terminal::enable_raw_mode()?;
    let res = run(&mut board, args.generations);
    terminal::disable_raw_mode()?;

    res
}
