mod config;
mod game;
mod input;
mod render;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use log::{debug, error, info, warn};
use rand::{rngs::StdRng, SeedableRng};
use ratatui::prelude::*;
use simplelog::{Config, LevelFilter, WriteLogger};
use std::fs::File;
use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use config::Settings;
use game::{Collision, Direction, GameState};
use input::{Command, PendingInput};
use render::Renderer;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ending {
    GameOver {
        collision: Option<Collision>,
        heading: Direction,
        score: u32,
    },
    Quit,
}

fn main() -> Result<()> {
    let settings = Settings::parse();
    let board = settings.board()?;
    let tick_rate = settings.tick_interval()?;

    // Set up logging before anything else touches the terminal
    let level = if settings.verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let log_file = File::create(&settings.log_file)
        .with_context(|| format!("Failed to create log file {}", settings.log_file.display()))?;
    WriteLogger::init(level, Config::default(), log_file).context("Failed to initialize logger")?;

    info!("Starting blocksnake with {:?}", settings);
    info!(
        "Board {}x{} px, {}x{} cells, one step every {:?}",
        board.width(),
        board.height(),
        board.columns(),
        board.rows(),
        tick_rate
    );

    let mut rng = match settings.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let mut game = GameState::new(board, &mut rng);
    let renderer = Renderer::new(settings.palette);

    let mut terminal = setup_terminal()?;
    let (width, height) = render::required_size(board);
    match terminal.size() {
        Ok(size) if size.width < width || size.height < height => warn!(
            "Terminal is {}x{}, the board needs {}x{}",
            size.width, size.height, width, height
        ),
        Ok(_) => {}
        Err(e) => warn!("Failed to read terminal size: {}", e),
    }

    let result = run(&mut terminal, &mut game, &renderer, &mut rng, tick_rate);
    let restored = restore_terminal(&mut terminal);

    let score = match settle(result, restored)? {
        Ending::GameOver {
            collision,
            heading,
            score,
        } => {
            info!(
                "Finished: {:?} heading {:?}, score {}",
                collision, heading, score
            );
            score
        }
        Ending::Quit => {
            info!("Finished: quit with score {}", game.score());
            game.score()
        }
    };

    println!("Final Score: {}", score);
    Ok(())
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("Failed to enable raw mode")?;

    let entered = enter_terminal();

    if entered.is_err() {
        // undo whatever part of the setup went through
        let undone = first_error([
            disable_raw_mode().context("Failed to disable raw mode"),
            execute!(io::stdout(), LeaveAlternateScreen).context("Failed to leave alternate screen"),
        ]);
        if let Err(e) = undone {
            error!("Terminal left in a bad state: {:#}", e);
        }
    }
    entered
}

fn enter_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to enter alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("Failed to create terminal")?;
    terminal.hide_cursor().context("Failed to hide cursor")?;
    Ok(terminal)
}

/// Runs every restore step, even after one of them fails.
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    first_error([
        disable_raw_mode().context("Failed to disable raw mode"),
        execute!(terminal.backend_mut(), LeaveAlternateScreen)
            .context("Failed to leave alternate screen"),
        terminal.show_cursor().context("Failed to show cursor"),
    ])
}

/// Logs every failure and hands back the first.
fn first_error(results: impl IntoIterator<Item = Result<()>>) -> Result<()> {
    let mut first = None;
    for result in results {
        if let Err(e) = result {
            error!("{:#}", e);
            first.get_or_insert(e);
        }
    }
    first.map_or(Ok(()), Err)
}

/// A game loop failure outranks a failed terminal restore.
fn settle(result: Result<Ending>, restored: Result<()>) -> Result<Ending> {
    match (result, restored) {
        (Err(e), restored) => {
            error!("Game loop failed: {:#}", e);
            if let Err(restore) = restored {
                error!("Terminal restore also failed: {:#}", restore);
            }
            Err(e)
        }
        (Ok(_), Err(restore)) => Err(restore),
        (Ok(ending), Ok(())) => Ok(ending),
    }
}

/// Steps the game once per `tick_rate`, collecting input in between.
fn run(
    terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    game: &mut GameState,
    renderer: &Renderer,
    rng: &mut StdRng,
    tick_rate: Duration,
) -> Result<Ending> {
    let mut pending = PendingInput::default();
    let mut last_tick = Instant::now();

    terminal.draw(|f| renderer.draw(f, game))?;

    loop {
        let timeout = tick_rate.saturating_sub(last_tick.elapsed());
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match input::command_for(key) {
                    Some(Command::Steer(direction)) => pending.push(direction),
                    Some(Command::Quit) => {
                        info!("Quit requested");
                        return Ok(Ending::Quit);
                    }
                    None => {}
                }
            }
        }

        if last_tick.elapsed() >= tick_rate {
            last_tick = Instant::now();
            let outcome = game.play_step(pending.take(), rng);
            if outcome.game_over {
                // the final frame is not drawn, the score is reported on exit
                return Ok(Ending::GameOver {
                    collision: outcome.collision,
                    heading: game.direction(),
                    score: outcome.score,
                });
            }
            if outcome.ate_food {
                debug!("Score now {}", outcome.score);
            }
            terminal.draw(|f| renderer.draw(f, game))?;
        }
    }
}
