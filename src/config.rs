use clap::{Args, Parser};
use ratatui::style::Color;
use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

use crate::game::{Point, INITIAL_LENGTH};

/// The starting snake runs leftward from the centre column, so the centre
/// needs `INITIAL_LENGTH - 1` cells to its left.
const MIN_COLUMNS: i32 = 2 * (INITIAL_LENGTH - 1);
const MIN_ROWS: i32 = 1;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{name} must be positive, got {value}")]
    NonPositive { name: &'static str, value: i64 },
    #[error("block size {block_size} does not evenly divide a {width}x{height} board")]
    Misaligned {
        width: i32,
        height: i32,
        block_size: i32,
    },
    #[error("a {columns}x{rows} cell board is too small, need at least {min_columns}x{min_rows}")]
    TooSmall {
        columns: i32,
        rows: i32,
        min_columns: i32,
        min_rows: i32,
    },
}

/// Command line settings, read once at startup.
#[derive(Debug, Parser)]
#[command(name = "blocksnake", version, about = "Grid snake for the terminal")]
pub struct Settings {
    /// Board width in pixels
    #[arg(long, default_value_t = 640)]
    pub width: i32,

    /// Board height in pixels
    #[arg(long, default_value_t = 480)]
    pub height: i32,

    /// Edge of one grid cell in pixels; must divide width and height
    #[arg(long, default_value_t = 20)]
    pub block_size: i32,

    /// Steps per second
    #[arg(long, default_value_t = 20)]
    pub tick_rate: u32,

    /// Seed for food placement, for reproducible games
    #[arg(long)]
    pub seed: Option<u64>,

    #[arg(long, default_value = "snake.log")]
    pub log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    pub verbose: bool,

    #[command(flatten)]
    pub palette: Palette,
}

impl Settings {
    pub fn board(&self) -> Result<Board, ConfigError> {
        Board::new(self.width, self.height, self.block_size)
    }

    pub fn tick_interval(&self) -> Result<Duration, ConfigError> {
        if self.tick_rate == 0 {
            return Err(ConfigError::NonPositive {
                name: "tick rate",
                value: 0,
            });
        }
        Ok(Duration::from_secs(1) / self.tick_rate)
    }
}

/// Colours accept names ("lightblue") or hex ("#0064ff").
#[derive(Clone, Copy, Debug, PartialEq, Eq, Args)]
pub struct Palette {
    #[arg(long = "snake-color", default_value = "blue")]
    pub snake: Color,

    #[arg(long = "snake-inner-color", default_value = "lightblue")]
    pub snake_inner: Color,

    #[arg(long = "food-color", default_value = "red")]
    pub food: Color,

    #[arg(long = "text-color", default_value = "white")]
    pub text: Color,

    #[arg(long = "background-color", default_value = "black")]
    pub background: Color,
}

impl Default for Palette {
    fn default() -> Self {
        Palette {
            snake: Color::Blue,
            snake_inner: Color::LightBlue,
            food: Color::Red,
            text: Color::White,
            background: Color::Black,
        }
    }
}

/// Validated board geometry in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Board {
    width: i32,
    height: i32,
    block_size: i32,
}

impl Board {
    pub fn new(width: i32, height: i32, block_size: i32) -> Result<Self, ConfigError> {
        for (name, value) in [
            ("width", width),
            ("height", height),
            ("block size", block_size),
        ] {
            if value <= 0 {
                return Err(ConfigError::NonPositive {
                    name,
                    value: value.into(),
                });
            }
        }

        if width % block_size != 0 || height % block_size != 0 {
            return Err(ConfigError::Misaligned {
                width,
                height,
                block_size,
            });
        }

        let board = Board {
            width,
            height,
            block_size,
        };
        if board.columns() < MIN_COLUMNS || board.rows() < MIN_ROWS {
            return Err(ConfigError::TooSmall {
                columns: board.columns(),
                rows: board.rows(),
                min_columns: MIN_COLUMNS,
                min_rows: MIN_ROWS,
            });
        }

        Ok(board)
    }

    pub fn width(&self) -> i32 {
        self.width
    }

    pub fn height(&self) -> i32 {
        self.height
    }

    pub fn block_size(&self) -> i32 {
        self.block_size
    }

    pub fn columns(&self) -> i32 {
        self.width / self.block_size
    }

    pub fn rows(&self) -> i32 {
        self.height / self.block_size
    }

    pub fn contains(&self, pos: Point) -> bool {
        pos.x >= 0
            && pos.x <= self.width - self.block_size
            && pos.y >= 0
            && pos.y <= self.height - self.block_size
    }

    /// Top-left corner of the cell at `column`, `row`.
    pub fn cell(&self, column: i32, row: i32) -> Point {
        Point::new(column * self.block_size, row * self.block_size)
    }

    /// Every cell, row by row.
    pub fn cells(self) -> impl Iterator<Item = Point> {
        (0..self.rows()).flat_map(move |row| (0..self.columns()).map(move |col| self.cell(col, row)))
    }

    /// The cell holding the board's midpoint.
    pub fn center(&self) -> Point {
        self.cell(self.columns() / 2, self.rows() / 2)
    }
}
