use ratatui::{
    prelude::*,
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::config::{Board, Palette};
use crate::game::{GameState, Point};

/// Terminal columns per grid cell; cells are roughly twice as tall as wide.
const CELL_WIDTH: u16 = 2;

/// Terminal size needed to show `board` in full, border included.
pub fn required_size(board: Board) -> (u16, u16) {
    let columns = u16::try_from(board.columns()).unwrap_or(u16::MAX);
    let rows = u16::try_from(board.rows()).unwrap_or(u16::MAX);
    (
        columns.saturating_mul(CELL_WIDTH).saturating_add(2),
        rows.saturating_add(2),
    )
}

/// Draws a game with a fixed palette.
#[derive(Debug)]
pub struct Renderer {
    palette: Palette,
}

impl Renderer {
    pub fn new(palette: Palette) -> Self {
        Renderer { palette }
    }

    pub fn draw(&self, frame: &mut Frame, game: &GameState) {
        frame.render_widget(self.view(game), frame.area());
    }

    pub fn view<'a>(&'a self, game: &'a GameState) -> GameView<'a> {
        GameView {
            game,
            palette: &self.palette,
        }
    }
}

pub struct GameView<'a> {
    game: &'a GameState,
    palette: &'a Palette,
}

impl GameView<'_> {
    /// Paints one grid cell, skipping it if it falls outside `area`.
    fn paint(&self, area: Rect, buf: &mut Buffer, pos: Point, symbols: [&str; 2], style: Style) {
        let block_size = self.game.board().block_size();
        let (Ok(col), Ok(row)) = (
            u16::try_from(pos.x / block_size),
            u16::try_from(pos.y / block_size),
        ) else {
            return;
        };

        let y = area.y.saturating_add(row);
        if y >= area.bottom() {
            return;
        }
        for (i, symbol) in symbols.iter().enumerate() {
            let x = area
                .x
                .saturating_add(col.saturating_mul(CELL_WIDTH))
                .saturating_add(i as u16);
            if x < area.right() {
                buf[(x, y)].set_symbol(symbol).set_style(style);
            }
        }
    }
}

impl Widget for GameView<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let board = self.game.board();
        let text = Style::default().fg(self.palette.text).bg(self.palette.background);

        let (width, height) = required_size(board);
        if area.width < width || area.height < height {
            // the board is drawn whole or not at all
            Paragraph::new(format!("Terminal too small: need {}x{}", width, height))
                .style(text)
                .wrap(Wrap { trim: true })
                .render(area, buf);
            return;
        }
        let outline = Rect::new(area.x, area.y, width, height);

        let block = Block::bordered()
            .title(format!("Score: {}", self.game.score()))
            .style(text)
            .title_style(text);
        let inner = block.inner(outline);
        block.render(outline, buf);

        let segment = Style::default()
            .fg(self.palette.snake_inner)
            .bg(self.palette.snake);
        for pos in self.game.snake() {
            self.paint(inner, buf, *pos, ["▐", "▌"], segment);
        }

        if let Some(food) = self.game.food() {
            let style = Style::default().bg(self.palette.food);
            self.paint(inner, buf, food, [" ", " "], style);
        }
    }
}
