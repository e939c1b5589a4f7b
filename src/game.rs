use log::{debug, info, warn};
use rand::Rng;
use std::collections::VecDeque;
use thiserror::Error;

use crate::config::Board;

/// Random draws tried before food placement falls back to a scan of the board.
const MAX_PLACEMENT_ATTEMPTS: u32 = 256;
pub const INITIAL_LENGTH: i32 = 3;

/// A grid-aligned position in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Point { x, y }
    }

    fn translated(self, delta: PointDelta, block_size: i32) -> Point {
        Point {
            x: self.x + delta.x * block_size,
            y: self.y + delta.y * block_size,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    Right,
    Left,
    Up,
    Down,
}

/// Unit step along one axis, in cells.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct PointDelta {
    x: i32,
    y: i32,
}

impl From<Direction> for PointDelta {
    fn from(dir: Direction) -> Self {
        match dir {
            Direction::Right => PointDelta { x: 1, y: 0 },
            Direction::Left => PointDelta { x: -1, y: 0 },
            Direction::Up => PointDelta { x: 0, y: -1 },
            Direction::Down => PointDelta { x: 0, y: 1 },
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Collision {
    Wall,
    SelfBite,
}

/// What a single tick produced.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StepOutcome {
    pub game_over: bool,
    pub score: u32,
    pub collision: Option<Collision>,
    pub ate_food: bool,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no free cell left on the {columns}x{rows} board")]
pub struct PlacementExhausted {
    pub columns: i32,
    pub rows: i32,
}

/// The whole game: board, snake, food and score.
///
/// The snake is stored head first. A game is running until a collision is
/// recorded; from then on the state is frozen.
#[derive(Clone, Debug, PartialEq)]
pub struct GameState {
    board: Board,
    snake: VecDeque<Point>,
    direction: Direction,
    food: Option<Point>,
    score: u32,
    collision: Option<Collision>,
}

impl GameState {
    pub fn new(board: Board, rng: &mut impl Rng) -> Self {
        let head = board.center();
        let snake = (0..INITIAL_LENGTH)
            .map(|i| Point::new(head.x - i * board.block_size(), head.y))
            .collect();

        let mut state = GameState {
            board,
            snake,
            direction: Direction::Right,
            food: None,
            score: 0,
            collision: None,
        };
        state.place_food(rng);
        state
    }

    pub fn board(&self) -> Board {
        self.board
    }

    pub fn snake(&self) -> &VecDeque<Point> {
        &self.snake
    }

    pub fn head(&self) -> Point {
        // never empty: built with INITIAL_LENGTH segments and only ever grows
        // or swaps a tail for a head
        self.snake[0]
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// `None` only once the snake covers every cell of the board.
    pub fn food(&self) -> Option<Point> {
        self.food
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn is_over(&self) -> bool {
        self.collision.is_some()
    }

    /// Advances the game by one tick.
    ///
    /// `pending` replaces the current direction without any check, so turning
    /// straight back into the neck is allowed and ends the game. On a
    /// collision the new head is kept and nothing else changes. Calling this
    /// on a finished game changes nothing and reports the final outcome.
    pub fn play_step(&mut self, pending: Option<Direction>, rng: &mut impl Rng) -> StepOutcome {
        if self.is_over() {
            warn!("Step requested after game over, ignoring");
            return self.outcome(false);
        }

        if let Some(direction) = pending {
            if direction != self.direction {
                debug!("Turning {:?} -> {:?}", self.direction, direction);
            }
            self.direction = direction;
        }

        let new_head = self
            .head()
            .translated(self.direction.into(), self.board.block_size());
        self.snake.push_front(new_head);

        if let Some(collision) = self.check_collision() {
            info!(
                "Game over: {:?} at ({}, {}), final score {}",
                collision, new_head.x, new_head.y, self.score
            );
            self.collision = Some(collision);
            return self.outcome(false);
        }

        let ate_food = self.food == Some(new_head);
        if ate_food {
            self.score += 1;
            self.place_food(rng);
        } else {
            self.snake.pop_back();
        }

        self.outcome(ate_food)
    }

    fn outcome(&self, ate_food: bool) -> StepOutcome {
        StepOutcome {
            game_over: self.is_over(),
            score: self.score,
            collision: self.collision,
            ate_food,
        }
    }

    fn check_collision(&self) -> Option<Collision> {
        let head = self.head();
        if !self.board.contains(head) {
            Some(Collision::Wall)
        } else if self.snake.iter().skip(1).any(|segment| *segment == head) {
            Some(Collision::SelfBite)
        } else {
            None
        }
    }

    fn occupies(&self, pos: Point) -> bool {
        self.snake.contains(&pos)
    }

    fn place_food(&mut self, rng: &mut impl Rng) {
        match self.free_cell(rng) {
            Ok(pos) => {
                debug!("Food placed at ({}, {})", pos.x, pos.y);
                self.food = Some(pos);
            }
            Err(e) => {
                warn!("{}, board left without food", e);
                self.food = None;
            }
        }
    }

    fn free_cell(&self, rng: &mut impl Rng) -> Result<Point, PlacementExhausted> {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let pos = self.board.cell(
                rng.gen_range(0..self.board.columns()),
                rng.gen_range(0..self.board.rows()),
            );
            if !self.occupies(pos) {
                return Ok(pos);
            }
        }

        debug!(
            "No free cell after {} random draws, scanning the board",
            MAX_PLACEMENT_ATTEMPTS
        );
        self.board
            .cells()
            .find(|pos| !self.occupies(*pos))
            .ok_or(PlacementExhausted {
                columns: self.board.columns(),
                rows: self.board.rows(),
            })
    }

    /// Builds a state from explicit parts, bypassing random placement.
    #[cfg(test)]
    pub(crate) fn from_parts(
        board: Board,
        snake: &[Point],
        direction: Direction,
        food: Option<Point>,
    ) -> Self {
        GameState {
            board,
            snake: snake.iter().copied().collect(),
            direction,
            food,
            score: 0,
            collision: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn default_board() -> Board {
        Board::new(640, 480, 20).unwrap()
    }

    fn points(coords: &[(i32, i32)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    #[test]
    fn test_new_game_layout() {
        let mut rng = StdRng::seed_from_u64(1);
        let game = GameState::new(default_board(), &mut rng);

        assert_eq!(
            game.snake().iter().copied().collect::<Vec<_>>(),
            points(&[(320, 240), (300, 240), (280, 240)])
        );
        assert_eq!(game.direction(), Direction::Right);
        assert_eq!(game.score(), 0);
        assert!(!game.is_over());

        let food = game.food().expect("fresh board has room for food");
        assert!(!game.snake().contains(&food));
        assert!(game.board().contains(food));
        assert_eq!(food.x % 20, 0);
        assert_eq!(food.y % 20, 0);
    }

    #[test]
    fn test_direction_deltas() {
        let pos = Point::new(100, 100);
        assert_eq!(pos.translated(Direction::Right.into(), 20), Point::new(120, 100));
        assert_eq!(pos.translated(Direction::Left.into(), 20), Point::new(80, 100));
        assert_eq!(pos.translated(Direction::Up.into(), 20), Point::new(100, 80));
        assert_eq!(pos.translated(Direction::Down.into(), 20), Point::new(100, 120));
    }

    #[test]
    fn test_single_step_keeps_length() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut game = GameState::from_parts(
            default_board(),
            &points(&[(320, 240), (300, 240), (280, 240)]),
            Direction::Right,
            Some(Point::new(0, 0)),
        );

        let outcome = game.play_step(None, &mut rng);

        assert!(!outcome.game_over);
        assert!(!outcome.ate_food);
        assert_eq!(outcome.score, 0);
        assert_eq!(
            game.snake().iter().copied().collect::<Vec<_>>(),
            points(&[(340, 240), (320, 240), (300, 240)])
        );
    }

    #[test]
    fn test_right_wall_ends_game() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut game = GameState::from_parts(
            default_board(),
            &points(&[(620, 240), (600, 240), (580, 240)]),
            Direction::Right,
            Some(Point::new(0, 0)),
        );

        let outcome = game.play_step(None, &mut rng);

        assert!(outcome.game_over);
        assert_eq!(outcome.collision, Some(Collision::Wall));
        assert_eq!(outcome.score, 0);
        // the fatal head stays, the tail is not dropped
        assert_eq!(game.snake().len(), 4);
        assert_eq!(game.head(), Point::new(640, 240));
    }

    #[test]
    fn test_every_wall() {
        let board = default_board();
        let cases = [
            (Direction::Left, points(&[(0, 240), (20, 240), (40, 240)])),
            (Direction::Up, points(&[(300, 0), (300, 20), (300, 40)])),
            (Direction::Down, points(&[(300, 460), (300, 440), (300, 420)])),
            (Direction::Right, points(&[(620, 0), (600, 0), (580, 0)])),
        ];

        for (direction, snake) in cases {
            let mut rng = StdRng::seed_from_u64(4);
            let mut game = GameState::from_parts(board, &snake, direction, None);
            let outcome = game.play_step(None, &mut rng);
            assert_eq!(outcome.collision, Some(Collision::Wall), "{:?}", direction);
        }
    }

    #[test]
    fn test_reversal_is_accepted() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut game = GameState::from_parts(
            default_board(),
            &points(&[(100, 100), (80, 100), (60, 100)]),
            Direction::Right,
            Some(Point::new(0, 0)),
        );

        // no guard against turning back: the head lands on the neck
        let outcome = game.play_step(Some(Direction::Left), &mut rng);
        assert_eq!(game.direction(), Direction::Left);
        assert_eq!(game.head(), Point::new(80, 100));
        assert!(outcome.game_over);
        assert_eq!(outcome.collision, Some(Collision::SelfBite));

        // the follow-up turn is ignored because the game is over
        let frozen = game.clone();
        let outcome = game.play_step(Some(Direction::Down), &mut rng);
        assert!(outcome.game_over);
        assert_eq!(game, frozen);
    }

    #[test]
    fn test_self_collision_on_loop() {
        let mut rng = StdRng::seed_from_u64(6);
        let mut game = GameState::from_parts(
            default_board(),
            &points(&[(100, 100), (80, 100), (60, 100), (40, 100), (20, 100)]),
            Direction::Right,
            Some(Point::new(400, 400)),
        );

        assert!(!game.play_step(Some(Direction::Down), &mut rng).game_over);
        assert!(!game.play_step(Some(Direction::Left), &mut rng).game_over);
        let outcome = game.play_step(Some(Direction::Up), &mut rng);

        assert!(outcome.game_over);
        assert_eq!(outcome.collision, Some(Collision::SelfBite));
        assert_eq!(game.head(), Point::new(80, 100));
    }

    #[test]
    fn test_chasing_the_tail_is_fatal() {
        let mut rng = StdRng::seed_from_u64(11);
        // 2x2 loop: the next cell down is where the tail is now
        let mut game = GameState::from_parts(
            default_board(),
            &points(&[(100, 100), (120, 100), (120, 120), (100, 120)]),
            Direction::Left,
            Some(Point::new(400, 400)),
        );

        let outcome = game.play_step(Some(Direction::Down), &mut rng);

        // collision is checked before the tail moves away
        assert!(outcome.game_over);
        assert_eq!(outcome.collision, Some(Collision::SelfBite));
        assert_eq!(game.head(), Point::new(100, 120));
        assert_eq!(game.snake().len(), 5);
        assert_eq!(game.snake().back(), Some(&Point::new(100, 120)));
    }

    #[test]
    fn test_eating_grows_and_scores() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut game = GameState::from_parts(
            default_board(),
            &points(&[(80, 100), (60, 100), (40, 100)]),
            Direction::Right,
            Some(Point::new(100, 100)),
        );

        let outcome = game.play_step(None, &mut rng);

        assert!(outcome.ate_food);
        assert!(!outcome.game_over);
        assert_eq!(outcome.score, 1);
        assert_eq!(game.score(), 1);
        assert_eq!(game.snake().len(), 4);
        assert_eq!(game.head(), Point::new(100, 100));
        let food = game.food().unwrap();
        assert!(!game.snake().contains(&food));
    }

    #[test]
    fn test_placement_on_nearly_full_board() {
        // 4x1 cells with three taken leaves exactly one spot
        let board = Board::new(80, 20, 20).unwrap();
        let mut rng = StdRng::seed_from_u64(8);
        for _ in 0..20 {
            let game = GameState::new(board, &mut rng);
            assert_eq!(game.food(), Some(Point::new(60, 0)));
        }
    }

    #[test]
    fn test_full_board_leaves_no_food() {
        let board = Board::new(80, 20, 20).unwrap();
        let mut rng = StdRng::seed_from_u64(9);
        let mut game = GameState::from_parts(
            board,
            &points(&[(40, 0), (20, 0), (0, 0)]),
            Direction::Right,
            Some(Point::new(60, 0)),
        );

        let outcome = game.play_step(None, &mut rng);

        assert!(outcome.ate_food);
        assert_eq!(game.snake().len(), 4);
        assert_eq!(game.food(), None);
        assert_eq!(
            game.free_cell(&mut rng),
            Err(PlacementExhausted { columns: 4, rows: 1 })
        );

        // nowhere left to go
        assert_eq!(
            game.play_step(None, &mut rng).collision,
            Some(Collision::Wall)
        );
    }

    #[test]
    fn test_finished_game_is_frozen() {
        let mut rng = StdRng::seed_from_u64(10);
        let mut game = GameState::from_parts(
            default_board(),
            &points(&[(0, 0), (20, 0), (40, 0)]),
            Direction::Up,
            Some(Point::new(200, 200)),
        );
        assert!(game.play_step(None, &mut rng).game_over);

        let frozen = game.clone();
        for direction in [Direction::Down, Direction::Right, Direction::Left] {
            let outcome = game.play_step(Some(direction), &mut rng);
            assert!(outcome.game_over);
            assert_eq!(outcome.score, 0);
        }
        assert_eq!(game, frozen);
    }

    #[test]
    fn test_random_play_invariants() {
        let directions = [
            Direction::Right,
            Direction::Left,
            Direction::Up,
            Direction::Down,
        ];
        let board = Board::new(200, 160, 20).unwrap();

        for seed in 0..50 {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut game = GameState::new(board, &mut rng);

            for _ in 0..500 {
                let pending = if rng.gen_bool(0.3) {
                    Some(directions[rng.gen_range(0..directions.len())])
                } else {
                    None
                };
                let before = game.clone();
                let outcome = game.play_step(pending, &mut rng);

                if outcome.game_over {
                    assert_eq!(game.snake().len(), before.snake().len() + 1);
                    assert_eq!(game.score(), before.score());
                    assert_eq!(game.food(), before.food());
                    break;
                }

                assert!(board.contains(game.head()));
                if outcome.ate_food {
                    assert_eq!(game.snake().len(), before.snake().len() + 1);
                    assert_eq!(game.score(), before.score() + 1);
                } else {
                    assert_eq!(game.snake().len(), before.snake().len());
                    assert_eq!(game.score(), before.score());
                    assert_eq!(game.food(), before.food());
                }
                if let Some(food) = game.food() {
                    assert!(!game.snake().contains(&food));
                }
            }
        }
    }
}
