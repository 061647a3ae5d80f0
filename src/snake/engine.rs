//! Grid snake rules, independent of any rendering surface.

use std::collections::VecDeque;

use rand::Rng;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Cell {
    pub x: i32,
    pub y: i32,
}

impl Cell {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Unit movement vector; `(0, 0)` means the snake has not started moving.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Direction {
    pub dx: i32,
    pub dy: i32,
}

impl Direction {
    pub const IDLE: Direction = Direction { dx: 0, dy: 0 };

    pub fn is_idle(self) -> bool {
        self.dx == 0 && self.dy == 0
    }
}

/// Steering and control keys, decoded from `KeyboardEvent.code`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameKey {
    Up,
    Down,
    Left,
    Right,
    Restart,
}

impl GameKey {
    pub fn from_code(code: &str) -> Option<GameKey> {
        match code {
            "ArrowUp" | "KeyW" => Some(GameKey::Up),
            "ArrowDown" | "KeyS" => Some(GameKey::Down),
            "ArrowLeft" | "KeyA" => Some(GameKey::Left),
            "ArrowRight" | "KeyD" => Some(GameKey::Right),
            "Space" => Some(GameKey::Restart),
            _ => None,
        }
    }
}

/// Why the board was wiped.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResetCause {
    Wall,
    SelfHit,
    BoardFull,
}

/// Result of one advance.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Step {
    Idle,
    Moved,
    Ate,
    Reset(ResetCause),
}

/// Supplies candidate food cells. Placement keeps asking until it gets a
/// free one.
pub trait FoodSource {
    fn next_cell(&mut self, tile_count: i32) -> Cell;
}

/// Uniform sampling over the grid.
pub struct RandomFood<R>(pub R);

impl<R: Rng> FoodSource for RandomFood<R> {
    fn next_cell(&mut self, tile_count: i32) -> Cell {
        let n = tile_count.max(1);
        Cell::new(self.0.gen_range(0..n), self.0.gen_range(0..n))
    }
}

pub struct SnakeGame<F> {
    segments: VecDeque<Cell>, // head first
    food: Cell,
    direction: Direction,
    score: u32,
    tile_count: i32,
    origin: Cell,
    food_source: F,
}

/// Smallest board that always leaves a free cell beside a fresh snake.
pub const MIN_TILE_COUNT: i32 = 2;

impl<F: FoodSource> SnakeGame<F> {
    /// Boards smaller than [`MIN_TILE_COUNT`] are widened and the origin is
    /// pulled onto the grid, so food never starts under the head.
    pub fn new(tile_count: i32, origin: Cell, food_source: F) -> Self {
        let tile_count = tile_count.max(MIN_TILE_COUNT);
        let origin = Cell::new(
            origin.x.clamp(0, tile_count - 1),
            origin.y.clamp(0, tile_count - 1),
        );
        let mut game = Self {
            segments: VecDeque::new(),
            food: origin,
            direction: Direction::IDLE,
            score: 0,
            tile_count,
            origin,
            food_source,
        };
        game.reset();
        game
    }

    pub fn segments(&self) -> impl ExactSizeIterator<Item = &Cell> {
        self.segments.iter()
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    pub fn head(&self) -> Cell {
        self.segments.front().copied().unwrap_or(self.origin)
    }

    pub fn food(&self) -> Cell {
        self.food
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn tile_count(&self) -> i32 {
        self.tile_count
    }

    fn occupied(&self, cell: Cell) -> bool {
        self.segments.contains(&cell)
    }

    fn in_bounds(&self, cell: Cell) -> bool {
        (0..self.tile_count).contains(&cell.x) && (0..self.tile_count).contains(&cell.y)
    }

    /// Hard reset: single segment at origin, idle, zero score, fresh food.
    pub fn reset(&mut self) {
        self.segments.clear();
        self.segments.push_front(self.origin);
        self.direction = Direction::IDLE;
        self.score = 0;
        self.place_food();
    }

    /// Resample until the candidate is free. Returns false when the board is
    /// full and no free cell exists.
    fn place_food(&mut self) -> bool {
        let cells = (self.tile_count.max(0) as usize).pow(2);
        if self.segments.len() >= cells {
            return false;
        }
        loop {
            let candidate = self.food_source.next_cell(self.tile_count);
            if !self.occupied(candidate) {
                self.food = candidate;
                return true;
            }
        }
    }

    /// Apply a key. Steering only turns perpendicular to current motion;
    /// returns whether the key changed anything.
    pub fn press(&mut self, key: GameKey) -> bool {
        let Direction { dx, dy } = self.direction;
        let next = match key {
            GameKey::Up if dy == 0 => Direction { dx: 0, dy: -1 },
            GameKey::Down if dy == 0 => Direction { dx: 0, dy: 1 },
            GameKey::Left if dx == 0 => Direction { dx: -1, dy: 0 },
            GameKey::Right if dx == 0 => Direction { dx: 1, dy: 0 },
            GameKey::Restart => {
                self.reset();
                return true;
            }
            _ => return false,
        };
        self.direction = next;
        true
    }

    /// One tick of movement.
    pub fn advance(&mut self) -> Step {
        if self.direction.is_idle() {
            return Step::Idle;
        }
        let head = self.head();
        let next = Cell::new(head.x + self.direction.dx, head.y + self.direction.dy);

        if !self.in_bounds(next) {
            self.reset();
            return Step::Reset(ResetCause::Wall);
        }
        if self.occupied(next) {
            self.reset();
            return Step::Reset(ResetCause::SelfHit);
        }

        self.segments.push_front(next);
        if next == self.food {
            self.score += 1;
            if !self.place_food() {
                self.reset();
                return Step::Reset(ResetCause::BoardFull);
            }
            Step::Ate
        } else {
            self.segments.pop_back();
            Step::Moved
        }
    }
}
