//! Quarto game logic with prime-product trait encoding.
//!
//! # Piece Encoding
//!
//! ```text
//! Each of the 8 elementary traits maps to one of the first 8 primes:
//!
//!   light = 2   dark  = 3     (pair 1, label letter L / D)
//!   round = 5   square = 7    (pair 2, label letter R / Q)
//!   tall  = 11  short = 13    (pair 3, label letter T / S)
//!   full  = 17  hollow = 19   (pair 4, label letter F / H)
//!
//! A piece is one trait from each pair; its code is the product of the
//! four primes. "LRTF" (light round tall full) = 2 * 5 * 11 * 17 = 1870.
//! This yields 16 distinct square-free codes. Code 0 is the empty-cell /
//! null-piece sentinel.
//! ```
//!
//! # Win Detection
//!
//! ```text
//! Four placed pieces share a trait iff the product of their codes is
//! divisible by that trait's prime to the fourth power (e.g. 2^4 = 16
//! for "all light"). Codes are square-free, so a product divisible by
//! prime^4 can only arise from all four factors carrying that prime -
//! no false positives. An empty cell zeroes the product, so incomplete
//! lines never win.
//! ```
//!
//! # State Text
//!
//! ```text
//! Board:  BRD__{dim}__{c0}_{c1}_..._{cN}     (flat row-major cell codes)
//! Game:   {board}_ENDBRD_{turn}_{stage}_{status}_{winCond}
//!                 _{lastX}_{lastY}_{selectedLabel}_{messageToken}_{id}
//!                 [_{remainingLabel}]*
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default board dimension.
pub const BOARD_DIM: usize = 4;

/// Errors that indicate a broken contract rather than a game-rule
/// rejection. Rule rejections (occupied cell, unavailable piece) are
/// outcome variants on the relevant methods, not errors.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GameError {
    /// Coordinates outside the board. The orchestrator is expected to
    /// pre-validate, so hitting this is a programmer error.
    #[error("coordinates ({x}, {y}) out of range for a {dim}x{dim} board")]
    OutOfRange { x: usize, y: usize, dim: usize },

    /// State text that the core itself could not have produced.
    #[error("malformed state text: {0}")]
    Malformed(String),
}

// ============================================================================
// TRAIT ENCODING
// ============================================================================

/// One of the 8 elementary binary traits. The discriminant is the win
/// code reported when a line of four pieces shares the trait.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Trait {
    Light = 1,
    Dark = 2,
    Round = 3,
    Square = 4,
    Tall = 5,
    Short = 6,
    Full = 7,
    Hollow = 8,
}

/// The four opposing-trait pairs, one label letter position each.
const TRAIT_PAIRS: [[Trait; 2]; 4] = [
    [Trait::Light, Trait::Dark],
    [Trait::Round, Trait::Square],
    [Trait::Tall, Trait::Short],
    [Trait::Full, Trait::Hollow],
];

impl Trait {
    /// All traits in win-code order.
    pub const ALL: [Trait; 8] = [
        Trait::Light,
        Trait::Dark,
        Trait::Round,
        Trait::Square,
        Trait::Tall,
        Trait::Short,
        Trait::Full,
        Trait::Hollow,
    ];

    /// The prime assigned to this trait.
    #[inline]
    pub const fn prime(self) -> u32 {
        match self {
            Trait::Light => 2,
            Trait::Dark => 3,
            Trait::Round => 5,
            Trait::Square => 7,
            Trait::Tall => 11,
            Trait::Short => 13,
            Trait::Full => 17,
            Trait::Hollow => 19,
        }
    }

    /// prime^4, the divisibility constant for "all four share this trait".
    #[inline]
    pub const fn fourth_power(self) -> u64 {
        let p = self.prime() as u64;
        p * p * p * p
    }

    /// Win code (1-8).
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Convert from a win code (1-8).
    pub fn from_code(code: u8) -> Option<Trait> {
        Trait::ALL.into_iter().find(|t| t.code() == code)
    }

    /// The letter this trait contributes to a piece label.
    const fn letter(self) -> u8 {
        match self {
            Trait::Light => b'L',
            Trait::Dark => b'D',
            Trait::Round => b'R',
            Trait::Square => b'Q',
            Trait::Tall => b'T',
            Trait::Short => b'S',
            Trait::Full => b'F',
            Trait::Hollow => b'H',
        }
    }
}

/// The 16 legal piece labels in canonical pool order.
pub const PIECE_LABELS: [&str; 16] = [
    "LRTF", "LRTH", "LRSF", "LRSH", "LQTF", "LQTH", "LQSF", "LQSH",
    "DRTF", "DRTH", "DRSF", "DRSH", "DQTF", "DQTH", "DQSF", "DQSH",
];

/// Compute the prime-product code for a label, or None if the label is
/// not one letter from each pair in pair order.
fn piece_code(label: &str) -> Option<u32> {
    let bytes = label.as_bytes();
    if bytes.len() != 4 {
        return None;
    }
    let mut code = 1u32;
    for (pair, &letter) in TRAIT_PAIRS.iter().zip(bytes) {
        let t = pair.iter().copied().find(|t| t.letter() == letter)?;
        code *= t.prime();
    }
    Some(code)
}

/// Reverse lookup from a cell code to its label. Returns the null label
/// for 0 and for anything that is not a legal piece code.
pub fn label_for_code(code: u32) -> &'static str {
    PIECE_LABELS
        .iter()
        .copied()
        .find(|label| piece_code(label) == Some(code))
        .unwrap_or(Piece::NULL_LABEL)
}

// ============================================================================
// PIECE
// ============================================================================

/// A game piece: a trait label and its prime-product code. Immutable
/// once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Piece {
    label: String,
    code: u32,
}

impl Piece {
    /// Label of the null piece.
    pub const NULL_LABEL: &'static str = "NULL";

    /// Build a piece from its label. Any string that is not one of the
    /// 16 legal labels yields the null piece (code 0) - a defined
    /// fallback that keeps state deserialization tolerant, never an
    /// error.
    pub fn new(label: &str) -> Piece {
        match piece_code(label) {
            Some(code) => Piece {
                label: label.to_string(),
                code,
            },
            None => Piece::null(),
        }
    }

    /// The null piece (empty cell / nothing selected).
    pub fn null() -> Piece {
        Piece {
            label: Piece::NULL_LABEL.to_string(),
            code: 0,
        }
    }

    #[inline]
    pub fn label(&self) -> &str {
        &self.label
    }

    #[inline]
    pub fn code(&self) -> u32 {
        self.code
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        self.code == 0
    }
}

// ============================================================================
// BOARD
// ============================================================================

/// Which line through the last placement produced a win.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Line {
    Row = 1,
    Col = 2,
    MainDiag = 3,
    AntiDiag = 4,
}

impl Line {
    /// Wire code (1-4).
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Convert from a wire code (1-4).
    pub fn from_code(code: u8) -> Option<Line> {
        match code {
            1 => Some(Line::Row),
            2 => Some(Line::Col),
            3 => Some(Line::MainDiag),
            4 => Some(Line::AntiDiag),
            _ => None,
        }
    }
}

/// The playing grid: a dim x dim matrix of piece codes, 0 meaning empty.
/// Owned by exactly one [`Game`]; never aliased.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Board {
    dim: usize,
    cells: Vec<u32>,
}

impl Board {
    /// Create an empty board of the default dimension.
    pub fn new() -> Board {
        Board {
            dim: BOARD_DIM,
            cells: vec![0; BOARD_DIM * BOARD_DIM],
        }
    }

    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// The code at cell (x, y), x being the row.
    #[inline]
    pub fn cell(&self, x: usize, y: usize) -> u32 {
        self.cells[x * self.dim + y]
    }

    /// Place a piece's code at (x, y), overwriting the cell
    /// unconditionally. Callers that care about occupancy must check
    /// [`Board::is_cell_free`] first.
    pub fn place(&mut self, piece: &Piece, x: usize, y: usize) -> Result<(), GameError> {
        if x >= self.dim || y >= self.dim {
            return Err(GameError::OutOfRange { x, y, dim: self.dim });
        }
        self.cells[x * self.dim + y] = piece.code();
        Ok(())
    }

    /// True iff cell (x, y) holds no piece.
    #[inline]
    pub fn is_cell_free(&self, x: usize, y: usize) -> bool {
        self.cell(x, y) == 0
    }

    /// True iff no cell is empty.
    pub fn is_full(&self) -> bool {
        self.cells.iter().all(|&c| c != 0)
    }

    /// Test a line product for a shared trait. Zero (incomplete line)
    /// never wins; otherwise the first trait in code order whose
    /// prime^4 divides the product.
    pub fn winning_trait(product: u64) -> Option<Trait> {
        if product == 0 {
            return None;
        }
        Trait::ALL
            .into_iter()
            .find(|t| product % t.fourth_power() == 0)
    }

    /// Examine the lines through the just-placed cell (x, y): its row,
    /// its column, the main diagonal if x == y, the anti-diagonal if
    /// x + y == dim-1, in that priority order. Returns the first winning
    /// line and its shared trait.
    pub fn check_victory(&self, x: usize, y: usize) -> Result<Option<(Line, Trait)>, GameError> {
        if x >= self.dim || y >= self.dim {
            return Err(GameError::OutOfRange { x, y, dim: self.dim });
        }

        let row: u64 = (0..self.dim).map(|j| u64::from(self.cell(x, j))).product();
        if let Some(shared) = Board::winning_trait(row) {
            return Ok(Some((Line::Row, shared)));
        }

        let col: u64 = (0..self.dim).map(|i| u64::from(self.cell(i, y))).product();
        if let Some(shared) = Board::winning_trait(col) {
            return Ok(Some((Line::Col, shared)));
        }

        if x == y {
            let diag: u64 = (0..self.dim).map(|i| u64::from(self.cell(i, i))).product();
            if let Some(shared) = Board::winning_trait(diag) {
                return Ok(Some((Line::MainDiag, shared)));
            }
        }

        if x + y == self.dim - 1 {
            let diag: u64 = (0..self.dim)
                .map(|i| u64::from(self.cell(i, self.dim - 1 - i)))
                .product();
            if let Some(shared) = Board::winning_trait(diag) {
                return Ok(Some((Line::AntiDiag, shared)));
            }
        }

        Ok(None)
    }

    /// Canonical text encoding: `BRD__{dim}__{cells}` with the flat
    /// row-major cell list joined by underscores.
    pub fn to_text(&self) -> String {
        let cells = self
            .cells
            .iter()
            .map(u32::to_string)
            .collect::<Vec<_>>()
            .join("_");
        format!("BRD__{}__{}", self.dim, cells)
    }

    /// Inverse of [`Board::to_text`]. The core only ever parses its own
    /// output, so anything off-grammar fails fast instead of defaulting.
    pub fn from_text(text: &str) -> Result<Board, GameError> {
        let segments: Vec<&str> = text.split("__").collect();
        if segments.len() != 3 || segments[0] != "BRD" {
            return Err(GameError::Malformed(format!(
                "board text must be BRD__dim__cells, got {text:?}"
            )));
        }
        let dim: usize = segments[1]
            .parse()
            .map_err(|_| GameError::Malformed(format!("invalid board dim: {:?}", segments[1])))?;
        if dim == 0 {
            return Err(GameError::Malformed("board dim must be nonzero".into()));
        }
        let cells = segments[2]
            .split('_')
            .map(|c| {
                c.parse::<u32>()
                    .map_err(|_| GameError::Malformed(format!("invalid cell code: {c:?}")))
            })
            .collect::<Result<Vec<u32>, GameError>>()?;
        if cells.len() != dim * dim {
            return Err(GameError::Malformed(format!(
                "expected {} cells for dim {dim}, got {}",
                dim * dim,
                cells.len()
            )));
        }
        for &code in &cells {
            if code != 0 && label_for_code(code) == Piece::NULL_LABEL {
                return Err(GameError::Malformed(format!("unknown piece code: {code}")));
            }
        }
        Ok(Board { dim, cells })
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// GAME
// ============================================================================

/// Player identifier.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Player {
    One = 1,
    Two = 2,
}

impl Player {
    /// Get the opponent player.
    #[inline]
    pub fn opponent(self) -> Player {
        match self {
            Player::One => Player::Two,
            Player::Two => Player::One,
        }
    }

    /// Wire code (1 or 2).
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    /// Convert from a wire code (1 or 2).
    pub fn from_code(code: u8) -> Option<Player> {
        match code {
            1 => Some(Player::One),
            2 => Some(Player::Two),
            _ => None,
        }
    }
}

/// Sub-phase of an in-progress game. The player on turn selects a piece
/// for the opponent while Selecting; the handed piece is placed while
/// Placing.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Stage {
    Selecting = 1,
    Placing = 2,
}

impl Stage {
    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Stage> {
        match code {
            1 => Some(Stage::Selecting),
            2 => Some(Stage::Placing),
            _ => None,
        }
    }
}

/// Match status. Transitions InProgress -> terminal exactly once.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum Status {
    InProgress = 0,
    PlayerOneWon = 1,
    PlayerTwoWon = 2,
    Draw = 3,
}

impl Status {
    /// The winning status for a player.
    pub fn won_by(player: Player) -> Status {
        match player {
            Player::One => Status::PlayerOneWon,
            Player::Two => Status::PlayerTwoWon,
        }
    }

    #[inline]
    pub fn is_terminal(self) -> bool {
        self != Status::InProgress
    }

    #[inline]
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Status> {
        match code {
            0 => Some(Status::InProgress),
            1 => Some(Status::PlayerOneWon),
            2 => Some(Status::PlayerTwoWon),
            3 => Some(Status::Draw),
            _ => None,
        }
    }
}

/// Result of a selection attempt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum SelectOutcome {
    /// Piece removed from the pool and handed to the opponent; the turn
    /// and stage have advanced.
    Selected,
    /// The label is not in the remaining pool (already placed, already
    /// handed over, or not a piece at all). No state change.
    Unavailable,
    /// The pool was already empty; the game is now a draw. Normally the
    /// board fills exactly when the pool empties, so this is a guard,
    /// not a path ordinary play reaches.
    PoolExhausted,
}

/// Result of a placement attempt.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum PlaceOutcome {
    /// The placement completed a line sharing a trait; the placer has
    /// won and the status is terminal.
    Win { line: Line, shared: Trait },
    /// Piece placed, no win. The caller must check [`Game::is_full`]
    /// (declaring a draw on a full board) or return the game to the
    /// selection stage with [`Game::begin_selection`].
    Placed,
    /// Cell (x, y) already holds a piece. No state change.
    CellOccupied,
}

/// One match: the board, the remaining piece pool, and the two-phase
/// turn state machine. All mutation goes through [`Game::select`] and
/// [`Game::place`] plus the caller-protocol methods
/// [`Game::begin_selection`] / [`Game::declare_draw`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Game {
    board: Board,
    id: String,
    turn: Player,
    stage: Stage,
    status: Status,
    win_line: Option<Line>,
    last_xy: (usize, usize),
    last_selected: Piece,
    last_message: String,
    pool: Vec<Piece>,
}

impl Game {
    /// Start a fresh match. The id is supplied by the orchestrator and
    /// treated as opaque.
    pub fn new(id: impl Into<String>) -> Game {
        Game {
            board: Board::new(),
            id: id.into(),
            turn: Player::One,
            stage: Stage::Selecting,
            status: Status::InProgress,
            win_line: None,
            last_xy: (0, 0),
            last_selected: Piece::null(),
            last_message: "default".to_string(),
            pool: PIECE_LABELS.iter().map(|label| Piece::new(label)).collect(),
        }
    }

    #[inline]
    pub fn board(&self) -> &Board {
        &self.board
    }

    #[inline]
    pub fn id(&self) -> &str {
        &self.id
    }

    #[inline]
    pub fn turn(&self) -> Player {
        self.turn
    }

    #[inline]
    pub fn stage(&self) -> Stage {
        self.stage
    }

    #[inline]
    pub fn status(&self) -> Status {
        self.status
    }

    /// The line kind that won the game, once terminal by victory.
    #[inline]
    pub fn win_line(&self) -> Option<Line> {
        self.win_line
    }

    /// Coordinates of the most recent placement.
    #[inline]
    pub fn last_xy(&self) -> (usize, usize) {
        self.last_xy
    }

    /// The piece currently handed to the player about to place.
    #[inline]
    pub fn last_selected(&self) -> &Piece {
        &self.last_selected
    }

    /// Opaque external reference token (e.g. the id of the last
    /// rendered message for this match).
    #[inline]
    pub fn last_message(&self) -> &str {
        &self.last_message
    }

    pub fn set_last_message(&mut self, token: impl Into<String>) {
        self.last_message = token.into();
    }

    /// Pieces not yet placed or handed over, in pool order.
    #[inline]
    pub fn pool(&self) -> &[Piece] {
        &self.pool
    }

    /// True iff the board has no empty cell.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.board.is_full()
    }

    /// Selection half-move: the player on turn hands `label` to the
    /// opponent. On success the piece leaves the pool, the stage moves
    /// to Placing and the turn flips - the opponent places what was
    /// chosen for them. A win at placement is therefore always credited
    /// to the placer, never the selector.
    pub fn select(&mut self, label: &str) -> SelectOutcome {
        debug_assert_eq!(self.stage, Stage::Selecting);
        if self.pool.is_empty() {
            self.status = Status::Draw;
            return SelectOutcome::PoolExhausted;
        }
        let Some(index) = self.pool.iter().position(|p| p.label() == label) else {
            return SelectOutcome::Unavailable;
        };
        self.last_selected = self.pool.remove(index);
        self.stage = Stage::Placing;
        self.turn = self.turn.opponent();
        SelectOutcome::Selected
    }

    /// Placement half-move: put the handed piece at (x, y). A winning
    /// placement makes the status terminal in favor of the current
    /// turn. A non-winning placement changes neither stage nor turn:
    /// the caller checks [`Game::is_full`] for the draw case and
    /// otherwise calls [`Game::begin_selection`].
    pub fn place(&mut self, x: usize, y: usize) -> Result<PlaceOutcome, GameError> {
        debug_assert_eq!(self.stage, Stage::Placing);
        let dim = self.board.dim();
        if x >= dim || y >= dim {
            return Err(GameError::OutOfRange { x, y, dim });
        }
        if !self.board.is_cell_free(x, y) {
            return Ok(PlaceOutcome::CellOccupied);
        }
        self.board.place(&self.last_selected, x, y)?;
        self.last_xy = (x, y);
        match self.board.check_victory(x, y)? {
            Some((line, shared)) => {
                self.status = Status::won_by(self.turn);
                self.win_line = Some(line);
                Ok(PlaceOutcome::Win { line, shared })
            }
            None => Ok(PlaceOutcome::Placed),
        }
    }

    /// Caller-protocol: return to the selection stage after a
    /// non-winning, non-filling placement. The turn stays with the
    /// player who just placed - they now pick a piece for the opponent.
    pub fn begin_selection(&mut self) {
        debug_assert_eq!(self.status, Status::InProgress);
        self.stage = Stage::Selecting;
    }

    /// Caller-protocol: declare the draw after a placement fills the
    /// board without a win. Placement itself never does this.
    pub fn declare_draw(&mut self) {
        debug_assert_eq!(self.status, Status::InProgress);
        self.status = Status::Draw;
    }

    /// Canonical text encoding of the full match state. See the crate
    /// docs for the grammar.
    pub fn to_text(&self) -> String {
        let mut out = self.board.to_text();
        out.push_str(&format!(
            "_ENDBRD_{}_{}_{}_{}",
            self.turn.code(),
            self.stage.code(),
            self.status.code(),
            self.win_line.map_or(0, Line::code),
        ));
        out.push_str(&format!("_{}_{}", self.last_xy.0, self.last_xy.1));
        out.push_str(&format!("_{}_{}", self.last_selected.label(), self.last_message));
        out.push_str(&format!("_{}", self.id));
        for piece in &self.pool {
            out.push('_');
            out.push_str(piece.label());
        }
        out
    }

    /// Inverse of [`Game::to_text`]. Remaining pieces are rebuilt from
    /// their labels, re-deriving each code from the trait encoding.
    pub fn from_text(text: &str) -> Result<Game, GameError> {
        let (board_text, rest) = text
            .split_once("_ENDBRD_")
            .ok_or_else(|| GameError::Malformed("missing _ENDBRD_ separator".into()))?;
        let board = Board::from_text(board_text)?;

        let fields: Vec<&str> = rest.split('_').collect();
        if fields.len() < 9 {
            return Err(GameError::Malformed(format!(
                "expected at least 9 game fields, got {}",
                fields.len()
            )));
        }

        let turn = Player::from_code(parse_field(fields[0], "turn")?)
            .ok_or_else(|| GameError::Malformed(format!("invalid turn: {}", fields[0])))?;
        let stage = Stage::from_code(parse_field(fields[1], "stage")?)
            .ok_or_else(|| GameError::Malformed(format!("invalid stage: {}", fields[1])))?;
        let status = Status::from_code(parse_field(fields[2], "status")?)
            .ok_or_else(|| GameError::Malformed(format!("invalid status: {}", fields[2])))?;
        let win_code: u8 = parse_field(fields[3], "win condition")?;
        let win_line = if win_code == 0 {
            None
        } else {
            Some(Line::from_code(win_code).ok_or_else(|| {
                GameError::Malformed(format!("invalid win condition: {win_code}"))
            })?)
        };
        let last_x: usize = parse_field(fields[4], "last x")?;
        let last_y: usize = parse_field(fields[5], "last y")?;

        let pool = fields[9..]
            .iter()
            .filter(|label| !label.is_empty())
            .map(|label| Piece::new(label))
            .collect();

        Ok(Game {
            board,
            id: fields[8].to_string(),
            turn,
            stage,
            status,
            win_line,
            last_xy: (last_x, last_y),
            last_selected: Piece::new(fields[6]),
            last_message: fields[7].to_string(),
            pool,
        })
    }
}

fn parse_field<T: std::str::FromStr>(field: &str, what: &str) -> Result<T, GameError> {
    field
        .parse()
        .map_err(|_| GameError::Malformed(format!("invalid {what}: {field:?}")))
}

// ============================================================================
// RATING
// ============================================================================

/// Elo K factor applied to every rating delta.
pub const RATING_K: f64 = 32.0;

/// Logistic win expectation between two ratings. The argument order and
/// sign convention are part of the wire contract; callers pair
/// `win_probability(a, b)` with `1 - win_probability(a, b)` for the
/// other side.
pub fn win_probability(rating_a: i64, rating_b: i64) -> f64 {
    1.0 / (1.0 + 10f64.powf((rating_a - rating_b) as f64 / 400.0))
}

/// Post-match rating. `won` contributes a score of 1, a loss 0; the
/// delta is ceiled toward positive infinity for both sides, so loss
/// deltas round toward zero. That asymmetry slightly favors the loser
/// and is part of the contract.
pub fn next_rating(current: i64, win_probability: f64, won: bool) -> i64 {
    let score = if won { 1.0 } else { 0.0 };
    current + (RATING_K * (score - win_probability)).ceil() as i64
}
