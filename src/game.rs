use crate::board::{BOARD_SIZE, Board, Counter, Shape, Side, Square, Strength};
use crate::error::{GameError, GameResult};
use crate::lifecycle::{self, Assignments, MIN_LIVE_COUNTERS, Reserve};
use crate::resolver::{self, Destruction};
use crate::resurrection;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Phase {
    Placement,
    StrengthAssignment,
    Play,
    GameOver { winner: Side },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    PlayerVsPlayer,
    PlayerVsCpu { cpu_side: Side },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameConfig {
    pub first_side: Side,
    pub mode: Mode,
}

impl Default for GameConfig {
    fn default() -> Self {
        GameConfig {
            first_side: Side::South,
            mode: Mode::PlayerVsCpu {
                cpu_side: Side::North,
            },
        }
    }
}

/// One command a side can submit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    Place { shape: Shape, square: Square },
    AssignStrength { shape: Shape, strength: Strength },
    Move { from: Square, to: Square },
    Resurrect { shape: Shape, target: Square },
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Action::Place { shape, square } => write!(f, "place {shape} on {square}"),
            Action::AssignStrength { shape, strength } => {
                write!(f, "{shape} {}", match strength {
                    Strength::Strong => "strong",
                    Strength::Weak => "weak",
                })
            }
            Action::Move { from, to } => write!(f, "{from} -> {to}"),
            Action::Resurrect { shape, target } => write!(f, "resurrect {shape} on {target}"),
        }
    }
}

/// Everything that happened, in order, for presentation layers to narrate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Placed { side: Side, shape: Shape, square: Square },
    StrengthAssigned { side: Side, shape: Shape, strength: Strength },
    Moved { side: Side, shape: Shape, from: Square, to: Square },
    Destroyed { side: Side, shape: Shape, square: Square },
    ForcedStrong { side: Side, shape: Shape, square: Square },
    Resurrected { side: Side, shape: Shape, square: Square },
    TurnPassed { side: Side },
    GameOver { winner: Side },
}

/// Where a counter currently is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Location {
    Unplaced,
    OnBoard(Square),
    Reserve,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CounterView {
    pub owner: Side,
    pub shape: Shape,
    /// `None` while the counter is off the board.
    pub strength: Option<Strength>,
    pub location: Location,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerSide<T> {
    pub south: T,
    pub north: T,
}

/// A read-only copy of the whole game for rendering.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub phase: Phase,
    pub active_side: Side,
    /// Rank-major, `board[rank][file]`.
    pub board: Vec<Vec<Option<Counter>>>,
    pub counters: Vec<CounterView>,
    /// Enemy counters each side has destroyed.
    pub destroyed: PerSide<usize>,
    pub action_count: usize,
    pub events: Vec<GameEvent>,
}

impl Snapshot {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// The turn engine. Owns the board and every counter, and is the only thing
/// that mutates them.
#[derive(Debug, Clone)]
pub struct GameState {
    config: GameConfig,
    phase: Phase,
    active: Side,
    board: Board,
    unplaced: [[bool; 3]; 2],
    assignments: Assignments,
    reserve: Reserve,
    destroyed_by: [usize; 2],
    action_count: usize,
    events: Vec<GameEvent>,
}

impl GameState {
    pub fn new(config: GameConfig) -> Self {
        GameState {
            config,
            phase: Phase::Placement,
            active: config.first_side,
            board: Board::new(),
            unplaced: [[true; 3]; 2],
            assignments: Assignments::new(),
            reserve: Reserve::new(),
            destroyed_by: [0; 2],
            action_count: 0,
            events: Vec::new(),
        }
    }

    pub fn config(&self) -> GameConfig {
        self.config
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn active_side(&self) -> Side {
        self.active
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn reserve(&self) -> &Reserve {
        &self.reserve
    }

    pub fn events(&self) -> &[GameEvent] {
        &self.events
    }

    /// Play-phase actions taken so far.
    pub fn action_count(&self) -> usize {
        self.action_count
    }

    pub fn winner(&self) -> Option<Side> {
        match self.phase {
            Phase::GameOver { winner } => Some(winner),
            _ => None,
        }
    }

    pub fn is_game_over(&self) -> bool {
        self.winner().is_some()
    }

    /// Whether the side to act is driven by the computer.
    pub fn is_cpu_turn(&self) -> bool {
        match self.config.mode {
            Mode::PlayerVsCpu { cpu_side } => !self.is_game_over() && cpu_side == self.active,
            Mode::PlayerVsPlayer => false,
        }
    }

    pub fn destroyed_by(&self, side: Side) -> usize {
        self.destroyed_by[side.index()]
    }

    /// Shapes `side` has yet to put on the board.
    pub fn remaining_placements(&self, side: Side) -> Vec<Shape> {
        Shape::ALL
            .into_iter()
            .filter(|&shape| self.unplaced[side.index()][shape.index()])
            .collect()
    }

    /// Squares `side` could place on now: empty, in its half, and sharing
    /// neither rank nor file with any counter already on the board.
    pub fn placement_squares(&self, side: Side) -> Vec<Square> {
        if self.phase != Phase::Placement {
            return Vec::new();
        }
        Square::all()
            .filter(|&sq| self.check_placement_square(side, sq).is_ok())
            .collect()
    }

    pub fn resurrection_targets(&self, side: Side) -> Vec<Square> {
        if self.phase != Phase::Play {
            return Vec::new();
        }
        resurrection::resurrection_targets(&self.board, &self.reserve, side)
    }

    pub fn can_resurrect(&self, side: Side) -> bool {
        self.phase == Phase::Play && resurrection::is_eligible(&self.board, &self.reserve, side)
    }

    fn check_turn(&self, side: Side, phase: Phase) -> GameResult<()> {
        if let Phase::GameOver { winner } = self.phase {
            return Err(GameError::IllegalAction(format!(
                "the game is over, {winner} won"
            )));
        }
        if self.phase != phase {
            return Err(GameError::IllegalAction(format!(
                "expected {:?} phase, game is in {:?}",
                phase, self.phase
            )));
        }
        if side != self.active {
            return Err(GameError::IllegalAction(format!(
                "it is {}'s turn, not {side}'s",
                self.active
            )));
        }
        Ok(())
    }

    fn check_placement_square(&self, side: Side, square: Square) -> GameResult<()> {
        if !side.owns_square(square) {
            return Err(GameError::IllegalPlacement(format!(
                "{square} is outside {side}'s half"
            )));
        }
        if self.board.is_occupied(square) {
            return Err(GameError::OccupiedSquare(square));
        }
        if let Some((other, _)) = self
            .board
            .counters()
            .find(|(sq, _)| sq.rank() == square.rank() || sq.file() == square.file())
        {
            return Err(GameError::IllegalPlacement(format!(
                "{square} shares a rank or file with {other}"
            )));
        }
        Ok(())
    }

    /// Submit any action for `side`.
    pub fn apply(&mut self, side: Side, action: Action) -> GameResult<Vec<GameEvent>> {
        match action {
            Action::Place { shape, square } => self.submit_placement(side, shape, square),
            Action::AssignStrength { shape, strength } => {
                self.submit_strength_assignment(side, shape, strength)
            }
            Action::Move { from, to } => self.submit_move(side, from, to),
            Action::Resurrect { shape, target } => self.submit_resurrection(side, shape, target),
        }
    }

    pub fn submit_placement(&mut self, side: Side, shape: Shape, square: Square) -> GameResult<Vec<GameEvent>> {
        self.check_turn(side, Phase::Placement)?;
        if !self.unplaced[side.index()][shape.index()] {
            return Err(GameError::IllegalAction(format!(
                "{side} has already placed its {shape}"
            )));
        }
        self.check_placement_square(side, square)?;

        let start = self.events.len();
        self.board
            .place(Counter::new(side, shape, Strength::Weak), square)?;
        self.unplaced[side.index()][shape.index()] = false;
        self.events.push(GameEvent::Placed {
            side,
            shape,
            square,
        });
        log::debug!("{side} placed {shape} on {square}");

        let other = side.opponent();
        if !self.remaining_placements(other).is_empty() {
            self.active = other;
        } else if self.remaining_placements(side).is_empty() {
            self.phase = Phase::StrengthAssignment;
            self.active = self.config.first_side;
        }
        self.check_invariants();
        Ok(self.events[start..].to_vec())
    }

    pub fn submit_strength_assignment(
        &mut self,
        side: Side,
        shape: Shape,
        strength: Strength,
    ) -> GameResult<Vec<GameEvent>> {
        self.check_turn(side, Phase::StrengthAssignment)?;

        let start = self.events.len();
        self.assignments
            .assign(&mut self.board, side, shape, strength)?;
        self.events.push(GameEvent::StrengthAssigned {
            side,
            shape,
            strength,
        });
        log::debug!("{side} set {shape} {strength:?}");

        if self.assignments.is_complete(side) {
            let other = side.opponent();
            if self.assignments.is_complete(other) {
                self.phase = Phase::Play;
                self.active = self.config.first_side;
                log::debug!("play begins, {} to act", self.active);
            } else {
                self.active = other;
            }
        }
        self.check_invariants();
        Ok(self.events[start..].to_vec())
    }

    pub fn submit_move(&mut self, side: Side, from: Square, to: Square) -> GameResult<Vec<GameEvent>> {
        self.check_turn(side, Phase::Play)?;

        let start = self.events.len();
        let counter = self.board.move_counter(side, from, to)?;
        self.events.push(GameEvent::Moved {
            side,
            shape: counter.shape,
            from,
            to,
        });
        log::debug!("{side} moved {} {from} -> {to}", counter.shape);

        self.finish_action(side);
        Ok(self.events[start..].to_vec())
    }

    pub fn submit_resurrection(
        &mut self,
        side: Side,
        shape: Shape,
        target: Square,
    ) -> GameResult<Vec<GameEvent>> {
        self.check_turn(side, Phase::Play)?;

        let start = self.events.len();
        lifecycle::resurrect(&mut self.board, &mut self.reserve, side, shape, target)?;
        self.events.push(GameEvent::Resurrected {
            side,
            shape,
            square: target,
        });

        self.finish_action(side);
        Ok(self.events[start..].to_vec())
    }

    /// Resolve attacks, check for a winner and hand the turn over.
    fn finish_action(&mut self, side: Side) {
        self.action_count += 1;

        let weak_before: Vec<Square> = self
            .board
            .counters()
            .filter(|(_, c)| !c.is_strong())
            .map(|(sq, _)| sq)
            .collect();

        let destroyed = resolver::resolve(&mut self.board, &mut self.reserve, side);
        for Destruction { square, counter } in &destroyed {
            self.destroyed_by[side.index()] += 1;
            self.events.push(GameEvent::Destroyed {
                side: counter.owner,
                shape: counter.shape,
                square: *square,
            });
        }
        for square in weak_before {
            if let Some(counter) = self.board.occupant(square) {
                if counter.is_strong() {
                    self.events.push(GameEvent::ForcedStrong {
                        side: counter.owner,
                        shape: counter.shape,
                        square,
                    });
                }
            }
        }

        let winner = (self.board.live_count(side.opponent()) < MIN_LIVE_COUNTERS).then_some(side);

        if let Some(winner) = winner {
            self.phase = Phase::GameOver { winner };
            self.events.push(GameEvent::GameOver { winner });
            log::info!("{winner} wins after {} actions", self.action_count);
        } else {
            self.active = side.opponent();
            if self.legal_actions().is_empty() {
                log::debug!("{} has no legal action and passes", self.active);
                self.events.push(GameEvent::TurnPassed { side: self.active });
                self.active = side;
            }
        }
        self.check_invariants();
    }

    /// Every action the side to act may submit, in a fixed order: by shape,
    /// then by square.
    pub fn legal_actions(&self) -> Vec<Action> {
        let side = self.active;
        match self.phase {
            Phase::GameOver { .. } => Vec::new(),
            Phase::Placement => {
                let squares = self.placement_squares(side);
                self.remaining_placements(side)
                    .into_iter()
                    .flat_map(|shape| {
                        squares
                            .iter()
                            .map(move |&square| Action::Place { shape, square })
                    })
                    .collect()
            }
            Phase::StrengthAssignment => self
                .assignments
                .pending(side)
                .into_iter()
                .flat_map(|shape| {
                    [Strength::Strong, Strength::Weak]
                        .into_iter()
                        .map(move |strength| (shape, strength))
                })
                .filter(|&(shape, strength)| {
                    self.assignments
                        .check(&self.board, side, shape, strength)
                        .is_ok()
                })
                .map(|(shape, strength)| Action::AssignStrength { shape, strength })
                .collect(),
            Phase::Play => {
                let mut pieces: Vec<(Square, Counter)> = self.board.counters_of(side).collect();
                pieces.sort_by_key(|(sq, c)| (c.shape, *sq));

                let mut actions: Vec<Action> = pieces
                    .into_iter()
                    .flat_map(|(from, _)| {
                        let mut targets: Vec<Square> = from
                            .neighbors()
                            .filter(|&to| !self.board.is_occupied(to))
                            .collect();
                        targets.sort();
                        targets.into_iter().map(move |to| Action::Move { from, to })
                    })
                    .collect();

                if let Some(shape) =
                    resurrection::eligible_shape(&self.board, &self.reserve, side)
                {
                    actions.extend(
                        resurrection::resurrection_targets(&self.board, &self.reserve, side)
                            .into_iter()
                            .map(|target| Action::Resurrect { shape, target }),
                    );
                }
                actions
            }
        }
    }

    pub fn counter_views(&self) -> Vec<CounterView> {
        let mut views = Vec::with_capacity(6);
        for side in Side::ALL {
            for shape in Shape::ALL {
                let view = if let Some(square) = self.board.find(side, shape) {
                    CounterView {
                        owner: side,
                        shape,
                        strength: self.board.occupant(square).map(|c| c.strength),
                        location: Location::OnBoard(square),
                    }
                } else if self.reserve.contains(side, shape) {
                    CounterView {
                        owner: side,
                        shape,
                        strength: None,
                        location: Location::Reserve,
                    }
                } else {
                    CounterView {
                        owner: side,
                        shape,
                        strength: None,
                        location: Location::Unplaced,
                    }
                };
                views.push(view);
            }
        }
        views
    }

    pub fn snapshot(&self) -> Snapshot {
        let board: Vec<Vec<Option<Counter>>> = (0..BOARD_SIZE)
            .map(|rank| {
                (0..BOARD_SIZE)
                    .map(|file| {
                        Square::new(file, rank)
                            .ok()
                            .and_then(|sq| self.board.occupant(sq))
                    })
                    .collect()
            })
            .collect();
        Snapshot {
            phase: self.phase,
            active_side: self.active,
            board,
            counters: self.counter_views(),
            destroyed: PerSide {
                south: self.destroyed_by(Side::South),
                north: self.destroyed_by(Side::North),
            },
            action_count: self.action_count,
            events: self.events.clone(),
        }
    }

    /// The board as text, with a status line naming the phase and the side to
    /// act, or the winner.
    pub fn display_board(&self) -> String {
        let mut out = self.board.render();
        match self.phase {
            Phase::GameOver { winner } => out.push_str(&format!("Game over: {winner} wins\n")),
            phase => out.push_str(&format!("{:?}, {} to act\n", phase, self.active)),
        }
        out
    }

    /// A game already in play with counters wherever a test wants them.
    /// Shapes not listed for a side are in its reserve.
    #[cfg(test)]
    pub(crate) fn in_play(active: Side, counters: &[(Side, Shape, Strength, &str)]) -> Self {
        let mut game = GameState::new(GameConfig {
            first_side: active,
            mode: Mode::PlayerVsPlayer,
        });
        game.phase = Phase::Play;
        game.unplaced = [[false; 3]; 2];
        for &(side, shape, strength, at) in counters {
            let square: Square = at.parse().unwrap();
            game.board.set(square, Some(Counter::new(side, shape, strength)));
        }
        for side in Side::ALL {
            for shape in Shape::ALL {
                if game.board.find(side, shape).is_none() {
                    game.reserve.insert(side, shape);
                }
            }
        }
        game
    }

    fn check_invariants(&self) {
        if !cfg!(debug_assertions) {
            return;
        }
        for side in Side::ALL {
            for shape in Shape::ALL {
                let homes = [
                    self.board.find(side, shape).is_some(),
                    self.reserve.contains(side, shape),
                    self.unplaced[side.index()][shape.index()],
                ];
                debug_assert_eq!(
                    homes.iter().filter(|&&h| h).count(),
                    1,
                    "{side} {shape} must be in exactly one place"
                );
            }
            if self.phase == Phase::Play && self.board.live_count(side) == MIN_LIVE_COUNTERS {
                debug_assert!(
                    self.board.counters_of(side).all(|(_, c)| c.is_strong()),
                    "{side} has two live counters that are not both strong"
                );
            }
        }
    }
}

impl Default for GameState {
    fn default() -> Self {
        Self::new(GameConfig::default())
    }
}
