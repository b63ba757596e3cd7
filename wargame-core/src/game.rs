//! Game state, rule enforcement, and move-candidate generation

use crate::board::Coord;
use crate::units::{Player, Unit, UnitType};
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Default board dimension.
pub const DEFAULT_DIM: i8 = 5;

/// Default turn limit; when reached the Defender wins.
pub const DEFAULT_MAX_TURNS: u16 = 100;

/// Blast damage dealt to every surrounding cell by a self-destruct.
const SELF_DESTRUCT_DAMAGE: i8 = 2;

// ============================================================================
// MOVES
// ============================================================================

/// A unit action. Only ever produced by candidate generation for a specific
/// state, so a `Move` in flight is legal for the state that generated it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Move {
    /// Step to an empty adjacent cell.
    Movement { from: Coord, to: Coord },
    /// Attack an adjacent enemy unit (damage is mutual).
    Attack { from: Coord, target: Coord },
    /// Repair an adjacent damaged friendly unit.
    Repair { from: Coord, target: Coord },
    /// Destroy self, damaging all 8 surrounding cells.
    SelfDestruct { at: Coord },
}

impl Move {
    /// The coordinate of the acting unit.
    pub fn source(&self) -> Coord {
        match *self {
            Move::Movement { from, .. } => from,
            Move::Attack { from, .. } => from,
            Move::Repair { from, .. } => from,
            Move::SelfDestruct { at } => at,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Move::Movement { from, to } => write!(f, "move {} {}", from, to),
            Move::Attack { from, target } => write!(f, "attack {} {}", from, target),
            Move::Repair { from, target } => write!(f, "repair {} {}", from, target),
            Move::SelfDestruct { at } => write!(f, "self-destruct {}", at),
        }
    }
}

// ============================================================================
// ERRORS
// ============================================================================

/// Rule-engine errors.
#[derive(Debug, thiserror::Error)]
pub enum GameError {
    /// `apply` was handed a move that candidate generation would not produce
    /// for this state. Indicates a logic defect upstream, never recovered.
    #[error("illegal move `{mv}`: {reason}")]
    IllegalMove { mv: Move, reason: &'static str },
}

// ============================================================================
// GAME STATE
// ============================================================================

/// Immutable-per-node snapshot of the board. `apply` produces a new state;
/// an existing state is never edited in place.
#[derive(Clone, Debug)]
pub struct GameState {
    /// Board: coord -> unit (sparse representation).
    board: FxHashMap<Coord, Unit>,

    /// Board dimension (dim x dim square).
    dim: i8,

    /// Player whose turn it is.
    to_move: Player,

    /// Completed half-turns.
    turns_played: u16,

    /// Turn limit; `None` means unlimited.
    max_turns: Option<u16>,

    /// AI survival flags, flipped when an AI unit dies.
    attacker_ai_alive: bool,
    defender_ai_alive: bool,
}

impl GameState {
    // ========================================================================
    // CONSTRUCTORS
    // ========================================================================

    /// Standard 5x5 opening layout: Defender clustered in the top-left
    /// corner, Attacker in the bottom-right.
    pub fn standard() -> Self {
        use UnitType::*;
        let d = DEFAULT_DIM - 1;
        let units = [
            (Coord::new(0, 0), Unit::new(Player::Defender, Ai)),
            (Coord::new(1, 0), Unit::new(Player::Defender, Tech)),
            (Coord::new(0, 1), Unit::new(Player::Defender, Tech)),
            (Coord::new(2, 0), Unit::new(Player::Defender, Firewall)),
            (Coord::new(0, 2), Unit::new(Player::Defender, Firewall)),
            (Coord::new(1, 1), Unit::new(Player::Defender, Program)),
            (Coord::new(d, d), Unit::new(Player::Attacker, Ai)),
            (Coord::new(d - 1, d), Unit::new(Player::Attacker, Virus)),
            (Coord::new(d, d - 1), Unit::new(Player::Attacker, Virus)),
            (Coord::new(d - 2, d), Unit::new(Player::Attacker, Program)),
            (Coord::new(d, d - 2), Unit::new(Player::Attacker, Program)),
            (Coord::new(d - 1, d - 1), Unit::new(Player::Attacker, Firewall)),
        ];
        Self::from_units(DEFAULT_DIM, Player::Attacker, &units).with_max_turns(DEFAULT_MAX_TURNS)
    }

    /// Build an arbitrary board, mainly for tests and scenarios. Coordinates
    /// outside the board or duplicated are a caller bug; last write wins.
    pub fn from_units(dim: i8, to_move: Player, units: &[(Coord, Unit)]) -> Self {
        let mut board = FxHashMap::default();
        for &(coord, unit) in units {
            board.insert(coord, unit);
        }
        Self {
            board,
            dim,
            to_move,
            turns_played: 0,
            max_turns: None,
            attacker_ai_alive: true,
            defender_ai_alive: true,
        }
    }

    pub fn with_max_turns(mut self, max_turns: u16) -> Self {
        self.max_turns = Some(max_turns);
        self
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    pub fn dim(&self) -> i8 {
        self.dim
    }

    pub fn to_move(&self) -> Player {
        self.to_move
    }

    pub fn turns_played(&self) -> u16 {
        self.turns_played
    }

    pub fn unit_at(&self, coord: Coord) -> Option<&Unit> {
        self.board.get(&coord)
    }

    pub fn is_valid_coord(&self, coord: Coord) -> bool {
        coord.row >= 0 && coord.row < self.dim && coord.col >= 0 && coord.col < self.dim
    }

    fn is_empty(&self, coord: Coord) -> bool {
        !self.board.contains_key(&coord)
    }

    /// Iterate all units of one player.
    pub fn player_units(&self, player: Player) -> impl Iterator<Item = (Coord, &Unit)> + '_ {
        self.board
            .iter()
            .filter(move |(_, unit)| unit.player == player)
            .map(|(&coord, unit)| (coord, unit))
    }

    /// Unit count for one player (derived total).
    pub fn unit_count(&self, player: Player) -> usize {
        self.player_units(player).count()
    }

    /// Health sum for one player (derived total).
    pub fn health_sum(&self, player: Player) -> u32 {
        self.player_units(player)
            .map(|(_, unit)| unit.health as u32)
            .sum()
    }

    /// Position of a player's AI unit, if it is still on the board.
    pub fn ai_position(&self, player: Player) -> Option<Coord> {
        self.player_units(player)
            .find(|(_, unit)| unit.unit_type == UnitType::Ai)
            .map(|(coord, _)| coord)
    }

    // ========================================================================
    // TERMINAL CONDITIONS
    // ========================================================================

    /// Winner, if the game is over. Losing the AI loses the game; exhausting
    /// the turn limit hands the win to the Defender.
    pub fn winner(&self) -> Option<Player> {
        if let Some(max) = self.max_turns {
            if self.turns_played >= max {
                return Some(Player::Defender);
            }
        }
        if !self.attacker_ai_alive {
            return Some(Player::Defender);
        }
        if !self.defender_ai_alive {
            return Some(Player::Attacker);
        }
        None
    }

    pub fn is_terminal(&self) -> bool {
        self.winner().is_some()
    }

    // ========================================================================
    // MOVE CANDIDATE GENERATION
    // ========================================================================

    /// Legal actions for the unit at `coord`, under its owner's rules. A
    /// unit with nothing to do contributes zero candidates; that is not an
    /// error.
    pub fn legal_unit_actions(&self, coord: Coord) -> Vec<Move> {
        let unit = match self.board.get(&coord) {
            Some(u) => u,
            None => return vec![],
        };

        let mut moves = Vec::new();
        let engaged = self.is_engaged_in_combat(coord, unit.player);

        for dst in coord.adjacent() {
            if !self.is_valid_coord(dst) {
                continue;
            }

            match self.board.get(&dst) {
                None => {
                    if self.can_step(unit, coord, dst, engaged) {
                        moves.push(Move::Movement { from: coord, to: dst });
                    }
                }
                Some(occupant) if occupant.player != unit.player => {
                    moves.push(Move::Attack {
                        from: coord,
                        target: dst,
                    });
                }
                Some(friendly) => {
                    if unit.repair_on(friendly) > 0 {
                        moves.push(Move::Repair {
                            from: coord,
                            target: dst,
                        });
                    }
                }
            }
        }

        // Self-destruct only in combat
        if engaged {
            moves.push(Move::SelfDestruct { at: coord });
        }

        moves
    }

    /// Full candidate set for the player to move. An empty result means the
    /// mover has no continuation (forfeits, per the terminal rules).
    pub fn move_candidates(&self) -> Vec<Move> {
        self.move_candidates_for(self.to_move)
    }

    /// Candidate set for an arbitrary player, used by the mobility bonus.
    pub fn move_candidates_for(&self, player: Player) -> Vec<Move> {
        let mut coords: Vec<Coord> = self
            .player_units(player)
            .map(|(coord, _)| coord)
            .collect();
        // Hash-map iteration order is not stable; candidate order must be.
        coords.sort_unstable();

        let mut moves = Vec::new();
        for coord in coords {
            moves.extend(self.legal_unit_actions(coord));
        }
        moves
    }

    /// Legal move count for a player, the board-flexibility measure.
    pub fn mobility(&self, player: Player) -> usize {
        self.player_units(player)
            .map(|(coord, _)| self.legal_unit_actions(coord).len())
            .sum()
    }

    fn is_engaged_in_combat(&self, coord: Coord, player: Player) -> bool {
        coord.adjacent().any(|adj| {
            self.board
                .get(&adj)
                .map_or(false, |unit| unit.player != player)
        })
    }

    /// Movement restrictions: Tech and Virus step freely; AI, Firewall and
    /// Program may not step while engaged in combat and are direction-locked
    /// (Attacker's only advance up/left, Defender's only down/right).
    fn can_step(&self, unit: &Unit, from: Coord, to: Coord, engaged: bool) -> bool {
        match unit.unit_type {
            UnitType::Tech | UnitType::Virus => true,
            UnitType::Ai | UnitType::Program | UnitType::Firewall => {
                if engaged {
                    return false;
                }
                match unit.player {
                    Player::Attacker => to.row <= from.row && to.col <= from.col,
                    Player::Defender => to.row >= from.row && to.col >= from.col,
                }
            }
        }
    }

    // ========================================================================
    // APPLY
    // ========================================================================

    /// Apply a move, returning the successor state with the turn flipped.
    /// Legality is re-checked even though generated candidates are legal by
    /// construction; a failure here means a defect in candidate generation.
    pub fn apply(&self, mv: Move) -> Result<GameState, GameError> {
        let src = mv.source();
        let unit = self.board.get(&src).ok_or(GameError::IllegalMove {
            mv,
            reason: "no unit at source",
        })?;
        if unit.player != self.to_move {
            return Err(GameError::IllegalMove {
                mv,
                reason: "unit does not belong to the player to move",
            });
        }
        if !self.legal_unit_actions(src).contains(&mv) {
            return Err(GameError::IllegalMove {
                mv,
                reason: "not produced by candidate generation for this state",
            });
        }

        let mut next = self.clone();
        match mv {
            Move::Movement { from, to } => {
                let unit = next.board.remove(&from).expect("validated above");
                next.board.insert(to, unit);
            }
            Move::Attack { from, target } => next.resolve_attack(from, target),
            Move::Repair { from, target } => next.resolve_repair(from, target),
            Move::SelfDestruct { at } => next.resolve_self_destruct(at),
        }

        next.to_move = next.to_move.opponent();
        next.turns_played += 1;
        Ok(next)
    }

    /// Combat is mutual: both sides take table damage simultaneously.
    fn resolve_attack(&mut self, from: Coord, target: Coord) {
        let attacker = self.board[&from];
        let defender = self.board[&target];
        let outgoing = attacker.damage_against(&defender);
        let incoming = defender.damage_against(&attacker);
        self.damage_unit(target, outgoing as i8);
        self.damage_unit(from, incoming as i8);
    }

    fn resolve_repair(&mut self, from: Coord, target: Coord) {
        let source = self.board[&from];
        let patient = self.board[&target];
        let amount = source.repair_on(&patient);
        if let Some(unit) = self.board.get_mut(&target) {
            unit.mod_health(amount as i8);
        }
    }

    fn resolve_self_destruct(&mut self, at: Coord) {
        let own_health = self.board[&at].health;
        self.damage_unit(at, own_health as i8);
        for blast in at.surrounding() {
            if self.is_valid_coord(blast) && !self.is_empty(blast) {
                self.damage_unit(blast, SELF_DESTRUCT_DAMAGE);
            }
        }
    }

    fn damage_unit(&mut self, coord: Coord, amount: i8) {
        let dead = match self.board.get_mut(&coord) {
            Some(unit) => {
                unit.mod_health(-amount);
                !unit.is_alive()
            }
            None => false,
        };
        if dead {
            let unit = self.board.remove(&coord).expect("checked above");
            if unit.unit_type == UnitType::Ai {
                match unit.player {
                    Player::Attacker => self.attacker_ai_alive = false,
                    Player::Defender => self.defender_ai_alive = false,
                }
            }
        }
    }
}

impl fmt::Display for GameState {
    /// Pretty board grid for logs and the CLI.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Next player: {:?}", self.to_move)?;
        writeln!(f, "Turns played: {}", self.turns_played)?;
        write!(f, "    ")?;
        for col in 0..self.dim {
            write!(f, "{:^4}", col)?;
        }
        writeln!(f)?;
        for row in 0..self.dim {
            write!(f, "{}:  ", (b'A' + row as u8) as char)?;
            for col in 0..self.dim {
                match self.board.get(&Coord::new(row, col)) {
                    Some(unit) => write!(f, "{:^4}", unit.to_string())?,
                    None => write!(f, " .  ")?,
                }
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
