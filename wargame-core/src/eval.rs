//! Position evaluation: heuristics e0, e1, e2
//!
//! All three score a state from the Attacker's viewpoint (positive favors
//! the Attacker). They are invoked only at leaf nodes of the search tree;
//! internal-node scores come from min/max propagation.

use crate::game::GameState;
use crate::units::{Player, UnitType, UNIT_TYPE_COUNT};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// e0's flat per-unit value for every ordinary unit type.
const E0_UNIT_VALUE: i64 = 3;

/// e0's value for an AI unit. Dwarfs everything else: losing the AI is
/// losing the game.
const E0_AI_VALUE: i64 = 9999;

/// The closed set of evaluation functions, dispatched by configuration.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Heuristic {
    /// Flat unit count difference.
    E0,
    /// Health-weighted unit values.
    E1,
    /// e1 plus Virus proximity, mobility, and optional noise.
    E2,
}

/// Weight coefficients for e1/e2, calibration data rather than fixed
/// constants. All values carry a x2 scale so half-point health
/// coefficients stay integral.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Weights {
    /// Base value per unit type (AI, Tech, Virus, Program, Firewall order).
    pub base_value: [i64; UNIT_TYPE_COUNT],
    /// Per-health-point value per unit type.
    pub health_value: [i64; UNIT_TYPE_COUNT],
    /// Numerator of the Virus-to-AI proximity bonus: weight / (distance + 1).
    pub proximity_weight: i64,
    /// Bonus per legal move (board flexibility).
    pub mobility_weight: i64,
    /// Bound of e2's random perturbation; a draw lands in [-bound, bound].
    pub noise_bound: i64,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            //           AI     Tech Virus Prog  Fire
            base_value: [19998, 40, 40, 20, 30],
            health_value: [0, 4, 4, 2, 3],
            proximity_weight: 200,
            mobility_weight: 4,
            noise_bound: 30,
        }
    }
}

impl Heuristic {
    /// Evaluate a state. `noise` feeds e2's bounded perturbation; passing
    /// `None` disables it entirely, which makes every heuristic a pure
    /// function of the state.
    pub fn evaluate(
        self,
        state: &GameState,
        weights: &Weights,
        noise: Option<&mut ChaCha8Rng>,
    ) -> i64 {
        match self {
            Heuristic::E0 => e0(state),
            Heuristic::E1 => e1(state, weights),
            Heuristic::E2 => e2(state, weights, noise),
        }
    }
}

/// Flat per-unit-type sum, Attacker minus Defender. No positional or
/// health weighting.
fn e0(state: &GameState) -> i64 {
    side_sum_flat(state, Player::Attacker) - side_sum_flat(state, Player::Defender)
}

fn side_sum_flat(state: &GameState, player: Player) -> i64 {
    state
        .player_units(player)
        .map(|(_, unit)| match unit.unit_type {
            UnitType::Ai => E0_AI_VALUE,
            _ => E0_UNIT_VALUE,
        })
        .sum()
}

/// Health-weighted unit values, Attacker minus Defender.
fn e1(state: &GameState, weights: &Weights) -> i64 {
    side_sum_weighted(state, Player::Attacker, weights)
        - side_sum_weighted(state, Player::Defender, weights)
}

fn side_sum_weighted(state: &GameState, player: Player, weights: &Weights) -> i64 {
    state
        .player_units(player)
        .map(|(_, unit)| {
            let t = unit.unit_type as usize;
            weights.base_value[t] + weights.health_value[t] * unit.health as i64
        })
        .sum()
}

/// e1 plus three additions: a Virus-to-enemy-AI proximity bonus (felt
/// positively by the Attacker and as a threat by the Defender), a mobility
/// bonus per legal move for each side, and a bounded perturbation to break
/// repetition cycles in self-play.
fn e2(state: &GameState, weights: &Weights, noise: Option<&mut ChaCha8Rng>) -> i64 {
    let mut score = e1(state, weights);

    score += proximity_bonus(state, weights);

    score += weights.mobility_weight
        * (state.mobility(Player::Attacker) as i64 - state.mobility(Player::Defender) as i64);

    if let Some(rng) = noise {
        if weights.noise_bound > 0 {
            score += rng.gen_range(-weights.noise_bound..=weights.noise_bound);
        }
    }

    score
}

/// Each Attacker Virus near the Defender AI is worth `w/(d+1)` to the
/// Attacker and the same again as a threat discount on the Defender side.
fn proximity_bonus(state: &GameState, weights: &Weights) -> i64 {
    let defender_ai = match state.ai_position(Player::Defender) {
        Some(coord) => coord,
        None => return 0,
    };

    state
        .player_units(Player::Attacker)
        .filter(|(_, unit)| unit.unit_type == UnitType::Virus)
        .map(|(coord, _)| {
            let dist = coord.euclidean_distance_to(defender_ai);
            let bonus = (weights.proximity_weight as f64 / (dist + 1.0)).round() as i64;
            2 * bonus
        })
        .sum()
}

/// Static sibling-ordering estimate for alpha-beta: e2's deterministic
/// terms without the mobility scan, cheap enough to compute per node at
/// tree-build time.
pub fn order_estimate(state: &GameState, weights: &Weights) -> i64 {
    e1(state, weights) + proximity_bonus(state, weights)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::Coord;
    use crate::units::Unit;
    use rand::SeedableRng;

    fn duel(attacker_type: UnitType, defender_type: UnitType) -> GameState {
        let units = [
            (Coord::new(4, 4), Unit::new(Player::Attacker, attacker_type)),
            (Coord::new(0, 0), Unit::new(Player::Defender, defender_type)),
        ];
        GameState::from_units(5, Player::Attacker, &units)
    }

    #[test]
    fn test_e0_balanced_board() {
        let game = GameState::standard();
        assert_eq!(Heuristic::E0.evaluate(&game, &Weights::default(), None), 0);
    }

    #[test]
    fn test_e0_counts_units_flat() {
        let game = duel(UnitType::Virus, UnitType::Program);
        assert_eq!(Heuristic::E0.evaluate(&game, &Weights::default(), None), 0);

        let game = duel(UnitType::Ai, UnitType::Program);
        assert_eq!(
            Heuristic::E0.evaluate(&game, &Weights::default(), None),
            E0_AI_VALUE - E0_UNIT_VALUE
        );
    }

    #[test]
    fn test_e1_health_weighted() {
        let w = Weights::default();
        let full = duel(UnitType::Virus, UnitType::Virus);
        assert_eq!(Heuristic::E1.evaluate(&full, &w, None), 0);

        let units = [
            (
                Coord::new(4, 4),
                Unit::with_health(Player::Attacker, UnitType::Virus, 9),
            ),
            (
                Coord::new(0, 0),
                Unit::with_health(Player::Defender, UnitType::Virus, 5),
            ),
        ];
        let hurt = GameState::from_units(5, Player::Attacker, &units);
        // 4 health points of difference at weight 4
        assert_eq!(Heuristic::E1.evaluate(&hurt, &w, None), 16);
    }

    #[test]
    fn test_e2_virus_closer_is_better() {
        let w = Weights::default();
        let far = [
            (
                Coord::new(4, 4),
                Unit::new(Player::Attacker, UnitType::Virus),
            ),
            (Coord::new(0, 0), Unit::new(Player::Defender, UnitType::Ai)),
        ];
        let near = [
            (
                Coord::new(1, 1),
                Unit::new(Player::Attacker, UnitType::Virus),
            ),
            (Coord::new(0, 0), Unit::new(Player::Defender, UnitType::Ai)),
        ];
        let far = GameState::from_units(5, Player::Attacker, &far);
        let near = GameState::from_units(5, Player::Attacker, &near);
        assert!(
            Heuristic::E2.evaluate(&near, &w, None) > Heuristic::E2.evaluate(&far, &w, None)
        );
    }

    #[test]
    fn test_e2_noise_is_bounded_and_seeded() {
        let w = Weights::default();
        let game = GameState::standard();
        let silent = Heuristic::E2.evaluate(&game, &w, None);

        let mut rng = ChaCha8Rng::seed_from_u64(7);
        for _ in 0..100 {
            let noisy = Heuristic::E2.evaluate(&game, &w, Some(&mut rng));
            assert!((noisy - silent).abs() <= w.noise_bound);
        }
    }

    #[test]
    fn test_order_estimate_deterministic() {
        let w = Weights::default();
        let game = GameState::standard();
        assert_eq!(order_estimate(&game, &w), order_estimate(&game, &w));
    }
}
