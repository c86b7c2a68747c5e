//! Single seeded NPC-vs-NPC duel.
//!
//! Both sides are NPCs, so every turn is chosen by the NPC policy and the
//! whole duel depends only on the seed and the two levels.

use duel_core::battle::{Battle, BattleState};
use duel_core::dice::{Dice, SeededDice};
use duel_core::element::Element;
use duel_core::npc;
use duel_core::participant::{CombatParticipant, ParticipantId};
use duel_core::stats::CombatStats;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Default turn cap for one duel.
pub const DEFAULT_MAX_TURNS: u32 = 500;

const CHANNEL: &str = "headless";
const SIDE_A_ID: &str = "npc_side_a";
const SIDE_B_ID: &str = "npc_side_b";

/// Which side of a duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DuelSide {
    /// First configured side.
    A,
    /// Second configured side.
    B,
}

/// Parameters for one duel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DuelConfig {
    /// Dice seed.
    pub seed: u64,
    /// NPC level of side A.
    pub level_a: u32,
    /// NPC level of side B.
    pub level_b: u32,
    /// Turns processed before the duel is called a stalemate.
    pub max_turns: u32,
}

impl Default for DuelConfig {
    fn default() -> Self {
        Self {
            seed: 0,
            level_a: 1,
            level_b: 1,
            max_turns: DEFAULT_MAX_TURNS,
        }
    }
}

impl DuelConfig {
    /// Duel between two levels with the default turn cap.
    #[must_use]
    pub fn new(seed: u64, level_a: u32, level_b: u32) -> Self {
        Self {
            seed,
            level_a,
            level_b,
            ..Self::default()
        }
    }

    /// Same duel with a different seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }
}

/// How a duel ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuelOutcome {
    /// Dice seed.
    pub seed: u64,
    /// Levels of sides A and B.
    pub levels: [u32; 2],
    /// Elements drawn for sides A and B.
    pub elements: [Element; 2],
    /// Which side moved first.
    pub first_mover: DuelSide,
    /// Winner, or `None` when the turn cap was hit.
    pub winner: Option<DuelSide>,
    /// Turns processed.
    pub turns: u32,
    /// Round counter at the end.
    pub rounds: u32,
    /// Remaining HP of sides A and B.
    pub final_hp: [u32; 2],
    /// Hash of the final snapshot.
    pub state_hash: u64,
    /// Full combat log. Dropped from batch results.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub log: Vec<String>,
}

impl DuelOutcome {
    /// Whether the duel was stopped by the turn cap.
    #[must_use]
    pub fn capped(&self) -> bool {
        self.winner.is_none()
    }

    /// Copy without the combat log.
    #[must_use]
    pub fn without_log(mut self) -> Self {
        self.log = Vec::new();
        self
    }
}

/// Display name for an NPC level: the template at that level, if any.
#[must_use]
pub fn side_name(level: u32) -> String {
    npc::TEMPLATES
        .iter()
        .find(|t| t.level == level)
        .map_or_else(|| format!("Level {level} Brawler"), |t| t.name.to_string())
}

fn side(id: &str, level: u32, dice: &mut dyn Dice) -> CombatParticipant {
    let pool = Element::NPC_POOL;
    let element = pool[dice.pick(pool.len())];
    CombatParticipant::new(
        ParticipantId::new(id),
        side_name(level),
        true,
        CombatStats::for_npc_level(level),
        element,
    )
}

/// Run one duel to completion or to the turn cap.
pub fn run_duel(config: &DuelConfig) -> Result<DuelOutcome> {
    let mut dice = SeededDice::new(config.seed);
    let a = side(SIDE_A_ID, config.level_a, &mut dice);
    let b = side(SIDE_B_ID, config.level_b, &mut dice);
    let elements = [a.element, b.element];
    let id_a = a.id.clone();
    let id_b = b.id.clone();

    let mut battle = Battle::new(CHANNEL, a, b, Box::new(dice))?;
    battle.start()?;
    let first_mover = side_of(battle.current_turn());

    let mut turns = 0;
    while battle.state() == BattleState::Ongoing && turns < config.max_turns {
        battle.process_turn()?;
        turns += 1;
    }

    let winner = battle.winner().map(side_of);
    if winner.is_none() {
        tracing::warn!(
            seed = config.seed,
            turns,
            "Duel hit the turn cap without a winner"
        );
    }

    let hp = |id: &ParticipantId| battle.participant(id).map_or(0, CombatParticipant::current_hp);
    let outcome = DuelOutcome {
        seed: config.seed,
        levels: [config.level_a, config.level_b],
        elements,
        first_mover,
        winner,
        turns,
        rounds: battle.round(),
        final_hp: [hp(&id_a), hp(&id_b)],
        state_hash: battle.snapshot().state_hash(),
        log: battle.log().to_vec(),
    };

    tracing::debug!(
        seed = outcome.seed,
        winner = ?outcome.winner,
        turns = outcome.turns,
        "Duel finished"
    );
    Ok(outcome)
}

fn side_of(id: &ParticipantId) -> DuelSide {
    if id.as_str() == SIDE_A_ID {
        DuelSide::A
    } else {
        DuelSide::B
    }
}
