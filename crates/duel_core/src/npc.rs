//! NPC decision policy and named opponent templates.

use serde::{Deserialize, Serialize};

use crate::action::{ActionKind, MAGIC_MANA_COST};
use crate::dice::Dice;
use crate::participant::{CombatParticipant, ParticipantId};

/// Lowest requestable difficulty.
pub const MIN_DIFFICULTY: u32 = 1;

/// Highest requestable difficulty.
pub const MAX_DIFFICULTY: u32 = 10;

/// A named opponent with its default level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct NpcTemplate {
    /// Display name.
    pub name: &'static str,
    /// Default level.
    pub level: u32,
}

/// Built-in opponents, weakest first.
pub const TEMPLATES: [NpcTemplate; 10] = [
    NpcTemplate { name: "Training Dummy", level: 1 },
    NpcTemplate { name: "Goblin", level: 2 },
    NpcTemplate { name: "Bandit", level: 3 },
    NpcTemplate { name: "Wolf Pack", level: 4 },
    NpcTemplate { name: "Dark Knight", level: 5 },
    NpcTemplate { name: "Troll", level: 6 },
    NpcTemplate { name: "Dragon Whelp", level: 7 },
    NpcTemplate { name: "Necromancer", level: 8 },
    NpcTemplate { name: "Ancient Guardian", level: 9 },
    NpcTemplate { name: "Dragon Lord", level: 10 },
];

/// Pick the NPC's action; the target is always the sole opponent.
///
/// Attack if physical damage beats magical damage, otherwise cast while mana
/// lasts, then fall back to attacking.
#[must_use]
pub fn select_action(
    npc: &CombatParticipant,
    opponent: &ParticipantId,
) -> (ActionKind, ParticipantId) {
    let action = if npc.physical_damage > npc.magical_damage {
        ActionKind::Attack
    } else if npc.current_mp() >= MAGIC_MANA_COST {
        ActionKind::Magic
    } else {
        ActionKind::Attack
    };
    (action, opponent.clone())
}

/// Look up a template by exact name.
#[must_use]
pub fn template(name: &str) -> Option<&'static NpcTemplate> {
    TEMPLATES.iter().find(|t| t.name == name)
}

/// Level for a named NPC.
///
/// A known name uses `custom_difficulty` when one is given, else its
/// template level. Unknown names are level 1.
#[must_use]
pub fn npc_level(name: &str, custom_difficulty: Option<u32>) -> u32 {
    match template(name) {
        Some(t) => custom_difficulty.filter(|d| *d > 0).unwrap_or(t.level),
        None => MIN_DIFFICULTY,
    }
}

/// Normalize a requested difficulty: anything outside 1..=10 becomes 1.
#[must_use]
pub fn clamp_difficulty(requested: i64) -> u32 {
    u32::try_from(requested)
        .ok()
        .filter(|d| (MIN_DIFFICULTY..=MAX_DIFFICULTY).contains(d))
        .unwrap_or(MIN_DIFFICULTY)
}

/// Build an NPC participant from a template name and optional difficulty.
#[must_use]
pub fn spawn(name: &str, custom_difficulty: Option<u32>, dice: &mut dyn Dice) -> CombatParticipant {
    let level = npc_level(name, custom_difficulty);
    tracing::debug!(npc = name, level, "Spawning NPC");
    CombatParticipant::npc(name, level, dice)
}

/// Pick a random template.
pub fn random_template(dice: &mut dyn Dice) -> &'static NpcTemplate {
    &TEMPLATES[dice.pick(TEMPLATES.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dice::ScriptedDice;
    use crate::element::Element;
    use crate::stats::CombatStats;

    fn npc(physical: u32, magical: u32, mp: u32) -> CombatParticipant {
        CombatParticipant::new(
            ParticipantId::new("npc_test"),
            "Bot",
            true,
            CombatStats {
                max_hp: 100,
                max_mp: mp,
                physical_damage: physical,
                magical_damage: magical,
                ..CombatStats::default()
            },
            Element::None,
        )
    }

    #[test]
    fn test_policy_prefers_stronger_physical() {
        let foe = ParticipantId::new("foe");
        assert_eq!(select_action(&npc(100, 50, 100), &foe), (ActionKind::Attack, foe.clone()));
    }

    #[test]
    fn test_policy_casts_when_magic_is_not_weaker() {
        let foe = ParticipantId::new("foe");
        assert_eq!(select_action(&npc(50, 50, 15), &foe).0, ActionKind::Magic);
        assert_eq!(select_action(&npc(50, 80, 100), &foe).0, ActionKind::Magic);
    }

    #[test]
    fn test_policy_falls_back_without_mana() {
        let foe = ParticipantId::new("foe");
        assert_eq!(select_action(&npc(50, 80, 14), &foe).0, ActionKind::Attack);
    }

    #[test]
    fn test_npc_level() {
        assert_eq!(npc_level("Troll", None), 6);
        assert_eq!(npc_level("Troll", Some(9)), 9);
        assert_eq!(npc_level("Troll", Some(0)), 6);
        assert_eq!(npc_level("Unicorn", Some(9)), 1);
    }

    #[test]
    fn test_clamp_difficulty() {
        assert_eq!(clamp_difficulty(5), 5);
        assert_eq!(clamp_difficulty(10), 10);
        assert_eq!(clamp_difficulty(0), 1);
        assert_eq!(clamp_difficulty(11), 1);
        assert_eq!(clamp_difficulty(-3), 1);
    }

    #[test]
    fn test_spawn() {
        let mut dice = ScriptedDice::new([1]);
        let dragon = spawn("Dragon Lord", None, &mut dice);
        assert!(dragon.is_npc);
        assert_eq!(dragon.name, "Dragon Lord");
        assert_eq!(dragon.element, Element::Water);
        // level 10 -> base 100
        assert_eq!(dragon.max_hp(), 1000);
    }

    #[test]
    fn test_random_template() {
        let mut dice = ScriptedDice::new([9]);
        assert_eq!(random_template(&mut dice).name, "Dragon Lord");
    }
}
