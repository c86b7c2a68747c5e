//! Character sheets and combat stat projection.
//!
//! A stored character carries seven attributes. Before a battle they are
//! capped at [`MAX_STAT_VALUE`] and projected into combat numbers with fixed
//! linear ratios. NPCs skip the sheet and derive every stat from a single
//! level-scaled base value.

use serde::{Deserialize, Serialize};

use crate::element::Element;

/// Maximum value for any attribute.
pub const MAX_STAT_VALUE: u32 = 300;

/// 1 Vitality = 10 HP.
pub const VITALITY_TO_HP: u32 = 10;
/// 1 Mana = 10 MP.
pub const MANA_TO_MP: u32 = 10;
/// 1 Strength = 10 physical damage.
pub const STRENGTH_TO_DAMAGE: u32 = 10;
/// 1 Intelligence = 10 magical damage.
pub const INTELLIGENCE_TO_DAMAGE: u32 = 10;
/// 1 Durability = 10 defense.
pub const DURABILITY_TO_DEFENSE: u32 = 10;
/// 1 Speed = 10 initiative.
pub const SPEED_TO_INITIATIVE: u32 = 10;
/// Mastery accuracy ratio, applied as `mastery * ratio / 10`.
pub const MASTERY_TO_ACCURACY: u32 = 10;

/// Base hit chance, in percent.
pub const BASE_ACCURACY: u32 = 70;
/// Base dodge chance, in percent.
pub const BASE_DODGE_CHANCE: u32 = 5;
/// Dodge chance ceiling, in percent.
pub const MAX_DODGE_CHANCE: u32 = 30;

/// NPC base value at level 0.
pub const NPC_BASE_VALUE: u32 = 50;
/// NPC base value gained per level.
pub const NPC_VALUE_PER_LEVEL: u32 = 5;

/// A stored character's attribute sheet.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CharacterSheet {
    /// Health attribute.
    pub vitality: u32,
    /// Defense attribute.
    pub durability: u32,
    /// Initiative and dodge attribute.
    pub speed: u32,
    /// Physical damage attribute.
    pub strength: u32,
    /// Magical damage attribute.
    pub intelligence: u32,
    /// Mana pool attribute.
    pub mana: u32,
    /// Accuracy attribute.
    pub mastery: u32,
    /// Elemental affinity.
    #[serde(default)]
    pub element: Element,
}

impl CharacterSheet {
    /// Sheet with every attribute at the same value.
    #[must_use]
    pub const fn uniform(value: u32, element: Element) -> Self {
        Self {
            vitality: value,
            durability: value,
            speed: value,
            strength: value,
            intelligence: value,
            mana: value,
            mastery: value,
            element,
        }
    }

    /// Copy of the sheet with every attribute clamped to [`MAX_STAT_VALUE`].
    #[must_use]
    pub fn capped(&self) -> Self {
        let cap = |value: u32| value.min(MAX_STAT_VALUE);
        Self {
            vitality: cap(self.vitality),
            durability: cap(self.durability),
            speed: cap(self.speed),
            strength: cap(self.strength),
            intelligence: cap(self.intelligence),
            mana: cap(self.mana),
            mastery: cap(self.mastery),
            element: self.element,
        }
    }
}

/// Combat-ready numbers for one participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct CombatStats {
    /// Maximum HP.
    pub max_hp: u32,
    /// Maximum MP.
    pub max_mp: u32,
    /// Physical attack damage.
    pub physical_damage: u32,
    /// Magical attack damage.
    pub magical_damage: u32,
    /// Defense rating.
    pub defense: u32,
    /// Turn-order rating.
    pub initiative: u32,
    /// Hit chance in percent.
    pub accuracy: u32,
    /// Dodge chance in percent (at most [`MAX_DODGE_CHANCE`]).
    pub dodge_chance: u32,
}

impl CombatStats {
    /// Project a character sheet into combat stats. The sheet is capped first.
    #[must_use]
    pub fn from_sheet(sheet: &CharacterSheet) -> Self {
        let sheet = sheet.capped();
        Self {
            max_hp: sheet.vitality * VITALITY_TO_HP,
            max_mp: sheet.mana * MANA_TO_MP,
            physical_damage: sheet.strength * STRENGTH_TO_DAMAGE,
            magical_damage: sheet.intelligence * INTELLIGENCE_TO_DAMAGE,
            defense: sheet.durability * DURABILITY_TO_DEFENSE,
            initiative: sheet.speed * SPEED_TO_INITIATIVE,
            accuracy: BASE_ACCURACY + sheet.mastery * MASTERY_TO_ACCURACY / 10,
            dodge_chance: dodge_from_speed(sheet.speed),
        }
    }

    /// Stats for an NPC of the given level.
    #[must_use]
    pub fn for_npc_level(level: u32) -> Self {
        let base = npc_base_value(level);
        Self {
            max_hp: base * VITALITY_TO_HP,
            max_mp: base * MANA_TO_MP,
            physical_damage: base * STRENGTH_TO_DAMAGE,
            magical_damage: base * INTELLIGENCE_TO_DAMAGE,
            defense: base * DURABILITY_TO_DEFENSE,
            initiative: base * SPEED_TO_INITIATIVE,
            accuracy: BASE_ACCURACY + base / 3,
            dodge_chance: dodge_from_speed(base),
        }
    }

    /// Copy with the dodge chance clamped to [`MAX_DODGE_CHANCE`].
    #[must_use]
    pub fn clamped(mut self) -> Self {
        self.dodge_chance = self.dodge_chance.min(MAX_DODGE_CHANCE);
        self
    }
}

/// NPC scalar: `50 + level * 5`, capped at [`MAX_STAT_VALUE`].
#[must_use]
pub fn npc_base_value(level: u32) -> u32 {
    NPC_BASE_VALUE
        .saturating_add(level.saturating_mul(NPC_VALUE_PER_LEVEL))
        .min(MAX_STAT_VALUE)
}

fn dodge_from_speed(speed: u32) -> u32 {
    (BASE_DODGE_CHANCE + speed / 10).min(MAX_DODGE_CHANCE)
}
