//! Elements, elemental effectiveness and element-driven status effects.
//!
//! Effectiveness is stored as whole percentages (150 = super effective,
//! 50 = not very effective). Pairs missing from the chart, and any pair
//! involving [`Element::None`], are neutral (100).

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{BattleError, Result};
use crate::math::{percent, Fixed};
use crate::status::StatusEffect;

/// Neutral effectiveness percentage.
pub const NEUTRAL_PERCENT: u32 = 100;

/// Default super-effective percentage.
pub const SUPER_EFFECTIVE_PERCENT: u32 = 150;

/// Default resisted percentage.
pub const RESISTED_PERCENT: u32 = 50;

/// Elemental affinity of a participant.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default,
)]
pub enum Element {
    /// No affinity; always neutral.
    #[default]
    None,
    /// Fire.
    Fire,
    /// Water.
    Water,
    /// Earth.
    Earth,
    /// Wind.
    Wind,
    /// Nature.
    Nature,
    /// Toxic.
    Toxic,
    /// Lightning. Character records may spell it "Lighting".
    #[serde(alias = "Lighting")]
    Lightning,
    /// Sound.
    Sound,
    /// Dark.
    Dark,
    /// Light.
    Light,
    /// Frost.
    Frost,
    /// Ice.
    Ice,
    /// Gravity.
    Gravity,
    /// Crystal.
    Crystal,
    /// Arcane.
    Arcane,
}

impl Element {
    /// Elements an NPC can be assigned.
    pub const NPC_POOL: [Element; 9] = [
        Element::Fire,
        Element::Water,
        Element::Earth,
        Element::Wind,
        Element::Nature,
        Element::Lightning,
        Element::Ice,
        Element::Dark,
        Element::Light,
    ];

    /// Display name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Element::None => "None",
            Element::Fire => "Fire",
            Element::Water => "Water",
            Element::Earth => "Earth",
            Element::Wind => "Wind",
            Element::Nature => "Nature",
            Element::Toxic => "Toxic",
            Element::Lightning => "Lightning",
            Element::Sound => "Sound",
            Element::Dark => "Dark",
            Element::Light => "Light",
            Element::Frost => "Frost",
            Element::Ice => "Ice",
            Element::Gravity => "Gravity",
            Element::Crystal => "Crystal",
            Element::Arcane => "Arcane",
        }
    }

    /// Status effect a spell of this element may inflict.
    #[must_use]
    pub const fn status_effect(self) -> Option<StatusEffect> {
        match self {
            Element::Fire => Some(StatusEffect::Burn),
            Element::Toxic => Some(StatusEffect::Poison),
            Element::Lightning => Some(StatusEffect::Stun),
            Element::Frost => Some(StatusEffect::Freeze),
            _ => None,
        }
    }
}

impl fmt::Display for Element {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Element {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self> {
        let element = match s.trim() {
            "" | "None" => Element::None,
            "Fire" => Element::Fire,
            "Water" => Element::Water,
            "Earth" => Element::Earth,
            "Wind" => Element::Wind,
            "Nature" => Element::Nature,
            "Toxic" => Element::Toxic,
            "Lightning" | "Lighting" => Element::Lightning,
            "Sound" => Element::Sound,
            "Dark" => Element::Dark,
            "Light" => Element::Light,
            "Frost" => Element::Frost,
            "Ice" => Element::Ice,
            "Gravity" => Element::Gravity,
            "Crystal" => Element::Crystal,
            "Arcane" => Element::Arcane,
            other => return Err(BattleError::UnknownElement(other.to_string())),
        };
        Ok(element)
    }
}

/// Attacker-element x defender-element effectiveness table.
///
/// # Example RON
///
/// ```ron
/// ElementChart(
///     matchups: {
///         Fire: { Nature: 150, Water: 50 },
///         Water: { Fire: 150 },
///     },
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementChart {
    /// Attacker element -> defender element -> percentage.
    #[serde(default)]
    pub matchups: BTreeMap<Element, BTreeMap<Element, u32>>,
}

impl ElementChart {
    /// A chart where every pairing is neutral.
    #[must_use]
    pub fn neutral() -> Self {
        Self {
            matchups: BTreeMap::new(),
        }
    }

    /// Parse a chart from RON text.
    pub fn from_ron(text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| BattleError::ChartParse(e.to_string()))
    }

    /// Set one pairing's percentage.
    pub fn set(&mut self, attacker: Element, defender: Element, percent: u32) {
        self.matchups
            .entry(attacker)
            .or_default()
            .insert(defender, percent);
    }

    /// Effectiveness as a whole percentage.
    #[must_use]
    pub fn percent(&self, attacker: Element, defender: Element) -> u32 {
        if attacker == Element::None || defender == Element::None {
            return NEUTRAL_PERCENT;
        }
        self.matchups
            .get(&attacker)
            .and_then(|row| row.get(&defender))
            .copied()
            .unwrap_or(NEUTRAL_PERCENT)
    }

    /// Effectiveness as a fixed-point multiplier.
    #[must_use]
    pub fn effectiveness(&self, attacker: Element, defender: Element) -> Fixed {
        percent(self.percent(attacker, defender))
    }
}

impl Default for ElementChart {
    fn default() -> Self {
        use Element::{
            Arcane, Crystal, Dark, Earth, Fire, Frost, Gravity, Ice, Light, Lightning, Nature,
            Sound, Toxic, Water, Wind,
        };

        let strong: &[(Element, &[Element])] = &[
            (Fire, &[Nature, Frost, Ice, Crystal]),
            (Water, &[Fire, Earth]),
            (Earth, &[Fire, Lightning, Toxic]),
            (Wind, &[Nature, Toxic]),
            (Nature, &[Water, Earth]),
            (Toxic, &[Nature, Water]),
            (Lightning, &[Water, Wind]),
            (Sound, &[Crystal, Wind]),
            (Dark, &[Light, Arcane]),
            (Light, &[Dark]),
            (Frost, &[Nature, Wind, Water]),
            (Ice, &[Nature, Wind, Earth]),
            (Gravity, &[Wind, Lightning]),
            (Crystal, &[Lightning, Arcane]),
            (Arcane, &[Gravity, Toxic]),
        ];
        let weak: &[(Element, &[Element])] = &[
            (Fire, &[Water, Earth]),
            (Water, &[Nature, Frost]),
            (Earth, &[Wind, Nature]),
            (Wind, &[Earth, Lightning]),
            (Nature, &[Fire, Toxic]),
            (Toxic, &[Earth, Crystal]),
            (Lightning, &[Earth, Crystal]),
            (Sound, &[Gravity]),
            (Dark, &[Dark]),
            (Light, &[Light]),
            (Frost, &[Fire]),
            (Ice, &[Fire]),
            (Gravity, &[Arcane]),
            (Crystal, &[Sound]),
            (Arcane, &[Dark]),
        ];

        let mut chart = Self::neutral();
        for (attacker, defenders) in strong {
            for defender in *defenders {
                chart.set(*attacker, *defender, SUPER_EFFECTIVE_PERCENT);
            }
        }
        for (attacker, defenders) in weak {
            for defender in *defenders {
                chart.set(*attacker, *defender, RESISTED_PERCENT);
            }
        }
        chart
    }
}
