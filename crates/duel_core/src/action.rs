//! Action resolution.
//!
//! Resolves one combat action from an actor against a target:
//! - Stun check before anything else (the turn is consumed)
//! - Physical attack: dodge, then hit, then critical
//! - Magic: mana cost, reduced accuracy, halved dodge, elemental multiplier,
//!   partial defense bypass, chance to inflict the element's status
//! - Defend: raise guard
//! - Item: heal 20% of max HP
//!
//! # Roll order
//!
//! Rolls are drawn from the battle's [`Dice`] in a fixed order so scripted
//! tests can force outcomes: hit roll, dodge roll, critical roll (only on a
//! landed strike), status roll (only on a landed spell).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::dice::Dice;
use crate::element::{ElementChart, NEUTRAL_PERCENT};
use crate::error::{BattleError, Result};
use crate::math::{from_stat, percent, round_to_u32, Fixed};
use crate::participant::{CombatParticipant, ParticipantId};
use crate::status::StatusEffect;

/// Mana spent by a spell.
pub const MAGIC_MANA_COST: u32 = 15;

/// Critical hit chance in percent.
pub const CRIT_CHANCE: u32 = 5;

/// Critical damage multiplier in percent.
pub const CRIT_MULTIPLIER_PERCENT: u32 = 150;

/// Accuracy lost when casting instead of striking.
pub const MAGIC_ACCURACY_PENALTY: u32 = 5;

/// Physical damage reduction cap (defense / 100, at most 75%).
pub const PHYSICAL_REDUCTION_CAP: u32 = 75;

/// Magical damage reduction cap (defense / 200, at most 50%).
pub const MAGICAL_REDUCTION_CAP: u32 = 50;

/// Chance for a landed spell to inflict its element's status, in percent.
pub const STATUS_PROC_CHANCE: u32 = 20;

/// Turns an inflicted status lasts.
pub const STATUS_DURATION: u32 = 3;

/// Healing items restore `max_hp / HEAL_DIVISOR`.
pub const HEAL_DIVISOR: u32 = 5;

/// Minimum damage floor - a landed attack always deals at least 1 damage.
pub const MIN_DAMAGE: u32 = 1;

/// The four combat actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Physical attack.
    Attack,
    /// Magical attack.
    Magic,
    /// Raise guard.
    Defend,
    /// Use a healing item.
    Item,
}

impl ActionKind {
    /// Every action, in menu order.
    pub const ALL: [ActionKind; 4] = [
        ActionKind::Attack,
        ActionKind::Magic,
        ActionKind::Defend,
        ActionKind::Item,
    ];

    /// Command name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionKind::Attack => "attack",
            ActionKind::Magic => "magic",
            ActionKind::Defend => "defend",
            ActionKind::Item => "item",
        }
    }

    /// Whether the action is aimed at the opponent.
    #[must_use]
    pub const fn is_offensive(self) -> bool {
        matches!(self, ActionKind::Attack | ActionKind::Magic)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionKind {
    type Err = BattleError;

    fn from_str(s: &str) -> Result<Self> {
        ActionKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| BattleError::InvalidAction(s.to_string()))
    }
}

/// What happened when an action resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutcomeKind {
    /// Actor was stunned; nothing happened.
    Stunned,
    /// Target dodged.
    Dodged,
    /// Strike or spell missed.
    Missed,
    /// Damage landed.
    Hit {
        /// HP removed from the target.
        damage: u32,
        /// Whether the critical multiplier applied.
        critical: bool,
    },
    /// Spell refused for lack of mana; no MP spent.
    OutOfMana,
    /// Guard raised.
    Guarded {
        /// Defense added.
        bonus: u32,
    },
    /// HP restored.
    Healed {
        /// HP actually restored.
        amount: u32,
    },
    /// Actor fell to a start-of-turn status effect before acting.
    Succumbed {
        /// The effect that dealt the final damage.
        effect: StatusEffect,
    },
}

/// Result of resolving one action.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActionOutcome {
    /// Who acted.
    pub actor: ParticipantId,
    /// What they tried.
    pub action: ActionKind,
    /// What happened.
    pub kind: OutcomeKind,
    /// Elemental effectiveness applied (100 unless a spell landed).
    pub effectiveness_percent: u32,
    /// Status inflicted on the target, if any.
    pub inflicted: Option<StatusEffect>,
    /// Human-readable description for the combat log.
    pub description: String,
}

impl ActionOutcome {
    fn new(actor: &CombatParticipant, action: ActionKind, kind: OutcomeKind, text: String) -> Self {
        Self {
            actor: actor.id.clone(),
            action,
            kind,
            effectiveness_percent: NEUTRAL_PERCENT,
            inflicted: None,
            description: text,
        }
    }

    /// The actor fell to `effect` before their action could resolve.
    pub(crate) fn succumbed(
        actor: &CombatParticipant,
        action: ActionKind,
        effect: StatusEffect,
    ) -> Self {
        let text = format!("{} succumbs to {effect}!", actor.name);
        Self::new(actor, action, OutcomeKind::Succumbed { effect }, text)
    }

    /// Damage dealt to the target, zero if none.
    #[must_use]
    pub fn damage(&self) -> u32 {
        match self.kind {
            OutcomeKind::Hit { damage, .. } => damage,
            _ => 0,
        }
    }
}

impl fmt::Display for ActionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.description)
    }
}

/// Physical damage after critical multiplier and defense reduction.
///
/// ```text
/// Reduction    = min(defense / 100, 0.75)
/// Final Damage = max(1, round(base × crit × (1 - Reduction)))
/// ```
#[must_use]
pub fn physical_damage(base: u32, defense: u32, critical: bool) -> u32 {
    let damage = with_critical(from_stat(base), critical);
    let reduction = percent(defense.min(PHYSICAL_REDUCTION_CAP));
    round_to_u32(damage.saturating_mul(Fixed::ONE - reduction)).max(MIN_DAMAGE)
}

/// Magical damage after critical, elemental multiplier and defense reduction.
///
/// ```text
/// Reduction    = min(defense / 200, 0.5)
/// Final Damage = max(1, round(base × crit × effectiveness × (1 - Reduction)))
/// ```
#[must_use]
pub fn magical_damage(base: u32, defense: u32, effectiveness_percent: u32, critical: bool) -> u32 {
    let damage =
        with_critical(from_stat(base), critical).saturating_mul(percent(effectiveness_percent));
    let reduction = percent(defense.min(MAGICAL_REDUCTION_CAP * 2)) / Fixed::from_num(2);
    round_to_u32(damage.saturating_mul(Fixed::ONE - reduction)).max(MIN_DAMAGE)
}

fn with_critical(damage: Fixed, critical: bool) -> Fixed {
    if critical {
        damage.saturating_mul(percent(CRIT_MULTIPLIER_PERCENT))
    } else {
        damage
    }
}

enum Strike {
    Dodged,
    Missed,
    Landed { critical: bool },
}

/// Roll hit and dodge together; a successful dodge wins over a successful hit.
fn roll_strike(dice: &mut dyn Dice, hit_chance: u32, dodge_chance: u32) -> Strike {
    let hit_roll = dice.roll_percent();
    let dodge_roll = dice.roll_percent();

    if dodge_roll < dodge_chance {
        return Strike::Dodged;
    }
    if hit_roll >= hit_chance {
        return Strike::Missed;
    }
    Strike::Landed {
        critical: dice.roll_percent() < CRIT_CHANCE,
    }
}

/// Parse `action_name` and resolve it.
pub fn execute(
    actor: &mut CombatParticipant,
    target: &mut CombatParticipant,
    action_name: &str,
    chart: &ElementChart,
    dice: &mut dyn Dice,
) -> Result<ActionOutcome> {
    let action: ActionKind = action_name.parse()?;
    Ok(resolve(actor, target, action, chart, dice))
}

/// Resolve an action, mutating actor and target.
pub fn resolve(
    actor: &mut CombatParticipant,
    target: &mut CombatParticipant,
    action: ActionKind,
    chart: &ElementChart,
    dice: &mut dyn Dice,
) -> ActionOutcome {
    if actor.is_stunned() {
        let text = format!("{} is stunned and cannot move!", actor.name);
        return ActionOutcome::new(actor, action, OutcomeKind::Stunned, text);
    }

    match action {
        ActionKind::Attack => physical_attack(actor, target, dice),
        ActionKind::Magic => magical_attack(actor, target, chart, dice),
        ActionKind::Defend => defend(actor),
        ActionKind::Item => use_item(actor),
    }
}

fn physical_attack(
    actor: &CombatParticipant,
    target: &mut CombatParticipant,
    dice: &mut dyn Dice,
) -> ActionOutcome {
    let action = ActionKind::Attack;
    let critical = match roll_strike(dice, actor.accuracy, target.dodge_chance()) {
        Strike::Dodged => {
            let text = format!(
                "{} attempts a physical attack, but {} dodges!",
                actor.name, target.name
            );
            return ActionOutcome::new(actor, action, OutcomeKind::Dodged, text);
        }
        Strike::Missed => {
            let text = format!("{}'s attack misses!", actor.name);
            return ActionOutcome::new(actor, action, OutcomeKind::Missed, text);
        }
        Strike::Landed { critical } => critical,
    };

    let damage = physical_damage(actor.physical_damage, target.defense, critical);
    target.take_damage(damage);

    let text = if critical {
        format!("{} lands a critical hit for {damage} damage!", actor.name)
    } else {
        format!("{} attacks {} for {damage} damage!", actor.name, target.name)
    };
    ActionOutcome::new(actor, action, OutcomeKind::Hit { damage, critical }, text)
}

fn magical_attack(
    actor: &mut CombatParticipant,
    target: &mut CombatParticipant,
    chart: &ElementChart,
    dice: &mut dyn Dice,
) -> ActionOutcome {
    let action = ActionKind::Magic;
    if !actor.spend_mana(MAGIC_MANA_COST) {
        let text = format!("{} doesn't have enough mana to cast a spell!", actor.name);
        return ActionOutcome::new(actor, action, OutcomeKind::OutOfMana, text);
    }

    let hit_chance = actor.accuracy.saturating_sub(MAGIC_ACCURACY_PENALTY);
    let critical = match roll_strike(dice, hit_chance, target.dodge_chance() / 2) {
        Strike::Dodged => {
            let text = format!(
                "{} casts a spell, but {} manages to avoid it!",
                actor.name, target.name
            );
            return ActionOutcome::new(actor, action, OutcomeKind::Dodged, text);
        }
        Strike::Missed => {
            let text = format!("{}'s spell fizzles out!", actor.name);
            return ActionOutcome::new(actor, action, OutcomeKind::Missed, text);
        }
        Strike::Landed { critical } => critical,
    };

    let effectiveness = chart.percent(actor.element, target.element);
    let damage = magical_damage(actor.magical_damage, target.defense, effectiveness, critical);
    target.take_damage(damage);

    let mut text = if critical {
        format!(
            "{} casts a critical {} spell for {damage} damage!",
            actor.name, actor.element
        )
    } else {
        format!(
            "{} casts a {} spell on {} for {damage} damage!",
            actor.name, actor.element, target.name
        )
    };
    if effectiveness > NEUTRAL_PERCENT {
        text.push_str(" It's super effective!");
    } else if effectiveness < NEUTRAL_PERCENT {
        text.push_str(" It's not very effective...");
    }

    let mut inflicted = None;
    if dice.roll_percent() < STATUS_PROC_CHANCE {
        if let Some(effect) = actor.element.status_effect() {
            target.status.apply(effect, STATUS_DURATION);
            text.push_str(&format!(" {} is now {effect}!", target.name));
            inflicted = Some(effect);
        }
    }

    let mut outcome = ActionOutcome::new(actor, action, OutcomeKind::Hit { damage, critical }, text);
    outcome.effectiveness_percent = effectiveness;
    outcome.inflicted = inflicted;
    outcome
}

fn defend(actor: &mut CombatParticipant) -> ActionOutcome {
    let bonus = actor.raise_guard();
    let text = format!(
        "{} takes a defensive stance, increasing defense!",
        actor.name
    );
    ActionOutcome::new(actor, ActionKind::Defend, OutcomeKind::Guarded { bonus }, text)
}

fn use_item(actor: &mut CombatParticipant) -> ActionOutcome {
    let amount = actor.heal(actor.max_hp() / HEAL_DIVISOR);
    let text = format!(
        "{} uses a healing item, recovering {amount} HP!",
        actor.name
    );
    ActionOutcome::new(actor, ActionKind::Item, OutcomeKind::Healed { amount }, text)
}
