//! The battle state machine.
//!
//! A [`Battle`] owns exactly two participants for its whole lifetime and
//! moves strictly forward through `Pending -> Ongoing -> Complete`.
//!
//! # Turn Flow
//!
//! 1. The current participant picks an action with [`Battle::set_action`]
//!    (NPCs are pre-selected automatically).
//! 2. [`Battle::process_turn`] lowers any guard raised last turn, applies
//!    Burn/Poison damage, resolves the action and appends to the log.
//! 3. If the opponent fell the battle completes; otherwise the turn passes.
//!    When the turn order wraps, every participant's status effects tick
//!    down and the round counter increments.
//!
//! # Determinism
//!
//! Every roll comes from the battle's own [`Dice`]. Initiative ties are
//! settled by a single coin flip at construction, so the turn order is
//! fixed for the whole battle.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::action::{self, ActionKind, ActionOutcome};
use crate::dice::Dice;
use crate::element::ElementChart;
use crate::error::{BattleError, Result};
use crate::npc;
use crate::participant::{CombatParticipant, ParticipantId};
use crate::rewards::{BattleResult, RewardTable};
use crate::snapshot::BattleSnapshot;

/// Log entries shown by default in a status view.
pub const DEFAULT_LOG_TAIL: usize = 3;

/// Unique battle identifier (`battle_<a>_<b>_<unix-seconds>`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BattleId(String);

impl BattleId {
    /// Wrap a raw identifier.
    #[must_use]
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Identifier for a battle between `a` and `b` created at `at`.
    #[must_use]
    pub fn for_participants(a: &ParticipantId, b: &ParticipantId, at: DateTime<Utc>) -> Self {
        Self(format!("battle_{a}_{b}_{}", at.timestamp()))
    }

    /// Raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BattleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Battle lifecycle state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum BattleState {
    /// Constructed, not yet started.
    Pending,
    /// Turns are being processed.
    Ongoing,
    /// Terminal; winner and loser are fixed.
    Complete,
}

impl BattleState {
    /// Lowercase name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            BattleState::Pending => "pending",
            BattleState::Ongoing => "ongoing",
            BattleState::Complete => "complete",
        }
    }
}

impl fmt::Display for BattleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One live combat session between exactly two participants.
///
/// Participants are stored in turn order: index 0 acts first each round.
#[derive(Debug)]
pub struct Battle {
    id: BattleId,
    channel_id: String,
    participants: [CombatParticipant; 2],
    cursor: usize,
    round: u32,
    state: BattleState,
    log: Vec<String>,
    winner: Option<usize>,
    last_updated: DateTime<Utc>,
    display_handle: Option<String>,
    chart: Arc<ElementChart>,
    dice: Box<dyn Dice>,
}

impl Battle {
    /// Create a pending battle with the default element chart.
    ///
    /// The higher initiative acts first; an exact tie is settled by one coin
    /// flip here and never re-rolled.
    ///
    /// # Errors
    ///
    /// [`BattleError::DuplicateParticipant`] if both sides share an ID.
    pub fn new(
        channel_id: impl Into<String>,
        a: CombatParticipant,
        b: CombatParticipant,
        mut dice: Box<dyn Dice>,
    ) -> Result<Self> {
        if a.id == b.id {
            return Err(BattleError::DuplicateParticipant(a.id));
        }

        let now = Utc::now();
        let id = BattleId::for_participants(&a.id, &b.id, now);
        let opening = format!("Battle between {} and {} begins!", a.name, b.name);

        let a_first = match a.initiative.cmp(&b.initiative) {
            std::cmp::Ordering::Greater => true,
            std::cmp::Ordering::Less => false,
            std::cmp::Ordering::Equal => dice.coin_flip(),
        };
        let participants = if a_first { [a, b] } else { [b, a] };

        tracing::info!(
            battle_id = %id,
            first = %participants[0].id,
            second = %participants[1].id,
            "Battle created"
        );

        Ok(Self {
            id,
            channel_id: channel_id.into(),
            participants,
            cursor: 0,
            round: 1,
            state: BattleState::Pending,
            log: vec![opening],
            winner: None,
            last_updated: now,
            display_handle: None,
            chart: Arc::new(ElementChart::default()),
            dice,
        })
    }

    /// Use a custom element chart.
    #[must_use]
    pub fn with_chart(mut self, chart: Arc<ElementChart>) -> Self {
        self.chart = chart;
        self
    }

    /// Move from `Pending` to `Ongoing`, pre-selecting for an NPC that acts first.
    ///
    /// # Errors
    ///
    /// [`BattleError::AlreadyStarted`] unless the battle is pending.
    pub fn start(&mut self) -> Result<()> {
        if self.state != BattleState::Pending {
            return Err(BattleError::AlreadyStarted(self.state));
        }
        self.state = BattleState::Ongoing;
        self.touch(Utc::now());
        self.prepare_npc_turn();

        tracing::info!(battle_id = %self.id, first = %self.current_turn(), "Battle started");
        Ok(())
    }

    /// Record the current participant's action and target.
    ///
    /// Calling again before the turn is processed overwrites the choice.
    ///
    /// # Errors
    ///
    /// - [`BattleError::NotOngoing`] outside the ongoing state
    /// - [`BattleError::ParticipantNotFound`] if `participant` is not in this battle
    /// - [`BattleError::NotYourTurn`] if it is the other participant's turn
    /// - [`BattleError::InvalidAction`] for an unknown action name
    /// - [`BattleError::InvalidTarget`] for a target outside the battle, or an
    ///   attack aimed at oneself
    pub fn set_action(
        &mut self,
        participant: &ParticipantId,
        action_name: &str,
        target: &ParticipantId,
    ) -> Result<()> {
        if self.state != BattleState::Ongoing {
            return Err(BattleError::NotOngoing(self.state));
        }
        let index = self
            .index_of(participant)
            .ok_or_else(|| BattleError::ParticipantNotFound(participant.clone()))?;
        if index != self.cursor {
            return Err(BattleError::NotYourTurn(participant.clone()));
        }

        let action: ActionKind = action_name.parse()?;
        let target_index = self
            .index_of(target)
            .ok_or_else(|| BattleError::InvalidTarget(target.clone()))?;
        if action.is_offensive() && target_index == index {
            return Err(BattleError::InvalidTarget(target.clone()));
        }

        self.participants[index].set_pending(action, target.clone());
        self.touch(Utc::now());

        tracing::debug!(
            battle_id = %self.id,
            participant = %participant,
            action = %action,
            target = %target,
            "Action selected"
        );
        Ok(())
    }

    /// Resolve the current participant's pending action.
    ///
    /// # Errors
    ///
    /// - [`BattleError::NotOngoing`] outside the ongoing state
    /// - [`BattleError::NoActionSelected`] if no action is pending (retry after
    ///   prompting)
    /// - [`BattleError::ParticipantNotFound`] if the pending target is not in
    ///   this battle
    ///
    /// No participant is mutated on any error path.
    pub fn process_turn(&mut self) -> Result<ActionOutcome> {
        if self.state != BattleState::Ongoing {
            return Err(BattleError::NotOngoing(self.state));
        }

        let actor_index = self.cursor;
        let opponent_index = 1 - actor_index;
        let pending = self.participants[actor_index]
            .pending()
            .cloned()
            .ok_or_else(|| {
                BattleError::NoActionSelected(self.participants[actor_index].id.clone())
            })?;
        if self.index_of(&pending.target).is_none() {
            tracing::warn!(
                battle_id = %self.id,
                target = %pending.target,
                "Pending target is not in this battle"
            );
            return Err(BattleError::ParticipantNotFound(pending.target));
        }

        self.touch(Utc::now());

        let [first, second] = &mut self.participants;
        let (actor, opponent) = if actor_index == 0 {
            (first, second)
        } else {
            (second, first)
        };

        actor.lower_guard();
        let mut fatal = None;
        for (effect, damage) in actor.suffer_status_damage() {
            self.log
                .push(format!("{} takes {damage} damage from {effect}!", actor.name));
            fatal = Some(effect);
        }

        if !actor.is_alive() {
            if let Some(effect) = fatal {
                let outcome = ActionOutcome::succumbed(actor, pending.action, effect);
                self.log.push(outcome.description.clone());
                self.finish(opponent_index);
                return Ok(outcome);
            }
        }

        let outcome = action::resolve(
            actor,
            opponent,
            pending.action,
            &self.chart,
            self.dice.as_mut(),
        );
        self.log.push(outcome.description.clone());
        let opponent_alive = opponent.is_alive();

        tracing::debug!(
            battle_id = %self.id,
            round = self.round,
            actor = %outcome.actor,
            action = %outcome.action,
            damage = outcome.damage(),
            "Turn processed"
        );

        if opponent_alive {
            self.advance_turn();
        } else {
            self.finish(actor_index);
        }
        Ok(outcome)
    }

    /// Give up: the forfeiting participant drops to 0 HP and the opponent wins.
    ///
    /// Valid from `Pending` or `Ongoing`.
    ///
    /// # Errors
    ///
    /// - [`BattleError::NotOngoing`] if the battle already completed
    /// - [`BattleError::ParticipantNotFound`] if `participant` is not in this battle
    pub fn forfeit(&mut self, participant: &ParticipantId) -> Result<()> {
        if self.state == BattleState::Complete {
            return Err(BattleError::NotOngoing(self.state));
        }
        let index = self
            .index_of(participant)
            .ok_or_else(|| BattleError::ParticipantNotFound(participant.clone()))?;

        let quitter = &mut self.participants[index];
        quitter.knock_out();
        self.log
            .push(format!("{} has forfeited the battle!", quitter.name));
        self.state = BattleState::Complete;
        self.winner = Some(1 - index);
        self.touch(Utc::now());

        tracing::info!(battle_id = %self.id, participant = %participant, "Battle forfeited");
        Ok(())
    }

    /// Battle result using the default reward table.
    ///
    /// # Errors
    ///
    /// [`BattleError::NotComplete`] unless the battle has completed.
    pub fn get_result(&self) -> Result<BattleResult> {
        self.result_with(&RewardTable::default())
    }

    /// Battle result using a specific reward table.
    ///
    /// # Errors
    ///
    /// [`BattleError::NotComplete`] unless the battle has completed.
    pub fn result_with(&self, rewards: &RewardTable) -> Result<BattleResult> {
        let winner = match (self.state, self.winner) {
            (BattleState::Complete, Some(index)) => index,
            _ => return Err(BattleError::NotComplete(self.state)),
        };
        let winner_side = &self.participants[winner];
        let loser_side = &self.participants[1 - winner];

        Ok(BattleResult {
            winner: winner_side.id.clone(),
            loser: loser_side.id.clone(),
            rounds: self.round,
            winner_hp: winner_side.current_hp(),
            rewards: rewards.compute(self.round),
        })
    }

    /// Battle identifier.
    #[must_use]
    pub fn id(&self) -> &BattleId {
        &self.id
    }

    /// Channel or context the battle was created in.
    #[must_use]
    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// Lifecycle state.
    #[must_use]
    pub fn state(&self) -> BattleState {
        self.state
    }

    /// Whose turn it is.
    #[must_use]
    pub fn current_turn(&self) -> &ParticipantId {
        &self.participants[self.cursor].id
    }

    /// The participant whose turn it is.
    #[must_use]
    pub fn current_participant(&self) -> &CombatParticipant {
        &self.participants[self.cursor]
    }

    /// Round counter, starting at 1.
    #[must_use]
    pub fn round(&self) -> u32 {
        self.round
    }

    /// Fixed turn order.
    #[must_use]
    pub fn turn_order(&self) -> [&ParticipantId; 2] {
        [&self.participants[0].id, &self.participants[1].id]
    }

    /// Both participants, in turn order.
    #[must_use]
    pub fn participants(&self) -> &[CombatParticipant; 2] {
        &self.participants
    }

    /// Look up a participant.
    #[must_use]
    pub fn participant(&self, id: &ParticipantId) -> Option<&CombatParticipant> {
        self.index_of(id).map(|index| &self.participants[index])
    }

    /// The other side of the battle from `id`.
    #[must_use]
    pub fn opponent_of(&self, id: &ParticipantId) -> Option<&CombatParticipant> {
        self.index_of(id).map(|index| &self.participants[1 - index])
    }

    /// Whether `id` fights in this battle.
    #[must_use]
    pub fn contains(&self, id: &ParticipantId) -> bool {
        self.index_of(id).is_some()
    }

    /// Winner, once complete.
    #[must_use]
    pub fn winner(&self) -> Option<&ParticipantId> {
        self.winner.map(|index| &self.participants[index].id)
    }

    /// Full combat log, oldest first.
    #[must_use]
    pub fn log(&self) -> &[String] {
        &self.log
    }

    /// The last `n` log entries.
    #[must_use]
    pub fn log_tail(&self, n: usize) -> &[String] {
        &self.log[self.log.len().saturating_sub(n)..]
    }

    /// Last activity time.
    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Record activity at `at`.
    pub fn touch(&mut self, at: DateTime<Utc>) {
        self.last_updated = at;
    }

    /// Whether the battle has been idle for longer than `threshold` at `now`.
    #[must_use]
    pub fn is_stale(&self, now: DateTime<Utc>, threshold: Duration) -> bool {
        now - self.last_updated > threshold
    }

    /// Opaque handle to the caller's rendered status display.
    #[must_use]
    pub fn display_handle(&self) -> Option<&str> {
        self.display_handle.as_deref()
    }

    /// Store the caller's display handle.
    pub fn set_display_handle(&mut self, handle: impl Into<String>) {
        self.display_handle = Some(handle.into());
    }

    /// Element chart in use.
    #[must_use]
    pub fn chart(&self) -> &ElementChart {
        &self.chart
    }

    /// Read-only view for rendering and hashing.
    #[must_use]
    pub fn snapshot(&self) -> BattleSnapshot {
        BattleSnapshot {
            id: self.id.clone(),
            channel_id: self.channel_id.clone(),
            state: self.state,
            round: self.round,
            current_turn: self.current_turn().clone(),
            participants: self.participants.to_vec(),
            winner: self.winner().cloned(),
            log: self.log.clone(),
            last_updated: self.last_updated,
        }
    }

    fn index_of(&self, id: &ParticipantId) -> Option<usize> {
        self.participants.iter().position(|p| &p.id == id)
    }

    fn advance_turn(&mut self) {
        self.cursor = (self.cursor + 1) % self.participants.len();
        if self.cursor == 0 {
            for participant in &mut self.participants {
                let expired = participant.status.tick();
                if !expired.is_empty() {
                    tracing::trace!(
                        battle_id = %self.id,
                        participant = %participant.id,
                        ?expired,
                        "Status effects expired"
                    );
                }
            }
            self.round += 1;
        }
        self.participants[self.cursor].clear_pending();
        self.prepare_npc_turn();
    }

    fn prepare_npc_turn(&mut self) {
        let opponent = self.participants[1 - self.cursor].id.clone();
        let current = &mut self.participants[self.cursor];
        if current.is_npc {
            let (action, target) = npc::select_action(current, &opponent);
            current.set_pending(action, target);
        }
    }

    fn finish(&mut self, winner: usize) {
        let loser = 1 - winner;
        self.participants[loser].knock_out();
        self.state = BattleState::Complete;
        self.winner = Some(winner);
        self.log.push(format!(
            "{} has been defeated! {} wins the battle!",
            self.participants[loser].name, self.participants[winner].name
        ));

        tracing::info!(
            battle_id = %self.id,
            winner = %self.participants[winner].id,
            rounds = self.round,
            "Battle complete"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::OutcomeKind;
    use crate::dice::ScriptedDice;
    use crate::element::Element;
    use crate::stats::CombatStats;
    use crate::status::StatusEffect;

    fn fighter(id: &str, initiative: u32, is_npc: bool) -> CombatParticipant {
        CombatParticipant::new(
            ParticipantId::new(id),
            id.to_uppercase(),
            is_npc,
            CombatStats {
                max_hp: 200,
                max_mp: 50,
                physical_damage: 100,
                magical_damage: 40,
                defense: 50,
                initiative,
                accuracy: 70,
                dodge_chance: 0,
            },
            Element::None,
        )
    }

    fn battle_with(rolls: impl IntoIterator<Item = u32>) -> Battle {
        Battle::new(
            "channel",
            fighter("a", 200, false),
            fighter("b", 100, false),
            Box::new(ScriptedDice::new(rolls)),
        )
        .unwrap()
    }

    fn id(raw: &str) -> ParticipantId {
        ParticipantId::new(raw)
    }

    #[test]
    fn test_construction() {
        let battle = battle_with([]);
        assert_eq!(battle.state(), BattleState::Pending);
        assert_eq!(battle.round(), 1);
        assert_eq!(battle.current_turn(), &id("a"));
        assert_eq!(battle.log(), ["Battle between A and B begins!"]);
        assert!(battle.id().as_str().starts_with("battle_a_b_"));
    }

    #[test]
    fn test_higher_initiative_goes_first() {
        let battle = Battle::new(
            "channel",
            fighter("slow", 10, false),
            fighter("fast", 90, false),
            Box::new(ScriptedDice::new([])),
        )
        .unwrap();
        assert_eq!(battle.turn_order(), [&id("fast"), &id("slow")]);
    }

    #[test]
    fn test_initiative_tie_uses_coin_flip() {
        let heads = Battle::new(
            "c",
            fighter("a", 50, false),
            fighter("b", 50, false),
            Box::new(ScriptedDice::new([0])),
        )
        .unwrap();
        let tails = Battle::new(
            "c",
            fighter("a", 50, false),
            fighter("b", 50, false),
            Box::new(ScriptedDice::new([1])),
        )
        .unwrap();
        assert_eq!(heads.current_turn(), &id("a"));
        assert_eq!(tails.current_turn(), &id("b"));
    }

    #[test]
    fn test_duplicate_participant_rejected() {
        let result = Battle::new(
            "c",
            fighter("a", 1, false),
            fighter("a", 2, false),
            Box::new(ScriptedDice::new([])),
        );
        assert!(matches!(result, Err(BattleError::DuplicateParticipant(_))));
    }

    #[test]
    fn test_start_only_once() {
        let mut battle = battle_with([]);
        battle.start().unwrap();
        assert_eq!(battle.state(), BattleState::Ongoing);
        assert_eq!(
            battle.start(),
            Err(BattleError::AlreadyStarted(BattleState::Ongoing))
        );
    }

    #[test]
    fn test_process_before_start_fails() {
        let mut battle = battle_with([]);
        assert_eq!(
            battle.process_turn(),
            Err(BattleError::NotOngoing(BattleState::Pending))
        );
    }

    #[test]
    fn test_set_action_validation() {
        let mut battle = battle_with([]);
        battle.start().unwrap();

        assert_eq!(
            battle.set_action(&id("b"), "attack", &id("a")),
            Err(BattleError::NotYourTurn(id("b")))
        );
        assert!(battle.participant(&id("b")).unwrap().pending().is_none());

        assert_eq!(
            battle.set_action(&id("a"), "dance", &id("b")),
            Err(BattleError::InvalidAction("dance".to_string()))
        );
        assert_eq!(
            battle.set_action(&id("a"), "attack", &id("zed")),
            Err(BattleError::InvalidTarget(id("zed")))
        );
        assert_eq!(
            battle.set_action(&id("a"), "attack", &id("a")),
            Err(BattleError::InvalidTarget(id("a")))
        );
        assert!(battle.current_participant().pending().is_none());

        battle.set_action(&id("a"), "defend", &id("a")).unwrap();
        battle.set_action(&id("a"), "attack", &id("b")).unwrap();
        assert_eq!(
            battle.current_participant().pending().unwrap().action,
            ActionKind::Attack
        );
    }

    #[test]
    fn test_no_action_selected() {
        let mut battle = battle_with([]);
        battle.start().unwrap();
        assert_eq!(
            battle.process_turn(),
            Err(BattleError::NoActionSelected(id("a")))
        );
        assert_eq!(battle.current_turn(), &id("a"));
    }

    #[test]
    fn test_turn_and_round_progression() {
        let mut battle = battle_with([]);
        battle.start().unwrap();

        battle.set_action(&id("a"), "defend", &id("a")).unwrap();
        battle.process_turn().unwrap();
        assert_eq!(battle.current_turn(), &id("b"));
        assert_eq!(battle.round(), 1);

        battle.set_action(&id("b"), "defend", &id("b")).unwrap();
        battle.process_turn().unwrap();
        assert_eq!(battle.current_turn(), &id("a"));
        assert_eq!(battle.round(), 2);
    }

    #[test]
    fn test_attack_scenario_damage() {
        // hit 0, dodge 99, crit 99
        let mut battle = battle_with([0, 99, 99]);
        battle.start().unwrap();
        battle.set_action(&id("a"), "attack", &id("b")).unwrap();

        let outcome = battle.process_turn().unwrap();

        assert_eq!(outcome.kind, OutcomeKind::Hit { damage: 50, critical: false });
        assert_eq!(battle.participant(&id("b")).unwrap().current_hp(), 150);
        assert_eq!(battle.log_tail(1), ["A attacks B for 50 damage!"]);
    }

    #[test]
    fn test_stun_consumes_turn() {
        let mut battle = battle_with([]);
        battle.start().unwrap();
        battle.participants[0].status.apply(StatusEffect::Stun, 1);
        battle.set_action(&id("a"), "magic", &id("b")).unwrap();

        let outcome = battle.process_turn().unwrap();

        assert_eq!(outcome.kind, OutcomeKind::Stunned);
        assert_eq!(battle.current_turn(), &id("b"));
        let a = battle.participant(&id("a")).unwrap();
        let b = battle.participant(&id("b")).unwrap();
        assert_eq!((a.current_hp(), a.current_mp()), (200, 50));
        assert_eq!((b.current_hp(), b.current_mp()), (200, 50));
    }

    #[test]
    fn test_guard_reverts_on_next_turn() {
        let mut battle = battle_with([]);
        battle.start().unwrap();
        battle.set_action(&id("a"), "defend", &id("a")).unwrap();
        battle.process_turn().unwrap();
        assert_eq!(battle.participant(&id("a")).unwrap().defense, 75);

        battle.set_action(&id("b"), "item", &id("b")).unwrap();
        battle.process_turn().unwrap();
        assert_eq!(battle.participant(&id("a")).unwrap().defense, 75);

        battle.set_action(&id("a"), "item", &id("a")).unwrap();
        battle.process_turn().unwrap();
        assert_eq!(battle.participant(&id("a")).unwrap().defense, 50);
    }

    #[test]
    fn test_status_ticks_on_wrap_only() {
        let mut battle = battle_with([]);
        battle.start().unwrap();
        battle.participants[1].status.apply(StatusEffect::Freeze, 2);

        battle.set_action(&id("a"), "item", &id("a")).unwrap();
        battle.process_turn().unwrap();
        assert_eq!(
            battle.participant(&id("b")).unwrap().status.remaining(StatusEffect::Freeze),
            Some(2)
        );

        battle.set_action(&id("b"), "item", &id("b")).unwrap();
        battle.process_turn().unwrap();
        assert_eq!(
            battle.participant(&id("b")).unwrap().status.remaining(StatusEffect::Freeze),
            Some(1)
        );
    }

    #[test]
    fn test_burn_applied_before_action() {
        let mut battle = battle_with([]);
        battle.start().unwrap();
        battle.participants[0].status.apply(StatusEffect::Burn, 3);
        battle.set_action(&id("a"), "defend", &id("a")).unwrap();

        battle.process_turn().unwrap();

        assert_eq!(battle.participant(&id("a")).unwrap().current_hp(), 190);
        assert_eq!(
            battle.log_tail(2),
            [
                "A takes 10 damage from Burn!",
                "A takes a defensive stance, increasing defense!"
            ]
        );
    }

    #[test]
    fn test_status_damage_can_end_battle() {
        let mut battle = battle_with([]);
        battle.start().unwrap();
        battle.participants[0].take_damage(190);
        battle.participants[0].status.apply(StatusEffect::Poison, 3);
        battle.set_action(&id("a"), "attack", &id("b")).unwrap();

        let outcome = battle.process_turn().unwrap();

        assert_eq!(
            outcome.kind,
            OutcomeKind::Succumbed { effect: StatusEffect::Poison }
        );
        assert_eq!(battle.state(), BattleState::Complete);
        assert_eq!(battle.winner(), Some(&id("b")));
        assert_eq!(battle.participant(&id("b")).unwrap().current_hp(), 200);
    }

    #[test]
    fn test_first_fatal_effect_is_reported() {
        let mut battle = battle_with([]);
        battle.start().unwrap();
        battle.participants[0].take_damage(190);
        battle.participants[0].status.apply(StatusEffect::Burn, 3);
        battle.participants[0].status.apply(StatusEffect::Poison, 3);
        battle.set_action(&id("a"), "attack", &id("b")).unwrap();

        let outcome = battle.process_turn().unwrap();

        assert_eq!(
            outcome.kind,
            OutcomeKind::Succumbed { effect: StatusEffect::Burn }
        );
        assert_eq!(
            battle.log_tail(3),
            [
                "A takes 10 damage from Burn!",
                "A succumbs to Burn!",
                "A has been defeated! B wins the battle!"
            ]
        );
        assert!(!battle.log().iter().any(|line| line.contains("takes 0 damage")));
    }

    #[test]
    fn test_victory_completes_without_advancing() {
        let mut battle = battle_with([0, 99, 99]);
        battle.start().unwrap();
        battle.participants[1].take_damage(170);
        battle.set_action(&id("a"), "attack", &id("b")).unwrap();

        battle.process_turn().unwrap();

        assert_eq!(battle.state(), BattleState::Complete);
        assert_eq!(battle.current_turn(), &id("a"));
        assert_eq!(battle.participant(&id("b")).unwrap().current_hp(), 0);
        assert_eq!(
            battle.log().last().unwrap(),
            "B has been defeated! A wins the battle!"
        );

        let before = battle.snapshot();
        assert_eq!(
            battle.process_turn(),
            Err(BattleError::NotOngoing(BattleState::Complete))
        );
        assert_eq!(battle.snapshot().participants, before.participants);
    }

    #[test]
    fn test_result() {
        let mut battle = battle_with([0, 99, 99]);
        assert_eq!(
            battle.get_result(),
            Err(BattleError::NotComplete(BattleState::Pending))
        );
        battle.start().unwrap();
        battle.participants[1].take_damage(170);
        battle.set_action(&id("a"), "attack", &id("b")).unwrap();
        battle.process_turn().unwrap();

        let result = battle.get_result().unwrap();
        assert_eq!(result.winner, id("a"));
        assert_eq!(result.loser, id("b"));
        assert_eq!(result.rounds, 1);
        assert_eq!(result.winner_hp, 200);
        assert_eq!(result.rewards.experience, 60);
        assert_eq!(result.rewards.currency, 105);
    }

    #[test]
    fn test_forfeit() {
        let mut battle = battle_with([]);
        battle.start().unwrap();
        battle.forfeit(&id("a")).unwrap();

        assert_eq!(battle.state(), BattleState::Complete);
        assert_eq!(battle.winner(), Some(&id("b")));
        assert_eq!(battle.participant(&id("a")).unwrap().current_hp(), 0);
        assert_eq!(battle.log().last().unwrap(), "A has forfeited the battle!");
        assert_eq!(
            battle.forfeit(&id("b")),
            Err(BattleError::NotOngoing(BattleState::Complete))
        );
    }

    #[test]
    fn test_forfeit_unknown_participant() {
        let mut battle = battle_with([]);
        assert_eq!(
            battle.forfeit(&id("zed")),
            Err(BattleError::ParticipantNotFound(id("zed")))
        );
        assert_eq!(battle.state(), BattleState::Pending);
    }

    #[test]
    fn test_npc_preselects_on_start_and_turn() {
        let mut battle = Battle::new(
            "c",
            fighter("npc_bot", 300, true),
            fighter("hero", 100, false),
            Box::new(ScriptedDice::new([])),
        )
        .unwrap();
        battle.start().unwrap();

        let pending = battle.current_participant().pending().unwrap();
        assert_eq!(pending.action, ActionKind::Attack);
        assert_eq!(pending.target, id("hero"));

        battle.process_turn().unwrap();
        battle.set_action(&id("hero"), "item", &id("hero")).unwrap();
        battle.process_turn().unwrap();
        assert!(battle.current_participant().pending().is_some());
    }

    #[test]
    fn test_queries() {
        let battle = battle_with([]);
        assert_eq!(battle.opponent_of(&id("a")).unwrap().id, id("b"));
        assert!(battle.opponent_of(&id("zed")).is_none());
        assert!(battle.contains(&id("b")));
        assert_eq!(battle.log_tail(DEFAULT_LOG_TAIL).len(), 1);
        assert_eq!(battle.channel_id(), "channel");
    }

    #[test]
    fn test_staleness() {
        let mut battle = battle_with([]);
        let then = Utc::now() - Duration::minutes(31);
        battle.touch(then);
        assert!(battle.is_stale(Utc::now(), Duration::minutes(30)));
        battle.touch(Utc::now());
        assert!(!battle.is_stale(Utc::now(), Duration::minutes(30)));
    }
}
