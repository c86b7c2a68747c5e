//! Battle command flows.
//!
//! [`ArenaService`] is what the chat layer calls. It looks up characters,
//! runs the PvP challenge handshake, routes player actions, plays NPC turns
//! with a pacing delay and settles rewards once a battle completes.
//!
//! A battle is settled by whichever command completes it. That command
//! retires the battle from the registry atomically, so a forfeit landing
//! while NPC turns are being paced settles exactly once and the paced
//! command simply reports that the battle ended.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use duel_core::action::ActionOutcome;
use duel_core::battle::{Battle, BattleId, BattleState, DEFAULT_LOG_TAIL};
use duel_core::dice::{Dice, SeededDice};
use duel_core::element::ElementChart;
use duel_core::error::{BattleError, Result as EngineResult};
use duel_core::npc;
use duel_core::participant::{CombatParticipant, ParticipantId};
use duel_core::rewards::BattleResult;
use duel_core::snapshot::BattleSnapshot;
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::challenge::{Challenge, ChallengeBoard};
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::registry::BattleRegistry;
use crate::store::{CharacterRecord, CharacterStore};
use crate::sweeper::spawn_sweeper;

type DiceSource = Box<dyn Fn() -> Box<dyn Dice> + Send + Sync>;

/// Final summary handed back when a battle ends.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleReport {
    /// The finished battle.
    pub battle_id: BattleId,
    /// Winner, loser and payout.
    pub result: BattleResult,
    /// Whether currency was credited (human winners only).
    pub rewards_applied: bool,
    /// Full combat log.
    pub log: Vec<String>,
}

/// What happened in response to one command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleUpdate {
    /// Battle the command touched.
    pub battle_id: BattleId,
    /// Turns resolved, in order (the player's, then any NPC turns).
    pub outcomes: Vec<ActionOutcome>,
    /// Battle state after the command.
    pub snapshot: BattleSnapshot,
    /// Present when this command completed the battle and settled it.
    pub report: Option<BattleReport>,
    /// Whether the battle is over. Set without a report when another
    /// command (a forfeit or the stale sweeper) ended it first.
    pub ended: bool,
}

/// Status view for a player's live battle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BattleStatus {
    /// Current battle state.
    pub snapshot: BattleSnapshot,
    /// Most recent log lines.
    pub recent_log: Vec<String>,
}

/// The in-process battle command surface.
pub struct ArenaService {
    registry: Arc<BattleRegistry>,
    challenges: Arc<ChallengeBoard>,
    store: Arc<dyn CharacterStore>,
    config: ServerConfig,
    chart: Arc<ElementChart>,
    dice: DiceSource,
}

impl fmt::Debug for ArenaService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaService")
            .field("registry", &self.registry)
            .field("challenges", &self.challenges)
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl ArenaService {
    /// Build the service, loading the configured element chart.
    pub fn new(config: ServerConfig, store: Arc<dyn CharacterStore>) -> Result<Self> {
        let chart = Arc::new(config.load_chart()?);
        Ok(Self {
            registry: Arc::new(BattleRegistry::new()),
            challenges: Arc::new(ChallengeBoard::new()),
            store,
            config,
            chart,
            dice: Box::new(|| Box::new(SeededDice::from_entropy())),
        })
    }

    /// Replace the per-battle dice source (seeded dice for replays and tests).
    #[must_use]
    pub fn with_dice_source(
        mut self,
        source: impl Fn() -> Box<dyn Dice> + Send + Sync + 'static,
    ) -> Self {
        self.dice = Box::new(source);
        self
    }

    /// Shared registry.
    #[must_use]
    pub fn registry(&self) -> &Arc<BattleRegistry> {
        &self.registry
    }

    /// Open PvP challenges.
    #[must_use]
    pub fn challenges(&self) -> &Arc<ChallengeBoard> {
        &self.challenges
    }

    /// Active configuration.
    #[must_use]
    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Start the background sweeper for stale battles and expired challenges.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let registry = Arc::clone(&self.registry);
        let challenges = Arc::clone(&self.challenges);
        let stale_after = self.config.stale_after();
        let challenge_ttl = self.config.challenge_ttl();

        spawn_sweeper(self.config.sweep_interval(), move |now| {
            if let Err(e) = registry.sweep_stale(now, stale_after) {
                tracing::warn!(error = %e, "Stale battle sweep failed");
            }
            if let Err(e) = challenges.sweep_expired(now, challenge_ttl) {
                tracing::warn!(error = %e, "Challenge sweep failed");
            }
        })
    }

    /// Start a battle between a player's character and a named NPC.
    ///
    /// If the NPC wins initiative its opening turn is played before returning.
    pub async fn start_npc_battle(
        &self,
        player: &ParticipantId,
        player_name: &str,
        channel_id: &str,
        npc_name: &str,
        difficulty: Option<i64>,
    ) -> Result<BattleUpdate> {
        let record = self.character(player)?;
        self.ensure_free(player)?;

        let mut dice = (self.dice)();
        let opponent = npc::spawn(
            npc_name,
            difficulty.map(npc::clamp_difficulty),
            dice.as_mut(),
        );
        let hero = CombatParticipant::from_character(player.clone(), player_name, &record.sheet);

        self.launch(channel_id, hero, opponent, dice).await
    }

    /// Challenge another player to a PvP battle.
    ///
    /// Both players need a character and neither may be in a live battle.
    /// The challenge stays open for the configured answer window.
    pub fn challenge(
        &self,
        challenger: &ParticipantId,
        challenger_name: &str,
        target: &ParticipantId,
        channel_id: &str,
    ) -> Result<Challenge> {
        if challenger == target {
            return Err(ServerError::SelfChallenge);
        }
        self.character(challenger)?;
        self.character(target)?;
        self.ensure_free(challenger)?;
        self.ensure_free(target)?;

        let challenge = Challenge {
            challenger: challenger.clone(),
            challenger_name: challenger_name.to_string(),
            target: target.clone(),
            channel_id: channel_id.to_string(),
            issued_at: Utc::now(),
        };
        self.challenges.issue(challenge.clone())?;
        Ok(challenge)
    }

    /// Accept `challenger`'s open challenge and start the battle.
    ///
    /// Only the challenge's target may accept. The challenge is consumed
    /// even if the battle then fails to start.
    pub async fn accept(
        &self,
        player: &ParticipantId,
        player_name: &str,
        challenger: &ParticipantId,
    ) -> Result<BattleUpdate> {
        let challenge = self.challenges.take_for(
            player,
            challenger,
            Utc::now(),
            self.config.challenge_ttl(),
        )?;
        tracing::info!(challenger = %challenger, target = %player, "Challenge accepted");

        let first = self.character(&challenge.challenger)?;
        let second = self.character(player)?;
        self.ensure_free(&challenge.challenger)?;
        self.ensure_free(player)?;

        let a = CombatParticipant::from_character(
            challenge.challenger.clone(),
            &challenge.challenger_name,
            &first.sheet,
        );
        let b = CombatParticipant::from_character(player.clone(), player_name, &second.sheet);

        self.launch(&challenge.channel_id, a, b, (self.dice)()).await
    }

    /// Turn down `challenger`'s open challenge. Only its target may decline.
    pub fn decline(&self, player: &ParticipantId, challenger: &ParticipantId) -> Result<Challenge> {
        let challenge = self.challenges.take_for(
            player,
            challenger,
            Utc::now(),
            self.config.challenge_ttl(),
        )?;
        tracing::info!(challenger = %challenger, target = %player, "Challenge declined");
        Ok(challenge)
    }

    /// Perform the player's action against their opponent, then play any NPC turns.
    pub async fn act(&self, player: &ParticipantId, action_name: &str) -> Result<BattleUpdate> {
        let id = self.battle_of(player)?;

        let (turn, retired) = self.registry.with_battle_retiring(
            &id,
            |battle| -> EngineResult<(ActionOutcome, BattleSnapshot)> {
                let target = battle
                    .opponent_of(player)
                    .map(|p| p.id.clone())
                    .ok_or_else(|| BattleError::ParticipantNotFound(player.clone()))?;
                battle.set_action(player, action_name, &target)?;
                let outcome = battle.process_turn()?;
                Ok((outcome, battle.snapshot()))
            },
        )?;
        let (outcome, snapshot) = match turn {
            Ok(turn) => turn,
            Err(e) => {
                tracing::debug!(battle_id = %id, player = %player, error = %e, "Action rejected");
                return Err(e.into());
            }
        };

        match retired {
            Some(battle) => self.completed(id, vec![outcome], snapshot, battle),
            None => self.autoplay(id, vec![outcome], snapshot).await,
        }
    }

    /// Concede the player's battle and settle it.
    pub fn forfeit(&self, player: &ParticipantId) -> Result<BattleReport> {
        let id = self.battle_of(player)?;
        let (forfeited, retired) = self
            .registry
            .with_battle_retiring(&id, |battle| battle.forfeit(player))?;
        forfeited?;
        let battle = retired.ok_or(ServerError::BattleNotFound(id))?;
        self.settle(battle)
    }

    /// Current view of the player's battle.
    pub fn status(&self, player: &ParticipantId) -> Result<BattleStatus> {
        let id = self.battle_of(player)?;
        self.registry.with_battle(&id, |battle| BattleStatus {
            snapshot: battle.snapshot(),
            recent_log: battle.log_tail(DEFAULT_LOG_TAIL).to_vec(),
        })
    }

    fn character(&self, player: &ParticipantId) -> Result<CharacterRecord> {
        self.store
            .get(player)?
            .ok_or_else(|| ServerError::NoCharacter(player.clone()))
    }

    fn ensure_free(&self, player: &ParticipantId) -> Result<()> {
        match self.registry.find_by_participant(player)? {
            Some(_) => Err(ServerError::AlreadyInBattle(player.clone())),
            None => Ok(()),
        }
    }

    fn battle_of(&self, player: &ParticipantId) -> Result<BattleId> {
        self.registry
            .find_by_participant(player)?
            .ok_or_else(|| ServerError::NotInBattle(player.clone()))
    }

    async fn launch(
        &self,
        channel_id: &str,
        a: CombatParticipant,
        b: CombatParticipant,
        dice: Box<dyn Dice>,
    ) -> Result<BattleUpdate> {
        let mut battle = Battle::new(channel_id, a, b, dice)?.with_chart(Arc::clone(&self.chart));
        battle.start()?;
        let snapshot = battle.snapshot();
        let id = self.registry.insert(battle)?;
        self.autoplay(id, Vec::new(), snapshot).await
    }

    /// Play consecutive NPC turns, pausing before each one.
    ///
    /// The lock is released while pausing. If the battle leaves the registry
    /// meanwhile, the turns played so far are returned with `ended` set.
    async fn autoplay(
        &self,
        id: BattleId,
        mut outcomes: Vec<ActionOutcome>,
        mut snapshot: BattleSnapshot,
    ) -> Result<BattleUpdate> {
        let delay = self.config.npc_turn_delay();
        loop {
            let npc_to_move = live(self.registry.with_battle(&id, |battle| {
                battle.state() == BattleState::Ongoing && battle.current_participant().is_npc
            }))?;
            match npc_to_move {
                Some(true) => {}
                Some(false) => break,
                None => return Ok(Self::ended_elsewhere(id, outcomes, snapshot)),
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            let played = live(self.registry.with_battle_retiring(&id, |battle| {
                battle.process_turn().map(|outcome| (outcome, battle.snapshot()))
            }))?;
            let Some((turn, retired)) = played else {
                return Ok(Self::ended_elsewhere(id, outcomes, snapshot));
            };
            let (outcome, latest) = turn?;
            outcomes.push(outcome);
            snapshot = latest;

            if let Some(battle) = retired {
                return self.completed(id, outcomes, snapshot, battle);
            }
        }

        Ok(BattleUpdate {
            battle_id: id,
            outcomes,
            snapshot,
            report: None,
            ended: false,
        })
    }

    fn ended_elsewhere(
        id: BattleId,
        outcomes: Vec<ActionOutcome>,
        snapshot: BattleSnapshot,
    ) -> BattleUpdate {
        tracing::debug!(battle_id = %id, turns = outcomes.len(), "Battle ended during NPC pacing");
        BattleUpdate {
            battle_id: id,
            outcomes,
            snapshot,
            report: None,
            ended: true,
        }
    }

    fn completed(
        &self,
        id: BattleId,
        outcomes: Vec<ActionOutcome>,
        snapshot: BattleSnapshot,
        battle: Battle,
    ) -> Result<BattleUpdate> {
        let report = self.settle(battle)?;
        Ok(BattleUpdate {
            battle_id: id,
            outcomes,
            snapshot,
            report: Some(report),
            ended: true,
        })
    }

    /// Credit the winner of a retired battle.
    fn settle(&self, battle: Battle) -> Result<BattleReport> {
        let result = battle.result_with(&self.config.rewards)?;

        let rewards_applied = result.rewards_apply()
            && match self.store.add_currency(&result.winner, result.rewards.currency) {
                Ok(balance) => {
                    tracing::debug!(winner = %result.winner, balance, "Currency credited");
                    true
                }
                Err(e) => {
                    tracing::warn!(winner = %result.winner, error = %e, "Failed to credit currency");
                    false
                }
            };

        tracing::info!(
            battle_id = %battle.id(),
            winner = %result.winner,
            rounds = result.rounds,
            experience = result.rewards.experience,
            currency = result.rewards.currency,
            rewards_applied,
            "Battle settled"
        );

        Ok(BattleReport {
            battle_id: battle.id().clone(),
            result,
            rewards_applied,
            log: battle.log().to_vec(),
        })
    }
}

/// Treat a battle that is no longer registered as absent rather than an error.
fn live<T>(result: Result<T>) -> Result<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(ServerError::BattleNotFound(_)) => Ok(None),
        Err(e) => Err(e),
    }
}
