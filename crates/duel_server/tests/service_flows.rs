//! End-to-end command flows through the arena service.

use std::sync::Arc;
use std::time::Duration;

use duel_core::battle::BattleState;
use duel_core::dice::SeededDice;
use duel_core::element::Element;
use duel_core::error::BattleError;
use duel_core::participant::ParticipantId;
use duel_core::stats::CharacterSheet;
use duel_server::{
    ArenaService, BattleUpdate, CharacterRecord, CharacterStore, InMemoryCharacterStore,
    ServerConfig, ServerError,
};

const CHANNEL: &str = "arena";

fn service_with(records: Vec<CharacterRecord>) -> (ArenaService, Arc<InMemoryCharacterStore>) {
    service_with_config(
        ServerConfig {
            npc_turn_delay_ms: 0,
            ..ServerConfig::default()
        },
        records,
    )
}

fn service_with_config(
    config: ServerConfig,
    records: Vec<CharacterRecord>,
) -> (ArenaService, Arc<InMemoryCharacterStore>) {
    let store = Arc::new(InMemoryCharacterStore::with_records(records));
    let service = ArenaService::new(config, store.clone())
        .expect("default chart loads")
        .with_dice_source(|| Box::new(SeededDice::new(7)));
    (service, store)
}

fn hero(owner: &str, value: u32) -> CharacterRecord {
    CharacterRecord::new(owner, format!("Hero {owner}"), CharacterSheet::uniform(value, Element::Fire))
}

fn id(owner: &str) -> ParticipantId {
    ParticipantId::new(owner)
}

/// Player 1 challenges player 2, who accepts.
async fn start_pvp(service: &ArenaService) -> BattleUpdate {
    service
        .challenge(&id("1"), "One", &id("2"), CHANNEL)
        .expect("challenge issued");
    service
        .accept(&id("2"), "Two", &id("1"))
        .await
        .expect("challenge accepted")
}

async fn play_until_report(
    service: &ArenaService,
    player: &ParticipantId,
    action: &str,
    mut update: BattleUpdate,
) -> BattleUpdate {
    for _ in 0..200 {
        if update.report.is_some() {
            return update;
        }
        update = service.act(player, action).await.expect("player action");
    }
    panic!("battle did not finish");
}

#[tokio::test]
async fn starting_without_a_character_is_rejected() {
    let (service, _) = service_with(vec![]);

    let result = service
        .start_npc_battle(&id("1"), "Nobody", CHANNEL, "Goblin", None)
        .await;

    assert_eq!(result.unwrap_err(), ServerError::NoCharacter(id("1")));
    assert!(service.registry().is_empty().unwrap());
}

#[tokio::test]
async fn second_battle_for_busy_player_is_rejected() {
    let (service, _) = service_with(vec![hero("1", 300)]);

    let update = service
        .start_npc_battle(&id("1"), "Hero", CHANNEL, "Training Dummy", None)
        .await
        .unwrap();
    assert_eq!(update.snapshot.state, BattleState::Ongoing);
    assert!(update.outcomes.is_empty(), "the faster hero moves first");

    let again = service
        .start_npc_battle(&id("1"), "Hero", CHANNEL, "Goblin", None)
        .await;
    assert_eq!(again.unwrap_err(), ServerError::AlreadyInBattle(id("1")));
    assert_eq!(service.registry().len().unwrap(), 1);
}

#[tokio::test]
async fn strong_hero_beats_training_dummy_and_is_paid() {
    let (service, store) = service_with(vec![hero("1", 300)]);
    let player = id("1");

    let start = service
        .start_npc_battle(&player, "Hero", CHANNEL, "Training Dummy", None)
        .await
        .unwrap();
    let finished = play_until_report(&service, &player, "attack", start).await;
    let report = finished.report.unwrap();

    assert_eq!(report.result.winner, player);
    assert!(report.result.loser.is_npc());
    assert!(report.rewards_applied);
    assert_eq!(finished.snapshot.state, BattleState::Complete);
    assert!(report.log.last().unwrap().ends_with("wins the battle!"));

    let balance = store.get(&player).unwrap().unwrap().currency;
    assert_eq!(balance, u64::from(report.result.rewards.currency));
    assert!(balance > 0);

    assert!(service.registry().is_empty().unwrap());
    assert_eq!(
        service.act(&player, "attack").await.unwrap_err(),
        ServerError::NotInBattle(player)
    );
}

#[tokio::test]
async fn npc_victory_pays_nothing() {
    let (service, store) = service_with(vec![hero("1", 1)]);
    let player = id("1");

    let start = service
        .start_npc_battle(&player, "Hero", CHANNEL, "Dragon Lord", None)
        .await
        .unwrap();
    let finished = play_until_report(&service, &player, "defend", start).await;
    let report = finished.report.unwrap();

    assert!(report.result.winner.is_npc());
    assert_eq!(report.result.loser, player);
    assert!(!report.rewards_applied);
    assert_eq!(store.get(&player).unwrap().unwrap().currency, 0);
    assert!(service.registry().is_empty().unwrap());
}

#[tokio::test]
async fn pvp_out_of_turn_action_is_rejected() {
    let (service, _) = service_with(vec![hero("1", 50), hero("2", 40)]);

    let start = start_pvp(&service).await;
    assert_eq!(start.snapshot.current_turn, id("1"));

    assert_eq!(
        service.act(&id("2"), "attack").await.unwrap_err(),
        ServerError::Battle(BattleError::NotYourTurn)
    );
    let status = service.status(&id("1")).unwrap();
    assert_eq!(status.snapshot.current_turn, id("1"));
}

#[tokio::test]
async fn pvp_forfeit_credits_the_other_player() {
    let (service, store) = service_with(vec![hero("1", 50), hero("2", 40)]);

    start_pvp(&service).await;
    let report = service.forfeit(&id("2")).unwrap();

    assert_eq!(report.result.winner, id("1"));
    assert_eq!(report.result.loser, id("2"));
    assert!(report.rewards_applied);
    assert!(report.log.last().unwrap().contains("has forfeited the battle!"));
    assert_eq!(
        store.get(&id("1")).unwrap().unwrap().currency,
        u64::from(report.result.rewards.currency)
    );
    assert_eq!(store.get(&id("2")).unwrap().unwrap().currency, 0);
    assert!(service.registry().is_empty().unwrap());
}

#[tokio::test]
async fn status_shows_recent_log_tail() {
    let (service, _) = service_with(vec![hero("1", 50), hero("2", 40)]);

    start_pvp(&service).await;
    assert_eq!(service.status(&id("2")).unwrap().recent_log.len(), 1);

    service.act(&id("1"), "defend").await.unwrap();
    service.act(&id("2"), "defend").await.unwrap();

    let status = service.status(&id("1")).unwrap();
    let log = &status.snapshot.log;
    assert!(log.len() >= 3);
    assert_eq!(status.recent_log.len(), 3);
    assert_eq!(status.recent_log.as_slice(), &log[log.len() - 3..]);
}

#[tokio::test]
async fn unknown_action_name_is_rejected() {
    let (service, _) = service_with(vec![hero("1", 50), hero("2", 40)]);

    start_pvp(&service).await;

    assert_eq!(
        service.act(&id("1"), "dance").await.unwrap_err(),
        ServerError::Battle(BattleError::InvalidAction("dance".to_string()))
    );
    assert_eq!(service.status(&id("1")).unwrap().snapshot.round, 1);
}

#[tokio::test]
async fn not_in_battle_queries_fail() {
    let (service, _) = service_with(vec![hero("1", 50)]);

    assert_eq!(
        service.status(&id("1")).unwrap_err(),
        ServerError::NotInBattle(id("1"))
    );
    assert_eq!(
        service.forfeit(&id("1")).unwrap_err(),
        ServerError::NotInBattle(id("1"))
    );
}

#[tokio::test]
async fn accepted_challenge_starts_battle_in_its_channel() {
    let (service, _) = service_with(vec![hero("1", 50), hero("2", 40)]);

    let challenge = service.challenge(&id("1"), "One", &id("2"), "duel-hall").unwrap();
    assert_eq!(challenge.target, id("2"));
    assert_eq!(service.challenges().len().unwrap(), 1);
    assert!(service.registry().is_empty().unwrap());

    let start = service.accept(&id("2"), "Two", &id("1")).await.unwrap();

    assert_eq!(start.snapshot.channel_id, "duel-hall");
    assert_eq!(start.snapshot.participants[0].name, "One");
    assert_eq!(start.snapshot.participants[1].name, "Two");
    assert!(service.challenges().is_empty().unwrap());
    assert_eq!(service.registry().len().unwrap(), 1);
}

#[tokio::test]
async fn only_the_target_answers_a_challenge() {
    let (service, _) = service_with(vec![hero("1", 50), hero("2", 40), hero("3", 40)]);
    service.challenge(&id("1"), "One", &id("2"), CHANNEL).unwrap();

    assert_eq!(
        service.accept(&id("3"), "Three", &id("1")).await.unwrap_err(),
        ServerError::NotChallengeTarget(id("3"))
    );
    assert_eq!(
        service.decline(&id("3"), &id("1")).unwrap_err(),
        ServerError::NotChallengeTarget(id("3"))
    );
    assert_eq!(service.challenges().len().unwrap(), 1);

    let declined = service.decline(&id("2"), &id("1")).unwrap();
    assert_eq!(declined.challenger, id("1"));
    assert_eq!(
        service.accept(&id("2"), "Two", &id("1")).await.unwrap_err(),
        ServerError::ChallengeNotFound(id("1"))
    );
    assert!(service.registry().is_empty().unwrap());
}

#[tokio::test]
async fn expired_challenge_cannot_be_accepted() {
    let (service, _) = service_with_config(
        ServerConfig {
            npc_turn_delay_ms: 0,
            challenge_ttl_secs: 0,
            ..ServerConfig::default()
        },
        vec![hero("1", 50), hero("2", 40)],
    );
    service.challenge(&id("1"), "One", &id("2"), CHANNEL).unwrap();

    assert_eq!(
        service.accept(&id("2"), "Two", &id("1")).await.unwrap_err(),
        ServerError::ChallengeExpired(id("1"))
    );
    assert!(service.challenges().is_empty().unwrap());
    assert!(service.registry().is_empty().unwrap());
}

#[tokio::test]
async fn challenge_needs_two_free_players_with_characters() {
    let (service, _) = service_with(vec![hero("1", 300), hero("2", 40)]);

    assert_eq!(
        service.challenge(&id("1"), "One", &id("1"), CHANNEL).unwrap_err(),
        ServerError::SelfChallenge
    );
    assert_eq!(
        service.challenge(&id("1"), "One", &id("9"), CHANNEL).unwrap_err(),
        ServerError::NoCharacter(id("9"))
    );

    service
        .start_npc_battle(&id("1"), "One", CHANNEL, "Training Dummy", None)
        .await
        .unwrap();
    assert_eq!(
        service.challenge(&id("2"), "Two", &id("1"), CHANNEL).unwrap_err(),
        ServerError::AlreadyInBattle(id("1"))
    );
    assert!(service.challenges().is_empty().unwrap());
}

#[tokio::test]
async fn sweeper_drops_expired_challenges() {
    let (service, _) = service_with_config(
        ServerConfig {
            challenge_ttl_secs: 0,
            ..ServerConfig::default()
        },
        vec![hero("1", 50), hero("2", 40)],
    );
    service.challenge(&id("1"), "One", &id("2"), CHANNEL).unwrap();

    let sweeper = service.spawn_sweeper();
    for _ in 0..100 {
        if service.challenges().is_empty().unwrap() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    sweeper.abort();

    assert!(service.challenges().is_empty().unwrap());
}

#[tokio::test]
async fn npc_turn_follows_player_turn_after_pause() {
    let (service, _) = service_with_config(
        ServerConfig {
            npc_turn_delay_ms: 10,
            ..ServerConfig::default()
        },
        vec![hero("1", 100)],
    );
    let player = id("1");
    service
        .start_npc_battle(&player, "Hero", CHANNEL, "Training Dummy", None)
        .await
        .unwrap();

    let update = service.act(&player, "attack").await.unwrap();

    assert_eq!(update.outcomes.len(), 2);
    assert_eq!(update.outcomes[0].actor, player);
    assert!(update.outcomes[1].actor.is_npc());
    assert!(!update.ended);
    assert!(update.report.is_none());
    assert_eq!(update.snapshot.current_turn, player);
}

#[tokio::test]
async fn forfeit_while_npc_turn_is_pending_settles_once() {
    let (service, store) = service_with_config(
        ServerConfig {
            npc_turn_delay_ms: 300,
            ..ServerConfig::default()
        },
        vec![hero("1", 100)],
    );
    let service = Arc::new(service);
    let player = id("1");
    service
        .start_npc_battle(&player, "Hero", CHANNEL, "Training Dummy", None)
        .await
        .unwrap();

    let acting = {
        let service = Arc::clone(&service);
        let player = player.clone();
        tokio::spawn(async move { service.act(&player, "attack").await })
    };
    tokio::time::sleep(Duration::from_millis(100)).await;

    let report = service.forfeit(&player).unwrap();
    assert!(report.result.winner.is_npc());
    assert!(!report.rewards_applied);

    let update = acting.await.unwrap().unwrap();
    assert!(update.ended);
    assert!(update.report.is_none());
    assert_eq!(update.outcomes.len(), 1);
    assert_eq!(update.outcomes[0].actor, player);

    assert!(service.registry().is_empty().unwrap());
    assert_eq!(store.get(&player).unwrap().unwrap().currency, 0);
}
