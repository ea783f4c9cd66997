use std::time::Duration;

use async_trait::async_trait;
use combat_content::{ContentFactory, LoadedContent};
use combat_core::{ActionChoice, CombatantState, ItemId, LocationId, NpcKey, PlayerId};
use combat_runtime::{
    ActionCollector, ActionPrompt, Actor, DuelOutcome, DuelService, DuelServiceBuilder,
    IdleCollector, InMemoryStore, OracleManager, PlayerChoice, RuntimeConfig, RuntimeError,
    ScriptedCollector, TurnMessage,
};
use tokio::sync::mpsc;

const CAMP: LocationId = LocationId(7);
const HEALTHY: u32 = 10_000;

fn content() -> LoadedContent {
    ContentFactory::sample().load_all().unwrap()
}

/// Content where every flee attempt succeeds.
fn easy_escape() -> LoadedContent {
    let mut content = content();
    content.config.flee.scavenge_pct = 100;
    content.config.flee.boss_pct = 100;
    content
}

fn builder(store: &InMemoryStore, content: LoadedContent) -> DuelServiceBuilder {
    DuelService::builder()
        .config(RuntimeConfig {
            action_timeout: Duration::from_secs(1),
            ready_timeout: Duration::from_secs(1),
            rng_seed: Some(42),
            ..RuntimeConfig::default()
        })
        .store(store.clone())
        .oracles(OracleManager::from_content(content))
}

fn player(store: &InMemoryStore, id: u64) -> PlayerId {
    let id = PlayerId(id);
    store.insert_combatant(CombatantState::new(id, HEALTHY)).unwrap();
    id
}

fn walker() -> NpcKey {
    NpcKey::from("walker_weak")
}

/// Holds the prompt open and never answers.
struct SilentCollector;

#[async_trait]
impl ActionCollector for SilentCollector {
    async fn collect(&self, _prompt: &ActionPrompt, choices: mpsc::Sender<PlayerChoice>) {
        let _held = choices;
        std::future::pending::<()>().await;
    }
}

/// A player who never acts sits through every turn until the cap.
#[tokio::test]
async fn idle_duel_ends_in_a_tie_at_the_turn_cap() {
    let store = InMemoryStore::new();
    let p = player(&store, 1);
    let service = builder(&store, content()).collector(IdleCollector).build().unwrap();

    let handle = service.start_scavenge(CAMP, p, &walker()).await.unwrap();
    let report = handle.join().await.unwrap();

    assert_eq!(report.outcome, DuelOutcome::TurnLimit);
    assert_eq!(report.turns.len(), 20);
    assert!(
        report
            .turns
            .iter()
            .all(|turn| turn.messages.contains(&TurnMessage::NoAction { player: p }))
    );

    let row = store.combatant_row(p).unwrap().unwrap();
    assert!(!row.in_combat);
    assert!(row.health < HEALTHY, "the walker should have landed hits");
    assert!(!service.registry().is_active(CAMP));
}

#[tokio::test]
async fn successful_flee_ends_the_duel() {
    let store = InMemoryStore::new();
    let p = player(&store, 1);
    let collector = ScriptedCollector::new().every_turn(vec![(p, ActionChoice::Flee)]);
    let service = builder(&store, easy_escape()).collector(collector).build().unwrap();

    let report = service
        .start_scavenge(CAMP, p, &walker())
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(report.outcome, DuelOutcome::AllFled);
    assert_eq!(report.turns.len(), 1);
    assert!(report.turns[0].messages.contains(&TurnMessage::Fled { player: p }));
    assert!(!store.combatant_row(p).unwrap().unwrap().in_combat);
}

/// Kill a walker with an unbreakable knife and keep what it dropped.
#[tokio::test]
async fn killing_the_npc_awards_xp_and_loot() {
    let store = InMemoryStore::new();
    let p = player(&store, 1);
    let knife = store.give_item(p, "knife", None, true).unwrap();
    let attack = ActionChoice::Attack {
        weapon: knife,
        ammo: None,
        limb: None,
    };
    let collector = ScriptedCollector::new().every_turn(vec![(p, attack)]);
    let service = builder(&store, content()).collector(collector).build().unwrap();

    let report = service
        .start_scavenge(CAMP, p, &walker())
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(report.outcome, DuelOutcome::NpcKilled { by: p });
    let last = report.turns.last().unwrap();
    assert!(last.messages.contains(&TurnMessage::NpcKilled {
        npc: "Walker".into(),
        by: p,
    }));

    let row = store.combatant_row(p).unwrap().unwrap();
    assert_eq!(row.kills, 1);
    assert_eq!(row.xp, 20);
    assert!(!row.in_combat);

    let inventory = store.inventory_of(p).unwrap();
    assert!(inventory.iter().any(|item| item.id == knife));
    for award in &report.loot {
        assert_eq!(award.player, p);
        assert!(inventory.iter().any(|item| item.id == award.item));
    }
}

/// A player the NPC kills loses everything they carried.
#[tokio::test]
async fn death_in_a_duel_loses_the_inventory() {
    let store = InMemoryStore::new();
    let p = PlayerId(1);
    store
        .insert_combatant(CombatantState::new(p, 100).with_health(1))
        .unwrap();
    store.give_item(p, "knife", Some(2), true).unwrap();
    store.give_item(p, "bandage", Some(1), false).unwrap();
    let service = builder(&store, content()).collector(IdleCollector).build().unwrap();

    let report = service
        .start_scavenge(CAMP, p, &walker())
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(report.outcome, DuelOutcome::PlayersDefeated);
    assert!(report.turns[0].messages.iter().any(|message| matches!(
        message,
        TurnMessage::Died { player, .. } if *player == p
    )));
    let row = store.combatant_row(p).unwrap().unwrap();
    assert_eq!(row.deaths, 1);
    assert_eq!(row.health, row.max_health);
    assert!(!row.in_combat);
    assert!(store.inventory_of(p).unwrap().is_empty());
    assert!(store.ground_items(CAMP).unwrap().is_empty());
    assert!(!service.registry().is_active(CAMP));
}

/// Equipment missing from the catalog ends the duel and still clears the flags.
#[tokio::test]
async fn broken_catalog_reference_aborts_and_cleans_up() {
    let store = InMemoryStore::new();
    let p = player(&store, 1);
    store.give_item(p, "mystery", None, true).unwrap();
    let service = builder(&store, content()).collector(IdleCollector).build().unwrap();

    let report = service
        .start_scavenge(CAMP, p, &walker())
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert!(matches!(
        &report.outcome,
        DuelOutcome::Aborted { reason } if reason.starts_with("CATALOG_ITEM_NOT_FOUND")
    ));
    assert_eq!(report.turns.len(), 1);
    assert!(!store.combatant_row(p).unwrap().unwrap().in_combat);
    assert_eq!(store.inventory_of(p).unwrap().len(), 1);
    assert!(!service.registry().is_active(CAMP));
}

/// An item that no longer exists skips the turn and writes nothing.
#[tokio::test]
async fn stale_item_skips_the_turn() {
    let store = InMemoryStore::new();
    let p = player(&store, 1);
    let bandage = store.give_item(p, "bandage", Some(1), false).unwrap();
    let collector = ScriptedCollector::new()
        .on_turn(1, vec![(p, ActionChoice::UseMedical(ItemId(999)))])
        .on_turn(2, vec![(p, ActionChoice::Flee)]);
    let service = builder(&store, easy_escape()).collector(collector).build().unwrap();

    let report = service
        .start_scavenge(CAMP, p, &walker())
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert!(report.turns[0].messages.iter().any(|message| matches!(
        message,
        TurnMessage::Skipped { actor: Actor::Player(player), .. } if *player == p
    )));
    assert_eq!(report.outcome, DuelOutcome::AllFled);
    assert!(
        store
            .inventory_of(p)
            .unwrap()
            .iter()
            .any(|item| item.id == bandage)
    );
}

/// Players who never answer take no action once the prompt times out.
#[tokio::test(start_paused = true)]
async fn silent_players_time_out_every_turn() {
    let store = InMemoryStore::new();
    let p = player(&store, 1);
    let service = builder(&store, content())
        .config(RuntimeConfig {
            action_timeout: Duration::from_secs(30),
            rng_seed: Some(3),
            ..RuntimeConfig::default()
        })
        .collector(SilentCollector)
        .build()
        .unwrap();

    let report = service
        .start_scavenge(CAMP, p, &walker())
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(report.outcome, DuelOutcome::TurnLimit);
    assert!(report.turns[0].messages.contains(&TurnMessage::NoAction { player: p }));
}

#[tokio::test]
async fn one_duel_per_location_until_cancelled() {
    let store = InMemoryStore::new();
    let (p1, p2) = (player(&store, 1), player(&store, 2));
    let service = builder(&store, content())
        .config(RuntimeConfig {
            action_timeout: Duration::from_secs(600),
            ..RuntimeConfig::default()
        })
        .collector(SilentCollector)
        .build()
        .unwrap();

    let first = service.start_scavenge(CAMP, p1, &walker()).await.unwrap();
    let busy = service.start_scavenge(CAMP, p2, &walker()).await.err().unwrap();
    assert!(matches!(busy, RuntimeError::DuelAlreadyActive { location, .. } if location == CAMP));

    let elsewhere = service
        .start_scavenge(LocationId(8), p2, &walker())
        .await
        .unwrap();
    elsewhere.cancel();
    elsewhere.join().await.unwrap();

    first.cancel();
    let report = first.join().await.unwrap();
    assert_eq!(report.outcome, DuelOutcome::Cancelled);
    assert!(!store.combatant_row(p1).unwrap().unwrap().in_combat);
    assert!(!service.registry().is_active(CAMP));

    let again = service.start_scavenge(CAMP, p2, &walker()).await.unwrap();
    again.cancel();
    assert_eq!(again.join().await.unwrap().outcome, DuelOutcome::Cancelled);
}

#[tokio::test]
async fn players_already_fighting_cannot_start_another_duel() {
    let store = InMemoryStore::new();
    let mut busy = CombatantState::new(PlayerId(1), HEALTHY);
    busy.in_combat = true;
    store.insert_combatant(busy).unwrap();
    let service = builder(&store, content()).collector(IdleCollector).build().unwrap();

    let err = service
        .start_scavenge(CAMP, PlayerId(1), &walker())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RuntimeError::AlreadyInCombat(PlayerId(1))));
    assert!(!service.registry().is_active(CAMP));

    let err = service
        .start_boss(CAMP, Vec::new(), &NpcKey::from("cain"))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RuntimeError::NoPlayers));
}

/// A boss fight never starts unless every invited player confirms.
#[tokio::test]
async fn boss_fight_needs_every_confirmation() {
    let store = InMemoryStore::new();
    let (p1, p2) = (player(&store, 1), player(&store, 2));
    let collector = ScriptedCollector::new().declining(vec![p2]);
    let service = builder(&store, content()).collector(collector).build().unwrap();

    let report = service
        .start_boss(CAMP, vec![p1, p2], &NpcKey::from("cain"))
        .await
        .unwrap()
        .join()
        .await
        .unwrap();

    assert_eq!(report.outcome, DuelOutcome::NotReady);
    assert!(report.turns.is_empty());
    for p in [p1, p2] {
        assert!(!store.combatant_row(p).unwrap().unwrap().in_combat);
    }

    let err = service
        .start_boss(CAMP, vec![p1], &walker())
        .await
        .err()
        .unwrap();
    assert!(matches!(err, RuntimeError::Rejected(_)));
}
