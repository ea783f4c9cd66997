//! Command-line driver: runs one duel against loaded content and prints what happened.
mod auto;

use std::path::PathBuf;

use anyhow::{Result, anyhow};
use auto::AutoCollector;
use clap::{Parser, ValueEnum};
use combat_content::ContentFactory;
use combat_core::{CombatantState, ItemKey, LocationId, NpcKey, PlayerId};
use combat_runtime::{
    DuelReport, DuelService, InMemoryStore, OracleManager, RuntimeConfig, TracingNotifier,
};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

/// Run a duel with automatically played characters
#[derive(Parser)]
#[command(name = "combat-sim")]
#[command(version)]
struct Cli {
    /// Directory holding items.ron, npcs.ron and combat.toml
    #[arg(long, default_value = combat_content::SAMPLE_DATA_DIR)]
    data: PathBuf,

    #[arg(long, value_enum, default_value_t = Kind::Scavenge)]
    kind: Kind,

    /// NPC template key
    #[arg(long, default_value = "walker_weak")]
    npc: String,

    /// Number of players (boss fights only; scavenging is always solo)
    #[arg(long, default_value_t = 1)]
    players: u64,

    /// Seed for a reproducible run; overrides COMBAT_RNG_SEED
    #[arg(long)]
    seed: Option<u64>,

    /// Print the report as JSON
    #[arg(long)]
    json: bool,
}

#[derive(Clone, Copy, ValueEnum)]
enum Kind {
    Scavenge,
    Boss,
}

/// Starting kit for every simulated player.
const LOADOUT: &[(&str, bool)] = &[
    ("knife", false),
    ("luger", true),
    (".22LR_bullet", false),
    (".22LR_bullet", false),
    (".22LR_bullet", false),
    ("bandage", false),
    ("bandage", false),
    ("cloth_armor", true),
    ("cloth_helmet", true),
];

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if it exists (silently ignore if not found)
    let _ = dotenvy::dotenv();
    setup_logging();

    let cli = Cli::parse();
    let content = ContentFactory::new(&cli.data).load_all()?;
    let oracles = OracleManager::from_content(content);

    let mut config = RuntimeConfig::from_env();
    if cli.seed.is_some() {
        config.rng_seed = cli.seed;
    }
    let store = InMemoryStore::with_lock_timeout(config.lock_timeout);
    let players = equip(&store, &oracles, cli.players)?;

    let service = DuelService::builder()
        .config(config)
        .store(store.clone())
        .oracles(oracles.clone())
        .collector(AutoCollector::new(store.clone(), oracles))
        .notifier(TracingNotifier)
        .build()?;

    let location = LocationId(1);
    let npc = NpcKey::from(cli.npc.as_str());
    let handle = match cli.kind {
        Kind::Scavenge => {
            let player = players
                .first()
                .copied()
                .ok_or_else(|| anyhow!("scavenging needs a player"))?;
            service.start_scavenge(location, player, &npc).await?
        }
        Kind::Boss => service.start_boss(location, players.clone(), &npc).await?,
    };
    let report = handle.join().await?;

    if cli.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(&report, &store, &players)?;
    }
    Ok(())
}

fn setup_logging() {
    let env_filter = tracing_subscriber::EnvFilter::from_default_env()
        .add_directive(tracing::Level::INFO.into());
    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn equip(store: &InMemoryStore, oracles: &OracleManager, count: u64) -> Result<Vec<PlayerId>> {
    let catalog = oracles.catalog();
    let mut players = Vec::new();
    for id in 1..=count {
        let player = PlayerId(id);
        store.insert_combatant(CombatantState::new(player, 100))?;
        for (key, equipped) in LOADOUT {
            let key = ItemKey::from(*key);
            let durability = catalog.item(&key)?.durability;
            store.give_item(player, key, durability, *equipped)?;
        }
        players.push(player);
    }
    Ok(players)
}

fn print_report(report: &DuelReport, store: &InMemoryStore, players: &[PlayerId]) -> Result<()> {
    for turn in &report.turns {
        print!("{turn}");
    }
    println!();
    println!("{} ({}): {}", report.duel_id, report.kind.as_str(), report.outcome);
    for player in players {
        if let Some(row) = store.combatant_row(*player)? {
            println!(
                "  {player}: {}/{} hp, {} kills, {} deaths, {} xp",
                row.health, row.max_health, row.kills, row.deaths, row.xp
            );
        }
    }
    for award in &report.loot {
        println!("  {} looted {}", award.player, award.template);
    }
    Ok(())
}
