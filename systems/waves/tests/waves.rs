use std::time::Duration;

use celo_riders_core::{EnemyKind, Event, ObstacleKind, PowerUpKind, SpeedMultiplier, WaveNumber};
use celo_riders_system_waves::{
    WaveAnnouncement, WaveManager, WaveTable, WaveTableError, WAVE_TRANSITION,
};
use serde::Deserialize;

fn assert_speed(manager: &WaveManager, expected: f32) {
    let actual = manager.speed_multiplier().get();
    assert!(
        (actual - expected).abs() < 1e-5,
        "expected speed {expected}, found {actual}"
    );
}

fn finish_transition(manager: &mut WaveManager) {
    manager.update(WAVE_TRANSITION);
    assert!(!manager.is_transitioning());
}

#[test]
fn completing_wave_one_advances_and_boosts_speed() {
    let mut manager = WaveManager::default();
    let mut events = Vec::new();

    manager.complete_challenge(&mut events);

    assert_eq!(manager.current_wave().get(), 2);
    assert_speed(&manager, 1.25);
    assert_eq!(manager.challenges_completed(), 0);
    assert!(manager.is_transitioning());
    assert_eq!(events.len(), 3);
    assert!(matches!(events[0], Event::SpeedChanged { .. }));
    assert_eq!(
        events[1],
        Event::WaveChanged {
            wave: WaveNumber::new(2).expect("wave two"),
        }
    );
    assert!(matches!(events[2], Event::SpeedChanged { .. }));
}

#[test]
fn every_advance_before_the_final_wave_adds_a_quarter() {
    let mut manager = WaveManager::default();
    let mut events = Vec::new();

    manager.complete_challenge(&mut events);
    finish_transition(&mut manager);
    manager.complete_challenge(&mut events);

    assert_eq!(manager.current_wave(), WaveNumber::FINAL);
    assert_speed(&manager, 1.5);
}

#[test]
fn clearing_the_final_wave_triggers_victory_once() {
    let mut manager = WaveManager::default();
    let mut events = Vec::new();
    manager.complete_challenge(&mut events);
    finish_transition(&mut manager);
    manager.complete_challenge(&mut events);
    finish_transition(&mut manager);
    events.clear();

    manager.complete_challenge(&mut events);
    manager.complete_challenge(&mut events);
    manager.complete_challenge(&mut events);

    let victories = events
        .iter()
        .filter(|event| matches!(event, Event::Victory))
        .count();
    assert_eq!(victories, 1);
    assert!(manager.is_wave_complete());
    assert!(manager.is_transitioning());
    assert_eq!(manager.current_wave(), WaveNumber::FINAL);
    assert_speed(&manager, 1.65);

    manager.update(Duration::from_secs(60));
    assert!(manager.is_transitioning(), "victory holds the transition flag");
}

#[test]
fn completions_during_the_announcement_still_advance() {
    let mut manager = WaveManager::default();
    let mut events = Vec::new();

    manager.complete_challenge(&mut events);
    manager.complete_challenge(&mut events);

    assert_eq!(manager.current_wave(), WaveNumber::FINAL);
    assert_speed(&manager, 1.5);
    assert!(manager.is_transitioning());

    events.clear();
    manager.complete_challenge(&mut events);

    assert_eq!(events.last(), Some(&Event::Victory));
    assert!(manager.is_wave_complete());
    assert_speed(&manager, 1.65);
}

#[test]
fn a_new_wave_restarts_the_announcement() {
    let mut manager = WaveManager::default();
    let mut events = Vec::new();

    manager.complete_challenge(&mut events);
    manager.update(Duration::from_millis(2_000));
    manager.complete_challenge(&mut events);
    manager.update(Duration::from_millis(2_000));

    assert!(manager.is_transitioning());
    manager.update(Duration::from_millis(500));
    assert!(!manager.is_transitioning());
}

#[test]
fn end_game_resets_speed_and_holds_transition() {
    let mut manager = WaveManager::default();
    let mut events = Vec::new();
    manager.complete_challenge(&mut events);
    events.clear();

    manager.trigger_end_game(&mut events);

    assert_eq!(
        events,
        vec![Event::SpeedChanged {
            multiplier: SpeedMultiplier::BASELINE,
        }]
    );
    assert_speed(&manager, 1.0);
    manager.update(WAVE_TRANSITION);
    assert!(manager.is_transitioning());

    events.clear();
    manager.complete_challenge(&mut events);
    assert!(events.is_empty(), "ended runs ignore challenge completions");
}

#[test]
fn unlocks_grow_with_each_wave() {
    let mut manager = WaveManager::default();
    let mut events = Vec::new();

    assert!(manager.is_obstacle_unlocked(ObstacleKind::Trash));
    assert!(!manager.is_obstacle_unlocked(ObstacleKind::Cone));
    assert!(!manager.is_power_up_unlocked(PowerUpKind::FireTaco));
    assert!(manager.is_enemy_unlocked(EnemyKind::Robot));
    assert!(!manager.is_enemy_unlocked(EnemyKind::Eyeball));

    manager.complete_challenge(&mut events);
    assert!(manager.is_obstacle_unlocked(ObstacleKind::Cone));
    assert!(manager.is_power_up_unlocked(PowerUpKind::FireTaco));
    assert!(manager.is_enemy_unlocked(EnemyKind::Eyeball));
    assert!(!manager.is_enemy_unlocked(EnemyKind::Robot3));

    finish_transition(&mut manager);
    manager.complete_challenge(&mut events);
    assert!(manager.is_obstacle_unlocked(ObstacleKind::Skulls));
    assert!(manager.is_power_up_unlocked(PowerUpKind::CrystalMagnet));
    assert!(manager.is_enemy_unlocked(EnemyKind::Robot3));
}

#[test]
fn wave_config_reports_derived_state() {
    let mut manager = WaveManager::default();
    let config = manager.current_wave_config();
    assert_eq!(config.wave_number, WaveNumber::FIRST);
    assert_eq!(config.total_challenges, 3);
    assert!(!config.is_transitioning);
    assert!(!config.is_complete);

    let mut events = Vec::new();
    manager.complete_challenge(&mut events);
    manager.reset();
    assert_eq!(manager.current_wave(), WaveNumber::FIRST);
    assert_speed(&manager, 1.0);
    assert!(!manager.is_transitioning());
}

#[test]
fn announcements_name_the_final_wave() {
    let second = WaveAnnouncement::for_wave(WaveNumber::new(2).expect("wave two"));
    assert_eq!(second.banner, "WAVE 2");
    assert_eq!(second.tagline, Some("GET READY FOR CARNAGE"));

    let last = WaveAnnouncement::for_wave(WaveNumber::FINAL);
    assert_eq!(last.banner, "FINAL WAVE");
    assert_eq!(last.tagline, Some("SURVIVE TO WIN!"));
}

#[derive(Debug, Deserialize)]
struct TableFile {
    waves: WaveTable,
}

#[test]
fn table_parses_from_toml() {
    let file: TableFile = toml::from_str(
        r#"
        [[waves]]
        obstacles = ["obstacle_trash"]
        enemies = ["enemy_robot"]

        [[waves]]
        obstacles = ["obstacle_trash", "obstacle_cone"]
        power_ups = ["crystal_magnet"]
        enemies = ["enemy_robot"]
        total_challenges = 2

        [[waves]]
        obstacles = ["obstacle_trash", "obstacle_cone", "obstacle_skulls"]
        power_ups = ["crystal_magnet", "fire_taco"]
        enemies = ["enemy_robot", "enemy_robot3"]
        "#,
    )
    .expect("table parses");

    let second = file.waves.unlocks(WaveNumber::new(2).expect("wave two"));
    assert_eq!(second.power_ups, vec![PowerUpKind::CrystalMagnet]);
    assert_eq!(second.total_challenges, 2);
    assert_eq!(file.waves.unlocks(WaveNumber::FIRST).total_challenges, 3);
}

#[test]
fn table_rejects_revoked_unlocks() {
    let mut waves: Vec<_> = WaveTable::standard().into();
    waves[2].enemies.retain(|enemy| *enemy != EnemyKind::Eyeball);

    assert_eq!(
        WaveTable::from_waves(waves),
        Err(WaveTableError::UnlockRevoked {
            wave: WaveNumber::FINAL,
            identifier: "enemy_eyeball",
        })
    );
}

#[test]
fn table_rejects_wrong_wave_count_and_empty_challenges() {
    let mut waves: Vec<_> = WaveTable::standard().into();
    let _ = waves.pop();
    assert_eq!(
        WaveTable::from_waves(waves.clone()),
        Err(WaveTableError::WrongWaveCount { found: 2 })
    );

    let mut waves: Vec<_> = WaveTable::standard().into();
    waves[0].total_challenges = 0;
    assert_eq!(
        WaveTable::from_waves(waves),
        Err(WaveTableError::NoChallenges {
            wave: WaveNumber::FIRST,
        })
    );
}

#[test]
fn toml_with_unknown_identifier_fails() {
    let result: Result<TableFile, _> = toml::from_str(
        r#"
        [[waves]]
        obstacles = ["obstacle_lava"]
        "#,
    );
    assert!(result.is_err());
}
