//! Integration tests for the progression engine: experience thresholds,
//! level-up grants and the skill-point economy.

use duskhold::{progression, Combatant, ContentPack, Player, PlayerClass, Position};

fn rogue() -> (ContentPack, Player) {
    let pack = ContentPack::builtin();
    let player = Player::new(
        "Wren",
        pack.class_def(PlayerClass::Rogue).unwrap(),
        Position::origin(),
    );
    (pack, player)
}

#[test]
fn xp_threshold_chain_matches_documented_arithmetic() {
    let (_, mut player) = rogue();
    assert_eq!(player.xp_to_next_level, 100);

    // 250 xp in one grant: exactly two level-ups, nothing left over.
    let ups = progression::award_xp(&mut player, 250);
    assert_eq!(ups.len(), 2);
    assert_eq!(player.level, 3);
    assert_eq!(player.xp, 0);
    assert_eq!(player.xp_to_next_level, 225);
}

#[test]
fn partial_xp_accumulates_without_leveling() {
    let (_, mut player) = rogue();
    assert!(progression::award_xp(&mut player, 99).is_empty());
    assert_eq!(player.level, 1);
    assert_eq!(player.xp, 99);

    let ups = progression::award_xp(&mut player, 1);
    assert_eq!(ups.len(), 1);
    assert_eq!(player.level, 2);
    assert_eq!(player.xp, 0);
}

#[test]
fn level_up_grants_follow_the_rulebook() {
    let (_, mut player) = rogue();
    let hp_before = player.combat().max_hp();
    let mp_before = player.combat().max_mp();
    let luck_before = player.combat().luck();

    progression::award_xp(&mut player, 100);

    assert_eq!(player.combat().max_hp(), hp_before + 10);
    assert_eq!(player.combat().hp(), player.combat().max_hp());
    assert_eq!(player.combat().max_mp(), mp_before + 5);
    assert_eq!(player.combat().mp(), player.combat().max_mp());
    assert_eq!(player.combat().luck(), luck_before + 1);
    assert_eq!(player.skill_points, 1);
}

#[test]
fn skill_economy_full_cycle() {
    let (pack, mut player) = rogue();
    let garrote = pack.skill_by_id("garrote").unwrap();

    // Cannot afford yet.
    assert!(!progression::can_buy_skill(&player, garrote));

    player.skill_points = 2;
    progression::buy_skill(&mut player, garrote).unwrap();
    assert_eq!(player.skill_level("garrote"), Some(1));
    assert_eq!(player.skill_points, 0);

    // Buying twice is rejected.
    assert!(progression::buy_skill(&mut player, garrote).is_err());

    // Two level-ups push the skill to level 3: damage 5 -> 6, cost 18 -> 19.
    progression::award_xp(&mut player, 250);
    assert_eq!(player.skill_level("garrote"), Some(3));
    assert_eq!(progression::scaled_damage(garrote.damage, 3), 6);
    assert_eq!(progression::scaled_mp_cost(garrote.mp_cost, 3), 19);
}

#[test]
fn class_gate_blocks_foreign_skills() {
    let pack = ContentPack::builtin();
    let mut wizard = Player::new(
        "Imri",
        pack.class_def(PlayerClass::Wizard).unwrap(),
        Position::origin(),
    );
    wizard.skill_points = 99;

    let backstab = pack.skill_by_id("backstab").unwrap();
    assert!(!progression::can_buy_skill(&wizard, backstab));

    let fire_blast = pack.skill_by_id("fire_blast").unwrap();
    assert!(progression::can_buy_skill(&wizard, fire_blast));
}

#[test]
fn skill_cost_rises_with_player_level() {
    let (pack, mut player) = rogue();
    let ambush = pack.skill_by_id("ambush").unwrap();
    assert_eq!(progression::skill_cost(ambush, player.level), 3);

    // Push to level 10+: the level penalty kicks in.
    // Thresholds: 100, 150, 225, 337, 505, 757, 1135, 1702, 2553 (sum 7464).
    progression::award_xp(&mut player, 7464);
    assert_eq!(player.level, 10);
    assert_eq!(progression::skill_cost(ambush, player.level), 4);
}

#[test]
fn max_level_and_gold_records_track_peaks() {
    let (_, mut player) = rogue();
    progression::award_xp(&mut player, 250);
    assert_eq!(player.max_level_reached, 3);

    player.add_gold(500);
    player.add_gold(-499);
    assert_eq!(player.max_gold_held, 500);
    assert_eq!(player.gold, 1);
}
