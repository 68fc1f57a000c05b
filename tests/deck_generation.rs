mod common;

use commander_deckgen::card::Card;
use commander_deckgen::collection::OwnedCards;
use commander_deckgen::config::{BalanceTarget, DeckConfig};
use commander_deckgen::{DeckAssembler, DeckError, Stage};
use common::{background, card, commander, nonbasic_lands, spells, FakeSource};
use std::collections::HashSet;
use std::time::Duration;

fn assembler(source: FakeSource) -> DeckAssembler<FakeSource> {
    common::init_logging();
    DeckAssembler::new(source).with_pacing(Duration::ZERO, Duration::ZERO)
}

fn blue_source() -> FakeSource {
    FakeSource {
        commanders: vec![commander("Talrand, Sky Summoner", &["U"], &[], "1.00")],
        spells: spells(90, &["U"], "0.50"),
        lands: nonbasic_lands(10, &["U"]),
        ..FakeSource::new()
    }
}

#[tokio::test]
async fn random_deck_has_one_hundred_unique_cards() {
    let assembler = assembler(blue_source());
    let deck = assembler
        .generate(&DeckConfig::random(), &OwnedCards::new())
        .await
        .unwrap();

    assert_eq!(deck.total_cards(), 100);
    assert!(deck.violations().is_empty(), "{:?}", deck.violations());
    assert_eq!(deck.commander_names(), vec!["Talrand, Sky Summoner"]);
    assert_eq!(deck.color_identity(), "U");
    assert_eq!(deck.spells().len(), 62);
    assert_eq!(deck.lands().total(), 37);
    assert_eq!(deck.lands().get("Island"), 27);

    let names: HashSet<&str> = deck.spell_names().into_iter().collect();
    assert_eq!(names.len(), deck.spells().len());
    assert_eq!(assembler.stage(), Stage::Done);
}

#[tokio::test]
async fn budget_caps_spending_and_basics_fill_the_gap() {
    let assembler = assembler(blue_source());
    let config = DeckConfig {
        budget_eur: 30.0,
        ..DeckConfig::random()
    };
    let deck = assembler.generate(&config, &OwnedCards::new()).await.unwrap();

    assert!(deck.spent_eur() <= 30.0 + 1e-9);
    assert_eq!(deck.spells().len(), 58);
    assert_eq!(deck.total_cards(), 100);
    assert_eq!(deck.lands().get("Island"), 41);
    assert!(deck.violations().is_empty(), "{:?}", deck.violations());
}

#[tokio::test]
async fn expensive_commander_exceeds_budget() {
    let mut source = blue_source();
    source.commanders = vec![commander("Pricey Legend", &["U"], &[], "50.00")];
    let assembler = assembler(source);
    let config = DeckConfig {
        budget_eur: 10.0,
        ..DeckConfig::random()
    };

    let err = assembler
        .generate(&config, &OwnedCards::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::BudgetExceeded { .. }));
    assert_eq!(assembler.stage(), Stage::Failed);
}

#[tokio::test]
async fn colorless_commander_gets_wastes() {
    let source = FakeSource {
        commanders: vec![commander("Kozilek, the Great Distortion", &[], &[], "2.00")],
        spells: spells(80, &[], "0.20"),
        ..FakeSource::new()
    };
    let deck = assembler(source)
        .generate(&DeckConfig::random(), &OwnedCards::new())
        .await
        .unwrap();

    assert_eq!(deck.color_identity(), "");
    assert!(deck.lands().iter().all(|(name, _)| name == "Wastes"));
    assert_eq!(deck.lands().get("Wastes"), 37);
    assert_eq!(deck.total_cards(), 100);
}

#[tokio::test]
async fn partners_combine_color_identity() {
    let source = FakeSource {
        commanders: vec![commander("Kraum, Ludevic's Opus", &["R"], &["Partner"], "1.00")],
        partners: vec![
            commander("Kraum, Ludevic's Opus", &["R"], &["Partner"], "1.00"),
            commander("Tymna's Blue Friend", &["U"], &["Partner"], "1.00"),
        ],
        spells: spells(90, &["U", "R"], "0.30"),
        ..FakeSource::new()
    };
    let deck = assembler(source)
        .generate(&DeckConfig::random(), &OwnedCards::new())
        .await
        .unwrap();

    assert_eq!(
        deck.commander_names(),
        vec!["Kraum, Ludevic's Opus", "Tymna's Blue Friend"]
    );
    assert_eq!(deck.color_identity(), "RU");
    assert_eq!(deck.spells().len(), 61);
    assert_eq!(deck.total_cards(), 100);
    assert_eq!(deck.lands().get("Mountain") + deck.lands().get("Island"), 37);
}

#[tokio::test]
async fn background_is_drawn_for_choose_a_background() {
    let source = FakeSource {
        commanders: vec![commander("Wilson, Refined Grizzly", &["G"], &["Choose a Background"], "0.50")],
        partners: vec![commander("Stray Partner", &["G"], &["Partner"], "0.50")],
        backgrounds: vec![background("Raised by Giants", &["G"])],
        spells: spells(90, &["G"], "0.30"),
        ..FakeSource::new()
    };
    let assembler = assembler(source);
    let deck = assembler
        .generate(&DeckConfig::random(), &OwnedCards::new())
        .await
        .unwrap();

    assert_eq!(
        deck.commander_names(),
        vec!["Wilson, Refined Grizzly", "Raised by Giants"]
    );
    assert_eq!(assembler.source().random_count(), 2);
}

#[tokio::test]
async fn background_can_be_disabled() {
    let source = FakeSource {
        commanders: vec![commander("Wilson, Refined Grizzly", &["G"], &["Choose a Background"], "0.50")],
        backgrounds: vec![background("Raised by Giants", &["G"])],
        spells: spells(90, &["G"], "0.30"),
        ..FakeSource::new()
    };
    let config = DeckConfig {
        allow_background: false,
        ..DeckConfig::random()
    };
    let deck = assembler(source)
        .generate(&config, &OwnedCards::new())
        .await
        .unwrap();

    assert_eq!(deck.commander_names(), vec!["Wilson, Refined Grizzly"]);
    assert_eq!(deck.total_cards(), 100);
}

#[tokio::test]
async fn partner_wins_over_background() {
    let source = FakeSource {
        commanders: vec![commander(
            "Both Ways",
            &["W"],
            &["Partner", "Choose a Background"],
            "0.50",
        )],
        partners: vec![commander("White Partner", &["W"], &["Partner"], "0.50")],
        backgrounds: vec![background("Cloakwood Hermit", &["W"])],
        spells: spells(90, &["W"], "0.30"),
        ..FakeSource::new()
    };
    let deck = assembler(source)
        .generate(&DeckConfig::random(), &OwnedCards::new())
        .await
        .unwrap();

    assert_eq!(deck.commander_names(), vec!["Both Ways", "White Partner"]);
    assert!(deck
        .commanders()
        .iter()
        .all(|c| !c.full_type_line().contains("Background")));
}

#[tokio::test]
async fn illegal_random_draws_give_up_after_six_attempts() {
    let mut banned = commander("Banned Legend", &["B"], &[], "1.00");
    banned.legalities.commander = Some("banned".to_string());
    let source = FakeSource {
        commanders: vec![banned],
        ..FakeSource::new()
    };
    let assembler = assembler(source);

    let err = assembler
        .generate(&DeckConfig::random(), &OwnedCards::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::NoCommanderFound { attempts: 6 }));
    assert_eq!(assembler.source().random_count(), 6);
}

#[tokio::test]
async fn named_commander_is_resolved_exactly() {
    let source = FakeSource {
        spells: spells(90, &["U"], "0.50"),
        ..FakeSource::new()
    }
    .with_named(commander("Talrand, Sky Summoner", &["U"], &[], "1.00"));
    let assembler = assembler(source);

    let deck = assembler
        .generate(
            &DeckConfig::for_commander("talrand, sky summoner"),
            &OwnedCards::new(),
        )
        .await
        .unwrap();
    assert_eq!(deck.commander_names(), vec!["Talrand, Sky Summoner"]);
    assert_eq!(assembler.source().random_count(), 0);
}

#[tokio::test]
async fn unknown_commander_name_fails_resolution() {
    let assembler = assembler(blue_source());
    let err = assembler
        .generate(
            &DeckConfig::for_commander("Nobody In Particular"),
            &OwnedCards::new(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::Resolution(name) if name == "Nobody In Particular"));
}

#[tokio::test]
async fn owned_cards_are_preferred() {
    let assembler = assembler(blue_source());
    let mut owned = OwnedCards::new();
    owned.add("Spell 89", 1);
    owned.add("Spell 88", 1);
    let mut config = DeckConfig::random();
    let none = BalanceTarget { min: 0, max: 0 };
    config.targets.ramp = none;
    config.targets.draw = none;
    config.targets.removal = none;
    config.targets.wraths = none;

    let deck = assembler.generate(&config, &owned).await.unwrap();
    let names = deck.spell_names();
    assert!(names.contains(&"Spell 89"));
    assert!(names.contains(&"Spell 88"));
}

#[tokio::test]
async fn selected_mechanics_narrow_the_spell_query() {
    let assembler = assembler(blue_source());
    let config = DeckConfig {
        mechanics: vec!["tokens".to_string()],
        ..DeckConfig::random()
    };
    assembler.generate(&config, &OwnedCards::new()).await.unwrap();

    let searches = assembler.source().searches.lock().unwrap().clone();
    assert!(searches
        .iter()
        .any(|q| q.contains("-type:land") && q.contains("o:\"")));
    assert!(searches
        .iter()
        .any(|q| q.contains("type:land -type:basic") && !q.contains("o:\"")));
}

#[tokio::test]
async fn failed_land_lookup_leaves_a_placeholder() {
    let mut source = blue_source();
    source.failing_names.insert("island".to_string());
    let deck = assembler(source)
        .generate(&DeckConfig::random(), &OwnedCards::new())
        .await
        .unwrap();

    let island = deck
        .land_cards()
        .iter()
        .find(|land| land.card.name() == "Island")
        .unwrap();
    assert_eq!(island.qty, 27);
    assert_eq!(island.card, Card::placeholder("Island"));
    assert_eq!(deck.total_cards(), 100);
}

#[tokio::test]
async fn stale_token_is_superseded_before_any_request() {
    let assembler = assembler(blue_source());
    let stale = assembler.begin_generation();
    let fresh = assembler.begin_generation();
    assert!(!stale.is_current());
    assert!(fresh.is_current());

    let err = assembler
        .generate_with(stale, &DeckConfig::random(), &OwnedCards::new())
        .await
        .unwrap_err();
    assert!(matches!(err, DeckError::Superseded));
    assert_eq!(assembler.source().random_count(), 0);
}

#[tokio::test]
async fn rebalance_keeps_commanders_and_lands() {
    let assembler = assembler(blue_source());
    let deck = assembler
        .generate(&DeckConfig::random(), &OwnedCards::new())
        .await
        .unwrap();

    let mut config = DeckConfig::random();
    config.targets.ramp = BalanceTarget { min: 20, max: 22 };
    let rebalanced = assembler
        .rebalance(&deck, &config, &OwnedCards::new())
        .await
        .unwrap();

    assert_eq!(rebalanced.commanders(), deck.commanders());
    assert_eq!(rebalanced.lands(), deck.lands());
    assert_eq!(rebalanced.total_cards(), 100);
    assert!(rebalanced.violations().is_empty(), "{:?}", rebalanced.violations());
    assert_eq!(rebalanced.balance_targets().ramp.min, 20);
}

#[tokio::test]
async fn exports_follow_deck_order() {
    let deck = assembler(blue_source())
        .generate(&DeckConfig::random(), &OwnedCards::new())
        .await
        .unwrap();

    let text = deck.export_text();
    assert_eq!(text.lines().next(), Some("1 Talrand, Sky Summoner"));
    assert_eq!(text.lines().count(), 1 + 62 + deck.lands().len());

    let list = deck.annotated_list();
    assert!(list.starts_with("// CI: U • Budget: 0€"));
    assert!(list.contains("1 Talrand, Sky Summoner // Commander"));

    let json: serde_json::Value = serde_json::from_str(&deck.export_json().unwrap()).unwrap();
    assert_eq!(json["lands"]["Island"], 27);
    assert_eq!(json["commanders"][0]["name"], "Talrand, Sky Summoner");
}

#[test]
fn fixtures_are_commander_legal() {
    let c = card("Probe", "Instant", &["U"], "Draw a card.", "0.10");
    assert_eq!(c.legalities.commander.as_deref(), Some("legal"));
}
