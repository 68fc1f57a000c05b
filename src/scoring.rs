use crate::card::Card;
use crate::collection::OwnedCards;
use crate::config::DeckConfig;
use crate::identity::{popularity, price};
use crate::matchers::MechanicCatalog;
use log::debug;
use rand::Rng;
use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

/// Score added per selected mechanic a card matches.
pub const MECHANIC_BONUS: f64 = 0.25;

/// `true` when `cost` can still be spent; a budget of zero is unlimited.
pub fn within_budget(spent: f64, cost: f64, budget: f64) -> bool {
    budget <= 0.0 || spent + cost <= budget
}

pub struct Scorer<'a> {
    owned: &'a OwnedCards,
    catalog: &'a MechanicCatalog,
    mechanics: &'a [String],
    weight_owned: f64,
    weight_popularity: f64,
}

impl<'a> Scorer<'a> {
    pub fn new(config: &'a DeckConfig, owned: &'a OwnedCards, catalog: &'a MechanicCatalog) -> Self {
        Scorer {
            owned,
            catalog,
            mechanics: &config.mechanics,
            weight_owned: config.weight_owned,
            weight_popularity: config.weight_popularity,
        }
    }

    pub fn mechanic_bonus(&self, card: &Card) -> f64 {
        MECHANIC_BONUS * self.catalog.match_count(self.mechanics, card) as f64
    }

    pub fn score(&self, card: &Card) -> f64 {
        let owned = if self.owned.owns(card.name()) { 1.0 } else { 0.0 };
        self.weight_owned * owned
            + self.weight_popularity * popularity(card)
            + self.mechanic_bonus(card)
    }

    /// Best score first, then cheapest, then a random draw fixed per name
    /// for the duration of this sort.
    pub fn sort_by_preference<R: Rng>(&self, pool: &[Card], rng: &mut R) -> Vec<Card> {
        let mut tiebreaks: HashMap<&str, f64> = HashMap::new();
        for card in pool {
            tiebreaks
                .entry(card.name())
                .or_insert_with(|| rng.gen::<f64>());
        }

        let mut keyed: Vec<(f64, f64, f64, &Card)> = pool
            .iter()
            .map(|card| {
                (
                    self.score(card),
                    price(card),
                    tiebreaks.get(card.name()).copied().unwrap_or(0.0),
                    card,
                )
            })
            .collect();
        keyed.sort_by(|a, b| {
            b.0.partial_cmp(&a.0)
                .unwrap_or(Ordering::Equal)
                .then_with(|| a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal))
                .then_with(|| a.2.partial_cmp(&b.2).unwrap_or(Ordering::Equal))
        });
        keyed.into_iter().map(|(_, _, _, card)| card.clone()).collect()
    }
}

#[derive(Debug, Clone, Default)]
pub struct Selection {
    pub picks: Vec<Card>,
    /// Running spend including whatever was spent before the pick.
    pub spent: f64,
}

/// Walks a preference-sorted pool taking unseen, affordable cards until
/// `need` are picked. A short pool yields a short selection.
pub fn greedy_pick_unique(
    sorted_pool: &[Card],
    need: usize,
    banned: &HashSet<String>,
    spent: f64,
    budget: f64,
) -> Selection {
    let mut taken: HashSet<String> = banned.clone();
    let mut selection = Selection {
        picks: Vec::with_capacity(need),
        spent,
    };
    for card in sorted_pool {
        if selection.picks.len() >= need {
            break;
        }
        let name = card.name();
        if taken.contains(name) {
            continue;
        }
        let cost = price(card);
        if !within_budget(selection.spent, cost, budget) {
            debug!("Skipping {} ({:.2}€): over budget", name, cost);
            continue;
        }
        taken.insert(name.to_string());
        selection.spent += cost;
        selection.picks.push(card.clone());
    }
    selection
}
