use crate::card::Card;
use crate::collection::OwnedCards;
use crate::config::BalanceTargets;
use crate::error::DeckResult;
use crate::mana::LandMap;
use crate::matchers::CategoryCounts;
use serde::Serialize;
use std::collections::HashSet;

pub const DECK_SIZE: usize = 100;

/// Display groups for nonland cards, in display order.
pub const TYPE_GROUPS: [&str; 8] = [
    "Creatures",
    "Artifacts",
    "Enchantments",
    "Instants",
    "Sorceries",
    "Planeswalkers",
    "Battles",
    "Other",
];

pub fn primary_type_label(type_line: &str) -> &'static str {
    let t = type_line.to_lowercase();
    if t.contains("creature") {
        "Creatures"
    } else if t.contains("artifact") {
        "Artifacts"
    } else if t.contains("enchantment") {
        "Enchantments"
    } else if t.contains("instant") {
        "Instants"
    } else if t.contains("sorcery") {
        "Sorceries"
    } else if t.contains("planeswalker") {
        "Planeswalkers"
    } else if t.contains("battle") {
        "Battles"
    } else if t.contains("land") {
        "Lands"
    } else {
        "Other"
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct LandCard {
    #[serde(flatten)]
    pub card: Card,
    pub qty: u32,
}

/// A finished 100-card deck. Built by the assembler; a rebalance yields a
/// new value rather than editing this one.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Deck {
    color_identity: String,
    commanders: Vec<Card>,
    spells: Vec<Card>,
    lands: LandMap,
    land_cards: Vec<LandCard>,
    spent_eur: f64,
    budget_eur: f64,
    category_counts: CategoryCounts,
    balance_targets: BalanceTargets,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DeckStats {
    pub owned_count: u32,
    pub owned_pct: u32,
    pub avg_cmc: f64,
    pub type_counts: Vec<(String, usize)>,
}

impl Deck {
    #[allow(clippy::too_many_arguments)]
    pub(crate) fn new(
        color_identity: String,
        commanders: Vec<Card>,
        spells: Vec<Card>,
        lands: LandMap,
        land_cards: Vec<LandCard>,
        spent_eur: f64,
        budget_eur: f64,
        category_counts: CategoryCounts,
        balance_targets: BalanceTargets,
    ) -> Self {
        Deck {
            color_identity,
            commanders,
            spells,
            lands,
            land_cards,
            spent_eur,
            budget_eur,
            category_counts,
            balance_targets,
        }
    }

    /// Same commanders and lands, new spells.
    pub(crate) fn with_spells(
        &self,
        spells: Vec<Card>,
        category_counts: CategoryCounts,
        spent_eur: f64,
        balance_targets: BalanceTargets,
    ) -> Deck {
        Deck {
            spells,
            category_counts,
            spent_eur,
            balance_targets,
            ..self.clone()
        }
    }

    pub fn color_identity(&self) -> &str {
        &self.color_identity
    }

    pub fn commanders(&self) -> &[Card] {
        &self.commanders
    }

    pub fn spells(&self) -> &[Card] {
        &self.spells
    }

    pub fn lands(&self) -> &LandMap {
        &self.lands
    }

    pub fn land_cards(&self) -> &[LandCard] {
        &self.land_cards
    }

    pub fn spent_eur(&self) -> f64 {
        self.spent_eur
    }

    pub fn budget_eur(&self) -> f64 {
        self.budget_eur
    }

    pub fn category_counts(&self) -> CategoryCounts {
        self.category_counts
    }

    pub fn balance_targets(&self) -> BalanceTargets {
        self.balance_targets
    }

    pub fn commander_names(&self) -> Vec<&str> {
        self.commanders.iter().map(|c| c.name()).collect()
    }

    pub fn spell_names(&self) -> Vec<&str> {
        self.spells.iter().map(|c| c.name()).collect()
    }

    pub fn total_cards(&self) -> usize {
        self.commanders.len() + self.spells.len() + self.lands.total() as usize
    }

    /// Broken deck rules, empty when the deck is legal.
    pub fn violations(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.total_cards() != DECK_SIZE {
            problems.push(format!(
                "deck has {} cards instead of {}",
                self.total_cards(),
                DECK_SIZE
            ));
        }
        let mut seen = HashSet::new();
        let names = self
            .commanders
            .iter()
            .chain(self.spells.iter())
            .map(|c| c.name())
            .chain(self.lands.iter().map(|(name, _)| name));
        for name in names {
            if !seen.insert(name) {
                problems.push(format!("{} appears more than once", name));
            }
        }
        if self.budget_eur > 0.0 && self.spent_eur > self.budget_eur + 1e-9 {
            problems.push(format!(
                "spent {:.2}€ over a {:.2}€ budget",
                self.spent_eur, self.budget_eur
            ));
        }
        problems
    }

    /// `<qty> <name>` per line: commanders, then spells, then lands.
    pub fn export_text(&self) -> String {
        let mut lines = Vec::with_capacity(self.commanders.len() + self.spells.len() + self.lands.len());
        for card in &self.commanders {
            lines.push(format!("1 {}", card.name()));
        }
        for card in &self.spells {
            lines.push(format!("1 {}", card.name()));
        }
        for (name, qty) in self.lands.iter() {
            lines.push(format!("{} {}", qty, name));
        }
        lines.join("\n")
    }

    pub fn export_json(&self) -> DeckResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Plain list with a summary header and commanders marked.
    pub fn annotated_list(&self) -> String {
        let identity = if self.color_identity.is_empty() {
            "(Colorless)"
        } else {
            self.color_identity.as_str()
        };
        let mut lines = vec![format!(
            "// CI: {} • Budget: {}€ • Estimated cost: {:.2}€",
            identity, self.budget_eur, self.spent_eur
        )];
        for card in &self.commanders {
            lines.push(format!("1 {} // Commander", card.name()));
        }
        for card in &self.spells {
            lines.push(format!("1 {}", card.name()));
        }
        for (name, qty) in self.lands.iter() {
            lines.push(format!("{} {}", qty, name));
        }
        lines.join("\n")
    }

    pub fn stats(&self, owned: &OwnedCards) -> DeckStats {
        let mut remaining = owned.snapshot();
        let mut take = |name: &str, need: u32| {
            let have = remaining.get_mut(&name.to_lowercase());
            match have {
                Some(have) => {
                    let used = (*have).min(need);
                    *have -= used;
                    used
                }
                None => 0,
            }
        };

        let mut owned_count = 0;
        for card in &self.commanders {
            owned_count += take(card.name(), 1);
        }
        for card in &self.spells {
            owned_count += take(card.name(), 1);
        }
        for (name, qty) in self.lands.iter() {
            owned_count += take(name, qty);
        }

        let total = self.total_cards() as u32;
        let owned_pct = if total > 0 {
            ((owned_count as f64 / total as f64) * 100.0).round() as u32
        } else {
            0
        };

        let cmc_cards: Vec<&Card> = self.commanders.iter().chain(self.spells.iter()).collect();
        let avg_cmc = if cmc_cards.is_empty() {
            0.0
        } else {
            let sum: f64 = cmc_cards.iter().map(|c| c.cmc).sum();
            ((sum / cmc_cards.len() as f64) * 100.0).round() / 100.0
        };

        let type_counts = TYPE_GROUPS
            .iter()
            .map(|group| {
                let count = self
                    .spells
                    .iter()
                    .filter(|c| primary_type_label(&c.full_type_line()) == *group)
                    .count();
                (group.to_string(), count)
            })
            .filter(|(_, count)| *count > 0)
            .collect();

        DeckStats {
            owned_count,
            owned_pct,
            avg_cmc,
            type_counts,
        }
    }
}
