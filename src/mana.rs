use crate::card::Card;
use crate::identity::price;
use crate::scoring::within_budget;
use log::debug;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};
use std::collections::HashSet;

/// Share of the land slots that may go to nonbasic lands.
pub const NONBASIC_SHARE: f64 = 0.5;
pub const COLORLESS_BASIC: &str = "Wastes";

pub fn basic_land_name(color: char) -> Option<&'static str> {
    match color.to_ascii_uppercase() {
        'W' => Some("Plains"),
        'U' => Some("Island"),
        'B' => Some("Swamp"),
        'R' => Some("Mountain"),
        'G' => Some("Forest"),
        _ => None,
    }
}

fn basics_for(mask: &str) -> Vec<&'static str> {
    mask.chars().filter_map(basic_land_name).collect()
}

/// Land name to quantity, kept in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LandMap {
    entries: Vec<(String, u32)>,
}

impl LandMap {
    pub fn new() -> Self {
        LandMap::default()
    }

    pub fn add(&mut self, name: &str, qty: u32) {
        if qty == 0 {
            return;
        }
        match self.entries.iter_mut().find(|(n, _)| n == name) {
            Some((_, count)) => *count += qty,
            None => self.entries.push((name.to_string(), qty)),
        }
    }

    pub fn get(&self, name: &str) -> u32 {
        self.entries
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, q)| *q)
            .unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.entries.iter().map(|(_, q)| q).sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.entries.iter().map(|(n, q)| (n.as_str(), *q))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for LandMap {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, qty) in &self.entries {
            map.serialize_entry(name, qty)?;
        }
        map.end()
    }
}

/// Spreads `target` basics over the colors of `mask` in mask order, the
/// remainder going one each to the first colors. A colorless mask gets
/// Wastes only.
pub fn distribute_basics(mask: &str, target: u32) -> LandMap {
    let mut lands = LandMap::new();
    let basics = basics_for(mask);
    if basics.is_empty() {
        lands.add(COLORLESS_BASIC, target);
        return lands;
    }
    let colors = basics.len() as u32;
    let per_color = target / colors;
    let remainder = target % colors;
    for (i, basic) in basics.iter().enumerate() {
        let extra = u32::from((i as u32) < remainder);
        lands.add(basic, per_color + extra);
    }
    lands
}

#[derive(Debug, Clone, Default)]
pub struct ManaBase {
    pub lands: LandMap,
    pub nonbasics: Vec<Card>,
    pub spent: f64,
}

/// Nonbasics from a preference-sorted pool, at most half the land slots,
/// topped up with basics to `land_target`.
pub fn build_mana_base(
    mask: &str,
    land_target: u32,
    sorted_lands: &[Card],
    banned: &HashSet<String>,
    spent: f64,
    budget: f64,
) -> ManaBase {
    let max_nonbasics = (land_target as f64 * NONBASIC_SHARE).floor() as usize;
    let mut spent = spent;
    let mut nonbasics: Vec<Card> = Vec::new();
    let mut taken = banned.clone();
    for land in sorted_lands {
        if nonbasics.len() >= max_nonbasics {
            break;
        }
        if taken.contains(land.name()) {
            continue;
        }
        let cost = price(land);
        if !within_budget(spent, cost, budget) {
            debug!("Skipping land {} ({:.2}€): over budget", land.name(), cost);
            continue;
        }
        spent += cost;
        taken.insert(land.name().to_string());
        nonbasics.push(land.clone());
    }

    let basics_needed = land_target.saturating_sub(nonbasics.len() as u32);
    let mut lands = distribute_basics(mask, basics_needed);
    for land in &nonbasics {
        lands.add(land.name(), 1);
    }
    ManaBase {
        lands,
        nonbasics,
        spent,
    }
}

/// Adds basics of the first identity color (Wastes if colorless) until the
/// deck holds `deck_size` cards.
pub fn pad_to_size(lands: &mut LandMap, mask: &str, other_cards: usize, deck_size: usize) {
    let current = other_cards + lands.total() as usize;
    if current >= deck_size {
        return;
    }
    let filler = basics_for(mask)
        .first()
        .copied()
        .unwrap_or(COLORLESS_BASIC);
    let missing = (deck_size - current) as u32;
    debug!("Padding with {} x {}", missing, filler);
    lands.add(filler, missing);
}
