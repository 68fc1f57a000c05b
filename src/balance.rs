//! Repair pass that swaps selected spells for category staples (ramp, draw,
//! removal, wraths) until each category reaches its minimum.
//!
//! Categories are handled one at a time in `Category::ALL` order and a swap
//! only evicts a card that does not count for the category being fixed.
//! An eviction may still lower a category fixed earlier in the pass; those
//! are not revisited.

use crate::card::Card;
use crate::config::BalanceTargets;
use crate::identity::price;
use crate::matchers::{Category, CategoryCounts, CategoryTable};
use crate::scoring::within_budget;
use log::{debug, info};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct BalanceOutcome {
    pub picks: Vec<Card>,
    pub spent: f64,
    pub counts: CategoryCounts,
    pub swaps: usize,
}

pub struct Balancer<'a> {
    table: &'a CategoryTable,
    targets: &'a BalanceTargets,
    budget: f64,
}

impl<'a> Balancer<'a> {
    pub fn new(table: &'a CategoryTable, targets: &'a BalanceTargets, budget: f64) -> Self {
        Balancer {
            table,
            targets,
            budget,
        }
    }

    pub fn counts(&self, cards: &[Card]) -> CategoryCounts {
        self.table.counts(cards)
    }

    /// `sorted_pool` must already be in preference order. `banned` holds
    /// names that may never be swapped in (the commanders).
    pub fn balance(
        &self,
        picks: Vec<Card>,
        sorted_pool: &[Card],
        banned: &HashSet<String>,
        spent: f64,
    ) -> BalanceOutcome {
        let mut picks = picks;
        let mut names: HashSet<String> = picks.iter().map(|c| c.name().to_string()).collect();
        let mut counts = self.table.counts(&picks);
        let mut spent = spent;
        let mut swaps = 0;

        for category in Category::ALL {
            let target = self.targets.min(category);
            if counts.get(category) >= target {
                continue;
            }
            for candidate in sorted_pool {
                let name = candidate.name();
                if names.contains(name) || banned.contains(name) {
                    continue;
                }
                let cost = price(candidate);
                if !within_budget(spent, cost, self.budget) {
                    continue;
                }
                if !self.table.qualifies(category, candidate) {
                    continue;
                }
                let Some(index) = picks
                    .iter()
                    .position(|card| !self.table.qualifies(category, card))
                else {
                    break;
                };

                let evicted = std::mem::replace(&mut picks[index], candidate.clone());
                debug!("{}: {} replaces {}", category, name, evicted.name());
                names.remove(evicted.name());
                names.insert(name.to_string());
                for other in Category::ALL {
                    if self.table.qualifies(other, &evicted) {
                        counts.decrement(other);
                    }
                    if self.table.qualifies(other, candidate) {
                        counts.increment(other);
                    }
                }
                spent += cost - price(&evicted);
                swaps += 1;

                if counts.get(category) >= target {
                    break;
                }
            }
            if counts.get(category) < target {
                info!(
                    "{} stays below its minimum ({}/{})",
                    category,
                    counts.get(category),
                    target
                );
            }
        }

        BalanceOutcome {
            picks,
            spent,
            counts,
            swaps,
        }
    }
}
