use crate::api::{collect_pages, CardSource, SearchOptions, SortOrder, Unique};
use crate::card::Card;
use crate::error::DeckResult;
use crate::identity::{color_identity_mask, identity_query, is_legal_commander, is_subset};
use crate::matchers::MechanicCatalog;
use log::{debug, info};
use std::collections::HashSet;
use std::time::Duration;

pub const SPELL_PAGES: usize = 2;
pub const LAND_PAGES: usize = 1;
pub const REBALANCE_PAGES: usize = 2;

#[derive(Debug, Clone, Default)]
pub struct CandidatePool {
    pub spells: Vec<Card>,
    pub lands: Vec<Card>,
}

pub fn base_query(mask: &str) -> String {
    format!("legal:commander game:paper {} -is:funny", identity_query(mask))
}

pub fn spells_query(mask: &str, catalog: &MechanicCatalog, mechanics: &[String]) -> String {
    let mechanic_filter = catalog.oracle_query(mechanics);
    let mut query = format!("{} -type:land -type:background", base_query(mask));
    if !mechanic_filter.is_empty() {
        query.push(' ');
        query.push_str(&mechanic_filter);
    }
    query
}

pub fn lands_query(mask: &str) -> String {
    format!("{} type:land -type:basic", base_query(mask))
}

/// First card of each name, keeping only cards legal in a deck of `mask`.
pub fn distinct_legal(cards: Vec<Card>, mask: &str) -> Vec<Card> {
    let mut seen = HashSet::new();
    cards
        .into_iter()
        .filter(|card| seen.insert(card.name().to_string()))
        .filter(is_legal_commander)
        .filter(|card| is_subset(&color_identity_mask(card), mask))
        .collect()
}

pub async fn fetch_pool<S: CardSource>(
    source: &S,
    mask: &str,
    catalog: &MechanicCatalog,
    mechanics: &[String],
    page_delay: Duration,
) -> DeckResult<CandidatePool> {
    let options = SearchOptions::new(Unique::Cards, SortOrder::Random);

    let spells_q = spells_query(mask, catalog, mechanics);
    debug!("Spells query: {}", spells_q);
    let spells = collect_pages(source, &spells_q, options, SPELL_PAGES, page_delay).await?;

    let lands_q = lands_query(mask);
    debug!("Lands query: {}", lands_q);
    let lands = collect_pages(source, &lands_q, options, LAND_PAGES, page_delay).await?;

    let pool = CandidatePool {
        spells: distinct_legal(spells, mask),
        lands: distinct_legal(lands, mask),
    };
    info!(
        "Candidate pool: {} spells, {} nonbasic lands",
        pool.spells.len(),
        pool.lands.len()
    );
    Ok(pool)
}

/// Spell candidates for a rebalance: most popular first, no mechanic filter.
pub async fn fetch_rebalance_pool<S: CardSource>(
    source: &S,
    mask: &str,
    page_delay: Duration,
) -> DeckResult<Vec<Card>> {
    let query = format!("{} -type:land -type:background", base_query(mask));
    debug!("Rebalance query: {}", query);
    let options = SearchOptions::new(Unique::Cards, SortOrder::Edhrec);
    let cards = collect_pages(source, &query, options, REBALANCE_PAGES, page_delay).await?;
    Ok(distinct_legal(cards, mask))
}
