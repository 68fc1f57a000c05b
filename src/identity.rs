//! Pure helpers over card records: color identity masks, legality, price
//! and popularity.

use crate::card::Card;

pub const COLORS: [char; 5] = ['W', 'U', 'B', 'R', 'G'];

/// Ranks beyond this score as zero popularity.
pub const POPULARITY_RANK_CAP: u32 = 100_000;

/// Sorted, de-duplicated, upper-case color letters. Anything that is not one
/// of WUBRG is dropped, so colorless is the empty string.
pub fn canonical_mask(letters: &str) -> String {
    let mut colors: Vec<char> = letters
        .chars()
        .map(|c| c.to_ascii_uppercase())
        .filter(|c| COLORS.contains(c))
        .collect();
    colors.sort_unstable();
    colors.dedup();
    colors.into_iter().collect()
}

pub fn color_identity_mask(card: &Card) -> String {
    canonical_mask(&card.color_identity.concat())
}

pub fn union_mask(a: &str, b: &str) -> String {
    canonical_mask(&format!("{}{}", a, b))
}

/// `true` when every color of `inner` is also in `outer`.
pub fn is_subset(inner: &str, outer: &str) -> bool {
    let outer = canonical_mask(outer);
    canonical_mask(inner).chars().all(|c| outer.contains(c))
}

pub fn is_legal_commander(card: &Card) -> bool {
    card.legalities.commander.as_deref() == Some("legal")
}

/// EUR price, falling back to the foil price, then to zero.
pub fn price(card: &Card) -> f64 {
    let parse = |value: &Option<String>| {
        value
            .as_deref()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|v| v.is_finite())
    };
    parse(&card.prices.eur)
        .or_else(|| parse(&card.prices.eur_foil))
        .unwrap_or(0.0)
        .max(0.0)
}

/// Score in [0, 1]; best ranked cards approach 1, unranked cards are 0.
pub fn popularity(card: &Card) -> f64 {
    match card.edhrec_rank {
        Some(rank) if rank > 0 => {
            let cap = POPULARITY_RANK_CAP as f64;
            (1.0 - (rank.min(POPULARITY_RANK_CAP) as f64) / cap).max(0.0)
        }
        _ => 0.0,
    }
}

/// Search filter restricting results to a color identity.
pub fn identity_query(mask: &str) -> String {
    let mask = canonical_mask(mask);
    if mask.is_empty() {
        "ci<=c".to_string()
    } else {
        format!("ci<={}", mask.to_lowercase())
    }
}
