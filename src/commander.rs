//! Commander resolution: the primary commander, by name or at random, and
//! the optional second commander its keywords allow.

use crate::api::{CardSource, SearchOptions, SortOrder, Unique};
use crate::card::Card;
use crate::config::{CommanderMode, DeckConfig};
use crate::error::{DeckError, DeckResult};
use crate::identity::{color_identity_mask, identity_query, is_legal_commander, price, union_mask};
use futures::join;
use log::{debug, info, warn};
use serde::Serialize;

/// What happens once a bounded random draw runs out of attempts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GiveUp {
    Fail,
    Degrade,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: usize,
    pub give_up: GiveUp,
}

pub const COMMANDER_DRAW: RetryPolicy = RetryPolicy {
    attempts: 6,
    give_up: GiveUp::Fail,
};
pub const PARTNER_DRAW: RetryPolicy = RetryPolicy {
    attempts: 12,
    give_up: GiveUp::Degrade,
};
pub const BACKGROUND_DRAW: RetryPolicy = RetryPolicy {
    attempts: 10,
    give_up: GiveUp::Degrade,
};

const COMMANDER_TYPES: &str =
    "(type:\"legendary creature\" or (type:planeswalker and o:\"can be your commander\") or type:background)";
const COMPANION_BASE: &str = "legal:commander is:commander game:paper -is:funny";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompanionKind {
    PartnerWith(String),
    Partner,
    FriendsForever,
    DoctorsCompanion,
    TimeLordDoctor,
    Background,
}

/// Which kind of second commander a card allows, if any. At most one
/// applies; earlier checks win.
pub fn companion_kind(card: &Card) -> Option<CompanionKind> {
    let keywords: Vec<String> = card.keywords.iter().map(|k| k.to_lowercase()).collect();

    if let Some(keyword) = card
        .keywords
        .iter()
        .find(|k| k.to_lowercase().starts_with("partner with"))
    {
        let named = keyword["partner with".len()..].trim();
        let name = if named.is_empty() {
            partner_name_from_text(&card.full_oracle_text())
        } else {
            named.to_string()
        };
        return Some(CompanionKind::PartnerWith(name));
    }
    if keywords.iter().any(|k| k == "partner") {
        return Some(CompanionKind::Partner);
    }
    if keywords.iter().any(|k| k == "friends forever") {
        return Some(CompanionKind::FriendsForever);
    }
    if keywords.iter().any(|k| k == "doctor's companion") {
        return Some(CompanionKind::DoctorsCompanion);
    }
    let type_line = card.full_type_line().to_lowercase();
    if type_line.contains("time lord") && type_line.contains("doctor") {
        return Some(CompanionKind::TimeLordDoctor);
    }
    if keywords.iter().any(|k| k == "choose a background") {
        return Some(CompanionKind::Background);
    }
    None
}

// "Partner with Toothy, Imaginary Friend (When this creature ...)"
fn partner_name_from_text(text: &str) -> String {
    text.lines()
        .find_map(|line| {
            let line = line.trim();
            if line.to_lowercase().starts_with("partner with ") {
                let rest = &line["partner with ".len()..];
                Some(rest.split(" (").next().unwrap_or(rest).trim().to_string())
            } else {
                None
            }
        })
        .unwrap_or_default()
}

pub fn random_commander_query(identity_filter: &str) -> String {
    let identity = if identity_filter.is_empty() {
        String::new()
    } else {
        identity_query(identity_filter)
    };
    [
        "legal:commander",
        "is:commander",
        "game:paper",
        "-is:funny",
        "-keyword:companion",
        identity.as_str(),
        COMMANDER_TYPES,
    ]
    .iter()
    .filter(|part| !part.is_empty())
    .cloned()
    .collect::<Vec<_>>()
    .join(" ")
}

pub fn partner_query(kind: &CompanionKind) -> Option<String> {
    let requirement = match kind {
        CompanionKind::Partner => "keyword:partner",
        CompanionKind::FriendsForever => "keyword:\"friends forever\"",
        CompanionKind::DoctorsCompanion => "type:\"Time Lord Doctor\"",
        CompanionKind::TimeLordDoctor => "keyword:\"Doctor's companion\"",
        CompanionKind::PartnerWith(_) | CompanionKind::Background => return None,
    };
    Some(format!("{} {}", COMPANION_BASE, requirement))
}

/// Backgrounds within the primary's identity; a colorless primary accepts
/// any color rather than colorless only.
pub fn background_query(primary: &Card) -> String {
    let mask = color_identity_mask(primary);
    let mask = if mask.is_empty() { "WUBRG".to_string() } else { mask };
    format!(
        "legal:commander type:background game:paper {}",
        identity_query(&mask)
    )
}

fn sanitize_name(name: &str) -> String {
    name.replace('"', "").trim().to_string()
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CommanderSet {
    pub primary: Card,
    pub companion: Option<Card>,
}

impl CommanderSet {
    pub fn cards(&self) -> Vec<&Card> {
        std::iter::once(&self.primary)
            .chain(self.companion.as_ref())
            .collect()
    }

    pub fn names(&self) -> Vec<String> {
        self.cards().iter().map(|c| c.name().to_string()).collect()
    }

    pub fn len(&self) -> usize {
        1 + usize::from(self.companion.is_some())
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn color_identity(&self) -> String {
        self.cards()
            .iter()
            .fold(String::new(), |mask, card| {
                union_mask(&mask, &color_identity_mask(card))
            })
    }

    pub fn total_price(&self) -> f64 {
        self.cards().iter().map(|c| price(c)).sum()
    }
}

pub struct CommanderResolver<'a, S> {
    source: &'a S,
    localized_lang: String,
}

impl<'a, S: CardSource> CommanderResolver<'a, S> {
    pub fn new(source: &'a S, localized_lang: &str) -> Self {
        CommanderResolver {
            source,
            localized_lang: localized_lang.to_string(),
        }
    }

    pub async fn resolve(&self, config: &DeckConfig) -> DeckResult<CommanderSet> {
        let primary = match config.commander_mode {
            CommanderMode::Selection => self.resolve_named(&config.commander_name).await?,
            CommanderMode::Random => self.random_commander(&config.identity_filter).await?,
        };
        info!(
            "Primary commander: {} ({})",
            primary.name(),
            display_mask(&color_identity_mask(&primary))
        );
        let companion = self
            .companion(&primary, config.allow_partner, config.allow_background)
            .await;
        if let Some(companion) = &companion {
            info!("Second commander: {}", companion.name());
        }
        Ok(CommanderSet { primary, companion })
    }

    /// Exact name first, then a localized print, then the canonical print of
    /// that card, then a fuzzy search by popularity. First legal hit wins.
    pub async fn resolve_named(&self, name: &str) -> DeckResult<Card> {
        let name = sanitize_name(name);
        if name.is_empty() {
            return Err(DeckError::Resolution(name));
        }
        let localized_query = format!(
            "legal:commander name:\"{}\" (type:legendary or o:\"can be your commander\") lang:{}",
            name, self.localized_lang
        );
        let (exact, localized) = join!(
            self.source.named_exact(&name),
            self.source.search(
                &localized_query,
                SearchOptions::new(Unique::Prints, SortOrder::Released)
            )
        );

        match exact {
            Ok(card) if is_legal_commander(&card) => return Ok(card),
            Ok(card) => debug!("Exact match {} is not commander legal", card.name()),
            Err(e) => debug!("Exact lookup for {} failed: {}", name, e),
        }

        if let Some(first) = localized.ok().and_then(|page| page.data.into_iter().next()) {
            if let Some(oracle_id) = &first.oracle_id {
                let canonical_query = format!("oracleid:{} lang:en", oracle_id);
                if let Ok(page) = self
                    .source
                    .search(
                        &canonical_query,
                        SearchOptions::new(Unique::Prints, SortOrder::Released),
                    )
                    .await
                {
                    if let Some(card) = page.data.into_iter().find(is_legal_commander) {
                        return Ok(card);
                    }
                }
            }
            if is_legal_commander(&first) {
                return Ok(first);
            }
        }

        let fuzzy_query = format!(
            "legal:commander name:\"{}\" (type:legendary or o:\"can be your commander\")",
            name
        );
        if let Ok(page) = self
            .source
            .search(
                &fuzzy_query,
                SearchOptions::new(Unique::Cards, SortOrder::Edhrec),
            )
            .await
        {
            if let Some(card) = page.data.into_iter().find(is_legal_commander) {
                return Ok(card);
            }
        }

        Err(DeckError::Resolution(name))
    }

    pub async fn random_commander(&self, identity_filter: &str) -> DeckResult<Card> {
        let query = random_commander_query(identity_filter);
        match self.draw_random(&query, COMMANDER_DRAW, |_| true).await? {
            Some(card) => Ok(card),
            None => Err(DeckError::NoCommanderFound {
                attempts: COMMANDER_DRAW.attempts,
            }),
        }
    }

    /// Second commander for `primary`. Never fails: anything that goes wrong
    /// leaves the deck with a single commander.
    pub async fn companion(
        &self,
        primary: &Card,
        allow_partner: bool,
        allow_background: bool,
    ) -> Option<Card> {
        let kind = companion_kind(primary)?;
        let primary_name = primary.name().to_string();

        let found = match &kind {
            CompanionKind::Background => {
                if !allow_background {
                    return None;
                }
                self.draw_random(&background_query(primary), BACKGROUND_DRAW, |_| true)
                    .await
            }
            _ if !allow_partner => return None,
            CompanionKind::PartnerWith(name) => {
                if name.is_empty() {
                    warn!("{} has Partner with but no partner name", primary_name);
                    return None;
                }
                match self.source.named_exact(name).await {
                    Ok(card) if is_legal_commander(&card) && card.name() != primary_name => {
                        Ok(Some(card))
                    }
                    Ok(card) => {
                        warn!("Named partner {} is not commander legal", card.name());
                        Ok(None)
                    }
                    Err(e) => Err(e),
                }
            }
            CompanionKind::Partner => match partner_query(&kind) {
                Some(query) => {
                    self.draw_random(&query, PARTNER_DRAW, |card| {
                        card.name() != primary_name
                            && companion_kind(card) == Some(CompanionKind::Partner)
                    })
                    .await
                }
                None => Ok(None),
            },
            _ => match partner_query(&kind) {
                Some(query) => {
                    self.draw_random(&query, PARTNER_DRAW, |card| card.name() != primary_name)
                        .await
                }
                None => Ok(None),
            },
        };

        match found {
            Ok(Some(card)) => Some(card),
            Ok(None) => {
                warn!("No companion found for {} ({:?})", primary_name, kind);
                None
            }
            Err(e) => {
                warn!("Companion lookup for {} failed: {}", primary_name, e);
                None
            }
        }
    }

    async fn draw_random<F>(
        &self,
        query: &str,
        policy: RetryPolicy,
        accept: F,
    ) -> DeckResult<Option<Card>>
    where
        F: Fn(&Card) -> bool,
    {
        debug!("Random draw ({} attempts): {}", policy.attempts, query);
        for attempt in 1..=policy.attempts {
            match self.source.random(query).await {
                Ok(card) if is_legal_commander(&card) && accept(&card) => return Ok(Some(card)),
                Ok(card) => debug!("Draw {} rejected {}", attempt, card.name()),
                Err(e) => warn!("Draw {} failed: {}", attempt, e),
            }
        }
        match policy.give_up {
            GiveUp::Fail => Err(DeckError::NoCommanderFound {
                attempts: policy.attempts,
            }),
            GiveUp::Degrade => Ok(None),
        }
    }
}

fn display_mask(mask: &str) -> &str {
    if mask.is_empty() {
        "colorless"
    } else {
        mask
    }
}
