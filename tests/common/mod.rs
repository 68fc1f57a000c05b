#![allow(dead_code)]

use commander_deckgen::api::{CardSource, SearchOptions, SearchPage};
use commander_deckgen::card::{Card, Legalities, Prices};
use commander_deckgen::error::{DeckError, DeckResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, Once};

static INIT: Once = Once::new();

pub fn init_logging() {
    INIT.call_once(|| {
        let _ = env_logger::builder().is_test(true).try_init();
    });
}

pub const PAGE_SIZE: usize = 50;

pub fn card(name: &str, type_line: &str, colors: &[&str], text: &str, eur: &str) -> Card {
    Card {
        id: format!("id-{}", name),
        oracle_id: Some(format!("oracle-{}", name)),
        name: name.to_string(),
        lang: Some("en".to_string()),
        type_line: Some(type_line.to_string()),
        oracle_text: Some(text.to_string()),
        cmc: 2.0,
        color_identity: colors.iter().map(|c| c.to_string()).collect(),
        legalities: Legalities {
            commander: Some("legal".to_string()),
        },
        prices: Prices {
            eur: Some(eur.to_string()),
            eur_foil: None,
        },
        ..Card::default()
    }
}

pub fn commander(name: &str, colors: &[&str], keywords: &[&str], eur: &str) -> Card {
    let mut card = card(name, "Legendary Creature — Human", colors, "", eur);
    card.keywords = keywords.iter().map(|k| k.to_string()).collect();
    card
}

pub fn background(name: &str, colors: &[&str]) -> Card {
    card(name, "Legendary Enchantment — Background", colors, "Commander creatures you own have ward 1.", "0.50")
}

/// `count` spells of `colors` cycling through every balance category plus
/// plain filler.
pub fn spells(count: usize, colors: &[&str], eur: &str) -> Vec<Card> {
    let texts = [
        "Add {C}{C}.",
        "Draw two cards.",
        "Destroy target creature.",
        "Destroy all creatures.",
        "Scry 2.",
    ];
    (0..count)
        .map(|i| {
            card(
                &format!("Spell {}", i),
                "Sorcery",
                colors,
                texts[i % texts.len()],
                eur,
            )
        })
        .collect()
}

/// A print of a commander in `lang`, optionally with a translated name.
pub fn print(name: &str, printed: Option<&str>, lang: &str, oracle_id: &str) -> Card {
    let mut card = commander(name, &["W", "U", "B", "G"], &[], "8.00");
    card.id = format!("{}-{}", oracle_id, lang);
    card.oracle_id = Some(oracle_id.to_string());
    card.printed_name = printed.map(str::to_string);
    card.lang = Some(lang.to_string());
    card
}

fn name_term(query: &str) -> Option<String> {
    let start = query.find("name:\"")? + "name:\"".len();
    let rest = &query[start..];
    let end = rest.find('"')?;
    Some(rest[..end].to_lowercase())
}

fn is_companion_query(query: &str) -> bool {
    query.contains("keyword:partner")
        || query.contains("keyword:\"friends forever\"")
        || query.contains("keyword:\"Doctor's companion\"")
        || query.contains("type:\"Time Lord Doctor\"")
}

pub fn nonbasic_lands(count: usize, colors: &[&str]) -> Vec<Card> {
    (0..count)
        .map(|i| card(&format!("Land {}", i), "Land", colors, "{T}: Add {C}.", "0.30"))
        .collect()
}

/// In-memory card source. Random draws cycle through the list matching the
/// query; searches page through spells or nonbasic lands, or look up
/// `prints` by name, language or oracle id.
#[derive(Default)]
pub struct FakeSource {
    pub commanders: Vec<Card>,
    pub partners: Vec<Card>,
    pub backgrounds: Vec<Card>,
    pub spells: Vec<Card>,
    pub lands: Vec<Card>,
    pub prints: Vec<Card>,
    pub named: HashMap<String, Card>,
    pub failing_names: HashSet<String>,
    pub random_calls: Mutex<usize>,
    pub searches: Mutex<Vec<String>>,
    pub random_queries: Mutex<Vec<String>>,
}

impl FakeSource {
    pub fn new() -> Self {
        FakeSource::default()
    }

    pub fn with_named(mut self, card: Card) -> Self {
        self.named.insert(card.name().to_lowercase(), card);
        self
    }

    pub fn random_count(&self) -> usize {
        *self.random_calls.lock().unwrap()
    }

    fn prints_where<F: Fn(&Card) -> bool>(&self, keep: F) -> SearchPage {
        SearchPage {
            data: self.prints.iter().filter(|c| keep(c)).cloned().collect(),
            has_more: false,
            next_page: None,
        }
    }

    fn page(&self, kind: &str, offset: usize) -> SearchPage {
        let cards = match kind {
            "spells" => &self.spells,
            "lands" => &self.lands,
            _ => return SearchPage::default(),
        };
        let end = (offset + PAGE_SIZE).min(cards.len());
        let data = cards.get(offset..end).map(<[Card]>::to_vec).unwrap_or_default();
        let has_more = end < cards.len();
        SearchPage {
            data,
            has_more,
            next_page: has_more.then(|| format!("{}:{}", kind, end)),
        }
    }
}

impl CardSource for FakeSource {
    async fn search(&self, query: &str, _options: SearchOptions) -> DeckResult<SearchPage> {
        self.searches.lock().unwrap().push(query.to_string());
        if query.contains("type:land -type:basic") {
            Ok(self.page("lands", 0))
        } else if query.contains("-type:land") {
            Ok(self.page("spells", 0))
        } else if let Some(rest) = query.strip_prefix("oracleid:") {
            let oracle_id = rest.split_whitespace().next().unwrap_or("");
            Ok(self.prints_where(|c| {
                c.oracle_id.as_deref() == Some(oracle_id) && c.lang.as_deref() == Some("en")
            }))
        } else if let Some(term) = name_term(query) {
            let lang = query
                .split_whitespace()
                .find_map(|part| part.strip_prefix("lang:"))
                .unwrap_or("en");
            Ok(self.prints_where(|c| {
                let printed = c.printed_name.as_deref().unwrap_or("").to_lowercase();
                c.lang.as_deref() == Some(lang)
                    && (c.name.to_lowercase().contains(&term) || printed.contains(&term))
            }))
        } else {
            Ok(SearchPage::default())
        }
    }

    async fn next_page(&self, token: &str) -> DeckResult<SearchPage> {
        let (kind, offset) = token.split_once(':').unwrap_or(("", "0"));
        Ok(self.page(kind, offset.parse().unwrap_or(0)))
    }

    async fn random(&self, query: &str) -> DeckResult<Card> {
        let mut calls = self.random_calls.lock().unwrap();
        *calls += 1;
        self.random_queries.lock().unwrap().push(query.to_string());
        let pool = if is_companion_query(query) {
            &self.partners
        } else if query.starts_with("legal:commander type:background") {
            &self.backgrounds
        } else {
            &self.commanders
        };
        if pool.is_empty() {
            return Err(DeckError::DataSource { status: 404 });
        }
        Ok(pool[(*calls - 1) % pool.len()].clone())
    }

    async fn named_exact(&self, name: &str) -> DeckResult<Card> {
        let key = name.to_lowercase();
        if self.failing_names.contains(&key) {
            return Err(DeckError::DataSource { status: 500 });
        }
        if let Some(card) = self.named.get(&key) {
            return Ok(card.clone());
        }
        match ["Plains", "Island", "Swamp", "Mountain", "Forest", "Wastes"]
            .iter()
            .find(|basic| basic.to_lowercase() == key)
        {
            Some(basic) => Ok(card(basic, "Basic Land", &[], "", "0.10")),
            None => Err(DeckError::DataSource { status: 404 }),
        }
    }
}
