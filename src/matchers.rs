//! Phrase tables used to recognise mechanics and deck-building categories
//! in oracle text. Both tables are plain data and can be swapped for a JSON
//! document without touching the code.

use crate::card::Card;
use crate::error::{DeckError, DeckResult};
use lazy_static::lazy_static;
use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of mechanics a user may select at once.
pub const MAX_SELECTED_MECHANICS: usize = 5;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MechanicTag {
    pub key: String,
    pub label: String,
    pub matchers: Vec<String>,
}

impl MechanicTag {
    fn new(key: &str, label: &str, matchers: &[&str]) -> Self {
        MechanicTag {
            key: key.to_string(),
            label: label.to_string(),
            matchers: matchers.iter().map(|m| m.to_string()).collect(),
        }
    }

    /// Literal, case-insensitive containment of any matcher phrase.
    pub fn matches(&self, oracle_lower: &str) -> bool {
        self.matchers
            .iter()
            .any(|m| oracle_lower.contains(&m.to_lowercase()))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct MechanicCatalog {
    pub tags: Vec<MechanicTag>,
}

impl Default for MechanicCatalog {
    fn default() -> Self {
        MechanicCatalog {
            tags: vec![
                MechanicTag::new("tokens", "Tokens", &["create a token", "token", "populate"]),
                MechanicTag::new(
                    "sacrifice",
                    "Sacrifice",
                    &["sacrifice a", "whenever you sacrifice", "devour", "exploit", "aristocrat"],
                ),
                MechanicTag::new(
                    "lifegain",
                    "Lifegain",
                    &["you gain", "lifelink", "whenever you gain life"],
                ),
                MechanicTag::new(
                    "+1+1",
                    "+1/+1 Counters",
                    &["+1/+1 counter", "proliferate", "evolve", "modular"],
                ),
                MechanicTag::new(
                    "reanimator",
                    "Reanimator",
                    &[
                        "return target creature card from your graveyard",
                        "reanimate",
                        "unearth",
                        "persist",
                        "undying",
                        "embalm",
                        "eternalize",
                    ],
                ),
                MechanicTag::new(
                    "blink",
                    "Blink / Flicker",
                    &["exile then return", "flicker", "phase out", "enters the battlefield ", "blink"],
                ),
                MechanicTag::new(
                    "spellslinger",
                    "Spellslinger",
                    &[
                        "instant or sorcery",
                        "prowess",
                        "magecraft",
                        "copy target instant",
                        "storm",
                        "cast from exile",
                    ],
                ),
                MechanicTag::new(
                    "landfall",
                    "Landfall",
                    &[
                        "landfall",
                        "whenever a land enters the battlefield under your control",
                        "search your library for a land",
                    ],
                ),
                MechanicTag::new(
                    "artifacts",
                    "Artifacts",
                    &[
                        "artifact you control",
                        "improvise",
                        "affinity for artifacts",
                        "create a treasure",
                        "metalcraft",
                    ],
                ),
                MechanicTag::new(
                    "enchantress",
                    "Enchantments",
                    &["enchantment spell", "constellation", "aura", "enchantress", "enchant creature"],
                ),
                MechanicTag::new(
                    "mill",
                    "Mill",
                    &[
                        "mill",
                        "put the top",
                        "cards from the top of their library into their graveyard",
                        "self-mill",
                    ],
                ),
                MechanicTag::new(
                    "voltron",
                    "Voltron",
                    &["equip", "equipped creature", "attach", "aura you control", "enchanted creature gets"],
                ),
                MechanicTag::new(
                    "tribal",
                    "Tribal / Typal",
                    &[
                        "creatures you control get",
                        "creature of the chosen type",
                        "changeling",
                        "lord",
                        "share a creature type",
                    ],
                ),
                MechanicTag::new(
                    "wheels",
                    "Wheels / Discard",
                    &[
                        "each player discards",
                        "discard your hand then draw",
                        "wheel",
                        "madness",
                        "whenever a player discards",
                    ],
                ),
                MechanicTag::new(
                    "topdeck",
                    "Top Deck",
                    &["top of your library", "scry", "look at the top", "miracle", "cascade"],
                ),
                MechanicTag::new(
                    "theft",
                    "Theft / Threaten",
                    &["gain control", "until end of turn", "steal", "act of treason", "control of target"],
                ),
                MechanicTag::new(
                    "stax",
                    "Stax / Tax",
                    &["can't cast", "additional cost", "each opponent", "opponents can't", "ward", "tax"],
                ),
                MechanicTag::new(
                    "storm",
                    "Storm / Combo",
                    &["storm", "copy this spell", "each spell you cast", "magecraft", "whenever you cast"],
                ),
                MechanicTag::new(
                    "treasure",
                    "Treasures",
                    &["create a treasure", "treasure token", "sacrifice a treasure", "whenever a treasure"],
                ),
                MechanicTag::new(
                    "graveyard",
                    "Graveyard",
                    &[
                        "from your graveyard",
                        "flashback",
                        "retrace",
                        "dredge",
                        "delve",
                        "escape",
                        "whenever a creature dies",
                    ],
                ),
            ],
        }
    }
}

impl MechanicCatalog {
    pub fn from_json(text: &str) -> DeckResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn get(&self, key: &str) -> Option<&MechanicTag> {
        self.tags.iter().find(|t| t.key == key)
    }

    /// Number of selected tags with at least one phrase in the card's text.
    pub fn match_count(&self, selected: &[String], card: &Card) -> usize {
        if selected.is_empty() {
            return 0;
        }
        let oracle = card.oracle_lower();
        self.tags
            .iter()
            .filter(|tag| selected.contains(&tag.key) && tag.matches(&oracle))
            .count()
    }

    /// Oracle filter accepting any phrase of any selected mechanic, e.g.
    /// `((o:"a" or o:"b") or (o:"c"))`. Empty when nothing is selected.
    pub fn oracle_query(&self, selected: &[String]) -> String {
        let groups: Vec<String> = selected
            .iter()
            .filter_map(|key| self.get(key))
            .filter(|tag| !tag.matchers.is_empty())
            .map(|tag| {
                let parts: Vec<String> = tag
                    .matchers
                    .iter()
                    .map(|m| format!("o:\"{}\"", m))
                    .collect();
                format!("({})", parts.join(" or "))
            })
            .collect();
        if groups.is_empty() {
            String::new()
        } else {
            format!("({})", groups.join(" or "))
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Ramp,
    Draw,
    Removal,
    Wraths,
}

impl Category {
    /// Balancing order; earlier categories win when candidates overlap.
    pub const ALL: [Category; 4] = [
        Category::Ramp,
        Category::Draw,
        Category::Removal,
        Category::Wraths,
    ];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Category::Ramp => "ramp",
            Category::Draw => "draw",
            Category::Removal => "removal",
            Category::Wraths => "wraths",
        };
        write!(f, "{}", name)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct CategoryCounts {
    pub ramp: usize,
    pub draw: usize,
    pub removal: usize,
    pub wraths: usize,
}

impl CategoryCounts {
    pub fn get(&self, category: Category) -> usize {
        match category {
            Category::Ramp => self.ramp,
            Category::Draw => self.draw,
            Category::Removal => self.removal,
            Category::Wraths => self.wraths,
        }
    }

    fn slot(&mut self, category: Category) -> &mut usize {
        match category {
            Category::Ramp => &mut self.ramp,
            Category::Draw => &mut self.draw,
            Category::Removal => &mut self.removal,
            Category::Wraths => &mut self.wraths,
        }
    }

    pub fn increment(&mut self, category: Category) {
        *self.slot(category) += 1;
    }

    pub fn decrement(&mut self, category: Category) {
        let slot = self.slot(category);
        *slot = slot.saturating_sub(1);
    }
}

/// Serializable definition of one category.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct CategoryRule {
    pub category: Category,
    /// Regex alternatives tested against lower-cased oracle text.
    pub patterns: Vec<String>,
    /// Extra phrases that qualify a card only when it is an artifact.
    #[serde(default)]
    pub artifact_phrases: Vec<String>,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    category: Category,
    pattern: Regex,
    artifact_phrases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct CategoryTable {
    rules: Vec<CompiledRule>,
}

pub fn default_category_rules() -> Vec<CategoryRule> {
    let rule = |category, patterns: &[&str], artifact: &[&str]| CategoryRule {
        category,
        patterns: patterns.iter().map(|p| p.to_string()).collect(),
        artifact_phrases: artifact.iter().map(|p| p.to_string()).collect(),
    };
    vec![
        rule(
            Category::Ramp,
            &[r"add \{", "search your library for a land", "treasure token"],
            &["add one mana"],
        ),
        rule(
            Category::Draw,
            &["draw a card", "draw two cards", "whenever you draw a card"],
            &[],
        ),
        rule(
            Category::Removal,
            &["destroy target", "exile target", "counter target", "fight target"],
            &[],
        ),
        rule(
            Category::Wraths,
            &["destroy all creatures", "exile all creatures", "all creatures get"],
            &[],
        ),
    ]
}

lazy_static! {
    static ref DEFAULT_CATEGORIES: CategoryTable = CategoryTable::from_rules(&default_category_rules())
        .expect("default category matchers must compile");
}

impl Default for CategoryTable {
    fn default() -> Self {
        DEFAULT_CATEGORIES.clone()
    }
}

impl CategoryTable {
    pub fn from_rules(rules: &[CategoryRule]) -> DeckResult<Self> {
        let mut compiled = Vec::with_capacity(rules.len());
        for rule in rules {
            let pattern = RegexBuilder::new(&format!("({})", rule.patterns.join("|")))
                .case_insensitive(true)
                .build()
                .map_err(|e| DeckError::Config(format!("{} matcher: {}", rule.category, e)))?;
            compiled.push(CompiledRule {
                category: rule.category,
                pattern,
                artifact_phrases: rule
                    .artifact_phrases
                    .iter()
                    .map(|p| p.to_lowercase())
                    .collect(),
            });
        }
        Ok(CategoryTable { rules: compiled })
    }

    pub fn from_json(text: &str) -> DeckResult<Self> {
        let rules: Vec<CategoryRule> = serde_json::from_str(text)?;
        Self::from_rules(&rules)
    }

    pub fn qualifies(&self, category: Category, card: &Card) -> bool {
        let oracle = card.oracle_lower();
        self.rules
            .iter()
            .filter(|rule| rule.category == category)
            .any(|rule| {
                rule.pattern.is_match(&oracle)
                    || (!rule.artifact_phrases.is_empty()
                        && card.full_type_line().to_lowercase().contains("artifact")
                        && rule.artifact_phrases.iter().any(|p| oracle.contains(p)))
            })
    }

    pub fn counts<'a, I>(&self, cards: I) -> CategoryCounts
    where
        I: IntoIterator<Item = &'a Card>,
    {
        let mut counts = CategoryCounts::default();
        for card in cards {
            for category in Category::ALL {
                if self.qualifies(category, card) {
                    counts.increment(category);
                }
            }
        }
        counts
    }
}
