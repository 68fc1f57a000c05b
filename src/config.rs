use crate::error::{DeckError, DeckResult};
use crate::identity::canonical_mask;
use crate::matchers::{Category, MechanicCatalog, MAX_SELECTED_MECHANICS};
use dotenv::dotenv;
use log::warn;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs::File;
use std::io::BufReader;
use std::str::FromStr;
use std::time::Duration;

pub const MIN_LANDS: u32 = 32;
pub const MAX_LANDS: u32 = 40;
pub const DEFAULT_API_URL: &str = "https://api.scryfall.com";

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum CommanderMode {
    #[default]
    Random,
    Selection,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BalanceTarget {
    pub min: usize,
    pub max: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct BalanceTargets {
    pub ramp: BalanceTarget,
    pub draw: BalanceTarget,
    pub removal: BalanceTarget,
    pub wraths: BalanceTarget,
}

impl Default for BalanceTargets {
    fn default() -> Self {
        BalanceTargets {
            ramp: BalanceTarget { min: 10, max: 12 },
            draw: BalanceTarget { min: 9, max: 12 },
            removal: BalanceTarget { min: 8, max: 10 },
            wraths: BalanceTarget { min: 3, max: 5 },
        }
    }
}

impl BalanceTargets {
    pub fn get(&self, category: Category) -> BalanceTarget {
        match category {
            Category::Ramp => self.ramp,
            Category::Draw => self.draw,
            Category::Removal => self.removal,
            Category::Wraths => self.wraths,
        }
    }

    pub fn min(&self, category: Category) -> usize {
        self.get(category).min
    }
}

/// Everything one generation run reads. Taken as a snapshot at the start
/// of the run and never mutated by the pipeline.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct DeckConfig {
    pub commander_mode: CommanderMode,
    pub commander_name: String,
    /// Identity restriction for random commanders; empty means any.
    pub identity_filter: String,
    pub allow_partner: bool,
    pub allow_background: bool,
    pub land_target: u32,
    /// Zero means unlimited.
    pub budget_eur: f64,
    pub mechanics: Vec<String>,
    pub weight_owned: f64,
    pub weight_popularity: f64,
    pub targets: BalanceTargets,
    /// Second language searched when resolving commander names.
    pub localized_lang: String,
}

impl Default for DeckConfig {
    fn default() -> Self {
        DeckConfig {
            commander_mode: CommanderMode::Random,
            commander_name: String::new(),
            identity_filter: String::new(),
            allow_partner: true,
            allow_background: true,
            land_target: 37,
            budget_eur: 0.0,
            mechanics: Vec::new(),
            weight_owned: 1.0,
            weight_popularity: 1.0,
            targets: BalanceTargets::default(),
            localized_lang: "fr".to_string(),
        }
    }
}

impl DeckConfig {
    pub fn random() -> Self {
        DeckConfig::default()
    }

    pub fn for_commander(name: &str) -> Self {
        DeckConfig {
            commander_mode: CommanderMode::Selection,
            commander_name: name.trim().to_string(),
            ..DeckConfig::default()
        }
    }

    pub fn from_json_file(path: &str) -> DeckResult<Self> {
        let file = File::open(path)?;
        let reader = BufReader::new(file);
        let config: DeckConfig = serde_json::from_reader(reader)?;
        Ok(config)
    }

    pub fn from_env() -> DeckResult<Self> {
        dotenv().ok();
        let mut config = DeckConfig::default();
        if let Ok(name) = env::var("DECK_COMMANDER") {
            if !name.trim().is_empty() {
                config.commander_mode = CommanderMode::Selection;
                config.commander_name = name.trim().to_string();
            }
        }
        if let Ok(identity) = env::var("DECK_IDENTITY") {
            config.identity_filter = identity;
        }
        if let Some(lands) = env_parse("DECK_LANDS")? {
            config.land_target = lands;
        }
        if let Some(budget) = env_parse("DECK_BUDGET")? {
            config.budget_eur = budget;
        }
        if let Ok(list) = env::var("DECK_MECHANICS") {
            config.mechanics = list
                .split(',')
                .map(|k| k.trim().to_string())
                .filter(|k| !k.is_empty())
                .collect();
        }
        if let Some(weight) = env_parse("DECK_WEIGHT_OWNED")? {
            config.weight_owned = weight;
        }
        if let Some(weight) = env_parse("DECK_WEIGHT_POPULARITY")? {
            config.weight_popularity = weight;
        }
        if let Some(allow) = env_parse("DECK_ALLOW_PARTNER")? {
            config.allow_partner = allow;
        }
        if let Some(allow) = env_parse("DECK_ALLOW_BACKGROUND")? {
            config.allow_background = allow;
        }
        Ok(config)
    }

    /// Copy with every field brought into its accepted range.
    pub fn normalized(&self, catalog: &MechanicCatalog) -> DeckConfig {
        let mut config = self.clone();
        config.land_target = config.land_target.clamp(MIN_LANDS, MAX_LANDS);
        if !config.budget_eur.is_finite() || config.budget_eur < 0.0 {
            config.budget_eur = 0.0;
        }
        config.identity_filter = canonical_mask(&config.identity_filter);
        config.commander_name = config.commander_name.trim().to_string();

        let mut mechanics = Vec::new();
        for key in &self.mechanics {
            if catalog.get(key).is_none() {
                warn!("Ignoring unknown mechanic \"{}\"", key);
                continue;
            }
            if mechanics.contains(key) {
                continue;
            }
            if mechanics.len() >= MAX_SELECTED_MECHANICS {
                warn!(
                    "At most {} mechanics can be selected, dropping \"{}\"",
                    MAX_SELECTED_MECHANICS, key
                );
                continue;
            }
            mechanics.push(key.clone());
        }
        config.mechanics = mechanics;
        config
    }
}

/// Settings of the HTTP card source.
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub api_url: String,
    pub page_delay: Duration,
    pub detail_delay: Duration,
}

impl Default for ClientSettings {
    fn default() -> Self {
        ClientSettings {
            api_url: DEFAULT_API_URL.to_string(),
            page_delay: Duration::from_millis(100),
            detail_delay: Duration::from_millis(60),
        }
    }
}

impl ClientSettings {
    pub fn from_env() -> DeckResult<Self> {
        dotenv().ok();
        let mut settings = ClientSettings::default();
        if let Ok(url) = env::var("SCRYFALL_API_URL") {
            settings.api_url = url.trim_end_matches('/').to_string();
        }
        if let Some(ms) = env_parse::<u64>("SCRYFALL_PAGE_DELAY_MS")? {
            settings.page_delay = Duration::from_millis(ms);
        }
        if let Some(ms) = env_parse::<u64>("SCRYFALL_DETAIL_DELAY_MS")? {
            settings.detail_delay = Duration::from_millis(ms);
        }
        Ok(settings)
    }
}

fn env_parse<T: FromStr>(key: &str) -> DeckResult<Option<T>> {
    match env::var(key) {
        Ok(value) => value
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| DeckError::Config(format!("{} has an invalid value: {}", key, value))),
        Err(_) => Ok(None),
    }
}
