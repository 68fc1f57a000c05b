//! Deck generation pipeline.
//!
//! A run moves through named stages; before each stage the run's token is
//! checked so a run superseded by a newer request stops at the next stage
//! boundary with `DeckError::Superseded` instead of producing a stale deck.

use crate::api::CardSource;
use crate::balance::Balancer;
use crate::card::Card;
use crate::collection::OwnedCards;
use crate::commander::CommanderResolver;
use crate::config::{ClientSettings, DeckConfig};
use crate::deck::{Deck, LandCard, DECK_SIZE};
use crate::error::{DeckError, DeckResult};
use crate::mana::{build_mana_base, pad_to_size, LandMap};
use crate::matchers::{CategoryTable, MechanicCatalog};
use crate::pool::{fetch_pool, fetch_rebalance_pool};
use crate::scoring::{greedy_pick_unique, Scorer};
use indicatif::ProgressBar;
use log::{info, warn};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::collections::HashSet;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Idle,
    ResolvingCommanders,
    FetchingPool,
    SelectingSpells,
    Balancing,
    BuildingManaBase,
    Materializing,
    Done,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Stage::Idle => "idle",
            Stage::ResolvingCommanders => "resolving commanders",
            Stage::FetchingPool => "fetching candidates",
            Stage::SelectingSpells => "selecting spells",
            Stage::Balancing => "balancing categories",
            Stage::BuildingManaBase => "building mana base",
            Stage::Materializing => "fetching land details",
            Stage::Done => "done",
            Stage::Failed => "failed",
        };
        write!(f, "{}", label)
    }
}

/// Identifies one generation request. Only the most recently issued token
/// is current.
#[derive(Debug, Clone)]
pub struct GenerationToken {
    id: u64,
    latest: Arc<AtomicU64>,
}

impl GenerationToken {
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn is_current(&self) -> bool {
        self.latest.load(Ordering::SeqCst) == self.id
    }
}

struct Run<'a> {
    token: GenerationToken,
    stage: &'a Mutex<Stage>,
}

impl<'a> Run<'a> {
    fn set(&self, stage: Stage) {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner()) = stage;
    }

    fn check(&self) -> DeckResult<()> {
        if self.token.is_current() {
            Ok(())
        } else {
            Err(DeckError::Superseded)
        }
    }

    fn enter(&self, stage: Stage) -> DeckResult<()> {
        self.check()?;
        info!("[run {}] {}", self.token.id, stage);
        self.set(stage);
        Ok(())
    }

    fn finish<T>(&self, result: DeckResult<T>) -> DeckResult<T> {
        match &result {
            Ok(_) => self.set(Stage::Done),
            Err(DeckError::Superseded) => info!("[run {}] superseded", self.token.id),
            Err(e) => {
                warn!("[run {}] failed: {}", self.token.id, e);
                self.set(Stage::Failed);
            }
        }
        result
    }
}

pub struct DeckAssembler<S> {
    source: S,
    catalog: MechanicCatalog,
    categories: CategoryTable,
    page_delay: Duration,
    detail_delay: Duration,
    latest: Arc<AtomicU64>,
    stage: Mutex<Stage>,
}

impl<S: CardSource> DeckAssembler<S> {
    pub fn new(source: S) -> Self {
        let settings = ClientSettings::default();
        DeckAssembler {
            source,
            catalog: MechanicCatalog::default(),
            categories: CategoryTable::default(),
            page_delay: settings.page_delay,
            detail_delay: settings.detail_delay,
            latest: Arc::new(AtomicU64::new(0)),
            stage: Mutex::new(Stage::Idle),
        }
    }

    pub fn with_settings(mut self, settings: &ClientSettings) -> Self {
        self.page_delay = settings.page_delay;
        self.detail_delay = settings.detail_delay;
        self
    }

    pub fn with_pacing(mut self, page_delay: Duration, detail_delay: Duration) -> Self {
        self.page_delay = page_delay;
        self.detail_delay = detail_delay;
        self
    }

    pub fn with_catalog(mut self, catalog: MechanicCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn with_categories(mut self, categories: CategoryTable) -> Self {
        self.categories = categories;
        self
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn catalog(&self) -> &MechanicCatalog {
        &self.catalog
    }

    /// Stage of the most recent run.
    pub fn stage(&self) -> Stage {
        *self.stage.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Issues a new token, making every earlier one stale.
    pub fn begin_generation(&self) -> GenerationToken {
        let id = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        GenerationToken {
            id,
            latest: Arc::clone(&self.latest),
        }
    }

    pub async fn generate(&self, config: &DeckConfig, owned: &OwnedCards) -> DeckResult<Deck> {
        let token = self.begin_generation();
        self.generate_with(token, config, owned).await
    }

    pub async fn generate_with(
        &self,
        token: GenerationToken,
        config: &DeckConfig,
        owned: &OwnedCards,
    ) -> DeckResult<Deck> {
        let run = Run {
            token,
            stage: &self.stage,
        };
        let config = config.normalized(&self.catalog);
        let result = self.run_generation(&run, &config, owned).await;
        run.finish(result)
    }

    async fn run_generation(
        &self,
        run: &Run<'_>,
        config: &DeckConfig,
        owned: &OwnedCards,
    ) -> DeckResult<Deck> {
        let budget = config.budget_eur;
        let land_target = config.land_target;

        run.enter(Stage::ResolvingCommanders)?;
        let resolver = CommanderResolver::new(&self.source, &config.localized_lang);
        let commanders = resolver.resolve(config).await?;
        let identity = commanders.color_identity();
        let mut spent = commanders.total_price();
        if budget > 0.0 && spent > budget {
            return Err(DeckError::BudgetExceeded {
                budget,
                commanders: spent,
            });
        }

        run.enter(Stage::FetchingPool)?;
        let pool = fetch_pool(
            &self.source,
            &identity,
            &self.catalog,
            &config.mechanics,
            self.page_delay,
        )
        .await?;

        run.enter(Stage::SelectingSpells)?;
        let mut rng = StdRng::from_entropy();
        let scorer = Scorer::new(config, owned, &self.catalog);
        let spells_sorted = scorer.sort_by_preference(&pool.spells, &mut rng);
        let lands_sorted = scorer.sort_by_preference(&pool.lands, &mut rng);
        let banned: HashSet<String> = commanders.names().into_iter().collect();
        let spells_target = DECK_SIZE - commanders.len() - land_target as usize;
        let selection = greedy_pick_unique(&spells_sorted, spells_target, &banned, spent, budget);
        spent = selection.spent;
        if selection.picks.len() < spells_target {
            warn!(
                "Only {} of {} spells could be selected",
                selection.picks.len(),
                spells_target
            );
        }

        run.enter(Stage::Balancing)?;
        let balancer = Balancer::new(&self.categories, &config.targets, budget);
        let resorted = scorer.sort_by_preference(&pool.spells, &mut rng);
        let outcome = balancer.balance(selection.picks, &resorted, &banned, spent);
        spent = outcome.spent;

        run.enter(Stage::BuildingManaBase)?;
        let mut taken = banned.clone();
        taken.extend(outcome.picks.iter().map(|c| c.name().to_string()));
        let mana = build_mana_base(&identity, land_target, &lands_sorted, &taken, spent, budget);
        spent = mana.spent;
        let mut lands = mana.lands;
        pad_to_size(
            &mut lands,
            &identity,
            commanders.len() + outcome.picks.len(),
            DECK_SIZE,
        );

        run.enter(Stage::Materializing)?;
        let land_cards = self.materialize_lands(&lands, &mana.nonbasics).await;
        run.check()?;

        let deck = Deck::new(
            identity,
            commanders.cards().into_iter().cloned().collect(),
            outcome.picks,
            lands,
            land_cards,
            spent,
            budget,
            outcome.counts,
            config.targets,
        );
        for problem in deck.violations() {
            warn!("Generated deck: {}", problem);
        }
        info!(
            "Deck ready: {} ({}), {} spells, {} lands, {:.2}€",
            deck.commander_names().join(" + "),
            if deck.color_identity().is_empty() {
                "colorless"
            } else {
                deck.color_identity()
            },
            deck.spells().len(),
            deck.lands().total(),
            deck.spent_eur()
        );
        Ok(deck)
    }

    /// Full records for every land entry. Nonbasics picked from the pool are
    /// reused; the rest are looked up by name, one at a time.
    async fn materialize_lands(&self, lands: &LandMap, known: &[Card]) -> Vec<LandCard> {
        let pb = ProgressBar::new(lands.len() as u64);
        let mut out = Vec::with_capacity(lands.len());
        for (name, qty) in lands.iter() {
            let card = match known.iter().find(|c| c.name() == name) {
                Some(card) => card.clone(),
                None => {
                    let fetched = match self.source.named_exact(name).await {
                        Ok(card) => card,
                        Err(e) => {
                            warn!("Could not fetch details for {}: {}", name, e);
                            Card::placeholder(name)
                        }
                    };
                    sleep(self.detail_delay).await;
                    fetched
                }
            };
            out.push(LandCard { card, qty });
            pb.inc(1);
        }
        pb.finish_and_clear();
        out
    }

    /// Re-runs candidate fetching and balancing for an existing deck. Only
    /// the spells change; commanders and lands are kept.
    pub async fn rebalance(
        &self,
        deck: &Deck,
        config: &DeckConfig,
        owned: &OwnedCards,
    ) -> DeckResult<Deck> {
        let token = self.begin_generation();
        let run = Run {
            token,
            stage: &self.stage,
        };
        let config = config.normalized(&self.catalog);
        let result = self.run_rebalance(&run, deck, &config, owned).await;
        run.finish(result)
    }

    async fn run_rebalance(
        &self,
        run: &Run<'_>,
        deck: &Deck,
        config: &DeckConfig,
        owned: &OwnedCards,
    ) -> DeckResult<Deck> {
        run.enter(Stage::FetchingPool)?;
        let pool = fetch_rebalance_pool(&self.source, deck.color_identity(), self.page_delay).await?;

        run.enter(Stage::Balancing)?;
        let current: HashSet<&str> = deck.spell_names().into_iter().collect();
        let others: Vec<Card> = pool
            .into_iter()
            .filter(|c| !current.contains(c.name()))
            .collect();
        let mut rng = StdRng::from_entropy();
        let scorer = Scorer::new(config, owned, &self.catalog);
        let sorted = scorer.sort_by_preference(&others, &mut rng);

        let banned: HashSet<String> = deck
            .commander_names()
            .into_iter()
            .map(str::to_string)
            .chain(deck.lands().iter().map(|(name, _)| name.to_string()))
            .collect();
        let balancer = Balancer::new(&self.categories, &config.targets, deck.budget_eur());
        let outcome = balancer.balance(deck.spells().to_vec(), &sorted, &banned, deck.spent_eur());
        info!("Rebalance swapped {} spells", outcome.swaps);

        Ok(deck.with_spells(outcome.picks, outcome.counts, outcome.spent, config.targets))
    }
}
