use crate::api::{CardSource, SearchOptions, SearchPage};
use crate::card::Card;
use crate::error::DeckResult;
use log::debug;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::sync::{Mutex, MutexGuard};

/// Wraps a card source and remembers exact-name lookups, so basic lands and
/// staples are only fetched once per session.
pub struct CachedSource<S> {
    inner: S,
    cache: Mutex<HashMap<String, Card>>,
}

impl<S: CardSource> CachedSource<S> {
    pub fn new(inner: S) -> Self {
        CachedSource {
            inner,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Card>> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Seeds the cache from a JSON array of card records.
    pub fn load_cache_from_json(&self, file_path: &str) -> DeckResult<usize> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let cards: Vec<Card> = serde_json::from_reader(reader)?;

        let mut cache = self.lock();
        let count = cards.len();
        for card in cards {
            cache.insert(card.name().to_lowercase(), card);
        }
        Ok(count)
    }

    pub fn get_card_by_name(&self, name: &str) -> Option<Card> {
        self.lock().get(&name.trim().to_lowercase()).cloned()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<S: CardSource> CardSource for CachedSource<S> {
    async fn search(&self, query: &str, options: SearchOptions) -> DeckResult<SearchPage> {
        self.inner.search(query, options).await
    }

    async fn next_page(&self, token: &str) -> DeckResult<SearchPage> {
        self.inner.next_page(token).await
    }

    async fn random(&self, query: &str) -> DeckResult<Card> {
        self.inner.random(query).await
    }

    async fn named_exact(&self, name: &str) -> DeckResult<Card> {
        if let Some(card) = self.get_card_by_name(name) {
            debug!("Cache hit for {}", name);
            return Ok(card);
        }
        let card = self.inner.named_exact(name).await?;
        self.lock().insert(name.trim().to_lowercase(), card.clone());
        Ok(card)
    }
}
