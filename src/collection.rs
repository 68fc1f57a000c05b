use crate::error::DeckResult;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;

/// Owned card quantities keyed by lower-cased card name. Parsing the
/// various import formats happens upstream; this is the normalized result.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OwnedCards {
    quantities: HashMap<String, u32>,
}

impl OwnedCards {
    pub fn new() -> Self {
        OwnedCards::default()
    }

    pub fn from_map(map: HashMap<String, u32>) -> Self {
        let mut owned = OwnedCards::new();
        for (name, qty) in map {
            owned.add(&name, qty);
        }
        owned
    }

    /// Reads a JSON object of `{"card name": quantity}`.
    pub fn from_json_file(file_path: &str) -> DeckResult<Self> {
        let file = File::open(file_path)?;
        let reader = BufReader::new(file);
        let map: HashMap<String, u32> = serde_json::from_reader(reader)?;
        Ok(OwnedCards::from_map(map))
    }

    pub fn add(&mut self, name: &str, qty: u32) {
        let key = name.trim().to_lowercase();
        if key.is_empty() || qty == 0 {
            return;
        }
        *self.quantities.entry(key).or_insert(0) += qty;
    }

    /// Sums quantities of several uploaded collections.
    pub fn merged<'a, I>(collections: I) -> Self
    where
        I: IntoIterator<Item = &'a OwnedCards>,
    {
        let mut merged = OwnedCards::new();
        for collection in collections {
            for (name, qty) in &collection.quantities {
                merged.add(name, *qty);
            }
        }
        merged
    }

    pub fn quantity(&self, name: &str) -> u32 {
        self.quantities
            .get(&name.trim().to_lowercase())
            .copied()
            .unwrap_or(0)
    }

    pub fn owns(&self, name: &str) -> bool {
        self.quantity(name) > 0
    }

    pub fn len(&self) -> usize {
        self.quantities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.quantities.is_empty()
    }

    pub(crate) fn snapshot(&self) -> HashMap<String, u32> {
        self.quantities.clone()
    }
}
