use crate::api::{CardSource, SearchOptions, SortOrder, Unique};
use crate::card::Card;
use crate::error::DeckResult;
use futures::join;
use log::debug;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::time::sleep;

pub const MAX_SUGGESTIONS: usize = 20;
pub const MIN_QUERY_CHARS: usize = 2;
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(220);

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Suggestion {
    /// Localized printed name when the match came from a translated print.
    pub display: String,
    pub canonical: String,
    pub type_line: String,
    pub oracle_id: Option<String>,
    pub image: Option<String>,
}

impl From<&Card> for Suggestion {
    fn from(card: &Card) -> Self {
        let image = card
            .image_uris
            .as_ref()
            .and_then(|uris| uris.small.clone())
            .or_else(|| {
                card.card_faces
                    .iter()
                    .filter_map(|face| face.image_uris.as_ref())
                    .find_map(|uris| uris.small.clone())
            });
        Suggestion {
            display: card.display_name().to_string(),
            canonical: card.name().to_string(),
            type_line: card.full_type_line(),
            oracle_id: card.oracle_id.clone(),
            image,
        }
    }
}

/// Commander name suggestions in the canonical and a localized language.
/// Every call supersedes the calls before it: a superseded call returns
/// `Ok(None)` instead of its (stale) results.
pub struct CommanderSuggester<'a, S> {
    source: &'a S,
    localized_lang: String,
    debounce: Duration,
    latest: AtomicU64,
}

impl<'a, S: CardSource> CommanderSuggester<'a, S> {
    pub fn new(source: &'a S, localized_lang: &str) -> Self {
        CommanderSuggester {
            source,
            localized_lang: localized_lang.to_string(),
            debounce: DEFAULT_DEBOUNCE,
            latest: AtomicU64::new(0),
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    fn is_current(&self, ticket: u64) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket
    }

    pub async fn suggest(&self, partial: &str) -> DeckResult<Option<Vec<Suggestion>>> {
        let ticket = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        let term = partial.replace('"', "").trim().to_string();
        if term.chars().count() < MIN_QUERY_CHARS {
            return Ok(Some(Vec::new()));
        }

        sleep(self.debounce).await;
        if !self.is_current(ticket) {
            debug!("Suggestions for \"{}\" superseded before sending", term);
            return Ok(None);
        }

        let base = format!(
            "legal:commander (type:\"legendary creature\" or (type:planeswalker and o:\"can be your commander\") or type:background) name:\"{}\"",
            term
        );
        let localized = format!("{} lang:{}", base, self.localized_lang);
        let options = SearchOptions::new(Unique::Prints, SortOrder::Edhrec);
        let (canonical_page, localized_page) = join!(
            self.source.search(&base, options),
            self.source.search(&localized, options)
        );
        if !self.is_current(ticket) {
            debug!("Suggestions for \"{}\" superseded", term);
            return Ok(None);
        }
        let (canonical_page, localized_page) = (canonical_page?, localized_page?);

        let mut seen = HashSet::new();
        let suggestions = canonical_page
            .data
            .iter()
            .chain(localized_page.data.iter())
            .filter(|card| {
                let key = card
                    .oracle_id
                    .clone()
                    .unwrap_or_else(|| format!("{}|{}", card.id, card.name()));
                seen.insert(key)
            })
            .take(MAX_SUGGESTIONS)
            .map(Suggestion::from)
            .collect();
        Ok(Some(suggestions))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::SearchPage;
    use crate::error::DeckError;
    use std::cell::RefCell;

    struct NameSource {
        queries: RefCell<Vec<String>>,
    }

    fn print(name: &str, printed: Option<&str>, oracle_id: &str) -> Card {
        Card {
            name: name.to_string(),
            printed_name: printed.map(str::to_string),
            oracle_id: Some(oracle_id.to_string()),
            type_line: Some("Legendary Creature".to_string()),
            ..Card::default()
        }
    }

    impl CardSource for NameSource {
        async fn search(&self, query: &str, _options: SearchOptions) -> DeckResult<SearchPage> {
            self.queries.borrow_mut().push(query.to_string());
            let data = if query.contains("lang:fr") {
                vec![
                    print("Etali, Primal Storm", Some("Etali, tempête primordiale"), "etali"),
                    print("Etali, Primal Conqueror", Some("Etali, conquérant primordial"), "conq"),
                ]
            } else {
                vec![print("Etali, Primal Storm", None, "etali")]
            };
            Ok(SearchPage {
                data,
                has_more: false,
                next_page: None,
            })
        }

        async fn next_page(&self, _token: &str) -> DeckResult<SearchPage> {
            Ok(SearchPage::default())
        }

        async fn random(&self, _query: &str) -> DeckResult<Card> {
            Err(DeckError::DataSource { status: 404 })
        }

        async fn named_exact(&self, _name: &str) -> DeckResult<Card> {
            Err(DeckError::DataSource { status: 404 })
        }
    }

    #[tokio::test]
    async fn merges_languages_and_dedupes_by_oracle_id() {
        let source = NameSource {
            queries: RefCell::new(Vec::new()),
        };
        let suggester = CommanderSuggester::new(&source, "fr").with_debounce(Duration::ZERO);

        let suggestions = suggester.suggest("etali").await.unwrap().unwrap();
        let names: Vec<&str> = suggestions.iter().map(|s| s.display.as_str()).collect();
        assert_eq!(names, vec!["Etali, Primal Storm", "Etali, conquérant primordial"]);
        assert_eq!(suggestions[1].canonical, "Etali, Primal Conqueror");
        assert_eq!(source.queries.borrow().len(), 2);
    }

    #[tokio::test]
    async fn short_queries_do_not_hit_the_source() {
        let source = NameSource {
            queries: RefCell::new(Vec::new()),
        };
        let suggester = CommanderSuggester::new(&source, "fr").with_debounce(Duration::ZERO);

        assert_eq!(suggester.suggest(" e ").await.unwrap(), Some(Vec::new()));
        assert!(source.queries.borrow().is_empty());
    }

    #[tokio::test]
    async fn newer_keystroke_supersedes_older_query() {
        let source = NameSource {
            queries: RefCell::new(Vec::new()),
        };
        let suggester =
            CommanderSuggester::new(&source, "fr").with_debounce(Duration::from_millis(20));

        let (old, new) = join!(suggester.suggest("eta"), suggester.suggest("etal"));
        assert_eq!(old.unwrap(), None);
        assert!(new.unwrap().is_some());
        assert!(source.queries.borrow().iter().all(|q| q.contains("\"etal\"")));
    }

    struct SlowFailingSource;

    impl CardSource for SlowFailingSource {
        async fn search(&self, query: &str, _options: SearchOptions) -> DeckResult<SearchPage> {
            if query.contains("\"eta\"") {
                sleep(Duration::from_millis(30)).await;
                return Err(DeckError::DataSource { status: 503 });
            }
            Ok(SearchPage::default())
        }

        async fn next_page(&self, _token: &str) -> DeckResult<SearchPage> {
            Ok(SearchPage::default())
        }

        async fn random(&self, _query: &str) -> DeckResult<Card> {
            Err(DeckError::DataSource { status: 404 })
        }

        async fn named_exact(&self, _name: &str) -> DeckResult<Card> {
            Err(DeckError::DataSource { status: 404 })
        }
    }

    #[tokio::test]
    async fn superseded_query_hides_its_network_error() {
        let source = SlowFailingSource;
        let suggester = CommanderSuggester::new(&source, "fr").with_debounce(Duration::ZERO);

        let (old, new) = join!(suggester.suggest("eta"), suggester.suggest("etal"));
        assert_eq!(old.unwrap(), None);
        assert_eq!(new.unwrap(), Some(Vec::new()));
    }

    #[tokio::test]
    async fn current_query_reports_its_network_error() {
        let source = SlowFailingSource;
        let suggester = CommanderSuggester::new(&source, "fr").with_debounce(Duration::ZERO);

        let err = suggester.suggest("eta").await.unwrap_err();
        assert!(matches!(err, DeckError::DataSource { status: 503 }));
    }
}
