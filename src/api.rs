use crate::card::Card;
use crate::config::ClientSettings;
use crate::error::{DeckError, DeckResult};
use log::debug;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, USER_AGENT};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unique {
    Cards,
    Prints,
}

impl Unique {
    pub fn as_str(&self) -> &'static str {
        match self {
            Unique::Cards => "cards",
            Unique::Prints => "prints",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortOrder {
    Random,
    Edhrec,
    Released,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Random => "random",
            SortOrder::Edhrec => "edhrec",
            SortOrder::Released => "released",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchOptions {
    pub unique: Unique,
    pub order: SortOrder,
}

impl SearchOptions {
    pub fn new(unique: Unique, order: SortOrder) -> Self {
        SearchOptions { unique, order }
    }
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct SearchPage {
    #[serde(default)]
    pub data: Vec<Card>,
    #[serde(default)]
    pub has_more: bool,
    #[serde(default)]
    pub next_page: Option<String>,
}

/// Read-only access to a card database.
#[allow(async_fn_in_trait)]
pub trait CardSource {
    /// First page of a search. No match is an empty page, not an error.
    async fn search(&self, query: &str, options: SearchOptions) -> DeckResult<SearchPage>;
    /// Follow-up page named by a previous page's `next_page`.
    async fn next_page(&self, token: &str) -> DeckResult<SearchPage>;
    /// One random card matching the query.
    async fn random(&self, query: &str) -> DeckResult<Card>;
    /// Case-insensitive exact name lookup.
    async fn named_exact(&self, name: &str) -> DeckResult<Card>;
}

/// Up to `pages` pages of a search, pausing `delay` between requests.
pub async fn collect_pages<S: CardSource>(
    source: &S,
    query: &str,
    options: SearchOptions,
    pages: usize,
    delay: Duration,
) -> DeckResult<Vec<Card>> {
    let mut page = source.search(query, options).await?;
    let mut cards = std::mem::take(&mut page.data);
    let mut fetched = 1;
    while fetched < pages && page.has_more {
        let Some(token) = page.next_page.clone() else {
            break;
        };
        sleep(delay).await;
        page = source.next_page(&token).await?;
        cards.append(&mut page.data);
        fetched += 1;
    }
    Ok(cards)
}

pub fn default_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(
        USER_AGENT,
        HeaderValue::from_static(concat!("commander_deckgen/", env!("CARGO_PKG_VERSION"))),
    );
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
    headers
}

pub struct ScryfallClient {
    client: Client,
    headers: HeaderMap,
    base_url: String,
}

impl ScryfallClient {
    pub fn new(settings: &ClientSettings) -> DeckResult<Self> {
        let client = Client::builder().build()?;
        Ok(ScryfallClient {
            client,
            headers: default_headers(),
            base_url: settings.api_url.trim_end_matches('/').to_string(),
        })
    }

    async fn get_json<T: DeserializeOwned>(&self, url: &str) -> DeckResult<T> {
        debug!("GET {}", url);
        let request = self
            .client
            .request(reqwest::Method::GET, url)
            .headers(self.headers.clone());

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(DeckError::DataSource {
                status: status.as_u16(),
            });
        }
        let body = response.text().await?;
        let value: T = serde_json::from_str(&body)?;
        Ok(value)
    }
}

impl CardSource for ScryfallClient {
    async fn search(&self, query: &str, options: SearchOptions) -> DeckResult<SearchPage> {
        let url = format!(
            "{}/cards/search?q={}&unique={}&order={}",
            self.base_url,
            urlencoding::encode(query),
            options.unique.as_str(),
            options.order.as_str()
        );
        match self.get_json(&url).await {
            Err(e) if e.is_not_found() => {
                debug!("No cards for query: {}", query);
                Ok(SearchPage::default())
            }
            other => other,
        }
    }

    async fn next_page(&self, token: &str) -> DeckResult<SearchPage> {
        self.get_json(token).await
    }

    async fn random(&self, query: &str) -> DeckResult<Card> {
        let url = format!(
            "{}/cards/random?q={}",
            self.base_url,
            urlencoding::encode(query)
        );
        self.get_json(&url).await
    }

    async fn named_exact(&self, name: &str) -> DeckResult<Card> {
        let url = format!(
            "{}/cards/named?exact={}",
            self.base_url,
            urlencoding::encode(name)
        );
        self.get_json(&url).await
    }
}
