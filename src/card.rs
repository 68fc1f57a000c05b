use serde::{Deserialize, Serialize};

/// A card record as returned by the Scryfall API. Only the fields the
/// generator reads are modelled; everything else is ignored on decode.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Card {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub oracle_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub printed_name: Option<String>,
    #[serde(default)]
    pub lang: Option<String>,
    #[serde(default)]
    pub type_line: Option<String>,
    #[serde(default)]
    pub oracle_text: Option<String>,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub cmc: f64,
    #[serde(default)]
    pub color_identity: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub legalities: Legalities,
    #[serde(default)]
    pub prices: Prices,
    #[serde(default)]
    pub edhrec_rank: Option<u32>,
    #[serde(default)]
    pub card_faces: Vec<CardFace>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
    #[serde(default)]
    pub scryfall_uri: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Legalities {
    #[serde(default)]
    pub commander: Option<String>,
}

/// Prices come over the wire as decimal strings (or null).
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Prices {
    #[serde(default)]
    pub eur: Option<String>,
    #[serde(default)]
    pub eur_foil: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct CardFace {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub type_line: Option<String>,
    #[serde(default)]
    pub oracle_text: Option<String>,
    #[serde(default)]
    pub mana_cost: Option<String>,
    #[serde(default)]
    pub image_uris: Option<ImageUris>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct ImageUris {
    #[serde(default)]
    pub small: Option<String>,
    #[serde(default)]
    pub normal: Option<String>,
    #[serde(default)]
    pub large: Option<String>,
}

impl Card {
    /// Stand-in for a land whose details could not be fetched.
    pub fn placeholder(name: &str) -> Card {
        Card {
            name: name.to_string(),
            ..Card::default()
        }
    }

    pub fn name(&self) -> &str {
        self.name.trim()
    }

    /// Rules text, falling back to the faces of double-faced cards.
    pub fn full_oracle_text(&self) -> String {
        match &self.oracle_text {
            Some(text) => text.clone(),
            None => self
                .card_faces
                .iter()
                .filter_map(|face| face.oracle_text.as_deref())
                .filter(|text| !text.is_empty())
                .collect::<Vec<_>>()
                .join("\n"),
        }
    }

    pub fn oracle_lower(&self) -> String {
        self.full_oracle_text().to_lowercase()
    }

    pub fn full_type_line(&self) -> String {
        self.type_line
            .clone()
            .or_else(|| self.card_faces.first().and_then(|f| f.type_line.clone()))
            .unwrap_or_default()
    }

    pub fn full_mana_cost(&self) -> String {
        match &self.mana_cost {
            Some(cost) => cost.clone(),
            None => self
                .card_faces
                .iter()
                .filter_map(|face| face.mana_cost.as_deref())
                .filter(|cost| !cost.is_empty())
                .collect::<Vec<_>>()
                .join(" / "),
        }
    }

    /// Name shown to the user: the localized printed name when there is one.
    pub fn display_name(&self) -> &str {
        self.printed_name.as_deref().unwrap_or_else(|| self.name())
    }
}
