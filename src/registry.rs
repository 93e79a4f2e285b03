use std::collections::HashMap;

use crate::config::CardConfig;

/// Tag the card registers itself under.
pub const CARD_TYPE: &str = "sonos-custom-player-card";

/// Catalog metadata for a card type.
#[derive(Debug, Clone, PartialEq)]
pub struct CardInfo {
    /// Unique tag, e.g. `sonos-custom-player-card`
    pub card_type: String,
    /// Human readable name
    pub name: String,
    /// Short description shown in the catalog
    pub description: String,
}

impl CardInfo {
    /// Catalog entry for the Sonos player card.
    pub fn player_card() -> Self {
        Self {
            card_type: CARD_TYPE.to_string(),
            name: "Sonos Player Card".to_string(),
            description: "Now playing, progress, volume and queue for a Sonos speaker".to_string(),
        }
    }

    /// Configuration offered to the catalog preview.
    pub fn stub_config(&self) -> CardConfig {
        CardConfig::stub()
    }
}

/// Registry of card types available to the dashboard.
///
/// Registering the same `card_type` twice keeps the first entry, so
/// repeated module loads are harmless.
#[derive(Debug, Default)]
pub struct CardCatalog {
    cards: HashMap<String, CardInfo>,
}

impl CardCatalog {
    /// Creates a new empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Catalog with the player card already registered.
    pub fn with_player_card() -> Self {
        let mut catalog = Self::new();
        catalog.register(CardInfo::player_card());
        catalog
    }

    /// Registers a card type. Returns `false` if it was already present.
    pub fn register(&mut self, info: CardInfo) -> bool {
        if self.cards.contains_key(&info.card_type) {
            return false;
        }
        self.cards.insert(info.card_type.clone(), info);
        true
    }

    /// Looks up a registered card type.
    pub fn get(&self, card_type: &str) -> Option<&CardInfo> {
        self.cards.get(card_type)
    }

    /// Lists registered card types, sorted alphabetically.
    pub fn list(&self) -> Vec<&CardInfo> {
        let mut cards: Vec<&CardInfo> = self.cards.values().collect();
        cards.sort_by(|a, b| a.card_type.cmp(&b.card_type));
        cards
    }
}
