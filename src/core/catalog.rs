use crate::core::{CartError, LineItem, Result};
use crate::domain::model::MAX_UNIT_PRICE;
use crate::utils::validation::{validate_non_empty_string, Validate};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

pub const ALL_CATEGORIES: &str = "all";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventListing {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub date: String,
    #[serde(default)]
    pub venue: String,
    #[serde(default)]
    pub category: String,
    pub price: u64,
    #[serde(default)]
    pub image: Option<String>,
}

impl EventListing {
    /// 活動詳情頁「加入購物車」所產生的候選項目
    pub fn to_line_item(&self, quantity: i64) -> Result<LineItem> {
        let item = LineItem::new(self.id.as_str(), self.title.clone(), self.price, quantity)?
            .with_date(self.date.clone())
            .with_venue(self.venue.clone());

        Ok(match &self.image {
            Some(image) => item.with_image(image.clone()),
            None => item,
        })
    }

    fn matches(&self, category: Option<&str>, search: &str) -> bool {
        let matches_filter = match category {
            None => true,
            Some(c) if c.eq_ignore_ascii_case(ALL_CATEGORIES) => true,
            Some(c) => self.category == c,
        };

        let needle = search.trim().to_lowercase();
        let matches_search = needle.is_empty()
            || self.title.to_lowercase().contains(&needle)
            || self.venue.to_lowercase().contains(&needle);

        matches_filter && matches_search
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventCatalog {
    #[serde(default)]
    pub events: Vec<EventListing>,
}

impl EventCatalog {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let catalog: EventCatalog = toml::from_str(content)?;
        catalog.validate()?;
        Ok(catalog)
    }

    pub fn find(&self, id: &str) -> Option<&EventListing> {
        self.events.iter().find(|event| event.id == id)
    }

    pub fn require(&self, id: &str) -> Result<&EventListing> {
        self.find(id).ok_or_else(|| CartError::UnknownEvent {
            event_id: id.to_string(),
        })
    }

    /// Category `"all"` or `None` matches everything; search is a
    /// case-insensitive substring match on title or venue. Listing order is kept.
    pub fn filter(&self, category: Option<&str>, search: &str) -> Vec<&EventListing> {
        self.events
            .iter()
            .filter(|event| event.matches(category, search))
            .collect()
    }

    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.events
            .iter()
            .map(|event| event.category.as_str())
            .filter(|category| !category.is_empty() && seen.insert(*category))
            .collect()
    }
}

impl Validate for EventCatalog {
    fn validate(&self) -> Result<()> {
        let mut ids = HashSet::new();
        for (index, event) in self.events.iter().enumerate() {
            validate_non_empty_string(&format!("events[{}].id", index), &event.id)?;
            validate_non_empty_string(&format!("events[{}].title", index), &event.title)?;

            if event.price > MAX_UNIT_PRICE {
                return Err(CartError::InvalidConfigValueError {
                    field: format!("events[{}].price", index),
                    value: event.price.to_string(),
                    reason: format!("Price must not exceed {}", MAX_UNIT_PRICE),
                });
            }

            if !ids.insert(event.id.as_str()) {
                return Err(CartError::InvalidConfigValueError {
                    field: format!("events[{}].id", index),
                    value: event.id.clone(),
                    reason: "Duplicate event id".to_string(),
                });
            }
        }
        Ok(())
    }
}
