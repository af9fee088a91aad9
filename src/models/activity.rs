use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "VARCHAR", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ActivityCategory {
    Spa,
    Sport,
    Entertainment,
    Dining,
    #[default]
    Other,
}

impl ActivityCategory {
    pub const ALL: [ActivityCategory; 5] = [
        ActivityCategory::Spa,
        ActivityCategory::Sport,
        ActivityCategory::Entertainment,
        ActivityCategory::Dining,
        ActivityCategory::Other,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ActivityCategory::Spa => "spa",
            ActivityCategory::Sport => "sport",
            ActivityCategory::Entertainment => "entertainment",
            ActivityCategory::Dining => "dining",
            ActivityCategory::Other => "other",
        }
    }

    /// Human readable label shown in listings.
    pub fn label(self) -> &'static str {
        match self {
            ActivityCategory::Spa => "Spa & Wellness",
            ActivityCategory::Sport => "Sports",
            ActivityCategory::Entertainment => "Entertainment",
            ActivityCategory::Dining => "Restaurant",
            ActivityCategory::Other => "Other",
        }
    }
}

impl fmt::Display for ActivityCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActivityCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ActivityCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| format!("unknown activity category '{s}'"))
    }
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Activity {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub category: ActivityCategory,
    pub price: Decimal,
    pub duration_hours: i32,
    pub max_participants: i32,
    pub image_url: Option<String>,
    pub is_active: bool,
}

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
pub struct Schedule {
    pub id: i64,
    pub activity_id: i64,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub available_spots: i32,
}

impl Schedule {
    pub fn has_spots(&self) -> bool {
        self.available_spots > 0
    }
}

/// Listing filter for active activities. An empty `category` means all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ActivityFilter {
    #[serde(default, deserialize_with = "blank_category_as_none")]
    pub category: Option<ActivityCategory>,
    pub search: Option<String>,
}

fn blank_category_as_none<'de, D>(deserializer: D) -> Result<Option<ActivityCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(value) => value.parse().map(Some).map_err(serde::de::Error::custom),
    }
}

impl ActivityFilter {
    /// Search text with surrounding whitespace removed; `None` when blank.
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Case-insensitive substring match over name or description.
    pub fn matches(&self, activity: &Activity) -> bool {
        if !activity.is_active {
            return false;
        }
        if let Some(category) = self.category {
            if activity.category != category {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => {
                let term = term.to_lowercase();
                activity.name.to_lowercase().contains(&term)
                    || activity.description.to_lowercase().contains(&term)
            }
            None => true,
        }
    }

    pub fn cache_key(&self) -> String {
        format!(
            "activities:cat={}&q={}",
            self.category.map(|c| c.as_str()).unwrap_or_default(),
            self.search_term().unwrap_or_default().to_lowercase()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn activity(name: &str, description: &str, category: ActivityCategory) -> Activity {
        Activity {
            id: 1,
            name: name.to_string(),
            description: description.to_string(),
            category,
            price: Decimal::new(2500, 2),
            duration_hours: 1,
            max_participants: 10,
            image_url: None,
            is_active: true,
        }
    }

    #[test]
    fn category_round_trips_through_str() {
        for category in ActivityCategory::ALL {
            assert_eq!(category.as_str().parse::<ActivityCategory>(), Ok(category));
        }
        assert!("golf".parse::<ActivityCategory>().is_err());
    }

    #[test]
    fn filter_searches_name_and_description() {
        let yoga = activity("Sunrise Yoga", "Stretching on the beach", ActivityCategory::Sport);
        let by_name = ActivityFilter { category: None, search: Some("YOGA".into()) };
        let by_description = ActivityFilter { category: None, search: Some("beach".into()) };
        let miss = ActivityFilter { category: None, search: Some("massage".into()) };

        assert!(by_name.matches(&yoga));
        assert!(by_description.matches(&yoga));
        assert!(!miss.matches(&yoga));
    }

    #[test]
    fn filter_respects_category_and_active_flag() {
        let mut spa = activity("Hot stones", "Massage", ActivityCategory::Spa);
        let spa_only = ActivityFilter { category: Some(ActivityCategory::Spa), search: None };
        let dining_only = ActivityFilter { category: Some(ActivityCategory::Dining), search: None };

        assert!(spa_only.matches(&spa));
        assert!(!dining_only.matches(&spa));

        spa.is_active = false;
        assert!(!spa_only.matches(&spa));
    }

    #[test]
    fn empty_category_means_all_categories() {
        let filter: ActivityFilter = serde_json::from_value(serde_json::json!({ "category": "", "search": "" })).unwrap();
        assert_eq!(filter.category, None);
        assert_eq!(filter.search_term(), None);

        let filter: ActivityFilter = serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(filter, ActivityFilter::default());

        let filter: ActivityFilter = serde_json::from_value(serde_json::json!({ "category": "spa" })).unwrap();
        assert_eq!(filter.category, Some(ActivityCategory::Spa));

        assert!(serde_json::from_value::<ActivityFilter>(serde_json::json!({ "category": "golf" })).is_err());
        assert_eq!(ActivityCategory::default(), ActivityCategory::Other);
    }

    #[test]
    fn blank_search_is_ignored() {
        let filter = ActivityFilter { category: None, search: Some("   ".into()) };
        assert_eq!(filter.search_term(), None);
        assert_eq!(filter.cache_key(), "activities:cat=&q=");
    }
}
