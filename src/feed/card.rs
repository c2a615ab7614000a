use serde::{Deserialize, Serialize};

use crate::feedback::ContentTags;
use crate::fingerprint::hash::stable_hash;
use crate::inference::Suggestion;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RecommendationCard {
    pub id: String,
    pub action: String,
    pub title: String,
    pub description: String,
    pub icon: String,
    pub source: Option<String>,
    pub deep_link: Option<String>,
    pub fallback_url: Option<String>,
    pub category: Option<String>,
    pub content_type: Option<String>,
    pub priority: u8,
}

impl RecommendationCard {
    /// Cards keep the service's id when it sends one. Otherwise the id is
    /// derived from title and source so repeats still collapse.
    pub fn from_suggestion(suggestion: &Suggestion) -> Self {
        let content = suggestion.content.clone().unwrap_or_default();
        let id = match suggestion.id.as_deref().map(str::trim) {
            Some(id) if !id.is_empty() => id.to_string(),
            _ => format!(
                "card_{}",
                stable_hash([
                    suggestion.title.as_str(),
                    content.source.as_deref().unwrap_or_default(),
                ])
            ),
        };
        let action = suggestion
            .action
            .clone()
            .filter(|action| !action.is_empty())
            .unwrap_or_else(|| id.clone());

        Self {
            id,
            action,
            title: suggestion.title.clone(),
            description: suggestion.description.clone(),
            icon: suggestion.icon.clone(),
            source: content.source,
            deep_link: content.deep_link,
            fallback_url: content.fallback_url,
            category: content.category,
            content_type: content.content_type,
            priority: suggestion.priority,
        }
    }

    pub fn tags(&self) -> ContentTags {
        ContentTags {
            category: self.category.clone(),
            content_type: self.content_type.clone(),
            source: self.source.clone(),
        }
    }
}

pub fn cards_from(suggestions: &[Suggestion]) -> Vec<RecommendationCard> {
    suggestions
        .iter()
        .map(RecommendationCard::from_suggestion)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inference::SuggestionContent;

    fn suggestion(id: Option<&str>, title: &str, source: &str) -> Suggestion {
        Suggestion {
            id: id.map(String::from),
            title: title.into(),
            content: Some(SuggestionContent {
                source: Some(source.into()),
                ..SuggestionContent::default()
            }),
            ..Suggestion::default()
        }
    }

    #[test]
    fn explicit_ids_are_kept() {
        let card =
            RecommendationCard::from_suggestion(&suggestion(Some("ipl-live"), "IPL", "hotstar"));
        assert_eq!(card.id, "ipl-live");
        assert_eq!(card.action, "ipl-live");
        assert_eq!(card.source.as_deref(), Some("hotstar"));
    }

    #[test]
    fn missing_ids_hash_title_and_source() {
        let first = RecommendationCard::from_suggestion(&suggestion(None, "IPL", "hotstar"));
        let again = RecommendationCard::from_suggestion(&suggestion(Some("  "), "IPL", "hotstar"));
        let other = RecommendationCard::from_suggestion(&suggestion(None, "IPL", "jiocinema"));

        assert!(first.id.starts_with("card_"));
        assert_eq!(first.id, again.id);
        assert_ne!(first.id, other.id);
    }
}
