use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use super::category::Category;
use crate::backend::Document;
use crate::error::AppResult;

pub const MEMORIES_COLLECTION: &str = "memories";

/// A journal entry. The id lives outside the stored body: it is the key the
/// document store assigned on creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Memory {
    #[serde(skip)]
    pub id: String,
    pub user_id: String,
    pub category: Category,
    pub title: String,
    pub description: String,
    pub date: DateTime<Utc>,
    pub location: String,
    #[serde(default)]
    pub is_favorite: bool,
    pub cover_image: String,
    #[serde(default)]
    pub gallery_images: Vec<String>,
}

impl Memory {
    pub fn from_document(document: Document) -> AppResult<Self> {
        let mut memory: Memory = serde_json::from_value(document.data)?;
        memory.id = document.id;
        Ok(memory)
    }

    pub fn to_body(&self) -> AppResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Applies every field the update carries, leaves the rest untouched.
    pub fn apply(&mut self, update: &MemoryUpdate) {
        if let Some(category) = update.category {
            self.category = category;
        }
        if let Some(ref title) = update.title {
            self.title = title.clone();
        }
        if let Some(ref description) = update.description {
            self.description = description.clone();
        }
        if let Some(date) = update.date {
            self.date = date;
        }
        if let Some(ref location) = update.location {
            self.location = location.clone();
        }
        if let Some(is_favorite) = update.is_favorite {
            self.is_favorite = is_favorite;
        }
        if let Some(ref cover_image) = update.cover_image {
            self.cover_image = cover_image.clone();
        }
        if let Some(ref gallery_images) = update.gallery_images {
            self.gallery_images = gallery_images.clone();
        }
    }

    pub fn matches_query(&self, query: &str) -> bool {
        let needle = query.trim().to_lowercase();
        if needle.is_empty() {
            return false;
        }
        self.title.to_lowercase().contains(&needle)
            || self.location.to_lowercase().contains(&needle)
    }
}

/// Metadata of a memory that is about to be created
#[derive(Debug, Clone, Validate)]
pub struct MemoryDraft {
    pub category: Category,
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(min = 1))]
    pub description: String,
    pub date: DateTime<Utc>,
    #[validate(length(min = 1))]
    pub location: String,
    pub is_favorite: bool,
}

impl MemoryDraft {
    pub fn into_memory(
        self,
        user_id: &str,
        cover_image: String,
        gallery_images: Vec<String>,
    ) -> Memory {
        Memory {
            id: String::new(),
            user_id: user_id.to_string(),
            category: self.category,
            title: self.title,
            description: self.description,
            date: self.date,
            location: self.location,
            is_favorite: self.is_favorite,
            cover_image,
            gallery_images,
        }
    }
}

#[derive(Debug, Clone, Default, Validate)]
pub struct MemoryUpdate {
    pub category: Option<Category>,
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(min = 1))]
    pub description: Option<String>,
    pub date: Option<DateTime<Utc>>,
    #[validate(length(min = 1))]
    pub location: Option<String>,
    pub is_favorite: Option<bool>,
    pub cover_image: Option<String>,
    pub gallery_images: Option<Vec<String>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_memory() -> Memory {
        Memory {
            id: "m1".to_string(),
            user_id: "u1".to_string(),
            category: Category::Vacations,
            title: "Summer vacation".to_string(),
            description: "Two weeks of pure relaxation!".to_string(),
            date: Utc.with_ymd_and_hms(2024, 7, 2, 12, 0, 0).unwrap(),
            location: "Nizza".to_string(),
            is_favorite: false,
            cover_image: "https://cdn.example/cover.jpg".to_string(),
            gallery_images: vec!["https://cdn.example/g1.jpg".to_string()],
        }
    }

    #[test]
    fn test_body_uses_camel_case_and_omits_id() {
        let body = sample_memory().to_body().unwrap();
        assert_eq!(body["userId"], "u1");
        assert_eq!(body["isFavorite"], false);
        assert_eq!(body["coverImage"], "https://cdn.example/cover.jpg");
        assert_eq!(body["galleryImages"][0], "https://cdn.example/g1.jpg");
        assert!(body.get("id").is_none());
    }

    #[test]
    fn test_from_document_takes_store_id() {
        let body = sample_memory().to_body().unwrap();
        let memory = Memory::from_document(Document {
            id: "doc-7".to_string(),
            data: body,
        })
        .unwrap();
        assert_eq!(memory.id, "doc-7");
        assert_eq!(memory.title, "Summer vacation");
    }

    #[test]
    fn test_missing_gallery_defaults_to_empty() {
        let mut body = sample_memory().to_body().unwrap();
        body.as_object_mut().unwrap().remove("galleryImages");
        let memory = Memory::from_document(Document {
            id: "doc-8".to_string(),
            data: body,
        })
        .unwrap();
        assert!(memory.gallery_images.is_empty());
    }

    #[test]
    fn test_apply_only_touches_given_fields() {
        let mut memory = sample_memory();
        memory.apply(&MemoryUpdate {
            title: Some("Winter".to_string()),
            is_favorite: Some(true),
            ..Default::default()
        });
        assert_eq!(memory.title, "Winter");
        assert!(memory.is_favorite);
        assert_eq!(memory.location, "Nizza");
        assert_eq!(memory.gallery_images.len(), 1);
    }

    #[test]
    fn test_matches_query_on_title_or_location() {
        let memory = sample_memory();
        assert!(memory.matches_query("SUMMER"));
        assert!(memory.matches_query("nizz"));
        assert!(!memory.matches_query("relaxation"));
        assert!(!memory.matches_query("   "));
    }

    #[test]
    fn test_draft_validation_rejects_empty_title() {
        let draft = MemoryDraft {
            category: Category::Family,
            title: String::new(),
            description: "d".to_string(),
            date: Utc::now(),
            location: "Berlin".to_string(),
            is_favorite: false,
        };
        assert!(draft.validate().is_err());
    }
}
