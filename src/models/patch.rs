use serde::{Deserialize, Serialize};

use crate::models::{current_time_millis, Book, Profile};

/// Typed partial update for a book. Each `Some` field replaces the
/// corresponding record field; `None` leaves it untouched. Nested options
/// distinguish "clear the field" from "leave it alone".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BookPatch {
    pub title: Option<String>,
    pub author_name: Option<String>,
    pub cover_url: Option<Option<String>>,
    pub description: Option<Option<String>>,
    pub edition_count: Option<u32>,
    pub first_published_year: Option<Option<i32>>,
    pub is_translated: Option<bool>,
}

impl BookPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.author_name.is_none()
            && self.cover_url.is_none()
            && self.description.is_none()
            && self.edition_count.is_none()
            && self.first_published_year.is_none()
            && self.is_translated.is_none()
    }

    /// Pure merge: returns an updated copy, leaving the input untouched.
    pub fn apply(&self, book: &Book) -> Book {
        let mut next = book.clone();
        if let Some(title) = &self.title {
            next.title = title.clone();
        }
        if let Some(author_name) = &self.author_name {
            next.author_name = author_name.clone();
        }
        if let Some(cover_url) = &self.cover_url {
            next.cover_url = cover_url.clone();
        }
        if let Some(description) = &self.description {
            next.description = description.clone();
        }
        if let Some(edition_count) = self.edition_count {
            next.edition_count = edition_count;
        }
        if let Some(first_published_year) = self.first_published_year {
            next.first_published_year = first_published_year;
        }
        if let Some(is_translated) = self.is_translated {
            next.is_translated = is_translated;
        }
        next.updated_at = current_time_millis();
        next
    }
}

/// Typed partial update for a profile.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub display_name: Option<String>,
    pub avatar_url: Option<Option<String>>,
    pub bio: Option<Option<String>>,
}

impl ProfilePatch {
    pub fn apply(&self, profile: &Profile) -> Profile {
        let mut next = profile.clone();
        if let Some(display_name) = &self.display_name {
            next.display_name = display_name.clone();
        }
        if let Some(avatar_url) = &self.avatar_url {
            next.avatar_url = avatar_url.clone();
        }
        if let Some(bio) = &self.bio {
            next.bio = bio.clone();
        }
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_book() -> Book {
        Book {
            id: 1,
            title: "Piranesi".to_string(),
            author_name: "Susanna Clarke".to_string(),
            cover_url: Some("https://covers.example/piranesi.jpg".to_string()),
            cover_url_small: None,
            open_library_work_id: Some("OL19922036W".to_string()),
            edition_count: 44,
            first_published_year: Some(2020),
            is_translated: false,
            description: None,
            created_at: 0,
            updated_at: 0,
        }
    }

    #[test]
    fn test_patch_applies_only_set_fields() {
        let book = sample_book();
        let patch = BookPatch {
            edition_count: Some(45),
            ..Default::default()
        };
        let next = patch.apply(&book);
        assert_eq!(next.edition_count, 45);
        assert_eq!(next.title, book.title);
        assert_eq!(next.cover_url, book.cover_url);
    }

    #[test]
    fn test_patch_can_clear_optional_field() {
        let book = sample_book();
        let patch = BookPatch {
            cover_url: Some(None),
            ..Default::default()
        };
        let next = patch.apply(&book);
        assert_eq!(next.cover_url, None);
    }

    #[test]
    fn test_empty_patch_detection() {
        assert!(BookPatch::default().is_empty());
        let patch = BookPatch {
            is_translated: Some(true),
            ..Default::default()
        };
        assert!(!patch.is_empty());
    }
}
