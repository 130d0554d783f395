//! Catalog and user models.
//!
//! Every persisted type implements [`Document`], which is what lets a single
//! generic repository implementation serve authors, books and users alike.

use std::convert::Infallible;

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

/// A record stored in a named collection under a store-assigned id.
pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Collection the documents live in.
    const COLLECTION: &'static str;

    /// Fields supplied on creation, before an id exists.
    type Draft: Send + Sync;

    /// Query used by `Repository::get`.
    type Filter: Send + Sync;

    /// Partial update applied by `Repository::update`.
    type Patch: Send + Sync;

    /// Store-assigned identifier.
    fn id(&self) -> &str;

    /// Builds the document from its draft once an id has been assigned.
    fn from_draft(id: String, draft: Self::Draft) -> Self;

    /// Whether the document satisfies `filter`.
    fn matches(&self, filter: &Self::Filter) -> bool;

    /// `filter` as conditions on top-level JSON fields, for stores that can
    /// evaluate them server-side. Anything not listed is still checked
    /// through [`Document::matches`].
    fn conditions(_filter: &Self::Filter) -> Vec<FieldCondition> {
        Vec::new()
    }

    /// Applies `patch` in place.
    fn apply_patch(&mut self, patch: &Self::Patch);
}

/// A condition on one top-level field of a document's JSON body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldCondition {
    /// The field equals the value.
    Equals(&'static str, String),
    /// The field contains the value.
    Contains(&'static str, String),
}

/// Trims `value` and maps blank strings to `None`.
#[must_use]
pub fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn normalize(value: Option<String>) -> Option<String> {
    non_blank(value.as_deref()).map(str::to_owned)
}

fn patch_field(target: &mut String, value: Option<&String>) {
    if let Some(v) = non_blank(value.map(String::as_str)) {
        v.clone_into(target);
    }
}

// --- authors ---

/// A catalog author.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    /// Store-assigned identifier.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Date of birth, when known.
    #[serde(default)]
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// Fields required to create an author.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAuthor {
    /// Display name.
    pub name: String,
    /// Date of birth, when known.
    pub date_of_birth: Option<DateTime<Utc>>,
}

/// Authors are only ever listed in full.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AllAuthors;

impl Document for Author {
    const COLLECTION: &'static str = "authors";

    type Draft = NewAuthor;
    type Filter = AllAuthors;
    // Authors are created and deleted, never edited.
    type Patch = Infallible;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: NewAuthor) -> Self {
        Self {
            id,
            name: draft.name,
            date_of_birth: draft.date_of_birth,
        }
    }

    fn matches(&self, _filter: &AllAuthors) -> bool {
        true
    }

    fn apply_patch(&mut self, patch: &Infallible) {
        match *patch {}
    }
}

// --- books ---

/// A catalog book. `author_id` is a soft reference to an [`Author`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Book {
    /// Store-assigned identifier.
    pub id: String,
    /// Title.
    pub title: String,
    /// Identifier of the author; may dangle.
    pub author_id: String,
    /// Short description.
    pub synopsis: String,
    /// Cover image location.
    #[serde(default)]
    pub image_url: String,
    /// Genre label, matched exactly by filters.
    pub genre: String,
}

/// Fields required to create a book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    /// Title.
    pub title: String,
    /// Identifier of the author.
    pub author_id: String,
    /// Short description.
    pub synopsis: String,
    /// Cover image location.
    pub image_url: String,
    /// Genre label.
    pub genre: String,
}

/// Book query. Blank fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookFilter {
    /// Substring of the title.
    #[serde(default)]
    pub title: Option<String>,
    /// Exact genre.
    #[serde(default)]
    pub genre: Option<String>,
    /// Exact author id.
    #[serde(default)]
    pub author_id: Option<String>,
}

impl BookFilter {
    /// Trims every field and drops blank ones, so equivalent queries compare
    /// equal.
    #[must_use]
    pub fn normalized(self) -> Self {
        Self {
            title: normalize(self.title),
            genre: normalize(self.genre),
            author_id: normalize(self.author_id),
        }
    }
}

/// Partial update for a book. `None` or blank fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookPatch {
    /// New title.
    pub title: Option<String>,
    /// New author id.
    pub author_id: Option<String>,
    /// New synopsis.
    pub synopsis: Option<String>,
    /// New cover image location.
    pub image_url: Option<String>,
    /// New genre.
    pub genre: Option<String>,
}

impl BookPatch {
    /// Whether applying the patch would change nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        [
            &self.title,
            &self.author_id,
            &self.synopsis,
            &self.image_url,
            &self.genre,
        ]
        .into_iter()
        .all(|field| non_blank(field.as_deref()).is_none())
    }
}

impl Document for Book {
    const COLLECTION: &'static str = "books";

    type Draft = NewBook;
    type Filter = BookFilter;
    type Patch = BookPatch;

    fn id(&self) -> &str {
        &self.id
    }

    fn from_draft(id: String, draft: NewBook) -> Self {
        Self {
            id,
            title: draft.title,
            author_id: draft.author_id,
            synopsis: draft.synopsis,
            image_url: draft.image_url,
            genre: draft.genre,
        }
    }

    fn matches(&self, filter: &BookFilter) -> bool {
        non_blank(filter.title.as_deref()).is_none_or(|title| self.title.contains(title))
            && non_blank(filter.genre.as_deref()).is_none_or(|genre| self.genre == genre)
            && non_blank(filter.author_id.as_deref())
                .is_none_or(|author_id| self.author_id == author_id)
    }

    fn conditions(filter: &BookFilter) -> Vec<FieldCondition> {
        let mut conditions = Vec::new();
        if let Some(title) = non_blank(filter.title.as_deref()) {
            conditions.push(FieldCondition::Contains("title", title.to_owned()));
        }
        if let Some(genre) = non_blank(filter.genre.as_deref()) {
            conditions.push(FieldCondition::Equals("genre", genre.to_owned()));
        }
        if let Some(author_id) = non_blank(filter.author_id.as_deref()) {
            conditions.push(FieldCondition::Equals("authorId", author_id.to_owned()));
        }
        conditions
    }

    fn apply_patch(&mut self, patch: &BookPatch) {
        patch_field(&mut self.title, patch.title.as_ref());
        patch_field(&mut self.author_id, patch.author_id.as_ref());
        patch_field(&mut self.synopsis, patch.synopsis.as_ref());
        patch_field(&mut self.image_url, patch.image_url.as_ref());
        patch_field(&mut self.genre, patch.genre.as_ref());
    }
}

// --- users ---

/// Role granted to a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// May read and modify any user.
    Admin,
}

/// Public view of a user. Never carries credentials.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    /// Store-assigned identifier.
    pub id: String,
    /// Unique login name.
    pub username: String,
    /// Contact address.
    pub email: String,
    /// Given name.
    #[serde(default)]
    pub first_name: Option<String>,
    /// Family name.
    #[serde(default)]
    pub last_name: Option<String>,
    /// Granted roles.
    #[serde(default)]
    pub roles: Vec<UserRole>,
}

impl User {
    /// Whether the user holds the admin role.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.roles.contains(&UserRole::Admin)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dune() -> Book {
        Book::from_draft(
            "b-1".to_owned(),
            NewBook {
                title: "Dune".to_owned(),
                author_id: "a-1".to_owned(),
                synopsis: "Spice".to_owned(),
                image_url: String::new(),
                genre: "scifi".to_owned(),
            },
        )
    }

    #[test]
    fn test_book_filter_normalized_drops_blank_fields() {
        let filter = BookFilter {
            title: Some("  ".to_owned()),
            genre: Some(" scifi ".to_owned()),
            author_id: None,
        };

        let normalized = filter.normalized();

        assert_eq!(
            normalized,
            BookFilter {
                title: None,
                genre: Some("scifi".to_owned()),
                author_id: None,
            }
        );
    }

    #[test]
    fn test_book_matches_title_substring_and_exact_genre() {
        let book = dune();

        assert!(book.matches(&BookFilter::default()));
        assert!(book.matches(&BookFilter {
            title: Some("Du".to_owned()),
            genre: Some("scifi".to_owned()),
            author_id: Some("a-1".to_owned()),
        }));
        assert!(!book.matches(&BookFilter {
            genre: Some("sci".to_owned()),
            ..BookFilter::default()
        }));
        assert!(!book.matches(&BookFilter {
            author_id: Some("a-2".to_owned()),
            ..BookFilter::default()
        }));
    }

    #[test]
    fn test_book_patch_ignores_blank_fields() {
        // Arrange
        let mut book = dune();
        let patch = BookPatch {
            title: Some("Dune Messiah".to_owned()),
            synopsis: Some(String::new()),
            genre: Some("   ".to_owned()),
            ..BookPatch::default()
        };

        // Act
        book.apply_patch(&patch);

        // Assert
        assert_eq!(book.title, "Dune Messiah");
        assert_eq!(book.synopsis, "Spice");
        assert_eq!(book.genre, "scifi");
    }

    #[test]
    fn test_book_patch_is_empty_when_only_blank_fields() {
        let patch = BookPatch {
            title: Some(" ".to_owned()),
            ..BookPatch::default()
        };

        assert!(patch.is_empty());
        assert!(
            !BookPatch {
                genre: Some("fantasy".to_owned()),
                ..BookPatch::default()
            }
            .is_empty()
        );
    }

    #[test]
    fn test_book_serializes_camel_case() {
        let json = serde_json::to_value(dune()).unwrap();

        assert_eq!(json["authorId"], "a-1");
        assert_eq!(json["imageUrl"], "");
        assert_eq!(json["id"], "b-1");
    }

    #[test]
    fn test_user_roles_round_trip_lowercase() {
        let user = User {
            id: "u-1".to_owned(),
            username: "ada".to_owned(),
            email: "ada@example.com".to_owned(),
            first_name: None,
            last_name: None,
            roles: vec![UserRole::Admin],
        };

        let json = serde_json::to_value(&user).unwrap();

        assert_eq!(json["roles"][0], "admin");
        assert!(user.is_admin());
    }

    #[test]
    fn test_book_filter_conditions_skip_blank_fields() {
        // Arrange
        let filter = BookFilter {
            title: Some("Dun".to_owned()),
            genre: Some("  ".to_owned()),
            author_id: Some("a-1".to_owned()),
        };

        // Act
        let conditions = Book::conditions(&filter);

        // Assert
        assert_eq!(
            conditions,
            vec![
                FieldCondition::Contains("title", "Dun".to_owned()),
                FieldCondition::Equals("authorId", "a-1".to_owned()),
            ]
        );
        assert!(dune().matches(&filter));
        let body = serde_json::to_value(dune()).unwrap();
        assert_eq!(body["authorId"], "a-1");
    }
}
