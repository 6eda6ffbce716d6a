use async_trait::async_trait;
use std::sync::Arc;

use crate::repo::catalog_entries::CatalogEntriesRepo;

const MAX_SLUG_LEN: usize = 200;
const EMPTY_SLUG: &str = "entry";

/// Lower-cased ASCII alphanumerics joined by single dashes.
pub fn slugify(raw: &str) -> String {
    let mut slug = String::with_capacity(raw.len());
    let mut pending_dash = false;
    for ch in raw.chars().flat_map(char::to_lowercase) {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch);
        } else {
            pending_dash = true;
        }
    }
    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    if slug.is_empty() {
        EMPTY_SLUG.to_string()
    } else {
        slug
    }
}

#[async_trait]
pub trait SlugNormalizer: Send + Sync {
    /// Slug for `raw` that no entry other than `exclude_id` uses yet.
    async fn normalize(&self, raw: &str, exclude_id: Option<i64>)
        -> Result<String, sea_orm::DbErr>;
}

pub struct CatalogSlugNormalizer {
    repo: Arc<dyn CatalogEntriesRepo>,
}

impl CatalogSlugNormalizer {
    pub fn new(repo: Arc<dyn CatalogEntriesRepo>) -> Self {
        Self { repo }
    }
}

#[async_trait]
impl SlugNormalizer for CatalogSlugNormalizer {
    async fn normalize(
        &self,
        raw: &str,
        exclude_id: Option<i64>,
    ) -> Result<String, sea_orm::DbErr> {
        let base = slugify(raw);
        let mut candidate = base.clone();
        let mut suffix = 2u32;
        while self.repo.meta_url_taken(&candidate, exclude_id).await? {
            candidate = format!("{base}-{suffix}");
            suffix += 1;
        }
        Ok(candidate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{catalog_entry, InMemoryCatalogRepo};

    #[test]
    fn slugify_collapses_separators() {
        assert_eq!(slugify("  Red Shoes -- Size 42! "), "red-shoes-size-42");
        assert_eq!(slugify("already-a-slug"), "already-a-slug");
        assert_eq!(slugify("Crème Brûlée"), "cr-me-br-l-e");
    }

    #[test]
    fn slugify_falls_back_for_empty_input() {
        assert_eq!(slugify(""), "entry");
        assert_eq!(slugify("!!!"), "entry");
    }

    #[test]
    fn slugify_caps_length() {
        let slug = slugify(&"a".repeat(500));
        assert_eq!(slug.len(), MAX_SLUG_LEN);
    }

    #[tokio::test]
    async fn normalize_appends_counter_on_collision() {
        let repo = Arc::new(InMemoryCatalogRepo::default());
        repo.seed(catalog_entry(1, "red-shoes"));
        repo.seed(catalog_entry(2, "red-shoes-2"));
        let normalizer = CatalogSlugNormalizer::new(repo);

        assert_eq!(
            normalizer.normalize("Red Shoes", None).await.expect("slug"),
            "red-shoes-3"
        );
        assert_eq!(
            normalizer.normalize("Blue Shoes", None).await.expect("slug"),
            "blue-shoes"
        );
    }

    #[tokio::test]
    async fn normalize_ignores_the_entry_being_updated() {
        let repo = Arc::new(InMemoryCatalogRepo::default());
        repo.seed(catalog_entry(1, "red-shoes"));
        let normalizer = CatalogSlugNormalizer::new(repo);

        assert_eq!(
            normalizer.normalize("red shoes", Some(1)).await.expect("slug"),
            "red-shoes"
        );
        assert_eq!(
            normalizer.normalize("red shoes", Some(2)).await.expect("slug"),
            "red-shoes-2"
        );
    }
}
