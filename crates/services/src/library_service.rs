use std::sync::Arc;

use storage::catalog::CatalogRepository;
use tracing::warn;
use tutor_core::model::{Material, MaterialId};

use crate::error::ProgressError;

/// Longest category label accepted as a filter, in characters.
const MAX_CATEGORY_LEN: usize = 50;

/// Read-only queries over the materials library.
#[derive(Clone)]
pub struct LibraryService {
    catalog: Arc<dyn CatalogRepository>,
}

impl LibraryService {
    #[must_use]
    pub fn new(catalog: Arc<dyn CatalogRepository>) -> Self {
        Self { catalog }
    }

    /// Materials in catalog order, filtered by category (`None` = all) and a
    /// case-insensitive search over title and description.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the catalog cannot be read.
    pub async fn list(
        &self,
        category: Option<&str>,
        query: &str,
    ) -> Result<Vec<Material>, ProgressError> {
        let category = match category.map(str::trim) {
            Some(c) if c.chars().count() > MAX_CATEGORY_LEN => {
                warn!(chars = c.chars().count(), "ignoring oversized category filter");
                None
            }
            Some("") | None => None,
            Some(c) => Some(c),
        };

        let materials = self.catalog.list_materials().await?;
        Ok(materials
            .into_iter()
            .filter(|m| category.is_none_or(|c| m.category() == c))
            .filter(|m| m.matches_search(query))
            .collect())
    }

    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the catalog cannot be read.
    pub async fn get(&self, id: &MaterialId) -> Result<Option<Material>, ProgressError> {
        Ok(self.catalog.get_material(id).await?)
    }

    /// Distinct categories in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `ProgressError::Storage` if the catalog cannot be read.
    pub async fn categories(&self) -> Result<Vec<String>, ProgressError> {
        let mut out: Vec<String> = Vec::new();
        for material in self.catalog.list_materials().await? {
            if !out.iter().any(|c| c == material.category()) {
                out.push(material.category().to_owned());
            }
        }
        Ok(out)
    }
}
