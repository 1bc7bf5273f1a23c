use std::{collections::HashSet, sync::Arc};

use crate::{
    db::CatalogStore,
    models::{CatalogOrder, ScoredCandidate},
    services::ranking::Page,
};

/// Non-personalized recommendations
///
/// Lists the catalog by popularity or recency and marks every item with the neutral
/// 0.5/0/0 score pattern, which is how clients tell these apart from personalized results.
#[derive(Clone)]
pub struct FallbackProvider {
    catalog: Arc<dyn CatalogStore>,
    order: CatalogOrder,
}

impl FallbackProvider {
    pub fn new(catalog: Arc<dyn CatalogStore>, order: CatalogOrder) -> Self {
        Self { catalog, order }
    }

    /// One page of the catalog listing, minus `exclude_ids`
    ///
    /// Catalog failures yield an empty list; there is nothing further to fall back to.
    pub async fn recommend(
        &self,
        page: Page,
        exclude_ids: &HashSet<String>,
    ) -> Vec<ScoredCandidate> {
        tracing::info!(
            order = ?self.order,
            limit = page.limit(),
            offset = page.offset(),
            "Using fallback recommendations"
        );

        match self
            .catalog
            .fetch_all(exclude_ids, page.end(), self.order)
            .await
        {
            Ok(media) => page
                .slice(media)
                .into_iter()
                .map(ScoredCandidate::fallback)
                .collect(),
            Err(e) => {
                tracing::error!(error = %e, "Fallback catalog listing failed");
                Vec::new()
            }
        }
    }
}
