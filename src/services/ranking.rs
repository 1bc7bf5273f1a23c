use std::{cmp::Ordering, collections::HashMap};

use crate::{
    error::{AppError, AppResult},
    services::hybrid::CombinedScore,
};

/// Validated offset/limit window
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    limit: usize,
    offset: usize,
}

impl Page {
    /// Validates a requested window against the configured limit ceiling
    ///
    /// Out-of-range values are rejected, never clamped. `limit = 0` is rejected too.
    pub fn new(limit: i64, offset: i64, max_limit: usize) -> AppResult<Self> {
        if limit < 1 || limit as u64 > max_limit as u64 {
            return Err(AppError::InvalidInput(format!(
                "Invalid limit parameter. Must be between 1 and {}",
                max_limit
            )));
        }

        if offset < 0 {
            return Err(AppError::InvalidInput(
                "Invalid offset parameter. Must be non-negative".to_string(),
            ));
        }

        Ok(Self {
            limit: limit as usize,
            offset: offset as usize,
        })
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Number of leading items needed to fill this page
    pub fn end(&self) -> usize {
        self.offset.saturating_add(self.limit)
    }

    /// `items[offset .. offset + limit]`, empty when the offset is past the end
    pub fn slice<T>(&self, items: Vec<T>) -> Vec<T> {
        items
            .into_iter()
            .skip(self.offset)
            .take(self.limit)
            .collect()
    }
}

fn compare_ranked(a: &(String, CombinedScore), b: &(String, CombinedScore)) -> Ordering {
    b.1.hybrid_score
        .total_cmp(&a.1.hybrid_score)
        .then_with(|| a.0.cmp(&b.0))
}

/// Sorts combined scores by hybrid score descending, ties by ascending media id
///
/// Sorting uses full precision; rounding happens only when the output is built.
pub fn rank(combined: HashMap<String, CombinedScore>) -> Vec<(String, CombinedScore)> {
    let mut ranked: Vec<(String, CombinedScore)> = combined.into_iter().collect();
    ranked.sort_by(compare_ranked);
    ranked
}

/// Ranks and cuts one page out of the combined scores
pub fn rank_and_paginate(
    combined: HashMap<String, CombinedScore>,
    page: Page,
) -> Vec<(String, CombinedScore)> {
    page.slice(rank(combined))
}
