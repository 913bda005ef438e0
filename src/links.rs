use std::collections::HashSet;

use crate::models::{Credit, LinkRow};

/// One row per distinct credited id, numbered from `first_id`.
pub fn build_links(movie_id: i64, credits: &[Credit], first_id: i64) -> Vec<LinkRow> {
    let mut seen = HashSet::new();
    credits
        .iter()
        .filter_map(|credit| credit.id)
        .filter(|id| seen.insert(*id))
        .zip(first_id..)
        .map(|(target_id, id)| LinkRow { id, movie_id, target_id })
        .collect()
}

pub fn missing_ids(credits: &[Credit]) -> usize {
    credits.iter().filter(|credit| credit.id.is_none()).count()
}
