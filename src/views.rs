//! Read-only projections of a memory list: by category, by month, favorites
//! and text search.

use chrono::{NaiveDate, TimeZone};
use std::collections::HashMap;
use std::fmt::Display;

use crate::models::{Category, Memory};
use crate::utils::time::{month_start, month_year_label};

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryGroup {
    pub category: Category,
    pub memories: Vec<Memory>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthGroup {
    /// e.g. `March 2024`
    pub label: String,
    pub month: NaiveDate,
    pub memories: Vec<Memory>,
}

/// Distinct categories present, sorted by name
pub fn categories(memories: &[Memory]) -> Vec<Category> {
    let mut categories: Vec<Category> = Vec::new();
    for memory in memories {
        if !categories.contains(&memory.category) {
            categories.push(memory.category);
        }
    }
    categories.sort_by_key(|category| category.as_str());
    categories
}

/// One group per category present, groups sorted by category name and
/// members kept in list order
pub fn group_by_category(memories: &[Memory]) -> Vec<CategoryGroup> {
    let mut grouped: HashMap<Category, Vec<Memory>> = HashMap::new();
    for memory in memories {
        grouped
            .entry(memory.category)
            .or_default()
            .push(memory.clone());
    }

    categories(memories)
        .into_iter()
        .map(|category| CategoryGroup {
            category,
            memories: grouped.remove(&category).unwrap_or_default(),
        })
        .collect()
}

/// Timeline sections: newest month first, newest memory first inside a month.
/// Months are cut in `zone`, the reader's local time.
pub fn group_by_month<Tz: TimeZone>(memories: &[Memory], zone: &Tz) -> Vec<MonthGroup>
where
    Tz::Offset: Display,
{
    let mut grouped: HashMap<NaiveDate, Vec<Memory>> = HashMap::new();
    for memory in memories {
        grouped
            .entry(month_start(&memory.date, zone))
            .or_default()
            .push(memory.clone());
    }

    let mut groups: Vec<MonthGroup> = grouped
        .into_iter()
        .map(|(month, mut memories)| {
            memories.sort_by(|a, b| b.date.cmp(&a.date));
            MonthGroup {
                label: month_year_label(&memories[0].date, zone),
                month,
                memories,
            }
        })
        .collect();

    groups.sort_by(|a, b| b.month.cmp(&a.month));
    groups
}

pub fn favorites(memories: &[Memory]) -> Vec<Memory> {
    memories
        .iter()
        .filter(|memory| memory.is_favorite)
        .cloned()
        .collect()
}

/// Case-insensitive substring match on title or location
pub fn search(memories: &[Memory], query: &str) -> Vec<Memory> {
    memories
        .iter()
        .filter(|memory| memory.matches_query(query))
        .cloned()
        .collect()
}
