//! Category classification business logic.
//!
//! Members with a birth date are placed into the age-based category whose inclusive
//! `[min_age, max_age]` window contains their age. Categories that are not age-based
//! are only ever assigned by an administrator and are never replaced automatically.
//!
//! When several age-based windows contain the same age, the narrowest window wins,
//! then the one with the higher lower bound, then the lowest id.

use crate::{
    entities::{Category, Member, category, member},
    errors::{Error, Result},
};
use chrono::{Datelike, NaiveDate, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};
use tracing::{debug, info, instrument};

/// Outcome of re-running classification over every member.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReclassificationSummary {
    /// Members examined
    pub members_checked: usize,
    /// Members whose category was changed
    pub members_updated: usize,
}

/// Whole years between `date_of_birth` and `as_of`.
///
/// Returns a negative value when the birth date lies in the future.
#[must_use]
pub fn age_on(date_of_birth: NaiveDate, as_of: NaiveDate) -> i32 {
    let mut age = as_of.year() - date_of_birth.year();
    if (as_of.month(), as_of.day()) < (date_of_birth.month(), date_of_birth.day()) {
        age -= 1;
    }
    age
}

/// Picks the age-based category for a birth date.
///
/// Returns `None` when there is no birth date or no age-based category covers the age.
/// Categories missing either bound never match.
#[must_use]
pub fn classify(
    date_of_birth: Option<NaiveDate>,
    as_of: NaiveDate,
    categories: &[category::Model],
) -> Option<i64> {
    let age = age_on(date_of_birth?, as_of);

    categories
        .iter()
        .filter(|c| c.is_age_based)
        .filter_map(|c| match (c.min_age, c.max_age) {
            (Some(min), Some(max)) if min <= age && age <= max => Some((max - min, min, c.id)),
            _ => None,
        })
        .min_by(|a, b| a.0.cmp(&b.0).then(b.1.cmp(&a.1)).then(a.2.cmp(&b.2)))
        .map(|(_, _, id)| id)
}

/// Decides whether a freshly classified category should replace the current one.
///
/// A member without a category takes any classification. A member in an age-based
/// category moves whenever the classification differs, including to no category once
/// the birth date is removed or no window covers the age. A manually assigned category
/// is kept.
#[must_use]
pub fn should_reassign(current: Option<&category::Model>, classified: Option<i64>) -> bool {
    match current {
        None => classified.is_some(),
        Some(current) => current.is_age_based && Some(current.id) != classified,
    }
}

/// Retrieves all categories in table order.
pub async fn get_all_categories<C>(db: &C) -> Result<Vec<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find()
        .order_by_asc(category::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}

/// Finds a category by its ID.
pub async fn get_category_by_id<C>(db: &C, category_id: i64) -> Result<Option<category::Model>>
where
    C: ConnectionTrait,
{
    Category::find_by_id(category_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Creates a category, validating that age bounds are ordered.
pub async fn create_category<C>(
    db: &C,
    name: &str,
    is_age_based: bool,
    min_age: Option<i32>,
    max_age: Option<i32>,
) -> Result<category::Model>
where
    C: ConnectionTrait,
{
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::validation("Category name cannot be empty"));
    }
    if let (Some(min), Some(max)) = (min_age, max_age) {
        if min > max {
            return Err(Error::validation(format!(
                "Category '{name}' has min_age {min} greater than max_age {max}"
            )));
        }
    }

    let existing = Category::find()
        .filter(category::Column::Name.eq(name))
        .one(db)
        .await?;
    if existing.is_some() {
        return Err(Error::Conflict {
            message: format!("Category '{name}' already exists"),
        });
    }

    let model = category::ActiveModel {
        name: Set(name.to_string()),
        is_age_based: Set(is_age_based),
        min_age: Set(min_age),
        max_age: Set(max_age),
        ..Default::default()
    };

    Ok(model.insert(db).await?)
}

/// Re-runs classification for one member and writes the category if the caller
/// contract allows it. Returns the (possibly updated) member.
pub async fn refresh_member_category<C>(
    db: &C,
    member: member::Model,
    as_of: NaiveDate,
) -> Result<member::Model>
where
    C: ConnectionTrait,
{
    let categories = get_all_categories(db).await?;
    apply_classification(db, member, as_of, &categories).await
}

async fn apply_classification<C>(
    db: &C,
    member: member::Model,
    as_of: NaiveDate,
    categories: &[category::Model],
) -> Result<member::Model>
where
    C: ConnectionTrait,
{
    let classified = classify(member.date_of_birth, as_of, categories);
    let current = member
        .category_id
        .and_then(|id| categories.iter().find(|c| c.id == id));

    if !should_reassign(current, classified) {
        return Ok(member);
    }

    debug!(
        member_id = member.id,
        from = ?member.category_id,
        to = ?classified,
        "reassigning member category"
    );

    let mut active_model: member::ActiveModel = member.into();
    active_model.category_id = Set(classified);
    active_model.updated_at = Set(Utc::now().naive_utc());
    Ok(active_model.update(db).await?)
}

/// Re-runs classification across every member, e.g. after a category's age window changed.
#[instrument(skip(db))]
pub async fn reclassify_all(
    db: &DatabaseConnection,
    as_of: NaiveDate,
) -> Result<ReclassificationSummary> {
    let categories = get_all_categories(db).await?;
    let members = Member::find()
        .order_by_asc(member::Column::Id)
        .all(db)
        .await?;

    let mut summary = ReclassificationSummary::default();
    for member in members {
        let before = member.category_id;
        let after = apply_classification(db, member, as_of, &categories).await?;
        summary.members_checked += 1;
        if after.category_id != before {
            summary.members_updated += 1;
        }
    }

    info!(
        checked = summary.members_checked,
        updated = summary.members_updated,
        "reclassification finished"
    );
    Ok(summary)
}
