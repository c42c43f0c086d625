//! Execution of compiled query plans over a collection.
//!
//! Stages run in a fixed order:
//!
//! 1. **filter** - keep records satisfying every filter, preserving their order;
//! 2. **sort** - one full stable sort per sort key, in declaration order. The last key
//!    therefore decides the final order and earlier keys only break its ties;
//! 3. **paginate** - slice to the requested window, remembering the post-filter total;
//! 4. **embed** - replace foreign-key values of the surviving records with the records
//!    they reference.

use bson::Bson;

use docrest_core::{
    document::Record,
    error::DocumentStoreResult,
    inflect::pluralize,
    page::Page,
    path::CollectionRegistry,
    query::{QueryPlan, SortDirection},
};

use crate::evaluator::{FilterEvaluator, sort_order};

/// Runs `plan` over `records`, resolving foreign keys through `registry`.
///
/// # Errors
///
/// Propagates [`TypeMismatch`](docrest_core::error::DocumentStoreError::TypeMismatch)
/// from range filters.
pub fn execute<'a, R>(records: &'a [Record], plan: &QueryPlan, registry: &'a R) -> DocumentStoreResult<Page<Record>>
where
    R: CollectionRegistry + ?Sized,
{
    let evaluator = FilterEvaluator::new(registry);
    let mut selected = Vec::with_capacity(records.len());

    for record in records {
        if evaluator.matches_all(&plan.filters, record)? {
            selected.push(record);
        }
    }

    for sort in &plan.sort {
        selected.sort_by(|left, right| {
            let ordering = sort_order(
                sort.field.resolve(left, registry),
                sort.field.resolve(right, registry),
            );

            match sort.direction {
                SortDirection::Asc => ordering,
                SortDirection::Desc => ordering.reverse(),
            }
        });
    }

    Ok(
        plan.window
            .paginate(selected)
            .map(|record| {
                let mut record = record.clone();
                embed(&mut record, &plan.embed, registry);
                record
            })
    )
}

/// Expands `fields` of `record` into the records they reference.
///
/// A field is looked up by id in the collection named after its plural. Null, missing
/// and dangling values are left untouched.
pub fn embed<R>(record: &mut Record, fields: &[String], registry: &R)
where
    R: CollectionRegistry + ?Sized,
{
    for field in fields {
        let referenced = record
            .get(field)
            .filter(|value| !matches!(value, Bson::Null))
            .and_then(|value| registry.find_by_id(&pluralize(field), value))
            .cloned();

        if let Some(referenced) = referenced {
            record.insert(field.clone(), Bson::Document(referenced));
        }
    }
}
