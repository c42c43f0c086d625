//! Filter evaluation and value ordering for in-memory queries.
//!
//! Filters carry their operand as raw request text. The operand is interpreted against
//! the type of the value the filter's path resolves to: numbers parse as numbers, dates
//! as RFC 3339 or `YYYY-MM-DD`, booleans as `true`/`false`, strings stay strings.

use std::cmp::Ordering;
use bson::{Bson, datetime::DateTime};

use docrest_core::{
    document::{Record, display_value, value_kind},
    error::{DocumentStoreError, DocumentStoreResult},
    path::CollectionRegistry,
    query::{FieldOp, Filter},
    snapshot::parse_date,
};

/// Type-erased, comparable representation of BSON values.
///
/// Normalizes every numeric type to f64. Arrays and documents are never compared
/// structurally, so they collapse into [`Comparable::Other`] without allocating.
#[derive(Debug)]
pub(crate) enum Comparable<'a> {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// Numeric value (all integers and floats normalized to f64)
    Number(f64),
    /// DateTime value
    DateTime(DateTime),
    /// String value
    String(&'a str),
    /// Array or embedded document
    Other,
}

impl<'a> From<&'a Bson> for Comparable<'a> {
    fn from(bson: &'a Bson) -> Self {
        match bson {
            Bson::Null => Comparable::Null,
            Bson::Boolean(value) => Comparable::Bool(*value),
            Bson::Int32(value) => Comparable::Number(*value as f64),
            Bson::Int64(value) => Comparable::Number(*value as f64),
            Bson::Double(value) => Comparable::Number(*value),
            Bson::DateTime(value) => Comparable::DateTime(*value),
            Bson::String(value) => Comparable::String(value),
            Bson::Array(_) | Bson::Document(_) => Comparable::Other,
            _ => Comparable::Null, // Other types are not comparable
        }
    }
}

impl<'a> PartialEq for Comparable<'a> {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Comparable::Null, Comparable::Null) => true,
            (Comparable::Bool(a), Comparable::Bool(b)) => a == b,
            (Comparable::Number(a), Comparable::Number(b)) => a == b,
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a == b,
            (Comparable::String(a), Comparable::String(b)) => a == b,
            _ => false,
        }
    }
}

impl<'a> PartialOrd for Comparable<'a> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.partial_cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.partial_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.partial_cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.partial_cmp(b),
            _ => None,
        }
    }
}

impl<'a> Comparable<'a> {
    /// Interprets a raw operand as a value of the same kind as `self`.
    ///
    /// Returns `None` when the operand cannot be read as that kind, or when `self` is
    /// not an orderable kind at all.
    fn operand<'b>(&self, raw: &'b str) -> Option<Comparable<'b>> {
        match self {
            Comparable::Number(_) => raw.trim().parse::<f64>().ok().map(Comparable::Number),
            Comparable::String(_) => Some(Comparable::String(raw)),
            Comparable::DateTime(_) => parse_date(raw.trim()).map(Comparable::DateTime),
            Comparable::Bool(_) => raw.trim().parse::<bool>().ok().map(Comparable::Bool),
            Comparable::Null | Comparable::Other => None,
        }
    }

    /// Position of this kind in the cross-type sort order.
    fn rank(&self) -> u8 {
        match self {
            Comparable::Null => 1,
            Comparable::Bool(_) => 2,
            Comparable::Number(_) => 3,
            Comparable::DateTime(_) => 4,
            Comparable::String(_) => 5,
            Comparable::Other => 6,
        }
    }

    /// Total order used for sorting.
    ///
    /// Values of different kinds order by kind; arrays and maps are all equal.
    fn total_cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Comparable::Bool(a), Comparable::Bool(b)) => a.cmp(b),
            (Comparable::Number(a), Comparable::Number(b)) => a.total_cmp(b),
            (Comparable::DateTime(a), Comparable::DateTime(b)) => a.cmp(b),
            (Comparable::String(a), Comparable::String(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

/// Orders two resolved values for sorting. A missing value sorts before everything.
pub(crate) fn sort_order(left: Option<&Bson>, right: Option<&Bson>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(left), Some(right)) => Comparable::from(left).total_cmp(&Comparable::from(right)),
    }
}

/// Evaluates filters against records, resolving paths through a registry.
pub(crate) struct FilterEvaluator<'a, R: ?Sized> {
    registry: &'a R,
}

impl<'a, R: CollectionRegistry + ?Sized> FilterEvaluator<'a, R> {
    pub fn new(registry: &'a R) -> Self {
        Self { registry }
    }

    /// Whether `record` satisfies every filter, checked in order.
    pub fn matches_all(&self, filters: &[Filter], record: &'a Record) -> DocumentStoreResult<bool> {
        for filter in filters {
            if !self.matches(filter, record)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    /// Whether `record` satisfies `filter`.
    ///
    /// A missing value fails every operator except `ne`.
    ///
    /// # Errors
    ///
    /// [`DocumentStoreError::TypeMismatch`] when `lte`/`gte` meet a value that cannot be
    /// ordered against the operand.
    pub fn matches(&self, filter: &Filter, record: &'a Record) -> DocumentStoreResult<bool> {
        let resolved = filter.field.resolve(record, self.registry);

        let Some(value) = resolved else {
            return Ok(filter.op == FieldOp::Ne);
        };

        match filter.op {
            FieldOp::Eq => Ok(loose_eq(value, &filter.value)),
            FieldOp::Ne => Ok(!loose_eq(value, &filter.value)),
            FieldOp::Like => Ok(
                display_value(value)
                    .to_lowercase()
                    .contains(&filter.value.to_lowercase())
            ),
            FieldOp::Lte | FieldOp::Gte => {
                let left = Comparable::from(value);
                let right = left
                    .operand(&filter.value)
                    .ok_or_else(|| DocumentStoreError::TypeMismatch {
                        field: filter.field.path().to_string(),
                        found: value_kind(value),
                        operand: filter.value.clone(),
                    })?;

                Ok(match left.partial_cmp(&right) {
                    Some(ordering) => match filter.op {
                        FieldOp::Lte => ordering != Ordering::Greater,
                        _ => ordering != Ordering::Less,
                    },
                    None => false,
                })
            },
        }
    }
}

/// Equality between a stored value and a raw operand.
///
/// The operand is read as the stored value's kind; arrays and maps never equal an operand.
fn loose_eq(value: &Bson, raw: &str) -> bool {
    let left = Comparable::from(value);

    match left {
        Comparable::Other => false,
        Comparable::Null => raw == "null",
        _ => left
            .operand(raw)
            .is_some_and(|right| left == right),
    }
}
