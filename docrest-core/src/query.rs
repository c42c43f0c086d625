//! Query parameters, query plans and the parameter compiler.
//!
//! A list request arrives as a flat, ordered set of string parameters. [`QueryPlan::compile`]
//! turns it into a structured plan:
//!
//! - `field=value`, `field_ne=value`, `field_lte=value`, `field_gte=value`,
//!   `field_like=value` become filters bound to a [`PathResolver`] over `field`;
//! - `_sort=a,b.c` and `_order=desc,asc` become sort keys, paired by position;
//! - `_start=10&_end=20` becomes the pagination [`Window`];
//! - `_embed=category,user` names the foreign keys to expand in the results.
//!
//! ```ignore
//! use docrest::query::{QueryParams, QueryPlan};
//!
//! let params = QueryParams::from_pairs([("category.name_like", "book"), ("_sort", "price")]);
//! let plan = QueryPlan::compile(&params, &StoreConfig::default())?;
//! assert_eq!(plan.filters.len(), 1);
//! ```
//!
//! Plans can also be built directly:
//!
//! ```ignore
//! let plan = QueryPlan::builder()
//!     .filter(Filter::gte("price", "100"))
//!     .sort("createdAt", SortDirection::Desc)
//!     .window(Some(0), Some(10))
//!     .build();
//! ```

use std::fmt;
use tracing::debug;

use crate::{
    config::StoreConfig,
    error::{DocumentStoreError, DocumentStoreResult},
    page::Window,
    path::PathResolver,
};

/// Sort direction for query results.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortDirection {
    /// Ascending order (A to Z, 0 to 9, earliest to latest).
    #[default]
    Asc,
    /// Descending order (Z to A, 9 to 0, latest to earliest).
    Desc,
}

impl SortDirection {
    /// Parses an `_order` entry. Anything but `desc` sorts ascending.
    pub fn parse(token: &str) -> Self {
        if token.trim().eq_ignore_ascii_case("desc") {
            SortDirection::Desc
        } else {
            SortDirection::Asc
        }
    }
}

/// A single sort key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sort {
    /// Accessor of the field to sort by.
    pub field: PathResolver,
    /// The sort direction.
    pub direction: SortDirection,
}

/// Field comparison operators for filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldOp {
    /// Equal to.
    Eq,
    /// Not equal to.
    Ne,
    /// Less than or equal to.
    Lte,
    /// Greater than or equal to.
    Gte,
    /// Case-insensitive substring of the stringified value.
    Like,
}

impl FieldOp {
    /// Parses an operator suffix token, returning `None` for unknown operators.
    pub fn parse(token: &str) -> Option<Self> {
        match token {
            "eq" => Some(FieldOp::Eq),
            "ne" => Some(FieldOp::Ne),
            "lte" => Some(FieldOp::Lte),
            "gte" => Some(FieldOp::Gte),
            "like" => Some(FieldOp::Like),
            _ => None,
        }
    }

    /// The operator's suffix token.
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldOp::Eq => "eq",
            FieldOp::Ne => "ne",
            FieldOp::Lte => "lte",
            FieldOp::Gte => "gte",
            FieldOp::Like => "like",
        }
    }
}

impl fmt::Display for FieldOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A filter predicate: `field <op> value`.
///
/// The operand stays the raw parameter text; it is interpreted against the type of the
/// resolved record value when the filter is evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    /// Accessor of the filtered field.
    pub field: PathResolver,
    /// The comparison operator.
    pub op: FieldOp,
    /// The raw operand.
    pub value: String,
}

impl Filter {
    /// Creates a filter.
    pub fn new(field: impl Into<String>, op: FieldOp, value: impl Into<String>) -> Self {
        Self {
            field: PathResolver::new(field),
            op,
            value: value.into(),
        }
    }

    /// Matches records where the field equals the value.
    pub fn eq(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FieldOp::Eq, value)
    }

    /// Matches records where the field does not equal the value.
    pub fn ne(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FieldOp::Ne, value)
    }

    /// Matches records where the field is less than or equal to the value.
    pub fn lte(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FieldOp::Lte, value)
    }

    /// Matches records where the field is greater than or equal to the value.
    pub fn gte(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FieldOp::Gte, value)
    }

    /// Matches records whose stringified field contains the value, ignoring case.
    pub fn like(field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(field, FieldOp::Like, value)
    }
}

/// Ordered list request parameters.
///
/// Order is significant (filters apply in parameter order) and repeated keys are kept.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(String, String)>,
}

impl QueryParams {
    /// Creates an empty parameter set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a parameter set from key/value pairs.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        pairs.into_iter().collect()
    }

    /// Appends a parameter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    /// Returns the last value given for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .rev()
            .find(|(candidate, _)| candidate == key)
            .map(|(_, value)| value.as_str())
    }

    /// Iterates over the parameters in order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.pairs.iter().map(|(key, value)| (key.as_str(), value.as_str()))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for QueryParams {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            pairs: iter
                .into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        }
    }
}

/// A compiled list query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryPlan {
    /// Conjunctive filters, in parameter order.
    pub filters: Vec<Filter>,
    /// Sort keys, applied one full pass after another in declaration order.
    pub sort: Vec<Sort>,
    /// Pagination window.
    pub window: Window,
    /// Fields to expand into the referenced records.
    pub embed: Vec<String>,
}

impl QueryPlan {
    /// Creates a new empty plan: no filters, no sorting, no window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a new query builder for fluent construction.
    pub fn builder() -> QueryBuilder {
        QueryBuilder::new()
    }

    /// Compiles request parameters into a plan.
    ///
    /// # Errors
    ///
    /// Returns [`DocumentStoreError::InvalidQuery`] when `_start` or `_end` is not a
    /// non-negative integer, or when `config.strict_operators` is set and a parameter
    /// carries an unknown operator.
    pub fn compile(params: &QueryParams, config: &StoreConfig) -> DocumentStoreResult<Self> {
        let mut plan = QueryPlan::new();
        let mut sort_fields = Vec::new();
        let mut sort_orders = Vec::new();

        for (key, value) in params.iter() {
            let (field, token) = split_operator(key);

            if field.is_empty() {
                match token {
                    "sort" => sort_fields = split_list(value),
                    "order" => sort_orders = split_list(value),
                    "start" => plan.window.start = Some(parse_bound(key, value)?),
                    "end" => plan.window.end = Some(parse_bound(key, value)?),
                    "embed" => plan.embed = split_list(value),
                    _ => reject_or_ignore(key, config)?,
                }
                continue;
            }

            match FieldOp::parse(token) {
                Some(op) => plan.filters.push(Filter::new(field, op, value)),
                None => reject_or_ignore(key, config)?,
            }
        }

        plan.sort = sort_fields
            .into_iter()
            .enumerate()
            .map(|(position, field)| Sort {
                field: PathResolver::new(field),
                direction: sort_orders
                    .get(position)
                    .map(|order| SortDirection::parse(order))
                    .unwrap_or_default(),
            })
            .collect();

        debug!(
            filters = plan.filters.len(),
            sort_keys = plan.sort.len(),
            window = ?plan.window,
            embed = ?plan.embed,
            "compiled query plan"
        );

        Ok(plan)
    }
}

/// Splits a comma separated parameter value, dropping empty entries.
pub fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(str::to_string)
        .collect()
}

/// Splits `key` into `(field, operator token)` at its trailing `_<token>` suffix.
///
/// Keys without such a suffix are equality filters on the whole key.
fn split_operator(key: &str) -> (&str, &str) {
    match key.rfind('_') {
        Some(index) if index + 1 < key.len() => (&key[..index], &key[index + 1..]),
        _ => (key, FieldOp::Eq.as_str()),
    }
}

fn parse_bound(key: &str, value: &str) -> DocumentStoreResult<usize> {
    value
        .trim()
        .parse::<usize>()
        .map_err(|_| DocumentStoreError::InvalidQuery(format!("{key} must be a non-negative integer, got {value:?}")))
}

fn reject_or_ignore(key: &str, config: &StoreConfig) -> DocumentStoreResult<()> {
    if config.strict_operators {
        return Err(DocumentStoreError::InvalidQuery(format!("unknown operator in parameter {key:?}")));
    }

    debug!(parameter = key, "ignoring parameter with unknown operator");
    Ok(())
}

#[derive(Debug, Clone, Default)]
pub struct QueryBuilder {
    plan: QueryPlan,
}

impl QueryBuilder {
    /// Creates a new query builder.
    pub fn new() -> Self {
        QueryBuilder { plan: QueryPlan::default() }
    }

    /// Adds a filter. Filters are conjunctive.
    pub fn filter(mut self, filter: Filter) -> Self {
        self.plan.filters.push(filter);
        self
    }

    /// Adds a sort key after the existing ones.
    pub fn sort(mut self, field: impl Into<String>, direction: SortDirection) -> Self {
        self.plan.sort.push(Sort { field: PathResolver::new(field), direction });
        self
    }

    /// Sets the pagination window.
    pub fn window(mut self, start: Option<usize>, end: Option<usize>) -> Self {
        self.plan.window = Window::new(start, end);
        self
    }

    /// Adds a field to expand.
    pub fn embed(mut self, field: impl Into<String>) -> Self {
        self.plan.embed.push(field.into());
        self
    }

    /// Builds and returns the final plan.
    pub fn build(self) -> QueryPlan {
        self.plan
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn compile(pairs: &[(&str, &str)]) -> DocumentStoreResult<QueryPlan> {
        QueryPlan::compile(&QueryParams::from_pairs(pairs.iter().copied()), &StoreConfig::default())
    }

    #[test]
    fn splits_operator_suffixes() {
        assert_eq!(split_operator("price_lte"), ("price", "lte"));
        assert_eq!(split_operator("category.name_like"), ("category.name", "like"));
        assert_eq!(split_operator("name"), ("name", "eq"));
        assert_eq!(split_operator("_sort"), ("", "sort"));
        assert_eq!(split_operator("trailing_"), ("trailing_", "eq"));
    }

    #[test]
    fn filters_keep_parameter_order() {
        let plan = compile(&[("price_gte", "10"), ("name", "Dune"), ("user_ne", "Bob")]).unwrap();

        assert_eq!(
            plan.filters,
            vec![
                Filter::gte("price", "10"),
                Filter::eq("name", "Dune"),
                Filter::ne("user", "Bob"),
            ],
        );
    }

    #[test]
    fn control_parameters_shape_the_plan() {
        let plan = compile(&[
            ("_sort", "category.name,price"),
            ("_order", "desc"),
            ("_start", "0"),
            ("_end", "2"),
            ("_embed", "category, user"),
        ])
        .unwrap();

        assert!(plan.filters.is_empty());
        assert_eq!(plan.sort.len(), 2);
        assert_eq!(plan.sort[0].field.path(), "category.name");
        assert_eq!(plan.sort[0].direction, SortDirection::Desc);
        assert_eq!(plan.sort[1].direction, SortDirection::Asc);
        assert_eq!(plan.window, Window::new(Some(0), Some(2)));
        assert_eq!(plan.embed, vec!["category".to_string(), "user".to_string()]);
    }

    #[test]
    fn order_may_precede_sort_and_unknown_orders_ascend() {
        let plan = compile(&[("_order", "sideways,desc"), ("_sort", "a,b")]).unwrap();

        assert_eq!(plan.sort[0].direction, SortDirection::Asc);
        assert_eq!(plan.sort[1].direction, SortDirection::Desc);
    }

    #[test]
    fn unknown_operators_are_ignored_by_default() {
        let plan = compile(&[("price_between", "1"), ("_limit", "5"), ("name", "x")]).unwrap();

        assert_eq!(plan.filters, vec![Filter::eq("name", "x")]);
    }

    #[test]
    fn strict_mode_rejects_unknown_operators() {
        let params = QueryParams::new().with("price_between", "1");
        let config = StoreConfig::default().strict_operators(true);

        let err = QueryPlan::compile(&params, &config).unwrap_err();
        assert!(matches!(err, DocumentStoreError::InvalidQuery(_)));
    }

    #[test]
    fn invalid_bounds_are_rejected() {
        assert!(matches!(compile(&[("_start", "abc")]), Err(DocumentStoreError::InvalidQuery(_))));
        assert!(matches!(compile(&[("_end", "-1")]), Err(DocumentStoreError::InvalidQuery(_))));
    }

    #[test]
    fn params_keep_duplicates_and_return_the_last_value() {
        let params = QueryParams::new().with("_embed", "a").with("_embed", "b");

        assert_eq!(params.iter().count(), 2);
        assert_eq!(params.get("_embed"), Some("b"));
        assert_eq!(params.get("missing"), None);
    }

    #[test]
    fn builder_assembles_plans() {
        let plan = QueryPlan::builder()
            .filter(Filter::like("name", "du"))
            .sort("price", SortDirection::Desc)
            .window(Some(1), None)
            .embed("category")
            .build();

        assert_eq!(plan.filters.len(), 1);
        assert_eq!(plan.sort[0].direction, SortDirection::Desc);
        assert!(plan.window.is_requested());
        assert_eq!(plan.embed, vec!["category".to_string()]);
    }
}
