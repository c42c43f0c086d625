//! Dotted field paths with implicit foreign-key traversal.
//!
//! A path such as `product.category.name` is split once into segments. Resolving it
//! against a record walks the segments; every intermediate value that is not an embedded
//! document is treated as a foreign key into the collection named after the pluralized
//! segment (`product` -> `products`) and replaced by the referenced record.
//!
//! ```ignore
//! let name = PathResolver::new("product.category.name");
//! // order.product == 7, products[id=7].category == 2, categories[id=2].name == "Books"
//! assert_eq!(name.resolve(&order, &snapshot), Some(&Bson::from("Books")));
//! ```

use bson::Bson;
use std::fmt;

use crate::{
    document::{Record, ids_match, record_id},
    inflect::pluralize,
};

/// Read access to named collections, used to dereference foreign keys.
pub trait CollectionRegistry {
    /// Returns the records of `collection`, or `None` if there is no such collection.
    fn records(&self, collection: &str) -> Option<&[Record]>;

    /// Finds the first record of `collection` whose id loosely equals `id`.
    fn find_by_id(&self, collection: &str, id: &Bson) -> Option<&Record> {
        self.records(collection)?
            .iter()
            .find(|record| record_id(record).is_some_and(|candidate| ids_match(candidate, id)))
    }
}

/// A field accessor compiled from a dotted path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathResolver {
    path: String,
    segments: Vec<String>,
}

impl PathResolver {
    /// Compiles `path` into its segments.
    pub fn new(path: impl Into<String>) -> Self {
        let path = path.into();
        let segments = path.split('.').map(str::to_string).collect();

        Self { path, segments }
    }

    /// Returns the original dotted path.
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Returns the path segments in walk order.
    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// Resolves the path against `record`.
    ///
    /// Returns `None` for a missing field, a dangling foreign key, a missing target
    /// collection or a path that runs past a scalar. Never fails otherwise.
    pub fn resolve<'a, R>(&self, record: &'a Record, registry: &'a R) -> Option<&'a Bson>
    where
        R: CollectionRegistry + ?Sized,
    {
        let (last, intermediate) = self.segments.split_last()?;
        let mut current = record;

        for segment in intermediate {
            current = match current.get(segment)? {
                Bson::Document(nested) => nested,
                Bson::Null => return None,
                foreign_key => registry.find_by_id(&pluralize(segment), foreign_key)?,
            };
        }

        current.get(last)
    }
}

impl fmt::Display for PathResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bson::doc;
    use std::collections::HashMap;

    struct Registry(HashMap<&'static str, Vec<Record>>);

    impl CollectionRegistry for Registry {
        fn records(&self, collection: &str) -> Option<&[Record]> {
            self.0.get(collection).map(Vec::as_slice)
        }
    }

    fn registry() -> Registry {
        Registry(HashMap::from([
            ("categories", vec![doc! { "id": 2, "name": "Books" }]),
            ("products", vec![
                doc! { "id": 7, "name": "Dune", "category": 2 },
                doc! { "id": 8, "name": "Orphan", "category": 99 },
            ]),
        ]))
    }

    #[test]
    fn resolves_plain_fields() {
        let registry = registry();
        let order = doc! { "id": 1, "count": 3 };

        assert_eq!(PathResolver::new("count").resolve(&order, &registry), Some(&Bson::Int32(3)));
        assert_eq!(PathResolver::new("missing").resolve(&order, &registry), None);
    }

    #[test]
    fn follows_foreign_keys_across_collections() {
        let registry = registry();
        let order = doc! { "id": 1, "product": 7 };

        let path = PathResolver::new("product.category.name");
        assert_eq!(path.resolve(&order, &registry), Some(&Bson::String("Books".into())));
    }

    #[test]
    fn string_keys_find_numeric_ids() {
        let registry = registry();
        let order = doc! { "id": 1, "product": "7" };

        assert_eq!(
            PathResolver::new("product.name").resolve(&order, &registry),
            Some(&Bson::String("Dune".into())),
        );
    }

    #[test]
    fn descends_into_embedded_documents() {
        let registry = registry();
        let order = doc! { "id": 1, "shipping": { "city": "Oslo" } };

        assert_eq!(
            PathResolver::new("shipping.city").resolve(&order, &registry),
            Some(&Bson::String("Oslo".into())),
        );
    }

    #[test]
    fn dangling_references_resolve_to_none() {
        let registry = registry();

        let dangling = doc! { "id": 1, "product": 8 };
        assert_eq!(PathResolver::new("product.category.name").resolve(&dangling, &registry), None);

        let unknown_collection = doc! { "id": 1, "warehouse": 3 };
        assert_eq!(PathResolver::new("warehouse.name").resolve(&unknown_collection, &registry), None);

        let past_scalar = doc! { "id": 1, "count": 3 };
        assert_eq!(PathResolver::new("count.value.x").resolve(&past_scalar, &registry), None);
    }
}
