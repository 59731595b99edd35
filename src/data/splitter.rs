// ============================================================
// Layer 4 — Category Splitter
// ============================================================
// Partitions samples into named categories, typically:
//   - train:    used to update model weights
//   - validate: used to watch for overfitting while training
//   - test:     held back for the final evaluation
//
// Each category carries a target fraction. Fractions are
// normalised by their sum, so { train: 0.4, test: 0.1 } splits
// 80% / 20%. Categories receive contiguous slices in the order
// they were declared:
//
//   100 samples, train 0.8 / validate 0.1 / test 0.1
//   [0 ........................ 80)[80 .. 90)[90 .. 100)
//
// Slice boundaries are rounded cumulative fractions, and the
// last category always ends at the final sample, so every
// sample lands in exactly one group. The splitter does not
// shuffle: the same input always yields the same groups.
//
// Reference: Rust Book §8 (Vectors)

use std::{collections::BTreeMap, fmt};

use serde::{
    de::{self, MapAccess, Visitor},
    ser::SerializeMap,
    Deserialize, Deserializer, Serialize, Serializer,
};

use crate::data::error::PipelineError;

pub const TRAIN: &str = "train";
pub const VALIDATE: &str = "validate";
pub const TEST: &str = "test";

/// Ordered mapping from category name to target fraction.
///
/// Serialized as a JSON object whose key order is the slice order.
/// Names are unique.
#[derive(Debug, Clone, PartialEq)]
pub struct Categories(Vec<(String, f64)>);

impl Categories {
    /// An empty set of categories
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Builder-style version of `set`
    pub fn with(mut self, name: impl Into<String>, fraction: f64) -> Self {
        self.set(name, fraction);
        self
    }

    /// Set the fraction for `name`, keeping its position if it already exists.
    pub fn set(&mut self, name: impl Into<String>, fraction: f64) {
        let name = name.into();
        match self.0.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = fraction,
            None        => self.0.push((name, fraction)),
        }
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, f)| *f)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.0.iter().map(|(n, f)| (n.as_str(), *f))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Check every fraction lies in [0, 1] and return their sum.
    fn total(&self) -> Result<f64, PipelineError> {
        let mut total = 0.0;
        for (name, fraction) in self.iter() {
            if !fraction.is_finite() || !(0.0..=1.0).contains(&fraction) {
                return Err(PipelineError::InvalidFraction {
                    category: name.to_string(),
                    fraction,
                });
            }
            total += fraction;
        }
        if total <= 0.0 {
            return Err(PipelineError::NoFractions);
        }
        Ok(total)
    }
}

/// train 0.8 / validate 0.1 / test 0.1
impl Default for Categories {
    fn default() -> Self {
        Self::new()
            .with(TRAIN, 0.8)
            .with(VALIDATE, 0.1)
            .with(TEST, 0.1)
    }
}

// ─── Serde: { "train": 0.8, "validate": 0.1, "test": 0.1 } ─────────────────────
impl Serialize for Categories {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, fraction) in self.iter() {
            map.serialize_entry(name, &fraction)?;
        }
        map.end()
    }
}

struct CategoriesVisitor;

impl<'de> Visitor<'de> for CategoriesVisitor {
    type Value = Categories;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a map from category name to fraction")
    }

    // Entries arrive in document order, which becomes the slice order
    fn visit_map<A>(self, mut access: A) -> Result<Categories, A::Error>
    where
        A: MapAccess<'de>,
    {
        let mut categories = Categories::new();
        while let Some((name, fraction)) = access.next_entry::<String, f64>()? {
            if categories.get(&name).is_some() {
                return Err(de::Error::custom(format!("duplicate category '{}'", name)));
            }
            categories.set(name, fraction);
        }
        Ok(categories)
    }
}

impl<'de> Deserialize<'de> for Categories {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_map(CategoriesVisitor)
    }
}

/// Split `samples` into one group per category.
///
/// # Arguments
/// * `samples`    - All samples (consumed by this function)
/// * `categories` - Target fractions, in slice order
///
/// # Returns
/// A map from category name to its samples, original order kept
/// within each group. Group sizes always sum to `samples.len()`.
pub fn split_by_category<T>(
    samples:    Vec<T>,
    categories: &Categories,
) -> Result<BTreeMap<String, Vec<T>>, PipelineError> {
    // Step 1: Validate fractions (also rules out an empty set)
    let total_fraction = categories.total()?;
    let total          = samples.len();
    let last           = categories.len() - 1;

    let mut groups     = BTreeMap::new();
    let mut remaining  = samples.into_iter();
    let mut cumulative = 0.0;
    let mut taken      = 0usize;

    // Step 2: Walk the categories, cutting the next contiguous slice off
    //         the front of whatever is left
    for (i, (name, fraction)) in categories.iter().enumerate() {
        cumulative += fraction;

        // Boundary = rounded share of the cumulative fraction; the last
        // category absorbs any rounding remainder

        let end = if i == last {
            total
        } else {
            ((total as f64) * cumulative / total_fraction).round() as usize
        };
        // Rounding can never move a boundary backwards or past the end
        let end = end.clamp(taken, total);

        // Step 3: Take exactly (end - taken) samples for this category
        let group: Vec<T> = remaining.by_ref().take(end - taken).collect();
        taken = end;

        tracing::debug!("Category '{}': {} samples", name, group.len());
        groups.insert(name.to_string(), group);
    }

    Ok(groups)
}
