#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Car park registry types.
//!
//! A [`CarparkRecord`] holds the static attributes of one HDB car park as
//! read from the registry `GeoJSON`. [`Selection`] is the filter value used
//! by every view that lets the user pick "everything" or a specific subset
//! (planning areas, days of the week, clusters).

use std::borrow::Borrow;
use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Static attributes of a single car park.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarparkRecord {
    /// Car park number (e.g. `"ACB"`, `"BJ55"`).
    pub id: String,
    /// WGS84 longitude.
    pub longitude: f64,
    /// WGS84 latitude.
    pub latitude: f64,
    /// URA planning area the car park belongs to (e.g. `"BEDOK"`).
    pub planning_area: String,
}

/// Either every item, or an explicit subset of items.
///
/// `Only` with an empty set selects nothing. This is distinct from `All`:
/// unticking "islandwide" without picking any planning area renders no car
/// parks at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection<T: Ord> {
    /// Every item is selected.
    All,
    /// Only the listed items are selected.
    Only(BTreeSet<T>),
}

impl<T: Ord> Default for Selection<T> {
    fn default() -> Self {
        Self::All
    }
}

impl<T: Ord> Selection<T> {
    /// A selection that matches nothing.
    #[must_use]
    pub const fn none() -> Self {
        Self::Only(BTreeSet::new())
    }

    /// Builds an explicit selection from the given items.
    pub fn only(items: impl IntoIterator<Item = T>) -> Self {
        Self::Only(items.into_iter().collect())
    }

    /// Returns `true` if `item` is selected.
    pub fn contains<Q>(&self, item: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match self {
            Self::All => true,
            Self::Only(items) => items.contains(item),
        }
    }

    /// Returns `true` if the selection can never match anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Only(items) if items.is_empty())
    }

    /// Narrows `universe` down to the selected items, keeping the order of
    /// `universe`. Explicitly selected items that are not part of the
    /// universe are ignored.
    pub fn resolve<'a, I>(&self, universe: I) -> Vec<T>
    where
        I: IntoIterator<Item = &'a T>,
        T: Clone + 'a,
    {
        universe
            .into_iter()
            .filter(|item| self.contains(*item))
            .cloned()
            .collect()
    }
}

impl<T: Ord> FromIterator<T> for Selection<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self::only(iter)
    }
}
