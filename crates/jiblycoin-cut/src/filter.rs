use std::collections::BTreeSet;

use ethers::abi::Function;
use tracing::debug;

use crate::Selector;

/// The text that marks an entry point as an initializer under the naming
/// convention the facets follow.
const INIT: &str = "init";

/// Decides which entry points of a facet are setup-only and must stay out of
/// the diamond's routing table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SelectorFilter {
    /// Skip every function whose name contains the text anywhere.
    Contains(String),
    /// Skip every function whose name starts with the text.
    StartsWith(String),
    /// Skip exactly the listed function names.
    Deny(BTreeSet<String>),
}

impl SelectorFilter {
    /// Skips any name containing `init`, e.g. `initialize` and
    /// `initiateTransfer` but also `reinitialize`.
    pub fn contains_init() -> Self {
        Self::Contains(INIT.to_string())
    }

    /// Skips any name starting with `init`. `reinitialize` stays routable.
    pub fn starts_with_init() -> Self {
        Self::StartsWith(INIT.to_string())
    }

    pub fn deny<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Deny(names.into_iter().map(Into::into).collect())
    }

    /// Returns true if the named entry point must not be registered.
    pub fn excludes(&self, name: &str) -> bool {
        match self {
            Self::Contains(text) => name.contains(text.as_str()),
            Self::StartsWith(text) => name.starts_with(text.as_str()),
            Self::Deny(names) => names.contains(name),
        }
    }
}

/// Gets the selectors to register for a facet, in the order its functions
/// are given. Overloads each contribute their own selector and nothing is
/// deduplicated.
pub fn get_selectors<'a, I>(functions: I, filter: &SelectorFilter) -> Vec<Selector>
where
    I: IntoIterator<Item = &'a Function>,
{
    functions
        .into_iter()
        .filter_map(|function| {
            if filter.excludes(&function.name) {
                debug!(function = %function.signature(), "skipping initializer");
                None
            } else {
                Some(Selector::from(function))
            }
        })
        .collect()
}
