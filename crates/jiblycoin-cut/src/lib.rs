//! Facet cuts for diamond dispatchers: selector extraction, the cut records
//! submitted to the dispatcher, and the protocol that installs them.

mod cut;
mod filter;
#[cfg(any(test, feature = "test-helpers"))]
pub mod memory;
mod registry;
mod selector;

pub use cut::{facet_cuts_token, FacetCut};
pub use filter::{get_selectors, SelectorFilter};
pub use registry::{
    register_facets, register_selectors_from, FacetRegistry, RegistrationError, RegistrationMode,
};
pub use selector::Selector;
