//! An in-memory diamond that follows the same routing rules as the on-chain
//! dispatcher. Used to exercise the registration protocol without a node.

use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Mutex,
    },
};

use async_trait::async_trait;
use ethers::types::Address;
use eyre::{eyre, Result};

use crate::{FacetCut, FacetRegistry, Selector};

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum RouteError {
    #[error("no route for selector {0}")]
    NoRoute(Selector),
}

#[derive(Debug, Default)]
pub struct MemoryDiamond {
    routes: Mutex<HashMap<Selector, Address>>,
    attempts: AtomicUsize,
    confirmed: AtomicUsize,
    fail_on: Option<usize>,
}

impl MemoryDiamond {
    pub fn new() -> Self {
        Self::default()
    }

    /// A diamond whose `n`th registration transaction (counting from 1) is
    /// rejected.
    pub fn failing_on(n: usize) -> Self {
        Self {
            fail_on: Some(n),
            ..Self::default()
        }
    }

    /// A diamond that already holds the given routes.
    pub fn with_routes(routes: HashMap<Selector, Address>) -> Self {
        Self {
            routes: Mutex::new(routes),
            ..Self::default()
        }
    }

    /// Resolves the facet a call with this selector would be forwarded to.
    pub fn route(&self, selector: Selector) -> Result<Address, RouteError> {
        self.lock()
            .get(&selector)
            .copied()
            .ok_or(RouteError::NoRoute(selector))
    }

    pub fn routes(&self) -> HashMap<Selector, Address> {
        self.lock().clone()
    }

    /// The number of registration transactions that were confirmed.
    pub fn transactions(&self) -> usize {
        self.confirmed.load(Ordering::SeqCst)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<Selector, Address>> {
        // A poisoned lock only means a test panicked mid-write.
        self.routes.lock().unwrap_or_else(|err| err.into_inner())
    }

    /// Counts an attempted transaction and rejects it if it is the one set
    /// up to fail. Rejected transactions change nothing.
    fn attempt(&self) -> Result<()> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        if Some(attempt) == self.fail_on {
            return Err(eyre!("transaction {attempt} reverted"));
        }
        self.confirmed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl FacetRegistry for MemoryDiamond {
    async fn set_facets(&self, cuts: &[FacetCut]) -> Result<()> {
        self.attempt()?;
        let mut routes = self.lock();
        for cut in cuts {
            for selector in &cut.selectors {
                routes.insert(*selector, cut.facet_address);
            }
        }
        Ok(())
    }

    async fn set_facet(&self, selector: Selector, facet: Address) -> Result<()> {
        self.attempt()?;
        self.lock().insert(selector, facet);
        Ok(())
    }
}
