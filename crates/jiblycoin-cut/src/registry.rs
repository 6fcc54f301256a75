use std::error::Error as StdError;

use async_trait::async_trait;
use ethers::types::Address;
use eyre::Result;
use serde::Deserialize;
use tracing::info;

use crate::{FacetCut, Selector};

type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// The dispatcher side of facet registration. Each call must block until the
/// registration transaction has been confirmed.
#[async_trait]
pub trait FacetRegistry: Send + Sync {
    /// Installs every cut in a single transaction.
    async fn set_facets(&self, cuts: &[FacetCut]) -> Result<()>;

    /// Routes a single selector to a facet.
    async fn set_facet(&self, selector: Selector, facet: Address) -> Result<()>;
}

/// How facet cuts are submitted to the dispatcher.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RegistrationMode {
    /// One transaction carrying every cut. Either all selectors are routed
    /// or none are.
    Batched,
    /// One transaction per selector. A failure leaves the selectors that
    /// were confirmed before it in place.
    PerSelector,
}

#[derive(Debug, thiserror::Error)]
pub enum RegistrationError {
    #[error("batched registration of {total} selectors failed, none were registered")]
    Batch {
        total: usize,
        #[source]
        source: BoxError,
    },
    #[error(
        "registration stopped after {registered} of {total} selectors; \
         resume from selector {next} for facet {facet:#x}"
    )]
    Partial {
        registered: usize,
        total: usize,
        next: Selector,
        facet: Address,
        #[source]
        source: BoxError,
    },
}

impl RegistrationError {
    /// The number of selectors routed before the failure.
    pub fn registered(&self) -> usize {
        match self {
            Self::Batch { .. } => 0,
            Self::Partial { registered, .. } => *registered,
        }
    }
}

/// Installs the cuts into the dispatcher and returns the number of selectors
/// that were routed.
pub async fn register_facets<R>(
    registry: &R,
    cuts: &[FacetCut],
    mode: RegistrationMode,
) -> Result<usize, RegistrationError>
where
    R: FacetRegistry + ?Sized,
{
    match mode {
        RegistrationMode::Batched => {
            let total = selector_count(cuts);
            registry
                .set_facets(cuts)
                .await
                .map_err(|err| RegistrationError::Batch {
                    total,
                    source: err.into(),
                })?;
            info!(facets = cuts.len(), selectors = total, "facet cuts installed");
            Ok(total)
        }
        RegistrationMode::PerSelector => register_selectors_from(registry, cuts, 0).await,
    }
}

/// Routes selectors one transaction at a time, skipping the first `start`
/// selectors of the flattened cut list. Passing the `registered` count of a
/// previous [`RegistrationError::Partial`] resumes an interrupted run.
pub async fn register_selectors_from<R>(
    registry: &R,
    cuts: &[FacetCut],
    start: usize,
) -> Result<usize, RegistrationError>
where
    R: FacetRegistry + ?Sized,
{
    let total = selector_count(cuts);
    let pending = cuts
        .iter()
        .flat_map(|cut| {
            cut.selectors
                .iter()
                .map(move |selector| (*selector, cut.facet_address))
        })
        .enumerate()
        .skip(start);
    for (index, (selector, facet)) in pending {
        registry
            .set_facet(selector, facet)
            .await
            .map_err(|err| RegistrationError::Partial {
                registered: index,
                total,
                next: selector,
                facet,
                source: err.into(),
            })?;
        info!(%selector, facet = ?facet, "selector registered");
    }

    Ok(total)
}

fn selector_count(cuts: &[FacetCut]) -> usize {
    cuts.iter().map(|cut| cut.selectors.len()).sum()
}
