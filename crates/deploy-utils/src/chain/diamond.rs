/// This module contains the diamond deployment procedure: the NFT contract,
/// the diamond, its facets, the facet cuts, and the staking facet's NFT
/// reference.
use std::collections::BTreeMap;

use ethers::{abi::Token, signers::LocalWallet, types::Address};
use eyre::{Result, WrapErr};
use jiblycoin_addresses::DiamondAddresses;
use jiblycoin_cut::{get_selectors, register_facets, FacetCut, RegistrationMode, SelectorFilter};
use jiblycoin_wrappers::artifacts::ArtifactStore;
use serde::Deserialize;
use tracing::info;

use super::{
    deploy::{confirm, deploy_artifact},
    registry::DiamondRegistry,
    Chain,
};
use crate::constants::{
    FACET_NAMES, NFT_BASE_URI, NFT_CONTRACT, NFT_NAME, NFT_SYMBOL, STAKING_FACET,
};

/// The diamond designs that can be deployed. They differ in the dispatcher
/// contract, its constructor, the initializer filter, and how facets are
/// registered.
#[derive(Clone, Copy, Debug, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum DiamondTarget {
    /// `Jiblycoin(admin, initData)`, batched `setFacets`, skipping every
    /// function whose name contains "init".
    #[default]
    Jiblycoin,
    /// `JiblycoinDiamond(admin, initData)`, batched `setFacets`, skipping
    /// functions whose name starts with "init".
    JiblycoinDiamond,
    /// `JiblycoinDiamond()`, one `setFacet` per selector, skipping functions
    /// whose name starts with "init".
    PerSelector,
}

impl DiamondTarget {
    pub fn contract_name(&self) -> &'static str {
        match self {
            Self::Jiblycoin => "Jiblycoin",
            Self::JiblycoinDiamond | Self::PerSelector => "JiblycoinDiamond",
        }
    }

    pub fn constructor_args(&self, admin: Address) -> Vec<Token> {
        match self {
            Self::Jiblycoin | Self::JiblycoinDiamond => {
                vec![Token::Address(admin), Token::Bytes(vec![])]
            }
            Self::PerSelector => vec![],
        }
    }

    pub fn selector_filter(&self) -> SelectorFilter {
        match self {
            Self::Jiblycoin => SelectorFilter::contains_init(),
            Self::JiblycoinDiamond | Self::PerSelector => SelectorFilter::starts_with_init(),
        }
    }

    pub fn registration_mode(&self) -> RegistrationMode {
        match self {
            Self::Jiblycoin | Self::JiblycoinDiamond => RegistrationMode::Batched,
            Self::PerSelector => RegistrationMode::PerSelector,
        }
    }
}

impl Chain {
    /// Deploys the NFT contract, the diamond, and every facet, registers the
    /// facets with the diamond, and points the staking facet at the NFT
    /// contract. Every transaction is mined before the next one is sent.
    pub async fn deploy_diamond(
        &self,
        signer: LocalWallet,
        artifacts: &ArtifactStore,
        target: DiamondTarget,
        filter: &SelectorFilter,
    ) -> Result<DiamondAddresses> {
        let client = self.client(signer).await?;
        let deployer = client.address();
        info!(deployer = ?deployer, target = ?target, "deploying contracts");

        // Load every artifact before sending anything so that a missing
        // artifact can't leave a partial deployment behind.
        let nft_artifact = artifacts
            .load_deployable(NFT_CONTRACT)
            .wrap_err("failed to load artifacts")?;
        let diamond_artifact = artifacts
            .load_deployable(target.contract_name())
            .wrap_err("failed to load artifacts")?;
        let facet_artifacts = FACET_NAMES
            .iter()
            .map(|name| artifacts.load_deployable(name).map(|artifact| (*name, artifact)))
            .collect::<Result<Vec<_>, _>>()
            .wrap_err("failed to load artifacts")?;

        let nft = deploy_artifact(
            client.clone(),
            &nft_artifact,
            vec![
                Token::String(NFT_NAME.to_string()),
                Token::String(NFT_SYMBOL.to_string()),
                Token::String(NFT_BASE_URI.to_string()),
                Token::Address(deployer),
            ],
        )
        .await
        .wrap_err("failed to deploy the NFT contract")?;

        let diamond = deploy_artifact(
            client.clone(),
            &diamond_artifact,
            target.constructor_args(deployer),
        )
        .await
        .wrap_err("NFT contract deployed but the diamond deployment failed")?;

        let mut facets = Vec::with_capacity(facet_artifacts.len());
        for (name, artifact) in &facet_artifacts {
            let facet = deploy_artifact(client.clone(), artifact, vec![])
                .await
                .wrap_err_with(|| format!("failed to deploy facet {name}"))?;
            facets.push((*name, artifact, facet));
        }

        let cuts = facets
            .iter()
            .map(|(name, artifact, facet)| {
                let selectors = get_selectors(artifact.functions(), filter);
                info!(facet = name, selectors = ?selectors, "extracted selectors");
                FacetCut::new(facet.address(), selectors)
            })
            .collect::<Vec<_>>();

        let registry = DiamondRegistry::new(diamond);
        let registered = register_facets(&registry, &cuts, target.registration_mode())
            .await
            .wrap_err("facets deployed but registering them with the diamond failed")?;
        info!(registered, "facet wiring complete");

        if let Some((_, _, staking)) = facets.iter().find(|(name, _, _)| *name == STAKING_FACET) {
            let call = staking.method::<_, ()>("setNFTContractAddress", nft.address())?;
            confirm(call)
                .await
                .wrap_err("facets registered but wiring the NFT contract into the staking facet failed")?;
            info!(nft = ?nft.address(), "set the staking facet's NFT contract");
        }

        Ok(DiamondAddresses {
            deployer,
            nft: nft.address(),
            diamond: registry.address(),
            facets: facets
                .iter()
                .map(|(name, _, facet)| (name.to_string(), facet.address()))
                .collect::<BTreeMap<_, _>>(),
        })
    }
}
