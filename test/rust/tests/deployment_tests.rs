//! End-to-end deployments against an anvil node. These need the compiled
//! contract artifacts in `JIBLYCOIN_ARTIFACTS` (or `./artifacts`), so they
//! are ignored by default.

use std::sync::Arc;

use deploy_utils::{
    chain::{Chain, ChainClient, DiamondTarget, ProxyParams},
    constants::{
        ANVIL_DEPLOYER, ARTIFACTS_DIR, FACET_NAMES, MAYBE_ETHEREUM_URL, NFT_NAME, NFT_SYMBOL,
    },
};
use ethers::signers::LocalWallet;
use eyre::Result;
use jiblycoin_addresses::DiamondAddresses;
use jiblycoin_cut::{get_selectors, Selector};
use jiblycoin_wrappers::{
    artifacts::ArtifactStore,
    wrappers::{IDiamondLoupe, IERC721Metadata},
};
use tracing_test::traced_test;

async fn deploy(
    chain: &Chain,
    target: DiamondTarget,
) -> Result<(DiamondAddresses, Arc<ChainClient<LocalWallet>>)> {
    let artifacts = ArtifactStore::new(ARTIFACTS_DIR.as_str());
    let addresses = chain
        .deploy_diamond(
            ANVIL_DEPLOYER.clone(),
            &artifacts,
            target,
            &target.selector_filter(),
        )
        .await?;
    let client = chain.client(ANVIL_DEPLOYER.clone()).await?;
    Ok((addresses, client))
}

#[ignore]
#[tokio::test]
#[traced_test]
async fn test_diamond_deployment() -> Result<()> {
    let chain = Chain::connect(MAYBE_ETHEREUM_URL.clone(), None).await?;
    let (addresses, client) = deploy(&chain, DiamondTarget::JiblycoinDiamond).await?;

    // The NFT contract was constructed with the collection's metadata.
    let nft = IERC721Metadata::new(addresses.nft, client.clone());
    assert_eq!(nft.name().call().await?, NFT_NAME);
    assert_eq!(nft.symbol().call().await?, NFT_SYMBOL);

    assert!(chain.is_valid_address(addresses.nft).await?);
    assert!(chain.is_valid_address(addresses.diamond).await?);
    assert_eq!(addresses.facets.len(), FACET_NAMES.len());
    for name in FACET_NAMES {
        let facet = addresses.facet(name).unwrap();
        assert!(chain.is_valid_address(facet).await?, "{name} has no code");
    }

    // Every extracted selector routes to the facet that declared it and the
    // initializer routes nowhere.
    let artifacts = ArtifactStore::new(ARTIFACTS_DIR.as_str());
    let loupe = IDiamondLoupe::new(addresses.diamond, client.clone());
    let filter = DiamondTarget::JiblycoinDiamond.selector_filter();
    for name in FACET_NAMES {
        let artifact = artifacts.load(name)?;
        for selector in get_selectors(artifact.functions(), &filter) {
            assert_eq!(
                loupe.facet_address(selector.0).call().await?,
                addresses.facet(name).unwrap(),
                "{name} selector {selector} is not routed"
            );
        }
    }
    let initialize = Selector::from_signature("initialize()");
    assert!(loupe.facet_address(initialize.0).call().await?.is_zero());

    Ok(())
}

#[ignore]
#[tokio::test]
#[traced_test]
async fn test_two_runs_deploy_two_diamonds() -> Result<()> {
    let chain = Chain::connect(MAYBE_ETHEREUM_URL.clone(), None).await?;
    let (first, _) = deploy(&chain, DiamondTarget::Jiblycoin).await?;
    let (second, _) = deploy(&chain, DiamondTarget::Jiblycoin).await?;
    assert_ne!(first.diamond, second.diamond);
    assert_ne!(first.nft, second.nft);
    assert_eq!(first.deployer, second.deployer);
    Ok(())
}

#[ignore]
#[tokio::test]
#[traced_test]
async fn test_per_selector_deployment() -> Result<()> {
    let chain = Chain::connect(MAYBE_ETHEREUM_URL.clone(), None).await?;
    let (addresses, _) = deploy(&chain, DiamondTarget::PerSelector).await?;
    assert!(chain.is_valid_address(addresses.diamond).await?);
    Ok(())
}

#[ignore]
#[tokio::test]
#[traced_test]
async fn test_proxy_deployment() -> Result<()> {
    let chain = Chain::connect(MAYBE_ETHEREUM_URL.clone(), None).await?;
    let artifacts = ArtifactStore::new(ARTIFACTS_DIR.as_str());
    let params = ProxyParams::default();
    let addresses = chain
        .deploy_proxy(ANVIL_DEPLOYER.clone(), &artifacts, &params)
        .await?;

    assert!(chain.is_valid_address(addresses.implementation).await?);
    assert!(chain.is_valid_address(addresses.proxy).await?);
    assert!(chain.is_valid_address(addresses.proxy_admin).await?);
    assert_ne!(addresses.proxy, addresses.implementation);

    // The proxy was initialized through `initialize`, so it reports the
    // token's metadata.
    let client = chain.client(ANVIL_DEPLOYER.clone()).await?;
    let token = IERC721Metadata::new(addresses.proxy, client);
    assert_eq!(token.name().call().await?, params.name);
    assert_eq!(token.symbol().call().await?, params.symbol);

    Ok(())
}
