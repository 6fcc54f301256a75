/// This script deploys the Jiblycoin diamond: the NFT contract, the diamond
/// selected by `JIBLYCOIN_DIAMOND_TARGET`, and these facets:
///
/// - JiblycoinCoreFacet
/// - JiblycoinGovernanceFacet
/// - JiblycoinLoyaltyFacet
/// - JiblycoinStakingFacet
/// - JiblycoinLockEligibilityFacet
/// - JiblycoinUpgradeFacet
/// - JiblycoinBurnFacet
/// - JiblycoinBridgeFacet
///
/// After registering the facets with the diamond, the script points the
/// staking facet at the NFT contract.
use std::process;

use deploy_utils::{chain::Chain, config::DeployConfig, logging, record::write_record};
use eyre::Result;
use jiblycoin_wrappers::artifacts::ArtifactStore;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    logging::init();
    if let Err(err) = run().await {
        error!("Deployment error: {err:?}");
        process::exit(1);
    }
}

async fn run() -> Result<()> {
    let config = DeployConfig::from_env()?;
    config.validate()?;
    let signer = config.signer()?;
    let artifacts = ArtifactStore::new(&config.jiblycoin_artifacts);

    let chain = Chain::from_config(&config).await?;
    let addresses = chain
        .deploy_diamond(
            signer,
            &artifacts,
            config.jiblycoin_diamond_target,
            &config.selector_filter(),
        )
        .await?;

    if let Some(path) = &config.jiblycoin_deployments_path {
        write_record(path, &addresses)?;
    }
    info!(diamond = ?addresses.diamond, "deployment and facet wiring complete");

    Ok(())
}
