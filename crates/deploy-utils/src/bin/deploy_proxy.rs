/// This script deploys the JiblyCoin token behind a transparent upgradeable
/// proxy. The initializer's parameters default to the launch configuration
/// and can be overridden with a JSON file at `JIBLYCOIN_PROXY_PARAMS`.
use std::process;

use deploy_utils::{
    chain::{Chain, ProxyParams},
    config::DeployConfig,
    logging,
    record::write_record,
};
use eyre::Result;
use jiblycoin_wrappers::artifacts::ArtifactStore;
use tracing::error;

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
    let params = match &config.jiblycoin_proxy_params {
        Some(path) => ProxyParams::from_file(path)?,
        None => ProxyParams::default(),
    };

    let chain = Chain::from_config(&config).await?;
    let addresses = chain.deploy_proxy(signer, &artifacts, &params).await?;

    if let Some(path) = &config.jiblycoin_deployments_path {
        write_record(path, &addresses)?;
    }

    Ok(())
}
