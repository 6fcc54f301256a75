use std::sync::Arc;

use ethers::{
    abi::Token,
    contract::{Contract, ContractCall, ContractFactory},
    signers::LocalWallet,
    types::{TransactionReceipt, U64},
};
use eyre::{eyre, Result};
use jiblycoin_wrappers::artifacts::Artifact;
use tracing::info;

use super::ChainClient;

/// The client every deployment runs through.
pub type DeployClient = ChainClient<LocalWallet>;

/// Deploys an artifact's creation bytecode with the given constructor
/// arguments and waits for the deployment to be mined. A reverted creation
/// is an error even when the node reports a contract address.
pub async fn deploy_artifact(
    client: Arc<DeployClient>,
    artifact: &Artifact,
    args: Vec<Token>,
) -> Result<Contract<DeployClient>> {
    let factory = ContractFactory::new(artifact.abi.clone(), artifact.bytecode.clone(), client);
    let (contract, receipt) = factory.deploy_tokens(args)?.send_with_receipt().await?;
    if receipt.status != Some(U64::from(1)) {
        return Err(eyre!(
            "deployment of {} reverted in transaction {:?}",
            artifact.name,
            receipt.transaction_hash
        ));
    }
    info!(name = %artifact.name, address = ?contract.address(), "deployed contract");
    Ok(contract)
}

/// Sends a transaction and waits for it to be mined. A reverted transaction
/// is an error.
pub async fn confirm(call: ContractCall<DeployClient, ()>) -> Result<TransactionReceipt> {
    let receipt = call
        .send()
        .await?
        .await?
        .ok_or_else(|| eyre!("transaction was dropped before it was mined"))?;
    if receipt.status != Some(U64::from(1)) {
        return Err(eyre!(
            "transaction {:?} reverted",
            receipt.transaction_hash
        ));
    }
    Ok(receipt)
}
