mod deploy;
mod diamond;
#[cfg(test)]
mod mock_node;
mod proxy;
mod registry;

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
pub use deploy::{confirm, deploy_artifact, DeployClient};
pub use diamond::DiamondTarget;
use ethers::{
    core::utils::Anvil,
    middleware::{signer::SignerMiddlewareError, MiddlewareError, SignerMiddleware},
    providers::{
        Http, HttpRateLimitRetryPolicy, Middleware, PendingTransaction, Provider, RetryClient,
        RetryClientBuilder,
    },
    signers::Signer,
    types::{transaction::eip2718::TypedTransaction, Address, BlockId},
    utils::AnvilInstance,
};
use eyre::Result;
pub use proxy::{initialize_calldata, ProxyParams};
pub use registry::DiamondRegistry;
use tracing::info;

use crate::config::{DeployConfig, Fork, Network};

type ChainClientProvider = Arc<RetryClient<Http>>;

type ChainClientInner<S> = SignerMiddleware<Provider<ChainClientProvider>, S>;

#[derive(Debug)]
pub struct ChainClient<S: Signer + 'static> {
    inner: ChainClientInner<S>,
    address: Address,
}

/// A client with a provider stack that includes a rate limit retry policy and
/// a signer. The signer fills each nonce from the node. There is no nonce
/// manager since it resubmits a transaction once whenever sending fails.
impl<S: Signer + 'static> ChainClient<S> {
    pub async fn new(provider: Provider<Http>, signer: S) -> Result<Self> {
        // Retry requests that the node rejected for rate limiting or that
        // timed out. These retries resend the same request body.
        let provider = RetryClientBuilder::default()
            .rate_limit_retries(10)
            .timeout_retries(3)
            .initial_backoff(Duration::from_millis(500))
            .build(
                provider.as_ref().clone(),
                Box::<HttpRateLimitRetryPolicy>::default(),
            );
        let provider = Provider::new(Arc::new(provider)).interval(Duration::from_millis(100));

        let inner = SignerMiddleware::new_with_provider_chain(provider, signer).await?;
        let address = inner.address();

        Ok(Self { inner, address })
    }

    /// Gets the client's address.
    pub fn address(&self) -> Address {
        self.address
    }
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl<S: Signer + 'static> Middleware for ChainClient<S> {
    // NOTE: This is a pass-through middleware implementation, so we just use
    // the error from the top of the middleware stack.
    type Error = SignerMiddlewareError<Self::Inner, S>;

    type Provider = ChainClientProvider;
    type Inner = ChainClientInner<S>;

    fn inner(&self) -> &Self::Inner {
        &self.inner
    }

    async fn send_transaction<T: Into<TypedTransaction> + Send + Sync>(
        &self,
        tx: T,
        block: Option<BlockId>,
    ) -> Result<PendingTransaction<'_, Self::Provider>, Self::Error> {
        Ok(self
            .inner
            .send_transaction(tx, block)
            .await
            .map_err(MiddlewareError::from_err)?)
    }
}

/// An abstraction over the chain being deployed to. It either wraps a remote
/// node or owns a local anvil node that lives as long as the `Chain`.
pub struct Chain {
    provider: Provider<Http>,
    chain_id: u64,
    _maybe_anvil: Option<AnvilInstance>,
}

impl Chain {
    /// Constructs a new `Chain` from an Ethereum RPC URL. If the RPC URL is
    /// excluded, a local anvil node is spun up, forking `maybe_fork` if given.
    pub async fn connect(maybe_rpc_url: Option<String>, maybe_fork: Option<Fork>) -> Result<Self> {
        let (provider, maybe_anvil) = if let Some(rpc_url) = maybe_rpc_url {
            let provider =
                Provider::<Http>::try_from(rpc_url)?.interval(Duration::from_millis(100));
            (provider, None)
        } else {
            let anvil = match maybe_fork {
                Some(fork) => {
                    info!(url = %fork.url, block = fork.block_number, "forking chain");
                    Anvil::new()
                        .chain_id(Network::Hardhat.chain_id())
                        .fork(fork.url)
                        .fork_block_number(fork.block_number)
                        .spawn()
                }
                None => Anvil::new().chain_id(Network::Hardhat.chain_id()).spawn(),
            };
            let provider =
                Provider::<Http>::try_from(anvil.endpoint())?.interval(Duration::from_millis(10));
            (provider, Some(anvil))
        };
        let client_version = provider.client_version().await?;
        let chain_id = provider.get_chainid().await?.as_u64();
        info!(%client_version, chain_id, "connected to chain");
        Ok(Self {
            provider,
            chain_id,
            _maybe_anvil: maybe_anvil,
        })
    }

    /// Connects to the chain a configuration points at and checks that the
    /// node serves the configured network.
    pub async fn from_config(config: &DeployConfig) -> Result<Self> {
        let chain = Self::connect(config.rpc_url(), config.fork()).await?;
        config.check_chain_id(chain.chain_id)?;
        Ok(chain)
    }
}

impl Chain {
    /// A provider that can access the chain.
    pub fn provider(&self) -> Provider<Http> {
        self.provider.clone()
    }

    /// A client that can access the chain.
    pub async fn client<S: Signer + 'static>(&self, signer: S) -> Result<Arc<ChainClient<S>>> {
        Ok(Arc::new(ChainClient::new(self.provider(), signer).await?))
    }

    /// Checks that an address is non-zero and holds contract code.
    pub async fn is_valid_address(&self, address: Address) -> Result<bool> {
        if address.is_zero() {
            return Ok(false);
        }
        let code = self.provider.get_code(address, None).await?;
        Ok(!code.is_empty())
    }
}
