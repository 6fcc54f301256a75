/// This module deploys the upgradeable JiblyCoin token: the implementation
/// and a transparent proxy initialized with a `ProxyParams` bundle.
use std::{fs::File, path::Path, str::FromStr};

use ethers::{
    abi::{Function, ParamType, Token},
    middleware::Middleware,
    signers::LocalWallet,
    types::{Address, Bytes, H256, U256},
};
use eyre::{bail, Result, WrapErr};
use jiblycoin_addresses::ProxyAddresses;
use jiblycoin_wrappers::artifacts::ArtifactStore;
use serde::{Deserialize, Deserializer};
use tracing::info;

use super::{deploy::deploy_artifact, Chain};
use crate::constants::{
    DEFAULT_LOCKER, INITIALIZER, PROXY_ADMIN_SLOT, PROXY_CONTRACT, TOKEN_CONTRACT,
};

fn deserialize_u256<'de, D>(deserializer: D) -> Result<U256, D::Error>
where
    D: Deserializer<'de>,
{
    let dec_string: String = Deserialize::deserialize(deserializer)?;
    let u256 = U256::from_dec_str(&dec_string).map_err(serde::de::Error::custom)?;
    Ok(u256)
}

fn deserialize_u256_vec<'de, D>(deserializer: D) -> Result<Vec<U256>, D::Error>
where
    D: Deserializer<'de>,
{
    let dec_strings: Vec<String> = Deserialize::deserialize(deserializer)?;
    dec_strings
        .iter()
        .map(|dec_string| U256::from_dec_str(dec_string).map_err(serde::de::Error::custom))
        .collect()
}

fn ether(amount: u64) -> U256 {
    U256::from(amount) * U256::exp10(18)
}

/// The arguments of the token's initializer. Amounts are decimal strings in
/// JSON; any field that is left out keeps its default.
#[derive(Clone, Debug, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProxyParams {
    // token configuration
    pub name: String,
    pub symbol: String,
    // fee configuration (basis points)
    #[serde(deserialize_with = "deserialize_u256")]
    pub base_fee_percentage: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub redistribution_fee_percentage: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub burn_fee_percentage: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub buyback_fee_percentage: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub jibly_hood_fee_percentage: U256,
    // transaction configuration
    #[serde(deserialize_with = "deserialize_u256")]
    pub max_transaction_size: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub max_gas_limit: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub transaction_cooldown: U256,
    // governance configuration
    #[serde(deserialize_with = "deserialize_u256")]
    pub quorum_percentage: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub min_holding_duration: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub voting_reward_percentage: U256,
    // referral configuration
    #[serde(deserialize_with = "deserialize_u256_vec")]
    pub referral_rewards: Vec<U256>,
    #[serde(deserialize_with = "deserialize_u256")]
    pub referral_reward_cap: U256,
    // reward caps
    #[serde(deserialize_with = "deserialize_u256")]
    pub user_reward_cap: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub total_reward_cap: U256,
    #[serde(deserialize_with = "deserialize_u256")]
    pub monthly_reward_cap: U256,
    // upgrade configuration
    #[serde(deserialize_with = "deserialize_u256")]
    pub upgrade_delay: U256,
    pub locker: Address,
}

impl Default for ProxyParams {
    fn default() -> Self {
        Self {
            // token configuration
            name: "JiblyCoin".to_string(),
            symbol: "JIBLY".to_string(),
            // fee configuration
            base_fee_percentage: U256::from(100),
            redistribution_fee_percentage: U256::from(200),
            burn_fee_percentage: U256::from(100),
            buyback_fee_percentage: U256::from(100),
            jibly_hood_fee_percentage: U256::from(50),
            // transaction configuration
            max_transaction_size: ether(1_000),
            max_gas_limit: U256::from(300_000),
            transaction_cooldown: U256::from(60),
            // governance configuration
            quorum_percentage: U256::from(2_500),
            min_holding_duration: U256::from(60 * 60 * 24 * 7), // 1 week
            voting_reward_percentage: U256::from(500),
            // referral configuration
            referral_rewards: vec![U256::from(500), U256::from(300), U256::from(200)],
            referral_reward_cap: ether(1_000),
            // reward caps
            user_reward_cap: ether(10_000),
            total_reward_cap: ether(1_000_000),
            monthly_reward_cap: ether(83_333),
            // upgrade configuration
            upgrade_delay: U256::from(60 * 60 * 24), // 1 day
            locker: DEFAULT_LOCKER.parse().unwrap_or_default(),
        }
    }
}

impl ProxyParams {
    /// Reads a parameter bundle from a JSON file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let f = File::open(path).wrap_err_with(|| format!("failed to open {}", path.display()))?;
        serde_json::from_reader(f)
            .wrap_err_with(|| format!("failed to parse proxy parameters from {}", path.display()))
    }

    /// The initializer's arguments in declaration order. The governance
    /// values and reward caps are passed a second time as flat arguments,
    /// and the redistribution pool is the total reward cap.
    fn tokens(&self) -> Vec<Token> {
        let uint = Token::Uint;
        vec![
            Token::String(self.name.clone()),
            Token::String(self.symbol.clone()),
            Token::Tuple(vec![
                uint(self.base_fee_percentage),
                uint(self.redistribution_fee_percentage),
                uint(self.burn_fee_percentage),
                uint(self.buyback_fee_percentage),
                uint(self.jibly_hood_fee_percentage),
            ]),
            Token::Tuple(vec![
                uint(self.max_transaction_size),
                uint(self.max_gas_limit),
                uint(self.transaction_cooldown),
            ]),
            Token::Tuple(vec![
                uint(self.quorum_percentage),
                uint(self.min_holding_duration),
                uint(self.voting_reward_percentage),
            ]),
            Token::Tuple(vec![
                Token::Array(self.referral_rewards.iter().copied().map(uint).collect()),
                uint(self.referral_reward_cap),
            ]),
            Token::Tuple(vec![
                uint(self.user_reward_cap),
                uint(self.total_reward_cap),
                uint(self.monthly_reward_cap),
            ]),
            uint(self.quorum_percentage),
            uint(self.min_holding_duration),
            uint(self.voting_reward_percentage),
            uint(self.user_reward_cap),
            uint(self.total_reward_cap),
            uint(self.upgrade_delay),
            Token::Address(self.locker),
        ]
    }
}

/// Encodes a call to the token's initializer. The arguments are shaped to
/// the initializer's declared parameter types, so the referral rewards can
/// be declared as either a fixed or a dynamic array.
pub fn initialize_calldata(initializer: &Function, params: &ProxyParams) -> Result<Bytes> {
    let tokens = params.tokens();
    if initializer.inputs.len() != tokens.len() {
        bail!(
            "{} takes {} arguments but the parameter bundle has {}",
            initializer.signature(),
            initializer.inputs.len(),
            tokens.len()
        );
    }
    let tokens = initializer
        .inputs
        .iter()
        .zip(tokens)
        .map(|(param, token)| {
            conform(token, &param.kind).wrap_err_with(|| format!("bad value for {}", param.name))
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(initializer.encode_input(&tokens)?.into())
}

/// Reshapes a token to fit a parameter type.
fn conform(token: Token, kind: &ParamType) -> Result<Token> {
    Ok(match (token, kind) {
        (Token::Array(items) | Token::FixedArray(items), ParamType::FixedArray(inner, len)) => {
            if items.len() != *len {
                bail!("expected {len} items but got {}", items.len());
            }
            Token::FixedArray(
                items
                    .into_iter()
                    .map(|item| conform(item, inner))
                    .collect::<Result<_>>()?,
            )
        }
        (Token::Array(items) | Token::FixedArray(items), ParamType::Array(inner)) => Token::Array(
            items
                .into_iter()
                .map(|item| conform(item, inner))
                .collect::<Result<_>>()?,
        ),
        (Token::Tuple(items), ParamType::Tuple(kinds)) => {
            if items.len() != kinds.len() {
                bail!("expected {} fields but got {}", kinds.len(), items.len());
            }
            Token::Tuple(
                items
                    .into_iter()
                    .zip(kinds)
                    .map(|(item, kind)| conform(item, kind))
                    .collect::<Result<_>>()?,
            )
        }
        (Token::Uint(value), ParamType::Uint(bits)) => {
            if value.bits() > *bits {
                bail!("{value} does not fit in uint{bits}");
            }
            Token::Uint(value)
        }
        (token, kind) if token.type_check(kind) => token,
        (token, kind) => bail!("cannot encode {token} as {kind}"),
    })
}

impl Chain {
    /// Deploys the token implementation and a transparent upgradeable proxy
    /// that initializes it. The deployer owns the proxy.
    pub async fn deploy_proxy(
        &self,
        signer: LocalWallet,
        artifacts: &ArtifactStore,
        params: &ProxyParams,
    ) -> Result<ProxyAddresses> {
        let client = self.client(signer).await?;
        let owner = client.address();

        let implementation_artifact = artifacts
            .load_deployable(TOKEN_CONTRACT)
            .wrap_err("failed to load artifacts")?;
        let proxy_artifact = artifacts
            .load_deployable(PROXY_CONTRACT)
            .wrap_err("failed to load artifacts")?;
        let initializer = implementation_artifact
            .abi
            .function(INITIALIZER)
            .wrap_err_with(|| format!("{TOKEN_CONTRACT} has no initializer"))?;
        let calldata = initialize_calldata(initializer, params)?;

        info!(owner = ?owner, "deploying {} as an upgradeable proxy", params.name);
        let implementation = deploy_artifact(client.clone(), &implementation_artifact, vec![])
            .await
            .wrap_err("failed to deploy the implementation")?;
        let proxy = deploy_artifact(
            client.clone(),
            &proxy_artifact,
            vec![
                Token::Address(implementation.address()),
                Token::Address(owner),
                Token::Bytes(calldata.to_vec()),
            ],
        )
        .await
        .wrap_err("implementation deployed but the proxy deployment failed")?;

        // The admin isn't returned by the constructor, so read it from the
        // EIP-1967 admin slot.
        let admin_slot = H256::from_str(PROXY_ADMIN_SLOT)?;
        let admin_word = client
            .get_storage_at(proxy.address(), admin_slot, None)
            .await?;
        let proxy_admin = Address::from_slice(&admin_word.as_bytes()[12..]);

        let addresses = ProxyAddresses {
            deployer: owner,
            implementation: implementation.address(),
            proxy: proxy.address(),
            proxy_admin,
        };
        for (label, address) in [
            ("implementation", addresses.implementation),
            ("proxy", addresses.proxy),
            ("proxy admin", addresses.proxy_admin),
        ] {
            if !self.is_valid_address(address).await? {
                bail!("{label} address {address:?} holds no code");
            }
        }
        info!(
            proxy = ?addresses.proxy,
            implementation = ?addresses.implementation,
            proxy_admin = ?addresses.proxy_admin,
            "{} deployed", params.name
        );

        Ok(addresses)
    }
}
