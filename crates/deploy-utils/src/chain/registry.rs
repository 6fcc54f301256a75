use async_trait::async_trait;
use ethers::{abi::Token, contract::Contract, types::Address};
use eyre::Result;
use jiblycoin_cut::{facet_cuts_token, FacetCut, FacetRegistry, Selector};

use super::deploy::{confirm, DeployClient};

/// A deployed diamond, driven through the ABI of its own artifact.
pub struct DiamondRegistry {
    diamond: Contract<DeployClient>,
}

impl DiamondRegistry {
    pub fn new(diamond: Contract<DeployClient>) -> Self {
        Self { diamond }
    }

    pub fn address(&self) -> Address {
        self.diamond.address()
    }
}

#[async_trait]
impl FacetRegistry for DiamondRegistry {
    async fn set_facets(&self, cuts: &[FacetCut]) -> Result<()> {
        let call = self
            .diamond
            .method::<_, ()>("setFacets", facet_cuts_token(cuts))?;
        confirm(call).await?;
        Ok(())
    }

    async fn set_facet(&self, selector: Selector, facet: Address) -> Result<()> {
        let call = self.diamond.method::<_, ()>(
            "setFacet",
            (
                Token::FixedBytes(selector.as_bytes().to_vec()),
                Token::Address(facet),
            ),
        )?;
        confirm(call).await?;
        Ok(())
    }
}
