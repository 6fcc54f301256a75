use ethers::{abi::Token, types::Address};
use serde::Serialize;

use crate::Selector;

/// A registration record telling the diamond to route `selectors` to
/// `facet_address`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetCut {
    pub facet_address: Address,
    pub selectors: Vec<Selector>,
}

impl FacetCut {
    pub fn new(facet_address: Address, selectors: Vec<Selector>) -> Self {
        Self {
            facet_address,
            selectors,
        }
    }

    /// Encodes the cut as the `(address,bytes4[])` tuple the diamond expects.
    pub fn to_token(&self) -> Token {
        Token::Tuple(vec![
            Token::Address(self.facet_address),
            Token::Array(
                self.selectors
                    .iter()
                    .map(|selector| Token::FixedBytes(selector.as_bytes().to_vec()))
                    .collect(),
            ),
        ])
    }
}

/// Encodes a batch of cuts as a `(address,bytes4[])[]` argument.
pub fn facet_cuts_token(cuts: &[FacetCut]) -> Token {
    Token::Array(cuts.iter().map(FacetCut::to_token).collect())
}
