use ethers::contract::abigen;

abigen!(
    IERC721Metadata,
    r#"[
        function name() external view returns (string)
        function symbol() external view returns (string)
    ]"#,
);

abigen!(
    IDiamondLoupe,
    r#"[
        function facetAddress(bytes4 selector) external view returns (address)
    ]"#,
);
