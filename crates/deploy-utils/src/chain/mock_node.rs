//! A JSON-RPC node that answers just enough of the Ethereum API to drive the
//! deployment client. Every transaction is mined immediately and every
//! receipt carries a fresh contract address.

use std::{
    net::SocketAddr,
    sync::{Arc, Mutex},
};

use axum::{extract::State, routing::post, Json, Router};
use ethers::types::{Address, Bytes, H256};
use eyre::Result;
use jiblycoin_cut::Selector;
use serde_json::{json, Value};

/// How the node treats the transactions it is sent.
#[derive(Clone, Copy, Debug)]
pub enum Behavior {
    /// Every transaction succeeds.
    Mine,
    /// Every transaction is mined with a failed status.
    Revert,
    /// Gas estimation fails for every transaction.
    RejectEstimates,
    /// Gas estimation fails for calls to the given function.
    RejectCalls(Selector),
}

/// A transaction the node was asked to estimate.
#[derive(Clone, Debug)]
pub struct Estimate {
    pub to: Option<Address>,
    pub data: Bytes,
}

#[derive(Debug)]
struct NodeState {
    behavior: Behavior,
    methods: Mutex<Vec<String>>,
    estimates: Mutex<Vec<Estimate>>,
    mined: Mutex<u64>,
}

pub struct MockNode {
    url: String,
    state: Arc<NodeState>,
}

impl MockNode {
    pub async fn spawn(behavior: Behavior) -> Result<Self> {
        let state = Arc::new(NodeState {
            behavior,
            methods: Mutex::default(),
            estimates: Mutex::default(),
            mined: Mutex::default(),
        });
        let router = Router::new()
            .route("/", post(handle))
            .with_state(state.clone());
        let server = axum::Server::try_bind(&SocketAddr::from(([127, 0, 0, 1], 0)))?
            .serve(router.into_make_service());
        let url = format!("http://{}", server.local_addr());
        tokio::spawn(server);
        Ok(Self { url, state })
    }

    pub fn url(&self) -> String {
        self.url.clone()
    }

    /// The number of requests made for an RPC method.
    pub fn calls(&self, method: &str) -> usize {
        self.state
            .methods
            .lock()
            .map(|methods| methods.iter().filter(|m| *m == method).count())
            .unwrap_or_default()
    }

    /// The transactions that were estimated, in order.
    pub fn estimates(&self) -> Vec<Estimate> {
        self.state
            .estimates
            .lock()
            .map(|estimates| estimates.clone())
            .unwrap_or_default()
    }

    /// The address of the contract created by the n-th mined transaction.
    pub fn contract_address(n: u64) -> Address {
        Address::from_low_u64_be(0x1000 + n)
    }
}

async fn handle(State(state): State<Arc<NodeState>>, Json(request): Json<Value>) -> Json<Value> {
    let id = request["id"].clone();
    let method = request["method"].as_str().unwrap_or_default().to_string();
    let params = request["params"].clone();
    if let Ok(mut methods) = state.methods.lock() {
        methods.push(method.clone());
    }

    let response = match respond(&state, &method, &params) {
        Ok(result) => json!({ "jsonrpc": "2.0", "id": id, "result": result }),
        Err((code, message)) => json!({
            "jsonrpc": "2.0",
            "id": id,
            "error": { "code": code, "message": message },
        }),
    };
    Json(response)
}

fn respond(state: &NodeState, method: &str, params: &Value) -> Result<Value, (i64, String)> {
    let mined = state.mined.lock().map(|mined| *mined).unwrap_or_default();
    match method {
        "web3_clientVersion" => Ok(json!("mock/v0")),
        "eth_chainId" => Ok(json!("0x7a69")),
        "eth_blockNumber" => Ok(json!(format!("{:#x}", mined + 1))),
        "eth_gasPrice" => Ok(json!("0x1")),
        "eth_getTransactionCount" => Ok(json!(format!("{mined:#x}"))),
        "eth_getBlockByNumber" => Ok(block()),
        "eth_feeHistory" => Ok(json!({
            "oldestBlock": "0x1",
            "baseFeePerGas": ["0x1", "0x1"],
            "gasUsedRatio": [0.5],
            "reward": [["0x1"]],
        })),
        "eth_estimateGas" => {
            let tx = &params[0];
            let estimate = Estimate {
                to: serde_json::from_value(tx["to"].clone()).unwrap_or_default(),
                data: serde_json::from_value(tx["data"].clone())
                    .or_else(|_| serde_json::from_value(tx["input"].clone()))
                    .unwrap_or_default(),
            };
            let rejected = match state.behavior {
                Behavior::RejectEstimates => true,
                Behavior::RejectCalls(selector) => {
                    estimate.to.is_some() && estimate.data.starts_with(selector.as_bytes())
                }
                Behavior::Mine | Behavior::Revert => false,
            };
            if let Ok(mut estimates) = state.estimates.lock() {
                estimates.push(estimate);
            }
            if rejected {
                Err((3, "execution reverted".to_string()))
            } else {
                Ok(json!("0x100000"))
            }
        }
        "eth_sendRawTransaction" => {
            let mut mined = state
                .mined
                .lock()
                .map_err(|err| (-32603, err.to_string()))?;
            *mined += 1;
            Ok(json!(H256::from_low_u64_be(*mined)))
        }
        "eth_getTransactionByHash" => Ok(transaction(&params[0])),
        "eth_getTransactionReceipt" => Ok(receipt(&params[0], state.behavior)),
        _ => Err((-32601, format!("method {method} not found"))),
    }
}

fn bloom() -> String {
    format!("0x{}", "00".repeat(256))
}

fn block() -> Value {
    json!({
        "hash": H256::from_low_u64_be(1),
        "parentHash": H256::zero(),
        "sha3Uncles": H256::zero(),
        "miner": Address::zero(),
        "stateRoot": H256::zero(),
        "transactionsRoot": H256::zero(),
        "receiptsRoot": H256::zero(),
        "number": "0x1",
        "gasUsed": "0x0",
        "gasLimit": "0x1c9c380",
        "extraData": "0x",
        "logsBloom": bloom(),
        "timestamp": "0x1",
        "difficulty": "0x0",
        "totalDifficulty": "0x0",
        "uncles": [],
        "transactions": [],
        "size": "0x0",
        "mixHash": H256::zero(),
        "nonce": "0x0000000000000000",
        "baseFeePerGas": "0x1",
    })
}

fn transaction(hash: &Value) -> Value {
    json!({
        "hash": hash,
        "nonce": "0x0",
        "blockHash": H256::from_low_u64_be(1),
        "blockNumber": "0x1",
        "transactionIndex": "0x0",
        "from": Address::zero(),
        "to": null,
        "value": "0x0",
        "gasPrice": "0x1",
        "gas": "0x100000",
        "input": "0x",
        "v": "0x1",
        "r": "0x1",
        "s": "0x1",
        "type": "0x2",
        "chainId": "0x7a69",
        "maxFeePerGas": "0x2",
        "maxPriorityFeePerGas": "0x1",
        "accessList": [],
    })
}

fn receipt(hash: &Value, behavior: Behavior) -> Value {
    let n = serde_json::from_value::<H256>(hash.clone())
        .map(|hash| hash.to_low_u64_be())
        .unwrap_or_default();
    let status = match behavior {
        Behavior::Revert => "0x0",
        _ => "0x1",
    };
    json!({
        "transactionHash": hash,
        "transactionIndex": "0x0",
        "blockHash": H256::from_low_u64_be(1),
        "blockNumber": "0x1",
        "from": Address::zero(),
        "to": null,
        "cumulativeGasUsed": "0x100",
        "gasUsed": "0x100",
        "contractAddress": MockNode::contract_address(n),
        "logs": [],
        "status": status,
        "logsBloom": bloom(),
        "type": "0x2",
        "effectiveGasPrice": "0x1",
    })
}
