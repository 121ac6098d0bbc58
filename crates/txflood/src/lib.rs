#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]

mod constants;
pub use constants::{
    DEFAULT_ACCOUNT_COUNT, DEFAULT_CHAIN_ID, DEFAULT_FAUCET_KEY, DEFAULT_FUNDING_PAUSE,
    DEFAULT_GAS_PRICE, DEFAULT_MNEMONIC, DEFAULT_PROGRESS_INTERVAL, DEFAULT_RPC_URL,
    DEFAULT_SEND_PAUSE, DEFAULT_TRANSFER_GAS_LIMIT, DEFAULT_TRANSFER_VALUE, DEFAULT_TX_PER_ACCOUNT,
    DERIVATION_PATH_PREFIX,
};

mod error;
pub use error::LoadError;

mod config;
pub use config::RunConfig;

mod identity;
pub use identity::{Identity, IdentityPool, derivation_path};

mod nonce;
pub use nonce::NonceTracker;

mod tx;
pub use tx::{SignedTransfer, TransactionBuilder, TransferRequest};

mod aggregator;
pub use aggregator::{
    Collected, OrderingMode, ResultAggregator, ResultSink, Stats, SubmissionResult, Summary,
};

mod worker;
pub use worker::{TransferPlan, Worker, WorkerOutcome};

mod dispatcher;
pub use dispatcher::{Dispatcher, RunHandle, RunReport};

mod funding;
pub use funding::{Funder, FundingReport};

pub mod inspect;

pub mod rpc;
pub use rpc::{
    AlloyClient, BlockSummary, ChainClient, Dialer, HttpDialer, InMemoryChain, SubmittedTx,
    resolve_gas_price,
};
