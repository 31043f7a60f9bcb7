use alloy_network::{EthereumWallet, TransactionBuilder};
use alloy_primitives::{Address, B256, U256};
use alloy_provider::{DynProvider, Provider, ProviderBuilder};
use alloy_rpc_types_eth::TransactionRequest;
use alloy_signer_local::PrivateKeySigner;
use async_trait::async_trait;
use thiserror::Error;

// Gas settings from the original client: generous fixed limit, zero price
// (the target networks do not charge for these transactions).
const GAS_LIMIT: u64 = 100_000;
const GAS_PRICE: u128 = 0;

/// Failure of a single submission attempt. Always delivered as a value to
/// the driver loop, never unwound past it.
#[derive(Debug, Error)]
pub enum SubmitError {
    /// Transport failure or RPC-level rejection from the endpoint.
    #[error(transparent)]
    Rpc(#[from] alloy_transport::TransportError),

    /// Submission failure without an underlying transport error.
    #[error("{0}")]
    Other(String),
}

/// One transaction submission. Implementations perform exactly one network
/// round trip; `Ok` means the endpoint accepted the transaction for
/// broadcast, not that it was included in a block.
#[async_trait]
pub trait TxnSubmitter: Send + Sync + 'static {
    async fn submit(&self) -> Result<B256, SubmitError>;
}

/// Submits zero-value self-transfers through an alloy HTTP provider. The
/// wallet filler signs each transaction and fills nonce and chain id on the
/// fly, so attempts carry no local state between them.
pub struct RpcSubmitter {
    provider: DynProvider,
    from: Address,
}

impl RpcSubmitter {
    pub fn connect(endpoint: &str, signer: PrivateKeySigner) -> Result<Self, SubmitError> {
        let from = signer.address();
        let url: reqwest::Url = endpoint
            .parse()
            .map_err(|err| SubmitError::Other(format!("invalid endpoint URL: {err}")))?;
        let provider = ProviderBuilder::new()
            .wallet(EthereumWallet::from(signer))
            .connect_http(url)
            .erased();
        Ok(Self { provider, from })
    }
}

#[async_trait]
impl TxnSubmitter for RpcSubmitter {
    async fn submit(&self) -> Result<B256, SubmitError> {
        let request = TransactionRequest::default()
            .with_from(self.from)
            .with_to(self.from)
            .with_value(U256::ZERO)
            .with_gas_limit(GAS_LIMIT)
            .with_gas_price(GAS_PRICE);

        let pending = self.provider.send_transaction(request).await?;
        Ok(*pending.tx_hash())
    }
}
