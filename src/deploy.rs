use std::{collections::HashMap, path::Path, str::FromStr};

use alloy::{
    json_abi::ContractObject,
    network::{EthereumWallet, TransactionBuilder},
    primitives::{Address, Bytes},
    providers::{Provider, ProviderBuilder},
    rpc::types::TransactionRequest,
    signers::local::PrivateKeySigner,
    sol_types::SolValue,
};
use eyre::{OptionExt, WrapErr};
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::info;

use crate::error::ScriptError;

/// Facets this repo knows how to deploy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum Facet {
    #[value(name = "AccessManagerFacet")]
    AccessManagerFacet,
    #[value(name = "XYFacet")]
    XYFacet,
}

// config/xy.json
#[derive(Debug, Deserialize)]
struct XyConfig {
    config: HashMap<String, HashMap<String, Value>>,
}

impl Facet {
    /// Constructor arguments for `network`, as written in the config files.
    pub async fn constructor_args(
        &self,
        network: &str,
        xy_config: &Path,
    ) -> eyre::Result<Vec<String>> {
        match self {
            Facet::AccessManagerFacet => Ok(Vec::new()),
            Facet::XYFacet => {
                let raw = tokio::fs::read_to_string(xy_config)
                    .await
                    .wrap_err_with(|| format!("failed to read {}", xy_config.display()))?;
                let parsed: XyConfig = serde_json::from_str(&raw)
                    .wrap_err_with(|| format!("failed to parse {}", xy_config.display()))?;
                let swapper = parsed
                    .config
                    .get(network)
                    .and_then(|c| c.get("XSwapper"))
                    .and_then(Value::as_str)
                    .ok_or_else(|| ScriptError::UnknownNetwork {
                        network: network.to_owned(),
                        key: "XSwapper",
                    })?;
                Ok(vec![swapper.to_owned()])
            }
        }
    }
}

/// Creation bytecode of a compiled artifact (Hardhat or Foundry layout).
pub async fn load_bytecode(artifact: &Path) -> eyre::Result<Bytes> {
    let raw = tokio::fs::read_to_string(artifact)
        .await
        .wrap_err_with(|| format!("failed to read {}", artifact.display()))?;
    let object: ContractObject = serde_json::from_str(&raw)
        .wrap_err_with(|| format!("failed to parse artifact {}", artifact.display()))?;
    object
        .bytecode
        .filter(|code| !code.is_empty())
        .ok_or_eyre("artifact has no creation bytecode")
}

/// Appends the address arguments to `bytecode`, one 32-byte word each.
pub fn init_code(bytecode: &Bytes, args: &[String]) -> eyre::Result<Bytes> {
    let mut code = bytecode.to_vec();
    for arg in args {
        let address = Address::from_str(arg)
            .wrap_err_with(|| format!("constructor argument `{arg}` is not an address"))?;
        code.extend(address.abi_encode());
    }
    Ok(code.into())
}

pub async fn deploy(rpc_url: &str, private_key: &str, init_code: Bytes) -> eyre::Result<Address> {
    let signer: PrivateKeySigner = private_key.parse().wrap_err("invalid private key")?;
    info!(deployer = %signer.address(), "running deploy script");

    let url: reqwest::Url = rpc_url.parse().wrap_err("invalid rpc url")?;
    let wallet = EthereumWallet::from(signer);
    let provider = ProviderBuilder::new()
        .with_recommended_fillers()
        .wallet(wallet)
        .on_http(url);

    let tx = TransactionRequest::default().with_deploy_code(init_code);
    let receipt = provider.send_transaction(tx).await?.get_receipt().await?;

    receipt
        .contract_address
        .ok_or_else(|| ScriptError::NoContractAddress(receipt.transaction_hash.to_string()).into())
}

/// The single line a deploy prints: `{"address": .., "constructorArgs": ..}`.
/// A facet without arguments reports `""`.
pub fn deployment_line(address: Address, args: &[String]) -> Value {
    let constructor_args = if args.is_empty() {
        json!("")
    } else {
        json!(args)
    };
    json!({
        "address": address.to_checksum(None),
        "constructorArgs": constructor_args,
    })
}
