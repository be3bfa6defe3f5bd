use std::path::Path;

use crate::{
    chain::{TokenChain, TokenMapping},
    error::ScriptError,
    pipeline::{self, ChainSummary},
    tokenlist::{TokenList, TokenListClient, ANY_SWAP_OUT_UNDERLYING},
};

/// Pairs each any-token with the underlying token it wraps, taken from the first
/// `anySwapOutUnderlying` path of every record. Repeated pairs are kept.
pub fn extract_mappings(list: &TokenList) -> eyre::Result<Vec<TokenMapping>> {
    let mut mappings = Vec::new();

    for (key, record) in list.iter() {
        let Some(path) = record.first_path(|p| p.abi_is(ANY_SWAP_OUT_UNDERLYING)) else {
            continue;
        };
        let missing = |field: &'static str| ScriptError::MissingField {
            token: key.to_owned(),
            abi: ANY_SWAP_OUT_UNDERLYING.to_owned(),
            field,
        };

        mappings.push(TokenMapping {
            token_address: path
                .underlying_address()
                .ok_or_else(|| missing("fromanytoken.address"))?
                .to_owned(),
            any_token_address: record
                .address
                .clone()
                .ok_or_else(|| missing("address"))?,
        });
    }

    Ok(mappings)
}

pub async fn sync_mappings(
    client: &TokenListClient,
    config: &Path,
) -> eyre::Result<Vec<ChainSummary>> {
    pipeline::sync::<TokenChain, _>(client, config, extract_mappings).await
}

#[cfg(test)]
mod tests {
    use httpmock::prelude::*;

    use super::*;

    fn list(json: &str) -> TokenList {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn maps_underlying_to_any_token() {
        let list = list(
            r#"{
                "evm0xany1": {"address": "0xany1", "destChains": {
                    "56": [{"routerABI": "anySwapOutUnderlying(fromanytoken,toAddress,amount,toChainID)",
                            "router": "0xR", "fromanytoken": {"address": "0xusdc"}}],
                    "137": [{"routerABI": "anySwapOutUnderlying(fromanytoken,toAddress,amount,toChainID)",
                             "router": "0xR", "fromanytoken": {"address": "0xother"}}]
                }},
                "evm0xany2": {"address": "0xany2", "destChains": {
                    "56": [{"routerABI": "anySwapOut(fromanytoken,toAddress,amount,toChainID)",
                            "router": "0xR", "fromanytoken": {"address": "0xdai"}}]
                }}
            }"#,
        );

        assert_eq!(
            extract_mappings(&list).unwrap(),
            [TokenMapping {
                token_address: "0xusdc".into(),
                any_token_address: "0xany1".into(),
            }]
        );
    }

    #[test]
    fn repeated_pairs_are_kept() {
        let entry = r#"{"address": "0xany", "destChains": {"1": [{"routerABI": "anySwapOutUnderlying(fromanytoken,toAddress,amount,toChainID)", "fromanytoken": {"address": "0xusdc"}}]}}"#;
        let list = list(&format!(r#"{{"a": {entry}, "b": {entry}}}"#));
        assert_eq!(extract_mappings(&list).unwrap().len(), 2);
    }

    #[test]
    fn matched_path_without_underlying_fails() {
        let list = list(
            r#"{"t1": {"address": "0xany", "destChains": {"1": [{"routerABI": "anySwapOutUnderlying(fromanytoken,toAddress,amount,toChainID)"}]}}}"#,
        );
        let err = extract_mappings(&list).unwrap_err();
        assert!(err.to_string().contains("fromanytoken.address"));
    }

    #[tokio::test]
    async fn sync_replaces_mappings() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/250");
                then.status(200).body(
                    r#"{"fantom0xany": {"address": "0xany", "destChains": {"1": {"r": {
                        "routerABI": "anySwapOutUnderlying(fromanytoken,toAddress,amount,toChainID)",
                        "fromanytoken": {"address": "0xusdc"}
                    }}}}}"#,
                );
            })
            .await;

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multichainTokens.json");
        tokio::fs::write(
            &path,
            r#"{"fantom": {"chainID": 250, "mappings": [{"tokenAddress": "0xold", "anyTokenAddress": "0xold"}]}}"#,
        )
        .await
        .unwrap();

        let client = TokenListClient::new(server.base_url(), reqwest::Client::new());
        sync_mappings(&client, &path).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(
            written,
            r#"{
  "fantom": {
    "chainID": 250,
    "mappings": [
      {
        "tokenAddress": "0xusdc",
        "anyTokenAddress": "0xany"
      }
    ]
  }
}"#
        );
    }
}
