use std::path::Path;

use crate::{
    chain::RouterChain,
    error::ScriptError,
    pipeline::{self, ChainSummary},
    tokenlist::{
        self, TokenList, TokenListClient, ANY_SWAP_OUT, ANY_SWAP_OUT_NATIVE,
        ANY_SWAP_OUT_UNDERLYING, SWAPOUT,
    },
};

const ANY_TOKEN_ABIS: [&str; 3] = [ANY_SWAP_OUT, ANY_SWAP_OUT_UNDERLYING, ANY_SWAP_OUT_NATIVE];

/// Collects the routers of a chain's token list: routers serving `Swapout` first,
/// then routers serving one of the `anySwapOut*` variants.
///
/// Only the first matching path of each token counts towards a category, even if
/// later destination chains route the same token through other routers.
pub fn extract_routers(list: &TokenList) -> eyre::Result<Vec<String>> {
    let mut token_routers = Vec::new();
    let mut any_routers = Vec::new();

    for (key, record) in list.iter() {
        if let Some(path) = record.first_path(|p| p.abi_is(SWAPOUT)) {
            push_unique(&mut token_routers, router_of(key, path)?);
        }
        if let Some(path) = record.first_path(|p| p.abi_is_any_of(&ANY_TOKEN_ABIS)) {
            push_unique(&mut any_routers, router_of(key, path)?);
        }
    }

    token_routers.extend(any_routers);
    Ok(token_routers)
}

fn router_of(token: &str, path: &tokenlist::Path) -> Result<String, ScriptError> {
    path.router.clone().ok_or_else(|| ScriptError::MissingField {
        token: token.to_owned(),
        abi: path.router_abi.clone().unwrap_or_default(),
        field: "router",
    })
}

fn push_unique(routers: &mut Vec<String>, router: String) {
    if !routers.contains(&router) {
        routers.push(router);
    }
}

pub async fn sync_routers(
    client: &TokenListClient,
    config: &Path,
) -> eyre::Result<Vec<ChainSummary>> {
    pipeline::sync::<RouterChain, _>(client, config, extract_routers).await
}
