use std::path::Path;

use eyre::WrapErr;
use serde::{de::DeserializeOwned, Serialize};
use tracing::info;

use crate::{
    chain::{self, ChainEntry, ChainsFile},
    tokenlist::{TokenList, TokenListClient},
};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainSummary {
    pub name: String,
    pub count: usize,
}

/// Rebuilds the derived list of every chain in `path` from the bridge API.
///
/// Chains are fetched one at a time in file order and the whole file is written
/// after each one, so chains finished before a failure stay on disk.
pub async fn sync<E, F>(
    client: &TokenListClient,
    path: &Path,
    derive: F,
) -> eyre::Result<Vec<ChainSummary>>
where
    E: ChainEntry + Serialize + DeserializeOwned,
    F: Fn(&TokenList) -> eyre::Result<Vec<E::Item>>,
{
    let loaded: ChainsFile<E> = chain::load(path).await?;
    let mut current = loaded.clone();
    let mut summary = Vec::with_capacity(loaded.len());

    for (name, entry) in loaded.iter() {
        info!(chain = name, chain_id = entry.chain_id(), "fetching");
        let list = client.fetch(entry.chain_id()).await?;
        let items = derive(&list).wrap_err_with(|| format!("failed to process chain {name}"))?;
        let count = items.len();
        info!(chain = name, count, "derived");

        current = current.replaced(name, entry.with_derived(items));
        chain::save(path, &current).await?;
        info!(chain = name, "written");

        summary.push(ChainSummary {
            name: name.to_owned(),
            count,
        });
    }

    Ok(summary)
}
