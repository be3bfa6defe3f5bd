use std::{io::ErrorKind, path::Path};

use alloy::{
    json_abi::{self, AbiItem},
    primitives::{hex, keccak256},
};
use eyre::WrapErr;
use serde::Serialize;
use tokio::io::AsyncWriteExt;
use tracing::warn;

use crate::error::ScriptError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorSelector {
    pub text: String,
    pub hash: String,
}

/// `0x` and the first four bytes of `keccak256("<name>()")`.
pub fn selector(name: &str) -> String {
    let hash = keccak256(format!("{name}()"));
    hex::encode_prefixed(&hash[..4])
}

/// Custom errors of an ABI, in file order, with their selectors.
///
/// Every error is hashed as if it took no arguments. Errors that do take arguments
/// get a wrong selector; they are reported with a warning and still emitted.
pub fn parse_errors(abi: &str) -> eyre::Result<Vec<ErrorSelector>> {
    let selectors = abi_errors(abi)?
        .into_iter()
        .map(|error| {
            if !error.inputs.is_empty() {
                warn!(
                    error = %error.name,
                    signature = %error.signature(),
                    "error takes arguments, selector is computed for `{}()`",
                    error.name
                );
            }
            ErrorSelector {
                hash: selector(&error.name),
                text: error.name,
            }
        })
        .collect();

    Ok(selectors)
}

/// The `error` items of an ABI, in file order and including repeated names.
fn abi_errors(abi: &str) -> eyre::Result<Vec<json_abi::Error>> {
    let items: Vec<AbiItem<'_>> =
        serde_json::from_str(abi).wrap_err("ABI must be a JSON array of entries")?;

    Ok(items
        .into_iter()
        .filter_map(|item| match item {
            AbiItem::Error(error) => Some(error.into_owned()),
            _ => None,
        })
        .collect())
}

/// Writes `selectors` to a new file at `path`. An existing file is never touched.
pub async fn write_selectors(path: &Path, selectors: &[ErrorSelector]) -> eyre::Result<()> {
    let json = serde_json::to_string_pretty(selectors)?;

    let mut file = match tokio::fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(path)
        .await
    {
        Ok(file) => file,
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {
            return Err(ScriptError::OutputExists(path.to_path_buf()).into())
        }
        Err(e) => return Err(e).wrap_err_with(|| format!("failed to create {}", path.display())),
    };

    file.write_all(json.as_bytes()).await?;
    file.flush().await?;
    Ok(())
}
