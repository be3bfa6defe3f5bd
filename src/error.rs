use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("token `{token}` matched `{abi}` but has no `{field}`")]
    MissingField {
        token: String,
        abi: String,
        field: &'static str,
    },

    #[error("refusing to overwrite existing file {}", .0.display())]
    OutputExists(PathBuf),

    #[error("no `{key}` configured for network `{network}`")]
    UnknownNetwork { network: String, key: &'static str },

    #[error("deploy receipt {0} has no contract address")]
    NoContractAddress(String),
}
