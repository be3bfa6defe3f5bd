use std::path::Path;

use eyre::WrapErr;
use serde::{
    de::{self, DeserializeOwned},
    Deserialize, Deserializer, Serialize, Serializer,
};
use serde_json::{json, Map, Value};

use crate::ordered::OrderedMap;

/// Chain name to entry, in the order the file lists them.
pub type ChainsFile<E> = OrderedMap<E>;

/// A config entry whose derived list is rebuilt from the bridge API on every run.
pub trait ChainEntry: Clone {
    type Item;

    fn chain_id(&self) -> u64;

    /// The same entry with its derived list replaced by `items`.
    fn with_derived(&self, items: Vec<Self::Item>) -> Self;
}

/// An entry of `config/multichain.json`.
///
/// The object is kept as read, so a rewrite only swaps `routers` and leaves the
/// other keys where they were.
#[derive(Debug, Clone, PartialEq)]
pub struct RouterChain {
    chain_id: u64,
    any_native: Option<String>,
    routers: Vec<String>,
    raw: Map<String, Value>,
}

#[derive(Deserialize)]
struct RouterFields {
    #[serde(rename = "chainID")]
    chain_id: u64,
    #[serde(rename = "anyNative", default)]
    any_native: Option<String>,
    #[serde(default)]
    routers: Vec<String>,
}

impl RouterChain {
    pub fn any_native(&self) -> Option<&str> {
        self.any_native.as_deref()
    }

    pub fn routers(&self) -> &[String] {
        &self.routers
    }

    pub fn field(&self, key: &str) -> Option<&Value> {
        self.raw.get(key)
    }
}

impl ChainEntry for RouterChain {
    type Item = String;

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn with_derived(&self, routers: Vec<String>) -> Self {
        let mut raw = self.raw.clone();
        raw.insert("routers".to_owned(), Value::from(routers.clone()));
        Self {
            routers,
            raw,
            ..self.clone()
        }
    }
}

impl<'de> Deserialize<'de> for RouterChain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (fields, raw) = read_entry::<D, RouterFields>(deserializer)?;
        Ok(Self {
            chain_id: fields.chain_id,
            any_native: fields.any_native,
            routers: fields.routers,
            raw,
        })
    }
}

impl Serialize for RouterChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenMapping {
    pub token_address: String,
    pub any_token_address: String,
}

/// An entry of `config/multichainTokens.json`, kept as read like [`RouterChain`].
#[derive(Debug, Clone, PartialEq)]
pub struct TokenChain {
    chain_id: u64,
    mappings: Vec<TokenMapping>,
    raw: Map<String, Value>,
}

#[derive(Deserialize)]
struct TokenFields {
    #[serde(rename = "chainID")]
    chain_id: u64,
    #[serde(default)]
    mappings: Vec<TokenMapping>,
}

impl TokenChain {
    pub fn mappings(&self) -> &[TokenMapping] {
        &self.mappings
    }
}

impl ChainEntry for TokenChain {
    type Item = TokenMapping;

    fn chain_id(&self) -> u64 {
        self.chain_id
    }

    fn with_derived(&self, mappings: Vec<TokenMapping>) -> Self {
        let mut raw = self.raw.clone();
        let value = mappings
            .iter()
            .map(|m| json!({"tokenAddress": m.token_address, "anyTokenAddress": m.any_token_address}))
            .collect();
        raw.insert("mappings".to_owned(), Value::Array(value));
        Self {
            chain_id: self.chain_id,
            mappings,
            raw,
        }
    }
}

impl<'de> Deserialize<'de> for TokenChain {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (fields, raw) = read_entry::<D, TokenFields>(deserializer)?;
        Ok(Self {
            chain_id: fields.chain_id,
            mappings: fields.mappings,
            raw,
        })
    }
}

impl Serialize for TokenChain {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.raw.serialize(serializer)
    }
}

/// Reads an entry object once, returning its typed fields and the object itself.
fn read_entry<'de, D, F>(deserializer: D) -> Result<(F, Map<String, Value>), D::Error>
where
    D: Deserializer<'de>,
    F: DeserializeOwned,
{
    let raw = Map::<String, Value>::deserialize(deserializer)?;
    let fields = F::deserialize(Value::Object(raw.clone())).map_err(de::Error::custom)?;
    Ok((fields, raw))
}

pub async fn load<E: DeserializeOwned>(path: &Path) -> eyre::Result<ChainsFile<E>> {
    let raw = tokio::fs::read_to_string(path)
        .await
        .wrap_err_with(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&raw).wrap_err_with(|| format!("failed to parse {}", path.display()))
}

/// Overwrites `path` with the whole file, pretty printed with two-space indents.
pub async fn save<E: Serialize>(path: &Path, chains: &ChainsFile<E>) -> eyre::Result<()> {
    let json = serde_json::to_string_pretty(chains)?;
    tokio::fs::write(path, json)
        .await
        .wrap_err_with(|| format!("failed to write {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    const MULTICHAIN: &str = r#"{
  "ChainA": {
    "chainID": 1,
    "anyNative": "0x0615dbba33fe61a31c7ed131bda6655ed76748b1",
    "routers": [
      "0xold"
    ],
    "note": "kept"
  }
}"#;

    #[tokio::test]
    async fn rewrite_keeps_extra_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("multichain.json");
        tokio::fs::write(&path, MULTICHAIN).await.unwrap();

        let chains: ChainsFile<RouterChain> = load(&path).await.unwrap();
        let entry = chains.get("ChainA").unwrap();
        assert_eq!(entry.chain_id(), 1);
        assert_eq!(entry.field("note"), Some(&Value::from("kept")));
        assert_eq!(
            entry.any_native(),
            Some("0x0615dbba33fe61a31c7ed131bda6655ed76748b1")
        );
        assert_eq!(entry.routers(), ["0xold"]);

        let next = chains.replaced("ChainA", entry.with_derived(vec!["0xnew".into()]));
        save(&path, &next).await.unwrap();

        let written = tokio::fs::read_to_string(&path).await.unwrap();
        assert_eq!(written, MULTICHAIN.replace("0xold", "0xnew"));
    }

    #[test]
    fn mappings_use_camel_case() {
        let chain: TokenChain = serde_json::from_str(
            r#"{"chainID": 56, "mappings": [{"tokenAddress": "0x1", "anyTokenAddress": "0x2"}]}"#,
        )
        .unwrap();
        assert_eq!(
            chain.mappings(),
            [TokenMapping {
                token_address: "0x1".into(),
                any_token_address: "0x2".into(),
            }]
        );

        let cleared = chain.with_derived(Vec::new());
        assert_eq!(
            serde_json::to_string(&cleared).unwrap(),
            r#"{"chainID":56,"mappings":[]}"#
        );
    }

    #[test]
    fn rewrite_keeps_document_field_order() {
        let chain: RouterChain =
            serde_json::from_str(r#"{"routers": [], "chainID": 1, "anyNative": "0x1"}"#).unwrap();
        assert_eq!(
            serde_json::to_string(&chain.with_derived(vec!["0xR".into()])).unwrap(),
            r#"{"routers":["0xR"],"chainID":1,"anyNative":"0x1"}"#
        );

        let bare: RouterChain = serde_json::from_str(r#"{"chainID": 2}"#).unwrap();
        assert_eq!(
            serde_json::to_string(&bare.with_derived(Vec::new())).unwrap(),
            r#"{"chainID":2,"routers":[]}"#
        );

        let tokens: TokenChain =
            serde_json::from_str(r#"{"mappings": [], "chainID": 250}"#).unwrap();
        assert_eq!(
            serde_json::to_string(&tokens.with_derived(Vec::new())).unwrap(),
            r#"{"mappings":[],"chainID":250}"#
        );
    }

    #[test]
    fn entry_without_chain_id_is_rejected() {
        assert!(serde_json::from_str::<RouterChain>(r#"{"routers": []}"#).is_err());
    }

    #[tokio::test]
    async fn missing_file_names_the_path() {
        let err = load::<TokenChain>(Path::new("does/not/exist.json"))
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does/not/exist.json"));
    }
}
