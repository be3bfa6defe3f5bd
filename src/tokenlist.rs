use std::fmt;

use eyre::WrapErr;
use reqwest::header::ACCEPT;
use serde::{
    de::{MapAccess, SeqAccess, Visitor},
    Deserialize, Deserializer,
};
use tracing::debug;

use crate::ordered::{collect_map, OrderedMap};

pub const DEFAULT_API_URL: &str = "https://bridgeapi.anyswap.exchange/v4/tokenlistv4";

pub const SWAPOUT: &str = "Swapout(amount,toAddress)";
pub const ANY_SWAP_OUT: &str = "anySwapOut(fromanytoken,toAddress,amount,toChainID)";
pub const ANY_SWAP_OUT_UNDERLYING: &str =
    "anySwapOutUnderlying(fromanytoken,toAddress,amount,toChainID)";
pub const ANY_SWAP_OUT_NATIVE: &str =
    "anySwapOutNative(fromanytoken,toAddress,toChainID,{value: amount})";

/// Response of `GET /tokenlistv4/{chainID}`, keyed by token identifier.
pub type TokenList = OrderedMap<TokenRecord>;

#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenRecord {
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "destChains", default)]
    pub dest_chains: OrderedMap<PathSet>,
}

impl TokenRecord {
    /// First path satisfying `pred`, walking destination chains in order and the
    /// paths of each chain in order.
    pub fn first_path(&self, pred: impl Fn(&Path) -> bool) -> Option<&Path> {
        self.dest_chains
            .values()
            .flat_map(PathSet::iter)
            .find(|path| pred(*path))
    }
}

/// The routes a token has towards one destination chain. The live API sends an
/// object keyed by route id, older payloads send a plain array.
#[derive(Debug, Clone)]
pub enum PathSet {
    List(Vec<Path>),
    Keyed(OrderedMap<Path>),
}

impl PathSet {
    pub fn iter(&self) -> Box<dyn Iterator<Item = &Path> + '_> {
        match self {
            PathSet::List(paths) => Box::new(paths.iter()),
            PathSet::Keyed(paths) => Box::new(paths.values()),
        }
    }
}

struct PathSetVisitor;

impl<'de> Visitor<'de> for PathSetVisitor {
    type Value = PathSet;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("an array or object of router paths")
    }

    fn visit_unit<E: serde::de::Error>(self) -> Result<Self::Value, E> {
        Ok(PathSet::List(Vec::new()))
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut paths = Vec::with_capacity(access.size_hint().unwrap_or(0));
        while let Some(path) = access.next_element()? {
            paths.push(path);
        }
        Ok(PathSet::List(paths))
    }

    fn visit_map<A: MapAccess<'de>>(self, access: A) -> Result<Self::Value, A::Error> {
        collect_map(access).map(PathSet::Keyed)
    }
}

impl<'de> Deserialize<'de> for PathSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(PathSetVisitor)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct Path {
    #[serde(rename = "routerABI", default)]
    pub router_abi: Option<String>,
    #[serde(default)]
    pub router: Option<String>,
    #[serde(default)]
    pub fromanytoken: Option<AnyToken>,
}

impl Path {
    pub fn abi_is(&self, signature: &str) -> bool {
        self.router_abi.as_deref() == Some(signature)
    }

    pub fn abi_is_any_of(&self, signatures: &[&str]) -> bool {
        signatures.iter().any(|sig| self.abi_is(sig))
    }

    pub fn underlying_address(&self) -> Option<&str> {
        self.fromanytoken.as_ref()?.address.as_deref()
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AnyToken {
    #[serde(default)]
    pub address: Option<String>,
}

#[derive(Debug, Clone)]
pub struct TokenListClient {
    base_url: String,
    client: reqwest::Client,
}

impl TokenListClient {
    pub fn new(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.into(),
            client,
        }
    }

    pub async fn fetch(&self, chain_id: u64) -> eyre::Result<TokenList> {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), chain_id);
        debug!(%url, "requesting token list");

        let response = self
            .client
            .get(&url)
            .header(ACCEPT, "application/json")
            .send()
            .await
            .wrap_err_with(|| format!("token list request for chain {chain_id} failed"))?
            .error_for_status()
            .wrap_err_with(|| format!("token list request for chain {chain_id} failed"))?;
        let body = response.text().await?;

        serde_json::from_str(&body)
            .wrap_err_with(|| format!("unexpected token list shape for chain {chain_id}"))
    }
}
