//! Registry of well-known Solana networks and their USDC deployments.
//!
//! Payment requirements name their network with a short human-readable name
//! (e.g., `"solana"`) and their asset by mint address. This module maps both
//! to the facts a client needs to present a payment: the CAIP-2 reference of
//! the network and the ticker and decimals of the token.

/// A known network definition with its CAIP-2 reference and USDC mint.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NetworkInfo {
    /// Human-readable network name (e.g., "solana", "solana-devnet")
    pub name: &'static str,
    /// CAIP-2 namespace, always "solana" here
    pub namespace: &'static str,
    /// Genesis-hash prefix used as the CAIP-2 chain reference
    pub reference: &'static str,
    /// Mint address of native Circle USDC on this network
    pub usdc_mint: &'static str,
}

impl NetworkInfo {
    /// Returns the CAIP-2 chain identifier, e.g. `solana:5eykt4Us...`.
    #[must_use]
    pub fn caip2(&self) -> String {
        format!("{}:{}", self.namespace, self.reference)
    }
}

/// Solana networks with native USDC deployments.
pub static SOLANA_NETWORKS: &[NetworkInfo] = &[
    NetworkInfo {
        name: "solana",
        namespace: "solana",
        reference: "5eykt4UsFv8P8NJdTREpY1vzqKqZKvdp",
        usdc_mint: "EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v",
    },
    NetworkInfo {
        name: "solana-devnet",
        namespace: "solana",
        reference: "EtWTRABZaYq6iMfeYKouRu166VU2xqa1",
        usdc_mint: "4zMMC9srt5Ri5X14GAgXhaHii3GnPAEERYPJgZJDncDU",
    },
];

/// Looks up a network by its human-readable name or its CAIP-2 identifier.
#[must_use]
pub fn network_by_name(name: &str) -> Option<&'static NetworkInfo> {
    SOLANA_NETWORKS
        .iter()
        .find(|info| info.name == name || info.caip2() == name)
}

/// Returns the currency ticker for a known asset mint, if any.
///
/// ```
/// use s402::networks::currency_for_asset;
///
/// assert_eq!(
///     currency_for_asset("EPjFWdd5AufqSSqeM2qN1xzybapC8G4wEGGkZwyTDt1v"),
///     Some("USDC")
/// );
/// assert_eq!(currency_for_asset("unknown"), None);
/// ```
#[must_use]
pub fn currency_for_asset(address: &str) -> Option<&'static str> {
    SOLANA_NETWORKS
        .iter()
        .any(|info| info.usdc_mint == address)
        .then_some("USDC")
}
