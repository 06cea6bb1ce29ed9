//! Network identification for Horizon deployments.

use std::fmt;

/// The network a Horizon server serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub enum Network {
    /// The public production network.
    Public,
    /// The public test network.
    #[default]
    Testnet,
    /// The preview network for upcoming protocol releases.
    Futurenet,
    /// Any other deployment.
    Custom,
}

impl Network {
    /// Returns true if this is the production network.
    pub fn is_public(&self) -> bool {
        matches!(self, Network::Public)
    }

    /// Returns true if this is the test network.
    pub fn is_testnet(&self) -> bool {
        matches!(self, Network::Testnet)
    }

    /// Returns the network identifier string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Network::Public => "public",
            Network::Testnet => "testnet",
            Network::Futurenet => "futurenet",
            Network::Custom => "custom",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
