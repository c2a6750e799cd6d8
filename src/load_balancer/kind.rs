//! Strategy names and construction by name.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::load_balancer::{
    error::LoadBalancerError, ip_hash::IpHash, least_conn::LeastConnections, random::Random,
    round_robin::RoundRobin, weighted::WeightedRoundRobin, Strategy,
};

/// Configurable strategy variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrategyKind {
    #[default]
    #[serde(alias = "round-robin", alias = "round_robin")]
    RoundRobin,
    #[serde(alias = "least-connections", alias = "least_connections")]
    LeastConnections,
    Random,
    #[serde(alias = "weightedroundrobin", alias = "weighted-round-robin")]
    Weighted,
    #[serde(alias = "ip-hash", alias = "ip_hash")]
    IpHash,
}

impl StrategyKind {
    pub const ALL: [StrategyKind; 5] = [
        StrategyKind::RoundRobin,
        StrategyKind::LeastConnections,
        StrategyKind::Random,
        StrategyKind::Weighted,
        StrategyKind::IpHash,
    ];

    /// Configuration name (`roundrobin`, `leastconnections`, ...).
    pub fn as_str(&self) -> &'static str {
        match self {
            StrategyKind::RoundRobin => "roundrobin",
            StrategyKind::LeastConnections => "leastconnections",
            StrategyKind::Random => "random",
            StrategyKind::Weighted => "weighted",
            StrategyKind::IpHash => "iphash",
        }
    }

    /// Human-facing name used in logs and the stats page.
    pub fn display_name(&self) -> &'static str {
        match self {
            StrategyKind::RoundRobin => "RoundRobin",
            StrategyKind::LeastConnections => "LeastConnections",
            StrategyKind::Random => "Random",
            StrategyKind::Weighted => "WeightedRoundRobin",
            StrategyKind::IpHash => "IPHash",
        }
    }

    /// Construct a fresh strategy instance of this kind.
    pub fn build(self) -> Box<dyn Strategy> {
        match self {
            StrategyKind::RoundRobin => Box::new(RoundRobin::new()),
            StrategyKind::LeastConnections => Box::new(LeastConnections::new()),
            StrategyKind::Random => Box::new(Random::new()),
            StrategyKind::Weighted => Box::new(WeightedRoundRobin::new()),
            StrategyKind::IpHash => Box::new(IpHash::new()),
        }
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for StrategyKind {
    type Err = LoadBalancerError;

    /// Case-insensitive; `-` and `_` are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();

        match normalized.as_str() {
            "roundrobin" => Ok(StrategyKind::RoundRobin),
            "leastconnections" | "leastconn" => Ok(StrategyKind::LeastConnections),
            "random" => Ok(StrategyKind::Random),
            "weighted" | "weightedroundrobin" => Ok(StrategyKind::Weighted),
            "iphash" => Ok(StrategyKind::IpHash),
            _ => Err(LoadBalancerError::UnknownStrategy(s.to_string())),
        }
    }
}
