use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed pipeline roles, in data-flow order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Reads lines from the external input
    Source,
    /// Turns each line into its length
    Transform,
    /// Emits results to the external output
    Sink,
}

impl Role {
    pub const COUNT: usize = crate::constants::WORKER_COUNT;
    pub const ALL: [Role; Self::COUNT] = [Self::Source, Self::Transform, Self::Sink];

    /// Position in the identity table
    pub fn index(&self) -> usize {
        match self {
            Self::Source => 0,
            Self::Transform => 1,
            Self::Sink => 2,
        }
    }

    /// Peer that receives this role's unblock token after it produces
    ///
    /// Source and Transform release the stage they just fed; the Sink closes
    /// the ring by releasing the Source.
    pub fn successor(&self) -> Role {
        match self {
            Self::Source => Self::Transform,
            Self::Transform => Self::Sink,
            Self::Sink => Self::Source,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => write!(f, "source"),
            Self::Transform => write!(f, "transform"),
            Self::Sink => write!(f, "sink"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "source" => Ok(Self::Source),
            "transform" => Ok(Self::Transform),
            "sink" => Ok(Self::Sink),
            _ => Err(format!("Invalid role: {s}")),
        }
    }
}
