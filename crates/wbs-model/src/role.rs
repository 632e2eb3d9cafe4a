//! Participant roles

use std::fmt::{self, Display, Formatter};

/// Which kind of instance is being synchronized
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    /// The team instance
    Team,
    /// A master project rolling up several teams
    Master,
    /// One team member, identified by initials
    Individual(String),
}

impl Role {
    /// Build an individual role
    #[inline]
    #[must_use]
    pub fn individual(initials: impl Into<String>) -> Self {
        Self::Individual(initials.into())
    }

    /// True for team and master instances
    #[inline]
    #[must_use]
    pub fn is_team_side(&self) -> bool {
        matches!(self, Self::Team | Self::Master)
    }

    /// Initials of an individual
    #[inline]
    #[must_use]
    pub fn initials(&self) -> Option<&str> {
        match self {
            Self::Individual(initials) => Some(initials),
            _ => None,
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Team => f.write_str("team"),
            Self::Master => f.write_str("master"),
            Self::Individual(initials) => write!(f, "individual '{initials}'"),
        }
    }
}
