//! Network-related configuration types

use std::num::NonZeroU16;
use std::str::FromStr;

use crate::types::ValidationError;

nonzero_newtype! {
    /// A validated network port number that cannot be zero
    ///
    /// # Examples
    /// ```
    /// use queue_scouter::types::Port;
    ///
    /// let port = Port::new(6380).unwrap();
    /// assert_eq!(port.get(), 6380);
    ///
    /// // Port 0 is invalid
    /// assert!(Port::new(0).is_none());
    /// ```
    #[doc(alias = "tcp_port")]
    #[derive(Hash, PartialOrd, Ord)]
    pub struct Port(NonZeroU16: u16);
}

impl Port {
    /// Default port of a store instance (6379)
    pub const STORE: Self = Self(NonZeroU16::new(6379).unwrap());

    /// Graphite plaintext listener (2003)
    pub const GRAPHITE: Self = Self(NonZeroU16::new(2003).unwrap());
}

impl FromStr for Port {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let port = s
            .trim()
            .parse::<u16>()
            .map_err(|_| ValidationError::InvalidPortNumber(s.to_string()))?;
        Self::new(port).ok_or(ValidationError::InvalidPort)
    }
}

impl TryFrom<u16> for Port {
    type Error = ValidationError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(ValidationError::InvalidPort)
    }
}
