//! Validated string types that enforce invariants at construction time

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Validation errors for configuration values
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ValidationError {
    #[error("hostname cannot be empty or whitespace")]
    EmptyHostName,

    #[error("config path cannot be empty or whitespace")]
    EmptyConfigPath,

    #[error("port cannot be 0")]
    InvalidPort,

    #[error("invalid port number: {0}")]
    InvalidPortNumber(String),

    #[error("invalid instance address '{0}' (expected PORT, :PORT or HOST:PORT)")]
    InvalidInstance(String),
}

/// Generate a validated string newtype
///
/// Each type gets a validating `new()`, `as_str()`, `AsRef<str>`, `Deref`,
/// `Display`, `TryFrom<String>`, `FromStr` and serde impls that validate.
macro_rules! validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident(String) {
            validation: |$s_param:ident| $validation:expr,
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
        #[serde(transparent)]
        $vis struct $name(String);

        impl $name {
            #[doc = concat!("Create a new ", stringify!($name), " after validation")]
            pub fn new($s_param: String) -> Result<Self, ValidationError> {
                let validate = || $validation;
                validate()?;
                Ok(Self($s_param))
            }

            #[doc = concat!("Get the ", stringify!($name), " as a string slice")]
            #[must_use]
            #[inline]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl AsRef<str> for $name {
            #[inline]
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl std::ops::Deref for $name {
            type Target = str;

            #[inline]
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl TryFrom<String> for $name {
            type Error = ValidationError;

            fn try_from($s_param: String) -> Result<Self, Self::Error> {
                Self::new($s_param)
            }
        }

        impl std::str::FromStr for $name {
            type Err = ValidationError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::new(s.to_string())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
            where
                D: serde::Deserializer<'de>,
            {
                let s = String::deserialize(deserializer)?;
                Self::new(s).map_err(serde::de::Error::custom)
            }
        }
    };
}

validated_string! {
    /// A hostname or IP address that cannot be empty or whitespace-only
    ///
    /// # Examples
    /// ```
    /// use queue_scouter::types::HostName;
    ///
    /// let host = HostName::new("cache-01.internal".to_string()).unwrap();
    /// assert_eq!(host.as_str(), "cache-01.internal");
    ///
    /// assert!(HostName::new("   ".to_string()).is_err());
    /// ```
    #[doc(alias = "host")]
    pub struct HostName(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyHostName)
            } else {
                Ok(())
            }
        },
    }
}

validated_string! {
    /// Path to a TOML configuration file
    pub struct ConfigPath(String) {
        validation: |s| {
            if s.trim().is_empty() {
                Err(ValidationError::EmptyConfigPath)
            } else {
                Ok(())
            }
        },
    }
}

impl HostName {
    /// Loopback address used for bare-port instance specifications
    #[must_use]
    pub fn loopback() -> Self {
        Self("127.0.0.1".to_string())
    }

    /// Check whether the host names this machine's loopback interface
    #[must_use]
    pub fn is_loopback(&self) -> bool {
        match self.0.parse::<std::net::IpAddr>() {
            Ok(ip) => ip.is_loopback(),
            Err(_) => self.0.eq_ignore_ascii_case("localhost"),
        }
    }
}

impl ConfigPath {
    /// Borrow as a filesystem path
    #[must_use]
    pub fn as_path(&self) -> &std::path::Path {
        std::path::Path::new(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hostname_valid() {
        let host = HostName::new("10.1.2.3".to_string()).unwrap();
        assert_eq!(host.as_str(), "10.1.2.3");
    }

    #[test]
    fn test_hostname_whitespace_rejected() {
        assert!(matches!(
            HostName::new(" \t\n ".to_string()),
            Err(ValidationError::EmptyHostName)
        ));
    }

    #[test]
    fn test_hostname_loopback_detection() {
        assert!(HostName::loopback().is_loopback());
        assert!(HostName::new("localhost".into()).unwrap().is_loopback());
        assert!(HostName::new("::1".into()).unwrap().is_loopback());
        assert!(!HostName::new("10.0.0.8".into()).unwrap().is_loopback());
        assert!(!HostName::new("cache.example.com".into()).unwrap().is_loopback());
    }

    #[test]
    fn test_hostname_deserialize_validates() {
        #[derive(Deserialize)]
        struct Wrapper {
            #[allow(dead_code)]
            host: HostName,
        }
        assert!(toml::from_str::<Wrapper>("host = \"db1\"").is_ok());
        assert!(toml::from_str::<Wrapper>("host = \"\"").is_err());
    }

    #[test]
    fn test_config_path() {
        let path: ConfigPath = "scouter.toml".parse().unwrap();
        assert_eq!(path.as_path(), std::path::Path::new("scouter.toml"));
        assert!("".parse::<ConfigPath>().is_err());
    }
}
