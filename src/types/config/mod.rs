//! Configuration-related type-safe wrappers using NonZero types
//!
//! Zero is never a meaningful port, pool size or thread count, so these
//! wrappers make it unrepresentable.

/// Wrap a NonZero integer with `new()`, `get()`, `Display` and serde impls
///
/// Deserializing `0` fails with serde's "expected a nonzero" error.
macro_rules! nonzero_newtype {
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident($nonzero:ty : $primitive:ty);
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
        #[serde(transparent)]
        $vis struct $name($nonzero);

        impl $name {
            /// `None` for 0
            #[must_use]
            pub const fn new(value: $primitive) -> Option<Self> {
                match <$nonzero>::new(value) {
                    Some(nz) => Some(Self(nz)),
                    None => None,
                }
            }

            #[must_use]
            pub const fn get(&self) -> $primitive {
                self.0.get()
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                std::fmt::Display::fmt(&self.0, f)
            }
        }
    };
}

pub mod duration;
mod limits;
mod network;

pub use duration::{duration_serde, parse_duration};
pub use limits::{MaxConnections, ThreadCount};
pub use network::Port;
