//! Domain types and ports for the scholarship checkout.
//!
//! Nothing in here performs I/O; adapters in `infrastructure` implement the
//! traits from `ports`.

pub mod application;
pub mod money;
pub mod payment;
pub mod ports;
pub mod route;
pub mod scholarship;
pub mod session;

use serde::{Deserialize, Deserializer};

/// Reads `null` as the type's default. Records written by other clients may
/// carry `null` display fields.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
