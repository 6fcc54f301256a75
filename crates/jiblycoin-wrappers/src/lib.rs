//! Contract bindings for the Jiblycoin deployment. Deployable contracts are
//! loaded from compiled artifacts at runtime; the handful of stable
//! interfaces the tooling reads from are generated with `abigen!`.

pub mod artifacts;
pub mod wrappers;
