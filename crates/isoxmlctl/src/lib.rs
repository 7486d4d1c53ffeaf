//! Subcommands of the `isoxmlctl` binary.

pub mod cmd_products;
pub mod cmd_resolve;
pub mod cmd_roundtrip;
pub mod cmd_split;
pub mod cmd_validate;
pub mod common;
