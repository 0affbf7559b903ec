//! Network analysis for linNet.
//!
//! This crate turns a parsed circuit into everything the equation builder
//! needs: the sub-network decomposition with one elected ground per
//! sub-network, the structural validation of the topology, and the variable
//! table mapping nodes, devices and sources onto matrix rows, columns and
//! constant bits.

mod network;
pub mod passes;
mod vartable;

#[cfg(test)]
mod tests;

pub use self::network::{
    Analysis, AnalysisConfig, AnalysisError, NetworkAnalyzer, SubNetworks, SubnetId,
};
pub use self::vartable::{
    ConstantEntry, ConstantKind, KnownEntry, UnknownEntry, UnknownKind, VariableTable,
    MAX_CONSTANTS,
};
