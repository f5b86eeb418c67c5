#![allow(non_snake_case)]

//! Sparse Liouville superoperators for Lindblad master equations on composite
//! systems of finite-level subsystems, built by direct Kronecker-index
//! enumeration.

pub mod error;
pub mod config;
pub mod operator;
pub mod registry;
pub mod kron;
pub mod backend;
pub mod vectorize;
pub mod liouvillian;

pub use error::{ Error, Result };
pub use config::{ Config, DiagnosticsConfig };
pub use operator::{ Op, OpKind, Transition };
pub use registry::{ Lifecycle, Registry, Subsystem };
pub use backend::{ BackendError, CooMatrix, LocalBackend, SparseBackend };
pub use liouvillian::Liouvillian;
