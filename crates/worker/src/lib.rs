//! Data-parallel session reconstruction.
//!
//! Reconstruction is independent per user: each task owns one user's visit
//! vector and shares nothing, so users are processed concurrently and a
//! failure for one user cannot corrupt another's result.

pub mod reconstruct;

pub use reconstruct::SessionWorker;
