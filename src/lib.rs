//! # bitadmin
//!
//! Administration of Bitbucket Server repositories: permissions, branch
//! restrictions, default reviewers, hooks and repository settings. Entity
//! lookups go through a local cache that is filled once with
//! `bitadmin cache warmup`.
//!
//! The library talks to the server through the [`remote::RemoteApi`] trait,
//! so every operation can run against an in-memory fake.
//!
//! ## Feature Flags
//!
//! - `cli` (default): Includes the CLI module and the blocking HTTP client.
//!   Disable with `default-features = false`.

pub mod access;
pub mod cache;
#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod hooks;
pub mod remote;
pub mod repository;
pub mod types;
