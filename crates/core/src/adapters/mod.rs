// ABOUTME: Site adapter module: per-retailer price selectors and the registry that resolves them.
// ABOUTME: Includes the embedded builtin adapter set and a compiled selector cache.

//! Site adapters.
//!
//! Submodules:
//! - `registry`: adapter data model and URL resolution.
//! - `loader`: builtin and file-based adapter sets.
//! - `compiled`: process-wide cache of compiled CSS selectors.

pub mod compiled;
pub mod loader;
pub mod registry;
