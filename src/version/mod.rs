//! Version layer: fetching, caching and comparing package listings
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐     ┌──────────────┐
//! │ AurRegistry  │────▶│ ArchiveCache │───┐
//! │   (scrape)   │     │  (snapshot)  │   │    ┌─────────────┐     ┌─────────────┐
//! └──────────────┘     └──────────────┘   ├───▶│   checker   │────▶│   vercmp    │
//! ┌──────────────┐                        │    │  (compare)  │     │ (ordering)  │
//! │MirrorRegistry│────────────────────────┘    └─────────────┘     └─────────────┘
//! │  (database)  │
//! └──────────────┘
//! ```
//!
//! # Modules
//!
//! - [`cache`]: JSON snapshot of the AUR listing
//! - [`checker`]: drift classification and the printed report
//! - [`registry`]: the `PackageSource` trait
//! - [`registries`]: AUR and mirror implementations
//! - [`vercmp`]: pacman version ordering
//! - [`error`]: error types for this layer
//! - [`types`]: `PackageVersions`

pub mod cache;
pub mod checker;
pub mod error;
pub mod registries;
pub mod registry;
pub mod types;
pub mod vercmp;
