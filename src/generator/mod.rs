//! Vendor generators.
//!
//! A generator lowers the IR back into target-specific text. Emission
//! order is shared across every vendor: interfaces → zones → addresses →
//! address-groups → services → service-groups → security-profiles → NAT
//! helpers → security policies → routing → dynamic routing (spec.md §4.5).
//! A malformed entity produces one warning and is skipped; no exception
//! propagates out of a generator.

pub mod asa;
pub mod checkpoint;
pub mod fortinet;
pub mod paloalto;
pub mod registry;
pub mod sanitize;

use crate::error::Result;
use crate::ir::{FirewallConfig, Warning};
use crate::mapper::AggregateGroup;
use crate::parser::Vendor;
use std::collections::BTreeMap;

/// Fortinet NAT engine mode (spec.md §4.5.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NatMode {
    #[default]
    Policy,
    Central,
}

/// Palo Alto output context (spec.md §4.5.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    #[default]
    Firewall,
    Panorama,
}

/// Generator-side knobs that affect lowering (spec.md §6 "Configuration
/// options: Target").
#[derive(Debug, Clone, Default)]
pub struct GeneratorOptions {
    /// Fortinet SNAT engine mode.
    pub nat_mode: NatMode,
    /// Palo Alto standalone vs Panorama.
    pub output_mode: OutputMode,
    /// Palo Alto Panorama device-group name.
    pub device_group: Option<String>,
    /// Palo Alto Panorama template name.
    pub template: Option<String>,
    /// Security-profile names (IPS, AV, web-filter, file-filter, SSL), in
    /// that order. Non-empty entries enable UTM/profile attachment.
    pub security_profiles: BTreeMap<String, String>,
    /// Target-layout aggregate groups, passed through untouched by the
    /// Mapper and consumed here directly.
    pub aggregates: Vec<AggregateGroup>,
}

/// Output of one generator invocation.
#[derive(Debug, Clone, Default)]
pub struct GeneratedOutput {
    pub text: Vec<u8>,
    pub warnings: Vec<Warning>,
}

/// A vendor-specific configuration generator.
pub trait Generator: Send + Sync {
    /// Vendor this generator targets.
    fn vendor(&self) -> Vendor;

    /// Lower `config` into target-vendor text.
    ///
    /// # Errors
    /// Returns `Err` only if the generator cannot produce any output at
    /// all; per-entity limitations become a `Warning` instead (spec.md
    /// §7: "Generator limitation").
    fn generate(&self, config: &FirewallConfig, options: &GeneratorOptions) -> Result<GeneratedOutput>;
}

pub use registry::GeneratorRegistry;
