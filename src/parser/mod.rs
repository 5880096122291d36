//! Vendor parsers.
//!
//! Each vendor parser implements the `Parser` trait: given vendor-specific
//! byte blobs, produce one `FirewallConfig` plus a list of warnings. A
//! parser never fails hard on an unknown line — it records a `Warning` and
//! continues. Only structural preconditions (missing mandatory blob, empty
//! input) return `Err`.

pub mod asa;
pub mod checkpoint;
pub mod common;
pub mod fortinet;
pub mod paloalto;
pub mod registry;

use crate::error::Result;
use crate::ir::{FirewallConfig, Warning};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Supported source/target vendor platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Vendor {
    Asa,
    CheckPoint,
    Fortinet,
    PaloAlto,
}

impl Vendor {
    /// Stable vendor-id string the registries key on (spec.md §9).
    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Asa => "asa",
            Self::CheckPoint => "checkpoint",
            Self::Fortinet => "fortinet",
            Self::PaloAlto => "paloalto",
        }
    }

    /// All supported vendors, in a stable order.
    #[must_use]
    pub const fn all() -> [Self; 4] {
        [Self::Asa, Self::CheckPoint, Self::Fortinet, Self::PaloAlto]
    }
}

impl fmt::Display for Vendor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Named byte blobs handed to a parser. Every vendor but Check Point takes
/// a single blob; Check Point takes a family of related files (spec.md
/// §4.2.2, §6).
#[derive(Debug, Clone, Default)]
pub struct ParserInputs {
    /// The primary config text (ASA/Fortinet/PAN-OS single blob, or Check
    /// Point's `objects` database).
    pub primary: Option<Vec<u8>>,
    /// Check Point policy CSV.
    pub policy_csv: Option<Vec<u8>>,
    /// Check Point NAT CSV.
    pub nat_csv: Option<Vec<u8>>,
    /// Check Point Gaia `show configuration` text.
    pub show_configuration: Option<Vec<u8>>,
    /// Check Point SmartConsole ZIP export.
    pub zip: Option<Vec<u8>>,
}

impl ParserInputs {
    /// Build inputs from a single blob (ASA/Fortinet/PAN-OS).
    #[must_use]
    pub fn single(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            primary: Some(bytes.into()),
            ..Self::default()
        }
    }
}

/// A vendor-specific configuration parser.
pub trait Parser: Send + Sync {
    /// Vendor this parser handles.
    fn vendor(&self) -> Vendor;

    /// Parse `inputs` into a `FirewallConfig` plus accumulated warnings.
    ///
    /// # Errors
    /// Returns `Err` only for structural preconditions (spec.md §7:
    /// missing mandatory file, wrong vendor label) or a genuine bug;
    /// malformed individual lines become a `Warning` instead.
    fn parse(&self, inputs: &ParserInputs) -> Result<(FirewallConfig, Vec<Warning>)>;
}

pub use registry::ParserRegistry;
