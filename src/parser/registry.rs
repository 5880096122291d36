//! Vendor-id → parser registry.
//!
//! A small lookup table binding a vendor-id string to its implementation,
//! so the rest of the crate never matches on `Vendor` to pick code paths.

use super::{Parser, Vendor, asa::AsaParser, checkpoint::CheckPointParser, fortinet::FortinetParser, paloalto::PaloAltoParser};
use std::collections::HashMap;

/// Registry of available vendor parsers.
pub struct ParserRegistry {
    parsers: HashMap<Vendor, Box<dyn Parser>>,
}

impl ParserRegistry {
    /// A registry with all four built-in vendor parsers registered.
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            parsers: HashMap::new(),
        };
        registry.register(Box::new(AsaParser));
        registry.register(Box::new(CheckPointParser));
        registry.register(Box::new(FortinetParser));
        registry.register(Box::new(PaloAltoParser));
        registry
    }

    /// Register (or replace) a parser implementation.
    pub fn register(&mut self, parser: Box<dyn Parser>) {
        self.parsers.insert(parser.vendor(), parser);
    }

    /// Look up the parser for a vendor.
    #[must_use]
    pub fn get(&self, vendor: Vendor) -> Option<&dyn Parser> {
        self.parsers.get(&vendor).map(std::convert::AsRef::as_ref)
    }
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_all_four_vendors() {
        let registry = ParserRegistry::with_defaults();
        for vendor in Vendor::all() {
            assert!(registry.get(vendor).is_some(), "missing parser for {vendor}");
        }
    }
}
