//! Vendor-id → generator registry. Mirrors `parser::registry`.

use super::{
    Generator, asa::AsaGenerator, checkpoint::CheckPointGenerator, fortinet::FortinetGenerator,
    paloalto::PaloAltoGenerator,
};
use crate::parser::Vendor;
use std::collections::HashMap;

pub struct GeneratorRegistry {
    generators: HashMap<Vendor, Box<dyn Generator>>,
}

impl GeneratorRegistry {
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self {
            generators: HashMap::new(),
        };
        registry.register(Box::new(AsaGenerator));
        registry.register(Box::new(CheckPointGenerator));
        registry.register(Box::new(FortinetGenerator));
        registry.register(Box::new(PaloAltoGenerator));
        registry
    }

    pub fn register(&mut self, generator: Box<dyn Generator>) {
        self.generators.insert(generator.vendor(), generator);
    }

    #[must_use]
    pub fn get(&self, vendor: Vendor) -> Option<&dyn Generator> {
        self.generators.get(&vendor).map(std::convert::AsRef::as_ref)
    }
}

impl Default for GeneratorRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_registry_has_all_four_vendors() {
        let registry = GeneratorRegistry::with_defaults();
        for vendor in Vendor::all() {
            assert!(registry.get(vendor).is_some(), "missing generator for {vendor}");
        }
    }
}
