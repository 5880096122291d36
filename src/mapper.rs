//! The Mapper: renames interfaces/zones across an IR in place.
//!
//! Consumes a parsed `FirewallConfig`, a user-supplied interface-rename map,
//! a zone-rename map, and a target-layout list of aggregate groups. Only
//! the first two mutate the IR; target-layout aggregates are NOT
//! materialized here — generators consume the layout list directly
//! (spec.md §4.4).

use crate::ir::FirewallConfig;
use std::collections::BTreeMap;
use tracing::debug;

/// One aggregate-interface group from the target layout: a name plus its
/// member interface names. Consumed directly by generators, never turned
/// into an `Interface` by the Mapper itself.
#[derive(Debug, Clone, Default)]
pub struct AggregateGroup {
    pub name: String,
    pub members: Vec<String>,
}

/// Mapper input: rename maps plus the target-layout aggregate list.
#[derive(Debug, Clone, Default)]
pub struct MapperOptions {
    pub interface_renames: BTreeMap<String, String>,
    pub zone_renames: BTreeMap<String, String>,
    pub target_layout: Vec<AggregateGroup>,
}

/// Rename every interface/zone reference in `config`, in place.
///
/// Applying with empty rename maps is a no-op (spec.md §8 idempotence
/// invariant): every rewrite below is a pass-through when its map doesn't
/// contain the looked-up key.
pub fn apply(config: &mut FirewallConfig, options: &MapperOptions) {
    let renamed_interfaces: BTreeMap<String, crate::ir::Interface> = std::mem::take(&mut config.interfaces)
        .into_iter()
        .map(|(old_name, mut iface)| {
            let new_name = options
                .interface_renames
                .get(&old_name)
                .cloned()
                .unwrap_or(old_name);
            iface.name = new_name.clone();
            if let Some(zone) = &iface.zone {
                if let Some(new_zone) = options.zone_renames.get(zone) {
                    iface.zone = Some(new_zone.clone());
                }
            }
            (new_name, iface)
        })
        .collect();
    config.interfaces = renamed_interfaces;

    for rule in &mut config.rules {
        rule.source_interfaces = rename_set(&rule.source_interfaces, &options.interface_renames);
        rule.destination_interfaces = rename_set(&rule.destination_interfaces, &options.interface_renames);
    }
    for nat in &mut config.nat_rules {
        nat.source_interfaces = rename_set(&nat.source_interfaces, &options.interface_renames);
        nat.destination_interfaces = rename_set(&nat.destination_interfaces, &options.interface_renames);
    }

    debug!(
        interfaces = config.interfaces.len(),
        aggregates = options.target_layout.len(),
        "mapper applied interface/zone renames"
    );
}

fn rename_set(
    set: &std::collections::BTreeSet<String>,
    renames: &BTreeMap<String, String>,
) -> std::collections::BTreeSet<String> {
    set.iter()
        .map(|name| renames.get(name).cloned().unwrap_or_else(|| name.clone()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{Interface, Rule, RuleAction};
    use std::collections::BTreeSet;

    #[test]
    fn identity_maps_are_a_no_op() {
        let mut config = FirewallConfig::new();
        config
            .interfaces
            .insert("eth0".to_string(), Interface::named("eth0"));
        let before = config.clone();

        apply(&mut config, &MapperOptions::default());
        assert_eq!(config, before);
    }

    #[test]
    fn renames_interface_name_and_rule_references() {
        let mut config = FirewallConfig::new();
        config
            .interfaces
            .insert("eth0".to_string(), Interface::named("eth0"));
        config.rules.push(Rule {
            sequence_id: 1,
            name: "r1".to_string(),
            action: RuleAction::Allow,
            enabled: true,
            log: true,
            hit_count: None,
            time_range: None,
            source_interfaces: ["eth0".to_string()].into_iter().collect(),
            destination_interfaces: BTreeSet::new(),
            sources: BTreeSet::new(),
            destinations: BTreeSet::new(),
            services: BTreeSet::new(),
            applications: BTreeSet::new(),
            remark: None,
        });

        let mut options = MapperOptions::default();
        options
            .interface_renames
            .insert("eth0".to_string(), "inside".to_string());

        apply(&mut config, &options);
        assert!(config.interfaces.contains_key("inside"));
        assert_eq!(
            config.rules[0].source_interfaces,
            ["inside".to_string()].into_iter().collect()
        );
    }

    #[test]
    fn zone_rename_applies_to_interface_zone() {
        let mut config = FirewallConfig::new();
        let mut iface = Interface::named("eth0");
        iface.zone = Some("trust".to_string());
        config.interfaces.insert("eth0".to_string(), iface);

        let mut options = MapperOptions::default();
        options.zone_renames.insert("trust".to_string(), "inside-zone".to_string());

        apply(&mut config, &options);
        assert_eq!(config.interfaces["eth0"].zone.as_deref(), Some("inside-zone"));
    }
}
