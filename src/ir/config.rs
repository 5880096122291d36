//! The IR container: `FirewallConfig`.

use super::entities::{
    Address, AddressGroup, Interface, NatRule, RESERVED_ALL, RESERVED_ANY, Rule, Service,
    ServiceGroup, StaticRoute, TimeRange, Warning, is_reserved_any,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};

/// The top-level container owning every IR entity for one request.
///
/// Constructed by exactly one parser invocation, optionally mutated in
/// place by the Mapper, then consumed read-only by the analyzer and by a
/// generator. See `spec.md` §3 "Lifecycle".
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FirewallConfig {
    pub interfaces: BTreeMap<String, Interface>,
    pub addresses: BTreeMap<String, Address>,
    pub services: BTreeMap<String, Service>,
    pub address_groups: BTreeMap<String, AddressGroup>,
    pub service_groups: BTreeMap<String, ServiceGroup>,
    pub time_ranges: BTreeMap<String, TimeRange>,
    pub static_routes: Vec<StaticRoute>,
    pub rules: Vec<Rule>,
    pub nat_rules: Vec<NatRule>,
    /// Raw text of any dynamic-routing protocol blocks (OSPF/BGP) the
    /// parser could not fully structure, preserved verbatim alongside the
    /// materialized `StaticRoute` entries (spec.md §4.2.1).
    pub dynamic_routing_config: Option<String>,
}

impl FirewallConfig {
    /// A fresh, empty configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rules in ascending sequence-id order. Parsers are expected to push
    /// rules in order already; this is the canonical read path so a caller
    /// never has to remember that invariant.
    #[must_use]
    pub fn rules_in_order(&self) -> Vec<&Rule> {
        let mut rules: Vec<&Rule> = self.rules.iter().collect();
        rules.sort_by_key(|r| r.sequence_id);
        rules
    }

    /// NAT rules in ascending sequence-id order.
    #[must_use]
    pub fn nat_rules_in_order(&self) -> Vec<&NatRule> {
        let mut rules: Vec<&NatRule> = self.nat_rules.iter().collect();
        rules.sort_by_key(|r| r.sequence_id);
        rules
    }

    /// Mint a name guaranteed not to collide with any existing address,
    /// service, group, or interface name, by appending a numeric suffix if
    /// needed. Used for synthesized inline services (`PROTO_PORTSPEC`) and
    /// implicit host/network objects (`host_IP`, `net_IP_CIDR`); see
    /// spec.md §9 "Synthesized-object naming".
    #[must_use]
    pub fn mint_unique_name(&self, candidate: &str) -> String {
        if !self.name_in_use(candidate) {
            return candidate.to_string();
        }
        let mut n = 2;
        loop {
            let attempt = format!("{candidate}_{n}");
            if !self.name_in_use(&attempt) {
                return attempt;
            }
            n += 1;
        }
    }

    fn name_in_use(&self, name: &str) -> bool {
        self.addresses.contains_key(name)
            || self.services.contains_key(name)
            || self.address_groups.contains_key(name)
            || self.service_groups.contains_key(name)
            || self.interfaces.contains_key(name)
    }

    /// Next sequence id for appending a rule to the end of the rule list.
    #[must_use]
    pub fn next_rule_sequence_id(&self) -> u32 {
        self.rules.iter().map(|r| r.sequence_id).max().map_or(1, |m| m + 1)
    }

    /// Next sequence id for appending a NAT rule to the end of the list.
    #[must_use]
    pub fn next_nat_sequence_id(&self) -> u32 {
        self.nat_rules
            .iter()
            .map(|r| r.sequence_id)
            .max()
            .map_or(1, |m| m + 1)
    }

    /// Iteratively expand an address-group (or service-group) membership
    /// into a flat set of leaf member names, tolerating unresolved
    /// references (they pass through as literal names) and detecting
    /// cycles via a visited-set rather than recursing unboundedly.
    ///
    /// Returns the flattened membership plus an optional cycle warning.
    #[must_use]
    pub fn resolve_address_group_members(&self, group_name: &str) -> (BTreeSet<String>, Option<Warning>) {
        let mut result = BTreeSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack = vec![group_name.to_string()];
        let mut cycle = false;

        while let Some(name) = stack.pop() {
            if is_reserved_any(&name) {
                result.insert(name);
                continue;
            }
            if !visited.insert(name.clone()) {
                if name != group_name {
                    cycle = true;
                }
                continue;
            }
            if let Some(group) = self.address_groups.get(&name) {
                for member in &group.members {
                    stack.push(member.clone());
                }
            } else {
                // Leaf: an address, or an unresolved/dangling reference.
                result.insert(name);
            }
        }

        let warning = cycle.then(|| {
            Warning::warn(
                "group-cycle",
                format!("address-group '{group_name}' has a circular membership reference"),
            )
        });
        (result, warning)
    }

    /// Same expansion as `resolve_address_group_members`, for service
    /// groups.
    #[must_use]
    pub fn resolve_service_group_members(&self, group_name: &str) -> (BTreeSet<String>, Option<Warning>) {
        let mut result = BTreeSet::new();
        let mut visited: HashSet<String> = HashSet::new();
        let mut stack = vec![group_name.to_string()];
        let mut cycle = false;

        while let Some(name) = stack.pop() {
            if is_reserved_any(&name) {
                result.insert(name);
                continue;
            }
            if !visited.insert(name.clone()) {
                if name != group_name {
                    cycle = true;
                }
                continue;
            }
            if let Some(group) = self.service_groups.get(&name) {
                for member in &group.members {
                    stack.push(member.clone());
                }
            } else {
                result.insert(name);
            }
        }

        let warning = cycle.then(|| {
            Warning::warn(
                "group-cycle",
                format!("service-group '{group_name}' has a circular membership reference"),
            )
        });
        (result, warning)
    }

    /// Look up an `Address` by name, falling back to recognizing the
    /// reserved `any`/`all` literals (which never resolve to an entity).
    #[must_use]
    pub fn find_address(&self, name: &str) -> Option<&Address> {
        if is_reserved_any(name) {
            return None;
        }
        self.addresses.get(name)
    }

    /// Every name referenced anywhere that does not resolve to an IR
    /// entity and is not a reserved literal — the "Reference dangling"
    /// condition from spec.md §7, tolerated but enumerable for diagnostics.
    #[must_use]
    pub fn dangling_references(&self) -> BTreeSet<String> {
        let mut referenced = BTreeSet::new();
        for rule in &self.rules {
            referenced.extend(rule.sources.iter().cloned());
            referenced.extend(rule.destinations.iter().cloned());
            referenced.extend(rule.services.iter().cloned());
        }
        for nat in &self.nat_rules {
            referenced.extend(nat.original_sources.iter().cloned());
            referenced.extend(nat.original_destinations.iter().cloned());
            referenced.extend(nat.original_services.iter().cloned());
        }
        referenced
            .into_iter()
            .filter(|name| {
                !is_reserved_any(name)
                    && !self.addresses.contains_key(name)
                    && !self.address_groups.contains_key(name)
                    && !self.services.contains_key(name)
                    && !self.service_groups.contains_key(name)
            })
            .collect()
    }
}

/// Convenience constant list of the reserved literals, for generators that
/// need to rewrite casing (`Any`/`ALL` → `any`).
pub const RESERVED_LITERALS: [&str; 2] = [RESERVED_ANY, RESERVED_ALL];

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::entities::AddressKind;

    fn addr(name: &str) -> Address {
        Address {
            name: name.to_string(),
            kind: AddressKind::Host,
            value1: "1.2.3.4".to_string(),
            value2: None,
        }
    }

    #[test]
    fn mint_unique_name_avoids_collision() {
        let mut cfg = FirewallConfig::new();
        cfg.addresses.insert("host_1.2.3.4".to_string(), addr("host_1.2.3.4"));
        assert_eq!(cfg.mint_unique_name("host_1.2.3.4"), "host_1.2.3.4_2");
        assert_eq!(cfg.mint_unique_name("host_9.9.9.9"), "host_9.9.9.9");
    }

    #[test]
    fn resolve_address_group_flattens_nested_groups() {
        let mut cfg = FirewallConfig::new();
        cfg.addresses.insert("web1".to_string(), addr("web1"));
        cfg.addresses.insert("web2".to_string(), addr("web2"));
        cfg.address_groups.insert(
            "inner".to_string(),
            AddressGroup {
                name: "inner".to_string(),
                members: ["web2".to_string()].into_iter().collect(),
            },
        );
        cfg.address_groups.insert(
            "outer".to_string(),
            AddressGroup {
                name: "outer".to_string(),
                members: ["web1".to_string(), "inner".to_string()].into_iter().collect(),
            },
        );

        let (members, warning) = cfg.resolve_address_group_members("outer");
        assert!(warning.is_none());
        assert_eq!(members, ["web1".to_string(), "web2".to_string()].into_iter().collect());
    }

    #[test]
    fn resolve_address_group_detects_cycle() {
        let mut cfg = FirewallConfig::new();
        cfg.address_groups.insert(
            "a".to_string(),
            AddressGroup {
                name: "a".to_string(),
                members: ["b".to_string()].into_iter().collect(),
            },
        );
        cfg.address_groups.insert(
            "b".to_string(),
            AddressGroup {
                name: "b".to_string(),
                members: ["a".to_string()].into_iter().collect(),
            },
        );

        let (_, warning) = cfg.resolve_address_group_members("a");
        assert!(warning.is_some());
    }

    #[test]
    fn dangling_references_excludes_reserved_and_known() {
        let mut cfg = FirewallConfig::new();
        cfg.addresses.insert("web1".to_string(), addr("web1"));
        cfg.rules.push(Rule {
            sequence_id: 1,
            name: "r1".to_string(),
            action: crate::ir::entities::RuleAction::Allow,
            enabled: true,
            log: true,
            hit_count: None,
            time_range: None,
            source_interfaces: BTreeSet::new(),
            destination_interfaces: BTreeSet::new(),
            sources: ["any".to_string()].into_iter().collect(),
            destinations: ["web1".to_string(), "ghost".to_string()].into_iter().collect(),
            services: BTreeSet::new(),
            applications: BTreeSet::new(),
            remark: None,
        });

        let dangling = cfg.dangling_references();
        assert_eq!(dangling, ["ghost".to_string()].into_iter().collect());
    }
}
