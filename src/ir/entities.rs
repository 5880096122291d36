//! IR entity types.
//!
//! Plain data only: no I/O, no parsing, no formatting beyond `Display` for
//! diagnostics. See `ir::config::FirewallConfig` for the container that
//! owns all of these.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// A literal reference value tolerated anywhere a member-name is expected.
pub const RESERVED_ANY: &str = "any";
/// A literal reference value tolerated anywhere a member-name is expected.
pub const RESERVED_ALL: &str = "all";

/// Sentinel translated-source value meaning interface-PAT masquerade.
pub const DYNAMIC_IP_AND_PORT: &str = "dynamic-ip-and-port";

/// True if `name` is one of the reserved match-anything literals.
#[must_use]
pub fn is_reserved_any(name: &str) -> bool {
    name.eq_ignore_ascii_case(RESERVED_ANY) || name.eq_ignore_ascii_case(RESERVED_ALL)
}

/// A network interface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interface {
    /// Identity: unique within the config.
    pub name: String,
    /// Security zone, if the source vendor models one.
    pub zone: Option<String>,
    /// IPv4 address, if assigned.
    pub ipv4_address: Option<String>,
    /// Prefix length paired with `ipv4_address`.
    pub prefix_len: Option<u8>,
    /// Free-text description.
    pub description: Option<String>,
    /// VLAN id, for VLAN sub-interfaces.
    pub vlan_id: Option<u16>,
    /// Member interfaces, for an aggregate (LACP) interface synthesized by
    /// the Mapper's target-layout or discovered during parsing. Explicit
    /// optional field rather than a monkey-patched attribute (see
    /// spec.md §9 Open Questions).
    pub aggregate_members: Option<Vec<String>>,
}

impl Interface {
    /// A bare interface with only a name; all other fields unset.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            zone: None,
            ipv4_address: None,
            prefix_len: None,
            description: None,
            vlan_id: None,
            aggregate_members: None,
        }
    }
}

/// Kind of address object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AddressKind {
    /// A single host.
    Host,
    /// A network: value1 = base IP, value2 = CIDR prefix length as text.
    Network,
    /// An IP range: value1 = start, value2 = end.
    Range,
    /// A fully-qualified domain name, possibly wildcarded (`*.example.com`).
    Fqdn,
}

/// An address object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Address {
    /// Identity: unique within the config.
    pub name: String,
    /// Kind of address.
    pub kind: AddressKind,
    /// Primary value; meaning depends on `kind` (see `AddressKind`).
    pub value1: String,
    /// Secondary value; meaning depends on `kind` (see `AddressKind`).
    pub value2: Option<String>,
}

impl Address {
    /// Canonical fingerprint used by the analyzer's duplicate detector, and
    /// by generators that need to recognize "is this the same address under
    /// a different name" (e.g. Fortinet VIP naming precedence).
    #[must_use]
    pub fn fingerprint(&self) -> String {
        match self.kind {
            AddressKind::Host => format!("host:{}", self.value1),
            AddressKind::Network => format!(
                "network:{}/{}",
                self.value1,
                self.value2.as_deref().unwrap_or("")
            ),
            AddressKind::Range => format!(
                "range:{}-{}",
                self.value1,
                self.value2.as_deref().unwrap_or("")
            ),
            AddressKind::Fqdn => format!("fqdn:{}", self.value1.to_ascii_lowercase()),
        }
    }

    /// True if this is a wildcard FQDN (`*.example.com`), the one kind no
    /// target vendor expresses as a plain address object.
    #[must_use]
    pub fn is_wildcard_fqdn(&self) -> bool {
        self.kind == AddressKind::Fqdn && self.value1.starts_with('*')
    }

    /// True if this is a range whose start equals its end, i.e. a host in
    /// disguise (spec.md §8 boundary behavior).
    #[must_use]
    pub fn is_degenerate_range(&self) -> bool {
        self.kind == AddressKind::Range && self.value2.as_deref() == Some(self.value1.as_str())
    }
}

/// Protocol carried by a `Service`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Protocol {
    Tcp,
    Udp,
    Icmp,
    Ip,
    Other,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Tcp => "tcp",
            Self::Udp => "udp",
            Self::Icmp => "icmp",
            Self::Ip => "ip",
            Self::Other => "other",
        };
        write!(f, "{s}")
    }
}

/// A service (port/protocol) object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Service {
    /// Identity: unique within the config.
    pub name: String,
    /// Transport protocol.
    pub protocol: Protocol,
    /// Free-text port spec, e.g. `"eq 80"`, `"range 1024 2048"`, `""`.
    pub port_spec: String,
}

impl Service {
    /// Canonical fingerprint used by the analyzer's duplicate detector.
    #[must_use]
    pub fn fingerprint(&self) -> String {
        format!("{}:{}", self.protocol, normalize_port_spec(&self.port_spec))
    }
}

/// Normalize a free-text port spec for fingerprinting / canonicalization:
/// strip an `eq ` prefix, join `range A B` as `A-B`, trim whitespace.
#[must_use]
pub fn normalize_port_spec(spec: &str) -> String {
    let trimmed = spec.trim();
    if let Some(rest) = trimmed.strip_prefix("eq ") {
        return rest.trim().to_string();
    }
    if let Some(rest) = trimmed.strip_prefix("range ") {
        let parts: Vec<&str> = rest.split_whitespace().collect();
        if parts.len() == 2 {
            return format!("{}-{}", parts[0], parts[1]);
        }
    }
    trimmed.to_string()
}

/// A named group of addresses (which may themselves be address-groups).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddressGroup {
    /// Identity: unique within the config (shares the Address namespace by
    /// convention, but not enforced in the IR itself).
    pub name: String,
    /// Member names: other addresses, other address-groups, or a reserved
    /// literal (`any`/`all`).
    pub members: BTreeSet<String>,
}

/// A named group of services (which may themselves be service-groups).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ServiceGroup {
    /// Identity: unique within the config.
    pub name: String,
    /// Member names: other services, other service-groups, or a reserved
    /// literal.
    pub members: BTreeSet<String>,
}

/// A named time range used to gate rule matching.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeRange {
    pub name: String,
    pub start: String,
    pub end: String,
}

/// Kind of routing entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteKind {
    Static,
    Ospf,
    Bgp,
    Other(String),
}

/// Sentinel next-hop used for dynamic-routing entries materialized into
/// `StaticRoute` purely so a UI can list them alongside real static routes.
pub const DYNAMIC_ROUTE_NEXT_HOP_SENTINEL: &str = "dynamic";

/// A static (or dynamic-materialized) route.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticRoute {
    /// Destination in CIDR notation.
    pub destination: String,
    /// Next-hop IP, or `DYNAMIC_ROUTE_NEXT_HOP_SENTINEL` for materialized
    /// dynamic-routing entries.
    pub next_hop: String,
    /// Egress interface, if known.
    pub interface: Option<String>,
    /// Administrative distance.
    pub admin_distance: u8,
    /// Kind of route.
    pub kind: RouteKind,
}

/// Action a security rule takes on a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleAction {
    Allow,
    Deny,
}

/// A security policy rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Match order: lower matches first.
    pub sequence_id: u32,
    pub name: String,
    pub action: RuleAction,
    pub enabled: bool,
    pub log: bool,
    pub hit_count: Option<u64>,
    pub time_range: Option<String>,
    pub source_interfaces: BTreeSet<String>,
    pub destination_interfaces: BTreeSet<String>,
    pub sources: BTreeSet<String>,
    pub destinations: BTreeSet<String>,
    pub services: BTreeSet<String>,
    pub applications: BTreeSet<String>,
    pub remark: Option<String>,
}

impl Rule {
    /// True if every one of source/destination/service is `any`/`all`/empty
    /// (the critical security-risk predicate: allow-any-any-any).
    #[must_use]
    pub fn is_fully_open(&self) -> bool {
        is_universal_set(&self.sources)
            && is_universal_set(&self.destinations)
            && is_universal_set(&self.services)
    }
}

/// True if a set is empty or contains only reserved match-anything
/// literals — used by both the shadow-subset check and the "fully open"
/// risk predicate.
#[must_use]
pub fn is_universal_set(set: &BTreeSet<String>) -> bool {
    set.is_empty() || set.iter().all(|s| is_reserved_any(s))
}

/// True if `narrower` is a subset of `broader`, treating a universal
/// `broader` set as matching everything (spec.md §4.3 shadow detection,
/// §8 invariant).
#[must_use]
pub fn is_subset_with_universal(narrower: &BTreeSet<String>, broader: &BTreeSet<String>) -> bool {
    if is_universal_set(broader) {
        return true;
    }
    if is_universal_set(narrower) {
        // narrower is universal but broader is not: narrower can never be
        // a subset of a non-universal set.
        return false;
    }
    narrower.is_subset(broader)
}

/// A NAT rule.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NatRule {
    pub sequence_id: u32,
    pub name: String,
    pub enabled: bool,
    pub original_sources: BTreeSet<String>,
    pub original_destinations: BTreeSet<String>,
    pub original_services: BTreeSet<String>,
    pub source_interfaces: BTreeSet<String>,
    pub destination_interfaces: BTreeSet<String>,
    /// `DYNAMIC_IP_AND_PORT` sentinel means interface-PAT masquerade.
    pub translated_source: Option<String>,
    pub translated_destination: Option<String>,
    pub translated_service: Option<String>,
}

impl NatRule {
    /// True if source translation is interface-PAT masquerade.
    #[must_use]
    pub fn is_interface_pat(&self) -> bool {
        self.translated_source.as_deref() == Some(DYNAMIC_IP_AND_PORT)
    }

    /// True if this is a destination-NAT rule (translated destination
    /// differs from the original) — the condition that drives Fortinet VIP
    /// synthesis and Palo Alto DNAT-aware rewriting.
    #[must_use]
    pub fn is_dnat(&self) -> bool {
        match &self.translated_destination {
            Some(translated) => !self.original_destinations.contains(translated),
            None => false,
        }
    }
}

/// Severity of a `Warning`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Info,
    Warning,
    Error,
}

/// A structured warning collected by a parser, generator, or the analyzer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Warning {
    pub category: String,
    pub severity: Severity,
    pub message: String,
    pub rule_id: Option<String>,
    pub original_line: Option<String>,
    pub detail_lines: Vec<String>,
}

impl Warning {
    /// Build an `info`-severity warning with just a category and message.
    #[must_use]
    pub fn info(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            severity: Severity::Info,
            message: message.into(),
            rule_id: None,
            original_line: None,
            detail_lines: Vec::new(),
        }
    }

    /// Build a `warning`-severity warning with just a category and message.
    #[must_use]
    pub fn warn(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            severity: Severity::Warning,
            message: message.into(),
            rule_id: None,
            original_line: None,
            detail_lines: Vec::new(),
        }
    }

    /// Build an `error`-severity warning with just a category and message.
    #[must_use]
    pub fn error(category: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            category: category.into(),
            severity: Severity::Error,
            message: message.into(),
            rule_id: None,
            original_line: None,
            detail_lines: Vec::new(),
        }
    }

    /// Attach the original source line to this warning.
    #[must_use]
    pub fn with_line(mut self, line: impl Into<String>) -> Self {
        self.original_line = Some(line.into());
        self
    }

    /// Attach nested detail lines (e.g. a dropped config block) to this
    /// warning.
    #[must_use]
    pub fn with_details(mut self, details: Vec<String>) -> Self {
        self.detail_lines = details;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn address_fingerprint_is_kind_aware() {
        let a = Address {
            name: "a".into(),
            kind: AddressKind::Network,
            value1: "10.0.0.0".into(),
            value2: Some("24".into()),
        };
        assert_eq!(a.fingerprint(), "network:10.0.0.0/24");
    }

    #[test]
    fn degenerate_range_detection() {
        let a = Address {
            name: "r".into(),
            kind: AddressKind::Range,
            value1: "10.0.0.5".into(),
            value2: Some("10.0.0.5".into()),
        };
        assert!(a.is_degenerate_range());
    }

    #[test]
    fn normalize_port_spec_strips_eq_and_joins_range() {
        assert_eq!(normalize_port_spec("eq 80"), "80");
        assert_eq!(normalize_port_spec("range 1024 2048"), "1024-2048");
        assert_eq!(normalize_port_spec(""), "");
    }

    #[test]
    fn universal_set_detection() {
        let mut set = BTreeSet::new();
        assert!(is_universal_set(&set));
        set.insert("any".to_string());
        assert!(is_universal_set(&set));
        set.insert("10.0.0.0/8".to_string());
        assert!(!is_universal_set(&set));
    }

    #[test]
    fn subset_with_universal_broader_matches_anything() {
        let broader: BTreeSet<String> = ["any".to_string()].into_iter().collect();
        let narrower: BTreeSet<String> = ["1.2.3.4".to_string()].into_iter().collect();
        assert!(is_subset_with_universal(&narrower, &broader));
    }

    #[test]
    fn is_dnat_requires_destination_change() {
        let base = NatRule {
            sequence_id: 1,
            name: "n".into(),
            enabled: true,
            original_sources: BTreeSet::new(),
            original_destinations: ["203.0.113.5".to_string()].into_iter().collect(),
            original_services: BTreeSet::new(),
            source_interfaces: BTreeSet::new(),
            destination_interfaces: BTreeSet::new(),
            translated_source: None,
            translated_destination: Some("10.0.0.5".to_string()),
            translated_service: None,
        };
        assert!(base.is_dnat());

        let mut same = base.clone();
        same.translated_destination = Some("203.0.113.5".to_string());
        assert!(!same.is_dnat());
    }
}
