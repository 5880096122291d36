//! The normalized intermediate representation (IR).
//!
//! Plain data structures shared by every parser and generator. No behavior
//! beyond construction, deep-equality, and deterministic iteration over
//! containers (see `spec.md` §4.1).

pub mod config;
pub mod entities;

pub use config::{FirewallConfig, RESERVED_LITERALS};
pub use entities::{
    Address, AddressGroup, AddressKind, DYNAMIC_IP_AND_PORT, DYNAMIC_ROUTE_NEXT_HOP_SENTINEL,
    Interface, NatRule, Protocol, RESERVED_ALL, RESERVED_ANY, RouteKind, Rule, RuleAction,
    Service, ServiceGroup, Severity, StaticRoute, TimeRange, Warning, is_reserved_any,
    is_subset_with_universal, is_universal_set, normalize_port_spec,
};
