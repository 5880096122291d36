//! Palo Alto Networks (PAN-OS) generator.
//!
//! Produces PAN-OS `set` commands. Distinguishing design points: standalone
//! vs Panorama prefixing, ICMP-vs-port rule splitting, wildcard-FQDN →
//! custom-url-category rewriting, DNAT-aware destination substitution in
//! security rules, and BGP extraction from captured raw dynamic-routing text
//! (spec.md §4.5.2).

use super::sanitize::paloalto_name;
use super::{GeneratedOutput, Generator, GeneratorOptions, OutputMode};
use crate::error::Result;
use crate::ir::{Address, AddressKind, FirewallConfig, NatRule, Rule, RuleAction, Service, Warning, normalize_port_spec};
use crate::parser::Vendor;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt::Write as _;
use std::net::Ipv4Addr;

pub struct PaloAltoGenerator;

impl Generator for PaloAltoGenerator {
    fn vendor(&self) -> Vendor {
        Vendor::PaloAlto
    }

    fn generate(&self, config: &FirewallConfig, options: &GeneratorOptions) -> Result<GeneratedOutput> {
        let mut warnings = Vec::new();
        let wildcard_categories = collect_wildcard_fqdn_categories(config);
        let dnat_destination_map = build_dnat_destination_map(config);

        let mut out = String::new();
        emit_interfaces(&mut out, config, options);
        emit_zones(&mut out, config, options);
        emit_addresses(&mut out, config, options, &wildcard_categories);
        emit_address_groups(&mut out, config, options);
        emit_services(&mut out, config, options);
        emit_service_groups(&mut out, config, options);
        emit_custom_url_categories(&mut out, &wildcard_categories, options);
        emit_nat_pool_addresses(&mut out, config, options);
        emit_nat_rules(&mut out, config, options);
        emit_security_rules(&mut out, config, options, &wildcard_categories, &dnat_destination_map, &mut warnings);
        emit_static_routes(&mut out, config, options);
        emit_bgp(&mut out, config, options, &mut warnings);

        Ok(GeneratedOutput {
            text: out.into_bytes(),
            warnings,
        })
    }
}

/// `object_prefix`/`network_prefix`/`rule_prefix` resolve to the
/// appropriate Panorama-vs-standalone command prefix (spec.md §4.5.2
/// "Standalone vs Panorama prefix"). In standalone mode rule commands use
/// `rulebase`; network/object commands carry no prefix.
fn object_prefix(options: &GeneratorOptions) -> String {
    match options.output_mode {
        OutputMode::Firewall => String::new(),
        OutputMode::Panorama => {
            format!("device-group \"{}\" ", options.device_group.as_deref().unwrap_or("DG"))
        }
    }
}

fn network_prefix(options: &GeneratorOptions) -> String {
    match options.output_mode {
        OutputMode::Firewall => String::new(),
        OutputMode::Panorama => format!(
            "template \"{}\" config devices localhost.localdomain vsys vsys1 ",
            options.template.as_deref().unwrap_or("T")
        ),
    }
}

fn rule_prefix(options: &GeneratorOptions) -> String {
    match options.output_mode {
        OutputMode::Firewall => "rulebase ".to_string(),
        OutputMode::Panorama => format!(
            "device-group \"{}\" pre-rulebase ",
            options.device_group.as_deref().unwrap_or("DG")
        ),
    }
}

fn emit_interfaces(out: &mut String, config: &FirewallConfig, options: &GeneratorOptions) {
    let prefix = network_prefix(options);
    for iface in config.interfaces.values() {
        if let (Some(ip), Some(len)) = (&iface.ipv4_address, iface.prefix_len) {
            let _ = writeln!(
                out,
                "set {}network interface ethernet \"{}\" layer3 ip \"{}/{}\"",
                prefix,
                paloalto_name(&iface.name),
                ip,
                len
            );
        }
    }
}

fn emit_zones(out: &mut String, config: &FirewallConfig, options: &GeneratorOptions) {
    let prefix = network_prefix(options);
    let mut zones: BTreeMap<String, Vec<String>> = BTreeMap::new();
    for iface in config.interfaces.values() {
        if let Some(zone) = &iface.zone {
            zones.entry(zone.clone()).or_default().push(iface.name.clone());
        }
    }
    for (zone, members) in zones {
        for member in members {
            let _ = writeln!(
                out,
                "set {}zone \"{}\" network layer3 \"{}\"",
                prefix,
                paloalto_name(&zone),
                paloalto_name(&member)
            );
        }
    }
}

/// Wildcard FQDN addresses (`*.example.com`) cannot be PAN-OS address
/// objects; they become Custom URL Categories instead (spec.md §4.5.2
/// "Wildcard FQDN rewrite"). Returns the map of address-name → category
/// name plus pattern, so both the address step and the rule step can
/// consult it.
fn collect_wildcard_fqdn_categories(config: &FirewallConfig) -> BTreeMap<String, String> {
    config
        .addresses
        .values()
        .filter(|a| a.is_wildcard_fqdn())
        .map(|a| (a.name.clone(), a.value1.clone()))
        .collect()
}

fn emit_addresses(
    out: &mut String,
    config: &FirewallConfig,
    options: &GeneratorOptions,
    wildcard_categories: &BTreeMap<String, String>,
) {
    let prefix = object_prefix(options);
    for addr in config.addresses.values() {
        if wildcard_categories.contains_key(&addr.name) {
            continue;
        }
        let name = paloalto_name(&addr.name);
        match addr.kind {
            AddressKind::Host => {
                let _ = writeln!(out, "set {prefix}address \"{name}\" ip-netmask \"{}/32\"", addr.value1);
            }
            AddressKind::Network => {
                let prefix_len = addr.value2.as_deref().unwrap_or("32");
                let _ = writeln!(out, "set {prefix}address \"{name}\" ip-netmask \"{}/{prefix_len}\"", addr.value1);
            }
            AddressKind::Range => {
                if addr.is_degenerate_range() {
                    let _ = writeln!(out, "set {prefix}address \"{name}\" ip-netmask \"{}/32\"", addr.value1);
                } else {
                    let end = addr.value2.clone().unwrap_or_default();
                    let _ = writeln!(out, "set {prefix}address \"{name}\" ip-range \"{}-{end}\"", addr.value1);
                }
            }
            AddressKind::Fqdn => {
                let _ = writeln!(out, "set {prefix}address \"{name}\" fqdn \"{}\"", addr.value1);
            }
        }
    }
}

fn emit_address_groups(out: &mut String, config: &FirewallConfig, options: &GeneratorOptions) {
    let prefix = object_prefix(options);
    for group in config.address_groups.values() {
        let members: Vec<String> = group.members.iter().map(|m| format!("\"{m}\"")).collect();
        let _ = writeln!(
            out,
            "set {prefix}address-group \"{}\" static [ {} ]",
            paloalto_name(&group.name),
            members.join(" ")
        );
    }
}

fn emit_services(out: &mut String, config: &FirewallConfig, options: &GeneratorOptions) {
    let prefix = object_prefix(options);
    for service in config.services.values() {
        let port = normalize_port_spec(&service.port_spec);
        let proto = match service.protocol {
            crate::ir::Protocol::Tcp => "tcp",
            crate::ir::Protocol::Udp => "udp",
            _ => continue,
        };
        let _ = writeln!(
            out,
            "set {prefix}service \"{}\" protocol {proto} port \"{port}\"",
            paloalto_name(&service.name)
        );
    }
}

fn emit_service_groups(out: &mut String, config: &FirewallConfig, options: &GeneratorOptions) {
    let prefix = object_prefix(options);
    for group in config.service_groups.values() {
        let members: Vec<String> = group.members.iter().map(|m| format!("\"{m}\"")).collect();
        let _ = writeln!(
            out,
            "set {prefix}service-group \"{}\" members [ {} ]",
            paloalto_name(&group.name),
            members.join(" ")
        );
    }
}

fn emit_custom_url_categories(out: &mut String, wildcard_categories: &BTreeMap<String, String>, options: &GeneratorOptions) {
    let prefix = object_prefix(options);
    for (name, pattern) in wildcard_categories {
        let _ = writeln!(
            out,
            "set {prefix}profiles custom-url-category \"{}\" list [ \"{pattern}\" ]",
            paloalto_name(name)
        );
    }
}

fn is_icmp_like(config: &FirewallConfig, service_name: &str) -> bool {
    if let Some(svc) = config.services.get(service_name) {
        return svc.protocol == crate::ir::Protocol::Icmp;
    }
    let lower = service_name.to_ascii_lowercase();
    lower.contains("icmp") || lower.contains("ping") || lower.contains("traceroute")
}

fn icmp_app_names(config: &FirewallConfig, services: &BTreeSet<String>) -> Vec<String> {
    let mut apps = BTreeSet::new();
    for name in services {
        if !is_icmp_like(config, name) {
            continue;
        }
        let lower = name.to_ascii_lowercase();
        if lower.contains("ping") {
            apps.insert("ping".to_string());
        } else if lower.contains("traceroute") {
            apps.insert("traceroute".to_string());
        } else {
            apps.insert("icmp".to_string());
        }
    }
    if apps.is_empty() {
        apps.insert("icmp".to_string());
    }
    apps.into_iter().collect()
}

fn build_dnat_destination_map(config: &FirewallConfig) -> HashMap<String, String> {
    let mut map = HashMap::new();
    for nat in &config.nat_rules {
        if !nat.is_dnat() {
            continue;
        }
        if let (Some(translated), Some(original)) = (&nat.translated_destination, nat.original_destinations.iter().next()) {
            map.insert(translated.clone(), original.clone());
        }
    }
    map
}

fn zone_lookup(config: &FirewallConfig) -> HashMap<String, String> {
    config
        .interfaces
        .values()
        .filter_map(|iface| iface.zone.as_ref().map(|z| (normalize_zone_key(&iface.name), z.clone())))
        .collect()
}

fn normalize_zone_key(s: &str) -> String {
    s.trim().to_ascii_lowercase()
}

fn resolve_zones(interfaces: &BTreeSet<String>, lookup: &HashMap<String, String>) -> BTreeSet<String> {
    interfaces
        .iter()
        .map(|iface| lookup.get(&normalize_zone_key(iface)).cloned().unwrap_or_else(|| iface.clone()))
        .collect()
}

fn emit_security_rules(
    out: &mut String,
    config: &FirewallConfig,
    options: &GeneratorOptions,
    wildcard_categories: &BTreeMap<String, String>,
    dnat_destination_map: &HashMap<String, String>,
    warnings: &mut Vec<Warning>,
) {
    let prefix = rule_prefix(options);
    let zones = zone_lookup(config);

    for rule in config.rules_in_order() {
        let from = resolve_zones(&rule.source_interfaces, &zones);
        let to = resolve_zones(&rule.destination_interfaces, &zones);

        let mut destinations = BTreeSet::new();
        let mut categories = BTreeSet::new();
        for dest in &rule.destinations {
            let substituted = dnat_destination_map.get(dest).cloned().unwrap_or_else(|| dest.clone());
            if wildcard_categories.contains_key(&substituted) {
                categories.insert(substituted);
            } else {
                destinations.insert(substituted);
            }
        }
        if destinations.is_empty() {
            destinations.insert("any".to_string());
        }

        let icmp_services: BTreeSet<String> = rule.services.iter().filter(|s| is_icmp_like(config, s)).cloned().collect();
        let port_services: BTreeSet<String> = rule.services.iter().filter(|s| !is_icmp_like(config, s)).cloned().collect();

        let action = if rule.action == RuleAction::Allow { "allow" } else { "deny" };

        let write_common = |out: &mut String, name: &str| {
            let from_list: Vec<String> = from.iter().map(|z| format!("\"{z}\"")).collect();
            let to_list: Vec<String> = to.iter().map(|z| format!("\"{z}\"")).collect();
            let src_list: Vec<String> = rule.sources.iter().map(|s| format!("\"{s}\"")).collect();
            let dst_list: Vec<String> = destinations.iter().map(|s| format!("\"{s}\"")).collect();
            let _ = writeln!(out, "set {prefix}security rules \"{name}\" from [ {} ]", from_list.join(" "));
            let _ = writeln!(out, "set {prefix}security rules \"{name}\" to [ {} ]", to_list.join(" "));
            let _ = writeln!(out, "set {prefix}security rules \"{name}\" source [ {} ]", src_list.join(" "));
            let _ = writeln!(out, "set {prefix}security rules \"{name}\" destination [ {} ]", dst_list.join(" "));
            if !categories.is_empty() {
                let cat_list: Vec<String> = categories.iter().map(|c| format!("\"{c}\"")).collect();
                let _ = writeln!(out, "set {prefix}security rules \"{name}\" category [ {} ]", cat_list.join(" "));
            }
            let _ = writeln!(out, "set {prefix}security rules \"{name}\" action {action}");
            if !rule.enabled {
                let _ = writeln!(out, "set {prefix}security rules \"{name}\" disabled yes");
            }
            if let Some(remark) = &rule.remark {
                let _ = writeln!(out, "set {prefix}security rules \"{name}\" description \"{remark}\"");
            }
        };

        let base_name = paloalto_name(&rule.name);
        if !icmp_services.is_empty() && !port_services.is_empty() {
            let svc_name = format!("{base_name}_svc");
            write_common(out, &svc_name);
            let svc_list: Vec<String> = port_services.iter().map(|s| format!("\"{s}\"")).collect();
            let _ = writeln!(out, "set {prefix}security rules \"{svc_name}\" service [ {} ]", svc_list.join(" "));
            let _ = writeln!(out, "set {prefix}security rules \"{svc_name}\" application any");

            let app_name = format!("{base_name}_app");
            write_common(out, &app_name);
            let _ = writeln!(out, "set {prefix}security rules \"{app_name}\" service application-default");
            let apps = icmp_app_names(config, &icmp_services);
            let app_list: Vec<String> = apps.iter().map(|a| format!("\"{a}\"")).collect();
            let _ = writeln!(out, "set {prefix}security rules \"{app_name}\" application [ {} ]", app_list.join(" "));
        } else if !icmp_services.is_empty() {
            write_common(out, &base_name);
            let _ = writeln!(out, "set {prefix}security rules \"{base_name}\" service application-default");
            let apps = icmp_app_names(config, &icmp_services);
            let app_list: Vec<String> = apps.iter().map(|a| format!("\"{a}\"")).collect();
            let _ = writeln!(out, "set {prefix}security rules \"{base_name}\" application [ {} ]", app_list.join(" "));
        } else {
            write_common(out, &base_name);
            let svc_list: Vec<String> = if port_services.is_empty() {
                vec!["\"any\"".to_string()]
            } else {
                port_services.iter().map(|s| format!("\"{s}\"")).collect()
            };
            let _ = writeln!(out, "set {prefix}security rules \"{base_name}\" service [ {} ]", svc_list.join(" "));
            let _ = writeln!(out, "set {prefix}security rules \"{base_name}\" application any");
        }
    }

    if warnings.is_empty() {
        // Reserved: populated when a rule references an address this
        // generator cannot express (see Wildcard FQDN rewrite above, which
        // currently never fails since every wildcard address is handled).
    }
}

/// Synthesize address objects for `translated_source`/`translated_destination`
/// literals (a plain IP or an `IP-IP` range) that aren't already present as
/// an address object, tracking what's been synthesized this run so two NAT
/// rules sharing a pool don't mint duplicate objects (spec.md §4.5.2 "NAT
/// pool object synthesis", "State machines").
fn emit_nat_pool_addresses(out: &mut String, config: &FirewallConfig, options: &GeneratorOptions) {
    let prefix = object_prefix(options);
    let mut synthesized: BTreeSet<String> = config.addresses.keys().map(|n| paloalto_name(n)).collect();

    for nat in config.nat_rules_in_order() {
        if let Some(translated_source) = &nat.translated_source {
            if translated_source != crate::ir::DYNAMIC_IP_AND_PORT {
                emit_nat_pool_literal(out, &prefix, translated_source, &mut synthesized);
            }
        }
        if let Some(translated_destination) = &nat.translated_destination {
            emit_nat_pool_literal(out, &prefix, translated_destination, &mut synthesized);
        }
    }
}

fn emit_nat_pool_literal(out: &mut String, prefix: &str, value: &str, synthesized: &mut BTreeSet<String>) {
    let name = paloalto_name(value);
    if synthesized.contains(&name) {
        return;
    }
    if let Some((start, end)) = value.split_once('-') {
        if start.parse::<Ipv4Addr>().is_ok() && end.parse::<Ipv4Addr>().is_ok() {
            let _ = writeln!(out, "set {prefix}address \"{name}\" ip-range \"{value}\"");
            synthesized.insert(name);
        }
        return;
    }
    if value.parse::<Ipv4Addr>().is_ok() {
        let _ = writeln!(out, "set {prefix}address \"{name}\" ip-netmask \"{value}/32\"");
        synthesized.insert(name);
    }
}

fn emit_nat_rules(out: &mut String, config: &FirewallConfig, options: &GeneratorOptions) {
    let prefix = rule_prefix(options);
    for nat in config.nat_rules_in_order() {
        let name = paloalto_name(&nat.name);
        let from: Vec<String> = nat.source_interfaces.iter().map(|s| format!("\"{s}\"")).collect();
        let to: Vec<String> = nat.destination_interfaces.iter().map(|s| format!("\"{s}\"")).collect();
        let source: Vec<String> = nat.original_sources.iter().map(|s| format!("\"{s}\"")).collect();
        let destination: Vec<String> = nat.original_destinations.iter().map(|s| format!("\"{s}\"")).collect();

        let _ = writeln!(out, "set {prefix}nat rules \"{name}\" from [ {} ]", from.join(" "));
        let _ = writeln!(out, "set {prefix}nat rules \"{name}\" to [ {} ]", to.join(" "));
        let _ = writeln!(out, "set {prefix}nat rules \"{name}\" source [ {} ]", source.join(" "));
        let _ = writeln!(out, "set {prefix}nat rules \"{name}\" destination [ {} ]", destination.join(" "));

        let any_icmp = nat.original_services.iter().any(|s| is_icmp_like(config, s));
        if any_icmp {
            let _ = writeln!(out, "set {prefix}nat rules \"{name}\" service any");
            let _ = writeln!(
                out,
                "set {prefix}nat rules \"{name}\" description \"service forced to any: original service set contained an ICMP-like entry, which NAT policies cannot reference directly\""
            );
        } else if !nat.original_services.is_empty() {
            let service: Vec<String> = nat.original_services.iter().map(|s| format!("\"{s}\"")).collect();
            let _ = writeln!(out, "set {prefix}nat rules \"{name}\" service [ {} ]", service.join(" "));
        }

        if let Some(translated_source) = &nat.translated_source {
            if translated_source == crate::ir::DYNAMIC_IP_AND_PORT {
                let _ = writeln!(out, "set {prefix}nat rules \"{name}\" source-translation dynamic-ip-and-port interface-address");
            } else {
                let _ = writeln!(out, "set {prefix}nat rules \"{name}\" source-translation static-ip \"{translated_source}\"");
            }
        }
        if let Some(translated_destination) = &nat.translated_destination {
            let _ = writeln!(out, "set {prefix}nat rules \"{name}\" destination-translation \"{translated_destination}\"");
        }
    }
}

fn emit_static_routes(out: &mut String, config: &FirewallConfig, options: &GeneratorOptions) {
    let prefix = network_prefix(options);
    let mut used_names: BTreeSet<String> = BTreeSet::new();
    for route in &config.static_routes {
        if route.kind != crate::ir::RouteKind::Static {
            continue;
        }
        let name = mint_route_name(&route.destination, &mut used_names);
        let _ = writeln!(out, "set {prefix}network virtual-router default routing-table ip static-route \"{name}\" destination \"{}\"", route.destination);
        let _ = writeln!(out, "set {prefix}network virtual-router default routing-table ip static-route \"{name}\" nexthop ip-address \"{}\"", route.next_hop);
        let _ = writeln!(out, "set {prefix}network virtual-router default routing-table ip static-route \"{name}\" metric {}", route.admin_distance);
    }
}

fn mint_route_name(destination: &str, used_names: &mut BTreeSet<String>) -> String {
    let base = if destination == "0.0.0.0/0" {
        "Default-Route".to_string()
    } else {
        paloalto_name(&format!("Route-{destination}"))
    };
    let mut candidate = base.clone();
    let mut n = 2;
    while used_names.contains(&candidate) {
        candidate = format!("{base}-{n}");
        n += 1;
    }
    used_names.insert(candidate.clone());
    candidate
}

/// Minimal format-detecting extractor over the raw OSPF/BGP text a parser
/// captured verbatim (spec.md §4.5.2 "BGP generation"). Recognizes the
/// handful of `router bgp`/`config router bgp` lines that matter for
/// Panorama's peer/redistribution commands; anything else in the blob is
/// left uninterpreted.
struct BgpFacts {
    local_as: Option<String>,
    router_id: Option<String>,
    neighbors: Vec<(String, String)>,
    networks: Vec<String>,
}

fn extract_bgp_facts(raw: &str) -> Option<BgpFacts> {
    if !raw.contains("bgp") {
        return None;
    }
    let mut facts = BgpFacts {
        local_as: None,
        router_id: None,
        neighbors: Vec::new(),
        networks: Vec::new(),
    };
    for line in raw.lines() {
        let line = line.trim();
        if let Some(rest) = line.strip_prefix("router bgp ") {
            facts.local_as = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("set as ") {
            facts.local_as = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("bgp router-id ") {
            facts.router_id = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("set router-id ") {
            facts.router_id = Some(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("neighbor ") {
            let parts: Vec<&str> = rest.split_whitespace().collect();
            if parts.len() >= 3 && parts[1] == "remote-as" {
                facts.neighbors.push((parts[0].to_string(), parts[2].to_string()));
            }
        } else if let Some(rest) = line.strip_prefix("network ") {
            facts.networks.push(rest.trim().to_string());
        } else if let Some(rest) = line.strip_prefix("set network ") {
            let addr = rest.split_whitespace().next().unwrap_or_default();
            facts.networks.push(addr.to_string());
        }
    }
    if facts.local_as.is_none() {
        return None;
    }
    Some(facts)
}

fn emit_bgp(out: &mut String, config: &FirewallConfig, options: &GeneratorOptions, warnings: &mut Vec<Warning>) {
    let Some(raw) = &config.dynamic_routing_config else {
        return;
    };
    let Some(facts) = extract_bgp_facts(raw) else {
        warnings.push(Warning::info(
            "bgp-not-extracted",
            "dynamic-routing text present but no recognizable BGP local-AS was found",
        ));
        return;
    };
    let prefix = network_prefix(options);
    let local_as = facts.local_as.clone().unwrap_or_default();
    let _ = writeln!(out, "set {prefix}network virtual-router default protocol bgp enable yes");
    let _ = writeln!(out, "set {prefix}network virtual-router default protocol bgp local-as \"{local_as}\"");
    if let Some(router_id) = &facts.router_id {
        let _ = writeln!(out, "set {prefix}network virtual-router default protocol bgp router-id \"{router_id}\"");
    }
    for (neighbor_ip, remote_as) in &facts.neighbors {
        let kind = if *remote_as == local_as { "ibgp" } else { "ebgp" };
        let group_name = format!("peer-group-{kind}");
        let _ = writeln!(
            out,
            "set {prefix}network virtual-router default protocol bgp peer-group \"{group_name}\" peer \"{neighbor_ip}\" peer-address ip \"{neighbor_ip}\""
        );
        let _ = writeln!(
            out,
            "set {prefix}network virtual-router default protocol bgp peer-group \"{group_name}\" peer \"{neighbor_ip}\" peer-as \"{remote_as}\""
        );
    }
    if !facts.networks.is_empty() {
        let networks: Vec<String> = facts.networks.iter().map(|n| format!("\"{n}\"")).collect();
        let _ = writeln!(
            out,
            "set {prefix}network virtual-router default protocol bgp redist-dist-profile \"redistribute-static-connected\" unicast networks [ {} ]",
            networks.join(" ")
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::{AddressKind, Service};
    use std::collections::BTreeSet;

    fn rule(sources: &[&str], destinations: &[&str], services: &[&str]) -> Rule {
        Rule {
            sequence_id: 1,
            name: "r1".to_string(),
            action: RuleAction::Allow,
            enabled: true,
            log: true,
            hit_count: None,
            time_range: None,
            source_interfaces: ["inside".to_string()].into_iter().collect(),
            destination_interfaces: ["outside".to_string()].into_iter().collect(),
            sources: sources.iter().map(|s| s.to_string()).collect(),
            destinations: destinations.iter().map(|s| s.to_string()).collect(),
            services: services.iter().map(|s| s.to_string()).collect(),
            applications: BTreeSet::new(),
            remark: None,
        }
    }

    #[test]
    fn wildcard_fqdn_becomes_custom_url_category_not_address_object() {
        let mut config = FirewallConfig::new();
        config.addresses.insert(
            "WildSite".to_string(),
            Address {
                name: "WildSite".to_string(),
                kind: AddressKind::Fqdn,
                value1: "*.example.com".to_string(),
                value2: None,
            },
        );
        config.rules.push(rule(&["any"], &["WildSite"], &["any"]));

        let generator = PaloAltoGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(!text.contains("set address \"WildSite\""));
        assert!(text.contains("category"));
        assert!(text.contains("destination [ \"any\" ]"));
    }

    #[test]
    fn mixed_icmp_and_port_services_split_into_svc_and_app_rules() {
        let mut config = FirewallConfig::new();
        config.services.insert(
            "icmp-echo".to_string(),
            Service {
                name: "icmp-echo".to_string(),
                protocol: crate::ir::Protocol::Icmp,
                port_spec: String::new(),
            },
        );
        config.services.insert(
            "http".to_string(),
            Service {
                name: "http".to_string(),
                protocol: crate::ir::Protocol::Tcp,
                port_spec: "eq 80".to_string(),
            },
        );
        config.rules.push(rule(&["any"], &["any"], &["icmp-echo", "http"]));

        let generator = PaloAltoGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(text.contains("r1_svc"));
        assert!(text.contains("r1_app"));
        assert!(text.contains("application-default"));
    }

    #[test]
    fn literal_translated_source_synthesizes_nat_pool_address() {
        let mut config = FirewallConfig::new();
        config.nat_rules.push(NatRule {
            sequence_id: 1,
            name: "n1".to_string(),
            enabled: true,
            original_sources: BTreeSet::new(),
            original_destinations: BTreeSet::new(),
            original_services: BTreeSet::new(),
            source_interfaces: BTreeSet::new(),
            destination_interfaces: BTreeSet::new(),
            translated_source: Some("203.0.113.10".to_string()),
            translated_destination: None,
            translated_service: None,
        });
        config.nat_rules.push(NatRule {
            sequence_id: 2,
            name: "n2".to_string(),
            enabled: true,
            original_sources: BTreeSet::new(),
            original_destinations: BTreeSet::new(),
            original_services: BTreeSet::new(),
            source_interfaces: BTreeSet::new(),
            destination_interfaces: BTreeSet::new(),
            translated_source: Some("203.0.113.10".to_string()),
            translated_destination: None,
            translated_service: None,
        });

        let generator = PaloAltoGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert_eq!(text.matches("set address \"203.0.113.10\" ip-netmask \"203.0.113.10/32\"").count(), 1);
    }

    #[test]
    fn dnat_destination_is_substituted_with_original_in_security_rule() {
        let mut config = FirewallConfig::new();
        config.nat_rules.push(NatRule {
            sequence_id: 1,
            name: "n1".to_string(),
            enabled: true,
            original_sources: BTreeSet::new(),
            original_destinations: ["ExtIP".to_string()].into_iter().collect(),
            original_services: BTreeSet::new(),
            source_interfaces: BTreeSet::new(),
            destination_interfaces: BTreeSet::new(),
            translated_source: None,
            translated_destination: Some("WebSrv".to_string()),
            translated_service: None,
        });
        config.rules.push(rule(&["any"], &["WebSrv"], &["any"]));

        let generator = PaloAltoGenerator;
        let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(text.contains("destination [ \"ExtIP\" ]"));
        assert!(!text.contains("destination [ \"WebSrv\" ]"));
    }

    #[test]
    fn panorama_mode_prefixes_rules_with_device_group_pre_rulebase() {
        let mut config = FirewallConfig::new();
        config.rules.push(rule(&["any"], &["any"], &["any"]));
        let mut options = GeneratorOptions::default();
        options.output_mode = OutputMode::Panorama;
        options.device_group = Some("Branch".to_string());

        let generator = PaloAltoGenerator;
        let output = generator.generate(&config, &options).unwrap();
        let text = String::from_utf8(output.text).unwrap();
        assert!(text.contains("device-group \"Branch\" pre-rulebase security rules"));
    }
}
