//! End-to-end pipeline scenarios exercising the public API directly
//! (parse -> mapper -> analyze/generate), one test per scenario.

use fw_migrate::analyzer;
use fw_migrate::generator::{GeneratorOptions, GeneratorRegistry, NatMode};
use fw_migrate::mapper::{self, MapperOptions};
use fw_migrate::parser::{Parser as _, ParserInputs, ParserRegistry, Vendor};

fn text(bytes: &[u8]) -> String {
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Scenario 1: ASA inline PAT -> Fortinet policy-mode NAT.
#[test]
fn asa_inline_pat_converts_to_fortinet_policy_nat() {
    let input = "\
object network INSIDE_NET
 subnet 10.0.0.0 255.255.255.0
 nat (inside,outside) dynamic interface
access-list ACL extended permit ip object INSIDE_NET any
";
    let parsers = ParserRegistry::with_defaults();
    let parser = parsers.get(Vendor::Asa).unwrap();
    let (mut config, warnings) = parser.parse(&ParserInputs::single(input.as_bytes())).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");

    mapper::apply(&mut config, &MapperOptions::default());

    let generators = GeneratorRegistry::with_defaults();
    let generator = generators.get(Vendor::Fortinet).unwrap();
    let options = GeneratorOptions {
        nat_mode: NatMode::Policy,
        ..GeneratorOptions::default()
    };
    let output = generator.generate(&config, &options).unwrap();
    let rendered = text(&output.text);

    assert!(rendered.contains("config firewall policy"));
    assert!(rendered.contains("set nat enable"));
    assert!(!rendered.contains("set poolname"));
}

/// Scenario 2: two ASA ACL entries where the broader earlier rule shadows
/// the narrower later one; the analyzer must surface it.
#[test]
fn shadowed_acl_entries_are_reported_by_analyzer() {
    let input = "\
access-list ACL extended permit ip any any
access-list ACL extended permit tcp host 1.2.3.4 host 5.6.7.8 eq 80
";
    let parsers = ParserRegistry::with_defaults();
    let parser = parsers.get(Vendor::Asa).unwrap();
    let (config, _warnings) = parser.parse(&ParserInputs::single(input.as_bytes())).unwrap();

    let report = analyzer::analyze(&config);
    assert_eq!(report.overlapping_rules.len(), 1);
    assert_eq!(report.overlapping_rules[0].shadowed_by, config.rules[0].name);
    assert_eq!(report.overlapping_rules[0].rule, config.rules[1].name);
}

/// Scenario 3: a Check Point SmartConsole ZIP export overrides an object
/// already defined in the objects database.
#[test]
fn checkpoint_zip_export_overrides_objects_database_host() {
    let objects = r#"
(
:network_objects (
  :WebSrv (
    :ClassName (host_plain)
    :ipaddr (10.0.0.5)
  )
)
)
"#;
    let csv = "name,ip-address,subnet-mask\nWebSrv,10.0.0.6,\n";

    let mut zip_bytes = Vec::new();
    {
        let cursor = std::io::Cursor::new(&mut zip_bytes);
        let mut writer = zip::ZipWriter::new(cursor);
        writer.start_file("add-host.csv", zip::write::FileOptions::default()).unwrap();
        std::io::Write::write_all(&mut writer, csv.as_bytes()).unwrap();
        writer.finish().unwrap();
    }

    let inputs = ParserInputs {
        primary: Some(objects.as_bytes().to_vec()),
        policy_csv: None,
        nat_csv: None,
        show_configuration: None,
        zip: Some(zip_bytes),
    };

    let parsers = ParserRegistry::with_defaults();
    let parser = parsers.get(Vendor::CheckPoint).unwrap();
    let (config, _warnings) = parser.parse(&inputs).unwrap();

    assert_eq!(config.addresses["WebSrv"].value1, "10.0.0.6");
}

/// Scenario 4: Fortinet service with both a TCP and a UDP portrange splits
/// into two services plus a group, and the rule is rewritten to reference
/// the group instead of the original name.
#[test]
fn fortinet_mixed_tcp_udp_service_splits_into_group() {
    let input = "\
config firewall service custom
    edit \"DNS-ALT\"
        set tcp-portrange 5353
        set udp-portrange 5353
    next
end
config firewall policy
    edit 1
        set srcintf \"inside\"
        set dstintf \"outside\"
        set srcaddr \"all\"
        set dstaddr \"all\"
        set service \"DNS-ALT\"
        set action accept
    next
end
";
    let parsers = ParserRegistry::with_defaults();
    let parser = parsers.get(Vendor::Fortinet).unwrap();
    let (config, _warnings) = parser.parse(&ParserInputs::single(input.as_bytes())).unwrap();

    assert!(config.services.contains_key("TCP-DNS-ALT"));
    assert!(config.services.contains_key("UDP-DNS-ALT"));
    assert!(config.rules[0].services.contains("TCP-UDP_DNS-ALT"));
    assert!(!config.rules[0].services.contains("DNS-ALT"));
}

/// Scenario 5: PAN-OS wildcard FQDN address becomes a custom URL category,
/// not an address object, and the referencing rule's destination collapses
/// to `any` with the category attached.
#[test]
fn panos_wildcard_fqdn_becomes_custom_url_category() {
    let input = "\
set address WildSite fqdn *.example.com
set rulebase security rules Allow-Wild from trust
set rulebase security rules Allow-Wild to untrust
set rulebase security rules Allow-Wild source any
set rulebase security rules Allow-Wild destination [ WildSite ]
set rulebase security rules Allow-Wild service any
set rulebase security rules Allow-Wild action allow
";
    let parsers = ParserRegistry::with_defaults();
    let parser = parsers.get(Vendor::PaloAlto).unwrap();
    let (config, _warnings) = parser.parse(&ParserInputs::single(input.as_bytes())).unwrap();

    let generators = GeneratorRegistry::with_defaults();
    let generator = generators.get(Vendor::PaloAlto).unwrap();
    let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
    let rendered = text(&output.text);

    assert!(!rendered.contains("set address WildSite fqdn"));
    assert!(rendered.contains("custom-url-category \"WildSite\" list [ \"*.example.com\" ]"));
    assert!(rendered.contains("category [ \"WildSite\" ]") || rendered.contains("category [ WildSite ]"));
}

/// Scenario 6: a Fortinet VIP (DNAT) feeds a PAN-OS conversion where a
/// security rule referencing the internal mapped address gets rewritten to
/// reference the external original-destination instead.
#[test]
fn fortinet_vip_dnat_destination_is_rewritten_to_external_in_paloalto_output() {
    let input = "\
config firewall vip
    edit \"VIP1\"
        set extip 203.0.113.5
        set mappedip 10.0.0.5
        set extintf \"outside\"
    next
end
config firewall policy
    edit 1
        set srcintf \"outside\"
        set dstintf \"inside\"
        set srcaddr \"all\"
        set dstaddr \"VIP1_extip\"
        set service \"ALL\"
        set action accept
    next
end
";
    let parsers = ParserRegistry::with_defaults();
    let parser = parsers.get(Vendor::Fortinet).unwrap();
    let (mut config, warnings) = parser.parse(&ParserInputs::single(input.as_bytes())).unwrap();
    assert!(warnings.is_empty(), "{warnings:?}");

    let nat = config
        .nat_rules
        .iter()
        .find(|n| n.translated_destination.is_some())
        .expect("VIP NAT rule");
    assert_eq!(nat.translated_destination.as_deref(), Some("VIP1_mappedip"));
    assert!(nat.original_destinations.contains("VIP1_extip"));

    // Simulate the rule referencing the internal, post-NAT address, as a
    // converted PAN-OS security rule would after NAT resolution.
    config.rules[0].destinations = ["VIP1_mappedip".to_string()].into_iter().collect();

    mapper::apply(&mut config, &MapperOptions::default());

    let generators = GeneratorRegistry::with_defaults();
    let generator = generators.get(Vendor::PaloAlto).unwrap();
    let output = generator.generate(&config, &GeneratorOptions::default()).unwrap();
    let rendered = text(&output.text);

    let destination_line = rendered
        .lines()
        .find(|l| l.contains("security rules") && l.contains(" destination "))
        .expect("security rule destination line");
    assert!(destination_line.contains("VIP1_extip"));
    assert!(!destination_line.contains("VIP1_mappedip"));
}

/// Boundary/invariant: applying the Mapper with empty rename maps is a
/// no-op over interface and zone names.
#[test]
fn mapper_with_empty_rename_maps_is_identity() {
    let input = "\
object network INSIDE_NET
 subnet 10.0.0.0 255.255.255.0
 nat (inside,outside) dynamic interface
";
    let parsers = ParserRegistry::with_defaults();
    let parser = parsers.get(Vendor::Asa).unwrap();
    let (config, _warnings) = parser.parse(&ParserInputs::single(input.as_bytes())).unwrap();

    let mut mutated = config.clone();
    mapper::apply(&mut mutated, &MapperOptions::default());

    assert_eq!(config.interfaces, mutated.interfaces);
    assert_eq!(config.nat_rules, mutated.nat_rules);
}
