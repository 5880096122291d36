//! fw-migrate library: exposes the vendor-agnostic translation pipeline
//! (parse → mutate → analyze/generate) plus CLI parsing/run for reuse in
//! tests without spawning a process.

pub mod analyzer;
pub mod error;
pub mod generator;
pub mod ir;
pub mod mapper;
pub mod parser;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use tracing::{debug, info};

use crate::generator::{Generator as _, GeneratorOptions, GeneratorRegistry, NatMode, OutputMode};
use crate::mapper::MapperOptions;
use crate::parser::{Parser as _, ParserInputs, ParserRegistry, Vendor};

#[derive(Parser)]
#[command(name = "fw-migrate")]
#[command(about = "Vendor-agnostic firewall configuration migration tool")]
#[command(version)]
pub struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Parse a source configuration and emit a static analysis report
    Analyze {
        /// Source vendor
        #[arg(long, value_enum)]
        from: VendorArg,
        /// Primary configuration file (the Check Point `objects` database
        /// when `--from checkpoint`)
        #[arg(long)]
        input: PathBuf,
        /// Check Point policy CSV
        #[arg(long)]
        policy_csv: Option<PathBuf>,
        /// Check Point NAT CSV
        #[arg(long)]
        nat_csv: Option<PathBuf>,
        /// Check Point SmartConsole ZIP export
        #[arg(long)]
        zip: Option<PathBuf>,
        /// Check Point Gaia `show configuration` text (interfaces, static
        /// routes)
        #[arg(long)]
        show_config: Option<PathBuf>,
        /// Write the JSON report here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Parse a source configuration and emit an equivalent target
    /// configuration
    Convert {
        /// Source vendor
        #[arg(long, value_enum)]
        from: VendorArg,
        /// Target vendor
        #[arg(long, value_enum)]
        to: VendorArg,
        /// Primary configuration file
        #[arg(long)]
        input: PathBuf,
        /// Check Point policy CSV
        #[arg(long)]
        policy_csv: Option<PathBuf>,
        /// Check Point NAT CSV
        #[arg(long)]
        nat_csv: Option<PathBuf>,
        /// Check Point SmartConsole ZIP export
        #[arg(long)]
        zip: Option<PathBuf>,
        /// Check Point Gaia `show configuration` text (interfaces, static
        /// routes)
        #[arg(long)]
        show_config: Option<PathBuf>,
        /// Fortinet NAT engine mode
        #[arg(long, value_enum, default_value = "policy")]
        nat_mode: NatModeArg,
        /// Palo Alto output context
        #[arg(long, value_enum, default_value = "firewall")]
        output_mode: OutputModeArg,
        /// Palo Alto Panorama device-group name
        #[arg(long)]
        device_group: Option<String>,
        /// Palo Alto Panorama template name
        #[arg(long)]
        template: Option<String>,
        /// Options file (YAML): interface/zone rename maps, target-layout
        /// aggregates, security-profile names
        #[arg(long)]
        options: Option<PathBuf>,
        /// Write the generated configuration here instead of stdout
        #[arg(long)]
        output: Option<PathBuf>,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum VendorArg {
    Asa,
    Checkpoint,
    Fortinet,
    Paloalto,
}

impl From<VendorArg> for Vendor {
    fn from(value: VendorArg) -> Self {
        match value {
            VendorArg::Asa => Self::Asa,
            VendorArg::Checkpoint => Self::CheckPoint,
            VendorArg::Fortinet => Self::Fortinet,
            VendorArg::Paloalto => Self::PaloAlto,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum NatModeArg {
    Policy,
    Central,
}

impl From<NatModeArg> for NatMode {
    fn from(value: NatModeArg) -> Self {
        match value {
            NatModeArg::Policy => Self::Policy,
            NatModeArg::Central => Self::Central,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputModeArg {
    Firewall,
    Panorama,
}

impl From<OutputModeArg> for OutputMode {
    fn from(value: OutputModeArg) -> Self {
        match value {
            OutputModeArg::Firewall => Self::Firewall,
            OutputModeArg::Panorama => Self::Panorama,
        }
    }
}

/// User-supplied knobs deserialized from `--options`. Its fields map
/// directly onto `MapperOptions` and `GeneratorOptions`'s serde-visible
/// parts (spec.md §6 "Configuration").
#[derive(Debug, Default, serde::Deserialize)]
#[serde(default)]
struct OptionsFile {
    interface_renames: std::collections::BTreeMap<String, String>,
    zone_renames: std::collections::BTreeMap<String, String>,
    security_profiles: std::collections::BTreeMap<String, String>,
}

fn read_inputs(
    input: &PathBuf,
    policy_csv: Option<&PathBuf>,
    nat_csv: Option<&PathBuf>,
    zip: Option<&PathBuf>,
    show_config: Option<&PathBuf>,
) -> Result<ParserInputs> {
    let primary = fs::read(input).with_context(|| format!("reading {}", input.display()))?;
    Ok(ParserInputs {
        primary: Some(primary),
        policy_csv: policy_csv.map(fs::read).transpose()?,
        nat_csv: nat_csv.map(fs::read).transpose()?,
        show_configuration: show_config.map(fs::read).transpose()?,
        zip: zip.map(fs::read).transpose()?,
    })
}

/// Execute the CLI logic with a parsed `Cli`.
///
/// # Errors
/// Returns an error if initializing logging fails, an input file cannot be
/// read, or the selected vendor parser/generator reports a structural
/// failure (spec.md §7).
pub fn run_with(cli: &Cli) -> Result<()> {
    tracing_subscriber::fmt::init();

    if cli.verbose {
        info!("starting fw-migrate in verbose mode");
    }

    match &cli.command {
        Commands::Analyze {
            from,
            input,
            policy_csv,
            nat_csv,
            zip,
            show_config,
            output,
        } => run_analyze(
            *from,
            input,
            policy_csv.as_ref(),
            nat_csv.as_ref(),
            zip.as_ref(),
            show_config.as_ref(),
            output.as_ref(),
        ),
        Commands::Convert {
            from,
            to,
            input,
            policy_csv,
            nat_csv,
            zip,
            show_config,
            nat_mode,
            output_mode,
            device_group,
            template,
            options,
            output,
        } => run_convert(
            *from,
            *to,
            input,
            policy_csv.as_ref(),
            nat_csv.as_ref(),
            zip.as_ref(),
            show_config.as_ref(),
            *nat_mode,
            *output_mode,
            device_group.clone(),
            template.clone(),
            options.as_ref(),
            output.as_ref(),
        ),
    }
}

#[allow(clippy::too_many_arguments)]
fn run_analyze(
    from: VendorArg,
    input: &PathBuf,
    policy_csv: Option<&PathBuf>,
    nat_csv: Option<&PathBuf>,
    zip: Option<&PathBuf>,
    show_config: Option<&PathBuf>,
    output: Option<&PathBuf>,
) -> Result<()> {
    let inputs = read_inputs(input, policy_csv, nat_csv, zip, show_config)?;
    let registry = ParserRegistry::with_defaults();
    let vendor: Vendor = from.into();
    let parser = registry
        .get(vendor)
        .context("no parser registered for the requested source vendor")?;

    let (config, parse_warnings) = parser.parse(&inputs).context("parsing source configuration")?;
    debug!(warnings = parse_warnings.len(), "parsed source configuration");

    let report = analyzer::analyze(&config);
    let rendered = serde_json::to_string_pretty(&report).context("serializing analysis report")?;

    match output {
        Some(path) => fs::write(path, rendered).with_context(|| format!("writing {}", path.display()))?,
        None => println!("{rendered}"),
    }
    info!(overall_score = report.overall_score, "analysis complete");
    Ok(())
}

#[allow(clippy::too_many_arguments)]
fn run_convert(
    from: VendorArg,
    to: VendorArg,
    input: &PathBuf,
    policy_csv: Option<&PathBuf>,
    nat_csv: Option<&PathBuf>,
    zip: Option<&PathBuf>,
    show_config: Option<&PathBuf>,
    nat_mode: NatModeArg,
    output_mode: OutputModeArg,
    device_group: Option<String>,
    template: Option<String>,
    options_path: Option<&PathBuf>,
    output: Option<&PathBuf>,
) -> Result<()> {
    let inputs = read_inputs(input, policy_csv, nat_csv, zip, show_config)?;
    let parser_registry = ParserRegistry::with_defaults();
    let source_vendor: Vendor = from.into();
    let parser = parser_registry
        .get(source_vendor)
        .context("no parser registered for the requested source vendor")?;

    let (mut config, parse_warnings) = parser.parse(&inputs).context("parsing source configuration")?;
    info!(vendor = %source_vendor, warnings = parse_warnings.len(), "parsed source configuration");

    let options_file: OptionsFile = match options_path {
        Some(path) => {
            let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
            serde_yaml::from_str(&text).context("parsing options file")?
        }
        None => OptionsFile::default(),
    };

    let mapper_options = MapperOptions {
        interface_renames: options_file.interface_renames,
        zone_renames: options_file.zone_renames,
        target_layout: Vec::new(),
    };
    mapper::apply(&mut config, &mapper_options);

    let generator_registry = GeneratorRegistry::with_defaults();
    let target_vendor: Vendor = to.into();
    let generator = generator_registry
        .get(target_vendor)
        .context("no generator registered for the requested target vendor")?;

    let generator_options = GeneratorOptions {
        nat_mode: nat_mode.into(),
        output_mode: output_mode.into(),
        device_group,
        template,
        security_profiles: options_file.security_profiles,
        aggregates: Vec::new(),
    };

    let generated = generator
        .generate(&config, &generator_options)
        .context("generating target configuration")?;
    info!(
        vendor = %target_vendor,
        warnings = generated.warnings.len(),
        bytes = generated.text.len(),
        "generated target configuration"
    );

    match output {
        Some(path) => fs::write(path, &generated.text).with_context(|| format!("writing {}", path.display()))?,
        None => std::io::Write::write_all(&mut std::io::stdout(), &generated.text)?,
    }
    Ok(())
}

/// Parse CLI args and run.
///
/// # Errors
/// Returns an error from `run_with` if initialization or execution fails.
pub fn run<I, S>(args: I) -> Result<()>
where
    I: IntoIterator<Item = S>,
    S: Into<std::ffi::OsString> + Clone,
{
    let cli = Cli::parse_from(args);
    run_with(&cli)
}
