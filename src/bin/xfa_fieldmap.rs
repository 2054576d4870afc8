//! XFA field mapping from the command line.
//!
//! Usage:
//!   xfa-fieldmap skeleton <template.xml|form.xdp>
//!   xfa-fieldmap types <template.xml|form.xdp>
//!   xfa-fieldmap fill <data.xml|form.xdp> <fields.json> <output> [--template t.xml]
//!   xfa-fieldmap extract <data.xml|form.xdp> [--template t.xml]
//!   xfa-fieldmap packets <form.xdp>
//!
//! Options:
//!   --config <file.json>   mapper configuration
//!   --template <file>      template packet used with a bare data file
//!
//! Set RUST_LOG=debug for diagnostics.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use xfa_fieldmap::{
    build_skeleton, classify, FieldTree, MapperConfig, PacketName, PacketSet, PacketStore,
    XfaSession, XfaTemplate,
};

enum Command {
    Skeleton(PathBuf),
    Types(PathBuf),
    Fill {
        input: PathBuf,
        fields: PathBuf,
        output: PathBuf,
    },
    Extract(PathBuf),
    Packets(PathBuf),
}

struct CliConfig {
    command: Command,
    template: Option<PathBuf>,
    mapper: MapperConfig,
}

impl CliConfig {
    fn from_args() -> Result<Self, String> {
        let args: Vec<String> = std::env::args().collect();
        let mut positional = Vec::new();
        let mut template = None;
        let mut mapper = MapperConfig::default();

        let mut i = 1;
        while i < args.len() {
            match args[i].as_str() {
                "--template" | "-t" => {
                    i += 1;
                    let value = args.get(i).ok_or("--template needs a file")?;
                    template = Some(PathBuf::from(value));
                },
                "--config" | "-c" => {
                    i += 1;
                    let value = args.get(i).ok_or("--config needs a file")?;
                    mapper = MapperConfig::from_json_file(value)
                        .map_err(|e| format!("Cannot load config {}: {}", value, e))?;
                },
                "--help" | "-h" => return Err(usage()),
                other => positional.push(other.to_string()),
            }
            i += 1;
        }

        let arg = |n: usize| {
            positional
                .get(n)
                .map(PathBuf::from)
                .ok_or_else(usage)
        };
        let command = match positional.first().map(String::as_str) {
            Some("skeleton") => Command::Skeleton(arg(1)?),
            Some("types") => Command::Types(arg(1)?),
            Some("fill") => Command::Fill {
                input: arg(1)?,
                fields: arg(2)?,
                output: arg(3)?,
            },
            Some("extract") => Command::Extract(arg(1)?),
            Some("packets") => Command::Packets(arg(1)?),
            _ => return Err(usage()),
        };

        Ok(Self {
            command,
            template,
            mapper,
        })
    }
}

fn usage() -> String {
    "Usage: xfa-fieldmap <skeleton|types|fill|extract|packets> <input> [fields.json output] \
     [--template file] [--config file]"
        .to_string()
}

type CliResult<T> = Result<T, Box<dyn std::error::Error>>;

fn load_template(path: &Path) -> CliResult<XfaTemplate> {
    Ok(XfaTemplate::parse(&fs::read(path)?)?)
}

/// Open a data file or XDP as a session, adding a separate template if given.
fn open_session(input: &Path, config: &CliConfig) -> CliResult<(XfaSession<PacketSet>, bool)> {
    let mut packets = PacketSet::from_xdp(&fs::read(input)?)?;
    let is_xdp = packets.names().any(|n| n == "preamble");
    if let Some(template) = &config.template {
        packets.write_packet(PacketName::Template, fs::read(template)?)?;
    }
    log::debug!("{}: {} packet(s)", input.display(), packets.len());
    Ok((XfaSession::with_config(packets, config.mapper.clone()), is_xdp))
}

fn print_json<T: serde::Serialize>(value: &T) -> CliResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn run(config: &CliConfig) -> CliResult<()> {
    match &config.command {
        Command::Skeleton(path) => {
            let template = load_template(path)?;
            print_json(&build_skeleton(&template).to_field_tree())
        },
        Command::Types(path) => {
            let template = load_template(path)?;
            print_json(&classify(&template))
        },
        Command::Fill {
            input,
            fields,
            output,
        } => {
            let fields = FieldTree::from_json_str(&fs::read_to_string(fields)?)?;
            let (mut session, is_xdp) = open_session(input, config)?;
            let stats = session.fill(&fields)?;

            let store = session.into_store();
            let bytes = if is_xdp {
                store.to_xdp()
            } else {
                store
                    .read_packet(PacketName::Datasets)?
                    .ok_or_else(|| format!("{} has no datasets packet", input.display()))?
            };
            fs::write(output, bytes)?;
            eprintln!(
                "Wrote {} value(s), created {} element(s): {}",
                stats.leaves_written,
                stats.elements_created,
                output.display()
            );
            Ok(())
        },
        Command::Extract(input) => {
            let (session, _) = open_session(input, config)?;
            print_json(&session.values()?)
        },
        Command::Packets(input) => {
            let packets = PacketSet::from_xdp(&fs::read(input)?)?;
            let names: Vec<&str> = packets.names().collect();
            print_json(&names)
        },
    }
}

fn main() {
    env_logger::init();

    let config = match CliConfig::from_args() {
        Ok(config) => config,
        Err(message) => {
            eprintln!("{}", message);
            process::exit(2);
        },
    };

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}
