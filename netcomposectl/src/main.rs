use netcompose::{Error, Interface, InterfacesCollection, Snapshot};
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use log::{debug, warn};

#[derive(Debug, Parser)]
struct Cli {
    /// JSON snapshot of configured devices
    #[clap(long, short)]
    snapshot: Option<PathBuf>,

    /// Take hardware, architecture and qeth flags from the running system
    #[clap(long)]
    live: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Known interfaces
    List,
    /// Interfaces which can be added to a bridge
    Bridgeable { bridge: String },
    /// Interfaces which can be enslaved in a bond
    Bondable { bond: String },
    /// Configured members of a bridge or bond
    Slaves { master: String },
}

fn main() {
    env_logger::init();

    let args = Cli::parse();

    if let Err(e) = run(args) {
        eprintln!("error: {}", e);
        std::process::exit(1);
    }
}

fn run(args: Cli) -> Result<(), Error> {
    let mut snapshot = match &args.snapshot {
        Some(path) => Snapshot::load(path)?,
        None => Snapshot::new(),
    };
    if args.live || args.snapshot.is_none() {
        snapshot = snapshot.overlay_host()?;
    }
    debug!("architecture: {}", snapshot.architecture);

    let collection = InterfacesCollection::from_provider(Arc::new(snapshot))?;

    match args.command {
        Commands::List => {
            list(&mut io::stdout().lock(), &collection)?;
        }
        Commands::Bridgeable { bridge } => {
            let bridge = lookup(&collection, &bridge)?;
            for iface in collection.select_bridgeable(bridge)? {
                println!("{}", iface.name());
            }
        }
        Commands::Bondable { bond } => {
            let bond = lookup(&collection, &bond)?;
            for iface in collection.select_bondable(bond)? {
                println!("{}", iface.name());
            }
        }
        Commands::Slaves { master } => {
            let master = lookup(&collection, &master)?;
            for slave in collection.members(master)? {
                println!("{}", slave);
            }
        }
    }

    Ok(())
}

fn lookup<'a>(collection: &'a InterfacesCollection, name: &str) -> Result<&'a Interface, Error> {
    collection
        .find(name)
        .ok_or_else(|| Error::InterfaceNotFound(name.to_string()))
}

/// Writes every interface, skipping the details of those whose ifcfg cannot be read.
fn list(out: &mut impl Write, collection: &InterfacesCollection) -> Result<(), Error> {
    for iface in collection {
        match write_interface(out, iface) {
            Ok(()) => {}
            Err(Error::Io(e)) => return Err(Error::Io(e)),
            Err(e) => warn!("{}: {}", iface.name(), e),
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_interface(out: &mut impl Write, iface: &Interface) -> Result<(), Error> {
    writeln!(out, "Name: {}", iface.name())?;
    writeln!(out, "Type: {}", iface.iface_type())?;
    writeln!(out, "Present: {}", iface.is_hardware_present())?;
    writeln!(out, "Configured: {}", iface.is_configured())?;
    if iface.is_configured() {
        if let Some(bootproto) = iface.bootproto()? {
            writeln!(out, "BOOTPROTO: {}", bootproto)?;
        }
        if let Some(startmode) = iface.startmode()? {
            writeln!(out, "STARTMODE: {:?}", startmode)?;
        }
        if let Some(address) = iface.ipaddr()? {
            writeln!(out, "Address: {}", address)?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use netcompose::{IfCfg, InterfaceType};

    #[test]
    fn test_list_continues_past_bad_address() {
        let snapshot = Snapshot::new()
            .with_device(
                InterfaceType::Ethernet,
                "eth0",
                IfCfg::new().with("IPADDR", "not-an-address"),
            )
            .with_device(
                InterfaceType::Ethernet,
                "eth1",
                IfCfg::new().with("IPADDR", "192.168.1.2/24"),
            );
        let collection = InterfacesCollection::from_provider(Arc::new(snapshot)).unwrap();

        let mut out = Vec::new();
        list(&mut out, &collection).unwrap();
        let out = String::from_utf8(out).unwrap();
        assert!(out.contains("Name: eth0"));
        assert!(out.contains("Name: eth1"));
        assert!(out.contains("Address: 192.168.1.2/24"));
    }
}
