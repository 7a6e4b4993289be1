use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use vordr::{LookupIp, ResolveError, Resolver};

/// Resolve a hostname, accepting the answer only when its DNSSEC chain
/// of trust verifies.
#[derive(Parser, Debug)]
#[command(name = "lookup", version, about)]
struct Args {
    /// Hostname to resolve
    hostname: String,

    /// Path to a resolv.conf-style configuration file
    #[arg(long, default_value = "/etc/resolv.conf")]
    config: PathBuf,

    /// Only query A records
    #[arg(short = '4', long, conflicts_with = "ipv6")]
    ipv4: bool,

    /// Only query AAAA records
    #[arg(short = '6', long)]
    ipv6: bool,

    /// Zone whose keys are trusted as the top of the chain
    #[arg(long, default_value = ".")]
    trust_zone: String,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "vordr=info,warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    match run(&args).await {
        Ok(lookup) => {
            for addr in lookup.addrs {
                println!("{}", addr);
            }
        }
        Err(err) => {
            eprintln!("lookup {}: {}", args.hostname, err);
            std::process::exit(1);
        }
    }
}

async fn run(args: &Args) -> Result<LookupIp, ResolveError> {
    let mut resolver = Resolver::new(&args.config)?;
    resolver.set_trust_zone(&args.trust_zone);

    let lookup = if args.ipv4 {
        resolver.lookup_ipv4(&args.hostname).await?
    } else if args.ipv6 {
        resolver.lookup_ipv6(&args.hostname).await?
    } else {
        resolver.lookup_ip(&args.hostname).await?
    };

    if !lookup.is_secure() {
        return Err(ResolveError::ResourceNotSigned);
    }
    Ok(lookup)
}
