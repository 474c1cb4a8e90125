use clap::Parser;
use ember::server::NodeConfig;

/// Blockchain node: holds the chain, mines on a timer, gossips with LAN
/// neighbors over REST.
#[derive(Parser)]
#[command(name = "node")]
struct Args {
    /// TCP port for the node REST API
    #[arg(long, default_value_t = 5000, env = "EMBER_PORT")]
    port: u16,

    /// Dotted-quad host used as the base of the neighbor sweep
    #[arg(long, default_value = "127.0.0.1", env = "EMBER_HOST")]
    host: String,

    /// Reject transactions whose sender balance does not cover the value
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set, env = "EMBER_ENFORCE_BALANCE")]
    enforce_balance: bool,
}

fn main() {
    let args = Args::parse();
    let config = NodeConfig {
        port: args.port,
        host: args.host,
        enforce_balance: args.enforce_balance,
    };
    if let Err(e) = ember::start_node(config) {
        eprintln!("⚠️ node exited with error: {}", e);
        std::process::exit(1);
    }
}
