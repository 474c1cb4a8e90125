use clap::Parser;
use ember::wallet_server::WalletConfig;

/// Wallet server: generates key pairs and signs transaction requests on
/// behalf of the browser UI, forwarding them to a gateway node.
#[derive(Parser)]
#[command(name = "wallet")]
struct Args {
    /// TCP port for the wallet UI and API
    #[arg(long, default_value_t = 8080, env = "EMBER_WALLET_PORT")]
    port: u16,

    /// Gateway node the signed transactions are forwarded to
    #[arg(long, default_value = "http://127.0.0.1:5001", env = "EMBER_GATEWAY")]
    gateway: String,
}

fn main() {
    let args = Args::parse();
    let config = WalletConfig {
        port: args.port,
        gateway: args.gateway,
    };
    if let Err(e) = ember::start_wallet(config) {
        eprintln!("⚠️ wallet server exited with error: {}", e);
        std::process::exit(1);
    }
}
