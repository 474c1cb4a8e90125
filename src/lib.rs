pub mod blockchain;
pub mod cryptography;
pub mod networking;
pub mod routes;
pub mod server;
pub mod transaction;
pub mod utils;
pub mod wallet;
pub mod wallet_server;

pub fn start_node(config: server::NodeConfig) -> Result<(), Box<dyn std::error::Error>> {
    tokio::runtime::Runtime::new()?.block_on(server::run(config))
}

pub fn start_wallet(config: wallet_server::WalletConfig) -> Result<(), Box<dyn std::error::Error>> {
    tokio::runtime::Runtime::new()?.block_on(wallet_server::run(config))
}
