use lumen_config::{GlobalConfig, LumenConfig};
use lumen_core::master::Master;
use utils::init_tracing;

const CONFIG_FILE: &str = "lumen.conf";

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Log level comes from the config; load problems are reported after init.
    let log_level = LumenConfig::from_file(CONFIG_FILE)
        .map(|cfg| cfg.global.log_level().to_owned())
        .unwrap_or_else(|_| GlobalConfig::default().log_level);
    init_tracing(&log_level);

    let cfg = LumenConfig::from_file_or_default(CONFIG_FILE);
    cfg.print();

    let master = Master::new(cfg)?;
    master.run().await?;

    tracing::info!(target: "lumen::master", "Bye");
    Ok(())
}
