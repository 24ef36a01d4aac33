mod cli;
mod logging;

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use tracing::{error, info};

use wecom::{Bot, BotConfig};
use wecom_runtime::Session;

use crate::cli::Cli;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    if let Err(err) = run(cli).await {
        error!(error = %err, "bot failed");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let (session, pushes) = Session::launch(cli.bridge.as_deref()).await?;

    let config = BotConfig {
        smart: !cli.no_smart,
        downloads_dir: cli.downloads,
        login_timeout: Duration::from_secs(cli.login_timeout),
        ..BotConfig::default()
    };

    let bot = Bot::new(Arc::new(session), config);
    bot.start(pushes).await?;

    info!("bot running, press Ctrl+C to exit");
    let mut tick = tokio::time::interval(Duration::from_secs(1));
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupt received, shutting down");
                break;
            }
            _ = tick.tick() => {
                if !bot.is_running() {
                    info!("bot stopped, exiting");
                    break;
                }
            }
        }
    }

    bot.stop().await;
    Ok(())
}
