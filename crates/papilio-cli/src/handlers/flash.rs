//! One-shot flash from the shell. Ctrl+C kills the programmer.

use anyhow::{Context, Result, bail};
use papilio_core::{CancellationToken, FlashRequest, artifact};
use papilio_runtime::FlasherServices;
use tracing::warn;

use crate::commands::FlashArgs;

pub async fn execute(services: FlasherServices, args: FlashArgs) -> Result<()> {
    let file = std::path::absolute(&args.file)
        .with_context(|| format!("Invalid path {}", args.file.display()))?;

    if let Some(warning) = artifact::inspect_file(&file, args.device)
        .await
        .ok()
        .and_then(|check| check.warning)
    {
        warn!("{warning}");
    }

    let request = FlashRequest::new(args.device, args.port.as_str(), file)
        .with_flash_address(args.address);

    let cancel = CancellationToken::new();
    let watcher = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                cancel.cancel();
            }
        })
    };

    let result = services
        .orchestrator
        .flash_with_cancel(request, cancel)
        .await;
    watcher.abort();

    match result {
        Ok(success) => {
            println!(
                "{} loaded successfully to {}",
                args.device.artifact_noun(),
                args.port
            );
            if !success.message.is_empty() {
                println!("{}", success.message);
            }
            Ok(())
        }
        Err(failure) => bail!("{} ({})", failure.detail, failure.kind),
    }
}
