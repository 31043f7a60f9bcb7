use std::sync::Arc;

use eyre::WrapErr;
use tracing::info;
use tracing_subscriber::EnvFilter;

mod cli;
mod driver;
mod metrics;
mod server;
mod submitter;
mod wallet;

#[tokio::main]
async fn main() -> eyre::Result<()> {
    let args = cli::parse_or_exit();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let signer = wallet::signer_from_mnemonic(wallet::DEFAULT_MNEMONIC)
        .wrap_err("failed to derive signing account")?;
    info!(
        from = %signer.address(),
        endpoint = %args.endpoint,
        interval_ms = args.interval_ms,
        "starting transaction driver"
    );

    let metrics = Arc::new(metrics::MetricsCollector::new());
    let submitter = submitter::RpcSubmitter::connect(&args.endpoint, signer)
        .wrap_err("failed to connect RPC submitter")?;

    let mut driver = driver::Driver::new(submitter, Arc::clone(&metrics), args.interval());

    match args.push_target() {
        // Push mode: ship a snapshot after every tick, no local endpoint.
        Some(target) => {
            info!(
                gateway = %target.gateway,
                job = %target.job,
                instance = %target.instance,
                "push mode: shipping metrics after each tick"
            );
            let push = metrics::push::PushClient::new(
                &target.gateway,
                &target.job,
                &target.instance,
            );
            driver = driver.with_push(push);
        }
        // Pull mode: expose a scrape endpoint on the default port.
        None => {
            let addr = format!("0.0.0.0:{}", server::METRICS_PORT);
            let listener = tokio::net::TcpListener::bind(&addr)
                .await
                .wrap_err_with(|| format!("failed to bind metrics endpoint on {addr}"))?;
            info!(%addr, "pull mode: serving metrics");

            let scrape_metrics = Arc::clone(&metrics);
            tokio::spawn(async move {
                if let Err(err) = server::serve(listener, scrape_metrics).await {
                    tracing::error!(error = %err, "metrics server exited");
                }
            });
        }
    }

    // Runs until the process is terminated externally.
    driver.run().await;
    Ok(())
}
