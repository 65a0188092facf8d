use anyhow::Context;
use deployment::Deployment;
use server::{DeploymentImpl, routes};
use tracing_subscriber::{EnvFilter, prelude::*};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,server=debug,services=debug,db=info"));
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_filter(env_filter))
        .init();

    let deployment = DeploymentImpl::new()
        .await
        .context("failed to initialise deployment")?;
    let _jobs = deployment.spawn_background_jobs().await;

    let addr = deployment.config().socket_addr()?;
    let app = routes::router(deployment);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!("Server running on http://{addr}");

    axum::serve(listener, app).await?;
    Ok(())
}
