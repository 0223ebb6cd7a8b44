use std::process::ExitCode;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::{info, warn};

use nexus::core::show_result_with_table::{show_load_result, show_run_results};
use nexus::logger::init_logging;
use nexus::models::args::{Args, Command, Target};
use nexus::{
    parse_file, Collection, LoadConfig, LoadEngine, RequestExecutor, Runner, TransportConfig,
};

fn transport_config(target: &Target) -> TransportConfig {
    TransportConfig {
        timeout: Duration::from_secs(target.timeout_secs),
        insecure: target.insecure,
        http2: !target.http1_only,
        ..Default::default()
    }
}

fn load_collection(target: &Target) -> anyhow::Result<Collection> {
    parse_file(&target.collection)
        .with_context(|| format!("loading collection {}", target.collection.display()))
}

async fn run_collection(target: Target) -> anyhow::Result<bool> {
    let collection = load_collection(&target)?;
    let executor = RequestExecutor::from_config(&transport_config(&target))
        .context("building http transport")?;
    let mut runner = Runner::new(executor, target.env.as_str());
    let results = runner
        .run(&collection)
        .await
        .with_context(|| format!("running collection {}", collection.name))?;
    show_run_results(&results);
    Ok(results.iter().all(|r| r.passed))
}

async fn load_collection_requests(
    target: Target,
    request: Option<String>,
    config: LoadConfig,
) -> anyhow::Result<bool> {
    let collection = load_collection(&target)?;
    let executor = RequestExecutor::from_config(&transport_config(&target))
        .context("building http transport")?;

    let names: Vec<String> = match request {
        Some(name) => vec![name],
        None => collection.requests.iter().map(|r| r.name.clone()).collect(),
    };
    if names.is_empty() {
        bail!("collection {} has no requests", collection.name);
    }

    let mut all_ok = true;
    for name in names {
        let engine = LoadEngine::for_collection(
            config.clone(),
            executor.clone(),
            &collection,
            &target.env,
            &name,
        )
        .with_context(|| format!("preparing load test for {}", name))?;

        // Ctrl-C 取消当前压测
        let cancel = engine.cancel_token();
        let watcher = tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("interrupted, waiting for in-flight requests");
                cancel.cancel();
            }
        });

        let result = engine.run().await;
        watcher.abort();
        let result = result.with_context(|| format!("load test for {}", name))?;
        show_load_result(&name, &result);
        all_ok &= result.failed_requests == 0;

        if engine.cancel_token().is_cancelled() {
            info!("load testing stopped");
            break;
        }
    }
    Ok(all_ok)
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = Args::parse();
    init_logging(args.verbose);

    let ok = match args.command {
        Command::Run { target } => run_collection(target).await?,
        Command::Load {
            target,
            request,
            users,
            duration_secs,
            iterations,
            ramp_up_secs,
        } => {
            let config = LoadConfig {
                virtual_users: users,
                duration: Duration::from_secs(duration_secs),
                iterations,
                ramp_up: Duration::from_secs(ramp_up_secs),
            };
            load_collection_requests(target, request, config).await?
        }
    };

    Ok(if ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
