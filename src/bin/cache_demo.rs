//! Cache demo
//!
//! Builds a backend from flags, stores a key with a 3 second TTL, reads it
//! back, waits for it to expire and reads it again.

use std::time::Duration as StdDuration;

use anyhow::Context;
use chrono::{Duration, Local};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use mini_cache::{connect, BackendConfig, CancelToken};

#[derive(Debug, Parser)]
#[command(name = "cache_demo", about = "Walk a cache backend through a TTL expiry")]
struct Args {
    /// Cache type (in-memory/m, remote/r); anything else is the no-op backend
    #[arg(short = 't', long = "type", default_value = "")]
    cache_type: String,

    /// Server address (host:port)
    #[arg(short = 'a', long = "addr", default_value = "localhost:6379")]
    addr: String,

    /// Server password
    #[arg(short = 'p', long = "password", default_value = "")]
    password: String,

    /// Database selected after connecting
    #[arg(short = 'd', long = "db", default_value_t = 0)]
    db: i64,
}

fn now() -> String {
    Local::now().format("%Y/%m/%d %H:%M:%S").to_string()
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mini_cache=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let args = Args::parse();
    let config = BackendConfig {
        kind: args.cache_type.clone(),
        address: args.addr,
        password: args.password,
        db: args.db,
        ..BackendConfig::default()
    };

    let cache = connect(&config)
        .await
        .with_context(|| format!("invalid cache type: {}", args.cache_type))?;
    println!("{}", cache.describe());

    let token = CancelToken::new();
    let key = "k1";

    if let Err(err) = cache
        .set(&token, key, "in memory cache", Duration::seconds(3))
        .await
    {
        warn!("'{}' {}", key, err);
    }

    for round in 0..2 {
        if round == 1 {
            println!("5 second sleep ...");
            tokio::time::sleep(StdDuration::from_secs(5)).await;
        }

        match cache.get(&token, key).await {
            Ok(value) => println!("{} key : {} , value : {:?}", now(), key, value),
            Err(err) => warn!("'{}' {}", key, err),
        }
        match cache.get_ttl(&token, key).await {
            Ok(ttl) => println!("{} key : {} ttl : {}ms", now(), key, ttl.num_milliseconds()),
            Err(err) => warn!("'{}' {}", key, err),
        }
    }

    cache.close().await.context("closing cache")?;
    Ok(())
}
