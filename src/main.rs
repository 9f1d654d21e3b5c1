// Coverage Collector - Main Entry Point

use adsb_coverage::config::Config;
use adsb_coverage::coordinator::Coordinator;
use clap::Parser;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::parse();

    init_logging(config.verbose);

    info!("Starting coverage collector");
    info!(
        "Receiver at {:.4},{:.4} alt {:.0} m, work dir {}",
        config.lat, config.lon, config.alt, config.work_dir
    );

    let mut coordinator = Coordinator::new(&config)?;

    match &config.connect {
        Some(addr) => {
            info!("Connecting to SBS feed at {}", addr);
            let stream = tokio::net::TcpStream::connect(addr).await?;
            run(&mut coordinator, BufReader::new(stream)).await;
        }
        None => {
            info!("Reading SBS messages from stdin");
            run(&mut coordinator, BufReader::new(tokio::io::stdin())).await;
        }
    }

    coordinator.shutdown();
    info!("Stopped");
    Ok(())
}

/// Drive the coordinator from a line-oriented report stream until the
/// stream ends or a shutdown signal arrives.
async fn run<R>(coordinator: &mut Coordinator, reader: BufReader<R>)
where
    R: AsyncRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        tokio::select! {
            line = lines.next_line() => match line {
                Ok(Some(line)) => coordinator.process_line(&line),
                Ok(None) => {
                    info!("End of report stream");
                    break;
                }
                Err(e) => {
                    error!("Read error on report stream: {}", e);
                    break;
                }
            },
            _ = tokio::signal::ctrl_c() => {
                info!("Received shutdown signal (Ctrl+C)");
                break;
            }
        }
    }
}

/// Initialize logging subsystem
fn init_logging(verbose: bool) {
    let subscriber = tracing_subscriber::fmt()
        .with_target(false)
        .with_thread_ids(false)
        .with_level(true);

    if verbose {
        subscriber.with_max_level(tracing::Level::DEBUG).init();
        info!("Verbose logging enabled (DEBUG level)");
    } else {
        subscriber.with_max_level(tracing::Level::INFO).init();
    }
}
