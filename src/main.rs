//! `adsynth` binary: generates impressions and clicks until SIGINT/SIGTERM.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use adsynth::{
    CLICKS, Generator, GeneratorConfig, IMPRESSIONS, LogWriter, MqttSettings, MqttWriter,
    StdoutWriter, Subscribe, TopicPublisher,
};

/// Synthetic ad impression/click stream generator.
#[derive(Debug, Parser)]
#[command(name = "adsynth", version, about)]
struct Args {
    /// MQTT broker addresses (`host:port`, comma separated); only the first is dialed.
    #[arg(long, env = "ADSYNTH_BROKERS", value_delimiter = ',', default_value = "localhost:1883")]
    brokers: Vec<String>,

    /// Where events are written.
    #[arg(long, env = "ADSYNTH_SINK", value_enum, default_value_t = Sink::Mqtt)]
    sink: Sink,

    /// Prepended to every MQTT topic.
    #[arg(long, env = "ADSYNTH_TOPIC_PREFIX", default_value = "")]
    topic_prefix: String,

    /// Impressions per second.
    #[arg(long, env = "ADSYNTH_RATE", default_value_t = 5)]
    rate: u32,

    /// Probability that an impression is followed by a click.
    #[arg(long, env = "ADSYNTH_CLICK_PROBABILITY", default_value_t = 0.25)]
    click_probability: f64,

    /// Largest delay between an impression and its click, in milliseconds.
    #[arg(long, env = "ADSYNTH_MAX_CLICK_DELAY_MS", default_value_t = 10_000)]
    max_click_delay_ms: u64,

    /// Seed for reproducible identifiers and click decisions.
    #[arg(long, env = "ADSYNTH_SEED")]
    seed: Option<u64>,

    /// Upper bound on the shutdown drain, in milliseconds (unbounded when absent).
    #[arg(long, env = "ADSYNTH_GRACE_MS")]
    grace_ms: Option<u64>,

    /// Log output format.
    #[arg(long, env = "ADSYNTH_LOG_FORMAT", value_enum, default_value_t = LogFormat::Pretty)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Sink {
    Mqtt,
    Stdout,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Pretty,
    Json,
}

impl Args {
    fn generator_config(&self) -> GeneratorConfig {
        GeneratorConfig {
            impressions_per_second: self.rate,
            click_probability: self.click_probability,
            max_click_delay: Duration::from_millis(self.max_click_delay_ms),
            grace: self.grace_ms.map(Duration::from_millis),
            seed: self.seed,
            ..GeneratorConfig::default()
        }
    }

    fn mqtt_settings(&self) -> MqttSettings {
        MqttSettings {
            brokers: self.brokers.clone(),
            topic_prefix: self.topic_prefix.clone(),
            ..MqttSettings::default()
        }
    }
}

fn init_logging(format: LogFormat) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Json => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init(),
        LogFormat::Pretty => tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_target(false))
            .init(),
    }
}

/// One writer per destination, on the selected sink.
fn build_publisher(args: &Args) -> Result<TopicPublisher> {
    let settings = args.mqtt_settings();
    let mut publisher = TopicPublisher::new();
    for destination in [IMPRESSIONS, CLICKS] {
        publisher = match args.sink {
            Sink::Mqtt => {
                let writer = MqttWriter::connect(destination, &settings)
                    .with_context(|| format!("connecting writer for '{destination}'"))?;
                publisher.with_writer(destination, writer)
            }
            Sink::Stdout => publisher.with_writer(destination, StdoutWriter::new(destination)),
        };
    }
    Ok(publisher)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_format);

    let publisher = build_publisher(&args)?;
    let subscribers: Vec<Arc<dyn Subscribe>> = vec![Arc::new(LogWriter::new())];
    let generator = Generator::builder(args.generator_config(), Arc::new(publisher))
        .with_subscribers(subscribers)
        .build()
        .context("invalid generator configuration")?;

    info!(sink = ?args.sink, rate = args.rate, "adsynth starting");
    match generator.run_until_signal().await {
        Ok(summary) => {
            info!(
                impressions_written = summary.impressions_written,
                impressions_failed = summary.impressions_failed,
                clicks_scheduled = summary.clicks_scheduled,
                clicks_written = summary.clicks_written,
                clicks_failed = summary.clicks_failed,
                clicks_canceled = summary.clicks_canceled,
                "adsynth stopped"
            );
            Ok(())
        }
        Err(e) => {
            error!(error = %e, label = e.as_label(), "adsynth stopped with errors");
            Err(e.into())
        }
    }
}
