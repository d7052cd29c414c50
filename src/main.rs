use clap::Parser;
use std::thread;
use tracing::{error, info};

use cpu_forecast::config::{Config, Role};
use cpu_forecast::store::{ACTUALS_COLUMN, FORECAST_COLUMN};
use cpu_forecast::{
    exporter, Collector, Evaluator, Forecaster, HttpForecastClient, ModelMetrics,
    PrometheusSource, TimeSeriesStore,
};

#[tokio::main]
async fn main() {
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    tracing_subscriber::fmt().with_target(false).init();

    let config = Config::parse();
    let role = config.role();
    info!(version = cpu_forecast::VERSION, ?role, "starting pipeline");

    if matches!(role, Role::Collector | Role::All) {
        let cfg = config.clone();
        thread::spawn(move || loop {
            match build_collector(&cfg) {
                Ok(collector) => collector.run(cfg.collect_interval()),
                Err(err) => {
                    error!(error = %err, "collector startup failed");
                    thread::sleep(cfg.collect_interval());
                }
            }
        });
    }

    if matches!(role, Role::Forecaster | Role::All) {
        let cfg = config.clone();
        thread::spawn(move || loop {
            match build_forecaster(&cfg) {
                Ok(forecaster) => forecaster.run(cfg.forecast_interval()),
                Err(err) => {
                    error!(error = %err, "forecaster startup failed");
                    thread::sleep(cfg.forecast_interval());
                }
            }
        });
    }

    if matches!(role, Role::Evaluator | Role::All) {
        let metrics = ModelMetrics::new().expect("failed to register model metrics");
        let evaluator = Evaluator::new(
            &config.actuals_path,
            &config.forecast_path,
            config.evaluation_window(),
            metrics.clone(),
        );
        let interval = config.evaluate_interval();
        thread::spawn(move || evaluator.run(interval));
        tokio::spawn(exporter::serve(metrics, config.metrics_port));
    }

    tokio::signal::ctrl_c().await.ok();
    info!("shutting down");
}

fn build_collector(cfg: &Config) -> cpu_forecast::Result<Collector<PrometheusSource>> {
    let source = PrometheusSource::new(
        &cfg.prometheus_url,
        &cfg.prometheus_query,
        cfg.request_timeout(),
    )?;
    let store = TimeSeriesStore::open(&cfg.actuals_path, ACTUALS_COLUMN)?;
    Ok(Collector::new(source, store))
}

fn build_forecaster(cfg: &Config) -> cpu_forecast::Result<Forecaster<HttpForecastClient>> {
    let client = HttpForecastClient::new(&cfg.model_url, cfg.horizon, cfg.request_timeout())?;
    let store = TimeSeriesStore::open(&cfg.forecast_path, FORECAST_COLUMN)?;
    Ok(Forecaster::new(
        &cfg.actuals_path,
        store,
        client,
        cfg.forecaster_settings(),
    ))
}
