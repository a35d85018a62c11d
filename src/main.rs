mod config;
mod event;
mod gitlab;
mod hooks;
mod http;
mod notifier;

use std::{
    fs::{File, OpenOptions},
    io,
    path::{Path, PathBuf},
    sync::Arc,
};

use actix::Actor;
use actix_web::{middleware::Logger, web, App, HttpServer};
use color_eyre::eyre::{self, WrapErr as _};
use tracing_subscriber::EnvFilter;

use crate::config::{Settings, SharedSettings};

const PAYLOAD_LIMIT: usize = 4 * 1024 * 1024;

/// Used when `RUST_LOG` is unset or invalid.
pub(crate) const DEFAULT_LOG_FILTER: &str = "info";

fn log_filter() -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER))
}

/// Appends log lines to a shared file handle.
struct LogFile(Arc<File>);

impl io::Write for LogFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self.0).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self.0).flush()
    }
}

fn init_tracing(logfile: Option<&Path>) -> eyre::Result<()> {
    tracing_log::LogTracer::init()?;
    match logfile {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .wrap_err_with(|| format!("Failed to open log file {:?}", path))?;
            let file = Arc::new(file);
            let subscriber = tracing_subscriber::fmt()
                .with_env_filter(log_filter())
                .with_ansi(false)
                .with_writer(move || LogFile(file.clone()))
                .finish();
            tracing::subscriber::set_global_default(subscriber)?;
        }
        None => tracing::subscriber::set_global_default(
            tracing_subscriber::fmt()
                .with_env_filter(log_filter())
                .finish(),
        )?,
    }
    Ok(())
}

#[cfg(unix)]
fn reload_on_hangup(settings: SharedSettings, path: PathBuf) -> eyre::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut hangup =
        signal(SignalKind::hangup()).wrap_err("Failed to install SIGHUP handler")?;
    actix_rt::spawn(async move {
        while hangup.recv().await.is_some() {
            match settings.reload(&path) {
                Ok(()) => tracing::info!("Settings reloaded from {:?}", path),
                Err(err) => tracing::error!("Failed to reload settings: {:?}", err),
            }
        }
    });
    Ok(())
}

#[actix_web::main]
async fn main() -> eyre::Result<()> {
    dotenv::dotenv().ok();
    color_eyre::install()?;

    let config::Env { config } = envy::prefixed("GLHOOK_").from_env()?;
    let settings_path = std::env::args_os().nth(1).map(PathBuf::from).unwrap_or(config);
    let settings = Settings::load(&settings_path)?;

    init_tracing(settings.logfile.as_deref())?;

    let (address, port) = settings.bind_address();
    let address = address.to_owned();
    let strict = settings.strict;
    let settings = SharedSettings::new(settings);

    #[cfg(unix)]
    reload_on_hangup(settings.clone(), settings_path)?;

    let notifier = notifier::Notifier::new(awc::Client::default()).start();

    tracing::info!("Listening on {}:{}", address, port);
    HttpServer::new(move || {
        App::new()
            .data(settings.clone())
            .data(notifier.clone())
            .app_data(http::WebhookConfig { strict })
            .app_data(web::PayloadConfig::new(PAYLOAD_LIMIT))
            .wrap(Logger::default())
            .route("/webhook", web::post().to(hooks::webhook))
    })
    .bind((address.as_str(), port))?
    .run()
    .await
    .map_err(Into::into)
}
