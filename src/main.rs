use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tokio::signal;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
mod config;
mod error;
mod events;
mod services;
mod utils;

use config::{Config, ConfigOverrides, LoggingConfig};
use services::ingestion::{
    local_hostname, stream_id, ActivityWatchClient, AwServerTransport, IngestionClient,
    MemoryTransport, Transport, EVENT_KIND,
};
use services::{create_window_inspector, Dispatcher, SamplingLoop};

#[derive(Parser, Debug)]
#[command(name = "aw-watcher-windowpath")]
#[command(about = "Отслеживает активное окно и отправляет полный путь приложения в ActivityWatch")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "aw-watcher-windowpath.toml")]
    config: String,

    /// Режим сухого запуска (эмуляция окон, события в памяти)
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования
    #[arg(long)]
    log_level: Option<String>,

    /// Окно слияния одинаковых событий, секунды
    #[arg(long)]
    pulsetime: Option<f64>,

    /// Период опроса активного окна, секунды
    #[arg(long)]
    interval: Option<f64>,

    /// Максимальная задержка отправки накопленных событий, секунды
    #[arg(long)]
    commit_interval: Option<f64>,

    /// Адрес aw-server
    #[arg(long)]
    host: Option<String>,

    /// Порт aw-server
    #[arg(long)]
    port: Option<u16>,

    /// Использовать тестовый сервер (порт 5666)
    #[arg(long)]
    testing: bool,

    /// Инспектор окон: auto, x11, xdotool, windows, unsupported
    #[arg(long)]
    inspector: Option<String>,
}

impl Args {
    fn overrides(&self) -> ConfigOverrides {
        ConfigOverrides {
            log_level: self.log_level.clone(),
            pulsetime: self.pulsetime,
            interval: self.interval,
            commit_interval: self.commit_interval,
            host: self.host.clone(),
            port: self.port,
            testing: self.testing,
            inspector: self.inspector.clone(),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let config = Arc::new(Config::load(&args.config, &args.overrides())?);

    // Инициализация системы логирования
    init_tracing(&config.logging)?;

    info!("Запуск aw-watcher-windowpath v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    if args.dry_run {
        warn!("Режим сухого запуска - события не покидают процесс");
    }

    let cancel = CancellationToken::new();

    // Инициализация компонентов
    let memory = Arc::new(MemoryTransport::new());
    let transport: Arc<dyn Transport> = if args.dry_run {
        memory.clone()
    } else {
        Arc::new(AwServerTransport::new(&config.server)?)
    };

    let hostname = local_hostname();
    let stream = stream_id(&hostname);
    let client = Arc::new(ActivityWatchClient::new(transport, hostname, cancel.child_token()));

    // Единственная фатальная ошибка: без потока работать некуда
    client
        .create_stream(&stream, EVENT_KIND)
        .await
        .with_context(|| format!("Не удалось создать поток {}", stream))?;

    let inspector = create_window_inspector(&config, args.dry_run)?;
    let dispatcher = Dispatcher::new(
        client.clone(),
        stream.clone(),
        config.watcher.pulsetime(),
        config.watcher.commit_interval(),
    );
    let sampler = SamplingLoop::new(inspector, dispatcher, config.watcher.interval());

    info!("Все компоненты инициализированы");

    let mut sampler_handle = tokio::spawn(sampler.run(cancel.clone()));

    // Ожидание сигнала завершения
    tokio::select! {
        result = signal::ctrl_c() => match result {
            Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
            Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
        },
        result = &mut sampler_handle => {
            if let Err(e) = result {
                error!("Цикл опроса завершился аварийно: {}", e);
            }
        }
    }

    info!("Завершение работы...");
    cancel.cancel();

    // Цикл замечает отмену не позже чем через один интервал
    let shutdown_timeout = config.watcher.interval() + tokio::time::Duration::from_secs(1);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        if !sampler_handle.is_finished() {
            let _ = (&mut sampler_handle).await;
        }
        client.shutdown().await;
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => {
            warn!("Таймаут при завершении сервисов");
            sampler_handle.abort();
        }
    }

    if args.dry_run {
        let events = memory.events(&stream);
        info!("[DRY RUN] В потоке {} записано событий: {}", stream, events.len());
        for event in &events {
            info!("[DRY RUN]   {}", event);
        }
    }

    info!("aw-watcher-windowpath завершил работу");
    Ok(())
}

fn init_tracing(logging: &LoggingConfig) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&logging.level))?;

    let registry = tracing_subscriber::registry().with(filter);
    match logging.format.as_str() {
        "pretty" => registry.with(tracing_subscriber::fmt::layer().pretty()).init(),
        _ => registry.with(tracing_subscriber::fmt::layer().compact()).init(),
    }

    Ok(())
}
