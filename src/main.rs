use anyhow::{Context, Result};
use clap::Parser;
use tokio::signal;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::Duration;
use tracing::{error, info, warn};
mod config;
mod engine;
mod error;
mod events;
pub mod mappings;
mod services;
mod utils;

use config::{BackendKind, Config};
use engine::Engine;
use services::{
    create_shortcut_listener,
    create_window_detector,
    new_shortcut_watch,
    AmbientSource,
    AmbientWatcher,
    Compositor,
    DbusAmbientSource,
    SettingsWatcher,
    SimulatedCompositor,
    StaticAmbientSource,
    SwayCompositor,
};

#[derive(Parser, Debug)]
#[command(name = "dim-unfocused")]
#[command(about = "Затемняет окна, которые сейчас не в фокусе")]
struct Args {
    /// Путь к файлу конфигурации
    #[arg(short, long, default_value = "dim.toml")]
    config: String,

    /// Режим сухого запуска: симулированный композитор, без доступа к устройствам
    #[arg(long)]
    dry_run: bool,

    /// Уровень логирования (перекрывает [logging].level)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Загрузка конфигурации
    let mut config = Config::load(&args.config)?;
    if args.dry_run {
        config.backend.kind = BackendKind::Simulated;
    }

    // Инициализация системы логирования
    let level = args.log_level.as_deref().unwrap_or(&config.logging.level);
    init_tracing(level, &config.logging.format)?;

    info!("Запуск dim-unfocused v{}", env!("CARGO_PKG_VERSION"));
    info!("Конфигурация загружена из: {}", args.config);

    let simulated = config.backend.kind == BackendKind::Simulated;
    if simulated {
        warn!("Режим сухого запуска - используется симулированный композитор");
    }

    let polling_interval = Duration::from_millis(config.backend.polling_interval_ms);
    let (events_tx, mut events_rx) = mpsc::channel(64);
    let shortcut_watch = new_shortcut_watch();

    // Композитор
    let (compositor, simulated_handle): (Box<dyn Compositor>, Option<SimulatedCompositor>) = if simulated {
        let demo = SimulatedCompositor::demo();
        demo.share_keybinding(shortcut_watch.clone());
        (Box::new(demo.clone()) as Box<dyn Compositor>, Some(demo))
    } else {
        SwayCompositor::test().context("sway недоступен, попробуйте --dry-run")?;
        (Box::new(SwayCompositor::new(shortcut_watch.clone())) as Box<dyn Compositor>, None)
    };

    // Внешние сигналы
    let mut ambient_source: Box<dyn AmbientSource> = if simulated {
        Box::new(StaticAmbientSource::default())
    } else {
        match DbusAmbientSource::connect().await {
            Ok(source) => Box::new(source),
            Err(e) => {
                warn!("Ночной свет и тёмная тема недоступны: {}", e);
                Box::new(StaticAmbientSource::default())
            }
        }
    };
    let ambient = ambient_source.read().await;

    // Производители событий
    let mut handles: Vec<JoinHandle<()>> = Vec::new();

    let window_detector = create_window_detector(polling_interval, events_tx.clone(), simulated_handle);
    handles.push(tokio::spawn(async move {
        if let Err(e) = window_detector.run().await {
            error!("Ошибка в WindowDetector: {}", e);
        }
    }));

    let ambient_watcher = AmbientWatcher::new(ambient_source, ambient, polling_interval * 4, events_tx.clone());
    handles.push(tokio::spawn(async move {
        if let Err(e) = ambient_watcher.run().await {
            error!("Ошибка в AmbientWatcher: {}", e);
        }
    }));

    let settings_watcher = SettingsWatcher::new(
        &args.config,
        config.dimming.clone(),
        polling_interval * 4,
        events_tx.clone(),
    );
    handles.push(tokio::spawn(async move {
        if let Err(e) = settings_watcher.run().await {
            error!("Ошибка в SettingsWatcher: {}", e);
        }
    }));

    // Горячая клавиша работает только при доступе к /dev/input
    let input_access = simulated || utils::permissions::check_input_access().map_err(|e| {
        warn!("Переключение горячей клавишей недоступно: {}", e);
    }).is_ok();
    if input_access {
        match create_shortcut_listener(&config.input.device_path, shortcut_watch, events_tx.clone(), simulated) {
            Ok(listener) => handles.push(tokio::spawn(async move {
                if let Err(e) = listener.run().await {
                    error!("Ошибка в ShortcutListener: {}", e);
                }
            })),
            Err(e) => warn!("Переключение горячей клавишей недоступно: {}", e),
        }
    }
    drop(events_tx);

    info!("Все сервисы запущены");

    let mut engine = Engine::new(compositor, config.dimming, ambient);
    engine.enable();

    // Ожидание сигнала завершения
    engine
        .run(&mut events_rx, async {
            match signal::ctrl_c().await {
                Ok(()) => info!("Получен сигнал завершения (Ctrl+C)"),
                Err(err) => error!("Ошибка при ожидании сигнала завершения: {}", err),
            }
        })
        .await;

    info!("Завершение работы...");

    // Снимаем все эффекты до остановки производителей
    engine.disable();

    for handle in &handles {
        handle.abort();
    }

    let shutdown_timeout = Duration::from_secs(5);
    let shutdown_result = tokio::time::timeout(shutdown_timeout, async {
        for handle in handles {
            let _ = handle.await;
        }
    })
    .await;

    match shutdown_result {
        Ok(_) => info!("Все сервисы завершили работу корректно"),
        Err(_) => warn!("Таймаут при завершении сервисов"),
    }

    info!("dim-unfocused завершил работу");
    Ok(())
}

fn init_tracing(level: &str, format: &str) -> Result<()> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))?;

    let registry = tracing_subscriber::registry().with(filter);
    if format == "pretty" {
        registry.with(tracing_subscriber::fmt::layer().pretty()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer().compact()).init();
    }

    Ok(())
}
