//! hoverd 主入口
//!
//! 无参数即可运行：使用内置默认配置（与现场部署一致）。
//! 致命的网络/broker 错误以非零退出码结束进程，Ctrl+C 清零执行器后正常退出。
//! 启动阶段（关联、重试连接）同样响应 Ctrl+C。

use anyhow::{Context, Result};
use clap::Parser;
use hover_driver::{ControllerBuilder, DriverError, MonotonicClock, TracingDutyOutput};
use hover_tools::ControllerConfig;
use hover_transport::{HostLink, MqttSettings, MqttTransport};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// 悬浮平台执行器控制器
#[derive(Parser, Debug)]
#[command(name = "hoverd")]
#[command(about = "Hover platform actuator controller over MQTT", long_about = None)]
struct Args {
    /// TOML 配置文件（可选）
    #[arg(long, env = "HOVER_CONFIG")]
    config: Option<PathBuf>,

    /// broker 主机（覆盖配置文件）
    #[arg(long)]
    broker: Option<String>,

    /// broker 端口（覆盖配置文件）
    #[arg(long)]
    port: Option<u16>,
}

fn load_config(args: &Args) -> Result<ControllerConfig> {
    let mut config = match &args.config {
        Some(path) => ControllerConfig::load(path)
            .with_context(|| format!("failed to load config {}", path.display()))?,
        None => ControllerConfig::default(),
    };
    if let Some(host) = &args.broker {
        config.broker.host = host.clone();
    }
    if let Some(port) = args.port {
        config.broker.port = port;
    }
    config.validate()?;
    Ok(config)
}

fn mqtt_settings(config: &ControllerConfig) -> MqttSettings {
    let broker = &config.broker;
    MqttSettings {
        host: broker.host.clone(),
        port: broker.port,
        client_id: broker.client_id.clone(),
        keep_alive: broker.keep_alive(),
        poll_timeout: broker.poll_timeout(),
        connect_timeout: broker.connect_timeout(),
        ..MqttSettings::default()
    }
}

/// 停止请求导致的结束按正常退出处理
fn clean_stop(result: Result<(), DriverError>) -> Result<(), DriverError> {
    match result {
        Err(DriverError::Interrupted) => {
            info!("Stop requested before startup completed");
            Ok(())
        },
        other => other,
    }
}

fn run(args: Args) -> Result<()> {
    let config = load_config(&args)?;
    info!(
        "Starting hoverd (broker {}:{}, client id {})",
        config.broker.host, config.broker.port, config.broker.client_id
    );

    let transport = MqttTransport::new(mqtt_settings(&config));
    let mut link = HostLink::new(config.broker.host.clone(), config.broker.port);

    let mut control = ControllerBuilder::new()
        .config(config)
        .hook(Arc::new(TracingDutyOutput))
        .build(transport, MonotonicClock::new())?;

    // Ctrl+C：启动阶段在下一次等待处返回，运行阶段在当前 tick 结束后退出循环
    let running = Arc::new(AtomicBool::new(true));
    let flag = Arc::clone(&running);
    ctrlc::set_handler(move || {
        flag.store(false, Ordering::Release);
    })
    .context("failed to set signal handler")?;

    if let Err(e) = control.start(&mut link, &running) {
        if let Err(shutdown) = control.shutdown() {
            warn!("Shutdown incomplete: {}", shutdown);
        }
        clean_stop(Err(e))?;
        return Ok(());
    }

    let result = control.run(&running);

    let metrics = control.metrics().snapshot();
    info!(
        "Messages: received={} applied={} ignored={} discarded={}; auto releases={}; publish failures={}",
        metrics.messages_received,
        metrics.commands_applied,
        metrics.messages_ignored,
        metrics.messages_discarded,
        metrics.auto_releases,
        metrics.publish_failures
    );

    if let Err(e) = control.shutdown() {
        warn!("Shutdown incomplete: {}", e);
    }
    clean_stop(result)?;
    info!("Stopped");
    Ok(())
}

fn main() {
    // 初始化日志
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("hoverd=info,hover_driver=info")),
        )
        .init();

    let args = Args::parse();
    if let Err(e) = run(args) {
        error!("{:#}", e);
        process::exit(1);
    }
}
