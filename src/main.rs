use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tokio::sync::Notify;

use sardine_web::config::{AppState, CliOverrides, Config, DEFAULT_CONFIG_PATH};
use sardine_web::console::{ConsoleBridge, ProcessConsole};
use sardine_web::store::{DataLayout, FileStore};
use sardine_web::{logger, repl, server};

#[derive(Parser)]
#[command(name = "sardine-web", version, about = "Local server for the Sardine web editor")]
struct Cli {
    /// Interface to listen on
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Do not open the editor in a browser
    #[arg(long, default_value_t = false)]
    no_browser: bool,

    /// Config file (extension optional)
    #[arg(short, long, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let overrides = CliOverrides {
        host: cli.host,
        port: cli.port,
        no_browser: cli.no_browser,
    };

    let cfg = match Config::load_from(&cli.config.to_string_lossy(), &overrides) {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("[ERROR] Failed to load configuration: {e}");
            return ExitCode::FAILURE;
        }
    };

    let mut runtime_builder = tokio::runtime::Builder::new_multi_thread();
    runtime_builder.enable_all();
    if let Some(workers) = cfg.server.workers {
        runtime_builder.worker_threads(workers);
    }

    let runtime = match runtime_builder.build() {
        Ok(runtime) => runtime,
        Err(e) => {
            eprintln!("[ERROR] Failed to start runtime: {e}");
            return ExitCode::FAILURE;
        }
    };

    match runtime.block_on(async_main(cfg)) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            logger::log_error(&e.to_string());
            ExitCode::FAILURE
        }
    }
}

async fn async_main(cfg: Config) -> Result<(), Box<dyn std::error::Error>> {
    logger::init(&cfg)?;

    let data_dir = cfg
        .data_dir()
        .ok_or("Could not determine a data directory; set paths.data_dir")?;
    let store = FileStore::new(DataLayout::new(&data_dir));

    let created = store
        .ensure_buffers_exist()
        .await
        .map_err(|e| format!("Failed to prepare {}: {e}", data_dir.display()))?;
    for name in &created {
        logger::log_debug(&format!("Created buffer {name}"));
    }
    store.reset_log().await?;
    let buffers = store.list_buffers().await?;
    logger::log_info(&format!("Loaded {} buffers", buffers.len()));

    let (console, mut interpreter) =
        ProcessConsole::spawn(&cfg.interpreter, &store.layout().log_file())?;
    let console = ConsoleBridge::new(Box::new(console));

    let addr = cfg.get_socket_addr()?;
    let listener = server::create_listener(addr)?;
    logger::log_server_start(&addr, &cfg, &data_dir);

    let open_browser = cfg.server.open_browser;
    let url = cfg.editor_url();
    let state = Arc::new(AppState::new(cfg, store, console.clone()));

    let shutdown = Arc::new(Notify::new());
    let server_task = tokio::spawn(server::run_server(listener, state, Arc::clone(&shutdown)));

    if open_browser {
        logger::log_browser_open(&url);
        if let Err(e) = open::that(&url) {
            logger::log_warning(&format!("Failed to open browser: {e}"));
        }
    }

    let reason = tokio::select! {
        reason = server::wait_for_shutdown_signal() => reason.to_string(),
        lines = repl::run(console) => format!("Terminal input closed after {lines} lines"),
        status = interpreter.wait() => match status {
            Some(status) => format!("Interpreter exited ({status})"),
            None => "Interpreter exited".to_string(),
        },
    };
    logger::log_shutdown(&reason);

    shutdown.notify_one();
    if let Err(e) = server_task.await {
        logger::log_error(&format!("Server task failed: {e}"));
    }
    interpreter.shutdown().await;

    Ok(())
}
