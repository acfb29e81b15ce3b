use std::process::ExitCode;

use tracing::{error, info};

use novade_window_bootstrap::config::{BootstrapConfig, ConfigLoader};
use novade_window_bootstrap::logging::{init_logging, init_minimal_logging};
use novade_window_bootstrap::{bootstrap, BootstrapError, EglPlatform, XcbConnector};

fn main() -> ExitCode {
    let config = match ConfigLoader::load() {
        Ok(config) => config,
        Err(e) => {
            init_minimal_logging();
            error!("Configuration error: {}", e);
            eprintln!("window-bootstrap: {}", BootstrapError::from(e).summary());
            return ExitCode::FAILURE;
        }
    };

    if let Err(e) = init_logging(&config.logging) {
        init_minimal_logging();
        error!("Logging setup failed, continuing with minimal logging: {}", e);
    }

    match launch(&config) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("window-bootstrap: {}", e.summary());
            ExitCode::FAILURE
        }
    }
}

fn launch(config: &BootstrapConfig) -> Result<(), BootstrapError> {
    // libEGL is opened lazily, after the window is mapped.
    let egl = config.gpu.enabled.then(EglPlatform::new);
    if egl.is_none() {
        info!("GPU negotiation disabled by configuration.");
    }

    let connector = XcbConnector::new(config.display.name.clone());
    let report = bootstrap::run(connector, egl.as_ref(), config)?;

    info!(
        "Window {:#x} on screen {} bootstrapped{}.",
        report.window,
        report.screen.index,
        if report.gpu.is_some() { " with a current GPU context" } else { "" }
    );
    Ok(())
}
