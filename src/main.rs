//! Pi-shell-devices binary: take one Raspberry Pi camera image and announce it.

use pi_shell_devices::{DevicesConfig, RaspistillCamera, Speaker};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(err) = run() {
        tracing::error!("{err}");
        eprintln!("Error: {err}");
        if err.is_fatal() {
            eprintln!("Terminate processing");
        }
        std::process::exit(1);
    }
}

fn run() -> pi_shell_devices::Result<()> {
    let config = DevicesConfig::from_env()?;

    let mut camera = RaspistillCamera::open(&config)?;
    let mut speaker = Speaker::open(&config)?;

    camera.set_width_height(1296, 972)?;
    camera.set_quality(90)?;
    camera.set_exposure_mode("auto")?;
    camera.capture(None)?;

    let exit = camera.wait_for()?;
    println!(
        "Image: {} ({})",
        camera.last_output().unwrap_or("?"),
        exit.map_or_else(|| "not run".to_owned(), |e| format!("exit {:?}", e.code))
    );

    speaker.words("Image captured")?;
    speaker.wait_for()?;
    speaker.time()?;
    speaker.wait_for()?;

    Ok(())
}
