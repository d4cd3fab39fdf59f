//! Command line interface
//!
//! `run` (the default) drives the button controller; `interactive` is a
//! numbered toggle menu; the other subcommands are one-shot manual controls
//! against the camera platform.

use crate::camera_platform::{resolve_camera, CameraPlatform, CameraRef, IrLedMode};
use crate::config::{UpstreamConfig, DEFAULT_CONFIG_FILE};
use crate::error::Result;
use crate::privacy_control::{ControlOutcome, PrivacyControl};
use clap::{Parser, Subcommand, ValueEnum};
use std::fmt::Write as _;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};

#[derive(Debug, Parser)]
#[command(name = "privacy-button", version, about = "Physical privacy button for UniFi Protect cameras")]
pub struct Cli {
    /// Console host (overrides UFP_HOST)
    #[arg(long, global = true)]
    pub host: Option<String>,

    /// Console port (overrides UFP_PORT)
    #[arg(long, global = true)]
    pub port: Option<u16>,

    /// Overrides UFP_USERNAME
    #[arg(long, global = true)]
    pub username: Option<String>,

    /// Overrides UFP_PASSWORD
    #[arg(long, global = true)]
    pub password: Option<String>,

    /// Accept self-signed certificates
    #[arg(long, global = true)]
    pub no_ssl_verify: bool,

    /// Camera document
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_FILE)]
    pub config: PathBuf,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
pub enum Command {
    /// Run the button controller (default)
    Run,
    /// List cameras with privacy and LED state
    List,
    /// Pick cameras from a numbered menu and toggle their privacy
    Interactive,
    /// Set or toggle privacy on one camera
    Privacy { camera: String, action: PrivacyAction },
    /// Status light control
    Led { camera: String, action: LedAction },
    /// IR illuminator control
    Ir { camera: String, action: IrAction },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum PrivacyAction {
    On,
    Off,
    Toggle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LedAction {
    On,
    Off,
    Status,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum IrAction {
    Off,
    Auto,
    Status,
}

impl Cli {
    pub fn command(&self) -> Command {
        self.command.clone().unwrap_or(Command::Run)
    }

    /// Environment values with flag overrides applied
    pub fn upstream(&self) -> UpstreamConfig {
        self.apply_overrides(UpstreamConfig::default())
    }

    fn apply_overrides(&self, mut upstream: UpstreamConfig) -> UpstreamConfig {
        if let Some(host) = &self.host {
            upstream.host = host.clone();
        }
        if let Some(port) = self.port {
            upstream.port = port;
        }
        if let Some(username) = &self.username {
            upstream.username = username.clone();
        }
        if let Some(password) = &self.password {
            upstream.password = password.clone();
        }
        if self.no_ssl_verify {
            upstream.verify_ssl = false;
        }
        upstream
    }
}

/// Run a one-shot command and return the text to print
pub async fn execute(platform: Arc<dyn CameraPlatform>, command: &Command) -> Result<String> {
    let control = PrivacyControl::new(platform.clone());
    let mut out = String::new();

    match command {
        Command::Run | Command::Interactive => {}
        Command::List => {
            let cameras = platform.list_cameras().await?;
            if cameras.is_empty() {
                out.push_str("No cameras found.\n");
            }
            for camera in cameras {
                let led = led_label(&control, &camera.to_ref()).await;
                let _ = writeln!(
                    out,
                    "{}: {} {} [LED {}]",
                    camera.id,
                    camera.name,
                    privacy_label(camera.has_privacy_zone),
                    led
                );
            }
        }
        Command::Privacy { camera, action } => {
            let target = resolve_camera(platform.as_ref(), camera).await?;
            let enable = set_privacy(&control, &target, *action).await?;
            out.push_str(&privacy_message(enable, &target));
        }
        Command::Led { camera, action } => {
            let target = resolve_camera(platform.as_ref(), camera).await?;
            match action {
                LedAction::Status => {
                    let status = control.led_status(&target).await?;
                    let _ = writeln!(out, "LED Status for '{}': {}", target.name, status);
                }
                LedAction::On | LedAction::Off => {
                    let on = *action == LedAction::On;
                    let outcome = control.set_led(&target, on).await?;
                    out.push_str(&describe(&outcome, &format!("LED turned {}", if on { "ON" } else { "OFF" }), "LED"));
                }
            }
        }
        Command::Ir { camera, action } => {
            let target = resolve_camera(platform.as_ref(), camera).await?;
            match action {
                IrAction::Status => {
                    let status = control.ir_status(&target).await?;
                    let _ = writeln!(out, "IR LED Status for '{}': {}", target.name, status);
                }
                IrAction::Off | IrAction::Auto => {
                    let mode = if *action == IrAction::Off { IrLedMode::Off } else { IrLedMode::Auto };
                    let outcome = control.set_ir(&target, mode).await?;
                    out.push_str(&describe(&outcome, &format!("IR LEDs set to {}", mode.as_str().to_uppercase()), "IR LED"));
                }
            }
        }
    }

    Ok(out)
}

/// Returns whether privacy ended up enabled
async fn set_privacy(control: &PrivacyControl, target: &CameraRef, action: PrivacyAction) -> Result<bool> {
    let enable = match action {
        PrivacyAction::On => true,
        PrivacyAction::Off => false,
        PrivacyAction::Toggle => {
            let cameras = control.platform().list_cameras().await?;
            !cameras
                .iter()
                .find(|c| c.id == target.id)
                .map_or(false, |c| c.has_privacy_zone)
        }
    };
    control.apply_privacy(target, enable).await?;
    Ok(enable)
}

fn privacy_message(enable: bool, target: &CameraRef) -> String {
    format!(
        "Privacy {} for camera '{}'\n",
        if enable { "enabled" } else { "disabled" },
        target.name
    )
}

fn privacy_label(on: bool) -> &'static str {
    if on {
        "[PRIVACY ON]"
    } else {
        "[PRIVACY OFF]"
    }
}

async fn led_label(control: &PrivacyControl, camera: &CameraRef) -> String {
    control
        .led_status(camera)
        .await
        .map(|s| s.to_string())
        .unwrap_or_else(|_| "UNKNOWN".to_string())
}

/// Numbered menu: a camera number toggles its privacy, `q` or end of input quits
pub async fn interactive<R, W>(platform: Arc<dyn CameraPlatform>, input: R, out: &mut W) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    W: std::io::Write,
{
    let control = PrivacyControl::new(platform.clone());
    let mut lines = input.lines();

    loop {
        let cameras = platform.list_cameras().await?;
        writeln!(out, "\nAvailable cameras:")?;
        if cameras.is_empty() {
            writeln!(out, "No cameras found.")?;
            return Ok(());
        }
        for (i, camera) in cameras.iter().enumerate() {
            let led = led_label(&control, &camera.to_ref()).await;
            writeln!(
                out,
                "  {}. {} {} [LED {}]",
                i + 1,
                camera.name,
                privacy_label(camera.has_privacy_zone),
                led
            )?;
        }
        write!(out, "Camera number to toggle, 'q' to quit: ")?;
        out.flush()?;

        let Some(line) = lines.next_line().await? else {
            return Ok(());
        };
        let choice = line.trim();
        if choice.eq_ignore_ascii_case("q") {
            return Ok(());
        }

        let Some(camera) = choice
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| cameras.get(i))
        else {
            writeln!(out, "Invalid camera number")?;
            continue;
        };

        let target = camera.to_ref();
        match set_privacy(&control, &target, PrivacyAction::Toggle).await {
            Ok(enable) => write!(out, "{}", privacy_message(enable, &target))?,
            Err(e) => writeln!(out, "Failed to toggle privacy for '{}': {}", target.name, e)?,
        }
    }
}

fn describe(outcome: &ControlOutcome, applied: &str, what: &str) -> String {
    match outcome {
        ControlOutcome::Applied(_) => format!("{}\n", applied),
        ControlOutcome::NotAvailable => format!("{} control not available for this camera model\n", what),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::testing::MockPlatform;

    #[test]
    fn test_default_command_is_run() {
        let cli = Cli::try_parse_from(["privacy-button"]).unwrap();
        assert_eq!(cli.command(), Command::Run);
        assert_eq!(cli.config, PathBuf::from(DEFAULT_CONFIG_FILE));
    }

    #[test]
    fn test_parse_subcommands() {
        let cli = Cli::try_parse_from(["privacy-button", "privacy", "Front Door", "toggle", "--no-ssl-verify"]).unwrap();
        assert_eq!(
            cli.command(),
            Command::Privacy {
                camera: "Front Door".to_string(),
                action: PrivacyAction::Toggle
            }
        );
        assert!(cli.no_ssl_verify);

        let cli = Cli::try_parse_from(["privacy-button", "--config", "/etc/cams.json", "ir", "Garage", "auto"]).unwrap();
        assert_eq!(cli.config, PathBuf::from("/etc/cams.json"));
        assert!(matches!(cli.command(), Command::Ir { action: IrAction::Auto, .. }));

        assert!(Cli::try_parse_from(["privacy-button", "led", "Garage", "blink"]).is_err());
    }

    #[test]
    fn test_flags_override_environment() {
        let cli = Cli::try_parse_from(["privacy-button", "--host", "10.0.0.1", "--port", "7443", "--no-ssl-verify"]).unwrap();
        let base = UpstreamConfig {
            host: "console.local".to_string(),
            port: 443,
            username: "admin".to_string(),
            password: "secret".to_string(),
            verify_ssl: true,
        };
        let upstream = cli.apply_overrides(base);
        assert_eq!(upstream.host, "10.0.0.1");
        assert_eq!(upstream.port, 7443);
        assert_eq!(upstream.username, "admin");
        assert!(!upstream.verify_ssl);
    }

    #[tokio::test]
    async fn test_privacy_toggle_uses_current_state() {
        let platform = Arc::new(MockPlatform::with_cameras(&["Garage"]));
        let toggle = Command::Privacy {
            camera: "garage".to_string(),
            action: PrivacyAction::Toggle,
        };

        let out = execute(platform.clone(), &toggle).await.unwrap();
        assert_eq!(out, "Privacy enabled for camera 'Garage'\n");
        assert!(platform.privacy_on("Garage"));

        let out = execute(platform.clone(), &toggle).await.unwrap();
        assert_eq!(out, "Privacy disabled for camera 'Garage'\n");
    }

    #[tokio::test]
    async fn test_list_and_status() {
        let platform = Arc::new(MockPlatform::with_cameras(&["Garage"]));
        let out = execute(platform.clone(), &Command::List).await.unwrap();
        assert_eq!(out, "cam-0: Garage [PRIVACY OFF] [LED ON]\n");

        platform.remove_ir("Garage");
        let out = execute(
            platform.clone(),
            &Command::Ir {
                camera: "Garage".to_string(),
                action: IrAction::Off,
            },
        )
        .await
        .unwrap();
        assert_eq!(out, "IR LED control not available for this camera model\n");
    }

    #[tokio::test]
    async fn test_unknown_camera() {
        let platform = Arc::new(MockPlatform::with_cameras(&["Garage"]));
        let err = execute(
            platform,
            &Command::Led {
                camera: "Porch".to_string(),
                action: LedAction::Status,
            },
        )
        .await
        .unwrap_err();
        assert!(matches!(err, Error::CameraNotFound(_)));
    }

    #[tokio::test]
    async fn test_interactive_menu_toggles_selected_camera() {
        let platform = Arc::new(MockPlatform::with_cameras(&["Garage", "Porch"]));
        let input: &[u8] = b"2\nseven\n9\n2\nq\n";
        let mut out = Vec::new();

        interactive(platform.clone(), input, &mut out).await.unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("  1. Garage [PRIVACY OFF] [LED ON]"));
        assert!(text.contains("Privacy enabled for camera 'Porch'"));
        assert!(text.contains("  2. Porch [PRIVACY ON] [LED OFF]"));
        assert_eq!(text.matches("Invalid camera number").count(), 2);
        assert!(text.contains("Privacy disabled for camera 'Porch'"));
        assert!(!platform.privacy_on("Porch"));
        assert!(!platform.privacy_on("Garage"));
    }

    #[tokio::test]
    async fn test_interactive_ends_on_eof() {
        let platform = Arc::new(MockPlatform::with_cameras(&["Garage"]));
        let input: &[u8] = b"";
        let mut out = Vec::new();
        interactive(platform, input, &mut out).await.unwrap();
        assert!(String::from_utf8(out).unwrap().contains("1. Garage"));
    }
}
