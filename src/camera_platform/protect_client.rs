//! UniFi Protect client
//!
//! Cookie session + CSRF token against the console, camera state cached from
//! the bootstrap document and refreshed from every PATCH response.

use super::types::*;
use super::CameraPlatform;
use crate::config::UpstreamConfig;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::RwLock;

/// Zone name written by us (and by the uiprotect library)
const PRIVACY_ZONE_NAME: &str = "pyufp_privacy_zone";
const PRIVACY_ZONE_COLOR: &str = "#85BCEC";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Camera as returned by bootstrap / PATCH
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProtectCamera {
    id: String,
    name: String,
    #[serde(default)]
    privacy_zones: Vec<Value>,
    #[serde(default)]
    feature_flags: FeatureFlags,
    #[serde(default)]
    led_settings: Option<LedSettings>,
    #[serde(default)]
    isp_settings: Option<IspSettings>,
    /// Every other field of the camera document
    #[serde(flatten)]
    other: serde_json::Map<String, Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FeatureFlags {
    #[serde(default)]
    has_led_ir: bool,
    #[serde(default)]
    has_led_status: bool,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct LedSettings {
    #[serde(default)]
    is_enabled: Option<bool>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IspSettings {
    #[serde(default)]
    ir_led_mode: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Bootstrap {
    #[serde(default)]
    cameras: Vec<ProtectCamera>,
}

impl ProtectCamera {
    /// Camel-case key of a boolean field the camera document actually has
    fn device_property_key(&self, property: &str) -> Option<String> {
        let key = camel_case(property);
        self.other
            .get(&key)
            .filter(|v| v.is_boolean())
            .map(|_| key)
    }

    fn summary(&self) -> CameraSummary {
        CameraSummary {
            id: self.id.clone(),
            name: self.name.clone(),
            has_privacy_zone: self.privacy_zones.iter().any(is_privacy_zone),
        }
    }
}

fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

/// Zones with our full-frame zone appended
fn zones_with_privacy(zones: &[Value]) -> Vec<Value> {
    if zones.iter().any(is_privacy_zone) {
        return zones.to_vec();
    }

    let next_id = zones
        .iter()
        .filter_map(|z| z.get("id").and_then(Value::as_i64))
        .max()
        .map_or(0, |id| id + 1);

    let mut out = zones.to_vec();
    out.push(json!({
        "id": next_id,
        "name": PRIVACY_ZONE_NAME,
        "color": PRIVACY_ZONE_COLOR,
        "points": [[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 1.0]],
    }));
    out
}

/// Zones with our full-frame zone removed
fn zones_without_privacy(zones: &[Value]) -> Vec<Value> {
    zones.iter().filter(|z| !is_privacy_zone(z)).cloned().collect()
}

fn is_privacy_zone(zone: &Value) -> bool {
    zone.get("name").and_then(Value::as_str) == Some(PRIVACY_ZONE_NAME)
}

/// UniFi Protect session
pub struct ProtectClient {
    client: Client,
    base_url: String,
    username: String,
    password: String,
    csrf_token: RwLock<Option<String>>,
    cameras: RwLock<HashMap<String, ProtectCamera>>,
}

impl ProtectClient {
    /// Log in and load the camera inventory
    pub async fn connect(config: &UpstreamConfig) -> Result<Self> {
        let client = Client::builder()
            .cookie_store(true)
            .danger_accept_invalid_certs(!config.verify_ssl)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        let session = Self {
            client,
            base_url: format!("https://{}:{}", config.host, config.port),
            username: config.username.clone(),
            password: config.password.clone(),
            csrf_token: RwLock::new(None),
            cameras: RwLock::new(HashMap::new()),
        };

        session.login().await?;
        session.refresh().await?;

        tracing::info!(
            host = %config.host,
            cameras = session.cameras.read().await.len(),
            "Connected to UniFi Protect"
        );

        Ok(session)
    }

    async fn login(&self) -> Result<()> {
        let url = format!("{}/api/auth/login", self.base_url);
        let response = self
            .client
            .post(&url)
            .json(&json!({
                "username": self.username,
                "password": self.password,
                "rememberMe": true,
            }))
            .send()
            .await
            .map_err(|e| Error::Connection(format!("Login request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Connection(format!(
                "Login rejected with status {}",
                status
            )));
        }

        let token = response
            .headers()
            .get("x-updated-csrf-token")
            .or_else(|| response.headers().get("x-csrf-token"))
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        *self.csrf_token.write().await = token;
        tracing::debug!(url = %url, "Protect login succeeded");
        Ok(())
    }

    /// Reload the camera cache from bootstrap
    pub async fn refresh(&self) -> Result<()> {
        let response = self
            .send(Method::GET, "/proxy/protect/api/bootstrap", None)
            .await
            .map_err(|e| Error::Connection(format!("Bootstrap failed: {}", e)))?;

        let bootstrap: Bootstrap = response.json().await?;
        let mut cameras = self.cameras.write().await;
        cameras.clear();
        for camera in bootstrap.cameras {
            cameras.insert(camera.id.clone(), camera);
        }
        Ok(())
    }

    /// Send with CSRF header; re-authenticate once on 401
    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<reqwest::Response> {
        let url = format!("{}{}", self.base_url, path);

        for attempt in 0..2 {
            let mut request = self.client.request(method.clone(), &url);
            if let Some(token) = self.csrf_token.read().await.as_deref() {
                request = request.header("X-CSRF-Token", token);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            tracing::debug!(url = %url, method = %method, "Sending Protect request");
            let response = request.send().await?;
            let status = response.status();

            if status == StatusCode::UNAUTHORIZED && attempt == 0 {
                tracing::info!("Protect session expired, logging in again");
                self.login().await?;
                continue;
            }

            if !status.is_success() {
                let text = response.text().await.unwrap_or_default();
                return Err(Error::Internal(format!(
                    "{} {} failed with status {}: {}",
                    method, path, status, text
                )));
            }

            return Ok(response);
        }

        Err(Error::Connection("Protect authentication failed".to_string()))
    }

    async fn cached(&self, camera: &CameraRef) -> Result<ProtectCamera> {
        self.cameras
            .read()
            .await
            .get(&camera.id)
            .cloned()
            .ok_or_else(|| Error::CameraNotFound(camera.name.clone()))
    }

    /// PATCH the camera and cache the returned document
    async fn patch_camera(&self, camera: &CameraRef, body: Value) -> Result<()> {
        let path = format!("/proxy/protect/api/cameras/{}", camera.id);
        let response = self
            .send(Method::PATCH, &path, Some(&body))
            .await
            .map_err(|e| Error::control(&camera.name, e.to_string()))?;

        match response.json::<ProtectCamera>().await {
            Ok(updated) => {
                self.cameras.write().await.insert(updated.id.clone(), updated);
            }
            Err(e) => {
                tracing::debug!(camera = %camera.name, error = %e, "PATCH response not a camera document");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl CameraPlatform for ProtectClient {
    async fn list_cameras(&self) -> Result<Vec<CameraSummary>> {
        let cameras = self.cameras.read().await;
        let mut list: Vec<_> = cameras.values().map(ProtectCamera::summary).collect();
        list.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(list)
    }

    async fn enable_privacy(&self, camera: &CameraRef) -> Result<()> {
        let current = self.cached(camera).await?;
        let zones = zones_with_privacy(&current.privacy_zones);
        self.patch_camera(camera, json!({ "privacyZones": zones })).await
    }

    async fn disable_privacy(&self, camera: &CameraRef) -> Result<()> {
        let current = self.cached(camera).await?;
        let zones = zones_without_privacy(&current.privacy_zones);
        self.patch_camera(camera, json!({ "privacyZones": zones })).await
    }

    async fn set_status_light(&self, camera: &CameraRef, on: bool) -> Result<()> {
        let current = self.cached(camera).await?;
        if !current.feature_flags.has_led_status {
            return Err(Error::Unsupported("status light".to_string()));
        }
        self.patch_camera(camera, json!({ "ledSettings": { "isEnabled": on } }))
            .await
    }

    async fn update_device_property(
        &self,
        camera: &CameraRef,
        property: &str,
        value: bool,
    ) -> Result<()> {
        let current = self.cached(camera).await?;
        let Some(key) = current.device_property_key(property) else {
            return Err(Error::Unsupported(format!("device property {}", property)));
        };
        let mut body = serde_json::Map::new();
        body.insert(key, Value::Bool(value));
        self.patch_camera(camera, Value::Object(body)).await
    }

    async fn set_led_mode(&self, _camera: &CameraRef, _mode: LedMode) -> Result<()> {
        Err(Error::Unsupported("named LED mode".to_string()))
    }

    async fn set_ir_led_mode(&self, camera: &CameraRef, mode: IrLedMode) -> Result<()> {
        let current = self.cached(camera).await?;
        if !current.feature_flags.has_led_ir {
            return Err(Error::Unsupported("IR LED".to_string()));
        }
        self.patch_camera(
            camera,
            json!({ "ispSettings": { "irLedMode": mode.as_str() } }),
        )
        .await
    }

    async fn led_status(&self, camera: &CameraRef) -> Result<LedStatus> {
        let current = self.cached(camera).await?;
        Ok(match current.led_settings.and_then(|s| s.is_enabled) {
            Some(true) => LedStatus::On,
            Some(false) => LedStatus::Off,
            None => LedStatus::Unknown,
        })
    }

    async fn ir_led_status(&self, camera: &CameraRef) -> Result<IrLedStatus> {
        let current = self.cached(camera).await?;
        if !current.feature_flags.has_led_ir {
            return Ok(IrLedStatus::NotAvailable);
        }
        Ok(current
            .isp_settings
            .and_then(|s| s.ir_led_mode)
            .map(|m| IrLedStatus::from_mode(&m))
            .unwrap_or(IrLedStatus::Unknown))
    }
}
