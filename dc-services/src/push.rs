//! Local push registration.
//!
//! Issues a stable installation token of the form `<hostname>-<uuid>` when
//! the platform can show notifications and push is enabled in config. The
//! token is generated on first successful registration and reused after.

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info};

use dc_core::config::NotificationConfig;
use dc_core::error::DcResult;
use dc_core::platform::Platform;

use crate::platform::{PushRegistrar, PushToken};

/// `PushRegistrar` for desktop runs.
pub struct LocalPushRegistrar {
    /// Whether the platform can show notifications at all.
    supported: bool,
    /// Whether the user allowed push.
    allowed: bool,
    device_name: String,
    token: Mutex<Option<PushToken>>,
}

impl LocalPushRegistrar {
    pub fn new(supported: bool, allowed: bool, device_name: impl Into<String>) -> Self {
        Self {
            supported,
            allowed,
            device_name: device_name.into(),
            token: Mutex::new(None),
        }
    }

    /// Registrar for the current platform and host.
    pub fn from_config(config: &NotificationConfig) -> Self {
        Self::new(
            Platform::current().supports_notifications(),
            config.push_enabled,
            Platform::hostname(),
        )
    }

    pub fn device_name(&self) -> &str {
        &self.device_name
    }

    /// The token issued so far, if any.
    pub async fn token(&self) -> Option<PushToken> {
        self.token.lock().await.clone()
    }
}

#[async_trait]
impl PushRegistrar for LocalPushRegistrar {
    fn is_supported(&self) -> bool {
        self.supported
    }

    async fn register(&self) -> DcResult<Option<PushToken>> {
        if !self.supported {
            debug!("push: platform {} cannot show notifications", Platform::current());
            return Ok(None);
        }
        if !self.allowed {
            info!("push: permission not granted");
            return Ok(None);
        }

        let mut token = self.token.lock().await;
        let issued = token
            .get_or_insert_with(|| {
                let fresh = format!("{}-{}", self.device_name, uuid::Uuid::new_v4());
                info!("push: registered device {}", self.device_name);
                fresh
            })
            .clone();
        Ok(Some(issued))
    }
}
