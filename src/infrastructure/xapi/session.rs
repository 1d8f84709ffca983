use super::client::JsonRpcClient;
use crate::core::api::XenApi;
use crate::domain::config::XenCredentials;
use crate::domain::error::{XenError, XenResult};
use crate::domain::vm::{GuestMetrics, OpaqueRef, VmRecord};
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use std::time::Duration;
use tracing::{debug, info};

/// Authenticated XAPI session.
///
/// [`XenSession::logout`] consumes the session, so it ends at most once.
pub struct XenSession {
    client: JsonRpcClient,
    session_ref: OpaqueRef,
}

impl XenSession {
    /// Log in with `session.login_with_password`.
    pub async fn login(credentials: &XenCredentials, timeout: Duration) -> XenResult<Self> {
        let client = JsonRpcClient::new(&credentials.host, timeout)?;
        debug!("Logging in to {} as {}", client.endpoint(), credentials.username);

        let session_ref: OpaqueRef = client
            .call(
                "session.login_with_password",
                &[json!(credentials.username), json!(credentials.password)],
            )
            .await
            .map_err(|e| match e {
                XenError::Api(failure) if failure.is_authentication_failure() => {
                    XenError::Authentication {
                        message: failure.to_string(),
                    }
                }
                XenError::Api(failure) => XenError::Connection {
                    message: failure.to_string(),
                },
                other => other,
            })?;

        info!("Connected to XenServer {}", credentials.host);
        Ok(Self {
            client,
            session_ref,
        })
    }

    pub fn session_ref(&self) -> &OpaqueRef {
        &self.session_ref
    }

    pub async fn logout(self) -> XenResult<()> {
        self.client
            .call::<Value>("session.logout", &[json!(self.session_ref)])
            .await?;
        debug!("Session {} logged out", self.session_ref);
        Ok(())
    }

    /// Call a method whose first parameter is the session handle.
    async fn invoke<T: DeserializeOwned>(&self, method: &str, args: &[Value]) -> XenResult<T> {
        let mut params = Vec::with_capacity(args.len() + 1);
        params.push(json!(self.session_ref));
        params.extend_from_slice(args);
        self.client.call(method, &params).await
    }
}

#[async_trait]
impl XenApi for XenSession {
    async fn list_vms(&self) -> XenResult<Vec<OpaqueRef>> {
        self.invoke("VM.get_all", &[]).await
    }

    async fn vms_by_name(&self, name: &str) -> XenResult<Vec<OpaqueRef>> {
        self.invoke("VM.get_by_name_label", &[json!(name)]).await
    }

    async fn vm_record(&self, vm: &OpaqueRef) -> XenResult<VmRecord> {
        self.invoke("VM.get_record", &[json!(vm)]).await
    }

    async fn vm_tags(&self, vm: &OpaqueRef) -> XenResult<Vec<String>> {
        self.invoke("VM.get_tags", &[json!(vm)]).await
    }

    async fn add_tag(&self, vm: &OpaqueRef, tag: &str) -> XenResult<()> {
        self.invoke::<Value>("VM.add_tags", &[json!(vm), json!(tag)]).await?;
        Ok(())
    }

    async fn remove_tag(&self, vm: &OpaqueRef, tag: &str) -> XenResult<()> {
        self.invoke::<Value>("VM.remove_tags", &[json!(vm), json!(tag)]).await?;
        Ok(())
    }

    async fn guest_metrics(&self, metrics: &OpaqueRef) -> XenResult<GuestMetrics> {
        self.invoke("VM_guest_metrics.get_record", &[json!(metrics)]).await
    }
}
