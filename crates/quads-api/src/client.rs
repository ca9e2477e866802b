//! Asynchronous QUADS API client.
//!
//! Read operations return the decoded JSON body. Mutating operations
//! (create, insert, update, remove) return the full [`ApiResponse`] so the
//! status code stays visible to the caller.

use crate::routes;
use crate::transport::QuadsTransport;
use crate::Result;
use futures::FutureExt;
use quads_core::client::{ClientConfig, RetryPolicy};
use quads_core::config::QuadsConfig;
use quads_core::{ApiResponse, Endpoint, QuadsSessionBuilder, QueryParams};
use serde::Serialize;
use serde_json::Value;
use std::fmt::Display;
use std::future::Future;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use tracing::warn;
use url::Url;

const USER_AGENT: &str = concat!("quads-api/", env!("CARGO_PKG_VERSION"));

/// Builder for [`QuadsApi`].
#[derive(Debug, Clone)]
pub struct QuadsApiBuilder {
    inner: QuadsSessionBuilder,
}

impl QuadsApiBuilder {
    /// Create a builder for the specified base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        let builder = QuadsSessionBuilder::new(base_url)?.with_user_agent(USER_AGENT);
        Ok(Self { inner: builder })
    }

    /// Create a builder from a [`QuadsConfig`].
    pub fn from_config(config: &QuadsConfig) -> Result<Self> {
        let builder = QuadsSessionBuilder::from_config(config)?.with_user_agent(USER_AGENT);
        Ok(Self { inner: builder })
    }

    /// Override the retry policy.
    #[must_use]
    pub fn with_retry_policy(mut self, retry: RetryPolicy) -> Self {
        self.inner = self.inner.with_retry_policy(retry);
        self
    }

    /// Override the HTTP client configuration.
    #[must_use]
    pub fn with_http_config(mut self, config: ClientConfig) -> Self {
        self.inner = self.inner.with_http_config(config);
        self
    }

    /// Configure the credentials used by [`QuadsApi::login`].
    #[must_use]
    pub fn with_basic_auth(
        mut self,
        username: impl Into<String>,
        password: impl Into<String>,
    ) -> Self {
        self.inner = self.inner.with_basic_auth(username, password);
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<QuadsApi> {
        let session = self.inner.build()?;
        Ok(QuadsApi::with_transport(Arc::new(session)))
    }
}

/// Asynchronous QUADS API client.
#[derive(Clone)]
pub struct QuadsApi {
    transport: Arc<dyn QuadsTransport>,
}

impl QuadsApi {
    /// Construct a client directly from the base URL.
    pub fn new(base_url: impl AsRef<str>) -> Result<Self> {
        QuadsApiBuilder::new(base_url)?.build()
    }

    /// Construct a client from a [`QuadsConfig`].
    pub fn from_config(config: &QuadsConfig) -> Result<Self> {
        QuadsApiBuilder::from_config(config)?.build()
    }

    /// Start a builder for the given base URL.
    pub fn builder(base_url: impl AsRef<str>) -> Result<QuadsApiBuilder> {
        QuadsApiBuilder::new(base_url)
    }

    /// Wrap an existing transport.
    #[must_use]
    pub fn with_transport(transport: Arc<dyn QuadsTransport>) -> Self {
        Self { transport }
    }

    /// Resolve a catalog path against the base URL.
    pub fn url_for(&self, path: &str) -> Result<Url> {
        self.transport.url_for(path)
    }

    /// Log in and attach the issued bearer token to later requests.
    pub async fn login(&self) -> Result<()> {
        self.transport.login().await
    }

    /// Log out; a no-op when not logged in.
    pub async fn logout(&self) -> Result<()> {
        self.transport.logout().await
    }

    /// Run `work` inside a logged-in session.
    ///
    /// Logs in first, then always logs out once `work` finishes, whether it
    /// succeeded, failed or panicked, and finally drops the client so its
    /// connection pool is released when no other clones remain. When both
    /// `work` and logout fail, the error from `work` is returned. A panic in
    /// `work` is resumed after logout.
    ///
    /// Logout is asynchronous, so it does not run if the returned future is
    /// dropped before completion; call [`QuadsApi::logout`] yourself when
    /// cancelling a scoped session.
    pub async fn scoped<F, Fut, T>(self, work: F) -> Result<T>
    where
        F: FnOnce(QuadsApi) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        self.login().await?;
        let session = self.clone();
        let outcome = AssertUnwindSafe(async move { work(session).await })
            .catch_unwind()
            .await;
        let logout = self.logout().await;
        drop(self);

        let outcome = match outcome {
            Ok(outcome) => outcome,
            Err(payload) => {
                if let Err(err) = logout {
                    warn!(error = %err, "logout failed after scoped work panicked");
                }
                panic::resume_unwind(payload);
            }
        };

        match (outcome, logout) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(err)) => Err(err),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(logout_err)) => {
                warn!(error = %logout_err, "logout failed after scoped work failed");
                Err(err)
            }
        }
    }

    // Hosts

    /// List all hosts.
    pub async fn get_hosts(&self) -> Result<Value> {
        self.get(&routes::get_hosts()).await
    }

    /// Hosts grouped by model.
    pub async fn get_host_models(&self) -> Result<Value> {
        self.get(&routes::get_host_models()).await
    }

    /// Hosts matching every filter.
    pub async fn filter_hosts(&self, filters: &QueryParams) -> Result<Value> {
        self.get(&routes::filter_hosts(filters)).await
    }

    /// Fetch a single host.
    pub async fn get_host(&self, hostname: &str) -> Result<Value> {
        self.get(&routes::get_host(hostname)).await
    }

    /// Create a host.
    pub async fn create_host<B>(&self, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::create_host(), Some(data)).await
    }

    /// Update a host.
    pub async fn update_host<B>(&self, hostname: &str, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::update_host(hostname), Some(data)).await
    }

    /// Remove a host.
    pub async fn remove_host(&self, hostname: &str) -> Result<ApiResponse> {
        self.send::<()>(&routes::remove_host(hostname), None).await
    }

    /// Whether `hostname` is available for the given window.
    ///
    /// True iff the response, rendered as JSON text, contains `true`.
    pub async fn is_available(&self, hostname: &str, filters: &QueryParams) -> Result<bool> {
        let body = self.get(&routes::is_available(hostname, filters)).await?;
        Ok(body.to_string().contains("true"))
    }

    // Clouds

    /// List all clouds.
    pub async fn get_clouds(&self) -> Result<Value> {
        self.get(&routes::get_clouds()).await
    }

    /// Clouds matching every filter.
    pub async fn filter_clouds(&self, filters: &QueryParams) -> Result<Value> {
        self.get(&routes::filter_clouds(filters)).await
    }

    /// Clouds with no active assignment.
    pub async fn get_free_clouds(&self) -> Result<Value> {
        self.get(&routes::get_free_clouds()).await
    }

    /// Fetch a cloud by name.
    pub async fn get_cloud(&self, cloud_name: &str) -> Result<Value> {
        self.get(&routes::get_cloud(cloud_name)).await
    }

    /// Cloud summary, optionally filtered.
    pub async fn get_summary(&self, filters: &QueryParams) -> Result<Value> {
        self.get(&routes::get_summary(filters)).await
    }

    /// Create a cloud.
    pub async fn insert_cloud<B>(&self, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::insert_cloud(), Some(data)).await
    }

    /// Update a cloud.
    pub async fn update_cloud<B>(&self, cloud_name: &str, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::update_cloud(cloud_name), Some(data)).await
    }

    /// Remove a cloud.
    pub async fn remove_cloud(&self, cloud_name: &str) -> Result<ApiResponse> {
        self.send::<()>(&routes::remove_cloud(cloud_name), None).await
    }

    // Schedules

    /// List schedules, optionally filtered.
    pub async fn get_schedules(&self, filters: &QueryParams) -> Result<Value> {
        self.get(&routes::get_schedules(filters)).await
    }

    /// Schedules active now, optionally filtered.
    pub async fn get_current_schedules(&self, filters: &QueryParams) -> Result<Value> {
        self.get(&routes::get_current_schedules(filters)).await
    }

    /// Schedules starting in the future, optionally filtered.
    pub async fn get_future_schedules(&self, filters: &QueryParams) -> Result<Value> {
        self.get(&routes::get_future_schedules(filters)).await
    }

    /// Fetch a schedule by id.
    pub async fn get_schedule(&self, schedule_id: impl Display) -> Result<Value> {
        self.get(&routes::get_schedule(schedule_id)).await
    }

    /// Create a schedule.
    pub async fn insert_schedule<B>(&self, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::insert_schedule(), Some(data)).await
    }

    /// Update a schedule.
    pub async fn update_schedule<B>(&self, schedule_id: impl Display, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::update_schedule(schedule_id), Some(data))
            .await
    }

    /// Remove a schedule.
    pub async fn remove_schedule(&self, schedule_id: impl Display) -> Result<ApiResponse> {
        self.send::<()>(&routes::remove_schedule(schedule_id), None)
            .await
    }

    // Available

    /// List available hosts.
    pub async fn get_available(&self) -> Result<Value> {
        self.get(&routes::get_available()).await
    }

    /// Available hosts matching every filter.
    pub async fn filter_available(&self, filters: &QueryParams) -> Result<Value> {
        self.get(&routes::filter_available(filters)).await
    }

    // Assignments

    /// Assignments matching every filter.
    pub async fn filter_assignments(&self, filters: &QueryParams) -> Result<Value> {
        self.get(&routes::filter_assignments(filters)).await
    }

    /// Create an assignment.
    pub async fn insert_assignment<B>(&self, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::insert_assignment(), Some(data)).await
    }

    /// Update an assignment.
    pub async fn update_assignment<B>(
        &self,
        assignment_id: impl Display,
        data: &B,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::update_assignment(assignment_id), Some(data))
            .await
    }

    /// All active assignments.
    pub async fn get_active_assignments(&self) -> Result<Value> {
        self.get(&routes::get_active_assignments()).await
    }

    /// The active assignment of a cloud.
    pub async fn get_active_cloud_assignment(&self, cloud_name: &str) -> Result<Value> {
        self.get(&routes::get_active_cloud_assignment(cloud_name))
            .await
    }

    /// Update a notification.
    pub async fn update_notification<B>(
        &self,
        notification_id: impl Display,
        data: &B,
    ) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::update_notification(notification_id), Some(data))
            .await
    }

    // Interfaces

    /// List all interfaces.
    pub async fn get_interfaces(&self) -> Result<Value> {
        self.get(&routes::get_interfaces()).await
    }

    /// Interfaces of one host.
    pub async fn get_host_interface(&self, hostname: &str) -> Result<Value> {
        self.get(&routes::get_host_interface(hostname)).await
    }

    /// Add an interface to a host.
    pub async fn create_interface<B>(&self, hostname: &str, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::create_interface(hostname), Some(data))
            .await
    }

    /// Update an interface of a host.
    pub async fn update_interface<B>(&self, hostname: &str, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::update_interface(hostname), Some(data))
            .await
    }

    /// Remove an interface from a host.
    pub async fn remove_interface(&self, hostname: &str, if_name: &str) -> Result<ApiResponse> {
        self.send::<()>(&routes::remove_interface(hostname, if_name), None)
            .await
    }

    // Memory, disks, processors

    /// Add a memory module to a host.
    pub async fn create_memory<B>(&self, hostname: &str, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::create_memory(hostname), Some(data)).await
    }

    /// Remove a memory module.
    pub async fn remove_memory(&self, memory_id: impl Display) -> Result<ApiResponse> {
        self.send::<()>(&routes::remove_memory(memory_id), None).await
    }

    /// Add a disk to a host.
    pub async fn create_disk<B>(&self, hostname: &str, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::create_disk(hostname), Some(data)).await
    }

    /// Update a disk of a host.
    pub async fn update_disk<B>(&self, hostname: &str, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::update_disk(hostname), Some(data)).await
    }

    /// Remove a disk from a host.
    pub async fn remove_disk(&self, hostname: &str, disk_id: impl Display) -> Result<ApiResponse> {
        self.send::<()>(&routes::remove_disk(hostname, disk_id), None)
            .await
    }

    /// Add a processor to a host.
    pub async fn create_processor<B>(&self, hostname: &str, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::create_processor(hostname), Some(data))
            .await
    }

    /// Remove a processor.
    pub async fn remove_processor(&self, processor_id: impl Display) -> Result<ApiResponse> {
        self.send::<()>(&routes::remove_processor(processor_id), None)
            .await
    }

    // Vlans

    /// List all vlans.
    pub async fn get_vlans(&self) -> Result<Value> {
        self.get(&routes::get_vlans()).await
    }

    /// Fetch a vlan by id.
    pub async fn get_vlan(&self, vlan_id: impl Display) -> Result<Value> {
        self.get(&routes::get_vlan(vlan_id)).await
    }

    /// Create a vlan.
    pub async fn create_vlan<B>(&self, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::create_vlan(), Some(data)).await
    }

    /// Update a vlan.
    pub async fn update_vlan<B>(&self, vlan_id: impl Display, data: &B) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        self.send(&routes::update_vlan(vlan_id), Some(data)).await
    }

    // Moves and version

    /// Pending host moves, optionally as of `date`.
    pub async fn get_moves(&self, date: Option<&str>) -> Result<Value> {
        self.get(&routes::get_moves(date)).await
    }

    /// Server version.
    pub async fn get_version(&self) -> Result<Value> {
        self.get(&routes::get_version()).await
    }

    async fn get(&self, endpoint: &Endpoint) -> Result<Value> {
        self.transport
            .call(endpoint, None)
            .await
            .map(ApiResponse::into_body)
    }

    async fn send<B>(&self, endpoint: &Endpoint, body: Option<&B>) -> Result<ApiResponse>
    where
        B: Serialize + ?Sized,
    {
        let body = body.map(serde_json::to_value).transpose()?;
        self.transport.call(endpoint, body).await
    }
}
