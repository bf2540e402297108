// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Thin HTTP client for `patzed`'s admin surface (§4.11a). Each method maps
//! 1:1 onto one of the routes `patze-daemon::http::router` exposes.

use std::time::Duration;

use patze_wire::{BridgeCommandDto, BridgeConnectionDto, CreateCommandRequest, ScheduledTaskDto};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("{code}: {message}")]
    Rejected { code: String, message: String },
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    code: String,
    message: String,
}

pub struct DaemonClient {
    base_url: String,
    http: reqwest::Client,
}

impl DaemonClient {
    pub fn new(base_url: String) -> Self {
        Self { base_url, http: reqwest::Client::builder().timeout(Duration::from_secs(10)).build().unwrap_or_default() }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, ClientError> {
        let resp = self.http.get(format!("{}{path}", self.base_url)).send().await?;
        Self::into_json(resp).await
    }

    async fn post_json<B: Serialize, T: for<'de> Deserialize<'de>>(&self, path: &str, body: &B) -> Result<T, ClientError> {
        let resp = self.http.post(format!("{}{path}", self.base_url)).json(body).send().await?;
        Self::into_json(resp).await
    }

    async fn delete(&self, path: &str) -> Result<(), ClientError> {
        let resp = self.http.delete(format!("{}{path}", self.base_url)).send().await?;
        if resp.status().is_success() {
            return Ok(());
        }
        Self::into_json::<()>(resp).await
    }

    async fn into_json<T: for<'de> Deserialize<'de>>(resp: reqwest::Response) -> Result<T, ClientError> {
        if resp.status().is_success() {
            Ok(resp.json::<T>().await?)
        } else {
            match resp.json::<ErrorBody>().await {
                Ok(body) => Err(ClientError::Rejected { code: body.code, message: body.message }),
                Err(_) => Err(ClientError::Rejected { code: "unknown".to_string(), message: "request rejected".to_string() }),
            }
        }
    }

    pub async fn list_bridges(&self) -> Result<Vec<BridgeConnectionDto>, ClientError> {
        self.get_json("/bridge/connections").await
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn setup_bridge(
        &self,
        host: String,
        port: u16,
        user: String,
        identity_file: Option<String>,
        local_port: u16,
        remote_port: u16,
    ) -> Result<BridgeConnectionDto, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body {
            host: String,
            port: u16,
            user: String,
            #[serde(skip_serializing_if = "Option::is_none")]
            identity_file: Option<String>,
            local_port: u16,
            remote_port: u16,
        }
        self.post_json("/bridges", &Body { host, port, user, identity_file, local_port, remote_port }).await
    }

    pub async fn remove_bridge(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&format!("/bridges/{id}")).await
    }

    pub async fn retry_with_sudo(&self, id: &str, sudo_password: String) -> Result<BridgeConnectionDto, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body {
            sudo_password: String,
        }
        self.post_json(&format!("/bridges/{id}/retry-sudo"), &Body { sudo_password }).await
    }

    pub async fn list_commands(&self, limit: usize) -> Result<Vec<BridgeCommandDto>, ClientError> {
        self.get_json(&format!("/commands?limit={limit}")).await
    }

    pub async fn create_command(&self, req: CreateCommandRequest) -> Result<BridgeCommandDto, ClientError> {
        self.post_json("/commands", &req).await
    }

    pub async fn approve_command(
        &self,
        id: &str,
        target_id: String,
        target_version: String,
        approved_by: String,
    ) -> Result<Option<BridgeCommandDto>, ClientError> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Body {
            target_id: String,
            target_version: String,
            approved_by: String,
        }
        self.post_json(&format!("/commands/{id}/approve"), &Body { target_id, target_version, approved_by }).await
    }

    pub async fn reject_command(&self, id: &str, reason: String) -> Result<Option<BridgeCommandDto>, ClientError> {
        #[derive(Serialize)]
        struct Body {
            reason: String,
        }
        self.post_json(&format!("/commands/{id}/reject"), &Body { reason }).await
    }

    pub async fn list_tasks(&self) -> Result<Vec<ScheduledTaskDto>, ClientError> {
        self.get_json("/tasks").await
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
