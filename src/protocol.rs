//! Line-delimited JSON protocol spoken with the GUI client and the kernel hook.
//!
//! Client requests carry `{"code", "content", "operation"}`; every request
//! maps to one [`Command`] and [`dispatch`] answers it against a [`Guard`].
//! Kernel requests are `{"domain": "..."}` and are answered with
//! `{"block": bool}`.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::domain::canonical_www;
use crate::error::{Error, Result};
use crate::guard::Guard;
use crate::policy::{Feature, Toggle};

/// Message codes.
pub mod codes {
    pub const AD_BLOCK: &str = "50";
    pub const ADULT_BLOCK: &str = "51";
    pub const ADD_DOMAIN: &str = "52";
    pub const REMOVE_DOMAIN: &str = "53";
    pub const DOMAIN_LIST: &str = "54";
    pub const INIT_SETTINGS: &str = "55";
    pub const ACK: &str = "99";
    pub const SUCCESS: &str = "100";
    pub const ERROR: &str = "101";
}

pub const INVALID_JSON_MSG: &str = "Invalid JSON format.";
pub const DOMAIN_BLOCKED_MSG: &str = "Domain has been successfully blocked.";
pub const DOMAIN_UNBLOCKED_MSG: &str = "Domain has been successfully unblocked.";
pub const DOMAIN_NOT_FOUND_MSG: &str = "Domain not found in block list.";

/// Client request envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    pub code: String,
    #[serde(default)]
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

/// Response envelope.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    pub code: String,
    pub content: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub operation: Option<String>,
}

impl Response {
    /// Successful response to `operation`.
    pub fn success(operation: &str, content: Value) -> Self {
        Self {
            code: codes::SUCCESS.to_string(),
            content,
            operation: Some(operation.to_string()),
        }
    }

    /// Error response. `operation` is `None` when the request was unreadable.
    pub fn error(operation: Option<&str>, message: impl Into<String>) -> Self {
        Self {
            code: codes::ERROR.to_string(),
            content: Value::String(message.into()),
            operation: operation.map(str::to_string),
        }
    }

    /// Response to a line that was not valid JSON.
    pub fn invalid_json() -> Self {
        Self::error(None, INVALID_JSON_MSG)
    }

    pub fn is_success(&self) -> bool {
        self.code == codes::SUCCESS
    }
}

/// A decoded client request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    SetFeature(Feature, Toggle),
    AddDomain(String),
    RemoveDomain(String),
    DomainList,
    InitSettings,
}

impl Command {
    /// Decode a request envelope.
    pub fn from_request(request: &Request) -> Result<Self> {
        match request.code.as_str() {
            codes::AD_BLOCK => Ok(Command::SetFeature(
                Feature::AdBlock,
                Toggle::parse(text_content(request)?)?,
            )),
            codes::ADULT_BLOCK => Ok(Command::SetFeature(
                Feature::AdultBlock,
                Toggle::parse(text_content(request)?)?,
            )),
            codes::ADD_DOMAIN => Ok(Command::AddDomain(text_content(request)?.to_string())),
            codes::REMOVE_DOMAIN => Ok(Command::RemoveDomain(text_content(request)?.to_string())),
            codes::DOMAIN_LIST => Ok(Command::DomainList),
            codes::INIT_SETTINGS => Ok(Command::InitSettings),
            other => Err(Error::InvalidSetting(format!("unknown code: {}", other))),
        }
    }

    /// The request code for this command.
    pub fn code(&self) -> &'static str {
        match self {
            Command::SetFeature(Feature::AdBlock, _) => codes::AD_BLOCK,
            Command::SetFeature(Feature::AdultBlock, _) => codes::ADULT_BLOCK,
            Command::AddDomain(_) => codes::ADD_DOMAIN,
            Command::RemoveDomain(_) => codes::REMOVE_DOMAIN,
            Command::DomainList => codes::DOMAIN_LIST,
            Command::InitSettings => codes::INIT_SETTINGS,
        }
    }

    /// Whether a successful run of this command changes the policy.
    pub fn is_mutation(&self) -> bool {
        matches!(
            self,
            Command::SetFeature(..) | Command::AddDomain(_) | Command::RemoveDomain(_)
        )
    }
}

fn text_content(request: &Request) -> Result<&str> {
    request
        .content
        .as_str()
        .ok_or_else(|| Error::InvalidSetting(format!("code {} expects string content", request.code)))
}

/// Execute a command against the guard's policy.
pub fn dispatch(guard: &Guard, command: &Command) -> Response {
    let code = command.code();
    let policy = guard.policy();

    match command {
        Command::SetFeature(feature, toggle) => {
            let state = policy.set_feature(*feature, *toggle);
            Response::success(
                code,
                json!({ "feature": feature.as_str(), "state": state.state, "last_updated": state.last_updated }),
            )
        }
        Command::AddDomain(domain) => match policy.block_domain(domain) {
            Ok(canonical) => Response::success(
                code,
                json!({ "domain": canonical, "message": DOMAIN_BLOCKED_MSG }),
            ),
            Err(e) => Response::error(Some(code), e.to_string()),
        },
        Command::RemoveDomain(domain) => match canonical_www(domain) {
            Ok(canonical) => match policy.unblock_domain(&canonical) {
                Ok(true) => Response::success(
                    code,
                    json!({ "domain": canonical, "message": DOMAIN_UNBLOCKED_MSG }),
                ),
                Ok(false) => Response::error(Some(code), DOMAIN_NOT_FOUND_MSG),
                Err(e) => Response::error(Some(code), e.to_string()),
            },
            Err(e) => Response::error(Some(code), e.to_string()),
        },
        Command::DomainList => {
            Response::success(code, json!({ "domains": policy.blocked_domains() }))
        }
        Command::InitSettings => {
            let snapshot = policy.snapshot();
            Response::success(
                code,
                json!({
                    "settings": {
                        "ad_block": snapshot.ad_block.state,
                        "adult_block": snapshot.adult_block.state,
                    },
                    "domains": snapshot.domains,
                }),
            )
        }
    }
}

/// Handle one client line. Returns the response and the command, if decoded.
pub fn handle_client_line(guard: &Guard, line: &str) -> (Response, Option<Command>) {
    let request: Request = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            log::debug!("Unreadable client request: {}", e);
            return (Response::invalid_json(), None);
        }
    };

    match Command::from_request(&request) {
        Ok(command) => (dispatch(guard, &command), Some(command)),
        Err(e) => (Response::error(Some(&request.code), e.to_string()), None),
    }
}

/// Kernel hook request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelRequest {
    pub domain: String,
}

/// Kernel hook response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KernelResponse {
    pub block: bool,
}

/// Handle one kernel line. Unreadable requests are allowed.
pub fn handle_kernel_line(guard: &Guard, line: &str) -> KernelResponse {
    match serde_json::from_str::<KernelRequest>(line) {
        Ok(request) => {
            let verdict = guard.check(&request.domain);
            if verdict.blocked {
                log::debug!("Blocked {}: {}", request.domain, verdict);
            }
            KernelResponse {
                block: verdict.blocked,
            }
        }
        Err(e) => {
            log::warn!("Unreadable kernel request: {}", e);
            KernelResponse { block: false }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::Classifier;
    use crate::policy::Policy;
    use std::sync::Arc;

    fn guard() -> Guard {
        let classifier = Arc::new(Classifier::default());
        classifier.refresh("||ads.com^\n");
        Guard::new(Arc::new(Policy::new()), classifier)
    }

    fn request(code: &str, content: &str) -> String {
        json!({ "code": code, "content": content, "operation": code }).to_string()
    }

    #[test]
    fn test_invalid_json() {
        let (response, command) = handle_client_line(&guard(), "{not json");
        assert!(command.is_none());
        assert_eq!(response, Response::invalid_json());
        assert_eq!(
            serde_json::to_string(&response).unwrap(),
            r#"{"code":"101","content":"Invalid JSON format."}"#
        );
    }

    #[test]
    fn test_unknown_code() {
        let (response, command) = handle_client_line(&guard(), &request("77", ""));
        assert!(command.is_none());
        assert_eq!(response.code, codes::ERROR);
        assert_eq!(response.operation.as_deref(), Some("77"));
    }

    #[test]
    fn test_toggle_ad_block() {
        let guard = guard();
        let (response, command) = handle_client_line(&guard, &request(codes::AD_BLOCK, "on"));

        assert!(response.is_success());
        assert_eq!(response.content["state"], "on");
        assert_eq!(command, Some(Command::SetFeature(Feature::AdBlock, Toggle::On)));
        assert!(guard.is_blocked("x.ads.com"));

        let (response, _) = handle_client_line(&guard, &request(codes::ADULT_BLOCK, "maybe"));
        assert_eq!(response.code, codes::ERROR);
    }

    #[test]
    fn test_add_and_remove_domain() {
        let guard = guard();

        let (response, _) = handle_client_line(&guard, &request(codes::ADD_DOMAIN, "example.com"));
        assert!(response.is_success());
        assert_eq!(response.content["domain"], "www.example.com");
        assert!(guard.is_blocked("example.com"));

        let (response, _) = handle_client_line(&guard, &request(codes::DOMAIN_LIST, ""));
        assert_eq!(response.content["domains"], json!(["www.example.com"]));

        let (response, _) =
            handle_client_line(&guard, &request(codes::REMOVE_DOMAIN, "https://Example.com/"));
        assert!(response.is_success());
        assert_eq!(response.content["domain"], "www.example.com");
        assert!(!guard.is_blocked("example.com"));

        let (response, _) =
            handle_client_line(&guard, &request(codes::REMOVE_DOMAIN, "example.com"));
        assert_eq!(response.code, codes::ERROR);
        assert_eq!(response.content, DOMAIN_NOT_FOUND_MSG);
    }

    #[test]
    fn test_init_settings() {
        let guard = guard();
        guard.policy().block_domain("a.com").unwrap();

        let line = json!({ "code": codes::INIT_SETTINGS }).to_string();
        let (response, command) = handle_client_line(&guard, &line);
        assert_eq!(command, Some(Command::InitSettings));
        assert!(!command.unwrap().is_mutation());
        assert_eq!(response.content["settings"]["ad_block"], "off");
        assert_eq!(response.content["domains"], json!(["www.a.com"]));
    }

    #[test]
    fn test_kernel_lines() {
        let guard = guard();
        guard.policy().block_domain("blocked.org").unwrap();

        assert!(handle_kernel_line(&guard, r#"{"domain":"www.blocked.org"}"#).block);
        assert!(!handle_kernel_line(&guard, r#"{"domain":"fine.org"}"#).block);
        assert!(!handle_kernel_line(&guard, "garbage").block);
        assert_eq!(
            serde_json::to_string(&KernelResponse { block: true }).unwrap(),
            r#"{"block":true}"#
        );
    }
}
