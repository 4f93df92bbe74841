//! Minimal W3C WebDriver client backing the [`ChartDriver`] seam.
//!
//! Speaks the wire protocol directly to a local geckodriver/chromedriver
//! process over blocking HTTP: create a session, navigate, look elements up
//! by CSS selector, read attributes and computed CSS, delete the session.
//! Only the calls the measurement needs are implemented.

use std::time::Duration;

use log::debug;
use reqwest::blocking::Client;
use serde_json::{Value, json};

use crate::source::{ChartDriver, DriverConnector, DriverError};

/// W3C element reference key in `find element` responses.
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

/// Per-request HTTP timeout against the driver process. Element lookups can
/// legitimately take the whole implicit wait, so this sits well above it.
const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

/// Connects to a WebDriver endpoint, opening one headless session per call.
pub struct WebDriverConnector {
    endpoint: String,
    implicit_wait: Duration,
}

impl WebDriverConnector {
    /// `endpoint` is the driver process base URL, e.g. `http://127.0.0.1:4444`.
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            implicit_wait: Duration::from_secs(3),
        }
    }

    /// Implicit wait applied to element lookups in each new session.
    pub fn with_implicit_wait(mut self, wait: Duration) -> Self {
        self.implicit_wait = wait;
        self
    }
}

impl DriverConnector for WebDriverConnector {
    fn connect(&self) -> Result<Box<dyn ChartDriver>, DriverError> {
        let client = Client::builder().timeout(HTTP_TIMEOUT).build()?;

        // Headless flags for both mainstream drivers; each ignores the
        // other's vendor-prefixed options.
        let caps = json!({
            "capabilities": {
                "alwaysMatch": {
                    "moz:firefoxOptions": { "args": ["-headless"] },
                    "goog:chromeOptions": { "args": ["--headless=new"] }
                }
            }
        });
        let resp = client
            .post(format!("{}/session", self.endpoint))
            .json(&caps)
            .send()?;
        let status = resp.status();
        let body: Value = resp.json()?;
        if !status.is_success() {
            return Err(protocol_error(&body));
        }
        let session_id = session_id_from(&body)?;
        debug!("webdriver session {session_id} opened");

        let session = WebDriverSession {
            client,
            base: format!("{}/session/{}", self.endpoint, session_id),
        };
        session.post(
            "timeouts",
            &json!({ "implicit": self.implicit_wait.as_millis() as u64 }),
        )?;
        Ok(Box::new(session))
    }
}

/// One live WebDriver session.
struct WebDriverSession {
    client: Client,
    base: String,
}

impl WebDriverSession {
    fn post(&self, path: &str, body: &Value) -> Result<Value, DriverError> {
        let resp = self
            .client
            .post(format!("{}/{}", self.base, path))
            .json(body)
            .send()?;
        unwrap_response(resp)
    }

    fn get(&self, path: &str) -> Result<Value, DriverError> {
        let resp = self.client.get(format!("{}/{}", self.base, path)).send()?;
        unwrap_response(resp)
    }

    /// Find one element by CSS selector, returning its opaque element ref.
    fn find_element(&self, selector: &str) -> Result<String, DriverError> {
        let body = self.post(
            "element",
            &json!({ "using": "css selector", "value": selector }),
        )?;
        element_ref_from(&body).ok_or_else(|| DriverError::ElementNotFound(selector.to_string()))
    }

    /// Find all elements with the given tag name, in document order.
    fn find_all_by_tag(&self, tag: &str) -> Result<Vec<String>, DriverError> {
        let body = self.post("elements", &json!({ "using": "tag name", "value": tag }))?;
        match body.get("value").and_then(Value::as_array) {
            Some(items) => Ok(items.iter().filter_map(element_ref_from_entry).collect()),
            None => Err(DriverError::MissingValue(body.to_string())),
        }
    }

    fn element_attribute(&self, element_ref: &str, name: &str) -> Result<Value, DriverError> {
        self.get(&format!("element/{element_ref}/attribute/{name}"))
    }
}

impl ChartDriver for WebDriverSession {
    fn navigate(&mut self, url: &str) -> Result<(), DriverError> {
        self.post("url", &json!({ "url": url }))?;
        Ok(())
    }

    fn attribute(&mut self, element_id: &str, name: &str) -> Result<String, DriverError> {
        let element_ref = self.find_element(&format!("[id='{element_id}']"))?;
        let body = self.element_attribute(&element_ref, name)?;
        string_value_from(&body)
            .ok_or_else(|| DriverError::MissingValue(format!("attribute {name} of #{element_id}")))
    }

    fn css_property(&mut self, element_id: &str, name: &str) -> Result<String, DriverError> {
        let element_ref = self.find_element(&format!("[id='{element_id}']"))?;
        let body = self.get(&format!("element/{element_ref}/css/{name}"))?;
        string_value_from(&body).ok_or_else(|| {
            DriverError::MissingValue(format!("css property {name} of #{element_id}"))
        })
    }

    fn last_element_id(&mut self, tag: &str) -> Result<String, DriverError> {
        let refs = self.find_all_by_tag(tag)?;
        let last = refs
            .last()
            .ok_or_else(|| DriverError::ElementNotFound(format!("<{tag}>")))?;
        let body = self.element_attribute(last, "id")?;
        match string_value_from(&body) {
            Some(id) if !id.is_empty() => Ok(id),
            _ => Err(DriverError::ElementNotFound(format!(
                "last <{tag}> carries no id"
            ))),
        }
    }

    fn close(self: Box<Self>) -> Result<(), DriverError> {
        let resp = self.client.delete(&self.base).send()?;
        unwrap_response(resp)?;
        debug!("webdriver session closed");
        Ok(())
    }
}

/// Decode a driver response, turning W3C error payloads into [`DriverError`].
fn unwrap_response(resp: reqwest::blocking::Response) -> Result<Value, DriverError> {
    let status = resp.status();
    let body: Value = resp.json()?;
    if status.is_success() {
        Ok(body)
    } else {
        Err(protocol_error(&body))
    }
}

/// Map a W3C error body (`{"value": {"error": ..., "message": ...}}`).
fn protocol_error(body: &Value) -> DriverError {
    let value = body.get("value");
    let code = value
        .and_then(|v| v.get("error"))
        .and_then(Value::as_str)
        .unwrap_or("unknown error");
    let message = value
        .and_then(|v| v.get("message"))
        .and_then(Value::as_str)
        .unwrap_or("");
    match code {
        "no such element" | "stale element reference" => {
            DriverError::ElementNotFound(message.to_string())
        }
        "invalid session id" | "session not created" => {
            DriverError::Session(format!("{code}: {message}"))
        }
        _ => DriverError::Protocol(format!("{code}: {message}")),
    }
}

fn session_id_from(body: &Value) -> Result<String, DriverError> {
    body.get("value")
        .and_then(|v| v.get("sessionId"))
        .and_then(Value::as_str)
        .map(str::to_string)
        .ok_or_else(|| DriverError::Session(format!("no sessionId in response: {body}")))
}

fn element_ref_from(body: &Value) -> Option<String> {
    body.get("value").and_then(element_ref_from_entry)
}

fn element_ref_from_entry(entry: &Value) -> Option<String> {
    entry.get(ELEMENT_KEY).and_then(Value::as_str).map(str::to_string)
}

fn string_value_from(body: &Value) -> Option<String> {
    body.get("value").and_then(Value::as_str).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_id_is_extracted() {
        let body = json!({ "value": { "sessionId": "abc123", "capabilities": {} } });
        assert_eq!(session_id_from(&body).unwrap(), "abc123");
    }

    #[test]
    fn missing_session_id_errors() {
        let body = json!({ "value": {} });
        assert!(matches!(
            session_id_from(&body),
            Err(DriverError::Session(_))
        ));
    }

    #[test]
    fn element_ref_is_extracted() {
        let body = json!({ "value": { "element-6066-11e4-a52e-4f735466cecf": "el-42" } });
        assert_eq!(element_ref_from(&body).unwrap(), "el-42");
    }

    #[test]
    fn element_list_entries_are_extracted() {
        let entries = json!([
            { "element-6066-11e4-a52e-4f735466cecf": "el-1" },
            { "element-6066-11e4-a52e-4f735466cecf": "el-2" },
        ]);
        let refs: Vec<String> = entries
            .as_array()
            .unwrap()
            .iter()
            .filter_map(element_ref_from_entry)
            .collect();
        assert_eq!(refs, vec!["el-1", "el-2"]);
    }

    #[test]
    fn no_such_element_maps_to_element_not_found() {
        let body = json!({ "value": { "error": "no such element", "message": "nope" } });
        assert!(matches!(
            protocol_error(&body),
            DriverError::ElementNotFound(_)
        ));
    }

    #[test]
    fn invalid_session_maps_to_session_error() {
        let body = json!({ "value": { "error": "invalid session id", "message": "gone" } });
        assert!(matches!(protocol_error(&body), DriverError::Session(_)));
    }

    #[test]
    fn unknown_code_maps_to_protocol_error() {
        let body = json!({ "value": { "error": "javascript error", "message": "boom" } });
        assert!(matches!(protocol_error(&body), DriverError::Protocol(_)));
    }

    #[test]
    fn null_attribute_value_is_none() {
        let body = json!({ "value": null });
        assert_eq!(string_value_from(&body), None);
    }

    #[test]
    fn string_value_is_extracted() {
        let body = json!({ "value": "561.25px" });
        assert_eq!(string_value_from(&body).unwrap(), "561.25px");
    }

    #[test]
    fn connector_normalizes_trailing_slash() {
        let connector = WebDriverConnector::new("http://127.0.0.1:4444/");
        assert_eq!(connector.endpoint, "http://127.0.0.1:4444");
    }
}
