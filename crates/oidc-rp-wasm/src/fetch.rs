//! Fetch API [`JsonFetcher`].

use oidc_rp_core::{JsonFetcher, MaybeSend, OidcConfig, TransportError};
use serde_json::Value;
use std::future::Future;
use std::time::Duration;
use tracing::debug;
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use web_sys::{
    AbortController, AbortSignal, Headers, Request, RequestInit, RequestRedirect, Response,
};

/// HTTP GET + JSON through the global `fetch`.
///
/// Uses `globalThis` rather than `window`, so it also runs in workers and
/// edge runtimes. Redirects make the request fail.
#[derive(Debug, Clone)]
pub struct BrowserFetcher {
    timeout_ms: u32,
}

impl Default for BrowserFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(10))
    }
}

impl BrowserFetcher {
    /// Fetcher aborting requests after `timeout`
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout_ms: u32::try_from(timeout.as_millis()).unwrap_or(u32::MAX),
        }
    }

    /// Fetcher using the timeout of `config`
    pub fn from_config(config: &OidcConfig) -> Self {
        Self::new(config.request_timeout)
    }

    async fn fetch(&self, url: &str) -> Result<Value, TransportError> {
        let request_failed = |reason: String| TransportError::Request {
            url: url.to_string(),
            reason,
        };

        let global = js_sys::global();
        let fetch = js_sys::Reflect::get(&global, &"fetch".into())
            .ok()
            .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
            .ok_or_else(|| request_failed("fetch is not available in this scope".into()))?;

        let controller = AbortController::new()
            .map_err(|e| request_failed(format!("failed to create AbortController: {e:?}")))?;
        let signal = controller.signal();

        let headers =
            Headers::new().map_err(|e| request_failed(format!("failed to create headers: {e:?}")))?;
        headers
            .set("Accept", "application/json")
            .map_err(|e| request_failed(format!("failed to set Accept: {e:?}")))?;

        let init = RequestInit::new();
        init.set_method("GET");
        init.set_headers(&headers);
        init.set_redirect(RequestRedirect::Error);
        init.set_signal(Some(&signal));

        let request = Request::new_with_str_and_init(url, &init)
            .map_err(|e| request_failed(format!("failed to create request: {e:?}")))?;

        debug!(url, "GET");
        let timer = start_timer(&global, controller, self.timeout_ms);
        let text = exchange(url, &global, &fetch, &request, &signal).await;
        clear_timer(&global, timer);

        serde_json::from_str(&text?).map_err(|e| TransportError::InvalidBody {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }
}

/// Send `request` and read the body as text. The caller owns the timer.
async fn exchange(
    url: &str,
    global: &js_sys::Object,
    fetch: &js_sys::Function,
    request: &Request,
    signal: &AbortSignal,
) -> Result<String, TransportError> {
    let request_failed = |reason: String| TransportError::Request {
        url: url.to_string(),
        reason,
    };
    let aborted_or = |reason: String| {
        if signal.aborted() {
            TransportError::Timeout {
                url: url.to_string(),
            }
        } else {
            request_failed(reason)
        }
    };

    let promise = fetch
        .call1(global, request)
        .map_err(|e| request_failed(format!("{e:?}")))?
        .dyn_into::<js_sys::Promise>()
        .map_err(|_| request_failed("fetch did not return a promise".into()))?;

    let response: Response = JsFuture::from(promise)
        .await
        .map_err(|e| aborted_or(format!("{e:?}")))?
        .dyn_into()
        .map_err(|e| request_failed(format!("invalid response type: {e:?}")))?;

    if !response.ok() {
        return Err(TransportError::Status {
            url: url.to_string(),
            status: response.status(),
        });
    }

    JsFuture::from(
        response
            .text()
            .map_err(|e| request_failed(format!("failed to read response: {e:?}")))?,
    )
    .await
    .map_err(|e| aborted_or(format!("failed to read response: {e:?}")))?
    .as_string()
    .ok_or_else(|| TransportError::InvalidBody {
        url: url.to_string(),
        reason: "response body is not text".into(),
    })
}

/// Arm `setTimeout` to abort the request; returns the timer id if one was set
fn start_timer(global: &js_sys::Object, controller: AbortController, timeout_ms: u32) -> Option<JsValue> {
    let set_timeout = js_sys::Reflect::get(global, &"setTimeout".into())
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())?;
    let abort = Closure::once_into_js(move || controller.abort());
    set_timeout
        .call2(global, &abort, &JsValue::from(timeout_ms))
        .ok()
}

fn clear_timer(global: &js_sys::Object, timer: Option<JsValue>) {
    let Some(timer) = timer else {
        return;
    };
    if let Some(clear_timeout) = js_sys::Reflect::get(global, &"clearTimeout".into())
        .ok()
        .and_then(|f| f.dyn_into::<js_sys::Function>().ok())
    {
        let _ = clear_timeout.call1(global, &timer);
    }
}

impl JsonFetcher for BrowserFetcher {
    fn get_json(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<Value, TransportError>> + MaybeSend {
        self.fetch(url)
    }
}
