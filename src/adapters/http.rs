//! HTTP client adapter.
//!
//! Implements [`HttpPort`] over the ESP-IDF HTTP client. HTTPS endpoints
//! validate against the built-in CA certificate bundle, which is why SNTP
//! must have synced before the first cloud call. Both operations are
//! blocking with bounded timeouts and run only on the delivery thread.
//!
//! The host build has no network stack: every call fails with
//! [`TransportError::ConnectFailed`], which exercises the unreachable
//! paths of the pipeline.

#[cfg(not(target_os = "espidf"))]
use crate::app::ports::{HttpPort, IngestRecord, TransportError};
use crate::config::SystemConfig;

pub struct HttpClient {
    probe_timeout_ms: u32,
    delivery_timeout_ms: u32,
}

impl HttpClient {
    pub fn new(config: &SystemConfig) -> Self {
        Self {
            probe_timeout_ms: config.probe_timeout_ms,
            delivery_timeout_ms: config.delivery_timeout_ms,
        }
    }
}

#[cfg(target_os = "espidf")]
mod espidf {
    use std::ffi::CString;

    use esp_idf_svc::sys::*;
    use log::{debug, warn};

    use super::HttpClient;
    use crate::app::ports::{HttpPort, IngestRecord, TransportError};

    /// Owned client handle with cleanup on every exit path.
    struct Request(esp_http_client_handle_t);

    impl Drop for Request {
        fn drop(&mut self) {
            // SAFETY: handle came from esp_http_client_init and is not
            // used after this drop.
            unsafe {
                esp_http_client_cleanup(self.0);
            }
        }
    }

    fn init_client(url: &CString, timeout_ms: u32, secure: bool) -> Result<Request, TransportError> {
        let mut cfg = esp_http_client_config_t {
            url: url.as_ptr(),
            timeout_ms: timeout_ms as i32,
            keep_alive_enable: true,
            ..Default::default()
        };
        if secure {
            cfg.transport_type = esp_http_client_transport_t_HTTP_TRANSPORT_OVER_SSL;
            cfg.crt_bundle_attach = Some(esp_crt_bundle_attach);
        }
        // SAFETY: cfg and the URL CString outlive the init call; the
        // returned handle is owned by Request.
        let handle = unsafe { esp_http_client_init(&cfg) };
        if handle.is_null() {
            warn!("http client init failed for {:?}", url);
            return Err(TransportError::ConnectFailed);
        }
        Ok(Request(handle))
    }

    fn perform(req: &Request) -> Result<u16, TransportError> {
        // SAFETY: handle is valid for the lifetime of req.
        let err = unsafe { esp_http_client_perform(req.0) };
        match err {
            ESP_OK => {
                let code = unsafe { esp_http_client_get_status_code(req.0) };
                u16::try_from(code).map_err(|_| TransportError::Io)
            }
            ESP_ERR_HTTP_CONNECT => Err(TransportError::ConnectFailed),
            ESP_ERR_HTTP_EAGAIN => Err(TransportError::Timeout),
            _ => {
                let errno = unsafe { esp_http_client_get_errno(req.0) };
                warn!("http perform failed: {} (errno={})", err, errno);
                Err(TransportError::Io)
            }
        }
    }

    impl HttpPort for HttpClient {
        fn health_probe(&mut self, base_url: &str) -> Result<u16, TransportError> {
            let secure = base_url.starts_with("https://");
            let url = CString::new(format!("{base_url}/health"))
                .map_err(|_| TransportError::Io)?;
            let req = init_client(&url, self.probe_timeout_ms, secure)?;
            let status = perform(&req)?;
            debug!("GET /health -> {status}");
            Ok(status)
        }

        fn post_reading(
            &mut self,
            base_url: &str,
            api_key: &str,
            record: &IngestRecord<'_>,
        ) -> Result<u16, TransportError> {
            let secure = base_url.starts_with("https://");
            let url = CString::new(format!("{base_url}/ingest"))
                .map_err(|_| TransportError::Io)?;
            let body = serde_json::to_string(record).map_err(|_| TransportError::Io)?;
            let content_type = c"Content-Type";
            let json = c"application/json";
            let api_key_hdr = c"X-API-Key";
            let api_key_val = CString::new(api_key).map_err(|_| TransportError::Io)?;

            let req = init_client(&url, self.delivery_timeout_ms, secure)?;
            // SAFETY: all CStrings outlive the perform call; the body
            // buffer is held until req drops.
            unsafe {
                esp_http_client_set_method(req.0, esp_http_client_method_t_HTTP_METHOD_POST);
                esp_http_client_set_header(req.0, content_type.as_ptr(), json.as_ptr());
                esp_http_client_set_header(req.0, api_key_hdr.as_ptr(), api_key_val.as_ptr());
                esp_http_client_set_post_field(
                    req.0,
                    body.as_ptr() as *const _,
                    body.len() as i32,
                );
            }
            let status = perform(&req)?;
            debug!("POST /ingest -> {status}");
            Ok(status)
        }
    }
}

#[cfg(not(target_os = "espidf"))]
impl HttpPort for HttpClient {
    fn health_probe(&mut self, base_url: &str) -> Result<u16, TransportError> {
        log::debug!(
            "http (sim): GET {base_url}/health (timeout {} ms) -> no network",
            self.probe_timeout_ms
        );
        Err(TransportError::ConnectFailed)
    }

    fn post_reading(
        &mut self,
        base_url: &str,
        _api_key: &str,
        record: &IngestRecord<'_>,
    ) -> Result<u16, TransportError> {
        log::debug!(
            "http (sim): POST {base_url}/ingest ts={} (timeout {} ms) -> no network",
            record.ts_ms,
            self.delivery_timeout_ms
        );
        Err(TransportError::ConnectFailed)
    }
}
