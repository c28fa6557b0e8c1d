//! Unified logging module for SwapTrack services
//!
//! Console + daily rolling file output with a separate access log for the
//! `api_access` target.

use std::fs::{self, File, OpenOptions};
#[allow(unused_imports)] // Used in Write trait impl for DailyRollingWriter
use std::io::Write;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    filter,
    fmt::{
        self,
        format::Writer,
        FmtContext, FormatEvent, FormatFields,
    },
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
    EnvFilter, Layer,
};

/// Custom format for log level with brackets: `[INFO]`, `[WARN]`, etc.
fn format_level(level: &Level) -> &'static str {
    match *level {
        Level::TRACE => "[TRACE]",
        Level::DEBUG => "[DEBUG]",
        Level::INFO => "[INFO]",
        Level::WARN => "[WARN]",
        Level::ERROR => "[ERROR]",
    }
}

/// Custom event formatter that outputs: `timestamp [LEVEL] message`
///
/// Example output: `2025-12-02T00:50:44.809Z [INFO] Service started`
struct BracketedLevelFormat;

impl<S, N> FormatEvent<S, N> for BracketedLevelFormat
where
    S: tracing::Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &tracing::Event<'_>,
    ) -> std::fmt::Result {
        // Format timestamp
        let now = chrono::Utc::now();
        write!(writer, "{} ", now.format("%Y-%m-%dT%H:%M:%S%.6fZ"))?;

        // Format level with brackets and color
        let level = *event.metadata().level();
        if writer.has_ansi_escapes() {
            let color = match level {
                Level::TRACE => "\x1b[35m", // magenta
                Level::DEBUG => "\x1b[34m", // blue
                Level::INFO => "\x1b[32m",  // green
                Level::WARN => "\x1b[33m",  // yellow
                Level::ERROR => "\x1b[31m", // red
            };
            write!(writer, "{}{}\x1b[0m ", color, format_level(&level))?;
        } else {
            write!(writer, "{} ", format_level(&level))?;
        }

        // Format the event message and fields
        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}

// Global guards keeping the non-blocking writers alive for the process lifetime
static GUARDS: OnceLock<Arc<Mutex<Vec<WorkerGuard>>>> = OnceLock::new();

// Log root directory, set once during bootstrap
static LOG_ROOT: OnceLock<PathBuf> = OnceLock::new();

/// Initialize the log root directory
///
/// Priority: explicit config dir, then SWAPTRACK_LOG_DIR, then "logs"
/// (or a temp directory when running under the test harness).
pub fn init_log_root(config_dir: Option<&str>) {
    let root = match config_dir {
        Some(dir) if !dir.is_empty() => PathBuf::from(dir),
        _ => std::env::var("SWAPTRACK_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                if is_test_environment() {
                    std::env::temp_dir().join("swaptrack-test-logs")
                } else {
                    PathBuf::from("logs")
                }
            }),
    };
    let _ = LOG_ROOT.set(root);
}

/// Get the configured log root (falls back to the same resolution as init)
pub fn get_log_root() -> PathBuf {
    LOG_ROOT.get().cloned().unwrap_or_else(|| {
        std::env::var("SWAPTRACK_LOG_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| {
                if is_test_environment() {
                    std::env::temp_dir().join("swaptrack-test-logs")
                } else {
                    PathBuf::from("logs")
                }
            })
    })
}

/// Detect if we're running in a test environment
fn is_test_environment() -> bool {
    // CARGO_TARGET_TMPDIR is set by cargo during test runs
    if std::env::var("CARGO_TARGET_TMPDIR").is_ok() {
        return true;
    }

    // Test binaries live under target/{debug,release}/deps
    if let Ok(exe) = std::env::current_exe() {
        if let Some(path_str) = exe.to_str() {
            if path_str.contains("target/debug/deps") || path_str.contains("target/release/deps") {
                return true;
            }
        }
    }

    false
}

// Daily rolling file writer with naming format: {YYYYMMDD}_{service}.log
// An optional tag produces sibling files such as {YYYYMMDD}_{service}_api.log
struct DailyRollingWriter {
    service_name: String,
    file_tag: Option<&'static str>,
    log_dir: PathBuf,
    current_date: String,
    current_file: File,
}

impl DailyRollingWriter {
    fn new(
        service_name: String,
        log_dir: PathBuf,
        file_tag: Option<&'static str>,
    ) -> std::io::Result<Self> {
        let current_date = chrono::Local::now().format("%Y%m%d").to_string();

        fs::create_dir_all(&log_dir)?;

        let file_path = log_dir.join(Self::file_name(&current_date, &service_name, file_tag));
        let current_file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&file_path)?;

        Ok(Self {
            service_name,
            file_tag,
            log_dir,
            current_date,
            current_file,
        })
    }

    fn file_name(date: &str, service: &str, tag: Option<&str>) -> String {
        match tag {
            Some(tag) => format!("{}_{}_{}.log", date, service, tag),
            None => format!("{}_{}.log", date, service),
        }
    }

    fn roll_if_needed(&mut self) -> std::io::Result<()> {
        let today = chrono::Local::now().format("%Y%m%d").to_string();
        let current_path = self.log_dir.join(Self::file_name(
            &self.current_date,
            &self.service_name,
            self.file_tag,
        ));

        // Reopen on date change OR if the file was deleted out from under us
        if self.current_date != today || !current_path.exists() {
            let new_path =
                self.log_dir
                    .join(Self::file_name(&today, &self.service_name, self.file_tag));

            // The directory may have been deleted as well
            fs::create_dir_all(&self.log_dir)?;

            self.current_file = OpenOptions::new().create(true).append(true).open(&new_path)?;
            self.current_date = today;
        }

        Ok(())
    }
}

impl std::io::Write for DailyRollingWriter {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.roll_if_needed()?;
        self.current_file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.roll_if_needed()?;
        self.current_file.flush()
    }
}

/// Logger configuration
#[derive(Debug, Clone)]
pub struct LogConfig {
    /// Service name (e.g., "sitesrv")
    pub service_name: String,
    /// Base directory for logs
    pub log_dir: PathBuf,
    /// Console log level
    pub console_level: Level,
    /// File log level
    pub file_level: Level,
    /// Enable JSON format for structured logging
    pub enable_json: bool,
    /// Enable API log separation (default: true)
    pub enable_api_log: bool,
    /// API log level (default: INFO)
    pub api_log_level: Level,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            service_name: "unknown".to_string(),
            log_dir: get_log_root(),
            console_level: Level::INFO,
            file_level: Level::DEBUG,
            enable_json: false,
            enable_api_log: true,
            api_log_level: Level::INFO,
        }
    }
}

/// Initialize logging system with configuration
pub fn init_with_config(config: LogConfig) -> Result<(), Box<dyn std::error::Error>> {
    // Create log directory if it doesn't exist
    fs::create_dir_all(&config.log_dir)?;

    let business_writer =
        DailyRollingWriter::new(config.service_name.clone(), config.log_dir.clone(), None)?;
    let (non_blocking, guard) = tracing_appender::non_blocking(business_writer);

    // Store guard to prevent dropping
    let guards = GUARDS.get_or_init(|| Arc::new(Mutex::new(Vec::new())));
    match guards.lock() {
        Ok(mut guards) => guards.push(guard),
        Err(poisoned) => {
            // Lock was poisoned, but we can recover by using the data anyway
            eprintln!("Warning: GUARDS lock was poisoned, recovering...");
            poisoned.into_inner().push(guard);
        },
    }

    // Build the top-level filter
    // IMPORTANT: Respect RUST_LOG environment variable, only add api_access if not specified
    let api_level = if config.enable_api_log {
        config.api_log_level.as_str()
    } else {
        "off"
    };

    let env_filter = if let Ok(env_str) = std::env::var("RUST_LOG") {
        // RUST_LOG is set - only append api_access if not already specified
        if env_str.contains("api_access") {
            EnvFilter::new(env_str)
        } else {
            // If RUST_LOG asks for debug or trace, upgrade api_access for full visibility
            let effective_api_level = if env_str.contains("debug") || env_str.contains("trace") {
                "debug"
            } else {
                api_level
            };
            EnvFilter::new(format!("{},api_access={}", env_str, effective_api_level))
        }
    } else {
        // RUST_LOG not set - use default with api_access
        EnvFilter::new(format!(
            "info,{}=debug,api_access={}",
            config.service_name, api_level
        ))
    };

    let registry = tracing_subscriber::registry().with(env_filter);

    // Console layer
    // Custom format: 2025-12-02T00:50:44.809Z [INFO] message
    let console_layer = fmt::layer()
        .with_ansi(true)
        .event_format(BracketedLevelFormat)
        .with_filter(filter::LevelFilter::from_level(config.console_level))
        .boxed();

    // Business file layer (excludes api_access target)
    let file_level = config.file_level;
    let business_file_layer = if config.enable_json {
        fmt::layer()
            .json()
            .with_writer(non_blocking)
            .with_level(true)
            .with_target(true)
            .with_filter(filter::filter_fn(move |metadata| {
                metadata.target() != "api_access" && *metadata.level() <= file_level
            }))
            .boxed()
    } else {
        // Simplified format: no module paths, no thread IDs
        fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .event_format(BracketedLevelFormat)
            .with_filter(filter::filter_fn(move |metadata| {
                metadata.target() != "api_access" && *metadata.level() <= file_level
            }))
            .boxed()
    };

    // API file layer (only api_access target) - created if enable_api_log is true
    let api_file_layer = if config.enable_api_log {
        let api_writer = DailyRollingWriter::new(
            config.service_name.clone(),
            config.log_dir.clone(),
            Some("api"),
        )?;
        let (api_non_blocking, api_guard) = tracing_appender::non_blocking(api_writer);

        match guards.lock() {
            Ok(mut guards) => guards.push(api_guard),
            Err(poisoned) => {
                eprintln!("Warning: GUARDS lock was poisoned, recovering...");
                poisoned.into_inner().push(api_guard);
            },
        }

        Some(
            fmt::layer()
                .with_writer(api_non_blocking)
                .with_ansi(false)
                .event_format(BracketedLevelFormat)
                .with_filter(filter::filter_fn(|metadata| {
                    metadata.target() == "api_access"
                }))
                .boxed(),
        )
    } else {
        None
    };

    // Register all layers
    // Note: Using .with(Option<Layer>) which acts as identity when None
    registry
        .with(console_layer)
        .with(business_file_layer)
        .with(api_file_layer)
        .init();

    tracing::info!("Logging: {} @ {:?}", config.service_name, config.log_dir);

    if config.enable_api_log {
        let current_date = chrono::Local::now().format("%Y%m%d");
        tracing::debug!("API log: {}_{}_api.log", current_date, config.service_name);
    }

    Ok(())
}

// ============================================================================
// HTTP API Request Logging Middleware
// ============================================================================

/// Redact sensitive fields in JSON string
///
/// Recursively searches for sensitive field names and replaces their values
/// with "***REDACTED***". Handles nested objects and arrays.
#[allow(clippy::disallowed_methods)] // json! macro internally uses unwrap (compile-time safe, never panics)
fn redact_sensitive_fields(json_str: &str) -> String {
    use serde_json::{json, Value};

    const SENSITIVE_KEYS: &[&str] = &["password", "token", "api_key", "secret", "authorization"];

    // Try to parse as JSON
    let Ok(mut value) = serde_json::from_str::<Value>(json_str) else {
        // If not valid JSON, return as-is
        return json_str.to_string();
    };

    fn redact_recursive(value: &mut Value) {
        match value {
            Value::Object(map) => {
                for (key, val) in map.iter_mut() {
                    let key_lower = key.to_lowercase();
                    if SENSITIVE_KEYS.iter().any(|&k| key_lower.contains(k)) {
                        *val = json!("***REDACTED***");
                    } else {
                        redact_recursive(val);
                    }
                }
            },
            Value::Array(arr) => {
                for item in arr.iter_mut() {
                    redact_recursive(item);
                }
            },
            _ => {},
        }
    }

    redact_recursive(&mut value);

    serde_json::to_string(&value).unwrap_or_else(|_| json_str.to_string())
}

/// Truncate body string to maximum length
fn truncate_body(body: &str, max_length: usize) -> String {
    if body.len() <= max_length {
        body.to_string()
    } else {
        let truncated_bytes = body.len() - max_length;
        format!(
            "{}[truncated {} bytes]",
            &body[..max_length],
            truncated_bytes
        )
    }
}

/// HTTP API request logger middleware
///
/// Provides selective HTTP request logging with request body recording:
/// - **INFO level**: Logs only POST/PUT/PATCH/DELETE requests (no body)
/// - **DEBUG level**: Logs all requests with body content (truncated & redacted)
///
/// Logs are routed to the dedicated API log file via the "api_access" target.
/// Multipart uploads are never buffered here; only JSON bodies are recorded.
///
/// Add this middleware to your Axum router **before** `.with_state()`:
/// ```rust,ignore
/// use axum::{Router, middleware};
/// use common::logging::http_request_logger;
///
/// let app = Router::new()
///     // ... routes ...
///     .layer(middleware::from_fn(http_request_logger))
///     .with_state(state);
/// ```
#[cfg(feature = "axum")]
pub async fn http_request_logger(
    req: axum::extract::Request,
    next: axum::middleware::Next,
) -> axum::response::Response {
    use axum::body::Body;
    use std::time::Instant;
    use tracing::{debug, info, level_enabled, Level};

    const MAX_BODY_LENGTH: usize = 500;

    let method = req.method().clone();
    let uri = req.uri().clone();
    let content_type = req
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");
    let start = Instant::now();

    // Only read body at DEBUG level and for modifying methods (POST/PUT/PATCH/DELETE)
    let should_read_body = level_enabled!(Level::DEBUG)
        && matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE")
        && content_type.contains("application/json");

    let (req, body_str) = if should_read_body {
        // Read body bytes
        let (parts, body) = req.into_parts();
        let bytes = match axum::body::to_bytes(body, usize::MAX).await {
            Ok(b) => b,
            Err(e) => {
                tracing::warn!("Failed to read request body: {}", e);
                // Reconstruct request with empty body and continue
                let new_req = axum::extract::Request::from_parts(parts, Body::empty());
                return next.run(new_req).await;
            },
        };

        // Convert to string
        let body_str = match std::str::from_utf8(&bytes) {
            Ok(s) => {
                // Apply redaction and truncation
                let redacted = redact_sensitive_fields(s);
                truncate_body(&redacted, MAX_BODY_LENGTH)
            },
            Err(_) => "<binary data>".to_string(),
        };

        // Reconstruct request with original bytes
        let new_req = axum::extract::Request::from_parts(parts, Body::from(bytes));
        (new_req, body_str)
    } else {
        // Don't read body, use placeholder
        (req, "-".to_string())
    };

    // Execute the request
    let response = next.run(req).await;

    let duration = start.elapsed();
    let status = response.status();

    // INFO level: modifying methods only, without body
    // DEBUG level: all requests, with body when one was read
    if matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE") {
        info!(
            target: "api_access",
            method = %method,
            path = %uri.path(),
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "HTTP request"
        );
    }

    if body_str != "-" {
        debug!(
            target: "api_access",
            method = %method,
            path = %uri.path(),
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            request_body = %body_str,
            "HTTP request (detailed)"
        );
    } else if !matches!(method.as_str(), "POST" | "PUT" | "PATCH" | "DELETE") {
        // For GET requests, only log at DEBUG level
        debug!(
            target: "api_access",
            method = %method,
            path = %uri.path(),
            status = %status.as_u16(),
            duration_ms = %duration.as_millis(),
            "HTTP request"
        );
    }

    response
}
