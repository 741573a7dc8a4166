use serde_json::json;

pub const EXIT_OK: i32 = 0;
pub const EXIT_CLIENT_ERROR: i32 = 1;
pub const EXIT_SERVER_ERROR: i32 = 2;
pub const EXIT_CONNECTION_ERROR: i32 = 3;
pub const EXIT_USAGE_ERROR: i32 = 4;

pub fn client() -> reqwest::Client {
    reqwest::Client::new()
}

/// Print a structured usage error to stderr and exit with code 4.
pub fn exit_error(message: &str, docs_hint: Option<&str>) -> ! {
    let mut err = json!({
        "error": "cli_error",
        "message": message
    });
    if let Some(hint) = docs_hint {
        err["docs_hint"] = json!(hint);
    }
    eprintln!("{}", to_pretty(&err));
    std::process::exit(EXIT_USAGE_ERROR);
}

pub fn exit_code_for_status(status: u16) -> i32 {
    match status {
        200..=299 => EXIT_OK,
        400..=499 => EXIT_CLIENT_ERROR,
        _ => EXIT_SERVER_ERROR,
    }
}

fn to_pretty(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn build_url(api_url: &str, path: &str) -> Result<reqwest::Url, String> {
    let base = api_url.trim_end_matches('/');
    reqwest::Url::parse(&format!("{base}{path}")).map_err(|e| format!("Invalid URL: {base}{path}: {e}"))
}

fn connection_error(err: &reqwest::Error) -> serde_json::Value {
    json!({
        "error": "connection_error",
        "message": format!("{err}"),
        "docs_hint": "Is the TrialGuard API running? Check --api-url or TRIALGUARD_API_URL."
    })
}

/// Execute an API request, print the response body, and return the exit code.
///
/// Exit codes: 0=success (2xx), 1=client error (4xx), 2=server error (5xx),
///             3=connection error, 4=usage error
pub async fn api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<serde_json::Value>,
    raw: bool,
) -> i32 {
    let url = match build_url(api_url, path) {
        Ok(u) => u,
        Err(message) => {
            eprintln!("{}", to_pretty(&json!({ "error": "cli_error", "message": message })));
            return EXIT_USAGE_ERROR;
        }
    };

    tracing::debug!(%method, %url, "sending request");
    let mut req = client().request(method, url);
    if let Some(b) = body {
        req = req.json(&b);
    }

    let resp = match req.send().await {
        Ok(r) => r,
        Err(e) => {
            eprintln!("{}", to_pretty(&connection_error(&e)));
            return EXIT_CONNECTION_ERROR;
        }
    };

    let status = resp.status().as_u16();
    let exit_code = exit_code_for_status(status);
    tracing::debug!(status, "received response");

    let resp_body: serde_json::Value = match resp.json().await {
        Ok(v) => v,
        Err(e) => json!({"raw_error": format!("Failed to parse response as JSON: {e}")}),
    };

    let formatted = if raw {
        resp_body.to_string()
    } else {
        to_pretty(&resp_body)
    };

    if exit_code == EXIT_OK {
        println!("{formatted}");
    } else {
        eprintln!("{formatted}");
    }

    exit_code
}

/// Failure of a request whose response the caller inspects itself.
#[derive(Debug)]
pub enum RequestFailure {
    Usage(String),
    Connection(serde_json::Value),
}

impl RequestFailure {
    /// Print the failure to stderr and return its exit code.
    pub fn report(self) -> i32 {
        match self {
            RequestFailure::Usage(message) => {
                eprintln!("{}", to_pretty(&json!({ "error": "cli_error", "message": message })));
                EXIT_USAGE_ERROR
            }
            RequestFailure::Connection(err) => {
                eprintln!("{}", to_pretty(&err));
                EXIT_CONNECTION_ERROR
            }
        }
    }
}

/// Execute an API request and return status and body without printing.
pub async fn raw_api_request(
    api_url: &str,
    method: reqwest::Method,
    path: &str,
    body: Option<&serde_json::Value>,
) -> Result<(u16, serde_json::Value), RequestFailure> {
    let url = build_url(api_url, path).map_err(RequestFailure::Usage)?;

    let mut req = client().request(method, url);
    if let Some(b) = body {
        req = req.json(b);
    }

    let resp = req
        .send()
        .await
        .map_err(|e| RequestFailure::Connection(connection_error(&e)))?;
    let status = resp.status().as_u16();
    let body: serde_json::Value = resp
        .json()
        .await
        .unwrap_or(json!({"error": "non-json response"}));

    Ok((status, body))
}

/// Read JSON from a file path or stdin (when path is "-").
pub fn read_json_from_file(path: &str) -> Result<serde_json::Value, String> {
    let raw = if path == "-" {
        std::io::read_to_string(std::io::stdin()).map_err(|e| format!("Failed to read stdin: {e}"))?
    } else {
        std::fs::read_to_string(path).map_err(|e| format!("Failed to read file '{path}': {e}"))?
    };
    serde_json::from_str(&raw).map_err(|e| format!("Invalid JSON in '{path}': {e}"))
}
