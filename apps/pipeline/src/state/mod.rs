// [apps/pipeline/src/state/mod.rs]
//! Shared state for the stage invocation server. Every stage is
//! stateless between invocations (§5): `AppState` holds only the
//! long-lived HTTP client and the URLs one stage uses to invoke the
//! next, never job or credential data.

use reqwest::Client;

#[derive(Clone)]
pub struct AppState {
    /// Client used for the gateway's background dispatch to the process
    /// stage, and for the process stage's synchronous call into finalize.
    /// Per-call timeouts are set on each request, not on the client.
    pub dispatch_client: Client,
    /// `PROCESS_FUNCTION_URL` (§6): where the gateway dispatches process.
    pub process_function_url: String,
    /// `FINALIZE_FUNCTION_URL` (§6): where process invokes finalize.
    pub finalize_function_url: String,
}

impl AppState {
    pub fn from_env() -> anyhow::Result<Self> {
        let process_function_url = std::env::var("PROCESS_FUNCTION_URL")
            .map_err(|_| anyhow::anyhow!("PROCESS_FUNCTION_URL is not set"))?;
        let finalize_function_url = std::env::var("FINALIZE_FUNCTION_URL")
            .map_err(|_| anyhow::anyhow!("FINALIZE_FUNCTION_URL is not set"))?;

        Ok(Self {
            dispatch_client: Client::new(),
            process_function_url,
            finalize_function_url,
        })
    }
}
