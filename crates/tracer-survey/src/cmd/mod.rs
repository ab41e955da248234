pub mod drafts;
pub mod pin;
pub mod report;
pub mod survey;

use std::future::Future;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use survey_runtime::HttpSurveyApi;

use crate::config::Config;

pub(crate) fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

pub(crate) fn http_api(config: &Config) -> Result<HttpSurveyApi> {
    let Some(base_url) = config.api.base_url.as_deref() else {
        bail!("no backend configured; set [api] base_url");
    };
    let api = HttpSurveyApi::new(base_url)?;
    Ok(match &config.api.token {
        Some(token) => api.with_token(token.as_str()),
        None => api,
    })
}

pub(crate) fn block_on<F: Future>(future: F) -> Result<F::Output> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    Ok(runtime.block_on(future))
}
