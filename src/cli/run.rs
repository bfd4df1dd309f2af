use std::time::Instant;
use tracing::{debug, info, warn};

use crate::cli::models::{ExtractionResult, Status};
use crate::cli::response::{self, Outcome, NO_URL_MESSAGE};
use crate::config::Config;
use crate::error::{AppError, Result};
use crate::extract::extract_document;
use crate::scraper::{build_client, fetch_html, rewrite_docker_host};

/// Full run: argument check, configuration from the environment, pipeline.
pub async fn run(url: Option<&str>) -> Outcome {
    let Some(url) = url else {
        return response::argument_error(NO_URL_MESSAGE);
    };

    match Config::load() {
        Ok(config) => run_with_config(url, &config).await,
        Err(err) => swallow(url, err),
    }
}

/// Runs the pipeline for `url` with an explicit configuration.
///
/// Every failure becomes `{}` with exit code 0; the detail only goes to the
/// log.
pub async fn run_with_config(url: &str, config: &Config) -> Outcome {
    let url = rewrite_docker_host(url);
    let start_time = Instant::now();

    let result = process_url(&url, config).await;
    debug!(url = %url, elapsed = ?start_time.elapsed(), "processing finished");

    match result {
        Ok(result) => {
            info!(url = %url, chars = result.document.text.len(), "extracted article");
            response::success(&result)
        }
        Err(err) => swallow(&url, err),
    }
}

/// Fetches `url`, extracts the article and tags the result.
pub async fn process_url(url: &str, config: &Config) -> Result<ExtractionResult> {
    let client = build_client(config)?;

    debug!(url = %url, timeout = ?config.request_timeout, "fetching page");
    let page = fetch_html(&client, url).await?;

    let document = extract_document(&page.html, &page.final_url, config)?;

    Ok(ExtractionResult {
        document,
        status: Status::Success,
        original_url: url.to_string(),
    })
}

fn swallow(url: &str, err: AppError) -> Outcome {
    warn!(url = %url, kind = err.kind(), error = %err, "returning empty result");
    response::empty()
}
