//! `newsfeed`: print New York Times Article Search results in fixed-size batches.

use std::process::ExitCode;
use std::time::Duration;

use anyhow::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use newsfeed_batches::{ArticleBatches, BatchOptions};
use newsfeed_common::{Article, Config};
use nytimes_client::{NytClient, NytConfig};

#[derive(Parser, Debug)]
#[command(name = "newsfeed")]
#[command(about = "Stream New York Times articles in fixed-size batches")]
#[command(version)]
struct Cli {
    /// Articles per batch
    #[arg(short, long, default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    batch_size: u64,

    /// Free-text search term
    #[arg(short, long)]
    query: Option<String>,

    /// Stop after printing this many batches
    #[arg(long)]
    max_batches: Option<usize>,

    /// Request at most this many pages (overrides NYT_MAX_PAGES)
    #[arg(long)]
    max_pages: Option<u32>,

    /// Print one JSON object per article instead of a summary line
    #[arg(long)]
    json: bool,
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive("newsfeed=info".parse()?)
                .add_directive("nytimes_client=info".parse()?),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    config.log_redacted();

    let client = NytClient::new(nyt_config(&config));
    let mut batches = ArticleBatches::new(client, batch_options(&cli, &config))?;

    let mut printed = 0;
    while cli.max_batches.map_or(true, |max| printed < max) {
        let Some(batch) = batches.next_batch().await else {
            break;
        };
        printed += 1;
        info!(batch = printed, size = batch.len(), "Received batch");
        for article in &batch {
            println!("{}", render(article, cli.json)?);
        }
    }

    let stats = batches.stats();
    info!(
        batches = stats.batches,
        articles = stats.articles,
        requests = stats.requests,
        skipped = stats.skipped_docs,
        "Done"
    );

    match batches.termination() {
        Some(termination) if !termination.is_clean() => {
            tracing::error!(%termination, "Article feed ended early");
            Ok(ExitCode::FAILURE)
        }
        _ => Ok(ExitCode::SUCCESS),
    }
}

fn nyt_config(config: &Config) -> NytConfig {
    NytConfig {
        api_key: config.nyt_api_key.clone(),
        base_url: config.nyt_base_url.clone(),
        article_search_api: config.article_search_api.clone(),
        article_search_endpoint: config.article_search_endpoint.clone(),
        timeout: Duration::from_secs(config.timeout_secs),
    }
}

fn batch_options(cli: &Cli, config: &Config) -> BatchOptions {
    BatchOptions::new(cli.batch_size as usize)
        .with_query(cli.query.as_deref())
        .with_max_pages(cli.max_pages.or(config.max_pages))
        .with_page_delay(Duration::from_millis(config.page_delay_ms))
        .with_rate_limit_retries(
            config.rate_limit_retries,
            Duration::from_secs(config.rate_limit_backoff_secs),
        )
}

fn render(article: &Article, json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string(article)?);
    }
    Ok(format!(
        " - {} - {}",
        article.id(),
        article.headline().unwrap_or("<no headline>")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> Config {
        Config::from_lookup(|key| match key {
            "NYT_API_KEY" => Some("k".to_string()),
            "NYT_MAX_PAGES" => Some("50".to_string()),
            "NYT_PAGE_DELAY_MS" => Some("12000".to_string()),
            "NYT_RATE_LIMIT_RETRIES" => Some("2".to_string()),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn cli_flags_override_config() {
        let cli = Cli::parse_from(["newsfeed", "-b", "5", "-q", "Silicon Valley", "--max-pages", "3"]);
        let options = batch_options(&cli, &config());

        assert_eq!(options.batch_size, 5);
        assert_eq!(options.query.as_deref(), Some("Silicon Valley"));
        assert_eq!(options.max_pages, Some(3));
        assert_eq!(options.page_delay, Duration::from_secs(12));
        assert_eq!(options.rate_limit_retries, 2);
        assert_eq!(options.rate_limit_backoff, Duration::from_secs(12));
    }

    #[test]
    fn config_max_pages_used_without_flag() {
        let cli = Cli::parse_from(["newsfeed"]);
        let options = batch_options(&cli, &config());

        assert_eq!(options.batch_size, 10);
        assert_eq!(options.query, None);
        assert_eq!(options.max_pages, Some(50));
    }

    #[test]
    fn zero_batch_size_is_rejected_by_parser() {
        assert!(Cli::try_parse_from(["newsfeed", "--batch-size", "0"]).is_err());
    }

    #[test]
    fn nyt_config_carries_endpoint_and_timeout() {
        let nyt = nyt_config(&config());
        assert_eq!(nyt.base_url, "https://api.nytimes.com/svc/");
        assert_eq!(nyt.article_search_endpoint, "articlesearch.json");
        assert_eq!(nyt.timeout, Duration::from_secs(30));
    }

    #[test]
    fn renders_summary_and_json_lines() {
        let article = Article::from_doc(serde_json::json!({
            "web_url": "https://www.nytimes.com/a.html",
            "_id": "nyt://article/1",
            "byline": {"original": "By A"},
            "pub_date": "2024-01-05T10:00:05+0000",
            "headline": {"main": "Main Headline"}
        }))
        .unwrap();

        assert_eq!(render(&article, false).unwrap(), " - nyt://article/1 - Main Headline");
        let line: serde_json::Value = serde_json::from_str(&render(&article, true).unwrap()).unwrap();
        assert_eq!(line["content"]["headline.main"], "Main Headline");
    }
}
