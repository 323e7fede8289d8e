//! AUR package listing scraper
//!
//! The AUR has no API that returns every package together with its version,
//! so the HTML search results are walked page by page, sorted by name. Pages
//! are fetched one at a time on purpose to keep the load on the AUR low.
//!
//! Page shape (abridged):
//! ```text
//! <div class="pkglist-stats"><p>95195 packages found. Page 1 of 381.</p></div>
//! <table class="results"><tbody>
//!   <tr><td><a href="/packages/yay">yay</a></td><td>12.3.5-1</td>...</tr>
//! </tbody></table>
//! ```

use async_trait::async_trait;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::version::error::RegistryError;
use crate::version::registries::http_client;
use crate::version::registry::PackageSource;
use crate::version::types::PackageVersions;

/// Called after each page with `(pages_done, pages_total)`
pub type ProgressFn = Box<dyn Fn(usize, usize) + Send + Sync>;

/// Extracts the page count and package rows from a listing page
pub struct ListingParser {
    /// Text of the first paragraph in `div.pkglist-stats`
    stats_re: Regex,
    /// Body of `table.results`
    tbody_re: Regex,
    row_re: Regex,
    cell_re: Regex,
    tag_re: Regex,
}

impl ListingParser {
    pub fn new() -> Self {
        Self {
            stats_re: Regex::new(
                r#"(?s)<div[^>]*class="[^"]*\bpkglist-stats\b[^"]*"[^>]*>.*?<p[^>]*>(.*?)</p>"#,
            )
            .unwrap(),
            tbody_re: Regex::new(
                r#"(?s)<table[^>]*class="[^"]*\bresults\b[^"]*"[^>]*>.*?<tbody[^>]*>(.*?)</tbody>"#,
            )
            .unwrap(),
            row_re: Regex::new(r"(?s)<tr[\s>].*?</tr>").unwrap(),
            cell_re: Regex::new(r"(?s)<td[^>]*>(.*?)</td>").unwrap(),
            tag_re: Regex::new(r"<[^>]*>").unwrap(),
        }
    }

    /// Total number of pages, read from the last word of the summary
    pub fn page_count(&self, html: &str) -> Result<usize, RegistryError> {
        let caps = self.stats_re.captures(html).ok_or_else(|| {
            RegistryError::InvalidResponse("listing has no package summary".to_string())
        })?;
        let summary = self.text(&caps[1]);

        let digits: String = summary
            .split_whitespace()
            .last()
            .unwrap_or_default()
            .chars()
            .filter(char::is_ascii_digit)
            .collect();

        digits.parse().map_err(|_| {
            RegistryError::InvalidResponse(format!("cannot read page count from {:?}", summary))
        })
    }

    /// `(name, version)` for every row of the results table
    pub fn rows(&self, html: &str) -> Result<Vec<(String, String)>, RegistryError> {
        let caps = self.tbody_re.captures(html).ok_or_else(|| {
            RegistryError::InvalidResponse("listing has no results table".to_string())
        })?;

        let rows = self
            .row_re
            .find_iter(&caps[1])
            .filter_map(|row| {
                let mut cells = self.cell_re.captures_iter(row.as_str());
                let name = self.text(&cells.next()?[1]);
                let version = self.text(&cells.next()?[1]);
                (!name.is_empty() && !version.is_empty()).then_some((name, version))
            })
            .collect();

        Ok(rows)
    }

    fn text(&self, fragment: &str) -> String {
        decode_entities(&self.tag_re.replace_all(fragment, ""))
            .trim()
            .to_string()
    }
}

impl Default for ListingParser {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_entities(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

/// Scrapes the AUR package listing
pub struct AurRegistry {
    client: reqwest::Client,
    base_url: String,
    per_page: usize,
    parser: ListingParser,
    progress: Option<ProgressFn>,
}

impl AurRegistry {
    /// Creates a registry for `base_url` requesting `per_page` packages per page
    pub fn new(base_url: &str, per_page: usize) -> Result<Self, RegistryError> {
        Ok(Self {
            client: http_client()?,
            base_url: base_url.trim_end_matches('/').to_string(),
            per_page: per_page.max(1),
            parser: ListingParser::new(),
            progress: None,
        })
    }

    /// Report progress after every page
    pub fn with_progress(mut self, progress: impl Fn(usize, usize) + Send + Sync + 'static) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    /// URL of the zero-based `page`, sorted by name ascending
    fn page_url(&self, page: usize) -> String {
        format!(
            "{}/packages/?O={}&C=0&SeB=nd&SB=n&SO=a&PP={}&do_Search=Go",
            self.base_url,
            page * self.per_page,
            self.per_page
        )
    }

    async fn fetch_page(&self, page: usize) -> Result<String, RegistryError> {
        let url = self.page_url(page);
        debug!("Fetching AUR listing page: {}", url);

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            warn!("AUR returned status {}: {}", status, url);
            return Err(RegistryError::InvalidResponse(format!(
                "Unexpected status {} for page {}",
                status, page
            )));
        }

        Ok(response.text().await?)
    }

    fn report(&self, done: usize, total: usize) {
        if let Some(progress) = &self.progress {
            progress(done, total);
        }
    }
}

#[async_trait]
impl PackageSource for AurRegistry {
    fn label(&self) -> &'static str {
        "AUR"
    }

    async fn fetch_package_versions(&self) -> Result<PackageVersions, RegistryError> {
        let first = self.fetch_page(0).await?;
        let total_pages = self.parser.page_count(&first)?.max(1);
        info!(
            "AUR listing has {} pages of {} packages",
            total_pages, self.per_page
        );

        let mut packages = PackageVersions::new();
        packages.extend(self.parser.rows(&first)?);
        self.report(1, total_pages);

        for page in 1..total_pages {
            let html = self.fetch_page(page).await?;
            packages.extend(self.parser.rows(&html)?);
            self.report(page + 1, total_pages);
        }

        info!("Scraped {} packages from the AUR", packages.len());
        Ok(packages)
    }
}
