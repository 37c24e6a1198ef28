//! Terminal reporting for smap commands.

use console::{Style, Term};
use smap_sitemap::{INDEX_FILE_NAME, SitemapConfig};

/// Writes command progress and results to stderr.
pub(crate) struct Output {
    term: Term,
    label: Style,
    done: Style,
    failed: Style,
    url: Style,
}

impl Output {
    #[must_use]
    pub(crate) fn new() -> Self {
        Self {
            term: Term::stderr(),
            label: Style::new().dim(),
            done: Style::new().green(),
            failed: Style::new().red(),
            url: Style::new().cyan().bold(),
        }
    }

    pub(crate) fn info(&self, msg: &str) {
        let _ = self.term.write_line(msg);
    }

    /// Print `label: value` with a dimmed label.
    pub(crate) fn field(&self, label: &str, value: impl std::fmt::Display) {
        let _ = self
            .term
            .write_line(&format!("{} {value}", self.label.apply_to(format!("{label}:"))));
    }

    /// Print the public URL of the sitemap index.
    pub(crate) fn index_url(&self, config: &SitemapConfig) {
        let url = config.file_url(INDEX_FILE_NAME);
        self.field("Sitemap index", self.url.apply_to(url));
    }

    /// Print a generation summary followed by the public URL of each file.
    pub(crate) fn generated(&self, config: &SitemapConfig, files: &[String]) {
        let _ = self
            .term
            .write_line(&self.done.apply_to(generated_summary(config, files)).to_string());
        for url in file_urls(config, files) {
            let _ = self.term.write_line(&format!("  {url}"));
        }
    }

    pub(crate) fn error(&self, msg: &str) {
        let _ = self.term.write_line(&self.failed.apply_to(msg).to_string());
    }
}

fn generated_summary(config: &SitemapConfig, files: &[String]) -> String {
    let pages = files.iter().filter(|name| *name != INDEX_FILE_NAME).count();
    let noun = if pages == 1 { "page" } else { "pages" };
    format!(
        "Generated {pages} sitemap {noun} in {}",
        config.cache_dir().display()
    )
}

fn file_urls(config: &SitemapConfig, files: &[String]) -> Vec<String> {
    files.iter().map(|name| config.file_url(name)).collect()
}
