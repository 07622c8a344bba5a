//! Interactive result browser and select list printing.

use anyhow::{anyhow, Context, Result};
use once_cell::sync::Lazy;
use regex_lite::Regex;
use reqwest::{Client, Url};
use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use kat_core::{Config, PageFetcher, ResultRecord, SearchEngine, SelectList};

const TITLE_WIDTH: usize = 64;

static UNSAFE_FILE_CHARS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[^a-zA-Z0-9()_.\-]").expect("valid pattern"));

/// What the user answered at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Command {
    Quit,
    Next,
    Prev,
    /// 1-based row number.
    Download(usize),
}

fn parse_command(answer: &str, rows: usize, has_next: bool, has_prev: bool) -> Option<Command> {
    match answer.trim() {
        "q" => Some(Command::Quit),
        "n" if has_next => Some(Command::Next),
        "p" if has_prev => Some(Command::Prev),
        other => other
            .parse::<usize>()
            .ok()
            .filter(|n| (1..=rows).contains(n))
            .map(Command::Download),
    }
}

fn prompt(rows: usize, has_next: bool, has_prev: bool) -> String {
    let mut prompt = String::from("\n1");
    if rows > 1 {
        prompt.push_str(&format!("-{rows}"));
    }
    prompt.push_str(" to download");
    if has_next {
        prompt.push_str(", (n)ext");
    }
    if has_prev {
        prompt.push_str(", (p)rev");
    }
    prompt.push_str(", (q)uit: ");
    prompt
}

/// File name a torrent is saved under: spaces become dots and anything
/// outside `[a-zA-Z0-9()_.-]` is dropped.
pub fn torrent_file_name(title: &str) -> String {
    let dotted = title.replace(' ', ".");
    format!("{}.torrent", UNSAFE_FILE_CHARS.replace_all(&dotted, ""))
}

/// Absolute download URL for a row's link, without its query string.
pub fn download_url(site_root: &Url, href: &str) -> Result<Url> {
    let mut url = site_root
        .join(href)
        .with_context(|| format!("Invalid download link: {href}"))?;
    url.set_query(None);
    Ok(url)
}

fn format_row(index: usize, record: &ResultRecord) -> String {
    let title: String = record.title().chars().take(TITLE_WIDTH).collect();
    format!(
        "{:2}. {:<width$} {:>5} {:>5}",
        index + 1,
        title,
        record.count("seeds").unwrap_or(0),
        record.count("leeches").unwrap_or(0),
        width = TITLE_WIDTH
    )
}

/// Render select lists the way `--categories` and friends print them.
///
/// Grouped lists put a group's first value on the label line and indent
/// the rest under it.
pub fn format_select_lists(lists: &[(&str, SelectList)]) -> String {
    let mut lines = vec![String::new()];

    for (list_id, list) in lists {
        lines.push(capitalize(list_id));
        match list {
            SelectList::Flat(options) => {
                lines.push(String::new());
                let width = options.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
                for (label, value) in options {
                    lines.push(format!("{label:<width$} => {value}"));
                }
            }
            SelectList::Grouped(groups) => {
                let width = groups.iter().map(|(l, _)| l.len()).max().unwrap_or(0);
                for (label, values) in groups {
                    let mut values = values.iter();
                    lines.push(String::new());
                    lines.push(format!(
                        "{label:>width$} => {}",
                        values.next().map(String::as_str).unwrap_or_default()
                    ));
                    for value in values {
                        lines.push(format!("{}{value}", " ".repeat(width + 4)));
                    }
                }
            }
        }
        lines.push(String::new());
    }

    lines.join("\n")
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Pages through search results and downloads torrents on request.
pub struct App<F> {
    engine: SearchEngine<F>,
    client: Client,
    site_root: Url,
    output_dir: PathBuf,
    page: usize,
}

impl<F: PageFetcher> App<F> {
    pub fn new(engine: SearchEngine<F>, config: &Config) -> Result<Self> {
        let mut site_root = Url::parse(&config.site.base_url)
            .with_context(|| format!("Invalid site URL: {}", config.site.base_url))?;
        if !site_root.path().ends_with('/') {
            let path = format!("{}/", site_root.path());
            site_root.set_path(&path);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.site.timeout_secs as u64))
            .user_agent(config.site.user_agent.clone())
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            engine,
            client,
            site_root,
            output_dir: config.output.directory.clone(),
            page: 0,
        })
    }

    pub fn engine(&self) -> &SearchEngine<F> {
        &self.engine
    }

    /// Run the browse loop until the user quits, input ends, or a page has
    /// nothing to show.
    pub async fn run<R, W>(&mut self, input: &mut R, out: &mut W) -> Result<()>
    where
        R: AsyncBufRead + Unpin,
        W: Write,
    {
        loop {
            let rows = match self.engine.fetch(self.page).await {
                Some(records) => records.to_vec(),
                None => {
                    match self.engine.error() {
                        Some(failure) => writeln!(out, "\nError: {failure}")?,
                        None => writeln!(out, "\nNo results")?,
                    }
                    return Ok(());
                }
            };
            if let Some(advisory) = self.engine.advisory() {
                writeln!(out, "\n{advisory}")?;
            }

            let total = self.engine.total_pages().unwrap_or(self.page + 1);
            let has_next = self.page + 1 < total;
            let has_prev = self.page > 0;

            writeln!(
                out,
                "\n{:<72} S     L\n",
                format!("Page {} of {}", self.page + 1, total)
            )?;
            for (index, record) in rows.iter().enumerate() {
                writeln!(out, "{}", format_row(index, record))?;
            }

            let command = loop {
                write!(out, "{}", prompt(rows.len(), has_next, has_prev))?;
                out.flush()?;

                let mut answer = String::new();
                if input.read_line(&mut answer).await? == 0 {
                    break Command::Quit;
                }
                if let Some(command) = parse_command(&answer, rows.len(), has_next, has_prev) {
                    break command;
                }
            };

            match command {
                Command::Quit => return Ok(()),
                Command::Next => self.page += 1,
                Command::Prev => self.page -= 1,
                Command::Download(n) => {
                    let record = &rows[n - 1];
                    writeln!(out, "\nDownloading: {}", record.title())?;
                    match self.download(record).await {
                        Ok(path) => info!(path = %path.display(), "Saved torrent"),
                        Err(e) => writeln!(out, "{e:#}")?,
                    }
                }
            }
        }
    }

    async fn download(&self, record: &ResultRecord) -> Result<PathBuf> {
        let href = record
            .text("download")
            .ok_or_else(|| anyhow!("No download link for {}", record.title()))?;
        let url = download_url(&self.site_root, href)?;
        debug!(url = %url, "Downloading torrent");

        let body = self
            .client
            .get(url.clone())
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .with_context(|| format!("Failed to download {url}"))?
            .bytes()
            .await
            .with_context(|| format!("Failed to read {url}"))?;

        let path = self.output_path(record.title());
        tokio::fs::write(&path, &body)
            .await
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(path)
    }

    fn output_path(&self, title: &str) -> PathBuf {
        self.output_dir.join(torrent_file_name(title))
    }
}
