//! Extracts result rows and the page count from a results page.

use once_cell::sync::Lazy;
use scraper::{ElementRef, Html, Selector};

use super::{FetchedPage, ResultRecord};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static ROW: Lazy<Selector> = Lazy::new(|| selector("td.torrentnameCell"));
static TITLE: Lazy<Selector> = Lazy::new(|| selector("a.normalgrey"));
static MAGNET: Lazy<Selector> = Lazy::new(|| selector("a.imagnet"));
static DOWNLOAD: Lazy<Selector> = Lazy::new(|| selector("a.idownload"));
static PAGINATION: Lazy<Selector> = Lazy::new(|| selector("div.pages > a"));

fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

fn href_of(element: ElementRef<'_>) -> Option<String> {
    element.value().attr("href").map(str::to_string)
}

/// Leading digits of a cell, ignoring thousands separators. Empty cells count as 0.
fn parse_count(text: &str) -> u64 {
    let digits: String = text
        .trim()
        .chars()
        .filter(|c| *c != ',')
        .take_while(char::is_ascii_digit)
        .collect();
    digits.parse().unwrap_or(0)
}

fn parse_row(cell: ElementRef<'_>) -> ResultRecord {
    let mut record = ResultRecord::new();

    let title_link = cell.select(&TITLE).next();
    record.insert("title", title_link.map(text_of).unwrap_or_default());
    record.insert("path", title_link.and_then(href_of).unwrap_or_default());
    record.insert(
        "magnet",
        cell.select(&MAGNET)
            .next()
            .and_then(href_of)
            .unwrap_or_default(),
    );
    record.insert(
        "download",
        cell.select(&DOWNLOAD)
            .last()
            .and_then(href_of)
            .unwrap_or_default(),
    );

    // The remaining columns are the cells following the name cell.
    let mut cells = cell.next_siblings().filter_map(ElementRef::wrap);
    let mut next_text = || cells.next().map(text_of).unwrap_or_default();
    let size = next_text();
    let files = next_text();
    let age = next_text();
    let seeds = next_text();
    let leeches = next_text();

    record.insert("size", size);
    record.insert("files", parse_count(&files));
    record.insert("age", age);
    record.insert("seeds", parse_count(&seeds));
    record.insert("leeches", parse_count(&leeches));
    record
}

/// Parse a results page.
///
/// The page count is the label of the last pagination link; it is `None`
/// when the page has no pagination bar.
pub fn parse_results_page(html: &str) -> FetchedPage {
    let document = Html::parse_document(html);

    let records: Vec<ResultRecord> = document.select(&ROW).map(parse_row).collect();

    let total_pages = document
        .select(&PAGINATION)
        .last()
        .map(text_of)
        .and_then(|label| label.parse::<usize>().ok());

    FetchedPage {
        records,
        total_pages,
        redirected_to: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS_PAGE: &str = r#"
<html><body>
<table class="data">
  <tr class="firstr"><th>torrent name</th><th>size</th><th>files</th><th>age</th><th>seed</th><th>leech</th></tr>
  <tr class="odd">
    <td class="torrentnameCell">
      <div class="iaconbox">
        <a class="imagnet" href="magnet:?xt=urn:btih:AAA">magnet</a>
        <a class="idownload" href="//torcache.net/mirror">mirror</a>
        <a class="idownload" href="//torcache.net/torrent/AAA.torrent?title=ubuntu">download</a>
      </div>
      <a class="normalgrey font12px plain bold" href="/ubuntu-24-04-desktop-t100.html">Ubuntu 24.04 Desktop</a>
    </td>
    <td class="nobr center">5.7 <span>GB</span></td>
    <td class="center">1</td>
    <td class="center">2&nbsp;days</td>
    <td class="green center">1,234</td>
    <td class="red lasttd center">56</td>
  </tr>
  <tr class="even">
    <td class="torrentnameCell">
      <a class="imagnet" href="magnet:?xt=urn:btih:BBB">magnet</a>
      <a class="idownload" href="//torcache.net/torrent/BBB.torrent">download</a>
      <a class="normalgrey" href="/debian-12-t200.html">Debian 12</a>
    </td>
    <td>3.1 GB</td>
    <td>12</td>
    <td>1 week</td>
    <td>300</td>
    <td>7</td>
  </tr>
</table>
<div class="pages">
  <a href="/usearch/linux/2/">2</a>
  <a href="/usearch/linux/3/">3</a>
  <a href="/usearch/linux/17/">17</a>
</div>
</body></html>
"#;

    #[test]
    fn test_parse_rows() {
        let page = parse_results_page(RESULTS_PAGE);
        assert_eq!(page.records.len(), 2);

        let first = &page.records[0];
        assert_eq!(first.title(), "Ubuntu 24.04 Desktop");
        assert_eq!(first.text("path"), Some("/ubuntu-24-04-desktop-t100.html"));
        assert_eq!(first.text("magnet"), Some("magnet:?xt=urn:btih:AAA"));
        assert_eq!(
            first.text("download"),
            Some("//torcache.net/torrent/AAA.torrent?title=ubuntu")
        );
        assert_eq!(first.text("size"), Some("5.7 GB"));
        assert_eq!(first.count("files"), Some(1));
        assert_eq!(first.count("seeds"), Some(1234));
        assert_eq!(first.count("leeches"), Some(56));

        let second = &page.records[1];
        assert_eq!(second.title(), "Debian 12");
        assert_eq!(second.count("files"), Some(12));
        assert_eq!(second.text("age"), Some("1 week"));
    }

    #[test]
    fn test_total_pages_from_last_link() {
        let page = parse_results_page(RESULTS_PAGE);
        assert_eq!(page.total_pages, Some(17));
    }

    #[test]
    fn test_no_pagination_bar() {
        let html = r#"<table><tr><td class="torrentnameCell"><a class="normalgrey" href="/x">X</a></td><td>1 MB</td></tr></table>"#;
        let page = parse_results_page(html);
        assert_eq!(page.records.len(), 1);
        assert_eq!(page.total_pages, None);
        // Missing cells default to empty text and zero counts.
        assert_eq!(page.records[0].count("seeds"), Some(0));
        assert_eq!(page.records[0].text("magnet"), Some(""));
    }

    #[test]
    fn test_empty_page() {
        let page = parse_results_page("<html><body><p>nothing here</p></body></html>");
        assert!(page.records.is_empty());
        assert_eq!(page.total_pages, None);
    }

    #[test]
    fn test_parse_count() {
        assert_eq!(parse_count(" 42 "), 42);
        assert_eq!(parse_count("1,024"), 1024);
        assert_eq!(parse_count("n/a"), 0);
    }
}
