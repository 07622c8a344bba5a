//! Reads select lists off the advanced search form.

use once_cell::sync::Lazy;
use regex_lite::{escape, RegexBuilder};
use scraper::{ElementRef, Html, Selector};

use super::{SelectList, SelectListError};

fn selector(css: &str) -> Selector {
    Selector::parse(css).expect("valid selector")
}

static FORM_CELL: Lazy<Selector> = Lazy::new(|| selector("table.formtable td"));
static SELECT: Lazy<Selector> = Lazy::new(|| selector("select"));
static OPTGROUP: Lazy<Selector> = Lazy::new(|| selector("optgroup"));
static OPTION: Lazy<Selector> = Lazy::new(|| selector("option"));

fn value_of(option: ElementRef<'_>) -> Option<String> {
    option.value().attr("value").map(str::to_string)
}

/// Find the form row labelled `label` (case-insensitive) and read the
/// options of the select in the cell that follows it.
///
/// Grouped options (categories) come back as `Grouped`; everything else is
/// a flat label → value list.
pub fn parse_select_list(html: &str, label: &str) -> Result<SelectList, SelectListError> {
    let pattern = RegexBuilder::new(&escape(label))
        .case_insensitive(true)
        .build()
        .map_err(|_| SelectListError::FieldNotFound(label.to_string()))?;

    let document = Html::parse_document(html);
    let label_cell = document
        .select(&FORM_CELL)
        .find(|cell| pattern.is_match(&cell.text().collect::<String>()))
        .ok_or_else(|| SelectListError::FieldNotFound(label.to_string()))?;

    let select = label_cell
        .next_siblings()
        .filter_map(ElementRef::wrap)
        .next()
        .and_then(|cell| cell.select(&SELECT).next())
        .ok_or_else(|| SelectListError::FieldNotFound(label.to_string()))?;

    let groups: Vec<(String, Vec<String>)> = select
        .select(&OPTGROUP)
        .map(|group| {
            let name = group.value().attr("label").unwrap_or_default().to_string();
            let values = group.select(&OPTION).filter_map(value_of).collect();
            (name, values)
        })
        .collect();

    if !groups.is_empty() {
        return Ok(SelectList::Grouped(groups));
    }

    let options = select
        .select(&OPTION)
        .filter_map(|option| {
            let value = value_of(option)?;
            let text = option.text().collect::<String>().trim().to_string();
            Some((text, value))
        })
        .collect();
    Ok(SelectList::Flat(options))
}
