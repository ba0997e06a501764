// src/ports/listing.rs
use serde::Serialize;
use tracing::instrument;

use crate::domain::{CategoryTree, Filter, FilterSummary, Page};
use crate::util::text::first_line;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            Self::Json
        } else {
            Self::Text
        }
    }
}

/// Renders listings for the terminal, as aligned text or as JSON.
#[derive(Debug)]
pub struct ListingPresenter {
    format: OutputFormat,
}

impl ListingPresenter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    fn json<T: Serialize + ?Sized>(value: &T) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(value)
    }

    #[instrument(level = "trace", skip_all, fields(items = page.items.len()))]
    pub fn render_page(&self, page: &Page<FilterSummary>) -> Result<String, serde_json::Error> {
        if self.format == OutputFormat::Json {
            return Self::json(page);
        }

        let mut out = Self::summary_lines(&page.items);
        match &page.next_cursor {
            Some(cursor) => out.push_str(&format!("next: {}\n", cursor)),
            None if page.items.is_empty() => out.push_str("no filters\n"),
            None => {}
        }
        Ok(out)
    }

    pub fn render_summaries(&self, items: &[FilterSummary]) -> Result<String, serde_json::Error> {
        if self.format == OutputFormat::Json {
            return Self::json(items);
        }
        if items.is_empty() {
            return Ok("no filters\n".to_string());
        }
        Ok(Self::summary_lines(items))
    }

    pub fn render_filter(&self, filter: &Filter) -> Result<String, serde_json::Error> {
        if self.format == OutputFormat::Json {
            return Self::json(filter);
        }

        let placement = match (filter.category_id, filter.subcategory_id) {
            (Some(c), Some(s)) => format!("category {} / subcategory {}", c, s),
            (Some(c), None) => format!("category {}", c),
            (None, Some(s)) => format!("subcategory {}", s),
            (None, None) => "uncategorized".to_string(),
        };
        let mut out = format!(
            "#{} {}\nowner: {}\nvisibility: {}\nplacement: {} (position {})\n\
             popularity: {:.1}  views: {}  exports: {}\ncreated: {}\nupdated: {}\n",
            filter.id,
            filter.name,
            filter.owner_id,
            filter.visibility.as_str(),
            placement,
            filter.order,
            filter.popularity,
            filter.view_count,
            filter.export_count,
            filter.created_at.to_rfc3339(),
            filter.updated_at.to_rfc3339(),
        );
        if let Some(description) = &filter.description {
            out.push_str(&format!("\n{}\n", description));
        }
        out.push_str(&format!("\n{}\n", filter.config));
        Ok(out)
    }

    pub fn render_categories(&self, tree: &[CategoryTree]) -> Result<String, serde_json::Error> {
        if self.format == OutputFormat::Json {
            return Self::json(tree);
        }
        if tree.is_empty() {
            return Ok("no categories\n".to_string());
        }

        let mut out = String::new();
        for node in tree {
            out.push_str(&format!("{}\t{}\n", node.category.id, node.category.name));
            for sub in &node.subcategories {
                out.push_str(&format!("  {}\t{}\n", sub.id, sub.name));
            }
        }
        Ok(out)
    }

    fn summary_lines(items: &[FilterSummary]) -> String {
        items
            .iter()
            .map(|f| {
                let blurb = f.description.as_deref().map(first_line).unwrap_or("");
                format!(
                    "{}\t{:>7.1}\t{}\t{}\t{}\n",
                    f.id,
                    f.popularity,
                    f.visibility.as_str(),
                    f.name,
                    blurb
                )
            })
            .collect()
    }
}
