//! Table formatting utilities for structured output.

use crate::insights::{AdInsight, LeaderboardEntry, RankBy};
use crate::matching::{CompanyAudienceReport, PhysicianMatch};
use crate::selection::AdWithCompanyName;
use crate::types::SponsoredQuestion;
use comfy_table::{
    Attribute, Cell, CellAlignment, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
};

/// Builder for creating formatted tables.
pub struct TableBuilder {
    table: Table,
}

impl Default for TableBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TableBuilder {
    pub fn new() -> Self {
        let mut table = Table::new();
        table.load_preset(UTF8_FULL);
        table.apply_modifier(UTF8_ROUND_CORNERS);
        Self { table }
    }

    /// Bold header row
    pub fn set_headers<S: AsRef<str>>(mut self, headers: impl IntoIterator<Item = S>) -> Self {
        let header_cells: Vec<Cell> = headers
            .into_iter()
            .map(|h| Cell::new(h.as_ref()).add_attribute(Attribute::Bold))
            .collect();
        self.table.set_header(header_cells);
        self
    }

    pub fn add_row(mut self, row: Vec<String>) -> Self {
        self.table.add_row(row);
        self
    }

    /// Right-align every column after the first, for numeric tables
    pub fn numeric(mut self) -> Self {
        let count = self.table.column_count();
        for index in 1..count {
            if let Some(column) = self.table.column_mut(index) {
                column.set_cell_alignment(CellAlignment::Right);
            }
        }
        self
    }

    pub fn build(self) -> String {
        self.table.to_string()
    }
}

/// A ratio shown as a percentage with two decimals
pub fn percent(value: f64) -> String {
    format!("{:.2}%", value * 100.0)
}

fn similarity_percent(value: f32) -> String {
    format!("{:.1}%", value * 100.0)
}

/// One row per label: raw counters and derived KPIs
pub fn create_insight_table(rows: &[(String, AdInsight)]) -> String {
    let mut builder = TableBuilder::new().set_headers([
        "Name",
        "Impressions",
        "Viewable",
        "Clicks",
        "CTR",
        "Viewability",
        "Avg. Dwell (s)",
    ]);

    for (label, insight) in rows {
        builder = builder.add_row(vec![
            label.clone(),
            insight.metrics.impressions.to_string(),
            insight.metrics.viewable_impressions.to_string(),
            insight.metrics.clicks.to_string(),
            percent(insight.ctr),
            percent(insight.viewability_rate),
            format!("{:.2}", insight.avg_dwell),
        ]);
    }

    builder.numeric().build()
}

pub fn create_leaderboard_table(rank_by: RankBy, entries: &[LeaderboardEntry]) -> String {
    let metric = match rank_by {
        RankBy::Ctr => "CTR",
        RankBy::Viewability => "Viewability",
    };
    let mut builder = TableBuilder::new().set_headers(["#", "Ad", "Company", "Headline", metric]);

    for (rank, entry) in entries.iter().enumerate() {
        builder = builder.add_row(vec![
            (rank + 1).to_string(),
            entry.ad.id.to_string(),
            entry.ad.company_id.to_string(),
            entry.ad.headline.clone(),
            percent(entry.value),
        ]);
    }

    builder.build()
}

pub fn create_matches_table(matches: &[PhysicianMatch]) -> String {
    let mut builder = TableBuilder::new().set_headers(["Physician", "Title", "Similarity"]);

    for m in matches {
        builder = builder.add_row(vec![
            m.physician.name.clone(),
            m.physician.title.clone(),
            similarity_percent(m.similarity.get()),
        ]);
    }

    builder.numeric().build()
}

/// Physicians down, purchased categories across, dollar accuracy last
pub fn create_audience_table(report: &CompanyAudienceReport) -> String {
    let headers = std::iter::once("Physician".to_string())
        .chain(report.categories.iter().map(|c| c.label.clone()))
        .chain(std::iter::once("Dollar Accuracy".to_string()));
    let mut builder = TableBuilder::new().set_headers(headers);

    for row in &report.rows {
        let mut cells = vec![format!("{} ({})", row.physician.name, row.physician.title)];
        cells.extend(row.similarities.iter().map(|s| match s {
            Some(score) => similarity_percent(score.get()),
            None => "-".to_string(),
        }));
        cells.push(
            row.dollar_accuracy
                .map(similarity_percent)
                .unwrap_or_else(|| "-".to_string()),
        );
        builder = builder.add_row(cells);
    }

    builder.numeric().build()
}

pub fn create_ad_table(ad: &AdWithCompanyName) -> String {
    let categories: Vec<&str> = ad.ad.category_ids.iter().map(|c| c.as_str()).collect();

    TableBuilder::new()
        .set_headers(["Field", "Value"])
        .add_row(vec!["Ad".into(), ad.ad.id.to_string()])
        .add_row(vec!["Company".into(), ad.company_name.clone()])
        .add_row(vec!["Headline".into(), ad.ad.headline.clone()])
        .add_row(vec!["Categories".into(), categories.join(", ")])
        .add_row(vec!["Creative".into(), ad.ad.creative_url.clone()])
        .build()
}

pub fn create_questions_table(questions: &[&SponsoredQuestion]) -> String {
    let mut builder = TableBuilder::new().set_headers(["Sponsor", "Question"]);
    for q in questions {
        builder = builder.add_row(vec![q.company_id.to_string(), q.question.clone()]);
    }
    builder.build()
}
