//! Dashboard data adapter.
//!
//! Pure functions turning raw API payloads into chart inputs for the
//! renderer. Order is always the API's order; nothing is sorted. Empty
//! payloads give empty charts.

pub mod dates;

use serde::Serialize;

use crate::api::{AuditLogEntry, GovSummary, InventoryItem, VaccinationRecord};

const TEAL: &str = "#00b1a2";
const NAVY: &str = "#2d4257";
const AMBER: &str = "#ffce56";

// ---------------------------------------------------------------------------
// Chart types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Bar,
    Pie,
    Line,
}

impl std::fmt::Display for ChartKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bar => write!(f, "bar"),
            Self::Pie => write!(f, "pie"),
            Self::Line => write!(f, "line"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColorAssignment {
    /// One fill color for every data point.
    Fill(String),
    /// One fill color per data point, cycling.
    Palette(Vec<String>),
    /// Line color.
    Stroke(String),
}

/// Labels and values for one chart. Derived per activation, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ChartInput {
    pub kind: ChartKind,
    /// Dataset label, if the chart has one.
    pub label: Option<String>,
    pub labels: Vec<String>,
    pub series: Vec<f64>,
    pub colors: Option<ColorAssignment>,
}

impl ChartInput {
    pub fn new(kind: ChartKind, labels: Vec<String>, series: Vec<f64>) -> Self {
        Self {
            kind,
            label: None,
            labels,
            series,
            colors: None,
        }
    }

    pub fn with_label(mut self, label: &str) -> Self {
        self.label = Some(label.to_string());
        self
    }

    pub fn with_colors(mut self, colors: ColorAssignment) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty() && self.series.is_empty()
    }

    /// The `{type, labels, datasets}` shape handed to a chart renderer.
    pub fn to_spec(&self) -> ChartSpec {
        let (background_color, border_color) = match &self.colors {
            Some(ColorAssignment::Fill(c)) => (Some(ColorValue::One(c.clone())), None),
            Some(ColorAssignment::Palette(cs)) => (Some(ColorValue::Many(cs.clone())), None),
            Some(ColorAssignment::Stroke(c)) => (None, Some(c.clone())),
            None => (None, None),
        };

        ChartSpec {
            kind: self.kind,
            labels: self.labels.clone(),
            datasets: vec![Dataset {
                label: self.label.clone(),
                data: self.series.clone(),
                background_color,
                border_color,
            }],
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    #[serde(rename = "type")]
    pub kind: ChartKind,
    pub labels: Vec<String>,
    pub datasets: Vec<Dataset>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    pub data: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub background_color: Option<ColorValue>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub border_color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ColorValue {
    One(String),
    Many(Vec<String>),
}

/// The charts of one dashboard. Merchant dashboards only have a bar chart.
#[derive(Debug, Clone, PartialEq)]
pub struct DashboardCharts {
    pub bar: ChartInput,
    pub pie: Option<ChartInput>,
    pub line: Option<ChartInput>,
}

impl DashboardCharts {
    pub fn iter(&self) -> impl Iterator<Item = &ChartInput> {
        std::iter::once(&self.bar)
            .chain(self.pie.as_ref())
            .chain(self.line.as_ref())
    }
}

// ---------------------------------------------------------------------------
// Adapters
// ---------------------------------------------------------------------------

/// Public dashboard: doses per record, vaccine frequency, dose timeline.
pub fn public_charts(records: &[VaccinationRecord]) -> DashboardCharts {
    let names: Vec<String> = records.iter().map(|r| r.vaccine_name.clone()).collect();
    let doses: Vec<f64> = records.iter().map(|r| f64::from(r.dose_number)).collect();
    let dates: Vec<String> = records
        .iter()
        .map(|r| dates::short_date(&r.date_administered))
        .collect();

    let (unique, counts) = count_by_first_occurrence(&names);

    DashboardCharts {
        bar: ChartInput::new(ChartKind::Bar, names, doses.clone())
            .with_label("Dose Number")
            .with_colors(ColorAssignment::Fill(TEAL.to_string())),
        pie: Some(
            ChartInput::new(ChartKind::Pie, unique, counts).with_colors(
                ColorAssignment::Palette(vec![
                    NAVY.to_string(),
                    TEAL.to_string(),
                    AMBER.to_string(),
                ]),
            ),
        ),
        line: Some(
            ChartInput::new(ChartKind::Line, dates, doses)
                .with_label("Vaccination Timeline")
                .with_colors(ColorAssignment::Stroke(NAVY.to_string())),
        ),
    }
}

/// Merchant dashboard: stock quantity per item row.
pub fn merchant_charts(items: &[InventoryItem]) -> DashboardCharts {
    let labels = items.iter().map(InventoryItem::label).collect();
    let quantities = items.iter().map(|i| i.quantity as f64).collect();

    DashboardCharts {
        bar: ChartInput::new(ChartKind::Bar, labels, quantities).with_label("Quantity in Stock"),
        pie: None,
        line: None,
    }
}

/// Government dashboard: the server aggregates, this only maps fields.
pub fn gov_charts(summary: &GovSummary) -> DashboardCharts {
    DashboardCharts {
        bar: ChartInput::new(
            ChartKind::Bar,
            summary.labels.clone(),
            summary.vaccinations.clone(),
        )
        .with_label("Total Vaccinations"),
        pie: Some(ChartInput::new(
            ChartKind::Pie,
            summary.vaccine_types.clone(),
            summary.vaccine_counts.clone(),
        )),
        line: Some(
            ChartInput::new(ChartKind::Line, summary.months.clone(), summary.trend.clone())
                .with_label("Monthly Trends"),
        ),
    }
}

/// Distinct values in order of first appearance, with their counts.
fn count_by_first_occurrence(values: &[String]) -> (Vec<String>, Vec<f64>) {
    let mut labels: Vec<String> = Vec::new();
    let mut counts: Vec<f64> = Vec::new();

    for value in values {
        match labels.iter().position(|l| l == value) {
            Some(idx) => counts[idx] += 1.0,
            None => {
                labels.push(value.clone());
                counts.push(1.0);
            }
        }
    }

    (labels, counts)
}

// ---------------------------------------------------------------------------
// Tables and listings
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Table {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// Admin audit log as a table, in API order.
pub fn audit_table(entries: &[AuditLogEntry]) -> Table {
    Table {
        headers: ["Email", "Role", "Action", "Time"]
            .iter()
            .map(|h| h.to_string())
            .collect(),
        rows: entries
            .iter()
            .map(|e| {
                vec![
                    e.user_email.clone(),
                    e.role.clone(),
                    e.action.clone(),
                    dates::short_datetime(&e.timestamp),
                ]
            })
            .collect(),
    }
}

/// Inventory search hits, one line per item.
pub fn inventory_lines(items: &[InventoryItem]) -> Vec<String> {
    items
        .iter()
        .map(|i| format!("{} (Qty: {})", i.label(), i.quantity))
        .collect()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
