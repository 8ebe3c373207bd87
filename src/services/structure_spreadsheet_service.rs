//! Flat spreadsheet form of a container's structure.
//!
//! One "Structure" sheet: a header row, one row per content item with its
//! ancestors' names denormalised into the leading columns, and one extra
//! row for every category, topic or factor that has no content below it.

use std::collections::{HashMap, HashSet};
use std::io::Cursor;

use rust_xlsxwriter::{Format, FormatUnderline, Workbook, Worksheet, XlsxError};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::shared_strings::formatted_strings;
use super::{
    ensure_container, CategoryService, ContentService, CreateCategory, CreateContent, CreateFactor,
    CreateTopic, FactorService, TopicService, UpdateContent,
};
use crate::common::rich_text::{html_to_runs, looks_like_html, plain_text_to_html, TextStyle};
use crate::database::entities::{categories, contents, factors, topics, LevelEntity};
use crate::errors::{CoreError, ImportExportError, ImportExportResult};

pub const SHEET_NAME: &str = "Structure";

pub const HEADERS: [&str; 26] = [
    "Category",
    "Category Description",
    "Topic",
    "Topic Description",
    "Factor",
    "Factor Description",
    "Content",
    "Content Description",
    "Question",
    "Answer Type",
    "Answer Options",
    "Placeholder",
    "Info Question",
    "Info Answer",
    "Guidance",
    "Required",
    "Weight",
    "Likelihood Scale",
    "Impact Scale",
    "Control Rating",
    "Mitigation Hint",
    "Evidence Hint",
    "Reference Code",
    "Owner Role",
    "Review Frequency",
    "Notes",
];

const REQUIRED_HEADERS: [&str; 2] = ["Category", "Content"];

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureImportResult {
    pub rows_processed: usize,
    pub categories_created: usize,
    pub topics_created: usize,
    pub factors_created: usize,
    pub contents_created: usize,
    pub contents_updated: usize,
    pub failures: Vec<ImportRowFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportRowFailure {
    /// 1-based sheet row number
    pub row: usize,
    pub reason: String,
}

enum Cell<'a> {
    Text(Option<&'a str>),
    Html(Option<&'a str>),
    Number(Option<f64>),
}

fn run_format(style: TextStyle) -> Format {
    let mut format = Format::new();
    if style.bold {
        format = format.set_bold();
    }
    if style.italic {
        format = format.set_italic();
    }
    if style.underline {
        format = format.set_underline(FormatUnderline::Single);
    }
    format
}

fn write_html(worksheet: &mut Worksheet, row: u32, col: u16, html: &str) -> Result<(), XlsxError> {
    let runs: Vec<_> = html_to_runs(html)
        .into_iter()
        .filter(|run| !run.text.is_empty())
        .collect();

    if runs.iter().all(|run| run.style.is_plain()) {
        let text: String = runs.into_iter().map(|run| run.text).collect();
        if !text.is_empty() {
            worksheet.write_string(row, col, text)?;
        }
        return Ok(());
    }

    let formats: Vec<Format> = runs.iter().map(|run| run_format(run.style)).collect();
    let segments: Vec<(&Format, &str)> = formats
        .iter()
        .zip(runs.iter())
        .map(|(format, run)| (format, run.text.as_str()))
        .collect();
    worksheet.write_rich_string(row, col, &segments)?;
    Ok(())
}

fn write_row(worksheet: &mut Worksheet, row: u32, cells: &[Cell<'_>]) -> Result<(), XlsxError> {
    for (col, cell) in cells.iter().enumerate() {
        let col = col as u16;
        match cell {
            Cell::Text(Some(text)) if !text.is_empty() => {
                worksheet.write_string(row, col, *text)?;
            }
            Cell::Html(Some(html)) if !html.is_empty() => write_html(worksheet, row, col, html)?,
            Cell::Number(Some(number)) => {
                worksheet.write_number(row, col, *number)?;
            }
            _ => {}
        }
    }
    Ok(())
}

fn ancestor_cells<'a>(
    category: Option<&'a categories::Model>,
    topic: Option<&'a topics::Model>,
    factor: Option<&'a factors::Model>,
) -> Vec<Cell<'a>> {
    vec![
        Cell::Text(category.map(|c| c.name.as_str())),
        Cell::Html(category.and_then(|c| c.description.as_deref())),
        Cell::Text(topic.map(|t| t.name.as_str())),
        Cell::Html(topic.and_then(|t| t.description.as_deref())),
        Cell::Text(factor.map(|f| f.name.as_str())),
        Cell::Html(factor.and_then(|f| f.description.as_deref())),
    ]
}

fn content_cells(content: &contents::Model) -> Vec<Cell<'_>> {
    vec![
        Cell::Text(Some(content.name.as_str())),
        Cell::Html(content.description.as_deref()),
        Cell::Text(content.question.as_deref()),
        Cell::Text(Some(content.answer_type.as_str())),
        Cell::Text(content.answer_options.as_deref()),
        Cell::Text(content.placeholder.as_deref()),
        Cell::Text(content.info_question.as_deref()),
        Cell::Text(content.info_answer.as_deref()),
        Cell::Text(content.guidance.as_deref()),
        Cell::Text(Some(if content.is_required { "Yes" } else { "No" })),
        Cell::Number(content.weight.map(f64::from)),
        Cell::Text(content.likelihood_scale.as_deref()),
        Cell::Text(content.impact_scale.as_deref()),
        Cell::Text(content.control_rating.as_deref()),
        Cell::Text(content.mitigation_hint.as_deref()),
        Cell::Text(content.evidence_hint.as_deref()),
        Cell::Text(content.reference_code.as_deref()),
        Cell::Text(content.owner_role.as_deref()),
        Cell::Text(content.review_frequency.as_deref()),
        Cell::Text(content.notes.as_deref()),
    ]
}

fn cell_to_string(cell: &calamine::Data) -> String {
    use calamine::Data;
    match cell {
        Data::String(s) => s.clone(),
        Data::Float(f) if f.fract() == 0.0 => format!("{}", *f as i64),
        Data::Empty => String::new(),
        other => other.to_string(),
    }
}

fn parse_bool(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "yes" | "y" | "true" | "1" | "x"
    )
}

/// Options cell holds a JSON array, or labels separated by `;` or newlines.
fn parse_answer_options(value: &str) -> Value {
    if let Ok(parsed @ Value::Array(_)) = serde_json::from_str::<Value>(value) {
        return parsed;
    }
    Value::Array(
        value
            .split(|c| c == ';' || c == '\n')
            .map(str::trim)
            .filter(|label| !label.is_empty())
            .map(|label| Value::String(label.to_string()))
            .collect(),
    )
}

/// Descriptions are stored as HTML; plain cell text is escaped.
fn description_html(value: &str) -> String {
    if looks_like_html(value) {
        value.to_string()
    } else {
        plain_text_to_html(value)
    }
}

fn name_key(name: &str) -> String {
    name.trim().to_lowercase()
}

struct SheetRow<'a> {
    cells: Vec<String>,
    columns: &'a HashMap<String, usize>,
    formatted: &'a HashMap<String, String>,
}

impl SheetRow<'_> {
    fn get(&self, header: &str) -> Option<&str> {
        self.columns
            .get(&name_key(header))
            .and_then(|idx| self.cells.get(*idx))
            .map(|value| value.trim())
            .filter(|value| !value.is_empty())
    }

    /// Description cell as HTML, keeping bold, italic and underline runs.
    fn html(&self, header: &str) -> Option<String> {
        self.get(header).map(|value| match self.formatted.get(value) {
            Some(html) => html.clone(),
            None => description_html(value),
        })
    }

    fn owned(&self, header: &str) -> Option<String> {
        self.get(header).map(str::to_string)
    }

    fn is_blank(&self) -> bool {
        self.cells.iter().all(|value| value.trim().is_empty())
    }
}

/// Name lookups for find-or-create, seeded from the container.
#[derive(Default)]
struct StructureIndex {
    categories: HashMap<String, i32>,
    topics: HashMap<(Option<i32>, String), i32>,
    factors: HashMap<(Option<i32>, Option<i32>, String), i32>,
    contents: HashMap<(i32, Option<i32>, Option<i32>, String), i32>,
}

pub struct StructureSpreadsheetService {
    db: DatabaseConnection,
}

impl StructureSpreadsheetService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    async fn load<E: LevelEntity>(&self, container_id: i32) -> Result<Vec<E::Model>, sea_orm::DbErr> {
        E::find()
            .filter(E::container_column().eq(container_id))
            .order_by_asc(E::order_column())
            .order_by_asc(E::id_column())
            .all(&self.db)
            .await
    }

    async fn ensure_container(&self, container_id: i32) -> ImportExportResult<()> {
        ensure_container(&self.db, container_id)
            .await
            .map(|_| ())
            .map_err(|_| ImportExportError::ContainerNotFound(container_id))
    }

    /// Export the container's structure to an XLSX workbook.
    pub async fn export_to_xlsx(&self, container_id: i32) -> ImportExportResult<Vec<u8>> {
        self.ensure_container(container_id).await?;

        let categories = self.load::<categories::Entity>(container_id).await?;
        let topics = self.load::<topics::Entity>(container_id).await?;
        let factors = self.load::<factors::Entity>(container_id).await?;
        let contents = self.load::<contents::Entity>(container_id).await?;

        tracing::info!(
            "Exporting container {}: {} categories, {} topics, {} factors, {} contents",
            container_id,
            categories.len(),
            topics.len(),
            factors.len(),
            contents.len()
        );

        let category_by_id: HashMap<i32, &categories::Model> =
            categories.iter().map(|c| (c.id, c)).collect();
        let topic_by_id: HashMap<i32, &topics::Model> = topics.iter().map(|t| (t.id, t)).collect();
        let factor_by_id: HashMap<i32, &factors::Model> =
            factors.iter().map(|f| (f.id, f)).collect();

        let mut workbook = Workbook::new();
        let worksheet = workbook.add_worksheet();
        worksheet.set_name(SHEET_NAME)?;

        for (col, header) in HEADERS.iter().enumerate() {
            worksheet.write_string(0, col as u16, *header)?;
        }

        let mut row: u32 = 1;
        let mut covered_categories = HashSet::new();
        let mut covered_topics = HashSet::new();
        let mut covered_factors = HashSet::new();

        for content in &contents {
            let category = category_by_id.get(&content.category_id).copied();
            let topic = content.topic_id.and_then(|id| topic_by_id.get(&id).copied());
            let factor = content.factor_id.and_then(|id| factor_by_id.get(&id).copied());

            covered_categories.insert(content.category_id);
            covered_topics.extend(content.topic_id);
            covered_factors.extend(content.factor_id);

            let mut cells = ancestor_cells(category, topic, factor);
            cells.extend(content_cells(content));
            write_row(worksheet, row, &cells)?;
            row += 1;
        }

        for factor in factors.iter().filter(|f| !covered_factors.contains(&f.id)) {
            let category = factor.category_id.and_then(|id| category_by_id.get(&id).copied());
            let topic = factor.topic_id.and_then(|id| topic_by_id.get(&id).copied());
            covered_categories.extend(factor.category_id);
            covered_topics.extend(factor.topic_id);

            write_row(worksheet, row, &ancestor_cells(category, topic, Some(factor)))?;
            row += 1;
        }

        for topic in topics.iter().filter(|t| !covered_topics.contains(&t.id)) {
            let category = topic.category_id.and_then(|id| category_by_id.get(&id).copied());
            covered_categories.extend(topic.category_id);

            write_row(worksheet, row, &ancestor_cells(category, Some(topic), None))?;
            row += 1;
        }

        for category in categories
            .iter()
            .filter(|c| !covered_categories.contains(&c.id))
        {
            write_row(worksheet, row, &ancestor_cells(Some(category), None, None))?;
            row += 1;
        }

        tracing::info!("Wrote {} structure rows for container {}", row - 1, container_id);

        Ok(workbook.save_to_buffer()?)
    }

    /// Import a structure sheet into the container using find-or-create by
    /// name. Rows are applied one at a time; a failing row is recorded and
    /// the import continues.
    pub async fn import_from_xlsx(
        &self,
        container_id: i32,
        xlsx_data: &[u8],
    ) -> ImportExportResult<StructureImportResult> {
        use calamine::{open_workbook_from_rs, Reader, Xlsx};

        self.ensure_container(container_id).await?;
        tracing::info!(
            "Importing structure XLSX with {} bytes into container {}",
            xlsx_data.len(),
            container_id
        );

        let cursor = Cursor::new(xlsx_data);
        let mut workbook: Xlsx<_> = open_workbook_from_rs(cursor).map_err(|e| {
            tracing::error!("Failed to open XLSX: {:?}", e);
            ImportExportError::ImportFailed(format!("Failed to open XLSX file: {}", e))
        })?;

        let sheet_names = workbook.sheet_names();
        let sheet_name = sheet_names
            .iter()
            .find(|name| name.eq_ignore_ascii_case(SHEET_NAME))
            .or_else(|| sheet_names.first())
            .cloned()
            .ok_or_else(|| ImportExportError::InvalidFormat("workbook has no sheets".to_string()))?;

        let range = workbook.worksheet_range(&sheet_name)?;
        if range.height() == 0 {
            return Err(ImportExportError::InvalidFormat(format!(
                "sheet '{}' is empty",
                sheet_name
            )));
        }

        let mut columns = HashMap::new();
        for col in 0..range.width() {
            if let Some(cell) = range.get((0, col)) {
                let header = name_key(&cell_to_string(cell));
                if !header.is_empty() {
                    columns.entry(header).or_insert(col);
                }
            }
        }

        let missing: Vec<&str> = REQUIRED_HEADERS
            .iter()
            .copied()
            .filter(|header| !columns.contains_key(&name_key(header)))
            .collect();
        if !missing.is_empty() {
            return Err(ImportExportError::InvalidFormat(format!(
                "missing required column(s): {}",
                missing.join(", ")
            )));
        }
        tracing::info!("Sheet '{}' headers: {:?}", sheet_name, columns.keys());

        let formatted = formatted_strings(xlsx_data)?;
        let mut index = self.build_index(container_id).await?;
        let mut result = StructureImportResult::default();

        for row_idx in 1..range.height() {
            let cells = (0..range.width())
                .map(|col| range.get((row_idx, col)).map(cell_to_string).unwrap_or_default())
                .collect();
            let row = SheetRow {
                cells,
                columns: &columns,
                formatted: &formatted,
            };
            if row.is_blank() {
                continue;
            }

            result.rows_processed += 1;
            if let Err(err) = self
                .import_row(container_id, &row, &mut index, &mut result)
                .await
            {
                let row_number = row_idx + 1;
                tracing::warn!("Skipped structure row {}: {}", row_number, err.message());
                result.failures.push(ImportRowFailure {
                    row: row_number,
                    reason: err.message().to_string(),
                });
            }
        }

        tracing::info!(
            "Imported {} rows into container {}: {} categories, {} topics, {} factors, {} contents created, {} contents updated, {} failed",
            result.rows_processed,
            container_id,
            result.categories_created,
            result.topics_created,
            result.factors_created,
            result.contents_created,
            result.contents_updated,
            result.failures.len()
        );

        Ok(result)
    }

    async fn build_index(&self, container_id: i32) -> ImportExportResult<StructureIndex> {
        let mut index = StructureIndex::default();

        for category in self.load::<categories::Entity>(container_id).await? {
            index
                .categories
                .entry(name_key(&category.name))
                .or_insert(category.id);
        }
        for topic in self.load::<topics::Entity>(container_id).await? {
            index
                .topics
                .entry((topic.category_id, name_key(&topic.name)))
                .or_insert(topic.id);
        }
        for factor in self.load::<factors::Entity>(container_id).await? {
            index
                .factors
                .entry((factor.category_id, factor.topic_id, name_key(&factor.name)))
                .or_insert(factor.id);
        }
        for content in self.load::<contents::Entity>(container_id).await? {
            index
                .contents
                .entry((
                    content.category_id,
                    content.topic_id,
                    content.factor_id,
                    name_key(&content.name),
                ))
                .or_insert(content.id);
        }

        Ok(index)
    }

    async fn import_row(
        &self,
        container_id: i32,
        row: &SheetRow<'_>,
        index: &mut StructureIndex,
        result: &mut StructureImportResult,
    ) -> Result<(), CoreError> {
        // Topics and factors may live outside any category; content may not.
        let category_id = match row.get("Category") {
            Some(category_name) => Some(match index.categories.get(&name_key(category_name)) {
                Some(id) => *id,
                None => {
                    let category = CategoryService::new(self.db.clone())
                        .create(
                            container_id,
                            CreateCategory {
                                name: category_name.to_string(),
                                description: row.html("Category Description"),
                                display_order: None,
                            },
                        )
                        .await?;
                    index.categories.insert(name_key(category_name), category.id);
                    result.categories_created += 1;
                    category.id
                }
            }),
            None if row.get("Content").is_none()
                && (row.get("Topic").is_some() || row.get("Factor").is_some()) =>
            {
                None
            }
            None => return Err(CoreError::invalid_field("Category", "category name is empty")),
        };

        let topic_id = match row.get("Topic") {
            None => None,
            Some(topic_name) => {
                let key = (category_id, name_key(topic_name));
                match index.topics.get(&key) {
                    Some(id) => Some(*id),
                    None => {
                        let topic = TopicService::new(self.db.clone())
                            .create(
                                container_id,
                                CreateTopic {
                                    category_id,
                                    name: topic_name.to_string(),
                                    description: row.html("Topic Description"),
                                    display_order: None,
                                },
                            )
                            .await?;
                        index.topics.insert(key, topic.id);
                        result.topics_created += 1;
                        Some(topic.id)
                    }
                }
            }
        };

        let factor_id = match row.get("Factor") {
            None => None,
            Some(factor_name) => {
                let key = (category_id, topic_id, name_key(factor_name));
                match index.factors.get(&key) {
                    Some(id) => Some(*id),
                    None => {
                        let factor = FactorService::new(self.db.clone())
                            .create(
                                container_id,
                                CreateFactor {
                                    category_id,
                                    topic_id,
                                    name: factor_name.to_string(),
                                    description: row.html("Factor Description"),
                                    display_order: None,
                                },
                            )
                            .await?;
                        index.factors.insert(key, factor.id);
                        result.factors_created += 1;
                        Some(factor.id)
                    }
                }
            }
        };

        let (Some(category_id), Some(content_name)) = (category_id, row.get("Content")) else {
            return Ok(());
        };

        let service = ContentService::new(self.db.clone());
        let key = (category_id, topic_id, factor_id, name_key(content_name));
        let weight = row
            .get("Weight")
            .map(|value| {
                value.parse::<i32>().map_err(|_| {
                    CoreError::invalid_field("Weight", format!("weight '{}' is not a whole number", value))
                })
            })
            .transpose()?;

        match index.contents.get(&key) {
            Some(content_id) => {
                let patch = UpdateContent {
                    description: row.html("Content Description").map(Some),
                    question: row.owned("Question").map(Some),
                    answer_type: row.owned("Answer Type"),
                    answer_options: row
                        .get("Answer Options")
                        .map(|value| Some(parse_answer_options(value))),
                    placeholder: row.owned("Placeholder").map(Some),
                    info_question: row.owned("Info Question").map(Some),
                    info_answer: row.owned("Info Answer").map(Some),
                    guidance: row.owned("Guidance").map(Some),
                    is_required: row.get("Required").map(parse_bool),
                    weight: weight.map(Some),
                    likelihood_scale: row.owned("Likelihood Scale").map(Some),
                    impact_scale: row.owned("Impact Scale").map(Some),
                    control_rating: row.owned("Control Rating").map(Some),
                    mitigation_hint: row.owned("Mitigation Hint").map(Some),
                    evidence_hint: row.owned("Evidence Hint").map(Some),
                    reference_code: row.owned("Reference Code").map(Some),
                    owner_role: row.owned("Owner Role").map(Some),
                    review_frequency: row.owned("Review Frequency").map(Some),
                    notes: row.owned("Notes").map(Some),
                    ..Default::default()
                };
                service.update(container_id, *content_id, patch).await?;
                result.contents_updated += 1;
            }
            None => {
                let input = CreateContent {
                    category_id,
                    topic_id,
                    factor_id,
                    name: content_name.to_string(),
                    description: row.html("Content Description"),
                    question: row.owned("Question"),
                    answer_type: row.owned("Answer Type"),
                    answer_options: row.get("Answer Options").map(parse_answer_options),
                    placeholder: row.owned("Placeholder"),
                    info_question: row.owned("Info Question"),
                    info_answer: row.owned("Info Answer"),
                    guidance: row.owned("Guidance"),
                    is_required: row.get("Required").map(parse_bool),
                    weight,
                    likelihood_scale: row.owned("Likelihood Scale"),
                    impact_scale: row.owned("Impact Scale"),
                    control_rating: row.owned("Control Rating"),
                    mitigation_hint: row.owned("Mitigation Hint"),
                    evidence_hint: row.owned("Evidence Hint"),
                    reference_code: row.owned("Reference Code"),
                    owner_role: row.owned("Owner Role"),
                    review_frequency: row.owned("Review Frequency"),
                    notes: row.owned("Notes"),
                    display_order: None,
                };
                let content = service.create(container_id, input).await?;
                index.contents.insert(key, content.id);
                result.contents_created += 1;
            }
        }

        Ok(())
    }
}
