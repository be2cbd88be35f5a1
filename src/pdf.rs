//! Printable exports: training plans and workout logs on A4 pages.

use crate::errors::{Error, Result};
use crate::insights::TrainingPlan;
use crate::models::{User, WorkoutRecord};
use chrono::{DateTime, Utc};
use printpdf::{
    BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerIndex,
    PdfPageIndex,
};

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const MARGIN: f32 = 18.0;
const TOP: f32 = 20.0;
/// Content never runs below this distance from the top edge.
const BOTTOM: f32 = 272.0;
const FOOTER: f32 = 287.0;
const PT_TO_MM: f32 = 0.3528;

const LOG_COLUMNS: [(&str, f32); 6] = [
    ("Date", 0.0),
    ("Type", 28.0),
    ("Duration", 54.0),
    ("Distance", 82.0),
    ("Calories", 110.0),
    ("Pace", 136.0),
];

#[derive(Clone, Copy)]
enum Weight {
    Regular,
    Bold,
}

/// Top-down text cursor over a growing list of pages.
struct Sheet {
    doc: PdfDocumentReference,
    regular: IndirectFontRef,
    bold: IndirectFontRef,
    pages: Vec<(PdfPageIndex, PdfLayerIndex)>,
    cursor: f32,
}

impl Sheet {
    fn new(title: &str) -> Result<Self> {
        let (doc, page, layer) =
            PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let regular = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(render_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(render_error)?;
        Ok(Self {
            doc,
            regular,
            bold,
            pages: vec![(page, layer)],
            cursor: TOP,
        })
    }

    fn page_count(&self) -> usize {
        self.pages.len()
    }

    fn new_page(&mut self) {
        let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        self.pages.push((page, layer));
        self.cursor = TOP;
    }

    /// Starts a new page unless `height` millimetres still fit.
    fn reserve(&mut self, height: f32) -> bool {
        if self.cursor + height > BOTTOM {
            self.new_page();
            return true;
        }
        false
    }

    fn put(&self, page: usize, text: &str, size: f32, weight: Weight, x: f32, y: f32) {
        let Some(&(page, layer)) = self.pages.get(page) else {
            return;
        };
        let font = match weight {
            Weight::Regular => &self.regular,
            Weight::Bold => &self.bold,
        };
        self.doc
            .get_page(page)
            .get_layer(layer)
            .use_text(printable(text), size, Mm(x), Mm(PAGE_HEIGHT - y), font);
    }

    fn line(&mut self, text: &str, size: f32, weight: Weight, indent: f32) {
        let height = line_height(size);
        self.reserve(height);
        self.put(self.pages.len() - 1, text, size, weight, MARGIN + indent, self.cursor);
        self.cursor += height;
    }

    fn wrapped(&mut self, text: &str, size: f32, indent: f32) {
        let width = PAGE_WIDTH - 2.0 * MARGIN - indent;
        for line in wrap(text, width, size) {
            self.line(&line, size, Weight::Regular, indent);
        }
    }

    fn heading(&mut self, text: &str, size: f32) {
        self.reserve(line_height(size) * 3.0);
        self.line(text, size, Weight::Bold, 0.0);
        self.gap(1.5);
    }

    fn bullets(&mut self, items: &[String], indent: f32) {
        for item in items {
            self.wrapped(&format!("- {item}"), 10.0, indent);
        }
    }

    fn gap(&mut self, height: f32) {
        self.cursor += height;
    }

    fn row(&mut self, cells: &[(String, f32)], size: f32, weight: Weight) {
        let page = self.pages.len() - 1;
        for (text, offset) in cells {
            self.put(page, text, size, weight, MARGIN + offset, self.cursor);
        }
        self.cursor += line_height(size) + 1.0;
    }

    fn finish(self, footer: impl Fn(usize, usize) -> String) -> Result<Vec<u8>> {
        let total = self.pages.len();
        for page in 0..total {
            self.put(page, &footer(page + 1, total), 8.0, Weight::Regular, MARGIN, FOOTER);
        }
        self.doc.save_to_bytes().map_err(render_error)
    }
}

fn render_error(err: printpdf::Error) -> Error {
    Error::Internal(format!("failed to render pdf: {err}"))
}

fn line_height(size: f32) -> f32 {
    size * PT_TO_MM * 1.45
}

/// The built-in fonts only cover ASCII reliably.
fn printable(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\u{2022}' | '\u{2013}' | '\u{2014}' => '-',
            c if c.is_ascii() && !c.is_ascii_control() => c,
            _ => '?',
        })
        .collect()
}

/// Greedy word wrap using an average Helvetica glyph width.
fn wrap(text: &str, width: f32, size: f32) -> Vec<String> {
    let max_chars = ((width / (size * PT_TO_MM * 0.5)) as usize).max(10);
    let mut lines = Vec::new();
    let mut current = String::new();
    for word in text.split_whitespace() {
        if !current.is_empty() && current.len() + 1 + word.len() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(word);
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

fn date(at: DateTime<Utc>) -> String {
    at.format("%Y-%m-%d").to_string()
}

/// Renders a plan week by week, Monday first, followed by its metrics and
/// notes.
pub fn render_training_plan(
    user: &User,
    plan: &TrainingPlan,
    start: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Vec<u8>> {
    training_plan_sheet(user, plan, start)?.finish(|page, total| {
        format!("Generated by Athlete Training App - Page {page} of {total} - {}", date(now))
    })
}

fn training_plan_sheet(user: &User, plan: &TrainingPlan, start: DateTime<Utc>) -> Result<Sheet> {
    let mut sheet = Sheet::new(&plan.plan_title)?;

    sheet.line("TRAINING PLAN", 22.0, Weight::Bold, 0.0);
    sheet.gap(3.0);
    sheet.line(&format!("Generated for: {}", user.name), 11.0, Weight::Regular, 0.0);
    sheet.line(&format!("Start date: {}", date(start)), 11.0, Weight::Regular, 0.0);
    sheet.line(
        &format!(
            "Athlete type: {}    Fitness level: {}",
            user.athlete_type.as_str(),
            user.fitness_level.as_str()
        ),
        11.0,
        Weight::Regular,
        0.0,
    );
    sheet.gap(5.0);

    sheet.heading(&plan.plan_title, 16.0);
    sheet.line(&format!("Goal: {}", plan.goal), 11.0, Weight::Regular, 0.0);
    sheet.line(&format!("Duration: {} weeks", plan.duration_weeks), 11.0, Weight::Regular, 0.0);
    sheet.line(&format!("Intensity: {}", plan.intensity_level), 11.0, Weight::Regular, 0.0);
    if !plan.progression_strategy.is_empty() {
        sheet.wrapped(&format!("Progression: {}", plan.progression_strategy), 11.0, 0.0);
    }
    sheet.gap(6.0);

    for week in &plan.weeks {
        sheet.heading(&format!("Week {}: {}", week.week_number, week.focus), 14.0);
        if !week.goals.is_empty() {
            sheet.line("Goals:", 10.0, Weight::Bold, 0.0);
            sheet.bullets(&week.goals, 4.0);
            sheet.gap(2.0);
        }
        if !week.total_volume.is_empty() {
            sheet.line(&format!("Total volume: {}", week.total_volume), 10.0, Weight::Regular, 0.0);
            sheet.gap(2.0);
        }

        for (name, day) in week.days.named() {
            sheet.reserve(line_height(11.0) * 3.0);
            sheet.line(&format!("{name}:"), 11.0, Weight::Bold, 0.0);
            sheet.line(&format!("Type: {}", day.workout_type), 10.0, Weight::Regular, 5.0);
            if !day.duration.is_empty() {
                sheet.line(&format!("Duration: {}", day.duration), 10.0, Weight::Regular, 5.0);
            }
            if !day.intensity.is_empty() {
                sheet.line(&format!("Intensity: {}/10", day.intensity), 10.0, Weight::Regular, 5.0);
            }
            if !day.description.is_empty() {
                sheet.wrapped(&format!("Description: {}", day.description), 10.0, 5.0);
            }
            if !day.key_focus.is_empty() {
                sheet.line(&format!("Focus: {}", day.key_focus), 10.0, Weight::Regular, 5.0);
            }
            sheet.gap(1.5);
        }

        if !week.recovery_strategies.is_empty() {
            sheet.gap(2.0);
            sheet.line("Recovery strategies:", 11.0, Weight::Bold, 0.0);
            sheet.bullets(&week.recovery_strategies, 4.0);
        }
        sheet.gap(6.0);
    }

    if !plan.performance_metrics.is_empty() {
        sheet.heading("Performance Metrics", 14.0);
        sheet.bullets(&plan.performance_metrics, 4.0);
        sheet.gap(6.0);
    }
    if !plan.notes.is_empty() {
        sheet.heading("Important Notes", 12.0);
        sheet.wrapped(&plan.notes, 10.0, 0.0);
    }
    Ok(sheet)
}

/// Renders a summary and one table row per workout, in the order given.
pub fn render_workout_log(
    user: &User,
    workouts: &[WorkoutRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    now: DateTime<Utc>,
) -> Result<Vec<u8>> {
    workout_log_sheet(user, workouts, start, end)?.finish(|page, total| {
        format!("Generated on {} - Page {page} of {total}", date(now))
    })
}

fn workout_log_sheet(
    user: &User,
    workouts: &[WorkoutRecord],
    start: DateTime<Utc>,
    end: DateTime<Utc>,
) -> Result<Sheet> {
    let mut sheet = Sheet::new("Workout Log")?;

    sheet.line("WORKOUT LOG", 22.0, Weight::Bold, 0.0);
    sheet.gap(3.0);
    sheet.line(&format!("Athlete: {}", user.name), 11.0, Weight::Regular, 0.0);
    sheet.line(
        &format!("Period: {} - {}", date(start), date(end)),
        11.0,
        Weight::Regular,
        0.0,
    );
    sheet.gap(6.0);

    let total_duration: f64 = workouts.iter().map(|w| w.duration_minutes).sum();
    let total_distance: f64 = workouts.iter().map(|w| w.distance_km).sum();
    let total_calories: f64 = workouts.iter().map(|w| w.calories_burned).sum();
    let average = if workouts.is_empty() {
        0.0
    } else {
        total_duration / workouts.len() as f64
    };

    sheet.heading("Summary Statistics", 14.0);
    for stat in [
        format!("Total workouts: {}", workouts.len()),
        format!("Total duration: {total_duration:.0} minutes"),
        format!("Total distance: {total_distance:.2} km"),
        format!("Total calories: {total_calories:.0}"),
        format!("Average duration: {average:.1} minutes per workout"),
    ] {
        sheet.line(&stat, 11.0, Weight::Regular, 0.0);
    }
    sheet.gap(6.0);

    if workouts.is_empty() {
        sheet.line("No workouts found for the selected period", 12.0, Weight::Regular, 0.0);
        return Ok(sheet);
    }

    sheet.heading("Workout Details", 14.0);
    log_header(&mut sheet);
    for workout in workouts {
        if sheet.reserve(line_height(9.0) + 1.0) {
            log_header(&mut sheet);
        }
        let cells = [
            date(workout.occurred_at),
            workout.category.as_str().to_string(),
            format!("{:.0} min", workout.duration_minutes),
            dash_unless(workout.distance_km > 0.0, || format!("{:.1} km", workout.distance_km)),
            dash_unless(workout.calories_burned > 0.0, || {
                format!("{:.0}", workout.calories_burned)
            }),
            workout
                .pace_min_per_km
                .map_or_else(|| "-".to_string(), |pace| format!("{pace:.1} min/km")),
        ];
        let row: Vec<(String, f32)> = cells
            .into_iter()
            .zip(LOG_COLUMNS.iter().map(|(_, offset)| *offset))
            .collect();
        sheet.row(&row, 9.0, Weight::Regular);
    }
    Ok(sheet)
}

fn log_header(sheet: &mut Sheet) {
    let header: Vec<(String, f32)> = LOG_COLUMNS
        .iter()
        .map(|(label, offset)| (label.to_string(), *offset))
        .collect();
    sheet.row(&header, 10.0, Weight::Bold);
}

fn dash_unless(present: bool, value: impl FnOnce() -> String) -> String {
    if present { value() } else { "-".into() }
}
