//! WASM bindings for clash-engine.
//!
//! Lets the timetable UI run the clash check in the browser on rows it has
//! already fetched from the hosted store. All complex types are passed as JSON
//! strings. Row objects accept the store's column names (`vid`, `lid`, `cid`,
//! `starttime`, `endtime`) as well as the canonical ones.
//!
//! ## Build process
//!
//! ```sh
//! cargo build -p clash-engine-wasm --target wasm32-unknown-unknown --release
//! wasm-bindgen --target web --out-dir packages/clash-engine-js/wasm/ \
//!   target/wasm32-unknown-unknown/release/clash_engine_wasm.wasm
//! ```

use chrono::NaiveDate;
use clash_engine::detector::validate_interval;
use clash_engine::event::parse_time;
use clash_engine::freebusy::free_slots_for;
use clash_engine::snapshot::rows_into_events;
use clash_engine::{
    detect_clashes, Candidate, ClashReport, EventKind, EventRef, EventRow, Resource,
    ScheduledEvent, TimeWindow,
};
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ---------------------------------------------------------------------------
// Serde-friendly DTOs for crossing the WASM boundary as JSON
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct CheckResultDto<'a> {
    clear: bool,
    clashes: &'a ClashReport,
    summary: String,
}

#[derive(Serialize)]
struct FreeSlotDto {
    start: String,
    end: String,
    duration_minutes: i64,
}

// ---------------------------------------------------------------------------
// Helpers: JSON in, JSON out, errors as plain strings
// ---------------------------------------------------------------------------

fn parse_rows(json: &str, kind: EventKind) -> Result<Vec<ScheduledEvent>, String> {
    let rows: Vec<EventRow> = serde_json::from_str(json)
        .map_err(|e| format!("Invalid {} rows JSON: {}", kind, e))?;
    rows_into_events(rows, kind).map_err(|e| e.to_string())
}

fn parse_date(s: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|e| format!("Invalid date '{}': {}", s, e))
}

/// Lectures then exams, restricted to `date`.
fn same_day(
    lectures_json: &str,
    exams_json: &str,
    date: NaiveDate,
) -> Result<Vec<ScheduledEvent>, String> {
    let mut day = parse_rows(lectures_json, EventKind::Lecture)?;
    day.extend(parse_rows(exams_json, EventKind::Exam)?);
    day.retain(|e| e.date == date);
    Ok(day)
}

fn check_clash_json(
    candidate_json: &str,
    lectures_json: &str,
    exams_json: &str,
    exclude_json: Option<&str>,
) -> Result<String, String> {
    let candidate: Candidate = serde_json::from_str(candidate_json)
        .map_err(|e| format!("Invalid candidate JSON: {}", e))?;
    validate_interval(candidate.start_time, candidate.end_time).map_err(|e| e.to_string())?;

    let exclude: Option<EventRef> = exclude_json
        .map(serde_json::from_str::<EventRef>)
        .transpose()
        .map_err(|e| format!("Invalid exclude JSON: {}", e))?;

    let day = same_day(lectures_json, exams_json, candidate.date)?;
    let report = detect_clashes(&candidate, exclude.as_ref(), &day);

    let dto = CheckResultDto {
        clear: report.is_clear(),
        clashes: &report,
        summary: report.summary(),
    };
    serde_json::to_string(&dto).map_err(|e| format!("Serialization error: {}", e))
}

fn find_free_slots_json(
    lectures_json: &str,
    exams_json: &str,
    resource_json: &str,
    date: &str,
    window_start: &str,
    window_end: &str,
) -> Result<String, String> {
    let resource: Resource = serde_json::from_str(resource_json)
        .map_err(|e| format!("Invalid resource JSON: {}", e))?;
    let date = parse_date(date)?;
    let window = TimeWindow::new(parse_time(window_start)?, parse_time(window_end)?)
        .map_err(|e| e.to_string())?;

    let day = same_day(lectures_json, exams_json, date)?;
    let dtos: Vec<FreeSlotDto> = free_slots_for(&resource, date, window, &day)
        .iter()
        .map(|s| FreeSlotDto {
            start: s.start.format("%H:%M").to_string(),
            end: s.end.format("%H:%M").to_string(),
            duration_minutes: s.duration_minutes,
        })
        .collect();

    serde_json::to_string(&dtos).map_err(|e| format!("Serialization error: {}", e))
}

// ---------------------------------------------------------------------------
// WASM exports
// ---------------------------------------------------------------------------

/// Check a candidate slot against the day's lecture and exam rows.
///
/// - `candidate_json` -- `{date, start_time, end_time, venue_id?, lecturer_id?, course_id?}`
/// - `lectures_json`, `exams_json` -- JSON arrays of stored rows
/// - `exclude_json` -- optional `{kind, id}` of the record being edited
///
/// Returns `{clear, clashes: [{type, with}], summary}`.
#[wasm_bindgen(js_name = "checkClash")]
pub fn check_clash(
    candidate_json: &str,
    lectures_json: &str,
    exams_json: &str,
    exclude_json: Option<String>,
) -> Result<String, JsValue> {
    check_clash_json(candidate_json, lectures_json, exams_json, exclude_json.as_deref())
        .map_err(|e| JsValue::from_str(&e))
}

/// Free slots of one venue or lecturer on `date` between `window_start` and
/// `window_end` (`HH:MM`).
///
/// `resource_json` is `{"type": "venue", "id": "H_01"}` or
/// `{"type": "lecturer", "id": "2407"}`. Returns an array of
/// `{start, end, duration_minutes}`.
#[wasm_bindgen(js_name = "findFreeSlots")]
pub fn find_free_slots(
    lectures_json: &str,
    exams_json: &str,
    resource_json: &str,
    date: &str,
    window_start: &str,
    window_end: &str,
) -> Result<String, JsValue> {
    find_free_slots_json(
        lectures_json,
        exams_json,
        resource_json,
        date,
        window_start,
        window_end,
    )
    .map_err(|e| JsValue::from_str(&e))
}
