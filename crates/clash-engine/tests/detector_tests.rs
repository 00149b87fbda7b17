//! Tests for the clash detector against an in-memory store.

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveTime};
use clash_engine::{
    Candidate, ClashDetector, ClashError, ClashType, EventDetail, EventKind, EventRef,
    EventStore, ExamCategory, ExamStatus, InMemoryEventStore, ScheduledEvent, StoreError,
};

// ── Helpers ─────────────────────────────────────────────────────────────────

fn date(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, day).unwrap()
}

fn time(hour: u32, min: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(hour, min, 0).unwrap()
}

fn slot(day: u32, start: (u32, u32), end: (u32, u32)) -> Candidate {
    Candidate::new(date(day), time(start.0, start.1), time(end.0, end.1))
}

fn exam() -> EventDetail {
    EventDetail::Exam {
        exam_category: ExamCategory::Final,
        exam_status: ExamStatus::Proper,
    }
}

/// Store holding one lecture on 2024-05-01 09:00-10:00 in H_01 by 2407.
fn store_with_lecture() -> (InMemoryEventStore, ScheduledEvent) {
    let store = InMemoryEventStore::new();
    let lecture = store
        .insert_unchecked(
            slot(1, (9, 0), (10, 0))
                .with_venue("H_01")
                .with_lecturer("2407")
                .with_course("CS101"),
            EventDetail::Lecture,
        )
        .unwrap();
    (store, lecture)
}

/// Store whose fetches always fail.
struct OfflineStore;

#[async_trait]
impl EventStore for OfflineStore {
    async fn fetch_events_on_date(
        &self,
        _kind: EventKind,
        _date: NaiveDate,
    ) -> Result<Vec<ScheduledEvent>, StoreError> {
        Err(StoreError::Unavailable("connection refused".to_string()))
    }
}

/// Store whose lecture fetch works but whose exam fetch fails.
struct ExamQueryFails(InMemoryEventStore);

#[async_trait]
impl EventStore for ExamQueryFails {
    async fn fetch_events_on_date(
        &self,
        kind: EventKind,
        date: NaiveDate,
    ) -> Result<Vec<ScheduledEvent>, StoreError> {
        match kind {
            EventKind::Lecture => self.0.fetch_events_on_date(kind, date).await,
            EventKind::Exam => Err(StoreError::Query("relation \"exam\" does not exist".to_string())),
        }
    }
}

// ── Clash dimensions ────────────────────────────────────────────────────────

#[tokio::test]
async fn venue_clash_detected() {
    let (store, lecture) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let candidate = slot(1, (9, 30), (10, 30)).with_venue("H_01").with_lecturer("9999");
    let report = detector.check(&candidate, None).await.unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.clashes()[0].clash_type, ClashType::Venue);
    assert_eq!(report.clashes()[0].with, lecture);
}

#[tokio::test]
async fn lecturer_clash_detected() {
    let (store, lecture) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let candidate = slot(1, (9, 30), (10, 30)).with_venue("H_02").with_lecturer("2407");
    let report = detector.check(&candidate, None).await.unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.clashes()[0].clash_type, ClashType::Lecturer);
    assert_eq!(report.clashes()[0].with, lecture);
}

#[tokio::test]
async fn double_clash_reports_both_dimensions_for_same_event() {
    let (store, lecture) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let candidate = slot(1, (9, 30), (10, 30)).with_venue("H_01").with_lecturer("2407");
    let report = detector.check(&candidate, None).await.unwrap();

    assert_eq!(report.len(), 2, "one entry per matching dimension");
    assert_eq!(report.clashes()[0].clash_type, ClashType::Venue);
    assert_eq!(report.clashes()[1].clash_type, ClashType::Lecturer);
    assert!(report.iter().all(|c| c.with == lecture));
}

#[tokio::test]
async fn existing_exam_clashes_with_candidate_lecture() {
    let store = InMemoryEventStore::new();
    let stored_exam = store
        .insert_unchecked(slot(1, (13, 0), (16, 0)).with_venue("EXAM_HALL"), exam())
        .unwrap();
    let detector = ClashDetector::new(store);

    let candidate = slot(1, (14, 0), (15, 0)).with_venue("EXAM_HALL");
    let report = detector.check(&candidate, None).await.unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.clashes()[0].with.kind(), EventKind::Exam);
    assert_eq!(report.clashes()[0].with, stored_exam);
}

#[tokio::test]
async fn course_alone_never_clashes() {
    let (store, _) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let candidate = slot(1, (9, 0), (10, 0))
        .with_venue("H_02")
        .with_lecturer("1111")
        .with_course("CS101");
    let report = detector.check(&candidate, None).await.unwrap();

    assert!(report.is_clear(), "same course elsewhere by someone else is allowed");
}

// ── No-clash cases ──────────────────────────────────────────────────────────

#[tokio::test]
async fn back_to_back_same_venue_is_clear() {
    let (store, _) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let candidate = slot(1, (10, 0), (11, 0)).with_venue("H_01").with_lecturer("2407");
    let report = detector.check(&candidate, None).await.unwrap();

    assert!(report.is_clear());
}

#[tokio::test]
async fn different_date_is_clear() {
    let (store, _) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let candidate = slot(2, (9, 0), (10, 0)).with_venue("H_01").with_lecturer("2407");
    let report = detector.check(&candidate, None).await.unwrap();

    assert!(report.is_clear());
}

#[tokio::test]
async fn unassigned_venues_never_match() {
    let store = InMemoryEventStore::new();
    store
        .insert_unchecked(slot(1, (9, 0), (10, 0)), EventDetail::Lecture)
        .unwrap();
    store
        .insert_unchecked(
            slot(1, (9, 0), (10, 0)).with_venue(""),
            EventDetail::Lecture,
        )
        .unwrap();
    let detector = ClashDetector::new(store);

    let report = detector.check(&slot(1, (9, 0), (10, 0)), None).await.unwrap();
    assert!(report.is_clear(), "null venue must not clash with null venue");

    let blank = slot(1, (9, 0), (10, 0)).with_venue("").with_lecturer("");
    let report = detector.check(&blank, None).await.unwrap();
    assert!(report.is_clear(), "blank ids count as unassigned");
}

#[tokio::test]
async fn inverted_stored_interval_is_compared_as_stored() {
    let store = InMemoryEventStore::new();
    let broken = store
        .insert_unchecked(
            slot(1, (11, 0), (9, 0)).with_venue("H_01"),
            EventDetail::Lecture,
        )
        .unwrap();
    let detector = ClashDetector::new(store.clone());

    // 09:30 < 09:00 fails, so the row is not overlapping.
    let report = detector
        .check(&slot(1, (9, 30), (10, 30)).with_venue("H_01"), None)
        .await
        .unwrap();
    assert!(report.is_clear(), "11:00-09:00 does not overlap 09:30-10:30");

    // 10:00-09:45 satisfies both halves of the predicate for 09:30-10:30.
    let mut shifted = broken.clone();
    shifted.start_time = time(10, 0);
    shifted.end_time = time(9, 45);
    store.update_unchecked(shifted).unwrap();

    let report = detector
        .check(&slot(1, (9, 30), (10, 30)).with_venue("H_01"), None)
        .await
        .unwrap();
    assert_eq!(report.len(), 1);
    assert_eq!(report.clashes()[0].clash_type, ClashType::Venue);
    assert_eq!(report.clashes()[0].with.id, broken.id);
}

#[tokio::test]
async fn venue_ids_compare_exactly() {
    let (store, _) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let padded = slot(1, (9, 30), (10, 30)).with_venue(" H_01 ").with_lecturer("2407 ");
    let report = detector.check(&padded, None).await.unwrap();
    assert!(report.is_clear(), "ids are not trimmed before comparison");

    detector
        .store()
        .insert_unchecked(slot(1, (11, 0), (12, 0)).with_venue("   "), EventDetail::Lecture)
        .unwrap();
    let spaces = slot(1, (11, 0), (11, 30)).with_venue("   ");
    let report = detector.check(&spaces, None).await.unwrap();
    assert_eq!(report.len(), 1, "a whitespace-only venue is still an id");
}

// ── Exclusion ───────────────────────────────────────────────────────────────

#[tokio::test]
async fn editing_event_does_not_clash_with_itself() {
    let (store, lecture) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let candidate = Candidate::from(&lecture);
    let report = detector
        .check(&candidate, Some(&lecture.event_ref()))
        .await
        .unwrap();
    assert!(report.is_clear());

    // Without the exclusion the stored record is an ordinary clash.
    let report = detector.check(&candidate, None).await.unwrap();
    assert_eq!(report.len(), 2);
}

#[tokio::test]
async fn exclusion_matches_kind_as_well_as_id() {
    let store = InMemoryEventStore::new();
    let lecture = store
        .insert_unchecked(slot(1, (9, 0), (10, 0)).with_venue("H_01"), EventDetail::Lecture)
        .unwrap();
    let stored_exam = store
        .insert_unchecked(slot(1, (9, 0), (10, 0)).with_venue("H_01"), exam())
        .unwrap();
    assert_eq!(lecture.id, stored_exam.id, "ids are per collection");
    let detector = ClashDetector::new(store);

    let report = detector
        .check(&Candidate::from(&lecture), Some(&lecture.event_ref()))
        .await
        .unwrap();

    assert_eq!(report.len(), 1, "exam with the same id is a different event");
    assert_eq!(report.clashes()[0].with, stored_exam);
}

#[tokio::test]
async fn edited_event_still_clashes_with_others() {
    let (store, lecture) = store_with_lecture();
    let other = store
        .insert_unchecked(slot(1, (11, 0), (12, 0)).with_venue("H_01"), EventDetail::Lecture)
        .unwrap();
    let detector = ClashDetector::new(store);

    let mut moved = lecture.clone();
    moved.start_time = time(11, 30);
    moved.end_time = time(12, 30);
    let report = detector
        .check(&Candidate::from(&moved), Some(&EventRef::new(EventKind::Lecture, lecture.id.clone())))
        .await
        .unwrap();

    assert_eq!(report.len(), 1);
    assert_eq!(report.clashes()[0].with, other);
}

// ── Ordering and idempotence ────────────────────────────────────────────────

#[tokio::test]
async fn report_lists_lectures_before_exams_in_store_order() {
    let store = InMemoryEventStore::new();
    let e1 = store
        .insert_unchecked(slot(1, (9, 0), (12, 0)).with_venue("H_01"), exam())
        .unwrap();
    let l1 = store
        .insert_unchecked(slot(1, (10, 0), (11, 0)).with_venue("H_01"), EventDetail::Lecture)
        .unwrap();
    let l2 = store
        .insert_unchecked(slot(1, (8, 0), (9, 30)).with_venue("H_01"), EventDetail::Lecture)
        .unwrap();
    let detector = ClashDetector::new(store);

    let report = detector
        .check(&slot(1, (8, 0), (12, 0)).with_venue("H_01"), None)
        .await
        .unwrap();

    let order: Vec<&ScheduledEvent> = report.iter().map(|c| &c.with).collect();
    assert_eq!(order, vec![&l1, &l2, &e1]);
}

#[tokio::test]
async fn repeated_checks_give_identical_reports() {
    let (store, _) = store_with_lecture();
    let detector = ClashDetector::new(store.clone());
    let candidate = slot(1, (9, 30), (10, 30)).with_venue("H_01").with_lecturer("2407");

    let first = detector.check(&candidate, None).await.unwrap();
    let second = detector.check(&candidate, None).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(store.count(EventKind::Lecture).unwrap(), 1, "check never writes");
}

#[tokio::test]
async fn each_check_sees_current_store_state() {
    let (store, lecture) = store_with_lecture();
    let detector = ClashDetector::new(store.clone());
    let candidate = slot(1, (9, 30), (10, 30)).with_venue("H_01");

    assert_eq!(detector.check(&candidate, None).await.unwrap().len(), 1);
    store.remove(&lecture.event_ref()).unwrap();
    assert!(detector.check(&candidate, None).await.unwrap().is_clear());
}

// ── Errors ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn inverted_interval_rejected() {
    let detector = ClashDetector::new(OfflineStore);

    let err = detector
        .check(&slot(1, (10, 0), (9, 0)), None)
        .await
        .unwrap_err();

    assert!(
        matches!(err, ClashError::InvalidInterval { .. }),
        "interval is validated before the store is touched, got {err:?}"
    );
}

#[tokio::test]
async fn zero_length_interval_rejected() {
    let (store, _) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let err = detector
        .check(&slot(1, (9, 0), (9, 0)), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ClashError::InvalidInterval { .. }));
}

#[tokio::test]
async fn store_failure_is_an_error_not_an_empty_report() {
    let detector = ClashDetector::new(OfflineStore);

    let err = detector
        .check(&slot(1, (9, 0), (10, 0)).with_venue("H_01"), None)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        ClashError::StoreUnavailable(StoreError::Unavailable(_))
    ));
}

#[tokio::test]
async fn failure_of_one_collection_fails_the_check() {
    let (store, _) = store_with_lecture();
    let detector = ClashDetector::new(ExamQueryFails(store));

    let err = detector
        .check(&slot(1, (11, 0), (12, 0)).with_venue("H_01"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, ClashError::StoreUnavailable(StoreError::Query(_))));
}

#[tokio::test]
async fn offline_in_memory_store_fails_the_check() {
    let (store, _) = store_with_lecture();
    store.set_available(false);
    let detector = ClashDetector::new(store.clone());

    let result = detector
        .check(&slot(1, (9, 0), (10, 0)).with_venue("H_01"), None)
        .await;
    assert!(matches!(result, Err(ClashError::StoreUnavailable(_))));

    store.set_available(true);
    let report = detector
        .check(&slot(1, (9, 0), (10, 0)).with_venue("H_01"), None)
        .await
        .unwrap();
    assert_eq!(report.len(), 1);
}

#[tokio::test]
async fn detector_works_through_shared_store() {
    let (store, _) = store_with_lecture();
    let shared: std::sync::Arc<dyn EventStore> = std::sync::Arc::new(store);
    let detector = ClashDetector::new(shared);

    let report = detector
        .check(&slot(1, (9, 30), (10, 30)).with_lecturer("2407"), None)
        .await
        .unwrap();

    assert_eq!(report.len(), 1);
}

// ── Report presentation ─────────────────────────────────────────────────────

#[tokio::test]
async fn summary_groups_by_clash_type() {
    let (store, _) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let report = detector
        .check(&slot(1, (9, 30), (10, 30)).with_venue("H_01").with_lecturer("2407"), None)
        .await
        .unwrap();
    let summary = report.summary();

    let venue_at = summary.find("Venue already booked").unwrap();
    let lecturer_at = summary.find("Lecturer already busy").unwrap();
    assert!(venue_at < lecturer_at);
    assert!(summary.contains("lecture #1 on 2024-05-01 09:00-10:00 course CS101 in H_01 by 2407"));
    assert_eq!(report.of_type(ClashType::Venue).count(), 1);
}

#[tokio::test]
async fn report_serializes_type_and_with() {
    let (store, _) = store_with_lecture();
    let detector = ClashDetector::new(store);

    let report = detector
        .check(&slot(1, (9, 30), (10, 30)).with_venue("H_01"), None)
        .await
        .unwrap();
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json[0]["type"], "VENUE");
    assert_eq!(json[0]["with"]["venue_id"], "H_01");
    assert_eq!(json[0]["with"]["kind"], "lecture");
    assert_eq!(json[0]["with"]["start_time"], "09:00:00");
}
