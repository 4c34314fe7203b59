use atar_calc::cohort::{
    write_cohort_csv, CohortImporter, CohortPipeline, RangeMode, StudentRecord, SubjectResult,
};
use atar_calc::format::to_fixed;
use atar_calc::scoring::{
    calculate_scaled_score, Atar, RawResult, ScalingParameterStore, SubjectCategory, TeScore,
    Variation,
};

fn reference_store() -> ScalingParameterStore {
    ScalingParameterStore::reference().expect("reference tables load")
}

fn five_general_student(name: &str) -> StudentRecord {
    StudentRecord {
        student: name.to_string(),
        results: vec![
            SubjectResult::new("English", 85.0),
            SubjectResult::new("Mathematical Methods", 78.0),
            SubjectResult::new("Chemistry", 81.0),
            SubjectResult::new("Physics", 74.0),
            SubjectResult::new("Biology", 70.0),
            SubjectResult::new("Essential English", "B"),
        ],
    }
}

fn scaled(store: &ScalingParameterStore, subject: &str, raw: f64) -> f64 {
    calculate_scaled_score(store, subject, &RawResult::Number(raw)).expect("subject scales")
}

#[test]
fn point_mode_matches_the_best_five_general_subjects() {
    let store = reference_store();
    let pipeline = CohortPipeline::new(&store, RangeMode::Point);

    let outcome = pipeline.evaluate_student(&five_general_student("Mia Chen"));

    let mut general = [
        scaled(&store, "English", 85.0),
        scaled(&store, "Mathematical Methods", 78.0),
        scaled(&store, "Chemistry", 81.0),
        scaled(&store, "Physics", 74.0),
        scaled(&store, "Biology", 70.0),
    ];
    general.sort_by(|left, right| right.total_cmp(left));
    let top5: f64 = general.iter().sum();
    let top4_plus_applied: f64 = general.iter().take(4).sum::<f64>() + 47.5;
    let expected = top5.max(top4_plus_applied);

    assert_eq!(outcome.te.te.to_string(), to_fixed(expected, 1));
    assert_eq!(outcome.te.lower_te, outcome.te.te);
    assert_eq!(outcome.te.upper_te, outcome.te.te);
    assert!(outcome.atar.value().is_some());
    assert!(outcome.atar_range.is_none());
    assert_eq!(outcome.counted_subjects(), 6);
}

#[test]
fn failed_subjects_are_excluded_from_eligibility_and_sums() {
    let store = reference_store();
    let pipeline = CohortPipeline::new(&store, RangeMode::Point);

    let mut record = five_general_student("Noah Patel");
    record.results[0] = SubjectResult::new("English", 105.0);
    let outcome = pipeline.evaluate_student(&record);

    assert_eq!(outcome.counted_subjects(), 5);
    assert_eq!(outcome.excluded_subjects(), 1);
    assert_eq!(
        outcome.errors(),
        vec!["English: General subject scores must be between 0 and 100".to_string()]
    );
    assert!(outcome.te.te.is_eligible(), "four General plus one Applied");

    let ineligible = StudentRecord {
        student: "Ava Brown".to_string(),
        results: vec![
            SubjectResult::new("English", 80.0),
            SubjectResult::new("Chemistry", 80.0),
            SubjectResult::new("Physics", 80.0),
            SubjectResult::new("Biology", 80.0),
            SubjectResult::new("Astrology", 99.0),
        ],
    };
    let outcome = pipeline.evaluate_student(&ineligible);
    assert_eq!(outcome.te.te, TeScore::Ineligible);
    assert_eq!(outcome.atar, Atar::Ineligible);
    assert_eq!(
        outcome.errors(),
        vec!["Astrology: No parameters found for subject: Astrology".to_string()]
    );
}

#[test]
fn variation_widens_general_results_only() {
    let store = reference_store();
    let pipeline = CohortPipeline::new(&store, RangeMode::Variation(Variation::new(5.0)));

    let mut record = five_general_student("Leo Martin");
    record.results[4] = SubjectResult::new("Biology", 98.0);
    let outcome = pipeline.evaluate_student(&record);

    let biology = &outcome.subjects[4];
    assert_eq!(biology.lower_result, RawResult::Number(93.0));
    assert_eq!(biology.upper_result, RawResult::Number(100.0));

    let essential = &outcome.subjects[5];
    assert_eq!(essential.category, Some(SubjectCategory::Applied));
    assert_eq!(essential.lower_result, RawResult::Text("B".to_string()));
    assert_eq!(essential.upper_result, RawResult::Text("B".to_string()));
    assert_eq!(essential.lower_scaled_score, essential.upper_scaled_score);

    let range = outcome.atar_range.expect("range mode reports a range");
    assert!(range.is_ok());
    let lower = range.lower_atar.expect("lower atar");
    let nominal = range.nominal_atar.expect("nominal atar");
    let upper = range.upper_atar.expect("upper atar");
    assert!(lower <= nominal && nominal <= upper);
}

#[test]
fn zero_variation_is_a_point_estimate() {
    assert_eq!(
        RangeMode::from_variation(Variation::new(0.0)),
        RangeMode::Point
    );
}

#[test]
fn manual_ranges_are_kept_ordered() {
    let store = reference_store();
    let pipeline = CohortPipeline::new(&store, RangeMode::Manual);

    let record = StudentRecord {
        student: "Isla Wood".to_string(),
        results: vec![
            SubjectResult::new("English", 80.0).with_range(90.0, "not a mark"),
            SubjectResult::new("Essential English", "C").with_range("a", "b"),
        ],
    };
    let outcome = pipeline.evaluate_student(&record);

    let english = &outcome.subjects[0];
    assert_eq!(english.lower_result, RawResult::Text("80".to_string()));
    assert_eq!(english.raw_result, RawResult::Text("80".to_string()));
    assert_eq!(english.upper_result, RawResult::Text("80".to_string()));

    let essential = &outcome.subjects[1];
    assert_eq!(essential.lower_result, RawResult::Text("C".to_string()));
    assert_eq!(essential.upper_result, RawResult::Text("B".to_string()));
    assert!(essential.is_counted());
}

fn four_general_with_certificate(name: &str) -> StudentRecord {
    StudentRecord {
        student: name.to_string(),
        results: vec![
            SubjectResult::new("English", 85.0),
            SubjectResult::new("Mathematical Methods", 78.0),
            SubjectResult::new("Chemistry", 81.0),
            SubjectResult::new("Physics", 74.0),
            SubjectResult::new("Certificate III", "Pass").with_range("Fail", "Pass"),
        ],
    }
}

#[test]
fn manual_mode_ignores_vet_bounds() {
    let store = reference_store();
    let record = four_general_with_certificate("Ruby Hall");

    let point = CohortPipeline::new(&store, RangeMode::Point).evaluate_student(&record);
    let manual = CohortPipeline::new(&store, RangeMode::Manual).evaluate_student(&record);

    assert!(point.te.te.is_eligible());
    assert_eq!(manual.te.te, point.te.te);
    assert_eq!(manual.te.lower_te, point.te.te);
    assert_eq!(manual.atar, point.atar);
    assert!(manual.errors().is_empty());

    let certificate = &manual.subjects[4];
    assert_eq!(certificate.lower_result, RawResult::Text("Pass".to_string()));
    assert_eq!(certificate.upper_result, RawResult::Text("Pass".to_string()));
    assert!(manual.atar_range.expect("range computed").is_ok());
}

#[test]
fn unparsable_manual_bounds_fall_back_to_the_result() {
    let store = reference_store();
    let pipeline = CohortPipeline::new(&store, RangeMode::Manual);

    let record = StudentRecord {
        student: "Finn Cole".to_string(),
        results: vec![
            SubjectResult::new("English", 70.0).with_range(65.0, 120.0),
            SubjectResult::new("Essential English", "B").with_range("Z", "A"),
        ],
    };
    let outcome = pipeline.evaluate_student(&record);

    let english = &outcome.subjects[0];
    assert_eq!(english.lower_result, RawResult::Text("65".to_string()));
    assert_eq!(english.upper_result, RawResult::Text("70".to_string()));

    let essential = &outcome.subjects[1];
    assert_eq!(essential.lower_result, RawResult::Text("B".to_string()));
    assert_eq!(essential.upper_result, RawResult::Text("A".to_string()));
    assert_eq!(outcome.excluded_subjects(), 0);
}

#[test]
fn cohort_report_is_ordered_and_summarised() {
    let store = reference_store();
    let pipeline = CohortPipeline::new(&store, RangeMode::Point);

    let students = vec![
        five_general_student("Mia Chen"),
        StudentRecord {
            student: "Sam Lee".to_string(),
            results: vec![SubjectResult::new("English", 60.0)],
        },
        five_general_student("Olivia King"),
    ];
    let report = pipeline.evaluate_cohort(&students);

    let names: Vec<&str> = report
        .students
        .iter()
        .map(|outcome| outcome.student.as_str())
        .collect();
    assert_eq!(names, vec!["Mia Chen", "Sam Lee", "Olivia King"]);

    assert_eq!(report.summary.students, 3);
    assert_eq!(report.summary.eligible, 2);
    assert_eq!(report.summary.ineligible, 1);
    assert_eq!(report.summary.highest_atar, report.summary.lowest_atar);
    let banded: usize = report
        .summary
        .atar_bands
        .iter()
        .map(|band| band.students)
        .sum();
    assert_eq!(banded, 2);

    let english = report
        .subjects
        .iter()
        .find(|subject| subject.subject == "English")
        .expect("english summarised");
    assert_eq!(english.results, 3);
    assert_eq!(english.errors, 0);
    assert_eq!(english.category, Some(SubjectCategory::General));
}

#[test]
fn evaluation_is_deterministic() {
    let store = reference_store();
    let pipeline = CohortPipeline::new(&store, RangeMode::Variation(Variation::new(3.0)));
    let students = vec![five_general_student("Mia Chen"), five_general_student("Ella Ross")];

    let first = pipeline.evaluate_cohort(&students);
    let second = pipeline.evaluate_cohort(&students);

    assert_eq!(first.students, second.students);
    assert_eq!(first.summary, second.summary);
}

#[test]
fn imported_cohort_exports_one_row_per_student() {
    let csv = "Student,Subject,Result,Lower,Upper\n\
Mia Chen,English,85,,\n\
Mia Chen,Mathematical Methods,78,,\n\
Mia Chen,Chemistry,81,,\n\
Mia Chen,Physics,74,,\n\
Mia Chen,Biology,70,,\n\
Sam Lee,English,60,,\n";
    let students = CohortImporter::from_reader(csv.as_bytes()).expect("import succeeds");
    let store = reference_store();

    let point = CohortPipeline::new(&store, RangeMode::Point).evaluate_cohort(&students);
    let mut buffer = Vec::new();
    write_cohort_csv(&mut buffer, &point).expect("export succeeds");
    let text = String::from_utf8(buffer).expect("utf-8 export");
    let rows: Vec<&str> = text.lines().collect();

    assert_eq!(rows.len(), 3);
    assert!(rows[1].starts_with("Mia Chen,"));
    assert!(rows[1].ends_with(",,,5,0,"), "range columns empty: {}", rows[1]);
    assert_eq!(rows[2], "Sam Lee,ATAR Ineligible,ATAR Ineligible,,,,1,0,");

    let ranged = CohortPipeline::new(&store, RangeMode::Variation(Variation::new(5.0)))
        .evaluate_cohort(&students);
    let mut buffer = Vec::new();
    write_cohort_csv(&mut buffer, &ranged).expect("export succeeds");
    let text = String::from_utf8(buffer).expect("utf-8 export");
    let mia = text.lines().nth(1).expect("first student row");
    let range = ranged.students[0]
        .atar_range
        .as_ref()
        .expect("range computed");
    assert!(mia.contains(&range.display_string));
}
