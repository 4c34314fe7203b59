use crate::scoring::{ScalingParameterStore, StudentScore, SubjectCategory};
use std::io::Cursor;

pub(super) const PARAMETERS: &str = "Subject,Type,a,k\n\
English,General,0.0611,-3.38\n\
Mathematical Methods,General,0.0662,-3.24\n\
Unscaled Studies,General,,\n\
Essential English,Applied,,\n\
Certificate III,VET,,\n";

pub(super) const GRADES: &str = "Subject,Result,Scaled Score\n\
Essential English,A,58.2\n\
Essential English,B,47.5\n\
Essential English,C,36.9\n\
Essential English,D,24.1\n\
Essential English,E,12\n\
Certificate III,PASS,58.3\n";

pub(super) fn fixture_store() -> ScalingParameterStore {
    ScalingParameterStore::from_readers(Cursor::new(PARAMETERS), Cursor::new(GRADES))
        .expect("fixture tables parse")
}

pub(super) fn general(score: f64) -> StudentScore {
    StudentScore::point(SubjectCategory::General, score)
}

pub(super) fn applied(score: f64) -> StudentScore {
    StudentScore::point(SubjectCategory::Applied, score)
}

pub(super) fn vet(score: f64) -> StudentScore {
    StudentScore::point(SubjectCategory::Vet, score)
}
