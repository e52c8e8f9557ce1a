//! Nearest-neighbour face matching.
//!
//! A linear scan over the store. It is sized for tens to low hundreds of
//! identities; larger reference sets need an index this module does not
//! provide.

use crate::error::{MonitorError, MonitorResult};
use crate::store::EncodingStore;
use crate::types::{FaceLabel, FaceObservation, MatchResult};

pub fn euclidean_distance(a: &[f64], b: &[f64]) -> MonitorResult<f64> {
    if a.len() != b.len() {
        return Err(MonitorError::DimensionMismatch {
            expected: a.len(),
            actual: b.len(),
        });
    }
    Ok(a.iter()
        .zip(b)
        .map(|(x, y)| (x - y) * (x - y))
        .sum::<f64>()
        .sqrt())
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceMatcher {
    threshold: f64,
}

impl FaceMatcher {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Resolves an observation to the nearest known label.
    ///
    /// A match needs a distance strictly below the threshold. Equal distances
    /// go to the entry built first. Encodings with non-finite components never
    /// match and report an infinite distance. The returned box is the
    /// observation's, unscaled.
    pub fn match_face(
        &self,
        observation: &FaceObservation,
        store: &EncodingStore,
    ) -> MonitorResult<MatchResult> {
        let mut best: Option<(usize, f64)> = None;
        for (idx, known) in store.all_encodings().iter().enumerate() {
            let d = euclidean_distance(&known.encoding, &observation.encoding)?;
            if d.is_nan() {
                continue;
            }
            if best.map_or(true, |(_, best_d)| d < best_d) {
                best = Some((idx, d));
            }
        }

        let (label, distance) = match best {
            Some((idx, d)) if d < self.threshold => {
                (FaceLabel::Known(store.all_encodings()[idx].label.clone()), d)
            }
            Some((_, d)) => (FaceLabel::Unknown, d),
            None => (FaceLabel::Unknown, f64::INFINITY),
        };

        Ok(MatchResult {
            label,
            distance,
            bounding_box: observation.bounding_box,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EncodeError;
    use crate::store::{FaceEncoder, ReferenceSample};
    use crate::types::{BoundingBox, Encoding};

    struct Fixed(Vec<Encoding>);

    impl FaceEncoder for Fixed {
        fn encode(&mut self, _bytes: &[u8]) -> Result<Vec<Encoding>, EncodeError> {
            Ok(vec![self.0.remove(0)])
        }
    }

    fn store(entries: &[(&str, Encoding)]) -> EncodingStore {
        let mut encoder = Fixed(entries.iter().map(|(_, e)| e.clone()).collect());
        let samples = entries
            .iter()
            .map(|(label, _)| ReferenceSample::new(*label, Vec::new()));
        EncodingStore::build(samples, &mut encoder).unwrap().0
    }

    fn observe(encoding: Encoding) -> FaceObservation {
        FaceObservation {
            encoding,
            bounding_box: BoundingBox::new(1, 2, 3, 4),
        }
    }

    #[test]
    fn stored_encoding_matches_itself() {
        let store = store(&[("alice", vec![0.1, 0.9, 0.3]), ("bob", vec![0.7, 0.2, 0.5])]);
        let matcher = FaceMatcher::new(0.6);
        for known in store.all_encodings() {
            let result = matcher.match_face(&observe(known.encoding.clone()), &store).unwrap();
            assert_eq!(result.label, FaceLabel::Known(known.label.clone()));
            assert_eq!(result.distance, 0.0);
        }
    }

    #[test]
    fn empty_store_is_always_unknown() {
        let matcher = FaceMatcher::new(f64::MAX);
        let result = matcher
            .match_face(&observe(vec![0.0; 128]), &EncodingStore::empty())
            .unwrap();
        assert_eq!(result.label, FaceLabel::Unknown);
        assert!(result.distance.is_infinite());
        assert_eq!(result.bounding_box, BoundingBox::new(1, 2, 3, 4));
    }

    #[test]
    fn distance_equal_to_threshold_is_unknown() {
        let store = store(&[("alice", vec![0.0, 0.0])]);
        let result = FaceMatcher::new(5.0)
            .match_face(&observe(vec![3.0, 4.0]), &store)
            .unwrap();
        assert_eq!(result.distance, 5.0);
        assert_eq!(result.label, FaceLabel::Unknown);
    }

    #[test]
    fn nearest_entry_wins() {
        let store = store(&[("far", vec![1.0, 1.0]), ("near", vec![0.1, 0.0])]);
        let result = FaceMatcher::new(0.6)
            .match_face(&observe(vec![0.0, 0.0]), &store)
            .unwrap();
        assert_eq!(result.label.as_str(), "near");
    }

    #[test]
    fn ties_go_to_earliest_entry() {
        let store = store(&[("first", vec![0.1, 0.0]), ("second", vec![-0.1, 0.0])]);
        let result = FaceMatcher::new(0.6)
            .match_face(&observe(vec![0.0, 0.0]), &store)
            .unwrap();
        assert_eq!(result.label.as_str(), "first");
    }

    // Duplicate labels are not merged: whichever entry is nearest decides,
    // and the label is the same either way.
    #[test]
    fn duplicate_label_matches_through_nearest_entry() {
        let store = store(&[
            ("dana", vec![5.0, 5.0]),
            ("eli", vec![0.5, 0.5]),
            ("dana", vec![0.0, 0.1]),
        ]);
        let result = FaceMatcher::new(0.6)
            .match_face(&observe(vec![0.0, 0.0]), &store)
            .unwrap();
        assert_eq!(result.label.as_str(), "dana");
        assert!((result.distance - 0.1).abs() < 1e-12);
    }

    #[test]
    fn dimension_mismatch_is_an_error_not_unknown() {
        let store = store(&[("alice", vec![0.0, 0.0])]);
        let err = FaceMatcher::new(0.6)
            .match_face(&observe(vec![0.0, 0.0, 0.0]), &store)
            .unwrap_err();
        assert!(matches!(err, MonitorError::DimensionMismatch { .. }));
    }

    #[test]
    fn nan_encoding_is_unknown_at_infinite_distance() {
        let store = store(&[("alice", vec![0.0, 0.0]), ("bob", vec![1.0, 1.0])]);
        let result = FaceMatcher::new(0.6)
            .match_face(&observe(vec![f64::NAN, 0.0]), &store)
            .unwrap();
        assert_eq!(result.label, FaceLabel::Unknown);
        assert_eq!(result.distance, f64::INFINITY);
    }

    #[test]
    fn matching_is_repeatable() {
        let store = store(&[("alice", vec![0.2, 0.2])]);
        let matcher = FaceMatcher::new(0.6);
        let obs = observe(vec![0.25, 0.1]);
        assert_eq!(
            matcher.match_face(&obs, &store).unwrap(),
            matcher.match_face(&obs, &store).unwrap()
        );
    }
}
