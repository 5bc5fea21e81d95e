//! Classification of a pace estimate against the desired pace.
//!
//! Bands are relative to the target:
//!
//! | Pace / target  | Bucket          | Phrase                  |
//! |----------------|-----------------|-------------------------|
//! | < 50 %         | `FarBelow`      | "much faster!"          |
//! | < 70 %         | `Below`         | "faster!"               |
//! | < 90 %         | `SlightlyBelow` | "a little bit faster!"  |
//! | 90 % – 110 %   | `OnTarget`      | "You're on track!"      |
//! | > 110 %        | `SlightlyAbove` | "a little bit slower!"  |
//! | > 130 %        | `Above`         | "slower!"               |
//! | > 150 %        | `FarAbove`      | "much slower!"          |

/// Where the current pace sits relative to the target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PaceBucket {
    FarBelow,
    Below,
    SlightlyBelow,
    OnTarget,
    SlightlyAbove,
    Above,
    FarAbove,
}

impl PaceBucket {
    /// Classify `pace` against `desired`.
    ///
    /// Returns `None` when `desired` is 0 (no target configured).
    ///
    /// ```
    /// use pedometer_service::pace::PaceBucket;
    ///
    /// assert_eq!(PaceBucket::classify(100, 100), Some(PaceBucket::OnTarget));
    /// assert_eq!(PaceBucket::classify(40, 100), Some(PaceBucket::FarBelow));
    /// assert_eq!(PaceBucket::classify(120, 0), None);
    /// ```
    pub fn classify(pace: u32, desired: u32) -> Option<Self> {
        if desired == 0 {
            return None;
        }
        // Compare pace * 100 against desired * percent, exact in integers.
        let p = u64::from(pace) * 100;
        let d = u64::from(desired);

        let bucket = if p < d * 50 {
            Self::FarBelow
        } else if p > d * 150 {
            Self::FarAbove
        } else if p < d * 70 {
            Self::Below
        } else if p > d * 130 {
            Self::Above
        } else if p < d * 90 {
            Self::SlightlyBelow
        } else if p > d * 110 {
            Self::SlightlyAbove
        } else {
            Self::OnTarget
        };
        Some(bucket)
    }

    /// What to tell the walker.
    pub fn phrase(self) -> &'static str {
        match self {
            Self::FarBelow => "much faster!",
            Self::Below => "faster!",
            Self::SlightlyBelow => "a little bit faster!",
            Self::OnTarget => "You're on track!",
            Self::SlightlyAbove => "a little bit slower!",
            Self::Above => "slower!",
            Self::FarAbove => "much slower!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_target_never_classifies() {
        for pace in [0, 1, 60, 120, u32::MAX] {
            assert_eq!(PaceBucket::classify(pace, 0), None);
        }
    }

    #[test]
    fn band_edges() {
        let target = 100;
        assert_eq!(PaceBucket::classify(49, target), Some(PaceBucket::FarBelow));
        assert_eq!(PaceBucket::classify(50, target), Some(PaceBucket::Below));
        assert_eq!(PaceBucket::classify(69, target), Some(PaceBucket::Below));
        assert_eq!(PaceBucket::classify(70, target), Some(PaceBucket::SlightlyBelow));
        assert_eq!(PaceBucket::classify(89, target), Some(PaceBucket::SlightlyBelow));
        assert_eq!(PaceBucket::classify(90, target), Some(PaceBucket::OnTarget));
        assert_eq!(PaceBucket::classify(110, target), Some(PaceBucket::OnTarget));
        assert_eq!(PaceBucket::classify(111, target), Some(PaceBucket::SlightlyAbove));
        assert_eq!(PaceBucket::classify(131, target), Some(PaceBucket::Above));
        assert_eq!(PaceBucket::classify(150, target), Some(PaceBucket::Above));
        assert_eq!(PaceBucket::classify(151, target), Some(PaceBucket::FarAbove));
    }

    #[test]
    fn stopped_walker_is_far_below() {
        assert_eq!(PaceBucket::classify(0, 90), Some(PaceBucket::FarBelow));
    }

    #[test]
    fn large_values_do_not_overflow() {
        assert_eq!(
            PaceBucket::classify(u32::MAX, u32::MAX),
            Some(PaceBucket::OnTarget)
        );
    }

    #[test]
    fn every_bucket_has_a_phrase() {
        let all = [
            PaceBucket::FarBelow,
            PaceBucket::Below,
            PaceBucket::SlightlyBelow,
            PaceBucket::OnTarget,
            PaceBucket::SlightlyAbove,
            PaceBucket::Above,
            PaceBucket::FarAbove,
        ];
        for bucket in all {
            assert!(!bucket.phrase().is_empty());
        }
        assert_eq!(PaceBucket::Below.phrase(), "faster!");
    }
}
