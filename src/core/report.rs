use crate::domain::model::{AgeCounts, AgeDistribution, AgeReport};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgeBucket {
    Under20,
    Between20And40,
    Between40And60,
    Over60,
}

impl AgeBucket {
    /// `<20`、`20..=40`、`41..=60`、`>60`
    pub fn classify(age: i32) -> Self {
        match age {
            a if a < 20 => AgeBucket::Under20,
            20..=40 => AgeBucket::Between20And40,
            41..=60 => AgeBucket::Between40And60,
            _ => AgeBucket::Over60,
        }
    }
}

impl AgeCounts {
    pub fn from_ages<I: IntoIterator<Item = i32>>(ages: I) -> Self {
        let mut counts = AgeCounts::default();
        for age in ages {
            counts.total += 1;
            match AgeBucket::classify(age) {
                AgeBucket::Under20 => counts.under_20 += 1,
                AgeBucket::Between20And40 => counts.between_20_40 += 1,
                AgeBucket::Between40And60 => counts.between_40_60 += 1,
                AgeBucket::Over60 => counts.over_60 += 1,
            }
        }
        counts
    }
}

impl AgeReport {
    pub fn from_counts(counts: &AgeCounts) -> Self {
        if counts.total == 0 {
            return AgeReport::NoData;
        }

        let percent = |count: u64| round_2dp(count as f64 * 100.0 / counts.total as f64);
        AgeReport::Distribution(AgeDistribution {
            under_20: percent(counts.under_20),
            between_20_40: percent(counts.between_20_40),
            between_40_60: percent(counts.between_40_60),
            over_60: percent(counts.over_60),
        })
    }
}

pub fn report<I: IntoIterator<Item = i32>>(ages: I) -> AgeReport {
    AgeReport::from_counts(&AgeCounts::from_ages(ages))
}

/// 四捨五入到小數第二位（0.5 遠離零）
fn round_2dp(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
