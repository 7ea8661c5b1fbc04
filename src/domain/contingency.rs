// 2x2 contingency table and the categorical scores derived from it

/// Counts of predicted-vs-observed binary event outcomes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ContingencyTable {
    pub hits: u64,
    pub misses: u64,
    pub false_alarms: u64,
    pub correct_negatives: u64,
}

impl ContingencyTable {
    pub fn new(hits: u64, misses: u64, false_alarms: u64, correct_negatives: u64) -> Self {
        Self {
            hits,
            misses,
            false_alarms,
            correct_negatives,
        }
    }

    /// Tallies paired event flags. Callers guarantee equal lengths.
    pub fn from_events(predicted: impl IntoIterator<Item = bool>, observed: impl IntoIterator<Item = bool>) -> Self {
        let mut table = Self::default();
        for (p, o) in predicted.into_iter().zip(observed) {
            match (p, o) {
                (true, true) => table.hits += 1,
                (false, true) => table.misses += 1,
                (true, false) => table.false_alarms += 1,
                (false, false) => table.correct_negatives += 1,
            }
        }
        table
    }

    pub fn total(&self) -> u64 {
        self.hits + self.misses + self.false_alarms + self.correct_negatives
    }

    pub fn predicted_events(&self) -> u64 {
        self.hits + self.false_alarms
    }

    pub fn observed_events(&self) -> u64 {
        self.hits + self.misses
    }
}

/// Scores derived from a [`ContingencyTable`]. A zero denominator yields NaN.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CategoricalScores {
    pub heidke: f64,
    pub peirce: f64,
    pub pod: f64,
    pub pofd: f64,
    pub far: f64,
    pub frequency_bias: f64,
    pub proportion_correct: f64,
    pub threat_score: f64,
    pub equitable_threat_score: f64,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 {
        f64::NAN
    } else {
        numerator / denominator
    }
}

pub fn categorical_scores(table: &ContingencyTable) -> CategoricalScores {
    let a = table.hits as f64;
    let b = table.false_alarms as f64;
    let c = table.misses as f64;
    let d = table.correct_negatives as f64;
    let n = a + b + c + d;

    let cross = a * d - b * c;
    let random_hits = ratio((a + b) * (a + c), n);

    CategoricalScores {
        heidke: ratio(2.0 * cross, (a + c) * (c + d) + (a + b) * (b + d)),
        peirce: ratio(cross, (a + c) * (b + d)),
        pod: ratio(a, a + c),
        pofd: ratio(b, b + d),
        far: ratio(b, a + b),
        frequency_bias: ratio(a + b, a + c),
        proportion_correct: ratio(a + d, n),
        threat_score: ratio(a, a + b + c),
        equitable_threat_score: ratio(a - random_hits, a + b + c - random_hits),
    }
}
