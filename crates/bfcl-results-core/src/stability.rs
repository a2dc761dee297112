use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::resolve::RunOutcome;

/// Cross-run classification of one test identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Stability {
    StablePass,
    Flaky,
    StableFail,
}

/// Classify from a pass tally. `observed` must be at least 1; a test
/// seen in a single run is stable by construction.
pub fn classify(passed: u32, observed: u32) -> Stability {
    if passed == observed {
        Stability::StablePass
    } else if passed == 0 {
        Stability::StableFail
    } else {
        Stability::Flaky
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TestTally {
    pub passed: u32,
    pub observed: u32,
}

/// Accumulates per-test pass tallies across runs.
///
/// A test only counts toward runs whose result file contained its
/// identifier; runs where it never executed do not affect its
/// classification.
#[derive(Debug, Default)]
pub struct StabilityTally {
    tallies: BTreeMap<String, BTreeMap<String, TestTally>>,
    runs: BTreeMap<String, BTreeSet<String>>,
}

impl StabilityTally {
    pub fn record_run(&mut self, category: &str, run: &str, outcome: &RunOutcome) {
        self.runs
            .entry(category.to_string())
            .or_default()
            .insert(run.to_string());
        let per_test = self.tallies.entry(category.to_string()).or_default();
        for id in &outcome.passed {
            let t = per_test.entry(id.clone()).or_default();
            t.passed += 1;
            t.observed += 1;
        }
        for id in &outcome.failed {
            per_test.entry(id.clone()).or_default().observed += 1;
        }
    }

    pub fn tally(&self, category: &str, id: &str) -> Option<TestTally> {
        self.tallies.get(category)?.get(id).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.tallies.is_empty()
    }

    /// Classify every observed test identity. Identifier lists come
    /// out lexically sorted (BTreeMap iteration order), so repeated
    /// runs over unchanged input produce identical reports.
    pub fn into_report(self) -> StabilityReport {
        let mut report = StabilityReport::default();
        for (category, per_test) in self.tallies {
            let runs = self
                .runs
                .get(&category)
                .map(|r| r.iter().cloned().collect())
                .unwrap_or_default();
            let mut stats = CategoryStats {
                runs,
                ..CategoryStats::default()
            };
            for (id, tally) in per_test {
                stats.total += 1;
                match classify(tally.passed, tally.observed) {
                    Stability::StablePass => {
                        stats.stable += 1;
                        report.stable.entry(category.clone()).or_default().push(id);
                    }
                    Stability::Flaky => {
                        stats.flaky += 1;
                        report.flaky.entry(category.clone()).or_default().push(id);
                    }
                    Stability::StableFail => {
                        stats.failing += 1;
                        report.failing.entry(category.clone()).or_default().push(id);
                    }
                }
            }
            report.totals.total += stats.total;
            report.totals.stable += stats.stable;
            report.totals.flaky += stats.flaky;
            report.totals.failing += stats.failing;
            report.categories.insert(category, stats);
        }
        report
    }
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct CategoryStats {
    pub runs: Vec<String>,
    pub total: usize,
    pub stable: usize,
    pub flaky: usize,
    pub failing: usize,
}

#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct OverallStats {
    pub total: usize,
    pub stable: usize,
    pub flaky: usize,
    pub failing: usize,
}

#[derive(Debug, Default, Serialize)]
pub struct StabilityReport {
    pub stable: BTreeMap<String, Vec<String>>,
    pub flaky: BTreeMap<String, Vec<String>>,
    pub failing: BTreeMap<String, Vec<String>>,
    pub categories: BTreeMap<String, CategoryStats>,
    pub totals: OverallStats,
}

impl StabilityReport {
    /// Category with the highest flaky share (lexically first on
    /// ties). Integer cross-multiplication avoids float comparison.
    pub fn most_flaky_category(&self) -> Option<&str> {
        Self::max_by_share(&self.categories, |s| s.flaky)
    }

    /// Category with the highest stable-pass share.
    pub fn most_stable_category(&self) -> Option<&str> {
        Self::max_by_share(&self.categories, |s| s.stable)
    }

    fn max_by_share(
        categories: &BTreeMap<String, CategoryStats>,
        count: impl Fn(&CategoryStats) -> usize,
    ) -> Option<&str> {
        let mut best: Option<(&str, usize, usize)> = None;
        for (name, stats) in categories {
            if stats.total == 0 {
                continue;
            }
            let cand = (name.as_str(), count(stats), stats.total);
            match best {
                Some((_, c, t)) if cand.1 * t <= c * cand.2 => {}
                _ => best = Some(cand),
            }
        }
        best.map(|(name, _, _)| name)
    }
}
