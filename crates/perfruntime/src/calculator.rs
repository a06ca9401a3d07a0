use chrono::{DateTime, Utc};
use perfcore::{
    latest, Activity, Block, BranchPath, CalculationError, Cumulative, CumulativePerformance,
    ElementPerformance, ElementPerformanceEntry, FlowElement, Member, Performance,
    PerformanceTriple, ProcessPerformance, Settings, TotalPerformance,
};

type Entries = Vec<ElementPerformanceEntry>;

/// Aggregates time and cost over an ordered process.
///
/// Each composition level combines the already aggregated triples of its
/// members with the law of that level only: sums for sequences, the slowest
/// path for parallel blocks, probability weighting for exclusive blocks and
/// geometric repetition for loops. Minimum and maximum are therefore bounds
/// per level, not a global critical path.
pub struct PerformanceCalculator<'s> {
    settings: &'s Settings,
}

#[derive(Debug, Default, Clone, Copy)]
struct Outcome {
    performance: Performance,
    start_date: Option<DateTime<Utc>>,
}

/// The raw values an element contributes before settings are applied
struct Measured {
    duration: Option<f64>,
    cost: Option<f64>,
    start: Option<DateTime<Utc>>,
    end: Option<DateTime<Utc>>,
}

struct PathRun {
    performance: Performance,
    start_date: Option<DateTime<Utc>>,
    end_date: Option<DateTime<Utc>>,
}

impl<'s> PerformanceCalculator<'s> {
    pub fn new(settings: &'s Settings) -> Self {
        Self { settings }
    }

    pub fn calculate(
        &self,
        process_id: &str,
        ordered: &[Member],
        mut cumulative: Cumulative,
    ) -> Result<ProcessPerformance, CalculationError> {
        let mut entries = Vec::new();
        let outcome = self.sequence(process_id, ordered, &mut cumulative, &mut entries)?;
        tracing::debug!(
            process = %process_id,
            elements = entries.len(),
            duration = outcome.performance.duration.average,
            cost = outcome.performance.cost.average,
            "Calculated process performance"
        );

        Ok(ProcessPerformance {
            element_performance_array: entries,
            total_performance: TotalPerformance {
                duration: outcome.performance.duration,
                cost: outcome.performance.cost,
                start_date: outcome.start_date,
                end_date: cumulative.last_end_date.filter(|_| self.settings.dates()),
            },
        })
    }

    /// Walk members left to right; the total is the member-wise sum of triples
    fn sequence(
        &self,
        parent_id: &str,
        members: &[Member],
        cumulative: &mut Cumulative,
        entries: &mut Entries,
    ) -> Result<Outcome, CalculationError> {
        let mut total = Outcome::default();
        for member in members {
            let outcome = match member {
                Member::Element(element) => {
                    if element.is_sequence_flow()
                        && !self.settings.consider_performance_in_sequence_flows
                    {
                        continue;
                    }
                    let measured = Measured {
                        duration: element.duration,
                        cost: element.cost,
                        start: element.start,
                        end: element.end,
                    };
                    self.single(parent_id, element, measured, cumulative, entries)
                }
                Member::Activity(activity) => {
                    self.activity(parent_id, activity, cumulative, entries)?
                }
                Member::Block(block) => self.block(parent_id, block, cumulative, entries)?,
            };
            total.performance += outcome.performance;
            total.start_date = total.start_date.or(outcome.start_date);
        }
        Ok(total)
    }

    fn single(
        &self,
        parent_id: &str,
        element: &FlowElement,
        measured: Measured,
        cumulative: &mut Cumulative,
        entries: &mut Entries,
    ) -> Outcome {
        let duration = if self.settings.time() {
            measured.duration.unwrap_or(0.0)
        } else {
            0.0
        };
        let cost = if self.settings.cost() {
            measured.cost.unwrap_or(0.0)
        } else {
            0.0
        };
        let (start_date, end_date) = if self.settings.dates() {
            let start = measured.start.or(cumulative.last_end_date);
            let end = measured
                .end
                .or_else(|| start.and_then(|s| shift(s, duration)));
            (start, end)
        } else {
            (None, None)
        };

        cumulative.advance(duration, cost, end_date);
        tracing::trace!(element = %element.id, duration, cost, "Element performance");
        entries.push(entry(
            parent_id,
            element,
            ElementPerformance {
                duration,
                cost,
                start_date,
                end_date,
            },
            cumulative,
        ));

        Outcome {
            performance: Performance::fixed(duration, cost),
            start_date,
        }
    }

    fn activity(
        &self,
        parent_id: &str,
        activity: &Activity,
        cumulative: &mut Cumulative,
        entries: &mut Entries,
    ) -> Result<Outcome, CalculationError> {
        let element = &activity.element;
        let nested = match &activity.nested {
            Some(nested) if !self.settings.overwrite_with_parent_performance => nested,
            _ => {
                let parent = element.parent.clone().unwrap_or_default();
                let measured = Measured {
                    duration: Some(parent.duration),
                    cost: Some(parent.cost),
                    start: parent.start,
                    end: parent.end,
                };
                return Ok(self.single(parent_id, element, measured, cumulative, entries));
            }
        };

        let entered_at = cumulative.last_end_date;
        let mut nested_entries = Vec::new();
        let outcome = self.sequence(
            &nested.process_id,
            &nested.members,
            cumulative,
            &mut nested_entries,
        )?;

        let (start_date, end_date) = if self.settings.dates() {
            (outcome.start_date.or(entered_at), cumulative.last_end_date)
        } else {
            (None, None)
        };
        entries.push(entry(
            parent_id,
            element,
            ElementPerformance {
                duration: outcome.performance.duration.average,
                cost: outcome.performance.cost.average,
                start_date,
                end_date,
            },
            cumulative,
        ));
        entries.extend(nested_entries);

        Ok(Outcome {
            performance: outcome.performance,
            start_date,
        })
    }

    fn block(
        &self,
        parent_id: &str,
        block: &Block,
        cumulative: &mut Cumulative,
        entries: &mut Entries,
    ) -> Result<Outcome, CalculationError> {
        let (performance, start_date, end_date) = match block {
            Block::Parallel { paths, .. } => {
                let runs = self.run_paths(parent_id, paths, cumulative, entries)?;
                let durations: Vec<PerformanceTriple> =
                    runs.iter().map(|r| r.performance.duration).collect();
                let performance = Performance {
                    duration: PerformanceTriple::concurrent(&durations),
                    cost: runs.iter().map(|r| r.performance.cost).sum(),
                };
                (performance, earliest_start(&runs), latest_end(&runs))
            }
            Block::Exclusive { paths, .. } => {
                let runs = self.run_paths(parent_id, paths, cumulative, entries)?;
                let weights = branch_weights(paths);
                let weighted = |pick: fn(&Performance) -> PerformanceTriple| {
                    let triples: Vec<(f64, PerformanceTriple)> = weights
                        .iter()
                        .zip(&runs)
                        .map(|(w, r)| (*w, pick(&r.performance)))
                        .collect();
                    PerformanceTriple::exclusive(&triples)
                };
                let performance = Performance {
                    duration: weighted(|p| p.duration),
                    cost: weighted(|p| p.cost),
                };
                (performance, earliest_start(&runs), latest_end(&runs))
            }
            Block::Loop {
                looped_path,
                looping_flow,
                ..
            } => {
                let mut run = cumulative.clone();
                let once = self.sequence(parent_id, looped_path, &mut run, entries)?;
                let probability = looping_flow.probability().unwrap_or(0.0);
                let unbounded = || CalculationError::UnboundedLoop {
                    flow: looping_flow.id.clone(),
                    probability,
                };
                let performance = Performance {
                    duration: once
                        .performance
                        .duration
                        .repeated(probability)
                        .ok_or_else(unbounded)?,
                    cost: once
                        .performance
                        .cost
                        .repeated(probability)
                        .ok_or_else(unbounded)?,
                };
                let repetitions =
                    performance.duration.average - once.performance.duration.average;
                let end_date = run.last_end_date.and_then(|end| shift(end, repetitions));
                (performance, once.start_date, end_date)
            }
        };

        cumulative.advance(performance.duration.average, performance.cost.average, end_date);
        Ok(Outcome {
            performance,
            start_date,
        })
    }

    /// Every path starts from the same snapshot of the running totals
    fn run_paths(
        &self,
        parent_id: &str,
        paths: &[BranchPath],
        entry: &Cumulative,
        entries: &mut Entries,
    ) -> Result<Vec<PathRun>, CalculationError> {
        paths
            .iter()
            .map(|path| {
                let mut run = entry.clone();
                let outcome = self.sequence(parent_id, &path.members, &mut run, entries)?;
                Ok(PathRun {
                    performance: outcome.performance,
                    start_date: outcome.start_date,
                    end_date: run.last_end_date,
                })
            })
            .collect()
    }
}

fn entry(
    parent_id: &str,
    element: &FlowElement,
    element_performance: ElementPerformance,
    cumulative: &Cumulative,
) -> ElementPerformanceEntry {
    ElementPerformanceEntry {
        id: element.id.clone(),
        kind_tag: element.kind.tag().to_string(),
        parent_process_id: parent_id.to_string(),
        element_performance,
        cumulative_performance: CumulativePerformance {
            duration: cumulative.duration,
            cost: cumulative.cost,
        },
    }
}

/// Branch probabilities as fractions; paths without one share what is left equally
fn branch_weights(paths: &[BranchPath]) -> Vec<f64> {
    let assigned: f64 = paths.iter().filter_map(|p| p.probability).sum::<f64>() / 100.0;
    let unassigned = paths.iter().filter(|p| p.probability.is_none()).count();
    let share = if unassigned > 0 {
        (1.0 - assigned).max(0.0) / unassigned as f64
    } else {
        0.0
    };
    paths
        .iter()
        .map(|p| p.probability.map_or(share, |v| v / 100.0))
        .collect()
}

fn earliest_start(runs: &[PathRun]) -> Option<DateTime<Utc>> {
    runs.iter().filter_map(|r| r.start_date).min()
}

fn latest_end(runs: &[PathRun]) -> Option<DateTime<Utc>> {
    runs.iter().fold(None, |acc, r| latest(acc, r.end_date))
}

fn shift(date: DateTime<Utc>, ms: f64) -> Option<DateTime<Utc>> {
    let delta = chrono::Duration::try_milliseconds(ms.round() as i64)?;
    date.checked_add_signed(delta)
}
