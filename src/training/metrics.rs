use log::info;
use serde::{Deserialize, Serialize};

/// Result of a single game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GameResult {
    pub winner: Option<usize>,
    pub turns: usize,
}

/// Tally of a run of games, per seat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    wins: Vec<usize>,
    draws: usize,
    games: usize,
    total_turns: usize,
}

impl Score {
    pub fn new(players: usize) -> Self {
        Score {
            wins: vec![0; players],
            draws: 0,
            games: 0,
            total_turns: 0,
        }
    }

    pub fn record(&mut self, result: &GameResult) {
        self.games += 1;
        self.total_turns += result.turns;
        match result.winner {
            Some(seat) if seat < self.wins.len() => self.wins[seat] += 1,
            _ => self.draws += 1,
        }
    }

    pub fn wins(&self, seat: usize) -> usize {
        self.wins.get(seat).copied().unwrap_or(0)
    }

    /// Games won by any seat other than `seat`.
    pub fn losses(&self, seat: usize) -> usize {
        self.games - self.draws - self.wins(seat)
    }

    pub fn draws(&self) -> usize {
        self.draws
    }

    pub fn games(&self) -> usize {
        self.games
    }

    pub fn win_pct(&self, seat: usize) -> f32 {
        percent(self.wins(seat), self.games)
    }

    pub fn loss_pct(&self, seat: usize) -> f32 {
        percent(self.losses(seat), self.games)
    }

    pub fn average_game_length(&self) -> f32 {
        if self.games == 0 {
            return 0.0;
        }
        self.total_turns as f32 / self.games as f32
    }
}

fn percent(count: usize, total: usize) -> f32 {
    if total == 0 {
        return 0.0;
    }
    count as f32 / total as f32 * 100.0
}

/// Snapshot of learner progress after a round of games.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingReport {
    pub games_played: usize,
    /// Win percentage minus loss percentage for the learner's seat.
    pub score: f32,
    /// Relative change of `score` against the previous round, in percent.
    pub score_change: f32,
    pub win_pct: f32,
    pub loss_pct: f32,
    pub average_game_length: f32,
    pub mean_experience_value: f32,
    pub mean_experience_value_change: f32,
    pub buffer_usage: f32,
    pub cost: Option<f32>,
    pub cost_ema: Option<f32>,
    pub weight_range: (f32, f32),
    /// First row of the network's most recent training output.
    pub output: Option<Vec<f32>>,
    /// First row of the matching training target.
    pub target: Option<Vec<f32>>,
}

impl TrainingReport {
    pub fn log(&self) {
        info!("Games Played: {}", self.games_played);
        info!("Score: {:5.1}% {:+4.1}%", self.score, self.score_change);
        info!("Wins / Losses: {:.1}% / {:.1}%", self.win_pct, self.loss_pct);
        info!(
            "Mean Experience Value: {:6.3} {:+4.1}%",
            self.mean_experience_value, self.mean_experience_value_change
        );
        info!("Experience Buffer Usage: {:5.1}%", self.buffer_usage * 100.0);
        info!("Brain Cost: {}", fmt_optional(self.cost));
        info!("Brain Cost EMA: {}", fmt_optional(self.cost_ema));
        info!(
            "Weight Range: [{:6.3}, {:6.3}]",
            self.weight_range.0, self.weight_range.1
        );
        info!("Output: {}", fmt_row(self.output.as_deref()));
        info!("Target: {}", fmt_row(self.target.as_deref()));
    }
}

fn fmt_optional(value: Option<f32>) -> String {
    value.map_or_else(|| "n/a".to_string(), |v| format!("{v:4.3}"))
}

fn fmt_row(row: Option<&[f32]>) -> String {
    match row {
        Some(values) => {
            let cells: Vec<String> = values.iter().map(|v| format!("{v:.3}")).collect();
            format!("[{}]", cells.join(", "))
        }
        None => "n/a".to_string(),
    }
}

/// Learner-side observations fed into a report.
#[derive(Debug, Clone, PartialEq)]
pub struct LearnerStats {
    pub mean_experience_value: f32,
    pub buffer_usage: f32,
    pub cost: Option<f32>,
    pub weight_range: (f32, f32),
    pub output: Option<Vec<f32>>,
    pub target: Option<Vec<f32>>,
}

/// Tracks reports across rounds, including the cost moving average.
pub struct TrainingMetrics {
    reports: Vec<TrainingReport>,
    cost_ema: Option<f32>,
}

impl TrainingMetrics {
    pub fn new() -> Self {
        TrainingMetrics {
            reports: Vec::new(),
            cost_ema: None,
        }
    }

    /// Build, store and return the report for a finished round. `seat` is
    /// the learner's seat in `score`.
    pub fn record_round(
        &mut self,
        games_played: usize,
        score: &Score,
        seat: usize,
        stats: LearnerStats,
    ) -> &TrainingReport {
        let value = score.win_pct(seat) - score.loss_pct(seat);
        let prev = self.reports.last();
        let score_change = relative_change(value, prev.map(|r| r.score));
        let value_change = relative_change(
            stats.mean_experience_value,
            prev.map(|r| r.mean_experience_value),
        );

        if let Some(cost) = stats.cost {
            self.cost_ema = Some(match self.cost_ema {
                Some(ema) if !ema.is_nan() => 0.9 * ema + 0.1 * cost,
                _ => cost,
            });
        }

        self.reports.push(TrainingReport {
            games_played,
            score: value,
            score_change,
            win_pct: score.win_pct(seat),
            loss_pct: score.loss_pct(seat),
            average_game_length: score.average_game_length(),
            mean_experience_value: stats.mean_experience_value,
            mean_experience_value_change: value_change,
            buffer_usage: stats.buffer_usage,
            cost: stats.cost,
            cost_ema: self.cost_ema,
            weight_range: stats.weight_range,
            output: stats.output,
            target: stats.target,
        });
        &self.reports[self.reports.len() - 1]
    }

    pub fn reports(&self) -> &[TrainingReport] {
        &self.reports
    }

    pub fn into_reports(self) -> Vec<TrainingReport> {
        self.reports
    }

    pub fn cost_ema(&self) -> Option<f32> {
        self.cost_ema
    }
}

impl Default for TrainingMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Percent change from `prev`; zero when there is no usable previous value.
fn relative_change(current: f32, prev: Option<f32>) -> f32 {
    match prev {
        Some(p) if p != 0.0 && p.is_finite() => (current - p) / p.abs() * 100.0,
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stats(cost: Option<f32>) -> LearnerStats {
        LearnerStats {
            mean_experience_value: 0.25,
            buffer_usage: 0.5,
            cost,
            weight_range: (-1.0, 1.0),
            output: None,
            target: None,
        }
    }

    #[test]
    fn test_score_tally() {
        let mut score = Score::new(2);
        score.record(&GameResult { winner: Some(0), turns: 5 });
        score.record(&GameResult { winner: Some(0), turns: 7 });
        score.record(&GameResult { winner: Some(1), turns: 6 });
        score.record(&GameResult { winner: None, turns: 9 });

        assert_eq!(score.games(), 4);
        assert_eq!(score.wins(0), 2);
        assert_eq!(score.losses(0), 1);
        assert_eq!(score.losses(1), 2);
        assert_eq!(score.draws(), 1);
        assert!((score.win_pct(0) - 50.0).abs() < 1e-6);
        assert!((score.loss_pct(0) - 25.0).abs() < 1e-6);
        assert!((score.average_game_length() - 6.75).abs() < 1e-6);
    }

    #[test]
    fn test_empty_score() {
        let score = Score::new(2);
        assert_eq!(score.win_pct(0), 0.0);
        assert_eq!(score.average_game_length(), 0.0);
    }

    #[test]
    fn test_report_score_and_change() {
        let mut metrics = TrainingMetrics::new();
        let mut first = Score::new(2);
        for winner in [Some(0), Some(1), Some(0), Some(0)] {
            first.record(&GameResult { winner, turns: 5 });
        }
        let report = metrics.record_round(4, &first, 0, stats(None));
        assert!((report.score - 50.0).abs() < 1e-6);
        assert_eq!(report.score_change, 0.0);

        let mut second = Score::new(2);
        for _ in 0..4 {
            second.record(&GameResult { winner: Some(0), turns: 5 });
        }
        let report = metrics.record_round(8, &second, 0, stats(None));
        assert!((report.score - 100.0).abs() < 1e-6);
        assert!((report.score_change - 100.0).abs() < 1e-4);
        assert_eq!(metrics.reports().len(), 2);
    }

    #[test]
    fn test_cost_ema() {
        let mut metrics = TrainingMetrics::new();
        let score = Score::new(2);

        metrics.record_round(1, &score, 0, stats(None));
        assert_eq!(metrics.cost_ema(), None);

        metrics.record_round(2, &score, 0, stats(Some(1.0)));
        assert_eq!(metrics.cost_ema(), Some(1.0));

        metrics.record_round(3, &score, 0, stats(Some(0.0)));
        assert!((metrics.cost_ema().unwrap() - 0.9).abs() < 1e-6);

        metrics.record_round(4, &score, 0, stats(Some(f32::NAN)));
        assert!(metrics.cost_ema().unwrap().is_nan());
        metrics.record_round(5, &score, 0, stats(Some(0.3)));
        assert_eq!(metrics.cost_ema(), Some(0.3));
    }

    #[test]
    fn test_report_carries_output_and_target() {
        let mut metrics = TrainingMetrics::new();
        let round = LearnerStats {
            output: Some(vec![0.1, 0.7]),
            target: Some(vec![0.1, 0.9]),
            ..stats(Some(0.02))
        };
        let report = metrics.record_round(1, &Score::new(2), 0, round);
        assert_eq!(report.output.as_deref(), Some(&[0.1, 0.7][..]));
        assert_eq!(report.target.as_deref(), Some(&[0.1, 0.9][..]));
        assert_eq!(fmt_row(report.output.as_deref()), "[0.100, 0.700]");
        assert_eq!(fmt_row(None), "n/a");
    }

    #[test]
    fn test_relative_change() {
        assert_eq!(relative_change(5.0, None), 0.0);
        assert_eq!(relative_change(5.0, Some(0.0)), 0.0);
        assert!((relative_change(-5.0, Some(-10.0)) - 50.0).abs() < 1e-6);
    }
}
