//! Exploration policy behind the daily protocol pick.
//!
//! An arm is one `(protocol, variant)` pair of the candidate pool. Arms are grouped by protocol
//! track and each group moves through its own phases: cold start while it has no observations,
//! learning while any of its arms has fewer than `min_observations`, and converged afterwards,
//! where UCB1 or epsilon-greedy decides.

use rand::{Rng, RngCore};

use companion_domain::{EventKind, Track};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Policy {
	Ucb { exploration: f64 },
	EpsilonGreedy { epsilon: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RewardWeights {
	pub completed: f64,
	pub like: f64,
	pub skip: f64,
}
impl RewardWeights {
	pub fn weight(&self, kind: EventKind) -> f64 {
		match kind {
			EventKind::Completed => self.completed,
			EventKind::Like => self.like,
			EventKind::Skip => self.skip,
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct BanditParams {
	pub policy: Policy,
	pub min_observations: u32,
	pub rewards: RewardWeights,
	pub default_protocol: Option<String>,
}
impl BanditParams {
	pub fn from_config(cfg: &companion_config::Bandit) -> Self {
		let policy = match cfg.policy.as_str() {
			"epsilon_greedy" => Policy::EpsilonGreedy { epsilon: cfg.epsilon },
			_ => Policy::Ucb { exploration: cfg.ucb_exploration },
		};

		Self {
			policy,
			min_observations: cfg.min_observations,
			rewards: RewardWeights {
				completed: cfg.rewards.completed,
				like: cfg.rewards.like,
				skip: cfg.rewards.skip,
			},
			default_protocol: cfg.default_protocol.clone(),
		}
	}
}

#[derive(Debug, Clone, PartialEq)]
pub struct Arm {
	pub slug: String,
	pub variant: String,
	pub track: Option<Track>,
	/// Earlier days on which this arm was the committed pick.
	pub shown: u64,
	/// Logged events on this arm.
	pub events: u64,
	/// Weighted sum of those events.
	pub reward: f64,
}
impl Arm {
	pub fn new(slug: impl Into<String>, variant: impl Into<String>) -> Self {
		Self {
			slug: slug.into(),
			variant: variant.into(),
			track: None,
			shown: 0,
			events: 0,
			reward: 0.0,
		}
	}

	pub fn with_track(mut self, track: Option<Track>) -> Self {
		self.track = track;

		self
	}

	pub fn record(&mut self, kind: EventKind, count: u64, weights: &RewardWeights) {
		self.events += count;
		self.reward += weights.weight(kind) * count as f64;
	}

	pub fn record_shown(&mut self, count: u64) {
		self.shown += count;
	}

	/// A served day counts as a try even when the user ignored it. Events logged without a
	/// matching pick still count, so exposures never fall below the event count.
	pub fn exposures(&self) -> u64 {
		self.shown.max(self.events)
	}

	pub fn mean(&self) -> f64 {
		self.reward / self.exposures().max(1) as f64
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
	ColdStart,
	Learning,
	Converged,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Decision {
	pub arm: usize,
	pub phase: Phase,
	pub reason: String,
}

/// Chooses one arm. Returns `None` only for an empty pool.
///
/// A pool spanning several tracks first draws one track uniformly, then runs that track's own
/// phase. Arms must be given in a stable order; deterministic branches break ties by position.
pub fn select(arms: &[Arm], params: &BanditParams, rng: &mut dyn RngCore) -> Option<Decision> {
	if arms.is_empty() {
		return None;
	}

	let total: u64 = arms.iter().map(Arm::exposures).sum();

	if total == 0
		&& let Some(default) = params.default_protocol.as_deref()
		&& let Some(arm) = arms.iter().position(|arm| arm.slug == default)
	{
		return Some(Decision {
			arm,
			phase: Phase::ColdStart,
			reason: "bandit:cold_start:default".to_string(),
		});
	}

	let groups = track_groups(arms);
	let group =
		if groups.len() == 1 { &groups[0] } else { &groups[rng.gen_range(0..groups.len())] };

	Some(select_in(arms, group, params, rng))
}

/// Arm positions grouped by track, groups in first-seen order.
fn track_groups(arms: &[Arm]) -> Vec<Vec<usize>> {
	let mut tracks: Vec<Option<Track>> = Vec::new();
	let mut groups: Vec<Vec<usize>> = Vec::new();

	for (position, arm) in arms.iter().enumerate() {
		match tracks.iter().position(|track| *track == arm.track) {
			Some(group) => groups[group].push(position),
			None => {
				tracks.push(arm.track);
				groups.push(vec![position]);
			},
		}
	}

	groups
}

fn select_in(
	arms: &[Arm],
	pool: &[usize],
	params: &BanditParams,
	rng: &mut dyn RngCore,
) -> Decision {
	let total: u64 = pool.iter().map(|&position| arms[position].exposures()).sum();

	if total == 0 {
		return cold_start(arms, pool, rng);
	}

	let fewest = pool.iter().map(|&position| arms[position].exposures()).min().unwrap_or(0);

	if fewest < params.min_observations as u64 {
		let candidates: Vec<usize> = pool
			.iter()
			.copied()
			.filter(|&position| arms[position].exposures() == fewest)
			.collect();
		let arm = candidates[rng.gen_range(0..candidates.len())];
		let reason =
			if fewest == 0 { "bandit:learning:untried" } else { "bandit:learning:under_observed" };

		return Decision { arm, phase: Phase::Learning, reason: reason.to_string() };
	}

	match params.policy {
		Policy::Ucb { exploration } => {
			let ln_total = (total as f64).ln();
			let arm = best_by(arms, pool, |arm| {
				arm.mean() + exploration * (ln_total / arm.exposures() as f64).sqrt()
			});

			Decision { arm, phase: Phase::Converged, reason: "bandit:ucb".to_string() }
		},
		Policy::EpsilonGreedy { epsilon } =>
			if rng.gen_bool(epsilon.clamp(0.0, 1.0)) {
				Decision {
					arm: pool[rng.gen_range(0..pool.len())],
					phase: Phase::Converged,
					reason: "bandit:epsilon_greedy:explore".to_string(),
				}
			} else {
				Decision {
					arm: best_by(arms, pool, Arm::mean),
					phase: Phase::Converged,
					reason: "bandit:epsilon_greedy:exploit".to_string(),
				}
			},
	}
}

fn cold_start(arms: &[Arm], pool: &[usize], rng: &mut dyn RngCore) -> Decision {
	// Uniform over protocols first, then over that protocol's variants.
	let mut slugs: Vec<&str> = Vec::new();

	for &position in pool {
		if !slugs.contains(&arms[position].slug.as_str()) {
			slugs.push(arms[position].slug.as_str());
		}
	}

	let slug = slugs[rng.gen_range(0..slugs.len())];
	let variants: Vec<usize> =
		pool.iter().copied().filter(|&position| arms[position].slug == slug).collect();
	let arm = variants[rng.gen_range(0..variants.len())];

	Decision { arm, phase: Phase::ColdStart, reason: "bandit:cold_start:random".to_string() }
}

fn best_by<F>(arms: &[Arm], pool: &[usize], score: F) -> usize
where
	F: Fn(&Arm) -> f64,
{
	let mut best = pool[0];
	let mut best_score = f64::NEG_INFINITY;

	for &position in pool {
		let value = score(&arms[position]);

		if value > best_score {
			best = position;
			best_score = value;
		}
	}

	best
}
