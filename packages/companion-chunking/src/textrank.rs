//! Weighted PageRank over a sentence similarity graph, used to pick the sentences that best
//! summarize a chunk.

use std::collections::BTreeSet;

use companion_domain::text::token_set;

const DAMPING: f64 = 0.85;
const MAX_ITERATIONS: usize = 100;
const TOLERANCE: f64 = 1.0e-6;

/// Token overlap normalized by the geometric mean of both set sizes.
pub fn similarity(left: &BTreeSet<String>, right: &BTreeSet<String>) -> f64 {
	if left.is_empty() || right.is_empty() {
		return 0.0;
	}

	let shared = left.intersection(right).count() as f64;

	shared / ((left.len() * right.len()) as f64).sqrt()
}

/// Stationary PageRank scores for an undirected weighted graph given as a dense matrix.
///
/// Nodes without edges spread their mass uniformly, so scores always sum to one.
pub fn pagerank(weights: &[Vec<f64>]) -> Vec<f64> {
	let n = weights.len();

	if n == 0 {
		return Vec::new();
	}

	let uniform = 1.0 / n as f64;
	let out_weight: Vec<f64> = weights.iter().map(|row| row.iter().sum()).collect();
	let mut scores = vec![uniform; n];

	for _ in 0..MAX_ITERATIONS {
		let dangling: f64 =
			(0..n).filter(|&node| out_weight[node] == 0.0).map(|node| scores[node]).sum();
		let mut next = vec![(1.0 - DAMPING) * uniform + DAMPING * dangling * uniform; n];

		for (from, row) in weights.iter().enumerate() {
			if out_weight[from] == 0.0 {
				continue;
			}

			for (to, &weight) in row.iter().enumerate() {
				if weight > 0.0 {
					next[to] += DAMPING * scores[from] * weight / out_weight[from];
				}
			}
		}

		let delta: f64 = next.iter().zip(&scores).map(|(new, old)| (new - old).abs()).sum();

		scores = next;

		if delta < n as f64 * TOLERANCE {
			break;
		}
	}

	scores
}

/// Positions of the `k` highest-ranked sentences, returned in reading order. Groups of `k` or
/// fewer sentences are returned whole. Equal scores favor the earlier sentence.
pub fn choose(sentences: &[String], k: usize) -> Vec<usize> {
	let n = sentences.len();

	if n <= k {
		return (0..n).collect();
	}

	let tokens: Vec<BTreeSet<String>> =
		sentences.iter().map(|sentence| token_set(sentence)).collect();
	let mut weights = vec![vec![0.0; n]; n];

	for i in 0..n {
		for j in (i + 1)..n {
			let weight = similarity(&tokens[i], &tokens[j]);

			weights[i][j] = weight;
			weights[j][i] = weight;
		}
	}

	let scores = pagerank(&weights);
	let mut ranked: Vec<usize> = (0..n).collect();

	ranked.sort_by(|left, right| scores[*right].total_cmp(&scores[*left]));
	ranked.truncate(k);
	ranked.sort_unstable();

	ranked
}

#[cfg(test)]
mod tests {
	use super::*;

	fn owned(sentences: &[&str]) -> Vec<String> {
		sentences.iter().map(|sentence| sentence.to_string()).collect()
	}

	#[test]
	fn similarity_uses_geometric_mean() {
		let left = token_set("morning light sleep");
		let right = token_set("light sleep");

		assert!((similarity(&left, &right) - 2.0 / 6.0_f64.sqrt()).abs() < 1e-12);
		assert_eq!(similarity(&left, &BTreeSet::new()), 0.0);
	}

	#[test]
	fn pagerank_sums_to_one_with_isolated_nodes() {
		let weights = vec![vec![0.0, 1.0, 0.0], vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 0.0]];
		let scores = pagerank(&weights);

		assert!((scores.iter().sum::<f64>() - 1.0).abs() < 1e-6);
		assert!(scores[0] > scores[2]);
		assert!((scores[0] - scores[1]).abs() < 1e-9);
	}

	#[test]
	fn chooses_central_sentences_in_reading_order() {
		let sentences = owned(&[
			"Unrelated banter opens the show.",
			"Morning light anchors the circadian clock.",
			"Bright morning light improves sleep.",
			"Circadian timing shapes sleep and light sensitivity.",
			"Thanks for listening.",
		]);

		assert_eq!(choose(&sentences, 2).len(), 2);
		assert!(choose(&sentences, 2).iter().all(|&position| (1..=3).contains(&position)));
		assert_eq!(choose(&owned(&["Only one."]), 2), vec![0]);
	}

	#[test]
	fn ties_favor_earlier_sentences() {
		let sentences = owned(&["Alpha.", "Beta.", "Gamma."]);

		assert_eq!(choose(&sentences, 2), vec![0, 1]);
	}
}
