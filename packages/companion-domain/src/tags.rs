use std::collections::BTreeMap;

use crate::profile::normalize_labels;

const DEFAULT_EXPANSION: [(&str, &[&str]); 3] = [
	("sleep", &["sleep", "circadian", "recovery"]),
	("focus", &["focus", "attention", "productivity", "cognitive"]),
	("energy", &["energy", "metabolic", "performance"]),
];

/// Maps an interest tag onto the wider set of chunk tags it should match.
#[derive(Debug, Clone)]
pub struct TagExpansion {
	table: BTreeMap<String, Vec<String>>,
}
impl TagExpansion {
	pub fn from_config(cfg: &companion_config::Recommend) -> Self {
		match cfg.tag_expansion.as_ref() {
			Some(table) => Self { table: table.clone() },
			None => Self::default(),
		}
	}

	/// Expands `tags` into `(chunk_tag, requested_tag)` pairs. A chunk tag reached from several
	/// requested tags keeps the first one. Unknown tags expand to themselves.
	pub fn expand(&self, tags: &[String]) -> Vec<(String, String)> {
		let mut out: Vec<(String, String)> = Vec::new();

		for requested in normalize_labels(tags) {
			let expanded = match self.table.get(&requested) {
				Some(values) => values.clone(),
				None => vec![requested.clone()],
			};

			for tag in expanded {
				if out.iter().any(|(existing, _)| existing == &tag) {
					continue;
				}

				out.push((tag, requested.clone()));
			}
		}

		out
	}
}
impl Default for TagExpansion {
	fn default() -> Self {
		let table = DEFAULT_EXPANSION
			.iter()
			.map(|(tag, expanded)| {
				(tag.to_string(), expanded.iter().map(|value| value.to_string()).collect())
			})
			.collect();

		Self { table }
	}
}
