use std::cmp::Ordering;

/// How raw scores are mapped into the 0-1 range returned to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Normalization {
	/// Divide by the largest score; all zero when the largest score is zero.
	DivideByMax,
	/// Clamp into 0-1. Used for cosine similarity, which is already bounded.
	Clamp,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RankedChunk {
	pub doc: usize,
	pub score: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedPage {
	pub items: Vec<RankedChunk>,
	/// Number of scored candidates before pagination.
	pub total: usize,
}

/// Normalizes every candidate, orders by score descending with document position as the
/// tie-break, then slices out one page.
///
/// Normalization runs over the whole candidate set rather than the page, so concatenated pages
/// equal one larger page.
pub fn rank(
	scored: Vec<(usize, f32)>,
	normalization: Normalization,
	offset: usize,
	limit: usize,
) -> RankedPage {
	let mut items: Vec<RankedChunk> =
		scored.into_iter().map(|(doc, score)| RankedChunk { doc, score }).collect();

	normalize(&mut items, normalization);

	items.sort_by(|left, right| {
		cmp_f32_desc(left.score, right.score).then_with(|| left.doc.cmp(&right.doc))
	});

	let total = items.len();
	let items = items.into_iter().skip(offset).take(limit).collect();

	RankedPage { items, total }
}

fn normalize(items: &mut [RankedChunk], normalization: Normalization) {
	match normalization {
		Normalization::DivideByMax => {
			let max = items
				.iter()
				.map(|item| item.score)
				.filter(|score| score.is_finite())
				.fold(0.0_f32, f32::max);

			for item in items.iter_mut() {
				item.score = if max > 0.0 && item.score.is_finite() {
					(item.score / max).clamp(0.0, 1.0)
				} else {
					0.0
				};
			}
		},
		Normalization::Clamp => {
			for item in items.iter_mut() {
				item.score = if item.score.is_finite() { item.score.clamp(0.0, 1.0) } else { 0.0 };
			}
		},
	}
}

pub fn cmp_f32_desc(a: f32, b: f32) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}
