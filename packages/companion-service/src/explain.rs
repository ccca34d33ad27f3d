use serde::{Deserialize, Serialize};

use companion_domain::chunk::prefix;

use crate::{CompanionService, Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExplainRequest {
	pub episode_id: String,
	pub chunk_index: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExplainResponse {
	pub episode_id: String,
	pub episode_title: String,
	/// The chunk's title and why sentences, blanks omitted.
	pub excerpts: Vec<String>,
	pub snippet: String,
}

impl CompanionService {
	pub fn explain(&self, req: ExplainRequest) -> Result<ExplainResponse> {
		let snapshot = self.index.current();
		let chunk = snapshot
			.index
			.doc_at(req.episode_id.trim(), req.chunk_index)
			.and_then(|doc| snapshot.index.chunk(doc))
			.ok_or_else(|| Error::NotFound { message: "chunk not found".to_string() })?;
		let record = &chunk.record;
		let excerpts = [&record.title_sent, &record.why_sent]
			.into_iter()
			.filter(|sentence| !sentence.trim().is_empty())
			.cloned()
			.collect();

		Ok(ExplainResponse {
			episode_id: record.episode_id.clone(),
			episode_title: record.episode_title.clone(),
			excerpts,
			snippet: prefix(&record.text, self.cfg.search.explain_snippet_chars as usize),
		})
	}
}
