use regex::Regex;

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("Invalid keyword pattern for tag {tag:?}: {source}")]
	Pattern { tag: String, source: regex::Error },
}

const DEFAULT_LEXICON: [(&str, &[&str]); 10] = [
	("sleep", &["sleep", "sleeping", "insomnia", "melatonin", "bedtime", "nap", "naps"]),
	("circadian", &["circadian", "sunlight", "morning light", "jet lag", "sunrise", "sunset"]),
	("recovery", &["recovery", "recover", "nsdr", "yoga nidra", "deep rest", "restore"]),
	("focus", &["focus", "focused", "concentration", "concentrate"]),
	("attention", &["attention", "adhd", "distraction", "distractions"]),
	("productivity", &["productivity", "productive", "deep work", "work bout"]),
	("cognitive", &["cognitive", "cognition", "memory", "learning"]),
	("energy", &["energy", "caffeine", "fatigue", "alertness", "tired"]),
	("metabolic", &["metabolic", "metabolism", "glucose", "insulin", "fasting"]),
	("performance", &["performance", "exercise", "training", "endurance", "strength"]),
];

/// Assigns topical tags to chunk text by whole-word, case-insensitive keyword matches.
#[derive(Debug, Clone)]
pub struct KeywordTagger {
	rules: Vec<(String, Regex)>,
}
impl KeywordTagger {
	pub fn new<'a, I>(lexicon: I) -> Result<Self>
	where
		I: IntoIterator<Item = (&'a str, &'a [&'a str])>,
	{
		let mut rules = Vec::new();

		for (tag, keywords) in lexicon {
			let alternatives: Vec<String> = keywords
				.iter()
				.map(|keyword| {
					keyword.split_whitespace().map(regex::escape).collect::<Vec<_>>().join(r"\s+")
				})
				.collect();
			let pattern = format!(r"(?i)\b(?:{})\b", alternatives.join("|"));
			let regex = Regex::new(&pattern)
				.map_err(|err| Error::Pattern { tag: tag.to_string(), source: err })?;

			rules.push((tag.to_string(), regex));
		}

		Ok(Self { rules })
	}

	pub fn default_lexicon() -> Result<Self> {
		Self::new(DEFAULT_LEXICON)
	}

	/// Matching tags in lexicon order.
	pub fn tags_for(&self, text: &str) -> Vec<String> {
		self.rules
			.iter()
			.filter(|(_, regex)| regex.is_match(text))
			.map(|(tag, _)| tag.clone())
			.collect()
	}
}
