//! Fixed word lists used by the text heuristics.

/// Common English function words. Compared lowercase.
pub const STOPWORDS: &[&str] = &[
    "a", "about", "above", "after", "again", "against", "all", "also", "am", "an", "and", "any",
    "are", "as", "at", "be", "because", "been", "before", "being", "below", "between", "both",
    "but", "by", "can", "could", "did", "do", "does", "doing", "down", "during", "each", "even",
    "every", "few", "for", "from", "further", "get", "gets", "got", "had", "has", "have",
    "having", "he", "her", "here", "hers", "herself", "him", "himself", "his", "how", "however",
    "i", "if", "in", "into", "is", "it", "its", "itself", "just", "like", "make", "many", "may",
    "me", "might", "more", "most", "much", "must", "my", "myself", "no", "nor", "not", "now",
    "of", "off", "on", "once", "one", "only", "or", "other", "our", "ours", "ourselves", "out",
    "over", "own", "same", "she", "should", "since", "so", "some", "such", "than", "that",
    "the", "their", "theirs", "them", "themselves", "then", "there", "these", "they", "this",
    "those", "through", "to", "too", "under", "until", "up", "upon", "us", "use", "used",
    "using", "very", "was", "way", "we", "well", "were", "what", "when", "where", "which",
    "while", "who", "whom", "why", "will", "with", "within", "without", "would", "you", "your",
    "yours", "yourself", "yourselves",
];

/// Words stripped from the start and end of an anchor candidate.
pub const EDGE_STOPWORDS: &[&str] = &[
    "a", "an", "and", "as", "at", "but", "by", "for", "from", "in", "into", "is", "are", "of",
    "on", "or", "our", "so", "than", "that", "the", "their", "this", "to", "with", "your", "&",
];

/// Prefixes that turn a single-word title into a multi-word anchor.
pub const CONTEXT_PREFIXES: &[&str] = &["best", "guide to", "learn about", "about"];

/// Topical term clusters. A shared cluster between two bodies is
/// evidence that the documents cover the same field.
pub const TOPIC_CLUSTERS: &[(&str, &[&str])] = &[
    (
        "legal",
        &[
            "law", "legal", "lawyer", "attorney", "court", "lawsuit", "litigation", "contract",
            "liability", "statute", "compliance", "injury", "claim", "settlement",
        ],
    ),
    (
        "health",
        &[
            "health", "medical", "doctor", "patient", "treatment", "therapy", "symptoms",
            "disease", "nutrition", "fitness", "wellness", "diet", "clinic", "hospital",
        ],
    ),
    (
        "business",
        &[
            "business", "marketing", "sales", "customer", "strategy", "management", "startup",
            "brand", "revenue", "growth", "entrepreneur", "company", "leadership", "ecommerce",
        ],
    ),
    (
        "technology",
        &[
            "software", "technology", "computer", "programming", "developer", "code", "cloud",
            "data", "security", "network", "digital", "hardware", "internet", "app",
        ],
    ),
    (
        "finance",
        &[
            "finance", "money", "investment", "investing", "budget", "loan", "mortgage",
            "credit", "tax", "taxes", "savings", "insurance", "retirement", "stock",
        ],
    ),
    (
        "education",
        &[
            "education", "school", "student", "teacher", "course", "learning", "university",
            "college", "curriculum", "training", "degree", "exam", "lesson", "study",
        ],
    ),
];

/// Related terms tried by the insertion locator when neither the anchor
/// nor any of its words appear in the body.
pub const RELATED_TERMS: &[(&str, &[&str])] = &[
    ("guide", &["tutorial", "how to", "tips", "handbook", "overview"]),
    ("best", &["top", "leading", "recommended", "popular"]),
    ("tips", &["advice", "ideas", "tricks", "suggestions"]),
    ("review", &["comparison", "evaluation", "opinion", "rating"]),
    ("cost", &["price", "pricing", "budget", "fee", "expense"]),
    ("benefits", &["advantages", "pros", "value", "gains"]),
    ("learn", &["understand", "discover", "explore", "study"]),
    ("how", &["ways", "steps", "method", "process"]),
    ("choose", &["pick", "select", "decide", "compare"]),
    ("problems", &["issues", "challenges", "mistakes", "risks"]),
    ("start", &["begin", "launch", "setup", "first"]),
    ("improve", &["boost", "increase", "enhance", "optimize"]),
];

pub fn is_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    STOPWORDS.contains(&lower.as_str())
}

pub fn is_edge_stopword(word: &str) -> bool {
    let lower = word.to_lowercase();
    EDGE_STOPWORDS.contains(&lower.as_str())
}

/// Related terms for an anchor word, if the dictionary knows it.
pub fn related_terms(word: &str) -> &'static [&'static str] {
    let lower = word.to_lowercase();
    RELATED_TERMS
        .iter()
        .find(|(key, _)| *key == lower)
        .map(|(_, terms)| *terms)
        .unwrap_or(&[])
}
