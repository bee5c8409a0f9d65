use std::collections::HashSet;
use std::sync::LazyLock;

/// Capitalized words that are never entities on their own: pronouns, days,
/// months, honorifics and deictic/function words that start sentences.
static ENTITY_STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        // pronouns
        "i", "me", "my", "mine", "myself", "you", "your", "yours", "yourself", "he", "him",
        "his", "himself", "she", "her", "hers", "herself", "it", "its", "itself", "we", "us",
        "our", "ours", "ourselves", "they", "them", "their", "theirs", "themselves",
        // days
        "monday", "tuesday", "wednesday", "thursday", "friday", "saturday", "sunday",
        // months
        "january", "february", "march", "april", "may", "june", "july", "august",
        "september", "october", "november", "december",
        // titles
        "mr", "mrs", "ms", "miss", "dr", "sir", "madam", "madame", "lady", "lord", "st",
        "prof", "rev", "capt", "col", "gen", "lt", "sgt", "master", "mistress",
        // deictic and function words
        "the", "a", "an", "this", "that", "these", "those", "there", "here", "then", "now",
        "when", "where", "what", "which", "who", "whom", "whose", "why", "how", "yes", "no",
        "not", "oh", "ah", "well", "but", "and", "or", "so", "if", "as", "at", "by", "in",
        "on", "of", "to", "for", "from", "with", "all", "some", "every", "each", "one",
        "after", "before", "while", "though", "although", "yet", "still", "perhaps",
        "however", "indeed", "today", "tomorrow", "yesterday", "chapter", "part", "book",
    ]
    .into_iter()
    .collect()
});

/// Common English words excluded from TF-IDF terms and bigrams.
static ENGLISH_STOPWORDS: LazyLock<HashSet<&'static str>> = LazyLock::new(|| {
    [
        "the", "be", "to", "of", "and", "a", "in", "that", "have", "i", "it", "for", "not",
        "on", "with", "he", "as", "you", "do", "at", "this", "but", "his", "by", "from",
        "they", "we", "say", "her", "she", "or", "an", "will", "my", "one", "all", "would",
        "there", "their", "what", "so", "up", "out", "if", "about", "who", "get", "which",
        "go", "me", "when", "make", "can", "like", "time", "no", "just", "him", "know",
        "take", "into", "your", "some", "could", "them", "see", "other", "than", "then",
        "now", "look", "only", "come", "its", "over", "think", "also", "back", "after",
        "use", "two", "how", "our", "well", "way", "even", "want", "because", "any",
        "these", "give", "most", "us", "is", "was", "are", "been", "has", "had", "were",
        "said", "did", "does", "done", "being", "very", "much", "more", "such", "own",
        "same", "too", "should", "shall", "might", "must", "may", "upon", "again", "here",
        "where", "while", "those", "through", "before", "each", "few", "both", "under",
        "until", "off", "once", "why", "whom", "again", "against", "between", "down",
        "during", "above", "below", "nor", "yet", "ever", "never", "every", "without",
        "within", "though", "himself", "herself", "itself", "themselves", "myself",
        "yourself", "ourselves", "hers", "theirs", "ours", "yours", "mine", "still",
        "let", "made", "went", "came", "told", "took", "thought", "quite", "rather",
        "indeed", "perhaps", "whose", "whom", "mr", "mrs", "miss", "sir",
    ]
    .into_iter()
    .collect()
});

pub fn is_entity_stopword(lowercase: &str) -> bool {
    ENTITY_STOPWORDS.contains(lowercase)
}

pub fn is_english_stopword(lowercase: &str) -> bool {
    ENGLISH_STOPWORDS.contains(lowercase)
}
