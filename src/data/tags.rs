//! Topic tag inference
//!
//! Articles from the news API carry no category, so topics are inferred by
//! substring matching against a fixed vocabulary.

use super::Article;

/// Topic tags offered in the tag menu
pub const TAG_VOCABULARY: &[&str] = &[
    "business",
    "career",
    "education",
    "entertainment",
    "food",
    "gaming",
    "health",
    "parenting",
    "finance",
    "politics",
    "science",
    "self-improvement",
    "sports",
    "technology",
    "travel",
];

/// Infers the topic of an article from `vocabulary`
///
/// Sources are tried in priority order:
/// 1. the last path segment of the article url
/// 2. the title and description, lowercased
/// 3. the source name, lowercased
///
/// Within a source the first vocabulary entry that occurs wins.
pub fn infer_tag<'v>(article: &Article, vocabulary: &[&'v str]) -> Option<&'v str> {
    let first_match =
        |text: &str| vocabulary.iter().copied().find(|tag| text.contains(tag));

    if !article.url.is_empty() {
        let last_segment = article.url.rsplit('/').next().unwrap_or("");
        if let Some(tag) = first_match(last_segment) {
            return Some(tag);
        }
    }

    let description = article.description.as_deref().unwrap_or("");
    if !article.title.is_empty() || !description.is_empty() {
        let text = format!("{} {}", article.title, description).to_lowercase();
        if let Some(tag) = first_match(&text) {
            return Some(tag);
        }
    }

    article
        .source_name()
        .and_then(|name| first_match(&name.to_lowercase()))
}

/// Infers the distinct tags of many articles, in first-seen order
pub fn infer_tags<'a, 'v, I>(articles: I, vocabulary: &[&'v str]) -> Vec<&'v str>
where
    I: IntoIterator<Item = &'a Article>,
{
    let mut tags = Vec::new();
    for article in articles {
        if let Some(tag) = infer_tag(article, vocabulary) {
            if !tags.contains(&tag) {
                tags.push(tag);
            }
        }
    }
    tags
}

/// Formats a tag for display ("self-improvement" -> "Self Improvement")
pub fn display_name(tag: &str) -> String {
    tag.split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
