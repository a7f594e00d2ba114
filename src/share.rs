//! Share links for an article

use urlencoding::encode;

use crate::data::Article;

/// Links offered in the share dialog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLinks {
    pub facebook: String,
    pub linkedin: String,
    pub email: String,
    /// Plain article url, for copying
    pub link: String,
}

impl ShareLinks {
    pub fn for_article(article: &Article) -> Self {
        let url = encode(&article.url);
        Self {
            facebook: format!("https://www.facebook.com/sharer/sharer.php?u={}", url),
            linkedin: format!("https://www.linkedin.com/shareArticle?mini=true&url={}", url),
            email: format!("mailto:?subject={}&body={}", encode(&article.title), url),
            link: article.url.clone(),
        }
    }
}
