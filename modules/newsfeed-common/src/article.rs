use chrono::{DateTime, FixedOffset};
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::ArticleError;
use crate::flatten::{flatten, FlatMap, FlatValue};

/// One search result, with its whole document flattened into `content`.
///
/// Built once from the raw API document and never modified afterwards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Article {
    web_url: String,
    id: String,
    author: String,
    pub_date: String,
    content: FlatMap,
}

impl Article {
    /// Build an article from a raw `response.docs[]` entry.
    ///
    /// `web_url`, `_id` and `pub_date` must be strings and `byline` must be
    /// present. The flattened `content` covers every field of the document,
    /// including the four extracted ones.
    pub fn from_doc(doc: Value) -> Result<Self, ArticleError> {
        let Value::Object(map) = doc else {
            return Err(ArticleError::NotAnObject);
        };

        Ok(Self {
            web_url: required_str(&map, "web_url")?,
            id: required_str(&map, "_id")?,
            author: byline_text(map.get("byline").ok_or(ArticleError::MissingField("byline"))?),
            pub_date: required_str(&map, "pub_date")?,
            content: flatten(&map, None),
        })
    }

    pub fn web_url(&self) -> &str {
        &self.web_url
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    /// The raw `byline` value as text.
    pub fn author(&self) -> &str {
        &self.author
    }

    pub fn pub_date(&self) -> &str {
        &self.pub_date
    }

    pub fn content(&self) -> &FlatMap {
        &self.content
    }

    /// Look up a flattened field, e.g. `headline.main`.
    pub fn get(&self, key: &str) -> Option<&FlatValue> {
        self.content.get(key)
    }

    pub fn headline(&self) -> Option<&str> {
        self.get("headline.main").and_then(FlatValue::as_str)
    }

    /// Keys of the flattened content, in document order.
    pub fn schema(&self) -> Vec<&str> {
        self.content.keys().collect()
    }

    /// Parsed `pub_date`. The API has used both `+0000` and `Z` offsets.
    pub fn published_at(&self) -> Option<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.pub_date)
            .or_else(|_| DateTime::parse_from_str(&self.pub_date, "%Y-%m-%dT%H:%M:%S%z"))
            .ok()
    }
}

fn required_str(map: &Map<String, Value>, field: &'static str) -> Result<String, ArticleError> {
    match map.get(field) {
        Some(Value::String(s)) => Ok(s.clone()),
        Some(_) => Err(ArticleError::InvalidField {
            field,
            expected: "string",
        }),
        None => Err(ArticleError::MissingField(field)),
    }
}

fn byline_text(byline: &Value) -> String {
    match byline {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Datelike, Timelike};
    use serde_json::json;

    use super::*;

    fn sample_doc() -> Value {
        json!({
            "web_url": "https://www.nytimes.com/2024/01/05/technology/valley.html",
            "headline": {"main": "Valley Startups Regroup", "kicker": null},
            "byline": {"original": "By Jane Doe", "person": [{"firstname": "Jane"}]},
            "_id": "nyt://article/1234",
            "pub_date": "2024-01-05T10:00:05+0000",
            "keywords": [{"name": "subject", "value": "Start-ups"}]
        })
    }

    #[test]
    fn extracts_fields_and_flattens_whole_document() {
        let article = Article::from_doc(sample_doc()).unwrap();

        assert_eq!(article.web_url(), "https://www.nytimes.com/2024/01/05/technology/valley.html");
        assert_eq!(article.id(), "nyt://article/1234");
        assert_eq!(article.pub_date(), "2024-01-05T10:00:05+0000");
        assert_eq!(article.headline(), Some("Valley Startups Regroup"));

        // Extracted fields are still part of the flattened content.
        assert_eq!(article.get("_id").and_then(FlatValue::as_str), Some("nyt://article/1234"));
        assert_eq!(article.get("byline.original").and_then(FlatValue::as_str), Some("By Jane Doe"));
        assert!(article.get("byline.person").is_some());
        assert_eq!(
            article.schema(),
            vec![
                "web_url",
                "headline.main",
                "headline.kicker",
                "byline.original",
                "byline.person",
                "_id",
                "pub_date",
                "keywords"
            ]
        );
    }

    #[test]
    fn object_byline_is_stringified_as_json() {
        let article = Article::from_doc(sample_doc()).unwrap();
        let parsed: Value = serde_json::from_str(article.author()).unwrap();
        assert_eq!(parsed["original"], "By Jane Doe");
    }

    #[test]
    fn string_and_null_bylines() {
        let mut doc = sample_doc();
        doc["byline"] = json!("By Someone");
        assert_eq!(Article::from_doc(doc.clone()).unwrap().author(), "By Someone");

        doc["byline"] = Value::Null;
        assert_eq!(Article::from_doc(doc).unwrap().author(), "");
    }

    #[test]
    fn missing_or_mistyped_fields_are_rejected() {
        let mut doc = sample_doc();
        doc.as_object_mut().unwrap().remove("web_url");
        assert_eq!(Article::from_doc(doc), Err(ArticleError::MissingField("web_url")));

        let mut doc = sample_doc();
        doc.as_object_mut().unwrap().remove("byline");
        assert_eq!(Article::from_doc(doc), Err(ArticleError::MissingField("byline")));

        let mut doc = sample_doc();
        doc["_id"] = json!(42);
        assert_eq!(
            Article::from_doc(doc),
            Err(ArticleError::InvalidField { field: "_id", expected: "string" })
        );

        assert_eq!(Article::from_doc(json!([1, 2])), Err(ArticleError::NotAnObject));
    }

    #[test]
    fn parses_both_pub_date_offsets() {
        let article = Article::from_doc(sample_doc()).unwrap();
        let at = article.published_at().unwrap();
        assert_eq!((at.year(), at.month(), at.day(), at.hour()), (2024, 1, 5, 10));

        let mut doc = sample_doc();
        doc["pub_date"] = json!("2024-01-05T10:00:05Z");
        assert!(Article::from_doc(doc).unwrap().published_at().is_some());

        let mut doc = sample_doc();
        doc["pub_date"] = json!("yesterday");
        assert!(Article::from_doc(doc).unwrap().published_at().is_none());
    }

    #[test]
    fn serializes_with_flattened_content() {
        let article = Article::from_doc(sample_doc()).unwrap();
        let value = serde_json::to_value(&article).unwrap();

        assert_eq!(value["id"], "nyt://article/1234");
        assert_eq!(value["content"]["headline.main"], "Valley Startups Regroup");
    }
}
