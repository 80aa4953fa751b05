//! News headlines and daily sentiment

use crate::sentiment::SentimentScorer;
use crate::{FeatureError, Result};
use chrono::NaiveDate;
use polars::prelude::*;
use price_forecast::data::{column_dates, find_column};
use price_forecast::RegressorFrame;
use std::collections::BTreeMap;

/// Name of the sentiment regressor column
pub const SENTIMENT_COLUMN: &str = "news_sentiment";

const TITLE_CANDIDATES: [&str; 2] = ["title", "headline"];
const SUMMARY_CANDIDATES: [&str; 3] = ["summary", "description", "content"];
const PUBLISHED_CANDIDATES: [&str; 5] = ["published", "pubdate", "updated", "date", "timestamp"];

/// A news item to be scored
#[derive(Debug, Clone, PartialEq)]
pub struct Headline {
    pub title: String,
    pub summary: String,
    /// Publication day; headlines without one are never scored
    pub published: Option<NaiveDate>,
}

impl Headline {
    pub fn new(title: impl Into<String>, summary: impl Into<String>, published: Option<NaiveDate>) -> Self {
        Self {
            title: title.into(),
            summary: summary.into(),
            published,
        }
    }

    /// Text handed to the scorer
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.summary)
    }

    /// Read headlines from a table with a title column, an optional summary
    /// column and a date-like publication column
    pub fn from_dataframe(df: &DataFrame) -> Result<Vec<Headline>> {
        let names = df.get_column_names();
        let title_column = find_column(&names, &TITLE_CANDIDATES)
            .ok_or_else(|| FeatureError::DataError("Headline table has no title column".to_string()))?;

        let titles = text_column(df, &title_column)?;
        let summaries = match find_column(&names, &SUMMARY_CANDIDATES) {
            Some(name) => text_column(df, &name)?,
            None => vec![String::new(); df.height()],
        };
        let published = match find_column(&names, &PUBLISHED_CANDIDATES) {
            Some(name) => column_dates(df, &name)?,
            None => vec![None; df.height()],
        };

        let headlines = titles
            .into_iter()
            .zip(summaries)
            .zip(published)
            .map(|((title, summary), published)| Headline::new(title, summary, published))
            .collect();
        Ok(headlines)
    }
}

fn text_column(df: &DataFrame, name: &str) -> Result<Vec<String>> {
    let text = df.column(name)?.cast(&DataType::Utf8)?;
    let values = text
        .utf8()?
        .into_iter()
        .map(|cell| cell.unwrap_or_default().to_string())
        .collect();
    Ok(values)
}

/// Mean compound score per publication day.
///
/// Days without headlines are absent from the result.
pub fn daily_sentiment<S>(headlines: &[Headline], scorer: &S) -> BTreeMap<NaiveDate, f64>
where
    S: SentimentScorer + ?Sized,
{
    let mut sums: BTreeMap<NaiveDate, (f64, usize)> = BTreeMap::new();
    for headline in headlines {
        let Some(day) = headline.published else {
            continue;
        };
        let score = scorer.compound(&headline.text());
        let entry = sums.entry(day).or_insert((0.0, 0));
        entry.0 += score;
        entry.1 += 1;
    }

    sums.into_iter()
        .map(|(day, (sum, count))| (day, sum / count as f64))
        .collect()
}

/// Daily sentiment as a single-column regressor frame
pub fn sentiment_frame(daily: &BTreeMap<NaiveDate, f64>) -> Result<RegressorFrame> {
    let dates = daily.keys().copied().collect();
    let values = daily.values().map(|v| Some(*v)).collect();
    Ok(RegressorFrame::new(dates, vec![(SENTIMENT_COLUMN.to_string(), values)])?)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    #[test]
    fn test_daily_mean_of_scores() {
        let scorer = |text: &str| if text.contains("good") { 0.8 } else { -0.2 };
        let headlines = vec![
            Headline::new("good harvest", "", Some(day(1))),
            Headline::new("flooding", "", Some(day(1))),
            Headline::new("good rains", "", Some(day(3))),
            Headline::new("undated", "good", None),
        ];

        let daily = daily_sentiment(&headlines, &scorer);
        assert_eq!(daily.len(), 2);
        assert!((daily[&day(1)] - 0.3).abs() < 1e-12);
        assert_eq!(daily[&day(3)], 0.8);
        assert!(!daily.contains_key(&day(2)));
    }

    #[test]
    fn test_summary_is_scored_with_title() {
        let headline = Headline::new("Prices", "rise on demand", None);
        assert_eq!(headline.text(), "Prices rise on demand");
    }

    #[test]
    fn test_from_dataframe() {
        let df = df!(
            "Title" => &["a", "b"],
            "published" => &["2024-06-01T08:00:00Z", "garbage"]
        )
        .unwrap();
        let headlines = Headline::from_dataframe(&df).unwrap();
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines[0].published, Some(day(1)));
        assert_eq!(headlines[0].summary, "");
        assert_eq!(headlines[1].published, None);
    }
}
