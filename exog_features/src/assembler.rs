//! Past and future regressor tables for the exogenous forecast
//!
//! The past table joins merged weather history with daily news sentiment and
//! is filled forward then backward, so it has no gaps once every column has
//! at least one value. The future table carries the weather forecast with a
//! neutral sentiment of zero. Both share one column set and order.

use crate::news::{daily_sentiment, sentiment_frame, Headline, SENTIMENT_COLUMN};
use crate::sentiment::SentimentScorer;
use crate::weather::{merge_regions, RegionWeather};
use crate::{FeatureError, Result};
use chrono::{Days, NaiveDate};
use price_forecast::RegressorFrame;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Upper bound on how far back headlines are considered
pub const NEWS_LOOKBACK_CAP_DAYS: u32 = 30;

/// Look-back and look-ahead of the feature tables, in days
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureWindow {
    pub days_back: u32,
    pub days_forward: u32,
}

impl FeatureWindow {
    pub fn new(days_back: u32, days_forward: u32) -> Result<Self> {
        if days_back == 0 || days_forward == 0 {
            return Err(FeatureError::InvalidParameter(format!(
                "Feature window must be positive, got {} back and {} forward",
                days_back, days_forward
            )));
        }
        Ok(Self {
            days_back,
            days_forward,
        })
    }

    /// `min(days_back, 30)`
    pub fn news_lookback(&self) -> u32 {
        self.days_back.min(NEWS_LOOKBACK_CAP_DAYS)
    }
}

impl Default for FeatureWindow {
    fn default() -> Self {
        Self {
            days_back: 120,
            days_forward: 16,
        }
    }
}

/// Regressor tables on either side of the as-of date
#[derive(Debug, Clone, PartialEq)]
pub struct ExogenousFeatures {
    pub past: RegressorFrame,
    pub future: RegressorFrame,
}

/// Builds past and future regressor tables from weather and news
#[derive(Debug)]
pub struct FeatureAssembler<'a, S: SentimentScorer + ?Sized> {
    scorer: &'a S,
    window: FeatureWindow,
}

impl<'a, S: SentimentScorer + ?Sized> FeatureAssembler<'a, S> {
    pub fn new(scorer: &'a S, window: FeatureWindow) -> Self {
        Self { scorer, window }
    }

    pub fn window(&self) -> FeatureWindow {
        self.window
    }

    /// Assemble the tables as seen on `as_of`.
    ///
    /// Weather history is kept from `as_of - days_back` through `as_of`,
    /// headlines from `as_of - news_lookback` through `as_of`, and the
    /// weather forecast for `days_forward` days starting on `as_of`.
    pub fn assemble(
        &self,
        as_of: NaiveDate,
        past_weather: &[RegionWeather],
        forecast_weather: &[RegionWeather],
        headlines: &[Headline],
    ) -> Result<ExogenousFeatures> {
        FeatureWindow::new(self.window.days_back, self.window.days_forward)?;
        let past_start = days_before(as_of, self.window.days_back)?;
        let news_start = days_before(as_of, self.window.news_lookback())?;
        let future_end = as_of
            .checked_add_days(Days::new(u64::from(self.window.days_forward) - 1))
            .ok_or_else(|| FeatureError::InvalidParameter("Forecast window overflows the calendar".to_string()))?;

        let history: Vec<RegionWeather> = past_weather.iter().map(|w| w.within(&(past_start..=as_of))).collect();
        let outlook: Vec<RegionWeather> = forecast_weather.iter().map(|w| w.within(&(as_of..=future_end))).collect();

        let recent: Vec<Headline> = headlines
            .iter()
            .filter(|h| h.published.is_some_and(|d| (news_start..=as_of).contains(&d)))
            .cloned()
            .collect();
        let sentiment = daily_sentiment(&recent, self.scorer);
        debug!(headlines = recent.len(), days = sentiment.len(), "scored news headlines");

        let mut past = merge_regions(&history)?.outer_join(&sentiment_frame(&sentiment)?)?;
        past.forward_fill();
        past.backward_fill();

        if sentiment.is_empty() {
            warn!("no headlines in the look-back window, news sentiment set to neutral");
            let rows = past.height();
            past = past.with_column(SENTIMENT_COLUMN, vec![Some(0.0); rows])?;
        }

        // A column with no value at all cannot be filled from its neighbours
        if past.height() > 0 {
            let (kept, dropped): (Vec<&str>, Vec<&str>) = past
                .column_names()
                .into_iter()
                .partition(|name| past.column(name).is_some_and(|v| v.iter().any(Option::is_some)));
            if !dropped.is_empty() {
                warn!(columns = ?dropped, "dropping regressors without any observation");
                past = past.select(&kept);
            }
        }

        let names = past.column_names();
        let mut future = merge_regions(&outlook)?.select(&names);
        future.forward_fill();
        future.backward_fill();
        let rows = future.height();
        let future = future.with_column(SENTIMENT_COLUMN, vec![Some(0.0); rows])?;

        info!(
            as_of = %as_of,
            past_rows = past.height(),
            future_rows = future.height(),
            columns = past.width(),
            "assembled exogenous features"
        );
        Ok(ExogenousFeatures { past, future })
    }
}

fn days_before(date: NaiveDate, days: u32) -> Result<NaiveDate> {
    date.checked_sub_days(Days::new(u64::from(days)))
        .ok_or_else(|| FeatureError::InvalidParameter(format!("{} days before {} is out of range", days, date)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_news_lookback_is_capped() {
        assert_eq!(FeatureWindow::new(120, 16).unwrap().news_lookback(), 30);
        assert_eq!(FeatureWindow::new(10, 16).unwrap().news_lookback(), 10);
        assert!(FeatureWindow::new(0, 16).is_err());
        assert!(FeatureWindow::new(10, 0).is_err());
    }
}
