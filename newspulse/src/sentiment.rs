use serde::{Deserialize, Serialize};
use vader_sentiment::SentimentIntensityAnalyzer;

use crate::model::{Article, ScoredArticle};

/// Sentiment classification derived from the VADER compound score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SentimentLabel {
    Positive,
    Negative,
    Neutral,
}

impl std::fmt::Display for SentimentLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SentimentLabel::Positive => write!(f, "positive"),
            SentimentLabel::Negative => write!(f, "negative"),
            SentimentLabel::Neutral => write!(f, "neutral"),
        }
    }
}

/// Label plus the raw compound score in [-1.0, 1.0].
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct SentimentScore {
    pub label: SentimentLabel,
    pub compound: f64,
}

/// Aggregate sentiment over one batch of articles.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Distribution {
    pub positive: usize,
    pub negative: usize,
    pub neutral: usize,
    /// Number of articles that had text to score
    pub scored: usize,
    /// Mean compound score over scored articles; 0.0 when nothing was scored
    pub mean_compound: f64,
}

impl Distribution {
    fn record(&mut self, score: &SentimentScore) {
        match score.label {
            SentimentLabel::Positive => self.positive += 1,
            SentimentLabel::Negative => self.negative += 1,
            SentimentLabel::Neutral => self.neutral += 1,
        }
        self.scored += 1;
        // mean is finalized in `finish`
        self.mean_compound += score.compound;
    }

    fn finish(mut self) -> Self {
        if self.scored > 0 {
            self.mean_compound /= self.scored as f64;
        }
        self
    }
}

/// Wraps the VADER lexicon analyzer with configured label thresholds.
/// The analyzer is built once (loading the lexicon) and shared via AppState.
pub struct SentimentAnalyzer {
    analyzer: SentimentIntensityAnalyzer<'static>,
    positive_threshold: f64,
    negative_threshold: f64,
}

impl SentimentAnalyzer {
    pub fn new(cfg: &common::SentimentConfig) -> Self {
        Self::with_thresholds(cfg.positive_threshold(), cfg.negative_threshold())
    }

    pub fn with_thresholds(positive_threshold: f64, negative_threshold: f64) -> Self {
        Self {
            analyzer: SentimentIntensityAnalyzer::new(),
            positive_threshold,
            negative_threshold,
        }
    }

    /// Score a single text. Empty or whitespace-only input is Neutral 0.0
    /// without touching the analyzer.
    pub fn score(&self, text: &str) -> SentimentScore {
        if text.trim().is_empty() {
            return SentimentScore {
                label: SentimentLabel::Neutral,
                compound: 0.0,
            };
        }

        let scores = self.analyzer.polarity_scores(text);
        let compound = scores.get("compound").copied().unwrap_or(0.0);

        let label = if compound >= self.positive_threshold {
            SentimentLabel::Positive
        } else if compound <= self.negative_threshold {
            SentimentLabel::Negative
        } else {
            SentimentLabel::Neutral
        };

        SentimentScore { label, compound }
    }

    /// Score a batch of articles on their descriptions. Articles without a
    /// description carry no sentiment and are excluded from the distribution.
    pub fn score_articles(&self, articles: Vec<Article>) -> (Vec<ScoredArticle>, Distribution) {
        let mut distribution = Distribution::default();
        let scored = articles
            .into_iter()
            .map(|article| {
                let sentiment = article
                    .description
                    .as_deref()
                    .filter(|d| !d.trim().is_empty())
                    .map(|d| self.score(d));
                if let Some(ref s) = sentiment {
                    distribution.record(s);
                }
                let published_display = article.published_display();
                ScoredArticle {
                    article,
                    published_display,
                    sentiment,
                }
            })
            .collect();
        (scored, distribution.finish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn default_analyzer() -> SentimentAnalyzer {
        SentimentAnalyzer::with_thresholds(
            common::DEFAULT_POSITIVE_THRESHOLD,
            common::DEFAULT_NEGATIVE_THRESHOLD,
        )
    }

    #[test]
    fn positive_text_is_labelled_positive() {
        let analyzer = default_analyzer();
        let score = analyzer.score("This is wonderful, amazing and fantastic news!");
        assert_eq!(score.label, SentimentLabel::Positive);
        assert!(score.compound >= common::DEFAULT_POSITIVE_THRESHOLD);
    }

    #[test]
    fn negative_text_is_labelled_negative() {
        let analyzer = default_analyzer();
        let score = analyzer.score("A terrible, horrible disaster killed many people.");
        assert_eq!(score.label, SentimentLabel::Negative);
        assert!(score.compound <= common::DEFAULT_NEGATIVE_THRESHOLD);
    }

    #[test]
    fn factual_text_is_labelled_neutral() {
        let analyzer = default_analyzer();
        let score = analyzer.score("The meeting is scheduled for Tuesday at noon.");
        assert_eq!(score.label, SentimentLabel::Neutral);
    }

    #[test]
    fn empty_text_is_neutral_zero() {
        let analyzer = default_analyzer();
        for text in ["", "   ", "\n\t"] {
            let score = analyzer.score(text);
            assert_eq!(score.label, SentimentLabel::Neutral);
            assert_eq!(score.compound, 0.0);
        }
    }

    #[test]
    fn thresholds_shift_labels() {
        // With a very high positive threshold, mildly positive text stays neutral
        let strict = SentimentAnalyzer::with_thresholds(0.99, -0.99);
        let score = strict.score("This is good.");
        assert_eq!(score.label, SentimentLabel::Neutral);
    }

    #[test]
    fn batch_scoring_builds_distribution() {
        let analyzer = default_analyzer();
        let make = |description: Option<&str>| crate::model::Article {
            title: "t".into(),
            source: "s".into(),
            author: None,
            description: description.map(str::to_string),
            url: None,
            image_url: None,
            published_at: None,
            content: None,
        };

        let articles = vec![
            make(Some("This is wonderful, amazing and fantastic news!")),
            make(Some("A terrible, horrible disaster killed many people.")),
            make(Some("The meeting is scheduled for Tuesday at noon.")),
            make(None),
        ];

        let (scored, dist) = analyzer.score_articles(articles);
        assert_eq!(scored.len(), 4);
        assert_eq!(dist.scored, 3);
        assert_eq!(dist.positive, 1);
        assert_eq!(dist.negative, 1);
        assert_eq!(dist.neutral, 1);
        assert!(scored[3].sentiment.is_none());
    }
}
