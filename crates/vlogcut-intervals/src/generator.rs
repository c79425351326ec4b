//! End-to-end plan generation: narrative + annotations -> cutting plan.

use std::path::Path;
use std::sync::Arc;

use tracing::info;

use vlogcut_models::{CuttingPlan, PlanParams, TimestampedEvent};
use vlogcut_oracle::IntervalOracle;

use crate::annotation::parse_annotation_dir;
use crate::config::SelectionConfig;
use crate::enhancer::{enhance_descriptions, EnhanceSummary};
use crate::error::{IntervalError, IntervalResult};
use crate::grouping::group_by_source;
use crate::selector::{select_intervals, SelectionReport};

/// A generated plan plus what happened while building it.
#[derive(Debug, Clone)]
pub struct GeneratedPlan {
    pub plan: CuttingPlan,
    pub report: SelectionReport,
    pub descriptions: EnhanceSummary,
}

/// Builds cutting plans from a narrative and per-source annotations.
pub struct NarrativeIntervalGenerator {
    config: SelectionConfig,
    oracle: Option<Arc<dyn IntervalOracle>>,
}

impl NarrativeIntervalGenerator {
    pub fn new(config: SelectionConfig) -> Self {
        Self { config, oracle: None }
    }

    pub fn with_oracle(mut self, oracle: Arc<dyn IntervalOracle>) -> Self {
        self.oracle = Some(oracle);
        self
    }

    pub fn config(&self) -> &SelectionConfig {
        &self.config
    }

    /// Read the narrative file and annotation directory and build a plan.
    pub async fn generate(
        &self,
        narrative_file: impl AsRef<Path>,
        annotation_dir: impl AsRef<Path>,
    ) -> IntervalResult<GeneratedPlan> {
        let narrative_file = narrative_file.as_ref();
        let annotation_dir = annotation_dir.as_ref();

        if !narrative_file.is_file() {
            return Err(IntervalError::not_found(narrative_file));
        }
        let narrative = tokio::fs::read_to_string(narrative_file).await?;
        info!(
            narrative = %narrative_file.display(),
            chars = narrative.chars().count(),
            "Loaded narrative"
        );

        let events = parse_annotation_dir(annotation_dir).await?;

        let params = PlanParams {
            target_duration: self.config.target_duration,
            suggested_interval_duration: self.config.suggested_interval_duration,
            narrative_file: Some(narrative_file.display().to_string()),
            annotation_dir: Some(annotation_dir.display().to_string()),
        };
        self.generate_from_events(&narrative, events, params).await
    }

    /// Build a plan from already-parsed events.
    pub async fn generate_from_events(
        &self,
        narrative: &str,
        events: Vec<TimestampedEvent>,
        params: PlanParams,
    ) -> IntervalResult<GeneratedPlan> {
        if events.is_empty() {
            return Err(IntervalError::NoContent);
        }

        let groups = group_by_source(events);
        let oracle = self.oracle.as_deref();

        let selection = select_intervals(&groups, &self.config, narrative, oracle).await?;
        if selection.intervals.is_empty() {
            return Err(IntervalError::NoIntervals);
        }

        let mut intervals = selection.intervals;
        let descriptions = enhance_descriptions(&mut intervals, &groups, narrative, oracle).await;

        let plan = CuttingPlan::from_selection(&intervals, params);
        plan.validate()?;

        info!(
            intervals = plan.metadata.total_intervals,
            total_secs = plan.metadata.actual_total_duration,
            target_secs = plan.metadata.target_duration,
            sources = ?plan.metadata.sources_used,
            "Cutting plan generated"
        );

        Ok(GeneratedPlan {
            plan,
            report: selection.report,
            descriptions,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    fn write_fixture(dir: &Path) {
        let mut part_a = String::new();
        for t in (0..=60).step_by(5) {
            part_a.push_str(&format!("[transcript:{}] Alice: line {}\n", t, t));
        }
        part_a.push_str("[keyframe:00:01:00] sunset over the pier\n");

        let mut part_b = String::new();
        for t in (0..=180).step_by(10) {
            part_b.push_str(&format!("[keyframe:{}] frame {}\n", t, t));
        }

        fs::write(dir.join("partA_processed.txt"), part_a).unwrap();
        fs::write(dir.join("partB_processed.txt"), part_b).unwrap();
    }

    #[tokio::test]
    async fn test_generate_without_oracle() {
        let work = tempfile::tempdir().unwrap();
        let annotations = work.path().join("annotations");
        fs::create_dir(&annotations).unwrap();
        write_fixture(&annotations);
        let narrative = work.path().join("story.txt");
        fs::write(&narrative, "We spent a day at the pier.").unwrap();

        let generator = NarrativeIntervalGenerator::new(SelectionConfig::new(60, 5));
        let generated = generator.generate(&narrative, &annotations).await.unwrap();
        let plan = &generated.plan;

        assert!(plan.metadata.actual_total_duration <= 60.0);
        assert_eq!(plan.metadata.sources_used, vec!["partA", "partB"]);
        assert_eq!(plan.metadata.min_interval_duration, 3);
        assert_eq!(plan.metadata.max_interval_duration, 7);
        assert_eq!(plan.intervals[0].index, 1);
        assert_eq!(plan.intervals[0].description, "Selected segment from partA");
        assert_eq!(generated.report.fallback_sources(), 2);

        let saved = work.path().join("plan.json");
        plan.save(&saved).unwrap();
        assert_eq!(&CuttingPlan::load(&saved).unwrap(), plan);
    }

    #[tokio::test]
    async fn test_missing_narrative_is_not_found() {
        let work = tempfile::tempdir().unwrap();
        let generator = NarrativeIntervalGenerator::new(SelectionConfig::default());
        let result = generator.generate(work.path().join("nope.txt"), work.path()).await;
        assert!(matches!(result, Err(IntervalError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_annotations_without_events_is_no_content() {
        let work = tempfile::tempdir().unwrap();
        fs::write(work.path().join("a_processed.txt"), "no tagged lines here\n").unwrap();
        let narrative = work.path().join("story.txt");
        fs::write(&narrative, "story").unwrap();

        let generator = NarrativeIntervalGenerator::new(SelectionConfig::default());
        let result = generator.generate(&narrative, work.path()).await;
        assert!(matches!(result, Err(IntervalError::NoContent)));
    }

    #[tokio::test]
    async fn test_nothing_selectable_is_no_intervals() {
        let generator = NarrativeIntervalGenerator::new(SelectionConfig::default());
        let events = vec![TimestampedEvent::keyframe("still", 0.0, "only frame")];
        let params = PlanParams {
            target_duration: 60,
            suggested_interval_duration: 5,
            narrative_file: None,
            annotation_dir: None,
        };

        let result = generator.generate_from_events("story", events, params).await;
        assert!(matches!(result, Err(IntervalError::NoIntervals)));
    }
}
