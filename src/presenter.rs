//! Reactive pipeline from map viewport to visible markers.
//!
//! For every viewport/override combination the presenter selects a
//! granularity, fetches (or replays) the matching directory dataset, culls
//! sites to the frame and emits the result. Aggregates are emitted whole.
//!
//! Inputs are `tokio::sync::watch` receivers, so a late subscriber always
//! starts from the current value. The output streams switch to the latest
//! input: a cycle still waiting on a fetch is dropped as soon as any input
//! changes, and its fetch finishes in the background to fill the cache.

use crate::cache::ResultCache;
use crate::config::Config;
use crate::culling::ViewportCullingService;
use crate::error::Result;
use crate::lod::LevelOfDetailSelector;
use crate::model::{
    DisplayGranularity, Feature, FeatureCollection, Highlight, HighlightedStructure,
    MarkerProperties, StructurePresentation,
};
use crate::repository::{DirectoryRepository, ingest};
use cartography_types::{CenterView, Viewport};
use futures::stream::{self, Stream, StreamExt};
use std::sync::Arc;
use tokio::sync::watch;

const SITE_LAYER: &str = "site";

/// One emission: features of a single granularity.
#[derive(Debug, Clone, PartialEq)]
pub struct VisibleFeatures {
    pub granularity: DisplayGranularity,
    pub features: FeatureCollection<MarkerProperties>,
}

impl VisibleFeatures {
    fn empty(granularity: DisplayGranularity) -> Self {
        Self {
            granularity,
            features: FeatureCollection::empty(),
        }
    }

    /// List rows for the visible sites; empty for aggregates.
    pub fn structure_summaries(&self) -> Vec<StructurePresentation> {
        if self.granularity != DisplayGranularity::Site {
            return Vec::new();
        }
        self.features
            .iter()
            .filter_map(|feature| feature.properties().as_site())
            .map(StructurePresentation::from)
            .collect()
    }
}

/// Orchestrates selection, fetching and culling for the map view.
pub struct AggregationPresenter<R> {
    repository: Arc<R>,
    config: Config,
    selector: LevelOfDetailSelector,
    datasets: ResultCache<DisplayGranularity, Arc<Vec<Feature>>>,
    culling: ViewportCullingService<MarkerProperties>,
    highlight: watch::Sender<Option<HighlightedStructure>>,
}

impl<R: DirectoryRepository> AggregationPresenter<R> {
    pub fn new(repository: Arc<R>, config: Config) -> Result<Self> {
        config.validate()?;
        let selector = LevelOfDetailSelector::new(config.zoom)?;
        let (highlight, _) = watch::channel(None);

        Ok(Self {
            repository,
            culling: ViewportCullingService::new(config.clustering)?,
            config,
            selector,
            datasets: ResultCache::new(),
            highlight,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Viewport to seed the viewport channel with.
    pub fn default_viewport(&self) -> Viewport {
        self.config.default_viewport
    }

    pub fn granularity(&self, zoom_level: i32, force_finest_detail: bool) -> DisplayGranularity {
        self.selector.select(zoom_level, force_finest_detail)
    }

    /// Whether the site index has been built.
    pub fn is_site_index_ready(&self) -> bool {
        self.culling.is_ready(SITE_LAYER)
    }

    /// Run one selection cycle for a single viewport.
    ///
    /// A failed fetch is logged and yields an empty result for the selected
    /// granularity; the next cycle retries it.
    pub async fn points_of_interest(
        &self,
        viewport: &Viewport,
        force_finest_detail: bool,
    ) -> VisibleFeatures {
        let granularity = self.selector.select(viewport.zoom_level, force_finest_detail);

        let dataset = match self.dataset(granularity).await {
            Ok(dataset) => dataset,
            Err(e) => {
                log::warn!("No {} markers for this view: {}", granularity, e);
                return VisibleFeatures::empty(granularity);
            }
        };

        let features = match granularity {
            DisplayGranularity::Site => self.culling.cull(SITE_LAYER, &dataset, viewport),
            DisplayGranularity::Region | DisplayGranularity::Department => {
                FeatureCollection::new(dataset.as_ref().clone())
            }
        };

        let highlighted = self.highlight.borrow().clone();
        VisibleFeatures {
            granularity,
            features: apply_highlight(features, highlighted.as_ref()),
        }
    }

    async fn dataset(&self, granularity: DisplayGranularity) -> Result<Arc<Vec<Feature>>> {
        let repository = Arc::clone(&self.repository);
        self.datasets
            .request(granularity, move || async move {
                let source = granularity.as_str();
                let features = match granularity {
                    DisplayGranularity::Region => {
                        ingest(source, repository.list_by_region().await?)
                    }
                    DisplayGranularity::Department => {
                        ingest(source, repository.list_by_department().await?)
                    }
                    DisplayGranularity::Site => ingest(source, repository.list_sites().await?),
                };
                Ok::<_, crate::error::CartographyError>(Arc::new(features))
            })
            .await
    }

    /// Visible features for the latest viewport and override flag.
    ///
    /// Emits once for the current inputs, then once per change, including
    /// highlight changes. Ends when the viewport sender is dropped.
    pub fn visible_points_of_interest(
        &self,
        viewport: watch::Receiver<Viewport>,
        force_finest_detail: watch::Receiver<bool>,
    ) -> impl Stream<Item = VisibleFeatures> + '_ {
        let inputs = Inputs::new(viewport, force_finest_detail, self.highlight.subscribe());

        stream::unfold((inputs, true), move |(mut inputs, first)| async move {
            if !first && !inputs.changed().await {
                return None;
            }

            loop {
                let (viewport, force) = inputs.latest();
                tokio::select! {
                    biased;
                    changed = inputs.changed() => {
                        if !changed {
                            return None;
                        }
                        log::debug!("Inputs changed before the cycle finished, restarting");
                    }
                    visible = self.points_of_interest(&viewport, force) => {
                        return Some((visible, (inputs, false)));
                    }
                }
            }
        })
    }

    /// Companion list rows, empty unless individual sites are shown.
    pub fn visible_structure_summaries(
        &self,
        viewport: watch::Receiver<Viewport>,
        force_finest_detail: watch::Receiver<bool>,
    ) -> impl Stream<Item = Vec<StructurePresentation>> + '_ {
        self.visible_points_of_interest(viewport, force_finest_detail)
            .map(|visible| visible.structure_summaries())
    }

    /// Mark a site as selected.
    pub fn focus_structure(&self, id: impl Into<String>) {
        self.set_highlight(Some(HighlightedStructure {
            id: id.into(),
            kind: Highlight::Focus,
        }));
    }

    /// Mark a site as hovered.
    pub fn hint_structure(&self, id: impl Into<String>) {
        self.set_highlight(Some(HighlightedStructure {
            id: id.into(),
            kind: Highlight::Hint,
        }));
    }

    pub fn clear_structure_highlight(&self) {
        self.set_highlight(None);
    }

    pub fn highlighted_structure(&self) -> Option<HighlightedStructure> {
        self.highlight.borrow().clone()
    }

    fn set_highlight(&self, highlight: Option<HighlightedStructure>) {
        self.highlight.send_replace(highlight);
    }

    /// Where the map should fly when an aggregate marker is activated.
    pub fn drill_down(&self, feature: &Feature) -> Option<CenterView> {
        feature.drill_down()
    }
}

fn apply_highlight(
    features: FeatureCollection<MarkerProperties>,
    highlighted: Option<&HighlightedStructure>,
) -> FeatureCollection<MarkerProperties> {
    let Some(highlighted) = highlighted else {
        return features;
    };

    features
        .into_iter()
        .map(|feature| {
            feature.map_properties(|properties| match properties {
                MarkerProperties::Site { site, .. } => {
                    let highlight = (site.id == highlighted.id).then_some(highlighted.kind);
                    MarkerProperties::Site { site, highlight }
                }
                aggregate => aggregate,
            })
        })
        .collect()
}

/// Receivers the output streams react to.
struct Inputs {
    viewport: watch::Receiver<Viewport>,
    force: watch::Receiver<bool>,
    highlight: watch::Receiver<Option<HighlightedStructure>>,
    force_open: bool,
    highlight_open: bool,
}

impl Inputs {
    fn new(
        viewport: watch::Receiver<Viewport>,
        force: watch::Receiver<bool>,
        highlight: watch::Receiver<Option<HighlightedStructure>>,
    ) -> Self {
        Self {
            viewport,
            force,
            highlight,
            force_open: true,
            highlight_open: true,
        }
    }

    /// Current values, marking every input as seen.
    fn latest(&mut self) -> (Viewport, bool) {
        let viewport = *self.viewport.borrow_and_update();
        let force = *self.force.borrow_and_update();
        let _ = self.highlight.borrow_and_update();
        (viewport, force)
    }

    /// Wait until any input changes. Returns false once the viewport sender
    /// is gone; a closed override or highlight source keeps its last value.
    async fn changed(&mut self) -> bool {
        loop {
            tokio::select! {
                changed = self.viewport.changed() => return changed.is_ok(),
                changed = self.force.changed(), if self.force_open => match changed {
                    Ok(()) => return true,
                    Err(_) => self.force_open = false,
                },
                changed = self.highlight.changed(), if self.highlight_open => match changed {
                    Ok(()) => return true,
                    Err(_) => self.highlight_open = false,
                },
            }
        }
    }
}
