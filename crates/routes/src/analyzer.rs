use std::sync::Arc;

use rayon::prelude::*;

use crate::{
    cache::{TtlCache, hash_points, hash_query},
    config::AnalysisConfig,
    metrics::basic_metrics,
    models::{Bounds, RouteStatistics, TrackPoint, TrafficAnalysis},
    retry::Cancellation,
    statistics::calculate_route_statistics,
    traffic::{Infrastructure, OverpassClient, analyze_traffic_stops, overpass},
};

pub const TRAFFIC_DISABLED_REASON: &str = "Traffic analysis disabled for performance";

/// Runs route analyses and owns everything that outlives a single request: configuration,
/// the map-data client, both result caches and the batch thread pool.
pub struct RouteAnalyzer {
    config: AnalysisConfig,
    client: Option<OverpassClient>,
    infrastructure_cache: TtlCache<String, Arc<Infrastructure>>,
    statistics_cache: TtlCache<(u64, bool), Arc<RouteStatistics>>,
    pool: rayon::ThreadPool,
}

impl RouteAnalyzer {
    /// Builds an analyzer that talks to the configured Overpass endpoint.
    pub fn new(config: AnalysisConfig) -> anyhow::Result<Self> {
        let client = OverpassClient::new(&config.overpass)?;
        Self::with_client(config, Some(client))
    }

    /// Builds an analyzer around an existing client, or none at all to run offline.
    pub fn with_client(
        config: AnalysisConfig,
        client: Option<OverpassClient>,
    ) -> anyhow::Result<Self> {
        let pool = rayon::ThreadPoolBuilder::new()
            .thread_name(|i| format!("route-analysis-{i}"))
            .build()?;

        Ok(Self {
            infrastructure_cache: TtlCache::new(
                config.cache.infrastructure_ttl,
                config.cache.max_entries,
            ),
            statistics_cache: TtlCache::new(config.cache.statistics_ttl, config.cache.max_entries),
            config,
            client,
            pool,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyzes one route. `include_traffic` overrides the configured default.
    pub async fn analyze(
        &self,
        points: &[TrackPoint],
        include_traffic: Option<bool>,
    ) -> Arc<RouteStatistics> {
        self.analyze_with_cancel(points, include_traffic, &Cancellation::new())
            .await
    }

    /// Like [`RouteAnalyzer::analyze`], abandoning the infrastructure lookup once `cancel` fires.
    pub async fn analyze_with_cancel(
        &self,
        points: &[TrackPoint],
        include_traffic: Option<bool>,
        cancel: &Cancellation,
    ) -> Arc<RouteStatistics> {
        let include_traffic = include_traffic.unwrap_or(self.config.enable_traffic_analysis);
        let key = (hash_points(points), include_traffic);

        if let Some(stats) = self.statistics_cache.get(&key) {
            tracing::debug!("Statistics cache hit for {} points", points.len());
            return stats;
        }

        let traffic = if points.len() < 2 {
            None
        } else if include_traffic {
            Some(self.traffic_analysis(points, cancel).await)
        } else {
            tracing::info!("Skipping traffic analysis (disabled)");
            Some(TrafficAnalysis::unavailable(TRAFFIC_DISABLED_REASON))
        };

        // A degraded traffic lookup is retried by the next caller
        let degraded = include_traffic
            && traffic.as_ref().is_some_and(|t| !t.analysis_available);

        let stats = Arc::new(calculate_route_statistics(points, traffic));
        if !degraded {
            self.statistics_cache.insert(key, stats.clone());
        }
        stats
    }

    /// Analyzes many routes in parallel, without the traffic stage.
    pub fn analyze_batch(&self, routes: &[Vec<TrackPoint>]) -> Vec<Arc<RouteStatistics>> {
        tracing::info!("Analyzing batch of {} routes", routes.len());
        self.pool.install(|| {
            routes
                .par_iter()
                .map(|points| {
                    let key = (hash_points(points), false);
                    if let Some(stats) = self.statistics_cache.get(&key) {
                        return stats;
                    }
                    let traffic = (points.len() >= 2)
                        .then(|| TrafficAnalysis::unavailable(TRAFFIC_DISABLED_REASON));
                    let stats = Arc::new(calculate_route_statistics(points, traffic));
                    self.statistics_cache.insert(key, stats.clone());
                    stats
                })
                .collect()
        })
    }

    async fn traffic_analysis(&self, points: &[TrackPoint], cancel: &Cancellation) -> TrafficAnalysis {
        let Some(client) = &self.client else {
            return TrafficAnalysis::unavailable("Traffic analysis is not configured");
        };
        let Some(bounds) = Bounds::from_points(points) else {
            return TrafficAnalysis::unavailable("Route has no points");
        };

        let window = bounds.expand(self.config.traffic.bounds_margin_deg);
        let infrastructure = match self.infrastructure(client, &window, cancel).await {
            Ok(infrastructure) => infrastructure,
            Err(reason) => {
                tracing::warn!("Traffic analysis unavailable: {reason}");
                return TrafficAnalysis::unavailable(reason);
            }
        };

        let distance_km = basic_metrics(points).total_distance_km;
        let analysis =
            analyze_traffic_stops(points, &infrastructure, distance_km, &self.config.traffic);
        tracing::info!(
            "Traffic analysis: {} potential stops, {} traffic lights",
            analysis.total_potential_stops,
            analysis.traffic_lights_detected
        );
        analysis
    }

    async fn infrastructure(
        &self,
        client: &OverpassClient,
        window: &Bounds,
        cancel: &Cancellation,
    ) -> Result<Arc<Infrastructure>, String> {
        let key = hash_query(&format!(
            "{}\n{}",
            overpass::traffic_light_query(window),
            overpass::major_roads_query(window)
        ));

        if let Some(infrastructure) = self.infrastructure_cache.get(&key) {
            tracing::debug!("Infrastructure cache hit for {key}");
            return Ok(infrastructure);
        }

        let infrastructure = client
            .fetch_infrastructure(window, cancel)
            .await
            .map(Arc::new)
            .map_err(|e| format!("Traffic analysis failed: {e}"))?;
        self.infrastructure_cache.insert(key, infrastructure.clone());
        Ok(infrastructure)
    }
}
