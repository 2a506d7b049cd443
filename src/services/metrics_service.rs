// src/services/metrics_service.rs

use std::sync::Arc;

use crate::{
    common::error::AppError,
    db::CrmStore,
    models::metrics::PipelineMetrics,
};

#[derive(Clone)]
pub struct MetricsService {
    store: Arc<dyn CrmStore>,
}

impl MetricsService {
    pub fn new(store: Arc<dyn CrmStore>) -> Self {
        Self { store }
    }

    pub async fn pipeline(&self) -> Result<PipelineMetrics, AppError> {
        let totals = self.store.pipeline_totals().await?;
        Ok(PipelineMetrics::from(totals))
    }
}
