use std::time::Duration;

use opentelemetry::{otel_debug, otel_warn};
use opentelemetry_proto::collector::metrics::v1::{
    ExportMetricsServiceRequest, ExportMetricsServiceResponse,
};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::metrics::data::ResourceMetrics;
use prost::Message;

use super::OtlpHttpClient;

impl OtlpHttpClient {
    pub(crate) fn export_metrics(
        &self,
        metrics: &ResourceMetrics,
        timeout: Option<Duration>,
    ) -> OTelSdkResult {
        let body = ExportMetricsServiceRequest::from(metrics).encode_to_vec();
        otel_debug!(
            name: "OtlpHttpExporter.ExportMetrics",
            scope_count = metrics.scope_metrics.len()
        );

        let response = self.export_payload(body, timeout)?;

        if let Some(partial) = ExportMetricsServiceResponse::decode(response)
            .ok()
            .and_then(|response| response.partial_success)
        {
            if partial.rejected_data_points > 0 || !partial.error_message.is_empty() {
                otel_warn!(
                    name: "OtlpHttpExporter.PartialSuccess",
                    rejected_data_points = partial.rejected_data_points,
                    error_message = partial.error_message.as_str()
                );
            }
        }
        Ok(())
    }
}
