use std::time::Duration;

use opentelemetry::{otel_debug, otel_warn};
use opentelemetry_proto::collector::logs::v1::{
    ExportLogsServiceRequest, ExportLogsServiceResponse,
};
use opentelemetry_sdk::error::OTelSdkResult;
use opentelemetry_sdk::logs::LogBatch;
use prost::Message;

use super::OtlpHttpClient;

impl OtlpHttpClient {
    pub(crate) fn export_logs(&self, batch: LogBatch<'_>, timeout: Option<Duration>) -> OTelSdkResult {
        let record_count = batch.len();
        let body = ExportLogsServiceRequest::from(batch).encode_to_vec();
        otel_debug!(name: "OtlpHttpExporter.ExportLogs", record_count = record_count);

        let response = self.export_payload(body, timeout)?;

        // An empty or unreadable body is a full success.
        if let Some(partial) = ExportLogsServiceResponse::decode(response)
            .ok()
            .and_then(|response| response.partial_success)
        {
            if partial.rejected_log_records > 0 || !partial.error_message.is_empty() {
                otel_warn!(
                    name: "OtlpHttpExporter.PartialSuccess",
                    rejected_log_records = partial.rejected_log_records,
                    error_message = partial.error_message.as_str()
                );
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{client_for, MockCollector, Reply};
    use super::*;
    use opentelemetry::logs::Severity;
    use opentelemetry_proto::collector::logs::v1::ExportLogsPartialSuccess;
    use opentelemetry_sdk::logs::{InMemoryLogExporter, SdkLoggerProvider};

    fn emitted_records() -> Vec<opentelemetry_sdk::logs::LogRecordData> {
        let exporter = InMemoryLogExporter::default();
        let provider = SdkLoggerProvider::builder()
            .with_simple_exporter(exporter.clone())
            .build();
        let logger = provider.logger("checkout");
        for body in ["first", "second"] {
            let mut record = logger.create_log_record();
            record.set_severity_number(Severity::Warn);
            record.set_body(body.into());
            logger.emit(record);
        }
        exporter.get_emitted_logs().unwrap()
    }

    #[test]
    fn batch_is_sent_as_one_protobuf_request() {
        let collector = MockCollector::replying([]);
        let client = client_for(&collector);
        let records = emitted_records();

        client.export_logs(LogBatch::new(&records), None).unwrap();

        let requests = collector.requests.lock().unwrap();
        assert_eq!(requests.len(), 1);
        let request = ExportLogsServiceRequest::decode(requests[0].body().clone()).unwrap();
        let scope_logs = &request.resource_logs[0].scope_logs[0];
        assert_eq!(scope_logs.scope.as_ref().unwrap().name, "checkout");
        assert_eq!(scope_logs.log_records.len(), 2);
    }

    #[test]
    fn partial_success_is_still_success() {
        let response = ExportLogsServiceResponse {
            partial_success: Some(ExportLogsPartialSuccess {
                rejected_log_records: 1,
                error_message: "record too large".to_string(),
            }),
        };
        let collector = MockCollector::replying([Reply::StatusWithBody(200, response.encode_to_vec())]);
        let client = client_for(&collector);
        let records = emitted_records();

        assert!(client.export_logs(LogBatch::new(&records), None).is_ok());
    }
}
