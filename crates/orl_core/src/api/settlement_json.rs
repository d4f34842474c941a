//! JSON API for settlement operations
//!
//! This module provides JSON-based API endpoints for host integration,
//! supporting cycle settlement, ledger queries, and audit schema export.

use crate::error::SettlementError;
use crate::models::{AuditEvent, BattleReport, CycleSummary, LedgerEntry};
use crate::pipeline::{AuditSink, CyclePipeline, ParticipantStore, StudioDirectory};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use tracing::{debug, error, info, warn};

/// API version for schema compatibility
pub const API_VERSION: &str = "v1";

/// Standard API response wrapper
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub schema_version: String,
    pub timestamp: DateTime<Utc>,
}

/// Structured API error with codes and details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

/// Cycle settlement request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSettlementRequest {
    pub schema_version: Option<String>,
    pub cycle_number: u32,
    pub reports: Vec<BattleReport>,
}

/// Cycle settlement response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CycleSettlementResponse {
    pub summary: CycleSummary,
}

/// Ledger query request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerQueryRequest {
    pub schema_version: Option<String>,
    pub cycle_number: u32,
}

/// Ledger query response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerQueryResponse {
    pub rows: Vec<LedgerEntry>,
    pub row_count: usize,
    pub total_revenue: i64,
}

impl ApiError {
    pub fn new(code: &str, message: &str) -> Self {
        Self { code: code.to_string(), message: message.to_string(), details: None }
    }

    pub fn with_details(
        code: &str,
        message: &str,
        details: HashMap<String, serde_json::Value>,
    ) -> Self {
        Self { code: code.to_string(), message: message.to_string(), details: Some(details) }
    }

    pub fn from_settlement_error(error: &SettlementError) -> Self {
        let code = match error {
            SettlementError::NonFiniteVitals { .. } => "NON_FINITE_VITALS",
            SettlementError::DuplicateRobot { .. } => "DUPLICATE_ROBOT",
            SettlementError::SideShape { .. } => "SIDE_SHAPE_MISMATCH",
            SettlementError::CycleMismatch { .. } => "CYCLE_MISMATCH",
            SettlementError::UnknownRobot { .. } => "UNKNOWN_ROBOT",
            SettlementError::StudioUnavailable { .. } => "STUDIO_UNAVAILABLE",
            SettlementError::LedgerWrite(_) => "LEDGER_WRITE_FAILED",
            SettlementError::Persistence(_) => "PERSISTENCE_FAILURE",
            SettlementError::AuditAppend(_) => "AUDIT_APPEND_FAILED",
        };
        Self::new(code, &error.to_string())
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
            schema_version: API_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(error: ApiError) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(error),
            schema_version: API_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }
}

impl CycleSettlementRequest {
    /// Validate the settlement request before it touches the pipeline
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref version) = self.schema_version {
            if version != API_VERSION {
                return Err(ApiError::new(
                    "UNSUPPORTED_SCHEMA_VERSION",
                    &format!("Unsupported schema version: {}", version),
                ));
            }
        }
        for report in &self.reports {
            if report.cycle_number != self.cycle_number {
                return Err(ApiError::new(
                    "CYCLE_MISMATCH",
                    &format!(
                        "Report {} belongs to cycle {}, request says cycle {}",
                        report.battle_id, report.cycle_number, self.cycle_number
                    ),
                ));
            }
            if let Err(e) = report.validate() {
                return Err(ApiError::from_settlement_error(&e));
            }
        }
        Ok(())
    }
}

impl LedgerQueryRequest {
    /// Validate the query request
    pub fn validate(&self) -> Result<(), ApiError> {
        if let Some(ref version) = self.schema_version {
            if version != API_VERSION {
                return Err(ApiError::new(
                    "UNSUPPORTED_SCHEMA_VERSION",
                    &format!("Unsupported schema version: {}", version),
                ));
            }
        }
        Ok(())
    }
}

/// Core API implementation functions

/// Settle a full cycle from a JSON request string
///
/// # Arguments
/// * `request_json` - JSON string containing CycleSettlementRequest
/// * `pipeline` - Settlement pipeline the cycle runs on
///
/// # Returns
/// JSON string containing ApiResponse<CycleSettlementResponse>
pub fn settle_cycle_json<P, D, A>(request_json: &str, pipeline: &CyclePipeline<P, D, A>) -> String
where
    P: ParticipantStore + Sync,
    D: StudioDirectory + Sync,
    A: AuditSink + Sync,
{
    info!("Processing cycle settlement request");

    // Parse the request
    let request: CycleSettlementRequest = match serde_json::from_str(request_json) {
        Ok(req) => req,
        Err(e) => {
            error!("Failed to parse CycleSettlementRequest: {}", e);
            let error = ApiError::new("INVALID_JSON", &format!("Invalid JSON format: {}", e));
            let response: ApiResponse<CycleSettlementResponse> = ApiResponse::error(error);
            return serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
        }
    };

    // Validate the request
    if let Err(error) = request.validate() {
        warn!("Cycle settlement request validation failed: {:?}", error);
        let response: ApiResponse<CycleSettlementResponse> = ApiResponse::error(error);
        return serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
    }

    // Run the cycle
    match pipeline.settle_cycle(request.cycle_number, &request.reports) {
        Ok(summary) => {
            info!(
                "Settled cycle {}: {} of {} battles, {} failed",
                summary.cycle_number,
                summary.settled,
                summary.scheduled,
                summary.failures.len()
            );
            let response = ApiResponse::success(CycleSettlementResponse { summary });
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        }
        Err(e) => {
            error!("Cycle settlement failed: {}", e);
            let response: ApiResponse<CycleSettlementResponse> =
                ApiResponse::error(ApiError::from_settlement_error(&e));
            serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
        }
    }
}

/// Fetch the revenue ledger rows for one cycle from a JSON request string
///
/// # Arguments
/// * `request_json` - JSON string containing LedgerQueryRequest
/// * `pipeline` - Settlement pipeline holding the ledger
///
/// # Returns
/// JSON string containing ApiResponse<LedgerQueryResponse>
pub fn query_ledger_json<P, D, A>(request_json: &str, pipeline: &CyclePipeline<P, D, A>) -> String
where
    P: ParticipantStore + Sync,
    D: StudioDirectory + Sync,
    A: AuditSink + Sync,
{
    debug!("Processing ledger query request");

    let request: LedgerQueryRequest = match serde_json::from_str(request_json) {
        Ok(req) => req,
        Err(e) => {
            error!("Failed to parse LedgerQueryRequest: {}", e);
            let error = ApiError::new("INVALID_JSON", &format!("Invalid JSON format: {}", e));
            let response: ApiResponse<LedgerQueryResponse> = ApiResponse::error(error);
            return serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
        }
    };

    if let Err(error) = request.validate() {
        warn!("Ledger query request validation failed: {:?}", error);
        let response: ApiResponse<LedgerQueryResponse> = ApiResponse::error(error);
        return serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
    }

    let rows = match pipeline.ledger_rows(request.cycle_number) {
        Ok(rows) => rows,
        Err(e) => {
            error!("Ledger query failed: {}", e);
            let response: ApiResponse<LedgerQueryResponse> =
                ApiResponse::error(ApiError::from_settlement_error(&e));
            return serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string());
        }
    };

    let total_revenue = rows.iter().map(|row| row.streaming_revenue).sum();
    let response = ApiResponse::success(LedgerQueryResponse {
        row_count: rows.len(),
        total_revenue,
        rows,
    });
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// Export the audit event JSON schema for downstream log consumers
///
/// # Returns
/// JSON string containing the AuditEvent root schema
pub fn export_audit_schema_json() -> String {
    debug!("Exporting audit event schema");
    let schema = AuditEvent::json_schema();
    serde_json::to_string(&schema).unwrap_or_else(|_| "{}".to_string())
}

// ============================================
// Tests
// ============================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::economy::EconomyConfig;
    use crate::models::{FighterReport, RobotRecord};
    use crate::pipeline::{
        MemoryAuditSink, MemoryParticipantStore, MemoryStudioDirectory, StableFacilities,
    };

    type MemoryPipeline =
        CyclePipeline<MemoryParticipantStore, MemoryStudioDirectory, MemoryAuditSink>;

    fn pipeline() -> MemoryPipeline {
        CyclePipeline::in_memory(EconomyConfig::standard())
    }

    fn seed_pair(pipeline: &MemoryPipeline) {
        for (robot_id, stable_id, name) in [(1, 1, "Havoc"), (2, 2, "Rustbucket")] {
            pipeline
                .studio_directory()
                .register(stable_id, StableFacilities::new(0, 0))
                .unwrap();
            pipeline
                .participant_store()
                .commit(vec![RobotRecord::new(robot_id, stable_id, name)])
                .unwrap();
        }
    }

    fn solo_report(cycle_number: u32) -> BattleReport {
        BattleReport::solo(
            cycle_number,
            FighterReport::new(1, 50.0, 0.0).with_damage(100.0, 180),
            FighterReport::new(2, 0.0, 0.0).with_damage(50.0, 180),
        )
        .with_duration(180, false)
    }

    fn settlement_request(cycle_number: u32, reports: Vec<BattleReport>) -> String {
        let request = CycleSettlementRequest {
            schema_version: Some(API_VERSION.to_string()),
            cycle_number,
            reports,
        };
        serde_json::to_string(&request).unwrap()
    }

    #[test]
    fn test_settle_cycle_json_roundtrip() {
        let pipeline = pipeline();
        seed_pair(&pipeline);

        let json = settle_cycle_json(&settlement_request(1, vec![solo_report(1)]), &pipeline);
        let response: ApiResponse<CycleSettlementResponse> = serde_json::from_str(&json).unwrap();

        assert!(response.success);
        assert!(response.error.is_none());
        assert_eq!(response.schema_version, API_VERSION);
        let summary = response.data.unwrap().summary;
        assert_eq!(summary.cycle_number, 1);
        assert_eq!(summary.scheduled, 1);
        assert_eq!(summary.settled, 1);
        assert!(summary.failures.is_empty());
    }

    #[test]
    fn test_invalid_json_reports_error_envelope() {
        let pipeline = pipeline();

        let json = settle_cycle_json("not json at all", &pipeline);
        let response: ApiResponse<CycleSettlementResponse> = serde_json::from_str(&json).unwrap();

        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.unwrap().code, "INVALID_JSON");
    }

    #[test]
    fn test_cycle_mismatch_rejected_before_settlement() {
        let pipeline = pipeline();
        seed_pair(&pipeline);

        let json = settle_cycle_json(&settlement_request(2, vec![solo_report(3)]), &pipeline);
        let response: ApiResponse<CycleSettlementResponse> = serde_json::from_str(&json).unwrap();

        assert!(!response.success);
        assert_eq!(response.error.unwrap().code, "CYCLE_MISMATCH");
        // Rejected requests must leave no trace in the pipeline.
        assert!(pipeline.audit_sink().is_empty());
        assert_eq!(pipeline.participant_store().get(1).unwrap().total_battles, 0);
    }

    #[test]
    fn test_unsupported_schema_version_rejected() {
        let pipeline = pipeline();
        let request = CycleSettlementRequest {
            schema_version: Some("v9".to_string()),
            cycle_number: 1,
            reports: Vec::new(),
        };

        let json = settle_cycle_json(&serde_json::to_string(&request).unwrap(), &pipeline);
        let response: ApiResponse<CycleSettlementResponse> = serde_json::from_str(&json).unwrap();

        assert!(!response.success);
        assert_eq!(response.error.unwrap().code, "UNSUPPORTED_SCHEMA_VERSION");
    }

    #[test]
    fn test_ledger_query_reports_cycle_rows() {
        let pipeline = pipeline();
        seed_pair(&pipeline);
        settle_cycle_json(&settlement_request(1, vec![solo_report(1)]), &pipeline);

        let query =
            LedgerQueryRequest { schema_version: None, cycle_number: 1 };
        let json = query_ledger_json(&serde_json::to_string(&query).unwrap(), &pipeline);
        let response: ApiResponse<LedgerQueryResponse> = serde_json::from_str(&json).unwrap();

        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data.row_count, 2);
        // Winner pays out on post-battle fame 2 (1001), loser on fame 0 (1000).
        assert_eq!(data.total_revenue, 2001);
        assert!(data.rows.iter().all(|row| row.cycle_number == 1));

        // A cycle that never ran has no rows.
        let empty_query =
            LedgerQueryRequest { schema_version: None, cycle_number: 9 };
        let json = query_ledger_json(&serde_json::to_string(&empty_query).unwrap(), &pipeline);
        let response: ApiResponse<LedgerQueryResponse> = serde_json::from_str(&json).unwrap();
        let data = response.data.unwrap();
        assert_eq!(data.row_count, 0);
        assert_eq!(data.total_revenue, 0);
    }

    #[test]
    fn test_audit_schema_export_is_valid_json() {
        let schema_json = export_audit_schema_json();
        let value: serde_json::Value = serde_json::from_str(&schema_json).unwrap();

        assert!(value.get("definitions").is_some());
        assert!(schema_json.contains("BattleAuditPayload"));
    }
}
