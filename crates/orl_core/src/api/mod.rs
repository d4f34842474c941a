pub mod settlement_json;

pub use settlement_json::{
    export_audit_schema_json, query_ledger_json, settle_cycle_json, ApiError, ApiResponse,
    CycleSettlementRequest, CycleSettlementResponse, LedgerQueryRequest, LedgerQueryResponse,
    API_VERSION,
};
