//! Integration tests for the execution gateway.
//!
//! Safety checks must fail before any connection is attempted, unknown
//! servers must be reported with the available names, and the admission lease
//! must be released on every failure path. All of these are observable
//! without a database: the registry entries point at nothing.

use sqldiag_mcp_server::db::params::{RoutineParams, set_param};
use sqldiag_mcp_server::db::registry::{ServerEntry, ServerRegistry};
use sqldiag_mcp_server::error::DiagError;
use sqldiag_mcp_server::gate::{
    AdmissionControl, ExecutionGateway, GatewayLimits, ToolkitCatalog,
};
use std::time::Duration;
use tokio::time::timeout;

fn test_catalog() -> ToolkitCatalog {
    ToolkitCatalog::new(
        "test-kit",
        &["sp_Allowed"],
        &["@OutputTableName"],
        "output parameters are blocked",
        "Install the test kit first.",
    )
}

fn gateway_with_admission(admission: AdmissionControl) -> ExecutionGateway {
    // The connection string is syntactically valid but points nowhere; any
    // test that passes the safety layer would fail with a connection error.
    let registry = ServerRegistry::new([ServerEntry::new(
        "testserver",
        "Server=tcp:localhost,1433;User Id=sa;Password=x;TrustServerCertificate=true",
    )]);
    ExecutionGateway::new(registry, admission, GatewayLimits::default())
}

fn gateway() -> ExecutionGateway {
    gateway_with_admission(AdmissionControl::unbounded())
}

/// A routine outside the allow-list is rejected without touching the network.
#[tokio::test]
async fn test_unauthorized_routine_fails_fast() {
    let catalog = test_catalog();
    let err = timeout(
        Duration::from_millis(500),
        gateway().execute_routine(
            &catalog,
            "testserver",
            "sp_Evil",
            RoutineParams::new(),
            None,
        ),
    )
    .await
    .expect("safety rejection must not wait on any I/O")
    .unwrap_err();

    assert!(matches!(err, DiagError::UnauthorizedRoutine { .. }));
    assert!(err.to_string().contains("sp_Evil"));
    assert!(err.to_string().contains("not in the allowed list"));
}

/// Allowed-routine case variants proceed past the routine check and reach the
/// parameter check.
#[tokio::test]
async fn test_allowed_routine_case_variants_reach_parameter_check() {
    let catalog = test_catalog();
    for routine in ["sp_Allowed", "SP_ALLOWED", "sp_allowed"] {
        let mut parameters = RoutineParams::new();
        set_param(&mut parameters, "@OutputTableName", "x");
        let err = gateway()
            .execute_routine(&catalog, "testserver", routine, parameters, None)
            .await
            .unwrap_err();
        assert!(
            matches!(err, DiagError::BlockedParameter { .. }),
            "case variant {} should pass the routine check and fail on the parameter",
            routine
        );
    }
}

/// A blocked parameter in any case fails before a connection is opened.
#[tokio::test]
async fn test_blocked_parameter_fails_fast() {
    let catalog = test_catalog();
    let mut parameters = RoutineParams::new();
    set_param(&mut parameters, "@Top", 10);
    set_param(&mut parameters, "@OUTPUTTABLENAME", "HackerTable");

    let err = timeout(
        Duration::from_millis(500),
        gateway().execute_routine(
            &catalog,
            "testserver",
            "sp_Allowed",
            parameters,
            None,
        ),
    )
    .await
    .expect("safety rejection must not wait on any I/O")
    .unwrap_err();

    assert!(matches!(err, DiagError::BlockedParameter { .. }));
    assert!(err.to_string().contains("output parameters are blocked"));
}

/// An unknown server is reported with the configured names.
#[tokio::test]
async fn test_unknown_server_lists_available() {
    let catalog = test_catalog();
    let err = gateway()
        .execute_routine(
            &catalog,
            "nosuch",
            "sp_Allowed",
            RoutineParams::new(),
            None,
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DiagError::UnknownServer { .. }));
    let msg = err.to_string();
    assert!(msg.contains("Server 'nosuch' not found"));
    assert!(msg.contains("testserver"));
}

/// Ad-hoc SQL that is not read-only is rejected before admission or I/O.
#[tokio::test]
async fn test_execute_query_rejects_writes() {
    let err = gateway()
        .execute_query("testserver", None, "DELETE FROM t")
        .await
        .unwrap_err();
    assert!(matches!(err, DiagError::InvalidInput { .. }));
}

/// The lease is released on the safety-failure path: with one concurrency
/// slot, repeated failing calls would deadlock if a lease leaked.
#[tokio::test]
async fn test_lease_released_on_safety_failure() {
    let catalog = test_catalog();
    let gateway = gateway_with_admission(AdmissionControl::governed(1, 1000));

    for _ in 0..3 {
        let err = timeout(
            Duration::from_secs(1),
            gateway.execute_routine(
                &catalog,
                "testserver",
                "sp_Evil",
                RoutineParams::new(),
                None,
            ),
        )
        .await
        .expect("a leaked lease would make this call hang")
        .unwrap_err();
        assert!(matches!(err, DiagError::UnauthorizedRoutine { .. }));
    }
}

/// The lease is also released when server resolution fails.
#[tokio::test]
async fn test_lease_released_on_unknown_server() {
    let catalog = test_catalog();
    let gateway = gateway_with_admission(AdmissionControl::governed(1, 1000));

    for _ in 0..3 {
        let err = timeout(
            Duration::from_secs(1),
            gateway.execute_routine(
                &catalog,
                "nosuch",
                "sp_Allowed",
                RoutineParams::new(),
                None,
            ),
        )
        .await
        .expect("a leaked lease would make this call hang")
        .unwrap_err();
        assert!(matches!(err, DiagError::UnknownServer { .. }));
    }
}

/// Safety checks run before server resolution: a bad routine on a bad server
/// reports the routine, not the server.
#[tokio::test]
async fn test_routine_check_precedes_server_resolution() {
    let catalog = test_catalog();
    let err = gateway()
        .execute_routine(&catalog, "nosuch", "sp_Evil", RoutineParams::new(), None)
        .await
        .unwrap_err();
    assert!(matches!(err, DiagError::UnauthorizedRoutine { .. }));
}
