use super::*;

#[tokio::test]
async fn unreachable_plane_surfaces_as_transport_error() {
    let client = DaemonClient::new("http://127.0.0.1:1".to_string());
    let err = client.list_bridges().await.expect_err("connection should fail");
    assert!(matches!(err, ClientError::Transport(_)));
}

#[test]
fn rejected_error_formats_code_and_message() {
    let err = ClientError::Rejected { code: "not_found".to_string(), message: "no such bridge".to_string() };
    assert_eq!(err.to_string(), "not_found: no such bridge");
}
