//! HTTP step clients against stub services.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::{Json, Router, extract::State, http::StatusCode, routing::post};
use common::{ErrorResponse, MessageResponse, Money, OrderId, PaymentRequest, ReserveRequest, StockLine};
use saga::{HttpInventoryClient, HttpPaymentClient, InventoryClient, PaymentClient, SagaError};

#[derive(Clone, Default)]
struct Recorded {
    reserves: Arc<Mutex<Vec<ReserveRequest>>>,
    payments: Arc<Mutex<Vec<PaymentRequest>>>,
}

async fn reserve(
    State(recorded): State<Recorded>,
    Json(request): Json<ReserveRequest>,
) -> Result<Json<MessageResponse>, (StatusCode, Json<ErrorResponse>)> {
    let requested: u32 = request.products.iter().map(|p| p.quantity).sum();
    recorded.reserves.lock().unwrap().push(request);
    if requested > 5 {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse {
                error: "Insufficient inventory".to_string(),
            }),
        ));
    }
    Ok(Json(MessageResponse::new("Inventory reserved successfully")))
}

async fn process(
    State(recorded): State<Recorded>,
    Json(request): Json<PaymentRequest>,
) -> StatusCode {
    recorded.payments.lock().unwrap().push(request);
    StatusCode::OK
}

async fn spawn_stub() -> (SocketAddr, Recorded) {
    let recorded = Recorded::default();
    let app = Router::new()
        .route("/api/inventory/reserve", post(reserve))
        .route("/api/payments/process", post(process))
        .with_state(recorded.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, recorded)
}

#[tokio::test]
async fn test_inventory_client_sends_reserve_request() {
    let (addr, recorded) = spawn_stub().await;
    let client = HttpInventoryClient::new(reqwest::Client::new(), format!("http://{addr}"));
    let order_id = OrderId::new();

    client
        .reserve(order_id, &[StockLine::new("p1", 3)])
        .await
        .unwrap();

    let reserves = recorded.reserves.lock().unwrap().clone();
    assert_eq!(reserves.len(), 1);
    assert_eq!(reserves[0].order_id, order_id);
    assert_eq!(reserves[0].products, vec![StockLine::new("p1", 3)]);
}

#[tokio::test]
async fn test_inventory_client_surfaces_error_body() {
    let (addr, _) = spawn_stub().await;
    let client = HttpInventoryClient::new(reqwest::Client::new(), format!("http://{addr}"));

    let err = client
        .reserve(OrderId::new(), &[StockLine::new("p1", 10)])
        .await
        .unwrap_err();

    match err {
        SagaError::Downstream {
            service,
            status,
            message,
        } => {
            assert_eq!(service, "inventory");
            assert_eq!(status, 400);
            assert_eq!(message, "Insufficient inventory");
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_unknown_route_is_a_downstream_error() {
    let (addr, _) = spawn_stub().await;
    let client = HttpInventoryClient::new(reqwest::Client::new(), format!("http://{addr}"));

    let err = client
        .release(OrderId::new(), &[StockLine::new("p1", 1)])
        .await
        .unwrap_err();

    assert!(matches!(err, SagaError::Downstream { status: 404, .. }));
}

#[tokio::test]
async fn test_payment_client_sends_amount_as_decimal() {
    let (addr, recorded) = spawn_stub().await;
    let client = HttpPaymentClient::new(reqwest::Client::new(), format!("http://{addr}"));
    let order_id = OrderId::new();

    client
        .process(order_id, Money::from_cents(5000), "u1")
        .await
        .unwrap();

    let payments = recorded.payments.lock().unwrap().clone();
    assert_eq!(
        payments,
        vec![PaymentRequest {
            order_id,
            amount: Money::from_cents(5000),
            user_id: "u1".to_string(),
        }]
    );
}

#[tokio::test]
async fn test_unreachable_service_is_a_transport_error() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let client = HttpPaymentClient::new(reqwest::Client::new(), format!("http://{addr}"));
    let err = client.compensate(OrderId::new()).await.unwrap_err();

    assert!(matches!(err, SagaError::Transport(_)));
}
