//! Verify `Gateway::build_request` / `parse_response` against JSON test
//! vectors stored in `test-vectors/`.
//!
//! Each vector describes a request, the request the gateway must build, a
//! simulated response, and either the decoded result or the expected error.
//! Bodies are compared as parsed JSON so field ordering does not matter.

use std::sync::Arc;

use storefront_core::{
    ApiError, AuthResponse, Gateway, HttpMethod, HttpResponse, Product, SharedToken,
    UreqTransport, User,
};

const BASE_URL: &str = "http://localhost:3000";

fn gateway() -> Gateway {
    Gateway::new(BASE_URL, Arc::new(UreqTransport::new()), SharedToken::new())
}

/// Parse the method string from test vectors into `HttpMethod`.
fn parse_method(s: &str) -> HttpMethod {
    match s {
        "GET" => HttpMethod::Get,
        "POST" => HttpMethod::Post,
        "PUT" => HttpMethod::Put,
        "DELETE" => HttpMethod::Delete,
        other => panic!("unknown method: {other}"),
    }
}

fn headers(value: &serde_json::Value) -> Vec<(String, String)> {
    value
        .as_array()
        .unwrap()
        .iter()
        .map(|h| {
            let arr = h.as_array().unwrap();
            (arr[0].as_str().unwrap().to_string(), arr[1].as_str().unwrap().to_string())
        })
        .collect()
}

fn check_error(name: &str, err: ApiError, expected: &serde_json::Value) {
    match err {
        ApiError::HttpStatus {
            status,
            message,
            code,
        } => {
            assert_eq!(u64::from(status), expected["status"].as_u64().unwrap(), "{name}: status");
            assert_eq!(message, expected["message"].as_str().unwrap(), "{name}: message");
            assert_eq!(code.as_deref(), expected["code"].as_str(), "{name}: code");
        }
        other => panic!("{name}: expected HttpStatus, got {other:?}"),
    }
}

/// Decode with the type named by `result_type` and compare against the
/// vector's expected result or error.
fn check_parse(gw: &Gateway, name: &str, case: &serde_json::Value, response: HttpResponse) {
    macro_rules! verify {
        ($ty:ty) => {{
            let result = gw.parse_response::<$ty>(response);
            if let Some(expected_error) = case.get("expected_error") {
                check_error(name, result.unwrap_err(), expected_error);
            } else {
                let expected: $ty = serde_json::from_value(case["expected_result"].clone()).unwrap();
                assert_eq!(result.unwrap(), expected, "{name}: parsed result");
            }
        }};
    }

    match case["result_type"].as_str().unwrap() {
        "token" => verify!(AuthResponse),
        "user" => verify!(User),
        "products" => verify!(Vec<Product>),
        "product" => verify!(Product),
        "categories" => verify!(Vec<String>),
        other => panic!("{name}: unknown result_type: {other}"),
    }
}

fn run_vectors(raw: &str) {
    let vectors: serde_json::Value = serde_json::from_str(raw).unwrap();
    let gw = gateway();

    for case in vectors["cases"].as_array().unwrap() {
        let name = case["name"].as_str().unwrap();
        let input = &case["request"];
        let expected_req = &case["expected_request"];

        // Verify build
        let body = input.get("body").map(|b| b.to_string());
        let req = gw.build_request(
            parse_method(input["method"].as_str().unwrap()),
            input["path"].as_str().unwrap(),
            body,
            input.get("bearer").and_then(|b| b.as_str()),
        );
        assert_eq!(req.method, parse_method(expected_req["method"].as_str().unwrap()), "{name}: method");
        assert_eq!(req.path, format!("{BASE_URL}{}", expected_req["path"].as_str().unwrap()), "{name}: path");
        assert_eq!(req.headers, headers(&expected_req["headers"]), "{name}: headers");
        match expected_req.get("body") {
            Some(expected_body) => {
                let req_body: serde_json::Value =
                    serde_json::from_str(req.body.as_deref().unwrap()).unwrap();
                assert_eq!(&req_body, expected_body, "{name}: body");
            }
            None => assert!(req.body.is_none(), "{name}: body should be None"),
        }

        // Verify parse
        let sim = &case["simulated_response"];
        let response = HttpResponse {
            status: sim["status"].as_u64().unwrap() as u16,
            headers: Vec::new(),
            body: sim["body"].as_str().unwrap().to_string(),
        };
        check_parse(&gw, name, case, response);
    }
}

// ---------------------------------------------------------------------------
// Auth
// ---------------------------------------------------------------------------

#[test]
fn auth_test_vectors() {
    run_vectors(include_str!("../../test-vectors/auth.json"));
}

// ---------------------------------------------------------------------------
// Products
// ---------------------------------------------------------------------------

#[test]
fn products_test_vectors() {
    run_vectors(include_str!("../../test-vectors/products.json"));
}
